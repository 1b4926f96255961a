//! Core type definitions: player identity, items and inventories.
//!
//! [`ItemStack`] and [`PlayerInventory`] model the host's item system just
//! far enough for the codec to read and rebuild items. Hosts with their own
//! inventory type implement [`Inventory`] instead.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tag::TagTree;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// A player's identity: display name plus stable UUID.
///
/// Loads are keyed by `id` alone so a rename keeps the stored inventory;
/// saves are keyed by both fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerIdentity {
    /// Current display name.
    pub name: String,
    /// Stable unique id.
    pub id: Uuid,
}

impl PlayerIdentity {
    /// Create an identity.
    #[must_use]
    pub fn new(name: impl Into<String>, id: Uuid) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }

    /// Parse an identity from a name and canonical UUID text.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidIdentity`](crate::SyncError::InvalidIdentity)
    /// if `id` is not a UUID.
    pub fn parse(name: impl Into<String>, id: &str) -> crate::Result<Self> {
        let id = Uuid::parse_str(id)
            .map_err(|e| crate::SyncError::InvalidIdentity(format!("{id}: {e}")))?;
        Ok(Self::new(name, id))
    }

    /// The UUID as stored in documents (lowercase, hyphenated).
    #[must_use]
    pub fn uuid_text(&self) -> String {
        self.id.hyphenated().to_string()
    }
}

impl fmt::Display for PlayerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// Display and enchantment data attached to an item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMeta {
    /// Custom display name, if any.
    pub display_name: Option<String>,
    /// Lore lines, in order.
    pub lore: Vec<String>,
    /// 24-bit RGB dye color. Only meaningful on colorable materials.
    pub color: Option<u32>,
    /// Enchantment id → level. Levels are not bounded.
    pub enchantments: BTreeMap<String, u32>,
}

/// One stack of items in an inventory slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStack {
    /// Material identifier, e.g. `DIAMOND_SWORD`.
    pub material: String,
    /// Stack size.
    pub amount: u32,
    /// Durability / metadata value.
    pub damage: u32,
    /// Display and enchantment data.
    pub meta: ItemMeta,
    /// Opaque custom tags.
    pub tags: TagTree,
}

impl ItemStack {
    /// A single item of `material` with host defaults (amount 1, damage 0).
    #[must_use]
    pub fn new(material: impl Into<String>) -> Self {
        Self {
            material: material.into(),
            amount: 1,
            damage: 0,
            meta: ItemMeta::default(),
            tags: TagTree::new(),
        }
    }

    /// Builder: set the stack size.
    #[must_use]
    pub fn with_amount(mut self, amount: u32) -> Self {
        self.amount = amount;
        self
    }

    /// Builder: set the damage value.
    #[must_use]
    pub fn with_damage(mut self, damage: u32) -> Self {
        self.damage = damage;
        self
    }

    /// Builder: set the display name.
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.meta.display_name = Some(name.into());
        self
    }

    /// Builder: append a lore line.
    #[must_use]
    pub fn with_lore_line(mut self, line: impl Into<String>) -> Self {
        self.meta.lore.push(line.into());
        self
    }

    /// Builder: set the dye color.
    #[must_use]
    pub fn with_color(mut self, rgb: u32) -> Self {
        self.meta.color = Some(rgb & 0x00FF_FFFF);
        self
    }

    /// Builder: add an enchantment at any level.
    #[must_use]
    pub fn with_enchantment(mut self, id: impl Into<String>, level: u32) -> Self {
        self.meta.enchantments.insert(id.into(), level);
        self
    }
}

// ---------------------------------------------------------------------------
// Inventories
// ---------------------------------------------------------------------------

/// Number of main-inventory slots (hotbar + storage).
pub const MAIN_INVENTORY_SLOTS: usize = 36;

/// Full player inventory: main slots, four armor slots and the off-hand.
pub const PLAYER_INVENTORY_SLOTS: usize = MAIN_INVENTORY_SLOTS + 5;

/// A fixed-size, slot-addressed item container owned by the host.
pub trait Inventory {
    /// Number of slots.
    fn size(&self) -> usize;

    /// The item in `slot`, if any.
    fn item(&self, slot: usize) -> Option<&ItemStack>;

    /// Mutable access to the item in `slot`, if any.
    fn item_mut(&mut self, slot: usize) -> Option<&mut ItemStack>;

    /// Replace the contents of `slot`. Returns `false` if `slot` is out of range.
    fn set_item(&mut self, slot: usize, item: Option<ItemStack>) -> bool;

    /// Indices of all occupied slots, ascending.
    fn occupied_slots(&self) -> Vec<usize> {
        (0..self.size()).filter(|&s| self.item(s).is_some()).collect()
    }

    /// Whether no slot holds an item.
    fn is_empty(&self) -> bool {
        (0..self.size()).all(|s| self.item(s).is_none())
    }
}

/// The default [`Inventory`] implementation: a vector of optional stacks.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerInventory {
    slots: Vec<Option<ItemStack>>,
}

impl PlayerInventory {
    /// An empty inventory with `size` slots.
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            slots: vec![None; size],
        }
    }

    /// Builder: place `item` in `slot`. Out-of-range slots are ignored.
    #[must_use]
    pub fn with_item(mut self, slot: usize, item: ItemStack) -> Self {
        self.set_item(slot, Some(item));
        self
    }

    /// Empty every slot.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = None);
    }
}

impl Default for PlayerInventory {
    fn default() -> Self {
        Self::new(PLAYER_INVENTORY_SLOTS)
    }
}

impl Inventory for PlayerInventory {
    fn size(&self) -> usize {
        self.slots.len()
    }

    fn item(&self, slot: usize) -> Option<&ItemStack> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    fn item_mut(&mut self, slot: usize) -> Option<&mut ItemStack> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    fn set_item(&mut self, slot: usize, item: Option<ItemStack>) -> bool {
        match self.slots.get_mut(slot) {
            Some(s) => {
                *s = item;
                true
            }
            None => false,
        }
    }
}
