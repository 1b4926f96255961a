//! Item catalog — which material and enchantment identifiers the host knows.
//!
//! The real catalog belongs to the host; [`StaticCatalog::standard`] covers
//! the common vanilla identifiers and hosts can extend it.

use std::collections::HashSet;

/// Identifier the host uses for "no item".
pub const AIR: &str = "AIR";

/// Materials that carry a dye color.
pub const COLORABLE_MATERIALS: [&str; 4] = [
    "LEATHER_HELMET",
    "LEATHER_CHESTPLATE",
    "LEATHER_LEGGINGS",
    "LEATHER_BOOTS",
];

/// Color the host reports for undyed leather armor.
pub const DEFAULT_LEATHER_COLOR: u32 = 0x00A0_6540;

/// Whether `material` is in the colorable set.
#[must_use]
pub fn is_colorable(material: &str) -> bool {
    COLORABLE_MATERIALS.contains(&material)
}

/// Lookup of host identifiers.
pub trait ItemCatalog: Send + Sync {
    /// Whether `id` names a material the host can construct.
    fn is_material(&self, id: &str) -> bool;

    /// Whether `id` names an enchantment the host knows.
    fn is_enchantment(&self, id: &str) -> bool;

    /// The "no item" material.
    fn empty_material(&self) -> &str {
        AIR
    }
}

/// A fixed set of identifiers.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    materials: HashSet<String>,
    enchantments: HashSet<String>,
}

const STANDARD_MATERIALS: &[&str] = &[
    AIR,
    "STONE", "COBBLESTONE", "DIRT", "GRASS", "SAND", "GRAVEL", "GLASS",
    "LOG", "WOOD", "STICK", "TORCH", "CHEST", "WORKBENCH", "FURNACE",
    "COAL", "IRON_INGOT", "GOLD_INGOT", "DIAMOND", "EMERALD", "REDSTONE",
    "BREAD", "APPLE", "GOLDEN_APPLE", "COOKED_BEEF", "POTION", "BOOK",
    "ENCHANTED_BOOK", "BOW", "ARROW", "SHIELD", "ELYTRA", "FISHING_ROD",
    "WOOD_SWORD", "STONE_SWORD", "IRON_SWORD", "GOLD_SWORD", "DIAMOND_SWORD",
    "WOOD_PICKAXE", "STONE_PICKAXE", "IRON_PICKAXE", "GOLD_PICKAXE", "DIAMOND_PICKAXE",
    "WOOD_AXE", "STONE_AXE", "IRON_AXE", "GOLD_AXE", "DIAMOND_AXE",
    "WOOD_SPADE", "STONE_SPADE", "IRON_SPADE", "GOLD_SPADE", "DIAMOND_SPADE",
    "LEATHER_HELMET", "LEATHER_CHESTPLATE", "LEATHER_LEGGINGS", "LEATHER_BOOTS",
    "CHAINMAIL_HELMET", "CHAINMAIL_CHESTPLATE", "CHAINMAIL_LEGGINGS", "CHAINMAIL_BOOTS",
    "IRON_HELMET", "IRON_CHESTPLATE", "IRON_LEGGINGS", "IRON_BOOTS",
    "GOLD_HELMET", "GOLD_CHESTPLATE", "GOLD_LEGGINGS", "GOLD_BOOTS",
    "DIAMOND_HELMET", "DIAMOND_CHESTPLATE", "DIAMOND_LEGGINGS", "DIAMOND_BOOTS",
];

const STANDARD_ENCHANTMENTS: &[&str] = &[
    "PROTECTION_ENVIRONMENTAL", "PROTECTION_FIRE", "PROTECTION_FALL",
    "PROTECTION_EXPLOSIONS", "PROTECTION_PROJECTILE", "OXYGEN", "WATER_WORKER",
    "THORNS", "DEPTH_STRIDER", "FROST_WALKER", "DAMAGE_ALL", "DAMAGE_UNDEAD",
    "DAMAGE_ARTHROPODS", "KNOCKBACK", "FIRE_ASPECT", "LOOT_BONUS_MOBS",
    "DIG_SPEED", "SILK_TOUCH", "DURABILITY", "LOOT_BONUS_BLOCKS",
    "ARROW_DAMAGE", "ARROW_KNOCKBACK", "ARROW_FIRE", "ARROW_INFINITE",
    "LUCK", "LURE", "MENDING",
];

impl StaticCatalog {
    /// An empty catalog that only knows [`AIR`].
    #[must_use]
    pub fn new() -> Self {
        Self::default().with_material(AIR)
    }

    /// The built-in catalog of common identifiers.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            materials: STANDARD_MATERIALS.iter().map(ToString::to_string).collect(),
            enchantments: STANDARD_ENCHANTMENTS.iter().map(ToString::to_string).collect(),
        }
    }

    /// Builder: register a material.
    #[must_use]
    pub fn with_material(mut self, id: impl Into<String>) -> Self {
        self.materials.insert(id.into());
        self
    }

    /// Builder: register an enchantment.
    #[must_use]
    pub fn with_enchantment(mut self, id: impl Into<String>) -> Self {
        self.enchantments.insert(id.into());
        self
    }
}

impl ItemCatalog for StaticCatalog {
    fn is_material(&self, id: &str) -> bool {
        self.materials.contains(id)
    }

    fn is_enchantment(&self, id: &str) -> bool {
        self.enchantments.contains(id)
    }
}
