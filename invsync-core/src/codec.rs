//! Item codec — one inventory slot's item to a [`Record`] and back.
//!
//! The codec owns all item-shape knowledge. It is stateless apart from the
//! injected catalog and tag capability, so one instance is shared by every
//! session.
//!
//! Decoding is best-effort: an unknown material yields an empty slot, broken
//! tag text is logged and skipped, and unknown enchantments are dropped.
//! None of these abort the surrounding inventory decode.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::{self, ItemCatalog, StaticCatalog};
use crate::tag::{self, JsonTags, TagCapability};
use crate::types::ItemStack;

/// The stored form of one occupied slot.
///
/// Field order and names are the document layout; optional fields are
/// omitted rather than written as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Material identifier.
    pub material: String,
    /// Stack size; absent ⇒ host default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<u32>,
    /// Durability / metadata; absent ⇒ host default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage: Option<u32>,
    /// Custom display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Lore lines. Absent and empty are equivalent.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lore: Vec<String>,
    /// 24-bit RGB dye color, present only for colorable materials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    /// Enchantment id → level; omitted when empty.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub enchantments: BTreeMap<String, u32>,
    /// Serialised tag tree.
    #[serde(default, rename = "tags", skip_serializing_if = "Option::is_none")]
    pub tag_text: Option<String>,
}

impl Record {
    /// A record holding only a material, as written for empty slots.
    #[must_use]
    pub fn bare(material: impl Into<String>) -> Self {
        Self {
            material: material.into(),
            ..Self::default()
        }
    }
}

/// Converts items to records and back.
#[derive(Clone)]
pub struct ItemCodec {
    catalog: Arc<dyn ItemCatalog>,
    tags: Arc<dyn TagCapability>,
}

impl std::fmt::Debug for ItemCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemCodec")
            .field("empty_material", &self.catalog.empty_material())
            .finish_non_exhaustive()
    }
}

impl Default for ItemCodec {
    fn default() -> Self {
        Self::new(Arc::new(StaticCatalog::standard()), Arc::new(JsonTags))
    }
}

impl ItemCodec {
    /// Create a codec over the host's catalog and tag storage.
    #[must_use]
    pub fn new(catalog: Arc<dyn ItemCatalog>, tags: Arc<dyn TagCapability>) -> Self {
        Self { catalog, tags }
    }

    /// The host's item catalog.
    #[must_use]
    pub fn catalog(&self) -> &dyn ItemCatalog {
        self.catalog.as_ref()
    }

    /// The host's tag storage.
    #[must_use]
    pub fn tags(&self) -> &dyn TagCapability {
        self.tags.as_ref()
    }

    /// Encode an item.
    ///
    /// The full tag tree is always written, even when typed fields already
    /// capture some of the same data.
    #[must_use]
    pub fn encode(&self, item: &ItemStack) -> Record {
        let color = catalog::is_colorable(&item.material)
            .then(|| item.meta.color.unwrap_or(catalog::DEFAULT_LEATHER_COLOR));

        Record {
            material: item.material.clone(),
            amount: Some(item.amount),
            damage: Some(item.damage),
            display_name: item.meta.display_name.clone(),
            lore: item.meta.lore.clone(),
            color,
            enchantments: item.meta.enchantments.clone(),
            tag_text: Some(self.tags.to_text(&self.tags.read(item))),
        }
    }

    /// Decode a record into an item.
    ///
    /// Returns `None` for the empty material and for materials the catalog
    /// does not know; the caller treats both as an empty slot.
    #[must_use]
    pub fn decode(&self, record: &Record) -> Option<ItemStack> {
        if record.material == self.catalog.empty_material() {
            return None;
        }
        if !self.catalog.is_material(&record.material) {
            warn!(material = %record.material, "Unknown material, leaving slot empty");
            return None;
        }

        let mut item = ItemStack::new(record.material.clone());
        if let Some(amount) = record.amount {
            item.amount = amount;
        }
        if let Some(damage) = record.damage {
            item.damage = damage;
        }
        item.meta.display_name.clone_from(&record.display_name);
        item.meta.lore.clone_from(&record.lore);

        if let Some(color) = record.color {
            if catalog::is_colorable(&item.material) {
                item.meta.color = Some(color & 0x00FF_FFFF);
            } else {
                warn!(material = %item.material, color, "Ignoring color on non-colorable material");
            }
        }

        if let Some(text) = &record.tag_text {
            self.merge_tags(&mut item, text);
        }

        for (id, &level) in &record.enchantments {
            if self.catalog.is_enchantment(id) {
                item.meta.enchantments.insert(id.clone(), level);
            } else {
                debug!(enchantment = %id, "Skipping unknown enchantment");
            }
        }

        Some(item)
    }

    /// Parse `text` and replay it onto `item`, logging any failure.
    fn merge_tags(&self, item: &mut ItemStack, text: &str) {
        let tree = match self.tags.parse(text) {
            Ok(tree) => tree,
            Err(e) => {
                warn!(material = %item.material, error = %e, "Discarding unreadable tag text");
                return;
            }
        };
        match tag::apply_tree(self.tags.as_ref(), item, &tree) {
            Ok(applied) => debug!(material = %item.material, applied, "Merged item tags"),
            Err(e) => {
                warn!(material = %item.material, error = %e, "Tag merge stopped early");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::{TagTree, TagValue};

    fn codec() -> ItemCodec {
        ItemCodec::default()
    }

    fn sword() -> ItemStack {
        ItemStack::new("DIAMOND_SWORD")
            .with_damage(12)
            .with_display_name("Excalibur")
            .with_lore_line("Pulled from a stone")
            .with_enchantment("DAMAGE_ALL", 5)
    }

    #[test]
    fn encode_reads_every_field() {
        let record = codec().encode(&sword());
        assert_eq!(record.material, "DIAMOND_SWORD");
        assert_eq!(record.amount, Some(1));
        assert_eq!(record.damage, Some(12));
        assert_eq!(record.display_name.as_deref(), Some("Excalibur"));
        assert_eq!(record.lore, vec!["Pulled from a stone".to_string()]);
        assert_eq!(record.enchantments.get("DAMAGE_ALL"), Some(&5));
        assert_eq!(record.tag_text.as_deref(), Some("{}"));
        assert!(record.color.is_none());
    }

    #[test]
    fn color_only_on_colorable_materials() {
        let codec = codec();
        let dyed = codec.encode(&ItemStack::new("LEATHER_CHESTPLATE").with_color(0x33_66_99));
        assert_eq!(dyed.color, Some(0x33_66_99));

        let undyed = codec.encode(&ItemStack::new("LEATHER_BOOTS"));
        assert_eq!(undyed.color, Some(catalog::DEFAULT_LEATHER_COLOR));

        // A stray color on iron armor is not written.
        let mut iron = ItemStack::new("IRON_HELMET");
        iron.meta.color = Some(0xFF_00_00);
        assert!(codec.encode(&iron).color.is_none());
    }

    #[test]
    fn enchantments_omitted_when_empty() {
        let codec = codec();
        let plain = serde_json::to_value(codec.encode(&ItemStack::new("STONE"))).expect("json");
        assert!(plain.get("enchantments").is_none());

        let enchanted = serde_json::to_value(codec.encode(&sword())).expect("json");
        assert!(enchanted.get("enchantments").is_some());
    }

    #[test]
    fn decode_round_trips_typed_fields() {
        let codec = codec();
        let original = sword();
        let decoded = codec.decode(&codec.encode(&original)).expect("known material");
        assert_eq!(decoded, original);
    }

    #[test]
    fn unknown_material_yields_empty_slot() {
        assert!(codec().decode(&Record::bare("UNOBTAINIUM")).is_none());
        assert!(codec().decode(&Record::bare(catalog::AIR)).is_none());
    }

    #[test]
    fn absent_amount_and_damage_keep_defaults() {
        let item = codec().decode(&Record::bare("BREAD")).expect("bread");
        assert_eq!(item.amount, 1);
        assert_eq!(item.damage, 0);
        assert!(item.meta.display_name.is_none());
        assert!(item.meta.lore.is_empty());
    }

    #[test]
    fn unknown_enchantments_skipped_and_levels_unbounded() {
        let mut record = Record::bare("DIAMOND_SWORD");
        record.enchantments.insert("DAMAGE_ALL".into(), 1000);
        record.enchantments.insert("VORPAL".into(), 3);

        let item = codec().decode(&record).expect("sword");
        assert_eq!(item.meta.enchantments.get("DAMAGE_ALL"), Some(&1000));
        assert!(!item.meta.enchantments.contains_key("VORPAL"));
    }

    #[test]
    fn color_on_non_colorable_is_ignored() {
        let mut record = Record::bare("STONE");
        record.color = Some(0x12_34_56);
        let item = codec().decode(&record).expect("stone");
        assert!(item.meta.color.is_none());
    }

    #[test]
    fn tags_survive_encode_decode() {
        let codec = codec();
        let mut item = ItemStack::new("STICK");
        item.tags.insert("soulbound", true);
        item.tags.insert("owner", "Alice");

        let decoded = codec.decode(&codec.encode(&item)).expect("stick");
        assert_eq!(decoded.tags.get("soulbound"), Some(&TagValue::Bool(true)));
        assert_eq!(decoded.tags.get("owner"), Some(&TagValue::String("Alice".into())));
    }

    #[test]
    fn nested_tags_are_flattened_one_level() {
        let mut record = Record::bare("STICK");
        record.tag_text = Some(r#"{"a":1,"b":{"c":2,"d":3}}"#.into());

        let item = codec().decode(&record).expect("stick");
        let expected: TagTree = [("a", 1_i64), ("c", 2), ("d", 3)].into_iter().collect();
        assert_eq!(item.tags, expected);
    }

    #[test]
    fn broken_tag_text_does_not_abort_decode() {
        let mut record = Record::bare("STICK");
        record.amount = Some(7);
        record.tag_text = Some("{broken".into());
        record.enchantments.insert("DURABILITY".into(), 2);

        let item = codec().decode(&record).expect("stick");
        assert_eq!(item.amount, 7);
        assert!(item.tags.is_empty());
        assert_eq!(item.meta.enchantments.get("DURABILITY"), Some(&2));
    }

    #[test]
    fn absent_and_empty_lore_decode_identically() {
        let codec = codec();
        let absent: Record = serde_json::from_str(r#"{"material":"BOOK"}"#).expect("absent");
        let empty: Record = serde_json::from_str(r#"{"material":"BOOK","lore":[]}"#).expect("empty");
        assert_eq!(codec.decode(&absent), codec.decode(&empty));
    }
}
