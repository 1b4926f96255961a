//! Tag trees — the opaque, recursively nested custom data carried by items.
//!
//! Typed [`Record`](crate::codec::Record) fields cannot express everything a
//! host attaches to an item, so every encode also serialises the item's full
//! tag tree as JSON text. On decode the text is parsed back and replayed onto
//! the fresh item by [`apply_tree`].
//!
//! Tag values are an explicit sum type: the merge matches on
//! [`TagValue::Compound`] to tell nested maps from scalars.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::ItemStack;

/// Errors raised while parsing or applying tag data.
#[derive(Debug, Error)]
pub enum TagError {
    /// The tag text was not a JSON object.
    #[error("Malformed tag text: {0}")]
    Parse(String),

    /// The host refused to store a tag under this key.
    #[error("Invalid tag key: {0:?}")]
    InvalidKey(String),
}

/// A single tag value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    /// Boolean flag (NBT byte 0/1).
    Bool(bool),
    /// Any integral value.
    Int(i64),
    /// Any floating-point value.
    Float(f64),
    /// Text.
    String(String),
    /// Ordered list of values.
    List(Vec<TagValue>),
    /// Nested map.
    Compound(TagTree),
}

impl TagValue {
    /// Whether this value is a nested map.
    #[must_use]
    pub fn is_compound(&self) -> bool {
        matches!(self, Self::Compound(_))
    }
}

impl From<bool> for TagValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for TagValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for TagValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<TagTree> for TagValue {
    fn from(v: TagTree) -> Self {
        Self::Compound(v)
    }
}

/// A key → value tag map. Keys iterate in sorted order, but callers must not
/// rely on any particular order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagTree(BTreeMap<String, TagValue>);

impl TagTree {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a tree from JSON text. The top level must be an object.
    ///
    /// # Errors
    ///
    /// Returns [`TagError::Parse`] on malformed text.
    pub fn parse(text: &str) -> Result<Self, TagError> {
        serde_json::from_str(text).map_err(|e| TagError::Parse(e.to_string()))
    }

    /// Serialise the tree to compact JSON text.
    #[must_use]
    pub fn to_text(&self) -> String {
        // A string-keyed map of JSON-native values cannot fail to serialise.
        serde_json::to_string(&self.0).unwrap_or_else(|_| String::from("{}"))
    }

    /// All top-level keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Look up a top-level value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&TagValue> {
        self.0.get(key)
    }

    /// Insert or overwrite a top-level value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<TagValue>) -> Option<TagValue> {
        self.0.insert(key.into(), value.into())
    }

    /// Remove a top-level value.
    pub fn remove(&mut self, key: &str) -> Option<TagValue> {
        self.0.remove(key)
    }

    /// Iterate over `(key, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TagValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of top-level entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the tree has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<TagValue>> FromIterator<(K, V)> for TagTree {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// The host's tag storage, injected into the codec.
///
/// Hosts backed by a real NBT library implement this against their item
/// type; [`JsonTags`] stores tags directly on [`ItemStack::tags`].
pub trait TagCapability: Send + Sync {
    /// Read the item's complete tag tree.
    fn read(&self, item: &ItemStack) -> TagTree;

    /// Set a single tag on the item.
    ///
    /// # Errors
    ///
    /// Returns a [`TagError`] if the host rejects the key or value.
    fn set_tag(&self, item: &mut ItemStack, key: &str, value: &TagValue) -> Result<(), TagError>;

    /// Parse serialised tag text.
    ///
    /// # Errors
    ///
    /// Returns [`TagError::Parse`] on malformed text.
    fn parse(&self, text: &str) -> Result<TagTree, TagError> {
        TagTree::parse(text)
    }

    /// Serialise a tag tree to text.
    fn to_text(&self, tree: &TagTree) -> String {
        tree.to_text()
    }
}

/// JSON-backed tag storage on [`ItemStack::tags`].
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonTags;

impl TagCapability for JsonTags {
    fn read(&self, item: &ItemStack) -> TagTree {
        item.tags.clone()
    }

    fn set_tag(&self, item: &mut ItemStack, key: &str, value: &TagValue) -> Result<(), TagError> {
        if key.is_empty() {
            return Err(TagError::InvalidKey(key.to_string()));
        }
        item.tags.insert(key, value.clone());
        Ok(())
    }
}

/// Replay `tree` onto `item`, returning the number of tags set.
///
/// Scalars are set under their own key. A nested map is flattened exactly
/// one level: each of its entries is set under the *inner* key, and values
/// nested deeper are set as-is rather than recursed into.
///
/// Stops at the first failing tag, leaving the item partially tagged.
///
/// # Errors
///
/// Returns the first [`TagError`] raised by the capability.
pub fn apply_tree<T>(tags: &T, item: &mut ItemStack, tree: &TagTree) -> Result<usize, TagError>
where
    T: TagCapability + ?Sized,
{
    let mut applied = 0;
    for (key, value) in tree.iter() {
        match value {
            TagValue::Compound(inner) => {
                for (inner_key, inner_value) in inner.iter() {
                    tags.set_tag(item, inner_key, inner_value)?;
                    applied += 1;
                }
            }
            scalar => {
                tags.set_tag(item, key, scalar)?;
                applied += 1;
            }
        }
    }
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stone() -> ItemStack {
        ItemStack::new("STONE")
    }

    #[test]
    fn parse_and_to_text() {
        let tree = TagTree::parse(r#"{"a":1,"b":{"c":"x"},"l":[1,2],"f":0.5,"t":true}"#)
            .expect("parse");
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.get("a"), Some(&TagValue::Int(1)));
        assert_eq!(tree.get("f"), Some(&TagValue::Float(0.5)));
        assert_eq!(tree.get("t"), Some(&TagValue::Bool(true)));
        assert!(tree.get("b").expect("b").is_compound());

        let reparsed = TagTree::parse(&tree.to_text()).expect("reparse");
        assert_eq!(reparsed, tree);
    }

    #[test]
    fn keys_lists_top_level_only() {
        let tree = TagTree::parse(r#"{"a":1,"b":{"c":2}}"#).expect("parse");
        let keys: Vec<&str> = tree.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn malformed_text_is_parse_error() {
        assert!(matches!(TagTree::parse("{not json"), Err(TagError::Parse(_))));
        assert!(matches!(TagTree::parse("[1,2]"), Err(TagError::Parse(_))));
    }

    #[test]
    fn flattens_exactly_one_level() {
        let tree = TagTree::parse(r#"{"a":1,"b":{"c":2,"d":3}}"#).expect("parse");
        let mut item = stone();
        let applied = apply_tree(&JsonTags, &mut item, &tree).expect("apply");

        assert_eq!(applied, 3);
        assert_eq!(item.tags.get("a"), Some(&TagValue::Int(1)));
        assert_eq!(item.tags.get("c"), Some(&TagValue::Int(2)));
        assert_eq!(item.tags.get("d"), Some(&TagValue::Int(3)));
        assert!(item.tags.get("b").is_none());
    }

    #[test]
    fn deeper_maps_are_not_recursed() {
        let tree = TagTree::parse(r#"{"outer":{"mid":{"deep":1}}}"#).expect("parse");
        let mut item = stone();
        apply_tree(&JsonTags, &mut item, &tree).expect("apply");

        let mid = item.tags.get("mid").expect("mid set");
        let TagValue::Compound(mid) = mid else {
            panic!("mid should stay a compound");
        };
        assert_eq!(mid.get("deep"), Some(&TagValue::Int(1)));
        assert!(item.tags.get("deep").is_none());
    }

    #[test]
    fn failure_leaves_item_partially_tagged() {
        // Keys iterate sorted: "a" applies, then the empty key inside "z" is rejected.
        let mut tree = TagTree::new();
        tree.insert("a", 1_i64);
        tree.insert("z", TagTree::from_iter([("", TagValue::Int(2))]));

        let mut item = stone();
        let result = apply_tree(&JsonTags, &mut item, &tree);
        assert!(matches!(result, Err(TagError::InvalidKey(_))));
        assert_eq!(item.tags.get("a"), Some(&TagValue::Int(1)));
        assert_eq!(item.tags.len(), 1);
    }
}
