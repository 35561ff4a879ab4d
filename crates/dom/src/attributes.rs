//! DOM Attribute handling.

use indexmap::IndexMap;
use std::sync::Arc;

/// Map of element attributes preserving insertion order.
///
/// Names are stored lowercased, as HTML attribute names are case-insensitive.
#[derive(Clone, Debug, Default)]
pub struct AttributeMap {
    attrs: IndexMap<Arc<str>, String>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self {
            attrs: IndexMap::new(),
        }
    }

    /// Set an attribute value.
    pub fn set(&mut self, name: &str, value: &str) {
        self.attrs
            .insert(Arc::from(name.to_ascii_lowercase()), value.to_string());
    }

    /// Get an attribute value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attrs
            .get(name.to_ascii_lowercase().as_str())
            .map(|s| s.as_str())
    }

    /// Remove an attribute, keeping the order of the others.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.attrs.shift_remove(name.to_ascii_lowercase().as_str())
    }

    /// Check if attribute exists.
    pub fn contains(&self, name: &str) -> bool {
        self.attrs.contains_key(name.to_ascii_lowercase().as_str())
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_ref(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_names() {
        let mut attrs = AttributeMap::new();
        attrs.set("Aria-Label", "Play");
        assert_eq!(attrs.get("aria-label"), Some("Play"));
        assert!(attrs.contains("ARIA-LABEL"));
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut attrs = AttributeMap::new();
        attrs.set("id", "a");
        attrs.set("class", "b");
        attrs.set("title", "c");
        assert_eq!(attrs.remove("class"), Some("b".to_string()));

        let names: Vec<_> = attrs.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["id", "title"]);
    }
}
