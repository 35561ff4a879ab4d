//! DOM Element implementation.

use crate::attributes::AttributeMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;

/// Interned, lowercased tag name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TagName(Arc<str>);

impl TagName {
    pub fn new(name: &str) -> Self {
        static INTERNED: Lazy<RwLock<HashMap<String, Arc<str>>>> =
            Lazy::new(|| RwLock::new(HashMap::new()));

        let lower = name.to_ascii_lowercase();

        {
            let cache = INTERNED.read();
            if let Some(s) = cache.get(&lower) {
                return TagName(s.clone());
            }
        }

        let mut cache = INTERNED.write();
        let s = cache
            .entry(lower.clone())
            .or_insert_with(|| Arc::from(lower.as_str()))
            .clone();
        TagName(s)
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn html() -> Self {
        Self::new("html")
    }
    pub fn head() -> Self {
        Self::new("head")
    }
    pub fn body() -> Self {
        Self::new("body")
    }
    pub fn div() -> Self {
        Self::new("div")
    }
    pub fn span() -> Self {
        Self::new("span")
    }
    pub fn button() -> Self {
        Self::new("button")
    }
    pub fn audio() -> Self {
        Self::new("audio")
    }
    pub fn video() -> Self {
        Self::new("video")
    }

    /// Whether elements with this tag can play media.
    pub fn is_media(&self) -> bool {
        matches!(self.as_str(), "audio" | "video")
    }
}

impl std::fmt::Display for TagName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for TagName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for TagName {
    fn eq(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl PartialEq<&str> for TagName {
    fn eq(&self, other: &&str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

/// Element-specific data.
#[derive(Clone, Debug)]
pub struct ElementData {
    /// Tag name (lowercase).
    pub tag_name: TagName,
    /// Attributes.
    pub attributes: AttributeMap,
    /// ID attribute (cached).
    pub id: Option<Arc<str>>,
    /// Class list (cached).
    pub class_list: SmallVec<[Arc<str>; 4]>,
}

impl ElementData {
    pub fn new(tag_name: TagName) -> Self {
        Self {
            tag_name,
            attributes: AttributeMap::new(),
            id: None,
            class_list: SmallVec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Get attribute value.
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name)
    }

    /// Check if attribute exists.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains(name)
    }

    /// Set attribute, keeping the id/class caches in sync.
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        self.attributes.set(name, value);

        match name.to_ascii_lowercase().as_str() {
            "id" => self.id = Some(Arc::from(value)),
            "class" => self.update_class_list(value),
            _ => {}
        }
    }

    /// Remove attribute.
    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let old = self.attributes.remove(name);

        match name.to_ascii_lowercase().as_str() {
            "id" => self.id = None,
            "class" => self.class_list.clear(),
            _ => {}
        }

        old
    }

    fn update_class_list(&mut self, value: &str) {
        self.class_list = value.split_whitespace().map(Arc::from).collect();
    }

    /// Check if element has a class.
    pub fn has_class(&self, class: &str) -> bool {
        self.class_list.iter().any(|c| c.as_ref() == class)
    }

    /// Whether this is an `<audio>` or `<video>` element.
    pub fn is_media(&self) -> bool {
        self.tag_name.is_media()
    }

    /// Whether a synthetic activation must be ignored.
    pub fn is_disabled(&self) -> bool {
        self.has_attribute("disabled")
            && matches!(
                self.tag_name.as_str(),
                "button" | "input" | "select" | "textarea" | "fieldset"
            )
    }

    /// Whether the element is hidden from rendering by the `hidden` attribute.
    pub fn is_hidden(&self) -> bool {
        self.has_attribute("hidden")
    }
}
