//! CSS Selector implementation.

use dom::element::ElementData;
use std::fmt;

/// List of selectors (comma-separated).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectorList {
    pub selectors: Vec<Selector>,
}

impl SelectorList {
    pub fn new() -> Self {
        Self {
            selectors: Vec::new(),
        }
    }

    pub fn push(&mut self, selector: Selector) {
        self.selectors.push(selector);
    }

    /// Convert to CSS string.
    pub fn to_css_string(&self) -> String {
        self.selectors
            .iter()
            .map(|s| s.to_css_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for SelectorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css_string())
    }
}

/// A complex selector: compound selectors joined by combinators.
///
/// `combinators[i]` joins `compounds[i]` (left) and `compounds[i + 1]` (right),
/// so there is always one combinator fewer than compounds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selector {
    pub compounds: Vec<CompoundSelector>,
    pub combinators: Vec<Combinator>,
}

impl Selector {
    /// A selector made of a single compound.
    pub fn compound(compound: CompoundSelector) -> Self {
        Self {
            compounds: vec![compound],
            combinators: Vec::new(),
        }
    }

    /// The rightmost compound, the one the subject element must match.
    pub fn subject(&self) -> Option<&CompoundSelector> {
        self.compounds.last()
    }

    /// Convert to CSS string.
    pub fn to_css_string(&self) -> String {
        let mut result = String::new();
        for (i, compound) in self.compounds.iter().enumerate() {
            if i > 0 {
                result.push_str(self.combinators[i - 1].as_str());
            }
            result.push_str(&compound.to_css_string());
        }
        result
    }
}

/// Simple selectors that all apply to one element.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompoundSelector {
    /// Tag name, lowercased.
    pub tag: Option<String>,
    /// ID.
    pub id: Option<String>,
    /// Classes.
    pub classes: Vec<String>,
    /// Attribute selectors.
    pub attributes: Vec<AttributeSelector>,
    /// Universal selector (*).
    pub universal: bool,
}

impl CompoundSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create tag selector.
    pub fn tag(name: &str) -> Self {
        Self {
            tag: Some(name.to_ascii_lowercase()),
            ..Default::default()
        }
    }

    /// Create class selector.
    pub fn class(class: &str) -> Self {
        Self {
            classes: vec![class.to_string()],
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tag.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attributes.is_empty()
            && !self.universal
    }

    /// Check if every simple selector matches the element.
    pub fn matches(&self, element: &ElementData) -> bool {
        if let Some(ref tag) = self.tag {
            if element.tag_name != tag.as_str() {
                return false;
            }
        }

        if let Some(ref id) = self.id {
            match &element.id {
                Some(elem_id) if elem_id.as_ref() == id.as_str() => {}
                _ => return false,
            }
        }

        if !self.classes.iter().all(|class| element.has_class(class)) {
            return false;
        }

        self.attributes.iter().all(|attr| attr.matches(element))
    }

    /// Convert to CSS string.
    pub fn to_css_string(&self) -> String {
        let mut result = String::new();

        if self.universal && self.tag.is_none() {
            result.push('*');
        }
        if let Some(ref tag) = self.tag {
            result.push_str(tag);
        }
        if let Some(ref id) = self.id {
            result.push('#');
            result.push_str(id);
        }
        for class in &self.classes {
            result.push('.');
            result.push_str(class);
        }
        for attr in &self.attributes {
            result.push_str(&attr.to_css_string());
        }
        result
    }
}

/// Selector combinator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Combinator {
    /// Descendant (space).
    Descendant,
    /// Child (>).
    Child,
    /// Next sibling (+).
    NextSibling,
    /// Subsequent sibling (~).
    SubsequentSibling,
}

impl Combinator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Combinator::Descendant => " ",
            Combinator::Child => " > ",
            Combinator::NextSibling => " + ",
            Combinator::SubsequentSibling => " ~ ",
        }
    }
}

/// Attribute value operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttributeOperator {
    /// `=`
    Equals,
    /// `~=`
    Includes,
    /// `|=`
    DashMatch,
    /// `^=`
    Prefix,
    /// `$=`
    Suffix,
    /// `*=`
    Substring,
}

impl AttributeOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeOperator::Equals => "=",
            AttributeOperator::Includes => "~=",
            AttributeOperator::DashMatch => "|=",
            AttributeOperator::Prefix => "^=",
            AttributeOperator::Suffix => "$=",
            AttributeOperator::Substring => "*=",
        }
    }
}

/// Attribute selector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeSelector {
    /// Attribute name, lowercased.
    pub name: String,
    /// Operator and expected value; `None` only checks presence.
    pub operation: Option<(AttributeOperator, String)>,
    /// Case sensitivity.
    pub case_sensitivity: CaseSensitivity,
}

impl AttributeSelector {
    /// Presence selector (`[name]`).
    pub fn exists(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            operation: None,
            case_sensitivity: CaseSensitivity::Default,
        }
    }

    /// Check if selector matches element.
    pub fn matches(&self, element: &ElementData) -> bool {
        let Some(attr_value) = element.get_attribute(&self.name) else {
            return false;
        };
        let Some((operator, expected)) = &self.operation else {
            return true;
        };

        let (attr_value, expected) = match self.case_sensitivity {
            CaseSensitivity::Insensitive => {
                (attr_value.to_ascii_lowercase(), expected.to_ascii_lowercase())
            }
            _ => (attr_value.to_string(), expected.clone()),
        };

        match operator {
            AttributeOperator::Equals => attr_value == expected,
            AttributeOperator::Includes => attr_value.split_whitespace().any(|w| w == expected),
            AttributeOperator::DashMatch => {
                attr_value == expected || attr_value.starts_with(&format!("{}-", expected))
            }
            // An empty value never matches the substring operators.
            AttributeOperator::Prefix => !expected.is_empty() && attr_value.starts_with(&expected),
            AttributeOperator::Suffix => !expected.is_empty() && attr_value.ends_with(&expected),
            AttributeOperator::Substring => !expected.is_empty() && attr_value.contains(&expected),
        }
    }

    /// Convert to CSS string.
    pub fn to_css_string(&self) -> String {
        let mut result = format!("[{}", self.name);

        if let Some((operator, value)) = &self.operation {
            result.push_str(operator.as_str());
            result.push('"');
            result.push_str(value);
            result.push('"');

            match self.case_sensitivity {
                CaseSensitivity::Insensitive => result.push_str(" i"),
                CaseSensitivity::Sensitive => result.push_str(" s"),
                CaseSensitivity::Default => {}
            }
        }

        result.push(']');
        result
    }
}

/// Attribute case sensitivity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CaseSensitivity {
    #[default]
    Default,
    Insensitive,
    Sensitive,
}
