//! CSS selector parsing and matching.
//!
//! This crate parses selector lists with cssparser and evaluates them against
//! the DOM tree.

pub mod matching;
pub mod parser;
pub mod selector;

pub use matching::{matches_list, matches_selector, query_selector};
pub use parser::{parse_selector_list, SelectorError};
pub use selector::{
    AttributeOperator, AttributeSelector, CaseSensitivity, Combinator, CompoundSelector, Selector,
    SelectorList,
};
