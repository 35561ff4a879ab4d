//! Selector matching and querying over a DOM tree.

use crate::selector::{Combinator, Selector, SelectorList};
use dom::node::NodeId;
use dom::tree::DomTree;

/// Match a selector list against an element.
pub fn matches_list(list: &SelectorList, tree: &DomTree, node: NodeId) -> bool {
    list.selectors.iter().any(|s| matches_selector(s, tree, node))
}

/// Match a single selector against an element, right to left.
pub fn matches_selector(selector: &Selector, tree: &DomTree, node: NodeId) -> bool {
    match selector.compounds.len() {
        0 => false,
        len => match_from(selector, len - 1, tree, node),
    }
}

fn match_from(selector: &Selector, index: usize, tree: &DomTree, node: NodeId) -> bool {
    let Some(element) = tree.get_element(node) else {
        return false;
    };
    if !selector.compounds[index].matches(element) {
        return false;
    }
    if index == 0 {
        return true;
    }

    let next = index - 1;
    match selector.combinators[next] {
        Combinator::Descendant => tree
            .ancestors(node)
            .any(|ancestor| match_from(selector, next, tree, ancestor)),
        Combinator::Child => tree
            .parent(node)
            .map(|parent| match_from(selector, next, tree, parent))
            .unwrap_or(false),
        Combinator::NextSibling => previous_element_sibling(tree, node)
            .map(|sibling| match_from(selector, next, tree, sibling))
            .unwrap_or(false),
        Combinator::SubsequentSibling => {
            let mut current = previous_element_sibling(tree, node);
            while let Some(sibling) = current {
                if match_from(selector, next, tree, sibling) {
                    return true;
                }
                current = previous_element_sibling(tree, sibling);
            }
            false
        }
    }
}

fn previous_element_sibling(tree: &DomTree, node: NodeId) -> Option<NodeId> {
    let mut current = tree.prev_sibling(node);
    while let Some(sibling) = current {
        if tree.get_element(sibling).is_some() {
            return Some(sibling);
        }
        current = tree.prev_sibling(sibling);
    }
    None
}

/// First connected element matching the list, in document order.
pub fn query_selector(list: &SelectorList, tree: &DomTree) -> Option<NodeId> {
    tree.descendants(tree.root())
        .find(|&node| matches_list(list, tree, node))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_selector_list;
    use dom::Document;

    fn list(css: &str) -> SelectorList {
        parse_selector_list(css).unwrap()
    }

    #[test]
    fn test_query_document_order() {
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let outer = doc.create_element("div");
        let first = doc.create_element("button");
        let second = doc.create_element("button");
        doc.append_child(body, outer);
        doc.append_child(outer, first);
        doc.append_child(body, second);

        let buttons = list("button");
        assert_eq!(query_selector(&buttons, doc.tree()), Some(first));

        doc.remove(first);
        assert_eq!(query_selector(&buttons, doc.tree()), Some(second));
    }

    #[test]
    fn test_detached_elements_not_queried() {
        let mut doc = Document::new();
        let button = doc.create_element("button");
        doc.set_attribute(button, "class", "play-button");
        assert_eq!(query_selector(&list(".play-button"), doc.tree()), None);
    }

    #[test]
    fn test_descendant_and_child() {
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let player = doc.create_element("div");
        doc.set_attribute(player, "class", "player");
        let wrapper = doc.create_element("span");
        let button = doc.create_element("button");
        doc.append_child(body, player);
        doc.append_child(player, wrapper);
        doc.append_child(wrapper, button);

        let tree = doc.tree();
        assert!(matches_list(&list(".player button"), tree, button));
        assert!(!matches_list(&list(".player > button"), tree, button));
        assert!(matches_list(&list(".player > span > button"), tree, button));
        assert!(matches_list(&list("body div span button"), tree, button));
    }

    #[test]
    fn test_sibling_combinators_skip_text() {
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let prev = doc.create_element("button");
        doc.set_attribute(prev, "class", "prev");
        let text = doc.create_text(" ");
        let play = doc.create_element("button");
        let next = doc.create_element("button");
        doc.append_child(body, prev);
        doc.append_child(body, text);
        doc.append_child(body, play);
        doc.append_child(body, next);

        let tree = doc.tree();
        assert!(matches_list(&list(".prev + button"), tree, play));
        assert!(!matches_list(&list(".prev + button"), tree, next));
        assert!(matches_list(&list(".prev ~ button"), tree, next));
    }

    #[test]
    fn test_aria_label_substring() {
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let button = doc.create_element("button");
        doc.set_attribute(button, "aria-label", "Pause video");
        doc.append_child(body, button);

        let tree = doc.tree();
        assert_eq!(query_selector(&list(r#"button[aria-label*="pause"]"#), tree), None);
        assert_eq!(query_selector(&list(r#"button[aria-label*="Pause"]"#), tree), Some(button));
    }
}
