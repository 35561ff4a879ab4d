//! Ordered lookup rules used to find the in-page control for a thumbar action.

use common::BridgeResult;
use css_parser::{matches_list, parse_selector_list, query_selector, SelectorList};
use dom::{Document, NodeId};

/// Play/pause controls of known players, then generic patterns.
pub const PLAY_PAUSE_SELECTORS: &[&str] = &[
    "span.pct.player__action-play.pct-player-play",
    "span.pct.player__action-pause.pct-player-pause",
    ".player__action-play",
    ".player__action-pause",
    ".pct-player-play",
    ".pct-player-pause",
    r#"button[aria-label*="play"]"#,
    r#"button[aria-label*="Play"]"#,
    r#"button[aria-label*="pause"]"#,
    r#"button[aria-label*="Pause"]"#,
    "button.play",
    "button.pause",
    ".play-button",
    ".pause-button",
    r#"[data-testid*="play"]"#,
];

pub const PREVIOUS_SELECTORS: &[&str] = &[
    r#"button[aria-label*="revious"]"#,
    r#"button[aria-label*="Previous"]"#,
    r#"button[aria-label*="PREVIOUS"]"#,
    r#"button[title*="revious"]"#,
    r#"button[title*="Previous"]"#,
    ".pct-player-previous",
    ".player__action-previous",
    r#"button[class*="previous"]"#,
    r#"button[class*="prev"]"#,
    r#"button[class*="back"]"#,
    r#"[data-testid*="previous"]"#,
    r#"[data-testid*="prev"]"#,
    "button.pct-player-previous",
    "span.pct-player-previous",
];

pub const NEXT_SELECTORS: &[&str] = &[
    r#"button[aria-label*="ext"]"#,
    r#"button[aria-label*="Next"]"#,
    ".pct-player-next",
    r#"button[class*="next"]"#,
    r#"[data-testid*="next"]"#,
];

/// Elements scanned by the free-text fallback.
pub const BUTTON_LIKE_SELECTOR: &str = r#"button, [role="button"]"#;

/// Text the free-text fallback looks for, ASCII case-insensitively.
pub const PLAY_TEXT: &str = "play";

/// Thumbar transport action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransportAction {
    PlayPause,
    Previous,
    Next,
}

impl TransportAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportAction::PlayPause => "play-pause",
            TransportAction::Previous => "previous",
            TransportAction::Next => "next",
        }
    }

    pub fn selectors(&self) -> &'static [&'static str] {
        match self {
            TransportAction::PlayPause => PLAY_PAUSE_SELECTORS,
            TransportAction::Previous => PREVIOUS_SELECTORS,
            TransportAction::Next => NEXT_SELECTORS,
        }
    }
}

/// One lookup rule.
#[derive(Clone, Debug)]
pub enum ChainRule {
    /// The first media element in document order.
    FirstMediaElement,
    /// The first element matching a selector.
    Css { source: &'static str, list: SelectorList },
    /// The first button-like element whose visible text contains `needle`.
    ButtonText { buttons: SelectorList, needle: &'static str },
}

/// What a chain found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChainMatch {
    /// A media element to toggle directly.
    Media(NodeId),
    /// An element to activate; `rule` is its index in the chain.
    Click { node: NodeId, rule: usize },
}

/// An ordered list of rules; the first rule that finds something wins.
#[derive(Clone, Debug)]
pub struct SelectorChain {
    action: TransportAction,
    rules: Vec<ChainRule>,
}

impl SelectorChain {
    /// Build the chain for an action.
    ///
    /// Play/pause tries media elements, then selectors, then button text.
    /// Previous/next only use their selectors.
    pub fn for_action(action: TransportAction) -> BridgeResult<Self> {
        let mut rules = Vec::new();

        if action == TransportAction::PlayPause {
            rules.push(ChainRule::FirstMediaElement);
        }
        for &source in action.selectors() {
            rules.push(ChainRule::Css {
                source,
                list: parse_selector_list(source)?,
            });
        }
        if action == TransportAction::PlayPause {
            rules.push(ChainRule::ButtonText {
                buttons: parse_selector_list(BUTTON_LIKE_SELECTOR)?,
                needle: PLAY_TEXT,
            });
        }

        Ok(Self { action, rules })
    }

    pub fn action(&self) -> TransportAction {
        self.action
    }

    pub fn rules(&self) -> &[ChainRule] {
        &self.rules
    }

    /// Evaluate the rules in order against the connected document.
    pub fn find(&self, document: &Document) -> Option<ChainMatch> {
        self.rules
            .iter()
            .enumerate()
            .find_map(|(index, rule)| Self::apply(rule, index, document))
    }

    fn apply(rule: &ChainRule, index: usize, document: &Document) -> Option<ChainMatch> {
        let tree = document.tree();
        match rule {
            ChainRule::FirstMediaElement => document.media_elements().first().copied().map(ChainMatch::Media),
            ChainRule::Css { list, .. } => {
                query_selector(list, tree).map(|node| ChainMatch::Click { node, rule: index })
            }
            ChainRule::ButtonText { buttons, needle } => tree
                .descendants(tree.root())
                .filter(|&node| matches_list(buttons, tree, node))
                .find(|&node| tree.visible_text(node).to_ascii_lowercase().contains(needle))
                .map(|node| ChainMatch::Click { node, rule: index }),
        }
    }

    /// Human-readable description of a rule, for logs.
    pub fn describe(&self, rule: usize) -> String {
        match self.rules.get(rule) {
            Some(ChainRule::FirstMediaElement) => "first media element".to_string(),
            Some(ChainRule::Css { source, .. }) => format!("selector `{}`", source),
            Some(ChainRule::ButtonText { needle, .. }) => format!("button text containing {:?}", needle),
            None => "unknown rule".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(doc: &mut Document, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let body = doc.body().unwrap();
        let node = doc.create_element(tag);
        for (name, value) in attrs {
            doc.set_attribute(node, name, value);
        }
        doc.append_child(body, node);
        node
    }

    fn chain(action: TransportAction) -> SelectorChain {
        SelectorChain::for_action(action).unwrap()
    }

    #[test]
    fn test_all_builtin_selectors_parse() {
        assert_eq!(chain(TransportAction::PlayPause).rules().len(), PLAY_PAUSE_SELECTORS.len() + 2);
        assert_eq!(chain(TransportAction::Previous).rules().len(), PREVIOUS_SELECTORS.len());
        assert_eq!(chain(TransportAction::Next).rules().len(), NEXT_SELECTORS.len());
    }

    #[test]
    fn test_media_element_wins_over_selectors() {
        let mut doc = Document::new();
        element(&mut doc, "button", &[("class", "play-button")]);
        let video = element(&mut doc, "video", &[]);

        assert_eq!(chain(TransportAction::PlayPause).find(&doc), Some(ChainMatch::Media(video)));
    }

    #[test]
    fn test_selector_list_order_not_document_order() {
        let mut doc = Document::new();
        let generic = element(&mut doc, "div", &[("class", "play-button")]);
        let specific = element(&mut doc, "span", &[("class", "pct player__action-pause pct-player-pause")]);

        let found = chain(TransportAction::PlayPause).find(&doc);
        assert_eq!(found, Some(ChainMatch::Click { node: specific, rule: 2 }));
        assert_ne!(found, Some(ChainMatch::Click { node: generic, rule: 13 }));
    }

    #[test]
    fn test_aria_label_case_variants() {
        let mut doc = Document::new();
        let button = element(&mut doc, "button", &[("aria-label", "Pause")]);

        let chain = chain(TransportAction::PlayPause);
        let Some(ChainMatch::Click { node, rule }) = chain.find(&doc) else {
            panic!("expected a click match");
        };
        assert_eq!(node, button);
        assert_eq!(chain.describe(rule), r#"selector `button[aria-label*="Pause"]`"#);
    }

    #[test]
    fn test_button_text_fallback() {
        let mut doc = Document::new();
        element(&mut doc, "button", &[]);
        let role_button = element(&mut doc, "div", &[("role", "button")]);
        let text = doc.create_text("Replay episode");
        doc.append_child(role_button, text);

        let chain = chain(TransportAction::PlayPause);
        let found = chain.find(&doc);
        assert_eq!(
            found,
            Some(ChainMatch::Click { node: role_button, rule: PLAY_PAUSE_SELECTORS.len() + 1 })
        );
    }

    #[test]
    fn test_hidden_text_ignored() {
        let mut doc = Document::new();
        let button = element(&mut doc, "button", &[]);
        let hidden = doc.create_element("span");
        doc.set_attribute(hidden, "hidden", "");
        let text = doc.create_text("Play");
        doc.append_child(button, hidden);
        doc.append_child(hidden, text);

        assert_eq!(chain(TransportAction::PlayPause).find(&doc), None);
    }

    #[test]
    fn test_previous_and_next_chains() {
        let mut doc = Document::new();
        let prev = element(&mut doc, "button", &[("title", "Previous track")]);
        let next = element(&mut doc, "button", &[("aria-label", "Next")]);
        // Previous/next never toggle media.
        element(&mut doc, "video", &[]);

        assert_eq!(
            chain(TransportAction::Previous).find(&doc),
            Some(ChainMatch::Click { node: prev, rule: 3 })
        );
        assert_eq!(
            chain(TransportAction::Next).find(&doc),
            Some(ChainMatch::Click { node: next, rule: 0 })
        );
    }
}
