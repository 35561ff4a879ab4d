//! JSON page fixtures.

use anyhow::{bail, Context, Result};
use browser_media::MediaError;
use dom::{Document, NodeId};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// A page to install the bridge into.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageFixture {
    #[serde(default)]
    pub title: Option<String>,
    /// Children of `<body>`.
    #[serde(default)]
    pub body: Vec<NodeFixture>,
}

/// A text node or an element.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum NodeFixture {
    Text(String),
    Element(ElementFixture),
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ElementFixture {
    pub tag: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub children: Vec<NodeFixture>,
    /// Initial playback state; media elements only.
    #[serde(default)]
    pub media: Option<MediaState>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaState {
    Paused,
    Playing,
    Ended,
    /// Playback requests are rejected.
    Blocked,
}

impl PageFixture {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("invalid page fixture")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read page fixture {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("in {}", path.display()))
    }

    /// A small player page: a paused video and its transport controls.
    pub fn demo() -> Self {
        let button = |class: &str, label: &str| {
            NodeFixture::Element(ElementFixture {
                tag: "button".to_string(),
                attributes: BTreeMap::from([
                    ("class".to_string(), class.to_string()),
                    ("aria-label".to_string(), label.to_string()),
                ]),
                children: vec![NodeFixture::Text(label.to_string())],
                media: None,
            })
        };

        Self {
            title: Some("Demo player".to_string()),
            body: vec![
                NodeFixture::Element(ElementFixture {
                    tag: "video".to_string(),
                    attributes: BTreeMap::from([("id".to_string(), "player".to_string())]),
                    children: Vec::new(),
                    media: Some(MediaState::Paused),
                }),
                button("prev-track", "Previous"),
                button("play-button", "Play"),
                button("next-track", "Next"),
            ],
        }
    }

    /// Build the document.
    pub fn build(&self) -> Result<Document> {
        let mut document = Document::new();
        let body = document.body().context("document has no body")?;
        for child in &self.body {
            let node = build_node(&mut document, child)?;
            document.append_child(body, node);
        }
        Ok(document)
    }
}

fn build_node(document: &mut Document, fixture: &NodeFixture) -> Result<NodeId> {
    let element = match fixture {
        NodeFixture::Text(text) => return Ok(document.create_text(text)),
        NodeFixture::Element(element) => element,
    };

    let node = document.create_element(&element.tag);
    for (name, value) in &element.attributes {
        document.set_attribute(node, name, value);
    }
    for child in &element.children {
        let child = build_node(document, child)?;
        document.append_child(node, child);
    }

    if let Some(state) = element.media {
        let Some(media) = document.media(node) else {
            bail!("`{}` is not a media element but has a media state", element.tag);
        };
        match state {
            MediaState::Paused => {}
            MediaState::Blocked => media.set_error(Some(MediaError::NotAllowed)),
            MediaState::Playing => {
                document.play(node)?;
            }
            MediaState::Ended => {
                document.play(node)?;
                document.finish(node)?;
            }
        }
    }
    Ok(node)
}
