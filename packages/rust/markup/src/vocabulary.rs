//! The element and address vocabulary of rendered mind-map diagrams.
//!
//! Every diagram element is addressed through `data-view-id`:
//!
//! | Role      | Element  | Address                                    |
//! |-----------|----------|--------------------------------------------|
//! | connector | `<path>` | `topic-connection:<parent>:<child>`        |
//! | container | `<g>`    | `topic-connection-group:<guid>`            |
//! | label     | `<g>`    | `topic-content-main-group:<guid>`          |
//!
//! A topic's title is the text of the first `<span>` inside its label.

use scraper::Selector;

use topictree_shared::{Result, TopicTreeError};

use crate::AddressedTag;

/// Attribute carrying every diagram address.
pub const ADDRESS_ATTR: &str = "data-view-id";

/// The only connection kind that forms parent/child edges.
pub const CONNECTION_KIND: &str = "topic-connection";

/// Address prefix of node-group containers.
pub const CONTAINER_PREFIX: &str = "topic-connection-group:";

/// Address prefix of label groups.
pub const LABEL_PREFIX: &str = "topic-content-main-group:";

/// Tag queries for one diagram dialect, built once and reused for a whole traversal.
#[derive(Debug)]
pub struct DiagramVocabulary {
    /// `<path>` connectors.
    pub connector: AddressedTag,
    /// `<g>` containers and labels.
    pub group: AddressedTag,
    /// Descendant holding a label's text.
    pub label_text: Selector,
}

impl DiagramVocabulary {
    /// The vocabulary used by the supported mind-map renderer.
    pub fn new() -> Result<Self> {
        let label_text = Selector::parse("span")
            .map_err(|e| TopicTreeError::parse(format!("invalid label selector: {e}")))?;
        Ok(Self {
            connector: AddressedTag::new("path", ADDRESS_ATTR)?,
            group: AddressedTag::new("g", ADDRESS_ATTR)?,
            label_text,
        })
    }
}
