//! Parsing and formatting of diagram addresses.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use topictree_markup::vocabulary::{CONTAINER_PREFIX, LABEL_PREFIX};

/// `topic-connection:<a>:<b>`, matched anywhere in the address.
static CONNECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"topic-connection:([^:]+):([^:]+)").expect("valid regex"));

/// A parsed connector address: an edge between two topics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionAddress {
    pub source: String,
    pub target: String,
}

impl ConnectionAddress {
    /// Parse a connector address. Returns `None` when the kind does not match
    /// or either GUID is missing.
    pub fn parse(address: &str) -> Option<Self> {
        let caps = CONNECTION_RE.captures(address)?;
        Some(Self {
            source: caps[1].to_string(),
            target: caps[2].to_string(),
        })
    }
}

/// Exact address of the node-group holding `guid`'s children.
pub fn container_address(guid: &str) -> String {
    format!("{CONTAINER_PREFIX}{guid}")
}

/// Exact address of the group holding `guid`'s title.
pub fn label_address(guid: &str) -> String {
    format!("{LABEL_PREFIX}{guid}")
}

/// Flatten edges into their GUIDs (source before target), keeping only the
/// first occurrence of each.
pub fn unique_guids<'a>(edges: impl IntoIterator<Item = &'a ConnectionAddress>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for edge in edges {
        for guid in [&edge.source, &edge.target] {
            if seen.insert(guid.as_str()) {
                out.push(guid.clone());
            }
        }
    }
    out
}
