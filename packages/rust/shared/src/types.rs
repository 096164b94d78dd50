//! Core domain types for reconstructed topic trees.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Title given to the synthetic root when the caller does not choose one.
pub const DEFAULT_ROOT_TITLE: &str = "Root";

// ---------------------------------------------------------------------------
// TopicNode
// ---------------------------------------------------------------------------

/// One topic of a reconstructed mind map.
///
/// The root carries the source address as its `id`; every other node carries
/// the GUID found in the diagram's connector addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicNode {
    /// Source address (root) or diagram GUID.
    pub id: String,
    /// Trimmed label text, empty when the diagram has no label for this topic.
    pub title: String,
    /// Sub-topics in order of first discovery.
    #[serde(default)]
    pub children: Vec<TopicNode>,
}

impl TopicNode {
    /// Create a node without children.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            children: Vec::new(),
        }
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(TopicNode::node_count).sum::<usize>()
    }

    /// All ids of this subtree in pre-order.
    pub fn ids(&self) -> Vec<&str> {
        let mut out = Vec::with_capacity(self.node_count());
        self.collect_ids(&mut out);
        out
    }

    fn collect_ids<'a>(&'a self, out: &mut Vec<&'a str>) {
        out.push(&self.id);
        for child in &self.children {
            child.collect_ids(out);
        }
    }

    /// Whether every id in the subtree appears exactly once.
    pub fn has_unique_ids(&self) -> bool {
        let ids = self.ids();
        let distinct: HashSet<&str> = ids.iter().copied().collect();
        distinct.len() == ids.len()
    }

    /// Deepest nesting level below this node (a leaf has depth 0).
    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .map(|c| c.depth() + 1)
            .max()
            .unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Skip events
// ---------------------------------------------------------------------------

/// A recoverable degradation met while reconstructing a tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipEvent {
    /// A connector address that does not encode a GUID pair.
    MalformedAddress { address: String },
    /// A container was found but no label; the node has an empty title.
    MissingLabel { guid: String },
    /// A label was found but no (non-empty) container; the node is a leaf.
    MissingContainer { guid: String },
    /// Neither container nor label exists; nothing was emitted.
    Unresolved { guid: String },
    /// The node sits at the depth cap and was not expanded.
    DepthLimit { guid: String, depth: usize },
}

/// Discriminant of [`SkipEvent`], for counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipKind {
    MalformedAddress,
    MissingLabel,
    MissingContainer,
    Unresolved,
    DepthLimit,
}

impl SkipEvent {
    /// The event's kind.
    pub fn kind(&self) -> SkipKind {
        match self {
            Self::MalformedAddress { .. } => SkipKind::MalformedAddress,
            Self::MissingLabel { .. } => SkipKind::MissingLabel,
            Self::MissingContainer { .. } => SkipKind::MissingContainer,
            Self::Unresolved { .. } => SkipKind::Unresolved,
            Self::DepthLimit { .. } => SkipKind::DepthLimit,
        }
    }
}

impl std::fmt::Display for SkipEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedAddress { address } => write!(f, "malformed connector address {address:?}"),
            Self::MissingLabel { guid } => write!(f, "{guid}: no label, title left empty"),
            Self::MissingContainer { guid } => write!(f, "{guid}: no container, emitted as leaf"),
            Self::Unresolved { guid } => write!(f, "{guid}: no container or label, dropped"),
            Self::DepthLimit { guid, depth } => {
                write!(f, "{guid}: depth limit {depth} reached, not expanded")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Best-effort tree plus everything that was skipped on the way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    /// The reconstructed tree, rooted at the synthetic root node.
    pub tree: TopicNode,
    /// Degradations in the order they were met.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkipEvent>,
}

impl Extraction {
    /// How many events of the given kind were recorded.
    pub fn skip_count(&self, kind: SkipKind) -> usize {
        self.skipped.iter().filter(|e| e.kind() == kind).count()
    }
}
