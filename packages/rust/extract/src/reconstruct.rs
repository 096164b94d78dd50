//! Topic tree reconstruction from rendered mind-map markup.
//!
//! Connectors (`<path data-view-id="topic-connection:<a>:<b>">`) name the
//! topics related to the current subtree. Each newly met GUID becomes a node
//! whose children are found by expanding its container group. Containers and
//! labels are always looked up in the whole document, because a topic's
//! children live in a sibling region of the markup, not under its parent.

use std::collections::HashSet;

use tracing::{debug, instrument, trace};

use topictree_markup::vocabulary::{CONNECTION_KIND, CONTAINER_PREFIX};
use topictree_markup::{DiagramVocabulary, Element, Markup, first_text, has_inner_markup};
use topictree_shared::{
    DEFAULT_ROOT_TITLE, ExtractConfig, Extraction, Result, SkipEvent, TopicNode,
};

use crate::address::{ConnectionAddress, container_address, label_address, unique_guids};

/// Default deepest expanded nesting level.
pub const DEFAULT_MAX_DEPTH: usize = 256;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Knobs for a reconstruction pass.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Topics at this nesting level are emitted but not expanded.
    /// Top-level topics are at level 1. `None` expands without limit.
    pub max_depth: Option<usize>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_depth: Some(DEFAULT_MAX_DEPTH),
        }
    }
}

impl From<&ExtractConfig> for ExtractOptions {
    fn from(config: &ExtractConfig) -> Self {
        Self {
            max_depth: (config.max_depth > 0).then_some(config.max_depth),
        }
    }
}

// ---------------------------------------------------------------------------
// TreeReconstructor
// ---------------------------------------------------------------------------

/// Rebuilds topic trees. Holds only immutable state, so one instance can
/// serve any number of documents, including concurrently.
#[derive(Debug)]
pub struct TreeReconstructor {
    vocab: DiagramVocabulary,
    options: ExtractOptions,
}

impl TreeReconstructor {
    /// Create a reconstructor for the standard diagram vocabulary.
    pub fn new(options: ExtractOptions) -> Result<Self> {
        Ok(Self {
            vocab: DiagramVocabulary::new()?,
            options,
        })
    }

    /// Rebuild the tree rooted at a synthetic `root_id` / `root_title` node.
    ///
    /// Never fails: anything the diagram gets wrong is recorded in
    /// [`Extraction::skipped`] and the best-effort tree is returned.
    #[instrument(skip_all, fields(root_id = %root_id))]
    pub fn extract(&self, document: &Markup, root_id: &str, root_title: &str) -> Extraction {
        let doc_root = document.root();
        let mut root = TopicNode::new(root_id, root_title);
        let mut traversal = Traversal {
            vocab: &self.vocab,
            document: doc_root,
            max_depth: self.options.max_depth,
            processed: HashSet::new(),
            skipped: Vec::new(),
        };

        match self.vocab.group.find_first(doc_root, CONTAINER_PREFIX) {
            Some(first) if has_inner_markup(first) => {
                traversal.expand(first, &mut root.children, 1);
            }
            _ => debug!("no top-level node group found"),
        }

        debug!(
            nodes = root.node_count() - 1,
            depth = root.depth(),
            skipped = traversal.skipped.len(),
            "tree reconstructed"
        );

        Extraction {
            tree: root,
            skipped: traversal.skipped,
        }
    }
}

// ---------------------------------------------------------------------------
// Traversal
// ---------------------------------------------------------------------------

/// State of one reconstruction call.
struct Traversal<'r, 'd> {
    vocab: &'r DiagramVocabulary,
    /// Whole-document scope for container and label lookups.
    document: Element<'d>,
    max_depth: Option<usize>,
    /// GUIDs already turned into nodes (or dropped) anywhere in this call.
    processed: HashSet<String>,
    skipped: Vec<SkipEvent>,
}

impl<'d> Traversal<'_, 'd> {
    /// Append a node to `siblings` for every new GUID referenced by the
    /// connectors under `scope`. `level` is the nesting level of those nodes.
    fn expand(&mut self, scope: Element<'d>, siblings: &mut Vec<TopicNode>, level: usize) {
        for guid in self.candidate_guids(scope) {
            // Marked before expanding so a self-reference cannot recurse.
            if !self.processed.insert(guid.clone()) {
                trace!(%guid, "already processed");
                continue;
            }

            let container = self
                .vocab
                .group
                .find_exact(self.document, &container_address(&guid))
                .filter(|c| has_inner_markup(*c));
            let label = self
                .vocab
                .group
                .find_exact(self.document, &label_address(&guid));

            match (container, label) {
                (Some(container), label) => {
                    let title = match label {
                        Some(label) => first_text(label, &self.vocab.label_text),
                        None => {
                            self.skipped.push(SkipEvent::MissingLabel { guid: guid.clone() });
                            String::new()
                        }
                    };
                    let mut node = TopicNode::new(guid, title);

                    if self.max_depth.is_some_and(|max| level >= max) {
                        self.skipped.push(SkipEvent::DepthLimit {
                            guid: node.id.clone(),
                            depth: level,
                        });
                    } else {
                        self.expand(container, &mut node.children, level + 1);
                    }
                    siblings.push(node);
                }
                (None, Some(label)) => {
                    let title = first_text(label, &self.vocab.label_text);
                    self.skipped
                        .push(SkipEvent::MissingContainer { guid: guid.clone() });
                    siblings.push(TopicNode::new(guid, title));
                }
                (None, None) => {
                    self.skipped.push(SkipEvent::Unresolved { guid });
                }
            }
        }
    }

    /// GUIDs referenced by well-formed connectors under `scope`, first-seen order.
    fn candidate_guids(&mut self, scope: Element<'d>) -> Vec<String> {
        let mut edges = Vec::new();
        for connector in self.vocab.connector.find_all(scope, CONNECTION_KIND) {
            let address = self.vocab.connector.address(connector).unwrap_or_default();
            match ConnectionAddress::parse(address) {
                Some(edge) => edges.push(edge),
                None => self.skipped.push(SkipEvent::MalformedAddress {
                    address: address.to_string(),
                }),
            }
        }
        unique_guids(&edges)
    }
}

// ---------------------------------------------------------------------------
// Convenience entry points
// ---------------------------------------------------------------------------

/// Rebuild the tree of an already parsed document with default options.
pub fn extract(document: &Markup, root_id: &str, root_title: &str) -> Result<TopicNode> {
    Ok(extract_with(document, root_id, root_title, &ExtractOptions::default())?.tree)
}

/// Like [`extract`], with explicit options and the skip report.
pub fn extract_with(
    document: &Markup,
    root_id: &str,
    root_title: &str,
    options: &ExtractOptions,
) -> Result<Extraction> {
    let reconstructor = TreeReconstructor::new(options.clone())?;
    Ok(reconstructor.extract(document, root_id, root_title))
}

/// Parse `markup` and rebuild its tree under a root titled
/// [`DEFAULT_ROOT_TITLE`].
pub fn extract_tree(markup: &str, root_id: &str) -> Result<TopicNode> {
    let document = Markup::parse_document(markup);
    extract(&document, root_id, DEFAULT_ROOT_TITLE)
}
