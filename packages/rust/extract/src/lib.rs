//! Topic tree extraction from rendered mind-map diagrams.
//!
//! This crate provides:
//! - [`reconstruct`] — the tree reconstructor ([`TreeReconstructor`], [`extract_tree`])
//! - [`address`] — connector / container / label address handling
//! - [`cache`] — TTL cache of extracted trees
//! - [`pipeline`] — concurrent URL → tree driver ([`TreeExtractor`])

pub mod address;
pub mod cache;
pub mod pipeline;
pub mod reconstruct;

pub use address::ConnectionAddress;
pub use cache::{ResultCache, cache_key};
pub use pipeline::{PipelineConfig, TreeExtractor};
pub use reconstruct::{ExtractOptions, TreeReconstructor, extract, extract_tree, extract_with};

#[cfg(test)]
mod tests {
    use super::*;
    use topictree_markup::Markup;
    use topictree_shared::{SkipKind, TopicNode};

    const SOURCE: &str = "https://maps.example.com/rust-course";

    fn load_fixture(name: &str) -> Markup {
        let path = format!("../../../fixtures/html/{name}");
        let content = std::fs::read_to_string(&path)
            .unwrap_or_else(|_| panic!("missing fixture: {path}"));
        Markup::parse_document(&content)
    }

    fn titles(node: &TopicNode) -> Vec<&str> {
        node.children.iter().map(|c| c.title.as_str()).collect()
    }

    #[test]
    fn fixture_reconstructs_course_outline() {
        let doc = load_fixture("mindmap.html");
        let reconstructor = TreeReconstructor::new(ExtractOptions::default()).unwrap();
        let result = reconstructor.extract(&doc, SOURCE, "Root");
        let tree = &result.tree;

        // The central topic is referenced by its own connectors, so it becomes
        // the single child of the synthetic root.
        assert_eq!(tree.id, SOURCE);
        assert_eq!(titles(tree), vec!["Rust Course"]);

        let course = &tree.children[0];
        assert_eq!(course.id, "c0");
        assert_eq!(titles(course), vec!["Getting Started", "Core Concepts", "Next Steps"]);
        assert_eq!(titles(&course.children[0]), vec!["Install rustup", "Configure"]);
        assert_eq!(titles(&course.children[1]), vec!["Ownership"]);
        assert_eq!(titles(&course.children[1].children[0]), vec!["Borrowing"]);
        assert!(course.children[2].children.is_empty());

        assert_eq!(tree.node_count(), 9);
        assert!(tree.has_unique_ids());
    }

    #[test]
    fn fixture_skip_report() {
        let doc = load_fixture("mindmap.html");
        let reconstructor = TreeReconstructor::new(ExtractOptions::default()).unwrap();
        let result = reconstructor.extract(&doc, SOURCE, "Root");

        // The central group is scanned twice: as the entry scope and as c0's container.
        assert_eq!(result.skip_count(SkipKind::MalformedAddress), 2);
        assert_eq!(result.skip_count(SkipKind::MissingContainer), 4);
        assert_eq!(result.skip_count(SkipKind::MissingLabel), 0);
        assert_eq!(result.skip_count(SkipKind::Unresolved), 0);
    }

    #[test]
    fn fixture_tree_serializes_as_nested_json() {
        let content = std::fs::read_to_string("../../../fixtures/html/mindmap.html")
            .expect("read fixture");
        let tree = extract_tree(&content, SOURCE).unwrap();
        let json = serde_json::to_value(&tree).unwrap();

        assert_eq!(json["title"], "Root");
        assert_eq!(json["children"][0]["children"][1]["children"][0]["id"], "t2a");
        assert_eq!(
            json["children"][0]["children"][1]["children"][0]["children"][0]["title"],
            "Borrowing"
        );
    }

    #[test]
    fn fixture_depth_cap_truncates_outline() {
        let doc = load_fixture("mindmap.html");
        let reconstructor = TreeReconstructor::new(ExtractOptions { max_depth: Some(2) }).unwrap();
        let result = reconstructor.extract(&doc, SOURCE, "Root");

        assert_eq!(result.tree.depth(), 2);
        // Getting Started and Core Concepts hold children; Next Steps has an empty container.
        assert_eq!(result.skip_count(SkipKind::DepthLimit), 2);
    }
}
