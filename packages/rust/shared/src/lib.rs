//! Shared types, error model, and configuration for TopicTree.
//!
//! This crate is the foundation depended on by all other TopicTree crates.
//! It provides:
//! - [`TopicTreeError`] — the unified error type
//! - Domain types ([`TopicNode`], [`SkipEvent`], [`Extraction`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CacheConfig, ExtractConfig, RenderConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from,
};
pub use error::{Result, TopicTreeError};
pub use types::{DEFAULT_ROOT_TITLE, Extraction, SkipEvent, SkipKind, TopicNode};
