//! URL → markup → topic tree, for one URL or a batch.
//!
//! Each URL is served from the [`ResultCache`] when possible. Otherwise it is
//! rendered under a deadline and reconstructed, and the tree is cached.
//! Batches run one task per URL, bounded by a semaphore, and fail as a whole
//! on the first error.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use topictree_markup::Markup;
use topictree_render::Renderer;
use topictree_shared::{AppConfig, Extraction, Result, SkipKind, TopicNode, TopicTreeError};

use crate::cache::{ResultCache, cache_key};
use crate::reconstruct::{ExtractOptions, TreeReconstructor};

/// Runtime settings of a [`TreeExtractor`].
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Deadline for rendering a single URL.
    pub timeout: Duration,
    /// Maximum number of URLs rendered at once.
    pub concurrency: usize,
    /// Lifetime of cached trees.
    pub cache_ttl: Duration,
    /// Title of each tree's synthetic root.
    pub root_title: String,
    /// Reconstruction options.
    pub extract: ExtractOptions,
}

impl From<&AppConfig> for PipelineConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            timeout: config.render.timeout(),
            concurrency: config.render.concurrency.max(1) as usize,
            cache_ttl: config.cache.ttl(),
            root_title: config.extract.root_title.clone(),
            extract: ExtractOptions::from(&config.extract),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

/// Extracts topic trees from diagram URLs.
///
/// Cheap to clone; clones share the renderer, cache, and concurrency budget.
pub struct TreeExtractor<R> {
    renderer: Arc<R>,
    reconstructor: Arc<TreeReconstructor>,
    cache: Arc<ResultCache>,
    permits: Arc<Semaphore>,
    timeout: Duration,
    root_title: Arc<str>,
}

impl<R> Clone for TreeExtractor<R> {
    fn clone(&self) -> Self {
        Self {
            renderer: Arc::clone(&self.renderer),
            reconstructor: Arc::clone(&self.reconstructor),
            cache: Arc::clone(&self.cache),
            permits: Arc::clone(&self.permits),
            timeout: self.timeout,
            root_title: Arc::clone(&self.root_title),
        }
    }
}

impl<R: Renderer + 'static> TreeExtractor<R> {
    /// Create an extractor with its own cache.
    pub fn new(renderer: R, config: PipelineConfig) -> Result<Self> {
        let cache = Arc::new(ResultCache::new(config.cache_ttl));
        Self::with_cache(renderer, config, cache)
    }

    /// Create an extractor backed by an existing cache.
    pub fn with_cache(
        renderer: R,
        config: PipelineConfig,
        cache: Arc<ResultCache>,
    ) -> Result<Self> {
        if config.concurrency == 0 {
            return Err(TopicTreeError::validation("concurrency must be at least 1"));
        }
        Ok(Self {
            renderer: Arc::new(renderer),
            reconstructor: Arc::new(TreeReconstructor::new(config.extract)?),
            cache,
            permits: Arc::new(Semaphore::new(config.concurrency)),
            timeout: config.timeout,
            root_title: config.root_title.into(),
        })
    }

    /// The cache consulted before rendering.
    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Extract the tree of a single URL.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn process_url(&self, url: &Url) -> Result<TopicNode> {
        let key = cache_key(url.as_str());
        if let Some(tree) = self.cache.get(&key) {
            debug!("cache hit");
            return Ok(tree);
        }

        let markup = {
            let _permit = self
                .permits
                .acquire()
                .await
                .map_err(|e| TopicTreeError::Network(format!("render pool closed: {e}")))?;

            tokio::time::timeout(self.timeout, self.renderer.render(url))
                .await
                .map_err(|_| TopicTreeError::Timeout {
                    url: url.to_string(),
                    after: self.timeout,
                })??
        };

        let extraction = self.reconstruct(&markup, url.as_str());
        let tree = extraction.tree;
        self.cache.set(key, tree.clone());
        Ok(tree)
    }

    /// Extract the trees of several URLs concurrently.
    ///
    /// Trees are returned in input order. Results are collected as tasks
    /// finish, so the first failure to occur aborts the remaining tasks and
    /// is returned without waiting for slower URLs.
    #[instrument(skip_all, fields(urls = urls.len()))]
    pub async fn process_urls(&self, urls: &[Url]) -> Result<Vec<TopicNode>> {
        let started = std::time::Instant::now();

        let mut tasks = JoinSet::new();
        for (index, url) in urls.iter().cloned().enumerate() {
            let this = self.clone();
            tasks.spawn(async move { (index, this.process_url(&url).await) });
        }

        let mut slots: Vec<Option<TopicNode>> = vec![None; urls.len()];
        while let Some(joined) = tasks.join_next().await {
            let failure = match joined {
                Ok((index, Ok(tree))) => {
                    slots[index] = Some(tree);
                    continue;
                }
                Ok((index, Err(e))) => {
                    error!(url = %urls[index], error = %e, "error processing URLs");
                    e
                }
                Err(e) => {
                    error!(error = %e, "extraction task failed");
                    TopicTreeError::Network(format!("extraction task failed: {e}"))
                }
            };
            tasks.abort_all();
            return Err(failure);
        }

        let trees: Vec<TopicNode> = slots.into_iter().flatten().collect();
        info!(
            trees = trees.len(),
            duration_ms = started.elapsed().as_millis(),
            "batch extracted"
        );
        Ok(trees)
    }

    /// Parse and reconstruct synchronously; the parsed document never
    /// crosses an await point.
    fn reconstruct(&self, markup: &str, root_id: &str) -> Extraction {
        let document = Markup::parse_document(markup);
        let extraction = self.reconstructor.extract(&document, root_id, &self.root_title);

        let malformed = extraction.skip_count(SkipKind::MalformedAddress);
        let unresolved = extraction.skip_count(SkipKind::Unresolved);
        let truncated = extraction.skip_count(SkipKind::DepthLimit);
        if malformed + unresolved + truncated > 0 {
            warn!(malformed, unresolved, truncated, "diagram partially reconstructed");
        }
        info!(
            topics = extraction.tree.node_count() - 1,
            depth = extraction.tree.depth(),
            "tree extracted"
        );
        extraction
    }
}
