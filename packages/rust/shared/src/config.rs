//! Application configuration for TopicTree.
//!
//! User config lives at `~/.topictree/topictree.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TopicTreeError};
use crate::types::DEFAULT_ROOT_TITLE;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "topictree.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".topictree";

// ---------------------------------------------------------------------------
// Config structs (matching topictree.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Page rendering settings.
    #[serde(default)]
    pub render: RenderConfig,

    /// Result cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Tree reconstruction settings.
    #[serde(default)]
    pub extract: ExtractConfig,
}

/// `[render]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Per-URL render deadline in seconds. Parsing and reconstruction run
    /// after the render and are not covered by it.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum number of URLs processed at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            concurrency: default_concurrency(),
        }
    }
}

impl RenderConfig {
    /// The per-URL deadline as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Timeout for the HTTP client underneath the render deadline.
    ///
    /// Kept past [`timeout`](Self::timeout) so an overrun is always reported
    /// by the deadline, never by the client.
    pub fn client_timeout(&self) -> Duration {
        self.timeout() + CLIENT_TIMEOUT_GRACE
    }
}

/// Extra time the HTTP client gets over the render deadline.
const CLIENT_TIMEOUT_GRACE: Duration = Duration::from_secs(5);

fn default_timeout_secs() -> u64 {
    60
}
fn default_concurrency() -> u32 {
    4
}

/// `[cache]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// How long an extracted tree stays valid, in seconds.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
        }
    }
}

impl CacheConfig {
    /// The entry lifetime as a [`Duration`].
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

fn default_ttl_secs() -> u64 {
    300
}

/// `[extract]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Title given to the synthetic root node.
    #[serde(default = "default_root_title")]
    pub root_title: String,

    /// Deepest nesting level that is still expanded. `0` disables the cap.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            root_title: default_root_title(),
            max_depth: default_max_depth(),
        }
    }
}

fn default_root_title() -> String {
    DEFAULT_ROOT_TITLE.into()
}
fn default_max_depth() -> usize {
    256
}

impl AppConfig {
    /// Reject values that would make the pipeline unusable.
    pub fn validate(&self) -> Result<()> {
        if self.render.concurrency == 0 {
            return Err(TopicTreeError::config("render.concurrency must be at least 1"));
        }
        if self.render.timeout_secs == 0 {
            return Err(TopicTreeError::config("render.timeout_secs must be at least 1"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.topictree/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| TopicTreeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.topictree/topictree.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| TopicTreeError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        TopicTreeError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| TopicTreeError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| TopicTreeError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| TopicTreeError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
