//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use url::Url;

use topictree_extract::{ExtractOptions, PipelineConfig, TreeExtractor, TreeReconstructor};
use topictree_markup::Markup;
use topictree_render::HttpRenderer;
use topictree_shared::{AppConfig, init_config, load_config, load_config_from};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// TopicTree — turn rendered mind maps into topic trees.
#[derive(Parser)]
#[command(
    name = "topictree",
    version,
    about = "Reconstruct the topic hierarchy of rendered mind-map diagrams.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.topictree/topictree.toml.
    #[arg(long, global = true, env = "TOPICTREE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Fetch one or more diagram URLs and print their topic trees as JSON.
    Extract {
        /// Diagram URLs.
        #[arg(required = true)]
        urls: Vec<String>,

        /// Write the JSON to this file instead of stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Per-URL deadline in seconds (overrides config).
        #[arg(long)]
        timeout: Option<u64>,

        /// Maximum URLs fetched at once (overrides config).
        #[arg(long)]
        concurrency: Option<u32>,
    },

    /// Reconstruct the topic tree of a saved diagram page.
    Parse {
        /// Path to the saved markup.
        file: PathBuf,

        /// Id of the root node (defaults to the file path).
        #[arg(long)]
        root_id: Option<String>,

        /// Title of the root node (overrides config).
        #[arg(long)]
        root_title: Option<String>,

        /// Deepest expanded nesting level, 0 for unlimited (overrides config).
        #[arg(long)]
        max_depth: Option<usize>,

        /// Print skipped connectors and topics to stderr.
        #[arg(long)]
        report: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr so stdout stays JSON.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "topictree=warn",
        1 => "topictree=info",
        2 => "topictree=debug",
        _ => "topictree=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone();
    match cli.command {
        Command::Extract {
            urls,
            out,
            timeout,
            concurrency,
        } => {
            let mut config = resolve_config(config_path.as_deref())?;
            if let Some(secs) = timeout {
                config.render.timeout_secs = secs;
            }
            if let Some(n) = concurrency {
                config.render.concurrency = n;
            }
            config.validate()?;
            cmd_extract(&urls, out.as_deref(), &config).await
        }
        Command::Parse {
            file,
            root_id,
            root_title,
            max_depth,
            report,
        } => {
            let mut config = resolve_config(config_path.as_deref())?;
            if let Some(title) = root_title {
                config.extract.root_title = title;
            }
            if let Some(depth) = max_depth {
                config.extract.max_depth = depth;
            }
            cmd_parse(&file, root_id.as_deref(), report, &config)
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path.as_deref()),
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_extract(urls: &[String], out: Option<&Path>, config: &AppConfig) -> Result<()> {
    let parsed = urls
        .iter()
        .map(|u| Url::parse(u).map_err(|e| eyre!("invalid URL '{u}': {e}")))
        .collect::<Result<Vec<_>>>()?;

    info!(
        urls = parsed.len(),
        timeout_secs = config.render.timeout_secs,
        concurrency = config.render.concurrency,
        "extracting topic trees"
    );

    let renderer = HttpRenderer::with_timeout(config.render.client_timeout())?;
    let extractor = TreeExtractor::new(renderer, PipelineConfig::from(config))?;

    let progress = CliProgress::new();
    progress.phase(&format!("Extracting {} diagram(s)", parsed.len()));
    let result = extractor.process_urls(&parsed).await;
    progress.done();
    let trees = result?;

    write_json(&trees, out)?;

    if let Some(path) = out {
        let topics: usize = trees.iter().map(|t| t.node_count() - 1).sum();
        eprintln!();
        eprintln!("  Extracted {} tree(s), {topics} topic(s)", trees.len());
        eprintln!("  Written to {}", path.display());
        eprintln!();
    }

    Ok(())
}

fn cmd_parse(file: &Path, root_id: Option<&str>, report: bool, config: &AppConfig) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .map_err(|e| eyre!("cannot read '{}': {e}", file.display()))?;

    let root_id = root_id
        .map(String::from)
        .unwrap_or_else(|| file.display().to_string());

    let reconstructor = TreeReconstructor::new(ExtractOptions::from(&config.extract))?;
    let document = Markup::parse_document(&content);
    let extraction = reconstructor.extract(&document, &root_id, &config.extract.root_title);

    info!(
        file = %file.display(),
        topics = extraction.tree.node_count() - 1,
        skipped = extraction.skipped.len(),
        "parsed saved diagram"
    );

    write_json(&extraction.tree, None)?;

    if report {
        eprintln!();
        if extraction.skipped.is_empty() {
            eprintln!("  Nothing skipped.");
        } else {
            eprintln!("  Skipped ({}):", extraction.skipped.len());
            for event in &extraction.skipped {
                eprintln!("    - {event}");
            }
        }
        eprintln!();
    }

    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = resolve_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

/// Pretty-print `value` as JSON to `out`, or stdout when `None`.
fn write_json<T: serde::Serialize + ?Sized>(value: &T, out: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match out {
        Some(path) => std::fs::write(path, json + "\n")
            .map_err(|e| eyre!("cannot write '{}': {e}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Spinner shown on stderr while diagrams are fetched.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self) {
        self.spinner.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use topictree_shared::TopicNode;

    #[test]
    fn parses_extract_arguments() {
        let cli = Cli::try_parse_from([
            "topictree",
            "-vv",
            "extract",
            "https://maps.example.com/a",
            "https://maps.example.com/b",
            "--timeout",
            "10",
        ])
        .expect("parse");
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Extract { urls, timeout, .. } => {
                assert_eq!(urls.len(), 2);
                assert_eq!(timeout, Some(10));
            }
            _ => panic!("expected extract"),
        }
    }

    #[test]
    fn extract_requires_a_url() {
        assert!(Cli::try_parse_from(["topictree", "extract"]).is_err());
    }

    #[test]
    fn parses_parse_arguments() {
        let cli = Cli::try_parse_from([
            "topictree",
            "parse",
            "saved.html",
            "--root-title",
            "Course",
            "--report",
        ])
        .expect("parse");
        match cli.command {
            Command::Parse {
                file,
                root_title,
                report,
                ..
            } => {
                assert_eq!(file, PathBuf::from("saved.html"));
                assert_eq!(root_title.as_deref(), Some("Course"));
                assert!(report);
            }
            _ => panic!("expected parse"),
        }
    }

    #[test]
    fn write_json_to_file() {
        let dir = std::env::temp_dir().join(format!("tt-cli-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("tree.json");

        let tree = TopicNode::new("root", "Root");
        write_json(&tree, Some(&path)).unwrap();
        let written: TopicNode =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, tree);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
