//! CLI entry point for the DocuSense analysis core.
//!
//! This binary drives the document-analysis pipeline: scan a directory,
//! register and analyze documents, inspect registry state, and clean up
//! old records.
//!
//! # Usage
//!
//! ```bash
//! docusense [OPTIONS] <COMMAND>
//!
//! # Scan a directory and show per-status counts
//! docusense scan --path ./documents
//!
//! # Register everything and run one analysis pass
//! docusense analyze --path ./documents --prompt summary --mode local
//!
//! # Live dispatch + status view
//! docusense watch --path ./documents --prompt summary
//!
//! # Registry statistics and maintenance
//! docusense status
//! docusense cleanup --days 30
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::io::Write;
use std::sync::Arc;

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand, ValueEnum};
use ds_core::{AnalysisMode, Config, FileStatus, TaskSpec, TreeNode};
use ds_queue::{AnalysisQueue, Dispatcher, HttpBackend, PromptCatalog, TaskStore};
use ds_registry::FileRegistry;
use ds_scanner::Scanner;
use ds_sync::{LocalSource, StatusSynchronizer};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Document-analysis tracker: scan directories, queue analyses, follow
/// per-file status.
#[derive(Parser)]
#[command(name = "docusense", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    command: Commands,

    /// Path to a JSON configuration file.
    #[arg(short, long, global = true, env = "DOCUSENSE_CONFIG")]
    config: Option<Utf8PathBuf>,

    /// Override the registry snapshot path.
    #[arg(long, global = true, env = "DOCUSENSE_REGISTRY")]
    registry: Option<Utf8PathBuf>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Scan a directory and display per-status counts.
    Scan {
        /// Directory to scan.
        #[arg(short, long, env = "DOCUSENSE_PATH")]
        path: Utf8PathBuf,

        /// Show the annotated tree.
        #[arg(short, long)]
        detailed: bool,
    },

    /// Register documents and run one analysis pass to completion.
    Analyze {
        /// Directory to scan for documents.
        #[arg(short, long, env = "DOCUSENSE_PATH")]
        path: Utf8PathBuf,

        /// Analysis prompt (strategy) to apply.
        #[arg(long)]
        prompt: String,

        /// Analysis engine to dispatch to.
        #[arg(short, long, value_enum, default_value_t = ModeArg::Local)]
        mode: ModeArg,
    },

    /// Run the dispatcher and status synchronizer until interrupted.
    Watch {
        /// Directory to scan for documents.
        #[arg(short, long, env = "DOCUSENSE_PATH")]
        path: Utf8PathBuf,

        /// Analysis prompt (strategy) to apply to new documents.
        #[arg(long)]
        prompt: String,

        /// Analysis engine to dispatch to.
        #[arg(short, long, value_enum, default_value_t = ModeArg::Local)]
        mode: ModeArg,
    },

    /// Display registry statistics.
    Status {
        /// Emit the report as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Purge old archived and failed records.
    Cleanup {
        /// Age threshold in days.
        #[arg(short, long)]
        days: Option<u32>,
    },

    /// List the analysis prompt catalog.
    Prompts,
}

/// Analysis engine selection.
#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    /// Bundled local engine.
    Local,
    /// OpenAI provider.
    Openai,
    /// Anthropic Claude provider.
    Claude,
    /// Mistral provider.
    Mistral,
}

impl From<ModeArg> for AnalysisMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Local => Self::Local,
            ModeArg::Openai => Self::OpenAi,
            ModeArg::Claude => Self::Claude,
            ModeArg::Mistral => Self::Mistral,
        }
    }
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// Respects the `RUST_LOG` environment variable if set. Otherwise, uses
/// `debug` level if `--verbose` is set, or `info` level by default.
/// Noisy crates like `hyper` and `reqwest` are filtered to `warn` level.
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(format!("{level},hyper=warn,reqwest=warn,mio=warn"))
    });

    // Check if colors should be disabled (flag or NO_COLOR env var)
    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_ansi(use_ansi))
        .with(filter)
        .init();
}

/// Builds the application [`Config`] from CLI arguments.
///
/// A `--config` file is parsed as JSON; missing fields fall back to
/// defaults. Provider credentials are validated by format before any
/// command runs.
fn load_config(cli: &Cli) -> color_eyre::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            let contents = std::fs::read_to_string(path.as_std_path())?;
            serde_json::from_str(&contents)?
        }
        None => Config::default(),
    };

    if let Some(registry_path) = &cli.registry {
        config.registry.snapshot_path.clone_from(registry_path);
    }

    config
        .ai
        .validate()
        .map_err(|e| color_eyre::eyre::eyre!("configuration rejected: {e}"))?;

    Ok(config)
}

/// Opens the persistent registry from the configuration.
fn open_registry(config: &Config) -> color_eyre::Result<FileRegistry> {
    FileRegistry::open(config.registry.clone())
        .map_err(|e| color_eyre::eyre::eyre!("failed to open registry: {e}"))
}

/// Wires queue, backend, and dispatcher for an analysis run.
fn build_dispatcher(
    config: &Config,
    registry: Arc<FileRegistry>,
) -> color_eyre::Result<Dispatcher<HttpBackend>> {
    let queue = AnalysisQueue::open(TaskStore::new(config.queue.store_path.clone()))
        .map_err(|e| color_eyre::eyre::eyre!("failed to open task store: {e}"))?;
    let backend = HttpBackend::new(config.ai.clone(), config.queue.backend_timeout_secs)
        .map_err(|e| color_eyre::eyre::eyre!("failed to build backend: {e}"))?;

    Ok(Dispatcher::new(
        Arc::new(queue),
        registry,
        Arc::new(backend),
        config.queue.clone(),
    ))
}

/// Registers scanned entries and enqueues them under one prompt.
fn enqueue_scan(
    registry: &FileRegistry,
    queue: &AnalysisQueue,
    entries: &[ds_core::FileEntry],
    prompt: &str,
    mode: AnalysisMode,
) -> color_eyre::Result<usize> {
    let mut specs = Vec::with_capacity(entries.len());
    for entry in entries {
        registry
            .register(&entry.relative_path, None, entry.size)
            .map_err(|e| color_eyre::eyre::eyre!("registration failed: {e}"))?;
        specs.push(TaskSpec::for_path(
            entry.relative_path.clone(),
            prompt,
            mode,
        ));
    }

    let created = queue
        .enqueue(specs)
        .map_err(|e| color_eyre::eyre::eyre!("enqueue failed: {e}"))?;
    Ok(created.len())
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

/// Runs a one-shot scan with summary output.
fn run_scan(config: &Config, path: &Utf8PathBuf, detailed: bool) -> color_eyre::Result<()> {
    info!(path = %path, "Starting scan");

    let registry = open_registry(config)?;
    let scanner = Scanner::new(config.scan.clone());
    let outcome = scanner
        .scan(path, &registry)
        .map_err(|e| color_eyre::eyre::eyre!("scan failed: {e}"))?;

    print_scan_summary(&outcome.tree, outcome.entries.len(), outcome.cache_hit);

    if detailed {
        let view = scanner.view(&outcome.tree);
        print_tree(&view.nodes);
        if view.is_truncated() {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            let _ = writeln!(
                handle,
                "(view truncated: {} siblings and {} deep nodes hidden)",
                view.hidden_siblings, view.depth_capped
            );
        }
    }

    Ok(())
}

/// Registers everything under `path` and drains the queue once.
async fn run_analyze(
    config: &Config,
    path: &Utf8PathBuf,
    prompt: &str,
    mode: AnalysisMode,
) -> color_eyre::Result<()> {
    info!(path = %path, prompt, "Starting analysis run");

    let catalog = PromptCatalog::load(&config.queue.prompts_path)
        .map_err(|e| color_eyre::eyre::eyre!("failed to load prompt catalog: {e}"))?;
    if !catalog.is_empty() && catalog.get(prompt).is_none() {
        return Err(color_eyre::eyre::eyre!("unknown prompt '{prompt}'"));
    }

    let registry = Arc::new(open_registry(config)?);
    let scanner = Scanner::new(config.scan.clone());
    let outcome = scanner
        .scan(path, &registry)
        .map_err(|e| color_eyre::eyre::eyre!("scan failed: {e}"))?;

    let dispatcher = build_dispatcher(config, Arc::clone(&registry))?;
    let queue = dispatcher.queue();

    let enqueued = enqueue_scan(&registry, &queue, &outcome.entries, prompt, mode)?;
    let processed = dispatcher.drain().await;

    let stats = registry.statistics();
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    let _ = writeln!(handle);
    let _ = writeln!(handle, "Analysis Run");
    let _ = writeln!(handle, "============");
    let _ = writeln!(handle, "Documents found:   {}", outcome.entries.len());
    let _ = writeln!(handle, "Tasks enqueued:    {enqueued}");
    let _ = writeln!(handle, "Tasks processed:   {processed}");
    let _ = writeln!(
        handle,
        "Completed:         {}",
        stats.get(FileStatus::Completed).count
    );
    let _ = writeln!(
        handle,
        "Failed:            {}",
        stats.get(FileStatus::Failed).count
    );

    Ok(())
}

/// Runs the dispatcher and synchronizer until Ctrl-C.
async fn run_watch(
    config: &Config,
    path: &Utf8PathBuf,
    prompt: &str,
    mode: AnalysisMode,
) -> color_eyre::Result<()> {
    info!(path = %path, prompt, "Starting watch mode");

    let registry = Arc::new(open_registry(config)?);
    let scanner = Scanner::new(config.scan.clone());
    let outcome = scanner
        .scan(path, &registry)
        .map_err(|e| color_eyre::eyre::eyre!("scan failed: {e}"))?;

    let mut dispatcher = build_dispatcher(config, Arc::clone(&registry))?;
    let queue = dispatcher.queue();
    enqueue_scan(&registry, &queue, &outcome.entries, prompt, mode)?;

    dispatcher.start();
    let mut sync = StatusSynchronizer::start(
        LocalSource::new(Arc::clone(&registry), Arc::clone(&queue)),
        &config.sync,
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                break;
            }
            update = sync.recv() => {
                let Some(view) = update else { break };
                let stdout = std::io::stdout();
                let mut handle = stdout.lock();
                let _ = writeln!(
                    handle,
                    "[sync] connected={} files={} tasks={} paused={}",
                    view.connected,
                    view.len(),
                    view.tasks.len(),
                    view.queue_paused,
                );
            }
        }
    }

    sync.shutdown().await;
    dispatcher.shutdown().await;
    Ok(())
}

/// Prints registry statistics.
fn run_status(config: &Config, json: bool) -> color_eyre::Result<()> {
    let registry = open_registry(config)?;
    let stats = registry.statistics();

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    if json {
        #[derive(serde::Serialize)]
        struct Report<'a> {
            statistics: &'a ds_registry::RegistryStatistics,
            records: Vec<ds_core::FileRecord>,
        }

        let report = Report {
            statistics: &stats,
            records: registry.list_by_status(None),
        };
        let _ = writeln!(handle, "{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let _ = writeln!(handle);
    let _ = writeln!(handle, "Registry Statistics");
    let _ = writeln!(handle, "===================");
    for (status, bucket) in &stats.by_status {
        let _ = writeln!(
            handle,
            "  {:<14} {:>6} files  {:>12} bytes",
            status.label(),
            bucket.count,
            bucket.total_size_bytes
        );
    }
    let _ = writeln!(
        handle,
        "  {:<14} {:>6} files  {:>12} bytes",
        "Total", stats.total.count, stats.total.total_size_bytes
    );

    Ok(())
}

/// Purges old terminal records.
fn run_cleanup(config: &Config, days: Option<u32>) -> color_eyre::Result<()> {
    let registry = open_registry(config)?;
    let days = days.unwrap_or(config.registry.cleanup_after_days);
    let removed = registry
        .cleanup(days)
        .map_err(|e| color_eyre::eyre::eyre!("cleanup failed: {e}"))?;

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    let _ = writeln!(handle, "Removed {removed} records older than {days} days");
    Ok(())
}

/// Lists the prompt catalog.
fn run_prompts(config: &Config) -> color_eyre::Result<()> {
    let catalog = PromptCatalog::load(&config.queue.prompts_path)
        .map_err(|e| color_eyre::eyre::eyre!("failed to load prompt catalog: {e}"))?;

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    if catalog.is_empty() {
        let _ = writeln!(handle, "No prompts configured");
        return Ok(());
    }
    for prompt in catalog.list() {
        let multi = if prompt.multi_document { " [multi]" } else { "" };
        let _ = writeln!(handle, "{}{multi}", prompt.id);
        let _ = writeln!(handle, "    {} - {}", prompt.title, prompt.description);
    }
    Ok(())
}

// =============================================================================
// OUTPUT HELPERS
// =============================================================================

/// Prints a per-status summary of a scanned tree.
fn print_scan_summary(tree: &[TreeNode], total: usize, cache_hit: bool) {
    let mut counts = std::collections::BTreeMap::new();
    count_statuses(tree, &mut counts);

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    let _ = writeln!(handle);
    let _ = writeln!(handle, "Scan Summary");
    let _ = writeln!(handle, "============");
    let _ = writeln!(handle);
    let _ = writeln!(handle, "Documents found: {total}");
    for (status, count) in &counts {
        let _ = writeln!(handle, "  {:<14} {count}", status.label());
    }
    if cache_hit {
        let _ = writeln!(handle, "(served from cache)");
    }
}

/// Accumulates file-node status counts over a forest.
fn count_statuses(
    nodes: &[TreeNode],
    counts: &mut std::collections::BTreeMap<FileStatus, usize>,
) {
    for node in nodes {
        if node.is_file() {
            *counts.entry(node.status).or_default() += 1;
        }
        count_statuses(&node.children, counts);
    }
}

/// Prints an indented tree listing.
fn print_tree(nodes: &[TreeNode]) {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    print_tree_level(&mut handle, nodes, 0);
}

fn print_tree_level(handle: &mut impl Write, nodes: &[TreeNode], depth: usize) {
    for node in nodes {
        let indent = "  ".repeat(depth);
        let marker = if node.is_directory() { "/" } else { "" };
        let _ = writeln!(
            handle,
            "{indent}{}{marker}  [{}]",
            node.name,
            node.status.label()
        );
        print_tree_level(handle, &node.children, depth + 1);
    }
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    // 1. Install color-eyre FIRST (before any potential panics)
    color_eyre::install()?;

    // 2. Parse CLI arguments
    let cli = Cli::parse();

    // 3. Initialize tracing (handles --no-color for log output)
    init_tracing(cli.verbose, cli.no_color);

    // 4. Load and validate configuration
    let config = load_config(&cli)?;

    // 5. Route to appropriate command
    match &cli.command {
        Commands::Scan { path, detailed } => run_scan(&config, path, *detailed),
        Commands::Analyze { path, prompt, mode } => {
            run_analyze(&config, path, prompt, (*mode).into()).await
        }
        Commands::Watch { path, prompt, mode } => {
            run_watch(&config, path, prompt, (*mode).into()).await
        }
        Commands::Status { json } => run_status(&config, *json),
        Commands::Cleanup { days } => run_cleanup(&config, *days),
        Commands::Prompts => run_prompts(&config),
    }
}
