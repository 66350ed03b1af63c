//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use docpup_core::pipeline::{Phase, ProgressReporter, RepoOutcome, RunSummary};
use docpup_core::{GitCheckout, generate, select_repos};
use docpup_shared::{ProjectConfig, effective_concurrency, find_config, init_config, load_config_from};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// docpup: documentation from git repositories, indexed for agents.
#[derive(Parser)]
#[command(
    name = "docpup",
    version,
    about = "Sparse-checkout docs from git repositories and build compact indices for coding agents.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

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
    /// Fetch, convert, copy and index every configured repository.
    Generate {
        /// Path to docpup.toml (defaults to ./docpup.toml).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Only process these repos (comma-separated names).
        #[arg(long, value_delimiter = ',')]
        only: Vec<String>,

        /// Number of repositories processed in parallel.
        #[arg(long)]
        concurrency: Option<usize>,

        /// Print the run summary as JSON.
        #[arg(long)]
        json: bool,

        /// git executable used for checkouts.
        #[arg(long, env = "DOCPUP_GIT", default_value = "git")]
        git: String,
    },

    /// Write a commented default docpup.toml in the current directory.
    Init,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "docpup=info",
        1 => "docpup=debug",
        _ => "docpup=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
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
    match cli.command {
        Command::Generate {
            config,
            only,
            concurrency,
            json,
            git,
        } => cmd_generate(config.as_deref(), &only, concurrency, json, git).await,
        Command::Init => cmd_init(),
    }
}

fn load_project(config_path: Option<&Path>, concurrency: Option<usize>) -> Result<ProjectConfig> {
    let path = match config_path {
        Some(p) => p.to_path_buf(),
        None => {
            let cwd = std::env::current_dir()
                .map_err(|e| eyre!("cannot determine working directory: {e}"))?;
            find_config(&cwd)?
        }
    };

    let mut config = load_config_from(&path)?;
    if concurrency.is_some() {
        config.concurrency = effective_concurrency(concurrency);
    }
    Ok(config)
}

/// Trimmed, non-empty names from a `--only` list.
fn parse_only(only: &[String]) -> Vec<String> {
    only.iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

async fn cmd_generate(
    config_path: Option<&Path>,
    only: &[String],
    concurrency: Option<usize>,
    json: bool,
    git: String,
) -> Result<()> {
    let config = load_project(config_path, concurrency)?;
    let repos = select_repos(&config.repos, &parse_only(only))?;

    info!(
        root = %config.root.display(),
        repos = repos.len(),
        concurrency = config.concurrency,
        "generating docs"
    );

    let progress: Arc<dyn ProgressReporter> = if json {
        Arc::new(docpup_core::SilentProgress)
    } else {
        Arc::new(CliProgress::new())
    };

    let summary = generate(
        Arc::new(config),
        repos,
        Arc::new(GitCheckout::with_binary(git)),
        progress,
    )
    .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!(
        "  Done: {} succeeded, {} failed ({} total)",
        summary.succeeded, summary.failed, summary.total
    );
    for failure in &summary.failures {
        println!("  ✗ {}: {}", failure.name, failure.reason);
    }
    println!();
}

fn cmd_init() -> Result<()> {
    let cwd = std::env::current_dir()?;
    let path = init_config(&cwd)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn repo_started(&self, name: &str) {
        self.spinner.set_message(format!("{name}: starting"));
    }

    fn repo_phase(&self, name: &str, phase: Phase) {
        self.spinner.set_message(format!("{name}: {phase}"));
    }

    fn repo_finished(&self, outcome: &RepoOutcome, completed: usize, total: usize) {
        let name = outcome.name();
        let line = match outcome {
            RepoOutcome::Succeeded(report) => {
                format!("✓ [{completed}/{total}] {name} ({} files)", report.files)
            }
            RepoOutcome::Failed(failure) => {
                format!("✗ [{completed}/{total}] {name}: {}", failure.reason)
            }
        };
        self.spinner.println(line);
    }

    fn done(&self, _summary: &RunSummary) {
        self.spinner.finish_and_clear();
    }
}
