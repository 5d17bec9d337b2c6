//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use docmerge_core::{ProgressReporter, RunConfig};
use docmerge_shared::{
    AppConfig, MergeOutcome, OutputPlacement, RunReport, init_config, load_config,
    load_config_from,
};
use docmerge_storage::FsStore;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// docmerge — merge related documents by theme.
#[derive(Parser)]
#[command(
    name = "docmerge",
    version,
    about = "Classify documents by theme and merge each theme into one document.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also write logs to this file.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Placement of merged documents, as accepted on the command line.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum PlacementArg {
    Root,
    AlongsideMaster,
}

impl From<PlacementArg> for OutputPlacement {
    fn from(arg: PlacementArg) -> Self {
        match arg {
            PlacementArg::Root => OutputPlacement::Root,
            PlacementArg::AlongsideMaster => OutputPlacement::AlongsideMaster,
        }
    }
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Classify, back up and merge a document tree.
    Run(RunArgs),

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Arguments of `docmerge run`.
#[derive(Args)]
pub(crate) struct RunArgs {
    /// Document root (defaults to `defaults.docs_path` from the config).
    #[arg(long)]
    pub docs_path: Option<PathBuf>,

    /// Only classify and plan; nothing is backed up, written or removed.
    #[arg(long)]
    pub dry_run: bool,

    /// Backup directory (defaults to a sibling `<root>_backup`).
    #[arg(long)]
    pub backup_dir: Option<PathBuf>,

    /// Where merged documents are written.
    #[arg(long, value_enum)]
    pub placement: Option<PlacementArg>,

    /// Config file to use instead of `~/.docmerge/docmerge.toml`.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the run report as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show {
        /// Config file to show instead of the default location.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
///
/// Logs go to stderr so `--json` output on stdout stays clean.
pub(crate) fn init_tracing(cli: &Cli) -> Result<()> {
    use tracing_subscriber::{
        EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt,
    };

    let filter = match cli.verbose {
        0 => "docmerge=info",
        1 => "docmerge=debug",
        _ => "docmerge=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let console: Box<dyn Layer<Registry> + Send + Sync> = match cli.log_format {
        LogFormat::Text => fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(std::io::stderr).boxed(),
    };

    let file = match &cli.log_file {
        Some(path) => {
            let handle = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| eyre!("cannot open log file '{}': {e}", path.display()))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(handle))
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .with(env_filter)
        .init();

    Ok(())
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let log_location = cli.log_file.as_ref().map(|p| p.display().to_string());
    match cli.command {
        Command::Run(args) => cmd_run(args, log_location),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show { config } => cmd_config_show(config.as_deref()),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    Ok(match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    })
}

fn cmd_run(args: RunArgs, log_location: Option<String>) -> Result<()> {
    let app = resolve_config(args.config.as_deref())?;

    let docs_path = args
        .docs_path
        .unwrap_or_else(|| PathBuf::from(&app.defaults.docs_path));
    let backup_dir = args
        .backup_dir
        .unwrap_or_else(|| FsStore::default_backup_dir(&docs_path, &app.defaults.backup_suffix));

    let mut config = RunConfig::from_app(app);
    config.dry_run = args.dry_run;
    if let Some(placement) = args.placement {
        config.placement = placement.into();
    }
    config.log_location = log_location;

    info!(
        docs = %docs_path.display(),
        backup = %backup_dir.display(),
        dry_run = config.dry_run,
        "starting docmerge run"
    );

    let store = FsStore::open(&docs_path, &backup_dir)?;
    let reporter = CliProgress::new();
    let report = docmerge_core::run(&config, &store, &reporter)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }

    if report.failed() > 0 {
        return Err(eyre!(
            "{} of {} themes failed to merge",
            report.failed(),
            report.total_themes()
        ));
    }

    Ok(())
}

fn print_summary(report: &RunReport) {
    println!();
    if report.dry_run {
        println!("  Dry run: nothing was changed.");
    } else {
        println!("  Merge complete.");
    }
    println!("  Run:       {}", report.run_id);
    println!("  Root:      {}", report.root);
    println!("  Documents: {}", report.documents_scanned);
    println!(
        "  Themes:    {} ({} ok, {} failed, {:.1}%)",
        report.total_themes(),
        report.successful(),
        report.failed(),
        report.success_rate()
    );
    if let Some(backup) = &report.backup {
        println!("  Backup:    {}", backup.display());
    }
    if let Some(file) = &report.report_file {
        println!("  Report:    {file}");
    }
    println!();

    for result in &report.results {
        match &result.outcome {
            MergeOutcome::Merged {
                output,
                failed_removals,
                ..
            } => {
                println!("  [merged]  {} -> {output}", result.theme);
                for path in failed_removals {
                    println!("            left in place: {path}");
                }
            }
            MergeOutcome::Planned {
                master,
                source_count,
            } => {
                println!(
                    "  [plan]    {}: {source_count} documents, master {master}",
                    result.theme
                );
                for member in &result.members {
                    println!("            - {member}");
                }
            }
            MergeOutcome::Skipped { reason } => {
                println!("  [skip]    {}: {reason}", result.theme);
            }
            MergeOutcome::Failed { error } => {
                println!("  [failed]  {}: {error}", result.theme);
            }
        }
    }
    println!();
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
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn document_read(&self, path: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Reading [{current}/{total}] {path}"));
    }

    fn theme_done(&self, theme: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Merged [{current}/{total}] {theme}"));
    }

    fn done(&self, _report: &RunReport) {
        self.spinner.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_flags_parse() {
        let cli = Cli::try_parse_from([
            "docmerge",
            "-vv",
            "run",
            "--docs-path",
            "notes",
            "--dry-run",
            "--placement",
            "alongside-master",
            "--json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.docs_path, Some(PathBuf::from("notes")));
                assert!(args.dry_run);
                assert!(args.json);
                assert_eq!(
                    OutputPlacement::from(args.placement.unwrap()),
                    OutputPlacement::AlongsideMaster
                );
            }
            Command::Config { .. } => panic!("expected run"),
        }
    }

    #[test]
    fn config_show_accepts_path() {
        let cli = Cli::try_parse_from(["docmerge", "config", "show", "--config", "x.toml"]).unwrap();
        match cli.command {
            Command::Config {
                action: ConfigAction::Show { config },
            } => assert_eq!(config, Some(PathBuf::from("x.toml"))),
            _ => panic!("expected config show"),
        }
    }

    #[test]
    fn unknown_placement_is_rejected() {
        assert!(Cli::try_parse_from(["docmerge", "run", "--placement", "nowhere"]).is_err());
    }
}
