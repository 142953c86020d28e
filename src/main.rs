use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use lockscan::{
    config::Config,
    database::{DatabaseError, VulnerabilityDatabase},
    engine::ScanEngine,
    model::{ScanConfig, ScanSummary},
    output::{print_report, OutputFormat, ReportConfig, Style},
};
use regex::Regex;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Exit codes for CI integration
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const FAILURE: u8 = 1;
}

#[derive(Parser)]
#[command(name = "lockscan")]
#[command(
    author,
    version,
    about = "Scan project lockfiles for known-compromised package versions"
)]
struct Cli {
    /// Files or directories to scan
    #[arg(default_value = ".")]
    paths: Vec<PathBuf>,

    /// Scan directories recursively
    #[arg(short, long)]
    recursive: bool,

    /// Walk into .git directories
    #[arg(short = 'g', long)]
    include_git: bool,

    /// Walk into node_modules directories
    #[arg(short = 'n', long)]
    include_node_modules: bool,

    /// Skip directories whose path matches this regular expression
    #[arg(short, long)]
    exclude: Option<String>,

    /// Show clean projects in the report as well
    #[arg(short, long)]
    full_report: bool,

    /// Emit the report as JSON on stdout
    #[arg(short, long)]
    json: bool,

    /// Disable colored output
    #[arg(short = 'C', long)]
    no_color: bool,

    /// Disable emoji in output
    #[arg(short = 'E', long)]
    no_emoji: bool,

    /// Path to the infected package database
    #[arg(short, long)]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    ExitCode::from(run(Cli::parse()).await)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> u8 {
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    let file_config = Config::load().unwrap_or_else(|error| {
        tracing::warn!(%error, "ignoring unreadable config file");
        Config::default()
    });

    let style = Style::from_flags(
        cli.no_color || file_config.no_color,
        cli.no_emoji || file_config.no_emoji,
    );

    let exclude_pattern = cli.exclude.clone().or_else(|| file_config.exclude.clone());
    let exclude = match exclude_pattern.as_deref().map(Regex::new).transpose() {
        Ok(regex) => regex,
        Err(error) => {
            if format == OutputFormat::Text {
                eprintln!(
                    "{}",
                    style.red(&format!("Error: Invalid exclude pattern: {error}"))
                );
            }
            return exit_codes::FAILURE;
        }
    };

    let explicit_database = cli.database.clone().or_else(|| file_config.database.clone());
    let database_path = explicit_database
        .clone()
        .unwrap_or_else(VulnerabilityDatabase::default_path);

    // In JSON mode stdout must stay a single parseable document, so
    // load failures are reported through the exit code alone.
    let database = match VulnerabilityDatabase::load(&database_path) {
        Ok(database) => database,
        Err(error) => {
            if format == OutputFormat::Text {
                report_database_error(&error, &style);
            }
            return exit_codes::FAILURE;
        }
    };

    if format == OutputFormat::Text {
        let name = database_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| database_path.display().to_string());
        eprintln!(
            "{}",
            style.blue(&format!(
                "Loaded {} infected package versions from {}.",
                database.entry_count(),
                name
            ))
        );
    }

    let scan_config = ScanConfig {
        paths: cli.paths.clone(),
        recursive: cli.recursive,
        include_git: cli.include_git,
        include_node_modules: cli.include_node_modules,
        exclude,
        database: database_path,
    };

    let report_config = ReportConfig {
        paths: cli.paths.iter().map(|p| p.display().to_string()).collect(),
        database: explicit_database.map(|p| p.display().to_string()),
        recursive: cli.recursive,
        include_git: cli.include_git,
        include_node_modules: cli.include_node_modules,
        exclude: exclude_pattern,
        full_report: cli.full_report,
        json_output: cli.json,
        style,
    };

    let engine = ScanEngine::new(scan_config, Arc::new(database));

    let progress = if format == OutputFormat::Text {
        Some(spinner())
    } else {
        None
    };
    let results = engine.execute().await;
    if let Some(progress) = progress {
        progress.finish_and_clear();
    }

    let summary = ScanSummary::from_results(&results);
    print_report(&results, &report_config, format);
    determine_exit_code(&summary)
}

fn report_database_error(error: &DatabaseError, style: &Style) {
    match error {
        DatabaseError::NotFound { path } => {
            eprintln!(
                "{}",
                style.red(&format!(
                    "Error: Infected database not found at: {}",
                    path.display()
                ))
            );
            eprintln!(
                "{}",
                style.yellow(
                    "Please provide a valid path using --database or ensure database.txt exists."
                )
            );
        }
        DatabaseError::Io { .. } => {
            eprintln!(
                "{}",
                style.red(&format!("Error loading infected packages: {error}"))
            );
        }
    }
}

fn spinner() -> ProgressBar {
    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    progress.enable_steady_tick(Duration::from_millis(100));
    progress.set_message("Scanning for infected packages...");
    progress
}

/// Determine the exit code from the scan outcome. Finding nothing to
/// scan is a failure, the same as finding infected projects.
fn determine_exit_code(summary: &ScanSummary) -> u8 {
    if summary.total_projects == 0 || summary.infected_projects > 0 {
        exit_codes::FAILURE
    } else {
        exit_codes::SUCCESS
    }
}
