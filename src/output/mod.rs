mod cli;
mod json;
mod style;

pub use style::Style;

use crate::model::ScanResult;

/// Output format for scan reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable report for terminals
    Text,
    /// Pretty-printed JSON for programmatic use
    Json,
}

/// Everything the report layer surfaces about how the scan was invoked.
///
/// Carries the invocation as the user wrote it (raw paths, the pattern
/// string rather than the compiled regex) so the report echoes the
/// command line instead of internal state.
pub struct ReportConfig {
    pub paths: Vec<String>,
    /// Explicitly chosen database path, if any.
    pub database: Option<String>,
    pub recursive: bool,
    pub include_git: bool,
    pub include_node_modules: bool,
    pub exclude: Option<String>,
    pub full_report: bool,
    pub json_output: bool,
    pub style: Style,
}

/// Prints the report for `results` in the requested format.
///
/// Both formats show the same findings: infected projects first, then
/// case-insensitive by path, with clean projects hidden unless a full
/// report was requested. Summary counts always cover the whole scan,
/// including hidden clean projects.
pub fn print_report(results: &[ScanResult], config: &ReportConfig, format: OutputFormat) {
    match format {
        OutputFormat::Text => cli::print_text_report(results, config),
        OutputFormat::Json => json::print_json_report(results, config),
    }
}

/// Applies display filtering and ordering to scan results.
fn display_results(results: &[ScanResult], full_report: bool) -> Vec<&ScanResult> {
    let mut display: Vec<&ScanResult> = if full_report {
        results.iter().collect()
    } else {
        results.iter().filter(|result| result.is_infected()).collect()
    };
    display.sort_by_cached_key(|result| (!result.is_infected(), result.project.to_lowercase()));
    display
}
