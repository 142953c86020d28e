use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{display_results, ReportConfig};
use crate::model::{ScanResult, ScanSummary, Vulnerability};

/// Top-level JSON document. Consumers key off `results` and `summary`;
/// `configuration` echoes the invocation and `generated_at` stamps the
/// run.
#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    configuration: JsonConfiguration<'a>,
    results: Vec<JsonResult<'a>>,
    summary: ScanSummary,
}

#[derive(Serialize)]
struct JsonConfiguration<'a> {
    paths: &'a [String],
    database: &'a str,
    recursive: bool,
    include_git: bool,
    include_node_modules: bool,
    exclude_regex: Option<&'a str>,
    full_report: bool,
    json_output: bool,
    color_output: bool,
    emoji_output: bool,
}

#[derive(Serialize)]
struct JsonResult<'a> {
    project: &'a str,
    lockfiles: &'a [String],
    infected_count: usize,
    infected_packages: &'a [Vulnerability],
}

/// Prints the report as pretty-printed JSON on stdout.
pub fn print_json_report(results: &[ScanResult], config: &ReportConfig) {
    let report = build_report(results, config);
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(error) => eprintln!("Error serializing report: {error}"),
    }
}

fn build_report<'a>(results: &'a [ScanResult], config: &'a ReportConfig) -> JsonReport<'a> {
    let display = display_results(results, config.full_report);

    JsonReport {
        generated_at: Utc::now(),
        configuration: JsonConfiguration {
            paths: &config.paths,
            database: config.database.as_deref().unwrap_or("Default"),
            recursive: config.recursive,
            include_git: config.include_git,
            include_node_modules: config.include_node_modules,
            exclude_regex: config.exclude.as_deref(),
            full_report: config.full_report,
            json_output: config.json_output,
            color_output: config.style.color_enabled(),
            emoji_output: config.style.emoji_enabled(),
        },
        results: display
            .into_iter()
            .map(|result| JsonResult {
                project: &result.project,
                lockfiles: &result.lockfiles,
                infected_count: result.infected_count(),
                infected_packages: &result.infected_packages,
            })
            .collect(),
        summary: ScanSummary::from_results(results),
    }
}
