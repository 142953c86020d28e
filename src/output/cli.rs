use super::{display_results, ReportConfig};
use crate::model::{ScanResult, ScanSummary};

/// Prints the human-readable report: configuration echo, one block per
/// displayed project, global summary, and a final verdict line.
pub fn print_text_report(results: &[ScanResult], config: &ReportConfig) {
    let style = &config.style;
    let display = display_results(results, config.full_report);
    let summary = ScanSummary::from_results(results);

    println!("\n{}", style.blue(&style.emoji("🔍", "Scan Configuration")));
    println!("{}", style.blue("─────────────────────"));
    for (key, value) in configuration_rows(config) {
        println!("{key:<22}: {value}");
    }
    println!();

    println!("{}", style.blue(&style.emoji("🚀", "Project Reports")));
    println!("{}", style.blue("──────────────────"));

    for result in &display {
        if result.is_infected() {
            let header = format!("[INFECTED] {}", result.project);
            println!("\n{}", style.red(&style.emoji("🚫", &header)));
            println!(
                "   {} {}",
                style.emoji("📄", "Lockfiles:"),
                result.lockfiles.join(", ")
            );
            println!(
                "   {} {}",
                style.emoji("🦠", "Infected Packages:"),
                result.infected_count()
            );
            for vulnerability in &result.infected_packages {
                println!("      - {vulnerability}");
            }
        } else {
            let header = format!("[CLEAN]    {}", result.project);
            println!("\n{}", style.green(&style.emoji("✅", &header)));
        }
    }
    println!();

    println!("{}", style.blue(&style.emoji("📊", "Global Summary")));
    println!("{}", style.blue("─────────────────"));
    println!("Total Projects: {}", summary.total_projects);
    println!("Infected:       {}", summary.infected_projects);
    println!("Clean:          {}", summary.clean_projects());
    println!("Total Issues:   {}", summary.total_infected_packages);

    println!();
    if summary.total_projects == 0 {
        println!("{}", style.yellow(&style.emoji("⚠️", "No lockfile found")));
    } else if summary.infected_projects == 0 {
        println!(
            "{}",
            style.green(&style.emoji("🎉", "No project infected. You are safe!"))
        );
    } else {
        let verdict = format!("Found {} infected projects!", summary.infected_projects);
        println!("{}", style.red(&style.emoji("❌", &verdict)));
    }
}

/// Configuration rows in display order, with booleans as Yes/No and
/// unset values as "-".
fn configuration_rows(config: &ReportConfig) -> Vec<(&'static str, String)> {
    let yes_no = |value: bool| (if value { "Yes" } else { "No" }).to_string();
    let paths = if config.paths.is_empty() {
        "-".to_string()
    } else {
        config.paths.join(", ")
    };

    vec![
        ("Paths", paths),
        (
            "Database",
            config
                .database
                .clone()
                .unwrap_or_else(|| "Default".to_string()),
        ),
        ("Recursive", yes_no(config.recursive)),
        ("Include .git", yes_no(config.include_git)),
        ("Include node_modules", yes_no(config.include_node_modules)),
        (
            "Exclude Regex",
            config.exclude.clone().unwrap_or_else(|| "-".to_string()),
        ),
        ("Full Report", yes_no(config.full_report)),
        ("JSON Output", yes_no(config.json_output)),
        ("Color Output", yes_no(config.style.color_enabled())),
        ("Emoji Output", yes_no(config.style.emoji_enabled())),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Style;

    fn config() -> ReportConfig {
        ReportConfig {
            paths: vec![".".to_string()],
            database: None,
            recursive: true,
            include_git: false,
            include_node_modules: false,
            exclude: Some("vendor".to_string()),
            full_report: false,
            json_output: false,
            style: Style::new(false, false),
        }
    }

    #[test]
    fn test_configuration_rows_render_values() {
        let rows = configuration_rows(&config());
        let lookup = |key: &str| {
            rows.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.clone())
                .unwrap()
        };

        assert_eq!(lookup("Paths"), ".");
        assert_eq!(lookup("Database"), "Default");
        assert_eq!(lookup("Recursive"), "Yes");
        assert_eq!(lookup("Include .git"), "No");
        assert_eq!(lookup("Exclude Regex"), "vendor");
        assert_eq!(lookup("Color Output"), "No");
    }

    #[test]
    fn test_configuration_rows_keep_display_order() {
        let keys: Vec<_> = configuration_rows(&config())
            .into_iter()
            .map(|(key, _)| key)
            .collect();

        assert_eq!(
            keys,
            vec![
                "Paths",
                "Database",
                "Recursive",
                "Include .git",
                "Include node_modules",
                "Exclude Regex",
                "Full Report",
                "JSON Output",
                "Color Output",
                "Emoji Output",
            ]
        );
    }
}
