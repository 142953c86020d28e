use regex::Regex;

use super::{ExtractError, Extractor};
use crate::database::VulnerabilityDatabase;
use crate::model::Vulnerability;

/// Extractor for yarn classic `yarn.lock` files.
///
/// The format is line oriented: entries are separated by blank lines,
/// each starting with one or more quoted `name@range` keys followed by
/// an indented `version` line. Entries are matched with a single
/// pattern over each block rather than a full yaml parse, which also
/// copes with the berry-style `version: x.y.z` spelling.
pub struct YarnExtractor {
    entry: Regex,
}

impl YarnExtractor {
    pub fn new() -> Self {
        // Entry header line followed by its version line, e.g.
        //   "@babel/core@^7.0.0":
        //     version "7.23.0"
        let entry = Regex::new(
            r#"(?m)^['"]?(@?[^@"\s']+)@.+?['"]?:\s*(?:\r?\n|\r)\s*version(?:\s+|:\s+)["']?([^"\s']+)["']?"#,
        )
        .expect("yarn entry pattern is valid");
        Self { entry }
    }

    fn scan_block(
        &self,
        block: &str,
        database: &VulnerabilityDatabase,
        matches: &mut Vec<Vulnerability>,
    ) {
        for capture in self.entry.captures_iter(block) {
            let name = &capture[1];
            let version = &capture[2];
            if database.is_infected(name, version) {
                matches.push(Vulnerability::new(name, version));
            }
        }
    }
}

impl Default for YarnExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for YarnExtractor {
    fn lockfile_name(&self) -> &'static str {
        "yarn.lock"
    }

    fn extract(
        &self,
        content: &str,
        database: &VulnerabilityDatabase,
    ) -> Result<Vec<Vulnerability>, ExtractError> {
        let mut matches = Vec::new();
        let mut block = String::new();

        for line in content.lines() {
            if line.trim().is_empty() {
                if !block.is_empty() {
                    self.scan_block(&block, database, &mut matches);
                    block.clear();
                }
            } else {
                if !block.is_empty() {
                    block.push('\n');
                }
                block.push_str(line);
            }
        }
        if !block.is_empty() {
            self.scan_block(&block, database, &mut matches);
        }

        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> VulnerabilityDatabase {
        VulnerabilityDatabase::from_entries([
            ("event-stream", "3.3.6"),
            ("@ctrl/tinycolor", "4.1.1"),
            ("left-pad", "1.3.0"),
        ])
    }

    fn extract(content: &str) -> Vec<Vulnerability> {
        YarnExtractor::new().extract(content, &db()).unwrap()
    }

    #[test]
    fn test_classic_entry() {
        let matches = extract(
            "# yarn lockfile v1\n\n\n\
             event-stream@^3.3.4:\n  \
               version \"3.3.6\"\n  \
               resolved \"https://registry.yarnpkg.com/event-stream\"\n",
        );

        assert_eq!(matches, vec![Vulnerability::new("event-stream", "3.3.6")]);
    }

    #[test]
    fn test_scoped_quoted_entry() {
        let matches = extract(
            "\"@ctrl/tinycolor@~4.1.0\":\n  version \"4.1.1\"\n",
        );

        assert_eq!(matches, vec![Vulnerability::new("@ctrl/tinycolor", "4.1.1")]);
    }

    #[test]
    fn test_multiple_range_aliases_yield_one_match() {
        let matches = extract(
            "\"left-pad@^1.0.0\", \"left-pad@~1.3.0\":\n  version \"1.3.0\"\n",
        );

        assert_eq!(matches, vec![Vulnerability::new("left-pad", "1.3.0")]);
    }

    #[test]
    fn test_berry_style_version_line() {
        let matches = extract(
            "\"left-pad@npm:^1.0.0\":\n  version: 1.3.0\n  resolution: \"left-pad@npm:1.3.0\"\n",
        );

        assert_eq!(matches, vec![Vulnerability::new("left-pad", "1.3.0")]);
    }

    #[test]
    fn test_multiple_blocks() {
        let matches = extract(
            "event-stream@^3.3.4:\n  version \"3.3.6\"\n\n\
             express@^4.18.0:\n  version \"4.18.2\"\n\n\
             left-pad@^1.0.0:\n  version \"1.3.0\"\n",
        );

        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn test_entries_not_separated_by_blank_lines() {
        let matches = extract(
            "event-stream@^3.3.4:\n  version \"3.3.6\"\n\
             left-pad@^1.0.0:\n  version \"1.3.0\"\n",
        );

        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn test_clean_versions_do_not_match() {
        let matches = extract("event-stream@^4.0.0:\n  version \"4.0.1\"\n");
        assert!(matches.is_empty());
    }

    #[test]
    fn test_empty_content() {
        assert!(extract("").is_empty());
    }
}
