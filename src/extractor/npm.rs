use serde::Deserialize;
use std::collections::BTreeMap;

use super::{ExtractError, Extractor};
use crate::database::VulnerabilityDatabase;
use crate::model::Vulnerability;

/// Extractor for npm `package-lock.json` files.
///
/// Handles lockfile versions 1 through 3 by reading both the legacy
/// `dependencies` map and the newer `packages` map when present.
pub struct NpmExtractor;

#[derive(Deserialize)]
struct NpmLockfile {
    dependencies: Option<BTreeMap<String, NpmDependency>>,
    packages: Option<BTreeMap<String, NpmDependency>>,
}

#[derive(Deserialize)]
struct NpmDependency {
    version: Option<String>,
}

impl Extractor for NpmExtractor {
    fn lockfile_name(&self) -> &'static str {
        "package-lock.json"
    }

    fn extract(
        &self,
        content: &str,
        database: &VulnerabilityDatabase,
    ) -> Result<Vec<Vulnerability>, ExtractError> {
        let lockfile: NpmLockfile = serde_json::from_str(content)?;
        let mut matches = Vec::new();

        for (name, dependency) in lockfile.dependencies.iter().flatten() {
            check(name, dependency, database, &mut matches);
        }

        for (key, dependency) in lockfile.packages.iter().flatten() {
            // The empty key is the root project itself, not a dependency.
            if key.is_empty() {
                continue;
            }
            // Keys are install paths like "node_modules/@scope/pkg" or
            // "node_modules/a/node_modules/b"; the package name is
            // whatever follows the last "node_modules/" segment.
            let name = key
                .rsplit_once("node_modules/")
                .map_or(key.as_str(), |(_, name)| name);
            check(name, dependency, database, &mut matches);
        }

        Ok(matches)
    }
}

fn check(
    name: &str,
    dependency: &NpmDependency,
    database: &VulnerabilityDatabase,
    matches: &mut Vec<Vulnerability>,
) {
    if let Some(version) = &dependency.version {
        if database.is_infected(name, version) {
            matches.push(Vulnerability::new(name, version));
        }
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
        NpmExtractor.extract(content, &db()).unwrap()
    }

    #[test]
    fn test_v1_dependencies_map() {
        let matches = extract(
            r#"{
                "lockfileVersion": 1,
                "dependencies": {
                    "event-stream": {"version": "3.3.6"},
                    "express": {"version": "4.18.2"}
                }
            }"#,
        );

        assert_eq!(matches, vec![Vulnerability::new("event-stream", "3.3.6")]);
    }

    #[test]
    fn test_v2_packages_map_strips_node_modules_prefix() {
        let matches = extract(
            r#"{
                "lockfileVersion": 2,
                "packages": {
                    "": {"name": "app", "version": "1.0.0"},
                    "node_modules/@ctrl/tinycolor": {"version": "4.1.1"},
                    "node_modules/express": {"version": "4.18.2"},
                    "node_modules/a/node_modules/left-pad": {"version": "1.3.0"}
                }
            }"#,
        );

        assert_eq!(
            matches,
            vec![
                Vulnerability::new("@ctrl/tinycolor", "4.1.1"),
                Vulnerability::new("left-pad", "1.3.0"),
            ]
        );
    }

    #[test]
    fn test_package_key_without_node_modules_is_used_verbatim() {
        let database = VulnerabilityDatabase::from_entries([("packages/app", "1.0.0")]);
        let matches = NpmExtractor
            .extract(
                r#"{"packages": {"packages/app": {"version": "1.0.0"}}}"#,
                &database,
            )
            .unwrap();

        assert_eq!(matches, vec![Vulnerability::new("packages/app", "1.0.0")]);
    }

    #[test]
    fn test_missing_version_is_skipped() {
        let matches = extract(
            r#"{
                "dependencies": {
                    "event-stream": {"resolved": "https://example.invalid"}
                }
            }"#,
        );

        assert!(matches.is_empty());
    }

    #[test]
    fn test_both_maps_are_scanned() {
        let matches = extract(
            r#"{
                "dependencies": {"event-stream": {"version": "3.3.6"}},
                "packages": {"node_modules/left-pad": {"version": "1.3.0"}}
            }"#,
        );

        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn test_null_maps_yield_no_matches() {
        let matches = extract(r#"{"dependencies": null, "packages": null}"#);
        assert!(matches.is_empty());
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let result = NpmExtractor.extract("{not json", &db());
        assert!(matches!(result, Err(ExtractError::Json(_))));
    }
}
