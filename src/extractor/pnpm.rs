use regex::Regex;

use super::{ExtractError, Extractor};
use crate::database::VulnerabilityDatabase;
use crate::model::Vulnerability;

/// Extractor for `pnpm-lock.yaml` files.
///
/// Package keys have changed shape across pnpm versions:
///
/// - v5: `/name/1.0.0` (scoped: `/@scope/pkg/1.0.0`)
/// - v6: `/name@1.0.0`
/// - v9: `name@1.0.0`, with peer suffixes like `(react@18.2.0)`
///
/// All of them appear as indented mapping keys, so a single line
/// pattern plus a reserved-word list covers every version without a
/// yaml dependency. Old-style `_peerhash` version suffixes are
/// truncated before lookup.
pub struct PnpmExtractor {
    key: Regex,
}

impl PnpmExtractor {
    pub fn new() -> Self {
        // Indented mapping key, optionally quoted, with the leading
        // slash of older key formats stripped.
        let key = Regex::new(r#"^\s+['"]?/?([^:'"\s]+)['"]?:"#)
            .expect("pnpm key pattern is valid");
        Self { key }
    }
}

impl Default for PnpmExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for PnpmExtractor {
    fn lockfile_name(&self) -> &'static str {
        "pnpm-lock.yaml"
    }

    fn extract(
        &self,
        content: &str,
        database: &VulnerabilityDatabase,
    ) -> Result<Vec<Vulnerability>, ExtractError> {
        let mut matches = Vec::new();

        for line in content.lines() {
            let Some(capture) = self.key.captures(line) else {
                continue;
            };
            let key = &capture[1];
            if is_reserved_key(key) {
                continue;
            }
            let Some((name, version)) = parse_coordinates(key) else {
                continue;
            };
            if database.is_infected(name, version) {
                matches.push(Vulnerability::new(name, version));
            }
        }

        Ok(matches)
    }
}

/// Mapping keys that structure the lockfile rather than name packages.
fn is_reserved_key(key: &str) -> bool {
    matches!(
        key,
        "resolution"
            | "engines"
            | "os"
            | "cpu"
            | "peerDependencies"
            | "dependencies"
            | "optionalDependencies"
            | "devDependencies"
            | "transitivePeerDependencies"
            | "dev"
            | "hasBin"
            | "requiresBuild"
            | "name"
            | "version"
            | "lockfileVersion"
            | "settings"
            | "importers"
            | "packages"
            | "specifiers"
            | "patchedDependencies"
    )
}

/// Splits a package key into name and version, or returns `None` for
/// keys that do not name a package.
fn parse_coordinates(key: &str) -> Option<(&str, &str)> {
    let key = key.split_once('(').map_or(key, |(before, _)| before);

    if !key.contains('/') && !key.contains('@') {
        return None;
    }

    // Prefer the last `@` so scoped names split correctly; an `@` at
    // position zero is a scope marker, not a separator. v5 keys have
    // no version `@` at all and split on the last `/` instead.
    let (name, version) = match key.rfind('@') {
        Some(at) if at > 0 => (&key[..at], &key[at + 1..]),
        _ => match key.rfind('/') {
            Some(slash) if slash > 0 => (&key[..slash], &key[slash + 1..]),
            _ => return None,
        },
    };

    let version = version.split_once('_').map_or(version, |(before, _)| before);

    if name.is_empty() || version.is_empty() {
        return None;
    }
    Some((name, version))
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
        PnpmExtractor::new().extract(content, &db()).unwrap()
    }

    #[test]
    fn test_v9_key() {
        let matches = extract("packages:\n\n  event-stream@3.3.6:\n    resolution: {integrity: sha512-abc}\n");
        assert_eq!(matches, vec![Vulnerability::new("event-stream", "3.3.6")]);
    }

    #[test]
    fn test_v6_key_with_leading_slash() {
        let matches = extract("  /event-stream@3.3.6:\n");
        assert_eq!(matches, vec![Vulnerability::new("event-stream", "3.3.6")]);
    }

    #[test]
    fn test_v5_key_splits_on_last_slash() {
        let matches = extract("  /event-stream/3.3.6:\n");
        assert_eq!(matches, vec![Vulnerability::new("event-stream", "3.3.6")]);
    }

    #[test]
    fn test_scoped_v5_key() {
        let matches = extract("  /@ctrl/tinycolor/4.1.1:\n");
        assert_eq!(matches, vec![Vulnerability::new("@ctrl/tinycolor", "4.1.1")]);
    }

    #[test]
    fn test_scoped_v6_key_splits_on_last_at() {
        let matches = extract("  /@ctrl/tinycolor@4.1.1:\n");
        assert_eq!(matches, vec![Vulnerability::new("@ctrl/tinycolor", "4.1.1")]);
    }

    #[test]
    fn test_quoted_key() {
        let matches = extract("  '/@ctrl/tinycolor@4.1.1':\n");
        assert_eq!(matches, vec![Vulnerability::new("@ctrl/tinycolor", "4.1.1")]);
    }

    #[test]
    fn test_peer_suffix_in_parentheses_is_stripped() {
        let matches = extract("  left-pad@1.3.0(react@18.2.0):\n");
        assert_eq!(matches, vec![Vulnerability::new("left-pad", "1.3.0")]);
    }

    #[test]
    fn test_underscore_version_suffix_is_truncated() {
        let matches = extract("  /left-pad/1.3.0_brokenhash123:\n");
        assert_eq!(matches, vec![Vulnerability::new("left-pad", "1.3.0")]);
    }

    #[test]
    fn test_underscore_suffix_with_its_own_at_splits_at_the_last_at() {
        assert_eq!(
            parse_coordinates("scoped@1.0.0_peerdep@2.0.0"),
            Some(("scoped@1.0.0_peerdep", "2.0.0"))
        );
    }

    #[test]
    fn test_reserved_and_metadata_keys_are_ignored() {
        let content = "\
lockfileVersion: '9.0'

settings:
  autoInstallPeers: true

importers:

  .:
    dependencies:
      event-stream:
        specifier: ^3.3.4
        version: 3.3.6

packages:

  event-stream@3.3.6:
    resolution: {integrity: sha512-abc}
    engines: {node: '>=0.10.0'}
    dev: false

  duplexer@0.1.2:
    resolution: {integrity: sha512-def}
";
        let matches = extract(content);
        assert_eq!(matches, vec![Vulnerability::new("event-stream", "3.3.6")]);
    }

    #[test]
    fn test_unindented_lines_never_match() {
        let matches = extract("event-stream@3.3.6:\n");
        assert!(matches.is_empty());
    }

    #[test]
    fn test_parse_coordinates_rejects_bare_words() {
        assert_eq!(parse_coordinates("integrity"), None);
        assert_eq!(parse_coordinates("sha512-abc"), None);
        assert_eq!(parse_coordinates("@1.0.0"), None);
        assert_eq!(parse_coordinates("pkg@"), None);
    }
}
