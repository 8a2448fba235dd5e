//! Template index
//!
//! Loads the ordered rule table mapping `(platform, command)` patterns to a
//! template filename, and resolves lookups against it. Declaration order is
//! the explicit tie-break for overlapping rules: the first rule satisfying
//! both patterns wins.
//!
//! Index format: `#` comment lines and blank lines are ignored; the first
//! significant line is a header naming the columns; each data row holds
//! template filename, platform pattern, and command pattern, separated by
//! `", "`. A pattern of `.` matches anything. Command patterns may use
//! `[[...]]` abbreviation groups, so `sh[[ow]]` accepts `sh`, `sho`, `show`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static ABBREV: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\[(\w+)\]\]").expect("hardcoded regex"));

/// Errors loading or parsing an index file.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("failed to read index file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("index file is missing its header row")]
    MissingHeader,

    #[error("index row {row}: {reason}")]
    MalformedRow { row: usize, reason: String },
}

/// Lookup failure: no index rule matched the given platform/command pair.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no template matches platform '{platform}' command '{command}'")]
pub struct NoTemplateMatch {
    pub platform: String,
    pub command: String,
}

/// One index row. `None` patterns are the `.` wildcard.
#[derive(Debug)]
struct IndexRule {
    template: String,
    platform: Option<Regex>,
    command: Option<Regex>,
}

impl IndexRule {
    fn matches(&self, platform_lower: &str, command: &str) -> bool {
        let platform_ok = self
            .platform
            .as_ref()
            .map_or(true, |re| re.is_match(platform_lower));
        let command_ok = self.command.as_ref().map_or(true, |re| re.is_match(command));
        platform_ok && command_ok
    }
}

/// Ordered rule table resolving `(platform, command)` to a template name.
#[derive(Debug)]
pub struct IndexStore {
    rules: Vec<IndexRule>,
    /// Origin of the table, when loaded from disk. Lets the host detect a
    /// stale table; there is no hidden reload.
    source: Option<(PathBuf, SystemTime)>,
}

impl IndexStore {
    /// Parse an index table from text.
    pub fn from_str(content: &str) -> Result<Self, IndexError> {
        let mut rules = Vec::new();
        let mut header_seen = false;

        for (idx, raw_line) in content.lines().enumerate() {
            let row = idx + 1;
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if !header_seen {
                let first_column = line.split(',').next().unwrap_or("").trim();
                if !first_column.eq_ignore_ascii_case("template") {
                    return Err(IndexError::MalformedRow {
                        row,
                        reason: "expected a header row naming Template, Platform, Command"
                            .to_string(),
                    });
                }
                header_seen = true;
                continue;
            }
            rules.push(parse_row(line, row)?);
        }

        if !header_seen {
            return Err(IndexError::MissingHeader);
        }

        Ok(IndexStore {
            rules,
            source: None,
        })
    }

    /// Load an index table from disk, remembering `(path, mtime)`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, IndexError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| IndexError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut store = Self::from_str(&content)?;
        let mtime = fs::metadata(path).and_then(|m| m.modified()).ok();
        store.source = mtime.map(|t| (path.to_path_buf(), t));
        Ok(store)
    }

    /// Resolve a platform/command pair to a template name.
    ///
    /// Platform matching is case-insensitive and must cover the whole
    /// platform string; command matching is case-sensitive, anchored at the
    /// start, and a partial match is enough. Rules are tested in declaration
    /// order and the first satisfying rule wins.
    pub fn resolve(&self, platform: &str, command: &str) -> Result<&str, NoTemplateMatch> {
        let platform_lower = platform.to_lowercase();
        for rule in &self.rules {
            if rule.matches(&platform_lower, command) {
                debug!(
                    "resolved ({platform}, {command}) -> {}",
                    rule.template
                );
                return Ok(&rule.template);
            }
        }
        Err(NoTemplateMatch {
            platform: platform.to_string(),
            command: command.to_string(),
        })
    }

    /// True while the on-disk file (if any) still has the mtime seen at load.
    pub fn is_current(&self) -> bool {
        match &self.source {
            None => true,
            Some((path, loaded)) => fs::metadata(path)
                .and_then(|m| m.modified())
                .map(|current| current == *loaded)
                .unwrap_or(false),
        }
    }

    /// Number of loaded rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True when the table holds no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn parse_row(line: &str, row: usize) -> Result<IndexRule, IndexError> {
    let columns: Vec<&str> = line.split(", ").map(str::trim).collect();
    if columns.len() != 3 {
        return Err(IndexError::MalformedRow {
            row,
            reason: format!("expected 3 columns, found {}", columns.len()),
        });
    }

    let platform = compile_pattern(columns[1], &format!("(?i)^(?:{})$", columns[1]), row,
        "platform")?;
    let expanded = expand_abbreviations(columns[2]);
    let command = compile_pattern(columns[2], &format!("^(?:{expanded})"), row, "command")?;

    Ok(IndexRule {
        template: columns[0].to_string(),
        platform,
        command,
    })
}

fn compile_pattern(
    raw: &str,
    anchored: &str,
    row: usize,
    which: &str,
) -> Result<Option<Regex>, IndexError> {
    if raw == "." {
        return Ok(None);
    }
    Regex::new(anchored)
        .map(Some)
        .map_err(|e| IndexError::MalformedRow {
            row,
            reason: format!("invalid {which} pattern '{raw}': {e}"),
        })
}

/// Expand `[[text]]` so every prefix of the bracketed text is accepted:
/// `sh[[ow]]` becomes `sh(?:o(?:w)?)?`.
fn expand_abbreviations(pattern: &str) -> String {
    ABBREV
        .replace_all(pattern, |caps: &regex::Captures<'_>| {
            let mut expansion = String::new();
            for c in caps[1].chars().rev() {
                expansion = if expansion.is_empty() {
                    c.to_string()
                } else {
                    format!("{c}(?:{expansion})?")
                };
            }
            format!("(?:{expansion})?")
        })
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX: &str = "\
# Keep rules most-specific first.
Template, Platform, Command

show_vlan.tmpl, .*nxos.*, ^sh[[ow]] vlan$
show_version.tmpl, .*nxos.*, ^show version
generic_vlan.tmpl, ., ^show vlan
";

    #[test]
    fn test_resolve_platform_and_command() {
        let store = IndexStore::from_str(INDEX).expect("Should load");
        let name = store.resolve("cisco_nxos", "show vlan").expect("Should resolve");
        assert_eq!(name, "show_vlan.tmpl");
    }

    #[test]
    fn test_first_listed_rule_wins() {
        // Both the nxos rule and the wildcard rule match; position decides.
        let store = IndexStore::from_str(INDEX).expect("Should load");
        assert_eq!(
            store.resolve("cisco_nxos", "show vlan").expect("Should resolve"),
            "show_vlan.tmpl"
        );

        let reordered = "\
Template, Platform, Command
generic_vlan.tmpl, ., ^show vlan
show_vlan.tmpl, .*nxos.*, ^sh[[ow]] vlan$
";
        let store = IndexStore::from_str(reordered).expect("Should load");
        assert_eq!(
            store.resolve("cisco_nxos", "show vlan").expect("Should resolve"),
            "generic_vlan.tmpl"
        );
    }

    #[test]
    fn test_platform_match_is_case_insensitive() {
        let store = IndexStore::from_str(INDEX).expect("Should load");
        assert_eq!(
            store.resolve("Cisco_NXOS", "show vlan").expect("Should resolve"),
            "show_vlan.tmpl"
        );
    }

    #[test]
    fn test_platform_must_match_fully() {
        let index = "\
Template, Platform, Command
exact.tmpl, nxos, ^show vlan
";
        let store = IndexStore::from_str(index).expect("Should load");
        assert!(store.resolve("cisco_nxos", "show vlan").is_err());
        assert!(store.resolve("nxos", "show vlan").is_ok());
    }

    #[test]
    fn test_command_anchored_partial_match() {
        let index = "\
Template, Platform, Command
ver.tmpl, ., show version
";
        let store = IndexStore::from_str(index).expect("Should load");
        // Anchored at the start, so a longer command still matches...
        assert!(store.resolve("nxos", "show version detail").is_ok());
        // ...but a mid-string occurrence does not.
        assert!(store.resolve("nxos", "do show version").is_err());
    }

    #[test]
    fn test_abbreviated_command_prefixes() {
        let store = IndexStore::from_str(INDEX).expect("Should load");
        for cmd in ["sh vlan", "sho vlan", "show vlan"] {
            assert_eq!(
                store.resolve("cisco_nxos", cmd).expect("Should resolve"),
                "show_vlan.tmpl",
                "command {cmd:?}"
            );
        }
    }

    #[test]
    fn test_no_match_carries_attempted_pair() {
        let store = IndexStore::from_str(INDEX).expect("Should load");
        let err = store
            .resolve("juniper", "show interfaces")
            .expect_err("Should not resolve");
        assert_eq!(err.platform, "juniper");
        assert_eq!(err.command, "show interfaces");
    }

    #[test]
    fn test_missing_header_rejected() {
        let err = IndexStore::from_str("# only comments\n").expect_err("Should fail");
        assert!(matches!(err, IndexError::MissingHeader));
    }

    #[test]
    fn test_data_row_before_header_rejected() {
        let err = IndexStore::from_str("a.tmpl, ., ^show\n").expect_err("Should fail");
        assert!(matches!(err, IndexError::MalformedRow { row: 1, .. }));
    }

    #[test]
    fn test_wrong_column_count_reported_with_row() {
        let index = "Template, Platform, Command\nonly_two.tmpl, .\n";
        let err = IndexStore::from_str(index).expect_err("Should fail");
        match err {
            IndexError::MalformedRow { row, reason } => {
                assert_eq!(row, 2);
                assert!(reason.contains("3 columns"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_pattern_reported_with_row() {
        let index = "Template, Platform, Command\nbad.tmpl, [, ^show\n";
        let err = IndexStore::from_str(index).expect_err("Should fail");
        match err {
            IndexError::MalformedRow { row, reason } => {
                assert_eq!(row, 2);
                assert!(reason.contains("platform pattern"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_expand_abbreviations() {
        assert_eq!(expand_abbreviations("sh[[ow]]"), "sh(?:o(?:w)?)?");
        assert_eq!(expand_abbreviations("^di[[r]]$"), "^di(?:r)?$");
        assert_eq!(expand_abbreviations("^show vlan$"), "^show vlan$");
    }

    #[test]
    fn test_from_file_tracks_mtime() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().expect("Should create temp file");
        file.write_all(INDEX.as_bytes()).expect("Should write");
        file.flush().expect("Should flush");

        let store = IndexStore::from_file(file.path()).expect("Should load");
        assert_eq!(store.len(), 3);
        assert!(store.is_current());

        // Deleting the file makes the loaded table stale.
        drop(file);
        assert!(!store.is_current());
    }
}
