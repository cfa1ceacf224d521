use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::error::AcaEnvError;
use crate::naming::{self, CollisionReport, NameStyle};

/// Prefix excluded by default: Terraform input variables are not app configuration.
pub const DEFAULT_EXCLUDE_PREFIX: &str = "TF_VAR_";

/// A single `KEY=value` line, value still in its on-disk form (quotes included).
#[derive(Debug, Clone, PartialEq)]
pub struct RawEntry {
    pub key: String,
    pub raw_value: String,
}

/// Result of splitting a `.env` file into entries.
#[derive(Debug, Default, PartialEq)]
pub struct ParsedFile {
    /// One entry per distinct key. A repeated key keeps its first position and its last value.
    pub entries: Vec<RawEntry>,
    /// Non-comment lines without a usable `KEY=` part.
    pub malformed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Empty,
    ExcludedPrefix,
    NotIncludedPrefix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    Included,
    Skipped(SkipReason),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SkipCounts {
    pub empty: usize,
    pub excluded_prefix: usize,
    pub not_included_prefix: usize,
    pub malformed: usize,
}

impl SkipCounts {
    fn add(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::Empty => self.empty += 1,
            SkipReason::ExcludedPrefix => self.excluded_prefix += 1,
            SkipReason::NotIncludedPrefix => self.not_included_prefix += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.empty + self.excluded_prefix + self.not_included_prefix + self.malformed
    }
}

#[derive(Debug, Clone)]
pub struct FilterOptions {
    /// Empty means every key is eligible.
    pub include_prefixes: Vec<String>,
    pub exclude_prefixes: Vec<String>,
    pub style: NameStyle,
    pub secret_prefix: Option<String>,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            include_prefixes: Vec::new(),
            exclude_prefixes: vec![DEFAULT_EXCLUDE_PREFIX.to_string()],
            style: NameStyle::default(),
            secret_prefix: None,
        }
    }
}

impl FilterOptions {
    /// Prefix rules are checked against the original key. Exclusion wins over inclusion.
    pub fn decide(&self, key: &str) -> FilterDecision {
        if self.exclude_prefixes.iter().any(|p| key.starts_with(p.as_str())) {
            return FilterDecision::Skipped(SkipReason::ExcludedPrefix);
        }
        if !self.include_prefixes.is_empty()
            && !self.include_prefixes.iter().any(|p| key.starts_with(p.as_str()))
        {
            return FilterDecision::Skipped(SkipReason::NotIncludedPrefix);
        }
        FilterDecision::Included
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedEntry {
    pub original_key: String,
    pub target_name: String,
    pub value: String,
}

#[derive(Debug, Default)]
pub struct Normalized {
    pub entries: Vec<NormalizedEntry>,
    pub skipped: SkipCounts,
}

impl Normalized {
    pub fn has_multiline_values(&self) -> bool {
        self.entries
            .iter()
            .any(|e| e.value.contains('\n') || e.value.contains('\r'))
    }
}

/// Split `.env` text into entries. Never fails: lines without `=` are only counted.
pub fn parse(content: &str) -> ParsedFile {
    let mut parsed = ParsedFile::default();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let Some(entry) = parse_line(trimmed) else {
            debug!(line = trimmed, "skipping line without KEY=");
            parsed.malformed += 1;
            continue;
        };

        match positions.get(&entry.key) {
            Some(&idx) => parsed.entries[idx].raw_value = entry.raw_value,
            None => {
                positions.insert(entry.key.clone(), parsed.entries.len());
                parsed.entries.push(entry);
            }
        }
    }

    parsed
}

fn parse_line(trimmed: &str) -> Option<RawEntry> {
    let (key, value) = trimmed.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }

    Some(RawEntry {
        key: key.to_string(),
        raw_value: value.trim().to_string(),
    })
}

/// Strip one layer of matching `"` or `'` quotes. The inner text is kept verbatim.
pub fn clean_value(raw: &str) -> String {
    for quote in ['"', '\''] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return raw[1..raw.len() - 1].to_string();
        }
    }
    raw.to_string()
}

/// Parse, filter and rename. Fails with every colliding group if two keys share a target name.
pub fn normalize(content: &str, opts: &FilterOptions) -> Result<Normalized, AcaEnvError> {
    let parsed = parse(content);
    let mut normalized = Normalized {
        entries: Vec::new(),
        skipped: SkipCounts {
            malformed: parsed.malformed,
            ..SkipCounts::default()
        },
    };
    let mut report = CollisionReport::default();

    for RawEntry { key, raw_value } in parsed.entries {
        let value = clean_value(&raw_value);
        let decision = if value.is_empty() {
            FilterDecision::Skipped(SkipReason::Empty)
        } else {
            opts.decide(&key)
        };

        if let FilterDecision::Skipped(reason) = decision {
            debug!(key = %key, ?reason, "skipped");
            normalized.skipped.add(reason);
            continue;
        }

        let target_name = naming::target_name(&key, opts.style, opts.secret_prefix.as_deref());
        report.record(&target_name, &key);
        normalized.entries.push(NormalizedEntry {
            original_key: key,
            target_name,
            value,
        });
    }

    let collisions = report.collisions();
    if !collisions.is_empty() {
        return Err(AcaEnvError::NameCollision(collisions));
    }

    Ok(normalized)
}

/// Read and normalize a `.env` file from disk.
pub fn normalize_file(path: &Path, opts: &FilterOptions) -> Result<Normalized, AcaEnvError> {
    if !path.is_file() {
        return Err(AcaEnvError::InputNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    normalize(&content, opts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(normalized: &Normalized) -> Vec<&str> {
        normalized
            .entries
            .iter()
            .map(|e| e.original_key.as_str())
            .collect()
    }

    #[test]
    fn test_comments_and_blank_lines_ignored() {
        let parsed = parse("# comment\n\n   # indented comment\nPORT=3000\n");
        assert_eq!(parsed.entries.len(), 1);
        assert_eq!(parsed.malformed, 0);
    }

    #[test]
    fn test_line_without_equals_is_counted_not_fatal() {
        let parsed = parse("MISSING_EQUALS\nPORT=3000\n=value\n");
        assert_eq!(parsed.entries.len(), 1);
        assert_eq!(parsed.malformed, 2);
    }

    #[test]
    fn test_split_at_first_equals() {
        let parsed = parse("URL=http://host?foo=bar");
        assert_eq!(parsed.entries[0].key, "URL");
        assert_eq!(parsed.entries[0].raw_value, "http://host?foo=bar");
    }

    #[test]
    fn test_key_and_value_trimmed() {
        let parsed = parse("  PORT =  3000  ");
        assert_eq!(
            parsed.entries[0],
            RawEntry {
                key: "PORT".into(),
                raw_value: "3000".into()
            }
        );
    }

    #[test]
    fn test_export_is_part_of_the_key() {
        let parsed = parse("export DB_HOST=localhost");
        assert_eq!(parsed.entries[0].key, "export DB_HOST");
    }

    #[test]
    fn test_duplicate_key_last_value_first_position() {
        let parsed = parse("A=1\nB=2\nA=3\n");
        assert_eq!(parsed.entries.len(), 2);
        assert_eq!(parsed.entries[0].key, "A");
        assert_eq!(parsed.entries[0].raw_value, "3");
        assert_eq!(parsed.entries[1].key, "B");
    }

    #[test]
    fn test_quote_stripping() {
        assert_eq!(clean_value("\"value\""), "value");
        assert_eq!(clean_value("'value'"), "value");
        assert_eq!(clean_value("va\"lu'e"), "va\"lu'e");
        assert_eq!(clean_value("\"value'"), "\"value'");
        assert_eq!(clean_value("\""), "\"");
        assert_eq!(clean_value("\"\""), "");
    }

    #[test]
    fn test_only_one_quote_layer_stripped() {
        assert_eq!(clean_value("\"'inner'\""), "'inner'");
    }

    #[test]
    fn test_backslashes_kept_as_written() {
        assert_eq!(clean_value(r#""ab\\cd\nef""#), r"ab\\cd\nef");
        assert_eq!(clean_value(r#""C:\path""#), r"C:\path");
    }

    #[test]
    fn test_escaped_value_reaches_output_unchanged() {
        let normalized =
            normalize("PASS=\"ab\\\\cd\\nef\"\n", &FilterOptions::default()).unwrap();
        assert_eq!(normalized.entries[0].value, "ab\\\\cd\\nef");
        assert!(!normalized.has_multiline_values());
    }

    #[test]
    fn test_single_quotes_are_literal() {
        assert_eq!(clean_value(r"'line1\nline2'"), r"line1\nline2");
    }

    #[test]
    fn test_default_example() {
        let content = "DB_HOST=localhost\nTF_VAR_SKIP=x\nEMPTY=\nAPI_KEY=\"secret123\"\n";
        let normalized = normalize(content, &FilterOptions::default()).unwrap();

        assert_eq!(keys(&normalized), vec!["DB_HOST", "API_KEY"]);
        assert_eq!(normalized.entries[0].target_name, "db-host");
        assert_eq!(normalized.entries[1].target_name, "api-key");
        assert_eq!(normalized.entries[1].value, "secret123");
        assert_eq!(normalized.skipped.excluded_prefix, 1);
        assert_eq!(normalized.skipped.empty, 1);
        assert_eq!(normalized.skipped.total(), 2);
    }

    #[test]
    fn test_quoted_empty_value_is_skipped() {
        let normalized = normalize("A=\"\"\nB=''\n", &FilterOptions::default()).unwrap();
        assert!(normalized.entries.is_empty());
        assert_eq!(normalized.skipped.empty, 2);
    }

    #[test]
    fn test_later_empty_value_overrides_earlier_one() {
        let normalized = normalize("A=1\nA=\n", &FilterOptions::default()).unwrap();
        assert!(normalized.entries.is_empty());
        assert_eq!(normalized.skipped.empty, 1);
    }

    #[test]
    fn test_include_prefix_restricts() {
        let opts = FilterOptions {
            include_prefixes: vec!["APP_".into(), "DB_".into()],
            ..FilterOptions::default()
        };
        let normalized = normalize("APP_NAME=x\nDB_HOST=y\nOTHER=z\n", &opts).unwrap();
        assert_eq!(keys(&normalized), vec!["APP_NAME", "DB_HOST"]);
        assert_eq!(normalized.skipped.not_included_prefix, 1);
    }

    #[test]
    fn test_exclusion_wins_over_inclusion() {
        let opts = FilterOptions {
            include_prefixes: vec!["APP_".into()],
            exclude_prefixes: vec!["APP_SECRET".into()],
            ..FilterOptions::default()
        };
        assert_eq!(
            opts.decide("APP_SECRET_KEY"),
            FilterDecision::Skipped(SkipReason::ExcludedPrefix)
        );
        assert_eq!(opts.decide("APP_NAME"), FilterDecision::Included);
    }

    #[test]
    fn test_prefixes_match_original_key_not_target() {
        let opts = FilterOptions {
            include_prefixes: vec!["db-".into()],
            ..FilterOptions::default()
        };
        let normalized = normalize("DB_HOST=x\n", &opts).unwrap();
        assert!(normalized.entries.is_empty());
    }

    #[test]
    fn test_secret_prefix_and_style() {
        let opts = FilterOptions {
            style: NameStyle::Lower,
            secret_prefix: Some("myapp-".into()),
            ..FilterOptions::default()
        };
        let normalized = normalize("DB_HOST=x\n", &opts).unwrap();
        assert_eq!(normalized.entries[0].target_name, "myapp-db_host");
    }

    #[test]
    fn test_collision_is_fatal_and_names_both_keys() {
        let err = normalize("FOO_BAR=1\nFOO-BAR=2\n", &FilterOptions::default()).unwrap_err();
        match err {
            AcaEnvError::NameCollision(collisions) => {
                assert_eq!(collisions.len(), 1);
                assert_eq!(collisions[0].target_name, "foo-bar");
                assert_eq!(collisions[0].keys, vec!["FOO_BAR", "FOO-BAR"]);
            }
            other => panic!("expected collision, got {other:?}"),
        }
    }

    #[test]
    fn test_preserve_style_avoids_collision() {
        let opts = FilterOptions {
            style: NameStyle::Preserve,
            ..FilterOptions::default()
        };
        let normalized = normalize("FOO_BAR=1\nFOO-BAR=2\n", &opts).unwrap();
        assert_eq!(normalized.entries.len(), 2);
    }

    #[test]
    fn test_multiline_detection() {
        // `lines()` only splits on `\n`, so a bare carriage return stays inside the value.
        let normalized =
            normalize("KEY=\"first\rsecond\"\nPLAIN=x\n", &FilterOptions::default()).unwrap();
        assert!(normalized.has_multiline_values());
        assert_eq!(normalized.entries[0].value, "first\rsecond");

        let normalized = normalize("PLAIN=x\n", &FilterOptions::default()).unwrap();
        assert!(!normalized.has_multiline_values());
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = normalize_file(&dir.path().join("nope.env"), &FilterOptions::default())
            .unwrap_err();
        assert!(matches!(err, AcaEnvError::InputNotFound(_)));
    }

    #[test]
    fn test_normalize_file_reads_content() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "PORT=8080\n").unwrap();
        let normalized = normalize_file(&path, &FilterOptions::default()).unwrap();
        assert_eq!(normalized.entries[0].target_name, "port");
        assert_eq!(normalized.entries[0].value, "8080");
    }
}
