use std::fmt;

use serde::de::{
    MapAccess,
    Visitor,
};
use serde::ser::SerializeMap;
use serde::{
    Deserialize,
    Deserializer,
    Serialize,
    Serializer,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "translationFiles.includePatterns[0]")
    pub field_path: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// One numbered line per error.
fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Contents of `.ts-catalog.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogSettings {
    pub translation_files: TranslationFilesConfig,
    pub indexing: IndexingConfig,
    pub check_rules: CheckRules,
    pub diagnostics: DiagnosticsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranslationFilesConfig {
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
}

impl Default for TranslationFilesConfig {
    fn default() -> Self {
        Self {
            include_patterns: vec!["**/*.ts".to_string()],
            exclude_patterns: vec!["node_modules/**".to_string(), "target/**".to_string()],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndexingConfig {
    /// Files read in parallel.
    /// Default: 80% of CPU cores (minimum 1).
    pub num_threads: Option<usize>,
}

/// Characters accepted by default: digits, ASCII letters, common punctuation and space.
pub const DEFAULT_VALID_CHARACTERS: &str = concat!(
    "0123456789",
    "abcdefghijklmnopqrstuvwxyz",
    "ABCDEFGHIJKLMNOPQRSTUVWXYZ",
    ".,;:!?",
    "()[]<>\"'",
    "-+=",
    " ",
);

/// Text rules applied to translations by `check`.
///
/// Ignored codes and substrings are removed before the other rules run, so
/// markup such as game codes or `{placeholders}` is not reported.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckRules {
    /// Every character allowed in a translation.
    pub valid_characters: String,
    pub banwords: Vec<String>,
    pub ignored_codes_into_space: Vec<String>,
    pub ignored_codes_into_nothing: Vec<String>,
    pub ignored_substrings_into_space: IgnoredSubstrings,
    pub ignored_substrings_into_nothing: IgnoredSubstrings,
}

impl Default for CheckRules {
    fn default() -> Self {
        Self {
            valid_characters: DEFAULT_VALID_CHARACTERS.to_string(),
            banwords: Vec::new(),
            ignored_codes_into_space: Vec::new(),
            ignored_codes_into_nothing: Vec::new(),
            ignored_substrings_into_space: IgnoredSubstrings::default(),
            ignored_substrings_into_nothing: IgnoredSubstrings::default(),
        }
    }
}

/// Start delimiter → possible end delimiters, kept in configuration order.
///
/// Start delimiters are tried in this order, so the JSON object is read into a
/// list instead of a sorted map. A repeated key keeps its first position and
/// its last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoredSubstrings {
    /// `(start, ends)` pairs
    entries: Vec<(String, Vec<String>)>,
}

impl IgnoredSubstrings {
    /// Adds a start delimiter, or replaces the ends of an existing one in place.
    pub fn insert(&mut self, start: impl Into<String>, ends: Vec<String>) {
        let start = start.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == start) {
            Some((_, existing)) => *existing = ends,
            None => self.entries.push((start, ends)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(start, ends)| (start.as_str(), ends.as_slice()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Vec<String>)> for IgnoredSubstrings {
    fn from_iter<I: IntoIterator<Item = (S, Vec<String>)>>(iter: I) -> Self {
        let mut substrings = Self::default();
        for (start, ends) in iter {
            substrings.insert(start, ends);
        }
        substrings
    }
}

impl Serialize for IgnoredSubstrings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (start, ends) in &self.entries {
            map.serialize_entry(start, ends)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for IgnoredSubstrings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(IgnoredSubstringsVisitor)
    }
}

/// Reads a JSON object entry by entry, in document order.
struct IgnoredSubstringsVisitor;

impl<'de> Visitor<'de> for IgnoredSubstringsVisitor {
    type Value = IgnoredSubstrings;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("an object mapping start delimiters to lists of end delimiters")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut substrings = IgnoredSubstrings::default();
        while let Some((start, ends)) = access.next_entry::<String, Vec<String>>()? {
            substrings.insert(start, ends);
        }
        Ok(substrings)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiagnosticsConfig {
    /// Report `unfinished-translation`.
    pub unfinished: bool,
    /// Report `missing-translation`.
    pub missing: bool,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self { unfinished: true, missing: true }
    }
}

impl CatalogSettings {
    /// # Errors
    /// - No include pattern
    /// - Invalid glob pattern
    /// - Zero threads
    /// - Empty ignored code or substring delimiter
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.translation_files.include_patterns.is_empty() {
            errors.push(ValidationError::new(
                "translationFiles.includePatterns",
                "At least one pattern is required. Example: [\"**/*.ts\"]",
            ));
        }

        let patterns = [
            ("translationFiles.includePatterns", &self.translation_files.include_patterns),
            ("translationFiles.excludePatterns", &self.translation_files.exclude_patterns),
        ];
        for (field, list) in patterns {
            for (index, pattern) in list.iter().enumerate() {
                if let Err(e) = globset::Glob::new(pattern) {
                    errors.push(ValidationError::new(
                        format!("{field}[{index}]"),
                        format!("Invalid glob pattern '{pattern}': {e}"),
                    ));
                }
            }
        }

        if self.indexing.num_threads == Some(0) {
            errors.push(ValidationError::new(
                "indexing.numThreads",
                "Must be at least 1, or removed to use the default",
            ));
        }

        self.check_rules.validate(&mut errors);

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl CheckRules {
    /// Appends rule errors to `errors`.
    fn validate(&self, errors: &mut Vec<ValidationError>) {
        let codes = [
            ("checkRules.ignoredCodesIntoSpace", &self.ignored_codes_into_space),
            ("checkRules.ignoredCodesIntoNothing", &self.ignored_codes_into_nothing),
        ];
        for (field, list) in codes {
            for (index, code) in list.iter().enumerate() {
                if code.is_empty() {
                    errors.push(ValidationError::new(
                        format!("{field}[{index}]"),
                        "The code cannot be empty",
                    ));
                }
            }
        }

        let substrings = [
            ("checkRules.ignoredSubstringsIntoSpace", &self.ignored_substrings_into_space),
            ("checkRules.ignoredSubstringsIntoNothing", &self.ignored_substrings_into_nothing),
        ];
        for (field, map) in substrings {
            for (start, ends) in map.iter() {
                if start.is_empty() {
                    errors.push(ValidationError::new(
                        field,
                        "The start delimiter cannot be empty",
                    ));
                }
                if ends.is_empty() {
                    errors.push(ValidationError::new(
                        format!("{field}[\"{start}\"]"),
                        "At least one end delimiter is required. Example: [\"}\"]",
                    ));
                }
                for (index, end) in ends.iter().enumerate() {
                    if end.is_empty() {
                        errors.push(ValidationError::new(
                            format!("{field}[\"{start}\"][{index}]"),
                            "The end delimiter cannot be empty",
                        ));
                    }
                }
            }
        }
    }
}
