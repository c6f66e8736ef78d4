//! Text-rule findings keyed by `<line><letter>` ids.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::de::{
    MapAccess,
    Visitor,
};
use serde::ser::SerializeMap;
use serde::{
    Deserialize,
    Deserializer,
    Serialize,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResultsError {
    #[error("Failed to access results file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid results JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// One finding of a text rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Line of the message in the checked file.
    pub line_number: u32,
    /// Checked text, after ignored codes and substrings were removed.
    pub line: String,
    /// The offending character or word.
    pub error: String,
    pub error_type: String,
    /// Finer category; the text rules use their `error_type` here.
    pub error_issue_type: String,
    pub explanation: String,
    pub suggestion: String,
}

/// Findings in id order, serialised as a JSON object `{id: result}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    /// `(id, result)` pairs in insertion order.
    entries: Vec<(String, CheckResult)>,
}

impl ResultSet {
    /// Assigns ids to `results`, keeping their order.
    ///
    /// The id is the line number followed by a letter that counts findings on
    /// that line: `1a`, `3a`, `3b`. After `z` the letters continue with `aa`.
    #[must_use]
    pub fn generate_ids(results: Vec<CheckResult>) -> Self {
        let mut per_line: HashMap<u32, usize> = HashMap::new();
        let entries = results
            .into_iter()
            .map(|result| {
                let count = per_line.entry(result.line_number).or_default();
                let id = format!("{}{}", result.line_number, letters(*count));
                *count += 1;
                (id, result)
            })
            .collect();
        Self { entries }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CheckResult> {
        self.entries.iter().find(|(key, _)| key == id).map(|(_, result)| result)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CheckResult)> {
        self.entries.iter().map(|(id, result)| (id.as_str(), result))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes one finding; `None` if there is no such id.
    pub fn delete_entry(&mut self, id: &str) -> Option<CheckResult> {
        let Some(index) = self.entries.iter().position(|(key, _)| key == id) else {
            tracing::warn!("Error {id} not found");
            return None;
        };
        Some(self.entries.remove(index).1)
    }

    /// Removes every finding of `error_type`. Returns how many were removed.
    pub fn delete_error_type(&mut self, error_type: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(_, result)| result.error_type != error_type);
        before - self.entries.len()
    }

    /// Removes findings of `error_type` whose offending text is `error`.
    pub fn delete_specific_error(&mut self, error_type: &str, error: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(_, result)| result.error_type != error_type || result.error != error);
        before - self.entries.len()
    }

    /// Pretty JSON with four-space indentation; non-ASCII text is written as is.
    pub fn to_json(&self) -> Result<String, ResultsError> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut serializer)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// Parses a results object, keeping the order of its ids.
    pub fn from_json(json: &str) -> Result<Self, ResultsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ResultsError> {
        let results = Self::from_json(&std::fs::read_to_string(path)?)?;
        tracing::debug!("Loaded {} results from {}", results.len(), path.display());
        Ok(results)
    }

    pub fn save(&self, path: &Path) -> Result<(), ResultsError> {
        std::fs::write(path, self.to_json()?)?;
        tracing::info!("Saved {} results to {}", self.len(), path.display());
        Ok(())
    }
}

impl Serialize for ResultSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, result) in &self.entries {
            map.serialize_entry(id, result)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ResultSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ResultSetVisitor)
    }
}

/// Reads `{id: result}` entries in document order.
struct ResultSetVisitor;

impl<'de> Visitor<'de> for ResultSetVisitor {
    type Value = ResultSet;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("an object mapping result ids to results")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(access.size_hint().unwrap_or_default());
        while let Some(entry) = access.next_entry::<String, CheckResult>()? {
            entries.push(entry);
        }
        Ok(ResultSet { entries })
    }
}

/// `0 → a`, `25 → z`, `26 → aa`.
fn letters(mut index: usize) -> String {
    let mut out = Vec::new();
    loop {
        out.push(b'a' + u8::try_from(index % 26).unwrap_or_default());
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}
