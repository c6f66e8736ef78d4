//! 翻訳テーブルの形式チェック
//!
//! Reports problems in the table itself: duplicate identities, work left for
//! translators, and plural forms that do not match the `numerus` flag.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::catalog::{
    Message,
    MessageKey,
    TranslationStatus,
    TranslationTable,
    TranslationText,
};
use crate::config::DiagnosticsConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        })
    }
}

/// One problem found by [`validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Stable kebab-case identifier, e.g. `duplicate-message`.
    pub code: &'static str,
    pub context: String,
    /// Source text of the message; empty for context-level problems.
    pub source: String,
    /// 1-based line in the file, when the table was parsed.
    pub line: Option<u32>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(line) = self.line {
            write!(f, "{line}: ")?;
        }
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)
    }
}

/// Checks a table with every diagnostic enabled.
#[must_use]
pub fn validate(table: &TranslationTable) -> Vec<Diagnostic> {
    validate_with(table, DiagnosticsConfig::default())
}

/// Checks a table. `config` turns off the unfinished and missing reports.
#[must_use]
pub fn validate_with(table: &TranslationTable, config: DiagnosticsConfig) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut seen_contexts: HashMap<&str, usize> = HashMap::new();
    // repeated contexts are merged by lupdate, so keys are unique per context name
    let mut first_lines: HashMap<(&str, MessageKey), Option<u32>> = HashMap::new();

    for context in table.contexts() {
        let occurrences = seen_contexts.entry(context.name()).or_default();
        *occurrences += 1;
        if *occurrences == 2 {
            diagnostics.push(Diagnostic {
                severity: Severity::Warning,
                code: "duplicate-context",
                context: context.name().to_string(),
                source: String::new(),
                line: context.messages().first().and_then(Message::line),
                message: format!(
                    "Context '{}' appears more than once; lupdate merges its messages",
                    context.name()
                ),
            });
        }

        for message in context.messages() {
            let diagnostic = |severity, code, text: String| Diagnostic {
                severity,
                code,
                context: context.name().to_string(),
                source: message.source().to_string(),
                line: message.line(),
                message: text,
            };

            let key = (context.name(), message.key());
            if let Some(first) = first_lines.get(&key).copied() {
                let key = &key.1;
                let text = match first {
                    Some(line) => format!("Duplicate message {key} (first at line {line})"),
                    None => format!("Duplicate message {key}"),
                };
                diagnostics.push(diagnostic(Severity::Error, "duplicate-message", text));
            } else {
                first_lines.insert(key, message.line());
            }

            match message.status() {
                TranslationStatus::Unfinished if config.unfinished => diagnostics.push(diagnostic(
                    Severity::Info,
                    "unfinished-translation",
                    format!("Translation of '{}' is unfinished", message.source()),
                )),
                TranslationStatus::Missing if config.missing => diagnostics.push(diagnostic(
                    Severity::Warning,
                    "missing-translation",
                    format!("Message '{}' has no translation", message.source()),
                )),
                _ => {}
            }

            if let Some(text) = numerus_mismatch(message) {
                diagnostics.push(diagnostic(Severity::Warning, "numerus-mismatch", text));
            }
        }
    }

    tracing::debug!("Validation produced {} diagnostics", diagnostics.len());
    diagnostics
}

/// Plural forms on a non-numerus message, or a numerus message translated without them.
fn numerus_mismatch(message: &Message) -> Option<String> {
    let translation = message.translation()?;
    if translation.kind.is_obsolete() {
        return None;
    }
    match (&translation.text, message.is_numerus()) {
        (TranslationText::Single(text), true) if !text.is_empty() => Some(format!(
            "Message '{}' is numerus but its translation has no plural forms",
            message.source()
        )),
        (TranslationText::Plural(_), false) => Some(format!(
            "Message '{}' has plural forms but is not marked numerus",
            message.source()
        )),
        _ => None,
    }
}
