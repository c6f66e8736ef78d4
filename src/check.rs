//! Checks over translation tables
//!
//! [`validate`] reports problems in the file format, [`check_table`] runs the
//! configured text rules over translated text.
/// Table diagnostics
mod diagnostics;
/// Finding ledger
mod results;
pub mod text_rules;

use std::collections::HashMap;

pub use diagnostics::{
    Diagnostic,
    Severity,
    validate,
    validate_with,
};
pub use results::{
    CheckResult,
    ResultSet,
    ResultsError,
};
use text_rules::TextLine;

use crate::catalog::TranslationTable;
use crate::config::CheckRules;

/// Runs the text rules over every active translation of `table`.
///
/// Each plural form is checked on its own. Obsolete and vanished messages are
/// skipped, as are messages without a translation. Findings are ordered by the
/// position of their text in the file.
#[must_use]
pub fn check_table(table: &TranslationTable, rules: &CheckRules) -> ResultSet {
    let lines: Vec<TextLine> = table
        .iter_messages()
        .filter_map(|(_, message)| {
            let translation = message.translation()?;
            (!translation.kind.is_obsolete()).then_some((message, translation))
        })
        .flat_map(|(message, translation)| {
            let line_number = message.line().unwrap_or_default();
            translation.text.forms().into_iter().map(move |form| TextLine::new(line_number, form))
        })
        .collect();

    let lines = text_rules::clean_lines(lines, rules);

    // a line number shared by several texts sorts at its last text
    let order: HashMap<u32, usize> =
        lines.iter().enumerate().map(|(index, line)| (line.line_number, index)).collect();

    let mut findings = text_rules::invalid_characters(&lines, &rules.valid_characters);
    findings.extend(text_rules::banwords(&lines, &rules.banwords));
    findings.sort_by_key(|finding| order.get(&finding.line_number).copied().unwrap_or(usize::MAX));

    tracing::debug!("Text rules produced {} findings", findings.len());
    ResultSet::generate_ids(findings)
}
