//! Rules run over translated text: cleaning, invalid characters and banwords.

use super::results::CheckResult;
use crate::config::{
    CheckRules,
    IgnoredSubstrings,
};

/// `error_type` of [`invalid_characters`] findings.
pub const INVALID_CHARACTER: &str = "invalid-character";
/// `error_type` of [`banwords`] findings.
pub const BANWORD: &str = "banword";

/// A piece of text to check and the file line it comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLine {
    pub line_number: u32,
    pub text: String,
}

impl TextLine {
    pub fn new(line_number: u32, text: impl Into<String>) -> Self {
        Self { line_number, text: text.into() }
    }
}

/// Replaces every occurrence of each code, in list order.
#[must_use]
pub fn remove_ignored_codes(text: &str, codes: &[String], insert_space: bool) -> String {
    let replacement = if insert_space { " " } else { "" };
    codes
        .iter()
        .filter(|code| !code.is_empty())
        .fold(text.to_string(), |text, code| text.replace(code.as_str(), replacement))
}

/// Removes blocks opened by a start delimiter and closed by one of its end delimiters.
///
/// Start delimiters are tried in configuration order at each position. The
/// block ends at the earliest position where any end delimiter matches. A
/// start delimiter without a matching end is kept as text.
#[must_use]
pub fn remove_ignored_substrings(
    text: &str,
    substrings: &IgnoredSubstrings,
    insert_space: bool,
) -> String {
    let starts: Vec<(&str, &[String])> =
        substrings.iter().filter(|(start, _)| !start.is_empty()).collect();

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    'scan: while let Some(c) = rest.chars().next() {
        for (start, ends) in &starts {
            let Some(inner) = rest.strip_prefix(start) else {
                continue;
            };
            if let Some(block_end) = earliest_end(inner, ends) {
                if insert_space {
                    out.push(' ');
                }
                rest = inner.get(block_end..).unwrap_or_default();
                continue 'scan;
            }
        }
        out.push(c);
        rest = rest.get(c.len_utf8()..).unwrap_or_default();
    }
    out
}

/// Byte offset just past the first end delimiter found in `text`.
fn earliest_end(text: &str, ends: &[String]) -> Option<usize> {
    text.char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(text.len()))
        .find_map(|offset| {
            let tail = text.get(offset..)?;
            ends.iter()
                .filter(|end| !end.is_empty())
                .find(|end| tail.starts_with(end.as_str()))
                .map(|end| offset + end.len())
        })
}

/// Applies the ignore rules in order (codes to space, codes to nothing,
/// substrings to space, substrings to nothing) and drops lines left empty.
#[must_use]
pub fn clean_lines(lines: Vec<TextLine>, rules: &CheckRules) -> Vec<TextLine> {
    lines
        .into_iter()
        .filter_map(|line| {
            let text = remove_ignored_codes(&line.text, &rules.ignored_codes_into_space, true);
            let text = remove_ignored_codes(&text, &rules.ignored_codes_into_nothing, false);
            let text =
                remove_ignored_substrings(&text, &rules.ignored_substrings_into_space, true);
            let text =
                remove_ignored_substrings(&text, &rules.ignored_substrings_into_nothing, false);
            (!text.is_empty()).then(|| TextLine { line_number: line.line_number, text })
        })
        .collect()
}

/// One finding per character outside `valid_characters`.
///
/// An empty `valid_characters` rejects every character.
#[must_use]
pub fn invalid_characters(lines: &[TextLine], valid_characters: &str) -> Vec<CheckResult> {
    lines
        .iter()
        .flat_map(|line| {
            line.text
                .chars()
                .filter(|c| !valid_characters.contains(*c))
                .map(|c| finding(line, INVALID_CHARACTER, c.to_string(), "Invalid character"))
        })
        .collect()
}

/// One finding per whitespace-separated word equal to a banword.
#[must_use]
pub fn banwords(lines: &[TextLine], banwords: &[String]) -> Vec<CheckResult> {
    lines
        .iter()
        .flat_map(|line| {
            line.text
                .split_whitespace()
                .filter(|word| banwords.iter().any(|banword| banword == word))
                .map(|word| finding(line, BANWORD, word.to_string(), "Banned word"))
        })
        .collect()
}

/// Builds a finding on `line`.
fn finding(line: &TextLine, error_type: &str, error: String, explanation: &str) -> CheckResult {
    CheckResult {
        line_number: line.line_number,
        line: line.text.clone(),
        error,
        error_type: error_type.to_string(),
        error_issue_type: error_type.to_string(),
        explanation: explanation.to_string(),
        suggestion: String::new(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    fn map(entries: &[(&str, &[&str])]) -> IgnoredSubstrings {
        entries
            .iter()
            .map(|(start, ends)| (*start, ends.iter().map(|end| (*end).to_string()).collect()))
            .collect()
    }

    #[rstest]
    #[case::into_space("Hello\\nworld", true, "Hello world")]
    #[case::into_nothing("Hello\\nworld", false, "Helloworld")]
    #[case::every_occurrence("a\\nb\\nc", false, "abc")]
    fn test_remove_ignored_codes(
        #[case] text: &str,
        #[case] insert_space: bool,
        #[case] expected: &str,
    ) {
        let codes = vec!["\\n".to_string()];

        assert_that!(remove_ignored_codes(text, &codes, insert_space), eq(expected));
    }

    #[rstest]
    #[case::simple_block("Bonjour {name} !", false, "Bonjour  !")]
    #[case::into_space("a<b>c", true, "a c")]
    #[case::earliest_of_several_ends("x[a|b]y", false, "xb]y")]
    #[case::unterminated_kept("a {b c", false, "a {b c")]
    #[case::multibyte("été{x}à", false, "étéà")]
    #[case::adjacent("{a}{b}c", false, "c")]
    fn test_remove_ignored_substrings(
        #[case] text: &str,
        #[case] insert_space: bool,
        #[case] expected: &str,
    ) {
        let substrings = map(&[("{", &["}"][..]), ("<", &[">"][..]), ("[", &["]", "|"][..])]);

        assert_that!(remove_ignored_substrings(text, &substrings, insert_space), eq(expected));
    }

    #[rstest]
    #[case::short_start_first(&[("{", &["}"][..]), ("{{", &["}}"][..])], "ac}}d")]
    #[case::long_start_first(&[("{{", &["}}"][..]), ("{", &["}"][..])], "ad")]
    #[googletest::test]
    fn test_starts_tried_in_configured_order(
        #[case] entries: &[(&str, &[&str])],
        #[case] expected: &str,
    ) {
        expect_that!(remove_ignored_substrings("a{{b}c}}d", &map(entries), false), eq(expected));
    }

    #[googletest::test]
    fn test_clean_lines_order_and_empty_lines() {
        let rules = CheckRules {
            ignored_codes_into_space: vec!["[br]".to_string()],
            ignored_codes_into_nothing: vec!["{".to_string()],
            ignored_substrings_into_space: map(&[("{", &["}"][..])]),
            ignored_substrings_into_nothing: map(&[("<", &[">"][..])]),
            ..CheckRules::default()
        };
        let lines = vec![
            TextLine::new(1, "Salut[br]{toi}<i>"),
            TextLine::new(2, "<b>"),
            TextLine::new(3, "{x}"),
        ];

        let cleaned = clean_lines(lines, &rules);

        // codes run first: "{" is gone before the "{...}" substring rule sees it
        assert_eq!(
            cleaned,
            vec![TextLine::new(1, "Salut toi}"), TextLine::new(3, "x}")]
        );
    }

    #[googletest::test]
    fn test_invalid_characters() {
        let lines = vec![TextLine::new(4, "ça @va#")];

        let found = invalid_characters(&lines, "abcdefghijklmnopqrstuvwxyzç ");

        let errors: Vec<&str> = found.iter().map(|result| result.error.as_str()).collect();
        assert_eq!(errors, vec!["@", "#"]);
        expect_that!(found[0].line_number, eq(4));
        expect_that!(found[0].error_type, eq(INVALID_CHARACTER));
        expect_that!(found[0].error_issue_type, eq(INVALID_CHARACTER));
        expect_that!(found[0].line, eq("ça @va#"));
    }

    #[googletest::test]
    fn test_empty_valid_set_rejects_everything() {
        let lines = vec![TextLine::new(1, "a b")];

        expect_that!(invalid_characters(&lines, "").len(), eq(3));
    }

    #[googletest::test]
    fn test_banwords_match_whole_words() {
        let lines = vec![TextLine::new(7, "c'est ok, vraiment ok\tcool")];
        let list = vec!["ok".to_string(), "cool".to_string()];

        let found = banwords(&lines, &list);

        let errors: Vec<&str> = found.iter().map(|result| result.error.as_str()).collect();
        assert_eq!(errors, vec!["ok", "cool"]);
        expect_that!(found[0].error_type, eq(BANWORD));
        expect_that!(found[0].error_issue_type, eq(BANWORD));
    }
}
