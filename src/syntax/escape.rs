//! Entity decoding and the escaping rules lupdate writes with.

use std::borrow::Cow;
use std::fmt::Write as _;

use super::SyntaxError;

/// Decodes predefined entities and numeric character references.
///
/// `offset` is the byte offset of `raw` in the document, used for error reporting.
pub fn unescape(raw: &str, offset: usize) -> Result<Cow<'_, str>, SyntaxError> {
    if !raw.contains('&') {
        return Ok(Cow::Borrowed(raw));
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(rest.get(..amp).unwrap_or_default());
        let after = rest.get(amp + 1..).unwrap_or_default();
        let entity_offset = offset + (raw.len() - rest.len()) + amp;

        let Some(semi) = after.find(';') else {
            return Err(SyntaxError::InvalidEntity {
                entity: after.chars().take(8).collect(),
                offset: entity_offset,
            });
        };
        let entity = after.get(..semi).unwrap_or_default();
        let decoded = decode_entity(entity).ok_or_else(|| SyntaxError::InvalidEntity {
            entity: entity.to_string(),
            offset: entity_offset,
        })?;
        out.push(decoded);
        rest = after.get(semi + 1..).unwrap_or_default();
    }
    out.push_str(rest);

    Ok(Cow::Owned(out))
}

/// Named entity or `#`/`#x` character reference, without `&` and `;`.
fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let number = entity.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Parses the `value` attribute of lupdate's `<byte value="x1b"/>` element.
#[must_use]
pub fn decode_byte_value(value: &str) -> Option<char> {
    let code = match value.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => value.parse().ok()?,
    };
    char::from_u32(code)
}

/// Control characters other than newline, carriage return and tab.
const fn is_unprintable(c: char) -> bool {
    (c as u32) < 0x20 && !matches!(c, '\n' | '\r' | '\t')
}

/// Escapes element content the way lupdate does.
///
/// Quotes are escaped in text too, and control characters become `<byte>` elements.
#[must_use]
pub fn escape_text(text: &str) -> Cow<'_, str> {
    if !text.chars().any(|c| matches!(c, '&' | '<' | '>' | '"' | '\'') || is_unprintable(c)) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if is_unprintable(c) => {
                let _ = write!(out, "<byte value=\"x{:x}\"/>", c as u32);
            }
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Escapes an attribute value; control characters become numeric references.
#[must_use]
pub fn escape_attribute(value: &str) -> Cow<'_, str> {
    if !value.chars().any(|c| matches!(c, '&' | '<' | '>' | '"' | '\'') || is_unprintable(c)) {
        return Cow::Borrowed(value);
    }

    let mut out = String::with_capacity(value.len() + 16);
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if is_unprintable(c) => {
                let _ = write!(out, "&#x{:x};", c as u32);
            }
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::plain("Que faire ?", "Que faire ?")]
    #[case::predefined("Mise à jour &quot;LanguageTool&quot;", "Mise à jour \"LanguageTool\"")]
    #[case::apostrophe("item_result[&apos;error_type&apos;]", "item_result['error_type']")]
    #[case::decimal("&#233;t&#233;", "été")]
    #[case::hex("&#xE9;", "é")]
    #[case::all_five("&amp;&lt;&gt;&quot;&apos;", "&<>\"'")]
    fn test_unescape(#[case] raw: &str, #[case] expected: &str) {
        assert_that!(unescape(raw, 0).unwrap(), eq(expected));
    }

    #[googletest::test]
    fn test_unescape_borrows_without_entities() {
        let result = unescape("no entities", 0).unwrap();

        expect_that!(matches!(result, Cow::Borrowed(_)), eq(true));
    }

    #[rstest]
    #[case::unknown("a &nbsp; b", 2)]
    #[case::unterminated("a & b", 2)]
    #[case::bad_number("&#xZZ;", 0)]
    fn test_unescape_invalid(#[case] raw: &str, #[case] expected_offset: usize) {
        let error = unescape(raw, 100).unwrap_err();

        assert!(matches!(error, SyntaxError::InvalidEntity { .. }));
        assert_that!(error.offset(), some(eq(100 + expected_offset)));
    }

    #[rstest]
    #[case::plain("Sauvegarder et quitter", "Sauvegarder et quitter")]
    #[case::quotes("Mise à jour \"LanguageTool\"", "Mise à jour &quot;LanguageTool&quot;")]
    #[case::markup("<b>x</b> & y", "&lt;b&gt;x&lt;/b&gt; &amp; y")]
    #[case::newline_kept("a\nb", "a\nb")]
    #[case::control_as_byte("a\u{1b}b", "a<byte value=\"x1b\"/>b")]
    fn test_escape_text(#[case] text: &str, #[case] expected: &str) {
        assert_that!(escape_text(text), eq(expected));
    }

    #[googletest::test]
    fn test_escape_attribute_control_character() {
        expect_that!(escape_attribute("a\u{7}\"b"), eq("a&#x7;&quot;b"));
    }

    #[googletest::test]
    fn test_decode_byte_value() {
        expect_that!(decode_byte_value("x1b"), some(eq('\u{1b}')));
        expect_that!(decode_byte_value("9"), some(eq('\t')));
        expect_that!(decode_byte_value("zz"), none());
    }
}
