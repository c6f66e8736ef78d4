//! [`TranslationTable`] → `.ts` text.
//!
//! Unchanged nodes are written from their raw text. A message whose only
//! change is its translation keeps its raw text with the `<translation>`
//! element replaced. Everything else is rendered in lupdate's layout.

use std::fmt::Write as _;
use std::path::Path;

use super::model::{
    Context,
    Location,
    Message,
    RawTable,
    Translation,
    TranslationTable,
    TranslationText,
};
use super::CatalogError;
use crate::syntax::escape::{
    escape_attribute,
    escape_text,
};

/// Header lupdate writes before `<TS>`.
const PROLOG: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<!DOCTYPE TS>\n";
/// Indentation of message children.
const CHILD_INDENT: &str = "        ";
/// Indentation of `<numerusform>`.
const FORM_INDENT: &str = "            ";

/// Serialises a table.
///
/// A table that was parsed and not edited comes back byte for byte.
#[must_use]
pub fn write(table: &TranslationTable) -> String {
    let mut out = String::new();
    match &table.raw {
        Some(raw) => write_parsed(&mut out, table, raw),
        None => {
            out.push_str(PROLOG);
            out.push_str(&root_tag(table, &[]));
            for context in &table.contexts {
                write_context(&mut out, context);
            }
            out.push_str("\n</TS>\n");
        }
    }
    out
}

/// Serialises a table and writes it to `path`.
pub fn save(table: &TranslationTable, path: &Path) -> Result<(), CatalogError> {
    std::fs::write(path, write(table))?;
    tracing::debug!("Saved {}", path.display());
    Ok(())
}

/// Writes a parsed table, reusing its raw text.
fn write_parsed(out: &mut String, table: &TranslationTable, raw: &RawTable) {
    // `<TS/>` has to be opened once it gets contexts
    let reopen = raw.self_closing && !table.contexts.is_empty();

    let before = raw.head.get(..raw.root_tag.start).unwrap_or_default();
    let tag = raw.head.get(raw.root_tag.clone()).unwrap_or_default();
    let after = raw.head.get(raw.root_tag.end..).unwrap_or_default();

    out.push_str(before);
    if table.header_dirty {
        let rendered = root_tag(table, &raw.other_attributes);
        if raw.self_closing && !reopen {
            out.push_str(rendered.trim_end_matches('>'));
            out.push_str("/>");
        } else {
            out.push_str(&rendered);
        }
    } else if reopen {
        out.push_str(tag.trim_end_matches("/>").trim_end());
        out.push('>');
    } else {
        out.push_str(tag);
    }
    out.push_str(after);

    for context in &table.contexts {
        write_context(out, context);
    }

    if reopen {
        out.push_str("\n</TS>");
    }
    out.push_str(&raw.tail);
}

/// `<TS ...>` from the current header values.
fn root_tag(table: &TranslationTable, other_attributes: &[String]) -> String {
    let mut tag = String::from("<TS");
    let known = [
        ("version", &table.version),
        ("language", &table.language),
        ("sourcelanguage", &table.source_language),
    ];
    for (name, value) in known {
        if let Some(value) = value {
            let _ = write!(tag, " {name}=\"{}\"", escape_attribute(value));
        }
    }
    for attribute in other_attributes {
        tag.push(' ');
        tag.push_str(attribute);
    }
    tag.push('>');
    tag
}

/// Reuses the raw open and close tags unless the header changed.
fn write_context(out: &mut String, context: &Context) {
    match &context.raw {
        Some(raw) => {
            out.push_str(&raw.leading);
            if context.head_dirty {
                render_context_open(out, context);
            } else {
                out.push_str(&raw.open);
            }
        }
        None => {
            out.push('\n');
            render_context_open(out, context);
        }
    }

    for message in &context.messages {
        write_message(out, message);
    }

    match &context.raw {
        Some(raw) => out.push_str(&raw.close),
        None => out.push_str("\n</context>"),
    }
}

/// `<context>` with its name and comment.
fn render_context_open(out: &mut String, context: &Context) {
    let _ = write!(out, "<context>\n    <name>{}</name>", escape_text(&context.name));
    if let Some(comment) = &context.comment {
        let _ = write!(out, "\n    <comment>{}</comment>", escape_text(comment));
    }
}

/// Raw element, raw element with a new `<translation>`, or a fresh rendering.
fn write_message(out: &mut String, message: &Message) {
    let Some(raw) = &message.raw else {
        out.push_str("\n    ");
        render_message(out, message);
        return;
    };

    out.push_str(&raw.leading);
    match (message.body_dirty, message.translation_dirty, &raw.translation_span, &message.translation)
    {
        (false, false, _, _) => out.push_str(&raw.element),
        (false, true, Some(span), Some(translation)) => {
            out.push_str(raw.element.get(..span.start).unwrap_or_default());
            render_translation(out, translation);
            out.push_str(raw.element.get(span.end..).unwrap_or_default());
        }
        _ => render_message(out, message),
    }
}

/// Renders `<message>` through `</message>` in lupdate's layout.
fn render_message(out: &mut String, message: &Message) {
    out.push_str("<message");
    if let Some(id) = &message.id {
        let _ = write!(out, " id=\"{}\"", escape_attribute(id));
    }
    if message.numerus {
        out.push_str(" numerus=\"yes\"");
    }
    out.push('>');

    for location in &message.locations {
        render_location(out, location);
    }
    if message.id.is_none() || !message.source.is_empty() {
        render_child(out, "source", &message.source);
    }
    let optional = [
        ("oldsource", &message.old_source),
        ("comment", &message.comment),
        ("oldcomment", &message.old_comment),
        ("extracomment", &message.extra_comment),
        ("translatorcomment", &message.translator_comment),
    ];
    for (name, value) in optional {
        if let Some(value) = value {
            render_child(out, name, value);
        }
    }
    if let Some(translation) = &message.translation {
        out.push('\n');
        out.push_str(CHILD_INDENT);
        render_translation(out, translation);
    }
    for extra in &message.extras {
        out.push('\n');
        out.push_str(CHILD_INDENT);
        out.push_str(extra);
    }
    out.push_str("\n    </message>");
}

/// One text child on its own line.
fn render_child(out: &mut String, name: &str, text: &str) {
    let _ = write!(out, "\n{CHILD_INDENT}<{name}>{}</{name}>", escape_text(text));
}

/// `<location filename=".." line=".."/>` on its own line.
fn render_location(out: &mut String, location: &Location) {
    let _ = write!(out, "\n{CHILD_INDENT}<location");
    if let Some(filename) = &location.filename {
        let _ = write!(out, " filename=\"{}\"", escape_attribute(filename));
    }
    if let Some(line) = location.line {
        let _ = write!(out, " line=\"{line}\"");
    }
    out.push_str("/>");
}

/// `<translation>` with its plural forms, if any.
fn render_translation(out: &mut String, translation: &Translation) {
    out.push_str("<translation");
    if let Some(kind) = translation.kind.as_attribute() {
        let _ = write!(out, " type=\"{kind}\"");
    }
    out.push('>');
    match &translation.text {
        TranslationText::Single(text) => out.push_str(&escape_text(text)),
        TranslationText::Plural(forms) => {
            for form in forms {
                let _ = write!(out, "\n{FORM_INDENT}<numerusform>{}</numerusform>", escape_text(form));
            }
            out.push('\n');
            out.push_str(CHILD_INDENT);
        }
    }
    out.push_str("</translation>");
}

impl TranslationTable {
    /// See [`write`].
    #[must_use]
    pub fn to_ts_string(&self) -> String {
        write(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::catalog::{
        LineRef,
        TranslationKind,
        parse,
    };

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE TS>
<TS version="2.1" language="fr_FR">
<context>
    <name>Dialog</name>
    <message>
        <location filename="../qt/confirm_exit/confirm_exit.ui" line="47"/>
        <source>Que faire ?</source>
        <translation>Que faire ?</translation>
    </message>
    <message>
        <location filename="../qt/confirm_exit/confirm_exit.ui" line="89"/>
        <source>Quitter sans sauvegarder</source>
        <translation type="unfinished"></translation>
    </message>
</context>
</TS>
"#;

    #[rstest]
    #[case::lupdate_layout(SAMPLE)]
    #[case::odd_whitespace("<TS   language='fr'  >\r\n\t<context><name>A</name>  <!-- c --> <message ><source>x</source></message>\n</context>\n\n</TS>")]
    #[case::empty_root("<?xml version=\"1.0\"?><TS/>")]
    #[case::no_trailing_newline("<TS><context><name>A</name></context></TS>")]
    #[case::cdata_and_bytes("<TS><context><name>A</name><message><source><![CDATA[<b>]]>x<byte value=\"x1b\"/></source></message></context></TS>\n")]
    fn test_unchanged_table_round_trips(#[case] input: &str) {
        let table = parse(input).unwrap();

        assert_eq!(write(&table), input);
    }

    #[googletest::test]
    fn test_translation_edit_rewrites_only_that_element() {
        let mut table = parse(SAMPLE).unwrap();

        table.set_translation("Dialog", "Quitter sans sauvegarder", None, "Quitter").unwrap();

        let expected = SAMPLE.replace(
            "<translation type=\"unfinished\"></translation>",
            "<translation>Quitter</translation>",
        );
        assert_eq!(write(&table), expected);
    }

    #[googletest::test]
    fn test_mark_obsolete_keeps_layout() {
        let mut table = parse(SAMPLE).unwrap();

        table.mark_obsolete("Dialog", "Que faire ?", None).unwrap();

        let expected = SAMPLE.replace(
            "<translation>Que faire ?</translation>",
            "<translation type=\"obsolete\">Que faire ?</translation>",
        );
        assert_eq!(write(&table), expected);
    }

    #[googletest::test]
    fn test_new_message_uses_lupdate_layout() {
        let mut table = parse(SAMPLE).unwrap();

        table
            .context_mut("Dialog")
            .unwrap()
            .add_message(
                Message::new("Annuler")
                    .with_location(Location::new("../qt/confirm_exit/confirm_exit.ui", 110))
                    .with_translation(Translation::unfinished("")),
            )
            .unwrap();

        let expected = SAMPLE.replace(
            "    </message>\n</context>",
            r#"    </message>
    <message>
        <location filename="../qt/confirm_exit/confirm_exit.ui" line="110"/>
        <source>Annuler</source>
        <translation type="unfinished"></translation>
    </message>
</context>"#,
        );
        assert_eq!(write(&table), expected);
    }

    #[googletest::test]
    fn test_new_table_layout() {
        let mut table = TranslationTable::new("fr_FR");
        table
            .context_or_insert("Results")
            .add_message(
                Message::new("%n error(s)")
                    .with_numerus(true)
                    .with_comment("status bar")
                    .with_translation(Translation::finished(TranslationText::Plural(vec![
                        "%n erreur".to_string(),
                        "%n erreurs".to_string(),
                    ]))),
            )
            .unwrap();
        table
            .context_or_insert("Results")
            .add_message(Message::new("Tom & \"Jerry\"").with_translation(Translation {
                kind: TranslationKind::Vanished,
                text: "Tom & Jerry".into(),
            }))
            .unwrap();

        let expected = r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE TS>
<TS version="2.1" language="fr_FR">
<context>
    <name>Results</name>
    <message numerus="yes">
        <source>%n error(s)</source>
        <comment>status bar</comment>
        <translation>
            <numerusform>%n erreur</numerusform>
            <numerusform>%n erreurs</numerusform>
        </translation>
    </message>
    <message>
        <source>Tom &amp; &quot;Jerry&quot;</source>
        <translation type="vanished">Tom &amp; Jerry</translation>
    </message>
</context>
</TS>
"#;
        assert_eq!(write(&table), expected);
    }

    #[googletest::test]
    fn test_rendered_table_parses_back_equal() {
        let mut table = TranslationTable::new("fr_FR");
        table
            .context_or_insert("A")
            .add_message(
                Message::new("Relative")
                    .with_location(Location { filename: None, line: Some(LineRef::Relative(-3)) })
                    .with_translation(Translation::finished("x\u{7}y")),
            )
            .unwrap();

        let reparsed = parse(&write(&table)).unwrap();

        assert_eq!(reparsed, table);
    }

    #[googletest::test]
    fn test_language_change_rewrites_root_tag_only() {
        let mut table = parse(SAMPLE).unwrap();

        table.set_language(Some("de_DE".to_string()));

        assert_eq!(write(&table), SAMPLE.replace("language=\"fr_FR\"", "language=\"de_DE\""));
    }

    #[googletest::test]
    fn test_self_closing_root_is_opened_for_new_context() {
        let mut table = parse("<TS version=\"2.1\"/>\n").unwrap();

        table.context_or_insert("A");

        assert_eq!(
            write(&table),
            "<TS version=\"2.1\">\n<context>\n    <name>A</name>\n</context>\n</TS>\n"
        );
    }

    #[googletest::test]
    fn test_removed_message_takes_its_indentation() {
        let mut table = parse(SAMPLE).unwrap();

        table.context_mut("Dialog").unwrap().remove_message("Que faire ?", None).unwrap();

        let written = write(&table);
        expect_that!(written, not(contains_substring("Que faire")));
        expect_that!(written, contains_substring("<name>Dialog</name>\n    <message>\n"));
    }

    #[googletest::test]
    fn test_save_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fr.ts");
        let table = parse(SAMPLE).unwrap();

        save(&table, &path).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), SAMPLE);
    }
}
