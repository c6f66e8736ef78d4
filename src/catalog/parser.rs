//! `.ts` text → [`TranslationTable`].
//!
//! Besides the decoded values, every context and message keeps the exact text
//! it was read from. Text between nodes (indentation, comments) is stored as
//! the `leading` text of the node that follows it.

use std::ops::Range;
use std::path::Path;

use super::model::{
    Context,
    LineRef,
    Location,
    Message,
    RawContext,
    RawMessage,
    RawTable,
    Translation,
    TranslationKind,
    TranslationTable,
    TranslationText,
};
use super::CatalogError;
use crate::syntax::{
    Element,
    Node,
    SyntaxError,
    parse_document,
};
use crate::types::LineIndex;

/// Attributes of `<TS>` kept in the model.
const KNOWN_ROOT_ATTRIBUTES: [&str; 3] = ["version", "language", "sourcelanguage"];

/// Parses a translation file.
///
/// Duplicate messages are accepted here; `check::validate` reports them.
pub fn parse(text: &str) -> Result<TranslationTable, CatalogError> {
    let document = parse_document(text).map_err(|error| CatalogError::syntax(error, text))?;
    let parser = TableParser { text, lines: LineIndex::new(text) };
    parser.table(&document.root)
}

/// Reads and parses a translation file.
pub fn load(path: &Path) -> Result<TranslationTable, CatalogError> {
    let text = std::fs::read_to_string(path)?;
    let table = parse(&text)?;
    tracing::debug!(
        "Loaded {}: {} contexts, {} messages",
        path.display(),
        table.contexts().len(),
        table.iter_messages().count()
    );
    Ok(table)
}

/// Parsing state shared by the table, context and message steps.
struct TableParser<'a> {
    /// Whole file.
    text: &'a str,
    /// For 1-based line numbers of messages and errors.
    lines: LineIndex,
}

impl TableParser<'_> {
    /// Owned copy of a span of the file.
    fn slice(&self, span: Range<usize>) -> String {
        self.text.get(span).unwrap_or_default().to_string()
    }

    /// 1-based line of a byte offset.
    fn line(&self, offset: usize) -> u32 {
        self.lines.position(self.text, offset).display_line()
    }

    /// Attaches line and column to a scanner error.
    fn syntax(&self, error: SyntaxError) -> CatalogError {
        CatalogError::syntax(error, self.text)
    }

    /// Decoded attribute value.
    fn attribute(&self, element: &Element<'_>, name: &str) -> Result<Option<String>, CatalogError> {
        element.attribute(name).map_err(|error| self.syntax(error))
    }

    /// Decoded text content.
    fn text_of(&self, element: &Element<'_>) -> Result<String, CatalogError> {
        element.text().map_err(|error| self.syntax(error))
    }

    /// Text of the first `name` child, if present.
    fn optional_text(
        &self,
        parent: &Element<'_>,
        name: &str,
    ) -> Result<Option<String>, CatalogError> {
        parent.first_child(name).map(|element| self.text_of(element)).transpose()
    }

    /// `<TS>` and its contexts, keeping the bytes around them.
    fn table(&self, root: &Element<'_>) -> Result<TranslationTable, CatalogError> {
        if root.name != "TS" {
            return Err(CatalogError::UnexpectedRoot(root.name.to_string()));
        }

        let other_attributes = root
            .attributes
            .iter()
            .filter(|attribute| !KNOWN_ROOT_ATTRIBUTES.contains(&attribute.name))
            .map(|attribute| format!("{}=\"{}\"", attribute.name, attribute.raw_value))
            .collect();

        let first_context = root
            .children
            .iter()
            .position(|node| matches!(node, Node::Element(element) if element.name == "context"));
        let head_end = content_end(
            root.children.get(..first_context.unwrap_or(0)).unwrap_or_default(),
            root.start_tag.end,
        );

        let mut contexts = Vec::new();
        let mut previous_end = head_end;
        for element in root.child_elements().filter(|element| element.name == "context") {
            let leading = self.slice(previous_end..element.span.start);
            contexts.push(self.context(element, leading)?);
            previous_end = element.span.end;
        }

        Ok(TranslationTable {
            version: self.attribute(root, "version")?,
            language: self.attribute(root, "language")?,
            source_language: self.attribute(root, "sourcelanguage")?,
            contexts,
            raw: Some(RawTable {
                head: self.slice(0..head_end),
                root_tag: root.start_tag.clone(),
                tail: self.slice(previous_end..self.text.len()),
                self_closing: root.span == root.start_tag,
                other_attributes,
            }),
            header_dirty: false,
        })
    }

    /// `<context>` with its messages; `leading` is the text before it.
    fn context(&self, element: &Element<'_>, leading: String) -> Result<Context, CatalogError> {
        let line = self.line(element.span.start);
        let name = element
            .first_child("name")
            .map(|name| self.text_of(name))
            .transpose()?
            .ok_or(CatalogError::MissingElement { element: "context", child: "name", line })?;

        let first_message = element
            .children
            .iter()
            .position(|node| matches!(node, Node::Element(child) if child.name == "message"));
        let open_end = content_end(
            element.children.get(..first_message.unwrap_or(element.children.len())).unwrap_or_default(),
            element.start_tag.end,
        );

        let mut messages = Vec::new();
        let mut previous_end = open_end;
        for child in element.child_elements().filter(|child| child.name == "message") {
            let leading = self.slice(previous_end..child.span.start);
            messages.push(self.message(child, leading)?);
            previous_end = child.span.end;
        }

        Ok(Context {
            name,
            comment: self.optional_text(element, "comment")?,
            messages,
            raw: Some(RawContext {
                leading,
                open: self.slice(element.span.start..open_end),
                close: self.slice(previous_end..element.span.end),
            }),
            head_dirty: false,
        })
    }

    /// `<message>`; unknown children are kept verbatim.
    fn message(&self, element: &Element<'_>, leading: String) -> Result<Message, CatalogError> {
        let line = self.line(element.span.start);
        let id = self.attribute(element, "id")?;
        let numerus = match self.attribute(element, "numerus")?.as_deref() {
            None | Some("no") => false,
            Some("yes") => true,
            Some(other) => {
                return Err(CatalogError::InvalidAttribute {
                    element: "message",
                    attribute: "numerus",
                    value: other.to_string(),
                    line,
                });
            }
        };

        let mut message = Message::new(String::new());
        message.id = id;
        message.numerus = numerus;
        message.line = Some(line);

        let mut source = None;
        let mut translation_span = None;
        for child in element.child_elements() {
            match child.name {
                "location" => message.locations.push(self.location(child)?),
                "source" => source = Some(self.text_of(child)?),
                "oldsource" => message.old_source = Some(self.text_of(child)?),
                "comment" => message.comment = Some(self.text_of(child)?),
                "oldcomment" => message.old_comment = Some(self.text_of(child)?),
                "extracomment" => message.extra_comment = Some(self.text_of(child)?),
                "translatorcomment" => message.translator_comment = Some(self.text_of(child)?),
                "translation" => {
                    message.translation = Some(self.translation(child)?);
                    translation_span = Some(
                        child.span.start - element.span.start..child.span.end - element.span.start,
                    );
                }
                _ => message.extras.push(self.slice(child.span.clone())),
            }
        }

        message.source = match (source, &message.id) {
            (Some(source), _) => source,
            (None, Some(_)) => String::new(),
            (None, None) => {
                return Err(CatalogError::MissingElement {
                    element: "message",
                    child: "source",
                    line,
                });
            }
        };

        message.raw = Some(RawMessage {
            leading,
            element: self.slice(element.span.clone()),
            translation_span,
        });
        message.body_dirty = false;
        message.translation_dirty = false;
        Ok(message)
    }

    /// `<location>`; `line` may be relative, such as `+2`.
    fn location(&self, element: &Element<'_>) -> Result<Location, CatalogError> {
        let line = self
            .attribute(element, "line")?
            .map(|value| {
                value.parse::<LineRef>().map_err(|_| CatalogError::InvalidAttribute {
                    element: "location",
                    attribute: "line",
                    line: self.line(element.span.start),
                    value,
                })
            })
            .transpose()?;
        Ok(Location { filename: self.attribute(element, "filename")?, line })
    }

    /// `<translation>` with its `type` and plural forms.
    fn translation(&self, element: &Element<'_>) -> Result<Translation, CatalogError> {
        let kind_attribute = self.attribute(element, "type")?;
        let kind = TranslationKind::from_attribute(kind_attribute.as_deref()).ok_or_else(|| {
            CatalogError::InvalidAttribute {
                element: "translation",
                attribute: "type",
                value: kind_attribute.clone().unwrap_or_default(),
                line: self.line(element.span.start),
            }
        })?;

        let forms = element
            .child_elements()
            .filter(|child| child.name == "numerusform")
            .map(|form| self.text_of(form))
            .collect::<Result<Vec<_>, _>>()?;
        let text = if forms.is_empty() {
            TranslationText::Single(self.text_of(element)?)
        } else {
            TranslationText::Plural(forms)
        };

        Ok(Translation { kind, text })
    }
}

/// End of the last meaningful node in `nodes`, or `fallback` when there is none.
fn content_end(nodes: &[Node<'_>], fallback: usize) -> usize {
    nodes.iter().rev().find(|node| !node.is_whitespace()).map_or(fallback, |node| node.span().end)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;
    use crate::catalog::TranslationStatus;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE TS>
<TS version="2.1" language="fr_FR" sourcelanguage="fr_FR">
<context>
    <name>MainWindow</name>
    <message>
        <location filename="../qt/mainwindow/mainwindow.ui" line="350"/>
        <source>Dans les résultats de la recherche, remplacer </source>
        <translation>Dans les résultats de la recherche, remplacer</translation>
    </message>
    <message>
        <location filename="../qt/mainwindow/mainwindow.ui" line="378"/>
        <source>par</source>
        <translation></translation>
    </message>
    <message>
        <location filename="../mainwindow.py" line="+12"/>
        <source>Mise à jour &quot;LanguageTool&quot;</source>
        <comment>menu</comment>
        <translation type="unfinished"></translation>
    </message>
</context>
<context>
    <name>Results</name>
    <message numerus="yes">
        <source>%n error(s)</source>
        <translation>
            <numerusform>%n erreur</numerusform>
            <numerusform>%n erreurs</numerusform>
        </translation>
    </message>
    <message>
        <source>Old</source>
        <translation type="vanished">Ancien</translation>
    </message>
</context>
</TS>
"#;

    #[googletest::test]
    fn test_parse_header() {
        let table = parse(SAMPLE).unwrap();

        expect_that!(table.version(), some(eq("2.1")));
        expect_that!(table.language(), some(eq("fr_FR")));
        expect_that!(table.source_language(), some(eq("fr_FR")));
        expect_that!(table.contexts().len(), eq(2));
    }

    #[googletest::test]
    fn test_parse_messages() {
        let table = parse(SAMPLE).unwrap();
        let main = table.context("MainWindow").unwrap();

        expect_that!(main.messages().len(), eq(3));

        let first = &main.messages()[0];
        expect_that!(first.source(), eq("Dans les résultats de la recherche, remplacer "));
        expect_that!(first.line(), some(eq(6)));
        assert_eq!(
            first.locations(),
            [Location::new("../qt/mainwindow/mainwindow.ui", 350)].as_slice()
        );

        let quoted = main.find("Mise à jour \"LanguageTool\"", Some("menu")).unwrap();
        expect_that!(quoted.status(), eq(TranslationStatus::Unfinished));
        expect_that!(quoted.locations()[0].line, some(eq(LineRef::Relative(12))));
    }

    #[googletest::test]
    fn test_blank_and_unfinished_are_distinct() {
        let table = parse(SAMPLE).unwrap();

        let blank = table.find("MainWindow", "par", None).unwrap();
        expect_that!(blank.status(), eq(TranslationStatus::Blank));

        let unfinished =
            table.find("MainWindow", "Mise à jour \"LanguageTool\"", Some("menu")).unwrap();
        expect_that!(unfinished.status(), eq(TranslationStatus::Unfinished));
    }

    #[googletest::test]
    fn test_parse_numerus_and_vanished() {
        let table = parse(SAMPLE).unwrap();
        let results = table.context("Results").unwrap();

        let plural = results.find("%n error(s)", None).unwrap();
        expect_that!(plural.is_numerus(), eq(true));
        assert_eq!(
            plural.translation().unwrap().text,
            TranslationText::Plural(vec!["%n erreur".to_string(), "%n erreurs".to_string()])
        );

        let old = results.find("Old", None).unwrap();
        expect_that!(old.status(), eq(TranslationStatus::Vanished));
    }

    #[googletest::test]
    fn test_raw_text_is_split_between_nodes() {
        let table = parse(SAMPLE).unwrap();
        let raw = table.raw.as_ref().unwrap();
        let context = &table.contexts()[0];
        let context_raw = context.raw.as_ref().unwrap();
        let message_raw = context.messages()[1].raw.as_ref().unwrap();

        expect_that!(raw.head.ends_with("sourcelanguage=\"fr_FR\">"), eq(true));
        expect_that!(raw.tail, eq("\n</TS>\n"));
        expect_that!(context_raw.leading, eq("\n"));
        expect_that!(context_raw.open, eq("<context>\n    <name>MainWindow</name>"));
        expect_that!(context_raw.close, eq("\n</context>"));
        expect_that!(message_raw.leading, eq("\n    "));
        expect_that!(
            &message_raw.element[message_raw.translation_span.clone().unwrap()],
            eq("<translation></translation>")
        );
    }

    #[googletest::test]
    fn test_message_with_id_needs_no_source() {
        let table =
            parse(r#"<TS><context><name>A</name><message id="msg.ok"><translation>OK</translation></message></context></TS>"#)
                .unwrap();

        let message = &table.contexts()[0].messages()[0];
        expect_that!(message.id(), some(eq("msg.ok")));
        expect_that!(message.source(), eq(""));
    }

    #[googletest::test]
    fn test_duplicates_are_kept() {
        let table = parse(
            "<TS><context><name>A</name><message><source>x</source></message><message><source>x</source></message></context></TS>",
        )
        .unwrap();

        expect_that!(table.contexts()[0].messages().len(), eq(2));
    }

    #[googletest::test]
    fn test_unknown_children_are_kept_as_extras() {
        let table = parse(
            "<TS><context><name>A</name><message><source>x</source><translation>y</translation><userdata>u</userdata></message></context></TS>",
        )
        .unwrap();

        let message = &table.contexts()[0].messages()[0];
        assert_eq!(message.extras, vec!["<userdata>u</userdata>".to_string()]);
    }

    #[rstest]
    #[case::wrong_root("<xliff/>", "Expected root element <TS>, found <xliff>")]
    #[case::context_without_name(
        "<TS>\n<context><message><source>x</source></message></context></TS>",
        "Line 2: <context> is missing required <name>"
    )]
    #[case::message_without_source(
        "<TS><context><name>A</name>\n<message><translation>y</translation></message></context></TS>",
        "Line 2: <message> is missing required <source>"
    )]
    #[case::unknown_translation_type(
        "<TS><context><name>A</name><message><source>x</source><translation type=\"done\"/></message></context></TS>",
        "Line 1: invalid value 'done' for attribute 'type' of <translation>"
    )]
    #[case::bad_line(
        "<TS><context><name>A</name><message><location line=\"abc\"/><source>x</source></message></context></TS>",
        "Line 1: invalid value 'abc' for attribute 'line' of <location>"
    )]
    fn test_parse_errors(#[case] input: &str, #[case] expected: &str) {
        assert_that!(parse(input), err(displays_as(eq(expected))));
    }

    #[googletest::test]
    fn test_syntax_error_reports_line_and_column() {
        let result = parse("<TS>\n<context>\n  <name>A</nom>\n</context></TS>");

        assert_that!(result, err(displays_as(starts_with("Syntax error at line 3, column 10"))));
    }
}
