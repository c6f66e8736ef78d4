//! Translation table data model.
//!
//! Parsed nodes remember the text they were read from (`raw`) so the writer
//! can emit them unchanged. Every setter marks its node dirty; only dirty
//! nodes are rendered again.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::CatalogError;

/// Value of the `type` attribute of `<translation>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationKind {
    /// No `type` attribute.
    #[default]
    Finished,
    Unfinished,
    /// Kept in the file but no longer used by the UI (Qt 4 lupdate).
    Obsolete,
    /// Same as `Obsolete`, written by newer lupdate.
    Vanished,
}

impl TranslationKind {
    /// Parses the `type` attribute; `None` means finished.
    #[must_use]
    pub fn from_attribute(value: Option<&str>) -> Option<Self> {
        match value {
            None => Some(Self::Finished),
            Some("unfinished") => Some(Self::Unfinished),
            Some("obsolete") => Some(Self::Obsolete),
            Some("vanished") => Some(Self::Vanished),
            Some(_) => None,
        }
    }

    #[must_use]
    pub const fn as_attribute(self) -> Option<&'static str> {
        match self {
            Self::Finished => None,
            Self::Unfinished => Some("unfinished"),
            Self::Obsolete => Some("obsolete"),
            Self::Vanished => Some("vanished"),
        }
    }

    #[must_use]
    pub const fn is_obsolete(self) -> bool {
        matches!(self, Self::Obsolete | Self::Vanished)
    }
}

/// Translated text: one string, or one string per plural form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum TranslationText {
    Single(String),
    Plural(Vec<String>),
}

impl Default for TranslationText {
    fn default() -> Self {
        Self::Single(String::new())
    }
}

impl TranslationText {
    /// True when there is no non-empty form.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(text) => text.is_empty(),
            Self::Plural(forms) => forms.iter().all(String::is_empty),
        }
    }

    /// All forms in order; a single text is one form.
    #[must_use]
    pub fn forms(&self) -> Vec<&str> {
        match self {
            Self::Single(text) => vec![text.as_str()],
            Self::Plural(forms) => forms.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for TranslationText {
    fn from(text: &str) -> Self {
        Self::Single(text.to_string())
    }
}

impl From<String> for TranslationText {
    fn from(text: String) -> Self {
        Self::Single(text)
    }
}

/// The `<translation>` element of a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Translation {
    pub kind: TranslationKind,
    pub text: TranslationText,
}

impl Translation {
    pub fn finished(text: impl Into<TranslationText>) -> Self {
        Self { kind: TranslationKind::Finished, text: text.into() }
    }

    pub fn unfinished(text: impl Into<TranslationText>) -> Self {
        Self { kind: TranslationKind::Unfinished, text: text.into() }
    }
}

/// Translation state of a message, as reported to users.
///
/// `Blank` and `Unfinished` both may carry an empty string: `Blank` is a
/// finished translation that is intentionally empty, `Unfinished` still needs
/// a translator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationStatus {
    /// No `<translation>` element at all.
    Missing,
    Unfinished,
    Blank,
    Translated,
    Obsolete,
    Vanished,
}

impl TranslationStatus {
    pub const ALL: [Self; 6] = [
        Self::Missing,
        Self::Unfinished,
        Self::Blank,
        Self::Translated,
        Self::Obsolete,
        Self::Vanished,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Unfinished => "unfinished",
            Self::Blank => "blank",
            Self::Translated => "translated",
            Self::Obsolete => "obsolete",
            Self::Vanished => "vanished",
        }
    }
}

impl fmt::Display for TranslationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TranslationStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|status| status.as_str() == value).ok_or_else(|| {
            format!(
                "unknown status '{value}', expected one of: {}",
                Self::ALL.map(Self::as_str).join(", ")
            )
        })
    }
}

/// The `line` attribute of `<location>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineRef {
    Absolute(u32),
    /// lupdate's relative form (`+3`, `-2`), counted from the previous location.
    Relative(i64),
}

impl FromStr for LineRef {
    type Err = std::num::ParseIntError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.starts_with(['+', '-']) {
            value.parse().map(Self::Relative)
        } else {
            value.parse().map(Self::Absolute)
        }
    }
}

impl fmt::Display for LineRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absolute(line) => write!(f, "{line}"),
            Self::Relative(delta) => write!(f, "{delta:+}"),
        }
    }
}

/// Where a source string was found. Informational only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Location {
    pub filename: Option<String>,
    pub line: Option<LineRef>,
}

impl Location {
    pub fn new(filename: impl Into<String>, line: u32) -> Self {
        Self { filename: Some(filename.into()), line: Some(LineRef::Absolute(line)) }
    }
}

/// Identity of a message inside its context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageKey {
    pub source: String,
    /// Disambiguation comment.
    pub comment: Option<String>,
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.comment {
            Some(comment) => write!(f, "'{}' ({comment})", self.source),
            None => write!(f, "'{}'", self.source),
        }
    }
}

/// Text a message was read from.
#[derive(Debug, Clone)]
pub(super) struct RawMessage {
    /// Whitespace and foreign nodes between the previous sibling and `<message>`.
    pub(super) leading: String,
    /// `<message ...>` through `</message>`.
    pub(super) element: String,
    /// Span of `<translation>` inside `element`.
    pub(super) translation_span: Option<std::ops::Range<usize>>,
}

/// One translatable unit.
#[derive(Debug, Clone)]
pub struct Message {
    /// `id` attribute.
    pub(super) id: Option<String>,
    /// `numerus="yes"`: the translation has plural forms.
    pub(super) numerus: bool,
    /// `<location>` elements in file order.
    pub(super) locations: Vec<Location>,
    /// Source text; with the comment, the identity of the message.
    pub(super) source: String,
    /// Source text before the last lupdate run.
    pub(super) old_source: Option<String>,
    /// Disambiguation comment.
    pub(super) comment: Option<String>,
    /// Disambiguation comment before the last lupdate run.
    pub(super) old_comment: Option<String>,
    /// `<extracomment>`.
    pub(super) extra_comment: Option<String>,
    /// `<translatorcomment>`.
    pub(super) translator_comment: Option<String>,
    /// `None` when the message has no `<translation>` element.
    pub(super) translation: Option<Translation>,
    /// Unknown child elements, kept as written.
    pub(super) extras: Vec<String>,
    /// 1-based line of `<message>` in the file it was read from.
    pub(super) line: Option<u32>,
    /// Text this message was parsed from.
    pub(super) raw: Option<RawMessage>,
    /// Something other than the translation changed.
    pub(super) body_dirty: bool,
    /// The translation changed.
    pub(super) translation_dirty: bool,
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.numerus == other.numerus
            && self.locations == other.locations
            && self.source == other.source
            && self.old_source == other.old_source
            && self.comment == other.comment
            && self.old_comment == other.old_comment
            && self.extra_comment == other.extra_comment
            && self.translator_comment == other.translator_comment
            && self.translation == other.translation
            && self.extras == other.extras
    }
}

impl Eq for Message {}

impl Message {
    /// A new message with no translation element.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            id: None,
            numerus: false,
            locations: Vec::new(),
            source: source.into(),
            old_source: None,
            comment: None,
            old_comment: None,
            extra_comment: None,
            translator_comment: None,
            translation: None,
            extras: Vec::new(),
            line: None,
            raw: None,
            body_dirty: true,
            translation_dirty: true,
        }
    }

    /// Sets the disambiguation comment. Part of the message's identity.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: Location) -> Self {
        self.locations.push(location);
        self
    }

    #[must_use]
    pub fn with_translation(mut self, translation: Translation) -> Self {
        self.translation = Some(translation);
        self
    }

    #[must_use]
    pub const fn with_numerus(mut self, numerus: bool) -> Self {
        self.numerus = numerus;
        self
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    #[must_use]
    pub const fn is_numerus(&self) -> bool {
        self.numerus
    }

    #[must_use]
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn old_source(&self) -> Option<&str> {
        self.old_source.as_deref()
    }

    /// Disambiguation comment.
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    #[must_use]
    pub fn old_comment(&self) -> Option<&str> {
        self.old_comment.as_deref()
    }

    /// Comment for translators extracted from the code.
    #[must_use]
    pub fn extra_comment(&self) -> Option<&str> {
        self.extra_comment.as_deref()
    }

    #[must_use]
    pub fn translator_comment(&self) -> Option<&str> {
        self.translator_comment.as_deref()
    }

    #[must_use]
    pub const fn translation(&self) -> Option<&Translation> {
        self.translation.as_ref()
    }

    /// Line of `<message>` in the file this message was parsed from.
    #[must_use]
    pub const fn line(&self) -> Option<u32> {
        self.line
    }

    /// True when this message was edited or never written.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.raw.is_none() || self.body_dirty || self.translation_dirty
    }

    #[must_use]
    pub fn key(&self) -> MessageKey {
        MessageKey { source: self.source.clone(), comment: self.comment.clone() }
    }

    /// Identity of the message inside its context.
    #[must_use]
    pub fn matches(&self, source: &str, comment: Option<&str>) -> bool {
        self.source == source && self.comment.as_deref() == comment
    }

    #[must_use]
    pub fn status(&self) -> TranslationStatus {
        match &self.translation {
            None => TranslationStatus::Missing,
            Some(translation) => match translation.kind {
                TranslationKind::Unfinished => TranslationStatus::Unfinished,
                TranslationKind::Obsolete => TranslationStatus::Obsolete,
                TranslationKind::Vanished => TranslationStatus::Vanished,
                TranslationKind::Finished if translation.text.is_empty() => {
                    TranslationStatus::Blank
                }
                TranslationKind::Finished => TranslationStatus::Translated,
            },
        }
    }

    pub fn set_translation(&mut self, translation: Option<Translation>) {
        if self.translation != translation {
            self.translation = translation;
            self.translation_dirty = true;
        }
    }

    /// Sets the text and marks the translation finished.
    pub fn translate(&mut self, text: impl Into<TranslationText>) {
        self.set_translation(Some(Translation::finished(text)));
    }

    /// Changes only the kind, keeping the text (an empty text if there was none).
    pub fn set_kind(&mut self, kind: TranslationKind) {
        let text = self.translation.as_ref().map(|t| t.text.clone()).unwrap_or_default();
        self.set_translation(Some(Translation { kind, text }));
    }

    pub fn set_locations(&mut self, locations: Vec<Location>) {
        if self.locations != locations {
            self.locations = locations;
            self.body_dirty = true;
        }
    }

    pub fn set_translator_comment(&mut self, comment: Option<String>) {
        if self.translator_comment != comment {
            self.translator_comment = comment;
            self.body_dirty = true;
        }
    }

    pub fn set_extra_comment(&mut self, comment: Option<String>) {
        if self.extra_comment != comment {
            self.extra_comment = comment;
            self.body_dirty = true;
        }
    }

    pub fn set_numerus(&mut self, numerus: bool) {
        if self.numerus != numerus {
            self.numerus = numerus;
            self.body_dirty = true;
        }
    }
}

/// Text a context was read from.
#[derive(Debug, Clone)]
pub(super) struct RawContext {
    pub(super) leading: String,
    /// `<context>` through the last child before the first message.
    pub(super) open: String,
    /// After the last message through `</context>`.
    pub(super) close: String,
}

/// A named group of messages, usually one form or one source module.
#[derive(Debug, Clone)]
pub struct Context {
    /// Context name, unique within a table.
    pub(super) name: String,
    /// Disambiguation comment.
    pub(super) comment: Option<String>,
    /// Messages in file order.
    pub(super) messages: Vec<Message>,
    /// Text this context was parsed from.
    pub(super) raw: Option<RawContext>,
    /// Name or comment changed.
    pub(super) head_dirty: bool,
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.comment == other.comment && self.messages == other.messages
    }
}

impl Eq for Context {}

impl Context {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), comment: None, messages: Vec::new(), raw: None, head_dirty: true }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn set_comment(&mut self, comment: Option<String>) {
        if self.comment != comment {
            self.comment = comment;
            self.head_dirty = true;
        }
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Messages can be edited in place; identity (source, comment) cannot change.
    pub fn messages_mut(&mut self) -> &mut [Message] {
        &mut self.messages
    }

    #[must_use]
    pub fn find(&self, source: &str, comment: Option<&str>) -> Option<&Message> {
        self.messages.iter().find(|message| message.matches(source, comment))
    }

    pub fn find_mut(&mut self, source: &str, comment: Option<&str>) -> Option<&mut Message> {
        self.messages.iter_mut().find(|message| message.matches(source, comment))
    }

    /// Appends a message, rejecting a second message with the same source and comment.
    pub fn add_message(&mut self, message: Message) -> Result<&mut Message, CatalogError> {
        if self.find(&message.source, message.comment.as_deref()).is_some() {
            return Err(CatalogError::DuplicateMessage {
                context: self.name.clone(),
                source_text: message.source,
            });
        }
        self.messages.push(message);
        Ok(last_pushed(&mut self.messages))
    }

    pub fn remove_message(&mut self, source: &str, comment: Option<&str>) -> Option<Message> {
        let index = self.messages.iter().position(|message| message.matches(source, comment))?;
        Some(self.messages.remove(index))
    }

    /// Keeps only the messages for which `keep` returns true.
    pub fn retain_messages(&mut self, keep: impl FnMut(&Message) -> bool) {
        self.messages.retain(keep);
    }
}

/// Text around the contexts of a parsed table.
#[derive(Debug, Clone)]
pub(super) struct RawTable {
    /// Start of the file through `<TS ...>` (and anything before the first context).
    pub(super) head: String,
    /// Span of the `<TS>` start tag inside `head`.
    pub(super) root_tag: std::ops::Range<usize>,
    /// After the last context through end of file.
    pub(super) tail: String,
    /// The root was written `<TS/>`.
    pub(super) self_closing: bool,
    /// Attributes of `<TS>` this model does not know, as written.
    pub(super) other_attributes: Vec<String>,
}

/// A whole `.ts` file.
#[derive(Debug, Clone, Default)]
pub struct TranslationTable {
    /// `version` attribute of `<TS>`.
    pub(super) version: Option<String>,
    /// `language` attribute.
    pub(super) language: Option<String>,
    /// `sourcelanguage` attribute.
    pub(super) source_language: Option<String>,
    /// Contexts in file order.
    pub(super) contexts: Vec<Context>,
    /// Text around the contexts, when parsed.
    pub(super) raw: Option<RawTable>,
    /// Attributes of `<TS>` changed.
    pub(super) header_dirty: bool,
}

impl PartialEq for TranslationTable {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
            && self.language == other.language
            && self.source_language == other.source_language
            && self.contexts == other.contexts
    }
}

impl Eq for TranslationTable {}

impl TranslationTable {
    /// Format version lupdate writes today.
    pub const DEFAULT_VERSION: &'static str = "2.1";

    /// An empty table for `language`.
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            version: Some(Self::DEFAULT_VERSION.to_string()),
            language: Some(language.into()),
            header_dirty: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    #[must_use]
    pub fn source_language(&self) -> Option<&str> {
        self.source_language.as_deref()
    }

    pub fn set_language(&mut self, language: Option<String>) {
        if self.language != language {
            self.language = language;
            self.header_dirty = true;
        }
    }

    pub fn set_source_language(&mut self, language: Option<String>) {
        if self.source_language != language {
            self.source_language = language;
            self.header_dirty = true;
        }
    }

    #[must_use]
    pub fn contexts(&self) -> &[Context] {
        &self.contexts
    }

    pub fn contexts_mut(&mut self) -> &mut [Context] {
        &mut self.contexts
    }

    #[must_use]
    pub fn context(&self, name: &str) -> Option<&Context> {
        self.contexts.iter().find(|context| context.name == name)
    }

    pub fn context_mut(&mut self, name: &str) -> Option<&mut Context> {
        self.contexts.iter_mut().find(|context| context.name == name)
    }

    /// Appends a context; names must be unique.
    pub fn add_context(&mut self, context: Context) -> Result<&mut Context, CatalogError> {
        if self.context(&context.name).is_some() {
            return Err(CatalogError::DuplicateContext(context.name));
        }
        self.contexts.push(context);
        Ok(last_pushed(&mut self.contexts))
    }

    /// Returns the context named `name`, creating it at the end if needed.
    #[allow(clippy::indexing_slicing)] // index comes from position()
    pub fn context_or_insert(&mut self, name: &str) -> &mut Context {
        match self.contexts.iter().position(|context| context.name == name) {
            Some(index) => &mut self.contexts[index],
            None => {
                self.contexts.push(Context::new(name));
                last_pushed(&mut self.contexts)
            }
        }
    }

    #[must_use]
    pub fn find(&self, context: &str, source: &str, comment: Option<&str>) -> Option<&Message> {
        self.context(context)?.find(source, comment)
    }

    /// Like [`Self::find`], but reports which part of the lookup failed.
    pub fn find_mut(
        &mut self,
        context: &str,
        source: &str,
        comment: Option<&str>,
    ) -> Result<&mut Message, CatalogError> {
        let group = self
            .context_mut(context)
            .ok_or_else(|| CatalogError::ContextNotFound(context.to_string()))?;
        group.find_mut(source, comment).ok_or_else(|| CatalogError::MessageNotFound {
            context: context.to_string(),
            source_text: source.to_string(),
        })
    }

    /// Every message with its context, in file order.
    pub fn iter_messages(&self) -> impl Iterator<Item = (&Context, &Message)> {
        self.contexts
            .iter()
            .flat_map(|context| context.messages.iter().map(move |message| (context, message)))
    }

    /// Sets a finished translation for an existing message.
    pub fn set_translation(
        &mut self,
        context: &str,
        source: &str,
        comment: Option<&str>,
        text: impl Into<TranslationText>,
    ) -> Result<(), CatalogError> {
        let message = self.find_mut(context, source, comment)?;
        let text = match (message.numerus, text.into()) {
            (true, TranslationText::Single(single)) => TranslationText::Plural(vec![single]),
            (_, text) => text,
        };
        message.translate(text);
        Ok(())
    }

    pub fn mark_unfinished(
        &mut self,
        context: &str,
        source: &str,
        comment: Option<&str>,
    ) -> Result<(), CatalogError> {
        self.find_mut(context, source, comment)?.set_kind(TranslationKind::Unfinished);
        Ok(())
    }

    pub fn mark_obsolete(
        &mut self,
        context: &str,
        source: &str,
        comment: Option<&str>,
    ) -> Result<(), CatalogError> {
        self.find_mut(context, source, comment)?.set_kind(TranslationKind::Obsolete);
        Ok(())
    }

    /// Removes obsolete and vanished messages, then contexts left empty by that.
    ///
    /// Returns the number of removed messages.
    pub fn drop_obsolete(&mut self) -> usize {
        let mut removed = 0;
        self.contexts.retain_mut(|context| {
            let before = context.messages.len();
            context.retain_messages(|message| {
                !message.translation.as_ref().is_some_and(|t| t.kind.is_obsolete())
            });
            let dropped = before - context.messages.len();
            removed += dropped;
            dropped == 0 || !context.messages.is_empty()
        });
        removed
    }
}

/// The element just pushed onto a non-empty vector.
#[allow(clippy::indexing_slicing)] // callers push before calling
fn last_pushed<T>(items: &mut [T]) -> &mut T {
    let last = items.len() - 1;
    &mut items[last]
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::missing(None, TranslationStatus::Missing)]
    #[case::unfinished_empty(Some(Translation::unfinished("")), TranslationStatus::Unfinished)]
    #[case::unfinished_text(Some(Translation::unfinished("Vue")), TranslationStatus::Unfinished)]
    #[case::blank(Some(Translation::finished("")), TranslationStatus::Blank)]
    #[case::translated(Some(Translation::finished("Vue")), TranslationStatus::Translated)]
    #[case::obsolete(
        Some(Translation { kind: TranslationKind::Obsolete, text: "Vue".into() }),
        TranslationStatus::Obsolete
    )]
    #[case::vanished(
        Some(Translation { kind: TranslationKind::Vanished, text: "".into() }),
        TranslationStatus::Vanished
    )]
    #[case::plural_all_empty(
        Some(Translation::finished(TranslationText::Plural(vec![String::new(), String::new()]))),
        TranslationStatus::Blank
    )]
    fn test_status(#[case] translation: Option<Translation>, #[case] expected: TranslationStatus) {
        let mut message = Message::new("par");
        message.set_translation(translation);

        assert_that!(message.status(), eq(expected));
    }

    #[rstest]
    #[case::absolute("42", LineRef::Absolute(42))]
    #[case::relative_plus("+3", LineRef::Relative(3))]
    #[case::relative_minus("-2", LineRef::Relative(-2))]
    fn test_line_ref_round_trip(#[case] text: &str, #[case] expected: LineRef) {
        let parsed: LineRef = text.parse().unwrap();

        assert_that!(parsed, eq(expected));
        assert_that!(parsed.to_string(), eq(text));
    }

    #[googletest::test]
    fn test_status_from_str() {
        expect_that!("blank".parse::<TranslationStatus>(), ok(eq(&TranslationStatus::Blank)));
        expect_that!(
            "done".parse::<TranslationStatus>(),
            err(contains_substring("expected one of"))
        );
    }

    #[googletest::test]
    fn test_add_message_rejects_duplicate_source() {
        let mut context = Context::new("MainWindow");
        context.add_message(Message::new("Analyser")).unwrap();

        let result = context.add_message(Message::new("Analyser"));

        expect_that!(
            result.map(|_| ()),
            err(displays_as(contains_substring("already exists in context 'MainWindow'")))
        );
        expect_that!(context.messages().len(), eq(1));
    }

    #[googletest::test]
    fn test_add_message_allows_same_source_with_other_comment() {
        let mut context = Context::new("MainWindow");
        context.add_message(Message::new("Open")).unwrap();

        context.add_message(Message::new("Open").with_comment("menu")).unwrap();

        expect_that!(context.messages().len(), eq(2));
        expect_that!(context.find("Open", Some("menu")).is_some(), eq(true));
        expect_that!(context.find("Open", Some("toolbar")).is_none(), eq(true));
    }

    #[googletest::test]
    fn test_add_context_rejects_duplicate_name() {
        let mut table = TranslationTable::new("fr_FR");
        table.add_context(Context::new("Dialog")).unwrap();

        expect_that!(table.add_context(Context::new("Dialog")).map(|_| ()), err(anything()));
        expect_that!(table.contexts().len(), eq(1));
    }

    #[googletest::test]
    fn test_set_translation_marks_finished() {
        let mut table = TranslationTable::new("fr_FR");
        table
            .context_or_insert("MainWindow")
            .add_message(Message::new("View").with_translation(Translation::unfinished("")))
            .unwrap();

        table.set_translation("MainWindow", "View", None, "Vue").unwrap();

        let message = table.find("MainWindow", "View", None).unwrap();
        expect_that!(message.status(), eq(TranslationStatus::Translated));
        assert_eq!(message.translation().unwrap().text, TranslationText::from("Vue"));
    }

    #[googletest::test]
    fn test_set_translation_on_numerus_message_uses_plural_forms() {
        let mut table = TranslationTable::new("fr_FR");
        table
            .context_or_insert("Results")
            .add_message(Message::new("%n error(s)").with_numerus(true))
            .unwrap();

        table.set_translation("Results", "%n error(s)", None, "%n erreur(s)").unwrap();

        let message = table.find("Results", "%n error(s)", None).unwrap();
        assert_eq!(
            message.translation().unwrap().text,
            TranslationText::Plural(vec!["%n erreur(s)".to_string()])
        );
    }

    #[googletest::test]
    fn test_set_translation_unknown_targets() {
        let mut table = TranslationTable::new("fr_FR");
        table.context_or_insert("Dialog");

        expect_that!(
            table.set_translation("Nope", "x", None, "y"),
            err(displays_as(eq("Context 'Nope' not found")))
        );
        expect_that!(
            table.set_translation("Dialog", "x", None, "y"),
            err(displays_as(eq("Message 'x' not found in context 'Dialog'")))
        );
    }

    #[googletest::test]
    fn test_mark_obsolete_keeps_text() {
        let mut table = TranslationTable::new("fr_FR");
        table
            .context_or_insert("MainWindow")
            .add_message(Message::new("View").with_translation(Translation::finished("Vue")))
            .unwrap();

        table.mark_obsolete("MainWindow", "View", None).unwrap();

        let translation = table.find("MainWindow", "View", None).unwrap().translation().unwrap();
        expect_that!(translation.kind, eq(TranslationKind::Obsolete));
        assert_eq!(translation.text, TranslationText::from("Vue"));
    }

    #[googletest::test]
    fn test_drop_obsolete_removes_messages_and_emptied_contexts() {
        let mut table = TranslationTable::new("fr_FR");
        let main = table.context_or_insert("MainWindow");
        main.add_message(Message::new("View").with_translation(Translation {
            kind: TranslationKind::Obsolete,
            text: "Vue".into(),
        }))
        .unwrap();
        main.add_message(Message::new("Manage").with_translation(Translation::finished("Configuration")))
            .unwrap();
        table
            .context_or_insert("Old")
            .add_message(Message::new("Gone").with_translation(Translation {
                kind: TranslationKind::Vanished,
                text: "".into(),
            }))
            .unwrap();
        table.context_or_insert("Empty");

        let removed = table.drop_obsolete();

        expect_that!(removed, eq(2));
        let names: Vec<&str> = table.contexts().iter().map(Context::name).collect();
        assert_eq!(names, vec!["MainWindow", "Empty"]);
    }

    #[googletest::test]
    fn test_setters_only_mark_dirty_on_change() {
        let mut message = Message::new("x").with_translation(Translation::finished("y"));
        message.body_dirty = false;
        message.translation_dirty = false;

        message.translate("y");
        message.set_locations(Vec::new());

        expect_that!(message.body_dirty, eq(false));
        expect_that!(message.translation_dirty, eq(false));

        message.translate("z");
        expect_that!(message.translation_dirty, eq(true));
    }
}
