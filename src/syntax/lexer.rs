//! Lossless tokenizer for the XML subset used by translation files.
//!
//! Every byte of the input belongs to exactly one token, so joining the token
//! spans in order gives back the input unchanged.

use std::borrow::Cow;
use std::ops::Range;

use super::SyntaxError;
use super::escape::unescape;

/// Kind of a lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `<?xml ...?>`
    Declaration,
    /// `<?target ...?>`
    ProcessingInstruction,
    /// `<!DOCTYPE ...>`
    Doctype,
    /// `<!-- ... -->`
    Comment,
    /// `<![CDATA[ ... ]]>`
    CData,
    /// `<name ...>`
    StartTag,
    /// `</name>`
    EndTag,
    /// `<name .../>`
    EmptyTag,
    /// Character data between markup
    Text,
}

/// An attribute of a start or empty tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute<'a> {
    pub name: &'a str,
    /// Value as written, entities not decoded.
    pub raw_value: &'a str,
    /// Byte span of the value, quotes excluded.
    pub value_span: Range<usize>,
}

impl<'a> Attribute<'a> {
    /// Decoded attribute value.
    pub fn value(&self) -> Result<Cow<'a, str>, SyntaxError> {
        unescape(self.raw_value, self.value_span.start)
    }
}

/// A lexical token with its byte span in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub span: Range<usize>,
    /// Tag name; empty for non-tag tokens.
    pub name: &'a str,
    pub attributes: Vec<Attribute<'a>>,
}

/// Iterator over the tokens of a document.
///
/// Stops after the first error.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    /// Whole document.
    input: &'a str,
    /// Byte offset of the next token.
    pos: usize,
    /// Set once an error was returned.
    failed: bool,
}

impl<'a> Lexer<'a> {
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self { input, pos: 0, failed: false }
    }

    /// Input from `from` on; empty past the end.
    fn tail(&self, from: usize) -> &'a str {
        self.input.get(from..).unwrap_or_default()
    }

    /// First offset at or after `from` that is not ASCII whitespace.
    fn skip_whitespace(&self, from: usize) -> usize {
        let tail = self.tail(from);
        from + (tail.len() - tail.trim_start_matches(|c: char| c.is_ascii_whitespace()).len())
    }

    /// Returns the offset just past `terminator`, searching from `from`.
    fn scan_until(
        &self,
        from: usize,
        terminator: &str,
        expected: &'static str,
    ) -> Result<usize, SyntaxError> {
        self.tail(from)
            .find(terminator)
            .map(|index| from + index + terminator.len())
            .ok_or(SyntaxError::UnexpectedEof { expected, offset: self.pos })
    }

    /// Name starting at `from` and the offset just past it.
    fn scan_name(&self, from: usize) -> Result<(&'a str, usize), SyntaxError> {
        let tail = self.tail(from);
        let len = tail
            .find(|c: char| {
                c.is_ascii_whitespace() || matches!(c, '/' | '>' | '=' | '<' | '"' | '\'')
            })
            .unwrap_or(tail.len());
        if len == 0 {
            return Err(SyntaxError::InvalidName { offset: from });
        }
        Ok((tail.get(..len).unwrap_or_default(), from + len))
    }

    /// `<!DOCTYPE ...>` may carry an internal subset in brackets and quoted literals.
    fn scan_doctype(&self, start: usize) -> Result<usize, SyntaxError> {
        let mut depth = 0usize;
        let mut quote: Option<char> = None;
        for (index, c) in self.tail(start + 2).char_indices() {
            match (quote, c) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '"' | '\'') => quote = Some(c),
                (None, '[') => depth += 1,
                (None, ']') => depth = depth.saturating_sub(1),
                (None, '>') if depth == 0 => return Ok(start + 2 + index + 1),
                _ => {}
            }
        }
        Err(SyntaxError::UnexpectedEof { expected: "'>'", offset: start })
    }

    /// Token without name or attributes, from the current position to `end`.
    fn simple(&mut self, kind: TokenKind, end: usize) -> Token<'a> {
        let span = self.pos..end;
        self.pos = end;
        Token { kind, span, name: "", attributes: Vec::new() }
    }

    /// `</name>`, optionally with whitespace before `>`.
    fn end_tag(&mut self, start: usize) -> Result<Token<'a>, SyntaxError> {
        let (name, after_name) = self.scan_name(start + 2)?;
        let close = self.skip_whitespace(after_name);
        let tail = self.tail(close);
        if tail.is_empty() {
            return Err(SyntaxError::UnexpectedEof { expected: "'>'", offset: start });
        }
        if !tail.starts_with('>') {
            return Err(SyntaxError::ExpectedTagClose { offset: close });
        }
        self.pos = close + 1;
        Ok(Token { kind: TokenKind::EndTag, span: start..close + 1, name, attributes: Vec::new() })
    }

    /// `<name attr="value">` or `<name/>`; attribute values stay undecoded.
    fn start_tag(&mut self, start: usize) -> Result<Token<'a>, SyntaxError> {
        let (name, mut cursor) = self.scan_name(start + 1)?;
        let mut attributes = Vec::new();

        let (kind, end) = loop {
            let next = self.skip_whitespace(cursor);
            let tail = self.tail(next);
            if tail.starts_with("/>") {
                break (TokenKind::EmptyTag, next + 2);
            }
            if tail.starts_with('>') {
                break (TokenKind::StartTag, next + 1);
            }
            if tail.is_empty() {
                return Err(SyntaxError::UnexpectedEof { expected: "'>'", offset: start });
            }
            // attributes must be separated by whitespace
            if next == cursor {
                return Err(SyntaxError::MalformedAttribute { offset: cursor });
            }

            let (attr_name, after_name) = self
                .scan_name(next)
                .map_err(|_| SyntaxError::MalformedAttribute { offset: next })?;
            let equals = self.skip_whitespace(after_name);
            if !self.tail(equals).starts_with('=') {
                return Err(SyntaxError::MalformedAttribute { offset: equals });
            }
            let open_quote = self.skip_whitespace(equals + 1);
            let Some(quote) = self.tail(open_quote).chars().next().filter(|c| matches!(c, '"' | '\''))
            else {
                return Err(SyntaxError::MalformedAttribute { offset: open_quote });
            };

            let value_start = open_quote + 1;
            let value_len = self.tail(value_start).find(quote).ok_or(
                SyntaxError::UnexpectedEof { expected: "closing quote", offset: open_quote },
            )?;
            let value_end = value_start + value_len;
            attributes.push(Attribute {
                name: attr_name,
                raw_value: self.input.get(value_start..value_end).unwrap_or_default(),
                value_span: value_start..value_end,
            });
            cursor = value_end + 1;
        };

        self.pos = end;
        Ok(Token { kind, span: start..end, name, attributes })
    }

    /// Dispatches on the markup at the current position.
    fn next_token(&mut self) -> Result<Token<'a>, SyntaxError> {
        let start = self.pos;
        let rest = self.tail(start);

        if rest.starts_with("<!--") {
            let end = self.scan_until(start + 4, "-->", "'-->'")?;
            Ok(self.simple(TokenKind::Comment, end))
        } else if rest.starts_with("<![CDATA[") {
            let end = self.scan_until(start + 9, "]]>", "']]>'")?;
            Ok(self.simple(TokenKind::CData, end))
        } else if rest.starts_with("<!") {
            let end = self.scan_doctype(start)?;
            Ok(self.simple(TokenKind::Doctype, end))
        } else if rest.starts_with("<?") {
            let end = self.scan_until(start + 2, "?>", "'?>'")?;
            let kind = if is_xml_declaration(rest) {
                TokenKind::Declaration
            } else {
                TokenKind::ProcessingInstruction
            };
            Ok(self.simple(kind, end))
        } else if rest.starts_with("</") {
            self.end_tag(start)
        } else if rest.starts_with('<') {
            self.start_tag(start)
        } else {
            let end = rest.find('<').map_or(self.input.len(), |index| start + index);
            Ok(self.simple(TokenKind::Text, end))
        }
    }
}

/// `<?xml` followed by whitespace or `?`, not a PI target such as `<?xml-stylesheet`.
fn is_xml_declaration(rest: &str) -> bool {
    rest.strip_prefix("<?xml")
        .and_then(|after| after.chars().next())
        .is_some_and(|c| c.is_ascii_whitespace() || c == '?')
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>, SyntaxError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.input.len() {
            return None;
        }
        let result = self.next_token();
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}
