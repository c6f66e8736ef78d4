//! Element tree over the token stream, with byte spans kept for every node.

use std::ops::Range;

use super::escape::{
    decode_byte_value,
    unescape,
};
use super::lexer::{
    Attribute,
    Lexer,
    TokenKind,
};
use super::SyntaxError;

/// A parsed document: the source text plus its root element.
#[derive(Debug, Clone)]
pub struct Document<'a> {
    pub source: &'a str,
    pub root: Element<'a>,
}

/// An element and everything between its start and end tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element<'a> {
    pub name: &'a str,
    pub attributes: Vec<Attribute<'a>>,
    /// From `<` of the start tag to `>` of the end tag.
    pub span: Range<usize>,
    /// The start tag alone (the whole element for `<empty/>`).
    pub start_tag: Range<usize>,
    pub children: Vec<Node<'a>>,
}

/// Child node of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node<'a> {
    Element(Element<'a>),
    /// Character data as written (entities not decoded).
    Text { raw: &'a str, span: Range<usize> },
    /// Content of a CDATA section.
    CData { content: &'a str, span: Range<usize> },
    Comment { span: Range<usize> },
    /// Processing instructions and stray declarations.
    Other { span: Range<usize> },
}

impl Node<'_> {
    #[must_use]
    pub fn span(&self) -> Range<usize> {
        match self {
            Self::Element(element) => element.span.clone(),
            Self::Text { span, .. }
            | Self::CData { span, .. }
            | Self::Comment { span }
            | Self::Other { span } => span.clone(),
        }
    }

    /// Whitespace-only text carries no content.
    #[must_use]
    pub fn is_whitespace(&self) -> bool {
        matches!(self, Self::Text { raw, .. } if raw.trim().is_empty())
    }
}

impl<'a> Element<'a> {
    /// Element whose span is its start tag until the end tag is seen.
    fn from_tag(name: &'a str, attributes: Vec<Attribute<'a>>, span: Range<usize>) -> Self {
        Self { name, attributes, span: span.clone(), start_tag: span, children: Vec::new() }
    }

    /// Raw (escaped) attribute value.
    #[must_use]
    pub fn raw_attribute(&self, name: &str) -> Option<&Attribute<'a>> {
        self.attributes.iter().find(|attribute| attribute.name == name)
    }

    /// Decoded attribute value.
    pub fn attribute(&self, name: &str) -> Result<Option<String>, SyntaxError> {
        self.raw_attribute(name).map(|attribute| attribute.value().map(Into::into)).transpose()
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element<'a>> {
        self.children.iter().filter_map(|child| match child {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    #[must_use]
    pub fn first_child(&self, name: &str) -> Option<&Element<'a>> {
        self.child_elements().find(|element| element.name == name)
    }

    /// Concatenated character content.
    ///
    /// Entities are decoded, CDATA is taken verbatim, and lupdate's
    /// `<byte value="..."/>` elements become the character they encode.
    /// Comments and other elements are skipped.
    pub fn text(&self) -> Result<String, SyntaxError> {
        let mut out = String::new();
        for child in &self.children {
            match child {
                Node::Text { raw, span } => out.push_str(&unescape(raw, span.start)?),
                Node::CData { content, .. } => out.push_str(content),
                Node::Element(element) if element.name == "byte" => {
                    if let Some(c) =
                        element.attribute("value")?.as_deref().and_then(decode_byte_value)
                    {
                        out.push(c);
                    }
                }
                _ => {}
            }
        }
        Ok(out)
    }
}

/// Parses a whole document into an element tree.
///
/// Anything before and after the root element (declaration, doctype, comments,
/// whitespace) is left out of the tree; callers reach it through the spans.
pub fn parse_document(source: &str) -> Result<Document<'_>, SyntaxError> {
    let mut stack: Vec<Element<'_>> = Vec::new();
    let mut root: Option<Element<'_>> = None;

    for token in Lexer::new(source) {
        let token = token?;
        let span = token.span.clone();
        match token.kind {
            TokenKind::StartTag => {
                if stack.is_empty() && root.is_some() {
                    return Err(SyntaxError::MultipleRootElements { offset: span.start });
                }
                stack.push(Element::from_tag(token.name, token.attributes, span));
            }
            TokenKind::EmptyTag => {
                let element = Element::from_tag(token.name, token.attributes, span);
                attach(&mut stack, &mut root, Node::Element(element))?;
            }
            TokenKind::EndTag => {
                let Some(mut element) = stack.pop() else {
                    return Err(SyntaxError::UnexpectedEndTag {
                        name: token.name.to_string(),
                        offset: span.start,
                    });
                };
                if element.name != token.name {
                    return Err(SyntaxError::MismatchedEndTag {
                        expected: element.name.to_string(),
                        found: token.name.to_string(),
                        offset: span.start,
                    });
                }
                element.span.end = span.end;
                attach(&mut stack, &mut root, Node::Element(element))?;
            }
            TokenKind::Text => {
                let raw = source.get(span.clone()).unwrap_or_default();
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::Text { raw, span });
                } else if !outside_root_is_blank(raw, span.start) {
                    return Err(SyntaxError::TextOutsideRoot { offset: span.start });
                }
            }
            TokenKind::CData => {
                let Some(parent) = stack.last_mut() else {
                    return Err(SyntaxError::TextOutsideRoot { offset: span.start });
                };
                let content = source.get(span.start + 9..span.end - 3).unwrap_or_default();
                parent.children.push(Node::CData { content, span });
            }
            TokenKind::Comment => {
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::Comment { span });
                }
            }
            TokenKind::Declaration | TokenKind::ProcessingInstruction | TokenKind::Doctype => {
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::Other { span });
                }
            }
        }
    }

    if let Some(open) = stack.pop() {
        return Err(SyntaxError::UnclosedElement {
            name: open.name.to_string(),
            offset: open.span.start,
        });
    }

    let root = root.ok_or(SyntaxError::MissingRootElement)?;
    Ok(Document { source, root })
}

/// Whitespace, plus a byte order mark at the very start of the document.
fn outside_root_is_blank(raw: &str, offset: usize) -> bool {
    let raw = if offset == 0 { raw.strip_prefix('\u{feff}').unwrap_or(raw) } else { raw };
    raw.trim().is_empty()
}

/// Appends `node` to the open element, or makes it the root.
///
/// Text outside the root must be blank.
fn attach<'a>(
    stack: &mut [Element<'a>],
    root: &mut Option<Element<'a>>,
    node: Node<'a>,
) -> Result<(), SyntaxError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        return Ok(());
    }
    if let Node::Element(element) = node {
        if root.is_some() {
            return Err(SyntaxError::MultipleRootElements { offset: element.span.start });
        }
        *root = Some(element);
    }
    Ok(())
}
