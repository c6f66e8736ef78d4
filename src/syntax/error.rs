use thiserror::Error;

/// Defines errors that may occur while scanning a translation file
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    /// Input ended inside a construct
    #[error("Unexpected end of input at byte {offset}: expected {expected}")]
    UnexpectedEof { expected: &'static str, offset: usize },
    /// A tag or attribute name is empty or malformed
    #[error("Invalid name at byte {offset}")]
    InvalidName { offset: usize },
    /// A tag is not closed by `>` or `/>`
    #[error("Expected '>' at byte {offset}")]
    ExpectedTagClose { offset: usize },
    /// An attribute is missing `=` or its quotes
    #[error("Malformed attribute at byte {offset}")]
    MalformedAttribute { offset: usize },
    /// An end tag does not match the innermost open element
    #[error("Mismatched end tag at byte {offset}: expected </{expected}>, found </{found}>")]
    MismatchedEndTag { expected: String, found: String, offset: usize },
    /// An end tag appears with no open element
    #[error("Unexpected end tag </{name}> at byte {offset}")]
    UnexpectedEndTag { name: String, offset: usize },
    /// An element is still open at end of input
    #[error("Element <{name}> opened at byte {offset} is never closed")]
    UnclosedElement { name: String, offset: usize },
    /// The document has no element at all
    #[error("Document has no root element")]
    MissingRootElement,
    /// A second top-level element follows the root
    #[error("Second root element at byte {offset}")]
    MultipleRootElements { offset: usize },
    /// Non-whitespace text before or after the root element
    #[error("Text outside the root element at byte {offset}")]
    TextOutsideRoot { offset: usize },
    /// Unknown or malformed entity reference
    #[error("Invalid entity reference '&{entity};' at byte {offset}")]
    InvalidEntity { entity: String, offset: usize },
}

impl SyntaxError {
    /// Byte offset the error points at, if any.
    #[must_use]
    pub const fn offset(&self) -> Option<usize> {
        match self {
            Self::UnexpectedEof { offset, .. }
            | Self::InvalidName { offset }
            | Self::ExpectedTagClose { offset }
            | Self::MalformedAttribute { offset }
            | Self::MismatchedEndTag { offset, .. }
            | Self::UnexpectedEndTag { offset, .. }
            | Self::UnclosedElement { offset, .. }
            | Self::MultipleRootElements { offset }
            | Self::TextOutsideRoot { offset }
            | Self::InvalidEntity { offset, .. } => Some(*offset),
            Self::MissingRootElement => None,
        }
    }
}
