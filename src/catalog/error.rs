use thiserror::Error;

use crate::syntax::SyntaxError;
use crate::types::LineIndex;

/// Errors raised while reading, editing or writing a translation table
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to access translation file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Syntax error at line {line}, column {column}: {error}")]
    Syntax {
        #[source]
        error: SyntaxError,
        line: u32,
        column: u32,
    },

    #[error("Expected root element <TS>, found <{0}>")]
    UnexpectedRoot(String),

    #[error("Line {line}: <{element}> is missing required <{child}>")]
    MissingElement { element: &'static str, child: &'static str, line: u32 },

    #[error("Line {line}: invalid value '{value}' for attribute '{attribute}' of <{element}>")]
    InvalidAttribute { element: &'static str, attribute: &'static str, value: String, line: u32 },

    #[error("Message '{source_text}' already exists in context '{context}'")]
    DuplicateMessage { context: String, source_text: String },

    #[error("Context '{0}' already exists")]
    DuplicateContext(String),

    #[error("Context '{0}' not found")]
    ContextNotFound(String),

    #[error("Message '{source_text}' not found in context '{context}'")]
    MessageNotFound { context: String, source_text: String },
}

impl CatalogError {
    /// Wraps a syntax error with the 1-based line/column it points at.
    #[must_use]
    pub fn syntax(error: SyntaxError, text: &str) -> Self {
        let position = error
            .offset()
            .map(|offset| LineIndex::new(text).position(text, offset))
            .unwrap_or_default();
        Self::Syntax { error, line: position.display_line(), column: position.character + 1 }
    }
}
