//! Lossless scanning of the XML used by translation files.
//!
//! The scanner keeps byte spans for every token and element so that callers
//! can reuse the source text verbatim when writing a file back.

/// Syntax error type
mod error;
pub mod escape;
pub mod lexer;
pub mod tree;

pub use error::SyntaxError;
pub use lexer::{
    Attribute,
    Lexer,
    Token,
    TokenKind,
};
pub use tree::{
    Document,
    Element,
    Node,
    parse_document,
};
