//! Qt Linguist translation tables (`.ts` files)
//!
//! [`parse`] keeps the text each node was read from, so [`write`] reproduces an
//! unedited file exactly and only re-renders what was changed.
/// Catalog error type
mod error;
/// Tables, contexts and messages
mod model;
/// TS file reader
mod parser;
/// Status counts
mod stats;
/// TS file writer
mod writer;

pub use error::CatalogError;
pub use model::{
    Context,
    LineRef,
    Location,
    Message,
    MessageKey,
    Translation,
    TranslationKind,
    TranslationStatus,
    TranslationTable,
    TranslationText,
};
pub use parser::{
    load,
    parse,
};
pub use stats::{
    CatalogStats,
    ContextStats,
    StatusCounts,
};
pub use writer::{
    save,
    write,
};
