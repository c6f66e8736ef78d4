//! Indexer type definitions.

use std::path::PathBuf;

use thiserror::Error;

use crate::catalog::{
    CatalogError,
    TranslationTable,
};
use crate::config::MatcherError;

#[derive(Error, Debug)]
pub enum IndexerError {
    /// `translationFiles` patterns could not be compiled
    #[error(transparent)]
    Matcher(#[from] MatcherError),
    /// The workspace root is not a directory
    #[error("Workspace root is not a directory: {0}")]
    InvalidRoot(PathBuf),
}

/// A translation file found in the workspace and parsed.
#[derive(Debug)]
pub struct LoadedTable {
    pub path: PathBuf,
    pub table: TranslationTable,
}

/// A translation file that could not be loaded.
#[derive(Debug)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub error: CatalogError,
}

/// Everything found under a workspace, sorted by path.
#[derive(Debug, Default)]
pub struct WorkspaceCatalog {
    pub tables: Vec<LoadedTable>,
    pub failures: Vec<LoadFailure>,
}

impl WorkspaceCatalog {
    #[must_use]
    pub fn table(&self, path: &std::path::Path) -> Option<&TranslationTable> {
        self.tables.iter().find(|loaded| loaded.path == path).map(|loaded| &loaded.table)
    }
}
