//! Workspace discovery and parallel loading of translation files.
pub mod types;
pub mod workspace;

pub use types::{
    IndexerError,
    LoadFailure,
    LoadedTable,
    WorkspaceCatalog,
};
pub use workspace::WorkspaceIndexer;
