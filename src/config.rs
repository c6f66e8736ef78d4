//! `.ts-catalog.json` workspace settings
/// Config file loader
mod loader;
/// Configuration manager
mod manager;
/// Translation file pattern matcher
mod matcher;
/// Configuration types and settings
mod types;

pub use loader::CONFIG_FILE_NAME;
pub use manager::ConfigManager;
pub use matcher::{
    FileMatcher,
    MatcherError,
};
pub use types::{
    CatalogSettings,
    CheckRules,
    ConfigError,
    DEFAULT_VALID_CHARACTERS,
    DiagnosticsConfig,
    IgnoredSubstrings,
    IndexingConfig,
    TranslationFilesConfig,
    ValidationError,
};
