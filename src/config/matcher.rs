//! File pattern matcher for translation files.

use std::path::{
    Path,
    PathBuf,
};

use globset::{
    Glob,
    GlobSet,
    GlobSetBuilder,
};

use super::TranslationFilesConfig;

#[derive(Debug, thiserror::Error)]
pub enum MatcherError {
    #[error("Invalid include pattern '{pattern}': {source}")]
    InvalidIncludePattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Invalid exclude pattern '{pattern}': {source}")]
    InvalidExcludePattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Failed to build glob set: {0}")]
    GlobSetBuild(#[from] globset::Error),
}

/// Matches workspace paths against `translationFiles` patterns.
#[derive(Debug, Clone)]
pub struct FileMatcher {
    /// Patterns are matched against paths relative to this directory.
    workspace_root: PathBuf,
    /// `includePatterns`
    include_set: GlobSet,
    /// `excludePatterns`
    exclude_set: GlobSet,
    /// Directories named by `excludePatterns` of the form `dir/**`.
    excluded_dirs: GlobSet,
}

impl FileMatcher {
    /// Creates a new matcher from settings.
    pub fn new(
        workspace_root: PathBuf,
        config: &TranslationFilesConfig,
    ) -> Result<Self, MatcherError> {
        let include_set = Self::build_glob_set(&config.include_patterns, |pattern, source| {
            MatcherError::InvalidIncludePattern { pattern, source }
        })?;

        let exclude_set = Self::build_glob_set(&config.exclude_patterns, |pattern, source| {
            MatcherError::InvalidExcludePattern { pattern, source }
        })?;

        let dir_patterns: Vec<String> = config
            .exclude_patterns
            .iter()
            .filter_map(|pattern| pattern.strip_suffix("/**"))
            .filter(|dir| !dir.is_empty())
            .map(String::from)
            .collect();
        let excluded_dirs = Self::build_glob_set(&dir_patterns, |pattern, source| {
            MatcherError::InvalidExcludePattern { pattern: format!("{pattern}/**"), source }
        })?;

        Ok(Self { workspace_root, include_set, exclude_set, excluded_dirs })
    }

    /// Compiles `patterns`, naming the first invalid one.
    fn build_glob_set<F>(patterns: &[String], make_error: F) -> Result<GlobSet, MatcherError>
    where
        F: Fn(String, globset::Error) -> MatcherError,
    {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|e| make_error(pattern.clone(), e))?;
            builder.add(glob);
        }
        Ok(builder.build()?)
    }

    #[must_use]
    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Returns true if the path matches `includePatterns` but not `excludePatterns`.
    ///
    /// The path must be absolute and under the workspace root.
    #[must_use]
    pub fn is_translation_file(&self, absolute_path: &Path) -> bool {
        let Some(relative_path) = absolute_path.strip_prefix(&self.workspace_root).ok() else {
            return false;
        };

        self.is_translation_file_relative(relative_path)
    }

    /// Same as [`Self::is_translation_file`] for a path relative to the workspace root.
    #[must_use]
    pub fn is_translation_file_relative(&self, relative_path: &Path) -> bool {
        self.include_set.is_match(relative_path) && !self.exclude_set.is_match(relative_path)
    }

    /// True when a directory can be skipped: an exclude pattern `dir/**` names it.
    #[must_use]
    pub fn is_excluded_dir_relative(&self, relative_path: &Path) -> bool {
        self.excluded_dirs.is_match(relative_path)
    }
}
