//! ワークスペース内の翻訳ファイルを探索して読み込む
use std::path::{
    Path,
    PathBuf,
};
use std::sync::Arc;

use ignore::WalkBuilder;
use tokio::sync::Semaphore;

use crate::catalog::{
    self,
    CatalogError,
    TranslationTable,
};
use crate::config::{
    CatalogSettings,
    FileMatcher,
    TranslationFilesConfig,
};
use crate::indexer::types::{
    IndexerError,
    LoadFailure,
    LoadedTable,
    WorkspaceCatalog,
};

/// Finds and parses every translation file of a workspace.
#[derive(Clone, Debug)]
pub struct WorkspaceIndexer {
    /// Limits how many files are read and parsed at once
    permits: Arc<Semaphore>,
}

impl Default for WorkspaceIndexer {
    fn default() -> Self {
        Self::new(None)
    }
}

impl WorkspaceIndexer {
    /// 並列度を指定してインデクサーを作成
    ///
    /// `None` は CPU コア数の 80% (最低 1)
    #[must_use]
    pub fn new(num_threads: Option<usize>) -> Self {
        let workers = num_threads.unwrap_or_else(default_workers).max(1);
        tracing::debug!(workers, "Creating workspace indexer");
        Self { permits: Arc::new(Semaphore::new(workers)) }
    }

    /// Creates an indexer sized by `indexing.numThreads`.
    #[must_use]
    pub fn from_settings(settings: &CatalogSettings) -> Self {
        Self::new(settings.indexing.num_threads)
    }

    /// ワークスペースの翻訳ファイルをすべて読み込む
    ///
    /// A file that cannot be read or parsed is logged and reported in
    /// [`WorkspaceCatalog::failures`]; the other files are still loaded.
    ///
    /// # Errors
    /// - ワークスペースのルートがディレクトリでない
    /// - `translationFiles` のパターンが不正
    pub async fn load_all(
        &self,
        workspace_path: &Path,
        settings: &CatalogSettings,
    ) -> Result<WorkspaceCatalog, IndexerError> {
        tracing::debug!(workspace_path = %workspace_path.display(), "Indexing workspace");
        let files = Self::find_translation_files(workspace_path, &settings.translation_files)?;

        let futures: Vec<_> = files.into_iter().map(|file| self.load_file(file)).collect();
        let mut catalog = WorkspaceCatalog::default();
        for (path, result) in futures::future::join_all(futures).await {
            match result {
                Ok(table) => catalog.tables.push(LoadedTable { path, table }),
                Err(error) => {
                    tracing::warn!("Failed to load {}: {}", path.display(), error);
                    catalog.failures.push(LoadFailure { path, error });
                }
            }
        }

        tracing::info!(
            tables = catalog.tables.len(),
            failures = catalog.failures.len(),
            "Workspace indexed"
        );
        Ok(catalog)
    }

    /// 単一ファイルを読み込んでパース
    async fn load_file(&self, path: PathBuf) -> (PathBuf, Result<TranslationTable, CatalogError>) {
        let _permit = match self.permits.acquire().await {
            Ok(permit) => Some(permit),
            Err(e) => {
                tracing::debug!("Semaphore closed: {e}");
                None
            }
        };

        let result = match tokio::fs::read_to_string(&path).await {
            Ok(content) => catalog::parse(&content),
            Err(e) => Err(CatalogError::Io(e)),
        };
        (path, result)
    }

    /// 翻訳ファイルを検索
    ///
    /// Results are sorted so that output does not depend on directory order.
    ///
    /// # Errors
    /// - ワークスペースのルートがディレクトリでない
    /// - パターンが不正
    pub fn find_translation_files(
        workspace_path: &Path,
        config: &TranslationFilesConfig,
    ) -> Result<Vec<PathBuf>, IndexerError> {
        if !workspace_path.is_dir() {
            return Err(IndexerError::InvalidRoot(workspace_path.to_path_buf()));
        }
        let matcher = FileMatcher::new(workspace_path.to_path_buf(), config)?;

        let mut found_files = Vec::new();
        // ignore クレートでファイルを走査
        let walker = WalkBuilder::new(workspace_path)
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .follow_links(false)
            .filter_entry({
                let matcher = matcher.clone();
                move |entry| {
                    if !entry.file_type().is_some_and(|ft| ft.is_dir()) {
                        return true;
                    }
                    let Ok(relative) = entry.path().strip_prefix(matcher.workspace_root()) else {
                        return true;
                    };
                    relative.as_os_str().is_empty() || !matcher.is_excluded_dir_relative(relative)
                }
            })
            .build();

        for result in walker {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(?err, "Failed to read directory entry");
                    continue;
                }
            };

            // ファイルのみを対象
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            if matcher.is_translation_file(entry.path()) {
                found_files.push(entry.path().to_path_buf());
            }
        }

        found_files.sort();
        tracing::debug!("Found {} translation files", found_files.len());
        Ok(found_files)
    }
}

/// CPU コア数の 80% (最低 1)
fn default_workers() -> usize {
    (num_cpus::get() * 4 / 5).max(1)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::fs;

    use googletest::prelude::*;
    use tempfile::TempDir;

    use super::*;

    const TABLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE TS>
<TS version="2.1" language="fr">
<context>
    <name>Main</name>
    <message>
        <source>Open</source>
        <translation>Ouvrir</translation>
    </message>
</context>
</TS>
"#;

    fn workspace() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("i18n")).unwrap();
        fs::create_dir_all(dir.path().join("target/debug")).unwrap();
        fs::write(dir.path().join("i18n/fr.ts"), TABLE).unwrap();
        fs::write(dir.path().join("i18n/de.ts"), TABLE.replace("fr", "de")).unwrap();
        fs::write(dir.path().join("i18n/notes.txt"), "not a table").unwrap();
        fs::write(dir.path().join("target/debug/copy.ts"), TABLE).unwrap();
        dir
    }

    #[googletest::test]
    fn test_find_translation_files() {
        let dir = workspace();

        let files = WorkspaceIndexer::find_translation_files(
            dir.path(),
            &TranslationFilesConfig::default(),
        )
        .unwrap();

        assert_eq!(files, vec![dir.path().join("i18n/de.ts"), dir.path().join("i18n/fr.ts")]);
    }

    #[googletest::test]
    fn test_find_translation_files_invalid_root() {
        let dir = workspace();

        let result = WorkspaceIndexer::find_translation_files(
            &dir.path().join("i18n/fr.ts"),
            &TranslationFilesConfig::default(),
        );

        expect_that!(result, err(displays_as(starts_with("Workspace root is not a directory"))));
    }

    #[googletest::test]
    fn test_default_workers_is_positive() {
        expect_that!(default_workers(), ge(1));
    }

    #[tokio::test]
    async fn test_load_all_keeps_going_after_failures() {
        let dir = workspace();
        fs::write(dir.path().join("broken.ts"), "<TS><context>").unwrap();
        let indexer = WorkspaceIndexer::new(Some(2));

        let catalog = indexer.load_all(dir.path(), &CatalogSettings::default()).await.unwrap();

        assert_eq!(catalog.tables.len(), 2);
        assert_eq!(catalog.failures.len(), 1);
        assert_eq!(catalog.failures[0].path, dir.path().join("broken.ts"));
        let fr = catalog.table(&dir.path().join("i18n/fr.ts")).unwrap();
        assert_eq!(fr.language(), Some("fr"));
    }
}
