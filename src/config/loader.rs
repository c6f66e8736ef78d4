//! 設定ファイルの読み込み関数

use std::path::Path;

use super::{
    CatalogSettings,
    ConfigError,
};

/// 設定ファイル名
pub const CONFIG_FILE_NAME: &str = ".ts-catalog.json";

/// ワークスペースから設定を読み込む
///
/// Returns `Ok(None)` when the workspace has no `.ts-catalog.json`.
pub(super) fn load_from_workspace(
    workspace_root: &Path,
) -> Result<Option<CatalogSettings>, ConfigError> {
    let config_path = workspace_root.join(CONFIG_FILE_NAME);
    if !config_path.is_file() {
        tracing::debug!("No {CONFIG_FILE_NAME} in {}", workspace_root.display());
        return Ok(None);
    }
    load_from_file(&config_path).map(Some)
}

/// 指定されたファイルから設定を読み込む (未検証)
pub(super) fn load_from_file(config_path: &Path) -> Result<CatalogSettings, ConfigError> {
    tracing::debug!("Loading configuration from {}", config_path.display());
    let content = std::fs::read_to_string(config_path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::fs;

    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;

    /// `load_from_workspace`: 設定ファイルが存在する場合
    #[rstest]
    fn test_load_from_workspace_with_valid_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_content = r#"{"checkRules": {"banwords": ["ok", "cool"]}}"#;
        fs::write(temp_dir.path().join(CONFIG_FILE_NAME), config_content).unwrap();

        let settings = load_from_workspace(temp_dir.path()).unwrap().unwrap();

        assert_eq!(settings.check_rules.banwords, vec!["ok".to_string(), "cool".to_string()]);
        assert_eq!(settings.translation_files.include_patterns, vec!["**/*.ts".to_string()]);
    }

    /// `load_from_workspace`: 設定ファイルが存在しない場合
    #[rstest]
    fn test_load_from_workspace_no_config_file() {
        let temp_dir = TempDir::new().unwrap();

        let result = load_from_workspace(temp_dir.path());

        assert!(result.unwrap().is_none());
    }

    /// `load_from_workspace`: JSON パースエラー
    #[rstest]
    fn test_load_from_workspace_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(CONFIG_FILE_NAME), "invalid json").unwrap();

        let result = load_from_workspace(temp_dir.path());

        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    /// `load_from_file`: 任意の名前のファイル
    #[rstest]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("qa.json");
        fs::write(&path, r#"{"checkRules": {"validCharacters": "abc"}}"#).unwrap();

        let settings = load_from_file(&path).unwrap();

        assert_eq!(settings.check_rules.valid_characters, "abc");
    }

    /// `load_from_file`: ファイルが存在しない
    #[rstest]
    fn test_load_from_file_missing() {
        let temp_dir = TempDir::new().unwrap();

        let result = load_from_file(&temp_dir.path().join("qa.json"));

        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }
}
