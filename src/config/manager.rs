//! 設定管理を行うモジュール

use std::path::{
    Path,
    PathBuf,
};

use super::{
    CatalogSettings,
    ConfigError,
    loader,
};

/// 設定管理を行う
#[derive(Default, Debug, Clone)]
pub struct ConfigManager {
    /// 現在の設定
    current_settings: CatalogSettings,

    /// ワークスペースのルートパス
    workspace_root: Option<PathBuf>,
}

impl ConfigManager {
    /// 新しい設定マネージャーを作成
    #[must_use]
    pub fn new() -> Self {
        Self { current_settings: CatalogSettings::default(), workspace_root: None }
    }

    /// 設定を読み込む
    ///
    /// # Errors
    /// - ファイル読み込みエラー
    /// - JSON パースエラー
    /// - バリデーションエラー
    pub fn load_settings(&mut self, workspace_root: Option<PathBuf>) -> Result<(), ConfigError> {
        tracing::debug!("Loading settings for workspace: {:?}", workspace_root);

        let settings = if let Some(root) = &workspace_root {
            loader::load_from_workspace(root)?.map_or_else(CatalogSettings::default, |ws| {
                tracing::debug!("Loaded workspace settings: {:?}", ws);
                ws
            })
        } else {
            CatalogSettings::default()
        };

        self.apply(settings)?;
        self.workspace_root = workspace_root;
        Ok(())
    }

    /// 明示的に指定された設定ファイルを読み込む
    ///
    /// The workspace root is left as is; patterns still match relative to it.
    pub fn load_settings_from_file(&mut self, config_path: &Path) -> Result<(), ConfigError> {
        let settings = loader::load_from_file(config_path)?;
        self.apply(settings)
    }

    /// Validates `settings` and makes them current.
    fn apply(&mut self, settings: CatalogSettings) -> Result<(), ConfigError> {
        settings.validate().map_err(ConfigError::ValidationErrors)?;
        self.current_settings = settings;
        tracing::debug!("Settings loaded successfully: {:?}", self.current_settings);
        Ok(())
    }

    /// 設定を差し替える（バリデーション済みのもののみ）
    pub fn update_settings(&mut self, new_settings: CatalogSettings) -> Result<(), ConfigError> {
        self.apply(new_settings)
    }

    /// 現在の設定を取得
    #[must_use]
    pub const fn get_settings(&self) -> &CatalogSettings {
        &self.current_settings
    }

    /// ワークスペースルートを取得
    #[must_use]
    pub const fn workspace_root(&self) -> Option<&PathBuf> {
        self.workspace_root.as_ref()
    }
}
