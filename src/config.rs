//! 設定ファイル（~/.config/milq/config.json）

use crate::error::{MilqError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// APIキーを上書きする環境変数
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

pub const DEFAULT_MODEL: &str = "gemini-3-pro-preview";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: String,
    /// 送信前に縮小する長辺の最大ピクセル
    pub max_image_size: u32,
    pub timeout_seconds: u64,
    /// 履歴・テーマの保存先（未指定なら OS のデータディレクトリ）
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.into(),
            max_image_size: 1568,
            timeout_seconds: 60,
            data_dir: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// 指定パスから読み込み（存在しなければデフォルト）
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| MilqError::Config("home directory not found".into()))?;
        Ok(home.join(".config").join("milq").join("config.json"))
    }

    /// 履歴・テーマの保存ディレクトリ
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        let base = dirs::data_dir()
            .ok_or_else(|| MilqError::Config("data directory not found".into()))?;
        Ok(base.join("milq"))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.max(1))
    }

    pub fn get_api_key(&self) -> Result<String> {
        // 環境変数を優先
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                return Ok(key);
            }
        }

        self.api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(MilqError::MissingApiKey)
    }

    pub fn set_api_key(&mut self, key: String) -> Result<()> {
        self.api_key = Some(key);
        self.save()
    }
}
