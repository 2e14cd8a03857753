//! 永続化ストア
//!
//! 履歴（TestResult の配列, 新しい順）とテーマ設定をキー/値ストアに保存する。
//! 読み込みは失敗しない: 欠損・破損データは警告ログを出して空/デフォルト扱い。

mod backend;

pub use backend::{FileStore, MemoryStore};

use crate::error::PersistenceError;
use milq_common::{AppState, TestResult, Theme};
use tracing::warn;

pub const HISTORY_KEY: &str = "milq_history.json";
pub const THEME_KEY: &str = "milq_theme";

/// 文字列キー/値の永続ストア
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError>;
    fn remove(&self, key: &str) -> Result<(), PersistenceError>;
}

/// 履歴とテーマのストア
#[derive(Debug)]
pub struct StateStore<S> {
    backend: S,
}

impl<S: KeyValueStore> StateStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// 起動時の状態を復元
    pub fn load_state(&self) -> AppState {
        AppState {
            history: self.load_history(),
            theme: self.load_theme(),
        }
    }

    pub fn load_history(&self) -> Vec<TestResult> {
        let raw = match self.backend.get(HISTORY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("failed to read history, starting empty: {}", e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<TestResult>>(&raw) {
            Ok(history) => history,
            Err(e) => {
                warn!("stored history is corrupt, starting empty: {}", e);
                Vec::new()
            }
        }
    }

    pub fn save_history(&self, history: &[TestResult]) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(history).map_err(|source| PersistenceError::Serialize {
            key: HISTORY_KEY.to_string(),
            source,
        })?;
        self.backend.set(HISTORY_KEY, &json)
    }

    pub fn clear_history(&self) -> Result<(), PersistenceError> {
        self.backend.remove(HISTORY_KEY)
    }

    pub fn load_theme(&self) -> Theme {
        match self.backend.get(THEME_KEY) {
            Ok(Some(raw)) => raw.parse::<Theme>().unwrap_or_else(|e| {
                warn!("ignoring stored theme: {}", e);
                Theme::default()
            }),
            Ok(None) => Theme::default(),
            Err(e) => {
                warn!("failed to read theme: {}", e);
                Theme::default()
            }
        }
    }

    pub fn save_theme(&self, theme: Theme) -> Result<(), PersistenceError> {
        self.backend.set(THEME_KEY, theme.as_str())
    }
}
