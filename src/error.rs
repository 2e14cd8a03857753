//! エラー型
//!
//! - MilqError: CLI/アプリ全体のエラー
//! - AnalysisError: 解析フロー（Orchestrator）の失敗分類
//! - PersistenceError: 永続化ストアへの書き込み失敗
//! - RenderError: レポート生成の失敗

use milq_common::NavigationError;
use thiserror::Error;

/// 検証失敗・解析失敗時にユーザーへ見せる汎用メッセージ
pub const ANALYSIS_FAILED_MESSAGE: &str = "Analysis failed. Please try again with clearer photos.";

#[derive(Error, Debug)]
pub enum MilqError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Gemini API key is not set. Run `milq config --set-api-key YOUR_KEY` or set GEMINI_API_KEY")]
    MissingApiKey,

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Image load error: {0}")]
    ImageLoad(String),

    #[error("No test found with id {0}")]
    ResultNotFound(String),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Navigation(#[from] NavigationError),

    #[error("JSON error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MilqError>;

/// 解析フローの失敗
///
/// どの失敗でも履歴は変更されない
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("Both before and after images are required")]
    InvalidInput,

    #[error("An analysis is already in progress")]
    AlreadyInProgress,

    #[error("Analysis service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Analysis timed out after {0}s")]
    Timeout(u64),

    #[error("Malformed analysis response: {0}")]
    MalformedResponse(String),
}

impl AnalysisError {
    /// Home画面のエラーバナー用メッセージ
    pub fn user_message(&self) -> &'static str {
        match self {
            AnalysisError::InvalidInput => "Please provide both the before and after photos.",
            AnalysisError::AlreadyInProgress => "An analysis is already running.",
            AnalysisError::ServiceUnavailable(_) => {
                "The analysis service is unavailable. Check your connection and try again."
            }
            AnalysisError::Timeout(_) => "The analysis took too long. Please try again.",
            AnalysisError::MalformedResponse(_) => ANALYSIS_FAILED_MESSAGE,
        }
    }
}

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Storage I/O failed for `{key}`: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Storage quota exceeded for `{key}` ({size} bytes, limit {limit})")]
    QuotaExceeded {
        key: String,
        size: usize,
        limit: usize,
    },

    #[error("Failed to serialize `{key}`: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("A report is already being generated")]
    Busy,

    #[error("PDF generation failed: {0}")]
    Pdf(String),

    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),
}
