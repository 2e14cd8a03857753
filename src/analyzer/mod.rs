//! 画像解析サービス
//!
//! BEFORE/AFTER の2枚を送り、型なしの判定JSONを受け取る。
//! レスポンスの検証は milq_common::validate が行う。

mod gemini;

pub use gemini::{GeminiAnalyzer, GEMINI_API_BASE};

use crate::capture::ImagePayload;
use serde_json::Value;
use std::future::Future;
use thiserror::Error;

/// 解析サービス側の失敗（通信・HTTP・空/不正なレスポンス）
#[derive(Error, Debug)]
pub enum CollaboratorError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("empty response")]
    EmptyResponse,

    #[error("unreadable response: {0}")]
    InvalidBody(String),
}

impl From<reqwest::Error> for CollaboratorError {
    fn from(e: reqwest::Error) -> Self {
        CollaboratorError::Transport(e.to_string())
    }
}

/// 画像解析サービス
///
/// 画像は MIME タイプ付きの base64（data URL ではない）で渡す
pub trait VisionAnalyzer {
    fn analyze(
        &self,
        before: ImagePayload<'_>,
        after: ImagePayload<'_>,
    ) -> impl Future<Output = Result<Value, CollaboratorError>> + Send;
}
