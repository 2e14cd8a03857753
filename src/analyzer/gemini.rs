//! Gemini API 連携
//!
//! システム指示 + テキスト + 画像2枚（BEFORE, AFTER の順）を1リクエストで送る。
//! generationConfig で JSON 出力とスキーマを指定する。

use super::{CollaboratorError, VisionAnalyzer};
use crate::capture::ImagePayload;
use milq_common::prompts::{response_schema, SYSTEM_INSTRUCTION, USER_PROMPT};
use milq_common::parse_report;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini APIリクエスト
#[derive(Debug, Serialize)]
pub(crate) struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "systemInstruction")]
    system_instruction: Content,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
    #[serde(rename = "responseSchema")]
    response_schema: Value,
}

/// Gemini APIレスポンス
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GeminiResponse {
    /// 先頭候補のテキストパートを連結
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

pub(crate) fn build_request(before: ImagePayload<'_>, after: ImagePayload<'_>) -> GeminiRequest {
    let image = |payload: ImagePayload<'_>| Part::InlineData {
        inline_data: InlineData {
            mime_type: payload.mime_type.to_string(),
            data: payload.data.to_string(),
        },
    };

    GeminiRequest {
        contents: vec![Content {
            parts: vec![
                Part::Text {
                    text: USER_PROMPT.to_string(),
                },
                image(before),
                image(after),
            ],
        }],
        system_instruction: Content {
            parts: vec![Part::Text {
                text: SYSTEM_INSTRUCTION.to_string(),
            }],
        },
        generation_config: GenerationConfig {
            response_mime_type: "application/json".to_string(),
            response_schema: response_schema(),
        },
    }
}

#[derive(Debug, Clone)]
pub struct GeminiAnalyzer {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiAnalyzer {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: GEMINI_API_BASE.to_string(),
        }
    }

    /// エンドポイントの差し替え（プロキシ等）
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

impl VisionAnalyzer for GeminiAnalyzer {
    async fn analyze(
        &self,
        before: ImagePayload<'_>,
        after: ImagePayload<'_>,
    ) -> Result<Value, CollaboratorError> {
        let request = build_request(before, after);
        info!(model = %self.model, "sending test card images to Gemini");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CollaboratorError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let payload: GeminiResponse = response
            .json()
            .await
            .map_err(|e| CollaboratorError::InvalidBody(e.to_string()))?;
        let text = payload.text().ok_or(CollaboratorError::EmptyResponse)?;
        debug!(chars = text.len(), "Gemini response received");

        parse_report(&text).map_err(|e| CollaboratorError::InvalidBody(e.to_string()))
    }
}
