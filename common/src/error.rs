//! エラー型定義

use thiserror::Error;

/// 解析レスポンスのスキーマ違反
///
/// `field` は `results[2].confidence` のようなパス表記
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid field `{field}`: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn missing(field: impl Into<String>) -> Self {
        Self::new(field, "missing required field")
    }
}

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let error = ValidationError::missing("results[0].confidence");
        assert_eq!(
            format!("{}", error),
            "invalid field `results[0].confidence`: missing required field"
        );
    }

    #[test]
    fn test_error_display_json() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let error = Error::Json(json_error);
        assert!(format!("{}", error).contains("JSON error"));
    }

    #[test]
    fn test_error_display_parse() {
        let error = Error::Parse("JSON not found".to_string());
        assert_eq!(format!("{}", error), "Parse error: JSON not found");
    }

    #[test]
    fn test_error_from_validation() {
        let error: Error = ValidationError::new("status", "bad").into();
        assert!(matches!(error, Error::Validation(ref v) if v.field == "status"));
    }

    #[test]
    fn test_error_from_json() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: Error = json_error.into();
        assert!(matches!(error, Error::Json(_)));
    }
}
