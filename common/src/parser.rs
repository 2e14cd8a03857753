//! APIレスポンスパーサー
//!
//! 解析サービスのレスポンス本文からJSONオブジェクトを取り出す。
//! スキーマ検証は validate モジュールで行う。

use crate::error::{Error, Result};
use serde_json::Value;

/// APIレスポンスからJSON部分を抽出
///
/// 抽出優先順位:
/// 1. ```json ... ``` ブロック
/// 2. 生の {...} オブジェクト
/// 3. エラー
///
/// # Examples
/// ```
/// use milq_common::extract_json;
///
/// let response = "Result: {\"status\": \"SAFE\"}";
/// let json = extract_json(response).unwrap();
/// assert_eq!(json, "{\"status\": \"SAFE\"}");
/// ```
pub fn extract_json(response: &str) -> Result<&str> {
    if let Some(start_marker) = response.find("```json") {
        let start = start_marker + 7; // "```json" の長さ
        if let Some(end_offset) = response[start..].find("```") {
            let end = start + end_offset;
            return Ok(response[start..end].trim());
        }
    }

    if let Some(start) = response.find('{') {
        if let Some(end) = response.rfind('}') {
            if end >= start {
                return Ok(&response[start..=end]);
            }
        }
    }

    Err(Error::Parse("JSON object not found in response".into()))
}

/// 解析レスポンスを型なしJSONとしてパース
///
/// 空のレスポンスは `{}` として扱わずエラーにする
pub fn parse_report(response: &str) -> Result<Value> {
    if response.trim().is_empty() {
        return Err(Error::Parse("empty response".into()));
    }
    let json_str = extract_json(response)?;
    let value: Value = serde_json::from_str(json_str.trim())?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_with_block() {
        let response = r#"Here is the analysis:
```json
{"overall_score": 4, "status": "SAFE", "results": []}
```
Some additional text."#;

        let json = extract_json(response).unwrap();
        assert!(json.starts_with('{'));
        assert!(json.contains("overall_score"));
    }

    #[test]
    fn test_extract_json_raw() {
        let response = r#"{"status": "UNSAFE"}"#;
        assert_eq!(extract_json(response).unwrap(), response);
    }

    #[test]
    fn test_extract_json_with_surrounding_text() {
        let response = r#"Result: {"status": "SAFE", "results": [{"a": 1}]} done."#;
        let json = extract_json(response).unwrap();
        assert_eq!(json, r#"{"status": "SAFE", "results": [{"a": 1}]}"#);
    }

    #[test]
    fn test_extract_json_error() {
        let result = extract_json("No JSON here, just plain text.");
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn test_parse_report() {
        let value = parse_report(r#"{"overall_score": 2, "status": "UNSAFE", "results": []}"#).unwrap();
        assert_eq!(value["overall_score"], 2);
        assert_eq!(value["status"], "UNSAFE");
    }

    #[test]
    fn test_parse_report_empty() {
        assert!(matches!(parse_report("   "), Err(Error::Parse(_))));
    }

    #[test]
    fn test_parse_report_invalid_json() {
        assert!(matches!(parse_report("{ not json }"), Err(Error::Json(_))));
    }
}
