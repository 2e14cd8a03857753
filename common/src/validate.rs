//! 解析レスポンスの検証
//!
//! 外部解析サービスから返された型なしJSONを厳密にチェックし、
//! `TestResult` に変換する。ここを通過した値だけがシステム内部に入る。

use crate::error::ValidationError;
use crate::types::{AnalysisFinding, OverallStatus, TestResult};
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

/// 検査IDの接頭辞
pub const ID_PREFIX: &str = "MIL";

/// 検査に使用した画像（Data URL）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedImages {
    pub before: Option<String>,
    pub after: Option<String>,
}

/// タグの正規化: 前後の空白を除去し、空なら None
pub fn normalize_tag(tag: Option<&str>) -> Option<String> {
    tag.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// 現在時刻（ISO-8601, ミリ秒, UTC "Z"）
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// 検査IDジェネレータ
///
/// シード + 単調カウンタ + 時刻のSHA-256から `MIL-XXXXXXXXXXXX` を生成する。
/// 同一プロセス内でカウンタが重複しないため、4桁乱数のような衝突は起きない。
#[derive(Debug)]
pub struct IdGenerator {
    seed: u64,
    counter: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default() as u64;
        let seed = nanos ^ (u64::from(std::process::id()) << 32);
        Self::with_seed(seed)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            counter: AtomicU64::new(0),
        }
    }

    pub fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();

        let mut hasher = Sha256::new();
        hasher.update(self.seed.to_le_bytes());
        hasher.update(n.to_le_bytes());
        hasher.update(nanos.to_le_bytes());
        let digest = hasher.finalize();

        format!("{}-{}", ID_PREFIX, hex::encode_upper(&digest[..6]))
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// 解析レスポンスを検証して TestResult を生成
///
/// 必須: `overall_score`(1-5), `status`, `results[]`
/// 各 finding の必須: `adulterant`, `status`, `confidence`(0-100),
/// `colorChange`, `severity`, `recommendation`
///
/// 副作用なし（IDカウンタの進行を除く）
pub fn validate(
    raw: &Value,
    images: CapturedImages,
    tag: Option<&str>,
    ids: &IdGenerator,
) -> Result<TestResult, ValidationError> {
    let report = raw
        .as_object()
        .ok_or_else(|| ValidationError::new("report", "expected a JSON object"))?;

    let overall_score = require_int(report, "overall_score", "overall_score", 1..=5)? as u8;
    let status: OverallStatus = require_enum(report, "status", "status")?;
    let entries = require(report, "results", "results")?
        .as_array()
        .ok_or_else(|| ValidationError::new("results", "expected an array"))?;

    let results = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| validate_finding(entry, index))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TestResult {
        id: ids.next_id(),
        tag: normalize_tag(tag),
        timestamp: timestamp_now(),
        overall_score,
        status,
        results,
        before_image: images.before,
        after_image: images.after,
    })
}

fn validate_finding(entry: &Value, index: usize) -> Result<AnalysisFinding, ValidationError> {
    let path = |key: &str| format!("results[{}].{}", index, key);

    let object = entry
        .as_object()
        .ok_or_else(|| ValidationError::new(format!("results[{}]", index), "expected an object"))?;

    Ok(AnalysisFinding {
        adulterant: require_str(object, "adulterant", &path("adulterant"))?,
        status: require_enum(object, "status", &path("status"))?,
        confidence: require_int(object, "confidence", &path("confidence"), 0..=100)? as u8,
        color_change: require_str(object, "colorChange", &path("colorChange"))?,
        severity: require_enum(object, "severity", &path("severity"))?,
        recommendation: require_str(object, "recommendation", &path("recommendation"))?,
        action: optional_str(object, "action", &path("action"))?,
        health_risk: optional_str(object, "healthRisk", &path("healthRisk"))?,
    })
}

// nullは欠落として扱う
fn require<'a>(
    object: &'a Map<String, Value>,
    key: &str,
    field: &str,
) -> Result<&'a Value, ValidationError> {
    match object.get(key) {
        Some(Value::Null) | None => Err(ValidationError::missing(field)),
        Some(value) => Ok(value),
    }
}

fn require_str(
    object: &Map<String, Value>,
    key: &str,
    field: &str,
) -> Result<String, ValidationError> {
    require(object, key, field)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ValidationError::new(field, "expected a string"))
}

fn optional_str(
    object: &Map<String, Value>,
    key: &str,
    field: &str,
) -> Result<Option<String>, ValidationError> {
    match object.get(key) {
        Some(Value::Null) | None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ValidationError::new(field, "expected a string")),
    }
}

fn require_int(
    object: &Map<String, Value>,
    key: &str,
    field: &str,
    range: RangeInclusive<i64>,
) -> Result<i64, ValidationError> {
    let value = require(object, key, field)?;
    // 85.0 のような整数値の浮動小数も許容
    let number = value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
        .ok_or_else(|| ValidationError::new(field, "expected an integer"))?;

    if !range.contains(&number) {
        return Err(ValidationError::new(
            field,
            format!("{} is outside {}..={}", number, range.start(), range.end()),
        ));
    }
    Ok(number)
}

fn require_enum<T>(
    object: &Map<String, Value>,
    key: &str,
    field: &str,
) -> Result<T, ValidationError>
where
    T: FromStr<Err = String>,
{
    let raw = require_str(object, key, field)?;
    raw.parse::<T>().map_err(|reason| ValidationError::new(field, reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AdulterantStatus, Severity};
    use serde_json::json;
    use std::collections::HashSet;

    fn well_formed() -> Value {
        json!({
            "overall_score": 4,
            "status": "SAFE",
            "results": [
                {
                    "adulterant": "Water",
                    "status": "PASS",
                    "confidence": 92,
                    "action": "Accept",
                    "colorChange": "Opaque white trail",
                    "severity": "Low",
                    "recommendation": "Safe to consume"
                },
                {
                    "adulterant": "Starch",
                    "status": "BORDERLINE",
                    "confidence": 55.0,
                    "colorChange": "Faint purple spots",
                    "severity": "Medium",
                    "recommendation": "Retest with a fresh card",
                    "healthRisk": "Digestive discomfort"
                }
            ]
        })
    }

    fn images() -> CapturedImages {
        CapturedImages {
            before: Some("data:image/jpeg;base64,AAAA".to_string()),
            after: Some("data:image/jpeg;base64,BBBB".to_string()),
        }
    }

    #[test]
    fn test_validate_well_formed() {
        let ids = IdGenerator::with_seed(7);
        let result = validate(&well_formed(), images(), Some("  Batch 42 "), &ids).unwrap();

        assert_eq!(result.overall_score, 4);
        assert_eq!(result.status, OverallStatus::Safe);
        assert_eq!(result.tag.as_deref(), Some("Batch 42"));
        assert_eq!(result.results.len(), 2);
        assert_eq!(result.results[0].action.as_deref(), Some("Accept"));
        assert_eq!(result.results[1].status, AdulterantStatus::Borderline);
        assert_eq!(result.results[1].confidence, 55);
        assert_eq!(result.results[1].severity, Severity::Medium);
        assert_eq!(result.results[1].health_risk.as_deref(), Some("Digestive discomfort"));
        assert!(result.id.starts_with("MIL-"));
        assert!(result.timestamp.ends_with('Z'));
        assert_eq!(result.before_image.as_deref(), Some("data:image/jpeg;base64,AAAA"));
    }

    #[test]
    fn test_validate_missing_top_level_fields() {
        let ids = IdGenerator::with_seed(1);
        for key in ["overall_score", "status", "results"] {
            let mut raw = well_formed();
            raw.as_object_mut().unwrap().remove(key);
            let err = validate(&raw, images(), None, &ids).unwrap_err();
            assert_eq!(err.field, key);
        }
    }

    #[test]
    fn test_validate_missing_finding_fields() {
        let ids = IdGenerator::with_seed(1);
        for key in ["adulterant", "status", "confidence", "colorChange", "severity", "recommendation"] {
            let mut raw = well_formed();
            raw["results"][1].as_object_mut().unwrap().remove(key);
            let err = validate(&raw, images(), None, &ids).unwrap_err();
            assert_eq!(err.field, format!("results[1].{}", key));
        }
    }

    #[test]
    fn test_validate_null_counts_as_missing() {
        let mut raw = well_formed();
        raw["results"][0]["confidence"] = Value::Null;
        let err = validate(&raw, images(), None, &IdGenerator::with_seed(1)).unwrap_err();
        assert_eq!(err, ValidationError::missing("results[0].confidence"));
    }

    #[test]
    fn test_validate_out_of_enum_values() {
        let ids = IdGenerator::with_seed(1);

        let mut raw = well_formed();
        raw["status"] = json!("MAYBE");
        assert_eq!(validate(&raw, images(), None, &ids).unwrap_err().field, "status");

        let mut raw = well_formed();
        raw["results"][0]["severity"] = json!("Critical");
        assert_eq!(
            validate(&raw, images(), None, &ids).unwrap_err().field,
            "results[0].severity"
        );
    }

    #[test]
    fn test_validate_out_of_range_numbers() {
        let ids = IdGenerator::with_seed(1);

        let mut raw = well_formed();
        raw["overall_score"] = json!(6);
        assert_eq!(validate(&raw, images(), None, &ids).unwrap_err().field, "overall_score");

        let mut raw = well_formed();
        raw["results"][0]["confidence"] = json!(101);
        assert_eq!(
            validate(&raw, images(), None, &ids).unwrap_err().field,
            "results[0].confidence"
        );

        let mut raw = well_formed();
        raw["results"][0]["confidence"] = json!(80.5);
        assert!(validate(&raw, images(), None, &ids).is_err());
    }

    #[test]
    fn test_validate_rejects_non_object() {
        let err = validate(&json!([1, 2]), images(), None, &IdGenerator::with_seed(1)).unwrap_err();
        assert_eq!(err.field, "report");
    }

    #[test]
    fn test_whitespace_tag_is_absent() {
        let result = validate(&well_formed(), images(), Some("   "), &IdGenerator::with_seed(1)).unwrap();
        assert_eq!(result.tag, None);
        assert_eq!(normalize_tag(Some("")), None);
        assert_eq!(normalize_tag(None), None);
    }

    #[test]
    fn test_ids_are_unique() {
        let ids = IdGenerator::with_seed(99);
        let generated: HashSet<String> = (0..2000).map(|_| ids.next_id()).collect();
        assert_eq!(generated.len(), 2000);
    }
}
