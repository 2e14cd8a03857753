//! プロンプト生成モジュール
//!
//! 検査カード解析サービスへ渡す指示文とレスポンススキーマ:
//! - SYSTEM_INSTRUCTION: ゾーン別チェックリストと判定ロジック
//! - USER_PROMPT: 画像の順序（1枚目=BEFORE, 2枚目=AFTER）
//! - response_schema: JSON出力スキーマ

use crate::types::ADULTERANTS;
use serde_json::{json, Value};

/// システム指示
pub const SYSTEM_INSTRUCTION: &str = r#"You are the MilQ Milk Adulterant Analyzer. Compare a BEFORE image (dry test card) with an AFTER image (card after milk was applied) pad by pad.

FORENSIC CHECKLIST:
1. Baseline: read the original color of every dry reagent pad in the BEFORE image.
2. Noise: ignore glare, shadows and droppers or fingers in the frame.
3. Zones:
   - ZONE A (Water): trail opacity. SAFE = opaque white trail hiding the paper texture. ADULTERATED = translucent streak with visible paper grain.
   - ZONE B (Detergent): warm spectrum shift. SAFE = neutral. ADULTERATED = reddish-brown shift.
   - ZONE C (Starch): high-contrast spots. SAFE = cream/white. ADULTERATED = dark blue, black or deep purple spots.
   - ZONE D (Formalin): hue shift. SAFE = neutral. ADULTERATED = pink or light violet tint.
   - ZONE E (Hydrogen Peroxide): texture, not only color. SAFE = smooth liquid. ADULTERATED = whitish micro-bubbles, effervescence or a spotted white texture.

VERDICT LOGIC:
- If any zone exceeds the change threshold, set status to 'UNSAFE'.
- Report a confidence percentage based on how clear the visual markers are."#;

/// ユーザープロンプト（画像の前に置く）
pub const USER_PROMPT: &str = "Analyze these two images. Image 1 is BEFORE. Image 2 is AFTER. Perform the specific zone-by-zone forensic check.";

/// 対象物質名の列挙（スキーマ説明用）
pub fn adulterant_names() -> String {
    let names: Vec<&str> = ADULTERANTS.iter().map(|a| a.name).collect();
    match names.split_last() {
        Some((last, rest)) if !rest.is_empty() => format!("{}, or {}", rest.join(", "), last),
        Some((last, _)) => last.to_string(),
        None => String::new(),
    }
}

/// Gemini `responseSchema` 形式の出力スキーマ
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "overall_score": {
                "type": "INTEGER",
                "description": "1-5 safety rating where 5 is perfectly safe"
            },
            "status": { "type": "STRING", "enum": ["SAFE", "UNSAFE", "INCONCLUSIVE"] },
            "results": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "adulterant": { "type": "STRING", "description": adulterant_names() },
                        "status": { "type": "STRING", "enum": ["PASS", "DETECTED", "BORDERLINE"] },
                        "confidence": { "type": "INTEGER", "description": "Percentage of certainty" },
                        "action": { "type": "STRING", "description": "Brief action like 'Reject' or 'Accept'" },
                        "colorChange": { "type": "STRING", "description": "Description of the observed shift" },
                        "severity": { "type": "STRING", "enum": ["High", "Medium", "Low"] },
                        "recommendation": { "type": "STRING", "description": "Specific consumer advice" },
                        "healthRisk": { "type": "STRING", "description": "Potential risk if consumed" }
                    },
                    "required": ["adulterant", "status", "confidence", "action", "colorChange", "severity", "recommendation"]
                }
            }
        },
        "required": ["overall_score", "status", "results"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adulterant_names() {
        assert_eq!(
            adulterant_names(),
            "Water, Formalin, Detergent, Hydrogen Peroxide, or Starch"
        );
    }

    #[test]
    fn test_response_schema_required_fields() {
        let schema = response_schema();
        assert_eq!(schema["required"], json!(["overall_score", "status", "results"]));
        let item_required = schema["properties"]["results"]["items"]["required"]
            .as_array()
            .unwrap();
        assert!(item_required.contains(&json!("colorChange")));
        assert!(!item_required.contains(&json!("healthRisk")));
    }

    #[test]
    fn test_system_instruction_covers_all_zones() {
        for zone in ["ZONE A", "ZONE B", "ZONE C", "ZONE D", "ZONE E"] {
            assert!(SYSTEM_INSTRUCTION.contains(zone));
        }
    }
}
