//! 検査結果の型定義
//!
//! - AnalysisFinding: 1つの混入物質に対する判定
//! - TestResult: 1回の検査（撮影前/撮影後の比較）の最終結果
//! - AppState: 履歴とテーマ（プロセス全体の永続状態）

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 混入物質ごとの判定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdulterantStatus {
    Pass,
    Detected,
    Borderline,
}

impl AdulterantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdulterantStatus::Pass => "PASS",
            AdulterantStatus::Detected => "DETECTED",
            AdulterantStatus::Borderline => "BORDERLINE",
        }
    }
}

impl FromStr for AdulterantStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PASS" => Ok(AdulterantStatus::Pass),
            "DETECTED" => Ok(AdulterantStatus::Detected),
            "BORDERLINE" => Ok(AdulterantStatus::Borderline),
            _ => Err(format!("expected PASS, DETECTED or BORDERLINE, got {:?}", s)),
        }
    }
}

impl fmt::Display for AdulterantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 検査全体の判定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverallStatus {
    Safe,
    Unsafe,
    Inconclusive,
}

impl OverallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverallStatus::Safe => "SAFE",
            OverallStatus::Unsafe => "UNSAFE",
            OverallStatus::Inconclusive => "INCONCLUSIVE",
        }
    }
}

impl FromStr for OverallStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SAFE" => Ok(OverallStatus::Safe),
            "UNSAFE" => Ok(OverallStatus::Unsafe),
            "INCONCLUSIVE" => Ok(OverallStatus::Inconclusive),
            _ => Err(format!("expected SAFE, UNSAFE or INCONCLUSIVE, got {:?}", s)),
        }
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 健康影響の重大度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "High" => Ok(Severity::High),
            "Medium" => Ok(Severity::Medium),
            "Low" => Ok(Severity::Low),
            _ => Err(format!("expected High, Medium or Low, got {:?}", s)),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 1つの混入物質に対する判定結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisFinding {
    pub adulterant: String,            // 混入物質名
    pub status: AdulterantStatus,
    pub confidence: u8,                // 0-100
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,        // "Reject" / "Accept" 等
    pub color_change: String,          // 色変化の説明
    pub severity: Severity,
    pub recommendation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_risk: Option<String>,
}

impl AnalysisFinding {
    pub fn is_detected(&self) -> bool {
        self.status == AdulterantStatus::Detected
    }
}

/// 1回の検査結果
///
/// 作成後は不変。履歴ストアの全体書き換え以外で変更されない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    /// ISO-8601 (UTC)
    pub timestamp: String,

    /// 1-5（5が最も安全）
    pub overall_score: u8,

    pub status: OverallStatus,

    pub results: Vec<AnalysisFinding>,

    /// `data:image/jpeg;base64,...` 形式
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_image: Option<String>,
}

impl TestResult {
    /// DETECTEDの判定のみ（BORDERLINEは含めない）
    pub fn detected(&self) -> impl Iterator<Item = &AnalysisFinding> {
        self.results.iter().filter(|r| r.is_detected())
    }

    pub fn passed(&self) -> impl Iterator<Item = &AnalysisFinding> {
        self.results
            .iter()
            .filter(|r| r.status == AdulterantStatus::Pass)
    }

    pub fn detected_count(&self) -> usize {
        self.detected().count()
    }

    /// 一覧表示用のラベル: タグ、なければ `Test #<IDの連番部分>`
    pub fn display_label(&self) -> String {
        match &self.tag {
            Some(tag) => tag.clone(),
            None => {
                let suffix = self
                    .id
                    .split_once('-')
                    .map(|(_, rest)| rest)
                    .unwrap_or(&self.id);
                format!("Test #{}", suffix)
            }
        }
    }

    /// 履歴行の検出数表示
    pub fn detected_label(&self) -> String {
        match self.detected_count() {
            0 => "None found".to_string(),
            n => format!("{} found", n),
        }
    }
}

/// 表示テーマ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(format!("Unknown theme: {}. Use light or dark", s)),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// セッションが所有するアプリケーション状態
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    /// 新しい順
    pub history: Vec<TestResult>,
    pub theme: Theme,
}

/// 検査カードの対象物質
#[derive(Debug, Clone, Copy)]
pub struct AdulterantInfo {
    pub name: &'static str,
    pub method: &'static str,
    pub indication: &'static str,
}

pub const ADULTERANTS: &[AdulterantInfo] = &[
    AdulterantInfo { name: "Water", method: "Dilution test", indication: "Color intensity reduction" },
    AdulterantInfo { name: "Formalin", method: "Chemical reaction pad", indication: "Specific color shift (blue/green)" },
    AdulterantInfo { name: "Detergent", method: "Surfactant detection", indication: "Foam formation + color change" },
    AdulterantInfo { name: "Hydrogen Peroxide", method: "Peroxide test pad", indication: "Color development (brown/yellow)" },
    AdulterantInfo { name: "Starch", method: "Iodine-based reaction", indication: "Blue-black color appearance" },
];
