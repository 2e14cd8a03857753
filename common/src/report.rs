//! レポート内容の組み立て
//!
//! 結果画面（Summary/Details）とPDFレポートで共通に使う表示データ。
//! 描画そのものは呼び出し側（PDFレンダラ、CLI）が行う。

use crate::types::{AdulterantStatus, AnalysisFinding, TestResult, ADULTERANTS};
use chrono::DateTime;

pub const REPORT_TITLE: &str = "MILQ TEST REPORT";
pub const REPORT_SUBTITLE: &str = "Via Multi Test Milk Adulteration Card";

/// 検出なしの場合の要約文
pub const CLEAN_SAMPLE_STATEMENT: &str = "The visual and chemical analysis of the milk card did not detect significant levels of common adulterants (Water, Formalin, Detergent, Starch, Hydrogen Peroxide). The sample appears consistent with pure milk standards within the limitations of this screening tool.";

pub const FOOTER_LINES: &[&str] = &[
    "This report is generated by MilQ Milk Adulterant Test System.",
    "For screening only. Lab confirmation recommended.",
];

/// 結果画面 Summary ビューの内容
#[derive(Debug, Clone)]
pub struct ResultSummary<'a> {
    pub result: &'a TestResult,
    /// "Detected Adulterants" セクション（DETECTEDのみ）
    pub detected: Vec<&'a AnalysisFinding>,
    pub passed: Vec<&'a AnalysisFinding>,
    pub borderline: Vec<&'a AnalysisFinding>,
}

impl<'a> ResultSummary<'a> {
    pub fn new(result: &'a TestResult) -> Self {
        let by_status = |status: AdulterantStatus| {
            result
                .results
                .iter()
                .filter(|r| r.status == status)
                .collect::<Vec<_>>()
        };
        Self {
            result,
            detected: by_status(AdulterantStatus::Detected),
            passed: by_status(AdulterantStatus::Pass),
            borderline: by_status(AdulterantStatus::Borderline),
        }
    }

    /// "Adulterant present : 1/5"
    pub fn headline(&self) -> String {
        format!("Adulterant present : {}/{}", self.detected.len(), ADULTERANTS.len())
    }
}

/// 判定テーブルの1行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub adulterant: String,
    pub status: AdulterantStatus,
    pub confidence: String,
    pub verdict: &'static str,
}

pub fn verdict(finding: &AnalysisFinding) -> &'static str {
    if finding.is_detected() {
        "REJECT"
    } else {
        "PASS"
    }
}

pub fn report_rows(result: &TestResult) -> Vec<ReportRow> {
    result
        .results
        .iter()
        .map(|r| ReportRow {
            adulterant: r.adulterant.clone(),
            status: r.status,
            confidence: format!("{}%", r.confidence),
            verdict: verdict(r),
        })
        .collect()
}

/// レポート末尾の要約文
pub fn summary_paragraph(result: &TestResult) -> String {
    let detected: Vec<&AnalysisFinding> = result.detected().collect();
    if detected.is_empty() {
        return CLEAN_SAMPLE_STATEMENT.to_string();
    }

    let names = detected
        .iter()
        .map(|d| d.adulterant.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let details = detected
        .iter()
        .map(|d| {
            let risk = match &d.health_risk {
                Some(risk) => format!("Primary health concern: {}", risk),
                None => "Potential health risk detected.".to_string(),
            };
            format!("{} presence suggests {}. {}", d.adulterant, d.color_change, risk)
        })
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        "Based on the chemical analysis, {} adulterant(s) were identified in this sample: {}. {}",
        detected.len(),
        names,
        details
    )
}

/// レポートのファイル名
pub fn report_file_name(id: &str) -> String {
    format!("Report_{}.pdf", id)
}

/// ISO-8601 → ("2026-10-17", "08:05")
///
/// パースできない場合は元の文字列をそのまま日付として返す
pub fn format_timestamp(timestamp: &str) -> (String, String) {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(dt) => (
            dt.format("%Y-%m-%d").to_string(),
            dt.format("%H:%M").to_string(),
        ),
        Err(_) => (timestamp.to_string(), String::new()),
    }
}
