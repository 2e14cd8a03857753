//! 端末表示
//!
//! 結果（Summary / Details）、履歴行、静的ページの文字列を組み立てる。

use milq_common::report::format_timestamp;
use milq_common::{ResultSummary, TestResult, ADULTERANTS};

/// 履歴一覧の1行: ラベル, 日時, 総合判定, 検出数
pub fn history_line(result: &TestResult) -> String {
    let (date, time) = format_timestamp(&result.timestamp);
    format!(
        "{:<24} {} {:<5} {:<12} {}",
        result.display_label(),
        date,
        time,
        result.status.as_str(),
        result.detected_label()
    )
}

/// 行を改行で連結（末尾も改行）
fn join_lines(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

pub fn render_summary(result: &TestResult) -> String {
    let summary = ResultSummary::new(result);
    let (date, time) = format_timestamp(&result.timestamp);

    let mut lines = vec![
        format!("{}  ({})", result.display_label(), result.id),
        format!("{} {}", date, time),
        format!("Overall: {}   Score: {}/5", result.status, result.overall_score),
        summary.headline(),
        String::new(),
        "Detected Adulterants".to_string(),
    ];
    if summary.detected.is_empty() {
        lines.push("  None found".to_string());
    }
    for finding in &summary.detected {
        lines.push(format!("  ✖ {} ({}%)", finding.adulterant, finding.confidence));
        lines.push(format!("      {}", finding.color_change));
        lines.push(format!("      {}", finding.recommendation));
        if let Some(risk) = &finding.health_risk {
            lines.push(format!("      Risk: {}", risk));
        }
    }

    if !summary.borderline.is_empty() {
        lines.push(String::new());
        lines.push("Borderline".to_string());
        lines.extend(
            summary
                .borderline
                .iter()
                .map(|f| format!("  ? {} ({}%)", f.adulterant, f.confidence)),
        );
    }

    if !summary.passed.is_empty() {
        let names: Vec<&str> = summary.passed.iter().map(|f| f.adulterant.as_str()).collect();
        lines.push(String::new());
        lines.push(format!("Passed: {}", names.join(", ")));
    }
    join_lines(lines)
}

pub fn render_details(result: &TestResult) -> String {
    let mut lines = vec![format!("{}  ({})", result.display_label(), result.id)];
    for finding in &result.results {
        lines.push(String::new());
        lines.push(format!(
            "{} - {} ({}% confidence, {} severity)",
            finding.adulterant, finding.status, finding.confidence, finding.severity
        ));
        if let Some(action) = &finding.action {
            lines.push(format!("  Action: {}", action));
        }
        lines.push(format!("  Color change: {}", finding.color_change));
        lines.push(format!("  Recommendation: {}", finding.recommendation));
        if let Some(risk) = &finding.health_risk {
            lines.push(format!("  Health risk: {}", risk));
        }
    }
    join_lines(lines)
}

pub fn render_about() -> String {
    let catalog: Vec<String> = ADULTERANTS
        .iter()
        .map(|info| format!("  {:<18} {} - {}", info.name, info.method, info.indication))
        .collect();
    format!(
        "MilQ reads a Via multi-test milk adulteration card.\n\
         Photograph the dry card (before), apply milk, photograph it again (after),\n\
         and MilQ compares the reagent zones to flag adulterants.\n\nScreened adulterants:\n{}",
        join_lines(catalog)
    )
}

pub fn render_help() -> String {
    "1. Set the before photo (dry card) and the after photo (card with milk).\n\
     2. Optionally add a tag such as a batch name.\n\
     3. Run the analysis and review the summary or per-adulterant details.\n\
     4. Download a PDF report from the result screen or from History.\n\
     Tips: shoot in even light, avoid glare and keep the whole card in frame.\n\
     Results are a screening aid only. Confirm with a laboratory."
        .to_string()
}

pub fn render_contact() -> String {
    "Questions or feedback: open an issue in the MilQ repository.".to_string()
}
