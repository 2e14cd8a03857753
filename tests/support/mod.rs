//! テスト用の解析サービス・レンダラ

#![allow(dead_code)]

use milq::analyzer::{CollaboratorError, VisionAnalyzer};
use milq::capture::ImagePayload;
use milq::error::RenderError;
use milq::export::ReportRenderer;
use milq_common::{AdulterantStatus, AnalysisFinding, OverallStatus, Severity, TestResult};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

pub const BEFORE: &str = "QkVGT1JF";
pub const AFTER: &str = "QUZURVI=";

pub enum Behavior {
    Respond(Value),
    Fail,
    Hang,
    /// Notify を待ってから応答
    Gated(Arc<Notify>, Value),
}

/// 受け取った画像（MIME タイプ, base64）
pub type SentImage = (String, String);

pub struct FakeAnalyzer {
    behavior: Behavior,
    calls: Arc<AtomicUsize>,
    received: Arc<Mutex<Vec<(SentImage, SentImage)>>>,
}

impl FakeAnalyzer {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: Arc::default(),
            received: Arc::default(),
        }
    }

    pub fn responding(report: Value) -> Self {
        Self::new(Behavior::Respond(report))
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }

    pub fn received(&self) -> Arc<Mutex<Vec<(SentImage, SentImage)>>> {
        self.received.clone()
    }
}

impl VisionAnalyzer for FakeAnalyzer {
    async fn analyze(
        &self,
        before: ImagePayload<'_>,
        after: ImagePayload<'_>,
    ) -> Result<Value, CollaboratorError> {
        let sent = |p: ImagePayload<'_>| (p.mime_type.to_string(), p.data.to_string());
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.received.lock().unwrap().push((sent(before), sent(after)));

        match &self.behavior {
            Behavior::Respond(report) => Ok(report.clone()),
            Behavior::Fail => Err(CollaboratorError::Transport("connection refused".into())),
            Behavior::Hang => std::future::pending().await,
            Behavior::Gated(gate, report) => {
                gate.notified().await;
                Ok(report.clone())
            }
        }
    }
}

pub fn finding_json(name: &str, status: &str) -> Value {
    json!({
        "adulterant": name,
        "status": status,
        "confidence": 92,
        "action": if status == "DETECTED" { "Reject" } else { "Accept" },
        "colorChange": "no visible shift",
        "severity": if status == "DETECTED" { "High" } else { "Low" },
        "recommendation": "Safe to consume"
    })
}

/// 5物質すべて PASS の SAFE レポート
pub fn safe_report() -> Value {
    let results: Vec<Value> = ["Water", "Formalin", "Detergent", "Hydrogen Peroxide", "Starch"]
        .iter()
        .map(|name| finding_json(name, "PASS"))
        .collect();
    json!({ "overall_score": 4, "status": "SAFE", "results": results })
}

/// Starch のみ DETECTED の UNSAFE レポート
pub fn starch_report() -> Value {
    let mut starch = finding_json("Starch", "DETECTED");
    starch["colorChange"] = json!("dark blue spots on zone C");
    starch["healthRisk"] = json!("Digestive issues");
    json!({
        "overall_score": 2,
        "status": "UNSAFE",
        "results": [
            finding_json("Water", "PASS"),
            finding_json("Formalin", "PASS"),
            finding_json("Detergent", "PASS"),
            finding_json("Hydrogen Peroxide", "PASS"),
            starch
        ]
    })
}

pub fn record(id: &str, tag: Option<&str>, status: OverallStatus) -> TestResult {
    TestResult {
        id: id.to_string(),
        tag: tag.map(str::to_string),
        timestamp: "2026-10-17T08:05:30.000Z".to_string(),
        overall_score: if status == OverallStatus::Safe { 5 } else { 2 },
        status,
        results: vec![AnalysisFinding {
            adulterant: "Starch".to_string(),
            status: if status == OverallStatus::Unsafe {
                AdulterantStatus::Detected
            } else {
                AdulterantStatus::Pass
            },
            confidence: 88,
            action: None,
            color_change: "dark blue spots".to_string(),
            severity: Severity::High,
            recommendation: "Do not consume".to_string(),
            health_risk: None,
        }],
        before_image: Some(format!("data:image/jpeg;base64,{}", BEFORE)),
        after_image: Some(format!("data:image/jpeg;base64,{}", AFTER)),
    }
}

/// 固定バイト列を返すレンダラ（遅延・失敗を指定可能）
#[derive(Clone)]
pub struct StubRenderer {
    pub delay: Duration,
    pub fail: bool,
}

impl StubRenderer {
    pub fn instant() -> Self {
        Self { delay: Duration::ZERO, fail: false }
    }
}

impl ReportRenderer for StubRenderer {
    fn render(&self, result: &TestResult) -> Result<Vec<u8>, RenderError> {
        std::thread::sleep(self.delay);
        if self.fail {
            return Err(RenderError::Pdf("stub failure".into()));
        }
        Ok(format!("%PDF stub {}", result.id).into_bytes())
    }
}
