//! セッション
//!
//! 画面遷移（Navigator）と解析フロー（Orchestrator）、レポート出力を1つにまとめる。
//! 対話アプリとテストはこの単位で操作する。

use crate::analyzer::VisionAnalyzer;
use crate::error::{MilqError, RenderError, Result};
use crate::export::{export_report, ReportGate, ReportRenderer};
use crate::orchestrator::Orchestrator;
use crate::store::KeyValueStore;
use milq_common::{query, Navigator, ResultView, Screen, StatusFilter, TestResult, Theme};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Home に表示する最近の検査数
pub const RECENT_LIMIT: usize = 3;

/// Analyzing 中の Navigator。完了前に drop されたら Home に戻す
struct PendingAnalysis<'a> {
    navigator: &'a mut Navigator,
    armed: bool,
}

impl PendingAnalysis<'_> {
    fn finish(&mut self) -> &mut Navigator {
        self.armed = false;
        self.navigator
    }
}

impl Drop for PendingAnalysis<'_> {
    fn drop(&mut self) {
        if self.armed && self.navigator.cancel_analysis().is_ok() {
            warn!("analysis cancelled, returning to Home");
        }
    }
}

pub struct Session<A, S, R> {
    navigator: Navigator,
    orchestrator: Orchestrator<A, S>,
    renderer: R,
    report_gate: ReportGate,
    notices: Vec<String>,
}

impl<A, S, R> Session<A, S, R>
where
    A: VisionAnalyzer,
    S: KeyValueStore,
    R: ReportRenderer + Clone + Send + 'static,
{
    pub fn new(orchestrator: Orchestrator<A, S>, renderer: R) -> Self {
        Self {
            navigator: Navigator::new(),
            orchestrator,
            renderer,
            report_gate: ReportGate::new(),
            notices: Vec::new(),
        }
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn orchestrator(&self) -> &Orchestrator<A, S> {
        &self.orchestrator
    }

    pub fn screen(&self) -> Screen {
        self.navigator.screen()
    }

    pub fn set_before_image(&mut self, image: Option<String>) -> Result<()> {
        Ok(self.navigator.set_before_image(image)?)
    }

    pub fn set_after_image(&mut self, image: Option<String>) -> Result<()> {
        Ok(self.navigator.set_after_image(image)?)
    }

    pub fn set_tag(&mut self, tag: impl Into<String>) -> Result<()> {
        Ok(self.navigator.set_tag(tag)?)
    }

    pub fn dismiss_error(&mut self) {
        self.navigator.dismiss_error();
    }

    pub fn navigate(&mut self, target: Screen) -> Result<()> {
        Ok(self.navigator.navigate(target)?)
    }

    pub fn select_view(&mut self, view: ResultView) -> Result<()> {
        Ok(self.navigator.select_view(view)?)
    }

    /// New Test / Reset
    pub fn reset(&mut self) -> Result<()> {
        Ok(self.navigator.reset()?)
    }

    /// Home → Analyzing → Results（失敗時は Home に戻りエラーを表示）
    ///
    /// 途中で future が drop された場合も Home に戻る（入力は保持）
    pub async fn analyze(&mut self) -> Result<TestResult> {
        let request = self.navigator.begin_analysis()?;
        let mut pending = PendingAnalysis {
            navigator: &mut self.navigator,
            armed: true,
        };
        let outcome = self
            .orchestrator
            .run_analysis(&request.before_image, &request.after_image, Some(request.tag.as_str()))
            .await;
        let navigator = pending.finish();

        match outcome {
            Ok(result) => {
                if let Some(warning) = self.orchestrator.take_persistence_warning() {
                    self.notices
                        .push(format!("Result kept for this session only: {}", warning));
                }
                navigator.complete_analysis(result.clone())?;
                Ok(result)
            }
            Err(e) => {
                navigator.fail_analysis(e.user_message())?;
                Err(e.into())
            }
        }
    }

    /// 履歴の1件を結果画面で開く
    pub fn open_result(&mut self, id: &str) -> Result<()> {
        let result = self
            .orchestrator
            .find(id)
            .ok_or_else(|| MilqError::ResultNotFound(id.to_string()))?;
        Ok(self.navigator.open_result(result)?)
    }

    /// Home の最近の検査（新しい順）
    pub fn recent(&self) -> Vec<TestResult> {
        self.orchestrator
            .with_history(|history| history.iter().take(RECENT_LIMIT).cloned().collect())
    }

    /// History 画面の検索
    pub fn search(&self, search_text: &str, status_filter: StatusFilter) -> Vec<TestResult> {
        self.orchestrator.with_history(|history| {
            query(history, search_text, status_filter)
                .into_iter()
                .cloned()
                .collect()
        })
    }

    pub fn theme(&self) -> Theme {
        self.orchestrator.theme()
    }

    /// テーマを切り替え。保存に失敗しても切り替えは有効
    pub fn toggle_theme(&mut self) -> Theme {
        let theme = self.orchestrator.theme().toggled();
        if let Err(e) = self.orchestrator.set_theme(theme) {
            warn!("theme not saved: {}", e);
            self.notices.push(format!("Theme not saved: {}", e));
        }
        theme
    }

    pub fn is_exporting(&self) -> bool {
        self.report_gate.is_busy()
    }

    /// 任意の結果のレポートを出力（History の行から）
    pub async fn export_report(
        &self,
        result: &TestResult,
        output_dir: &Path,
    ) -> std::result::Result<PathBuf, RenderError> {
        export_report(&self.report_gate, &self.renderer, result, output_dir).await
    }

    /// 結果画面で表示中の結果のレポートを出力
    pub async fn export_current(&self, output_dir: &Path) -> Result<PathBuf> {
        let result = self
            .navigator
            .current_result()
            .ok_or(milq_common::NavigationError::NoResult)?;
        Ok(self.export_report(result, output_dir).await?)
    }

    /// 溜まった警告（保存失敗など）を取り出す
    pub fn take_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }
}
