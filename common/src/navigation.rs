//! 画面遷移ステートマシン
//!
//! 副作用を持たない純粋な状態遷移のみを扱う。解析APIの呼び出しや
//! レポート生成はセッション側で行い、その完了をここに通知する。
//!
//! ```text
//! Home --begin_analysis--> Analyzing --complete--> Results --reset--> Home
//!                              \--fail--> Home（画像は保持）
//! Home|History --open_result--> Results
//! Home <-> History <-> About <-> Contact <-> Help <-> Settings
//! ```

use crate::types::TestResult;
use std::fmt;
use thiserror::Error;

/// アプリケーション画面
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Screen {
    #[default]
    Home,
    Analyzing,
    Results,
    History,
    About,
    Contact,
    Help,
    Settings,
}

impl Screen {
    /// 直接移動できる画面（ナビゲーションバー）
    pub const LATERAL: &'static [Screen] = &[
        Screen::Home,
        Screen::History,
        Screen::About,
        Screen::Contact,
        Screen::Help,
        Screen::Settings,
    ];

    pub fn is_lateral(&self) -> bool {
        Self::LATERAL.contains(self)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Screen::Home => "Home",
            Screen::Analyzing => "Analyzing",
            Screen::Results => "Results",
            Screen::History => "History",
            Screen::About => "About",
            Screen::Contact => "Contact",
            Screen::Help => "Help",
            Screen::Settings => "Settings",
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// 結果画面のサブビュー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultView {
    #[default]
    Summary,
    Details,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("an analysis is already running")]
    AnalysisPending,

    #[error("both before and after images are required")]
    MissingImages,

    #[error("analysis can only be started from Home (current: {0})")]
    NotOnHome(Screen),

    #[error("no analysis is running")]
    NotAnalyzing,

    #[error("no result is selected")]
    NoResult,

    #[error("{0} cannot be entered directly")]
    Unreachable(Screen),

    #[error("a past result cannot be opened from {0}")]
    CannotOpenResultFrom(Screen),
}

/// 解析開始時に取り出される入力
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub before_image: String,
    pub after_image: String,
    pub tag: String,
}

/// 画面遷移の状態
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    screen: Screen,
    result_view: ResultView,
    before_image: Option<String>,
    after_image: Option<String>,
    tag: String,
    current_result: Option<TestResult>,
    error: Option<String>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn result_view(&self) -> ResultView {
        self.result_view
    }

    pub fn before_image(&self) -> Option<&str> {
        self.before_image.as_deref()
    }

    pub fn after_image(&self) -> Option<&str> {
        self.after_image.as_deref()
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn current_result(&self) -> Option<&TestResult> {
        self.current_result.as_ref()
    }

    /// 直近の解析失敗メッセージ
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_analyzing(&self) -> bool {
        self.screen() == Screen::Analyzing
    }

    /// 解析ボタンが有効か
    pub fn can_analyze(&self) -> bool {
        self.screen() == Screen::Home && self.before_image.is_some() && self.after_image.is_some()
    }

    pub fn set_before_image(&mut self, image: Option<String>) -> Result<(), NavigationError> {
        self.ensure_idle()?;
        self.before_image = image.filter(|i| !i.is_empty());
        Ok(())
    }

    pub fn set_after_image(&mut self, image: Option<String>) -> Result<(), NavigationError> {
        self.ensure_idle()?;
        self.after_image = image.filter(|i| !i.is_empty());
        Ok(())
    }

    pub fn set_tag(&mut self, tag: impl Into<String>) -> Result<(), NavigationError> {
        self.ensure_idle()?;
        self.tag = tag.into();
        Ok(())
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// ナビゲーションバーからの移動
    pub fn navigate(&mut self, target: Screen) -> Result<(), NavigationError> {
        self.ensure_idle()?;
        if !target.is_lateral() {
            return Err(NavigationError::Unreachable(target));
        }
        self.screen = target;
        Ok(())
    }

    /// Home → Analyzing
    pub fn begin_analysis(&mut self) -> Result<AnalysisRequest, NavigationError> {
        self.ensure_idle()?;
        if self.screen() != Screen::Home {
            return Err(NavigationError::NotOnHome(self.screen()));
        }
        let (Some(before), Some(after)) = (&self.before_image, &self.after_image) else {
            return Err(NavigationError::MissingImages);
        };

        let request = AnalysisRequest {
            before_image: before.clone(),
            after_image: after.clone(),
            tag: self.tag.clone(),
        };
        self.error = None;
        self.screen = Screen::Analyzing;
        Ok(request)
    }

    /// Analyzing → Results
    pub fn complete_analysis(&mut self, result: TestResult) -> Result<(), NavigationError> {
        if !self.is_analyzing() {
            return Err(NavigationError::NotAnalyzing);
        }
        self.enter_results(result);
        Ok(())
    }

    /// Analyzing → Home（画像とタグは再試行のため保持）
    pub fn fail_analysis(&mut self, message: impl Into<String>) -> Result<(), NavigationError> {
        if !self.is_analyzing() {
            return Err(NavigationError::NotAnalyzing);
        }
        self.error = Some(message.into());
        self.screen = Screen::Home;
        Ok(())
    }

    /// Analyzing → Home（中断。エラー表示なし、画像とタグは保持）
    pub fn cancel_analysis(&mut self) -> Result<(), NavigationError> {
        if !self.is_analyzing() {
            return Err(NavigationError::NotAnalyzing);
        }
        self.screen = Screen::Home;
        Ok(())
    }

    /// 新しい検査を始める: 画像・タグ・現在の結果をクリアして Home へ
    ///
    /// 何度呼んでも同じ状態になる
    pub fn reset(&mut self) -> Result<(), NavigationError> {
        self.ensure_idle()?;
        self.before_image = None;
        self.after_image = None;
        self.tag.clear();
        self.current_result = None;
        self.error = None;
        self.result_view = ResultView::Summary;
        self.screen = Screen::Home;
        Ok(())
    }

    /// 履歴の1件を開く（Home の最近の検査 / History 一覧から）
    pub fn open_result(&mut self, result: TestResult) -> Result<(), NavigationError> {
        self.ensure_idle()?;
        match self.screen() {
            Screen::Home | Screen::History => {
                self.enter_results(result);
                Ok(())
            }
            other => Err(NavigationError::CannotOpenResultFrom(other)),
        }
    }

    pub fn select_view(&mut self, view: ResultView) -> Result<(), NavigationError> {
        if self.screen() != Screen::Results || self.current_result.is_none() {
            return Err(NavigationError::NoResult);
        }
        self.result_view = view;
        Ok(())
    }

    fn enter_results(&mut self, result: TestResult) {
        self.current_result = Some(result);
        self.result_view = ResultView::Summary;
        self.screen = Screen::Results;
    }

    fn ensure_idle(&self) -> Result<(), NavigationError> {
        if self.is_analyzing() {
            Err(NavigationError::AnalysisPending)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OverallStatus;

    fn result(id: &str) -> TestResult {
        TestResult {
            id: id.to_string(),
            tag: None,
            timestamp: "2026-10-17T08:00:00.000Z".to_string(),
            overall_score: 5,
            status: OverallStatus::Safe,
            results: Vec::new(),
            before_image: None,
            after_image: None,
        }
    }

    fn ready() -> Navigator {
        let mut nav = Navigator::new();
        nav.set_before_image(Some("before".into())).unwrap();
        nav.set_after_image(Some("after".into())).unwrap();
        nav.set_tag("Morning Batch").unwrap();
        nav
    }

    #[test]
    fn test_initial_state() {
        let nav = Navigator::new();
        assert_eq!(nav.screen(), Screen::Home);
        assert_eq!(nav.result_view(), ResultView::Summary);
        assert!(nav.current_result().is_none());
        assert!(!nav.can_analyze());
    }

    #[test]
    fn test_begin_requires_both_images() {
        let mut nav = Navigator::new();
        nav.set_before_image(Some("before".into())).unwrap();
        assert_eq!(nav.begin_analysis(), Err(NavigationError::MissingImages));

        nav.set_after_image(Some(String::new())).unwrap();
        assert_eq!(nav.begin_analysis(), Err(NavigationError::MissingImages));
        assert_eq!(nav.screen(), Screen::Home);
    }

    #[test]
    fn test_successful_analysis_enters_results_summary() {
        let mut nav = ready();
        let request = nav.begin_analysis().unwrap();
        assert_eq!(request.tag, "Morning Batch");
        assert_eq!(nav.screen(), Screen::Analyzing);

        nav.complete_analysis(result("MIL-1")).unwrap();
        assert_eq!(nav.screen(), Screen::Results);
        assert_eq!(nav.result_view(), ResultView::Summary);
        assert_eq!(nav.current_result().unwrap().id, "MIL-1");
    }

    #[test]
    fn test_failed_analysis_keeps_images() {
        let mut nav = ready();
        nav.begin_analysis().unwrap();
        nav.fail_analysis("Analysis failed.").unwrap();

        assert_eq!(nav.screen(), Screen::Home);
        assert_eq!(nav.error(), Some("Analysis failed."));
        assert_eq!(nav.before_image(), Some("before"));
        assert_eq!(nav.after_image(), Some("after"));
        assert_eq!(nav.tag(), "Morning Batch");
        assert!(nav.can_analyze());

        nav.begin_analysis().unwrap();
        assert_eq!(nav.error(), None);
    }

    #[test]
    fn test_navigation_locked_while_analyzing() {
        let mut nav = ready();
        nav.begin_analysis().unwrap();

        assert_eq!(nav.navigate(Screen::History), Err(NavigationError::AnalysisPending));
        assert_eq!(nav.begin_analysis(), Err(NavigationError::AnalysisPending));
        assert_eq!(nav.reset(), Err(NavigationError::AnalysisPending));
        assert_eq!(nav.set_before_image(None), Err(NavigationError::AnalysisPending));
        assert_eq!(nav.open_result(result("MIL-9")), Err(NavigationError::AnalysisPending));
        assert_eq!(nav.screen(), Screen::Analyzing);
    }

    #[test]
    fn test_completion_without_pending_analysis() {
        let mut nav = Navigator::new();
        assert_eq!(nav.complete_analysis(result("MIL-1")), Err(NavigationError::NotAnalyzing));
        assert_eq!(nav.fail_analysis("x"), Err(NavigationError::NotAnalyzing));
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut nav = ready();
        nav.begin_analysis().unwrap();
        nav.complete_analysis(result("MIL-1")).unwrap();

        nav.reset().unwrap();
        let once = format!("{:?}", nav);
        nav.reset().unwrap();
        assert_eq!(format!("{:?}", nav), once);

        assert_eq!(nav.screen(), Screen::Home);
        assert!(nav.before_image().is_none());
        assert!(nav.after_image().is_none());
        assert_eq!(nav.tag(), "");
        assert!(nav.current_result().is_none());
    }

    #[test]
    fn test_lateral_navigation() {
        let mut nav = Navigator::new();
        for &screen in Screen::LATERAL {
            nav.navigate(screen).unwrap();
            assert_eq!(nav.screen(), screen);
        }
        assert_eq!(nav.navigate(Screen::Results), Err(NavigationError::Unreachable(Screen::Results)));
        assert_eq!(
            nav.navigate(Screen::Analyzing),
            Err(NavigationError::Unreachable(Screen::Analyzing))
        );
    }

    #[test]
    fn test_open_result_from_history_resets_view() {
        let mut nav = Navigator::new();
        nav.navigate(Screen::History).unwrap();
        nav.open_result(result("MIL-7")).unwrap();
        nav.select_view(ResultView::Details).unwrap();
        assert_eq!(nav.result_view(), ResultView::Details);

        nav.navigate(Screen::History).unwrap();
        nav.open_result(result("MIL-8")).unwrap();
        assert_eq!(nav.result_view(), ResultView::Summary);
        assert_eq!(nav.current_result().unwrap().id, "MIL-8");
    }

    #[test]
    fn test_open_result_only_from_home_or_history() {
        let mut nav = Navigator::new();
        nav.navigate(Screen::Settings).unwrap();
        assert_eq!(
            nav.open_result(result("MIL-1")),
            Err(NavigationError::CannotOpenResultFrom(Screen::Settings))
        );
    }

    #[test]
    fn test_select_view_requires_result() {
        let mut nav = Navigator::new();
        assert_eq!(nav.select_view(ResultView::Details), Err(NavigationError::NoResult));
    }

    #[test]
    fn test_cancel_analysis_keeps_inputs() {
        let mut nav = Navigator::new();
        nav.set_before_image(Some("QQ==".into())).unwrap();
        nav.set_after_image(Some("Qg==".into())).unwrap();
        nav.set_tag("Batch 3").unwrap();
        nav.begin_analysis().unwrap();

        nav.cancel_analysis().unwrap();
        assert_eq!(nav.screen(), Screen::Home);
        assert_eq!(nav.error(), None);
        assert_eq!(nav.before_image(), Some("QQ=="));
        assert_eq!(nav.tag(), "Batch 3");
        assert!(nav.can_analyze());
        assert_eq!(nav.cancel_analysis(), Err(NavigationError::NotAnalyzing));
    }
}
