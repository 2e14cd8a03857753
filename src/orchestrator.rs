//! 解析フロー
//!
//! 画像2枚 → 解析サービス → 検証 → 履歴の先頭に追加 → 永続化。
//! 状態（AppState）はこの構造体が単独で所有する。
//!
//! ## 不変条件
//! - 解析は同時に1つまで（2つ目は AlreadyInProgress）
//! - 失敗・タイムアウト・キャンセル時は履歴を一切変更しない
//! - 保存の失敗は警告のみ。メモリ上の履歴が正となる

use crate::analyzer::VisionAnalyzer;
use crate::capture::{to_data_url, ImagePayload};
use crate::error::{AnalysisError, PersistenceError};
use crate::guard::BusyFlag;
use crate::store::{KeyValueStore, StateStore};
use milq_common::{validate, AppState, CapturedImages, IdGenerator, TestResult, Theme};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub struct Orchestrator<A, S> {
    analyzer: A,
    store: StateStore<S>,
    state: Mutex<AppState>,
    ids: IdGenerator,
    in_flight: BusyFlag,
    timeout: Duration,
    persistence_warning: Mutex<Option<PersistenceError>>,
}

impl<A: VisionAnalyzer, S: KeyValueStore> Orchestrator<A, S> {
    /// ストアから履歴とテーマを復元して開始
    pub fn new(analyzer: A, store: StateStore<S>) -> Self {
        let state = store.load_state();
        info!(records = state.history.len(), theme = %state.theme, "state restored");
        Self {
            analyzer,
            store,
            state: Mutex::new(state),
            ids: IdGenerator::new(),
            in_flight: BusyFlag::new(),
            timeout: DEFAULT_TIMEOUT,
            persistence_warning: Mutex::new(None),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_id_generator(mut self, ids: IdGenerator) -> Self {
        self.ids = ids;
        self
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_busy()
    }

    pub fn store(&self) -> &StateStore<S> {
        &self.store
    }

    /// 解析を実行し、成功したら履歴の先頭に追加する
    ///
    /// 画像は base64 または data URL。結果レコードには data URL で保存する。
    pub async fn run_analysis(
        &self,
        before_image: &str,
        after_image: &str,
        tag: Option<&str>,
    ) -> Result<TestResult, AnalysisError> {
        if before_image.trim().is_empty() || after_image.trim().is_empty() {
            return Err(AnalysisError::InvalidInput);
        }
        let _guard = self
            .in_flight
            .try_acquire()
            .ok_or(AnalysisError::AlreadyInProgress)?;

        let call = self
            .analyzer
            .analyze(ImagePayload::parse(before_image), ImagePayload::parse(after_image));
        let raw = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                warn!("analysis service failed: {}", e);
                return Err(AnalysisError::ServiceUnavailable(e.to_string()));
            }
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "analysis timed out");
                return Err(AnalysisError::Timeout(self.timeout.as_secs()));
            }
        };

        let images = CapturedImages {
            before: Some(to_data_url(before_image)),
            after: Some(to_data_url(after_image)),
        };
        let result = validate(&raw, images, tag, &self.ids).map_err(|e| {
            warn!("analysis response rejected: {}", e);
            AnalysisError::MalformedResponse(e.to_string())
        })?;

        Ok(self.commit(result))
    }

    fn commit(&self, mut result: TestResult) -> TestResult {
        let mut state = self.lock_state();
        while state.history.iter().any(|r| r.id == result.id) {
            result.id = self.ids.next_id();
        }
        state.history.insert(0, result.clone());
        info!(id = %result.id, status = %result.status, detected = result.detected_count(), "analysis recorded");

        // ロック中に保存して書き込み順を保つ
        if let Err(e) = self.store.save_history(&state.history) {
            self.record_warning(e);
        }
        result
    }

    /// 履歴（新しい順）を借用して処理する
    pub fn with_history<R>(&self, f: impl FnOnce(&[TestResult]) -> R) -> R {
        f(&self.lock_state().history)
    }

    pub fn history(&self) -> Vec<TestResult> {
        self.with_history(|h| h.to_vec())
    }

    pub fn find(&self, id: &str) -> Option<TestResult> {
        self.with_history(|h| h.iter().find(|r| r.id == id).cloned())
    }

    pub fn theme(&self) -> Theme {
        self.lock_state().theme
    }

    /// テーマを変更して保存（保存失敗でもメモリ上は変更済み）
    pub fn set_theme(&self, theme: Theme) -> Result<(), PersistenceError> {
        let mut state = self.lock_state();
        state.theme = theme;
        self.store.save_theme(theme)
    }

    pub fn clear_history(&self) -> Result<(), PersistenceError> {
        let mut state = self.lock_state();
        state.history.clear();
        self.store.clear_history()
    }

    /// 直近の保存失敗を取り出す
    pub fn take_persistence_warning(&self) -> Option<PersistenceError> {
        self.persistence_warning
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
    }

    fn record_warning(&self, error: PersistenceError) {
        warn!("history not saved, keeping it in memory: {}", error);
        *self
            .persistence_warning
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(error);
    }

    fn lock_state(&self) -> MutexGuard<'_, AppState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
