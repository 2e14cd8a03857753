//! レポート出力
//!
//! 1件の TestResult を PDF にして `Report_<id>.pdf` として保存する。
//! 生成中は ReportGate が立ち、同時に2つ目は受け付けない。

pub mod pdf;

pub use pdf::PdfRenderer;

use crate::error::RenderError;
use crate::guard::BusyFlag;
use milq_common::{report_file_name, TestResult};
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::info;

/// TestResult をレポート文書のバイト列にする
pub trait ReportRenderer {
    fn render(&self, result: &TestResult) -> Result<Vec<u8>, RenderError>;
}

/// レポート生成中フラグ
#[derive(Debug, Default)]
pub struct ReportGate {
    busy: BusyFlag,
}

impl ReportGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    /// 空いていればタスクを実行する。成否にかかわらず終了時にフラグを戻す
    pub async fn run<F, T>(&self, task: F) -> Result<T, RenderError>
    where
        F: Future<Output = Result<T, RenderError>>,
    {
        let _guard = self.busy.try_acquire().ok_or(RenderError::Busy)?;
        task.await
    }
}

/// 出力先ディレクトリにレポートを書き出す
pub fn write_report(bytes: &[u8], id: &str, output_dir: &Path) -> Result<PathBuf, RenderError> {
    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(report_file_name(id));
    std::fs::write(&path, bytes)?;
    Ok(path)
}

/// レポートを生成して保存する（描画はブロッキングスレッドで実行）
pub async fn export_report<R>(
    gate: &ReportGate,
    renderer: &R,
    result: &TestResult,
    output_dir: &Path,
) -> Result<PathBuf, RenderError>
where
    R: ReportRenderer + Clone + Send + 'static,
{
    gate.run(async {
        let renderer = renderer.clone();
        let record = result.clone();
        let bytes = tokio::task::spawn_blocking(move || renderer.render(&record))
            .await
            .map_err(|e| RenderError::Pdf(format!("render task failed: {}", e)))??;

        let path = write_report(&bytes, &result.id, output_dir)?;
        info!(id = %result.id, path = %path.display(), bytes = bytes.len(), "report written");
        Ok(path)
    })
    .await
}
