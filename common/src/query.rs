//! 履歴検索
//!
//! タグ/IDの部分一致（大文字小文字無視）とステータスフィルタのAND条件。
//! 入力順（新しい順）をそのまま保つ。

use crate::types::{OverallStatus, TestResult};
use std::fmt;
use std::str::FromStr;

/// 履歴画面のステータスフィルタ
///
/// SAFE/UNSAFE はステータス完全一致。INCONCLUSIVE はどちらにも含まれない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Safe,
    Unsafe,
}

impl StatusFilter {
    pub const VARIANTS: &'static [StatusFilter] = &[StatusFilter::All, StatusFilter::Safe, StatusFilter::Unsafe];

    pub fn matches(&self, status: OverallStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Safe => status == OverallStatus::Safe,
            StatusFilter::Unsafe => status == OverallStatus::Unsafe,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::All => "ALL",
            StatusFilter::Safe => "SAFE",
            StatusFilter::Unsafe => "UNSAFE",
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "safe" => Ok(StatusFilter::Safe),
            "unsafe" => Ok(StatusFilter::Unsafe),
            _ => Err(format!("Unknown status filter: {}. Use all, safe, or unsafe", s)),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 検索文字列がタグまたはIDに含まれるか
pub fn matches_search(result: &TestResult, search_text: &str) -> bool {
    let needle = search_text.to_lowercase();
    if needle.is_empty() {
        return true;
    }
    let tag = result.tag.as_deref().unwrap_or("").to_lowercase();
    tag.contains(&needle) || result.id.to_lowercase().contains(&needle)
}

/// 履歴を検索
///
/// 戻り値は元の履歴への参照（読み取り専用ビュー）
pub fn query<'a>(
    history: &'a [TestResult],
    search_text: &str,
    status_filter: StatusFilter,
) -> Vec<&'a TestResult> {
    history
        .iter()
        .filter(|r| matches_search(r, search_text) && status_filter.matches(r.status))
        .collect()
}
