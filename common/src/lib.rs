//! MilQ Common Library
//!
//! CLIと対話セッションで共有される型と純粋ロジック（I/Oなし）

pub mod types;
pub mod error;
pub mod validate;
pub mod query;
pub mod navigation;
pub mod parser;
pub mod prompts;
pub mod layout;
pub mod report;

pub use types::{
    AdulterantInfo, AdulterantStatus, AnalysisFinding, AppState, OverallStatus, Severity,
    TestResult, Theme, ADULTERANTS,
};
pub use error::{Error, Result, ValidationError};
pub use validate::{normalize_tag, validate, CapturedImages, IdGenerator};
pub use query::{query, StatusFilter};
pub use navigation::{AnalysisRequest, NavigationError, Navigator, ResultView, Screen};
pub use parser::{extract_json, parse_report};
pub use report::{report_file_name, ResultSummary};
