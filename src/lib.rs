//! MilQ: 牛乳混入物テストカードの撮影前/撮影後画像をAI判定し、
//! 結果の履歴管理とPDFレポート出力を行う

pub mod analyzer;
pub mod app;
pub mod capture;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod guard;
pub mod orchestrator;
pub mod session;
pub mod store;
pub mod view;

pub use milq_common as common;
