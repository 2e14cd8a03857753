use clap::{Parser, Subcommand};
use milq_common::{StatusFilter, Theme};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "milq")]
#[command(about = "Milk adulteration test card analyzer", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 撮影前/撮影後の検査カード画像を解析して履歴に追加
    Analyze {
        /// 撮影前（乾いたカード）の画像
        #[arg(short, long)]
        before: PathBuf,

        /// 撮影後（牛乳を垂らしたカード）の画像
        #[arg(short, long)]
        after: PathBuf,

        /// タグ（例: "Morning Batch"）
        #[arg(short, long)]
        tag: Option<String>,

        /// 物質ごとの詳細を表示
        #[arg(long)]
        details: bool,

        /// PDFレポートの出力先ディレクトリ（指定時のみ出力）
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// 履歴を検索して一覧表示
    History {
        /// タグまたはIDの部分一致（大文字小文字を区別しない）
        #[arg(short, long, default_value = "")]
        search: String,

        /// ステータス (all/safe/unsafe)
        #[arg(long, default_value = "all")]
        status: StatusFilter,

        /// 表示件数
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// 履歴の1件を表示
    Show {
        /// テストID（例: MIL-0A1B2C3D4E5F）
        #[arg(required = true)]
        id: String,

        /// 物質ごとの詳細を表示
        #[arg(long)]
        details: bool,
    },

    /// 履歴の1件をPDFレポートに出力
    Report {
        #[arg(required = true)]
        id: String,

        /// 出力先ディレクトリ（デフォルト: カレント）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// テーマの表示/変更
    Theme {
        /// 設定するテーマ (light/dark)
        #[arg(long, conflicts_with = "toggle")]
        set: Option<Theme>,

        /// light/dark を切り替え
        #[arg(long)]
        toggle: bool,
    },

    /// 設定を表示/編集
    Config {
        /// APIキーを設定
        #[arg(long)]
        set_api_key: Option<String>,

        /// モデル名を設定
        #[arg(long)]
        model: Option<String>,

        /// 解析タイムアウト（秒）
        #[arg(long)]
        timeout: Option<u64>,

        /// 履歴の保存先ディレクトリ
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },

    /// 保存済みの履歴をすべて削除
    ClearHistory {
        /// 確認なしで削除
        #[arg(short, long)]
        yes: bool,
    },

    /// 対話モードで起動
    App {
        /// レポートの出力先ディレクトリ（デフォルト: カレント）
        #[arg(short, long)]
        reports: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_analyze() {
        let cli = Cli::parse_from([
            "milq", "analyze", "-b", "before.jpg", "-a", "after.jpg", "--tag", "Morning Batch",
        ]);
        match cli.command {
            Commands::Analyze { before, after, tag, details, report } => {
                assert_eq!(before, PathBuf::from("before.jpg"));
                assert_eq!(after, PathBuf::from("after.jpg"));
                assert_eq!(tag.as_deref(), Some("Morning Batch"));
                assert!(!details);
                assert!(report.is_none());
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_parse_history_filter() {
        let cli = Cli::parse_from(["milq", "history", "--status", "unsafe", "-s", "batch"]);
        match cli.command {
            Commands::History { search, status, limit } => {
                assert_eq!(search, "batch");
                assert_eq!(status, StatusFilter::Unsafe);
                assert!(limit.is_none());
            }
            _ => panic!("expected history"),
        }
    }

    #[test]
    fn test_theme_flags_conflict() {
        assert!(Cli::try_parse_from(["milq", "theme", "--set", "dark", "--toggle"]).is_err());
    }
}
