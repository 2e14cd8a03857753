//! 対話モード
//!
//! 画面（Home / Results / History / Settings / About / Help / Contact）ごとに
//! メニューを出し、選ばれた操作を Session に渡す。

use crate::analyzer::VisionAnalyzer;
use crate::capture;
use crate::config::Config;
use crate::export::ReportRenderer;
use crate::session::Session;
use crate::store::KeyValueStore;
use crate::view;
use dialoguer::theme::{ColorfulTheme, SimpleTheme, Theme as PromptTheme};
use dialoguer::{Input, Select};
use indicatif::ProgressBar;
use milq_common::{Navigator, ResultView, Screen, StatusFilter, TestResult, Theme};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// メニュー操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    SetBefore,
    SetAfter,
    SetTag,
    Analyze,
    OpenRecent,
    OpenFromHistory,
    ReportFromHistory,
    ToggleView,
    DownloadReport,
    NewTest,
    Search,
    ToggleTheme,
    Go(Screen),
    Quit,
}

impl MenuAction {
    pub fn label(&self, navigator: &Navigator) -> String {
        let mark = |set: bool| if set { "✔" } else { "-" };
        match self {
            MenuAction::SetBefore => format!("[{}] Before photo (dry card)", mark(navigator.before_image().is_some())),
            MenuAction::SetAfter => format!("[{}] After photo (card with milk)", mark(navigator.after_image().is_some())),
            MenuAction::SetTag => match navigator.tag().trim() {
                "" => "Tag: (none)".to_string(),
                tag => format!("Tag: {}", tag),
            },
            MenuAction::Analyze => "Analyze".to_string(),
            MenuAction::OpenRecent => "Open a recent test".to_string(),
            MenuAction::OpenFromHistory => "Open a test".to_string(),
            MenuAction::ReportFromHistory => "Download a test report (PDF)".to_string(),
            MenuAction::ToggleView => match navigator.result_view() {
                ResultView::Summary => "Show details".to_string(),
                ResultView::Details => "Show summary".to_string(),
            },
            MenuAction::DownloadReport => "Download report (PDF)".to_string(),
            MenuAction::NewTest => "New test".to_string(),
            MenuAction::Search => "Search again".to_string(),
            MenuAction::ToggleTheme => "Toggle theme".to_string(),
            MenuAction::Go(screen) => format!("Go to {}", screen),
            MenuAction::Quit => "Quit".to_string(),
        }
    }
}

/// 画面ごとのメニュー項目
pub fn menu_for(navigator: &Navigator, has_history: bool) -> Vec<MenuAction> {
    let mut actions = match navigator.screen() {
        Screen::Home | Screen::Analyzing => {
            let mut actions = vec![MenuAction::SetBefore, MenuAction::SetAfter, MenuAction::SetTag];
            if navigator.can_analyze() {
                actions.push(MenuAction::Analyze);
            }
            if has_history {
                actions.push(MenuAction::OpenRecent);
            }
            actions
        }
        Screen::Results => vec![
            MenuAction::ToggleView,
            MenuAction::DownloadReport,
            MenuAction::NewTest,
        ],
        Screen::History if has_history => vec![
            MenuAction::Search,
            MenuAction::OpenFromHistory,
            MenuAction::ReportFromHistory,
        ],
        Screen::History => vec![MenuAction::Search],
        Screen::Settings => vec![MenuAction::ToggleTheme],
        Screen::About | Screen::Contact | Screen::Help => Vec::new(),
    };

    let current = navigator.screen();
    actions.extend(
        Screen::LATERAL
            .iter()
            .filter(|s| **s != current)
            .map(|s| MenuAction::Go(*s)),
    );
    actions.push(MenuAction::Quit);
    actions
}

fn prompt_theme(theme: Theme) -> Box<dyn PromptTheme> {
    match theme {
        Theme::Dark => Box::new(ColorfulTheme::default()),
        Theme::Light => Box::new(SimpleTheme),
    }
}

/// 対話セッションを実行
pub async fn run<A, S, R>(
    session: &mut Session<A, S, R>,
    config: &Config,
    reports_dir: &Path,
) -> anyhow::Result<()>
where
    A: VisionAnalyzer,
    S: KeyValueStore,
    R: ReportRenderer + Clone + Send + 'static,
{
    println!("🥛 MilQ - Milk Adulterant Test\n");
    let mut search = (String::new(), StatusFilter::All);

    loop {
        for notice in session.take_notices() {
            println!("⚠ {}", notice);
        }
        let ui = prompt_theme(session.theme());

        println!("\n== {} ==", session.screen());
        match session.screen() {
            Screen::Home | Screen::Analyzing => show_home(session),
            Screen::Results => show_result(session.navigator()),
            Screen::History => show_history(session, &search),
            Screen::Settings => {
                println!("Theme: {}", session.theme());
                println!("Model: {}", config.model);
            }
            Screen::About => println!("{}", view::render_about()),
            Screen::Help => println!("{}", view::render_help()),
            Screen::Contact => println!("{}", view::render_contact()),
        }

        let has_history = !session.recent().is_empty();
        let actions = menu_for(session.navigator(), has_history);
        let labels: Vec<String> = actions.iter().map(|a| a.label(session.navigator())).collect();
        let choice = Select::with_theme(&*ui)
            .items(&labels)
            .default(0)
            .interact()?;

        match &actions[choice] {
            MenuAction::SetBefore => {
                let image = prompt_image(&*ui, "Before photo path", config)?;
                session.set_before_image(image)?;
            }
            MenuAction::SetAfter => {
                let image = prompt_image(&*ui, "After photo path", config)?;
                session.set_after_image(image)?;
            }
            MenuAction::SetTag => {
                let tag: String = Input::with_theme(&*ui)
                    .with_prompt("Tag (e.g. Morning Batch)")
                    .allow_empty(true)
                    .with_initial_text(session.navigator().tag())
                    .interact_text()?;
                session.set_tag(tag)?;
            }
            MenuAction::Analyze => {
                let spinner = ProgressBar::new_spinner();
                spinner.set_message("Analyzing test card...");
                spinner.enable_steady_tick(Duration::from_millis(120));
                let outcome = session.analyze().await;
                spinner.finish_and_clear();
                if let Err(e) = outcome {
                    tracing::debug!("analysis failed: {}", e);
                }
            }
            MenuAction::OpenRecent => {
                if let Some(id) = pick_result(&*ui, &session.recent())? {
                    session.open_result(&id)?;
                }
            }
            MenuAction::OpenFromHistory => {
                let results = session.search(&search.0, search.1);
                if let Some(id) = pick_result(&*ui, &results)? {
                    session.open_result(&id)?;
                }
            }
            MenuAction::ReportFromHistory => {
                let results = session.search(&search.0, search.1);
                if let Some(id) = pick_result(&*ui, &results)? {
                    if let Some(result) = results.iter().find(|r| r.id == id) {
                        match session.export_report(result, reports_dir).await {
                            Ok(path) => println!("✔ Report saved: {}", path.display()),
                            Err(e) => println!("✖ {}", e),
                        }
                    }
                }
            }
            MenuAction::ToggleView => {
                let next = match session.navigator().result_view() {
                    ResultView::Summary => ResultView::Details,
                    ResultView::Details => ResultView::Summary,
                };
                session.select_view(next)?;
            }
            MenuAction::DownloadReport => match session.export_current(reports_dir).await {
                Ok(path) => println!("✔ Report saved: {}", path.display()),
                Err(e) => println!("✖ {}", e),
            },
            MenuAction::NewTest => session.reset()?,
            MenuAction::Search => search = prompt_search(&*ui, &search)?,
            MenuAction::ToggleTheme => {
                let theme = session.toggle_theme();
                println!("✔ Theme: {}", theme);
            }
            MenuAction::Go(screen) => {
                session.dismiss_error();
                session.navigate(*screen)?;
            }
            MenuAction::Quit => break,
        }
    }

    Ok(())
}

fn show_home<A, S, R>(session: &Session<A, S, R>)
where
    A: VisionAnalyzer,
    S: KeyValueStore,
    R: ReportRenderer + Clone + Send + 'static,
{
    if let Some(error) = session.navigator().error() {
        println!("✖ {}", error);
    }
    let recent = session.recent();
    if !recent.is_empty() {
        println!("Recent tests:");
        for result in &recent {
            println!("  {}", view::history_line(result));
        }
    }
}

fn show_result(navigator: &Navigator) {
    let Some(result) = navigator.current_result() else {
        return;
    };
    match navigator.result_view() {
        ResultView::Summary => println!("{}", view::render_summary(result)),
        ResultView::Details => println!("{}", view::render_details(result)),
    }
}

/// 現在の検索条件で一覧を表示
fn show_history<A, S, R>(session: &Session<A, S, R>, search: &(String, StatusFilter))
where
    A: VisionAnalyzer,
    S: KeyValueStore,
    R: ReportRenderer + Clone + Send + 'static,
{
    let results = session.search(&search.0, search.1);
    println!("Search: \"{}\"  Filter: {}", search.0, search.1);
    if results.is_empty() {
        println!("No tests found");
    }
    for result in &results {
        println!("  {}", view::history_line(result));
    }
}

/// 一覧から1件選ぶ（空ならNone）
fn pick_result(ui: &dyn PromptTheme, results: &[TestResult]) -> anyhow::Result<Option<String>> {
    if results.is_empty() {
        return Ok(None);
    }
    let rows: Vec<String> = results.iter().map(view::history_line).collect();
    let index = Select::with_theme(ui)
        .with_prompt("Select a test")
        .items(&rows)
        .default(0)
        .interact()?;
    Ok(Some(results[index].id.clone()))
}

fn prompt_search(
    ui: &dyn PromptTheme,
    current: &(String, StatusFilter),
) -> anyhow::Result<(String, StatusFilter)> {
    let text: String = Input::with_theme(ui)
        .with_prompt("Search tag or ID")
        .allow_empty(true)
        .with_initial_text(current.0.as_str())
        .interact_text()?;
    let filters: Vec<&str> = StatusFilter::VARIANTS.iter().map(|f| f.as_str()).collect();
    let index = Select::with_theme(ui)
        .with_prompt("Status")
        .items(&filters)
        .default(0)
        .interact()?;
    Ok((text, StatusFilter::VARIANTS[index]))
}

/// 画像パスを尋ねて取り込む。空入力でクリア
fn prompt_image(ui: &dyn PromptTheme, prompt: &str, config: &Config) -> anyhow::Result<Option<String>> {
    let path: String = Input::with_theme(ui)
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;
    if path.trim().is_empty() {
        return Ok(None);
    }
    match capture::load_image(&PathBuf::from(path.trim()), config.max_image_size) {
        Ok(image) => Ok(Some(image)),
        Err(e) => {
            println!("✖ {}", e);
            Ok(None)
        }
    }
}
