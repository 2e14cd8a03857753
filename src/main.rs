use clap::Parser;
use dialoguer::Confirm;
use milq::analyzer::GeminiAnalyzer;
use milq::cli::{Cli, Commands};
use milq::config::Config;
use milq::error::MilqError;
use milq::export::{export_report, PdfRenderer, ReportGate};
use milq::orchestrator::Orchestrator;
use milq::session::Session;
use milq::store::{FileStore, StateStore};
use milq::{app, capture, view};
use milq_common::query;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

fn open_store(config: &Config) -> milq::error::Result<StateStore<FileStore>> {
    Ok(StateStore::new(FileStore::new(config.data_dir()?)))
}

fn build_orchestrator(config: &Config) -> milq::error::Result<Orchestrator<GeminiAnalyzer, FileStore>> {
    let analyzer = GeminiAnalyzer::new(config.get_api_key()?, config.model.clone());
    Ok(Orchestrator::new(analyzer, open_store(config)?).with_timeout(config.timeout()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::load()?;

    match cli.command {
        Commands::Analyze { before, after, tag, details, report } => {
            println!("🥛 MilQ - Test card analysis\n");

            println!("[1/3] Loading photos...");
            let before_image = capture::load_image(&before, config.max_image_size)?;
            let after_image = capture::load_image(&after, config.max_image_size)?;
            println!("✔ Loaded {} and {}\n", before.display(), after.display());

            println!("[2/3] Analyzing test card...");
            let orchestrator = build_orchestrator(&config)?;
            let result = match orchestrator
                .run_analysis(&before_image, &after_image, tag.as_deref())
                .await
            {
                Ok(result) => result,
                Err(e) => {
                    println!("✖ {}", e.user_message());
                    return Err(MilqError::from(e).into());
                }
            };
            if let Some(warning) = orchestrator.take_persistence_warning() {
                println!("⚠ Result kept for this run only: {}", warning);
            }
            println!("✔ Analysis complete\n");

            if details {
                println!("{}", view::render_details(&result));
            } else {
                println!("{}", view::render_summary(&result));
            }

            if let Some(dir) = report {
                println!("[3/3] Writing report...");
                let path = export_report(&ReportGate::new(), &PdfRenderer, &result, &dir).await?;
                println!("✔ Report saved: {}", path.display());
            }
        }

        Commands::History { search, status, limit } => {
            let history = open_store(&config)?.load_history();
            let matches = query(&history, &search, status);
            if matches.is_empty() {
                println!("No tests found");
            }
            for result in matches.iter().take(limit.unwrap_or(usize::MAX)) {
                println!("{}  {}", result.id, view::history_line(result));
            }
        }

        Commands::Show { id, details } => {
            let history = open_store(&config)?.load_history();
            let result = history
                .iter()
                .find(|r| r.id == id)
                .ok_or_else(|| MilqError::ResultNotFound(id.clone()))?;
            if details {
                println!("{}", view::render_details(result));
            } else {
                println!("{}", view::render_summary(result));
            }
        }

        Commands::Report { id, output } => {
            let history = open_store(&config)?.load_history();
            let result = history
                .iter()
                .find(|r| r.id == id)
                .ok_or_else(|| MilqError::ResultNotFound(id.clone()))?;
            let dir = output.unwrap_or_else(|| PathBuf::from("."));
            let path = export_report(&ReportGate::new(), &PdfRenderer, result, &dir).await?;
            println!("✔ Report saved: {}", path.display());
        }

        Commands::Theme { set, toggle } => {
            let store = open_store(&config)?;
            let current = store.load_theme();
            let next = match (set, toggle) {
                (Some(theme), _) => Some(theme),
                (None, true) => Some(current.toggled()),
                (None, false) => None,
            };
            match next {
                Some(theme) => {
                    store.save_theme(theme)?;
                    println!("✔ Theme: {}", theme);
                }
                None => println!("Theme: {}", current),
            }
        }

        Commands::Config { set_api_key, model, timeout, data_dir, show } => {
            let mut config = config;
            let mut changed = false;

            if let Some(key) = set_api_key {
                config.set_api_key(key)?;
                println!("✔ API key saved");
            }
            if let Some(model) = model {
                config.model = model;
                changed = true;
            }
            if let Some(seconds) = timeout {
                config.timeout_seconds = seconds;
                changed = true;
            }
            if let Some(dir) = data_dir {
                config.data_dir = Some(dir);
                changed = true;
            }
            if changed {
                config.save()?;
                println!("✔ Config saved: {}", Config::config_path()?.display());
            }

            if show {
                println!("Config:");
                println!("  Model: {}", config.model);
                println!("  Max image size: {}px", config.max_image_size);
                println!("  Timeout: {}s", config.timeout_seconds);
                println!("  Data dir: {}", config.data_dir()?.display());
                println!(
                    "  API key: {}",
                    if config.get_api_key().is_ok() { "set" } else { "not set" }
                );
            }
        }

        Commands::ClearHistory { yes } => {
            let confirmed = yes
                || Confirm::new()
                    .with_prompt("Delete all saved tests?")
                    .default(false)
                    .interact()?;
            if confirmed {
                open_store(&config)?.clear_history()?;
                println!("✔ History cleared");
            }
        }

        Commands::App { reports } => {
            let orchestrator = build_orchestrator(&config)?;
            let mut session = Session::new(orchestrator, PdfRenderer);
            let reports_dir = reports.unwrap_or_else(|| PathBuf::from("."));
            app::run(&mut session, &config, &reports_dir).await?;
        }
    }

    Ok(())
}
