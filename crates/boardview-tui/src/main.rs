use std::fs::OpenOptions;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use boardview_core::wiki::Navigation;
use boardview_core::BoardViewModel;
use boardview_service::{BlockingBoardService, ServiceError};
use boardview_tui::app::App;
use boardview_tui::components::markdown;
use boardview_tui::config::{Command, Config};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let config = Config::parse();
    init_logging(&config)?;

    let service = BlockingBoardService::new(&config.endpoint, &config.wiki_base)
        .context("failed to create board service")?;
    tracing::info!(
        endpoint = %config.endpoint,
        wiki = service.wiki_source_name(),
        "boardview starting"
    );

    match &config.command {
        None => run_tui(Arc::new(service), &config),
        Some(Command::Board) => print_board(&service, &config),
        Some(Command::Wiki { page, markdown }) => print_page(&service, &config, page, *markdown),
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Subcommands log to stderr. The TUI owns the terminal, so it only logs
/// when a log file is given.
fn init_logging(config: &Config) -> Result<()> {
    if let Some(path) = &config.log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else if config.command.is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_writer(io::stderr)
            .init();
    }
    Ok(())
}

fn print_board(service: &BlockingBoardService, config: &Config) -> Result<()> {
    let request = config
        .connect_form()
        .to_request()
        .map_err(|e| anyhow::anyhow!("{e} (set --owner, --repo and --project-number)"))?;
    let snapshot = service
        .fetch_project(&request)
        .context("failed to fetch project board")?;
    let vm = BoardViewModel::build(&snapshot);

    let out = serde_json::json!({
        "title": snapshot.title,
        "fetched_at": snapshot.fetched_at.to_rfc3339(),
        "columns": vm,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn print_page(
    service: &BlockingBoardService,
    config: &Config,
    fragment: &str,
    raw: bool,
) -> Result<()> {
    let page = match config.navigator().resolve(fragment) {
        Navigation::Fetch(page) => page,
        Navigation::Unlisted(page) => bail!("{}", ServiceError::UnknownPage(page)),
    };
    let source = service.fetch_page(&page)?;
    if raw {
        print!("{source}");
    } else {
        print!("{}", markdown::to_html(&source));
    }
    Ok(())
}

fn run_tui(service: Arc<BlockingBoardService>, config: &Config) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, service, config);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        eprintln!("Error: {e}");
    }

    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    service: Arc<BlockingBoardService>,
    config: &Config,
) -> Result<()> {
    let mut app = App::new(service, config.app_config());

    loop {
        app.poll_outcomes();
        terminal.draw(|frame| app.render(frame))?;

        // Poll with a short timeout while fetches are in flight, block otherwise
        if app.needs_polling() && !event::poll(Duration::from_millis(100))? {
            continue;
        }

        if let Event::Key(key) = event::read()? {
            // Ctrl+C always quits
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                break;
            }
            // q quits unless we're in an input mode
            if key.code == KeyCode::Char('q') && !app.is_input_mode() {
                break;
            }
            app.handle_key(key);
        }
    }

    Ok(())
}
