//! KPI Board - Terminal dashboard for spreadsheet-backed KPIs
//!
//! A TUI frontend with Kanagawa Dragon theme aesthetic, featuring a roadmap
//! of KPI delivery windows and achievement-level cards.

mod app;
mod theme;
mod timeline;
mod ui;

use std::fs::{self, File};
use std::io::{self, stdout};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use kpi_board::api::{ApiClient, ApiCommand, ApiMessage};
use kpi_board::config::{Config, Overrides};
use kpi_board::BoardView;

use app::App;

/// Poll interval for terminal input (approximately 30 FPS)
const FRAME_DURATION: Duration = Duration::from_millis(33);

/// Command-line arguments for kpi-board
#[derive(Parser, Debug)]
#[command(name = "kpi-board")]
#[command(about = "Terminal dashboard for KPI achievement levels and delivery roadmap")]
#[command(version)]
struct Args {
    /// Dashboard endpoint URL
    #[arg(short, long, env = "KPI_BOARD_URL")]
    url: Option<String>,

    /// Path to a TOML config file
    #[arg(short, long, env = "KPI_BOARD_CONFIG")]
    config: Option<PathBuf>,

    /// File that receives diagnostic logs
    #[arg(long, env = "KPI_BOARD_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// HTTP timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Fetch once and print the board as JSON instead of starting the UI
    #[arg(long)]
    print: bool,
}

/// Main entry point
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install().ok();

    let args = Args::parse();

    let config = Config::resolve(Overrides {
        endpoint: args.url,
        config_path: args.config,
        log_file: args.log_file,
        timeout_secs: args.timeout,
    })
    .context("Failed to load configuration")?;

    init_tracing(&config.log_file)?;
    info!(endpoint = %config.endpoint, "Starting KPI Board");

    if args.print {
        return print_board(&config).await;
    }

    run_tui(&config).await
}

/// Send diagnostics to a file; the terminal belongs to the UI
fn init_tracing(log_file: &Path) -> Result<()> {
    if let Some(parent) = log_file.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }
    let file = File::create(log_file)
        .with_context(|| format!("Failed to open log file {}", log_file.display()))?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "kpi_board=info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .init();

    Ok(())
}

/// Fetch once and write the computed board to stdout
async fn print_board(config: &Config) -> Result<()> {
    let client = ApiClient::new(config).context("Failed to create HTTP client")?;
    let data = client
        .fetch_dashboard()
        .await
        .with_context(|| format!("Failed to fetch dashboard from {}", client.endpoint()))?;

    let board = BoardView::build(&data, &config.formatter());
    let json = serde_json::to_string_pretty(&board).context("Failed to serialize board")?;
    println!("{}", json);
    Ok(())
}

/// Run the TUI application
async fn run_tui(config: &Config) -> Result<()> {
    let api_client = ApiClient::new(config).context("Failed to create HTTP client")?;

    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    // Create communication channels
    let (api_tx, mut api_rx) = mpsc::channel::<ApiMessage>(32);
    let (cmd_tx, cmd_rx) = mpsc::channel::<ApiCommand>(32);

    let api_task = tokio::spawn(run_api_worker(api_client, api_tx, cmd_rx));

    // Initial load
    cmd_tx.send(ApiCommand::Refresh).await.ok();

    let mut app = App::new(config.formatter(), config.sheet_url.clone());

    let result = run_event_loop(&mut terminal, &mut app, &mut api_rx, &cmd_tx).await;

    // Cleanup
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    api_task.abort();
    info!("KPI Board stopped");

    result
}

/// Run the API worker task
async fn run_api_worker(
    client: ApiClient,
    tx: mpsc::Sender<ApiMessage>,
    mut rx: mpsc::Receiver<ApiCommand>,
) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            ApiCommand::Refresh => {
                let message = match client.fetch_dashboard().await {
                    Ok(data) => ApiMessage::DashboardLoaded(data),
                    Err(e) => {
                        error!(error = %e, "Dashboard refresh failed");
                        ApiMessage::FetchFailed(e.to_string())
                    }
                };
                if tx.send(message).await.is_err() {
                    break;
                }
            }
            ApiCommand::Shutdown => break,
        }
    }
}

/// Run the main event loop
async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    api_rx: &mut mpsc::Receiver<ApiMessage>,
    cmd_tx: &mpsc::Sender<ApiCommand>,
) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        // Check for API messages (non-blocking)
        while let Ok(msg) = api_rx.try_recv() {
            app.handle_api_message(msg);
        }

        // Handle input events with timeout so API messages are picked up
        if event::poll(FRAME_DURATION)? {
            if let Event::Key(key) = event::read()? {
                // Only handle key press events (not release)
                if key.kind == KeyEventKind::Press {
                    if let Some(cmd) = app.handle_key(key) {
                        cmd_tx.send(cmd).await.ok();
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
