//! energydash - Daily energy consumption dashboard
//!
//! A terminal UI application that displays a day's energy consumption, demand
//! peaks, load curve and per-phase distribution fetched from the consumption API.

use std::io;
use std::panic;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};

use energydash::app::App;
use energydash::cache::{CacheManager, Clock, FileStore, KeyValueStore, MemoryStore, SystemClock};
use energydash::cli::{CacheLocation, Cli, StartupConfig};
use energydash::data::DailyConsumptionClient;
use energydash::{logging, ui};

/// Sets up a panic hook that restores the terminal before printing the panic message.
/// This ensures the terminal is usable even if the application panics.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Attempt to restore the terminal
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        // Call the original panic hook
        original_hook(panic_info);
    }));
}

/// Renders the dashboard and, when requested, the help overlay on top
fn render_ui(frame: &mut ratatui::Frame, app: &App) {
    ui::render_dashboard(frame, app);
    if app.show_help {
        ui::render_help_overlay(frame);
    }
}

/// Opens the key-value store for the configured cache location
fn open_store(location: &CacheLocation) -> Arc<dyn KeyValueStore> {
    match location {
        CacheLocation::Memory => Arc::new(MemoryStore::new()),
        CacheLocation::Dir(dir) => Arc::new(FileStore::with_dir(dir.clone())),
        CacheLocation::Default => match FileStore::new() {
            Some(store) => Arc::new(store),
            None => {
                warn!("no cache directory available, caching in memory only");
                Arc::new(MemoryStore::new())
            }
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Validate arguments before touching the terminal
    let config = match StartupConfig::from_cli(&cli, clock.now().date_naive()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(2);
        }
    };

    if let Some(ref path) = config.log_file {
        logging::init_file_logging(path)?;
    }
    info!(
        date = %config.initial_date,
        api_url = %config.api_url,
        cache = ?config.cache_location,
        "starting energydash"
    );

    let cache = CacheManager::new(open_store(&config.cache_location), Arc::clone(&clock))
        .with_max_entries(config.max_cache_entries);
    let client = DailyConsumptionClient::new(config.api_url.clone()).with_cache(cache);

    // Set up panic hook to restore terminal on crash
    setup_panic_hook();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app instance; this starts loading the initial day
    let mut app = App::new(client, clock, config.initial_date);

    // Main event loop
    loop {
        // Apply any finished load
        app.poll_loader();

        // Render UI
        terminal.draw(|f| render_ui(f, &app))?;

        // Poll for keyboard events with 100ms timeout
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        // Check if we should quit
        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    info!("energydash exited");
    Ok(())
}
