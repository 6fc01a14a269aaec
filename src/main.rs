use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::Event,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;

use portfolio_pulse::config::Settings;
use portfolio_pulse::ui::Theme;
use portfolio_pulse::{events, logging, ui, App, EventStreamSource, SystemClock};

/// How often the loop wakes to drain the transport and fire timers.
const TICK: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(name = "portfolio-pulse")]
#[command(about = "Terminal dashboard for a live portfolio value event stream")]
struct Args {
    /// Settings file (TOML). Defaults to ./portfolio-pulse.toml if present
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Event-stream URL, overriding the settings file
    #[arg(short, long)]
    url: Option<String>,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Run without the terminal UI, logging to stderr
    #[arg(long)]
    headless: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(url) = args.url {
        settings.stream.url = url;
    }
    if let Some(path) = args.log_file {
        settings.logging.file = Some(path);
    }
    settings.validate()?;

    logging::init(&settings.logging, args.headless)?;

    // The stream task runs on the runtime's workers; the UI stays on this thread
    let rt = tokio::runtime::Runtime::new()?;
    let _guard = rt.enter();

    let source = EventStreamSource::spawn(&settings.stream.url, settings.stream.options())?;
    info!(url = %settings.stream.url, headless = args.headless, "Starting portfolio-pulse");

    let app = App::new(Box::new(source), Arc::new(SystemClock), &settings);

    if args.headless {
        rt.block_on(run_headless(app))
    } else {
        run_tui(app.with_theme(Theme::auto_detect()))
    }
}

/// Drive the app without a terminal until interrupted.
async fn run_headless(mut app: App) -> Result<()> {
    let mut interval = tokio::time::interval(TICK);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    while app.running {
        tokio::select! {
            _ = interval.tick() => {
                app.pump();
            }
            _ = &mut ctrl_c => {
                info!("Interrupted, shutting down");
                app.quit();
            }
        }
    }
    Ok(())
}

/// Run the TUI until the user quits
fn run_tui(mut app: App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    while app.running {
        app.pump();

        terminal.draw(|frame| ui::render(frame, app))?;

        if let Some(Event::Key(key)) = events::poll_event(TICK)? {
            events::handle_key_event(app, key);
        }
    }

    Ok(())
}
