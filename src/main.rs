use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use eventy::api::FeedClient;
use eventy::app::App;
use eventy::calendar::LayoutOptions;
use eventy::commands::{handle_calendar_command, CalendarCommands, CommandContext};
use eventy::config::DataDir;

#[derive(Parser, Debug)]
#[command(name = "eventy")]
#[command(about = "Month calendar of timed game events in the terminal", long_about = None)]
struct Args {
    /// Events feed base URL
    #[arg(long, default_value = "http://localhost:8000", global = true)]
    feed_url: String,

    /// Directory for settings, the events cache and the log file
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Fixed display offset from UTC in minutes (defaults to the local offset)
    #[arg(long, global = true, allow_hyphen_values = true)]
    utc_offset: Option<i32>,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "10", global = true)]
    timeout: u64,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open the interactive month view
    #[command(name = "calendar", alias = "tui")]
    Calendar,

    #[command(flatten)]
    Query(CalendarCommands),
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let data_dir = args
        .data_dir
        .clone()
        .map(DataDir::new)
        .unwrap_or_else(DataDir::default_location);

    let display_offset = match args.utc_offset {
        Some(minutes) => LayoutOptions::offset_from_minutes(minutes)
            .with_context(|| format!("UTC offset out of range: {} minutes", minutes))?,
        None => LayoutOptions::local_offset(),
    };

    match args.command {
        Some(Commands::Query(cmd)) => {
            init_logging(&data_dir, false)?;
            let ctx = CommandContext {
                feed_url: args.feed_url,
                timeout_secs: args.timeout,
                data_dir,
                display_offset,
            };
            handle_calendar_command(cmd, &ctx).await?;
        }

        // Month view (default)
        Some(Commands::Calendar) | None => {
            init_logging(&data_dir, true)?;
            let client = FeedClient::new(args.feed_url, args.timeout)?;
            run_tui(App::new(client, data_dir, display_offset)).await?;
        }
    }

    Ok(())
}

/// Log to stderr for one-shot commands; to a file while the terminal UI owns the screen.
fn init_logging(data_dir: &DataDir, to_file: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if to_file {
        data_dir.ensure().context("Failed to create data directory")?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(data_dir.log_file())
            .context("Failed to open log file")?;

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }

    Ok(())
}

async fn run_tui(mut app: App) -> Result<()> {
    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = app.run(&mut terminal).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}
