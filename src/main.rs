mod app;
mod config;
mod logbook;
mod ui;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::{stdout, Stdout};
use std::path::PathBuf;
use std::time::Duration;

use crate::app::App;
use crate::config::CliOverrides;

fn main() -> Result<()> {
    let overrides = match parse_args() {
        Some(overrides) => overrides,
        None => {
            print_usage();
            return Ok(());
        }
    };
    let config = config::load_config(&overrides)?;
    let mut app = App::new(config);

    enable_raw_mode().context("Failed to enable raw mode")?;
    stdout()
        .execute(EnterAlternateScreen)
        .context("Failed to enter alternate screen")?;
    let mut terminal =
        Terminal::new(CrosstermBackend::new(stdout())).context("Failed to create terminal")?;

    let result = run(&mut terminal, &mut app);

    // Restore the terminal even when the loop errored out.
    stdout().execute(LeaveAlternateScreen).ok();
    disable_raw_mode().ok();
    result
}

fn run(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    while !app.quit {
        terminal
            .draw(|frame| ui::render(frame, app))
            .context("Failed to draw frame")?;
        if !event::poll(Duration::from_millis(200)).context("Failed to poll for input")? {
            continue;
        }
        match event::read().context("Failed to read input event")? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                app.handle_key(key.code, key.modifiers);
            }
            _ => {}
        }
    }
    Ok(())
}

fn parse_args() -> Option<CliOverrides> {
    let mut overrides = CliOverrides::default();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--log-file" => overrides.log_path = Some(PathBuf::from(args.next()?)),
            "--config" => overrides.config_path = Some(PathBuf::from(args.next()?)),
            _ => return None,
        }
    }
    Some(overrides)
}

fn print_usage() {
    println!("Usage: typetrace [--log-file PATH] [--config PATH]");
    println!();
    println!("Records keys typed into its own window while logging is active.");
    println!("  --log-file PATH  Write log entries to PATH (default: {})", config::DEFAULT_LOG_FILE);
    println!("  --config PATH    Use PATH as the config file (default: {})", config::CONFIG_FILE);
}
