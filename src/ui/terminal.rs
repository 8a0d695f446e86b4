use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use log::{debug, error};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::store::Store;

use super::app::App;

type Backend = CrosstermBackend<Stdout>;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Take over the terminal, run the draw/input loop until the user quits and
/// restore the terminal afterwards, also when the loop fails.
pub fn run_app<S: Store>(app: &mut App<S>) -> Result<()> {
    let mut stdout = io::stdout();
    enable_raw_mode().context("failed to enable raw mode")?;
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    debug!("event=terminal_enter");

    let result = event_loop(&mut terminal, app);
    if let Err(err) = &result {
        error!("event=event_loop status=error error={err:#}");
    }

    cleanup_terminal(&mut terminal)?;
    result
}

fn event_loop<S: Store>(terminal: &mut Terminal<Backend>, app: &mut App<S>) -> Result<()> {
    loop {
        terminal
            .draw(|frame| app.draw(frame))
            .context("failed to draw frame")?;

        if !event::poll(POLL_INTERVAL).context("event polling failed")? {
            continue;
        }
        if let Event::Key(key_event) = event::read().context("failed to read event")? {
            if key_event.kind == KeyEventKind::Press && dispatch_key(app, key_event)? {
                return Ok(());
            }
        }
    }
}

/// Control chords go to [`App::handle_ctrl`]; everything else to
/// [`App::handle_key`]. Returns `true` when the app asked to exit.
fn dispatch_key<S: Store>(app: &mut App<S>, key_event: KeyEvent) -> Result<bool> {
    if key_event.modifiers.contains(KeyModifiers::CONTROL) {
        if let KeyCode::Char(ch) = key_event.code {
            return app.handle_ctrl(ch.to_ascii_lowercase());
        }
    }
    app.handle_key(key_event.code)
}

fn cleanup_terminal(terminal: &mut Terminal<Backend>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal
        .show_cursor()
        .context("failed to restore cursor visibility")
}
