use anyhow::{Context, Result};
use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;

pub type UiTerminal = Terminal<CrosstermBackend<io::Stderr>>;

pub fn setup_terminal() -> Result<UiTerminal> {
    enable_raw_mode().context("failed to enable raw mode")?;

    let mut stderr = io::stderr();
    execute!(stderr, EnterAlternateScreen, Hide).context("failed to switch to alternate screen")?;

    let backend = CrosstermBackend::new(stderr);
    let terminal = Terminal::new(backend).context("failed to initialize terminal backend")?;

    Ok(terminal)
}

pub fn restore_terminal(terminal: &mut UiTerminal) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, Show)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}
