use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::io::{self, Write};

use crate::core::view::{MatchClockView, ViewOptions};
use crate::shared::constants;
use crate::store::{MatchId, MatchStore};
use crate::sync::{Clock, SystemClock};

/// Print a read-only clock line on stdout until Ctrl-C.
pub fn run_follow<S: MatchStore>(store: S, match_id: MatchId, options: ViewOptions) -> Result<()> {
    let options = ViewOptions {
        read_only: true,
        ..options
    };
    let mut view = MatchClockView::mount(store, match_id, SystemClock, options)
        .with_context(|| format!("cannot open match {}", match_id))?;

    let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
    ctrlc::set_handler(move || {
        let _ = stop_tx.try_send(());
    })
    .context("failed to install Ctrl-C handler")?;

    crate::utils::logger::info(&format!("following match {}", match_id));

    let mut stdout = io::stdout();
    follow_loop(&mut view, &stop_rx, &mut stdout)?;
    writeln!(stdout)?;

    view.detach();
    Ok(())
}

fn follow_loop<S: MatchStore, C: Clock, W: Write>(
    view: &mut MatchClockView<S, C>,
    stop: &Receiver<()>,
    out: &mut W,
) -> Result<()> {
    let mut last_line = String::new();

    loop {
        let line = follow_line(view);
        if line != last_line {
            write!(out, "\r{}", line)?;
            out.flush()?;
            last_line = line;
        }

        let wait = view
            .time_until_next_event()
            .unwrap_or(constants::TICK_PERIOD);

        match stop.recv_timeout(wait) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                view.poll();
            }
        }
    }

    Ok(())
}

fn follow_line<S: MatchStore, C: Clock>(view: &MatchClockView<S, C>) -> String {
    let mut line = format!(
        "Match {}  {}  {:<7}",
        view.match_id(),
        view.formatted(),
        view.phase().label()
    );
    if let Some(err) = view.last_error() {
        line.push_str(&format!("  ({})", err));
    }
    line
}
