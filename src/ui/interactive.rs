use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use std::time::{Duration, Instant};

use crate::core::shot_clock::ShotClock;
use crate::core::view::{IntentOutcome, MatchClockView, ViewOptions};
use crate::engine::ClockPhase;
use crate::renderer::FaceStyle;
use crate::shared::constants;
use crate::store::{MatchId, MatchStore};
use crate::sync::{Clock, SystemClock, Ticker};
use crate::ui::terminal::{restore_terminal, setup_terminal, UiTerminal};

#[derive(Debug, Clone, Copy)]
pub struct WatchOptions {
    pub view: ViewOptions,
    /// Full time of the shot clock panel; `None` hides it.
    pub shot_clock: Option<u32>,
    pub face: FaceStyle,
}

/// Screen-local state next to the mounted view.
struct ClockScreen {
    face: FaceStyle,
    shot: Option<ShotClock>,
    shot_ticker: Option<Ticker>,
    status: String,
    should_quit: bool,
}

impl ClockScreen {
    fn new(options: &WatchOptions) -> Self {
        Self {
            face: options.face,
            shot: options.shot_clock.map(ShotClock::new),
            shot_ticker: None,
            status: String::new(),
            should_quit: false,
        }
    }

    fn on_key<S: MatchStore, C: Clock>(
        &mut self,
        key: KeyCode,
        view: &mut MatchClockView<S, C>,
        at: Instant,
    ) {
        match key {
            KeyCode::Esc | KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char(' ') | KeyCode::Char('p') => {
                let outcome = view.toggle_pause();
                self.report(outcome, view);
            }
            KeyCode::Char('r') => {
                let outcome = view.reset();
                self.report(outcome, view);
            }
            KeyCode::Char('f') => {
                view.clear_error();
                view.refresh();
                self.status = match view.last_error() {
                    Some(err) => err.to_string(),
                    None => "refreshed".to_string(),
                };
            }
            KeyCode::Char('s') => {
                if let Some(shot) = self.shot.as_mut() {
                    shot.toggle();
                    self.sync_shot_ticker(at);
                }
            }
            KeyCode::Char('x') => {
                if let Some(shot) = self.shot.as_mut() {
                    shot.reset();
                    // A reset always restarts the second boundary.
                    self.shot_ticker = None;
                    self.sync_shot_ticker(at);
                }
            }
            _ => {}
        }
    }

    fn report<S: MatchStore, C: Clock>(&mut self, outcome: IntentOutcome, view: &MatchClockView<S, C>) {
        self.status = match outcome {
            IntentOutcome::Committed(transition) => format!("{} saved", transition),
            IntentOutcome::Ignored => "read-only view".to_string(),
            IntentOutcome::Failed => match view.last_error() {
                Some(err) if err.is_recoverable() => format!("{} (press again to retry)", err),
                Some(err) => err.to_string(),
                None => "not saved".to_string(),
            },
        };
    }

    fn sync_shot_ticker(&mut self, at: Instant) {
        let running = self.shot.as_ref().is_some_and(ShotClock::is_running);
        match (running, self.shot_ticker.is_some()) {
            (true, false) => self.shot_ticker = Some(Ticker::new(constants::TICK_PERIOD, at)),
            (false, true) => self.shot_ticker = None,
            _ => {}
        }
    }

    fn poll_shot_clock(&mut self, at: Instant) {
        let (Some(shot), Some(ticker)) = (self.shot.as_mut(), self.shot_ticker.as_mut()) else {
            return;
        };
        if ticker.poll(at) {
            shot.tick();
        }
        self.sync_shot_ticker(at);
    }

    fn time_until_shot_tick(&self, at: Instant) -> Option<Duration> {
        self.shot_ticker.as_ref().map(|t| t.time_until_next(at))
    }
}

/// Open the full-screen clock for `match_id` until the user quits.
pub fn run_match_clock<S: MatchStore>(store: S, match_id: MatchId, options: WatchOptions) -> Result<()> {
    let mut view = MatchClockView::mount(store, match_id, SystemClock, options.view)
        .with_context(|| format!("cannot open match {}", match_id))?;
    let mut screen = ClockScreen::new(&options);

    crate::utils::logger::info(&format!(
        "watching match {} (read_only={}, shot_clock={:?})",
        match_id, options.view.read_only, options.shot_clock
    ));

    let mut terminal = setup_terminal()?;
    let run_result = run_loop(&mut terminal, &mut view, &mut screen);
    let restore_result = restore_terminal(&mut terminal);
    view.detach();

    if let Err(err) = restore_result {
        crate::utils::logger::error(&format!("Failed to restore terminal: {}", err));
    }

    run_result
}

fn run_loop<S: MatchStore, C: Clock>(
    terminal: &mut UiTerminal,
    view: &mut MatchClockView<S, C>,
    screen: &mut ClockScreen,
) -> Result<()> {
    loop {
        terminal.draw(|frame| draw_clock(frame, view, screen))?;

        if screen.should_quit {
            break;
        }

        let now = Instant::now();
        let wait = [
            view.time_until_next_event(),
            screen.time_until_shot_tick(now),
            Some(constants::INPUT_POLL_CAP),
        ]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(constants::INPUT_POLL_CAP);

        if event::poll(wait)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    screen.on_key(key.code, view, Instant::now());
                }
            }
        }

        view.poll();
        screen.poll_shot_clock(Instant::now());
    }

    Ok(())
}

fn draw_clock<S: MatchStore, C: Clock>(
    frame: &mut Frame<'_>,
    view: &MatchClockView<S, C>,
    screen: &ClockScreen,
) {
    let area = frame.size();

    let mut title = vec![Span::styled(
        format!(" {} | Match {} ", constants::APP_NAME, view.match_id()),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )];
    if view.is_read_only() {
        title.push(Span::styled(
            " READ-ONLY ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        ));
    }
    let block = Block::default().borders(Borders::ALL).title(Line::from(title));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let shot_height = if screen.shot.is_some() {
        screen.face.height() + 4
    } else {
        0
    };

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(screen.face.height() + 2),
            Constraint::Length(2),
            Constraint::Length(shot_height),
            Constraint::Length(2),
        ])
        .split(inner);

    draw_face(frame, layout[0], view, screen.face);
    draw_status(frame, layout[1], view, &screen.status);
    if let Some(shot) = screen.shot.as_ref() {
        draw_shot_clock(frame, layout[2], shot, screen.face);
    }
    draw_footer(frame, layout[3], view.controls_visible(), screen.shot.is_some());
}

fn draw_face<S: MatchStore, C: Clock>(
    frame: &mut Frame<'_>,
    area: Rect,
    view: &MatchClockView<S, C>,
    face: FaceStyle,
) {
    let color = match view.phase() {
        ClockPhase::Running => Color::Red,
        ClockPhase::Paused => Color::Yellow,
    };
    let style = Style::default().fg(color).add_modifier(Modifier::BOLD);

    let text = view.formatted();
    let glyph_lines = face.fitting(&text, area.width).lines(&text);
    let top_pad = area.height.saturating_sub(glyph_lines.len() as u16) / 2;

    let mut lines: Vec<Line<'_>> = (0..top_pad).map(|_| Line::from("")).collect();
    lines.extend(glyph_lines.into_iter().map(|l| Line::from(Span::styled(l, style))));

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}

fn draw_status<S: MatchStore, C: Clock>(
    frame: &mut Frame<'_>,
    area: Rect,
    view: &MatchClockView<S, C>,
    status: &str,
) {
    let phase_style = match view.phase() {
        ClockPhase::Running => Style::default().fg(Color::Green),
        ClockPhase::Paused => Style::default().fg(Color::Yellow),
    };
    let mut spans = vec![Span::styled(
        view.phase().label(),
        phase_style.add_modifier(Modifier::BOLD),
    )];

    if let Some(err) = view.last_error() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(err.to_string(), Style::default().fg(Color::Red)));
    } else if !status.is_empty() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(status.to_string(), Style::default().fg(Color::White)));
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn draw_shot_clock(frame: &mut Frame<'_>, area: Rect, shot: &ShotClock, face: FaceStyle) {
    let color = if shot.is_warning() { Color::Red } else { Color::Green };
    let label = if shot.is_running() { "Shot Clock" } else { "Shot Clock (stopped)" };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(Span::styled(label, Style::default().fg(color)));

    let text = format!("{:02}", shot.time_left());
    let lines: Vec<Line<'_>> = face
        .fitting(&text, area.width.saturating_sub(2))
        .lines(&text)
        .into_iter()
        .map(|l| Line::from(Span::styled(l, Style::default().fg(color).add_modifier(Modifier::BOLD))))
        .collect();

    let paragraph = Paragraph::new(lines).alignment(Alignment::Center).block(block);
    frame.render_widget(paragraph, area);
}

fn draw_footer(frame: &mut Frame<'_>, area: Rect, controls: bool, shot: bool) {
    let mut keys = String::new();
    if controls {
        keys.push_str("[Space] pause/resume  [r] reset  ");
    }
    if shot {
        keys.push_str("[s] shot start/stop  [x] shot reset  ");
    }
    keys.push_str("[f] refresh  [q] quit");

    let footer = Paragraph::new(Line::from(Span::styled(keys, Style::default().fg(Color::DarkGray))))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, area);
}
