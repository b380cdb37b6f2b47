use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use std::time::Duration;

use crate::engine::{derive_remaining, ClockPhase};
use crate::shared::constants;
use crate::store::{MatchId, MatchState, MatchStore};
use crate::ui::terminal::{restore_terminal, setup_terminal, UiTerminal};
use crate::utils::time_utils;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Splash,
    Match,
    Mode,
    ShotClock,
    Confirm,
}

impl Step {
    fn title(self) -> &'static str {
        match self {
            Step::Splash => "Start",
            Step::Match => "Match",
            Step::Mode => "Mode",
            Step::ShotClock => "Shot clock",
            Step::Confirm => "Confirm",
        }
    }

    fn progress(self) -> &'static str {
        match self {
            Step::Splash => "0/4",
            Step::Match => "1/4",
            Step::Mode => "2/4",
            Step::ShotClock => "3/4",
            Step::Confirm => "4/4",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuSelection {
    pub match_id: MatchId,
    pub read_only: bool,
    /// Full time of the shot clock, when enabled.
    pub shot_clock: Option<u32>,
}

struct MenuApp {
    step: Step,
    status: String,
    should_quit: bool,
    matches: Vec<MatchState>,
    listed_at: DateTime<Utc>,
    shot_clock_secs: u32,
    match_index: usize,
    mode_index: usize,
    shot_index: usize,
    selection: Option<MenuSelection>,
}

impl MenuApp {
    fn new(matches: Vec<MatchState>, listed_at: DateTime<Utc>, shot_clock_secs: u32) -> Self {
        Self {
            step: Step::Splash,
            status: "Enter to start, Esc to quit".to_string(),
            should_quit: false,
            matches,
            listed_at,
            shot_clock_secs,
            match_index: 0,
            mode_index: 0,
            shot_index: 0,
            selection: None,
        }
    }

    fn on_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.should_quit = true;
                return;
            }
            _ => {}
        }

        match self.step {
            Step::Splash => {
                if key == KeyCode::Enter {
                    self.step = Step::Match;
                    self.status = "Choose the match to open".to_string();
                }
            }
            Step::Match => {
                let len = self.matches.len();
                if move_selection(&mut self.match_index, len, key) {
                    self.step = Step::Mode;
                    self.status = "Control the clock or only watch it".to_string();
                }
            }
            Step::Mode => {
                if move_selection(&mut self.mode_index, constants::MENU_MODE_LABELS.len(), key) {
                    self.step = Step::ShotClock;
                    self.status = format!("Shot clock runs locally from {}s", self.shot_clock_secs);
                }
            }
            Step::ShotClock => {
                if move_selection(&mut self.shot_index, constants::MENU_SHOT_CLOCK_LABELS.len(), key) {
                    self.step = Step::Confirm;
                    self.status = "Enter to open, Backspace to go back".to_string();
                }
            }
            Step::Confirm => self.handle_confirm(key),
        }
    }

    fn handle_confirm(&mut self, key: KeyCode) {
        match key {
            KeyCode::Backspace => {
                self.step = Step::ShotClock;
                self.status = "Choose the shot clock setting again".to_string();
            }
            KeyCode::Enter => {
                let Some(chosen) = self.matches.get(self.match_index) else {
                    self.status = "No match to open".to_string();
                    self.should_quit = true;
                    return;
                };

                self.selection = Some(MenuSelection {
                    match_id: chosen.match_id,
                    read_only: self.mode_index == 1,
                    shot_clock: (self.shot_index == 0).then_some(self.shot_clock_secs),
                });
                self.should_quit = true;
            }
            _ => {}
        }
    }

    fn match_label(&self, state: &MatchState) -> String {
        format!(
            "Match {}  {}  {}",
            state.match_id,
            time_utils::format_clock(derive_remaining(state, self.listed_at)),
            ClockPhase::of(state).label()
        )
    }
}

/// Up/down within `len` items. Returns true when Enter confirms.
fn move_selection(index: &mut usize, len: usize, key: KeyCode) -> bool {
    match key {
        KeyCode::Up | KeyCode::Char('k') => {
            *index = index.saturating_sub(1);
            false
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if *index + 1 < len {
                *index += 1;
            }
            false
        }
        KeyCode::Enter => len > 0,
        _ => false,
    }
}

/// Walk the user through picking a match. `None` when they quit.
pub fn run_menu<S: MatchStore>(store: &S, shot_clock_secs: u32) -> Result<Option<MenuSelection>> {
    let matches = store.list().context("failed to list matches")?;

    if matches.is_empty() {
        eprintln!("No matches yet. Create one with `cueclock new`.");
        return Ok(None);
    }

    let mut app = MenuApp::new(matches, Utc::now(), shot_clock_secs);

    let mut terminal = setup_terminal()?;
    let run_result = run_app(&mut terminal, &mut app);
    let restore_result = restore_terminal(&mut terminal);

    if let Err(err) = restore_result {
        crate::utils::logger::error(&format!("Failed to restore terminal from menu: {}", err));
    }

    run_result?;

    Ok(app.selection)
}

fn run_app(terminal: &mut UiTerminal, app: &mut MenuApp) -> Result<()> {
    loop {
        terminal.draw(|frame| draw_menu(frame, app))?;

        if app.should_quit {
            break;
        }

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key.code);
                }
            }
        }
    }

    Ok(())
}

fn draw_menu(frame: &mut Frame<'_>, app: &MenuApp) {
    let area = frame.size();

    let block = Block::default().borders(Borders::ALL).title(Span::styled(
        format!(
            " {} | {} ({}) ",
            constants::APP_NAME,
            app.step.title(),
            app.step.progress()
        ),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7),
            Constraint::Min(8),
            Constraint::Length(3),
        ])
        .split(inner);

    draw_logo(frame, layout[0]);

    match app.step {
        Step::Splash => draw_splash(frame, layout[1]),
        Step::Match => draw_match_list(frame, layout[1], app),
        Step::Mode => draw_labels(frame, layout[1], "View mode", constants::MENU_MODE_LABELS, app.mode_index),
        Step::ShotClock => draw_labels(
            frame,
            layout[1],
            "Shot clock",
            constants::MENU_SHOT_CLOCK_LABELS,
            app.shot_index,
        ),
        Step::Confirm => draw_confirm(frame, layout[1], app),
    }

    draw_footer(frame, layout[2], &app.status);
}

fn draw_logo(frame: &mut Frame<'_>, area: Rect) {
    let lines: Vec<Line<'_>> = constants::MENU_LOGO
        .iter()
        .map(|line| {
            Line::from(Span::styled(
                *line,
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ))
        })
        .collect();

    let logo = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(logo, area);
}

fn draw_splash(frame: &mut Frame<'_>, area: Rect) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "Match clock",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Enter: start"),
        Line::from("Esc / q: quit"),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });

    frame.render_widget(content, area);
}

fn draw_match_list(frame: &mut Frame<'_>, area: Rect, app: &MenuApp) {
    let items: Vec<ListItem<'_>> = app
        .matches
        .iter()
        .map(|state| ListItem::new(app.match_label(state)))
        .collect();

    draw_select_list(frame, area, "Matches", items, app.match_index);
}

fn draw_labels(frame: &mut Frame<'_>, area: Rect, title: &'static str, labels: &[&'static str], selected: usize) {
    let items = labels
        .iter()
        .map(|item| ListItem::new(*item))
        .collect::<Vec<_>>();

    draw_select_list(frame, area, title, items, selected);
}

fn draw_confirm(frame: &mut Frame<'_>, area: Rect, app: &MenuApp) {
    let chosen = app
        .matches
        .get(app.match_index)
        .map(|state| app.match_label(state))
        .unwrap_or_else(|| "-".to_string());

    let shot = if app.shot_index == 0 {
        format!("{}s", app.shot_clock_secs)
    } else {
        "off".to_string()
    };

    let confirm = Paragraph::new(vec![
        Line::from(Span::styled(
            "Open with these settings",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(chosen),
        Line::from(format!("Mode: {}", constants::MENU_MODE_LABELS[app.mode_index])),
        Line::from(format!("Shot clock: {}", shot)),
        Line::from(""),
        Line::from("Enter: open   Backspace: back   Esc: quit"),
    ])
    .block(Block::default().borders(Borders::ALL));

    frame.render_widget(confirm, area);
}

fn draw_select_list(
    frame: &mut Frame<'_>,
    area: Rect,
    title: &'static str,
    items: Vec<ListItem<'_>>,
    selected: usize,
) {
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶ ");

    let mut state = ListState::default();
    state.select(Some(selected));
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_footer(frame: &mut Frame<'_>, area: Rect, status: &str) {
    let footer = Paragraph::new(Line::from(vec![
        Span::styled(
            "[↑↓/j,k] move  [Enter] select  [Esc/q] quit  ",
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(status, Style::default().fg(Color::White)),
    ]))
    .alignment(Alignment::Left)
    .wrap(Wrap { trim: true });

    frame.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn app() -> MenuApp {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 19, 0, 0).unwrap();
        let matches = vec![
            MatchState::new(MatchId(1), 1800, at),
            MatchState::new(MatchId(2), 1800, at),
        ];
        MenuApp::new(matches, at, 30)
    }

    fn press(app: &mut MenuApp, keys: &[KeyCode]) {
        for key in keys {
            app.on_key(*key);
        }
    }

    #[test]
    fn walks_every_step_to_a_selection() {
        let mut app = app();
        press(
            &mut app,
            &[
                KeyCode::Enter,
                KeyCode::Down,
                KeyCode::Enter,
                KeyCode::Char('j'),
                KeyCode::Enter,
                KeyCode::Enter,
                KeyCode::Enter,
            ],
        );

        assert!(app.should_quit);
        assert_eq!(
            app.selection,
            Some(MenuSelection {
                match_id: MatchId(2),
                read_only: true,
                shot_clock: Some(30),
            })
        );
    }

    #[test]
    fn backspace_on_confirm_goes_back_one_step() {
        let mut app = app();
        press(&mut app, &[KeyCode::Enter, KeyCode::Enter, KeyCode::Enter, KeyCode::Down, KeyCode::Enter]);
        assert_eq!(app.step, Step::Confirm);

        app.on_key(KeyCode::Backspace);
        assert_eq!(app.step, Step::ShotClock);

        press(&mut app, &[KeyCode::Enter, KeyCode::Enter]);
        assert_eq!(
            app.selection,
            Some(MenuSelection {
                match_id: MatchId(1),
                read_only: false,
                shot_clock: None,
            })
        );
    }

    #[test]
    fn selection_stays_within_bounds() {
        let mut app = app();
        press(&mut app, &[KeyCode::Enter, KeyCode::Up, KeyCode::Down, KeyCode::Down, KeyCode::Down]);
        assert_eq!(app.match_index, 1);
    }

    #[test]
    fn escape_quits_without_selection() {
        let mut app = app();
        press(&mut app, &[KeyCode::Enter, KeyCode::Esc]);
        assert!(app.should_quit);
        assert!(app.selection.is_none());
    }

    #[test]
    fn labels_show_derived_remaining_time() {
        let app = app();
        assert_eq!(app.match_label(&app.matches[0]), "Match #1  30:00  PAUSED");
    }
}
