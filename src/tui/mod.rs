//! TUI module - Terminal view of today's workout with ratatui

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
};
use std::io::{stdout, Stdout};

use crate::db::BlobStore;
use crate::error::SessionError;
use crate::exercise_log::Difficulty;
use crate::progress::Advance;
use crate::session::{ExerciseView, Session, TodaysSchedule};
use crate::suggest::Adjust;

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// App state for TUI
pub struct App<S: BlobStore> {
    session: Session<S>,
    selected: usize,
    status: String,
    should_quit: bool,
}

impl<S: BlobStore> App<S> {
    pub fn new(session: Session<S>) -> Self {
        Self {
            session,
            selected: 0,
            status: String::new(),
            should_quit: false,
        }
    }

    /// Run the TUI application
    pub fn run(&mut self) -> Result<()> {
        let mut terminal = init_terminal()?;

        while !self.should_quit {
            terminal.draw(|frame| self.render(frame))?;
            self.handle_events()?;
        }

        restore_terminal()?;
        Ok(())
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(4),
            ])
            .split(area);

        let progress = self.session.progress();
        let phase_name = self
            .session
            .catalog()
            .phase(&progress.current_phase)
            .map(|p| p.name.clone())
            .unwrap_or_else(|_| progress.current_phase.clone());

        // Header
        let header = Paragraph::new(format!(
            "BASEMENT LAB - Day {} | {}",
            progress.global_day, phase_name
        ))
        .style(Style::default().fg(Color::Cyan).bold())
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, chunks[0]);

        match self.session.todays_schedule() {
            Ok(TodaysSchedule::Workout { workout, exercises, .. }) => {
                let rows: Vec<Row> = exercises
                    .iter()
                    .map(|ex| {
                        let row = exercise_row(ex);
                        if ex.index == self.selected {
                            row.style(Style::default().bg(Color::DarkGray))
                        } else {
                            row
                        }
                    })
                    .collect();

                let table = Table::new(
                    rows,
                    [
                        Constraint::Length(3),
                        Constraint::Min(20),
                        Constraint::Length(12),
                        Constraint::Length(8),
                        Constraint::Length(10),
                        Constraint::Length(14),
                        Constraint::Min(10),
                    ],
                )
                .header(
                    Row::new(vec!["#", "Exercise", "Sets x Reps", "Rest", "Weight", "Difficulty", "Notes"])
                        .style(Style::default().bold()),
                )
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(format!("{} - {}", workout.name, workout.focus)),
                );
                frame.render_widget(table, chunks[1]);
            }
            Ok(TodaysSchedule::Rest { .. }) => {
                let rest = Paragraph::new("Rest day. Recover, walk, sleep.\n\nPress c to move on.")
                    .style(Style::default().fg(Color::Green))
                    .block(Block::default().borders(Borders::ALL).title("Rest"));
                frame.render_widget(rest, chunks[1]);
            }
            Err(e) => {
                let error = Paragraph::new(format!("Program error: {}", e))
                    .style(Style::default().fg(Color::Red))
                    .wrap(Wrap { trim: true })
                    .block(Block::default().borders(Borders::ALL));
                frame.render_widget(error, chunks[1]);
            }
        }

        // Footer
        let footer = Paragraph::new(vec![
            Line::from("q: quit | j/k: select | +/-: weight | x: clear weight | e/g/h/f: difficulty | c: complete"),
            Line::from(self.status.clone()).style(Style::default().fg(Color::Yellow)),
        ])
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(footer, chunks[2]);
    }

    fn exercise_count(&self) -> usize {
        match self.session.todays_schedule() {
            Ok(TodaysSchedule::Workout { exercises, .. }) => exercises.len(),
            _ => 0,
        }
    }

    fn report(&mut self, result: Result<(), SessionError>, done: &str) {
        self.status = match result {
            Ok(()) => done.to_string(),
            Err(e) => e.to_string(),
        };
    }

    fn set_difficulty(&mut self, difficulty: Difficulty) {
        let result = self.session.record_difficulty(self.selected, Some(difficulty));
        self.report(result, &format!("Marked {}", difficulty));
    }

    fn adjust(&mut self, direction: Adjust) {
        self.status = match self.session.adjust_weight(self.selected, direction) {
            Ok(weight) => format!("Weight {}", weight),
            Err(e) => e.to_string(),
        };
    }

    fn complete(&mut self) {
        self.status = match self.session.complete_workout() {
            Ok(Advance::Advanced { global_day, phase_change: Some(change) }) => {
                format!("Day {} - new phase: {}", global_day, change.to)
            }
            Ok(Advance::Advanced { global_day, .. }) => format!("Day {}", global_day),
            Ok(Advance::ProgramComplete) => "Program complete! 365 days done.".to_string(),
            Err(e) => e.to_string(),
        };
        self.selected = 0;
    }

    fn handle_events(&mut self) -> Result<()> {
        if event::poll(std::time::Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => self.should_quit = true,
                        KeyCode::Down | KeyCode::Char('j') => {
                            let count = self.exercise_count();
                            if self.selected + 1 < count {
                                self.selected += 1;
                            }
                        }
                        KeyCode::Up | KeyCode::Char('k') => {
                            self.selected = self.selected.saturating_sub(1);
                        }
                        KeyCode::Char('+') | KeyCode::Char('=') => self.adjust(Adjust::Up),
                        KeyCode::Char('-') => self.adjust(Adjust::Down),
                        KeyCode::Char('x') => {
                            let result = self.session.record_weight(self.selected, None);
                            self.report(result, "Weight cleared");
                        }
                        KeyCode::Char('e') => self.set_difficulty(Difficulty::Easy),
                        KeyCode::Char('g') => self.set_difficulty(Difficulty::Good),
                        KeyCode::Char('h') => self.set_difficulty(Difficulty::Hard),
                        KeyCode::Char('f') => self.set_difficulty(Difficulty::Failed),
                        KeyCode::Char('c') => self.complete(),
                        _ => {}
                    }
                }
        Ok(())
    }
}

fn exercise_row<'a>(ex: &ExerciseView<'a>) -> Row<'a> {
    let weight = match (ex.entry.and_then(|e| e.weight), ex.suggested_weight) {
        (Some(w), _) => format!("{}", w),
        (None, Some(s)) => format!("~{}", s),
        (None, None) => "-".to_string(),
    };
    let difficulty = ex
        .entry
        .and_then(|e| e.difficulty.map(|d| match (d, e.failed_set, e.failed_rep) {
            (Difficulty::Failed, Some(set), Some(rep)) => format!("failed {}/{}", set, rep),
            _ => d.to_string(),
        }))
        .unwrap_or_default();
    let notes = ex
        .entry
        .and_then(|e| e.notes.clone())
        .or_else(|| ex.def.note.clone())
        .unwrap_or_default();

    Row::new(vec![
        Cell::from((ex.index + 1).to_string()),
        Cell::from(ex.def.name.clone()),
        Cell::from(format!("{}x{}", ex.def.sets, ex.def.reps)),
        Cell::from(ex.def.rest.clone()),
        Cell::from(weight),
        Cell::from(difficulty),
        Cell::from(notes),
    ])
}

fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    Ok(terminal)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}
