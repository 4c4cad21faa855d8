use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use crossterm::ExecutableCommand;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use miette::IntoDiagnostic;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::viewer::{DEFAULT_CANCER_TYPE, DEFAULT_CODE, LookupResult, Viewer};

const HISTORY_MAX: usize = 8;
const HINT: &str = "Tab switch field · Enter get recommendations · F1 help · Esc quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    CancerType,
    Code,
}

impl Field {
    fn label(self) -> &'static str {
        match self {
            Field::CancerType => "Cancer Type (optional)",
            Field::Code => "OncoTree Code",
        }
    }

    fn next(self) -> Self {
        match self {
            Field::CancerType => Field::Code,
            Field::Code => Field::CancerType,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Continue,
    Lookup,
    Quit,
}

/// Input fields, focus and the last lookup shown by the viewer.
#[derive(Debug, Clone)]
pub struct ViewerState {
    cancer_type: String,
    code: String,
    focus: Field,
    result: Option<LookupResult>,
    history: VecDeque<String>,
    show_help: bool,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self {
            cancer_type: DEFAULT_CANCER_TYPE.to_string(),
            code: DEFAULT_CODE.to_string(),
            focus: Field::Code,
            result: None,
            history: VecDeque::new(),
            show_help: false,
        }
    }
}

impl ViewerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focus(&self) -> Field {
        self.focus
    }

    pub fn input(&self, field: Field) -> &str {
        match field {
            Field::CancerType => &self.cancer_type,
            Field::Code => &self.code,
        }
    }

    pub fn result(&self) -> Option<&LookupResult> {
        self.result.as_ref()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> KeyOutcome {
        if key.kind != KeyEventKind::Press {
            return KeyOutcome::Continue;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') | KeyCode::Char('q') => KeyOutcome::Quit,
                KeyCode::Char('u') => {
                    self.input_mut().clear();
                    KeyOutcome::Continue
                }
                _ => KeyOutcome::Continue,
            };
        }
        match key.code {
            KeyCode::Esc => {
                if self.show_help {
                    self.show_help = false;
                    KeyOutcome::Continue
                } else {
                    KeyOutcome::Quit
                }
            }
            KeyCode::F(1) => {
                self.show_help = !self.show_help;
                KeyOutcome::Continue
            }
            KeyCode::Enter => KeyOutcome::Lookup,
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                self.focus = self.focus.next();
                KeyOutcome::Continue
            }
            KeyCode::Backspace => {
                self.input_mut().pop();
                KeyOutcome::Continue
            }
            KeyCode::Char(ch) => {
                self.input_mut().push(ch);
                KeyOutcome::Continue
            }
            _ => KeyOutcome::Continue,
        }
    }

    pub fn apply_lookup(&mut self, viewer: &Viewer) {
        let result = viewer.lookup(&self.code);
        let outcome = match &result {
            LookupResult::Found(view) => format!("{} found", view.code),
            LookupResult::NotFound { code } => format!("{code} not found"),
        };
        tracing::debug!(%outcome, "viewer lookup");
        self.history.push_front(format!(
            "[{}] {outcome}",
            chrono::Local::now().format("%H:%M:%S")
        ));
        self.history.truncate(HISTORY_MAX);
        self.result = Some(result);
    }

    fn input_mut(&mut self) -> &mut String {
        match self.focus {
            Field::CancerType => &mut self.cancer_type,
            Field::Code => &mut self.code,
        }
    }
}

pub struct Tui {
    viewer: Viewer,
    state: ViewerState,
}

impl Tui {
    pub fn new(viewer: Viewer) -> Self {
        Self {
            viewer,
            state: ViewerState::new(),
        }
    }

    pub fn run(&mut self) -> miette::Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().into_diagnostic()?;
        stdout.execute(EnterAlternateScreen).into_diagnostic()?;

        let backend = CrosstermBackend::new(stdout);
        let result = Terminal::new(backend)
            .into_diagnostic()
            .and_then(|mut terminal| self.event_loop(&mut terminal));

        disable_raw_mode().into_diagnostic()?;
        let mut stdout = io::stdout();
        stdout.execute(LeaveAlternateScreen).into_diagnostic()?;
        result
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> miette::Result<()> {
        terminal.clear().into_diagnostic()?;
        loop {
            let records = self.viewer.len();
            terminal
                .draw(|frame| draw_viewer(frame, &self.state, records))
                .into_diagnostic()?;

            if event::poll(Duration::from_millis(120)).into_diagnostic()? {
                if let Event::Key(key) = event::read().into_diagnostic()? {
                    match self.state.handle_key(key) {
                        KeyOutcome::Quit => return Ok(()),
                        KeyOutcome::Lookup => self.state.apply_lookup(&self.viewer),
                        KeyOutcome::Continue => {}
                    }
                }
            }
        }
    }
}

pub fn draw_viewer(frame: &mut ratatui::Frame, state: &ViewerState, records: usize) {
    if state.show_help {
        draw_help(frame);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Min(8),
            Constraint::Length(2),
        ])
        .split(frame.area());

    frame.render_widget(draw_header(records), chunks[0]);
    draw_inputs(frame, state, chunks[1]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(chunks[2]);
    frame.render_widget(draw_result(state.result()), body[0]);
    frame.render_widget(draw_history(state), body[1]);

    let footer = Paragraph::new(Line::from(Span::styled(
        HINT,
        Style::default().fg(Color::DarkGray),
    )))
    .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[3]);
}

fn draw_header(records: usize) -> Paragraph<'static> {
    Paragraph::new(vec![
        Line::from(Span::styled(
            "ONCO-GENES :: Cancer Gene Recommendation Viewer",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("Precomputed records: ", Style::default().fg(Color::Gray)),
            Span::raw(records.to_string()),
        ]),
    ])
    .block(Block::default().borders(Borders::BOTTOM))
    .alignment(Alignment::Left)
}

fn draw_inputs(frame: &mut ratatui::Frame, state: &ViewerState, area: Rect) {
    let lines = [Field::CancerType, Field::Code]
        .into_iter()
        .map(|field| {
            let focused = state.focus == field;
            let marker = if focused { "> " } else { "  " };
            let label_style = if focused {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            Line::from(vec![
                Span::styled(format!("{marker}{}: ", field.label()), label_style),
                Span::styled(
                    state.input(field).to_string(),
                    Style::default().fg(Color::White),
                ),
            ])
        })
        .collect::<Vec<_>>();

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .title("Enter an OncoTree code to view precomputed gene and pathway recommendations");
    frame.render_widget(Paragraph::new(lines).block(block), area);

    let row = match state.focus {
        Field::CancerType => 1,
        Field::Code => 2,
    };
    let prefix = 2 + state.focus.label().len() + 2;
    let x = area
        .x
        .saturating_add((prefix + state.input(state.focus).chars().count()) as u16)
        .min(area.x.saturating_add(area.width.saturating_sub(1)));
    frame.set_cursor_position((x, area.y.saturating_add(row)));
}

fn draw_result(result: Option<&LookupResult>) -> Paragraph<'static> {
    let heading = Style::default().add_modifier(Modifier::BOLD);
    let lines = match result {
        None => vec![Line::from(Span::styled(
            "Press Enter to get recommendations.",
            Style::default().fg(Color::Gray),
        ))],
        Some(LookupResult::NotFound { code }) => vec![Line::from(Span::styled(
            format!("OncoTree Code '{code}' not found."),
            Style::default().fg(Color::Red),
        ))],
        Some(LookupResult::Found(view)) => {
            let mut lines = vec![
                Line::from(Span::styled(
                    format!("OncoTree Code '{}' found!", view.code),
                    Style::default().fg(Color::Green),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    format!("Recommendations for {} ({})", view.name, view.code),
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(format!("{} samples", view.sample_count)),
                Line::from(""),
                Line::from(Span::styled("Mutation-Based Genes:", heading)),
                Line::from(view.mutation_based.clone()),
                Line::from(Span::styled("Expression-Based Genes:", heading)),
                Line::from(view.expression_based.clone()),
                Line::from(Span::styled("Pathways:", heading)),
                Line::from(view.pathways.clone()),
            ];
            if let Some(error) = &view.error {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    format!("Generation error: {error}"),
                    Style::default().fg(Color::Yellow),
                )));
            }
            lines
        }
    };
    Paragraph::new(lines)
        .block(Block::default().borders(Borders::RIGHT))
        .wrap(Wrap { trim: true })
}

fn draw_history(state: &ViewerState) -> Paragraph<'static> {
    let mut lines = vec![Line::from(Span::styled(
        "LOOKUPS",
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ))];
    lines.extend(state.history.iter().map(|item| Line::from(item.clone())));
    Paragraph::new(lines).wrap(Wrap { trim: true })
}

fn draw_help(frame: &mut ratatui::Frame) {
    let block = Block::default().borders(Borders::ALL).title("Help");
    let lines = vec![
        Line::from("Tab / Up / Down  switch between input fields"),
        Line::from("Enter            look up the OncoTree code (exact match)"),
        Line::from("Backspace        delete a character, Ctrl+U clears the field"),
        Line::from("F1 / Esc         close this help"),
        Line::from("Esc / Ctrl+C     quit"),
    ];
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        frame.area(),
    );
}
