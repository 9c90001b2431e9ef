//! Ratatui-based terminal form.
//!
//! The form collects the 8 raw block-group attributes, sends them to the
//! inference service (`POST /predict`) and renders the outcome. One request per
//! submit: the user retries by submitting again.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::cli::ClientArgs;
use crate::client::ApiClient;
use crate::domain::{PRICE_UNIT, PredictionResult, RawObservation};
use crate::error::{AppError, ClientError};
use crate::report::format_usd_whole;

pub mod form;

use form::{FIELDS, FormState};

/// Start the form.
pub fn run(args: ClientArgs) -> Result<(), AppError> {
    let client = ApiClient::new(&args.api_url, args.timeout())?;

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(client);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// What the result panel shows.
enum Outcome {
    Idle,
    Success {
        raw: RawObservation,
        result: PredictionResult,
    },
    Failed(ClientError),
}

struct App {
    client: ApiClient,
    form: FormState,
    editing: Option<String>,
    submit_pending: bool,
    outcome: Outcome,
    status: String,
}

impl App {
    fn new(client: ApiClient) -> Self {
        let status = format!("API: {}", client.predict_url());
        Self {
            client,
            form: FormState::new(),
            editing: None,
            submit_pending: false,
            outcome: Outcome::Idle,
            status,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            // The request blocks; paint "Sending..." first.
            if self.submit_pending {
                self.submit_pending = false;
                self.submit();
                needs_redraw = true;
                continue;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the user quits.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.editing.is_some() {
            self.handle_edit(code);
            return false;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up => self.form.select_prev(),
            KeyCode::Down => self.form.select_next(),
            KeyCode::Left => self.form.adjust(-1),
            KeyCode::Right => self.form.adjust(1),
            KeyCode::Enter => {
                let spec = &FIELDS[self.form.selected];
                self.editing = Some(String::new());
                self.status = format!("Editing {} {}. Enter to apply, Esc to cancel.", spec.name, spec.range_hint());
            }
            KeyCode::Char('s') => {
                self.submit_pending = true;
                self.status = format!("Sending request to {}...", self.client.predict_url());
            }
            KeyCode::Char('x') => {
                self.form.reset();
                self.status = "Defaults restored.".to_string();
            }
            _ => {}
        }
        false
    }

    fn handle_edit(&mut self, code: KeyCode) {
        let Some(buf) = self.editing.as_mut() else {
            return;
        };
        match code {
            KeyCode::Esc => {
                self.editing = None;
                self.status = "Edit canceled.".to_string();
            }
            KeyCode::Enter => {
                let text = std::mem::take(buf);
                self.editing = None;
                self.status = match self.form.set_from_text(&text) {
                    Ok(v) => format!("{} = {v}", FIELDS[self.form.selected].name),
                    Err(err) => err,
                };
            }
            KeyCode::Backspace => {
                buf.pop();
            }
            KeyCode::Char(c) if c.is_ascii_digit() || matches!(c, '-' | '.' | 'e' | 'E' | '+') => {
                buf.push(c);
            }
            _ => {}
        }
    }

    fn submit(&mut self) {
        let raw = self.form.to_observation();
        self.outcome = match self.client.predict(&raw) {
            Ok(result) => {
                self.status = "Prediction received.".to_string();
                Outcome::Success { raw, result }
            }
            Err(err) => {
                self.status = "Request failed.".to_string();
                Outcome::Failed(err)
            }
        };
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(chunks[1]);
        self.draw_fields(frame, body[0]);
        self.draw_result(frame, body[1]);

        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let line = Line::from(vec![
            Span::styled("housing", Style::default().fg(Color::Cyan)),
            Span::raw(" | California median house price estimate | "),
            Span::styled(self.client.base_url().to_string(), Style::default().fg(Color::Gray)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_fields(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut items = Vec::with_capacity(FIELDS.len());
        for (idx, spec) in FIELDS.iter().enumerate() {
            let is_first_of_group = idx == 0 || FIELDS[idx - 1].group != spec.group;
            let group = if is_first_of_group { spec.group.title() } else { "" };

            let value = match &self.editing {
                Some(buf) if idx == self.form.selected => format!("{buf}_"),
                _ => spec.format_value(self.form.value(idx)),
            };
            items.push(ListItem::new(Line::from(vec![
                Span::styled(format!("{group:<13}"), Style::default().fg(Color::DarkGray)),
                Span::raw(format!("{:<28}", spec.label)),
                Span::styled(format!("{value:>10}"), Style::default().add_modifier(Modifier::BOLD)),
            ])));
        }

        let list = List::new(items)
            .block(Block::default().title("Block group").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.form.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_result(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Estimate").borders(Borders::ALL);
        let p = Paragraph::new(result_text(&self.outcome))
            .wrap(Wrap { trim: false })
            .block(block);
        frame.render_widget(p, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  ←/→ step  Enter type value  s submit  x reset  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn result_text(outcome: &Outcome) -> Text<'static> {
    let gray = Style::default().fg(Color::Gray);
    let red = Style::default().fg(Color::Red).add_modifier(Modifier::BOLD);

    let lines = match outcome {
        Outcome::Idle => vec![Line::from(Span::styled("Press 's' to request an estimate.", gray))],
        Outcome::Success { raw, result } => vec![
            Line::from(Span::styled(
                format!("Estimated price: {}", result.predicted_price_usd),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(format!("Geo-cluster: {}", result.input_cluster)),
            Line::from(format!("Price (x100k): {}", result.predicted_price_100k)),
            Line::from(format!("Median income: {}", format_usd_whole(raw.med_inc * PRICE_UNIT))),
        ],
        Outcome::Failed(ClientError::Unreachable { url, reason }) => vec![
            Line::from(Span::styled("Cannot reach the inference service.", red)),
            Line::from(format!("{url}: {reason}")),
            Line::from(""),
            Line::from(Span::styled("Start it with `housing serve`, then press 's' again.", gray)),
        ],
        Outcome::Failed(ClientError::Status { status, detail }) => {
            let mut lines = vec![Line::from(Span::styled(format!("API error: status {status}"), red))];
            if let Some(detail) = detail {
                lines.push(Line::from(detail.clone()));
            }
            lines
        }
        Outcome::Failed(ClientError::Decode(reason)) => vec![
            Line::from(Span::styled("Unexpected response from the service.", red)),
            Line::from(reason.clone()),
        ],
        Outcome::Failed(err @ ClientError::Setup(_)) => {
            vec![Line::from(Span::styled(err.to_string(), red))]
        }
    };
    Text::from(lines)
}
