// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use churnpredict_app::schema::{self, FieldSpec, FieldWidget, FormSection};
use churnpredict_app::{
    AppCommand, AppEvent, AppState, CatalogStatus, ChurnLabel, FieldInput, LabelCatalog,
    PredictionRequest, PredictionResult, RawPrediction, RiskTier, ServiceError, ViewKind,
    parse_number,
};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Text};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Tabs, Wrap};
use std::io;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);
const HEADER_TABS: [&str; 2] = ["Dashboard", "Churn Predictor"];

#[derive(Debug, Clone, PartialEq)]
pub enum InternalEvent {
    ClearStatus {
        token: u64,
    },
    CatalogLoaded(Option<LabelCatalog>),
    Prediction {
        request_id: u64,
        outcome: Result<RawPrediction, ServiceError>,
    },
}

/// Side of the workflow that talks to the prediction service. The default
/// `spawn_*` methods run inline; real runtimes move the call to a worker
/// thread and report back over `tx`.
pub trait AppRuntime {
    fn load_catalog(&mut self) -> Option<LabelCatalog>;
    fn predict(&mut self, request: &PredictionRequest) -> Result<RawPrediction, ServiceError>;
    fn spawn_catalog_load(&mut self, tx: Sender<InternalEvent>) -> Result<()> {
        let catalog = self.load_catalog();
        tx.send(InternalEvent::CatalogLoaded(catalog))
            .map_err(|_| anyhow!("catalog event channel closed"))?;
        Ok(())
    }
    fn spawn_prediction(
        &mut self,
        request_id: u64,
        request: PredictionRequest,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let outcome = self.predict(&request);
        tx.send(InternalEvent::Prediction {
            request_id,
            outcome,
        })
        .map_err(|_| anyhow!("prediction event channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub accent: Style,
    pub danger: Style,
    pub warning: Style,
    pub ok: Style,
    pub muted: Style,
    pub status: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self::standard()
    }
}

impl Theme {
    pub fn standard() -> Self {
        Self {
            accent: Style::default().fg(Color::Cyan),
            danger: Style::default().fg(Color::Red),
            warning: Style::default().fg(Color::Yellow),
            ok: Style::default().fg(Color::Green),
            muted: Style::default().fg(Color::DarkGray),
            status: Style::default().fg(Color::Yellow),
        }
    }

    pub fn mono() -> Self {
        Self {
            accent: Style::default().add_modifier(Modifier::BOLD),
            danger: Style::default().add_modifier(Modifier::REVERSED),
            warning: Style::default().add_modifier(Modifier::UNDERLINED),
            ok: Style::default(),
            muted: Style::default().add_modifier(Modifier::DIM),
            status: Style::default(),
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::standard()),
            "mono" => Some(Self::mono()),
            _ => None,
        }
    }

    fn risk(&self, tier: RiskTier) -> Style {
        match tier {
            RiskTier::High => self.danger,
            RiskTier::Medium => self.warning,
            RiskTier::Low => self.ok,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct UiOptions {
    pub theme: Theme,
    pub report_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct ViewData {
    options: UiOptions,
    field_cursor: usize,
    status_token: u64,
    next_request_id: u64,
    in_flight: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormRowKind {
    Section,
    Field { selected: bool },
    Blank,
    Loading,
    Error,
}

pub fn run_app<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    options: UiOptions,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData {
        options,
        ..ViewData::default()
    };
    let (internal_tx, internal_rx) = mpsc::channel();
    start_catalog_load(state, runtime, &mut view_data, &internal_tx);

    let mut result = Ok(());
    loop {
        process_internal_events(state, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn start_catalog_load<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    if let Err(error) = runtime.spawn_catalog_load(internal_tx.clone()) {
        warn!(%error, "catalog load did not start");
        apply_events(
            state,
            view_data,
            internal_tx,
            AppCommand::CatalogLoaded(None),
        );
    }
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::CatalogLoaded(catalog) => {
                apply_events(state, view_data, tx, AppCommand::CatalogLoaded(catalog));
            }
            InternalEvent::Prediction {
                request_id,
                outcome,
            } => {
                if view_data.in_flight != Some(request_id) {
                    debug!(request_id, "dropping stale prediction");
                    continue;
                }
                view_data.in_flight = None;
                apply_events(state, view_data, tx, AppCommand::PredictionCompleted(outcome));
            }
        }
    }
}

fn apply_events(
    state: &mut AppState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    command: AppCommand,
) -> Vec<AppEvent> {
    let events = state.dispatch(command);
    for event in &events {
        match event {
            AppEvent::ViewChanged(view) => {
                debug!(view = view.label(), "view changed");
            }
            AppEvent::ResultReady => {
                if let Some(result) = &state.result {
                    info!(
                        risk = result.risk_tier.as_str(),
                        probability = result.probability,
                        "prediction ready"
                    );
                }
            }
            AppEvent::PredictionFailed(message) => {
                warn!(%message, "prediction failed");
            }
            AppEvent::CatalogUnavailable | AppEvent::StatusUpdated(_) => {
                schedule_status_clear(tx, bump_status_token(view_data));
            }
            _ => {}
        }
    }
    events
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn bump_status_token(view_data: &mut ViewData) -> u64 {
    view_data.status_token = view_data.status_token.saturating_add(1);
    view_data.status_token
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    apply_events(
        state,
        view_data,
        internal_tx,
        AppCommand::SetStatus(message.into()),
    );
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    match state.view {
        ViewKind::Dashboard => handle_dashboard_key(state, view_data, internal_tx, key),
        ViewKind::PredictorForm => {
            handle_form_key(state, runtime, view_data, internal_tx, key);
            false
        }
        ViewKind::PredictorResult => {
            handle_result_key(state, view_data, internal_tx, key);
            false
        }
    }
}

fn handle_dashboard_key(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    match key.code {
        KeyCode::Char('q') => true,
        KeyCode::Enter | KeyCode::Tab | KeyCode::Char('p') => {
            apply_events(state, view_data, internal_tx, AppCommand::ShowPredictor);
            false
        }
        _ => false,
    }
}

fn handle_result_key(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let command = match key.code {
        KeyCode::Char('b') | KeyCode::Esc | KeyCode::Backspace => AppCommand::BackToForm,
        KeyCode::Char('d') => AppCommand::ShowDashboard,
        _ => return,
    };
    apply_events(state, view_data, internal_tx, command);
}

fn handle_form_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let Some(spec) = selected_field(view_data) else {
        view_data.field_cursor = 0;
        return;
    };

    match (key.code, key.modifiers) {
        (KeyCode::Esc, _) => {
            apply_events(state, view_data, internal_tx, AppCommand::ShowDashboard);
        }
        (KeyCode::Enter, _) => submit_prediction(state, runtime, view_data, internal_tx),
        (KeyCode::Down | KeyCode::Tab, _) => move_field_cursor(view_data, 1),
        (KeyCode::Up | KeyCode::BackTab, _) => move_field_cursor(view_data, -1),
        (KeyCode::Right, _) => cycle_field(state, view_data, internal_tx, spec, 1),
        (KeyCode::Left, _) => cycle_field(state, view_data, internal_tx, spec, -1),
        (KeyCode::Char(' '), _) if spec.widget != FieldWidget::Entry => {
            cycle_field(state, view_data, internal_tx, spec, 1);
        }
        (KeyCode::Backspace, _) if spec.widget == FieldWidget::Entry => {
            let mut text = state.form.text(spec.name);
            text.pop();
            set_field_text(state, view_data, internal_tx, spec, text);
        }
        (KeyCode::Char(ch), modifiers)
            if spec.widget == FieldWidget::Entry && !modifiers.contains(KeyModifiers::CONTROL) =>
        {
            let mut text = state.form.text(spec.name);
            text.push(ch);
            set_field_text(state, view_data, internal_tx, spec, text);
        }
        _ => {}
    }
}

fn submit_prediction<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let events = apply_events(state, view_data, internal_tx, AppCommand::Submit);
    let Some(request) = events.into_iter().find_map(|event| match event {
        AppEvent::SubmissionStarted(request) => Some(request),
        _ => None,
    }) else {
        return;
    };

    view_data.next_request_id = view_data.next_request_id.saturating_add(1);
    let request_id = view_data.next_request_id;
    view_data.in_flight = Some(request_id);
    info!(request_id, "prediction submitted");

    if let Err(error) = runtime.spawn_prediction(request_id, request, internal_tx.clone()) {
        view_data.in_flight = None;
        apply_events(
            state,
            view_data,
            internal_tx,
            AppCommand::PredictionCompleted(Err(ServiceError::Unreachable {
                base_url: "prediction worker".to_owned(),
                reason: error.to_string(),
            })),
        );
    }
}

fn set_field_text(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    spec: &FieldSpec,
    text: String,
) {
    apply_events(
        state,
        view_data,
        internal_tx,
        AppCommand::UpdateField {
            name: spec.name.to_owned(),
            input: FieldInput::Text(text),
        },
    );
}

fn cycle_field(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    spec: &FieldSpec,
    delta: isize,
) {
    let input = match spec.widget {
        FieldWidget::Entry => return,
        FieldWidget::Checkbox => FieldInput::Checked(!is_checked(state, spec)),
        FieldWidget::Select => {
            let Some(choice) = next_choice(state, spec, delta) else {
                emit_status(state, view_data, internal_tx, "no options for field");
                return;
            };
            FieldInput::Text(choice)
        }
    };
    apply_events(
        state,
        view_data,
        internal_tx,
        AppCommand::UpdateField {
            name: spec.name.to_owned(),
            input,
        },
    );
}

fn is_checked(state: &AppState, spec: &FieldSpec) -> bool {
    state
        .form
        .get(spec.name)
        .is_some_and(|value| parse_number(value) == 1.0)
}

fn next_choice(state: &AppState, spec: &FieldSpec, delta: isize) -> Option<String> {
    let options = schema::options_for(spec, state.catalog.as_ref());
    if options.is_empty() {
        return None;
    }

    let current = state.form.text(spec.name);
    let len = options.len() as isize;
    let next = match options.iter().position(|option| *option == current) {
        Some(index) => (index as isize + delta).rem_euclid(len) as usize,
        None => 0,
    };
    options.get(next).cloned()
}

/// Field indices in the order the form shows them: grouped by section.
fn field_display_order() -> Vec<usize> {
    FormSection::ALL
        .into_iter()
        .flat_map(|section| schema::section_fields(section).map(|(index, _)| index))
        .collect()
}

fn selected_field(view_data: &ViewData) -> Option<&'static FieldSpec> {
    field_display_order()
        .get(view_data.field_cursor)
        .and_then(|index| schema::FIELDS.get(*index))
}

fn move_field_cursor(view_data: &mut ViewData, delta: isize) {
    let len = field_display_order().len() as isize;
    if len == 0 {
        return;
    }
    view_data.field_cursor = (view_data.field_cursor as isize + delta).rem_euclid(len) as usize;
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let theme = view_data.options.theme;
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let selected = usize::from(state.view.is_predictor());
    let tabs = Tabs::new(HEADER_TABS.to_vec())
        .block(Block::default().title("ChurnPredict").borders(Borders::ALL))
        .highlight_style(theme.accent.add_modifier(Modifier::BOLD))
        .select(selected);
    frame.render_widget(tabs, layout[0]);

    match state.view {
        ViewKind::Dashboard => {
            let body = Paragraph::new(render_dashboard_text(state, view_data))
                .wrap(Wrap { trim: false })
                .block(Block::default().borders(Borders::ALL).title("dashboard"));
            frame.render_widget(body, layout[1]);
        }
        ViewKind::PredictorForm => {
            let lines = form_rows(state, view_data)
                .into_iter()
                .map(|(kind, text)| {
                    let style = match kind {
                        FormRowKind::Section => theme.accent.add_modifier(Modifier::BOLD),
                        FormRowKind::Field { selected: true } => {
                            theme.accent.add_modifier(Modifier::REVERSED)
                        }
                        FormRowKind::Field { selected: false } | FormRowKind::Blank => {
                            Style::default()
                        }
                        FormRowKind::Loading => theme.warning,
                        FormRowKind::Error => theme.danger,
                    };
                    Line::styled(text, style)
                })
                .collect::<Vec<_>>();
            let body = Paragraph::new(Text::from(lines)).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Churn Prediction Tool"),
            );
            frame.render_widget(body, layout[1]);
        }
        ViewKind::PredictorResult => render_result(frame, layout[1], state, &theme),
    }

    let status = Paragraph::new(status_text(state, view_data))
        .style(theme.status)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[2]);
}

fn render_result(frame: &mut ratatui::Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let Some(result) = &state.result else {
        let empty = Paragraph::new("no prediction yet")
            .block(Block::default().borders(Borders::ALL).title("result"));
        frame.render_widget(empty, area);
        return;
    };

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(area);

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Churn Probability"),
        )
        .gauge_style(theme.risk(result.risk_tier))
        .ratio(result.probability.clamp(0.0, 1.0))
        .label(result.probability_percent());
    frame.render_widget(gauge, layout[0]);

    let verdict_style = match result.churn {
        ChurnLabel::Yes => theme.danger,
        ChurnLabel::No => theme.ok,
    };
    let details = Paragraph::new(render_result_text(result))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Prediction Result")
                .border_style(verdict_style),
        );
    frame.render_widget(details, layout[1]);
}

fn render_dashboard_text(state: &AppState, view_data: &ViewData) -> String {
    let report = match &view_data.options.report_path {
        Some(path) => format!("report: {}", path.display()),
        None => "report: none configured".to_owned(),
    };
    let catalog = match state.catalog_status {
        CatalogStatus::Pending => "option lists: loading".to_owned(),
        CatalogStatus::Loaded => format!(
            "option lists: {} from service",
            state.catalog.as_ref().map_or(0, LabelCatalog::len)
        ),
        CatalogStatus::Unavailable => "option lists: built-in defaults".to_owned(),
    };

    let mut lines = vec![
        "Customer Churn Analytics".to_owned(),
        "Monitor and predict customer churn patterns".to_owned(),
        String::new(),
        "Churn Analysis Dashboard".to_owned(),
        report,
        catalog,
    ];
    if state.loading {
        lines.push("prediction in flight".to_owned());
    }
    lines.push(String::new());
    lines.push("press enter to open the churn predictor".to_owned());
    lines.join("\n")
}

fn form_rows(state: &AppState, view_data: &ViewData) -> Vec<(FormRowKind, String)> {
    let order = field_display_order();
    let selected_index = order.get(view_data.field_cursor).copied();

    let mut rows = Vec::new();
    for section in FormSection::ALL {
        if !rows.is_empty() {
            rows.push((FormRowKind::Blank, String::new()));
        }
        rows.push((FormRowKind::Section, section.title().to_owned()));
        for (index, spec) in schema::section_fields(section) {
            let selected = selected_index == Some(index);
            let marker = if selected { ">" } else { " " };
            rows.push((
                FormRowKind::Field { selected },
                format!("{marker} {}: {}", spec.label, field_display(state, spec)),
            ));
        }
    }

    rows.push((FormRowKind::Blank, String::new()));
    if state.loading {
        rows.push((FormRowKind::Loading, "Predicting...".to_owned()));
    }
    if let Some(error) = &state.error {
        rows.push((FormRowKind::Error, error.clone()));
    }
    rows
}

fn render_form_text(state: &AppState, view_data: &ViewData) -> String {
    form_rows(state, view_data)
        .into_iter()
        .map(|(_, text)| text)
        .collect::<Vec<_>>()
        .join("\n")
}

fn field_display(state: &AppState, spec: &FieldSpec) -> String {
    match spec.widget {
        FieldWidget::Entry => state.form.text(spec.name),
        FieldWidget::Checkbox => {
            if is_checked(state, spec) {
                "[x]".to_owned()
            } else {
                "[ ]".to_owned()
            }
        }
        FieldWidget::Select => format!("< {} >", state.form.text(spec.name)),
    }
}

fn render_result_text(result: &PredictionResult) -> String {
    let mut lines = vec![
        format!("{} ({})", result.verdict_label(), result.churn.as_str()),
        format!("Churn Probability: {}", result.probability_percent()),
        format!("Risk Tier: {}", result.risk_tier.as_str()),
        String::new(),
        format!("Recommended Action: {}", result.recommended_action()),
        format!("Confidence Level: {}", result.confidence_tier.label()),
        String::new(),
        "Key Factors".to_owned(),
    ];
    lines.extend(result.factors.iter().map(|factor| format!("  • {factor}")));
    lines.join("\n")
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    let hints = match state.view {
        ViewKind::Dashboard => "enter/p predictor | q quit",
        ViewKind::PredictorForm => {
            "↑/↓ field | ←/→ choose | space toggle | enter predict | esc dashboard | ctrl+q quit"
        }
        ViewKind::PredictorResult => "b back to form | d dashboard | ctrl+q quit",
    };

    let mut parts = vec![state.view.label().to_uppercase()];
    if state.view == ViewKind::PredictorForm
        && let Some(spec) = selected_field(view_data)
    {
        parts.push(format!(
            "field {} ({}/{})",
            spec.name,
            view_data.field_cursor + 1,
            schema::FIELDS.len()
        ));
    }
    if state.loading {
        parts.push("Predicting...".to_owned());
    } else if state.view == ViewKind::PredictorForm
        && let Some(error) = &state.error
    {
        parts.push(error.clone());
    }
    if let Some(status) = &state.status_line {
        parts.push(status.clone());
    }
    parts.push(hints.to_owned());
    parts.join(" | ")
}
