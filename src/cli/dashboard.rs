use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span, Text},
    widgets::{Block, Cell, Clear, Paragraph, Row, Table, TableState},
    DefaultTerminal, Frame,
};

use crate::app::{App, Command};
use crate::error::Result;
use crate::fmt::number;
use crate::models::Column;
use crate::range::{parse_day, DateRange};
use crate::settings::Settings;
use crate::tui::{
    self, total_span, ACTIVE_INPUT_STYLE, BRAND_STYLE, FOOTER_STYLE, HEADER_STYLE, INPUT_STYLE,
    SELECTED_STYLE,
};

const TICK_RATE: Duration = Duration::from_millis(100);
const BRAND: &str = "MiDoc | Consulta de Atenciones";
const LOADING: &str = "Cargando datos...";
const EMPTY: &str = "No se encontraron atenciones para esta fecha.";
const POPUP_WIDTH: u16 = 60;

const COLUMN_WIDTHS: [Constraint; 9] = [
    Constraint::Length(9),
    Constraint::Length(11),
    Constraint::Length(10),
    Constraint::Fill(1),
    Constraint::Length(12),
    Constraint::Length(12),
    Constraint::Length(10),
    Constraint::Length(16),
    Constraint::Length(10),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RangeField {
    Start,
    End,
}

enum Mode {
    Normal,
    Filter { column: usize },
    Range {
        field: RangeField,
        start: String,
        end: String,
    },
}

#[derive(Debug, PartialEq, Eq)]
pub enum DashboardAction {
    Continue,
    Quit,
}

pub struct Dashboard {
    app: App,
    mode: Mode,
    selected: usize,
    table_state: TableState,
}

impl Dashboard {
    pub fn new(app: App) -> Self {
        Self {
            app,
            mode: Mode::Normal,
            selected: 0,
            table_state: TableState::default(),
        }
    }

    fn dispatch(&mut self, cmd: Command) {
        self.app.dispatch(cmd);
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        let len = self.app.state.store.visible().len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    pub fn handle_key(&mut self, code: KeyCode) -> DashboardAction {
        match &mut self.mode {
            Mode::Normal => return self.handle_normal_key(code),
            Mode::Filter { column } => {
                let col = Column::ALL[*column];
                match code {
                    KeyCode::Esc | KeyCode::Enter => self.mode = Mode::Normal,
                    KeyCode::Left | KeyCode::BackTab => {
                        *column = (*column + Column::ALL.len() - 1) % Column::ALL.len();
                    }
                    KeyCode::Right | KeyCode::Tab => {
                        *column = (*column + 1) % Column::ALL.len();
                    }
                    KeyCode::Backspace => self.dispatch(Command::PopFilterChar(col)),
                    KeyCode::Delete => self.dispatch(Command::SetFilter(col, String::new())),
                    KeyCode::Char(c) => self.dispatch(Command::PushFilterChar(col, c)),
                    _ => {}
                }
            }
            Mode::Range { field, start, end } => match code {
                KeyCode::Esc => self.mode = Mode::Normal,
                KeyCode::Tab | KeyCode::BackTab => {
                    *field = match *field {
                        RangeField::Start => RangeField::End,
                        RangeField::End => RangeField::Start,
                    };
                }
                KeyCode::Backspace => {
                    match field {
                        RangeField::Start => start.pop(),
                        RangeField::End => end.pop(),
                    };
                }
                KeyCode::Char(c) if c.is_ascii_digit() || c == '-' => match field {
                    RangeField::Start => start.push(c),
                    RangeField::End => end.push(c),
                },
                KeyCode::Enter => {
                    let parsed = parse_day(start).and_then(|s| Ok((s, parse_day(end)?)));
                    match parsed {
                        Ok((s, e)) => {
                            self.mode = Mode::Normal;
                            self.dispatch(Command::SetRange(DateRange::new(s, e)));
                        }
                        Err(e) => self.app.notify(e.to_string()),
                    }
                }
                _ => {}
            },
        }
        DashboardAction::Continue
    }

    fn handle_normal_key(&mut self, code: KeyCode) -> DashboardAction {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return DashboardAction::Quit,
            KeyCode::Char('t') => self.dispatch(Command::Today),
            KeyCode::Char('y') => self.dispatch(Command::Yesterday),
            KeyCode::Char('c') => self.dispatch(Command::ClearRange),
            KeyCode::Char('x') => self.dispatch(Command::Export),
            KeyCode::Char('m') => self.dispatch(Command::SendReport),
            KeyCode::Char('f') | KeyCode::Char('/') => {
                self.mode = Mode::Filter { column: 0 };
            }
            KeyCode::Char('r') => {
                let show = |d: Option<chrono::NaiveDate>| {
                    d.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
                };
                let range = self.app.state.range;
                self.mode = Mode::Range {
                    field: RangeField::Start,
                    start: show(range.start),
                    end: show(range.end),
                };
            }
            KeyCode::Down => {
                let len = self.app.state.store.visible().len();
                if self.selected + 1 < len {
                    self.selected += 1;
                }
            }
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Home => self.selected = 0,
            KeyCode::End => {
                self.selected = self.app.state.store.visible().len().saturating_sub(1);
            }
            _ => {}
        }
        DashboardAction::Continue
    }

    pub fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let border_style = Style::default().fg(Color::DarkGray);

        let [header_area, sep1, range_area, sep2, body_area, hints_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(area);

        let sep_line = "━".repeat(area.width as usize);
        frame.render_widget(Paragraph::new(sep_line.as_str()).style(border_style), sep1);
        frame.render_widget(Paragraph::new(sep_line.as_str()).style(border_style), sep2);

        self.draw_header(frame, header_area);
        self.draw_range(frame, range_area);
        self.draw_body(frame, body_area);
        self.draw_hints(frame, hints_area);
        self.draw_notification(frame, area);
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let [left, right] =
            Layout::horizontal([Constraint::Fill(1), Constraint::Length(28)]).areas(area);
        frame.render_widget(Paragraph::new(format!(" {BRAND}")).style(BRAND_STYLE), left);
        frame.render_widget(
            Paragraph::new("t=Ver Hoy  y=Ver Ayer ")
                .style(FOOTER_STYLE)
                .alignment(Alignment::Right),
            right,
        );
    }

    fn draw_range(&self, frame: &mut Frame, area: Rect) {
        let [left, right] =
            Layout::horizontal([Constraint::Fill(1), Constraint::Length(42)]).areas(area);

        let line = match &self.mode {
            Mode::Range { field, start, end } => {
                let input = |text: &str, active: bool| {
                    let shown = if active {
                        format!("{text}\u{2588}")
                    } else {
                        text.to_string()
                    };
                    let style = if active { ACTIVE_INPUT_STYLE } else { INPUT_STYLE };
                    Span::styled(format!(" {shown:<11}"), style)
                };
                Line::from(vec![
                    Span::styled(" Rango de fechas: ", HEADER_STYLE),
                    Span::raw("Desde "),
                    input(start, *field == RangeField::Start),
                    Span::raw("  Hasta "),
                    input(end, *field == RangeField::End),
                ])
            }
            _ => Line::from(vec![
                Span::styled(" Rango de fechas: ", HEADER_STYLE),
                Span::raw(self.app.state.range.label()),
            ]),
        };
        frame.render_widget(Paragraph::new(line), left);
        frame.render_widget(
            Paragraph::new("x=Exportar Excel  m=Enviar por correo ")
                .style(FOOTER_STYLE)
                .alignment(Alignment::Right),
            right,
        );
    }

    fn filter_header(&self) -> Row<'static> {
        let active_col = match self.mode {
            Mode::Filter { column } => Some(column),
            _ => None,
        };
        let cells: Vec<Cell> = Column::ALL
            .iter()
            .enumerate()
            .map(|(i, col)| {
                let pattern = self.app.state.filters.get(*col);
                let (text, style) = if active_col == Some(i) {
                    (format!("{pattern}\u{2588}"), ACTIVE_INPUT_STYLE)
                } else if pattern.is_empty() {
                    ("\u{00b7}".to_string(), FOOTER_STYLE)
                } else {
                    (pattern.to_string(), INPUT_STYLE)
                };
                Cell::from(Text::from(vec![
                    Line::from(Span::styled(col.label(), HEADER_STYLE)),
                    Line::from(Span::styled(text, style)),
                ]))
            })
            .collect();
        Row::new(cells).height(2).bottom_margin(1)
    }

    fn footer_row(&self) -> Row<'static> {
        let store = &self.app.state.store;
        let mut cells: Vec<Cell> = vec![Cell::from(""); Column::ALL.len()];
        let totals_label = Line::from(Span::styled("Totales:", HEADER_STYLE));
        cells[Column::ReceiptNumber.index()] =
            Cell::from(totals_label.alignment(Alignment::Right));
        cells[Column::Amount.index()] = Cell::from(total_span(store.visible_total()));
        cells[Column::OperationNumber.index()] = Cell::from(Span::styled(
            format!("Registros: {}", number(store.visible().len())),
            HEADER_STYLE,
        ));
        Row::new(cells).top_margin(1)
    }

    fn draw_body(&mut self, frame: &mut Frame, area: Rect) {
        if self.app.state.loading {
            frame.render_widget(Paragraph::new(format!(" {LOADING}")).style(FOOTER_STYLE), area);
            return;
        }

        let visible = self.app.state.store.visible();
        if visible.is_empty() {
            let [table_area, msg_area] =
                Layout::vertical([Constraint::Length(3), Constraint::Fill(1)]).areas(area);
            let table = Table::new(Vec::<Row>::new(), COLUMN_WIDTHS)
                .header(self.filter_header())
                .column_spacing(1);
            frame.render_widget(table, table_area);
            frame.render_widget(
                Paragraph::new(format!(" {EMPTY}")).style(Style::default().fg(Color::Cyan)),
                msg_area,
            );
            return;
        }

        let rows: Vec<Row> = visible
            .iter()
            .map(|rec| {
                let cells: Vec<Cell> = Column::ALL
                    .iter()
                    .map(|&col| match col {
                        Column::VisitTimestamp => Cell::from(rec.visit_date()),
                        Column::Amount => Cell::from(
                            Line::from(rec.text(col)).alignment(Alignment::Right),
                        ),
                        _ => Cell::from(rec.text(col)),
                    })
                    .collect();
                Row::new(cells)
            })
            .collect();

        self.table_state.select(Some(self.selected));
        let table = Table::new(rows, COLUMN_WIDTHS)
            .header(self.filter_header())
            .footer(self.footer_row())
            .column_spacing(1)
            .row_highlight_style(SELECTED_STYLE);
        frame.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn draw_hints(&self, frame: &mut Frame, area: Rect) {
        let hints = match self.mode {
            Mode::Normal => concat!(
                " t:hoy  y:ayer  r:rango  c:limpiar  f:filtrar  x:exportar  m:correo  ",
                "\u{2191}/\u{2193}:mover  q:salir"
            ),
            Mode::Filter { .. } => concat!(
                " \u{2190}/\u{2192}:columna  escribir:filtrar  Backspace:borrar  ",
                "Supr:vaciar  Enter/Esc:terminar"
            ),
            Mode::Range { .. } => " YYYY-MM-DD  Tab:cambiar campo  Enter:aplicar  Esc:cancelar",
        };
        frame.render_widget(Paragraph::new(hints).style(FOOTER_STYLE), area);
    }

    fn draw_notification(&self, frame: &mut Frame, area: Rect) {
        let Some(message) = self.app.notification(Instant::now()) else {
            return;
        };
        let inner_width = POPUP_WIDTH.min(area.width).saturating_sub(4) as usize;
        let (wrapped, lines) = tui::wrap_text(message, inner_width);
        let popup = tui::top_popup(area, POPUP_WIDTH, lines + 2);
        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new(wrapped)
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::White))
                .block(Block::bordered().border_style(HEADER_STYLE)),
            popup,
        );
    }

    fn event_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            terminal.draw(|frame| self.draw(frame))?;

            if event::poll(TICK_RATE)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if key.modifiers.contains(KeyModifiers::CONTROL)
                        && key.code == KeyCode::Char('c')
                    {
                        return Ok(());
                    }
                    if self.handle_key(key.code) == DashboardAction::Quit {
                        return Ok(());
                    }
                }
            }

            if self.app.pump() {
                self.clamp_selection();
            }
            self.app.tick(Instant::now());
        }
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

pub fn run(settings: &Settings) -> Result<()> {
    let app = App::new(super::build_api(settings), settings.export_path());
    let mut dashboard = Dashboard::new(app);

    tui::install_panic_hook();
    let mut terminal = ratatui::init();
    let result = dashboard.event_loop(&mut terminal);
    ratatui::restore();
    result
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    use super::*;
    use crate::api::fake::FakeApi;
    use crate::app::MSG_SELECT_RANGE;
    use crate::models::{Scalar, VisitRecord};

    fn rec(name: &str, amount: &str) -> VisitRecord {
        VisitRecord {
            visit_code: Some(Scalar::from("A1")),
            visit_timestamp: Some(Scalar::from("2024-01-01T10:00:00")),
            patient_name: Some(Scalar::from(name)),
            amount: Some(Scalar::from(amount)),
            ..Default::default()
        }
    }

    fn dashboard(api: Arc<FakeApi>) -> Dashboard {
        Dashboard::new(App::new(api, std::env::temp_dir()))
    }

    fn wait_loaded(d: &mut Dashboard) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while d.app.state.loading && Instant::now() < deadline {
            d.app.pump();
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(!d.app.state.loading, "fetch did not complete");
    }

    fn screen(d: &mut Dashboard) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 30)).unwrap();
        terminal.draw(|f| d.draw(f)).unwrap();
        let buf = terminal.backend().buffer();
        let width = buf.area.width as usize;
        buf.content
            .chunks(width)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn type_str(d: &mut Dashboard, s: &str) {
        for c in s.chars() {
            d.handle_key(KeyCode::Char(c));
        }
    }

    #[test]
    fn shortcut_fetches_and_renders_totals() {
        let api = Arc::new(FakeApi::returning(vec![
            rec("Ana Pérez", "100.5"),
            rec("Luis", "abc"),
            rec("Mariana", "50"),
        ]));
        let mut d = dashboard(api.clone());
        d.handle_key(KeyCode::Char('t'));
        assert!(screen(&mut d).contains(LOADING));
        wait_loaded(&mut d);

        let text = screen(&mut d);
        assert!(text.contains(BRAND));
        assert!(text.contains("Ana Pérez"));
        assert!(text.contains("2024-01-01"));
        assert!(text.contains("S/. 150.50"));
        assert!(text.contains("Registros: 3"));
        assert_eq!(api.list_count(), 1);
    }

    #[test]
    fn filter_mode_edits_active_column_live() {
        let api = Arc::new(FakeApi::returning(vec![rec("Ana", "10"), rec("Luis", "5")]));
        let mut d = dashboard(api);
        d.handle_key(KeyCode::Char('t'));
        wait_loaded(&mut d);

        d.handle_key(KeyCode::Char('f'));
        for _ in 0..Column::PatientName.index() {
            d.handle_key(KeyCode::Right);
        }
        type_str(&mut d, "lu");
        assert_eq!(d.app.state.filters.get(Column::PatientName), "lu");
        assert_eq!(d.app.state.store.visible().len(), 1);
        // 'q' is text while filtering
        d.handle_key(KeyCode::Char('q'));
        assert!(d.app.state.store.visible().is_empty());
        assert!(screen(&mut d).contains(EMPTY));

        d.handle_key(KeyCode::Backspace);
        d.handle_key(KeyCode::Enter);
        assert_eq!(d.app.state.store.visible().len(), 1);
        assert_eq!(d.handle_key(KeyCode::Char('q')), DashboardAction::Quit);
    }

    #[test]
    fn delete_clears_only_the_active_column() {
        let api = Arc::new(FakeApi::returning(vec![rec("Ana", "10"), rec("Luis", "5")]));
        let mut d = dashboard(api);
        d.handle_key(KeyCode::Char('t'));
        wait_loaded(&mut d);

        d.handle_key(KeyCode::Char('f'));
        type_str(&mut d, "a1");
        for _ in 0..Column::PatientName.index() {
            d.handle_key(KeyCode::Right);
        }
        type_str(&mut d, "zzz");
        assert!(d.app.state.store.visible().is_empty());

        d.handle_key(KeyCode::Delete);
        assert_eq!(d.app.state.filters.get(Column::PatientName), "");
        assert_eq!(d.app.state.filters.get(Column::VisitCode), "a1");
        assert_eq!(d.app.state.store.visible().len(), 2);
    }

    #[test]
    fn range_editor_applies_typed_dates() {
        let api = Arc::new(FakeApi::returning(vec![rec("Ana", "10")]));
        let mut d = dashboard(api.clone());
        d.handle_key(KeyCode::Char('r'));
        type_str(&mut d, "2024-01-01");
        // letters are ignored in date fields
        d.handle_key(KeyCode::Char('z'));
        d.handle_key(KeyCode::Tab);
        type_str(&mut d, "2024-01-31");
        assert!(screen(&mut d).contains("2024-01-31"));
        d.handle_key(KeyCode::Enter);
        wait_loaded(&mut d);

        let start = NaiveDate::from_ymd_opt(2024, 1, 1);
        let end = NaiveDate::from_ymd_opt(2024, 1, 31);
        assert_eq!(d.app.state.range, DateRange::new(start, end));
        let calls = api.list_calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].start_day, start.unwrap());
        assert_eq!(calls[0].end_day, end.unwrap());
    }

    #[test]
    fn range_editor_with_one_end_does_not_fetch() {
        let api = Arc::new(FakeApi::returning(vec![]));
        let mut d = dashboard(api.clone());
        d.handle_key(KeyCode::Char('r'));
        type_str(&mut d, "2024-01-01");
        d.handle_key(KeyCode::Enter);
        assert!(!d.app.state.loading);
        assert!(!d.app.state.range.is_complete());
        assert_eq!(api.list_count(), 0);
        assert!(screen(&mut d).contains("2024-01-01 a"));
    }

    #[test]
    fn invalid_date_keeps_editor_open() {
        let api = Arc::new(FakeApi::returning(vec![]));
        let mut d = dashboard(api.clone());
        d.handle_key(KeyCode::Char('r'));
        type_str(&mut d, "2024-13-01");
        d.handle_key(KeyCode::Enter);
        assert!(matches!(d.mode, Mode::Range { .. }));
        assert_eq!(d.app.state.range, DateRange::default());
        assert!(screen(&mut d).contains("Fecha inválida"));
        d.handle_key(KeyCode::Esc);
        assert!(matches!(d.mode, Mode::Normal));
        assert_eq!(api.list_count(), 0);
    }

    #[test]
    fn mail_without_range_shows_notification() {
        let api = Arc::new(FakeApi::returning(vec![]));
        let mut d = dashboard(api.clone());
        d.handle_key(KeyCode::Char('m'));
        assert!(screen(&mut d).contains(MSG_SELECT_RANGE));
        assert_eq!(api.report_count(), 0);
    }

    #[test]
    fn selection_stays_within_visible_rows() {
        let api = Arc::new(FakeApi::returning(vec![rec("Ana", "1"), rec("Luis", "2")]));
        let mut d = dashboard(api);
        d.handle_key(KeyCode::Char('t'));
        wait_loaded(&mut d);
        d.handle_key(KeyCode::End);
        assert_eq!(d.selected, 1);
        d.handle_key(KeyCode::Down);
        assert_eq!(d.selected, 1);

        d.handle_key(KeyCode::Char('/'));
        type_str(&mut d, "zzz");
        assert_eq!(d.selected, 0);
        d.handle_key(KeyCode::Esc);
        d.handle_key(KeyCode::Up);
        assert_eq!(d.selected, 0);
    }
}
