//! Ratatui-based sales dashboard.
//!
//! A filter panel (date range, category and region allow-lists) drives the
//! same filter-and-aggregate query as the CLI. Every change recomputes the
//! KPI header, the monthly sales chart and the ranked bar lists.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Months, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::app::pipeline::{DatasetHandle, QueryOutput, run_query};
use crate::cli::FilterArgs;
use crate::config::{OutputSettings, Settings};
use crate::domain::{Dataset, FilterSpec, Ranked};
use crate::error::AppError;
use crate::report::fmt_currency;

mod plotters_chart;

use plotters_chart::MonthlySalesChart;

/// Start the dashboard.
///
/// The dataset is loaded (and the initial filter validated) before the
/// terminal switches to raw mode, so load errors print normally.
pub fn run(handle: DatasetHandle, filter: &FilterArgs, settings: &Settings) -> Result<(), AppError> {
    let dataset = handle.get()?;
    let spec = crate::app::filter_spec_from_args(&dataset, filter)?;
    let mut app = App::new(handle, spec, settings.output.clone())?;

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Start,
    End,
    Categories,
    Regions,
}

impl Field {
    fn next(self) -> Self {
        match self {
            Field::Start => Field::End,
            Field::End => Field::Categories,
            Field::Categories | Field::Regions => Field::Regions,
        }
    }

    fn prev(self) -> Self {
        match self {
            Field::Start | Field::End => Field::Start,
            Field::Categories => Field::End,
            Field::Regions => Field::Categories,
        }
    }
}

struct App {
    handle: DatasetHandle,
    dataset: Arc<Dataset>,
    categories: Vec<String>,
    regions: Vec<String>,
    spec: FilterSpec,
    field: Field,
    category_cursor: usize,
    region_cursor: usize,
    /// Text being typed while a date field is in edit mode.
    date_input: Option<String>,
    status: String,
    output: QueryOutput,
    output_settings: OutputSettings,
}

impl App {
    fn new(handle: DatasetHandle, spec: FilterSpec, output_settings: OutputSettings) -> Result<Self, AppError> {
        let dataset = handle.get()?;
        let mut categories = dataset.categories();
        categories.sort();
        let mut regions = dataset.regions();
        regions.sort();
        let output = run_query(&dataset, &spec);

        Ok(Self {
            handle,
            dataset,
            categories,
            regions,
            spec,
            field: Field::Start,
            category_cursor: 0,
            region_cursor: 0,
            date_input: None,
            status: "Ready.".to_string(),
            output,
            output_settings,
        })
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
                Event::Resize(_, _) => needs_redraw = true,
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the dashboard should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.date_input.is_some() {
            self.handle_date_edit(code);
            return false;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up => self.field = self.field.prev(),
            KeyCode::Down | KeyCode::Tab => self.field = self.field.next(),
            KeyCode::Left => self.adjust(-1),
            KeyCode::Right => self.adjust(1),
            KeyCode::Enter => {
                if let Some(date) = self.selected_date() {
                    self.date_input = Some(date.format("%Y-%m-%d").to_string());
                    self.status = "Editing date (YYYY-MM-DD). Enter to apply, Esc to cancel.".to_string();
                }
            }
            KeyCode::Char(' ') => self.toggle_selected(),
            KeyCode::Char('a') => self.select_all(),
            KeyCode::Char('n') => self.select_none(),
            KeyCode::Char('e') => self.export_filtered(),
            KeyCode::Char('c') => self.write_charts(),
            _ => {}
        }
        false
    }

    fn handle_date_edit(&mut self, code: KeyCode) {
        let Some(input) = self.date_input.as_mut() else {
            return;
        };
        match code {
            KeyCode::Esc => {
                self.date_input = None;
                self.status = "Date edit canceled.".to_string();
            }
            KeyCode::Enter => {
                let text = input.trim().to_string();
                self.date_input = None;
                match NaiveDate::parse_from_str(&text, "%Y-%m-%d") {
                    Ok(date) => self.set_selected_date(date),
                    Err(e) => self.status = format!("Invalid date '{text}': {e}"),
                }
            }
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Char(c) if c.is_ascii_digit() || c == '-' => input.push(c),
            _ => {}
        }
    }

    fn selected_date(&self) -> Option<NaiveDate> {
        match self.field {
            Field::Start => Some(self.spec.date_start()),
            Field::End => Some(self.spec.date_end()),
            Field::Categories | Field::Regions => None,
        }
    }

    /// Left/Right: shift a date by a month, or move the list cursor.
    fn adjust(&mut self, delta: i32) {
        match self.field {
            Field::Start | Field::End => {
                let Some(current) = self.selected_date() else {
                    return;
                };
                let shifted = if delta >= 0 {
                    current.checked_add_months(Months::new(1))
                } else {
                    current.checked_sub_months(Months::new(1))
                };
                if let Some(date) = shifted {
                    self.set_selected_date(date);
                }
            }
            Field::Categories => self.category_cursor = step(self.category_cursor, delta, self.categories.len()),
            Field::Regions => self.region_cursor = step(self.region_cursor, delta, self.regions.len()),
        }
    }

    fn set_selected_date(&mut self, date: NaiveDate) {
        let (start, end) = match self.field {
            Field::Start => (date, self.spec.date_end()),
            Field::End => (self.spec.date_start(), date),
            Field::Categories | Field::Regions => return,
        };
        match self.spec.clone().with_dates(start, end) {
            Ok(spec) => {
                self.spec = spec;
                self.refresh();
                self.status = format!("Date range: {start} .. {end}");
            }
            Err(e) => self.status = e.to_string(),
        }
    }

    fn toggle_selected(&mut self) {
        match self.field {
            Field::Categories => {
                if let Some(value) = self.categories.get(self.category_cursor).cloned() {
                    self.spec.toggle_category(&value);
                    self.refresh();
                    self.status = format!("Toggled category {value}");
                }
            }
            Field::Regions => {
                if let Some(value) = self.regions.get(self.region_cursor).cloned() {
                    self.spec.toggle_region(&value);
                    self.refresh();
                    self.status = format!("Toggled region {value}");
                }
            }
            Field::Start | Field::End => {}
        }
    }

    /// `a`: select every value of the focused list, or reset the date range.
    fn select_all(&mut self) {
        self.spec = match self.field {
            Field::Categories => self.spec.clone().with_categories(self.categories.iter().cloned()),
            Field::Regions => self.spec.clone().with_regions(self.regions.iter().cloned()),
            Field::Start | Field::End => {
                let all = FilterSpec::all(&self.dataset);
                self.spec
                    .clone()
                    .with_dates(all.date_start(), all.date_end())
                    .unwrap_or(all)
            }
        };
        self.refresh();
        self.status = "Selection reset.".to_string();
    }

    fn select_none(&mut self) {
        let none: [&str; 0] = [];
        match self.field {
            Field::Categories => self.spec = self.spec.clone().with_categories(none),
            Field::Regions => self.spec = self.spec.clone().with_regions(none),
            Field::Start | Field::End => return,
        }
        self.refresh();
        self.status = "Selection cleared.".to_string();
    }

    fn refresh(&mut self) {
        self.output = run_query(&self.dataset, &self.spec);
    }

    fn export_filtered(&mut self) {
        let path = self.output_settings.filtered_export.clone();
        let filtered = crate::engine::filter(&self.dataset, &self.spec);
        self.status = match crate::io::export::write_filtered_csv(&path, &filtered) {
            Ok(()) => format!("Exported {} rows to {}", filtered.len(), path.display()),
            Err(err) => format!("Export failed: {err}"),
        };
    }

    fn write_charts(&mut self) {
        let dir = self.output_settings.chart_dir.clone();
        let size = (self.output_settings.chart_width, self.output_settings.chart_height);
        self.status = match crate::chart::write_charts(&self.output.result, &dir, size) {
            Ok(written) => format!("Wrote {} charts to {}", written.len(), dir.display()),
            Err(err) => format!("Chart write failed: {err}"),
        };
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(3)])
            .split(frame.area());

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let result = &self.output.result;
        let gray = Style::default().fg(Color::Gray);
        let lines = vec![
            Line::from(vec![
                Span::styled("superstore", Style::default().fg(Color::Cyan)),
                Span::raw(format!(" - {}", self.handle.options().path.display())),
            ]),
            Line::from(vec![
                Span::styled("Orders ", gray),
                Span::styled(result.order_count.to_string(), Style::default().add_modifier(Modifier::BOLD)),
                Span::styled("  Total Sales ", gray),
                Span::styled(fmt_currency(result.total_sales), Style::default().add_modifier(Modifier::BOLD)),
                Span::styled("  Total Profit ", gray),
                Span::styled(fmt_currency(result.total_profit), profit_style(result.total_profit)),
                Span::styled("  Avg Order ", gray),
                Span::styled(
                    fmt_currency(result.average_order_value),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(Span::styled(
                format!(
                    "{} .. {} | {}/{} categories | {}/{} regions | {} of {} rows",
                    self.spec.date_start(),
                    self.spec.date_end(),
                    self.spec.categories().len(),
                    self.categories.len(),
                    self.spec.regions().len(),
                    self.regions.len(),
                    self.output.matched,
                    self.dataset.len()
                ),
                gray,
            )),
        ];

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(30), Constraint::Min(0)])
            .split(area);

        self.draw_filters(frame, cols[0]);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(cols[1]);
        self.draw_chart(frame, rows[0]);

        let bars = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[1]);
        draw_bars(frame, bars[0], "Sales by Category", &self.output.result.sales_by_category);
        draw_bars(frame, bars[1], "Profit by Region", &self.output.result.profit_by_region);
    }

    fn draw_filters(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(self.categories.len() as u16 + 2),
                Constraint::Min(0),
            ])
            .split(area);

        let start = match (&self.date_input, self.field) {
            (Some(input), Field::Start) => format!("{input}_"),
            _ => self.spec.date_start().to_string(),
        };
        let end = match (&self.date_input, self.field) {
            (Some(input), Field::End) => format!("{input}_"),
            _ => self.spec.date_end().to_string(),
        };
        let dates = List::new(vec![
            ListItem::new(format!("From: {start}")),
            ListItem::new(format!("To:   {end}")),
        ])
        .block(self.panel("Date Range", matches!(self.field, Field::Start | Field::End)))
        .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
        .highlight_symbol("» ");
        let mut state = ListState::default();
        state.select(match self.field {
            Field::Start => Some(0),
            Field::End => Some(1),
            Field::Categories | Field::Regions => None,
        });
        frame.render_stateful_widget(dates, chunks[0], &mut state);

        self.draw_checklist(
            frame,
            chunks[1],
            "Categories",
            &self.categories,
            self.spec.categories(),
            (self.field == Field::Categories).then_some(self.category_cursor),
        );
        self.draw_checklist(
            frame,
            chunks[2],
            "Regions",
            &self.regions,
            self.spec.regions(),
            (self.field == Field::Regions).then_some(self.region_cursor),
        );
    }

    fn draw_checklist(
        &self,
        frame: &mut ratatui::Frame<'_>,
        area: Rect,
        title: &str,
        values: &[String],
        selected: &std::collections::BTreeSet<String>,
        cursor: Option<usize>,
    ) {
        let items: Vec<ListItem> = values
            .iter()
            .map(|v| {
                let mark = if selected.contains(v) { "[x]" } else { "[ ]" };
                ListItem::new(format!("{mark} {v}"))
            })
            .collect();
        let list = List::new(items)
            .block(self.panel(title, cursor.is_some()))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");
        let mut state = ListState::default();
        state.select(cursor);
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn panel<'a>(&self, title: &'a str, focused: bool) -> Block<'a> {
        let style = if focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };
        Block::default().title(title).borders(Borders::ALL).border_style(style)
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Monthly Sales").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let series = &self.output.result.monthly_sales_series;
        if series.is_empty() {
            let msg = Paragraph::new("No orders match the filter.").style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        }

        let widget = MonthlySalesChart::from_series(series, fmt_axis_month, fmt_axis_dollars);
        let (x_bounds, y_bounds) = (widget.x_bounds, widget.y_bounds);
        let (chart_rect, insets) = chart_layout(inner);

        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets, x_bounds, y_bounds);
        }
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ field  ←/→ move  Enter edit date  Space toggle  a all  n none  e export  c charts  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn step(cursor: usize, delta: i32, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    if delta >= 0 {
        (cursor + 1).min(len - 1)
    } else {
        cursor.saturating_sub(1)
    }
}

fn profit_style(value: Decimal) -> Style {
    let color = if value.is_sign_negative() && !value.is_zero() {
        Color::Red
    } else {
        Color::Green
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

fn draw_bars(frame: &mut ratatui::Frame<'_>, area: Rect, title: &str, rows: &[Ranked]) {
    let block = Block::default().title(title).borders(Borders::ALL);
    let inner = block.inner(area);
    let lines = if rows.is_empty() {
        vec![Line::from(Span::styled("(no data)", Style::default().fg(Color::Yellow)))]
    } else {
        bar_lines(rows, inner.width)
    };
    frame.render_widget(Paragraph::new(Text::from(lines)).block(block), area);
}

const BAR_LABEL_WIDTH: usize = 14;
const BAR_VALUE_WIDTH: usize = 14;

/// One text bar per row, scaled to the largest absolute value.
fn bar_lines(rows: &[Ranked], width: u16) -> Vec<Line<'static>> {
    let bar_width = (width as usize).saturating_sub(BAR_LABEL_WIDTH + BAR_VALUE_WIDTH + 2).max(1);
    let max_abs = rows
        .iter()
        .map(|r| r.value.abs())
        .max()
        .unwrap_or(Decimal::ZERO);

    rows.iter()
        .map(|r| {
            let len = if max_abs.is_zero() {
                0
            } else {
                (r.value.abs() / max_abs * Decimal::from(bar_width))
                    .round()
                    .to_usize()
                    .unwrap_or(0)
            };
            let label: String = r.key.chars().take(BAR_LABEL_WIDTH - 1).collect();
            Line::from(vec![
                Span::raw(format!("{label:<BAR_LABEL_WIDTH$}")),
                Span::styled("█".repeat(len), profit_style(r.value)),
                Span::raw(format!(" {:>BAR_VALUE_WIDTH$}", fmt_currency(r.value))),
            ])
        })
        .collect()
}

fn fmt_axis_month(v: f64) -> String {
    let o = v.round() as i64;
    format!("{:04}-{:02}", o.div_euclid(12), o.rem_euclid(12) + 1)
}

fn fmt_axis_dollars(v: f64) -> String {
    if v.abs() >= 1000.0 {
        format!("{:.0}k", v / 1000.0)
    } else {
        format!("{v:.0}")
    }
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10 || inner.height <= insets.top + insets.bottom + 5 {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = fmt_axis_month(x_val);
        let label_len = label.len() as u16;
        let start = x.saturating_sub(label_len / 2).max(inner.x);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 || start + label_len > inner.x + inner.width {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = fmt_axis_dollars(y_val);
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label_len);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    let x_label = Paragraph::new("month")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }

    let y_label = Paragraph::new("sales ($)").style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: insets.left.saturating_sub(1),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}
