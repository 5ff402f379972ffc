//! Daily dashboard screen rendering
//!
//! Shows the selected day's headline figures as cards, the accumulated
//! consumption and demand profile charts, and the split of energy across the
//! three phases.

use chrono::NaiveDate;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use super::widgets::SeriesSparkline;
use crate::app::{App, LoadState};
use crate::data::{DailyConsumption, DayView, Phase, TimeSeries, Trend};

/// Color constants for consistent styling
mod colors {
    use ratatui::style::Color;

    /// Higher than the previous day (rose)
    pub const UP: Color = Color::LightRed;
    /// Lower than or equal to the previous day (emerald)
    pub const DOWN: Color = Color::Green;
    /// Placeholder and unavailable text
    pub const UNKNOWN: Color = Color::DarkGray;
    /// Section headers
    pub const HEADER: Color = Color::Cyan;
    /// Accumulated consumption columns
    pub const ACCUMULATED: Color = Color::Blue;
    /// Demand profile columns
    pub const DEMAND: Color = Color::Yellow;
    /// Primary text
    pub const PRIMARY: Color = Color::White;
    /// Secondary/dimmed text
    pub const SECONDARY: Color = Color::Gray;
}

/// Renders the dashboard for the app's selected day
pub fn render(frame: &mut Frame, app: &App) {
    draw(frame, app.selected_date, &app.state);
}

/// Renders the dashboard for `date` in `state`
pub fn draw(frame: &mut Frame, date: NaiveDate, state: &LoadState) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(10),   // Content
            Constraint::Length(1), // Help text
        ])
        .split(area);

    render_header(frame, chunks[0], date, state);

    match state {
        LoadState::Error(_) => render_error(frame, chunks[1]),
        LoadState::Loading => render_content(frame, chunks[1], None),
        LoadState::Loaded(view) => render_content(frame, chunks[1], Some(view.as_ref())),
    }

    render_help_text(frame, chunks[2]);
}

fn render_header(frame: &mut Frame, area: Rect, date: NaiveDate, state: &LoadState) {
    let source = match state {
        LoadState::Loading => Span::styled("loading...", Style::default().fg(colors::UNKNOWN)),
        LoadState::Loaded(view) if view.from_cache => {
            Span::styled("cached", Style::default().fg(colors::SECONDARY))
        }
        LoadState::Loaded(_) => Span::styled("live", Style::default().fg(colors::DOWN)),
        LoadState::Error(_) => Span::styled("unavailable", Style::default().fg(colors::UP)),
    };

    let line = Line::from(vec![
        Span::styled(
            "Daily Dashboard",
            Style::default()
                .fg(colors::HEADER)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            date.format("%d/%m/%Y").to_string(),
            Style::default()
                .fg(colors::PRIMARY)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        source,
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::HEADER));
    frame.render_widget(Paragraph::new(line).block(block), area);
}

/// Renders cards, charts and phases; `None` draws loading placeholders
fn render_content(frame: &mut Frame, area: Rect, view: Option<&DayView>) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Cards
            Constraint::Min(5),    // Charts
            Constraint::Length(8), // Phases
        ])
        .split(area);

    render_cards(frame, rows[0], view.map(|v| &v.data));

    let charts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);
    render_chart(
        frame,
        charts[0],
        "Accumulated Consumption",
        colors::ACCUMULATED,
        view.map(|v| v.accumulated.as_ref()),
    );
    render_chart(
        frame,
        charts[1],
        "Demand Profile",
        colors::DEMAND,
        view.map(|v| v.load_curve.as_ref()),
    );

    render_phases(frame, rows[2], view.map(|v| &v.data));
}

fn render_cards(frame: &mut Frame, area: Rect, data: Option<&DailyConsumption>) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    let (total, average, peak, peak_time) = match data {
        Some(d) => (
            card_lines(
                format!("{:.1} kWh", d.total_kwh()),
                d.total_consumption_variation,
            ),
            card_lines(
                format!("{:.0} W", d.average_demand),
                d.average_demand_variation,
            ),
            card_lines(format!("{:.0} W", d.peak_demand), d.peak_demand_variation),
            vec![
                value_line(d.peak_time.clone()),
                Line::from(vec![
                    Span::styled(
                        d.previous_peak_time.clone(),
                        Style::default().fg(Color::Yellow),
                    ),
                    Span::styled(" the previous day", Style::default().fg(colors::SECONDARY)),
                ]),
            ],
        ),
        None => (
            placeholder_lines(),
            placeholder_lines(),
            placeholder_lines(),
            placeholder_lines(),
        ),
    };

    render_card(frame, cards[0], "Total Consumption", total);
    render_card(frame, cards[1], "Average Demand", average);
    render_card(frame, cards[2], "Maximum Demand", peak);
    render_card(frame, cards[3], "Peak Time", peak_time);
}

fn render_card(frame: &mut Frame, area: Rect, title: &str, lines: Vec<Line<'static>>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::SECONDARY))
        .title(Span::styled(
            format!(" {} ", title),
            Style::default().fg(colors::HEADER),
        ));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn card_lines(value: String, variation: f64) -> Vec<Line<'static>> {
    vec![
        value_line(value),
        variation_line(variation),
        Line::from(Span::styled(
            "compared to previous day",
            Style::default().fg(colors::SECONDARY),
        )),
    ]
}

fn value_line(value: String) -> Line<'static> {
    Line::from(Span::styled(
        value,
        Style::default()
            .fg(colors::PRIMARY)
            .add_modifier(Modifier::BOLD),
    ))
}

/// "↑ 3.5%", colored by direction
fn variation_line(variation: f64) -> Line<'static> {
    let trend = Trend::from_variation(variation);
    Line::from(Span::styled(
        format!("{} {}%", trend.arrow(), format_percent(variation.abs())),
        Style::default().fg(trend_color(trend)),
    ))
}

fn placeholder_lines() -> Vec<Line<'static>> {
    vec![Line::from(Span::styled(
        "Loading...",
        Style::default().fg(colors::UNKNOWN),
    ))]
}

fn trend_color(trend: Trend) -> Color {
    match trend {
        Trend::Up => colors::UP,
        Trend::Down => colors::DOWN,
    }
}

/// Formats a percentage without trailing zeros (3.50 -> "3.5", 4.0 -> "4")
fn format_percent(value: f64) -> String {
    let text = format!("{:.2}", value);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Renders one chart panel
///
/// `series` is `None` while loading and `Some(None)` when the chart blob
/// could not be parsed.
fn render_chart(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    color: Color,
    series: Option<Option<&TimeSeries>>,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::SECONDARY))
        .title(Span::styled(
            format!(" {} ", title),
            Style::default().fg(colors::HEADER),
        ));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let points = match series {
        None => {
            frame.render_widget(Paragraph::new(placeholder_lines()), inner);
            return;
        }
        Some(None) => {
            render_chart_message(frame, inner, "Chart data unavailable");
            return;
        }
        Some(Some(points)) if points.is_empty() => {
            render_chart_message(frame, inner, "No chart data");
            return;
        }
        Some(Some(points)) => points,
    };

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    let values: Vec<f64> = points.iter().map(|p| p.value).collect();
    frame.render_widget(
        SeriesSparkline::new(&values).style(Style::default().fg(color)),
        parts[0],
    );

    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return;
    };
    let peak = values.iter().copied().fold(f64::MIN, f64::max);
    let axis = Line::from(vec![
        Span::styled(
            format!(
                "{} - {}",
                first.time.format("%H:%M"),
                last.time.format("%H:%M")
            ),
            Style::default().fg(colors::SECONDARY),
        ),
        Span::raw("  "),
        Span::styled(
            format!("max {:.0}", peak),
            Style::default().fg(colors::PRIMARY),
        ),
    ]);
    frame.render_widget(Paragraph::new(axis), parts[1]);
}

fn render_chart_message(frame: &mut Frame, area: Rect, message: &str) {
    let paragraph = Paragraph::new(Line::from(Span::styled(
        message.to_string(),
        Style::default().fg(colors::UNKNOWN),
    )))
    .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

fn render_phases(frame: &mut Frame, area: Rect, data: Option<&DailyConsumption>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::SECONDARY))
        .title(Span::styled(
            " Consumption by Phase ",
            Style::default().fg(colors::HEADER),
        ));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(data) = data else {
        frame.render_widget(Paragraph::new(placeholder_lines()), inner);
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2); 3])
        .split(inner);

    for (phase, row) in Phase::ALL.iter().zip(rows.iter()) {
        render_phase_row(frame, *row, data, *phase);
    }
}

fn render_phase_row(frame: &mut Frame, area: Rect, data: &DailyConsumption, phase: Phase) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(38), Constraint::Min(10)])
        .split(area);

    let kwh = data.phase_consumption(phase) / 1000.0;
    let share = data.phase_share(phase);
    let variation = data.phase_variation(phase);
    let trend = Trend::from_variation(variation);

    let text = Line::from(vec![
        Span::styled(
            format!("{:<8}", phase.label()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("{:>7.1} kWh", kwh),
            Style::default().fg(colors::PRIMARY),
        ),
        Span::styled(
            match share {
                Some(share) => format!(" ({:.1}%)", share),
                None => " (-)".to_string(),
            },
            Style::default().fg(colors::SECONDARY),
        ),
        Span::raw(" "),
        Span::styled(
            format!("{} {}%", trend.arrow(), format_percent(variation.abs())),
            Style::default().fg(trend_color(trend)),
        ),
    ]);
    frame.render_widget(Paragraph::new(text), columns[0]);

    let ratio = share.map(|s| (s / 100.0).clamp(0.0, 1.0)).unwrap_or(0.0);
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(colors::HEADER).bg(Color::Black))
        .ratio(ratio)
        .label(String::new());
    let gauge_area = Rect {
        height: columns[1].height.min(1),
        ..columns[1]
    };
    frame.render_widget(gauge, gauge_area);
}

/// Renders the error view shown when the API is unavailable
fn render_error(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::UP));

    let message = Paragraph::new(vec![
        Line::default(),
        Line::from(Span::styled(
            "Oops!",
            Style::default()
                .fg(colors::PRIMARY)
                .add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(Span::styled(
            "We couldn't load the data for this date right now.",
            Style::default().fg(colors::SECONDARY),
        )),
        Line::from(Span::styled(
            "Please check your connection and try again in a moment.",
            Style::default().fg(colors::SECONDARY),
        )),
        Line::default(),
        Line::from(vec![
            Span::styled("r", Style::default().fg(colors::HEADER)),
            Span::styled(" Retry", Style::default().fg(colors::SECONDARY)),
        ]),
    ])
    .alignment(Alignment::Center)
    .block(block);

    frame.render_widget(message, area);
}

fn render_help_text(frame: &mut Frame, area: Rect) {
    let help_line = Line::from(vec![
        Span::styled("←/→", Style::default().fg(colors::HEADER)),
        Span::styled(" Day", Style::default().fg(colors::SECONDARY)),
        Span::raw("  "),
        Span::styled("t", Style::default().fg(colors::HEADER)),
        Span::styled(" Today", Style::default().fg(colors::SECONDARY)),
        Span::raw("  "),
        Span::styled("r", Style::default().fg(colors::HEADER)),
        Span::styled(" Reload", Style::default().fg(colors::SECONDARY)),
        Span::raw("  "),
        Span::styled("?", Style::default().fg(colors::HEADER)),
        Span::styled(" Help", Style::default().fg(colors::SECONDARY)),
        Span::raw("  "),
        Span::styled("q", Style::default().fg(colors::HEADER)),
        Span::styled(" Quit", Style::default().fg(colors::SECONDARY)),
    ]);

    frame.render_widget(Paragraph::new(help_line), area);
}
