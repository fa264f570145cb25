use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use cognivault::session::PlayMode;
use itertools::Itertools;

use super::charting::{compute_x_bound, format_label, heat_level, score_points};
use crate::{App, HistoryView};

const HEAT_SHADES: [Color; 5] = [
    Color::Reset,
    Color::Rgb(254, 202, 202),
    Color::Rgb(252, 165, 165),
    Color::Rgb(239, 68, 68),
    Color::Rgb(185, 28, 28),
];

pub fn render_history(app: &App, f: &mut Frame) {
    let area = f.area();
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let Some(view) = app.history.as_ref() else {
        f.render_widget(
            Paragraph::new("no history yet").alignment(Alignment::Center),
            area,
        );
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1),      // title
            Constraint::Percentage(45), // chart
            Constraint::Min(5),         // heatmap + list
            Constraint::Length(1),      // legend
        ])
        .split(area);

    let mut summary = vec![
        Span::styled("history", bold_style),
        Span::raw(format!(
            "   {} xp   {}   streak {}   best n {}",
            app.stats.xp,
            app.stats.rank(app.locale()),
            app.stats.streak,
            app.stats.best_n
        )),
    ];
    if let Some(avg) = view.avg_reaction_ms {
        summary.push(Span::raw(format!("   avg reaction {avg:.0} ms")));
    }
    f.render_widget(
        Paragraph::new(Line::from(summary)).alignment(Alignment::Center),
        chunks[0],
    );

    render_score_chart(view, f, chunks[1]);

    let lower = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(24), Constraint::Min(20)])
        .split(chunks[2]);
    render_heatmap(view, f, lower[0]);
    render_recent(view, f, lower[1]);

    f.render_widget(
        Paragraph::new(Span::styled("(b)ack / (n)ext / (esc)ape", italic_style)),
        chunks[3],
    );
}

fn render_score_chart(view: &HistoryView, f: &mut Frame, area: Rect) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let points = score_points(&view.recent);
    let x_max = compute_x_bound(&points);

    let datasets = vec![Dataset::default()
        .marker(symbols::Marker::Braille)
        .style(Style::default().fg(Color::Magenta))
        .graph_type(GraphType::Line)
        .data(&points)];

    let chart = Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("session")
                .bounds([1.0, x_max])
                .labels(vec![
                    Span::styled("1", bold_style),
                    Span::styled(format_label(x_max), bold_style),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("score %")
                .bounds([0.0, 100.0])
                .labels(vec![
                    Span::styled("0", bold_style),
                    Span::styled("50", bold_style),
                    Span::styled("100", bold_style),
                ]),
        );
    f.render_widget(chart, area);
}

fn render_heatmap(view: &HistoryView, f: &mut Frame, area: Rect) {
    let max = view.heatmap.iter().copied().max().unwrap_or(0);
    let mut lines = Vec::with_capacity(3);
    for row in view.heatmap.chunks(3) {
        let spans: Vec<Span> = row
            .iter()
            .map(|&count| {
                Span::styled(
                    format!(" {count:>3} "),
                    Style::default().bg(HEAT_SHADES[heat_level(count, max)]),
                )
            })
            .collect();
        lines.push(Line::from(spans));
    }
    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title("missed positions"),
        ),
        area,
    );
}

fn render_recent(view: &HistoryView, f: &mut Frame, area: Rect) {
    let lines: Vec<Line> = view
        .recent
        .iter()
        .map(|r| {
            let tags = [
                r.is_daily.then_some("daily"),
                r.challenge_seed.map(|_| "challenge"),
                match r.play_mode {
                    PlayMode::Standard => None,
                    PlayMode::Practice => Some("practice"),
                    PlayMode::Marathon => Some("marathon"),
                },
            ]
            .into_iter()
            .flatten()
            .join(" ");
            Line::from(format!(
                "{}  {}-back {:<8} {:>3}%  +{} xp  {tags}",
                r.date.format("%Y-%m-%d %H:%M"),
                r.level,
                r.mode.to_string(),
                r.score,
                r.xp_earned
            ))
        })
        .collect();
    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("recent")),
        area,
    );
}
