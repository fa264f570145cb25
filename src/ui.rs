pub mod charting;
pub mod history;
pub mod screen;

use std::time::Instant;

use cognivault::{
    reward::MAX_LEVEL,
    scoring::ModalityScore,
    session::{FinishReason, PlayMode, Response},
    stimulus::{GameMode, Modality, Swatch},
    util::ReactionSummary,
};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
    Frame,
};
use webbrowser::Browser;

use crate::{App, AppState, Outcome};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;
/// Cell colour outside triple mode, where colour is not a channel.
const NEUTRAL_SWATCH: Swatch = Swatch(0x6366f1);

pub fn draw(app: &App, f: &mut Frame) {
    screen::current_screen(app.state).render(app, f);
}

fn swatch_color(swatch: Swatch) -> Color {
    let (r, g, b) = swatch.channels();
    Color::Rgb(r, g, b)
}

fn modality_key(modality: Modality) -> char {
    match modality {
        Modality::Position => 'a',
        Modality::Sound => 'l',
        Modality::Color => 's',
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Playing => render_play(self, area, buf, Instant::now()),
            AppState::Results | AppState::History => render_results(self, area, buf),
        }
    }
}

fn render_play(app: &App, area: Rect, buf: &mut Buffer, now: Instant) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_style = Style::default().add_modifier(Modifier::DIM);

    let session = &app.session;
    let config = session.config();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // header
            Constraint::Length(1),
            Constraint::Min(9),    // grid
            Constraint::Length(3), // letter
            Constraint::Length(1), // legend
            Constraint::Length(1), // hint
        ])
        .split(area);

    let progress = match config.play_mode {
        PlayMode::Standard => format!("{}/{}", session.current_index(), session.sequence().len()),
        PlayMode::Practice | PlayMode::Marathon => session.current_index().to_string(),
    };
    let mut header = vec![
        Span::styled(format!("{}-back", config.level), bold_style),
        Span::raw(format!(
            "  {}  {}  {}   step {progress}",
            config.mode, config.speed, config.play_mode
        )),
    ];
    if session.combo() > 1 {
        header.push(Span::styled(
            format!("   combo x{}", session.combo()),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));
    }
    if session.is_daily() {
        header.push(Span::styled("   daily", Style::default().fg(Color::Cyan)));
    }
    if let Some(c) = app.settings.incoming {
        header.push(Span::styled(
            format!(
                "   challenge{}",
                c.target_score.map(|s| format!(" (beat {s}%)")).unwrap_or_default()
            ),
            Style::default().fg(Color::Magenta),
        ));
    }
    Paragraph::new(Line::from(header))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    let lit = if app.clock.lit(now) {
        session.current_stimulus().copied()
    } else {
        None
    };

    let grid_area = centered_square(chunks[2]);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Ratio(1, 3); 3])
        .split(grid_area);
    for (r, row) in rows.iter().enumerate() {
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 3); 3])
            .split(*row);
        for (c, cell) in cells.iter().enumerate() {
            let idx = (r * 3 + c) as u8;
            let mut block = Block::default()
                .borders(Borders::ALL)
                .border_style(dim_style);
            if let Some(stimulus) = lit.filter(|s| s.position == idx) {
                let swatch = match config.mode {
                    GameMode::Triple => stimulus.color,
                    _ => NEUTRAL_SWATCH,
                };
                block = block
                    .border_style(Style::default().fg(swatch_color(swatch)))
                    .style(Style::default().bg(swatch_color(swatch)));
            }
            block.render(*cell, buf);
        }
    }

    if config.mode.tracks(Modality::Sound) {
        let letter = lit.map(|s| s.sound.to_string()).unwrap_or_default();
        Paragraph::new(Span::styled(letter, bold_style.fg(Color::White)))
            .alignment(Alignment::Center)
            .render(chunks[3], buf);
    }

    let feedback = app.feedback_at(now);
    let legend: Vec<Span> = config
        .mode
        .modalities()
        .iter()
        .flat_map(|&m| {
            let style = match feedback.filter(|f| f.modality == m).map(|f| f.response) {
                Some(Response::Hit) => Style::default().fg(Color::Black).bg(Color::Green),
                Some(Response::FalseAlarm) => Style::default().fg(Color::Black).bg(Color::Red),
                Some(Response::Duplicate) => Style::default().fg(Color::Yellow),
                _ => bold_style,
            };
            [
                Span::styled(format!(" ({}) {m} ", modality_key(m)), style),
                Span::raw("   "),
            ]
        })
        .collect();
    Paragraph::new(Line::from(legend))
        .alignment(Alignment::Center)
        .render(chunks[4], buf);

    let hint = if session.current_index() < config.level {
        format!("memorise the first {} steps", config.level)
    } else {
        "(esc) stop".to_string()
    };
    Paragraph::new(Span::styled(hint, dim_style.add_modifier(Modifier::ITALIC)))
        .alignment(Alignment::Center)
        .render(chunks[5], buf);
}

/// Largest roughly square region centred in `area`; terminal cells are
/// about twice as tall as wide.
fn centered_square(area: Rect) -> Rect {
    let height = area.height.min(area.width / 2).max(3);
    let width = (height * 2).min(area.width);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height: height.min(area.height),
    }
}

fn finish_title(outcome: &Outcome) -> &'static str {
    match outcome.reason {
        FinishReason::Completed => "session complete",
        FinishReason::MarathonFailure => "marathon over",
        FinishReason::Stopped => "session stopped",
    }
}

fn modality_line(modality: Modality, score: &ModalityScore) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("{:<9}", modality.to_string()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("{}/{} hits", score.correct, score.total_possible),
            Style::default().fg(Color::Green),
        ),
        Span::raw("   "),
        Span::styled(format!("{} missed", score.missed), Style::default().fg(Color::Yellow)),
        Span::raw("   "),
        Span::styled(
            format!("{} false alarms", score.false_alarms),
            Style::default().fg(Color::Red),
        ),
    ])
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(outcome) = app.outcome.as_ref() else {
        return;
    };
    let record = &outcome.record;
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let mut lines = vec![
        Line::from(Span::styled(finish_title(outcome), italic_style)),
        Line::from(""),
        Line::from(Span::styled(
            format!("{}%", record.score),
            bold_style.fg(score_color(record.score)),
        )),
    ];

    if let Some(target) = outcome.target_score {
        let verdict = if record.score > target {
            Span::styled("challenge beaten", Style::default().fg(Color::Green))
        } else if record.score == target {
            Span::styled("challenge tied", Style::default().fg(Color::Yellow))
        } else {
            Span::styled("challenge lost", Style::default().fg(Color::Red))
        };
        lines.push(Line::from(vec![Span::raw(format!("target {target}%   ")), verdict]));
    }
    lines.push(Line::from(""));

    for &m in record.mode.modalities() {
        lines.push(modality_line(m, record.details.get(m)));
    }
    lines.push(Line::from(""));

    let mut rank = vec![
        Span::styled(format!("+{} xp", record.xp_earned), bold_style.fg(Color::Cyan)),
        Span::raw(format!("   {} total   ", app.stats.xp)),
        Span::styled(outcome.rank, bold_style),
    ];
    if outcome.rank != outcome.rank_before {
        rank.push(Span::styled(
            format!("  (up from {})", outcome.rank_before),
            Style::default().fg(Color::Green),
        ));
    }
    lines.push(Line::from(rank));
    lines.push(Line::from(format!(
        "streak {} day{}   best n {}",
        app.stats.streak,
        if app.stats.streak == 1 { "" } else { "s" },
        app.stats.best_n,
    )));

    let level_note = match outcome.next_level.cmp(&record.level) {
        std::cmp::Ordering::Greater => {
            format!("level up: next session at {}-back", outcome.next_level)
        }
        std::cmp::Ordering::Less => format!("next session at {}-back", outcome.next_level),
        std::cmp::Ordering::Equal if record.level == MAX_LEVEL && record.score >= 90 => {
            "top level reached".to_string()
        }
        std::cmp::Ordering::Equal => format!("staying at {}-back", outcome.next_level),
    };
    lines.push(Line::from(level_note));

    if let Some(rt) = ReactionSummary::from_times(&record.reaction_times) {
        lines.push(Line::from(format!(
            "reaction {:.0} ms avg (±{:.0})   fastest {} ms   best combo {}",
            rt.mean_ms, rt.spread_ms, rt.fastest_ms, record.max_combo
        )));
    }

    if let Some(link) = app.share_link() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "challenge a friend:",
            italic_style,
        )));
        lines.push(Line::from(Span::styled(link, Style::default().fg(Color::Magenta))));
    }

    if let Some(notice) = &app.notice {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            notice.clone(),
            Style::default().fg(Color::Yellow),
        )));
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[0], buf);

    let legend = if app.share_link().is_some() && Browser::is_available() {
        "(r)etry / (n)ext / (h)istory / (c)hallenge / (esc)ape"
    } else {
        "(r)etry / (n)ext / (h)istory / (esc)ape"
    };
    Paragraph::new(Span::styled(legend, italic_style)).render(chunks[1], buf);
}

fn score_color(score: u32) -> Color {
    match score {
        90.. => Color::Green,
        60..=89 => Color::Yellow,
        _ => Color::Red,
    }
}
