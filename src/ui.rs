pub mod score;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, Paragraph, Widget, Wrap},
};
use webbrowser::Browser;

use chirp::quiz::{Stage, Verdict};

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;
const POPUP_WIDTH: u16 = 40;
const POPUP_HEIGHT: u16 = 9;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Notice => render_notice(self, area, buf),
            AppState::Quiz => render_quiz(self, area, buf),
            AppState::Exhausted => {
                render_quiz(self, area, buf);
                render_exhausted(self, area, buf);
            }
        }
    }
}

fn render_notice(app: &App, area: Rect, buf: &mut Buffer) {
    let text = format!(
        "{}\n\n(press any key to start)",
        app.notice.as_deref().unwrap_or_default()
    );
    let popup = centered(area, area.width.saturating_sub(HORIZONTAL_MARGIN * 4), 9);
    Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Missing metadata")
                .border_style(Style::default().fg(Color::Yellow)),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(popup, buf);
}

fn render_quiz(app: &App, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);
    let dim_style = Style::default().add_modifier(Modifier::DIM);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(3),    // image panel
            Constraint::Length(1), // common name
            Constraint::Length(1), // latin name
            Constraint::Length(2), // credits
            Constraint::Length(1), // verdict / status
            Constraint::Length(1), // score gauge
            Constraint::Length(1), // remaining
            Constraint::Length(1), // legend
        ])
        .split(area);

    let quiz = &app.quiz;
    let item = quiz.current_item();
    let stage = quiz.stage();

    let panel_text = match (item, stage.image_visible()) {
        (Some(item), true) => match &item.image {
            Some(image) => format!(
                "[{} · {}]",
                image.mime_type,
                score::format_size(image.data.len())
            ),
            None => "[no image]".to_string(),
        },
        (Some(_), false) => "♪ listen carefully ♪".to_string(),
        (None, _) => String::new(),
    };
    Paragraph::new(panel_text)
        .block(Block::default().borders(Borders::ALL).title("chirp"))
        .alignment(Alignment::Center)
        .style(dim_style)
        .render(chunks[0], buf);

    if let (Some(item), true) = (item, stage.info_visible()) {
        Paragraph::new(Span::styled(item.name.as_str(), bold_style))
            .alignment(Alignment::Center)
            .render(chunks[1], buf);

        if let Some(details) = &item.details {
            Paragraph::new(Span::styled(details.latin_name.as_str(), italic_style))
                .alignment(Alignment::Center)
                .render(chunks[2], buf);

            Paragraph::new(vec![
                Line::from(details.credits()),
                Line::from(format!("Macaulay Library, {}", details.recording_id)),
            ])
            .style(dim_style)
            .alignment(Alignment::Center)
            .render(chunks[3], buf);
        }
    }

    let feedback = match (&app.status, quiz.last_verdict()) {
        (Some(status), _) => Span::styled(status.as_str(), Style::default().fg(Color::Yellow)),
        (None, Some(Verdict::Correct)) => Span::styled(
            format!("{} correct", app.labels.correct),
            Style::default().fg(Color::Green),
        ),
        (None, Some(Verdict::Incorrect)) => Span::styled(
            format!("{} not quite", app.labels.incorrect),
            Style::default().fg(Color::Red),
        ),
        (None, None) => Span::raw(""),
    };
    Paragraph::new(feedback)
        .alignment(Alignment::Center)
        .render(chunks[4], buf);

    let score_row = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(5),
        ])
        .split(chunks[5]);
    Paragraph::new("0%").render(score_row[0], buf);
    Gauge::default()
        .ratio(quiz.tracker().ratio().clamp(0.0, 1.0))
        .label(score::format_percentage(quiz.percentage()))
        .gauge_style(Style::default().fg(Color::Rgb(112, 198, 135)))
        .render(score_row[1], buf);
    Paragraph::new("100%")
        .alignment(Alignment::Right)
        .render(score_row[2], buf);

    Paragraph::new(format!("{} {}", app.labels.remaining, quiz.remaining()))
        .alignment(Alignment::Center)
        .render(chunks[6], buf);

    Paragraph::new(Span::styled(legend(app, stage), italic_style)).render(chunks[7], buf);
}

fn legend(app: &App, stage: Stage) -> String {
    let respond = format!(
        "(y) {} / (n) {}",
        app.labels.correct, app.labels.incorrect
    );
    match stage {
        Stage::Listening => "(r)eplay / (v) reveal image / (s)kip / (esc)ape".to_string(),
        Stage::ImageRevealed => format!("{respond} / (v) reveal info / (s)kip / (esc)ape"),
        Stage::InfoRevealed if Browser::is_available() => {
            format!("{respond} / (o)pen recording / (s)kip / (esc)ape")
        }
        Stage::InfoRevealed => format!("{respond} / (s)kip / (esc)ape"),
    }
}

fn render_exhausted(app: &App, area: Rect, buf: &mut Buffer) {
    let text = format!(
        "No birds left!\nRepopulating list.\n{} correct\n\nReset score?\n(y)es / (n)o",
        score::format_percentage(app.quiz.percentage())
    );
    let popup = centered(area, POPUP_WIDTH, POPUP_HEIGHT);
    Clear.render(popup, buf);
    Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Round complete"))
        .alignment(Alignment::Center)
        .render(popup, buf);
}

/// A `width` x `height` rectangle centered in `area`, clipped to fit
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
