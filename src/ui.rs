use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::{App, InputMode};
use crate::model::ColorBand;
use crate::render::{Segment, Tone, highlight};

const BG: Color = Color::Rgb(9, 15, 25);
const PANEL: Color = Color::Rgb(16, 27, 44);
const ACCENT: Color = Color::Rgb(52, 211, 153);
const MUTED: Color = Color::Rgb(140, 156, 178);
const WARN: Color = Color::Rgb(251, 191, 36);
const ERROR: Color = Color::Rgb(248, 113, 113);
const MATCH: Color = Color::Rgb(171, 39, 112);
const PL_A: Color = Color::Rgb(17, 94, 89);
const PL_B: Color = Color::Rgb(30, 64, 175);

const POWERLINE_ARROW: &str = "\u{e0b0}";

pub fn render(frame: &mut Frame, app: &mut App) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, root[0], app);
    render_body(frame, root[1], app);
    render_footer(frame, root[2], app);
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = Vec::new();
    push_powerline_segment(&mut spans, " KubeNodeUsage ", Color::White, PL_A, PL_B);
    let view_label = format!(" {} ", app.view().entity());
    push_powerline_segment(&mut spans, view_label, Color::White, PL_B, BG);
    let refreshed = app
        .last_refresh()
        .map(|time| format!(" updated {}", time.format("%H:%M:%S")))
        .unwrap_or_else(|| " waiting for first sample".to_string());
    spans.push(Span::styled(refreshed, Style::default().fg(MUTED)));

    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(BG).fg(Color::White)),
        area,
    );
}

fn render_body(frame: &mut Frame, area: Rect, app: &mut App) {
    let (banner_area, table_area) = match app.error_banner() {
        Some(_) => {
            let split = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(1), Constraint::Min(2)])
                .split(area);
            (Some(split[0]), split[1])
        }
        None => (None, area),
    };

    if let (Some(banner_area), Some(error)) = (banner_area, app.error_banner()) {
        let text = compact_text(
            &format!(" ! {error} (showing last data, retrying)"),
            usize::from(banner_area.width),
        );
        frame.render_widget(
            Paragraph::new(text).style(
                Style::default()
                    .fg(Color::Black)
                    .bg(ERROR)
                    .add_modifier(Modifier::BOLD),
            ),
            banner_area,
        );
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(MUTED))
        .title(format!(" {} ", app.view().entity()))
        .style(Style::default().bg(PANEL));
    let inner = block.inner(table_area);
    app.set_viewport(inner.width, inner.height);

    let lines = app
        .visible_lines()
        .into_iter()
        .skip(app.y_offset())
        .take(usize::from(inner.height))
        .map(|line| {
            let segments = highlight(line.window(app.x_offset()), app.search());
            Line::from(segments.into_iter().map(styled_segment).collect::<Vec<_>>())
        })
        .collect::<Vec<_>>();

    frame.render_widget(Paragraph::new(lines).block(block), table_area);
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
    let line = match app.mode() {
        InputMode::Search => Line::from(vec![
            Span::styled(
                " / ",
                Style::default()
                    .fg(Color::Black)
                    .bg(WARN)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(" {}█", app.search()),
                Style::default().fg(WARN).add_modifier(Modifier::BOLD),
            ),
            Span::styled("  Enter keep  Esc clear", Style::default().fg(MUTED)),
        ]),
        InputMode::Normal => {
            let mut spans = Vec::new();
            let status_bg = if app.error_banner().is_some() { ERROR } else { PL_B };
            let status = format!(
                " {} {} ",
                footer_status_icon(app.status()),
                compact_text(app.status(), usize::from(area.width.saturating_sub(48)).max(24))
            );
            push_powerline_segment(&mut spans, status, Color::White, status_bg, BG);
            spans.push(Span::styled(
                " q quit  r refresh  s search  ←/→ scroll",
                Style::default().fg(MUTED),
            ));
            Line::from(spans)
        }
    };

    frame.render_widget(Paragraph::new(line).style(Style::default().bg(BG)), area);
}

fn styled_segment(segment: Segment) -> Span<'static> {
    let style = match segment.tone {
        Tone::Plain => Style::default().fg(Color::White),
        Tone::Banner => Style::default().fg(ACCENT),
        Tone::Heading => Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
        Tone::Muted => Style::default().fg(MUTED),
        Tone::Band(band) => Style::default().fg(band_color(band)),
        Tone::Match => Style::default().fg(Color::White).bg(MATCH),
    };
    Span::styled(segment.text, style)
}

fn band_color(band: ColorBand) -> Color {
    match band {
        ColorBand::Green => ACCENT,
        ColorBand::Orange => WARN,
        ColorBand::Red => ERROR,
    }
}

fn push_powerline_segment(
    spans: &mut Vec<Span<'static>>,
    content: impl Into<String>,
    fg: Color,
    bg: Color,
    next_bg: Color,
) {
    spans.push(Span::styled(
        content.into(),
        Style::default().fg(fg).bg(bg).add_modifier(Modifier::BOLD),
    ));
    spans.push(Span::styled(
        POWERLINE_ARROW,
        Style::default().fg(bg).bg(next_bg),
    ));
}

fn footer_status_icon(status_text: &str) -> &'static str {
    let status = status_text.to_ascii_lowercase();
    let has_failure = ["failed", "error", "timed out", "unreachable", "refused", "forbidden"]
        .iter()
        .any(|needle| status.contains(needle));
    if has_failure { "\u{f015a}" } else { "\u{f012c}" }
}

fn compact_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }

    if max_chars <= 1 {
        return "…".to_string();
    }

    let mut out = value
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect::<String>();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::{compact_text, footer_status_icon};

    #[test]
    fn compact_text_adds_ellipsis() {
        assert_eq!(compact_text("abcdef", 4), "abc…");
        assert_eq!(compact_text("abc", 4), "abc");
        assert_eq!(compact_text("abc", 1), "…");
    }

    #[test]
    fn failure_status_gets_failure_icon() {
        assert_ne!(
            footer_status_icon("refresh failed: timeout"),
            footer_status_icon("12 nodes updated")
        );
    }
}
