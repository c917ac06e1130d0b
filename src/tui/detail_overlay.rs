use crate::app::{truncate, DetailOverlay};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

/// Centered box: ~60% width, tall enough for every field plus borders and hint.
pub fn overlay_area(area: Rect, field_count: usize) -> Rect {
    let content_height = (field_count.min(u16::MAX as usize - 3) as u16).saturating_add(3);
    let width = (area.width * 6 / 10).max(30).min(area.width);
    let height = content_height.max(5).min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

pub fn render(f: &mut Frame, overlay: &DetailOverlay) {
    let overlay_area = overlay_area(f.area(), overlay.lines.len());
    f.render_widget(Clear, overlay_area);

    let inner_width = overlay_area.width.saturating_sub(2) as usize;
    let title = format!(" {} ", truncate(&overlay.title, inner_width.saturating_sub(2)));

    let block = Block::default()
        .title(title)
        .title_bottom(Line::from(" d/q/Esc close ").centered())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .style(Style::default().bg(Color::Black));

    let label_width = overlay
        .lines
        .iter()
        .map(|(l, _)| UnicodeWidthStr::width(l.as_str()))
        .max()
        .unwrap_or(0);
    let value_max = inner_width.saturating_sub(label_width.saturating_add(2));

    let lines: Vec<Line> = overlay
        .lines
        .iter()
        .map(|(label, value)| {
            // `$NAME` rows are run variables
            let label_color = if label.starts_with('$') {
                Color::Magenta
            } else {
                Color::Cyan
            };
            Line::from(vec![
                Span::styled(
                    format!("{label:>label_width$}  "),
                    Style::default()
                        .fg(label_color)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(truncate(value, value_max), Style::default().fg(Color::White)),
            ])
        })
        .collect();

    f.render_widget(Paragraph::new(lines).block(block), overlay_area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_is_centered_and_bounded() {
        let screen = Rect::new(0, 0, 100, 40);
        let a = overlay_area(screen, 10);
        assert_eq!((a.width, a.height), (60, 13));
        assert_eq!((a.x, a.y), (20, 13));
    }

    #[test]
    fn area_never_exceeds_screen() {
        let screen = Rect::new(0, 0, 20, 4);
        let a = overlay_area(screen, 100);
        assert!(a.width <= 20 && a.height <= 4);
    }
}
