use chrono::{FixedOffset, NaiveDate};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::palette::event_color;
use crate::calendar::LaidOutEvent;
use crate::config::Settings;
use crate::presentation::time_range;

/// Side panel listing the selected day's events.
pub struct DetailView;

impl DetailView {
    pub fn new() -> Self {
        Self
    }

    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &self,
        frame: &mut Frame,
        area: Rect,
        date: NaiveDate,
        events: &[&LaidOutEvent],
        selected: usize,
        settings: &Settings,
        offset: &FixedOffset,
    ) {
        let mut lines = Vec::new();

        if events.is_empty() {
            lines.push(Line::from(Span::styled(
                "No events on this day.",
                Style::default().fg(Color::DarkGray),
            )));
        }

        for (i, ev) in events.iter().enumerate() {
            let is_selected = i == selected;
            let color = event_color(ev.color_index).normal;

            let mut spans = vec![
                Span::raw(if is_selected { "▶ " } else { "  " }),
                Span::styled("■ ", Style::default().fg(color)),
                Span::styled(
                    ev.name.clone(),
                    if is_selected {
                        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(Color::Gray)
                    },
                ),
            ];
            if settings.is_completed(ev.id) {
                spans.push(Span::styled(" ✓", Style::default().fg(Color::Green)));
            }
            if ev.special {
                spans.push(Span::styled(" [special]", Style::default().fg(Color::Cyan)));
            }
            if ev.is_pvp {
                spans.push(Span::styled(" [pvp]", Style::default().fg(Color::LightRed)));
            }
            lines.push(Line::from(spans));

            lines.push(Line::from(Span::styled(
                format!("    {}", time_range(ev, offset, true)),
                Style::default().fg(Color::DarkGray),
            )));
            if is_selected && !ev.url.is_empty() {
                lines.push(Line::from(Span::styled(
                    format!("    {}", settings.subdomain.apply(&ev.url)),
                    Style::default().fg(Color::Blue),
                )));
            }
            lines.push(Line::from(""));
        }

        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" {} ", date.format("%A, %B %-d"))),
            )
            .wrap(Wrap { trim: false });

        frame.render_widget(paragraph, area);
    }
}
