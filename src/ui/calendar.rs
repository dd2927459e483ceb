use chrono::{Datelike, NaiveDate};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::palette::{self, event_color};
use crate::presentation::{DayCell, MonthView, DAY_NAMES};

pub struct CalendarView;

impl CalendarView {
    pub fn new() -> Self {
        Self
    }

    pub fn render(
        &self,
        frame: &mut Frame,
        area: Rect,
        view: &MonthView,
        weeks: &[Vec<DayCell<'_>>],
        selected: NaiveDate,
    ) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", view.title()))
            .title_alignment(Alignment::Center);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut constraints = vec![Constraint::Length(1)]; // Weekday header
        constraints.extend(weeks.iter().map(|_| Constraint::Ratio(1, weeks.len().max(1) as u32)));

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(inner);

        self.render_weekdays(frame, rows[0]);

        for (week, row_area) in weeks.iter().zip(rows.iter().skip(1)) {
            let columns = Self::columns(*row_area);
            for (cell, cell_area) in week.iter().zip(columns.iter()) {
                self.render_cell(frame, *cell_area, cell, cell.date == selected);
            }
        }
    }

    fn columns(area: Rect) -> std::rc::Rc<[Rect]> {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 7); 7])
            .split(area)
    }

    fn render_weekdays(&self, frame: &mut Frame, area: Rect) {
        for (dw, (name, col)) in DAY_NAMES.iter().zip(Self::columns(area).iter()).enumerate() {
            let color = if dw == 0 { Color::LightRed } else { Color::Gray };
            let header = Paragraph::new(Span::styled(
                *name,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Center);
            frame.render_widget(header, *col);
        }
    }

    fn render_cell(&self, frame: &mut Frame, area: Rect, cell: &DayCell<'_>, is_selected: bool) {
        let special = cell.special.map(|ev| event_color(ev.color_index));

        let border_style = if is_selected {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else if cell.is_today {
            Style::default().fg(palette::TODAY).add_modifier(Modifier::BOLD)
        } else if let Some(color) = special {
            Style::default().fg(palette::pick(color, cell.in_month))
        } else {
            Style::default().fg(palette::GRID)
        };

        let block = Block::default().borders(Borders::ALL).border_style(border_style);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let width = inner.width as usize;
        let mut lines = vec![Line::default(); inner.height as usize];
        lines[0] = self.day_header(cell, special, width);

        // Lane rows start right below the day number.
        for ev in &cell.lanes {
            let row = 1 + ev.lane();
            if row >= lines.len() {
                continue;
            }
            let color = palette::pick(event_color(ev.color_index), cell.in_month);
            let label: String = ev.name.chars().take(width).collect();
            lines[row] = Line::from(Span::styled(
                format!("{:<width$}", label, width = width),
                Style::default().bg(color).fg(Color::Black),
            ));
        }

        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn day_header(&self, cell: &DayCell<'_>, special: Option<palette::EventColor>, width: usize) -> Line<'static> {
        let mut style = if cell.in_month {
            Style::default().fg(Color::Gray)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        if cell.date.weekday().num_days_from_sunday() == 0 {
            style = style.fg(if cell.in_month { Color::LightRed } else { Color::Red });
        }
        if cell.is_today {
            style = style.add_modifier(Modifier::BOLD);
        }

        let mut text = format!("{:>2}", cell.date.day());
        if let Some(color) = special {
            style = style.bg(color.translucent);
            if let Some(ev) = cell.special {
                text.push(' ');
                text.extend(ev.name.chars());
            }
            text = format!("{:<width$}", text, width = width);
        }

        Line::from(Span::styled(text, style))
    }
}
