use anyhow::Result;
use chrono::{Days, FixedOffset, Months, NaiveDate};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::api::FeedClient;
use crate::calendar::{CalendarDay, EventIndex, LaidOutEvent, LayoutOptions};
use crate::config::{DataDir, Settings};
use crate::events::AppEvent;
use crate::feed::{self, EventCache, PayloadOrigin};
use crate::presentation::{self, MonthView};
use crate::status::StatusBar;
use crate::translate::Translator;
use crate::ui::{CalendarView, DetailView};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    Loading,
    Live,
    Cached,
    Offline,
}

pub struct App {
    client: Arc<FeedClient>,
    cache: EventCache,
    data_dir: DataDir,
    settings: Settings,
    display_offset: FixedOffset,
    index: Arc<EventIndex>,
    feed_state: FeedState,
    refresh_in_flight: bool,
    refresh_translated: bool,
    last_update: Option<Instant>,
    view: MonthView,
    selected_date: NaiveDate,
    selected_event: usize,
    status_bar: StatusBar,
    calendar_view: CalendarView,
    detail_view: DetailView,
    event_tx: mpsc::UnboundedSender<AppEvent>,
    event_rx: mpsc::UnboundedReceiver<AppEvent>,
    should_quit: bool,
    error_message: Option<String>,
    show_help: bool,
    help_scroll: u16,
    show_today: bool,
}

impl App {
    pub fn new(client: FeedClient, data_dir: DataDir, display_offset: FixedOffset) -> Self {
        let settings = data_dir.load_settings();
        let cache = EventCache::in_dir(data_dir.root());
        let today = CalendarDay::today(&display_offset).date();
        let (event_tx, event_rx) = mpsc::unbounded_channel::<AppEvent>();

        Self {
            client: Arc::new(client),
            cache,
            data_dir,
            settings,
            display_offset,
            index: Arc::new(EventIndex::empty()),
            feed_state: FeedState::Loading,
            refresh_in_flight: false,
            refresh_translated: false,
            last_update: None,
            view: MonthView::containing(today),
            selected_date: today,
            selected_event: 0,
            status_bar: StatusBar::new(),
            calendar_view: CalendarView::new(),
            detail_view: DetailView::new(),
            event_tx,
            event_rx,
            should_quit: false,
            error_message: None,
            show_help: false,
            help_scroll: 0,
            show_today: false,
        }
    }

    pub async fn run(&mut self, terminal: &mut ratatui::Terminal<impl ratatui::backend::Backend>) -> Result<()> {
        self.spawn_refresh();

        loop {
            let today = self.today();
            self.status_bar.update(
                Instant::now(),
                &self.index,
                today,
                &self.settings,
                &self.display_offset,
            );

            terminal.draw(|frame| self.render(frame))?;

            // Pick up finished refreshes (non-blocking)
            while let Ok(event) = self.event_rx.try_recv() {
                self.handle_app_event(event);
            }

            let timeout = Duration::from_millis(50);
            if event::poll(timeout)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn today(&self) -> NaiveDate {
        CalendarDay::today(&self.display_offset).date()
    }

    /// Start a background refresh unless one is already running. The task
    /// builds the whole index off the render loop and hands it over in one
    /// message.
    fn spawn_refresh(&mut self) {
        if self.refresh_in_flight {
            info!("refresh already in flight, ignoring request");
            return;
        }
        self.refresh_in_flight = true;
        self.refresh_translated = self.settings.translate_names;
        self.feed_state = FeedState::Loading;

        let client = Arc::clone(&self.client);
        let cache = self.cache.clone();
        let options = LayoutOptions::new(
            self.display_offset,
            Translator::for_setting(self.settings.translate_names),
        );
        let tx = self.event_tx.clone();

        tokio::spawn(async move {
            let event = match feed::refresh(client.as_ref(), &cache, &options).await {
                Ok(refreshed) => AppEvent::IndexPublished {
                    index: Arc::new(refreshed.index),
                    origin: refreshed.origin,
                },
                Err(e) => {
                    error!(error = %e, "refresh failed, keeping previous events");
                    AppEvent::RefreshFailed(e.to_string())
                }
            };
            tx.send(event).ok();
        });
    }

    fn handle_app_event(&mut self, event: AppEvent) {
        self.refresh_in_flight = false;

        match event {
            AppEvent::IndexPublished { index, origin } => {
                self.index = index;
                self.feed_state = match origin {
                    PayloadOrigin::Remote { .. } => FeedState::Live,
                    PayloadOrigin::Cache => FeedState::Cached,
                };
                self.error_message = None;
                self.last_update = Some(Instant::now());
                self.clamp_selected_event();
                self.status_bar.force_refresh();

                // Names are translated at build time; a toggle made while
                // this build ran needs another pass.
                if self.refresh_translated != self.settings.translate_names {
                    info!(
                        translate_names = self.settings.translate_names,
                        "translation setting changed during refresh, rebuilding"
                    );
                    self.spawn_refresh();
                }
            }
            AppEvent::RefreshFailed(err) => {
                self.feed_state = FeedState::Offline;
                self.error_message = Some(format!("Refresh failed: {}", err));
            }
        }
    }

    fn listed_events(&self) -> Vec<&LaidOutEvent> {
        presentation::listed_events(&self.index, self.selected_date, &self.settings)
    }

    fn clamp_selected_event(&mut self) {
        let count = self.listed_events().len();
        if self.selected_event >= count {
            self.selected_event = 0;
        }
    }

    fn select_date(&mut self, date: NaiveDate) {
        self.selected_date = date;
        self.selected_event = 0;
        if !self.view.contains(date) {
            self.view = MonthView::containing(date);
        }
    }

    fn move_days(&mut self, days: i64) {
        let moved = if days >= 0 {
            self.selected_date.checked_add_days(Days::new(days as u64))
        } else {
            self.selected_date.checked_sub_days(Days::new(days.unsigned_abs()))
        };
        if let Some(date) = moved {
            self.select_date(date);
        }
    }

    fn move_months(&mut self, months: i32) {
        let moved = if months >= 0 {
            self.selected_date.checked_add_months(Months::new(months as u32))
        } else {
            self.selected_date.checked_sub_months(Months::new(months.unsigned_abs()))
        };
        if let Some(date) = moved {
            self.view = MonthView::containing(date);
            self.select_date(date);
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        if self.show_help {
            match key {
                KeyCode::Esc | KeyCode::Char('h') | KeyCode::Char('?') => {
                    self.show_help = false;
                    self.help_scroll = 0;
                }
                KeyCode::Up => self.help_scroll = self.help_scroll.saturating_sub(1),
                KeyCode::Down => self.help_scroll = self.help_scroll.saturating_add(1),
                KeyCode::Char('q') => self.should_quit = true,
                _ => {}
            }
            return;
        }

        if self.show_today {
            match key {
                KeyCode::Esc | KeyCode::Char('i') => self.show_today = false,
                KeyCode::Char('q') => self.should_quit = true,
                _ => {}
            }
            return;
        }

        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            KeyCode::Char('i') => self.show_today = true,
            KeyCode::Char('r') | KeyCode::Char('R') => self.spawn_refresh(),
            KeyCode::Char('h') | KeyCode::Char('?') => {
                self.show_help = true;
                self.help_scroll = 0;
            }
            KeyCode::Esc => self.error_message = None,

            KeyCode::Left => self.move_days(-1),
            KeyCode::Right => self.move_days(1),
            KeyCode::Up => self.move_days(-7),
            KeyCode::Down => self.move_days(7),
            KeyCode::Char('[') => self.move_months(-1),
            KeyCode::Char(']') => self.move_months(1),
            KeyCode::Char('{') => self.move_months(-12),
            KeyCode::Char('}') => self.move_months(12),
            KeyCode::Char('t') | KeyCode::Char('T') => {
                let today = self.today();
                self.view = MonthView::containing(today);
                self.select_date(today);
            }

            KeyCode::Tab => {
                let count = self.listed_events().len();
                if count > 0 {
                    self.selected_event = (self.selected_event + 1) % count;
                }
            }
            KeyCode::BackTab => {
                let count = self.listed_events().len();
                if count > 0 {
                    self.selected_event = (self.selected_event + count - 1) % count;
                }
            }
            KeyCode::Enter => {
                let target = self.listed_events().get(self.selected_event).map(|ev| (*ev).clone());
                if let Some(ev) = target {
                    if !presentation::open_event(&ev, self.settings.subdomain) && !ev.url.is_empty() {
                        self.error_message = Some("Could not open event page".to_string());
                    }
                }
            }
            KeyCode::Char('c') => {
                let id = self.listed_events().get(self.selected_event).map(|ev| ev.id);
                if let Some(id) = id {
                    let done = self.settings.toggle_completed(id);
                    info!(id, completed = done, "toggled completion");
                    self.settings_changed();
                }
            }

            KeyCode::Char('p') => self.toggle(|s| &mut s.show_pvp),
            KeyCode::Char('s') => self.toggle(|s| &mut s.use_short_version),
            KeyCode::Char('z') => self.toggle(|s| &mut s.hide_for_zero_events),
            KeyCode::Char('x') => self.toggle(|s| &mut s.show_completed_events),
            KeyCode::Char('b') => self.toggle(|s| &mut s.show_status_entry),
            KeyCode::Char('d') => {
                self.settings.subdomain = self.settings.subdomain.next();
                self.settings_changed();
            }
            KeyCode::Char('n') => {
                self.toggle(|s| &mut s.translate_names);
                self.spawn_refresh();
            }
            _ => {}
        }
    }

    fn toggle(&mut self, field: impl FnOnce(&mut Settings) -> &mut bool) {
        let flag = field(&mut self.settings);
        *flag = !*flag;
        self.clamp_selected_event();
        self.settings_changed();
    }

    fn settings_changed(&mut self) {
        if let Err(e) = self.data_dir.save_settings(&self.settings) {
            warn!(error = %e, "failed to save settings");
            self.error_message = Some(format!("Failed to save settings: {}", e));
        }
        self.status_bar.force_refresh();
    }

    fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Status bar
                Constraint::Min(0),    // Calendar + details
                Constraint::Length(3), // Footer
            ])
            .split(frame.size());

        self.render_status_bar(frame, chunks[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
            .split(chunks[1]);

        let today = self.today();
        let weeks: Vec<Vec<presentation::DayCell<'_>>> = self
            .view
            .weeks()
            .iter()
            .map(|week| {
                week.iter()
                    .map(|date| presentation::day_cell(&self.index, *date, &self.view, today, &self.settings))
                    .collect()
            })
            .collect();
        self.calendar_view
            .render(frame, body[0], &self.view, &weeks, self.selected_date);

        let listed = self.listed_events();
        self.detail_view.render(
            frame,
            body[1],
            self.selected_date,
            &listed,
            self.selected_event,
            &self.settings,
            &self.display_offset,
        );

        self.render_footer(frame, chunks[2]);

        if self.show_help {
            self.render_help(frame);
        } else if self.show_today {
            self.render_today(frame);
        }
    }

    /// Lines of the status entry's tooltip: each of today's events followed
    /// by its time range.
    fn today_details(&self) -> Vec<String> {
        match self.status_bar.current() {
            Some(summary) if summary.tooltip.is_empty() => vec!["No events today".to_string()],
            Some(summary) => summary.tooltip.clone(),
            None => vec!["Status entry is hidden".to_string()],
        }
    }

    fn render_today(&self, frame: &mut Frame) {
        use ratatui::widgets::Clear;

        let area = frame.size();
        let popup_width = (area.width * 50) / 100;
        let popup_height = (area.height * 60) / 100;
        let popup_area = Rect {
            x: (area.width - popup_width) / 2,
            y: (area.height - popup_height) / 2,
            width: popup_width,
            height: popup_height,
        };

        frame.render_widget(Clear, popup_area);

        let title = match self.status_bar.current() {
            Some(summary) => format!(" {} ", summary.text),
            None => " Today ".to_string(),
        };

        // Tooltip alternates name / time range.
        let lines: Vec<Line> = self
            .today_details()
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                if i % 2 == 0 {
                    Line::from(Span::styled(text, Style::default().add_modifier(Modifier::BOLD)))
                } else {
                    Line::from(Span::styled(format!("  {}", text), Style::default().fg(Color::DarkGray)))
                }
            })
            .collect();

        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(title)
                .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        );

        frame.render_widget(paragraph, popup_area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let feed_indicator = match self.feed_state {
            FeedState::Live => Span::styled("● Live", Style::default().fg(Color::Green)),
            FeedState::Cached => Span::styled("● Cached", Style::default().fg(Color::Yellow)),
            FeedState::Offline => Span::styled("● Offline", Style::default().fg(Color::Red)),
            FeedState::Loading => Span::styled("● Loading...", Style::default().fg(Color::Yellow)),
        };

        let summary = match self.status_bar.current() {
            Some(summary) => summary.text.clone(),
            None => "--".to_string(),
        };

        let update_time = match self.last_update {
            Some(last) => format!("Update: {}s ago", last.elapsed().as_secs()),
            None => "Update: --".to_string(),
        };

        let line = Line::from(vec![
            feed_indicator,
            Span::raw("  │  "),
            Span::styled(summary, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            Span::raw("  │  "),
            Span::raw(format!("Events: {}", self.index.event_count())),
            Span::raw("  │  "),
            Span::raw(format!("Region: {}", self.settings.subdomain.to_name())),
            Span::raw("  │  "),
            Span::raw(update_time),
        ]);

        let paragraph = Paragraph::new(line).block(Block::default().borders(Borders::ALL).title(" EVENTY "));

        frame.render_widget(paragraph, area);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let footer_text = if let Some(ref error) = self.error_message {
            Line::from(vec![
                Span::styled("ERROR: ", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
                Span::styled(error, Style::default().fg(Color::Red)),
            ])
        } else {
            Line::from(vec![
                Span::styled("[←→↑↓] ", Style::default().fg(Color::Yellow)),
                Span::raw("Day  "),
                Span::styled("[[ ]] ", Style::default().fg(Color::Yellow)),
                Span::raw("Month  "),
                Span::styled("[t] ", Style::default().fg(Color::Yellow)),
                Span::raw("Today  "),
                Span::styled("[Tab] ", Style::default().fg(Color::Yellow)),
                Span::raw("Event  "),
                Span::styled("[Enter] ", Style::default().fg(Color::Yellow)),
                Span::raw("Open  "),
                Span::styled("[r] ", Style::default().fg(Color::Yellow)),
                Span::raw("Refresh  "),
                Span::styled("[h/?] ", Style::default().fg(Color::Yellow)),
                Span::raw("Help  "),
                Span::styled("[q] ", Style::default().fg(Color::Yellow)),
                Span::raw("Quit"),
            ])
        };

        let paragraph = Paragraph::new(footer_text).block(Block::default().borders(Borders::ALL));

        frame.render_widget(paragraph, area);
    }

    fn render_help(&self, frame: &mut Frame) {
        use ratatui::widgets::{Clear, Wrap};

        // Centered popup (60% width, 80% height)
        let area = frame.size();
        let popup_width = (area.width * 60) / 100;
        let popup_height = (area.height * 80) / 100;
        let popup_area = Rect {
            x: (area.width - popup_width) / 2,
            y: (area.height - popup_height) / 2,
            width: popup_width,
            height: popup_height,
        };

        frame.render_widget(Clear, popup_area);

        let key = |k: &'static str, what: String| {
            Line::from(vec![
                Span::styled(format!("  {:<8}", k), Style::default().fg(Color::Cyan)),
                Span::raw(what),
            ])
        };
        let on_off = |on: bool| if on { "on" } else { "off" };
        let heading = |text: &'static str| {
            Line::from(Span::styled(
                text,
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ))
        };

        let help_text = vec![
            heading("NAVIGATION"),
            Line::from(""),
            key("←→", "Previous / next day".to_string()),
            key("↑↓", "Previous / next week".to_string()),
            key("[ ]", "Previous / next month".to_string()),
            key("{ }", "Previous / next year".to_string()),
            key("t", "Jump to today".to_string()),
            key("Tab", "Select next event of the day".to_string()),
            key("Enter", "Open the selected event's page".to_string()),
            key("c", "Mark the selected event completed / not completed".to_string()),
            Line::from(""),
            heading("SETTINGS"),
            Line::from(""),
            key("p", format!("Show PvP seasons ({})", on_off(self.settings.show_pvp))),
            key("s", format!("Short status text ({})", on_off(self.settings.use_short_version))),
            key("z", format!("Hide status with no events ({})", on_off(self.settings.hide_for_zero_events))),
            key("x", format!("Count completed events ({})", on_off(self.settings.show_completed_events))),
            key("b", format!("Show status entry ({})", on_off(self.settings.show_status_entry))),
            key("n", format!("Translate event names ({})", on_off(self.settings.translate_names))),
            key("d", format!("Link region ({})", self.settings.subdomain.to_name())),
            Line::from(""),
            heading("GENERAL"),
            Line::from(""),
            key("i", "Today's events (status entry details)".to_string()),
            key("r", "Refresh events".to_string()),
            key("h/?", "Toggle this help".to_string()),
            key("q", "Quit".to_string()),
            Line::from(""),
            Line::from(Span::styled("Press [ESC] or [h] to close", Style::default().fg(Color::DarkGray))),
        ];

        let paragraph = Paragraph::new(help_text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan))
                    .title(" HELP (Use ↑↓ to scroll) ")
                    .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            )
            .wrap(Wrap { trim: false })
            .scroll((self.help_scroll, 0));

        frame.render_widget(paragraph, popup_area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::RawEvent;
    use chrono::Utc;

    const MOONFIRE_CACHE: &str = r#"[
        {"id": 1, "name": "Moonfire Faire", "begin": "2024-05-01 08:00:00Z", "end": "2024-05-02 14:59:00Z"}
    ]"#;

    /// App over a temp data dir whose feed is unreachable, so every refresh
    /// is served from `events.json`.
    fn offline_app(dir: &std::path::Path, settings: &Settings) -> App {
        let data_dir = DataDir::new(dir.to_path_buf());
        data_dir.save_settings(settings).unwrap();
        std::fs::write(dir.join(feed::CACHE_FILE_NAME), MOONFIRE_CACHE).unwrap();

        let client = FeedClient::new("http://127.0.0.1:9".to_string(), 2).unwrap();
        App::new(client, data_dir, FixedOffset::east_opt(0).unwrap())
    }

    fn names_on(app: &App, date: NaiveDate) -> Vec<String> {
        app.index
            .lookup(CalendarDay::from_date(date))
            .iter()
            .map(|ev| ev.name.clone())
            .collect()
    }

    #[tokio::test]
    async fn translation_toggle_during_refresh_rebuilds() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = Settings {
            translate_names: false,
            ..Settings::default()
        };
        let mut app = offline_app(tmp.path(), &settings);

        app.spawn_refresh();
        app.handle_key(KeyCode::Char('n'));
        assert!(app.settings.translate_names);

        // The first build still used the old setting and asks for another.
        let event = app.event_rx.recv().await.unwrap();
        app.handle_app_event(event);
        assert!(app.refresh_in_flight);

        let event = app.event_rx.recv().await.unwrap();
        app.handle_app_event(event);
        assert!(!app.refresh_in_flight);
        assert_eq!(app.feed_state, FeedState::Cached);

        let may_first = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(names_on(&app, may_first), vec!["红莲节".to_string()]);
    }

    #[tokio::test]
    async fn refresh_without_setting_change_publishes_once() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = offline_app(tmp.path(), &Settings::default());

        app.spawn_refresh();
        app.handle_key(KeyCode::Char('r'));

        let event = app.event_rx.recv().await.unwrap();
        app.handle_app_event(event);
        assert!(!app.refresh_in_flight);
        assert!(app.event_rx.try_recv().is_err());
    }

    #[test]
    fn today_popup_lists_status_tooltip() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = offline_app(tmp.path(), &Settings::default());

        let now = Utc::now();
        let event = RawEvent {
            id: 42,
            name: "Starlight Celebration".to_string(),
            begin: now - chrono::Duration::hours(1),
            end: now + chrono::Duration::hours(1),
            special: false,
            is_pvp: false,
            url: String::new(),
        };
        app.index = Arc::new(EventIndex::build(
            &[event],
            &LayoutOptions::new(app.display_offset, Translator::identity()),
        ));
        let today = CalendarDay::of(&now, &app.display_offset).date();
        app.status_bar.force_refresh();
        app.status_bar
            .update(Instant::now(), &app.index, today, &app.settings, &app.display_offset);

        app.handle_key(KeyCode::Char('i'));
        assert!(app.show_today);

        let details = app.today_details();
        assert_eq!(details.len(), 2);
        assert_eq!(details[0], "Starlight Celebration");

        app.handle_key(KeyCode::Esc);
        assert!(!app.show_today);
    }

    #[test]
    fn hidden_status_entry_says_so() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = Settings {
            show_status_entry: false,
            ..Settings::default()
        };
        let app = offline_app(tmp.path(), &settings);
        assert_eq!(app.today_details(), vec!["Status entry is hidden".to_string()]);
    }
}
