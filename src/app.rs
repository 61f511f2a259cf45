use crate::input::Action;
use crate::model::View;
use crate::render::{RenderedLine, RenderedTable, SCROLL_STEP, clamp_scroll};
use chrono::{DateTime, Local};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum InputMode {
    Normal,
    Search,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    None,
    Refresh,
}

pub struct App {
    running: bool,
    mode: InputMode,
    view: View,
    table: RenderedTable,
    rows: usize,
    search: String,
    x_offset: usize,
    y_offset: usize,
    view_width: u16,
    view_height: u16,
    error_banner: Option<String>,
    status: String,
    last_refresh: Option<DateTime<Local>>,
}

impl App {
    pub fn new(view: View) -> Self {
        Self {
            running: true,
            mode: InputMode::Normal,
            view,
            table: RenderedTable::default(),
            rows: 0,
            search: String::new(),
            x_offset: 0,
            y_offset: 0,
            view_width: 80,
            view_height: 20,
            error_banner: None,
            status: format!("Collecting {}...", view.entity()),
            last_refresh: None,
        }
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn error_banner(&self) -> Option<&str> {
        self.error_banner.as_deref()
    }

    pub fn last_refresh(&self) -> Option<DateTime<Local>> {
        self.last_refresh
    }

    pub fn x_offset(&self) -> usize {
        self.x_offset
    }

    pub fn y_offset(&self) -> usize {
        self.y_offset
    }

    pub fn visible_lines(&self) -> Vec<&RenderedLine> {
        self.table.search(&self.search)
    }

    pub fn set_table(&mut self, table: RenderedTable, rows: usize) {
        self.table = table;
        self.rows = rows;
        self.error_banner = None;
        self.last_refresh = Some(Local::now());
        self.status = format!("{rows} {} updated", self.view.entity());
        self.clamp_offsets();
    }

    pub fn set_refresh_error(&mut self, error: impl Into<String>) {
        let error = error.into();
        let summary = summarize_error_line(&error);
        self.error_banner = Some(normalize_status_text(summary.clone()));
        self.status = normalize_status_text(format!("refresh failed: {summary}; retrying"));
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = normalize_status_text(status.into());
    }

    pub fn set_viewport(&mut self, width: u16, height: u16) {
        self.view_width = width.max(1);
        self.view_height = height.max(1);
        self.clamp_offsets();
    }

    pub fn apply_action(&mut self, action: Action) -> AppCommand {
        match action {
            Action::Quit => {
                self.running = false;
                self.status = "Exit requested".to_string();
                AppCommand::None
            }
            Action::Refresh => {
                self.status = format!("Refreshing {}...", self.view.entity());
                AppCommand::Refresh
            }
            Action::StartSearch => {
                self.mode = InputMode::Search;
                self.status = "Search: type to filter rows, Enter to keep, Esc to clear".to_string();
                AppCommand::None
            }
            Action::ClearSearch => {
                self.mode = InputMode::Normal;
                self.search.clear();
                self.status = format!("{} {}", self.rows, self.view.entity());
                self.clamp_offsets();
                AppCommand::None
            }
            Action::SubmitSearch => {
                self.mode = InputMode::Normal;
                self.status = if self.search.is_empty() {
                    format!("{} {}", self.rows, self.view.entity())
                } else {
                    format!("Search: {}", self.search)
                };
                AppCommand::None
            }
            Action::Backspace => {
                self.search.pop();
                self.y_offset = 0;
                self.clamp_offsets();
                AppCommand::None
            }
            Action::InputChar(c) => {
                self.search.push(c);
                self.y_offset = 0;
                self.clamp_offsets();
                AppCommand::None
            }
            Action::Up => self.scroll_vertical(-1),
            Action::Down => self.scroll_vertical(1),
            Action::PageUp => self.scroll_vertical(-i64::from(self.view_height)),
            Action::PageDown => self.scroll_vertical(i64::from(self.view_height)),
            Action::Top => {
                self.y_offset = 0;
                AppCommand::None
            }
            Action::Bottom => {
                self.y_offset = self.max_y_offset();
                AppCommand::None
            }
            Action::ScrollLeft => self.scroll_horizontal(-(SCROLL_STEP as i64)),
            Action::ScrollRight => self.scroll_horizontal(SCROLL_STEP as i64),
        }
    }

    fn scroll_horizontal(&mut self, delta: i64) -> AppCommand {
        let requested = self.x_offset as i64 + delta;
        self.x_offset = clamp_scroll(requested, self.max_width(), usize::from(self.view_width));
        AppCommand::None
    }

    fn scroll_vertical(&mut self, delta: i64) -> AppCommand {
        let requested = (self.y_offset as i64 + delta).max(0);
        self.y_offset = (requested as usize).min(self.max_y_offset());
        AppCommand::None
    }

    fn max_width(&self) -> usize {
        self.visible_lines()
            .iter()
            .map(|line| line.width())
            .max()
            .unwrap_or(0)
    }

    fn max_y_offset(&self) -> usize {
        self.visible_lines()
            .len()
            .saturating_sub(usize::from(self.view_height))
    }

    fn clamp_offsets(&mut self) {
        self.x_offset = clamp_scroll(
            self.x_offset as i64,
            self.max_width(),
            usize::from(self.view_width),
        );
        self.y_offset = self.y_offset.min(self.max_y_offset());
    }
}

fn summarize_error_line(error: &str) -> String {
    error
        .lines()
        .find(|line| !line.trim().is_empty())
        .map(|line| line.trim().trim_start_matches('#').trim().to_string())
        .unwrap_or_else(|| "unknown error".to_string())
}

fn normalize_status_text(status: String) -> String {
    const MAX_STATUS_LEN: usize = 180;
    if status.chars().count() <= MAX_STATUS_LEN {
        return status;
    }

    let mut shortened = status
        .chars()
        .take(MAX_STATUS_LEN.saturating_sub(1))
        .collect::<String>();
    shortened.push('…');
    shortened
}
