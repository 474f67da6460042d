use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

use arboard::Clipboard;
use ratatui::crossterm::event::KeyEvent;
use tracing::{debug, error, info, trace};

use crate::config::DashboardConfig;
use crate::dashboard::{Dashboard, Section};
use crate::dataset::{DatasetKind, RowSelection};
use crate::domain::{CMDMode, DashError, HELP_TEXT, Message};
use crate::filter::CategorySelection;
use crate::inputter::{InputResult, Inputter};
use crate::loader::Source;
use crate::search::SearchQuery;
use crate::table::ColumnView;
use crate::ui::CHROME_HEIGHT;

#[derive(Debug, PartialEq)]
pub enum Status {
    READY,
    QUITTING,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    TABLE,
    DETAIL,
    POPUP,
    CMDINPUT,
}

/// Render data of one table section.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionData {
    pub kind: DatasetKind,
    pub heading: String,
    pub subtitle: String,
    pub columns: Vec<ColumnView>,
    pub nrows: usize,
    pub selected_row: usize,
    pub focused: bool,
    pub cost_visible: bool,
    pub empty_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailData {
    pub title: String,
    pub fields: Vec<(String, String)>,
}

#[derive(Default, Clone, Debug)]
pub struct UILayout {
    pub width: usize,
    pub height: usize,
}

pub struct UIData {
    pub tabs: Vec<&'static str>,
    pub active_tab: usize,
    pub search_mode: bool,
    pub query: String,
    pub heading: String,
    pub category: String,
    pub category_available: bool,
    pub sections: Vec<SectionData>,
    pub no_results: Option<String>,
    pub detail: Option<DetailData>,
    pub show_popup: bool,
    pub popup_message: String,
    pub cmdinput: InputResult,
    pub cmd_mode: Option<CMDMode>,
    pub active_cmdinput: bool,
    pub status_message: String,
    pub layout: UILayout,
    pub last_update: Instant,
}

impl UIData {
    pub fn empty() -> Self {
        UIData {
            tabs: DatasetKind::ALL.iter().map(|k| k.title()).collect(),
            active_tab: 0,
            search_mode: false,
            query: String::new(),
            heading: String::new(),
            category: CategorySelection::All.to_string(),
            category_available: false,
            sections: Vec::new(),
            no_results: None,
            detail: None,
            show_popup: false,
            popup_message: String::new(),
            cmdinput: InputResult::default(),
            cmd_mode: None,
            active_cmdinput: false,
            status_message: String::new(),
            layout: UILayout::default(),
            last_update: Instant::now(),
        }
    }
}

pub struct Model {
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    dashboard: Dashboard,
    categories: Vec<CategorySelection>,
    category_idx: usize,
    active: DatasetKind,
    query: Option<SearchQuery>,
    sections: Vec<Section>,
    cursors: HashMap<DatasetKind, usize>,
    selection: RowSelection,
    detail: Option<Section>,
    input: Inputter,
    cmd_mode: Option<CMDMode>,
    last_input: InputResult,
    active_cmdinput: bool,
    clipboard: Option<Clipboard>,
    status_message: String,
    uilayout: UILayout,
    uidata: UIData,
}

impl Model {
    pub fn init(config: &DashboardConfig, ui_width: usize, ui_height: usize) -> Self {
        let mut dashboard = Dashboard::new(config.clone());
        let errors = dashboard.load_all();
        let mut model = Self::with_dashboard(dashboard, ui_width, ui_height);
        if let Some(first) = errors.first() {
            model.set_status_message(first.clone());
        }
        model
    }

    pub fn with_dashboard(dashboard: Dashboard, ui_width: usize, ui_height: usize) -> Self {
        let mut model = Self {
            status: Status::READY,
            modus: Modus::TABLE,
            previous_modus: Modus::TABLE,
            dashboard,
            categories: vec![CategorySelection::All],
            category_idx: 0,
            active: DatasetKind::Stock,
            query: None,
            sections: Vec::new(),
            cursors: HashMap::new(),
            selection: RowSelection::None,
            detail: None,
            input: Inputter::default(),
            cmd_mode: None,
            last_input: InputResult::default(),
            active_cmdinput: false,
            clipboard: None,
            status_message: "Started stockview!".to_string(),
            uilayout: UILayout {
                width: ui_width,
                height: ui_height,
            },
            uidata: UIData::empty(),
        };
        model.refresh_categories();
        model.rebuild();
        model
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    pub fn raw_keyevents(&self) -> bool {
        self.active_cmdinput
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.uidata.status_message = self.status_message.clone();
        self.uidata.last_update = Instant::now();
    }

    fn selected_category(&self) -> CategorySelection {
        self.categories
            .get(self.category_idx)
            .cloned()
            .unwrap_or(CategorySelection::All)
    }

    fn categories_available(&self) -> bool {
        let column = &self.dashboard.config().columns.category;
        DatasetKind::ALL
            .iter()
            .any(|&k| self.dashboard.dataset(k).table.has_column(column))
    }

    /// Re-reads the category choices, keeping the current choice if it still exists.
    fn refresh_categories(&mut self) {
        let current = self.selected_category();
        self.categories = self
            .dashboard
            .categories()
            .unwrap_or_else(|| vec![CategorySelection::All]);
        self.category_idx = self
            .categories
            .iter()
            .position(|c| *c == current)
            .unwrap_or(0);
    }

    fn page_size(&self) -> usize {
        std::cmp::max(1, self.uilayout.height.saturating_sub(CHROME_HEIGHT))
    }

    fn active_section(&self) -> Option<&Section> {
        self.sections.iter().find(|s| s.kind == self.active)
    }

    fn cursor(&self) -> usize {
        self.cursors.get(&self.active).copied().unwrap_or(0)
    }

    /// Recomputes the visible sections from the datasets and the current
    /// query and category, then refreshes the render data.
    fn rebuild(&mut self) {
        let start_time = Instant::now();
        let result = match &self.query {
            Some(query) => self.dashboard.search(query),
            None => self
                .dashboard
                .browse(self.active, &self.selected_category())
                .map(|section| vec![section]),
        };
        self.sections = match result {
            Ok(sections) => sections,
            Err(e) => {
                error!("Could not build views: {e}");
                self.set_status_message(format!("Error: {e}"));
                Vec::new()
            }
        };

        // In search mode focus a section that has results
        if self.query.is_some()
            && self.active_section().is_none_or(|s| s.table.is_empty())
            && let Some(section) = self.sections.iter().find(|s| !s.table.is_empty())
        {
            self.active = section.kind;
        }

        for section in self.sections.iter() {
            let cursor = self.cursors.entry(section.kind).or_insert(0);
            *cursor = std::cmp::min(*cursor, section.table.height().saturating_sub(1));
        }
        trace!(
            "Rebuilt {} sections in {}ms",
            self.sections.len(),
            start_time.elapsed().as_millis()
        );
        self.update_uidata();
    }

    fn section_data(&self, section: &Section) -> SectionData {
        let config = self.dashboard.config();
        let dataset = self.dashboard.dataset(section.kind);
        let nrows = section.table.height();
        let (heading, subtitle) = match &self.query {
            Some(_) => (
                section.kind.found_in().to_string(),
                format!("{nrows} matching items"),
            ),
            None => (
                section.kind.heading().to_string(),
                format!("Last Updated: {}", dataset.updated),
            ),
        };
        let empty_message = if nrows > 0 {
            None
        } else if dataset.load_error.is_some() {
            Some(format!("Could not display data from {}.", dataset.source))
        } else if dataset.table.is_empty() {
            Some("No data.".to_string())
        } else {
            Some(format!("No items in category {}.", self.selected_category()))
        };
        SectionData {
            kind: section.kind,
            heading,
            subtitle,
            columns: section.table.to_column_views(config.max_column_width),
            nrows,
            selected_row: self.cursors.get(&section.kind).copied().unwrap_or(0),
            focused: section.kind == self.active,
            cost_visible: section.show_sensitive,
            empty_message,
        }
    }

    fn update_uidata(&mut self) {
        let search_mode = self.query.is_some();
        let mut sections: Vec<SectionData> = self
            .sections
            .iter()
            .map(|section| self.section_data(section))
            .collect();
        let mut no_results = None;
        if let Some(query) = &self.query {
            sections.retain(|s| s.nrows > 0);
            if sections.is_empty() {
                no_results = Some(format!(
                    "No matching items found for '{query}' in either dataset."
                ));
            }
        }
        let detail = self.detail.as_ref().map(|section| {
            let names = section.table.column_names();
            let values = section.table.row_values(0);
            DetailData {
                title: format!("{} item", section.kind.title()),
                fields: names
                    .into_iter()
                    .zip(values)
                    .map(|(n, v)| (n, v.unwrap_or_default()))
                    .collect(),
            }
        });

        self.uidata.active_tab = DatasetKind::ALL
            .iter()
            .position(|&k| k == self.active)
            .unwrap_or(0);
        self.uidata.search_mode = search_mode;
        self.uidata.query = self
            .query
            .as_ref()
            .map(|q| q.to_string())
            .unwrap_or_default();
        self.uidata.heading = match &self.query {
            Some(query) => format!("Search Results for: '{query}'"),
            None => String::new(),
        };
        self.uidata.category = self.selected_category().to_string();
        self.uidata.category_available = self.categories_available();
        self.uidata.sections = sections;
        self.uidata.no_results = no_results;
        self.uidata.detail = detail;
        self.uidata.cmdinput = self.last_input.clone();
        self.uidata.cmd_mode = self.cmd_mode;
        self.uidata.active_cmdinput = self.active_cmdinput;
        self.uidata.status_message = self.status_message.clone();
        self.uidata.layout = self.uilayout.clone();
        self.uidata.last_update = Instant::now();
    }

    pub fn update(&mut self, message: Option<Message>) -> Result<(), DashError> {
        let Some(msg) = message else {
            return Ok(());
        };
        trace!("Update: Modus {:?}, Message {:?}", self.modus, msg);
        match self.modus {
            Modus::TABLE => match msg {
                Message::Quit => self.quit(),
                Message::MoveUp => self.move_selection_up(1),
                Message::MoveDown => self.move_selection_down(1),
                Message::MovePageUp => self.move_selection_up(self.page_size()),
                Message::MovePageDown => self.move_selection_down(self.page_size()),
                Message::MoveBeginning => self.move_selection_up(usize::MAX),
                Message::MoveEnd => self.move_selection_down(usize::MAX),
                Message::NextDataset | Message::PreviousDataset => self.switch_dataset(),
                Message::NextCategory => self.cycle_category(1),
                Message::PreviousCategory => self.cycle_category(-1),
                Message::Search => self.enter_cmd_mode(CMDMode::Search),
                Message::EnterCommand => self.enter_cmd_mode(CMDMode::Command),
                Message::Enter => self.enter(),
                Message::Exit => self.exit(),
                Message::CopyRow => self.copy_row(),
                Message::Reload => self.reload(),
                Message::Help => self.show_help(),
                Message::Resize(width, height) => self.ui_resize(width, height),
                Message::RawKey(_) => (),
            },
            Modus::DETAIL => match msg {
                Message::Quit => self.quit(),
                Message::MoveUp => self.step_detail(-1),
                Message::MoveDown => self.step_detail(1),
                Message::CopyRow => self.copy_row(),
                Message::Help => self.show_help(),
                Message::Enter | Message::Exit => self.exit(),
                Message::Resize(width, height) => self.ui_resize(width, height),
                _ => (),
            },
            Modus::POPUP => match msg {
                Message::Quit => self.quit(),
                Message::Enter | Message::Exit | Message::Help => self.exit(),
                Message::Resize(width, height) => self.ui_resize(width, height),
                _ => (),
            },
            Modus::CMDINPUT => match msg {
                Message::RawKey(key) => self.raw_input(key),
                Message::Resize(width, height) => self.ui_resize(width, height),
                _ => (),
            },
        }
        Ok(())
    }

    // -------------------- Control handling functions ---------------------- //

    fn ui_resize(&mut self, width: usize, height: usize) {
        trace!(
            "UI was resized! w:{}->{}, h:{}->{}",
            self.uilayout.width, width, self.uilayout.height, height
        );
        self.uilayout = UILayout { width, height };
        self.uidata.layout = self.uilayout.clone();
        self.uidata.last_update = Instant::now();
    }

    fn enter(&mut self) {
        let Some(section) = self.active_section() else {
            return;
        };
        let Some(&row) = section.table.row_ids().get(self.cursor()) else {
            self.set_status_message("Nothing selected.");
            return;
        };
        self.open_detail(RowSelection::Row {
            dataset: self.active,
            row,
        });
    }

    fn open_detail(&mut self, selection: RowSelection) {
        match self.dashboard.detail(selection) {
            Ok(Some(section)) => {
                debug!("Showing detail for {selection:?}");
                self.selection = selection;
                self.detail = Some(section);
                self.previous_modus = self.modus;
                self.modus = Modus::DETAIL;
            }
            Ok(None) => self.set_status_message("Selected item no longer exists."),
            Err(e) => self.set_status_message(format!("Error: {e}")),
        }
        self.update_uidata();
    }

    fn step_detail(&mut self, step: isize) {
        let RowSelection::Row { dataset, .. } = self.selection else {
            return;
        };
        let Some(nrows) = self.active_section().map(|s| s.table.height()) else {
            return;
        };
        let cursor = self.cursor();
        let next = cursor.saturating_add_signed(step);
        if next < nrows && next != cursor {
            self.cursors.insert(dataset, next);
            self.modus = self.previous_modus;
            self.enter();
        }
    }

    fn exit(&mut self) {
        match self.modus {
            Modus::TABLE => {
                if self.query.is_some() {
                    self.input.clear();
                    self.query = None;
                    self.rebuild();
                }
            }
            Modus::DETAIL => {
                self.modus = Modus::TABLE;
                self.previous_modus = Modus::DETAIL;
                self.selection = RowSelection::None;
                self.detail = None;
                self.update_uidata();
            }
            Modus::POPUP => {
                trace!("Close popup ...");
                self.modus = self.previous_modus;
                self.previous_modus = Modus::POPUP;
                self.uidata.show_popup = false;
                self.uidata.last_update = Instant::now();
            }
            Modus::CMDINPUT => {}
        }
    }

    fn show_help(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::POPUP;
        self.uidata.popup_message = HELP_TEXT.to_string();
        self.uidata.show_popup = true;
        self.uidata.last_update = Instant::now();
    }

    fn switch_dataset(&mut self) {
        self.active = self.active.other();
        trace!("Switched to {}", self.active);
        if self.query.is_some() {
            self.update_uidata();
        } else {
            self.rebuild();
        }
    }

    fn cycle_category(&mut self, step: isize) {
        if !self.categories_available() {
            self.set_status_message("No category column, filtering unavailable.");
            return;
        }
        let n = self.categories.len() as isize;
        self.category_idx = (self.category_idx as isize + step).rem_euclid(n) as usize;
        for cursor in self.cursors.values_mut() {
            *cursor = 0;
        }
        let category = self.selected_category();
        self.set_status_message(format!("Category: {category}"));
        self.rebuild();
    }

    fn move_selection_up(&mut self, size: usize) {
        let cursor = self.cursor().saturating_sub(size);
        self.cursors.insert(self.active, cursor);
        self.update_uidata();
    }

    fn move_selection_down(&mut self, size: usize) {
        let nrows = self.active_section().map(|s| s.table.height()).unwrap_or(0);
        let cursor = std::cmp::min(
            self.cursor().saturating_add(size),
            nrows.saturating_sub(1),
        );
        self.cursors.insert(self.active, cursor);
        self.update_uidata();
    }

    fn enter_cmd_mode(&mut self, mode: CMDMode) {
        trace!("Entering command mode {mode:?} ...");
        self.previous_modus = self.modus;
        self.modus = Modus::CMDINPUT;
        self.cmd_mode = Some(mode);
        self.active_cmdinput = true;
        match mode {
            CMDMode::Search => {
                let current = self.query.as_ref().map(|q| q.to_string()).unwrap_or_default();
                self.input.set(&current);
            }
            CMDMode::Command => self.input.clear(),
        }
        self.last_input = self.input.get();
        self.update_uidata();
    }

    fn raw_input(&mut self, key: KeyEvent) {
        self.last_input = self.input.read(key);
        if self.cmd_mode == Some(CMDMode::Search) && self.last_input.changed {
            let text = self.last_input.input.clone();
            self.apply_query(&text);
        }
        if self.last_input.finished {
            self.handle_cmd_input();
        }
        self.update_uidata();
    }

    fn apply_query(&mut self, text: &str) {
        let query = SearchQuery::parse(text);
        if query != self.query {
            self.query = query;
            for cursor in self.cursors.values_mut() {
                *cursor = 0;
            }
            self.rebuild();
        }
    }

    fn handle_cmd_input(&mut self) {
        trace!("Handle cmd input {}", self.last_input.input);
        self.active_cmdinput = false;
        self.modus = self.previous_modus;
        self.previous_modus = Modus::CMDINPUT;

        let cmd_input = self.last_input.input.clone();
        let canceled = self.last_input.canceled;
        match self.cmd_mode {
            Some(CMDMode::Search) => {
                self.apply_query(&cmd_input);
                if let Some(query) = &self.query {
                    let total: usize = self.sections.iter().map(|s| s.table.height()).sum();
                    self.set_status_message(format!("Found {total} results for '{query}'"));
                }
            }
            Some(CMDMode::Command) if !canceled => self.run_command(&cmd_input),
            Some(CMDMode::Command) => {}
            None => info!("Cmd mode is none!"),
        }
        self.cmd_mode = None;
    }

    fn run_command(&mut self, command: &str) {
        let mut parts = command.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("q") | Some("quit"), _) => self.quit(),
            (Some("reload"), _) => self.reload(),
            (Some("open"), Some(target)) => {
                let path: Vec<&str> = parts.collect();
                match (DatasetKind::from_key(target), path.is_empty()) {
                    (Some(kind), false) => {
                        let raw = path.join(" ");
                        let path = shellexpand::full(&raw)
                            .map(|p| PathBuf::from(p.as_ref()))
                            .unwrap_or_else(|_| PathBuf::from(&raw));
                        self.open(kind, Source::Path(path));
                    }
                    _ => self.set_status_message("Usage: open stock|arrival <path>"),
                }
            }
            _ => self.set_status_message(format!("Unknown command: {command}")),
        }
    }

    fn open(&mut self, kind: DatasetKind, source: Source) {
        let label = source.to_string();
        match self.dashboard.open(kind, source) {
            Some(error) => self.set_status_message(error),
            None => self.set_status_message(format!("Loaded {label} as {}", kind.title())),
        }
        self.cursors.insert(kind, 0);
        self.refresh_categories();
        self.rebuild();
    }

    fn reload(&mut self) {
        let start_time = Instant::now();
        let errors = self.dashboard.reload();
        match errors.first() {
            Some(first) => self.set_status_message(first.clone()),
            None => self.set_status_message(format!(
                "Reloaded data in {}ms",
                start_time.elapsed().as_millis()
            )),
        }
        self.refresh_categories();
        self.rebuild();
    }

    fn wrap_cell_content(c: &str) -> String {
        let needs_escaping = c.contains('"');
        let needs_wrapping = c.chars().any(|c| c == ' ' || c == '\t' || c == ',');
        let mut out = String::from(c);

        if needs_escaping {
            out = out.replace('"', "\"\"");
        }
        if needs_wrapping || needs_escaping {
            out = format!("\"{out}\"");
        }
        out
    }

    /// CSV line of the row currently shown as selected, with the columns the
    /// current view shows.
    fn selected_row_csv(&self) -> Option<String> {
        let (table, position) = match (&self.modus, &self.detail) {
            (Modus::DETAIL, Some(detail)) => (&detail.table, 0),
            _ => (&self.active_section()?.table, self.cursor()),
        };
        if position >= table.height() {
            return None;
        }
        let content: Vec<String> = table
            .row_values(position)
            .iter()
            .map(|v| Self::wrap_cell_content(v.as_deref().unwrap_or("")))
            .collect();
        Some(content.join(","))
    }

    fn copy_row(&mut self) {
        let Some(row_content) = self.selected_row_csv() else {
            self.set_status_message("Nothing to copy.");
            return;
        };
        let result = match self.clipboard.as_mut() {
            Some(clipboard) => clipboard.set_text(row_content),
            None => Clipboard::new().and_then(|mut clipboard| {
                let result = clipboard.set_text(row_content);
                self.clipboard = Some(clipboard);
                result
            }),
        };
        match result {
            Ok(_) => self.set_status_message("Copied row to clipboard."),
            Err(e) => {
                let e = DashError::from(e);
                debug!("Error copying to clipboard: {e}");
                self.set_status_message(format!("Could not copy: {e}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::tests::dashboard;
    use ratatui::crossterm::event::{KeyCode, KeyModifiers};

    fn model() -> Model {
        Model::with_dashboard(dashboard(), 120, 40)
    }

    fn send(model: &mut Model, msg: Message) {
        model.update(Some(msg)).unwrap();
    }

    fn type_keys(model: &mut Model, s: &str) {
        for c in s.chars() {
            send(model, Message::RawKey(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)));
        }
    }

    fn key(model: &mut Model, code: KeyCode) {
        send(model, Message::RawKey(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    #[test]
    fn starts_in_browse_mode_on_stock() {
        let model = model();
        let ui = model.get_uidata();
        assert!(!ui.search_mode);
        assert_eq!(ui.active_tab, 0);
        assert_eq!(ui.sections.len(), 1);
        assert_eq!(ui.sections[0].nrows, 4);
        assert_eq!(ui.sections[0].subtitle, "Last Updated: 2025-10-29");
        assert!(!ui.sections[0].cost_visible);
        assert_eq!(ui.category, "All Categories");
    }

    #[test]
    fn live_search_switches_modes() {
        let mut model = model();
        send(&mut model, Message::Search);
        assert!(model.raw_keyevents());
        type_keys(&mut model, "8765");
        {
            let ui = model.get_uidata();
            assert!(ui.search_mode);
            assert_eq!(ui.heading, "Search Results for: '8765'");
            assert_eq!(ui.sections.len(), 2);
            assert!(ui.sections.iter().all(|s| s.cost_visible));
        }
        key(&mut model, KeyCode::Enter);
        assert!(!model.raw_keyevents());
        assert!(model.get_uidata().search_mode);

        send(&mut model, Message::Exit);
        assert!(!model.get_uidata().search_mode);
    }

    #[test]
    fn search_without_matches_shows_message() {
        let mut model = model();
        send(&mut model, Message::Search);
        type_keys(&mut model, "zzz");
        let ui = model.get_uidata();
        assert!(ui.sections.is_empty());
        assert_eq!(
            ui.no_results.as_deref(),
            Some("No matching items found for 'zzz' in either dataset.")
        );
    }

    #[test]
    fn escape_in_search_input_clears_query() {
        let mut model = model();
        send(&mut model, Message::Search);
        type_keys(&mut model, "shirt");
        key(&mut model, KeyCode::Esc);
        assert!(!model.get_uidata().search_mode);
        assert!(!model.raw_keyevents());
    }

    #[test]
    fn search_focuses_dataset_with_results() {
        let mut model = model();
        send(&mut model, Message::Search);
        type_keys(&mut model, "hose");
        key(&mut model, KeyCode::Enter);
        assert_eq!(model.get_uidata().active_tab, 1);
        assert_eq!(model.get_uidata().sections.len(), 1);
    }

    #[test]
    fn category_cycle_filters_and_resets() {
        let mut model = model();
        send(&mut model, Message::NextCategory);
        assert_eq!(model.get_uidata().category, "Apparel");
        assert_eq!(model.get_uidata().sections[0].nrows, 2);
        assert!(model.get_uidata().sections[0].cost_visible);

        send(&mut model, Message::PreviousCategory);
        assert_eq!(model.get_uidata().category, "All Categories");
        assert_eq!(model.get_uidata().sections[0].nrows, 4);
    }

    #[test]
    fn empty_category_in_other_dataset_has_message() {
        let mut model = model();
        send(&mut model, Message::NextCategory);
        send(&mut model, Message::NextCategory);
        assert_eq!(model.get_uidata().category, "Garden");
        let section = &model.get_uidata().sections[0];
        assert_eq!(section.nrows, 0);
        assert_eq!(section.empty_message.as_deref(), Some("No items in category Garden."));
    }

    #[test]
    fn switching_tabs_shows_arrivals() {
        let mut model = model();
        send(&mut model, Message::NextDataset);
        let ui = model.get_uidata();
        assert_eq!(ui.active_tab, 1);
        assert_eq!(ui.sections[0].kind, DatasetKind::NewArrival);
        assert_eq!(ui.sections[0].subtitle, "Last Updated: 2025-10-30");
    }

    #[test]
    fn cursor_is_clamped() {
        let mut model = model();
        send(&mut model, Message::MoveEnd);
        assert_eq!(model.get_uidata().sections[0].selected_row, 3);
        send(&mut model, Message::MoveDown);
        assert_eq!(model.get_uidata().sections[0].selected_row, 3);
        send(&mut model, Message::MoveBeginning);
        assert_eq!(model.get_uidata().sections[0].selected_row, 0);
    }

    #[test]
    fn detail_view_reveals_cost_and_closes() {
        let mut model = model();
        send(&mut model, Message::MoveDown);
        send(&mut model, Message::Enter);
        let detail = model.get_uidata().detail.clone().unwrap();
        assert_eq!(detail.title, "Warehouse Stock item");
        assert!(detail.fields.contains(&("Cost".to_string(), "7.25".to_string())));
        assert!(detail.fields.iter().all(|(name, _)| name != "Category"));

        send(&mut model, Message::MoveDown);
        let detail = model.get_uidata().detail.clone().unwrap();
        assert!(detail.fields.contains(&("itembarcode".to_string(), "22223333".to_string())));

        send(&mut model, Message::Exit);
        assert!(model.get_uidata().detail.is_none());
    }

    #[test]
    fn copied_row_follows_visible_columns() {
        let model = model();
        assert_eq!(
            model.selected_row_csv().as_deref(),
            Some("87654321,\"Blue T-Shirt\"")
        );
    }

    #[test]
    fn help_popup_opens_and_closes() {
        let mut model = model();
        send(&mut model, Message::Help);
        assert!(model.get_uidata().show_popup);
        send(&mut model, Message::Exit);
        assert!(!model.get_uidata().show_popup);
    }

    #[test]
    fn commands_open_and_report_errors() {
        let mut model = model();
        send(&mut model, Message::EnterCommand);
        type_keys(&mut model, "open stock /nonexistent/stock.xlsx");
        key(&mut model, KeyCode::Enter);
        let ui = model.get_uidata();
        assert!(ui.status_message.starts_with("Could not load Warehouse Stock"));
        assert_eq!(
            ui.sections[0].empty_message.as_deref(),
            Some("Could not display data from /nonexistent/stock.xlsx.")
        );

        send(&mut model, Message::EnterCommand);
        type_keys(&mut model, "frobnicate");
        key(&mut model, KeyCode::Enter);
        assert_eq!(model.get_uidata().status_message, "Unknown command: frobnicate");

        send(&mut model, Message::EnterCommand);
        type_keys(&mut model, "quit");
        key(&mut model, KeyCode::Enter);
        assert_eq!(model.status, Status::QUITTING);
    }

    #[test]
    fn quit_from_table() {
        let mut model = model();
        send(&mut model, Message::Quit);
        assert_eq!(model.status, Status::QUITTING);
    }

    #[test]
    fn wraps_csv_cells() {
        assert_eq!(Model::wrap_cell_content("plain"), "plain");
        assert_eq!(Model::wrap_cell_content("a,b"), "\"a,b\"");
        assert_eq!(Model::wrap_cell_content("5\" nail"), "\"5\"\" nail\"");
    }
}
