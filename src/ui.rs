use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Position, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::border,
    text::{Line, Span, Text},
    widgets::{Block, Cell, Clear, Paragraph, Row, Table, TableState, Tabs, Wrap},
};

use crate::config::DashboardConfig;
use crate::domain::CMDMode;
use crate::model::{DetailData, Model, SectionData, UIData};

pub const TITLE_HEIGHT: usize = 1;
pub const SEARCHBAR_HEIGHT: usize = 3;
pub const TABS_HEIGHT: usize = 1;
pub const CATEGORY_HEIGHT: usize = 1;
pub const CMDLINE_HEIGH: usize = 1;
// Section border, subtitle and table header
pub const SECTION_OVERHEAD: usize = 4;
pub const CHROME_HEIGHT: usize = TITLE_HEIGHT
    + SEARCHBAR_HEIGHT
    + TABS_HEIGHT
    + CATEGORY_HEIGHT
    + CMDLINE_HEIGH
    + SECTION_OVERHEAD;
pub const COLUMN_SPACING: u16 = 2;

#[derive(Debug)]
pub struct TableUI {
    max_column_width: usize,
}

impl TableUI {
    pub fn new(cfg: &DashboardConfig) -> Self {
        Self {
            max_column_width: cfg.max_column_width,
        }
    }

    pub fn draw(&mut self, model: &Model, frame: &mut Frame) {
        let uidata = model.get_uidata();
        let [title, searchbar, tabs, category, body, statusline] = Layout::vertical([
            Constraint::Length(TITLE_HEIGHT as u16),
            Constraint::Length(SEARCHBAR_HEIGHT as u16),
            Constraint::Length(TABS_HEIGHT as u16),
            Constraint::Length(CATEGORY_HEIGHT as u16),
            Constraint::Min(0),
            Constraint::Length(CMDLINE_HEIGH as u16),
        ])
        .areas(frame.area());

        frame.render_widget(
            Line::from(" 📦 Inventory Dashboard ".bold()).centered(),
            title,
        );
        self.draw_searchbar(uidata, frame, searchbar);
        self.draw_tabs(uidata, frame, tabs);
        self.draw_category(uidata, frame, category);
        self.draw_body(uidata, frame, body);
        self.draw_statusline(uidata, frame, statusline);

        if let Some(detail) = &uidata.detail {
            self.draw_detail(detail, frame);
        }
        if uidata.show_popup {
            self.draw_popup(&uidata.popup_message, frame);
        }
    }

    fn draw_searchbar(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let editing = uidata.active_cmdinput && uidata.cmd_mode == Some(CMDMode::Search);
        let text = if editing {
            uidata.cmdinput.input.clone()
        } else {
            uidata.query.clone()
        };
        let content = if text.is_empty() && !editing {
            Line::from("Enter Barcode or Item Description here... (press /)".dark_gray())
        } else {
            Line::from(text)
        };
        let border_style = if editing {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let block = Block::bordered()
            .title(" 🔍 Search for Item Name or Barcode across all inventory ")
            .border_style(border_style);
        frame.render_widget(Paragraph::new(content).block(block), area);

        if editing {
            let x = area.x + 1 + uidata.cmdinput.cursor as u16;
            frame.set_cursor_position(Position::new(
                std::cmp::min(x, area.right().saturating_sub(2)),
                area.y + 1,
            ));
        }
    }

    fn draw_tabs(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        if uidata.search_mode {
            frame.render_widget(
                Line::from(uidata.heading.clone().bold()).centered(),
                area,
            );
        } else {
            let tabs = Tabs::new(uidata.tabs.iter().map(|t| format!(" {t} ")))
                .select(uidata.active_tab)
                .highlight_style(Style::default().fg(Color::Black).bg(Color::Cyan))
                .divider("|");
            let [centered] = Layout::horizontal([Constraint::Length(tabs_width(uidata))])
                .flex(Flex::Center)
                .areas(area);
            frame.render_widget(tabs, centered);
        }
    }

    fn draw_category(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let line = if !uidata.category_available {
            Line::from("Category filter unavailable".dark_gray())
        } else if uidata.search_mode {
            Line::from("Category filter does not apply to search results".dark_gray())
        } else {
            Line::from(vec![
                " Category: ".into(),
                uidata.category.clone().yellow().bold(),
                "  (c / C)".dark_gray(),
            ])
        };
        frame.render_widget(line, area);
    }

    fn draw_body(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        if let Some(message) = &uidata.no_results {
            let warning = Paragraph::new(format!("❌ {message}"))
                .yellow()
                .centered()
                .wrap(Wrap { trim: true })
                .block(Block::bordered().border_set(border::ROUNDED));
            frame.render_widget(warning, area);
            return;
        }
        let areas = Layout::vertical(uidata.sections.iter().map(|_| Constraint::Fill(1))).split(area);
        for (section, section_area) in uidata.sections.iter().zip(areas.iter()) {
            self.draw_section(section, frame, *section_area);
        }
    }

    fn draw_section(&self, section: &SectionData, frame: &mut Frame, area: Rect) {
        let border_set = if section.focused {
            border::THICK
        } else {
            border::PLAIN
        };
        let mut subtitle = vec![Span::from(format!(" 📅 {} ", section.subtitle))];
        if section.cost_visible {
            subtitle.push("· cost shown ".dark_gray());
        }
        let block = Block::bordered()
            .title(Line::from(format!(" {} ", section.heading).bold()))
            .title_bottom(Line::from(subtitle))
            .border_set(border_set);

        if let Some(message) = &section.empty_message {
            frame.render_widget(
                Paragraph::new(format!("⚠️ {message}"))
                    .yellow()
                    .centered()
                    .block(block),
                area,
            );
            return;
        }

        let header = Row::new(
            section
                .columns
                .iter()
                .map(|c| Cell::from(truncate(&c.name, c.width))),
        )
        .style(Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED));
        let rows = (0..section.nrows).map(|ridx| {
            Row::new(
                section
                    .columns
                    .iter()
                    .map(|c| Cell::from(truncate(&c.data[ridx], c.width))),
            )
        });
        let widths = section
            .columns
            .iter()
            .map(|c| Constraint::Length(std::cmp::min(c.width, self.max_column_width) as u16));
        let mut highlight = Style::default();
        if section.focused {
            highlight = highlight.bg(Color::Blue);
        }
        let table = Table::new(rows, widths)
            .header(header)
            .column_spacing(COLUMN_SPACING)
            .row_highlight_style(highlight)
            .block(block);
        let mut state = TableState::default().with_selected(Some(section.selected_row));
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn draw_statusline(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let line = match (uidata.active_cmdinput, uidata.cmd_mode) {
            (true, Some(CMDMode::Command)) => {
                let line = Line::from(vec![":".yellow(), Span::from(uidata.cmdinput.input.clone())]);
                frame.set_cursor_position(Position::new(
                    area.x + 1 + uidata.cmdinput.cursor as u16,
                    area.y,
                ));
                line
            }
            _ => Line::from(vec![
                Span::from(uidata.status_message.clone()),
                "   ? help  q quit".dark_gray(),
            ]),
        };
        frame.render_widget(line, area);
    }

    fn draw_detail(&self, detail: &DetailData, frame: &mut Frame) {
        let area = popup_area(frame.area(), 70, 60);
        let name_width = detail
            .fields
            .iter()
            .map(|(n, _)| n.chars().count())
            .max()
            .unwrap_or(0) as u16;
        let rows = detail.fields.iter().map(|(name, value)| {
            Row::new(vec![
                Cell::from(name.clone().bold()),
                Cell::from(value.clone()),
            ])
        });
        let table = Table::new(rows, [Constraint::Length(name_width), Constraint::Fill(1)])
            .column_spacing(COLUMN_SPACING)
            .block(
                Block::bordered()
                    .title(Line::from(format!(" {} ", detail.title).bold()).centered())
                    .title_bottom(Line::from(" Esc close · ↑↓ previous/next · y copy ").centered())
                    .border_set(border::THICK),
            );
        frame.render_widget(Clear, area);
        frame.render_widget(table, area);
    }

    fn draw_popup(&self, message: &str, frame: &mut Frame) {
        let area = popup_area(frame.area(), 60, 70);
        let popup = Paragraph::new(Text::from(message))
            .block(
                Block::bordered()
                    .title(Line::from(" Help ".bold()).centered())
                    .border_set(border::THICK),
            )
            .wrap(Wrap { trim: false });
        frame.render_widget(Clear, area);
        frame.render_widget(popup, area);
    }
}

fn tabs_width(uidata: &UIData) -> u16 {
    let titles: usize = uidata.tabs.iter().map(|t| t.chars().count() + 3).sum();
    titles as u16
}

fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let [area] = Layout::vertical([Constraint::Percentage(percent_y)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::horizontal([Constraint::Percentage(percent_x)])
        .flex(Flex::Center)
        .areas(area);
    area
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    if width < 3 {
        return "".to_string();
    }
    let mut reduced: String = value.chars().take(width - 3).collect();
    reduced.push_str("...");
    reduced
}
