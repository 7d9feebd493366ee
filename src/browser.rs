use crossterm::event::KeyCode;
use ratatui::{
    layout::{Alignment, Constraint, Direction as LayoutDirection, Layout, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::fmt::{money, pct};
use crate::reports::{
    category_rows, category_totals, sort_drill_rows, CategorisedRow, CategoryTotal, Direction,
    DrillRow, SortColumn, ViewFilter,
};
use crate::tui::{
    self, View, ViewAction, COLUMN_STYLE, HIGHLIGHT_STYLE, HINT_STYLE, PALETTE, TITLE_STYLE,
};

const PAGE_SIZE: usize = 10;

/// Interactive category breakdown: a bar chart of category shares, the
/// category totals table, and the transactions behind the selected category.
pub struct CategoryBrowser {
    rows: Vec<CategorisedRow>,
    filter: ViewFilter,
    totals: Vec<CategoryTotal>,
    selected: usize,
    category_state: TableState,
    drill: Vec<DrillRow>,
    sort: SortColumn,
    descending: bool,
    drill_offset: usize,
    drill_visible: usize,
}

impl CategoryBrowser {
    pub fn new(rows: Vec<CategorisedRow>, filter: ViewFilter) -> Self {
        let mut browser = Self {
            rows,
            filter,
            totals: Vec::new(),
            selected: 0,
            category_state: TableState::default(),
            drill: Vec::new(),
            sort: SortColumn::default(),
            descending: false,
            drill_offset: 0,
            drill_visible: PAGE_SIZE,
        };
        browser.regroup();
        browser
    }

    pub fn selected_category(&self) -> Option<&str> {
        self.totals.get(self.selected).map(|t| t.name.as_str())
    }

    /// Rebuild the grouping after a filter change. Selection goes back to
    /// the largest category.
    fn regroup(&mut self) {
        self.totals = category_totals(&self.rows, &self.filter);
        self.selected = 0;
        self.refresh_drill();
    }

    fn refresh_drill(&mut self) {
        self.drill = match self.totals.get(self.selected) {
            Some(total) => category_rows(&self.rows, &self.filter, &total.name),
            None => Vec::new(),
        };
        sort_drill_rows(&mut self.drill, self.sort, self.descending);
        self.drill_offset = 0;
    }

    fn resort(&mut self) {
        sort_drill_rows(&mut self.drill, self.sort, self.descending);
        self.drill_offset = 0;
    }

    fn select(&mut self, idx: usize) {
        if idx < self.totals.len() && idx != self.selected {
            self.selected = idx;
            self.refresh_drill();
        }
    }

    fn scroll_down(&mut self) {
        let new_offset = self.drill_offset + self.drill_visible;
        if new_offset < self.drill.len() {
            self.drill_offset = new_offset;
        }
    }

    fn scroll_up(&mut self) {
        self.drill_offset = self.drill_offset.saturating_sub(self.drill_visible);
    }

    fn paid_in(&self) -> bool {
        self.filter.direction == Direction::PaidIn
    }

    fn draw_chart(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(format!(" {} by category ", self.filter.direction.label()))
            .title_style(Style::default().add_modifier(Modifier::BOLD))
            .borders(Borders::ALL);

        let label_width = (area.width / 3).max(8) as usize;
        let bars: Vec<Bar> = self
            .totals
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let mut label = t.name.clone();
                if label.chars().count() > label_width {
                    label = label.chars().take(label_width.saturating_sub(1)).collect();
                    label.push('\u{2026}');
                }
                let mut style = Style::default().fg(PALETTE[i % PALETTE.len()]);
                if i == self.selected {
                    style = style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
                }
                Bar::default()
                    .value((t.total * 100.0).round() as u64)
                    .label(Line::from(label))
                    .text_value(pct(t.pct))
                    .style(style)
            })
            .collect();

        let chart = BarChart::default()
            .block(block)
            .direction(LayoutDirection::Horizontal)
            .bar_width(1)
            .bar_gap(0)
            .data(BarGroup::default().bars(&bars));
        frame.render_widget(chart, area);
    }

    fn draw_category_table(&mut self, frame: &mut Frame, area: Rect) {
        let rows: Vec<Row> = self
            .totals
            .iter()
            .map(|t| {
                Row::new(vec![
                    Cell::from(t.name.clone()),
                    Cell::from(tui::money_span(t.total, self.paid_in())),
                    Cell::from(pct(t.pct)),
                ])
            })
            .collect();
        let grand_total: f64 = self.totals.iter().map(|t| t.total).sum();

        let table = Table::new(
            rows,
            [Constraint::Fill(1), Constraint::Length(12), Constraint::Length(7)],
        )
        .header(Row::new(vec!["Category", "Amount", "Share"]).style(COLUMN_STYLE))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Total {} ", money(grand_total))),
        )
        .column_spacing(1)
        .row_highlight_style(HIGHLIGHT_STYLE);

        self.category_state.select(Some(self.selected));
        frame.render_stateful_widget(table, area, &mut self.category_state);
    }

    fn draw_drill_table(&mut self, frame: &mut Frame, area: Rect) {
        const FIXED: u16 = 10 + 20 + 12 + 9;
        let desc_width = area.width.saturating_sub(FIXED + 4).max(10) as usize;

        let header_overhead = 1usize;
        let available = (area.height as usize).saturating_sub(header_overhead);
        let mut rendered = Vec::new();
        let mut used = 0usize;
        for row in self.drill.iter().skip(self.drill_offset) {
            let desc = tui::wrap_cell(&row.description, desc_width);
            let lines = desc.height() as u16;
            if used + lines as usize > available && !rendered.is_empty() {
                break;
            }
            used += lines as usize;
            rendered.push(
                Row::new(vec![
                    Cell::from(row.date.clone()),
                    Cell::from(row.transaction_type.clone()),
                    Cell::from(desc),
                    Cell::from(tui::money_span(row.amount, self.paid_in())),
                    Cell::from(if row.essential { "Y" } else { "N" }),
                ])
                .height(lines),
            );
        }
        self.drill_visible = rendered.len().max(1);

        let arrow = if self.descending { "\u{25bc}" } else { "\u{25b2}" };
        let header: Vec<String> = [
            SortColumn::Date,
            SortColumn::Type,
            SortColumn::Description,
            SortColumn::Amount,
        ]
        .iter()
        .map(|c| {
            if *c == self.sort {
                format!("{} {arrow}", c.label())
            } else {
                c.label().to_string()
            }
        })
        .chain(std::iter::once("Essential".to_string()))
        .collect();

        let table = Table::new(
            rendered,
            [
                Constraint::Length(10),
                Constraint::Length(20),
                Constraint::Fill(1),
                Constraint::Length(12),
                Constraint::Length(9),
            ],
        )
        .header(Row::new(header).style(COLUMN_STYLE))
        .column_spacing(1);
        frame.render_widget(table, area);
    }
}

impl View for CategoryBrowser {
    fn draw(&mut self, frame: &mut Frame) {
        let [title_area, filter_area, top_area, label_area, drill_area, keys_area] =
            Layout::vertical([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Percentage(50),
                Constraint::Length(1),
                Constraint::Fill(1),
                Constraint::Length(1),
            ])
            .areas(frame.area());

        frame.render_widget(
            Paragraph::new("Bank Transactions Categorisation").style(TITLE_STYLE),
            title_area,
        );
        frame.render_widget(
            Paragraph::new(self.filter.describe()).style(HINT_STYLE),
            filter_area,
        );

        if self.totals.is_empty() {
            frame.render_widget(
                Paragraph::new("No data")
                    .alignment(Alignment::Center)
                    .block(Block::default().borders(Borders::ALL)),
                top_area,
            );
        } else {
            let [chart_area, table_area] =
                Layout::horizontal([Constraint::Fill(3), Constraint::Fill(2)]).areas(top_area);
            self.draw_chart(frame, chart_area);
            self.draw_category_table(frame, table_area);
        }

        let label = match self.selected_category() {
            Some(name) => format!(
                "Transactions in category: {name} ({} rows)",
                self.drill.len()
            ),
            None => "Select a category to see transactions".to_string(),
        };
        frame.render_widget(
            Paragraph::new(label).style(Style::default().add_modifier(Modifier::BOLD)),
            label_area,
        );
        self.draw_drill_table(frame, drill_area);

        frame.render_widget(
            Paragraph::new(
                "\u{2191}/\u{2193}:category  tab:paid out/in  c:sub-categories  e:essential  s:sort  r:reverse  pgup/pgdn:scroll  q:quit",
            )
            .style(HINT_STYLE),
            keys_area,
        );
    }

    fn handle_key(&mut self, code: KeyCode) -> ViewAction {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Close,
            KeyCode::Down => self.select(self.selected + 1),
            KeyCode::Up => {
                if self.selected > 0 {
                    self.select(self.selected - 1);
                }
            }
            KeyCode::Home => self.select(0),
            KeyCode::End => self.select(self.totals.len().saturating_sub(1)),
            KeyCode::Tab | KeyCode::BackTab => {
                self.filter.direction = self.filter.direction.toggle();
                self.regroup();
            }
            KeyCode::Char('c') => {
                self.filter.level = self.filter.level.toggle();
                self.regroup();
            }
            KeyCode::Char('e') => {
                self.filter.essential = self.filter.essential.next();
                self.regroup();
            }
            KeyCode::Char('s') => {
                self.sort = self.sort.next();
                self.resort();
            }
            KeyCode::Char('r') => {
                self.descending = !self.descending;
                self.resort();
            }
            KeyCode::PageDown | KeyCode::Char('n') => self.scroll_down(),
            KeyCode::PageUp | KeyCode::Char('p') => self.scroll_up(),
            _ => {}
        }
        ViewAction::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::tests::{row, sample};
    use crate::reports::{CategoryLevel, EssentialFilter};
    use ratatui::{backend::TestBackend, Terminal};

    fn screen(browser: &mut CategoryBrowser) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| browser.draw(f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_starts_on_largest_category() {
        let browser = CategoryBrowser::new(sample(), ViewFilter::default());
        assert_eq!(browser.selected_category(), Some("Bills; Energy"));
        assert_eq!(browser.drill.len(), 1);
        assert_eq!(browser.drill[0].description, "EDF");
    }

    #[test]
    fn test_select_updates_drill_down() {
        let mut browser = CategoryBrowser::new(sample(), ViewFilter::default());
        browser.handle_key(KeyCode::Down);
        assert_eq!(browser.selected_category(), Some("Food; Groceries"));
        assert_eq!(browser.drill[0].description, "TESCO");

        // Can't go past the last category
        browser.handle_key(KeyCode::End);
        browser.handle_key(KeyCode::Down);
        assert_eq!(browser.selected, browser.totals.len() - 1);

        browser.handle_key(KeyCode::Home);
        browser.handle_key(KeyCode::Up);
        assert_eq!(browser.selected, 0);
    }

    #[test]
    fn test_tab_switches_direction_and_resets_selection() {
        let mut browser = CategoryBrowser::new(sample(), ViewFilter::default());
        browser.handle_key(KeyCode::Down);
        browser.handle_key(KeyCode::Tab);
        assert_eq!(browser.filter.direction, Direction::PaidIn);
        assert_eq!(browser.selected, 0);
        assert_eq!(browser.selected_category(), Some("Income"));
    }

    #[test]
    fn test_toggle_top_level() {
        let mut browser = CategoryBrowser::new(sample(), ViewFilter::default());
        browser.handle_key(KeyCode::Char('c'));
        assert_eq!(browser.filter.level, CategoryLevel::TopLevel);
        let names: Vec<&str> = browser.totals.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Bills", "Food", "Uncategorised"]);
    }

    #[test]
    fn test_essential_filter_cycles() {
        let mut browser = CategoryBrowser::new(sample(), ViewFilter::default());
        browser.handle_key(KeyCode::Char('e'));
        assert_eq!(browser.filter.essential, EssentialFilter::Essential);
        assert_eq!(browser.totals.len(), 2);
        browser.handle_key(KeyCode::Char('e'));
        browser.handle_key(KeyCode::Char('e'));
        assert_eq!(browser.filter.essential, EssentialFilter::All);
        assert_eq!(browser.totals.len(), 4);
    }

    #[test]
    fn test_sort_and_reverse_drill_rows() {
        let rows = vec![
            row(1, "B SHOP", 5.0, 0.0, "Food", false),
            row(2, "A SHOP", 20.0, 0.0, "Food", false),
            row(3, "C SHOP", 1.0, 0.0, "Food", false),
        ];
        let mut browser = CategoryBrowser::new(rows, ViewFilter::default());
        assert_eq!(browser.drill[0].description, "B SHOP");

        browser.handle_key(KeyCode::Char('s')); // Type
        browser.handle_key(KeyCode::Char('s')); // Description
        assert_eq!(browser.sort, SortColumn::Description);
        assert_eq!(browser.drill[0].description, "A SHOP");

        browser.handle_key(KeyCode::Char('s')); // Amount
        browser.handle_key(KeyCode::Char('r'));
        assert_eq!(browser.drill[0].amount, 20.0);
        assert_eq!(browser.drill[2].amount, 1.0);
    }

    #[test]
    fn test_quit_keys_close() {
        let mut browser = CategoryBrowser::new(sample(), ViewFilter::default());
        assert!(matches!(browser.handle_key(KeyCode::Char('q')), ViewAction::Close));
        assert!(matches!(browser.handle_key(KeyCode::Esc), ViewAction::Close));
        assert!(matches!(browser.handle_key(KeyCode::Char('x')), ViewAction::Continue));
    }

    #[test]
    fn test_scroll_drill_rows() {
        let rows: Vec<CategorisedRow> = (1..=25)
            .map(|i| row(i, &format!("SHOP {i}"), 1.0, 0.0, "Food", false))
            .collect();
        let mut browser = CategoryBrowser::new(rows, ViewFilter::default());
        browser.drill_visible = 10;
        browser.handle_key(KeyCode::PageDown);
        assert_eq!(browser.drill_offset, 10);
        browser.handle_key(KeyCode::PageDown);
        browser.handle_key(KeyCode::PageDown);
        assert_eq!(browser.drill_offset, 20);
        browser.handle_key(KeyCode::PageUp);
        assert_eq!(browser.drill_offset, 10);
    }

    #[test]
    fn test_draw_shows_categories() {
        let mut browser = CategoryBrowser::new(sample(), ViewFilter::default());
        let text = screen(&mut browser);
        assert!(text.contains("Transactions in category: Bills; Energy"));
        assert!(text.contains("Paid out | All | Full categories"));
        assert!(text.contains("TESCO") || text.contains("Food; Groceries"));
    }

    #[test]
    fn test_draw_empty_shows_no_data() {
        let mut browser = CategoryBrowser::new(Vec::new(), ViewFilter::default());
        let text = screen(&mut browser);
        assert!(text.contains("No data"));
        assert!(text.contains("Select a category to see transactions"));
    }
}
