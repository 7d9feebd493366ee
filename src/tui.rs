use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::{DefaultTerminal, Frame};

use crate::error::Result;
use crate::fmt::money;

/// Screen title and table headers.
pub const TITLE_STYLE: Style = Style::new().fg(Color::Cyan).add_modifier(Modifier::BOLD);
pub const COLUMN_STYLE: Style = Style::new()
    .fg(Color::Cyan)
    .add_modifier(Modifier::BOLD.union(Modifier::UNDERLINED));
/// Filter description and key hints.
pub const HINT_STYLE: Style = Style::new().fg(Color::Gray).add_modifier(Modifier::DIM);
pub const HIGHLIGHT_STYLE: Style = Style::new()
    .fg(Color::Black)
    .bg(Color::Cyan)
    .add_modifier(Modifier::BOLD);

pub const PAID_IN_STYLE: Style = Style::new().fg(Color::Green);
pub const PAID_OUT_STYLE: Style = Style::new().fg(Color::LightRed);

/// One colour per chart bar, repeating when there are more categories.
pub const PALETTE: &[Color] = &[
    Color::Cyan,
    Color::Magenta,
    Color::Yellow,
    Color::Green,
    Color::Blue,
    Color::LightRed,
    Color::LightCyan,
    Color::LightMagenta,
];

pub fn money_span(amount: f64, paid_in: bool) -> Span<'static> {
    Span::styled(
        money(amount.abs()),
        if paid_in { PAID_IN_STYLE } else { PAID_OUT_STYLE },
    )
}

/// Word-wrap a table cell to `width` columns. The row height is the
/// returned text's `height()`.
pub fn wrap_cell(text: &str, width: usize) -> Text<'static> {
    if width == 0 {
        return Text::raw(text.to_string());
    }
    textwrap::wrap(text, width)
        .into_iter()
        .map(|line| Line::raw(line.into_owned()))
        .collect::<Vec<_>>()
        .into()
}

// ---------------------------------------------------------------------------
// Interactive views
// ---------------------------------------------------------------------------

pub enum ViewAction {
    Continue,
    Close,
}

/// A full-screen interactive view driven by `run_view`.
pub trait View {
    fn draw(&mut self, frame: &mut Frame);
    fn handle_key(&mut self, code: KeyCode) -> ViewAction;
}

/// Route one key event to the view. Ctrl-C always closes; key releases and
/// repeats are ignored.
fn dispatch_key(view: &mut dyn View, key: KeyEvent) -> ViewAction {
    if key.kind != KeyEventKind::Press {
        return ViewAction::Continue;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return ViewAction::Close;
    }
    view.handle_key(key.code)
}

fn event_loop(terminal: &mut DefaultTerminal, view: &mut dyn View) -> Result<()> {
    loop {
        terminal.draw(|frame| view.draw(frame))?;
        if let Event::Key(key) = event::read()? {
            if let ViewAction::Close = dispatch_key(view, key) {
                return Ok(());
            }
        }
    }
}

/// Take over the terminal until the view closes. The terminal is restored
/// on exit and on panic.
pub fn run_view(view: &mut dyn View) -> Result<()> {
    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        previous_hook(info);
    }));

    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, view);
    ratatui::restore();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_cell_splits_long_descriptions() {
        let text = wrap_cell("CARD PAYMENT TO SOMEWHERE VERY FAR AWAY", 12);
        assert!(text.height() > 1);
        assert!(text.lines.iter().all(|l| l.width() <= 12));
    }

    #[test]
    fn test_wrap_cell_zero_width() {
        assert_eq!(wrap_cell("abc", 0).height(), 1);
        assert_eq!(wrap_cell("", 10).height(), 1);
    }

    struct Counter(u32);

    impl View for Counter {
        fn draw(&mut self, _frame: &mut Frame) {}
        fn handle_key(&mut self, code: KeyCode) -> ViewAction {
            self.0 += 1;
            match code {
                KeyCode::Char('q') => ViewAction::Close,
                _ => ViewAction::Continue,
            }
        }
    }

    #[test]
    fn test_ctrl_c_closes_without_reaching_view() {
        let mut view = Counter(0);
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(matches!(dispatch_key(&mut view, key), ViewAction::Close));
        assert_eq!(view.0, 0);
    }

    #[test]
    fn test_key_release_is_ignored() {
        let mut view = Counter(0);
        let mut key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        key.kind = KeyEventKind::Release;
        assert!(matches!(dispatch_key(&mut view, key), ViewAction::Continue));
        key.kind = KeyEventKind::Press;
        assert!(matches!(dispatch_key(&mut view, key), ViewAction::Close));
        assert_eq!(view.0, 1);
    }

    #[test]
    fn test_money_span_is_unsigned() {
        assert_eq!(money_span(-12.5, false).content, "\u{a3}12.50");
        assert_eq!(money_span(12.5, true).style, PAID_IN_STYLE);
    }
}
