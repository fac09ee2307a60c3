use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;

use crate::fmt::soles;

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

pub const BRAND_STYLE: Style = Style::new()
    .fg(Color::Rgb(90, 160, 255))
    .add_modifier(Modifier::BOLD);

pub const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const AMOUNT_STYLE: Style = Style::new().fg(Color::Rgb(80, 220, 100));
pub const AMOUNT_NEG_STYLE: Style = Style::new().fg(Color::Red);

pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(40, 40, 60))
    .add_modifier(Modifier::BOLD);

pub const INPUT_STYLE: Style = Style::new().fg(Color::White).bg(Color::Rgb(30, 30, 30));
pub const ACTIVE_INPUT_STYLE: Style = Style::new()
    .fg(Color::Black)
    .bg(Color::Yellow);

/// Total in soles, green unless negative.
pub fn total_span(amount: f64) -> Span<'static> {
    let style = if amount < 0.0 {
        AMOUNT_NEG_STYLE
    } else {
        AMOUNT_STYLE
    };
    Span::styled(soles(amount), style.add_modifier(Modifier::BOLD))
}

/// Wrap text to a given width. Returns (wrapped_string, line_count).
pub fn wrap_text(text: &str, width: usize) -> (String, u16) {
    if width == 0 {
        return (text.to_string(), 1);
    }
    let wrapped = textwrap::fill(text, width);
    let lines = wrapped.lines().count().max(1) as u16;
    (wrapped, lines)
}

/// Area for a popup `width` columns wide, centered horizontally, a couple
/// of rows below the top edge.
pub fn top_popup(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let [row] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Start)
        .areas(Rect {
            y: area.y.saturating_add(2).min(area.bottom()),
            height: area.height.saturating_sub(2),
            ..area
        });
    let [popup] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(row);
    popup
}

/// Restore the terminal before the default panic output.
pub fn install_panic_hook() {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        hook(info);
    }));
}
