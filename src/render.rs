use std::fmt::Write;

use minesweeper_common::{models::CellValue, protocol::GameState};
use minesweeper_engine::{Cell, Engine};

/// What the engine's events ask the front end to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Menu,
    Redraw,
    Won,
    Lost,
    NoFlags,
}

impl Notice {
    pub fn alert(self) -> Option<&'static str> {
        match self {
            Notice::Won => Some("Congratulations, you WIN!"),
            Notice::Lost => Some("Sorry, you LOST."),
            Notice::NoFlags => Some("Sorry, no flags left."),
            Notice::Menu | Notice::Redraw => None,
        }
    }
}

/// Elapsed time as `m:ss`.
pub fn format_elapsed(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

fn symbol(cell: &Cell) -> char {
    match cell.value() {
        CellValue::Closed => '#',
        CellValue::Flag => 'F',
        CellValue::Empty => '.',
        CellValue::Number => char::from_digit(u32::from(cell.number()), 10).unwrap_or('?'),
        CellValue::Mine => '*',
        CellValue::Hint => '%',
    }
}

/// Draws the visible window with window-relative row/column labels.
pub fn board(engine: &Engine) -> String {
    let view = engine.view();
    let mut out = String::new();

    let _ = writeln!(
        out,
        "flags: {}  time: {}  {}",
        engine.flags(),
        format_elapsed(engine.time()),
        status(engine.state())
    );
    if view.is_scrollable() {
        let _ = writeln!(
            out,
            "rows {}-{} / cols {}-{} of {}x{}",
            view.top(),
            view.bottom(),
            view.left(),
            view.right(),
            engine.height(),
            engine.width()
        );
    }

    out.push_str("   ");
    for col in 0..view.width() {
        let _ = write!(out, "{}", col % 10);
    }
    out.push('\n');

    let cells: Vec<&Cell> = engine.visible_cells().collect();
    for (row, chunk) in cells.chunks(view.width().max(1)).enumerate() {
        let _ = write!(out, "{:>2} ", row);
        out.extend(chunk.iter().map(|cell| symbol(cell)));
        out.push('\n');
    }

    out
}

fn status(state: GameState) -> &'static str {
    match state {
        GameState::Unconfigured | GameState::Ready => "(type 'start' to play)",
        GameState::Playing => "",
        GameState::Won => "(won)",
        GameState::Lost => "(lost)",
    }
}
