use minesweeper_common::models::Pos;
use tracing::trace;

use crate::emitter::{Emitter, Scheduler};

/// Default cap on the visible window, per axis.
pub const DEFAULT_VIEW_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// A movable window over the board. Bounds are inclusive.
///
/// The window only stores positions; callers resolve them against the live
/// board, so a rebuilt board is never shadowed by stale cells.
#[derive(Debug)]
pub struct Viewport {
    cap: usize,
    board_height: usize,
    board_width: usize,
    height: usize,
    width: usize,
    top: usize,
    left: usize,
    cells: Vec<Pos>,
    pub on_change: Emitter<()>,
}

impl Viewport {
    pub fn new(cap: usize, scheduler: &Scheduler) -> Self {
        Self {
            cap: cap.max(1),
            board_height: 0,
            board_width: 0,
            height: 0,
            width: 0,
            top: 0,
            left: 0,
            cells: Vec::new(),
            on_change: Emitter::new("view.on_change", scheduler),
        }
    }

    pub fn init(&mut self, board_height: usize, board_width: usize) {
        self.board_height = board_height;
        self.board_width = board_width;
        self.height = board_height.min(self.cap);
        self.width = board_width.min(self.cap);
        self.top = 0;
        self.left = 0;
        self.update();
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn top(&self) -> usize {
        self.top
    }

    pub fn left(&self) -> usize {
        self.left
    }

    pub fn bottom(&self) -> usize {
        (self.top + self.height).saturating_sub(1)
    }

    pub fn right(&self) -> usize {
        (self.left + self.width).saturating_sub(1)
    }

    /// Visible positions, row-major.
    pub fn cells(&self) -> &[Pos] {
        &self.cells
    }

    /// Maps an index into the visible window to its board position.
    pub fn pos_at(&self, index: usize) -> Option<Pos> {
        self.cells.get(index).copied()
    }

    pub fn contains(&self, pos: Pos) -> bool {
        self.height > 0
            && self.width > 0
            && (self.top..=self.bottom()).contains(&pos.top)
            && (self.left..=self.right()).contains(&pos.left)
    }

    /// True when the board is larger than the window along either axis.
    pub fn is_scrollable(&self) -> bool {
        self.board_height > self.height || self.board_width > self.width
    }

    pub fn move_right(&mut self) -> bool {
        if self.right() + 1 >= self.board_width {
            return false;
        }
        self.left += 1;
        self.update();
        true
    }

    pub fn move_left(&mut self) -> bool {
        if self.left == 0 {
            return false;
        }
        self.left -= 1;
        self.update();
        true
    }

    pub fn move_down(&mut self) -> bool {
        if self.bottom() + 1 >= self.board_height {
            return false;
        }
        self.top += 1;
        self.update();
        true
    }

    pub fn move_up(&mut self) -> bool {
        if self.top == 0 {
            return false;
        }
        self.top -= 1;
        self.update();
        true
    }

    pub fn move_by(&mut self, direction: Direction) -> bool {
        match direction {
            Direction::Up => self.move_up(),
            Direction::Down => self.move_down(),
            Direction::Left => self.move_left(),
            Direction::Right => self.move_right(),
        }
    }

    /// Moves the window so that `pos` sits as close to its centre as the board
    /// edges allow. Returns false, without notifying, if nothing moved.
    pub fn center_on(&mut self, pos: Pos) -> bool {
        if pos.top >= self.board_height || pos.left >= self.board_width {
            return false;
        }

        let top = pos
            .top
            .saturating_sub(self.height / 2)
            .min(self.board_height - self.height);
        let left = pos
            .left
            .saturating_sub(self.width / 2)
            .min(self.board_width - self.width);

        if (top, left) == (self.top, self.left) {
            return false;
        }

        self.top = top;
        self.left = left;
        self.update();
        true
    }

    fn update(&mut self) {
        self.cells.clear();
        if self.height > 0 && self.width > 0 {
            for top in self.top..=self.bottom() {
                for left in self.left..=self.right() {
                    self.cells.push(Pos::new(top, left));
                }
            }
        }
        trace!(
            "Viewport at ({}, {})..=({}, {})",
            self.top,
            self.left,
            self.bottom(),
            self.right()
        );
        self.on_change.emit(());
    }
}
