use minesweeper_common::models::{CellValue, Pos};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    top: usize,
    left: usize,
    pub(crate) number: u8,
    pub(crate) open: bool,
    pub(crate) mine: bool,
    pub(crate) flag: bool,
    cheat: bool,
}

impl Cell {
    pub fn new(top: usize, left: usize, cheat: bool) -> Self {
        Self {
            top,
            left,
            number: 0,
            open: false,
            mine: false,
            flag: false,
            cheat,
        }
    }

    pub fn top(&self) -> usize {
        self.top
    }

    pub fn left(&self) -> usize {
        self.left
    }

    pub fn pos(&self) -> Pos {
        Pos::new(self.top, self.left)
    }

    /// Adjacent mines, set once when mines are placed. Always zero on a mine.
    pub fn number(&self) -> u8 {
        self.number
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_mine(&self) -> bool {
        self.mine
    }

    pub fn is_flag(&self) -> bool {
        self.flag
    }

    pub fn is_cheat(&self) -> bool {
        self.cheat
    }

    pub fn is_empty(&self) -> bool {
        !self.mine && !self.is_number()
    }

    pub fn is_number(&self) -> bool {
        self.number > 0
    }

    pub fn value(&self) -> CellValue {
        if self.flag {
            return CellValue::Flag;
        }

        if !self.open {
            return if self.mine && self.cheat {
                CellValue::Hint
            } else {
                CellValue::Closed
            };
        }

        if self.is_empty() {
            CellValue::Empty
        } else if self.is_number() {
            CellValue::Number
        } else {
            CellValue::Mine
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(open: bool, mine: bool, flag: bool, number: u8, cheat: bool) -> Cell {
        Cell {
            number,
            open,
            mine,
            flag,
            ..Cell::new(2, 3, cheat)
        }
    }

    #[test]
    fn new_cell_is_closed() {
        let cell = Cell::new(2, 3, false);
        assert_eq!(cell.pos(), Pos::new(2, 3));
        assert_eq!(cell.value(), CellValue::Closed);
        assert!(!cell.is_cheat());
        assert!(cell.is_empty());
        assert!(!cell.is_number());
    }

    #[test]
    fn flag_wins_over_everything() {
        assert_eq!(cell(false, true, true, 0, true).value(), CellValue::Flag);
        assert_eq!(cell(true, true, true, 0, false).value(), CellValue::Flag);
        assert_eq!(cell(false, false, true, 3, false).value(), CellValue::Flag);
    }

    #[test]
    fn hidden_mine_is_hint_only_in_cheat_mode() {
        assert_eq!(cell(false, true, false, 0, true).value(), CellValue::Hint);
        assert_eq!(cell(false, true, false, 0, false).value(), CellValue::Closed);
        assert_eq!(cell(false, false, false, 2, true).value(), CellValue::Closed);
    }

    #[test]
    fn opened_values() {
        assert_eq!(cell(true, false, false, 0, false).value(), CellValue::Empty);
        assert_eq!(cell(true, false, false, 4, false).value(), CellValue::Number);
        assert_eq!(cell(true, true, false, 0, true).value(), CellValue::Mine);
    }

    #[test]
    fn value_tracks_flag_changes() {
        let mut cell = Cell::new(0, 0, false);
        cell.flag = true;
        assert_eq!(cell.value(), CellValue::Flag);
        cell.flag = false;
        cell.open = true;
        assert_eq!(cell.value(), CellValue::Empty);
    }
}
