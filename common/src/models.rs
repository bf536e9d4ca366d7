use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest accepted board side.
pub const MIN_SIDE: usize = 3;
/// Largest accepted board side.
pub const MAX_SIDE: usize = 300;

/// Display value of a single cell, in the order renderers index their styles.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
pub enum CellValue {
    #[serde(rename = "closed")]
    Closed,
    #[serde(rename = "flag")]
    Flag,
    #[serde(rename = "empty")]
    Empty,
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "mine")]
    Mine,
    #[serde(rename = "hint")]
    Hint,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pos {
    pub top: usize,
    pub left: usize,
}

impl Pos {
    pub const fn new(top: usize, left: usize) -> Self {
        Self { top, left }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BoardParams {
    pub width: usize,
    pub height: usize,
    pub mines: usize,
    pub cheat: bool,
}

impl Default for BoardParams {
    fn default() -> Self {
        Self {
            width: 10,
            height: 10,
            mines: 10,
            cheat: false,
        }
    }
}

impl BoardParams {
    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    /// Checks the rules the settings menu enforces before a game may start.
    pub fn validate(&self) -> Result<(), ParamsError> {
        for side in [self.height, self.width] {
            if !(MIN_SIDE..=MAX_SIDE).contains(&side) {
                return Err(ParamsError::InvalidDimensions {
                    height: self.height,
                    width: self.width,
                });
            }
        }

        if self.mines == 0 || self.mines >= self.cell_count() {
            return Err(ParamsError::InvalidMineCount {
                mines: self.mines,
                cells: self.cell_count(),
            });
        }

        Ok(())
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamsError {
    #[error(
        "Board must be between {min} and {max} cells per side, got {height}x{width}",
        min = MIN_SIDE,
        max = MAX_SIDE
    )]
    InvalidDimensions { height: usize, width: usize },
    #[error("Mine count must be in 1..{cells}, got {mines}")]
    InvalidMineCount { mines: usize, cells: usize },
    #[error("Mine position ({}, {}) is outside the board", .0.top, .0.left)]
    InvalidMinePosition(Pos),
    #[error("Mine position ({}, {}) listed twice", .0.top, .0.left)]
    DuplicateMine(Pos),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_are_valid() {
        assert_eq!(BoardParams::default().validate(), Ok(()));
    }

    #[test]
    fn two_by_two_board_is_rejected() {
        for mines in [0, 4] {
            let params = BoardParams {
                width: 2,
                height: 2,
                mines,
                cheat: false,
            };
            assert!(matches!(
                params.validate(),
                Err(ParamsError::InvalidDimensions { height: 2, width: 2 })
            ));
        }
    }

    #[test]
    fn mine_count_must_leave_a_safe_cell() {
        let mut params = BoardParams {
            width: 3,
            height: 3,
            mines: 9,
            cheat: false,
        };
        assert_eq!(
            params.validate(),
            Err(ParamsError::InvalidMineCount { mines: 9, cells: 9 })
        );

        params.mines = 8;
        assert_eq!(params.validate(), Ok(()));

        params.mines = 0;
        assert!(params.validate().is_err());
    }

    #[test]
    fn largest_board_is_accepted() {
        let params = BoardParams {
            width: MAX_SIDE,
            height: MAX_SIDE,
            mines: 1,
            cheat: true,
        };
        assert_eq!(params.validate(), Ok(()));

        let too_wide = BoardParams {
            width: MAX_SIDE + 1,
            ..params
        };
        assert!(too_wide.validate().is_err());
    }

    #[test]
    fn params_fill_missing_fields_from_defaults() {
        let params: BoardParams = serde_json::from_str(r#"{"width": 30, "mines": 99}"#).unwrap();
        assert_eq!(params.width, 30);
        assert_eq!(params.height, 10);
        assert_eq!(params.mines, 99);
        assert!(!params.cheat);
    }
}
