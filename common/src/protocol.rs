use serde::{Deserialize, Serialize};

use crate::models::{CellValue, Pos};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state")]
pub enum GameState {
    #[serde(rename = "unconfigured")]
    Unconfigured,
    #[serde(rename = "ready")]
    Ready,
    #[serde(rename = "playing")]
    Playing,
    #[serde(rename = "won")]
    Won,
    #[serde(rename = "lost")]
    Lost,
}

impl GameState {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CellView {
    pub pos: Pos,
    pub value: CellValue,
    /// Only set for opened numbered cells.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<u8>,
}

/// What a renderer needs to redraw the visible window.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ViewSnapshot {
    pub top: usize,
    pub left: usize,
    pub bottom: usize,
    pub right: usize,
    pub board_height: usize,
    pub board_width: usize,
    pub flags: usize,
    pub time: u64,
    pub state: GameState,
    /// True when the board does not fit in the window, so a minimap is useful.
    #[serde(default)]
    pub scrollable: bool,
    /// Visible cells, row-major, one inner `Vec` per visible row.
    pub rows: Vec<Vec<CellView>>,
}
