use minesweeper_common::models::BoardParams;
use minesweeper_engine::config::read_env;

/// Board settings for the first game, as the menu would have collected them.
pub fn board_params_from_env() -> BoardParams {
    let defaults = BoardParams::default();

    BoardParams {
        width: read_env("MINESWEEPER_WIDTH", defaults.width),
        height: read_env("MINESWEEPER_HEIGHT", defaults.height),
        mines: read_env("MINESWEEPER_MINES", defaults.mines),
        cheat: read_env("MINESWEEPER_CHEAT", defaults.cheat),
    }
}
