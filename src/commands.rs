use std::str::FromStr;

use minesweeper_common::{
    models::{BoardParams, Pos},
    protocol::GameState,
};
use minesweeper_engine::{Direction, Engine, FlagOutcome};
use tracing::{debug, warn};

/// One line of player input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Open a cell, addressed by its row/column inside the visible window.
    Open { row: usize, col: usize },
    /// Toggle a flag, addressed like `Open`.
    Flag { row: usize, col: usize },
    Move(Direction),
    /// Centre the window on a board position.
    Goto(Pos),
    /// Start a game, optionally with new board parameters.
    Start(Option<BoardParams>),
    /// Back to the empty pre-game board.
    New,
    Show,
    Json,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  start [HEIGHT WIDTH MINES [cheat]]  start a game
  new                                 back to the settings menu
  open ROW COL | o ROW COL            open a cell (window coordinates)
  flag ROW COL | f ROW COL            toggle a flag (window coordinates)
  up | down | left | right | w a s d  scroll the window
  goto ROW COL                        centre the window on a board cell
  show | json | help | quit";

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&name, args)) = words.split_first() else {
            return Ok(Self::Show);
        };

        let numbers = args
            .iter()
            .filter(|arg| **arg != "cheat")
            .map(|arg| {
                arg.parse::<usize>()
                    .map_err(|_| format!("'{}' is not a number", arg))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let command = match (name.to_ascii_lowercase().as_str(), numbers.as_slice()) {
            ("open" | "o", &[row, col]) => Self::Open { row, col },
            ("flag" | "f", &[row, col]) => Self::Flag { row, col },
            ("up" | "w", []) => Self::Move(Direction::Up),
            ("down" | "s", []) => Self::Move(Direction::Down),
            ("left" | "a", []) => Self::Move(Direction::Left),
            ("right" | "d", []) => Self::Move(Direction::Right),
            ("goto" | "g", &[top, left]) => Self::Goto(Pos::new(top, left)),
            ("start", []) => Self::Start(None),
            ("start", &[height, width, mines]) => Self::Start(Some(BoardParams {
                height,
                width,
                mines,
                cheat: args.contains(&"cheat"),
            })),
            ("new", []) => Self::New,
            ("show", []) => Self::Show,
            ("json", []) => Self::Json,
            ("help" | "?", []) => Self::Help,
            ("quit" | "q" | "exit", []) => Self::Quit,
            _ => return Err(format!("unrecognised command '{}', try 'help'", line.trim())),
        };

        Ok(command)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Applies a command to the engine. Returns text to print right away, if any;
/// board changes are reported through the engine's events instead.
pub fn apply(engine: &mut Engine, command: Command) -> (Flow, Option<String>) {
    debug!("Applying {:?}", command);

    let reply = match command {
        Command::Open { row, col } => match window_pos(engine, row, col) {
            Some(pos) => {
                let outcome = engine.open_cell(pos);
                (!outcome.has_update()).then(|| unchanged(engine))
            }
            None => Some(format!("({}, {}) is outside the window", row, col)),
        },
        Command::Flag { row, col } => match window_pos(engine, row, col) {
            // The engine's `on_flag` event already tells the player.
            Some(pos) => match engine.put_flag(pos) {
                FlagOutcome::Exhausted => None,
                outcome => (!outcome.has_update()).then(|| unchanged(engine)),
            },
            None => Some(format!("({}, {}) is outside the window", row, col)),
        },
        Command::Move(direction) => {
            if engine.view_mut().move_by(direction) {
                None
            } else {
                Some("already at the edge".to_string())
            }
        }
        Command::Goto(pos) => {
            if pos.top >= engine.height() || pos.left >= engine.width() {
                Some(format!("({}, {}) is outside the board", pos.top, pos.left))
            } else {
                engine.view_mut().center_on(pos);
                None
            }
        }
        Command::Start(params) => {
            if let Some(params) = params
                && let Err(e) = engine.set_params(params)
            {
                warn!("Rejected board settings: {}", e);
                return (Flow::Continue, Some(format!("Sorry, your input is not valid: {}", e)));
            }
            engine.start();
            None
        }
        Command::New => {
            engine.init();
            None
        }
        Command::Show => Some(crate::render::board(engine)),
        Command::Json => Some(
            serde_json::to_string_pretty(&engine.snapshot())
                .unwrap_or_else(|e| format!("failed to serialize snapshot: {}", e)),
        ),
        Command::Help => Some(HELP.to_string()),
        Command::Quit => return (Flow::Quit, None),
    };

    (Flow::Continue, reply)
}

/// Why a cell command left the board as it was.
fn unchanged(engine: &Engine) -> String {
    match engine.state() {
        state if state.is_finished() => "the game is over, type 'start' to play again".to_string(),
        GameState::Playing => "nothing to do there".to_string(),
        GameState::Unconfigured | GameState::Ready | GameState::Won | GameState::Lost => {
            "type 'start' to play".to_string()
        }
    }
}

fn window_pos(engine: &Engine, row: usize, col: usize) -> Option<Pos> {
    let view = engine.view();
    if row >= view.height() || col >= view.width() {
        return None;
    }
    view.pos_at(row * view.width() + col)
}
