//! Minesweeper board engine.
//!
//! The [`Engine`] owns the cell grid, places mines, computes adjacency
//! numbers, flood-fills empty regions and tracks flags and the win/lose
//! state. A [`Viewport`] exposes a capped window over boards of up to
//! 300×300 cells, and a [`Stopwatch`] counts elapsed time while a game runs.
//!
//! State changes are announced through [`Emitter`]s. Handlers are queued on a
//! shared [`EventQueue`] and only run when the owner drains it:
//!
//! ```rust
//! use minesweeper_engine::{Engine, EngineConfig, emitter};
//! use minesweeper_common::models::{BoardParams, Pos};
//!
//! let (scheduler, mut events) = emitter::channel();
//! let mut engine = Engine::new(&EngineConfig::default(), &scheduler);
//! engine.on_win.register(|()| println!("You win!"));
//!
//! engine
//!     .set_params(BoardParams { width: 3, height: 3, mines: 1, cheat: false })
//!     .unwrap();
//! engine.start_with_mines(&[Pos::new(1, 1)]).unwrap();
//! engine.put_flag(Pos::new(1, 1));
//!
//! // Handlers run here, after the mutating call returned.
//! events.run_pending();
//! ```

pub mod config;
pub mod data;
pub mod emitter;
pub mod logic;
pub mod stopwatch;
pub mod viewport;

pub use config::EngineConfig;
pub use data::Cell;
pub use emitter::{Emitter, EventQueue, Scheduler};
pub use logic::{Engine, FlagOutcome, Neighbors, OpenOutcome};
pub use stopwatch::Stopwatch;
pub use viewport::{Direction, Viewport};
