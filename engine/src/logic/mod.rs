use std::collections::HashSet;

use arrayvec::ArrayVec;
use minesweeper_common::{
    models::{BoardParams, ParamsError, Pos},
    protocol::{CellView, GameState, ViewSnapshot},
};
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::{debug, info, instrument};

use crate::{
    config::EngineConfig,
    data::Cell,
    emitter::{Emitter, Scheduler},
    stopwatch::Stopwatch,
    viewport::Viewport,
};

pub type Neighbors = ArrayVec<Pos, 8>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OpenOutcome {
    NoChange,
    Opened,
    HitMine,
    Won,
}

impl OpenOutcome {
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::NoChange)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FlagOutcome {
    NoChange,
    Flagged,
    Unflagged,
    /// No flags left; reported through `on_flag`, nothing changed.
    Exhausted,
    Won,
}

impl FlagOutcome {
    pub const fn has_update(self) -> bool {
        matches!(self, Self::Flagged | Self::Unflagged | Self::Won)
    }
}

pub struct Engine {
    /// Settings for the next `init`/`start`.
    params: BoardParams,
    /// Geometry of the grid in `cells`.
    board: BoardParams,
    cells: Vec<Cell>,
    flags: usize,
    state: GameState,
    rng: StdRng,
    stopwatch: Stopwatch,
    view: Viewport,
    pub on_init: Emitter<()>,
    pub on_start: Emitter<()>,
    pub on_win: Emitter<()>,
    pub on_lose: Emitter<()>,
    /// Fired when a flag is requested but none are left.
    pub on_flag: Emitter<()>,
    pub on_change: Emitter<()>,
}

impl Engine {
    pub fn new(config: &EngineConfig, scheduler: &Scheduler) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        let params = BoardParams::default();

        let mut view = Viewport::new(config.view_size, scheduler);
        view.init(params.height, params.width);

        Self {
            flags: params.mines,
            params,
            board: params,
            cells: Vec::new(),
            state: GameState::Unconfigured,
            rng,
            stopwatch: Stopwatch::new(config.tick),
            view,
            on_init: Emitter::new("on_init", scheduler),
            on_start: Emitter::new("on_start", scheduler),
            on_win: Emitter::new("on_win", scheduler),
            on_lose: Emitter::new("on_lose", scheduler),
            on_flag: Emitter::new("on_flag", scheduler),
            on_change: Emitter::new("on_change", scheduler),
        }
    }

    /// Settings the next `init`/`start` will build the board from.
    pub fn params(&self) -> &BoardParams {
        &self.params
    }

    /// Replaces the board configuration used by the next `init`/`start`.
    /// The board in play keeps its own size and mine count.
    pub fn set_params(&mut self, params: BoardParams) -> Result<(), ParamsError> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    /// Rows of the current board.
    pub fn height(&self) -> usize {
        self.board.height
    }

    pub fn width(&self) -> usize {
        self.board.width
    }

    pub fn mines(&self) -> usize {
        self.board.mines
    }

    /// Flags still available to place.
    pub fn flags(&self) -> usize {
        self.flags
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn time(&self) -> u64 {
        self.stopwatch.time()
    }

    pub fn stopwatch(&self) -> &Stopwatch {
        &self.stopwatch
    }

    pub fn view(&self) -> &Viewport {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut Viewport {
        &mut self.view
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Shows an empty, mine-free board and waits for `start`.
    #[instrument(level = "trace", skip(self))]
    pub fn init(&mut self) {
        self.stopwatch.stop();
        self.init_cells();
        self.state = GameState::Ready;
        debug!(
            "Board initialized: {}x{}",
            self.board.height, self.board.width
        );
        self.on_init.emit(());
    }

    #[instrument(level = "trace", skip(self))]
    pub fn start(&mut self) {
        self.init_cells();
        info!(
            "Starting new game: {}x{} with {} mines",
            self.board.height, self.board.width, self.board.mines
        );
        self.flags = self.board.mines;
        self.place_random_mines();
        self.begin();
    }

    /// Starts a game with a fixed mine layout instead of a random one. The
    /// mine count in the current parameters is replaced by the layout's size.
    #[instrument(level = "trace", skip(self, mines))]
    pub fn start_with_mines(&mut self, mines: &[Pos]) -> Result<(), ParamsError> {
        let mut seen = HashSet::with_capacity(mines.len());
        for &pos in mines {
            if pos.top >= self.params.height || pos.left >= self.params.width {
                return Err(ParamsError::InvalidMinePosition(pos));
            }
            if !seen.insert(pos) {
                return Err(ParamsError::DuplicateMine(pos));
            }
        }

        let params = BoardParams {
            mines: mines.len(),
            ..self.params
        };
        params.validate()?;
        self.params = params;
        self.init_cells();

        info!(
            "Starting new game with fixed layout: {}x{} with {} mines",
            self.board.height, self.board.width, self.board.mines
        );
        self.flags = self.board.mines;
        for &pos in mines {
            let index = self.offset(pos);
            self.cells[index].mine = true;
        }
        self.begin();
        Ok(())
    }

    fn begin(&mut self) {
        self.init_numbers();
        self.stopwatch.start();
        self.state = GameState::Playing;
        self.on_change.emit(());
        self.on_start.emit(());
    }

    fn init_cells(&mut self) {
        self.board = self.params;
        let BoardParams {
            height,
            width,
            cheat,
            ..
        } = self.board;

        self.cells.clear();
        self.cells.reserve(height * width);
        for top in 0..height {
            for left in 0..width {
                self.cells.push(Cell::new(top, left, cheat));
            }
        }
        self.view.init(height, width);
    }

    fn place_random_mines(&mut self) {
        let count = self.cells.len();
        let mut placed = 0;
        while placed < self.board.mines {
            let index = self.rng.random_range(0..count);
            let cell = &mut self.cells[index];
            if !cell.mine {
                cell.mine = true;
                placed += 1;
            }
        }
    }

    fn init_numbers(&mut self) {
        for index in 0..self.cells.len() {
            if !self.cells[index].mine {
                continue;
            }
            let pos = self.cells[index].pos();
            for neighbor in self.neighbors_of(pos) {
                let neighbor = self.offset(neighbor);
                self.cells[neighbor].number += 1;
            }
        }
    }

    #[instrument(level = "trace", skip(self))]
    pub fn open_cell(&mut self, pos: Pos) -> OpenOutcome {
        if self.state != GameState::Playing {
            return OpenOutcome::NoChange;
        }
        let Some(index) = self.index_of(pos) else {
            return OpenOutcome::NoChange;
        };

        let cell = &mut self.cells[index];
        if cell.open || cell.flag {
            return OpenOutcome::NoChange;
        }
        cell.open = true;
        let (mine, empty) = (cell.mine, cell.is_empty());

        if mine {
            self.lose();
            self.on_change.emit(());
            return OpenOutcome::HitMine;
        }

        if empty {
            let opened = self.open_neighbors_of(pos);
            debug!("Flood fill from ({}, {}) opened {} cells", pos.top, pos.left, opened);
        }

        let outcome = if self.is_demined() {
            self.win();
            OpenOutcome::Won
        } else {
            OpenOutcome::Opened
        };
        self.on_change.emit(());
        outcome
    }

    #[instrument(level = "trace", skip(self))]
    pub fn put_flag(&mut self, pos: Pos) -> FlagOutcome {
        if self.state != GameState::Playing {
            return FlagOutcome::NoChange;
        }
        let Some(index) = self.index_of(pos) else {
            return FlagOutcome::NoChange;
        };

        let cell = &mut self.cells[index];
        if cell.open {
            return FlagOutcome::NoChange;
        }

        let outcome = if cell.flag {
            cell.flag = false;
            self.flags += 1;
            FlagOutcome::Unflagged
        } else if self.flags == 0 {
            debug!("No flags left for ({}, {})", pos.top, pos.left);
            self.on_flag.emit(());
            return FlagOutcome::Exhausted;
        } else {
            cell.flag = true;
            self.flags -= 1;
            if self.cells.iter().all(|cell| !cell.mine || cell.flag) {
                self.win();
                FlagOutcome::Won
            } else {
                FlagOutcome::Flagged
            }
        };

        self.on_change.emit(());
        outcome
    }

    pub fn get_cell(&self, top: usize, left: usize) -> Option<&Cell> {
        if top >= self.board.height || left >= self.board.width {
            return None;
        }
        self.cells.get(top * self.board.width + left)
    }

    pub fn cell(&self, pos: Pos) -> Option<&Cell> {
        self.get_cell(pos.top, pos.left)
    }

    /// In-bounds neighbours of `pos` that are neither mines nor flagged.
    pub fn neighbors_of(&self, pos: Pos) -> Neighbors {
        let mut neighbors = Neighbors::new();
        for top in pos.top.saturating_sub(1)..=pos.top + 1 {
            for left in pos.left.saturating_sub(1)..=pos.left + 1 {
                if top == pos.top && left == pos.left {
                    continue;
                }
                let Some(cell) = self.get_cell(top, left) else {
                    continue;
                };
                if cell.mine || cell.flag {
                    continue;
                }
                neighbors.push(cell.pos());
            }
        }
        neighbors
    }

    /// True once every non-mine cell is open.
    pub fn is_demined(&self) -> bool {
        let opened = self.cells.iter().filter(|cell| cell.open).count();
        opened == self.board.cell_count() - self.board.mines
    }

    /// Cells inside the viewport, row-major.
    pub fn visible_cells(&self) -> impl Iterator<Item = &Cell> {
        self.view.cells().iter().filter_map(|&pos| self.cell(pos))
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        let views: Vec<CellView> = self
            .visible_cells()
            .map(|cell| CellView {
                pos: cell.pos(),
                value: cell.value(),
                number: (cell.open && cell.is_number()).then_some(cell.number),
            })
            .collect();

        ViewSnapshot {
            top: self.view.top(),
            left: self.view.left(),
            bottom: self.view.bottom(),
            right: self.view.right(),
            board_height: self.board.height,
            board_width: self.board.width,
            flags: self.flags,
            time: self.time(),
            state: self.state,
            scrollable: self.view.is_scrollable(),
            rows: views
                .chunks(self.view.width().max(1))
                .map(|chunk| chunk.to_vec())
                .collect(),
        }
    }

    fn open_neighbors_of(&mut self, start: Pos) -> usize {
        let mut stack = vec![start];
        let mut opened = 0;
        while let Some(pos) = stack.pop() {
            for neighbor in self.neighbors_of(pos) {
                let index = self.offset(neighbor);
                let cell = &mut self.cells[index];
                if cell.open {
                    continue;
                }
                cell.open = true;
                opened += 1;
                if cell.is_empty() {
                    stack.push(neighbor);
                }
            }
        }
        opened
    }

    fn lose(&mut self) {
        for cell in &mut self.cells {
            cell.open = true;
        }
        self.stopwatch.stop();
        self.state = GameState::Lost;
        info!("Game lost after {} ticks", self.time());
        self.on_lose.emit(());
    }

    fn win(&mut self) {
        for cell in &mut self.cells {
            cell.open = true;
            if cell.mine {
                cell.flag = true;
            }
        }
        self.stopwatch.stop();
        self.state = GameState::Won;
        info!("Game won after {} ticks", self.time());
        self.on_win.emit(());
    }

    fn index_of(&self, pos: Pos) -> Option<usize> {
        (pos.top < self.board.height && pos.left < self.board.width && !self.cells.is_empty())
            .then(|| self.offset(pos))
    }

    fn offset(&self, pos: Pos) -> usize {
        pos.top * self.board.width + pos.left
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use minesweeper_common::models::CellValue;

    use super::*;
    use crate::emitter::{self, EventQueue};

    fn engine(height: usize, width: usize, mines: usize) -> (Engine, EventQueue) {
        let (scheduler, queue) = emitter::channel();
        let config = EngineConfig {
            seed: Some(7),
            ..EngineConfig::default()
        };
        let mut engine = Engine::new(&config, &scheduler);
        engine
            .set_params(BoardParams {
                height,
                width,
                mines,
                cheat: false,
            })
            .unwrap();
        (engine, queue)
    }

    fn counter(emitter: &mut Emitter<()>) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let shared = Arc::clone(&count);
        emitter.register(move |()| {
            shared.fetch_add(1, Ordering::SeqCst);
        });
        count
    }

    #[test]
    fn random_start_places_exact_mine_count() {
        let (mut engine, _queue) = engine(16, 30, 99);
        for _ in 0..5 {
            engine.start();
            let mines = engine.cells().iter().filter(|cell| cell.is_mine()).count();
            assert_eq!(mines, 99);
            assert_eq!(engine.flags(), 99);
            assert_eq!(engine.state(), GameState::Playing);
        }
    }

    #[test]
    fn numbers_count_adjacent_mines() {
        let (mut engine, _queue) = engine(12, 12, 40);
        engine.start();

        for cell in engine.cells().iter().filter(|cell| !cell.is_mine()) {
            let mut expected = 0;
            for top in cell.top().saturating_sub(1)..=cell.top() + 1 {
                for left in cell.left().saturating_sub(1)..=cell.left() + 1 {
                    if (top, left) != (cell.top(), cell.left())
                        && engine.get_cell(top, left).is_some_and(Cell::is_mine)
                    {
                        expected += 1;
                    }
                }
            }
            assert_eq!(cell.number(), expected, "at {:?}", cell.pos());
        }
    }

    #[test]
    fn every_cell_can_be_a_mine() {
        let (mut engine, _queue) = engine(3, 3, 8);
        let mut last_cell_mined = false;
        for _ in 0..200 {
            engine.start();
            last_cell_mined |= engine.get_cell(2, 2).is_some_and(Cell::is_mine);
        }
        assert!(last_cell_mined);
    }

    #[test]
    fn seeded_engines_place_identical_layouts() {
        let (mut a, _qa) = engine(20, 20, 50);
        let (mut b, _qb) = engine(20, 20, 50);
        a.start();
        b.start();
        assert_eq!(a.cells(), b.cells());
    }

    #[test]
    fn neighbors_skip_edges_mines_and_flags() {
        let (mut engine, _queue) = engine(3, 3, 1);
        engine.start_with_mines(&[Pos::new(0, 1)]).unwrap();

        let corner = engine.neighbors_of(Pos::new(0, 0));
        assert_eq!(corner.as_slice(), &[Pos::new(1, 0), Pos::new(1, 1)]);

        engine.put_flag(Pos::new(1, 0));
        let corner = engine.neighbors_of(Pos::new(0, 0));
        assert_eq!(corner.as_slice(), &[Pos::new(1, 1)]);

        assert_eq!(engine.neighbors_of(Pos::new(1, 1)).len(), 6);
    }

    #[test]
    fn operations_before_start_are_ignored() {
        let (mut engine, mut queue) = engine(5, 5, 3);
        let changes = counter(&mut engine.on_change);
        let inits = counter(&mut engine.on_init);

        assert_eq!(engine.state(), GameState::Unconfigured);
        assert_eq!(engine.open_cell(Pos::new(0, 0)), OpenOutcome::NoChange);

        engine.init();
        assert_eq!(engine.state(), GameState::Ready);
        assert_eq!(engine.cells().len(), 25);
        assert!(engine.cells().iter().all(|cell| !cell.is_mine()));
        assert_eq!(engine.put_flag(Pos::new(1, 1)), FlagOutcome::NoChange);
        assert_eq!(engine.open_cell(Pos::new(1, 1)), OpenOutcome::NoChange);

        queue.run_pending();
        assert_eq!(changes.load(Ordering::SeqCst), 0);
        assert_eq!(inits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn out_of_bounds_is_a_silent_no_op() {
        let (mut engine, mut queue) = engine(3, 3, 1);
        let changes = counter(&mut engine.on_change);
        engine.start_with_mines(&[Pos::new(2, 2)]).unwrap();
        queue.run_pending();
        changes.store(0, Ordering::SeqCst);

        assert!(engine.get_cell(3, 0).is_none());
        assert_eq!(engine.open_cell(Pos::new(0, 3)), OpenOutcome::NoChange);
        assert_eq!(engine.put_flag(Pos::new(9, 9)), FlagOutcome::NoChange);
        queue.run_pending();
        assert_eq!(changes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn invalid_layouts_are_rejected() {
        let (mut engine, _queue) = engine(3, 3, 1);
        assert_eq!(
            engine.start_with_mines(&[Pos::new(3, 0)]),
            Err(ParamsError::InvalidMinePosition(Pos::new(3, 0)))
        );
        assert_eq!(
            engine.start_with_mines(&[Pos::new(1, 1), Pos::new(1, 1)]),
            Err(ParamsError::DuplicateMine(Pos::new(1, 1)))
        );
        assert!(matches!(
            engine.start_with_mines(&[]),
            Err(ParamsError::InvalidMineCount { mines: 0, cells: 9 })
        ));
        assert_eq!(engine.state(), GameState::Unconfigured);
    }

    #[test]
    fn invalid_params_leave_engine_unchanged() {
        let (mut engine, _queue) = engine(4, 4, 3);
        let err = engine.set_params(BoardParams {
            height: 2,
            width: 2,
            mines: 1,
            cheat: false,
        });
        assert!(err.is_err());
        let params = engine.params();
        assert_eq!((params.height, params.width, params.mines), (4, 4, 3));
    }

    #[test]
    fn new_params_wait_for_the_next_game() {
        let (mut engine, _queue) = engine(3, 3, 1);
        engine.start_with_mines(&[Pos::new(1, 1)]).unwrap();
        engine
            .set_params(BoardParams {
                height: 20,
                width: 20,
                mines: 5,
                cheat: false,
            })
            .unwrap();

        assert_eq!((engine.height(), engine.width(), engine.mines()), (3, 3, 1));
        assert_eq!(engine.cells().len(), 9);
        assert!(engine.get_cell(10, 10).is_none());
        assert_eq!(engine.open_cell(Pos::new(10, 10)), OpenOutcome::NoChange);
        assert_eq!(engine.put_flag(Pos::new(10, 10)), FlagOutcome::NoChange);
        assert_eq!(engine.get_cell(0, 2).map(Cell::pos), Some(Pos::new(0, 2)));
        assert!(engine.get_cell(1, 1).is_some_and(Cell::is_mine));

        let safe: Vec<Pos> = engine
            .cells()
            .iter()
            .filter(|cell| !cell.is_mine())
            .map(Cell::pos)
            .collect();
        let (last, rest) = safe.split_last().unwrap();
        for &pos in rest {
            assert_eq!(engine.open_cell(pos), OpenOutcome::Opened);
        }
        assert!(!engine.is_demined());
        assert_eq!(engine.open_cell(*last), OpenOutcome::Won);

        engine.start();
        assert_eq!((engine.height(), engine.width(), engine.mines()), (20, 20, 5));
        assert_eq!(engine.cells().len(), 400);
        assert_eq!(engine.flags(), 5);
    }

    #[test]
    fn rebuilding_the_board_resets_the_view_once() {
        let (mut engine, mut queue) = engine(15, 15, 4);
        let view_changes = counter(&mut engine.view_mut().on_change);

        engine.init();
        queue.run_pending();
        assert_eq!(view_changes.load(Ordering::SeqCst), 1);

        engine.view_mut().move_down();
        engine.start();
        queue.run_pending();
        assert_eq!(view_changes.load(Ordering::SeqCst), 3);
        assert_eq!((engine.view().top(), engine.view().left()), (0, 0));

        engine.start_with_mines(&[Pos::new(0, 0)]).unwrap();
        queue.run_pending();
        assert_eq!(view_changes.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn cheat_mode_reveals_hidden_mines_as_hints() {
        let (mut engine, _queue) = engine(3, 3, 1);
        let params = BoardParams {
            cheat: true,
            ..*engine.params()
        };
        engine.set_params(params).unwrap();
        engine.start_with_mines(&[Pos::new(0, 0)]).unwrap();

        assert!(engine.cells().iter().all(Cell::is_cheat));
        assert_eq!(engine.get_cell(0, 0).map(Cell::value), Some(CellValue::Hint));
        assert_eq!(engine.get_cell(2, 2).map(Cell::value), Some(CellValue::Closed));
    }

    #[test]
    fn snapshot_groups_visible_rows() {
        let (mut engine, _queue) = engine(12, 14, 1);
        engine.start_with_mines(&[Pos::new(11, 13)]).unwrap();
        engine.view_mut().move_right();
        engine.put_flag(Pos::new(0, 2));

        let snapshot = engine.snapshot();
        assert_eq!((snapshot.top, snapshot.left), (0, 1));
        assert_eq!((snapshot.bottom, snapshot.right), (9, 10));
        assert_eq!(snapshot.rows.len(), 10);
        assert!(snapshot.rows.iter().all(|row| row.len() == 10));
        assert_eq!(snapshot.rows[0][0].pos, Pos::new(0, 1));
        assert_eq!(snapshot.rows[0][0].value, CellValue::Closed);
        assert_eq!(snapshot.rows[0][1].value, CellValue::Flag);
        assert_eq!(snapshot.flags, 0);
        assert!(snapshot.scrollable);
        assert_eq!(snapshot.state, GameState::Playing);
    }
}
