#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative grid world state.
//!
//! A [`Grid`] owns every [`Cell`] in an arena, wires the neighbour graph from
//! cell positions, and runs the episode state machine. Requested actions are
//! perturbed through a [`TransitionTable`] before they are executed, so an
//! agent asking to move right may slip up or down instead. All randomness is
//! drawn from the pseudo-random source the grid was built with; the same seed
//! and call sequence always reproduce the same layout and trajectory.

mod cell;
mod layout;
mod render;

use gridworld_core::{
    CellKind, Coordinate, Direction, DirectionWeights, GridConfig, GridError, RewardTable,
    TransitionTable,
};
use log::{debug, trace, warn};
use rand::{
    distributions::{Distribution, WeightedIndex},
    seq::SliceRandom,
    Rng, SeedableRng,
};
use rand_chacha::ChaCha8Rng;

pub use cell::{Cell, CellId};
pub use layout::{forbidden_count, CellSpec};

/// Lifecycle phase of the current episode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EpisodeState {
    /// No reset has happened yet.
    Uninitialized,
    /// The agent occupies a cell and may keep stepping.
    Active,
    /// The agent entered a terminal cell.
    Terminated,
}

/// Result of advancing the episode by one action.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepOutcome {
    /// Position of the agent after the step; `None` only on the sentinel.
    pub position: Option<Coordinate>,
    /// Reward of the cell the agent occupies after the step.
    pub reward: f64,
    /// Whether the episode has terminated.
    pub done: bool,
}

/// Stochastic grid world with its own pseudo-random source.
#[derive(Debug)]
pub struct Grid<R = ChaCha8Rng> {
    numb_rows: u32,
    numb_cols: u32,
    fraction_forbidden: f64,
    rewards: RewardTable,
    transition: TransitionTable,
    cells: Vec<Cell>,
    out_of_bounds: Cell,
    current: Option<CellId>,
    previous: Option<CellId>,
    done: bool,
    rng: R,
}

impl Grid<ChaCha8Rng> {
    /// Builds a randomized layout seeded from `config.seed`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::TooFewCells`] when the grid cannot hold both
    /// terminals, [`GridError::TooManyCells`] when it is too large to lay out
    /// and [`GridError::InvalidFraction`] when the forbidden fraction lies
    /// outside `[0, 1]`.
    pub fn random(config: &GridConfig) -> Result<Self, GridError> {
        Self::random_with_rng(config, ChaCha8Rng::seed_from_u64(config.seed))
    }

    /// Builds a hand-made layout whose slips are seeded by `seed`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::DuplicatePosition`] when two cells share a position.
    pub fn from_layout(
        numb_rows: u32,
        numb_cols: u32,
        specs: &[CellSpec],
        seed: u64,
    ) -> Result<Self, GridError> {
        Self::from_layout_with_rng(numb_rows, numb_cols, specs, ChaCha8Rng::seed_from_u64(seed))
    }

    /// The classic 4x3 world with 4 columns and 3 rows.
    ///
    /// A forbidden cell sits at (1, 1), the fail terminal (reward -1) at
    /// (3, 1) and the goal terminal (reward +1) at (3, 2). Every other cell is
    /// standard with reward -0.04.
    #[must_use]
    pub fn grid_4x3(seed: u64) -> Self {
        let cells: Vec<Cell> = layout::canonical_4x3()
            .iter()
            .enumerate()
            .map(|(index, spec)| Cell::new(CellId::new(index), spec.position, spec.kind, spec.reward))
            .collect();
        let (rewards, fraction_forbidden) = layout::layout_parameters(&cells);
        Self::assemble(
            3,
            4,
            fraction_forbidden,
            rewards,
            TransitionTable::default(),
            cells,
            ChaCha8Rng::seed_from_u64(seed),
        )
    }
}

impl<R> Grid<R> {
    fn assemble(
        numb_rows: u32,
        numb_cols: u32,
        fraction_forbidden: f64,
        rewards: RewardTable,
        transition: TransitionTable,
        cells: Vec<Cell>,
        rng: R,
    ) -> Self {
        let mut grid = Self {
            numb_rows,
            numb_cols,
            fraction_forbidden,
            rewards,
            transition,
            cells,
            out_of_bounds: Cell::out_of_bounds(),
            current: None,
            previous: None,
            done: false,
            rng,
        };
        grid.build_neighbor_graph();
        grid
    }

    /// Number of lattice rows the grid was configured with.
    #[must_use]
    pub const fn numb_rows(&self) -> u32 {
        self.numb_rows
    }

    /// Number of lattice columns the grid was configured with.
    #[must_use]
    pub const fn numb_cols(&self) -> u32 {
        self.numb_cols
    }

    /// Configured cell count, `numb_rows * numb_cols`.
    #[must_use]
    pub fn numb_cells(&self) -> usize {
        let cells = u64::from(self.numb_rows) * u64::from(self.numb_cols);
        usize::try_from(cells).unwrap_or(usize::MAX)
    }

    /// Share of non-terminal cells that are forbidden.
    ///
    /// Hand-built layouts report the share their cells actually have.
    #[must_use]
    pub const fn fraction_forbidden(&self) -> f64 {
        self.fraction_forbidden
    }

    /// Rewards of the layout's standard cells and terminals.
    ///
    /// Hand-built layouts report the first standard reward, the highest
    /// terminal reward as the goal and the lowest as the fail.
    #[must_use]
    pub const fn rewards(&self) -> &RewardTable {
        &self.rewards
    }

    /// Slip model applied by [`Grid::next_cell`].
    #[must_use]
    pub const fn transition_table(&self) -> &TransitionTable {
        &self.transition
    }

    /// Replaces the slip model applied by [`Grid::next_cell`].
    pub fn set_transition_table(&mut self, transition: TransitionTable) {
        self.transition = transition;
    }

    /// All cells in arena order.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Resolves an identifier, yielding the sentinel for unknown identifiers.
    #[must_use]
    pub fn cell(&self, id: CellId) -> &Cell {
        self.cells.get(id.index()).unwrap_or(&self.out_of_bounds)
    }

    /// Shared forbidden cell standing in for every position outside the grid.
    #[must_use]
    pub const fn out_of_bounds(&self) -> &Cell {
        &self.out_of_bounds
    }

    /// Identifier of the cell centred on `center`, or the sentinel.
    #[must_use]
    pub fn cell_at(&self, center: Coordinate) -> CellId {
        self.cells
            .iter()
            .find(|cell| cell.center() == Some(center))
            .map_or(CellId::OUT_OF_BOUNDS, Cell::id)
    }

    /// Wires every cell to its four neighbours by position.
    ///
    /// Positions without a cell are wired to the out-of-bounds sentinel.
    /// Rebuilding an unchanged layout yields the same graph.
    pub fn build_neighbor_graph(&mut self) {
        for index in 0..self.cells.len() {
            let center = self.cells[index].center();
            for direction in Direction::ALL {
                let neighbor = center.map_or(CellId::OUT_OF_BOUNDS, |center| {
                    self.cell_at(center.neighbour(direction))
                });
                self.cells[index].set_neighbor(direction, neighbor);
            }
        }
    }

    /// Current phase of the episode.
    #[must_use]
    pub const fn state(&self) -> EpisodeState {
        match (self.current, self.done) {
            (None, _) => EpisodeState::Uninitialized,
            (Some(_), false) => EpisodeState::Active,
            (Some(_), true) => EpisodeState::Terminated,
        }
    }

    /// Cell occupied by the agent, once the grid has been reset.
    #[must_use]
    pub fn current_cell(&self) -> Option<&Cell> {
        self.current.map(|id| self.cell(id))
    }

    /// Cell the agent occupied before the latest step.
    #[must_use]
    pub fn previous_cell(&self) -> Option<&Cell> {
        self.previous.map(|id| self.cell(id))
    }

    /// Position of the agent.
    #[must_use]
    pub fn current_position(&self) -> Option<Coordinate> {
        self.current_cell().and_then(Cell::center)
    }

    /// Reward of the cell the agent occupies.
    #[must_use]
    pub fn current_reward(&self) -> Option<f64> {
        self.current_cell().map(Cell::reward)
    }

    /// Whether the episode has reached a terminal cell.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.done
    }
}

impl<R> Grid<R>
where
    R: Rng,
{
    /// Builds a randomized layout drawing from the provided random source.
    ///
    /// The layout holds one fail terminal, one goal terminal, then
    /// `floor((numb_cells - 2) * fraction_forbidden)` forbidden cells and
    /// standard cells for the remainder. Every position of the
    /// `columns x rows` rectangle is used exactly once.
    ///
    /// # Errors
    ///
    /// See [`Grid::random`].
    pub fn random_with_rng(config: &GridConfig, mut rng: R) -> Result<Self, GridError> {
        let cells = layout::random_cells(config, &mut rng)?;
        let grid = Self::assemble(
            config.rows,
            config.columns,
            config.fraction_forbidden,
            config.rewards,
            config.transition.clone(),
            cells,
            rng,
        );
        debug!(
            "generated {}x{} grid with {} forbidden cells",
            config.columns,
            config.rows,
            forbidden_count(config.numb_cells(), config.fraction_forbidden)
        );
        Ok(grid)
    }

    /// Builds a hand-made layout drawing slips from the provided random source.
    ///
    /// # Errors
    ///
    /// See [`Grid::from_layout`].
    pub fn from_layout_with_rng(
        numb_rows: u32,
        numb_cols: u32,
        specs: &[CellSpec],
        rng: R,
    ) -> Result<Self, GridError> {
        let cells = layout::fixed_cells(specs)?;
        let (rewards, fraction_forbidden) = layout::layout_parameters(&cells);
        Ok(Self::assemble(
            numb_rows,
            numb_cols,
            fraction_forbidden,
            rewards,
            TransitionTable::default(),
            cells,
            rng,
        ))
    }

    /// Shuffles the positions of all cells among themselves and rewires the graph.
    ///
    /// The episode returns to [`EpisodeState::Uninitialized`].
    pub fn rearrange(&mut self) {
        let mut centers: Vec<Coordinate> = self.cells.iter().filter_map(Cell::center).collect();
        centers.shuffle(&mut self.rng);
        for (cell, center) in self.cells.iter_mut().zip(centers) {
            cell.set_center(center);
        }
        self.build_neighbor_graph();
        self.current = None;
        self.previous = None;
        self.done = false;
    }

    /// Places the agent and clears the previous cell.
    ///
    /// With a position the agent starts on the cell found there, or on the
    /// out-of-bounds sentinel when none exists; adapters must reject the
    /// latter. Without a position a standard cell is chosen uniformly.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::NoStandardCell`] when a random start is requested
    /// and the grid has no standard cell.
    pub fn set_init_cell(&mut self, position: Option<Coordinate>) -> Result<(), GridError> {
        self.previous = None;
        let start = match position {
            Some(position) => {
                let id = self.cell_at(position);
                if id.is_out_of_bounds() {
                    warn!("start position {position} lies outside the grid");
                }
                id
            }
            None => self.choose_standard_cell()?,
        };
        self.current = Some(start);
        Ok(())
    }

    /// Starts a new episode and returns the starting position.
    ///
    /// # Errors
    ///
    /// See [`Grid::set_init_cell`].
    pub fn reset(&mut self, position: Option<Coordinate>) -> Result<Option<Coordinate>, GridError> {
        self.done = false;
        self.set_init_cell(position)?;
        let start = self.current_position();
        match start {
            Some(start) => debug!("episode reset at {start}"),
            None => debug!("episode reset outside the grid"),
        }
        Ok(start)
    }

    /// Applies `action` through the grid's own transition table.
    ///
    /// Returns whether the episode is over. Once terminated, further calls
    /// log a warning and change nothing.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::NotInitialized`] before the first reset.
    pub fn next_cell(&mut self, action: Direction) -> Result<bool, GridError> {
        let weights = *self.transition.weights(action);
        self.advance(action, &weights)
    }

    /// Applies `action` through an explicit transition table.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::NotInitialized`] before the first reset.
    pub fn next_cell_with(
        &mut self,
        action: Direction,
        transition: &TransitionTable,
    ) -> Result<bool, GridError> {
        self.advance(action, transition.weights(action))
    }

    /// Advances one tick and reports the agent's position and reward.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::NotInitialized`] before the first reset.
    pub fn step(&mut self, action: Direction) -> Result<StepOutcome, GridError> {
        let done = self.next_cell(action)?;
        Ok(StepOutcome {
            position: self.current_position(),
            reward: self.current_reward().unwrap_or_default(),
            done,
        })
    }

    fn advance(&mut self, action: Direction, weights: &DirectionWeights) -> Result<bool, GridError> {
        let current = self.current.ok_or(GridError::NotInitialized)?;

        if self.done {
            warn!("target state already reached; ignoring action {action}");
            return Ok(self.done);
        }

        let executed = self.sample_direction(action, weights)?;
        let neighbor = self.cell(current).neighbor(executed);

        self.previous = Some(current);
        let blocked = match neighbor {
            Some(id) => self.cell(id).kind().blocks_movement(),
            None => true,
        };
        if let (Some(id), false) = (neighbor, blocked) {
            self.current = Some(id);
        }

        let occupied = self.cell(self.current.unwrap_or(current));
        let (done, reward) = (occupied.kind().is_terminal(), occupied.reward());
        trace!("requested {action}, executed {executed}, blocked: {blocked}, reward {reward}");
        self.done = done;
        Ok(self.done)
    }

    fn sample_direction(
        &mut self,
        action: Direction,
        weights: &DirectionWeights,
    ) -> Result<Direction, GridError> {
        let distribution =
            WeightedIndex::new(weights.iter().copied()).map_err(|_| GridError::InvalidDistribution {
                action,
                reason: "weights cannot be sampled",
            })?;
        Ok(Direction::ALL[distribution.sample(&mut self.rng)])
    }

    fn choose_standard_cell(&mut self) -> Result<CellId, GridError> {
        let standard: Vec<CellId> = self
            .cells
            .iter()
            .filter(|cell| cell.kind() == CellKind::Standard)
            .map(Cell::id)
            .collect();
        standard
            .choose(&mut self.rng)
            .copied()
            .ok_or(GridError::NoStandardCell)
    }
}
