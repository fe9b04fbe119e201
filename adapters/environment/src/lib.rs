#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Agent-environment adapter around the authoritative grid.
//!
//! [`GridEnv`] speaks in action indices and `(x, y)` observations, counts
//! steps, and truncates episodes that run past a step budget. It performs no
//! probability resolution of its own: slipping happens inside the grid.

use gridworld_core::{Coordinate, Direction, GridError};
use gridworld_world::Grid;
use log::debug;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Actions addressed by index: `0 = L`, `1 = R`, `2 = U`, `3 = D`.
pub const ACTIONS: [Direction; 4] = Direction::ALL;

/// Step budget applied when none is configured.
pub const DEFAULT_MAX_STEPS: u32 = 100;

/// Position of the agent reported to the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Observation {
    /// Column of the occupied cell.
    pub x: i32,
    /// Row of the occupied cell.
    pub y: i32,
}

impl From<Coordinate> for Observation {
    fn from(position: Coordinate) -> Self {
        Self {
            x: position.x(),
            y: position.y(),
        }
    }
}

/// Everything the caller learns from a single step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Step {
    /// Agent position after the step.
    pub observation: Observation,
    /// Reward of the occupied cell.
    pub reward: f64,
    /// Whether the episode ended, by termination or truncation.
    pub done: bool,
    /// Whether the episode ended only because the step budget ran out.
    pub truncated: bool,
}

/// Failures reported by the adapter.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum EnvError {
    /// The grid rejected the call.
    #[error(transparent)]
    Grid(#[from] GridError),
    /// The action index does not name one of the four directions.
    #[error("action index {0} is outside 0..4")]
    InvalidAction(usize),
    /// The requested start is outside the grid or on a forbidden cell.
    #[error("cannot start at {0}: no enterable cell there")]
    InvalidStart(Coordinate),
}

/// Step/reset interface over a [`Grid`].
#[derive(Debug)]
pub struct GridEnv<R = ChaCha8Rng> {
    grid: Grid<R>,
    max_steps: u32,
    elapsed: u32,
}

impl<R> GridEnv<R>
where
    R: Rng,
{
    /// Wraps `grid` with the default step budget.
    #[must_use]
    pub fn new(grid: Grid<R>) -> Self {
        Self::with_max_steps(grid, DEFAULT_MAX_STEPS)
    }

    /// Wraps `grid`, truncating episodes once more than `max_steps` steps ran.
    #[must_use]
    pub fn with_max_steps(grid: Grid<R>, max_steps: u32) -> Self {
        Self {
            grid,
            max_steps,
            elapsed: 0,
        }
    }

    /// Read-only access to the wrapped grid.
    #[must_use]
    pub fn grid(&self) -> &Grid<R> {
        &self.grid
    }

    /// Releases the wrapped grid.
    #[must_use]
    pub fn into_grid(self) -> Grid<R> {
        self.grid
    }

    /// Number of distinct actions.
    #[must_use]
    pub const fn action_count(&self) -> usize {
        ACTIONS.len()
    }

    /// Observation bounds as `(columns, rows)`.
    #[must_use]
    pub fn observation_space(&self) -> (u32, u32) {
        (self.grid.numb_cols(), self.grid.numb_rows())
    }

    /// Configured step budget.
    #[must_use]
    pub const fn max_steps(&self) -> u32 {
        self.max_steps
    }

    /// Steps taken since the last reset.
    #[must_use]
    pub const fn elapsed_steps(&self) -> u32 {
        self.elapsed
    }

    /// Maps an action index onto its direction.
    ///
    /// # Errors
    ///
    /// Returns [`EnvError::InvalidAction`] for indices outside `0..4`.
    pub fn action(&self, index: usize) -> Result<Direction, EnvError> {
        ACTIONS
            .get(index)
            .copied()
            .ok_or(EnvError::InvalidAction(index))
    }

    /// Starts an episode on a uniformly chosen standard cell.
    ///
    /// # Errors
    ///
    /// Propagates [`GridError::NoStandardCell`].
    pub fn reset(&mut self) -> Result<Observation, EnvError> {
        self.elapsed = 0;
        let _ = self.grid.reset(None)?;
        self.observation()
    }

    /// Starts an episode on the cell at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`EnvError::InvalidStart`] when no enterable cell sits there.
    pub fn reset_at(&mut self, position: Coordinate) -> Result<Observation, EnvError> {
        let id = self.grid.cell_at(position);
        if id.is_out_of_bounds() || self.grid.cell(id).kind().blocks_movement() {
            return Err(EnvError::InvalidStart(position));
        }
        self.elapsed = 0;
        let _ = self.grid.reset(Some(position))?;
        self.observation()
    }

    /// Current position of the agent.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::NotInitialized`] before the first reset.
    pub fn observation(&self) -> Result<Observation, EnvError> {
        self.grid
            .current_position()
            .map(Observation::from)
            .ok_or(EnvError::Grid(GridError::NotInitialized))
    }

    /// Requests the action at `index` and advances one tick.
    ///
    /// # Errors
    ///
    /// Returns [`EnvError::InvalidAction`] for unknown indices and
    /// [`GridError::NotInitialized`] before the first reset.
    pub fn step(&mut self, index: usize) -> Result<Step, EnvError> {
        let action = self.action(index)?;
        let outcome = self.grid.step(action)?;
        self.elapsed = self.elapsed.saturating_add(1);

        let truncated = !outcome.done && self.elapsed > self.max_steps;
        if truncated {
            debug!("episode truncated after {} steps", self.elapsed);
        }

        Ok(Step {
            observation: self.observation()?,
            reward: outcome.reward,
            done: outcome.done || truncated,
            truncated,
        })
    }
}
