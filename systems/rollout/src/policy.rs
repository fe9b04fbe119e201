//! Fixed, non-learning action selectors.

use gridworld_core::Direction;
use gridworld_environment::{Observation, ACTIONS};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Chooses an action index for the observed position.
pub trait Policy {
    /// Returns an index into [`ACTIONS`].
    fn choose_action(&mut self, observation: Observation) -> usize;
}

/// Picks each of the four actions with equal probability.
#[derive(Debug)]
pub struct RandomPolicy {
    rng: ChaCha8Rng,
}

impl RandomPolicy {
    /// Creates a policy whose choices are reproducible from `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Policy for RandomPolicy {
    fn choose_action(&mut self, _observation: Observation) -> usize {
        self.rng.gen_range(0..ACTIONS.len())
    }
}

/// Requests the same direction on every step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConstantPolicy {
    direction: Direction,
}

impl ConstantPolicy {
    /// Creates a policy that always requests `direction`.
    #[must_use]
    pub const fn new(direction: Direction) -> Self {
        Self { direction }
    }

    /// Direction requested on every step.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }
}

impl Policy for ConstantPolicy {
    fn choose_action(&mut self, _observation: Observation) -> usize {
        ACTIONS
            .iter()
            .position(|action| *action == self.direction)
            .unwrap_or_default()
    }
}
