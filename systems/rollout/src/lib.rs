#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Episode runner that drives a [`GridEnv`] with a fixed policy.

mod policy;

use gridworld_core::Coordinate;
use gridworld_environment::{EnvError, GridEnv};
use log::debug;
use rand::Rng;

pub use policy::{ConstantPolicy, Policy, RandomPolicy};

/// How an episode ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The agent entered a terminal cell carrying the goal reward.
    Goal,
    /// The agent entered a terminal cell carrying the fail reward.
    Fail,
    /// The agent entered a terminal cell with any other reward.
    Terminal,
    /// The step budget ran out first.
    Truncated,
}

/// Result of a single episode.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EpisodeSummary {
    /// Number of steps taken.
    pub steps: u32,
    /// Sum of the rewards collected after every step.
    pub total_reward: f64,
    /// Reward of the last occupied cell.
    pub final_reward: f64,
    /// How the episode ended.
    pub outcome: Outcome,
}

/// Runs one episode from `start`, or from a random standard cell when `None`.
///
/// # Errors
///
/// Propagates adapter failures, including invalid starts and action indices
/// outside the action set.
pub fn run_episode<R, P>(
    env: &mut GridEnv<R>,
    policy: &mut P,
    start: Option<Coordinate>,
) -> Result<EpisodeSummary, EnvError>
where
    R: Rng,
    P: Policy + ?Sized,
{
    let mut observation = match start {
        Some(position) => env.reset_at(position)?,
        None => env.reset()?,
    };

    let mut steps = 0;
    let mut total_reward = 0.0;
    loop {
        let step = env.step(policy.choose_action(observation))?;
        steps += 1;
        total_reward += step.reward;
        observation = step.observation;

        if step.done {
            let rewards = env.grid().rewards();
            let outcome = if step.truncated {
                Outcome::Truncated
            } else if step.reward == rewards.goal {
                Outcome::Goal
            } else if step.reward == rewards.fail {
                Outcome::Fail
            } else {
                Outcome::Terminal
            };
            debug!("episode ended after {steps} steps: {outcome:?}, return {total_reward}");
            return Ok(EpisodeSummary {
                steps,
                total_reward,
                final_reward: step.reward,
                outcome,
            });
        }
    }
}

/// Aggregates episode summaries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RolloutStats {
    episodes: u32,
    steps: u64,
    total_return: f64,
    goals: u32,
    fails: u32,
    other_terminals: u32,
    truncated: u32,
}

impl RolloutStats {
    /// Creates empty statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one episode into the statistics.
    pub fn record(&mut self, summary: &EpisodeSummary) {
        self.episodes += 1;
        self.steps += u64::from(summary.steps);
        self.total_return += summary.total_reward;
        match summary.outcome {
            Outcome::Goal => self.goals += 1,
            Outcome::Fail => self.fails += 1,
            Outcome::Terminal => self.other_terminals += 1,
            Outcome::Truncated => self.truncated += 1,
        }
    }

    /// Number of recorded episodes.
    #[must_use]
    pub const fn episodes(&self) -> u32 {
        self.episodes
    }

    /// Episodes that ended on the goal terminal.
    #[must_use]
    pub const fn goals(&self) -> u32 {
        self.goals
    }

    /// Episodes that ended on the fail terminal.
    #[must_use]
    pub const fn fails(&self) -> u32 {
        self.fails
    }

    /// Episodes that ended on any other terminal.
    #[must_use]
    pub const fn other_terminals(&self) -> u32 {
        self.other_terminals
    }

    /// Episodes cut off by the step budget.
    #[must_use]
    pub const fn truncated(&self) -> u32 {
        self.truncated
    }

    /// Average return per episode, zero when nothing was recorded.
    #[must_use]
    pub fn mean_return(&self) -> f64 {
        if self.episodes == 0 {
            return 0.0;
        }
        self.total_return / f64::from(self.episodes)
    }

    /// Average episode length, zero when nothing was recorded.
    #[must_use]
    pub fn mean_length(&self) -> f64 {
        if self.episodes == 0 {
            return 0.0;
        }
        self.steps as f64 / f64::from(self.episodes)
    }
}
