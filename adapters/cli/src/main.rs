#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs episodes in a stochastic grid world.

mod settings;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use gridworld_core::Coordinate;
use gridworld_environment::{GridEnv, DEFAULT_MAX_STEPS};
use gridworld_system_rollout::{run_episode, RolloutStats};
use gridworld_world::Grid;
use log::info;

use self::settings::{parse_policy, parse_start, PolicyChoice};

/// Simulates episodes in a stochastic grid world.
#[derive(Debug, Parser)]
#[command(name = "gridworld")]
struct Args {
    /// TOML file holding the grid configuration.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Rows of the random grid; overrides the config file.
    #[arg(long)]
    rows: Option<u32>,
    /// Columns of the random grid; overrides the config file.
    #[arg(long)]
    columns: Option<u32>,
    /// Share of non-terminal cells that become forbidden.
    #[arg(long)]
    fraction_forbidden: Option<f64>,
    /// Seed for the layout, the slips and the random policy.
    #[arg(long)]
    seed: Option<u64>,
    /// Use the classic 4x3 world instead of a random layout.
    #[arg(long)]
    canonical: bool,
    /// Number of episodes to run.
    #[arg(long, default_value_t = 10)]
    episodes: u32,
    /// Steps after which an episode is truncated.
    #[arg(long, default_value_t = DEFAULT_MAX_STEPS)]
    max_steps: u32,
    /// `random`, or one of L, R, U, D to always request that direction.
    #[arg(long, default_value = "random", value_parser = parse_policy)]
    policy: PolicyChoice,
    /// Fixed start cell as `X,Y`; a random standard cell otherwise.
    #[arg(long, value_parser = parse_start)]
    start: Option<Coordinate>,
    /// Print the grid after every episode.
    #[arg(long)]
    render: bool,
    /// Log transitions and resets.
    #[arg(short, long)]
    verbose: bool,
}

/// Entry point for the grid world command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    let filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let mut config = settings::load(args.config.as_deref())?;
    if let Some(rows) = args.rows {
        config.rows = rows;
    }
    if let Some(columns) = args.columns {
        config.columns = columns;
    }
    if let Some(fraction) = args.fraction_forbidden {
        config.fraction_forbidden = fraction;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let grid = if args.canonical {
        let mut grid = Grid::grid_4x3(config.seed);
        grid.set_transition_table(config.transition.clone());
        grid
    } else {
        Grid::random(&config).context("failed to build grid")?
    };
    info!(
        "running {} episodes on a {}x{} grid",
        args.episodes,
        grid.numb_cols(),
        grid.numb_rows()
    );
    if args.render {
        print!("{grid}");
    }

    let mut env = GridEnv::with_max_steps(grid, args.max_steps);
    let mut policy = args.policy.build(config.seed);
    let mut stats = RolloutStats::new();
    for episode in 0..args.episodes {
        let summary = run_episode(&mut env, policy.as_mut(), args.start)
            .with_context(|| format!("episode {episode} failed"))?;
        info!(
            "episode {episode}: {:?} after {} steps, return {:.3}",
            summary.outcome, summary.steps, summary.total_reward
        );
        if args.render {
            println!("episode {episode}:");
            print!("{}", env.grid());
        }
        stats.record(&summary);
    }

    println!(
        "episodes: {}  goal: {}  fail: {}  other: {}  truncated: {}",
        stats.episodes(),
        stats.goals(),
        stats.fails(),
        stats.other_terminals(),
        stats.truncated()
    );
    println!(
        "mean return: {:.4}  mean length: {:.2}",
        stats.mean_return(),
        stats.mean_length()
    );
    Ok(())
}
