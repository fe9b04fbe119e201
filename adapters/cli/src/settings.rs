use std::{fs, path::Path};

use anyhow::{Context, Result};
use gridworld_core::{Coordinate, Direction, GridConfig};
use gridworld_system_rollout::{ConstantPolicy, Policy, RandomPolicy};

/// Reads the grid configuration, falling back to defaults without a file.
pub(crate) fn load(path: Option<&Path>) -> Result<GridConfig> {
    let Some(path) = path else {
        return Ok(GridConfig::default());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read grid config at {}", path.display()))?;
    parse(&contents).with_context(|| format!("failed to parse grid config at {}", path.display()))
}

fn parse(contents: &str) -> Result<GridConfig> {
    Ok(toml::from_str(contents)?)
}

/// Action selector requested on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PolicyChoice {
    Random,
    Constant(Direction),
}

impl PolicyChoice {
    pub(crate) fn build(self, seed: u64) -> Box<dyn Policy> {
        match self {
            Self::Random => Box::new(RandomPolicy::new(seed)),
            Self::Constant(direction) => Box::new(ConstantPolicy::new(direction)),
        }
    }
}

pub(crate) fn parse_policy(value: &str) -> Result<PolicyChoice, String> {
    if value.eq_ignore_ascii_case("random") {
        return Ok(PolicyChoice::Random);
    }
    value
        .parse::<Direction>()
        .map(PolicyChoice::Constant)
        .map_err(|error| format!("{error}; or `random`"))
}

/// Parses `X,Y` into a coordinate.
pub(crate) fn parse_start(value: &str) -> Result<Coordinate, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got `{value}`"))?;
    let x = x
        .trim()
        .parse::<i32>()
        .map_err(|_| format!("invalid x coordinate in `{value}`"))?;
    let y = y
        .trim()
        .parse::<i32>()
        .map_err(|_| format!("invalid y coordinate in `{value}`"))?;
    Ok(Coordinate::new(x, y))
}
