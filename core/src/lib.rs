#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the grid world workspace.
//!
//! This crate defines the value types that every other crate speaks in:
//! [`Direction`] tokens requested by agents, [`Coordinate`] positions on the
//! lattice, the [`CellKind`] tag that drives movement and termination, the
//! [`RewardTable`] and [`TransitionTable`] configuration objects, and the
//! [`GridError`] taxonomy. The authoritative grid lives in the world crate;
//! adapters and systems only ever exchange these types with it.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Number of cardinal directions an agent may request.
pub const DIRECTION_COUNT: usize = 4;

/// Cardinal movement directions available to the agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Direction {
    /// Movement toward decreasing x.
    Left,
    /// Movement toward increasing x.
    Right,
    /// Movement toward increasing y.
    Up,
    /// Movement toward decreasing y.
    Down,
}

impl Direction {
    /// Every direction in canonical `L, R, U, D` order.
    pub const ALL: [Direction; DIRECTION_COUNT] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];

    /// Single-letter token used in configuration files and logs.
    #[must_use]
    pub const fn token(self) -> char {
        match self {
            Self::Left => 'L',
            Self::Right => 'R',
            Self::Up => 'U',
            Self::Down => 'D',
        }
    }

    /// Position of the direction within [`Direction::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
            Self::Up => 2,
            Self::Down => 3,
        }
    }

    /// Direction pointing straight back.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }

    /// The two directions at right angles, in canonical order.
    #[must_use]
    pub const fn perpendicular(self) -> [Self; 2] {
        match self {
            Self::Left | Self::Right => [Self::Up, Self::Down],
            Self::Up | Self::Down => [Self::Left, Self::Right],
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

impl TryFrom<char> for Direction {
    type Error = GridError;

    fn try_from(token: char) -> Result<Self, Self::Error> {
        match token {
            'L' => Ok(Self::Left),
            'R' => Ok(Self::Right),
            'U' => Ok(Self::Up),
            'D' => Ok(Self::Down),
            other => Err(GridError::InvalidDirection(other.to_string())),
        }
    }
}

impl FromStr for Direction {
    type Err = GridError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let mut chars = token.chars();
        match (chars.next(), chars.next()) {
            (Some(single), None) => Self::try_from(single),
            _ => Err(GridError::InvalidDirection(token.to_owned())),
        }
    }
}

impl TryFrom<String> for Direction {
    type Error = GridError;

    fn try_from(token: String) -> Result<Self, Self::Error> {
        token.parse()
    }
}

impl From<Direction> for String {
    fn from(direction: Direction) -> Self {
        direction.token().to_string()
    }
}

/// Position of a cell center on the integer lattice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    x: i32,
    y: i32,
}

impl Coordinate {
    /// Creates a new lattice coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Horizontal component; grows to the right.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Vertical component; grows upward.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Coordinate of the prospective neighbour one unit away in `direction`.
    #[must_use]
    pub const fn neighbour(self, direction: Direction) -> Self {
        match direction {
            Direction::Left => Self::new(self.x - 1, self.y),
            Direction::Right => Self::new(self.x + 1, self.y),
            Direction::Up => Self::new(self.x, self.y + 1),
            Direction::Down => Self::new(self.x, self.y - 1),
        }
    }

    /// Resolves a raw direction token and returns the neighbouring coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidDirection`] when `token` is not one of
    /// `L`, `R`, `U` or `D`.
    pub fn neighbour_token(self, token: &str) -> Result<Self, GridError> {
        Ok(self.neighbour(token.parse()?))
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Classification of a cell, fixed when the cell is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    /// Impassable cell the agent can never occupy.
    Forbidden,
    /// Ordinary cell yielding the per-step reward.
    Standard,
    /// Episode-ending cell carrying its own reward.
    Terminal,
}

impl CellKind {
    /// Reports whether an agent bumping into this cell stays where it is.
    #[must_use]
    pub const fn blocks_movement(self) -> bool {
        match self {
            Self::Forbidden => true,
            Self::Standard | Self::Terminal => false,
        }
    }

    /// Reports whether entering this cell ends the episode.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        match self {
            Self::Terminal => true,
            Self::Forbidden | Self::Standard => false,
        }
    }
}

/// Rewards assigned to the three outcomes of a randomized layout.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardTable {
    /// Reward collected on every standard cell.
    pub standard: f64,
    /// Reward of the goal terminal.
    pub goal: f64,
    /// Reward of the fail terminal.
    pub fail: f64,
}

impl Default for RewardTable {
    fn default() -> Self {
        Self {
            standard: -0.04,
            goal: 1.0,
            fail: -1.0,
        }
    }
}

/// Probability weights over executed directions, indexed by [`Direction::index`].
pub type DirectionWeights = [f64; DIRECTION_COUNT];

/// Maps every requested action to a distribution over executed directions.
///
/// The default table lets the agent slip sideways: the requested direction
/// is executed with probability 0.8 and each perpendicular direction with
/// probability 0.1. The reverse direction is never executed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<Direction, BTreeMap<Direction, f64>>",
    into = "BTreeMap<Direction, BTreeMap<Direction, f64>>"
)]
pub struct TransitionTable {
    rows: [DirectionWeights; DIRECTION_COUNT],
}

impl TransitionTable {
    /// Builds a table from one weight row per requested direction.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidDistribution`] when a row contains a
    /// negative or non-finite weight, or when its weights sum to zero.
    pub fn from_rows(rows: [DirectionWeights; DIRECTION_COUNT]) -> Result<Self, GridError> {
        for action in Direction::ALL {
            validate_row(action, &rows[action.index()])?;
        }
        Ok(Self { rows })
    }

    /// Table where every action is executed exactly as requested.
    #[must_use]
    pub fn deterministic() -> Self {
        let mut rows = [[0.0; DIRECTION_COUNT]; DIRECTION_COUNT];
        for action in Direction::ALL {
            rows[action.index()][action.index()] = 1.0;
        }
        Self { rows }
    }

    /// Replaces the distribution used for `action`.
    ///
    /// Directions absent from `outcomes` receive zero probability.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidDistribution`] when the resulting row
    /// cannot be sampled.
    pub fn with_row(
        mut self,
        action: Direction,
        outcomes: &[(Direction, f64)],
    ) -> Result<Self, GridError> {
        let mut row = [0.0; DIRECTION_COUNT];
        for (direction, weight) in outcomes {
            row[direction.index()] += weight;
        }
        validate_row(action, &row)?;
        self.rows[action.index()] = row;
        Ok(self)
    }

    /// Weights over executed directions when `action` is requested.
    #[must_use]
    pub fn weights(&self, action: Direction) -> &DirectionWeights {
        &self.rows[action.index()]
    }

    /// Weight assigned to executing `outcome` when `action` is requested.
    #[must_use]
    pub fn probability(&self, action: Direction, outcome: Direction) -> f64 {
        self.rows[action.index()][outcome.index()]
    }

    /// Executed directions with non-zero weight for `action`.
    pub fn outcomes(&self, action: Direction) -> impl Iterator<Item = (Direction, f64)> + '_ {
        Direction::ALL
            .into_iter()
            .map(move |outcome| (outcome, self.probability(action, outcome)))
            .filter(|(_, weight)| *weight > 0.0)
    }
}

impl Default for TransitionTable {
    fn default() -> Self {
        // Rows and columns follow L, R, U, D.
        Self {
            rows: [
                [0.8, 0.0, 0.1, 0.1],
                [0.0, 0.8, 0.1, 0.1],
                [0.1, 0.1, 0.8, 0.0],
                [0.1, 0.1, 0.0, 0.8],
            ],
        }
    }
}

impl TryFrom<BTreeMap<Direction, BTreeMap<Direction, f64>>> for TransitionTable {
    type Error = GridError;

    /// Rows missing from the map keep their default distribution.
    fn try_from(map: BTreeMap<Direction, BTreeMap<Direction, f64>>) -> Result<Self, Self::Error> {
        let mut table = Self::default();
        for (action, row) in map {
            let outcomes: Vec<(Direction, f64)> = row.into_iter().collect();
            table = table.with_row(action, &outcomes)?;
        }
        Ok(table)
    }
}

impl From<TransitionTable> for BTreeMap<Direction, BTreeMap<Direction, f64>> {
    fn from(table: TransitionTable) -> Self {
        Direction::ALL
            .into_iter()
            .map(|action| (action, table.outcomes(action).collect()))
            .collect()
    }
}

fn validate_row(action: Direction, row: &DirectionWeights) -> Result<(), GridError> {
    if row.iter().any(|weight| !weight.is_finite() || *weight < 0.0) {
        return Err(GridError::InvalidDistribution {
            action,
            reason: "weights must be finite and non-negative",
        });
    }
    let total = row.iter().sum::<f64>();
    if total <= 0.0 {
        return Err(GridError::InvalidDistribution {
            action,
            reason: "weights must not all be zero",
        });
    }
    if !total.is_finite() {
        return Err(GridError::InvalidDistribution {
            action,
            reason: "weights must have a finite sum",
        });
    }
    Ok(())
}

/// Parameters describing a randomized grid world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Number of lattice rows.
    pub rows: u32,
    /// Number of lattice columns.
    pub columns: u32,
    /// Share of non-terminal cells that become forbidden, rounded down.
    pub fraction_forbidden: f64,
    /// Rewards for standard cells and both terminals.
    pub rewards: RewardTable,
    /// Slip model applied to requested actions.
    pub transition: TransitionTable,
    /// Seed for the grid's pseudo-random source.
    pub seed: u64,
}

impl GridConfig {
    /// Creates a configuration with the provided dimensions and defaults elsewhere.
    #[must_use]
    pub fn new(rows: u32, columns: u32) -> Self {
        Self {
            rows,
            columns,
            ..Self::default()
        }
    }

    /// Total number of cells, `rows * columns`, saturating at `usize::MAX`.
    #[must_use]
    pub fn numb_cells(&self) -> usize {
        self.checked_numb_cells().unwrap_or(usize::MAX)
    }

    /// Total number of cells, or `None` when the lattice cannot be addressed
    /// with `i32` coordinates or the count does not fit in `usize`.
    #[must_use]
    pub fn checked_numb_cells(&self) -> Option<usize> {
        let max = u32::try_from(i32::MAX).ok()?;
        if self.rows > max || self.columns > max {
            return None;
        }
        let cells = u64::from(self.rows).checked_mul(u64::from(self.columns))?;
        usize::try_from(cells).ok()
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: 3,
            columns: 4,
            fraction_forbidden: 0.15,
            rewards: RewardTable::default(),
            transition: TransitionTable::default(),
            seed: 0,
        }
    }
}

/// Failures raised when a caller violates the grid contract.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum GridError {
    /// A direction token outside `L`, `R`, `U`, `D` was supplied.
    #[error("unknown direction `{0}`, expected one of L, R, U, D")]
    InvalidDirection(String),
    /// A transition was requested before the first reset.
    #[error("no current cell; reset the grid before stepping")]
    NotInitialized,
    /// A random start was requested on a grid without standard cells.
    #[error("grid has no standard cell to start from")]
    NoStandardCell,
    /// The requested random layout cannot hold both terminal cells.
    #[error("a {rows}x{columns} grid cannot hold the two terminal cells")]
    TooFewCells {
        /// Requested row count.
        rows: u32,
        /// Requested column count.
        columns: u32,
    },
    /// The requested random layout is too large to address.
    #[error("a {rows}x{columns} grid is too large to lay out")]
    TooManyCells {
        /// Requested row count.
        rows: u32,
        /// Requested column count.
        columns: u32,
    },
    /// The forbidden fraction lies outside `[0, 1]`.
    #[error("forbidden fraction {0} is outside [0, 1]")]
    InvalidFraction(f64),
    /// A fixed layout placed two cells on the same position.
    #[error("two cells share position {0}")]
    DuplicatePosition(Coordinate),
    /// A transition row cannot be sampled.
    #[error("transition row for {action} is invalid: {reason}")]
    InvalidDistribution {
        /// Requested action owning the row.
        action: Direction,
        /// Why the row was rejected.
        reason: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbour_moves_exactly_one_axis_by_one_unit() {
        let origin = Coordinate::new(3, -2);
        assert_eq!(origin.neighbour(Direction::Left), Coordinate::new(2, -2));
        assert_eq!(origin.neighbour(Direction::Right), Coordinate::new(4, -2));
        assert_eq!(origin.neighbour(Direction::Up), Coordinate::new(3, -1));
        assert_eq!(origin.neighbour(Direction::Down), Coordinate::new(3, -3));

        for direction in Direction::ALL {
            let next = origin.neighbour(direction);
            let dx = (next.x() - origin.x()).abs();
            let dy = (next.y() - origin.y()).abs();
            assert_eq!(dx + dy, 1, "{direction} moved more than one unit");
            assert_eq!(next.neighbour(direction.opposite()), origin);
        }
    }

    #[test]
    fn neighbour_token_rejects_unknown_directions() {
        let origin = Coordinate::new(0, 0);
        assert_eq!(origin.neighbour_token("U"), Ok(Coordinate::new(0, 1)));
        assert_eq!(
            origin.neighbour_token("X"),
            Err(GridError::InvalidDirection("X".to_owned()))
        );
        assert_eq!(
            origin.neighbour_token("LR"),
            Err(GridError::InvalidDirection("LR".to_owned()))
        );
        assert!(origin.neighbour_token("").is_err());
        assert!("l".parse::<Direction>().is_err());
    }

    #[test]
    fn direction_tokens_parse_back() {
        for direction in Direction::ALL {
            assert_eq!(direction.to_string().parse::<Direction>(), Ok(direction));
            assert_eq!(Direction::ALL[direction.index()], direction);
        }
    }

    #[test]
    fn coordinates_compare_structurally() {
        assert_eq!(Coordinate::new(1, 2), Coordinate::new(1, 2));
        assert_ne!(Coordinate::new(1, 2), Coordinate::new(2, 1));
    }

    #[test]
    fn cell_kind_dispatch_covers_every_kind() {
        assert!(CellKind::Forbidden.blocks_movement());
        assert!(!CellKind::Standard.blocks_movement());
        assert!(!CellKind::Terminal.blocks_movement());
        assert!(CellKind::Terminal.is_terminal());
        assert!(!CellKind::Standard.is_terminal());
        assert!(!CellKind::Forbidden.is_terminal());
    }

    #[test]
    fn default_transition_table_matches_slip_model() {
        use Direction::{Down, Left, Right, Up};
        let table = TransitionTable::default();
        let expected = [
            (Right, [(Right, 0.8), (Up, 0.1), (Down, 0.1), (Left, 0.0)]),
            (Left, [(Left, 0.8), (Up, 0.1), (Down, 0.1), (Right, 0.0)]),
            (Up, [(Up, 0.8), (Left, 0.1), (Right, 0.1), (Down, 0.0)]),
            (Down, [(Down, 0.8), (Left, 0.1), (Right, 0.1), (Up, 0.0)]),
        ];
        for (action, row) in expected {
            for (outcome, probability) in row {
                assert_eq!(table.probability(action, outcome), probability);
            }
            assert_eq!(table.probability(action, action.opposite()), 0.0);
            for side in action.perpendicular() {
                assert_eq!(table.probability(action, side), 0.1);
            }
        }
    }

    #[test]
    fn transition_rows_are_validated() {
        let negative = TransitionTable::default().with_row(
            Direction::Up,
            &[(Direction::Up, 1.2), (Direction::Left, -0.2)],
        );
        assert!(matches!(
            negative,
            Err(GridError::InvalidDistribution {
                action: Direction::Up,
                ..
            })
        ));

        let empty = TransitionTable::default().with_row(Direction::Down, &[]);
        assert!(empty.is_err());

        let mut rows = [[0.0; DIRECTION_COUNT]; DIRECTION_COUNT];
        rows[0][0] = f64::NAN;
        assert!(TransitionTable::from_rows(rows).is_err());

        let overflowing = TransitionTable::default().with_row(
            Direction::Right,
            &[(Direction::Right, 1e308), (Direction::Up, 1e308)],
        );
        assert_eq!(
            overflowing,
            Err(GridError::InvalidDistribution {
                action: Direction::Right,
                reason: "weights must have a finite sum",
            })
        );
    }

    #[test]
    fn deterministic_table_executes_requested_direction() {
        let table = TransitionTable::deterministic();
        for action in Direction::ALL {
            let outcomes: Vec<_> = table.outcomes(action).collect();
            assert_eq!(outcomes, vec![(action, 1.0)]);
        }
    }

    #[test]
    fn config_reads_partial_toml() {
        let config: GridConfig = toml::from_str(
            r#"
            rows = 5
            columns = 6
            seed = 7

            [rewards]
            standard = -0.1

            [transition.R]
            R = 0.5
            L = 0.5
            "#,
        )
        .expect("config parses");

        assert_eq!(config.rows, 5);
        assert_eq!(config.columns, 6);
        assert_eq!(config.seed, 7);
        assert_eq!(config.fraction_forbidden, 0.15);
        assert_eq!(config.rewards.standard, -0.1);
        assert_eq!(config.rewards.goal, 1.0);
        assert_eq!(
            config.transition.probability(Direction::Right, Direction::Left),
            0.5
        );
        assert_eq!(
            config.transition.probability(Direction::Up, Direction::Up),
            0.8
        );
        assert_eq!(config.numb_cells(), 30);
    }

    #[test]
    fn cell_count_reports_unaddressable_lattices() {
        assert_eq!(GridConfig::new(3, 4).checked_numb_cells(), Some(12));
        assert_eq!(GridConfig::new(0, 4).checked_numb_cells(), Some(0));
        assert_eq!(GridConfig::new(u32::MAX, 1).checked_numb_cells(), None);
        assert_eq!(GridConfig::new(u32::MAX, 1).numb_cells(), usize::MAX);
    }

    #[test]
    fn config_rejects_rows_with_overflowing_sum() {
        let parsed: Result<GridConfig, _> = toml::from_str(
            r#"
            [transition.R]
            R = 1e308
            U = 1e308
            "#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn config_rejects_unknown_direction_keys() {
        let parsed: Result<GridConfig, _> = toml::from_str(
            r#"
            [transition.Q]
            Q = 1.0
            "#,
        );
        assert!(parsed.is_err());
    }
}
