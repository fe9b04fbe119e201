//! Cell creation for randomized and hand-built layouts.

use std::collections::HashSet;

use gridworld_core::{CellKind, Coordinate, GridConfig, GridError, RewardTable};
use rand::{seq::SliceRandom, Rng};

use crate::cell::{Cell, CellId};

/// Explicit description of one cell in a hand-built layout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellSpec {
    /// Lattice position of the cell.
    pub position: Coordinate,
    /// Kind of the cell.
    pub kind: CellKind,
    /// Reward collected on the cell.
    pub reward: f64,
}

impl CellSpec {
    /// Describes a cell at `position` with the provided kind and reward.
    #[must_use]
    pub const fn new(position: Coordinate, kind: CellKind, reward: f64) -> Self {
        Self {
            position,
            kind,
            reward,
        }
    }

    /// Standard cell yielding `reward` each step.
    #[must_use]
    pub const fn standard(position: Coordinate, reward: f64) -> Self {
        Self::new(position, CellKind::Standard, reward)
    }

    /// Forbidden cell; forbidden cells never carry a reward.
    #[must_use]
    pub const fn forbidden(position: Coordinate) -> Self {
        Self::new(position, CellKind::Forbidden, 0.0)
    }

    /// Terminal cell ending the episode with `reward`.
    #[must_use]
    pub const fn terminal(position: Coordinate, reward: f64) -> Self {
        Self::new(position, CellKind::Terminal, reward)
    }
}

/// Number of forbidden cells a randomized layout of `numb_cells` receives.
#[must_use]
pub fn forbidden_count(numb_cells: usize, fraction_forbidden: f64) -> usize {
    let candidates = numb_cells.saturating_sub(2);
    (candidates as f64 * fraction_forbidden).floor() as usize
}

/// Creates the cells of a randomized layout and scatters them over the
/// `columns x rows` rectangle.
pub(crate) fn random_cells<R>(config: &GridConfig, rng: &mut R) -> Result<Vec<Cell>, GridError>
where
    R: Rng + ?Sized,
{
    if !(0.0..=1.0).contains(&config.fraction_forbidden) {
        return Err(GridError::InvalidFraction(config.fraction_forbidden));
    }

    let numb_cells = config.checked_numb_cells().ok_or(GridError::TooManyCells {
        rows: config.rows,
        columns: config.columns,
    })?;
    if numb_cells < 2 {
        return Err(GridError::TooFewCells {
            rows: config.rows,
            columns: config.columns,
        });
    }

    let too_large = |_| GridError::TooManyCells {
        rows: config.rows,
        columns: config.columns,
    };
    let mut positions = Vec::new();
    positions.try_reserve_exact(numb_cells).map_err(too_large)?;
    let mut kinds = Vec::new();
    kinds.try_reserve_exact(numb_cells).map_err(too_large)?;

    positions.extend(rectangle(config.rows, config.columns));
    positions.shuffle(rng);

    let numb_forbidden = forbidden_count(numb_cells, config.fraction_forbidden);
    let rewards = &config.rewards;
    kinds.push((CellKind::Terminal, rewards.fail));
    kinds.push((CellKind::Terminal, rewards.goal));
    for index in 0..numb_cells - 2 {
        if index < numb_forbidden {
            kinds.push((CellKind::Forbidden, 0.0));
        } else {
            kinds.push((CellKind::Standard, rewards.standard));
        }
    }

    Ok(kinds
        .into_iter()
        .zip(positions)
        .enumerate()
        .map(|(index, ((kind, reward), center))| Cell::new(CellId::new(index), center, kind, reward))
        .collect())
}

/// Creates the cells of a hand-built layout, rejecting shared positions.
pub(crate) fn fixed_cells(specs: &[CellSpec]) -> Result<Vec<Cell>, GridError> {
    let mut seen = HashSet::with_capacity(specs.len());
    let mut cells = Vec::with_capacity(specs.len());
    for (index, spec) in specs.iter().enumerate() {
        if !seen.insert(spec.position) {
            return Err(GridError::DuplicatePosition(spec.position));
        }
        cells.push(Cell::new(
            CellId::new(index),
            spec.position,
            spec.kind,
            spec.reward,
        ));
    }
    Ok(cells)
}

/// Reward table and forbidden share actually present in a hand-built layout.
///
/// The goal is the highest terminal reward and the fail the lowest; values
/// with no matching cell keep their defaults.
pub(crate) fn layout_parameters(cells: &[Cell]) -> (RewardTable, f64) {
    let mut rewards = RewardTable::default();
    if let Some(cell) = cells.iter().find(|cell| cell.kind() == CellKind::Standard) {
        rewards.standard = cell.reward();
    }
    let terminal_rewards = || {
        cells
            .iter()
            .filter(|cell| cell.kind().is_terminal())
            .map(Cell::reward)
    };
    if let Some(goal) = terminal_rewards().reduce(f64::max) {
        rewards.goal = goal;
    }
    if let Some(fail) = terminal_rewards().reduce(f64::min) {
        rewards.fail = fail;
    }

    let forbidden = cells
        .iter()
        .filter(|cell| cell.kind() == CellKind::Forbidden)
        .count();
    let candidates = cells.len().saturating_sub(2);
    let fraction_forbidden = if candidates == 0 {
        0.0
    } else {
        (forbidden as f64 / candidates as f64).min(1.0)
    };
    (rewards, fraction_forbidden)
}

/// Layout of the classic 4x3 world: forbidden at (1, 1), fail at (3, 1) and
/// goal at (3, 2).
pub(crate) fn canonical_4x3() -> Vec<CellSpec> {
    let mut specs = Vec::with_capacity(12);
    for x in 0..4 {
        for y in 0..3 {
            let position = Coordinate::new(x, y);
            let spec = match (x, y) {
                (1, 1) => CellSpec::forbidden(position),
                (3, 1) => CellSpec::terminal(position, -1.0),
                (3, 2) => CellSpec::terminal(position, 1.0),
                _ => CellSpec::standard(position, -0.04),
            };
            specs.push(spec);
        }
    }
    specs
}

fn rectangle(rows: u32, columns: u32) -> impl Iterator<Item = Coordinate> {
    let rows = i32::try_from(rows).unwrap_or(i32::MAX);
    let columns = i32::try_from(columns).unwrap_or(i32::MAX);
    (0..rows).flat_map(move |row| (0..columns).map(move |column| Coordinate::new(column, row)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn forbidden_count_rounds_down() {
        assert_eq!(forbidden_count(12, 0.15), 1);
        assert_eq!(forbidden_count(12, 0.0), 0);
        assert_eq!(forbidden_count(12, 1.0), 10);
        assert_eq!(forbidden_count(2, 0.5), 0);
        assert_eq!(forbidden_count(30, 0.25), 7);
    }

    #[test]
    fn random_cells_reject_invalid_configuration() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let tiny = GridConfig::new(1, 1);
        assert_eq!(
            random_cells(&tiny, &mut rng),
            Err(GridError::TooFewCells {
                rows: 1,
                columns: 1
            })
        );

        let mut config = GridConfig::default();
        config.fraction_forbidden = 1.5;
        assert_eq!(
            random_cells(&config, &mut rng),
            Err(GridError::InvalidFraction(1.5))
        );

        config.fraction_forbidden = f64::NAN;
        assert!(random_cells(&config, &mut rng).is_err());

        let huge = GridConfig::new(u32::MAX, 2);
        assert_eq!(
            random_cells(&huge, &mut rng),
            Err(GridError::TooManyCells {
                rows: u32::MAX,
                columns: 2
            })
        );
    }

    #[test]
    fn fixed_cells_reject_duplicate_positions() {
        let position = Coordinate::new(2, 2);
        let specs = [
            CellSpec::standard(position, -0.04),
            CellSpec::terminal(position, 1.0),
        ];
        assert_eq!(
            fixed_cells(&specs),
            Err(GridError::DuplicatePosition(position))
        );
    }

    #[test]
    fn layout_parameters_follow_the_cells() {
        let cells = fixed_cells(&canonical_4x3()).expect("canonical layout");
        let (rewards, fraction) = layout_parameters(&cells);
        assert_eq!(rewards, RewardTable::default());
        assert_eq!(forbidden_count(cells.len(), fraction), 1);

        let specs = [
            CellSpec::standard(Coordinate::new(0, 0), -0.5),
            CellSpec::terminal(Coordinate::new(1, 0), 10.0),
            CellSpec::terminal(Coordinate::new(2, 0), -3.0),
        ];
        let cells = fixed_cells(&specs).expect("distinct positions");
        let (rewards, fraction) = layout_parameters(&cells);
        assert_eq!(rewards.standard, -0.5);
        assert_eq!(rewards.goal, 10.0);
        assert_eq!(rewards.fail, -3.0);
        assert_eq!(fraction, 0.0);
    }

    #[test]
    fn canonical_layout_has_expected_special_cells() {
        let specs = canonical_4x3();
        assert_eq!(specs.len(), 12);
        let kind_at = |x, y| {
            specs
                .iter()
                .find(|spec| spec.position == Coordinate::new(x, y))
                .map(|spec| (spec.kind, spec.reward))
        };
        assert_eq!(kind_at(1, 1), Some((CellKind::Forbidden, 0.0)));
        assert_eq!(kind_at(3, 1), Some((CellKind::Terminal, -1.0)));
        assert_eq!(kind_at(3, 2), Some((CellKind::Terminal, 1.0)));
        assert_eq!(kind_at(0, 0), Some((CellKind::Standard, -0.04)));
    }
}
