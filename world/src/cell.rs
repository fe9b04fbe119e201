//! Arena nodes that make up the grid graph.

use gridworld_core::{CellKind, Coordinate, Direction, DIRECTION_COUNT};

/// Index of a cell inside the grid arena.
///
/// Neighbour links are stored as identifiers rather than references so the
/// cyclic cell graph never owns itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(usize);

impl CellId {
    /// Identifier of the shared out-of-bounds sentinel.
    pub const OUT_OF_BOUNDS: CellId = CellId(usize::MAX);

    pub(crate) const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Position of the cell within [`crate::Grid::cells`].
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0
    }

    /// Reports whether the identifier names the out-of-bounds sentinel.
    #[must_use]
    pub const fn is_out_of_bounds(&self) -> bool {
        self.0 == usize::MAX
    }
}

/// Passive node of the grid graph.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    id: CellId,
    center: Option<Coordinate>,
    kind: CellKind,
    reward: f64,
    neighbors: [Option<CellId>; DIRECTION_COUNT],
}

impl Cell {
    pub(crate) const fn new(id: CellId, center: Coordinate, kind: CellKind, reward: f64) -> Self {
        Self {
            id,
            center: Some(center),
            kind,
            reward,
            neighbors: [None; DIRECTION_COUNT],
        }
    }

    /// Forbidden, reward-free cell returned for lookups outside the grid.
    pub(crate) const fn out_of_bounds() -> Self {
        Self {
            id: CellId::OUT_OF_BOUNDS,
            center: None,
            kind: CellKind::Forbidden,
            reward: 0.0,
            neighbors: [None; DIRECTION_COUNT],
        }
    }

    /// Arena identifier of the cell.
    #[must_use]
    pub const fn id(&self) -> CellId {
        self.id
    }

    /// Lattice position of the cell; `None` only for the sentinel.
    #[must_use]
    pub const fn center(&self) -> Option<Coordinate> {
        self.center
    }

    /// Kind assigned when the cell was created.
    #[must_use]
    pub const fn kind(&self) -> CellKind {
        self.kind
    }

    /// Reward collected when the agent occupies the cell.
    #[must_use]
    pub const fn reward(&self) -> f64 {
        self.reward
    }

    /// Neighbour wired in `direction`, if the graph has been built.
    ///
    /// Grid cells always return `Some` once constructed; the sentinel has no
    /// neighbours.
    #[must_use]
    pub const fn neighbor(&self, direction: Direction) -> Option<CellId> {
        self.neighbors[direction.index()]
    }

    pub(crate) fn set_neighbor(&mut self, direction: Direction, neighbor: CellId) {
        self.neighbors[direction.index()] = Some(neighbor);
    }

    pub(crate) fn set_center(&mut self, center: Coordinate) {
        self.center = Some(center);
    }
}
