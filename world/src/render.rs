//! Plain-text picture of the grid.

use std::fmt;

use gridworld_core::{CellKind, Coordinate};

use crate::{Cell, Grid};

const CURRENT: char = '@';
const PREVIOUS: char = 'o';
const EMPTY: char = ' ';

impl<R> fmt::Display for Grid<R> {
    /// Draws one line per row with the highest `y` first.
    ///
    /// `#` marks forbidden cells, `+` and `-` terminals with positive and
    /// non-positive rewards, `.` standard cells, `@` the agent and `o` the
    /// cell it just left.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let centers: Vec<Coordinate> = self.cells().iter().filter_map(Cell::center).collect();
        let (Some(min_x), Some(max_x), Some(min_y), Some(max_y)) = (
            centers.iter().map(Coordinate::x).min(),
            centers.iter().map(Coordinate::x).max(),
            centers.iter().map(Coordinate::y).min(),
            centers.iter().map(Coordinate::y).max(),
        ) else {
            return Ok(());
        };

        let current = self.current_cell().map(Cell::id);
        let previous = self.previous_cell().map(Cell::id);
        for y in (min_y..=max_y).rev() {
            let mut line = String::new();
            for x in min_x..=max_x {
                let id = self.cell_at(Coordinate::new(x, y));
                let symbol = if id.is_out_of_bounds() {
                    EMPTY
                } else if Some(id) == current {
                    CURRENT
                } else if Some(id) == previous {
                    PREVIOUS
                } else {
                    cell_symbol(self.cell(id))
                };
                line.push(symbol);
            }
            writeln!(f, "{}", line.trim_end())?;
        }
        Ok(())
    }
}

fn cell_symbol(cell: &Cell) -> char {
    match cell.kind() {
        CellKind::Forbidden => '#',
        CellKind::Standard => '.',
        CellKind::Terminal if cell.reward() > 0.0 => '+',
        CellKind::Terminal => '-',
    }
}
