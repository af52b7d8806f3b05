use crate::{Shape, TileColor};

pub type Line = Vec<Option<TileColor>>;

/// The playing field: a fixed grid of locked cells, row `0` at the top.
///
/// Invariant: `lines.len() == rows` and every line has exactly `columns` cells.
#[derive(Eq, PartialEq, Clone, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Board {
    columns: usize,
    lines: Vec<Line>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ROWS, Self::DEFAULT_COLUMNS)
    }
}

impl Board {
    pub const DEFAULT_ROWS: usize = 20;
    pub const DEFAULT_COLUMNS: usize = 10;

    pub fn new(rows: usize, columns: usize) -> Self {
        assert!(rows > 0 && columns > 0, "board dimensions must be non-zero");
        Self {
            columns,
            lines: vec![vec![None; columns]; rows],
        }
    }

    pub fn rows(&self) -> usize {
        self.lines.len()
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Content of a cell, or `None` if empty or out of bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<TileColor> {
        self.lines.get(y).and_then(|line| line.get(x)).copied().flatten()
    }

    pub fn is_line_full(&self, y: usize) -> bool {
        self.lines
            .get(y)
            .is_some_and(|line| line.iter().all(Option::is_some))
    }

    /// Whether `shape` placed with its top-left corner at `(offset_x, offset_y)` leaves the grid
    /// or overlaps a locked cell. Unoccupied shape cells are never checked.
    pub fn collides(&self, shape: &Shape, offset_x: isize, offset_y: isize) -> bool {
        shape.filled().any(|(dx, dy)| {
            let x = offset_x + dx as isize;
            let y = offset_y + dy as isize;
            if x < 0 || y < 0 {
                return true;
            }
            let (x, y) = (x as usize, y as usize);
            x >= self.columns || y >= self.rows() || self.lines[y][x].is_some()
        })
    }

    /// Writes `color` into every cell covered by `shape`.
    ///
    /// The caller must have checked [`Board::collides`] first; merging an unvalidated position
    /// panics on out-of-bounds cells.
    pub fn merge(&mut self, shape: &Shape, offset_x: isize, offset_y: isize, color: TileColor) {
        debug_assert!(
            !self.collides(shape, offset_x, offset_y),
            "merging a shape at a position that was not validated"
        );
        for (dx, dy) in shape.filled() {
            let x = (offset_x + dx as isize) as usize;
            let y = (offset_y + dy as isize) as usize;
            self.lines[y][x] = Some(color);
        }
    }

    /// Removes every full line, shifting the lines above down, and returns how many were removed.
    pub fn clear_full_lines(&mut self) -> usize {
        let mut cleared = 0;
        let mut y = self.rows();
        while y > 0 {
            // Re-examine the same index after a removal: the line above has moved into it.
            if self.is_line_full(y - 1) {
                self.lines.remove(y - 1);
                self.lines.insert(0, vec![None; self.columns]);
                cleared += 1;
            } else {
                y -= 1;
            }
        }
        cleared
    }

    pub fn reset(&mut self) {
        for line in self.lines.iter_mut() {
            line.fill(None);
        }
    }
}
