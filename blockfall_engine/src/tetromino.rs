/*!
The static piece catalog: the seven tetrominoes, their canonical shapes and display colors.
*/

use std::fmt;

#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Tetromino {
    I,
    J,
    L,
    O,
    S,
    T,
    Z,
}

/// Color token stored in a board cell once a piece has locked there.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TileColor {
    Cyan,
    Blue,
    Orange,
    Yellow,
    Green,
    Purple,
    Red,
}

/// A single rotation state of a piece: a rectangular matrix of occupied/unoccupied cells.
///
/// Invariant: at least one row, and every row has the same non-zero length.
#[derive(Eq, PartialEq, Clone, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Shape {
    rows: Vec<Vec<bool>>,
}

impl Tetromino {
    pub const ALL: [Tetromino; 7] = [
        Tetromino::I,
        Tetromino::J,
        Tetromino::L,
        Tetromino::O,
        Tetromino::S,
        Tetromino::T,
        Tetromino::Z,
    ];

    #[rustfmt::skip]
    const fn layout(&self) -> &'static [&'static [u8]] {
        match self {
            Tetromino::I => &[&[1, 1, 1, 1]],                // ⠤⠤
            Tetromino::J => &[&[1, 1, 1], &[0, 0, 1]],       // ⠒⠆
            Tetromino::L => &[&[1, 1, 1], &[1, 0, 0]],       // ⠖⠂
            Tetromino::O => &[&[1, 1], &[1, 1]],             // ⠶
            Tetromino::S => &[&[0, 1, 1], &[1, 1, 0]],       // ⠴⠂
            Tetromino::T => &[&[1, 1, 1], &[0, 1, 0]],       // ⠲⠂
            Tetromino::Z => &[&[1, 1, 0], &[0, 1, 1]],       // ⠲⠄
        }
    }

    /// The canonical (spawn) orientation of this piece type.
    pub fn shape(&self) -> Shape {
        Shape::from_rows(self.layout())
    }

    pub const fn color(&self) -> TileColor {
        match self {
            Tetromino::I => TileColor::Cyan,
            Tetromino::J => TileColor::Blue,
            Tetromino::L => TileColor::Orange,
            Tetromino::O => TileColor::Yellow,
            Tetromino::S => TileColor::Green,
            Tetromino::T => TileColor::Purple,
            Tetromino::Z => TileColor::Red,
        }
    }
}

impl TryFrom<usize> for Tetromino {
    type Error = ();

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Tetromino::ALL.get(value).copied().ok_or(())
    }
}

impl fmt::Display for Tetromino {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl TileColor {
    pub const fn name(&self) -> &'static str {
        match self {
            TileColor::Cyan => "cyan",
            TileColor::Blue => "blue",
            TileColor::Orange => "orange",
            TileColor::Yellow => "yellow",
            TileColor::Green => "green",
            TileColor::Purple => "purple",
            TileColor::Red => "red",
        }
    }
}

impl fmt::Display for TileColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Shape {
    /// Builds a shape from rows of `0`/`1` values.
    ///
    /// # Panics
    ///
    /// If `rows` is empty or not rectangular.
    pub fn from_rows(rows: &[&[u8]]) -> Self {
        let width = rows.first().map_or(0, |row| row.len());
        assert!(width > 0, "shape must have at least one cell");
        assert!(
            rows.iter().all(|row| row.len() == width),
            "shape rows must all have the same length"
        );
        Self {
            rows: rows
                .iter()
                .map(|row| row.iter().map(|&cell| cell != 0).collect())
                .collect(),
        }
    }

    pub fn width(&self) -> usize {
        self.rows[0].len()
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn is_filled(&self, x: usize, y: usize) -> bool {
        self.rows
            .get(y)
            .and_then(|row| row.get(x))
            .copied()
            .unwrap_or(false)
    }

    /// All occupied cells as `(x, y)` offsets from the shape's top-left corner.
    pub fn filled(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows.iter().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .filter_map(move |(x, &filled)| filled.then_some((x, y)))
        })
    }

    /// Quarter turn to the right: row `i` of the result is column `i` read bottom-to-top.
    pub fn rotated_clockwise(&self) -> Self {
        let (w, h) = (self.width(), self.height());
        Self {
            rows: (0..w)
                .map(|i| (0..h).map(|j| self.rows[h - 1 - j][i]).collect())
                .collect(),
        }
    }

    /// Quarter turn to the left: row `i` of the result is column `w-1-i` read top-to-bottom.
    pub fn rotated_counterclockwise(&self) -> Self {
        let (w, h) = (self.width(), self.height());
        Self {
            rows: (0..w)
                .map(|i| (0..h).map(|j| self.rows[j][w - 1 - i]).collect())
                .collect(),
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            let line: String = row.iter().map(|&c| if c { '#' } else { '.' }).collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_seven_four_cell_pieces() {
        for tetromino in Tetromino::ALL {
            assert_eq!(tetromino.shape().filled().count(), 4, "{tetromino}");
        }
        assert_eq!(Tetromino::ALL.len(), 7);
    }

    #[test]
    fn catalog_colors_match_pieces() {
        assert_eq!(Tetromino::I.color().name(), "cyan");
        assert_eq!(Tetromino::O.color(), TileColor::Yellow);
        assert_eq!(Tetromino::T.color().to_string(), "purple");
        assert_eq!(Tetromino::Z.color(), TileColor::Red);
    }

    #[test]
    fn index_conversion() {
        assert_eq!(Tetromino::try_from(0), Ok(Tetromino::I));
        assert_eq!(Tetromino::try_from(6), Ok(Tetromino::Z));
        assert_eq!(Tetromino::try_from(7), Err(()));
    }

    #[test]
    fn clockwise_rotation_swaps_dimensions() {
        let t = Tetromino::T.shape();
        let rotated = t.rotated_clockwise();
        assert_eq!((rotated.width(), rotated.height()), (2, 3));
        assert_eq!(rotated, Shape::from_rows(&[&[0, 1], &[1, 1], &[0, 1]]));
    }

    #[test]
    fn counterclockwise_rotation() {
        let j = Tetromino::J.shape();
        assert_eq!(
            j.rotated_counterclockwise(),
            Shape::from_rows(&[&[1, 1], &[1, 0], &[1, 0]])
        );
        let i = Tetromino::I.shape().rotated_counterclockwise();
        assert_eq!((i.width(), i.height()), (1, 4));
    }

    #[test]
    fn rotations_are_inverse() {
        for tetromino in Tetromino::ALL {
            let shape = tetromino.shape();
            assert_eq!(shape.rotated_clockwise().rotated_counterclockwise(), shape);
            assert_eq!(shape.rotated_counterclockwise().rotated_clockwise(), shape);
            let full_turn = (0..4).fold(shape.clone(), |s, _| s.rotated_clockwise());
            assert_eq!(full_turn, shape);
        }
    }

    #[test]
    fn filled_cells_in_row_major_order() {
        let s = Tetromino::S.shape();
        assert_eq!(s.filled().collect::<Vec<_>>(), vec![(1, 0), (2, 0), (0, 1), (1, 1)]);
        assert!(!s.is_filled(0, 0));
        assert!(!s.is_filled(5, 5));
    }

    #[test]
    #[should_panic]
    fn ragged_shape_is_rejected() {
        let _ = Shape::from_rows(&[&[1, 1], &[1]]);
    }
}
