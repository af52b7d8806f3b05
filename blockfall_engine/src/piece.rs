/*!
This module handles the falling [`ActivePiece`]: spawning, translation and rotation.

Every change is validated with [`Board::collides`] before it is committed; a rejected move or
rotation leaves the piece untouched. Rotation never adjusts the origin (no wall kicks).
*/

use crate::{Board, Shape, Tetromino, TileColor};

pub type Position = (isize, isize);

#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RotationDirection {
    Clockwise,
    Counterclockwise,
}

#[derive(Eq, PartialEq, Clone, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActivePiece {
    pub tetromino: Tetromino,
    pub shape: Shape,
    /// Top-left corner of `shape` in board coordinates.
    pub pos: Position,
}

impl ActivePiece {
    /// A fresh piece in its canonical orientation, horizontally centered on the top row.
    pub fn spawn(tetromino: Tetromino, board: &Board) -> Self {
        let shape = tetromino.shape();
        let x = (board.columns() / 2) as isize - (shape.width() / 2) as isize;
        Self {
            tetromino,
            shape,
            pos: (x, 0),
        }
    }

    pub fn color(&self) -> TileColor {
        self.tetromino.color()
    }

    pub fn fits(&self, board: &Board) -> bool {
        let (x, y) = self.pos;
        !board.collides(&self.shape, x, y)
    }

    pub fn fits_at(&self, board: &Board, (dx, dy): Position) -> bool {
        let (x, y) = self.pos;
        !board.collides(&self.shape, x + dx, y + dy)
    }

    /// Moves the piece by `(dx, dy)` if the target position is free.
    pub fn translate(&mut self, board: &Board, dx: isize, dy: isize) -> bool {
        if !self.fits_at(board, (dx, dy)) {
            return false;
        }
        self.pos = (self.pos.0 + dx, self.pos.1 + dy);
        true
    }

    pub fn rotate_clockwise(&mut self, board: &Board) -> bool {
        self.rotate(board, RotationDirection::Clockwise)
    }

    pub fn rotate_counterclockwise(&mut self, board: &Board) -> bool {
        self.rotate(board, RotationDirection::Counterclockwise)
    }

    /// Rotates in place around the unchanged origin, or returns `false` and keeps the old shape
    /// if the rotated shape would collide.
    pub fn rotate(&mut self, board: &Board, direction: RotationDirection) -> bool {
        let candidate = match direction {
            RotationDirection::Clockwise => self.shape.rotated_clockwise(),
            RotationDirection::Counterclockwise => self.shape.rotated_counterclockwise(),
        };
        let (x, y) = self.pos;
        if board.collides(&candidate, x, y) {
            return false;
        }
        self.shape = candidate;
        true
    }

    /// Absolute board cells covered by this piece, with its color.
    pub fn tiles(&self) -> impl Iterator<Item = ((isize, isize), TileColor)> + '_ {
        let (x, y) = self.pos;
        let color = self.color();
        self.shape
            .filled()
            .map(move |(dx, dy)| ((x + dx as isize, y + dy as isize), color))
    }

    pub fn lock_into(&self, board: &mut Board) {
        let (x, y) = self.pos;
        board.merge(&self.shape, x, y, self.color());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_is_centered_on_top_row() {
        let board = Board::default();
        assert_eq!(ActivePiece::spawn(Tetromino::O, &board).pos, (4, 0));
        assert_eq!(ActivePiece::spawn(Tetromino::I, &board).pos, (3, 0));
        assert_eq!(ActivePiece::spawn(Tetromino::T, &board).pos, (4, 0));
        let narrow = Board::new(20, 7);
        assert_eq!(ActivePiece::spawn(Tetromino::I, &narrow).pos, (1, 0));
    }

    #[test]
    fn o_piece_drops_to_floor_and_stops() {
        let board = Board::default();
        let mut piece = ActivePiece::spawn(Tetromino::O, &board);
        let moved = (0..19).filter(|_| piece.translate(&board, 0, 1)).count();
        assert_eq!(moved, 18);
        assert_eq!(piece.pos, (4, 18));
        assert!(!piece.translate(&board, 0, 1));
        assert_eq!(piece.pos, (4, 18));
    }

    #[test]
    fn translation_blocked_by_walls() {
        let board = Board::default();
        let mut piece = ActivePiece::spawn(Tetromino::I, &board);
        while piece.translate(&board, -1, 0) {}
        assert_eq!(piece.pos, (0, 0));
        while piece.translate(&board, 1, 0) {}
        assert_eq!(piece.pos, (6, 0));
    }

    #[test]
    fn rotation_is_rejected_near_wall() {
        let board = Board::default();
        // Vertical I against the right wall cannot turn flat without a kick.
        let mut piece = ActivePiece::spawn(Tetromino::I, &board);
        assert!(piece.rotate_clockwise(&board));
        while piece.translate(&board, 1, 0) {}
        assert_eq!(piece.pos, (9, 0));
        let before = piece.clone();
        assert!(!piece.rotate_counterclockwise(&board));
        assert_eq!(piece, before);
    }

    #[test]
    fn rotation_is_rejected_by_locked_cells() {
        let mut board = Board::default();
        board.merge(&Tetromino::O.shape(), 4, 2, TileColor::Yellow);
        let mut piece = ActivePiece::spawn(Tetromino::T, &board);
        let before = piece.clone();
        assert!(!piece.rotate_clockwise(&board));
        assert_eq!(piece, before);
        assert!(!piece.rotate_counterclockwise(&board));
        assert_eq!(piece, before);
    }

    #[test]
    fn rotation_round_trip_keeps_origin() {
        let board = Board::default();
        let mut piece = ActivePiece::spawn(Tetromino::L, &board);
        piece.translate(&board, 0, 5);
        let before = piece.clone();
        assert!(piece.rotate_clockwise(&board));
        assert_eq!(piece.pos, before.pos);
        assert!(piece.rotate_counterclockwise(&board));
        assert_eq!(piece, before);
    }

    #[test]
    fn lock_into_board() {
        let mut board = Board::default();
        let mut piece = ActivePiece::spawn(Tetromino::I, &board);
        while piece.translate(&board, 0, 1) {}
        piece.lock_into(&mut board);
        for x in 3..7 {
            assert_eq!(board.get(x, 19), Some(TileColor::Cyan));
        }
        let tiles: Vec<_> = piece.tiles().map(|(pos, _)| pos).collect();
        assert_eq!(tiles, vec![(3, 19), (4, 19), (5, 19), (6, 19)]);
    }
}
