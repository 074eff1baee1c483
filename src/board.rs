//! Board description: grid dimensions, walls and the coin universe.

use std::collections::HashSet;
use std::fmt;

use crate::constants::{COIN, OPEN, WALL};
use crate::error::{Error, Result};

/// A grid cell as `(row, col)`. Orders row-major.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}

/// A rectangular board with walls and coins.
///
/// The position of a coin in [`Board::coins`] is its universe index; the
/// estimator samples subsets of these indices.
#[derive(Clone, Debug)]
pub struct Board {
    rows: usize,
    cols: usize,
    blocked: Vec<bool>,
    coins: Vec<Cell>,
}

impl Board {
    /// Build a board from dimensions, wall cells and coin cells.
    ///
    /// Fails if the grid is empty, a wall or coin is out of bounds, a coin
    /// sits on a wall, or a coin is listed twice.
    pub fn new(rows: usize, cols: usize, blocked: &[Cell], coins: &[Cell]) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(Error::board(None, format!("grid must be non-empty, got {rows}x{cols}")));
        }
        let mut board = Self {
            rows,
            cols,
            blocked: vec![false; rows * cols],
            coins: Vec::with_capacity(coins.len()),
        };
        for &cell in blocked {
            if !board.in_bounds(cell) {
                return Err(Error::board(Some(cell), "wall outside the grid"));
            }
            let i = board.idx(cell);
            board.blocked[i] = true;
        }

        let mut seen = HashSet::with_capacity(coins.len());
        for &cell in coins {
            if !board.in_bounds(cell) {
                return Err(Error::board(Some(cell), "coin outside the grid"));
            }
            if board.is_blocked(cell) {
                return Err(Error::board(Some(cell), "coin on a wall"));
            }
            if !seen.insert(cell) {
                return Err(Error::board(Some(cell), "duplicate coin"));
            }
            board.coins.push(cell);
        }
        Ok(board)
    }

    /// Parse the text format: one line per row, `.` open, `*` coin, `#` wall.
    ///
    /// Blank lines and surrounding whitespace are ignored. Coins are numbered
    /// in row-major order.
    pub fn parse(text: &str) -> Result<Self> {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        let Some(first) = lines.first() else {
            return Err(Error::board(None, "board has no rows"));
        };
        let cols = first.chars().count();

        let mut blocked = Vec::new();
        let mut coins = Vec::new();
        for (row, line) in lines.iter().enumerate() {
            let width = line.chars().count();
            if width != cols {
                return Err(Error::board(
                    None,
                    format!("row {row} has {width} columns, expected {cols}"),
                ));
            }
            for (col, ch) in line.chars().enumerate() {
                match ch {
                    OPEN => {}
                    COIN => coins.push(Cell::new(row, col)),
                    WALL => blocked.push(Cell::new(row, col)),
                    other => {
                        return Err(Error::board(
                            Some(Cell::new(row, col)),
                            format!("unknown character {other:?}"),
                        ));
                    }
                }
            }
        }
        Self::new(lines.len(), cols, &blocked, &coins)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The coin universe, in universe-index order.
    pub fn coins(&self) -> &[Cell] {
        &self.coins
    }

    /// Walls as a flat row-major mask.
    pub fn blocked_mask(&self) -> &[bool] {
        &self.blocked
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.row < self.rows && cell.col < self.cols
    }

    pub fn is_blocked(&self, cell: Cell) -> bool {
        self.in_bounds(cell) && self.blocked[self.idx(cell)]
    }

    /// The same layout moved `dr` rows down and `dc` columns right inside a
    /// grid grown by the same amounts. The new margin is wall, so no path
    /// changes.
    pub fn translated(&self, dr: usize, dc: usize) -> Self {
        let shift = |c: &Cell| Cell::new(c.row + dr, c.col + dc);
        let rows = self.rows + dr;
        let cols = self.cols + dc;
        let mut blocked = vec![true; rows * cols];
        for row in 0..self.rows {
            for col in 0..self.cols {
                blocked[(row + dr) * cols + col + dc] = self.blocked[row * self.cols + col];
            }
        }
        Self {
            rows,
            cols,
            blocked,
            coins: self.coins.iter().map(shift).collect(),
        }
    }

    fn idx(&self, cell: Cell) -> usize {
        cell.row * self.cols + cell.col
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let coins: HashSet<Cell> = self.coins.iter().copied().collect();
        for row in 0..self.rows {
            for col in 0..self.cols {
                let cell = Cell::new(row, col);
                let ch = if self.is_blocked(cell) {
                    WALL
                } else if coins.contains(&cell) {
                    COIN
                } else {
                    OPEN
                };
                write!(f, "{ch}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let board = Board::parse("*.#\n..*\n").unwrap();
        assert_eq!(board.rows(), 2);
        assert_eq!(board.cols(), 3);
        assert_eq!(board.coins(), &[Cell::new(0, 0), Cell::new(1, 2)]);
        assert!(board.is_blocked(Cell::new(0, 2)));
        assert!(!board.is_blocked(Cell::new(1, 1)));
    }

    #[test]
    fn test_parse_display_roundtrip() {
        let text = "*..#\n.#*.\n*...\n";
        let board = Board::parse(text).unwrap();
        assert_eq!(board.to_string(), text);
    }

    #[test]
    fn test_parse_rejects_ragged_rows() {
        let err = Board::parse("...\n..\n").unwrap_err();
        assert!(matches!(err, Error::InvalidBoard { cell: None, .. }));
    }

    #[test]
    fn test_parse_rejects_unknown_char() {
        let err = Board::parse("..x\n").unwrap_err();
        assert_eq!(
            err,
            Error::InvalidBoard {
                cell: Some(Cell::new(0, 2)),
                reason: "unknown character 'x'".into()
            }
        );
    }

    #[test]
    fn test_coin_on_wall_rejected() {
        let err = Board::new(2, 2, &[Cell::new(1, 1)], &[Cell::new(1, 1)]).unwrap_err();
        assert!(matches!(err, Error::InvalidBoard { cell: Some(c), .. } if c == Cell::new(1, 1)));
    }

    #[test]
    fn test_coin_out_of_bounds_rejected() {
        let err = Board::new(2, 2, &[], &[Cell::new(0, 5)]).unwrap_err();
        assert!(matches!(err, Error::InvalidBoard { cell: Some(c), .. } if c == Cell::new(0, 5)));
    }

    #[test]
    fn test_duplicate_coin_rejected() {
        let err = Board::new(2, 2, &[], &[Cell::new(0, 1), Cell::new(0, 1)]).unwrap_err();
        assert!(matches!(err, Error::InvalidBoard { .. }));
    }

    #[test]
    fn test_translated_keeps_layout() {
        let board = Board::parse("*#\n.*\n").unwrap();
        let moved = board.translated(2, 3);
        assert_eq!(moved.rows(), 4);
        assert_eq!(moved.cols(), 5);
        assert_eq!(moved.coins(), &[Cell::new(2, 3), Cell::new(3, 4)]);
        assert!(moved.is_blocked(Cell::new(2, 4)));
        assert!(moved.is_blocked(Cell::new(0, 0)));
        assert!(!moved.is_blocked(Cell::new(3, 3)));
        // 16 margin cells plus the original wall.
        assert_eq!(moved.blocked_mask().iter().filter(|&&b| b).count(), 17);
    }

    #[test]
    fn test_cell_ordering_is_row_major() {
        assert!(Cell::new(0, 5) < Cell::new(1, 0));
        assert!(Cell::new(2, 0) < Cell::new(2, 1));
    }
}
