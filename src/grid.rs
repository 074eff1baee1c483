//! Implicit 4-neighbour graph over the walkable cells of a board.
//!
//! Cells are addressed by their flat row-major index. Edges are never
//! stored: [`GridGraph::neighbors`] derives them from [`DELTA`] on demand.

use crate::board::{Board, Cell};
use crate::constants::DELTA;
use crate::error::{Error, Result};

/// Walkable-cell mask plus dimensions.
#[derive(Clone, Debug)]
pub struct GridGraph {
    rows: usize,
    cols: usize,
    open: Vec<bool>,
}

impl GridGraph {
    /// Build the graph for a board and check that every coin is walkable.
    pub fn new(board: &Board) -> Result<Self> {
        let graph = Self::from_parts(board.rows(), board.cols(), board.blocked_mask())?;
        for &coin in board.coins() {
            if !graph.is_open(coin) {
                return Err(Error::board(Some(coin), "coin is not on a walkable cell"));
            }
        }
        Ok(graph)
    }

    /// Build the graph from dimensions and a flat row-major wall mask.
    pub fn from_parts(rows: usize, cols: usize, blocked: &[bool]) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(Error::board(None, format!("grid must be non-empty, got {rows}x{cols}")));
        }
        if blocked.len() != rows * cols {
            return Err(Error::board(
                None,
                format!("wall mask has {} cells, expected {}", blocked.len(), rows * cols),
            ));
        }
        Ok(Self {
            rows,
            cols,
            open: blocked.iter().map(|&b| !b).collect(),
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Total number of cells, walkable or not.
    pub fn len(&self) -> usize {
        self.open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }

    #[inline]
    pub fn index(&self, cell: Cell) -> usize {
        cell.row * self.cols + cell.col
    }

    #[inline]
    pub fn cell(&self, index: usize) -> Cell {
        Cell::new(index / self.cols, index % self.cols)
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.row < self.rows && cell.col < self.cols
    }

    /// In bounds and not a wall.
    pub fn is_open(&self, cell: Cell) -> bool {
        self.in_bounds(cell) && self.open[self.index(cell)]
    }

    /// Walkable up/right/down/left neighbours of a cell index.
    pub fn neighbors(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        let row = (index / self.cols) as isize;
        let col = (index % self.cols) as isize;
        DELTA.iter().filter_map(move |&(dr, dc)| {
            let (r, c) = (row + dr, col + dc);
            if r < 0 || c < 0 || r >= self.rows as isize || c >= self.cols as isize {
                return None;
            }
            let n = r as usize * self.cols + c as usize;
            self.open[n].then_some(n)
        })
    }
}
