//! Coinwalk: expected steps to collect K random coins on a grid.
//!
//! A player moves up, down, left or right on a board with walls and must
//! collect a random subset of K coins, starting on one of them and not
//! returning. Exact tours are intractable, so each sampled subset is toured
//! with a deep nearest-neighbour heuristic and the costs are averaged by
//! Monte Carlo sampling.
//!
//! ## Modules
//!
//! - [`constants`] - Board characters and estimator defaults
//! - [`board`] - Board description and text format
//! - [`grid`] - Implicit 4-neighbour grid graph
//! - [`bfs`] - Breadth-first shortest paths
//! - [`distance`] - Pairwise coin distance matrices
//! - [`tour`] - Deep nearest-neighbour tour construction
//! - [`stats`] - Streaming mean and variance
//! - [`estimator`] - Monte Carlo estimation
//!
//! ## Example
//!
//! ```
//! use coinwalk::board::Board;
//! use coinwalk::estimator::{EstimatorConfig, estimate};
//!
//! let board = Board::parse("*..*\n.#..\n*..*\n").unwrap();
//! let config = EstimatorConfig::new(2).with_trials(500).with_seed(42);
//! let result = estimate(&board, config).unwrap();
//! println!("expected steps: {result}");
//! ```

pub mod bfs;
pub mod board;
pub mod constants;
pub mod distance;
pub mod error;
pub mod estimator;
pub mod grid;
pub mod stats;
pub mod tour;

pub use error::{Error, Result};
