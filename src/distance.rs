//! Pairwise coin distances.
//!
//! A [`DistanceMatrix`] covers exactly the coins a tour is built over.
//! It comes either from fresh BFS runs ([`DistanceMatrix::build`]) or from
//! slicing a table precomputed once for the whole universe
//! ([`CoinDistances::slice`]). [`DistanceSource`] picks between the two.

use log::debug;
use rayon::prelude::*;

use crate::bfs::distances_to;
use crate::board::Cell;
use crate::constants::UNIVERSE_CACHE_MAX_BYTES;
use crate::error::Result;
use crate::grid::GridGraph;

/// Symmetric K×K move-count table, flat row-major, zero diagonal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DistanceMatrix {
    coins: Vec<Cell>,
    dist: Vec<u32>,
}

impl DistanceMatrix {
    /// Run one BFS per coin and read off the distances to the others.
    ///
    /// The searches are independent and run on the rayon pool, each one
    /// writing its own row of the table. On disconnected coins the error
    /// names the earliest failing coin.
    pub fn build(graph: &GridGraph, coins: &[Cell]) -> Result<Self> {
        let k = coins.len();
        let mut dist = vec![0u32; k * k];
        if k > 0 {
            let rows: Vec<Result<()>> = dist
                .par_chunks_mut(k)
                .zip(coins.par_iter())
                .map(|(row, &c)| distances_to(graph, c, coins, row))
                .collect();
            // Report the first failing coin in order, not whichever thread lost.
            rows.into_iter().collect::<Result<()>>()?;
        }
        Ok(Self {
            coins: coins.to_vec(),
            dist,
        })
    }

    /// Wrap an already computed flat table.
    ///
    /// # Panics
    ///
    /// Panics if `dist` is not `coins.len()` squared.
    pub fn from_raw(coins: Vec<Cell>, dist: Vec<u32>) -> Self {
        assert_eq!(dist.len(), coins.len() * coins.len(), "distance table is not square");
        Self { coins, dist }
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> u32 {
        self.dist[i * self.coins.len() + j]
    }

    pub fn len(&self) -> usize {
        self.coins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }

    pub fn coins(&self) -> &[Cell] {
        &self.coins
    }

    pub fn coin(&self, i: usize) -> Cell {
        self.coins[i]
    }

    /// Sum of consecutive step distances along `order`. No return leg.
    pub fn tour_cost(&self, order: &[usize]) -> u64 {
        order
            .windows(2)
            .map(|w| self.get(w[0], w[1]) as u64)
            .sum()
    }
}

/// Coin-to-coin distances for the whole universe, computed once.
#[derive(Clone, Debug)]
pub struct CoinDistances {
    table: DistanceMatrix,
}

impl CoinDistances {
    pub fn build(graph: &GridGraph, coins: &[Cell]) -> Result<Self> {
        debug!("precomputing distances for {} coins", coins.len());
        Ok(Self {
            table: DistanceMatrix::build(graph, coins)?,
        })
    }

    /// Restrict to the coins at the given universe indices, in that order.
    pub fn slice(&self, indices: &[usize]) -> DistanceMatrix {
        let coins = indices.iter().map(|&i| self.table.coin(i)).collect();
        let mut dist = Vec::with_capacity(indices.len() * indices.len());
        for &i in indices {
            dist.extend(indices.iter().map(|&j| self.table.get(i, j)));
        }
        DistanceMatrix { coins, dist }
    }
}

/// Whether to precompute the universe table.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum CachePolicy {
    /// Precompute when the trials would run at least as many searches as
    /// the universe has coins, and the table fits the memory ceiling.
    #[default]
    Auto,
    /// Always precompute.
    Universe,
    /// Always run fresh BFS per trial.
    PerTrial,
}

impl CachePolicy {
    /// Decide for a universe of `universe` coins and `trials` subsets of `k`.
    pub fn precompute(self, universe: usize, k: usize, trials: usize) -> bool {
        match self {
            CachePolicy::Universe => true,
            CachePolicy::PerTrial => false,
            CachePolicy::Auto => universe <= trials.saturating_mul(k) && table_fits(universe),
        }
    }
}

/// Whether a `universe`² table stays under [`UNIVERSE_CACHE_MAX_BYTES`].
fn table_fits(universe: usize) -> bool {
    universe
        .checked_mul(universe)
        .and_then(|cells| cells.checked_mul(std::mem::size_of::<u32>()))
        .is_some_and(|bytes| bytes <= UNIVERSE_CACHE_MAX_BYTES)
}

/// Where per-trial distance matrices come from.
#[derive(Clone, Debug)]
pub enum DistanceSource {
    Precomputed(CoinDistances),
    OnDemand,
}

impl DistanceSource {
    pub fn new(
        graph: &GridGraph,
        universe: &[Cell],
        policy: CachePolicy,
        k: usize,
        trials: usize,
    ) -> Result<Self> {
        if policy.precompute(universe.len(), k, trials) {
            Ok(DistanceSource::Precomputed(CoinDistances::build(graph, universe)?))
        } else {
            Ok(DistanceSource::OnDemand)
        }
    }

    /// Distance matrix for the coins at `indices` of `universe`.
    pub fn matrix(
        &self,
        graph: &GridGraph,
        universe: &[Cell],
        indices: &[usize],
    ) -> Result<DistanceMatrix> {
        match self {
            DistanceSource::Precomputed(table) => Ok(table.slice(indices)),
            DistanceSource::OnDemand => {
                let coins: Vec<Cell> = indices.iter().map(|&i| universe[i]).collect();
                DistanceMatrix::build(graph, &coins)
            }
        }
    }
}
