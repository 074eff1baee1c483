//! Deep nearest-neighbour tour construction.
//!
//! Plain nearest neighbour walks to the closest unvisited coin. The deep
//! variant first collects every unvisited coin within `slack` moves of the
//! closest one, then scores each candidate by looking further ahead
//! ([`lookahead_score`]) and commits to the lowest score. Remaining ties go
//! to the lowest `(row, col)`, so tours are reproducible.
//!
//! The tour is open: its cost is the sum of the K-1 steps, with no return to
//! the start.

use crate::board::Cell;
use crate::constants::{DEFAULT_LOOKAHEAD_DEPTH, DEFAULT_SLACK, MAX_LOOKAHEAD_DEPTH};
use crate::distance::DistanceMatrix;
use crate::error::{Error, Result};

/// How far past a candidate the scoring looks.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Lookahead {
    /// Best path of this many further hops from the candidate. `Hops(0)` is
    /// plain nearest neighbour.
    Hops(usize),
    /// Cost of completing the whole tour greedily from the candidate.
    Rollout,
}

impl Default for Lookahead {
    fn default() -> Self {
        Lookahead::Hops(DEFAULT_LOOKAHEAD_DEPTH)
    }
}

/// Tour construction parameters.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TourConfig {
    /// Coins up to this many moves farther than the nearest also compete.
    pub slack: u32,
    pub lookahead: Lookahead,
}

impl Default for TourConfig {
    fn default() -> Self {
        Self {
            slack: DEFAULT_SLACK,
            lookahead: Lookahead::default(),
        }
    }
}

impl TourConfig {
    /// Plain nearest neighbour: no slack, no lookahead.
    pub const fn plain() -> Self {
        Self {
            slack: 0,
            lookahead: Lookahead::Hops(0),
        }
    }

    pub fn with_slack(mut self, slack: u32) -> Self {
        self.slack = slack;
        self
    }

    pub fn with_lookahead(mut self, lookahead: Lookahead) -> Self {
        self.lookahead = lookahead;
        self
    }

    /// Reject fixed lookaheads deeper than [`MAX_LOOKAHEAD_DEPTH`].
    ///
    /// Scoring one candidate at depth `d` walks O(K^d) continuations.
    pub fn validate(&self) -> Result<()> {
        match self.lookahead {
            Lookahead::Hops(depth) if depth > MAX_LOOKAHEAD_DEPTH => Err(Error::config(format!(
                "lookahead depth {depth} exceeds {MAX_LOOKAHEAD_DEPTH}"
            ))),
            _ => Ok(()),
        }
    }
}

/// A visiting order over the coins of a [`DistanceMatrix`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tour {
    /// Matrix indices, starting with the start coin.
    pub order: Vec<usize>,
    /// Total moves, no return leg.
    pub cost: u64,
}

impl Tour {
    pub fn start(&self) -> usize {
        self.order[0]
    }

    pub fn cells(&self, matrix: &DistanceMatrix) -> Vec<Cell> {
        self.order.iter().map(|&i| matrix.coin(i)).collect()
    }
}

/// Score stepping from `from` to `candidate` with the given lookahead.
///
/// `remaining` lists the unvisited coins and must contain `candidate`.
/// With nothing left after the candidate the score is the step alone.
pub fn lookahead_score(
    matrix: &DistanceMatrix,
    from: usize,
    candidate: usize,
    remaining: &[usize],
    lookahead: Lookahead,
) -> u64 {
    let mut taken = vec![false; matrix.len()];
    score_with(matrix, from, candidate, remaining, lookahead, &mut taken)
}

fn score_with(
    matrix: &DistanceMatrix,
    from: usize,
    candidate: usize,
    remaining: &[usize],
    lookahead: Lookahead,
    taken: &mut [bool],
) -> u64 {
    let step = matrix.get(from, candidate) as u64;
    taken[candidate] = true;
    let rest = match lookahead {
        Lookahead::Hops(0) => 0,
        Lookahead::Hops(depth) => best_continuation(matrix, candidate, remaining, depth, taken),
        Lookahead::Rollout => greedy_completion(matrix, candidate, remaining, taken),
    };
    taken[candidate] = false;
    step + rest
}

/// Cheapest path of up to `depth` hops from `from` over untaken coins.
fn best_continuation(
    matrix: &DistanceMatrix,
    from: usize,
    remaining: &[usize],
    depth: usize,
    taken: &mut [bool],
) -> u64 {
    let mut best: Option<u64> = None;
    for &n in remaining {
        if taken[n] {
            continue;
        }
        let mut cost = matrix.get(from, n) as u64;
        if depth > 1 {
            taken[n] = true;
            cost += best_continuation(matrix, n, remaining, depth - 1, taken);
            taken[n] = false;
        }
        best = Some(best.map_or(cost, |b| b.min(cost)));
    }
    best.unwrap_or(0)
}

/// Plain nearest-neighbour completion cost from `from` over untaken coins.
/// Leaves `taken` as it found it.
fn greedy_completion(
    matrix: &DistanceMatrix,
    from: usize,
    remaining: &[usize],
    taken: &mut [bool],
) -> u64 {
    let mut visited = Vec::new();
    let mut current = from;
    let mut total = 0u64;
    loop {
        let next = remaining
            .iter()
            .copied()
            .filter(|&n| !taken[n])
            .min_by_key(|&n| (matrix.get(current, n), matrix.coin(n)));
        let Some(n) = next else { break };
        total += matrix.get(current, n) as u64;
        taken[n] = true;
        visited.push(n);
        current = n;
    }
    for n in visited {
        taken[n] = false;
    }
    total
}

/// Choose the next coin from `current` among `remaining`.
///
/// # Panics
///
/// Panics if `remaining` is empty.
pub fn pick_next(
    matrix: &DistanceMatrix,
    current: usize,
    remaining: &[usize],
    config: &TourConfig,
) -> usize {
    let mut taken = vec![false; matrix.len()];
    pick_with(matrix, current, remaining, config, &mut taken)
}

fn pick_with(
    matrix: &DistanceMatrix,
    current: usize,
    remaining: &[usize],
    config: &TourConfig,
    taken: &mut [bool],
) -> usize {
    let nearest = remaining
        .iter()
        .map(|&n| matrix.get(current, n))
        .min()
        .expect("pick_next needs at least one unvisited coin");
    let limit = nearest.saturating_add(config.slack);

    remaining
        .iter()
        .copied()
        .filter(|&n| matrix.get(current, n) <= limit)
        .min_by_key(|&n| {
            let score = score_with(matrix, current, n, remaining, config.lookahead, taken);
            (score, matrix.coin(n))
        })
        .expect("the nearest coin is always a candidate")
}

/// Build a tour over every coin of `matrix`, starting at `start`.
///
/// # Panics
///
/// Panics if `start` is not a matrix index.
pub fn build_tour(matrix: &DistanceMatrix, start: usize, config: &TourConfig) -> Tour {
    assert!(start < matrix.len(), "start {start} outside a {}-coin matrix", matrix.len());
    let mut remaining: Vec<usize> = (0..matrix.len()).filter(|&i| i != start).collect();
    let mut order = Vec::with_capacity(matrix.len());
    let mut taken = vec![false; matrix.len()];
    let mut current = start;
    let mut cost = 0u64;
    order.push(start);

    while !remaining.is_empty() {
        let next = pick_with(matrix, current, &remaining, config, &mut taken);
        cost += matrix.get(current, next) as u64;
        // Candidate order is irrelevant: ties are broken by coordinate.
        if let Some(pos) = remaining.iter().position(|&n| n == next) {
            remaining.swap_remove(pos);
        }
        order.push(next);
        current = next;
    }

    Tour { order, cost }
}

/// Plain nearest-neighbour tour.
pub fn nearest_neighbor_tour(matrix: &DistanceMatrix, start: usize) -> Tour {
    build_tour(matrix, start, &TourConfig::plain())
}

/// Heuristic start coin.
///
/// Takes the endpoints of the globally shortest edges and returns the one
/// whose nearest other coin (ignoring its edge partner) is farthest away:
/// starting there leaves the isolated coin behind at the beginning rather
/// than stranding it at the end.
pub fn promising_start(matrix: &DistanceMatrix) -> usize {
    let k = matrix.len();
    let mut shortest = u32::MAX;
    let mut edges = Vec::new();
    for a in 0..k {
        for b in a + 1..k {
            let d = matrix.get(a, b);
            if d < shortest {
                shortest = d;
                edges.clear();
                edges.push((a, b));
            } else if d == shortest {
                edges.push((a, b));
            }
        }
    }
    let Some(&(first, _)) = edges.first() else {
        return 0;
    };

    let mut best = first;
    let mut best_cost = 0u32;
    for &(a, b) in &edges {
        for coin in [a, b] {
            let cost = (0..k)
                .filter(|&n| n != a && n != b)
                .map(|n| matrix.get(coin, n))
                .min()
                .unwrap_or(u32::MAX);
            if cost > best_cost {
                best_cost = cost;
                best = coin;
            }
        }
    }
    best
}
