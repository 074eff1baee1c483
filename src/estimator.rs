//! Monte Carlo estimation of the expected tour length.
//!
//! Each trial samples K coins uniformly without replacement, builds the
//! distance matrix for them, runs the deep nearest-neighbour tour from the
//! configured start and records its cost. Trials run in batches; the
//! stopping rule is checked between batches.
//!
//! Every trial owns a `fastrand::Rng` seeded from a master stream, and
//! per-task partials are merged in trial order. A run is therefore a pure
//! function of the seed: thread count does not change any subset, tour or
//! statistic.

use std::fmt;

use itertools::Itertools;
use log::{debug, info};
use rayon::prelude::*;

use crate::board::{Board, Cell};
use crate::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_TRIALS, MAX_ENUMERATED_SUBSETS, MIN_TRIALS_FOR_STOP,
    TRIALS_PER_TASK, Z_95,
};
use crate::distance::{CachePolicy, DistanceMatrix, DistanceSource};
use crate::error::{Error, Result};
use crate::grid::GridGraph;
use crate::stats::RunningStats;
use crate::tour::{Tour, TourConfig, build_tour, promising_start};

/// Which coin a trial's tour starts from.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum StartPolicy {
    /// One uniformly random coin of the subset.
    Random,
    /// Every coin is tried; the cheapest tour counts.
    #[default]
    Best,
    /// Every coin is tried; the mean cost counts.
    Mean,
    /// [`promising_start`].
    Heuristic,
}

/// Parameters of one estimation run.
#[derive(Clone, Debug)]
pub struct EstimatorConfig {
    /// Coins per sampled subset.
    pub k: usize,
    /// Upper bound on trials.
    pub trials: usize,
    /// Master seed. Drawn from entropy (and reported) when absent.
    pub seed: Option<u64>,
    pub start: StartPolicy,
    pub tour: TourConfig,
    /// Trials between stopping-rule checks.
    pub batch_size: usize,
    /// Stop once the confidence interval is narrower than this.
    pub target_ci_width: Option<f64>,
    /// Normal quantile for the confidence interval.
    pub z: f64,
    pub cache: CachePolicy,
    /// Spread trials over the rayon pool.
    pub parallel: bool,
}

impl EstimatorConfig {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            trials: DEFAULT_TRIALS,
            seed: None,
            start: StartPolicy::default(),
            tour: TourConfig::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            target_ci_width: None,
            z: Z_95,
            cache: CachePolicy::default(),
            parallel: true,
        }
    }

    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_start(mut self, start: StartPolicy) -> Self {
        self.start = start;
        self
    }

    pub fn with_tour(mut self, tour: TourConfig) -> Self {
        self.tour = tour;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_target_ci_width(mut self, width: f64) -> Self {
        self.target_ci_width = Some(width);
        self
    }

    pub fn with_z(mut self, z: f64) -> Self {
        self.z = z;
        self
    }

    pub fn with_cache(mut self, cache: CachePolicy) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Reject parameters no run could honour.
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(Error::config("k must be at least 1"));
        }
        if self.trials == 0 {
            return Err(Error::config("trials must be at least 1"));
        }
        if self.batch_size == 0 {
            return Err(Error::config("batch size must be at least 1"));
        }
        if !(self.z.is_finite() && self.z > 0.0) {
            return Err(Error::config(format!("z must be positive, got {}", self.z)));
        }
        if let Some(w) = self.target_ci_width {
            if !(w.is_finite() && w > 0.0) {
                return Err(Error::config(format!("target width must be positive, got {w}")));
            }
        }
        self.tour.validate()
    }
}

/// One sampled subset and what the tour made of it.
#[derive(Clone, Debug, PartialEq)]
pub struct TrialResult {
    /// Sampled coins in universe order.
    pub subset: Vec<Cell>,
    pub start: Cell,
    /// Visiting order. Under [`StartPolicy::Mean`] this is the cheapest of the tours tried.
    pub tour: Vec<Cell>,
    /// Steps counted for this trial.
    pub cost: f64,
}

/// Outcome of an estimation run.
#[derive(Clone, Debug)]
pub struct Estimate {
    /// Estimated expected number of steps.
    pub mean: f64,
    pub std_dev: f64,
    pub std_error: f64,
    pub confidence_interval: (f64, f64),
    pub z: f64,
    /// Trials actually executed.
    pub trials: usize,
    /// Master seed, `None` for enumeration.
    pub seed: Option<u64>,
    pub stopped_early: bool,
    /// Cheapest trial seen (first one on ties).
    pub best: Option<TrialResult>,
    /// Most expensive trial seen (first one on ties).
    pub worst: Option<TrialResult>,
}

impl Estimate {
    fn from_stats(stats: &RunningStats, z: f64, seed: Option<u64>, partial: Partial) -> Self {
        Self {
            mean: stats.mean(),
            std_dev: stats.std_dev(),
            std_error: stats.std_error(),
            confidence_interval: stats.confidence_interval(z),
            z,
            trials: stats.count as usize,
            seed,
            stopped_early: false,
            best: partial.best,
            worst: partial.worst,
        }
    }

    pub fn ci_width(&self) -> f64 {
        self.confidence_interval.1 - self.confidence_interval.0
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.confidence_interval.0 && value <= self.confidence_interval.1
    }
}

impl fmt::Display for Estimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.4} steps (std err {:.4}, CI [{:.4}, {:.4}] at z={:.2}, {} trials",
            self.mean,
            self.std_error,
            self.confidence_interval.0,
            self.confidence_interval.1,
            self.z,
            self.trials
        )?;
        if let Some(seed) = self.seed {
            write!(f, ", seed {seed}")?;
        }
        if self.stopped_early {
            write!(f, ", stopped early")?;
        }
        write!(f, ")")
    }
}

/// Statistics plus extreme trials for a contiguous run of trials.
#[derive(Default)]
struct Partial {
    stats: RunningStats,
    best: Option<TrialResult>,
    worst: Option<TrialResult>,
}

impl Partial {
    fn push(&mut self, trial: TrialResult) {
        self.stats.push(trial.cost);
        if self.best.as_ref().is_none_or(|b| trial.cost < b.cost) {
            self.best = Some(trial.clone());
        }
        if self.worst.as_ref().is_none_or(|w| trial.cost > w.cost) {
            self.worst = Some(trial);
        }
    }

    /// Append a partial covering later trials.
    fn merge(&mut self, later: Partial) {
        self.stats.merge(&later.stats);
        if let Some(b) = later.best {
            if self.best.as_ref().is_none_or(|cur| b.cost < cur.cost) {
                self.best = Some(b);
            }
        }
        if let Some(w) = later.worst {
            if self.worst.as_ref().is_none_or(|cur| w.cost > cur.cost) {
                self.worst = Some(w);
            }
        }
    }
}

/// A board prepared for repeated trials.
pub struct Estimator {
    graph: GridGraph,
    universe: Vec<Cell>,
    source: DistanceSource,
    config: EstimatorConfig,
}

impl Estimator {
    /// Validate the configuration, build the grid graph and resolve where
    /// distance matrices come from.
    pub fn new(board: &Board, config: EstimatorConfig) -> Result<Self> {
        config.validate()?;
        let graph = GridGraph::new(board)?;
        let universe = board.coins().to_vec();
        if universe.len() < config.k {
            return Err(Error::InsufficientCoins {
                available: universe.len(),
                requested: config.k,
            });
        }
        let source = DistanceSource::new(&graph, &universe, config.cache, config.k, config.trials)?;
        Ok(Self {
            graph,
            universe,
            source,
            config,
        })
    }

    /// Run a single trial with the given generator.
    pub fn run_trial(&self, rng: &mut fastrand::Rng) -> Result<TrialResult> {
        let indices = sample_subset(rng, self.universe.len(), self.config.k);
        self.evaluate(&indices, rng)
    }

    /// Run trials until the budget is spent or the stopping rule fires.
    pub fn run(&self) -> Result<Estimate> {
        let seed = self.config.seed.unwrap_or_else(|| fastrand::u64(..));
        let mut master = fastrand::Rng::with_seed(seed);
        let mut total = Partial::default();
        let mut done = 0;
        let mut stopped_early = false;

        while done < self.config.trials {
            let batch = self.config.batch_size.min(self.config.trials - done);
            let seeds: Vec<u64> = (0..batch).map(|_| master.u64(..)).collect();
            total.merge(self.run_seeds(&seeds)?);
            done += batch;

            let (lo, hi) = total.stats.confidence_interval(self.config.z);
            debug!(
                "{done} trials: mean {:.4}, ci width {:.4}",
                total.stats.mean(),
                hi - lo
            );
            if let Some(target) = self.config.target_ci_width {
                if done >= MIN_TRIALS_FOR_STOP && hi - lo < target {
                    info!("ci width {:.4} below target {target} after {done} trials", hi - lo);
                    stopped_early = done < self.config.trials;
                    break;
                }
            }
        }

        let stats = total.stats;
        let mut estimate = Estimate::from_stats(&stats, self.config.z, Some(seed), total);
        estimate.stopped_early = stopped_early;
        info!("estimate: {estimate}");
        Ok(estimate)
    }

    /// Average the tour cost over every K-subset of the universe.
    ///
    /// The result is the exact expectation of the heuristic, so the standard
    /// error is zero. Rejects [`StartPolicy::Random`] and universes with more
    /// than [`MAX_ENUMERATED_SUBSETS`] subsets.
    pub fn enumerate(&self) -> Result<Estimate> {
        if self.config.start == StartPolicy::Random {
            return Err(Error::config("random start cannot be enumerated"));
        }
        let n = self.universe.len();
        let k = self.config.k;
        let count = binomial(n, k).filter(|&c| c <= MAX_ENUMERATED_SUBSETS);
        let Some(count) = count else {
            return Err(Error::config(format!(
                "C({n}, {k}) exceeds {MAX_ENUMERATED_SUBSETS} subsets"
            )));
        };
        debug!("enumerating {count} subsets");

        let mut total = Partial::default();
        let mut combos = (0..n).combinations(k);
        loop {
            let batch: Vec<Vec<usize>> = combos.by_ref().take(self.config.batch_size).collect();
            if batch.is_empty() {
                break;
            }
            let eval = |indices: &Vec<usize>| self.evaluate(indices, &mut fastrand::Rng::with_seed(0));
            let trials: Vec<Result<TrialResult>> = if self.config.parallel {
                batch.par_iter().map(eval).collect()
            } else {
                batch.iter().map(eval).collect()
            };
            for trial in trials {
                total.push(trial?);
            }
        }

        let stats = total.stats;
        let mut estimate = Estimate::from_stats(&stats, self.config.z, None, total);
        estimate.std_error = 0.0;
        estimate.confidence_interval = (estimate.mean, estimate.mean);
        info!("exact expectation: {estimate}");
        Ok(estimate)
    }

    /// Run one trial per seed, in order, fanned out over tasks.
    fn run_seeds(&self, seeds: &[u64]) -> Result<Partial> {
        let task = |chunk: &[u64]| -> Result<Partial> {
            let mut partial = Partial::default();
            for &s in chunk {
                partial.push(self.run_trial(&mut fastrand::Rng::with_seed(s))?);
            }
            Ok(partial)
        };
        let partials: Vec<Result<Partial>> = if self.config.parallel {
            seeds.par_chunks(TRIALS_PER_TASK).map(task).collect()
        } else {
            seeds.chunks(TRIALS_PER_TASK).map(task).collect()
        };
        let mut merged = Partial::default();
        for p in partials {
            merged.merge(p?);
        }
        Ok(merged)
    }

    /// Build the matrix for one subset and tour it per the start policy.
    fn evaluate(&self, indices: &[usize], rng: &mut fastrand::Rng) -> Result<TrialResult> {
        let matrix = self.source.matrix(&self.graph, &self.universe, indices)?;
        let tour_cfg = &self.config.tour;
        let (tour, cost) = match self.config.start {
            StartPolicy::Random => {
                let tour = build_tour(&matrix, rng.usize(..matrix.len()), tour_cfg);
                let cost = tour.cost as f64;
                (tour, cost)
            }
            StartPolicy::Heuristic => {
                let tour = build_tour(&matrix, promising_start(&matrix), tour_cfg);
                let cost = tour.cost as f64;
                (tour, cost)
            }
            StartPolicy::Best => {
                let tour = all_starts(&matrix, tour_cfg).0;
                let cost = tour.cost as f64;
                (tour, cost)
            }
            StartPolicy::Mean => {
                let (tour, sum) = all_starts(&matrix, tour_cfg);
                (tour, sum as f64 / matrix.len() as f64)
            }
        };
        Ok(TrialResult {
            subset: matrix.coins().to_vec(),
            start: matrix.coin(tour.start()),
            tour: tour.cells(&matrix),
            cost,
        })
    }
}

/// Tour from every start. Returns the cheapest (first on ties) and the cost sum.
fn all_starts(matrix: &DistanceMatrix, config: &TourConfig) -> (Tour, u64) {
    let mut sum = 0;
    let mut best: Option<Tour> = None;
    for start in 0..matrix.len() {
        let tour = build_tour(matrix, start, config);
        sum += tour.cost;
        if best.as_ref().is_none_or(|b| tour.cost < b.cost) {
            best = Some(tour);
        }
    }
    (best.expect("subsets are never empty"), sum)
}

/// Uniform K-subset of `0..n` by partial Fisher-Yates, returned sorted.
pub fn sample_subset(rng: &mut fastrand::Rng, n: usize, k: usize) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..n).collect();
    for i in 0..k {
        let j = rng.usize(i..n);
        idx.swap(i, j);
    }
    idx.truncate(k);
    idx.sort_unstable();
    idx
}

/// `C(n, k)`, or `None` if it does not fit a `u64`.
pub fn binomial(n: usize, k: usize) -> Option<u64> {
    if k > n {
        return Some(0);
    }
    let k = k.min(n - k);
    let mut acc: u128 = 1;
    for i in 0..k {
        acc = acc.checked_mul((n - i) as u128)? / (i as u128 + 1);
    }
    u64::try_from(acc).ok()
}

/// Build an [`Estimator`] and run it.
pub fn estimate(board: &Board, config: EstimatorConfig) -> Result<Estimate> {
    Estimator::new(board, config)?.run()
}
