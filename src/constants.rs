//! Constants for board parsing, pathfinding, and estimator defaults.
//!
//! Runtime knobs live in [`crate::estimator::EstimatorConfig`]; the values
//! here are the defaults it starts from.

// =============================================================================
// Board Geometry
// =============================================================================

/// Offsets to the four axis-aligned neighbours as `(row, col)` deltas.
/// Order: Up, Right, Down, Left
pub const DELTA: [(isize, isize); 4] = [
    (-1, 0), // Up (previous row)
    (0, 1),  // Right (next column)
    (1, 0),  // Down (next row)
    (0, -1), // Left (previous column)
];

/// Distance marker for cells the search never reached.
pub const UNREACHABLE: u32 = u32::MAX;

// =============================================================================
// Board Text Format
// =============================================================================

/// A walkable cell.
pub const OPEN: char = '.';

/// A walkable cell holding a coin.
pub const COIN: char = '*';

/// A wall (not walkable).
pub const WALL: char = '#';

// =============================================================================
// Tour Construction
// =============================================================================

/// Extra hops the deep nearest-neighbour looks ahead before committing.
pub const DEFAULT_LOOKAHEAD_DEPTH: usize = 1;

/// Deepest fixed lookahead accepted. Each level multiplies the per-pick work by K.
pub const MAX_LOOKAHEAD_DEPTH: usize = 4;

/// Candidates within this many moves of the nearest coin compete in the lookahead.
pub const DEFAULT_SLACK: u32 = 0;

// =============================================================================
// Monte Carlo Parameters
// =============================================================================

/// Default number of trials per estimation run.
pub const DEFAULT_TRIALS: usize = 10_000;

/// Trials per batch. The stopping rule is checked between batches.
pub const DEFAULT_BATCH_SIZE: usize = 256;

/// Trials handed to one rayon task. Fixed so results do not depend on the pool size.
pub const TRIALS_PER_TASK: usize = 16;

/// Two-sided 95% normal quantile.
pub const Z_95: f64 = 1.959_963_984_540_054;

/// Minimum trials before the confidence-interval stopping rule may fire.
pub const MIN_TRIALS_FOR_STOP: usize = 30;

/// Largest number of K-subsets [`crate::estimator::Estimator::enumerate`] will walk.
pub const MAX_ENUMERATED_SUBSETS: u64 = 1_000_000;

/// Memory ceiling for a universe distance table chosen by `CachePolicy::Auto`.
pub const UNIVERSE_CACHE_MAX_BYTES: usize = 256 << 20;
