//! Streaming sample statistics.

/// Count, sum and sum of squares of the samples seen so far.
///
/// Partials from different workers combine with [`RunningStats::merge`].
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct RunningStats {
    pub count: u64,
    pub sum: f64,
    pub sum_sq: f64,
}

impl RunningStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push(&mut self, x: f64) {
        self.count += 1;
        self.sum += x;
        self.sum_sq += x * x;
    }

    pub fn merge(&mut self, other: &RunningStats) {
        self.count += other.count;
        self.sum += other.sum;
        self.sum_sq += other.sum_sq;
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    /// Unbiased sample variance. Zero below two samples.
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            return 0.0;
        }
        let n = self.count as f64;
        ((self.sum_sq - self.sum * self.sum / n) / (n - 1.0)).max(0.0)
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Standard error of the mean.
    pub fn std_error(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.std_dev() / (self.count as f64).sqrt()
        }
    }

    /// Normal-approximation interval `mean ± z * std_error`.
    pub fn confidence_interval(&self, z: f64) -> (f64, f64) {
        let mean = self.mean();
        let half = z * self.std_error();
        (mean - half, mean + half)
    }
}

impl FromIterator<f64> for RunningStats {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut stats = Self::new();
        for x in iter {
            stats.push(x);
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_mean_and_variance() {
        let stats: RunningStats = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0].into_iter().collect();
        assert_eq!(stats.count, 8);
        assert!(approx(stats.mean(), 5.0));
        // Sum of squared deviations is 32.
        assert!(approx(stats.variance(), 32.0 / 7.0));
        assert!(approx(stats.std_error(), (32.0f64 / 7.0 / 8.0).sqrt()));
    }

    #[test]
    fn test_merge_equals_single_pass() {
        let xs = [1.0, 6.0, 3.0, 8.0, 2.0, 9.0, 4.0];
        let whole: RunningStats = xs.iter().copied().collect();
        let mut left: RunningStats = xs[..3].iter().copied().collect();
        let right: RunningStats = xs[3..].iter().copied().collect();
        left.merge(&right);
        assert_eq!(left.count, whole.count);
        assert!(approx(left.mean(), whole.mean()));
        assert!(approx(left.variance(), whole.variance()));
    }

    #[test]
    fn test_degenerate_cases() {
        let empty = RunningStats::new();
        assert_eq!(empty.mean(), 0.0);
        assert_eq!(empty.std_error(), 0.0);

        let one: RunningStats = [3.0].into_iter().collect();
        assert_eq!(one.variance(), 0.0);
        assert_eq!(one.confidence_interval(1.96), (3.0, 3.0));

        let constant: RunningStats = [6.0; 50].into_iter().collect();
        assert_eq!(constant.variance(), 0.0);
    }
}
