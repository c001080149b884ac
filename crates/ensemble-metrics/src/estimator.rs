/// Bound on the reservoir used for quantile-based statistics (IQR, MAD).
/// Large enough to keep sketch error negligible for the sample volumes an
/// ensemble run typically produces, small enough to keep memory O(1) in
/// practice. Older samples are evicted first-in-first-out once full.
const RESERVOIR_CAPACITY: usize = 1024;

/// Single-pass running statistics for one metric key: mean and variance via
/// Welford's algorithm, running min/max, and a bounded sample reservoir used
/// to derive IQR and MAD on demand.
#[derive(Debug, Default)]
pub(crate) struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
    reservoir: Vec<f64>,
    next_slot: usize,
}

impl RunningStats {
    pub(crate) fn update(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;

        if self.count == 1 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }

        if self.reservoir.len() < RESERVOIR_CAPACITY {
            self.reservoir.push(value);
        } else {
            self.reservoir[self.next_slot] = value;
            self.next_slot = (self.next_slot + 1) % RESERVOIR_CAPACITY;
        }
    }

    pub(crate) fn count(&self) -> u64 {
        self.count
    }

    pub(crate) fn mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }

    pub(crate) fn variance(&self) -> Option<f64> {
        (self.count > 1).then_some(self.m2 / (self.count - 1) as f64)
    }

    pub(crate) fn min(&self) -> Option<f64> {
        (self.count > 0).then_some(self.min)
    }

    pub(crate) fn max(&self) -> Option<f64> {
        (self.count > 0).then_some(self.max)
    }

    /// Interquartile range (Q3 - Q1) over the current reservoir.
    pub(crate) fn iqr(&self) -> Option<f64> {
        if self.reservoir.is_empty() {
            return None;
        }
        let mut sorted = self.reservoir.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let q1 = percentile(&sorted, 0.25);
        let q3 = percentile(&sorted, 0.75);
        Some(q3 - q1)
    }

    /// Median absolute deviation over the current reservoir.
    pub(crate) fn mad(&self) -> Option<f64> {
        if self.reservoir.is_empty() {
            return None;
        }
        let mut sorted = self.reservoir.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let median = percentile(&sorted, 0.5);
        let mut deviations: Vec<f64> = self.reservoir.iter().map(|v| (v - median).abs()).collect();
        deviations.sort_by(|a, b| a.partial_cmp(b).unwrap());
        Some(percentile(&deviations, 0.5))
    }
}

/// Linear-interpolation percentile over an already-sorted slice.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = rank - lo as f64;
        sorted[lo] * (1.0 - frac) + sorted[hi] * frac
    }
}
