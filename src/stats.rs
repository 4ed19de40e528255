use crate::engine::EpisodeMatrix;
use serde::{Deserialize, Serialize};

pub struct Accumulator {
    n_vals: usize,
    mean: f64,
    diff_2_sum: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccumulatorReport {
    pub mean: f64,
    pub std_dev: f64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self {
            n_vals: 0,
            mean: 0.0,
            diff_2_sum: 0.0,
        }
    }

    pub fn add(&mut self, val: f64) {
        self.n_vals += 1;

        let diff_a = val - self.mean;
        self.mean += diff_a / self.n_vals as f64;

        let diff_b = val - self.mean;
        self.diff_2_sum += diff_a * diff_b;
    }

    pub fn report(&self) -> AccumulatorReport {
        AccumulatorReport {
            mean: if self.n_vals > 0 { self.mean } else { f64::NAN },
            std_dev: if self.n_vals > 1 {
                (self.diff_2_sum / (self.n_vals as f64 - 1.0)).sqrt()
            } else {
                f64::NAN
            },
        }
    }
}

/// Median of `vals`, averaging the two middle values for even lengths.
pub fn median(vals: &[f64]) -> f64 {
    if vals.is_empty() {
        return f64::NAN;
    }
    let mut sorted = vals.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Epidemic duration of one episode: first day reaching the final count,
/// shifted by `offset`.
pub fn duration(row: &[usize], offset: usize) -> usize {
    let max = row.iter().copied().max().unwrap_or(0);
    let i_peak = row.iter().position(|&n| n == max).unwrap_or(0);
    i_peak + offset
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SampleReport {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
}

impl SampleReport {
    fn new(vals: &[f64]) -> Self {
        let mut acc = Accumulator::new();
        vals.iter().for_each(|&val| acc.add(val));
        let report = acc.report();
        Self {
            mean: report.mean,
            median: median(vals),
            std_dev: report.std_dev,
        }
    }
}

/// Summary statistics over all episodes of a run.
#[derive(Debug, Serialize, Deserialize)]
pub struct Summary {
    pub n_episodes: usize,
    /// Expected cumulative infections by the end of each day.
    pub expected_curve: Vec<f64>,
    /// Expected new infections on each day.
    ///
    /// Day 0 includes the seeded patient zero.
    pub expected_new: Vec<f64>,
    /// Epidemic duration in days.
    pub duration: SampleReport,
    /// Agents ever infected by the last day.
    pub final_count: SampleReport,
}

impl Summary {
    pub fn from_matrix(matrix: &EpisodeMatrix, duration_offset: usize) -> Self {
        let durations: Vec<_> = matrix
            .rows
            .iter()
            .map(|row| duration(row, duration_offset) as f64)
            .collect();
        let final_counts: Vec<_> = matrix
            .rows
            .iter()
            .filter_map(|row| row.last())
            .map(|&n| n as f64)
            .collect();

        let mut acc_vec = Vec::new();
        acc_vec.resize_with(matrix.n_days, Accumulator::new);
        for row in &matrix.rows {
            for (acc, &n) in acc_vec.iter_mut().zip(row) {
                acc.add(n as f64);
            }
        }
        let expected_curve: Vec<_> = acc_vec.iter().map(|acc| acc.report().mean).collect();

        let mut prev = 0.0;
        let expected_new = expected_curve
            .iter()
            .map(|&val| {
                let new = val - prev;
                prev = val;
                new
            })
            .collect();

        Self {
            n_episodes: matrix.n_episodes(),
            expected_curve,
            expected_new,
            duration: SampleReport::new(&durations),
            final_count: SampleReport::new(&final_counts),
        }
    }
}
