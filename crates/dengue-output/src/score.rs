//! Forecast scoring over the masked test weeks.

use crate::export::ForecastRow;
use serde::{Deserialize, Serialize};

/// Nominal miss rate of the 95% credible interval.
pub const INTERVAL_ALPHA: f64 = 0.05;

/// Accuracy of the forecasts for weeks whose response was held out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastScore {
    /// Number of scored rows.
    pub evaluated_rows: usize,

    /// Mean absolute error of the posterior mean.
    pub mae: f64,

    /// Share of actual values inside the credible interval.
    pub coverage: f64,

    /// Mean interval score at [`INTERVAL_ALPHA`].
    pub interval_score: f64,
}

impl ForecastScore {
    /// Score `(actual, forecast)` pairs. `None` when there is nothing to score.
    pub fn from_pairs<'a, I>(pairs: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, &'a ForecastRow)>,
    {
        let mut rows = 0usize;
        let mut abs_error = 0.0;
        let mut covered = 0usize;
        let mut interval = 0.0;

        for (actual, forecast) in pairs {
            rows += 1;
            abs_error += (actual - forecast.mean).abs();
            if forecast.covers(actual) {
                covered += 1;
            }
            interval += interval_score(
                actual,
                forecast.lower_bound,
                forecast.upper_bound,
                INTERVAL_ALPHA,
            );
        }

        if rows == 0 {
            return None;
        }
        let n = rows as f64;
        Some(Self {
            evaluated_rows: rows,
            mae: abs_error / n,
            coverage: covered as f64 / n,
            interval_score: interval / n,
        })
    }
}

/// Interval score of the central `(1 - alpha)` interval `[lower, upper]`.
///
/// Interval width plus `2 / alpha` times the distance by which `actual`
/// falls outside the interval.
pub fn interval_score(actual: f64, lower: f64, upper: f64, alpha: f64) -> f64 {
    let penalty = 2.0 / alpha;
    let below = if actual < lower { lower - actual } else { 0.0 };
    let above = if actual > upper { actual - upper } else { 0.0 };
    (upper - lower) + penalty * (below + above)
}

/// Continuous ranked probability score of a sample ensemble.
///
/// `E|X - y| - E|X - X'| / 2` over the empirical distribution of `samples`.
/// `None` for an empty ensemble.
pub fn crps_ensemble(observation: f64, samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let n = samples.len() as f64;
    let spread_to_obs = samples.iter().map(|x| (x - observation).abs()).sum::<f64>() / n;

    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    // sum over ordered pairs |x_i - x_j| of a sorted sample
    let pairwise: f64 = sorted
        .iter()
        .enumerate()
        .map(|(i, x)| (2.0 * i as f64 - n + 1.0) * x)
        .sum::<f64>()
        * 2.0;

    Some(spread_to_obs - pairwise / (2.0 * n * n))
}
