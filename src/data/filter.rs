use serde::{Deserialize, Serialize};

use super::model::{FilteredSeries, Observation, PercentileBounds, Series};
use super::stats::quantile_sorted;

// ---------------------------------------------------------------------------
// Options & errors
// ---------------------------------------------------------------------------

/// Quantiles delimiting the kept range. Both ends are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub lower: f64,
    pub upper: f64,
}

impl Default for FilterOptions {
    fn default() -> Self {
        FilterOptions {
            lower: 0.025,
            upper: 0.975,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    #[error("cannot compute percentiles of an empty series")]
    EmptySeries,
    #[error("invalid quantile range [{lower}, {upper}]: need 0 <= lower <= upper <= 1")]
    InvalidQuantiles { lower: f64, upper: f64 },
}

// ---------------------------------------------------------------------------
// Percentile bounds
// ---------------------------------------------------------------------------

/// Compute the `[lower_q, upper_q]` quantiles of the series values.
pub fn percentile_bounds(
    series: &Series,
    lower_q: f64,
    upper_q: f64,
) -> Result<PercentileBounds, FilterError> {
    let in_unit = |q: f64| (0.0..=1.0).contains(&q);
    if !(in_unit(lower_q) && in_unit(upper_q) && lower_q <= upper_q) {
        return Err(FilterError::InvalidQuantiles {
            lower: lower_q,
            upper: upper_q,
        });
    }
    if series.is_empty() {
        return Err(FilterError::EmptySeries);
    }

    let mut sorted: Vec<f64> = series.values().collect();
    sorted.sort_by(|a, b| a.total_cmp(b));

    // Both calls succeed: `sorted` is non-empty and the quantiles were checked.
    let lower = quantile_sorted(&sorted, lower_q).ok_or(FilterError::EmptySeries)?;
    let upper = quantile_sorted(&sorted, upper_q).ok_or(FilterError::EmptySeries)?;

    Ok(PercentileBounds {
        lower_q,
        upper_q,
        lower,
        upper,
    })
}

// ---------------------------------------------------------------------------
// Outlier removal
// ---------------------------------------------------------------------------

/// Observations whose value lies inside `bounds`, in their original order.
pub fn retain_within(observations: &[Observation], bounds: &PercentileBounds) -> Vec<Observation> {
    observations
        .iter()
        .filter(|o| bounds.contains(o.value))
        .copied()
        .collect()
}

/// Drop every observation outside the configured percentile range.
///
/// Bounds are computed over the whole input series, then applied to it.
pub fn remove_outliers(
    series: &Series,
    options: &FilterOptions,
) -> Result<FilteredSeries, FilterError> {
    let bounds = percentile_bounds(series, options.lower, options.upper)?;
    let observations = retain_within(series.observations(), &bounds);
    let removed = series.len() - observations.len();

    log::info!(
        "Outlier filter kept {} of {} rows (p{} = {:.3}, p{} = {:.3})",
        observations.len(),
        series.len(),
        options.lower * 100.0,
        bounds.lower,
        options.upper * 100.0,
        bounds.upper
    );

    Ok(FilteredSeries {
        observations,
        bounds,
        removed,
    })
}
