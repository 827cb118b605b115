use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Month, NaiveDate};
use serde::{Deserialize, Serialize};

/// Calendar months in calendar order. Indexed by `NaiveDate::month0()`.
pub const MONTHS: [Month; 12] = [
    Month::January,
    Month::February,
    Month::March,
    Month::April,
    Month::May,
    Month::June,
    Month::July,
    Month::August,
    Month::September,
    Month::October,
    Month::November,
    Month::December,
];

/// Three-letter month label (`Jan`, `Feb`, ...).
pub fn month_abbrev(month: Month) -> &'static str {
    &month.name()[..3]
}

// ---------------------------------------------------------------------------
// Observation – one row of the input table
// ---------------------------------------------------------------------------

/// A single daily measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Observation { date, value }
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month(&self) -> Month {
        MONTHS[self.date.month0() as usize]
    }
}

// ---------------------------------------------------------------------------
// Duplicate handling
// ---------------------------------------------------------------------------

/// What to do when the input contains the same date more than once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Abort the load.
    #[default]
    Reject,
    /// Keep the row that appears first in the file.
    KeepFirst,
    /// Keep the row that appears last in the file.
    KeepLast,
}

impl FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reject" => Ok(DuplicatePolicy::Reject),
            "keep-first" => Ok(DuplicatePolicy::KeepFirst),
            "keep-last" => Ok(DuplicatePolicy::KeepLast),
            other => Err(format!(
                "unknown duplicate policy '{other}' (expected reject, keep-first or keep-last)"
            )),
        }
    }
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DuplicatePolicy::Reject => "reject",
            DuplicatePolicy::KeepFirst => "keep-first",
            DuplicatePolicy::KeepLast => "keep-last",
        };
        f.write_str(s)
    }
}

/// Raised by [`Series::from_observations`] under [`DuplicatePolicy::Reject`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("date {0} appears more than once")]
pub struct DuplicateDate(pub NaiveDate);

// ---------------------------------------------------------------------------
// Series – the loaded dataset
// ---------------------------------------------------------------------------

/// Observations sorted ascending by date, one per date.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    observations: Vec<Observation>,
}

impl Series {
    /// Sort by date and enforce date uniqueness according to `policy`.
    ///
    /// The sort is stable, so "first" and "last" refer to input order.
    pub fn from_observations(
        mut observations: Vec<Observation>,
        policy: DuplicatePolicy,
    ) -> Result<Self, DuplicateDate> {
        observations.sort_by_key(|o| o.date);
        let before = observations.len();

        match policy {
            DuplicatePolicy::Reject => {
                if let Some(pair) = observations.windows(2).find(|w| w[0].date == w[1].date) {
                    return Err(DuplicateDate(pair[0].date));
                }
            }
            DuplicatePolicy::KeepFirst => observations.dedup_by_key(|o| o.date),
            DuplicatePolicy::KeepLast => {
                let mut kept: Vec<Observation> = Vec::with_capacity(observations.len());
                for obs in observations {
                    match kept.last_mut() {
                        Some(last) if last.date == obs.date => *last = obs,
                        _ => kept.push(obs),
                    }
                }
                observations = kept;
            }
        }

        let dropped = before - observations.len();
        if dropped > 0 {
            log::warn!("Dropped {dropped} duplicate-date rows ({policy})");
        }
        Ok(Series { observations })
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.observations.iter().map(|o| o.value)
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// First and last date, if any.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.observations.first()?.date, self.observations.last()?.date))
    }
}

// ---------------------------------------------------------------------------
// FilteredSeries – the outlier-free view every chart reads
// ---------------------------------------------------------------------------

/// Closed value interval derived from two quantiles of a series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentileBounds {
    pub lower_q: f64,
    pub upper_q: f64,
    pub lower: f64,
    pub upper: f64,
}

impl PercentileBounds {
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

/// Subsequence of a [`Series`] whose values fall inside [`PercentileBounds`].
///
/// Only `data::filter` builds these; every chart takes one by shared reference.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredSeries {
    pub(super) observations: Vec<Observation>,
    pub(super) bounds: PercentileBounds,
    pub(super) removed: usize,
}

impl FilteredSeries {
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.observations.iter().map(|o| o.value)
    }

    pub fn bounds(&self) -> PercentileBounds {
        self.bounds
    }

    /// Number of rows of the source series outside the bounds.
    pub fn removed(&self) -> usize {
        self.removed
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.observations.first()?.date, self.observations.last()?.date))
    }
}

// ---------------------------------------------------------------------------
// Derived projections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct MeanCell {
    sum: f64,
    count: usize,
}

/// Mean value per (year, month). Absent cells had no observations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthlyAverageTable {
    // keyed by (year, month0) so iteration is years ascending, January first
    cells: BTreeMap<(i32, u32), MeanCell>,
}

impl MonthlyAverageTable {
    pub(super) fn add(&mut self, obs: &Observation) {
        let cell = self.cells.entry((obs.year(), obs.date.month0())).or_default();
        cell.sum += obs.value;
        cell.count += 1;
    }

    /// Distinct years, ascending.
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.cells.keys().map(|(y, _)| *y).collect();
        years.dedup();
        years
    }

    pub fn get(&self, year: i32, month: Month) -> Option<f64> {
        self.cells
            .get(&(year, month.number_from_month() - 1))
            .map(|c| c.sum / c.count as f64)
    }

    pub fn count(&self, year: i32, month: Month) -> usize {
        self.cells
            .get(&(year, month.number_from_month() - 1))
            .map_or(0, |c| c.count)
    }

    /// The twelve month slots of `year`, January first.
    pub fn months_for(&self, year: i32) -> [Option<f64>; 12] {
        MONTHS.map(|m| self.get(year, m))
    }

    /// `(year, month, mean)` in year then calendar-month order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, Month, f64)> + '_ {
        self.cells
            .iter()
            .map(|(&(y, m0), c)| (y, MONTHS[m0 as usize], c.sum / c.count as f64))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// All values of one calendar year.
#[derive(Debug, Clone, PartialEq)]
pub struct YearGroup {
    pub year: i32,
    pub values: Vec<f64>,
}

impl YearGroup {
    pub fn label(&self) -> String {
        self.year.to_string()
    }
}

/// All values of one calendar month, across years.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthGroup {
    pub month: Month,
    pub values: Vec<f64>,
}

impl MonthGroup {
    pub fn label(&self) -> &'static str {
        month_abbrev(self.month)
    }
}
