//! Per-chart projections of the filtered series.
//!
//! Every function takes the filtered series by shared reference and builds a
//! fresh value; nothing here writes back into the series.

use std::collections::BTreeMap;

use chrono::Datelike;

use super::model::{FilteredSeries, MonthGroup, MonthlyAverageTable, YearGroup, MONTHS};

/// `[x, y]` points for the line chart. `x` is the day number counted from
/// 0001-01-01 (`Datelike::num_days_from_ce`), `y` the value.
pub fn line_points(filtered: &FilteredSeries) -> Vec<[f64; 2]> {
    filtered
        .observations()
        .iter()
        .map(|o| [o.date.num_days_from_ce() as f64, o.value])
        .collect()
}

/// Mean value per (year, month).
pub fn monthly_averages(filtered: &FilteredSeries) -> MonthlyAverageTable {
    let mut table = MonthlyAverageTable::default();
    for obs in filtered.observations() {
        table.add(obs);
    }
    log::debug!("Monthly average table has {} cells", table.len());
    table
}

/// Values grouped by calendar year, years ascending.
pub fn group_by_year(filtered: &FilteredSeries) -> Vec<YearGroup> {
    let mut groups: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    for obs in filtered.observations() {
        groups.entry(obs.year()).or_default().push(obs.value);
    }
    groups
        .into_iter()
        .map(|(year, values)| YearGroup { year, values })
        .collect()
}

/// Values grouped by calendar month across all years, January first.
/// Months without observations are omitted.
pub fn group_by_month(filtered: &FilteredSeries) -> Vec<MonthGroup> {
    let mut buckets: [Vec<f64>; 12] = Default::default();
    for obs in filtered.observations() {
        buckets[obs.date.month0() as usize].push(obs.value);
    }
    MONTHS
        .into_iter()
        .zip(buckets)
        .filter(|(_, values)| !values.is_empty())
        .map(|(month, values)| MonthGroup { month, values })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{Month, NaiveDate};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;
    use crate::data::filter::{remove_outliers, FilterOptions};
    use crate::data::model::{DuplicatePolicy, Observation, Series};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    /// Keep everything so the expected values are easy to compute by hand.
    fn keep_all(rows: Vec<Observation>) -> FilteredSeries {
        let series = Series::from_observations(rows, DuplicatePolicy::Reject).unwrap();
        remove_outliers(&series, &FilterOptions { lower: 0.0, upper: 1.0 }).unwrap()
    }

    fn sample() -> FilteredSeries {
        keep_all(vec![
            Observation::new(d(2017, 4, 2), 40.0),
            Observation::new(d(2016, 12, 31), 10.0),
            Observation::new(d(2017, 1, 15), 20.0),
            Observation::new(d(2017, 1, 16), 30.0),
            Observation::new(d(2016, 5, 9), 5.0),
            Observation::new(d(2017, 4, 1), 60.0),
        ])
    }

    #[test]
    fn line_points_follow_date_order() {
        let points = line_points(&sample());
        assert_eq!(points.len(), 6);
        assert_eq!(points[0][1], 5.0);
        assert!(points.windows(2).all(|w| w[0][0] < w[1][0]));
        assert_eq!(points[0][0], d(2016, 5, 9).num_days_from_ce() as f64);
    }

    #[test]
    fn monthly_means_per_year_and_month() {
        let table = monthly_averages(&sample());
        assert_eq!(table.years(), vec![2016, 2017]);
        assert_eq!(table.get(2017, Month::January), Some(25.0));
        assert_eq!(table.get(2017, Month::April), Some(50.0));
        assert_eq!(table.count(2017, Month::April), 2);
        assert_eq!(table.get(2016, Month::May), Some(5.0));
    }

    #[test]
    fn missing_months_are_absent_not_zero() {
        let table = monthly_averages(&sample());
        let slots = table.months_for(2016);
        assert_eq!(slots[4], Some(5.0));
        assert_eq!(slots[11], Some(10.0));
        assert_eq!(slots.iter().filter(|s| s.is_none()).count(), 10);
        assert_eq!(table.get(2016, Month::June), None);
        assert_eq!(table.count(2016, Month::June), 0);
    }

    #[test]
    fn table_iterates_years_then_calendar_months() {
        let order: Vec<(i32, Month)> = monthly_averages(&sample())
            .iter()
            .map(|(y, m, _)| (y, m))
            .collect();
        assert_eq!(
            order,
            vec![
                (2016, Month::May),
                (2016, Month::December),
                (2017, Month::January),
                (2017, Month::April),
            ]
        );
    }

    #[test]
    fn month_groups_are_calendar_ordered_not_alphabetical() {
        let labels: Vec<&str> = group_by_month(&sample()).iter().map(|g| g.label()).collect();
        // alphabetically "Apr" < "Dec" < "Jan" < "May"
        assert_eq!(labels, vec!["Jan", "Apr", "May", "Dec"]);
    }

    #[test]
    fn month_groups_keep_every_value() {
        let groups = group_by_month(&sample());
        let april = groups.iter().find(|g| g.month == Month::April).unwrap();
        assert_eq!(april.values, vec![60.0, 40.0]);
        let total: usize = groups.iter().map(|g| g.values.len()).sum();
        assert_eq!(total, 6);
    }

    #[test]
    fn year_groups_keep_every_value() {
        let groups = group_by_year(&sample());
        assert_eq!(
            groups,
            vec![
                YearGroup { year: 2016, values: vec![5.0, 10.0] },
                YearGroup { year: 2017, values: vec![20.0, 30.0, 60.0, 40.0] },
            ]
        );
        assert_eq!(groups[0].label(), "2016");
    }

    fn arb_rows() -> impl Strategy<Value = Vec<Observation>> {
        // distinct day offsets over roughly four years
        prop::collection::btree_map(0u64..1500, 0u32..150_000, 1..300).prop_map(|m| {
            m.into_iter()
                .map(|(offset, v)| {
                    Observation::new(d(2016, 5, 9) + chrono::Days::new(offset), f64::from(v))
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn yearly_sum_matches_sum_of_mean_times_count(rows in arb_rows()) {
            let filtered = keep_all(rows);
            let table = monthly_averages(&filtered);
            for year in table.years() {
                let from_table: f64 = MONTHS
                    .iter()
                    .filter_map(|&m| table.get(year, m).map(|mean| mean * table.count(year, m) as f64))
                    .sum();
                let direct: f64 = filtered
                    .observations()
                    .iter()
                    .filter(|o| o.year() == year)
                    .map(|o| o.value)
                    .sum();
                prop_assert!((from_table - direct).abs() <= 1e-6 * direct.max(1.0));
            }
        }

        #[test]
        fn year_groups_cover_each_distinct_year_once(rows in arb_rows()) {
            let filtered = keep_all(rows);
            let groups = group_by_year(&filtered);
            let years: Vec<i32> = groups.iter().map(|g| g.year).collect();
            let distinct: BTreeSet<i32> = filtered.observations().iter().map(|o| o.year()).collect();
            prop_assert_eq!(years, distinct.into_iter().collect::<Vec<_>>());
            let total: usize = groups.iter().map(|g| g.values.len()).sum();
            prop_assert_eq!(total, filtered.len());
        }

        #[test]
        fn month_groups_are_strictly_calendar_ordered(rows in arb_rows()) {
            let groups = group_by_month(&keep_all(rows));
            let numbers: Vec<u32> = groups.iter().map(|g| g.month.number_from_month()).collect();
            prop_assert!(numbers.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
