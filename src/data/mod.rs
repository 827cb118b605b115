/// Data layer: core types, loading, outlier filtering and per-chart projections.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Series (ascending, unique dates)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  keep p2.5 ≤ value ≤ p97.5 → FilteredSeries
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  line points, monthly means, year / month groups
///   └───────────┘
/// ```

pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;
pub mod stats;
