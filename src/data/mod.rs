/// Data layer: dataset schema, loading, filtering, aggregation, export.
///
/// Architecture:
/// ```text
///   dataset.json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse + validate → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  date range / region / category / segment → indices
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  KPIs, trend, group-by, join with daily metrics
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export   │  filtered rows → csv / json / parquet
///   └──────────┘
/// ```

pub mod aggregate;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;

#[cfg(test)]
pub mod testing;
