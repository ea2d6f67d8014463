/// Data layer: core types, loading, caching and the filtered view.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset (typed cells)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  cache    │  load once per path, shared as Arc<Dataset>
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  view     │  range filter + axes → PlotSpec
///   └──────────┘
/// ```

pub mod cache;
pub mod loader;
pub mod model;
pub mod view;
