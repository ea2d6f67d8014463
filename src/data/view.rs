use std::collections::{HashMap, HashSet};

use thiserror::Error;

use super::model::{Dataset, Record, Value};

/// Column used to group and colour points.
pub const CATEGORY_COLUMN: &str = "species";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("column '{column}' not found in dataset")]
    ColumnNotFound { column: String },

    #[error("column '{column}' has no numeric values to filter on")]
    NotNumeric { column: String },
}

fn require_column(dataset: &Dataset, column: &str) -> Result<(), ViewError> {
    if dataset.has_column(column) {
        Ok(())
    } else {
        Err(ViewError::ColumnNotFound {
            column: column.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Selections
// ---------------------------------------------------------------------------

/// Inclusive integer bounds on one numeric column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSelection {
    pub column: String,
    pub low: i64,
    pub high: i64,
}

impl RangeSelection {
    /// The whole observed range of `column`.
    pub fn full(dataset: &Dataset, column: &str) -> Result<Self, ViewError> {
        let (min, max) = Self::observed(dataset, column)?;
        Ok(Self {
            column: column.to_string(),
            low: min,
            high: max,
        })
    }

    /// Clamp `low`/`high` to the observed range of `column`, swapping them
    /// if they arrive reversed.
    pub fn clamped(
        dataset: &Dataset,
        column: &str,
        low: i64,
        high: i64,
    ) -> Result<Self, ViewError> {
        let (min, max) = Self::observed(dataset, column)?;
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        Ok(Self {
            column: column.to_string(),
            low: low.clamp(min, max),
            high: high.clamp(min, max),
        })
    }

    /// Observed bounds truncated toward zero, like `int(series.min())`.
    pub fn observed(dataset: &Dataset, column: &str) -> Result<(i64, i64), ViewError> {
        require_column(dataset, column)?;
        let (min, max) = dataset
            .numeric_bounds
            .get(column)
            .ok_or_else(|| ViewError::NotNumeric {
                column: column.to_string(),
            })?;
        Ok((min.trunc() as i64, max.trunc() as i64))
    }
}

/// Columns drawn on the X and Y axes. They may be the same column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisSelection {
    pub x: String,
    pub y: String,
}

impl AxisSelection {
    pub fn new(x: impl Into<String>, y: impl Into<String>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
        }
    }

    /// Both axes on the first column, as a fresh select box would show.
    pub fn first_column(dataset: &Dataset) -> Option<Self> {
        dataset
            .column_names
            .first()
            .map(|c| Self::new(c.clone(), c.clone()))
    }
}

// ---------------------------------------------------------------------------
// PlotSpec – everything the renderer needs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum AxisScale {
    Numeric,
    /// Text column; coordinates are indices into these labels.
    Categorical(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlotAxis {
    pub label: String,
    pub scale: AxisScale,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlotPoint {
    /// Index of the source record in the dataset.
    pub row: usize,
    pub x: f64,
    pub y: f64,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlotSpec {
    pub title: String,
    pub x_axis: PlotAxis,
    pub y_axis: PlotAxis,
    /// Records passing the range filter, in dataset order.
    pub rows: Vec<usize>,
    /// One point per filtered record with both coordinates present.
    pub points: Vec<PlotPoint>,
    /// Set when points carry category labels.
    pub category_column: Option<String>,
}

impl PlotSpec {
    /// Distinct category labels in order of first appearance (legend order).
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.points
            .iter()
            .filter_map(|p| p.category.as_deref())
            .filter(|c| seen.insert(*c))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Filter `dataset` to the records whose `range_col` lies in `[low, high]`
/// and describe them as a scatter plot of `y_col` against `x_col`.
///
/// Record order is preserved and an empty result is valid. Cells in
/// `range_col` that are missing or non-numeric never match. With
/// `color_by_category` every point is labelled by its [`CATEGORY_COLUMN`]
/// value.
pub fn build(
    dataset: &Dataset,
    x_col: &str,
    y_col: &str,
    range_col: &str,
    low: i64,
    high: i64,
    color_by_category: bool,
) -> Result<PlotSpec, ViewError> {
    require_column(dataset, x_col)?;
    require_column(dataset, y_col)?;
    require_column(dataset, range_col)?;
    let category_column = if color_by_category {
        require_column(dataset, CATEGORY_COLUMN)?;
        Some(CATEGORY_COLUMN.to_string())
    } else {
        None
    };

    let x_coords = AxisCoordinates::new(dataset, x_col);
    let y_coords = AxisCoordinates::new(dataset, y_col);

    let in_range = |rec: &Record| {
        rec.get(range_col)
            .as_f64()
            .is_some_and(|v| v >= low as f64 && v <= high as f64)
    };

    let mut rows = Vec::new();
    let mut points = Vec::new();
    for (row, rec) in dataset.records.iter().enumerate() {
        if !in_range(rec) {
            continue;
        }
        rows.push(row);

        let (Some(x), Some(y)) = (x_coords.coordinate(rec), y_coords.coordinate(rec)) else {
            continue;
        };
        let category = category_column
            .as_deref()
            .map(|col| rec.get(col).to_string());
        points.push(PlotPoint {
            row,
            x,
            y,
            category,
        });
    }

    log::debug!(
        "{range_col} in [{low}, {high}]: {} of {} rows, {} points",
        rows.len(),
        dataset.len(),
        points.len()
    );

    Ok(PlotSpec {
        title: format!("{y_col} vs {x_col}"),
        x_axis: x_coords.into_axis(x_col),
        y_axis: y_coords.into_axis(y_col),
        rows,
        points,
        category_column,
    })
}

/// Convenience wrapper over [`build`] taking the selection types.
pub fn build_from(
    dataset: &Dataset,
    axes: &AxisSelection,
    range: &RangeSelection,
    color_by_category: bool,
) -> Result<PlotSpec, ViewError> {
    build(
        dataset,
        &axes.x,
        &axes.y,
        &range.column,
        range.low,
        range.high,
        color_by_category,
    )
}

/// Maps a column's cells to plot coordinates.
struct AxisCoordinates<'a> {
    column: &'a str,
    levels: Option<Vec<String>>,
    index: HashMap<String, usize>,
}

impl<'a> AxisCoordinates<'a> {
    fn new(dataset: &Dataset, column: &'a str) -> Self {
        let levels = dataset
            .is_categorical(column)
            .then(|| dataset.levels(column));
        let index = levels
            .iter()
            .flatten()
            .enumerate()
            .map(|(i, label)| (label.clone(), i))
            .collect();
        Self {
            column,
            levels,
            index,
        }
    }

    fn coordinate(&self, rec: &Record) -> Option<f64> {
        match (rec.get(self.column), &self.levels) {
            (Value::Null, _) => None,
            (Value::Number(v), None) => Some(*v).filter(|v| !v.is_nan()),
            (val, Some(_)) => self.index.get(&val.to_string()).map(|&i| i as f64),
            (Value::Text(_), None) => None,
        }
    }

    fn into_axis(self, label: &str) -> PlotAxis {
        PlotAxis {
            label: label.to_string(),
            scale: match self.levels {
                Some(levels) => AxisScale::Categorical(levels),
                None => AxisScale::Numeric,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn penguin(species: &str, bill: f64, mass: f64) -> Record {
        Record::from_iter([
            ("species", Value::Text(species.into())),
            ("bill_length_mm", Value::Number(bill)),
            ("body_mass_g", Value::Number(mass)),
        ])
    }

    fn dataset(records: Vec<Record>) -> Dataset {
        Dataset::from_records(
            vec![
                "species".into(),
                "bill_length_mm".into(),
                "body_mass_g".into(),
            ],
            records,
        )
    }

    fn three_rows() -> Dataset {
        dataset(vec![
            penguin("A", 35.0, 3500.0),
            penguin("B", 45.0, 4200.0),
            penguin("A", 50.0, 5000.0),
        ])
    }

    fn many_rows() -> Dataset {
        dataset(
            (0..40)
                .map(|i| {
                    let species = ["Adelie", "Gentoo", "Chinstrap"][i % 3];
                    penguin(species, 32.0 + (i as f64 * 0.7), 3000.0 + i as f64 * 50.0)
                })
                .collect(),
        )
    }

    #[test]
    fn keeps_rows_in_range_in_order() {
        let ds = three_rows();
        let spec = build(&ds, "bill_length_mm", "body_mass_g", "bill_length_mm", 35, 45, true)
            .unwrap();

        assert_eq!(spec.rows, vec![0, 1]);
        let xs: Vec<f64> = spec.points.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![35.0, 45.0]);
        assert_eq!(spec.title, "body_mass_g vs bill_length_mm");
        assert_eq!(spec.categories(), vec!["A", "B"]);
    }

    #[test]
    fn unknown_column_is_named() {
        let ds = three_rows();
        let err = build(&ds, "nonexistent_col", "body_mass_g", "bill_length_mm", 35, 50, false)
            .unwrap_err();
        assert_eq!(
            err,
            ViewError::ColumnNotFound {
                column: "nonexistent_col".into()
            }
        );
        assert!(err.to_string().contains("nonexistent_col"));
    }

    #[test]
    fn missing_category_column_fails_only_when_colouring() {
        let ds = Dataset::from_records(
            vec!["bill_length_mm".into()],
            vec![Record::from_iter([("bill_length_mm", Value::Number(40.0))])],
        );
        let err = build(&ds, "bill_length_mm", "bill_length_mm", "bill_length_mm", 0, 100, true)
            .unwrap_err();
        assert_eq!(
            err,
            ViewError::ColumnNotFound {
                column: CATEGORY_COLUMN.into()
            }
        );
        assert!(build(&ds, "bill_length_mm", "bill_length_mm", "bill_length_mm", 0, 100, false).is_ok());
    }

    #[test]
    fn every_point_lies_in_range() {
        let ds = many_rows();
        for (low, high) in [(32, 40), (38, 38), (40, 59), (20, 100)] {
            let spec = build(&ds, "body_mass_g", "species", "bill_length_mm", low, high, false)
                .unwrap();
            for p in &spec.points {
                let v = ds.records[p.row].get("bill_length_mm").as_f64().unwrap();
                assert!(v >= low as f64 && v <= high as f64, "{v} outside [{low}, {high}]");
            }
        }
    }

    #[test]
    fn result_grows_monotonically_as_range_widens() {
        let ds = many_rows();
        let mut previous = 0;
        for widen in 0..=15 {
            let spec = build(
                &ds,
                "bill_length_mm",
                "body_mass_g",
                "bill_length_mm",
                45 - widen,
                45 + widen,
                false,
            )
            .unwrap();
            assert!(spec.rows.len() >= previous);
            assert!(spec.rows.len() <= ds.len());
            previous = spec.rows.len();
        }
        assert_eq!(previous, ds.len());
    }

    #[test]
    fn build_is_idempotent() {
        let ds = many_rows();
        let a = build(&ds, "species", "body_mass_g", "bill_length_mm", 35, 50, true).unwrap();
        let b = build(&ds, "species", "body_mass_g", "bill_length_mm", 35, 50, true).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn no_labels_without_category_flag() {
        let ds = many_rows();
        let spec = build(&ds, "bill_length_mm", "body_mass_g", "bill_length_mm", 0, 100, false)
            .unwrap();
        assert!(spec.points.iter().all(|p| p.category.is_none()));
        assert!(spec.category_column.is_none());
        assert!(spec.categories().is_empty());
    }

    #[test]
    fn equal_bounds_match_exactly() {
        let ds = three_rows();
        let hit = build(&ds, "bill_length_mm", "body_mass_g", "bill_length_mm", 45, 45, false)
            .unwrap();
        assert_eq!(hit.rows, vec![1]);

        let miss = build(&ds, "bill_length_mm", "body_mass_g", "bill_length_mm", 40, 40, false)
            .unwrap();
        assert!(miss.is_empty());
        assert!(miss.rows.is_empty());
    }

    #[test]
    fn missing_cells_are_skipped() {
        let mut records = three_rows().records;
        records[1].fields.insert("body_mass_g".into(), Value::Null);
        records[2].fields.insert("bill_length_mm".into(), Value::Null);
        let ds = dataset(records);

        let spec = build(&ds, "bill_length_mm", "body_mass_g", "bill_length_mm", 0, 100, false)
            .unwrap();
        // Row 2 has no range value; row 1 is in range but has no y.
        assert_eq!(spec.rows, vec![0, 1]);
        assert_eq!(spec.points.len(), 1);
        assert_eq!(spec.points[0].row, 0);
    }

    #[test]
    fn text_axis_is_categorical() {
        let ds = three_rows();
        let spec = build(&ds, "species", "body_mass_g", "bill_length_mm", 0, 100, false).unwrap();
        assert_eq!(
            spec.x_axis.scale,
            AxisScale::Categorical(vec!["A".into(), "B".into()])
        );
        assert_eq!(spec.y_axis.scale, AxisScale::Numeric);
        let xs: Vec<f64> = spec.points.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn range_selection_clamps_to_observed_bounds() {
        let ds = dataset(vec![penguin("A", 32.1, 1.0), penguin("B", 59.6, 2.0)]);

        let full = RangeSelection::full(&ds, "bill_length_mm").unwrap();
        assert_eq!((full.low, full.high), (32, 59));

        let clamped = RangeSelection::clamped(&ds, "bill_length_mm", 10, 100).unwrap();
        assert_eq!((clamped.low, clamped.high), (32, 59));

        let swapped = RangeSelection::clamped(&ds, "bill_length_mm", 50, 40).unwrap();
        assert_eq!((swapped.low, swapped.high), (40, 50));
    }

    #[test]
    fn range_selection_needs_numeric_column() {
        let ds = three_rows();
        assert_eq!(
            RangeSelection::full(&ds, "species"),
            Err(ViewError::NotNumeric {
                column: "species".into()
            })
        );
        assert!(matches!(
            RangeSelection::full(&ds, "flipper_length_mm"),
            Err(ViewError::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn build_from_matches_build() {
        let ds = many_rows();
        let axes = AxisSelection::first_column(&ds).unwrap();
        assert_eq!(axes, AxisSelection::new("species", "species"));
        let range = RangeSelection::full(&ds, "bill_length_mm").unwrap();
        assert_eq!(
            build_from(&ds, &axes, &range, true).unwrap(),
            build(&ds, "species", "species", "bill_length_mm", range.low, range.high, true)
                .unwrap()
        );
    }
}
