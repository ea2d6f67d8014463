use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use crate::color::ColorMap;
use crate::data::cache::DatasetCache;
use crate::data::model::Dataset;
use crate::data::view::{
    AxisSelection, CATEGORY_COLUMN, PlotSpec, RangeSelection, ViewError, build_from,
};

/// Dataset opened the first time the Data tab is shown.
pub const DEFAULT_DATASET_PATH: &str = "penguins.csv";

/// Preferred column for the range slider.
pub const DEFAULT_RANGE_COLUMN: &str = "bill_length_mm";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Home,
    Data,
    About,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
///
/// Every setter recomputes `view` from scratch through [`build_from`].
pub struct AppState {
    /// Loaded datasets, kept for the whole session.
    pub cache: DatasetCache,

    /// Dataset currently shown (None until something is loaded).
    pub dataset: Option<Arc<Dataset>>,

    /// Path the current dataset came from.
    pub source_path: Option<PathBuf>,

    pub tab: Tab,

    pub axes: Option<AxisSelection>,

    /// None when the dataset has no numeric column.
    pub range: Option<RangeSelection>,

    pub color_by_category: bool,

    /// Colours for the category column, when the dataset has one.
    pub color_map: Option<ColorMap>,

    /// Result of the last rebuild.
    pub view: Option<PlotSpec>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    default_load_attempted: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            cache: DatasetCache::new(),
            dataset: None,
            source_path: None,
            tab: Tab::default(),
            axes: None,
            range: None,
            color_by_category: true,
            color_map: None,
            view: None,
            status_message: None,
            default_load_attempted: false,
        }
    }
}

impl AppState {
    /// Load `path` through the cache and make it the current dataset.
    pub fn open_path(&mut self, path: &Path) -> Result<()> {
        let dataset = self.cache.get_or_load(path)?;
        self.source_path = Some(path.to_path_buf());
        self.set_dataset(dataset);
        Ok(())
    }

    /// Load [`DEFAULT_DATASET_PATH`] once, on first need.
    pub fn ensure_default_dataset(&mut self) {
        if self.dataset.is_some() || self.default_load_attempted {
            return;
        }
        self.default_load_attempted = true;
        if let Err(e) = self.open_path(Path::new(DEFAULT_DATASET_PATH)) {
            log::error!("Failed to load {DEFAULT_DATASET_PATH}: {e:#}");
            self.status_message = Some(format!("Error: {e:#}"));
        }
    }

    /// Ingest a dataset and reset every selection to its default.
    pub fn set_dataset(&mut self, dataset: Arc<Dataset>) {
        self.axes = AxisSelection::first_column(&dataset);
        self.range = default_range_column(&dataset)
            .and_then(|col| RangeSelection::full(&dataset, &col).ok());
        self.color_map = dataset
            .has_column(CATEGORY_COLUMN)
            .then(|| ColorMap::new(CATEGORY_COLUMN, &dataset.levels(CATEGORY_COLUMN)));
        self.dataset = Some(dataset);
        self.status_message = None;
        self.rebuild_view();
    }

    pub fn set_x_axis(&mut self, column: String) {
        if let Some(axes) = &mut self.axes {
            axes.x = column;
        }
        self.rebuild_view();
    }

    pub fn set_y_axis(&mut self, column: String) {
        if let Some(axes) = &mut self.axes {
            axes.y = column;
        }
        self.rebuild_view();
    }

    /// Switch the filtered column; the range resets to its full extent.
    pub fn set_range_column(&mut self, column: &str) {
        let Some(ds) = &self.dataset else { return };
        match RangeSelection::full(ds, column) {
            Ok(range) => {
                self.range = Some(range);
                self.rebuild_view();
            }
            Err(e) => self.report(&e),
        }
    }

    /// Set new bounds on the current range column, clamped to its extent.
    pub fn set_range(&mut self, low: i64, high: i64) {
        let (Some(ds), Some(range)) = (&self.dataset, &self.range) else {
            return;
        };
        match RangeSelection::clamped(ds, &range.column, low, high) {
            Ok(range) => {
                self.range = Some(range);
                self.rebuild_view();
            }
            Err(e) => self.report(&e),
        }
    }

    pub fn set_color_by_category(&mut self, enabled: bool) {
        self.color_by_category = enabled;
        self.rebuild_view();
    }

    /// Recompute `view` from the current selections.
    pub fn rebuild_view(&mut self) {
        let Some(ds) = &self.dataset else {
            self.view = None;
            return;
        };
        let (Some(axes), Some(range)) = (&self.axes, &self.range) else {
            self.view = None;
            self.status_message = Some("Dataset has no numeric column to filter on".into());
            return;
        };
        match build_from(ds, axes, range, self.color_by_category) {
            Ok(spec) => {
                self.view = Some(spec);
                self.status_message = None;
            }
            Err(e) => {
                self.view = None;
                self.report(&e);
            }
        }
    }

    /// Number of records passing the current range filter.
    pub fn visible_count(&self) -> usize {
        self.view.as_ref().map_or(0, |v| v.rows.len())
    }

    fn report(&mut self, e: &ViewError) {
        log::warn!("Cannot build view: {e}");
        self.status_message = Some(format!("Error: {e}"));
    }
}

/// `bill_length_mm` when present, otherwise the first numeric column.
pub fn default_range_column(dataset: &Dataset) -> Option<String> {
    if dataset.numeric_bounds.contains_key(DEFAULT_RANGE_COLUMN) {
        return Some(DEFAULT_RANGE_COLUMN.to_string());
    }
    dataset.numeric_columns().first().map(|c| c.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::load_csv;

    const PENGUINS: &str = "\
species,island,bill_length_mm,body_mass_g
Adelie,Torgersen,39.1,3750
Adelie,Torgersen,NA,NA
Gentoo,Biscoe,46.1,4500
Chinstrap,Dream,50.7,3700
Gentoo,Biscoe,59.6,6050
";

    fn loaded() -> AppState {
        let mut state = AppState::default();
        state.set_dataset(Arc::new(load_csv(PENGUINS.as_bytes()).unwrap()));
        state
    }

    #[test]
    fn new_dataset_resets_selections() {
        let state = loaded();
        assert_eq!(state.axes, Some(AxisSelection::new("species", "species")));
        let range = state.range.clone().unwrap();
        assert_eq!(range.column, "bill_length_mm");
        assert_eq!((range.low, range.high), (39, 59));
        assert!(state.color_by_category);
        assert!(state.color_map.is_some());
        // The NA row never matches; 59.6 sits above the truncated maximum.
        assert_eq!(state.visible_count(), 3);
        assert!(state.status_message.is_none());
    }

    #[test]
    fn narrowing_range_rebuilds_view() {
        let mut state = loaded();
        state.set_x_axis("bill_length_mm".into());
        state.set_y_axis("body_mass_g".into());
        state.set_range(40, 50);

        let view = state.view.as_ref().unwrap();
        assert_eq!(view.rows, vec![2]);
        assert_eq!(view.title, "body_mass_g vs bill_length_mm");
    }

    #[test]
    fn out_of_bounds_range_is_clamped() {
        let mut state = loaded();
        state.set_range(0, 1000);
        let range = state.range.as_ref().unwrap();
        assert_eq!((range.low, range.high), (39, 59));
    }

    #[test]
    fn unknown_axis_reports_column() {
        let mut state = loaded();
        state.set_x_axis("nonexistent_col".into());
        assert!(state.view.is_none());
        let msg = state.status_message.as_deref().unwrap();
        assert!(msg.contains("nonexistent_col"), "{msg}");

        state.set_x_axis("island".into());
        assert!(state.view.is_some());
        assert!(state.status_message.is_none());
    }

    #[test]
    fn toggling_category_drops_labels() {
        let mut state = loaded();
        state.set_color_by_category(false);
        let view = state.view.as_ref().unwrap();
        assert!(view.points.iter().all(|p| p.category.is_none()));
    }

    #[test]
    fn range_column_switch_resets_bounds() {
        let mut state = loaded();
        state.set_range_column("body_mass_g");
        let range = state.range.as_ref().unwrap();
        assert_eq!((range.low, range.high), (3700, 6050));

        state.set_range_column("island");
        assert!(state.status_message.as_deref().unwrap().contains("island"));
        assert_eq!(state.range.as_ref().unwrap().column, "body_mass_g");
    }

    #[test]
    fn range_column_falls_back_to_first_numeric() {
        let ds = load_csv("name,mass\nx,1\ny,2\n".as_bytes()).unwrap();
        assert_eq!(default_range_column(&ds).as_deref(), Some("mass"));
        let ds = load_csv("name\nx\n".as_bytes()).unwrap();
        assert_eq!(default_range_column(&ds), None);
    }
}
