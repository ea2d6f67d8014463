use eframe::egui::{self, Ui};

use crate::data::model::Dataset;
use crate::data::view::{CATEGORY_COLUMN, RangeSelection};
use crate::state::AppState;
use crate::ui::{capitalize, plot};

pub fn home_tab(ui: &mut Ui) {
    ui.heading("Home");
    ui.label("Welcome to the home tab.");
}

pub fn about_tab(ui: &mut Ui) {
    ui.heading("About this App");
    ui.label(format!(
        "{} {}: pick two columns and a range on a numeric column to explore \
         the dataset as a scatter plot.",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
    ));
}

// ---------------------------------------------------------------------------
// Data tab – selection widgets and the plot
// ---------------------------------------------------------------------------

pub fn data_tab(ui: &mut Ui, state: &mut AppState) {
    state.ensure_default_dataset();

    ui.heading("Penguins Dataset Interactive Plot");

    let Some(dataset) = state.dataset.clone() else {
        ui.label("No dataset loaded. Use File → Open… to pick one.");
        return;
    };
    let columns = &dataset.column_names;

    // ---- Axis selectors, side by side ----
    let axes = state.axes.clone();
    ui.columns(2, |cols| {
        cols[0].label("Select X-axis variable");
        let current = axes.as_ref().map(|a| &a.x);
        if let Some(col) = column_combo(&mut cols[0], "x_axis", columns, current) {
            state.set_x_axis(col);
        }
        cols[1].label("Select Y-axis variable");
        let current = axes.as_ref().map(|a| &a.y);
        if let Some(col) = column_combo(&mut cols[1], "y_axis", columns, current) {
            state.set_y_axis(col);
        }
    });
    ui.add_space(4.0);

    // ---- Range filter ----
    if let Some(range) = state.range.clone() {
        let numeric: Vec<String> = dataset
            .numeric_columns()
            .into_iter()
            .map(String::from)
            .collect();
        ui.horizontal(|ui: &mut Ui| {
            ui.label("Filter column");
            if let Some(col) = column_combo(ui, "range_column", &numeric, Some(&range.column)) {
                state.set_range_column(&col);
            }
        });

        if let Some(range) = state.range.clone() {
            range_sliders(ui, state, &dataset, range);
        }
    }

    let mut color = state.color_by_category;
    let label = format!("Color by {}", capitalize(CATEGORY_COLUMN));
    if ui.checkbox(&mut color, label).changed() {
        state.set_color_by_category(color);
    }
    ui.separator();

    plot::scatter_plot(ui, state);
}

/// Returns the newly picked column, if the selection changed.
fn column_combo(
    ui: &mut Ui,
    id: &str,
    columns: &[String],
    current: Option<&String>,
) -> Option<String> {
    let current = current.cloned().unwrap_or_default();
    let mut picked = None;
    egui::ComboBox::from_id_salt(id)
        .selected_text(&current)
        .width(ui.available_width())
        .show_ui(ui, |ui: &mut Ui| {
            for col in columns {
                if ui.selectable_label(current == *col, col).clicked() && current != *col {
                    picked = Some(col.clone());
                }
            }
        });
    picked
}

fn range_sliders(
    ui: &mut Ui,
    state: &mut AppState,
    dataset: &Dataset,
    range: RangeSelection,
) {
    let Ok((min, max)) = RangeSelection::observed(dataset, &range.column) else {
        return;
    };
    let (mut low, mut high) = (range.low, range.high);

    ui.label(format!("Select {} Range", range.column));
    let low_changed = ui
        .add(egui::Slider::new(&mut low, min..=max).text("low"))
        .changed();
    let high_changed = ui
        .add(egui::Slider::new(&mut high, min..=max).text("high"))
        .changed();

    if low_changed || high_changed {
        // Dragging one handle past the other pushes it along.
        if low > high {
            if low_changed {
                high = low;
            } else {
                low = high;
            }
        }
        state.set_range(low, high);
    }
}
