use eframe::egui::{Color32, Ui};
use egui_plot::{Legend, MarkerShape, Plot, Points};

use crate::color::ColorMap;
use crate::data::view::{AxisScale, PlotSpec};
use crate::state::AppState;
use crate::ui::capitalize;

const POINT_RADIUS: f32 = 3.0;

// ---------------------------------------------------------------------------
// Scatter plot (Data tab)
// ---------------------------------------------------------------------------

/// Render the current [`PlotSpec`], one series per category.
pub fn scatter_plot(ui: &mut Ui, state: &AppState) {
    let spec = match &state.view {
        Some(spec) => spec,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Nothing to plot");
            });
            return;
        }
    };

    ui.vertical_centered(|ui: &mut Ui| {
        ui.strong(&spec.title);
        if spec.is_empty() {
            ui.label("No rows in the selected range.");
        } else if let Some(title) = legend_title(spec, state.color_map.as_ref()) {
            ui.heading(title);
        }
    });

    let mut plot = Plot::new("scatter_plot")
        .legend(Legend::default())
        .x_axis_label(spec.x_axis.label.clone())
        .y_axis_label(spec.y_axis.label.clone())
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true);

    if let AxisScale::Categorical(levels) = &spec.x_axis.scale {
        let levels = levels.clone();
        plot = plot.x_axis_formatter(move |mark, _range| level_label(&levels, mark.value));
    }
    if let AxisScale::Categorical(levels) = &spec.y_axis.scale {
        let levels = levels.clone();
        plot = plot.y_axis_formatter(move |mark, _range| level_label(&levels, mark.value));
    }

    plot.show(ui, |plot_ui| {
        if spec.category_column.is_none() {
            plot_ui.points(styled(Points::new(series(spec, None))).color(Color32::LIGHT_BLUE));
            return;
        }
        for label in spec.categories() {
            let color = state
                .color_map
                .as_ref()
                .map(|cm| cm.color_for(label))
                .unwrap_or(Color32::LIGHT_BLUE);
            let points = styled(Points::new(series(spec, Some(label))));
            plot_ui.points(points.name(label).color(color));
        }
    });
}

/// Heading over the per-category legend, e.g. `Species`.
fn legend_title(spec: &PlotSpec, color_map: Option<&ColorMap>) -> Option<String> {
    spec.category_column.as_ref()?;
    color_map.map(|cm| capitalize(&cm.column))
}

/// Points of one category, or all points when `category` is None.
fn series(spec: &PlotSpec, category: Option<&str>) -> Vec<[f64; 2]> {
    spec.points
        .iter()
        .filter(|p| category.is_none() || p.category.as_deref() == category)
        .map(|p| [p.x, p.y])
        .collect()
}

fn styled(points: Points) -> Points {
    points
        .shape(MarkerShape::Circle)
        .radius(POINT_RADIUS)
        .filled(true)
}

/// Tick label for a categorical axis; only integer ticks carry a name.
fn level_label(levels: &[String], value: f64) -> String {
    let rounded = value.round();
    if (value - rounded).abs() > 1e-6 || rounded < 0.0 {
        return String::new();
    }
    levels.get(rounded as usize).cloned().unwrap_or_default()
}
