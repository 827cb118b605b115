use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::aggregate::monthly_averages;
use crate::data::model::{month_abbrev, MONTHS};
use crate::data::stats::mean;
use crate::export::ChartKind;
use crate::state::{AppState, Dataset};

// ---------------------------------------------------------------------------
// Left side panel – dataset summary
// ---------------------------------------------------------------------------

/// Render the left summary panel.
pub fn side_panel(ui: &mut Ui, state: &AppState) {
    ui.heading("Dataset");
    ui.separator();

    let Some(dataset) = &state.dataset else {
        ui.label("No dataset loaded.");
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            summary_grid(ui, dataset);
            ui.separator();

            ui.strong("Monthly averages");
            ui.add_space(4.0);
            ScrollArea::horizontal()
                .id_salt("monthly_table")
                .show(ui, |ui: &mut Ui| monthly_table(ui, dataset));
        });
}

fn summary_grid(ui: &mut Ui, dataset: &Dataset) {
    let filtered = &dataset.filtered;
    let bounds = filtered.bounds();
    let file_name = dataset
        .source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    egui::Grid::new("summary_grid")
        .num_columns(2)
        .striped(true)
        .show(ui, |ui: &mut Ui| {
            ui.label("File");
            ui.label(file_name);
            ui.end_row();

            ui.label("Rows loaded");
            ui.label(dataset.series.len().to_string());
            ui.end_row();

            ui.label("Rows kept");
            ui.label(filtered.len().to_string());
            ui.end_row();

            ui.label("Outliers removed");
            ui.label(filtered.removed().to_string());
            ui.end_row();

            ui.label(format!("p{}", bounds.lower_q * 100.0));
            ui.label(format!("{:.1}", bounds.lower));
            ui.end_row();

            ui.label(format!("p{}", bounds.upper_q * 100.0));
            ui.label(format!("{:.1}", bounds.upper));
            ui.end_row();

            let kept: Vec<f64> = filtered.values().collect();
            if let Some(avg) = mean(&kept) {
                ui.label("Mean (kept)");
                ui.label(format!("{avg:.1}"));
                ui.end_row();
            }

            if let Some((first, last)) = filtered.date_range() {
                ui.label("Dates");
                ui.label(format!("{first} – {last}"));
                ui.end_row();
            }
        });
}

/// Year rows × month columns of mean values; empty cells had no data.
fn monthly_table(ui: &mut Ui, dataset: &Dataset) {
    let table = monthly_averages(&dataset.filtered);
    let years = table.years();

    TableBuilder::new(ui)
        .striped(true)
        .column(Column::auto())
        .columns(Column::auto().at_least(48.0), MONTHS.len())
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong("Year");
            });
            for month in MONTHS {
                header.col(|ui| {
                    ui.strong(month_abbrev(month));
                });
            }
        })
        .body(|mut body| {
            for year in years {
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.label(year.to_string());
                    });
                    for cell in table.months_for(year) {
                        row.col(|ui| {
                            ui.label(cell.map(|v| format!("{v:.0}")).unwrap_or_default());
                        });
                    }
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            let can_export = state.dataset.is_some() && !state.is_exporting();
            if ui
                .add_enabled(can_export, egui::Button::new("Export PNGs"))
                .clicked()
            {
                state.start_export();
                ui.close_menu();
            }
        });

        ui.separator();

        for chart in ChartKind::ALL {
            if ui
                .selectable_label(state.chart == chart, chart.to_string())
                .clicked()
            {
                state.chart = chart;
            }
        }

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} days loaded, {} charted",
                ds.series.len(),
                ds.filtered.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            let color = if msg.starts_with("Error") {
                Color32::RED
            } else {
                Color32::GRAY
            };
            ui.label(RichText::new(msg).color(color));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open page view data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open(&path);
    }
}
