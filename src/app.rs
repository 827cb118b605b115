use std::sync::Arc;

use eframe::egui::{self, ColorImage};

use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct PageViewApp {
    pub state: AppState,
}

impl PageViewApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Hand any captured viewport images to the export queue.
    fn collect_screenshots(&mut self, ctx: &egui::Context) {
        let images: Vec<Arc<ColorImage>> = ctx.input(|i| {
            i.raw
                .events
                .iter()
                .filter_map(|event| match event {
                    egui::Event::Screenshot { image, .. } => Some(image.clone()),
                    _ => None,
                })
                .collect()
        });

        for image in images {
            let Some(queue) = self.state.export.as_mut() else {
                break;
            };
            if let Err(e) = queue.on_screenshot(&image) {
                log::error!("Export failed: {e:#}");
                self.state.status_message = Some(format!("Error: {e:#}"));
                self.state.export = None;
                if self.state.exit_after_export {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
                return;
            }
        }

        if self.state.finish_export_if_done() && self.state.exit_after_export {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    }

    /// Ask for a capture once the queued chart has settled on screen.
    fn drive_export(&mut self, ctx: &egui::Context) {
        let Some(queue) = self.state.export.as_mut() else {
            return;
        };
        if queue.poll() {
            ctx.send_viewport_cmd(egui::ViewportCommand::Screenshot(egui::UserData::default()));
        }
        ctx.request_repaint();
    }
}

impl eframe::App for PageViewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.collect_screenshots(ctx);

        // Exported images contain the chart only.
        if !self.state.is_exporting() {
            // ---- Top panel: menu bar ----
            egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
                panels::top_bar(ui, &mut self.state);
            });

            // ---- Left side panel: dataset summary ----
            egui::SidePanel::left("summary_panel")
                .default_width(260.0)
                .resizable(true)
                .show(ctx, |ui| {
                    panels::side_panel(ui, &self.state);
                });
        }

        // ---- Central panel: chart ----
        let chart = self.state.visible_chart();
        egui::CentralPanel::default().show(ctx, |ui| {
            let filtered = self.state.dataset.as_ref().map(|ds| &ds.filtered);
            plot::chart_panel(ui, chart, filtered);
        });

        self.drive_export(ctx);
    }
}
