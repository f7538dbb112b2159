use std::path::PathBuf;

use eframe::egui::{self, RichText, ScrollArea};

use crate::report::REPORT_TITLE;
use crate::state::AppState;
use crate::ui::{charts, kpi, panels, tables};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct DashboardApp {
    pub state: AppState,
}

impl DashboardApp {
    /// Start the dashboard, opening `path` right away when given.
    pub fn new(path: Option<PathBuf>) -> Self {
        let mut app = Self::default();
        if let Some(path) = path {
            app.state.open_path(&path);
        }
        app
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: KPIs, charts, tables ----
        egui::CentralPanel::default().show(ctx, |ui| {
            if self.state.dataset.is_none() {
                charts::empty_dashboard(ui);
                return;
            }

            ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    ui.heading(RichText::new(REPORT_TITLE).strong());
                    ui.add_space(6.0);
                    kpi::kpi_cards(ui, &self.state.view);
                    ui.add_space(8.0);
                    charts::chart_grid(ui, &self.state);
                    ui.separator();
                    tables::data_tabs(ui, &mut self.state);
                });
        });
    }
}
