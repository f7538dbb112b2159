use std::path::PathBuf;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::data::filter::{DatePreset, SegmentChoice};
use crate::state::{AppState, Dimension, StatusLine};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let dataset = match &state.dataset {
        Some(ds) => ds,
        None => {
            ui.label("No dataset loaded.");
            return;
        }
    };

    // Clone what we need so we can mutate state inside the closures.
    let options = dataset.filters.clone();
    let bounds = dataset.date_range();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Period ----
            ui.strong("Date Range");
            let mut preset = state.filters.preset;
            egui::ComboBox::from_id_salt("period")
                .selected_text(preset.to_string())
                .show_ui(ui, |ui: &mut Ui| {
                    for p in DatePreset::ALL {
                        ui.selectable_value(&mut preset, p, p.to_string());
                    }
                });
            state.set_preset(preset);

            if preset == DatePreset::Custom {
                let mut range = state.filters.custom;
                ui.horizontal(|ui: &mut Ui| {
                    ui.label("From");
                    ui.add(DatePickerButton::new(&mut range.start).id_salt("range_from"));
                });
                ui.horizontal(|ui: &mut Ui| {
                    ui.label("To");
                    ui.add(DatePickerButton::new(&mut range.end).id_salt("range_to"));
                });
                if range.start > range.end {
                    ui.colored_label(Color32::YELLOW, "Start date is after end date.");
                }
                state.set_custom_range(range);
            } else {
                let range = state.filters.date_range(bounds);
                ui.label(RichText::new(format!("{} → {}", range.start, range.end)).weak());
            }
            ui.separator();

            // ---- Categorical filters (collapsible) ----
            check_list(ui, state, Dimension::Region, "Regions", &options.available_regions);
            check_list(
                ui,
                state,
                Dimension::Category,
                "Categories",
                &options.available_categories,
            );
            ui.separator();

            // ---- Segment ----
            ui.strong("Customer Segment");
            let mut segment = state.filters.segment.clone();
            ui.radio_value(&mut segment, SegmentChoice::All, "All");
            for s in &options.available_segments {
                ui.radio_value(&mut segment, SegmentChoice::Only(s.clone()), s.as_str());
            }
            state.set_segment(segment);
        });
}

fn check_list(ui: &mut Ui, state: &mut AppState, dimension: Dimension, title: &str, values: &[String]) {
    let n_selected = values.iter().filter(|v| state.is_selected(dimension, v)).count();
    let header_text = format!("{title}  ({n_selected}/{})", values.len());

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(title)
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    state.select_all(dimension);
                }
                if ui.small_button("None").clicked() {
                    state.select_none(dimension);
                }
            });

            for value in values {
                let mut checked = state.is_selected(dimension, value);
                let text = RichText::new(value).color(state.color_for(dimension, value));
                if ui.checkbox(&mut checked, text).changed() {
                    state.toggle_filter_value(dimension, value);
                }
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
            ui.add_enabled_ui(state.dataset.is_some(), |ui: &mut Ui| {
                if ui.button("Export report…").clicked() {
                    save_report_dialog(state);
                    ui.close_menu();
                }
                if ui.button("Export filtered data…").clicked() {
                    save_data_dialog(state);
                    ui.close_menu();
                }
            });
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} transactions loaded, {} visible",
                ds.len(),
                state.view.indices.len()
            ));
            if !ds.metadata.generated_at.is_empty() {
                ui.separator();
                ui.label(RichText::new(format!("generated {}", ds.metadata.generated_at)).weak());
            }
        }

        ui.separator();

        match &state.status_message {
            Some(StatusLine::Error(msg)) => {
                ui.label(RichText::new(msg).color(Color32::RED));
            }
            Some(StatusLine::Info(msg)) => {
                ui.label(msg.as_str());
            }
            None => {}
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open KPI dataset")
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        state.open_path(&path);
    }
}

pub fn save_report_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export HTML report")
        .set_file_name("dashboard_report.html")
        .add_filter("HTML", &["html"])
        .save_file();

    if let Some(path) = file {
        let outcome = state.export_report(&path);
        report_outcome(state, outcome, "Report", path);
    }
}

pub fn save_data_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export filtered transactions")
        .set_file_name("transactions.csv")
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet"])
        .save_file();

    if let Some(path) = file {
        let outcome = state.export_data(&path);
        report_outcome(state, outcome, "Data", path);
    }
}

fn report_outcome(state: &mut AppState, outcome: anyhow::Result<()>, what: &str, path: PathBuf) {
    state.status_message = Some(match outcome {
        Ok(()) => StatusLine::Info(format!("{what} saved to {}", path.display())),
        Err(e) => {
            log::error!("{what} export failed: {e:#}");
            StatusLine::Error(format!("Error: {e:#}"))
        }
    });
}
