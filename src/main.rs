mod app;
mod cli;
mod color;
mod data;
mod format;
mod report;
mod state;
mod ui;

use app::DashboardApp;
use clap::Parser;
use cli::Cli;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();
    let cli = Cli::parse();
    let data = cli.dataset_path();

    // Headless mode: render the report and exit.
    if let Some(out) = &cli.report {
        let Some(data) = data else {
            eprintln!("Error: no dataset given and {} not found", cli::DEFAULT_DATASET);
            std::process::exit(2);
        };
        if let Err(e) = cli::write_report(&cli, &data, out) {
            log::error!("Report failed: {e:#}");
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
        return Ok(());
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "KPI Dashboard",
        options,
        Box::new(move |_cc| Ok(Box::new(DashboardApp::new(data)))),
    )
}
