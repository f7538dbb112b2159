use eframe::egui::{self, Color32, RichText, Ui};

use crate::data::aggregate::Trend;
use crate::format;
use crate::state::DashboardView;

/// Four headline cards across the top of the dashboard.
pub fn kpi_cards(ui: &mut Ui, view: &DashboardView) {
    let s = &view.summary;
    ui.columns(4, |cols| {
        card(&mut cols[0], "Total Revenue", &format::money(s.total_revenue, 0), Some(view.trend));
        card(&mut cols[1], "Avg Order Value", &format::money(s.average_order_value, 2), None);
        card(&mut cols[2], "Top Region", &s.top_region, None);
        card(&mut cols[3], "Top Category", &s.top_category, None);
    });
}

fn card(ui: &mut Ui, label: &str, value: &str, trend: Option<Trend>) {
    egui::Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
        ui.set_width(ui.available_width());
        ui.label(RichText::new(label).weak());
        ui.label(RichText::new(value).size(24.0).strong());
        if let Some(t) = trend {
            let color = trend_color(t).unwrap_or_else(|| ui.visuals().weak_text_color());
            ui.label(RichText::new(t.to_string()).color(color));
        }
    });
}

/// Green for growth, red for decline, `None` when there is nothing to compare.
fn trend_color(trend: Trend) -> Option<Color32> {
    match trend {
        Trend::Change(v) if v < 0.0 => Some(Color32::from_rgb(255, 75, 75)),
        Trend::Change(_) => Some(Color32::from_rgb(9, 171, 59)),
        Trend::Flat | Trend::NotAvailable => None,
    }
}
