use std::f32::consts::{FRAC_PI_2, TAU};

use chrono::{Datelike, NaiveDate};
use eframe::egui::{Color32, Sense, Shape, Stroke, Ui, Vec2};
use egui_plot::{Bar, BarChart, Line, Plot, PlotPoints};

use crate::data::aggregate::GroupTotal;
use crate::format;
use crate::state::{AppState, Dimension};

/// Accent colour of the revenue line.
pub const ACCENT: Color32 = Color32::from_rgb(255, 75, 75);

const CHART_HEIGHT: f32 = 260.0;

// ---------------------------------------------------------------------------
// Chart grid (central panel)
// ---------------------------------------------------------------------------

/// Revenue trend on top, category share and regional performance below.
pub fn chart_grid(ui: &mut Ui, state: &AppState) {
    section(ui, "Revenue Trend", state.view.daily_revenue.is_empty(), |ui| {
        revenue_trend(ui, &state.view.daily_revenue)
    });
    ui.separator();

    ui.columns(2, |cols| {
        section(&mut cols[0], "Category Share", total(&state.view.by_category) <= 0.0, |ui| {
            category_share(ui, state)
        });
        section(&mut cols[1], "Regional Performance", state.view.by_region.is_empty(), |ui| {
            regional_performance(ui, state)
        });
    });
}

/// Titled chart slot with the "no data" fallback.
fn section(ui: &mut Ui, title: &str, empty: bool, draw: impl FnOnce(&mut Ui)) {
    ui.strong(title);
    if empty {
        ui.colored_label(Color32::YELLOW, format!("No data for {title}"));
    } else {
        draw(ui);
    }
}

// ---------------------------------------------------------------------------
// Revenue trend (line)
// ---------------------------------------------------------------------------

/// Plot x coordinate for a date.
fn day_number(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

fn date_label(x: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn revenue_trend(ui: &mut Ui, daily: &[(NaiveDate, f64)]) {
    let points: PlotPoints = daily
        .iter()
        .map(|&(date, revenue)| [day_number(date), revenue])
        .collect();

    Plot::new("revenue_trend")
        .height(CHART_HEIGHT)
        .x_axis_label("Date")
        .y_axis_label("Revenue")
        .x_axis_formatter(|mark, _range| date_label(mark.value))
        .label_formatter(|_name, point| {
            format!("{}\n{}", date_label(point.x), format::money(point.y, 2))
        })
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(points).name("Revenue").color(ACCENT).width(2.0));
        });
}

// ---------------------------------------------------------------------------
// Category share (donut)
// ---------------------------------------------------------------------------

fn total(groups: &[GroupTotal]) -> f64 {
    groups.iter().map(|g| g.amount.max(0.0)).sum()
}

/// Fraction of the positive total contributed by each group.
pub fn shares(groups: &[GroupTotal]) -> Vec<f64> {
    let sum = total(groups);
    groups
        .iter()
        .map(|g| if sum > 0.0 { g.amount.max(0.0) / sum } else { 0.0 })
        .collect()
}

fn category_share(ui: &mut Ui, state: &AppState) {
    let groups = &state.view.by_category;
    let fractions = shares(groups);

    ui.horizontal(|ui: &mut Ui| {
        let size = CHART_HEIGHT.min(ui.available_width() * 0.5);
        let (rect, _response) = ui.allocate_exact_size(Vec2::splat(size), Sense::hover());
        let painter = ui.painter_at(rect);
        let center = rect.center();
        let radius = size / 2.0 - 4.0;

        let mut start = -FRAC_PI_2;
        for (g, fraction) in groups.iter().zip(&fractions) {
            let sweep = *fraction as f32 * TAU;
            let color = state.color_for(Dimension::Category, &g.label);
            // Thin convex slices approximate the arc.
            let steps = ((sweep / TAU) * 120.0).ceil().max(1.0) as usize;
            for i in 0..steps {
                let a0 = start + sweep * i as f32 / steps as f32;
                let a1 = start + sweep * (i + 1) as f32 / steps as f32;
                painter.add(Shape::convex_polygon(
                    vec![
                        center,
                        center + radius * Vec2::angled(a0),
                        center + radius * Vec2::angled(a1),
                    ],
                    color,
                    Stroke::NONE,
                ));
            }
            start += sweep;
        }
        painter.circle_filled(center, radius * 0.4, ui.visuals().panel_fill);

        ui.vertical(|ui: &mut Ui| {
            for (g, fraction) in groups.iter().zip(&fractions) {
                ui.horizontal(|ui: &mut Ui| {
                    legend_swatch(ui, state.color_for(Dimension::Category, &g.label));
                    ui.label(format!(
                        "{}  {:.1}%  {}",
                        g.label,
                        fraction * 100.0,
                        format::money(g.amount, 0)
                    ));
                });
            }
        });
    });
}

fn legend_swatch(ui: &mut Ui, color: Color32) {
    let (rect, _) = ui.allocate_exact_size(Vec2::splat(10.0), Sense::hover());
    ui.painter().circle_filled(rect.center(), 5.0, color);
}

// ---------------------------------------------------------------------------
// Regional performance (bars)
// ---------------------------------------------------------------------------

fn regional_performance(ui: &mut Ui, state: &AppState) {
    let regions = &state.view.by_region;
    let labels: Vec<String> = regions.iter().map(|g| g.label.clone()).collect();

    let bars: Vec<Bar> = regions
        .iter()
        .enumerate()
        .map(|(i, g)| {
            Bar::new(i as f64, g.amount)
                .name(&g.label)
                .fill(state.color_for(Dimension::Region, &g.label))
                .width(0.6)
        })
        .collect();

    let chart = BarChart::new(bars)
        .name("Revenue")
        .element_formatter(Box::new(|bar, _chart| {
            format!("{}\n{}", bar.name, format::money(bar.value, 0))
        }));

    Plot::new("regional_performance")
        .height(CHART_HEIGHT)
        .y_axis_label("Revenue")
        .x_axis_formatter(move |mark, _range| {
            let i = mark.value.round();
            if (mark.value - i).abs() > 1e-6 || i < 0.0 {
                return String::new();
            }
            labels.get(i as usize).cloned().unwrap_or_default()
        })
        .allow_scroll(false)
        .allow_drag(false)
        .show(ui, |plot_ui| plot_ui.bar_chart(chart));
}

/// Placeholder shown in the central panel before a dataset is opened.
pub fn empty_dashboard(ui: &mut Ui) {
    ui.centered_and_justified(|ui: &mut Ui| {
        ui.heading("Open a dataset to view the dashboard  (File → Open…)");
    });
}
