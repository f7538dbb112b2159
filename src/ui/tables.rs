use eframe::egui::{self, Align, Color32, Layout, Ui};
use egui_extras::{Column, TableBuilder};

use crate::format;
use crate::state::{AppState, PageSize, Pager, Tab};

const ROW_HEIGHT: f32 = 18.0;

const TRANSACTION_COLUMNS: [&str; 12] = [
    "Id",
    "Date",
    "Timestamp",
    "Amount",
    "Product",
    "Product id",
    "Category",
    "Region",
    "Customer",
    "Payment method",
    "Status",
    "Segment",
];

const DAILY_COLUMNS: [&str; 10] = [
    "Date",
    "Revenue (filtered)",
    "Orders (filtered)",
    "Revenue",
    "Orders",
    "Active Users",
    "New Users",
    "Conversion Rate",
    "Avg Order Value",
    "Churn Rate",
];

const PRODUCT_COLUMNS: [&str; 5] = ["Product", "Category", "Price range", "Revenue", "Orders"];

// ---------------------------------------------------------------------------
// Tabbed data section below the charts
// ---------------------------------------------------------------------------

pub fn data_tabs(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        for (tab, label) in [
            (Tab::Summary, "Summary"),
            (Tab::Transactions, "Transactions"),
            (Tab::DailyMetrics, "Daily Metrics"),
            (Tab::Products, "Products"),
        ] {
            ui.selectable_value(&mut state.active_tab, tab, label);
        }
    });
    ui.separator();

    match state.active_tab {
        Tab::Summary => summary_tab(ui, state),
        Tab::Transactions => transactions_tab(ui, state),
        Tab::DailyMetrics => daily_tab(ui, state),
        Tab::Products => products_tab(ui, state),
    }
}

fn summary_tab(ui: &mut Ui, state: &AppState) {
    egui::Grid::new("summary_grid")
        .num_columns(2)
        .striped(true)
        .spacing([40.0, 6.0])
        .show(ui, |ui: &mut Ui| {
            for (label, value) in format::summary_rows(&state.view.summary) {
                ui.strong(label);
                ui.label(value);
                ui.end_row();
            }
        });
}

fn transactions_tab(ui: &mut Ui, state: &mut AppState) {
    let total = state.view.indices.len();
    if total == 0 {
        no_data(ui);
        return;
    }
    pager_controls(ui, "transactions_page_size", &mut state.transactions_pager, total);

    let rows = state.filtered_rows();
    let visible = &rows[state.transactions_pager.visible_range(total)];
    data_table(ui, "transactions_table", &TRANSACTION_COLUMNS, visible.len(), |i| {
        let t = visible[i];
        vec![
            t.id.clone(),
            t.date.to_string(),
            t.timestamp.clone(),
            format::money(t.amount, 2),
            t.product.clone(),
            t.product_id.clone(),
            t.category.clone(),
            t.region.clone(),
            t.customer.id.clone(),
            t.payment_method.clone(),
            t.status.clone(),
            t.segment().to_string(),
        ]
    });
}

fn daily_tab(ui: &mut Ui, state: &mut AppState) {
    let total = state.view.enriched.len();
    if total == 0 {
        no_data(ui);
        return;
    }
    pager_controls(ui, "daily_page_size", &mut state.daily_pager, total);

    let visible = &state.view.enriched[state.daily_pager.visible_range(total)];
    data_table(ui, "daily_table", &DAILY_COLUMNS, visible.len(), |i| {
        let e = &visible[i];
        let m = &e.metric;
        vec![
            e.date().to_string(),
            format::money(e.revenue_filtered, 2),
            format::count(e.orders_filtered),
            format::money(m.revenue, 2),
            format::grouped(m.orders as f64, 0),
            format::grouped(m.active_users as f64, 0),
            format::grouped(m.new_users as f64, 0),
            format::percent(m.conversion_rate * 100.0),
            format::money(m.average_order_value, 2),
            format::percent(m.churn_rate * 100.0),
        ]
    });
}

fn products_tab(ui: &mut Ui, state: &AppState) {
    let products = &state.view.products;
    if products.is_empty() {
        no_data(ui);
        return;
    }
    data_table(ui, "products_table", &PRODUCT_COLUMNS, products.len(), |i| {
        let p = &products[i];
        let (lo, hi) = p.product.price_range;
        vec![
            p.product.name.clone(),
            p.product.category.clone(),
            format!("{} – {}", format::money(lo, 2), format::money(hi, 2)),
            format::money(p.revenue, 2),
            format::count(p.orders),
        ]
    });
}

fn no_data(ui: &mut Ui) {
    ui.colored_label(Color32::YELLOW, "No data available for the current filters.");
}

// ---------------------------------------------------------------------------
// Shared table widgets
// ---------------------------------------------------------------------------

/// Rows-per-page selector, page stepper and the "Showing a to b of n" caption.
fn pager_controls(ui: &mut Ui, id: &str, pager: &mut Pager, total: usize) {
    ui.horizontal(|ui: &mut Ui| {
        ui.label("Rows per page");
        let before = pager.size;
        egui::ComboBox::from_id_salt(id)
            .selected_text(pager.size.label())
            .show_ui(ui, |ui: &mut Ui| {
                for size in PageSize::OPTIONS {
                    ui.selectable_value(&mut pager.size, size, size.label());
                }
            });
        if pager.size != before {
            pager.page = 1;
        }

        let pages = pager.total_pages(total);
        if ui.add_enabled(pager.page > 1, egui::Button::new("◀")).clicked() {
            pager.page -= 1;
        }
        ui.label(format!("Page {} of {pages}", pager.page));
        if ui.add_enabled(pager.page < pages, egui::Button::new("▶")).clicked() {
            pager.page += 1;
        }
        pager.clamp(total);

        ui.separator();
        ui.label(pager.caption(total));
    });

    if pager.warn_large(total) {
        ui.colored_label(
            Color32::YELLOW,
            format!(
                "Showing all {} rows; large tables may be slow.",
                format::count(total)
            ),
        );
    }
}

fn data_table(
    ui: &mut Ui,
    id: &str,
    headers: &[&str],
    n_rows: usize,
    cells: impl Fn(usize) -> Vec<String>,
) {
    ui.push_id(id, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(Layout::left_to_right(Align::Center))
            .columns(Column::auto().at_least(60.0), headers.len())
            .min_scrolled_height(0.0)
            .max_scroll_height(500.0)
            .header(20.0, |mut header| {
                for h in headers {
                    header.col(|ui: &mut Ui| {
                        ui.strong(*h);
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, n_rows, |mut row| {
                    let values = cells(row.index());
                    for value in values {
                        row.col(|ui: &mut Ui| {
                            ui.label(value);
                        });
                    }
                });
            });
    });
}
