//! Static HTML report export.
//!
//! The report is a single HTML file: filtered transactions and daily
//! metrics are embedded as JSON, KPI cards are pre-rendered for the
//! filters active at export time, and a small script re-filters by
//! region / category / segment in the browser with the same KPI rules as
//! the dashboard. Charts and tables load Plotly and DataTables from CDNs.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::color::{to_hex, ColorMap};
use crate::data::aggregate;
use crate::data::model::{Dataset, DateRange, Summary, Transaction};
use crate::format;

pub const REPORT_TITLE: &str = "Business Performance Dashboard";

/// A transaction with its customer segment lifted to the top level, as
/// the report script filters on it.
#[derive(Serialize)]
struct ReportRow<'a> {
    #[serde(flatten)]
    transaction: &'a Transaction,
    segment: &'a str,
}

/// Render the report for the transactions at `indices`, which were
/// selected from `period`.
pub fn render_report(
    dataset: &Dataset,
    indices: &[usize],
    period: DateRange,
    region_colors: &ColorMap,
) -> Result<String> {
    let rows = aggregate::select(dataset, indices);
    let summary = aggregate::summarize(&rows, &dataset.daily_metrics);
    let trend = aggregate::trend(&rows);

    let report_rows: Vec<ReportRow> = rows
        .iter()
        .map(|t| ReportRow {
            transaction: t,
            segment: t.segment(),
        })
        .collect();

    let colors: serde_json::Map<String, serde_json::Value> = dataset
        .filters
        .available_regions
        .iter()
        .map(|r| (r.clone(), to_hex(region_colors.color_for(r)).into()))
        .collect();

    let filters = &dataset.filters;
    let html = format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <link href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.0/dist/css/bootstrap.min.css" rel="stylesheet">
    <link rel="stylesheet" type="text/css" href="https://cdn.datatables.net/1.13.4/css/dataTables.bootstrap5.min.css">
    <script src="https://cdn.plot.ly/plotly-2.27.0.min.js"></script>
    <style>{css}</style>
</head>
<body>
<div id="sidebar">
    <h4 class="mb-4 fw-bold">Filters</h4>
    <p class="small text-muted">{period}</p>
    {region_filters}
    {category_filters}
    {segment_filters}
    <button class="btn btn-primary w-100" onclick="applyFilters()">Update Dashboard</button>
</div>
<div id="main-content">
    <h1 class="fw-bold mb-5">{title}</h1>
    {kpis}
    <div class="card mb-4"><div id="line-chart" class="chart-box"></div></div>
    <div class="row g-4 mb-4">
        <div class="col-md-6"><div class="card p-2"><div id="cat-pie-chart" class="chart-box"></div></div></div>
        <div class="col-md-6"><div class="card p-2"><div id="reg-bar-chart" class="chart-box"></div></div></div>
    </div>
    <ul class="nav nav-tabs mb-4">
        <li class="nav-item"><button class="nav-link active" data-bs-toggle="tab" data-bs-target="#tab-summary">Summary</button></li>
        <li class="nav-item"><button class="nav-link" data-bs-toggle="tab" data-bs-target="#tab-trans">Transactions</button></li>
        <li class="nav-item"><button class="nav-link" data-bs-toggle="tab" data-bs-target="#tab-daily">Daily Metrics</button></li>
    </ul>
    <div class="tab-content">
        <div class="tab-pane fade show active" id="tab-summary">
            <div class="card p-4"><table class="table align-middle"><tbody id="summary-body">{summary_rows}</tbody></table></div>
        </div>
        <div class="tab-pane fade" id="tab-trans">
            <div class="card p-4"><table id="txnTable" class="table table-hover w-100"><thead><tr><th>Id</th><th>Date</th><th>Timestamp</th><th>Amount</th><th>Product</th><th>Product id</th><th>Category</th><th>Region</th><th>Customer</th><th>Payment method</th><th>Status</th><th>Segment</th></tr></thead></table></div>
        </div>
        <div class="tab-pane fade" id="tab-daily">
            <div class="card p-4"><table id="dailyTable" class="table table-hover w-100"><thead><tr><th>Date</th><th>Revenue</th><th>Orders</th><th>Active Users</th><th>New Users</th><th>Conversion Rate</th><th>Average Order Value</th><th>Churn Rate</th></tr></thead></table></div>
        </div>
    </div>
    <p class="small text-muted">Generated from dataset of {generated_at}</p>
</div>
<script src="https://code.jquery.com/jquery-3.6.0.min.js"></script>
<script src="https://cdn.datatables.net/1.13.4/js/jquery.dataTables.min.js"></script>
<script src="https://cdn.datatables.net/1.13.4/js/dataTables.bootstrap5.min.js"></script>
<script src="https://cdn.jsdelivr.net/npm/bootstrap@5.3.0/dist/js/bootstrap.bundle.min.js"></script>
<script>
const rawData = {rows_json};
const rawDaily = {daily_json};
const regionColors = {colors_json};
</script>
<script>{js}</script>
</body>
</html>"##,
        title = REPORT_TITLE,
        css = inline_css(),
        js = inline_javascript(),
        period = html_escape(&format!("{} to {}", period.start, period.end)),
        region_filters = render_checkboxes("Region", "reg-check", &filters.available_regions),
        category_filters = render_checkboxes("Category", "cat-check", &filters.available_categories),
        segment_filters = render_checkboxes("Segment", "seg-check", &report_segments(dataset, &rows)),
        kpis = render_kpis(&summary, &trend.to_string()),
        summary_rows = render_summary_rows(&summary),
        generated_at = html_escape(&dataset.metadata.generated_at),
        rows_json = embed_json(&report_rows)?,
        daily_json = embed_json(&dataset.daily_metrics)?,
        colors_json = embed_json(&colors)?,
    );

    Ok(html)
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Offered segments plus any segment seen in the embedded rows, so the
/// all-checked default keeps every row on page load.
fn report_segments(dataset: &Dataset, rows: &[&Transaction]) -> Vec<String> {
    let mut segments = dataset.filters.available_segments.clone();
    for t in rows {
        if !segments.iter().any(|s| s == t.segment()) {
            segments.push(t.segment().to_string());
        }
    }
    segments
}

fn render_checkboxes(label: &str, class: &str, values: &[String]) -> String {
    let mut html = format!(
        r#"<div class="mb-4"><label class="fw-bold small text-muted">{}</label><div class="mt-2">"#,
        html_escape(&label.to_uppercase())
    );
    for (i, value) in values.iter().enumerate() {
        let value = html_escape(value);
        html.push_str(&format!(
            r#"<div class="form-check"><input class="form-check-input {class}" type="checkbox" value="{value}" checked id="{class}-{i}"><label class="form-check-label small" for="{class}-{i}">{value}</label></div>"#
        ));
    }
    html.push_str("</div></div>");
    html
}

fn render_kpis(summary: &Summary, trend: &str) -> String {
    let card = |label: &str, id: &str, value: &str, extra: &str| {
        format!(
            r#"<div class="col-md-3"><div class="card kpi-card"><div class="kpi-label">{label}</div><div id="{id}" class="kpi-value">{value}</div>{extra}</div></div>"#,
            value = html_escape(value)
        )
    };
    format!(
        r#"<div class="row g-4 mb-4">{}{}{}{}</div>"#,
        card(
            "Total Revenue",
            "kpi-rev",
            &format::money(summary.total_revenue, 0),
            &format!(r#"<div id="kpi-trend" class="kpi-delta">{}</div>"#, html_escape(trend)),
        ),
        card("Avg Order Value", "kpi-aov", &format::money(summary.average_order_value, 2), ""),
        card("Top Region", "kpi-region", &summary.top_region, ""),
        card("Top Category", "kpi-cat", &summary.top_category, ""),
    )
}

fn render_summary_rows(summary: &Summary) -> String {
    format::summary_rows(summary)
        .into_iter()
        .map(|(label, value)| {
            format!(
                r#"<tr><td class="fw-bold">{label}</td><td class="text-end">{}</td></tr>"#,
                html_escape(&value)
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Serialize for a `<script>` block; `</` is escaped so embedded text can
/// never close the block.
fn embed_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let json = serde_json::to_string(value).context("serializing report data")?;
    Ok(json.replace("</", "<\\/"))
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn inline_css() -> &'static str {
    r#"
:root { --st-sidebar: #f0f2f6; --st-primary: #ff4b4b; --sidebar-width: 300px; }
body { background-color: #ffffff; display: flex; min-height: 100vh; font-family: "Source Sans Pro", sans-serif; color: #31333F; }
#sidebar { width: var(--sidebar-width); background: var(--st-sidebar); padding: 40px 20px; position: fixed; height: 100vh; overflow-y: auto; border-right: 1px solid rgba(49, 51, 63, 0.1); }
#main-content { margin-left: var(--sidebar-width); flex: 1; padding: 60px; max-width: 1200px; }
.card { border: 1px solid rgba(49, 51, 63, 0.1); border-radius: 8px; box-shadow: none; margin-bottom: 20px; }
.kpi-card { padding: 20px; text-align: left; border-left: 5px solid var(--st-primary); }
.kpi-label { font-size: 0.9rem; color: #555; }
.kpi-value { font-size: 1.8rem; font-weight: 700; color: #31333F; }
.kpi-delta { font-size: 0.9rem; color: #09ab3b; }
.chart-box { height: 400px; width: 100%; }
.nav-tabs .nav-link { color: #31333F; border: none; font-weight: 600; opacity: 0.6; }
.nav-tabs .nav-link.active { opacity: 1; border-bottom: 3px solid var(--st-primary) !important; background: none; }
.btn-primary { background-color: var(--st-primary); border: none; padding: 10px; font-weight: 600; }
"#
}

fn inline_javascript() -> &'static str {
    r#"
let txnTable, dailyTable;

function checked(cls) {
    return new Set(Array.from(document.querySelectorAll('.' + cls + ':checked')).map(cb => cb.value));
}

function money(v, digits) {
    return '$' + v.toLocaleString('en-US', { minimumFractionDigits: digits, maximumFractionDigits: digits });
}

function isStatus(d, s) { return (d.status || '').trim().toLowerCase() === s; }

function sumBy(data, key) {
    const totals = {};
    data.forEach(d => totals[d[key]] = (totals[d[key]] || 0) + d.amount);
    return Object.entries(totals).sort((a, b) => b[1] - a[1] || a[0].localeCompare(b[0]));
}

function trend(data) {
    if (data.length < 2) return '0%';
    const sorted = data.map((d, i) => [d, i]).sort((a, b) => a[0].date.localeCompare(b[0].date) || a[1] - b[1]).map(x => x[0]);
    const mid = Math.floor(sorted.length / 2);
    const first = sorted.slice(0, mid).reduce((s, d) => s + d.amount, 0);
    const second = sorted.slice(mid).reduce((s, d) => s + d.amount, 0);
    if (first > 0) {
        const v = (second - first) / first * 100;
        return (v >= 0 ? '+' : '') + v.toFixed(1) + '%';
    }
    return 'N/A';
}

function applyFilters() {
    const reg = checked('reg-check'), cat = checked('cat-check'), seg = checked('seg-check');
    updateDashboard(rawData.filter(d => reg.has(d.region) && cat.has(d.category) && seg.has(d.segment)));
}

function updateDashboard(data) {
    const completed = data.filter(d => isStatus(d, 'completed'));
    const revenue = completed.reduce((s, d) => s + d.amount, 0);
    const refunded = data.filter(d => isStatus(d, 'refunded')).reduce((s, d) => s + d.amount, 0);
    const aov = completed.length > 0 ? revenue / completed.length : 0;
    const refundRate = revenue > 0 ? refunded / revenue * 100 : 0;
    const customers = new Set(data.map(d => d.customer.id)).size;
    const conversion = rawDaily.length > 0
        ? rawDaily.reduce((s, d) => s + (d.conversionRate || 0), 0) / rawDaily.length * 100 : 0;
    const topRegion = (sumBy(completed, 'region')[0] || ['N/A'])[0];
    const topCategory = (sumBy(completed, 'category')[0] || ['N/A'])[0];

    document.getElementById('kpi-rev').innerText = money(revenue, 0);
    document.getElementById('kpi-trend').innerText = trend(data);
    document.getElementById('kpi-aov').innerText = money(aov, 2);
    document.getElementById('kpi-region').innerText = topRegion;
    document.getElementById('kpi-cat').innerText = topCategory;

    const rows = [
        ['Total Revenue', money(revenue, 2)],
        ['Average Order Value', money(aov, 2)],
        ['Conversion Rate', conversion.toFixed(2) + '%'],
        ['Total Customers', customers.toLocaleString('en-US')],
        ['Refund Rate', refundRate.toFixed(2) + '%'],
        ['Top Region', topRegion],
        ['Top Category', topCategory],
    ];
    const body = document.getElementById('summary-body');
    body.replaceChildren(...rows.map(([label, value]) => {
        const tr = document.createElement('tr');
        const l = document.createElement('td'); l.className = 'fw-bold'; l.textContent = label;
        const v = document.createElement('td'); v.className = 'text-end'; v.textContent = value;
        tr.append(l, v);
        return tr;
    }));

    const layout = { margin: { t: 40, b: 40, l: 50, r: 30 }, font: { family: 'Source Sans Pro' } };
    const daily = sumBy(data, 'date').sort((a, b) => a[0].localeCompare(b[0]));
    Plotly.react('line-chart', [{
        x: daily.map(x => x[0]), y: daily.map(x => x[1]),
        type: 'scatter', mode: 'lines', line: { color: '#ff4b4b' }
    }], { title: 'Revenue Trend', ...layout }, { responsive: true });

    const cats = sumBy(data, 'category');
    Plotly.react('cat-pie-chart', [{
        values: cats.map(x => x[1]), labels: cats.map(x => x[0]), type: 'pie', hole: .4
    }], { title: 'Category Share', ...layout }, { responsive: true });

    const regs = sumBy(data, 'region');
    Plotly.react('reg-bar-chart', [{
        x: regs.map(x => x[0]), y: regs.map(x => x[1]), type: 'bar',
        marker: { color: regs.map(x => regionColors[x[0]] || '#808080') }
    }], { title: 'Regional Performance', ...layout }, { responsive: true });

    if (txnTable) txnTable.destroy();
    txnTable = $('#txnTable').DataTable({
        data: data,
        columns: [{data:'id'}, {data:'date'}, {data:'timestamp'}, {data:'amount'}, {data:'product'}, {data:'productId'},
                  {data:'category'}, {data:'region'}, {data:'customer.id'}, {data:'paymentMethod'}, {data:'status'}, {data:'segment'}],
        pageLength: 20, deferRender: true
    });

    if (dailyTable) dailyTable.destroy();
    dailyTable = $('#dailyTable').DataTable({
        data: rawDaily,
        columns: [{data:'date'}, {data:'revenue'}, {data:'orders'}, {data:'activeUsers'}, {data:'newUsers'},
                  {data:'conversionRate'}, {data:'averageOrderValue'}, {data:'churnRate'}],
        pageLength: 20, deferRender: true
    });
}

applyFilters();

document.querySelectorAll('button[data-bs-toggle="tab"]').forEach(el => {
    el.addEventListener('shown.bs.tab', () => window.dispatchEvent(new Event('resize')));
});
"#
}
