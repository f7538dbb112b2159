use std::ops::Range;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::color::ColorMap;
use crate::data::aggregate::{
    self, EnrichedMetric, GroupKey, GroupTotal, ProductPerformance, StatusScope, Trend,
};
use crate::data::filter::{filtered_indices, DatePreset, FilterState, SegmentChoice};
use crate::data::model::{Dataset, DateRange, Summary, Transaction};
use crate::data::{export, loader};
use crate::report;

// ---------------------------------------------------------------------------
// Cached view of the filtered data
// ---------------------------------------------------------------------------

/// Everything the panels draw, recomputed once per filter change.
#[derive(Debug, Clone)]
pub struct DashboardView {
    /// Indices of transactions passing the current filters.
    pub indices: Vec<usize>,
    pub summary: Summary,
    pub trend: Trend,
    pub daily_revenue: Vec<(NaiveDate, f64)>,
    pub by_category: Vec<GroupTotal>,
    pub by_region: Vec<GroupTotal>,
    pub enriched: Vec<EnrichedMetric>,
    pub products: Vec<ProductPerformance>,
}

impl Default for DashboardView {
    fn default() -> Self {
        Self {
            indices: Vec::new(),
            summary: Summary::default(),
            trend: Trend::Flat,
            daily_revenue: Vec::new(),
            by_category: Vec::new(),
            by_region: Vec::new(),
            enriched: Vec::new(),
            products: Vec::new(),
        }
    }
}

impl DashboardView {
    pub fn compute(dataset: &Dataset, filters: &FilterState) -> Self {
        let indices = filtered_indices(dataset, filters);
        let rows = aggregate::select(dataset, &indices);

        let view = Self {
            summary: aggregate::summarize(&rows, &dataset.daily_metrics),
            trend: aggregate::trend(&rows),
            daily_revenue: aggregate::daily_totals(&rows, StatusScope::All)
                .into_iter()
                .map(|(date, day)| (date, day.revenue))
                .collect(),
            by_category: aggregate::revenue_by(&rows, GroupKey::Category, StatusScope::All),
            by_region: aggregate::revenue_by(&rows, GroupKey::Region, StatusScope::All),
            enriched: aggregate::enriched_metrics(&rows, &dataset.daily_metrics, StatusScope::All),
            products: aggregate::product_performance(&rows, &dataset.products),
            indices,
        };
        log::debug!(
            "filters matched {} of {} transactions",
            view.indices.len(),
            dataset.len()
        );
        view
    }
}

// ---------------------------------------------------------------------------
// Table paging
// ---------------------------------------------------------------------------

/// Rows above which "Unlimited" paging shows a warning.
pub const LARGE_TABLE_ROWS: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSize {
    Rows(usize),
    Unlimited,
}

impl PageSize {
    pub const OPTIONS: [PageSize; 4] = [
        PageSize::Rows(20),
        PageSize::Rows(50),
        PageSize::Rows(100),
        PageSize::Unlimited,
    ];

    pub fn label(self) -> String {
        match self {
            PageSize::Rows(n) => n.to_string(),
            PageSize::Unlimited => "Unlimited".to_string(),
        }
    }
}

/// Page selection for one table. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    pub size: PageSize,
    pub page: usize,
}

impl Default for Pager {
    fn default() -> Self {
        Self {
            size: PageSize::Rows(20),
            page: 1,
        }
    }
}

impl Pager {
    pub fn total_pages(&self, total: usize) -> usize {
        match self.size {
            PageSize::Rows(n) if total > 0 => (total - 1) / n + 1,
            _ => 1,
        }
    }

    /// Keep `page` inside `1..=total_pages` after the row count changed.
    pub fn clamp(&mut self, total: usize) {
        self.page = self.page.clamp(1, self.total_pages(total));
    }

    /// Row indices shown on the current page.
    pub fn visible_range(&self, total: usize) -> Range<usize> {
        match self.size {
            PageSize::Unlimited => 0..total,
            PageSize::Rows(n) => {
                let start = ((self.page.max(1) - 1) * n).min(total);
                start..(start + n).min(total)
            }
        }
    }

    pub fn caption(&self, total: usize) -> String {
        let range = self.visible_range(total);
        format!("Showing {} to {} of {}", range.start + 1, range.end, total)
    }

    pub fn warn_large(&self, total: usize) -> bool {
        self.size == PageSize::Unlimited && total > LARGE_TABLE_ROWS
    }
}

/// One-line message in the top bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusLine {
    Info(String),
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Summary,
    Transactions,
    DailyMetrics,
    Products,
}

/// Categorical filter dimensions with a check list in the side panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Region,
    Category,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded dataset (None until a file is opened).
    pub dataset: Option<Dataset>,

    /// Where the dataset was loaded from.
    pub dataset_path: Option<PathBuf>,

    /// Current filter selections.
    pub filters: FilterState,

    /// Aggregates for the current filters (cached).
    pub view: DashboardView,

    /// Colours per region / category, fixed for the loaded dataset.
    pub region_colors: ColorMap,
    pub category_colors: ColorMap,

    pub active_tab: Tab,
    pub transactions_pager: Pager,
    pub daily_pager: Pager,

    /// Status / error message shown in the UI.
    pub status_message: Option<StatusLine>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            dataset: None,
            dataset_path: None,
            filters: FilterState::default(),
            view: DashboardView::default(),
            region_colors: ColorMap::new(&[]),
            category_colors: ColorMap::new(&[]),
            active_tab: Tab::Summary,
            transactions_pager: Pager::default(),
            daily_pager: Pager::default(),
            status_message: None,
        }
    }
}

impl AppState {
    /// Ingest a newly loaded dataset, initialise filters and colours.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.filters = FilterState::for_dataset(&dataset);
        self.region_colors = ColorMap::new(&dataset.filters.available_regions);
        self.category_colors = ColorMap::new(&dataset.filters.available_categories);
        self.transactions_pager = Pager::default();
        self.daily_pager = Pager::default();

        self.dataset = Some(dataset);
        self.status_message = None;
        self.refilter();
    }

    /// Load a dataset from disk; failures end up in the status line.
    pub fn open_path(&mut self, path: &Path) {
        match loader::load_file(path) {
            Ok(dataset) => {
                if dataset.is_empty() {
                    log::warn!("{} contains no transactions", path.display());
                }
                log::info!(
                    "Loaded {} transactions, {} daily metrics, {} products from {}",
                    dataset.len(),
                    dataset.daily_metrics.len(),
                    dataset.products.len(),
                    path.display()
                );
                self.set_dataset(dataset);
                self.dataset_path = Some(path.to_path_buf());
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.status_message = Some(StatusLine::Error(format!("Error: {e:#}")));
            }
        }
    }

    /// Recompute the cached view after a filter change.
    pub fn refilter(&mut self) {
        if let Some(ds) = &self.dataset {
            self.view = DashboardView::compute(ds, &self.filters);
            self.transactions_pager.clamp(self.view.indices.len());
            self.daily_pager.clamp(self.view.enriched.len());
        }
    }

    /// Transactions passing the current filters.
    pub fn filtered_rows(&self) -> Vec<&Transaction> {
        match &self.dataset {
            Some(ds) => aggregate::select(ds, &self.view.indices),
            None => Vec::new(),
        }
    }

    fn selection_mut(&mut self, dimension: Dimension) -> &mut std::collections::BTreeSet<String> {
        match dimension {
            Dimension::Region => &mut self.filters.regions,
            Dimension::Category => &mut self.filters.categories,
        }
    }

    pub fn is_selected(&self, dimension: Dimension, value: &str) -> bool {
        match dimension {
            Dimension::Region => self.filters.regions.contains(value),
            Dimension::Category => self.filters.categories.contains(value),
        }
    }

    pub fn color_for(&self, dimension: Dimension, value: &str) -> eframe::egui::Color32 {
        match dimension {
            Dimension::Region => self.region_colors.color_for(value),
            Dimension::Category => self.category_colors.color_for(value),
        }
    }

    /// Toggle a single value in a dimension's selection.
    pub fn toggle_filter_value(&mut self, dimension: Dimension, value: &str) {
        let selected = self.selection_mut(dimension);
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
        self.refilter();
    }

    /// Select all values offered for a dimension.
    pub fn select_all(&mut self, dimension: Dimension) {
        let Some(ds) = &self.dataset else {
            return;
        };
        let all = match dimension {
            Dimension::Region => ds.filters.available_regions.clone(),
            Dimension::Category => ds.filters.available_categories.clone(),
        };
        *self.selection_mut(dimension) = all.into_iter().collect();
        self.refilter();
    }

    /// Deselect all values in a dimension.
    pub fn select_none(&mut self, dimension: Dimension) {
        self.selection_mut(dimension).clear();
        self.refilter();
    }

    pub fn set_preset(&mut self, preset: DatePreset) {
        if self.filters.preset != preset {
            self.filters.preset = preset;
            self.refilter();
        }
    }

    /// Switch to a custom range. An inverted range simply matches nothing.
    pub fn set_custom_range(&mut self, range: DateRange) {
        if self.filters.preset != DatePreset::Custom || self.filters.custom != range {
            self.filters.preset = DatePreset::Custom;
            self.filters.custom = range;
            self.refilter();
        }
    }

    pub fn set_segment(&mut self, segment: SegmentChoice) {
        if self.filters.segment != segment {
            self.filters.segment = segment;
            self.refilter();
        }
    }

    /// Write the HTML report for the current filters.
    pub fn export_report(&self, path: &Path) -> Result<()> {
        let ds = self.dataset.as_ref().context("no dataset loaded")?;
        let period = self.filters.date_range(ds.date_range());
        let html = report::render_report(ds, &self.view.indices, period, &self.region_colors)?;
        std::fs::write(path, html)
            .with_context(|| format!("writing report {}", path.display()))?;
        log::info!("Wrote report to {}", path.display());
        Ok(())
    }

    /// Write the filtered transactions as csv / json / parquet.
    pub fn export_data(&self, path: &Path) -> Result<()> {
        let rows = self.filtered_rows();
        export::export_transactions(path, &rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::testing::sample_dataset;

    fn loaded() -> AppState {
        let mut state = AppState::default();
        state.set_dataset(sample_dataset());
        state
    }

    #[test]
    fn loading_selects_everything() {
        let state = loaded();
        assert_eq!(state.view.indices.len(), 7);
        assert!((state.view.summary.total_revenue - 770.0).abs() < 1e-9);
        assert_eq!(state.view.by_region[0].label, "Asia");
        assert_eq!(state.view.daily_revenue.len(), 5);
    }

    #[test]
    fn toggling_a_region_refilters() {
        let mut state = loaded();
        state.toggle_filter_value(Dimension::Region, "Asia");
        assert_eq!(state.view.indices.len(), 4);
        assert_eq!(state.view.summary.top_region, "North America");

        state.toggle_filter_value(Dimension::Region, "Asia");
        assert_eq!(state.view.indices.len(), 7);
    }

    #[test]
    fn select_none_then_all() {
        let mut state = loaded();
        state.select_none(Dimension::Category);
        assert!(state.view.indices.is_empty());
        assert_eq!(state.view.summary, Summary {
            conversion_rate: state.view.summary.conversion_rate,
            ..Summary::default()
        });

        state.select_all(Dimension::Category);
        assert_eq!(state.view.indices.len(), 7);
    }

    #[test]
    fn preset_and_segment_changes_refilter() {
        let mut state = loaded();
        state.set_preset(DatePreset::Last7Days);
        assert_eq!(state.view.indices.len(), 3);
        state.set_segment(SegmentChoice::Only("Enterprise".into()));
        assert_eq!(state.view.indices.len(), 1);
    }

    #[test]
    fn custom_range_switches_preset() {
        let mut state = loaded();
        state.set_custom_range(DateRange {
            start: crate::data::testing::date(2024, 1, 2),
            end: crate::data::testing::date(2024, 1, 25),
        });
        assert_eq!(state.filters.preset, DatePreset::Custom);
        assert_eq!(state.view.indices, vec![2, 3, 4]);
    }

    #[test]
    fn failed_open_keeps_previous_dataset() {
        let mut state = loaded();
        state.open_path(Path::new("/no/such/dataset.json"));
        assert!(state.dataset.is_some());
        assert!(matches!(
            &state.status_message,
            Some(StatusLine::Error(msg)) if msg.starts_with("Error:")
        ));
    }

    #[test]
    fn pager_ranges() {
        let mut pager = Pager::default();
        assert_eq!(pager.total_pages(0), 1);
        assert_eq!(pager.total_pages(20), 1);
        assert_eq!(pager.total_pages(21), 2);
        assert_eq!(pager.visible_range(45), 0..20);

        pager.page = 3;
        assert_eq!(pager.visible_range(45), 40..45);
        assert_eq!(pager.caption(45), "Showing 41 to 45 of 45");

        pager.clamp(10);
        assert_eq!(pager.page, 1);

        pager.size = PageSize::Unlimited;
        assert_eq!(pager.visible_range(45), 0..45);
        assert!(!pager.warn_large(45));
        assert!(pager.warn_large(LARGE_TABLE_ROWS + 1));
    }

    #[test]
    fn exports_report_and_data() {
        let mut state = loaded();
        let dir = tempfile::tempdir().unwrap();

        let report = dir.path().join("report.html");
        state.export_report(&report).unwrap();
        assert!(std::fs::read_to_string(&report).unwrap().contains("<!DOCTYPE html>"));

        state.toggle_filter_value(Dimension::Region, "Asia");
        let csv = dir.path().join("rows.csv");
        state.export_data(&csv).unwrap();
        assert_eq!(std::fs::read_to_string(&csv).unwrap().lines().count(), 5);
    }
}
