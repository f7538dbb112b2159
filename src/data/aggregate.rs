use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use chrono::NaiveDate;

use super::model::{DailyMetric, Dataset, Product, Status, Summary, Transaction, NOT_AVAILABLE};

// ---------------------------------------------------------------------------
// Row selection
// ---------------------------------------------------------------------------

/// Borrow the transactions at `indices` (as produced by the filter).
pub fn select<'a>(dataset: &'a Dataset, indices: &[usize]) -> Vec<&'a Transaction> {
    indices.iter().map(|&i| &dataset.transactions[i]).collect()
}

/// Which statuses take part in an aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusScope {
    All,
    CompletedOnly,
}

impl StatusScope {
    fn includes(self, t: &Transaction) -> bool {
        match self {
            StatusScope::All => true,
            StatusScope::CompletedOnly => t.status() == Status::Completed,
        }
    }
}

// ---------------------------------------------------------------------------
// Group-by
// ---------------------------------------------------------------------------

/// Categorical dimension to group revenue by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    Region,
    Category,
}

impl GroupKey {
    fn of(self, t: &Transaction) -> &str {
        match self {
            GroupKey::Region => &t.region,
            GroupKey::Category => &t.category,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupTotal {
    pub label: String,
    pub amount: f64,
    pub orders: usize,
}

/// Sum amounts per key, highest revenue first (ties by name).
pub fn revenue_by(rows: &[&Transaction], key: GroupKey, scope: StatusScope) -> Vec<GroupTotal> {
    let mut groups: HashMap<&str, (f64, usize)> = HashMap::new();
    for t in rows.iter().filter(|t| scope.includes(t)) {
        let entry = groups.entry(key.of(t)).or_insert((0.0, 0));
        entry.0 += t.amount;
        entry.1 += 1;
    }

    let mut totals: Vec<GroupTotal> = groups
        .into_iter()
        .map(|(label, (amount, orders))| GroupTotal {
            label: label.to_string(),
            amount,
            orders,
        })
        .collect();
    totals.sort_by(|a, b| {
        b.amount
            .total_cmp(&a.amount)
            .then_with(|| a.label.cmp(&b.label))
    });
    totals
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DayTotal {
    pub revenue: f64,
    pub orders: usize,
}

/// Revenue and order count per calendar day, ascending by date.
pub fn daily_totals(rows: &[&Transaction], scope: StatusScope) -> BTreeMap<NaiveDate, DayTotal> {
    let mut days: BTreeMap<NaiveDate, DayTotal> = BTreeMap::new();
    for t in rows.iter().filter(|t| scope.includes(t)) {
        let day = days.entry(t.date).or_default();
        day.revenue += t.amount;
        day.orders += 1;
    }
    days
}

// ---------------------------------------------------------------------------
// Daily metrics join
// ---------------------------------------------------------------------------

/// A dataset daily metric joined with the filtered aggregates of that day.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedMetric {
    pub revenue_filtered: f64,
    pub orders_filtered: usize,
    pub metric: DailyMetric,
}

impl EnrichedMetric {
    pub fn date(&self) -> NaiveDate {
        self.metric.date
    }
}

/// Inner join of the filtered per-day aggregates with the daily metrics
/// on date. Days missing on either side are dropped.
pub fn enriched_metrics(
    rows: &[&Transaction],
    daily: &[DailyMetric],
    scope: StatusScope,
) -> Vec<EnrichedMetric> {
    let totals = daily_totals(rows, scope);
    let mut joined: Vec<EnrichedMetric> = daily
        .iter()
        .filter_map(|m| {
            totals.get(&m.date).map(|day| EnrichedMetric {
                revenue_filtered: day.revenue,
                orders_filtered: day.orders,
                metric: m.clone(),
            })
        })
        .collect();
    joined.sort_by_key(|e| e.date());
    joined
}

// ---------------------------------------------------------------------------
// KPIs
// ---------------------------------------------------------------------------

/// Recompute the headline KPIs for the filtered rows.
///
/// Revenue, order value and the top region/category only count completed
/// sales. The conversion rate comes from the unfiltered daily metrics.
pub fn summarize(rows: &[&Transaction], daily: &[DailyMetric]) -> Summary {
    let completed: Vec<&Transaction> = rows
        .iter()
        .copied()
        .filter(|t| t.status() == Status::Completed)
        .collect();

    let total_revenue: f64 = completed.iter().map(|t| t.amount).sum();
    let refunded: f64 = rows
        .iter()
        .filter(|t| t.status() == Status::Refunded)
        .map(|t| t.amount)
        .sum();

    let average_order_value = if completed.is_empty() {
        0.0
    } else {
        total_revenue / completed.len() as f64
    };

    let refund_rate = if total_revenue > 0.0 {
        refunded / total_revenue * 100.0
    } else {
        0.0
    };

    let conversion_rate = if daily.is_empty() {
        0.0
    } else {
        daily.iter().map(|m| m.conversion_rate).sum::<f64>() / daily.len() as f64
    };

    let total_customers = rows
        .iter()
        .map(|t| t.customer.id.as_str())
        .collect::<HashSet<_>>()
        .len();

    let top = |key| {
        revenue_by(&completed, key, StatusScope::All)
            .into_iter()
            .next()
            .map(|g| g.label)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    };

    Summary {
        total_revenue,
        average_order_value,
        conversion_rate,
        total_customers,
        refund_rate,
        top_region: top(GroupKey::Region),
        top_category: top(GroupKey::Category),
    }
}

// ---------------------------------------------------------------------------
// Trend
// ---------------------------------------------------------------------------

/// Revenue change between the older and the newer half of the rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trend {
    /// Fewer than two rows.
    Flat,
    /// Percentage change.
    Change(f64),
    /// The older half has no revenue to compare against.
    NotAvailable,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Flat => write!(f, "0%"),
            Trend::Change(v) => write!(f, "{v:+.1}%"),
            Trend::NotAvailable => write!(f, "{NOT_AVAILABLE}"),
        }
    }
}

/// Sort rows by date, split at `n / 2` and compare the amount sums.
pub fn trend(rows: &[&Transaction]) -> Trend {
    if rows.len() < 2 {
        return Trend::Flat;
    }
    let mut sorted: Vec<&Transaction> = rows.to_vec();
    sorted.sort_by_key(|t| t.date);

    let mid = sorted.len() / 2;
    let first: f64 = sorted[..mid].iter().map(|t| t.amount).sum();
    let second: f64 = sorted[mid..].iter().map(|t| t.amount).sum();

    if first > 0.0 {
        Trend::Change((second - first) / first * 100.0)
    } else {
        Trend::NotAvailable
    }
}

// ---------------------------------------------------------------------------
// Product catalog join
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ProductPerformance {
    pub product: Product,
    pub revenue: f64,
    pub orders: usize,
}

/// Completed revenue per catalog product, best seller first. Products
/// without sales in the filtered rows are listed with zeros.
pub fn product_performance(rows: &[&Transaction], products: &[Product]) -> Vec<ProductPerformance> {
    let mut sales: HashMap<&str, (f64, usize)> = HashMap::new();
    for t in rows.iter().filter(|t| t.status() == Status::Completed) {
        let entry = sales.entry(t.product_id.as_str()).or_insert((0.0, 0));
        entry.0 += t.amount;
        entry.1 += 1;
    }

    let mut out: Vec<ProductPerformance> = products
        .iter()
        .map(|p| {
            let (revenue, orders) = sales.get(p.id.as_str()).copied().unwrap_or((0.0, 0));
            ProductPerformance {
                product: p.clone(),
                revenue,
                orders,
            }
        })
        .collect();
    out.sort_by(|a, b| {
        b.revenue
            .total_cmp(&a.revenue)
            .then_with(|| a.product.name.cmp(&b.product.name))
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{filtered_indices, FilterState, SegmentChoice};
    use crate::data::testing::{date, sample_dataset};

    fn all_rows(ds: &Dataset) -> Vec<&Transaction> {
        ds.transactions.iter().collect()
    }

    #[test]
    fn summary_counts_only_completed_revenue() {
        let ds = sample_dataset();
        let s = summarize(&all_rows(&ds), &ds.daily_metrics);

        assert!((s.total_revenue - 770.0).abs() < 1e-9);
        assert!((s.average_order_value - 154.0).abs() < 1e-9);
        assert!((s.refund_rate - 30.0 / 770.0 * 100.0).abs() < 1e-9);
        assert!((s.conversion_rate - 0.035).abs() < 1e-9);
        assert_eq!(s.total_customers, 5);
        assert_eq!(s.top_region, "Asia");
        assert_eq!(s.top_category, "Electronics");
    }

    #[test]
    fn summary_of_nothing_is_zeroed() {
        let ds = sample_dataset();
        let s = summarize(&[], &[]);
        assert_eq!(s, Summary::default());

        // Conversion still comes from the unfiltered daily metrics.
        let s = summarize(&[], &ds.daily_metrics);
        assert!(s.conversion_rate > 0.0);
        assert_eq!(s.top_region, NOT_AVAILABLE);
    }

    #[test]
    fn refunds_without_completed_sales_give_zero_rate() {
        let ds = sample_dataset();
        let rows: Vec<&Transaction> = ds.transactions.iter().filter(|t| t.id == "T4").collect();
        let s = summarize(&rows, &ds.daily_metrics);
        assert_eq!(s.refund_rate, 0.0);
        assert_eq!(s.total_customers, 1);
        assert_eq!(s.top_category, NOT_AVAILABLE);
    }

    #[test]
    fn trend_compares_halves_by_date() {
        let ds = sample_dataset();
        let t = trend(&all_rows(&ds));
        // first half: 100 + 50 + 200, second half: 30 + 120 + 80 + 300
        match t {
            Trend::Change(v) => assert!((v - (530.0 - 350.0) / 350.0 * 100.0).abs() < 1e-9),
            other => panic!("unexpected trend {other:?}"),
        }
        assert_eq!(t.to_string(), "+51.4%");
    }

    #[test]
    fn trend_edge_cases() {
        let ds = sample_dataset();
        assert_eq!(trend(&[]), Trend::Flat);
        assert_eq!(trend(&[&ds.transactions[0]]).to_string(), "0%");

        let mut free = ds.transactions[0].clone();
        free.amount = 0.0;
        assert_eq!(trend(&[&free, &ds.transactions[6]]), Trend::NotAvailable);

        let declining = [&ds.transactions[2], &ds.transactions[5]];
        assert_eq!(trend(&declining).to_string(), "-60.0%");
    }

    #[test]
    fn regions_are_ranked_by_revenue() {
        let ds = sample_dataset();
        let totals = revenue_by(&all_rows(&ds), GroupKey::Region, StatusScope::All);
        let labels: Vec<&str> = totals.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["Asia", "Europe", "North America"]);
        assert!((totals[1].amount - 210.0).abs() < 1e-9);
        assert_eq!(totals[1].orders, 3);
    }

    #[test]
    fn ties_break_by_name() {
        let ds = sample_dataset();
        let mut asia = ds.transactions[1].clone();
        asia.amount = 100.0;
        let rows = [&ds.transactions[0], &asia];
        let totals = revenue_by(&rows, GroupKey::Region, StatusScope::All);
        assert_eq!(totals[0].label, "Asia");
    }

    #[test]
    fn join_drops_days_without_metrics() {
        let ds = sample_dataset();
        let joined = enriched_metrics(&all_rows(&ds), &ds.daily_metrics, StatusScope::All);
        let dates: Vec<NaiveDate> = joined.iter().map(|e| e.date()).collect();
        assert_eq!(
            dates,
            vec![date(2024, 1, 1), date(2024, 1, 2), date(2024, 1, 25), date(2024, 1, 31)]
        );
        assert!((joined[1].revenue_filtered - 230.0).abs() < 1e-9);
        assert_eq!(joined[1].orders_filtered, 2);

        let completed = enriched_metrics(&all_rows(&ds), &ds.daily_metrics, StatusScope::CompletedOnly);
        assert!((completed[1].revenue_filtered - 200.0).abs() < 1e-9);
        assert_eq!(completed[1].orders_filtered, 1);
    }

    #[test]
    fn filtered_pipeline_end_to_end() {
        let ds = sample_dataset();
        let mut filters = FilterState::for_dataset(&ds);
        filters.segment = SegmentChoice::Only("SMB".into());
        let rows = select(&ds, &filtered_indices(&ds, &filters));

        let s = summarize(&rows, &ds.daily_metrics);
        // T1 100 + T5 120 + T7 300 completed, T4 refunded
        assert!((s.total_revenue - 520.0).abs() < 1e-9);
        assert_eq!(s.total_customers, 3);
        assert_eq!(s.top_region, "Asia");

        let joined = enriched_metrics(&rows, &ds.daily_metrics, StatusScope::All);
        assert_eq!(joined.len(), 4);
    }

    #[test]
    fn products_include_unsold_items() {
        let ds = sample_dataset();
        let perf = product_performance(&all_rows(&ds), &ds.products);
        let names: Vec<&str> = perf.iter().map(|p| p.product.name.as_str()).collect();
        assert_eq!(names, vec!["Laptop", "Jacket", "Novel", "Headphones"]);
        assert!((perf[0].revenue - 600.0).abs() < 1e-9);
        assert_eq!(perf[0].orders, 3);
        assert_eq!(perf[3].orders, 0);
    }
}
