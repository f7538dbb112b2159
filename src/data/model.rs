use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Inclusive calendar range covered by the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default)]
    pub generated_at: String,
    #[serde(default)]
    pub transaction_count: usize,
    #[serde(default)]
    pub days_of_data: u32,
    pub date_range: DateRange,
}

// ---------------------------------------------------------------------------
// Summary – headline KPIs
// ---------------------------------------------------------------------------

/// Headline KPIs. The dataset ships a precomputed one; the dashboard
/// recomputes it for every filter change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_revenue: f64,
    pub average_order_value: f64,
    /// Mean daily conversion rate as a fraction (0.032 = 3.2 %).
    pub conversion_rate: f64,
    pub total_customers: usize,
    /// Refunded amount as a percentage of completed revenue.
    pub refund_rate: f64,
    pub top_region: String,
    pub top_category: String,
}

/// Placeholder used for "top" KPIs when nothing qualifies.
pub const NOT_AVAILABLE: &str = "N/A";

impl Default for Summary {
    fn default() -> Self {
        Self {
            total_revenue: 0.0,
            average_order_value: 0.0,
            conversion_rate: 0.0,
            total_customers: 0,
            refund_rate: 0.0,
            top_region: NOT_AVAILABLE.to_string(),
            top_category: NOT_AVAILABLE.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub segment: String,
    #[serde(default)]
    pub lifetime_value: f64,
}

/// One sale (one row of the transaction table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub timestamp: String,
    pub amount: f64,
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub product_id: String,
    pub category: String,
    pub region: String,
    pub customer: Customer,
    #[serde(default)]
    pub payment_method: String,
    pub status: String,
}

impl Transaction {
    pub fn status(&self) -> Status {
        Status::parse(&self.status)
    }

    pub fn segment(&self) -> &str {
        &self.customer.segment
    }
}

/// Transaction status. Parsing is case-insensitive, unknown values are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Completed,
    Refunded,
    Pending,
    Other(String),
}

impl Status {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "completed" => Status::Completed,
            "refunded" => Status::Refunded,
            "pending" => Status::Pending,
            other => Status::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Completed => write!(f, "completed"),
            Status::Refunded => write!(f, "refunded"),
            Status::Pending => write!(f, "pending"),
            Status::Other(s) => write!(f, "{s}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Daily metrics & products
// ---------------------------------------------------------------------------

/// Precomputed per-day aggregate supplied by the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyMetric {
    pub date: NaiveDate,
    #[serde(default)]
    pub revenue: f64,
    #[serde(default)]
    pub orders: u64,
    #[serde(default)]
    pub active_users: u64,
    #[serde(default)]
    pub new_users: u64,
    #[serde(default)]
    pub conversion_rate: f64,
    #[serde(default)]
    pub average_order_value: f64,
    #[serde(default)]
    pub churn_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    /// `[min_price, max_price]`
    #[serde(default, alias = "price_range")]
    pub price_range: (f64, f64),
}

/// Values offered by the filter widgets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    #[serde(default)]
    pub available_categories: Vec<String>,
    #[serde(default)]
    pub available_regions: Vec<String>,
    #[serde(default)]
    pub available_segments: Vec<String>,
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded document
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub metadata: Metadata,
    #[serde(default)]
    pub summary: Summary,
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub daily_metrics: Vec<DailyMetric>,
    #[serde(default)]
    pub products: Vec<Product>,
    /// Either plain names or objects with a `name` field.
    #[serde(default)]
    pub regions: Vec<serde_json::Value>,
    #[serde(default)]
    pub customer_segments: Vec<serde_json::Value>,
    #[serde(default)]
    pub filters: FilterOptions,
}

impl Dataset {
    /// Number of transactions.
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn date_range(&self) -> DateRange {
        self.metadata.date_range
    }
}
