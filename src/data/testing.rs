//! Small hand-built dataset shared by the unit tests.

use chrono::NaiveDate;

use super::model::{
    Customer, Dataset, DateRange, DailyMetric, FilterOptions, Metadata, Product, Summary,
    Transaction,
};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[allow(clippy::too_many_arguments)]
fn txn(
    id: &str,
    day: u32,
    amount: f64,
    category: &str,
    region: &str,
    customer: &str,
    segment: &str,
    status: &str,
    product_id: &str,
) -> Transaction {
    Transaction {
        id: id.to_string(),
        date: date(2024, 1, day),
        timestamp: format!("2024-01-{day:02}T10:00:00Z"),
        amount,
        product: format!("Product {product_id}"),
        product_id: product_id.to_string(),
        category: category.to_string(),
        region: region.to_string(),
        customer: Customer {
            id: customer.to_string(),
            segment: segment.to_string(),
            lifetime_value: 1000.0,
        },
        payment_method: "card".to_string(),
        status: status.to_string(),
    }
}

fn daily(day: u32, conversion_rate: f64) -> DailyMetric {
    DailyMetric {
        date: date(2024, 1, day),
        revenue: 1000.0,
        orders: 10,
        active_users: 500,
        new_users: 50,
        conversion_rate,
        average_order_value: 100.0,
        churn_rate: 0.01,
    }
}

fn product(id: &str, name: &str, category: &str) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        category: category.to_string(),
        price_range: (10.0, 500.0),
    }
}

/// Seven transactions over January 2024 in three regions.
///
/// Completed revenue 770 (Asia 470, Electronics 600), one refund of 30,
/// one pending sale on a day without a daily metric.
pub fn sample_dataset() -> Dataset {
    let transactions = vec![
        txn("T1", 1, 100.0, "Electronics", "Europe", "C1", "SMB", "completed", "P1"),
        txn("T2", 1, 50.0, "Books", "Asia", "C2", "Enterprise", "Completed", "P2"),
        txn("T3", 2, 200.0, "Electronics", "North America", "C3", "Individual", "completed", "P1"),
        txn("T4", 2, 30.0, "Books", "Europe", "C1", "SMB", "refunded", "P2"),
        txn("T5", 25, 120.0, "Clothing", "Asia", "C4", "SMB", "completed", "P3"),
        txn("T6", 30, 80.0, "Electronics", "Europe", "C2", "Enterprise", "pending", "P1"),
        txn("T7", 31, 300.0, "Electronics", "Asia", "C5", "SMB", "completed", "P1"),
    ];

    Dataset {
        metadata: Metadata {
            generated_at: "2024-02-01T00:00:00Z".to_string(),
            transaction_count: transactions.len(),
            days_of_data: 31,
            date_range: DateRange {
                start: date(2024, 1, 1),
                end: date(2024, 1, 31),
            },
        },
        summary: Summary::default(),
        transactions,
        daily_metrics: vec![daily(1, 0.02), daily(2, 0.04), daily(25, 0.03), daily(31, 0.05)],
        products: vec![
            product("P1", "Laptop", "Electronics"),
            product("P2", "Novel", "Books"),
            product("P3", "Jacket", "Clothing"),
            product("P4", "Headphones", "Electronics"),
        ],
        regions: Vec::new(),
        customer_segments: Vec::new(),
        filters: FilterOptions {
            available_categories: vec![
                "Electronics".to_string(),
                "Books".to_string(),
                "Clothing".to_string(),
            ],
            available_regions: vec![
                "Europe".to_string(),
                "Asia".to_string(),
                "North America".to_string(),
            ],
            available_segments: vec![
                "Enterprise".to_string(),
                "SMB".to_string(),
                "Individual".to_string(),
            ],
        },
    }
}
