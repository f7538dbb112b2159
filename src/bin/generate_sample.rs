use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};
use serde_json::{json, Value};

const DEFAULT_OUTPUT: &str = "data/kpi_dataset_small.json";
const DAYS: u64 = 90;

const REGIONS: [&str; 5] = ["North America", "Europe", "Asia Pacific", "Latin America", "Middle East"];
const SEGMENTS: [(&str, f64); 3] = [("Enterprise", 0.2), ("SMB", 0.35), ("Individual", 0.45)];
const PAYMENT_METHODS: [&str; 4] = ["credit_card", "paypal", "bank_transfer", "crypto"];

/// (id, name, category, min price, max price)
const PRODUCTS: [(&str, &str, &str, f64, f64); 8] = [
    ("P001", "Laptop Pro", "Electronics", 900.0, 2400.0),
    ("P002", "Wireless Earbuds", "Electronics", 40.0, 250.0),
    ("P003", "Office Chair", "Furniture", 120.0, 650.0),
    ("P004", "Standing Desk", "Furniture", 300.0, 1100.0),
    ("P005", "Running Shoes", "Apparel", 60.0, 180.0),
    ("P006", "Rain Jacket", "Apparel", 45.0, 220.0),
    ("P007", "Cloud Storage Plan", "Software", 10.0, 120.0),
    ("P008", "Design Suite", "Software", 50.0, 600.0),
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    fn index(&mut self, len: usize) -> usize {
        (self.next_u64() % len as u64) as usize
    }

    /// Pick from `(item, weight)` pairs.
    fn weighted<'a>(&mut self, items: &[(&'a str, f64)]) -> &'a str {
        let total: f64 = items.iter().map(|(_, w)| w).sum();
        let mut roll = self.range(0.0, total);
        for (item, w) in items {
            if roll < *w {
                return *item;
            }
            roll -= w;
        }
        items[items.len() - 1].0
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[derive(Default)]
struct Day {
    revenue: f64,
    orders: u64,
    customers: BTreeSet<String>,
}

fn main() -> Result<()> {
    let output = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    let mut rng = SimpleRng::new(42);
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).context("invalid start date")?;
    let end = start + Days::new(DAYS - 1);

    // Customer pool with a fixed segment each.
    let customers: Vec<(String, &str, f64)> = (1..=400)
        .map(|i| {
            let segment = rng.weighted(&SEGMENTS);
            let ltv = match segment {
                "Enterprise" => rng.range(5_000.0, 50_000.0),
                "SMB" => rng.range(1_000.0, 10_000.0),
                _ => rng.range(50.0, 2_000.0),
            };
            (format!("C{i:04}"), segment, round2(ltv))
        })
        .collect();

    let mut transactions: Vec<Value> = Vec::new();
    let mut days: BTreeMap<NaiveDate, Day> = BTreeMap::new();
    let mut completed_revenue = 0.0;
    let mut completed_orders = 0u64;
    let mut refunded = 0.0;
    let mut by_region: BTreeMap<&str, f64> = BTreeMap::new();
    let mut by_category: BTreeMap<&str, f64> = BTreeMap::new();
    let mut all_customers: BTreeSet<&str> = BTreeSet::new();

    for offset in 0..DAYS {
        let date = start + Days::new(offset);
        // Slow growth so the trend KPI has something to show.
        let orders_today = 12 + (offset / 6) as usize + rng.index(8);
        let day = days.entry(date).or_default();

        for _ in 0..orders_today {
            let (pid, name, category, lo, hi) = PRODUCTS[rng.index(PRODUCTS.len())];
            let (cid, segment, ltv) = &customers[rng.index(customers.len())];
            let region = REGIONS[rng.index(REGIONS.len())];
            let amount = round2(rng.range(lo, hi));
            let status = rng.weighted(&[("completed", 0.9), ("refunded", 0.05), ("pending", 0.05)]);

            match status {
                "completed" => {
                    completed_revenue += amount;
                    completed_orders += 1;
                    *by_region.entry(region).or_default() += amount;
                    *by_category.entry(category).or_default() += amount;
                }
                "refunded" => refunded += amount,
                _ => {}
            }
            all_customers.insert(cid.as_str());
            day.revenue += amount;
            day.orders += 1;
            day.customers.insert(cid.clone());

            let id = format!("TXN{:06}", transactions.len() + 1);
            let seconds = rng.index(86_400);
            transactions.push(json!({
                "id": id,
                "date": date.to_string(),
                "timestamp": format!(
                    "{date}T{:02}:{:02}:{:02}",
                    seconds / 3600,
                    seconds / 60 % 60,
                    seconds % 60
                ),
                "amount": amount,
                "product": name,
                "productId": pid,
                "category": category,
                "region": region,
                "customer": { "id": cid, "segment": segment, "lifetimeValue": ltv },
                "paymentMethod": PAYMENT_METHODS[rng.index(PAYMENT_METHODS.len())],
                "status": status,
            }));
        }
    }

    let daily_metrics: Vec<Value> = days
        .iter()
        .map(|(date, day)| {
            let active = day.customers.len() as u64 * 12 + rng.index(200) as u64;
            json!({
                "date": date.to_string(),
                "revenue": round2(day.revenue),
                "orders": day.orders,
                "activeUsers": active,
                "newUsers": active / 10 + rng.index(20) as u64,
                "conversionRate": round2(rng.range(1.5, 4.5)) / 100.0,
                "averageOrderValue": round2(day.revenue / day.orders.max(1) as f64),
                "churnRate": round2(rng.range(0.5, 3.0)) / 100.0,
            })
        })
        .collect();

    let conversion: f64 = daily_metrics
        .iter()
        .filter_map(|m| m["conversionRate"].as_f64())
        .sum::<f64>()
        / daily_metrics.len().max(1) as f64;
    let top = |totals: &BTreeMap<&str, f64>| {
        totals
            .iter()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(name, _)| name.to_string())
            .unwrap_or_else(|| "N/A".to_string())
    };

    let mut categories: Vec<&str> = PRODUCTS.iter().map(|p| p.2).collect();
    categories.dedup();

    let dataset = json!({
        "metadata": {
            "generatedAt": "2024-04-01T00:00:00",
            "transactionCount": transactions.len(),
            "daysOfData": DAYS,
            "dateRange": { "start": start.to_string(), "end": end.to_string() },
        },
        "summary": {
            "totalRevenue": round2(completed_revenue),
            "averageOrderValue": round2(completed_revenue / completed_orders.max(1) as f64),
            "conversionRate": conversion,
            "totalCustomers": all_customers.len(),
            "refundRate": round2(refunded / completed_revenue.max(f64::MIN_POSITIVE) * 100.0),
            "topRegion": top(&by_region),
            "topCategory": top(&by_category),
        },
        "transactions": transactions,
        "dailyMetrics": daily_metrics,
        "products": PRODUCTS.iter().map(|(id, name, category, lo, hi)| json!({
            "id": id, "name": name, "category": category, "priceRange": [lo, hi],
        })).collect::<Vec<_>>(),
        "regions": REGIONS.iter().map(|r| json!({ "name": r })).collect::<Vec<_>>(),
        "customerSegments": SEGMENTS.iter().map(|(s, _)| json!({ "name": s })).collect::<Vec<_>>(),
        "filters": {
            "availableCategories": categories,
            "availableRegions": REGIONS,
            "availableSegments": SEGMENTS.iter().map(|(s, _)| *s).collect::<Vec<_>>(),
        },
    });

    if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let text = serde_json::to_string_pretty(&dataset)?;
    std::fs::write(&output, text).with_context(|| format!("writing {}", output.display()))?;

    println!(
        "Wrote {} transactions over {DAYS} days to {}",
        transactions.len(),
        output.display()
    );
    Ok(())
}
