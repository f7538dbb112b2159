//! Number formatting shared by the KPI cards, tables and the report.

use crate::data::model::Summary;

/// Format `value` with `decimals` fraction digits and `,` thousands separators.
pub fn grouped(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut out = String::with_capacity(formatted.len() + int_part.len() / 3 + 1);
    if value < 0.0 && formatted.bytes().any(|b| matches!(b, b'1'..=b'9')) {
        out.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// `$1,234` style amount.
pub fn money(value: f64, decimals: usize) -> String {
    let digits = grouped(value, decimals);
    match digits.strip_prefix('-') {
        Some(abs) => format!("-${abs}"),
        None => format!("${digits}"),
    }
}

/// `12.34%` from a value already expressed in percent.
pub fn percent(value: f64) -> String {
    format!("{value:.2}%")
}

pub fn count(n: usize) -> String {
    grouped(n as f64, 0)
}

/// Label / value pairs of the summary table.
pub fn summary_rows(summary: &Summary) -> Vec<(&'static str, String)> {
    vec![
        ("Total Revenue", money(summary.total_revenue, 2)),
        ("Average Order Value", money(summary.average_order_value, 2)),
        ("Conversion Rate", percent(summary.conversion_rate * 100.0)),
        ("Total Customers", count(summary.total_customers)),
        ("Refund Rate", percent(summary.refund_rate)),
        ("Top Region", summary.top_region.clone()),
        ("Top Category", summary.top_category.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands() {
        assert_eq!(grouped(0.0, 0), "0");
        assert_eq!(grouped(999.0, 0), "999");
        assert_eq!(grouped(1000.0, 0), "1,000");
        assert_eq!(grouped(1234567.891, 2), "1,234,567.89");
        assert_eq!(grouped(-1234.5, 1), "-1,234.5");
        assert_eq!(grouped(-0.001, 0), "0");
    }

    #[test]
    fn money_puts_sign_before_currency() {
        assert_eq!(money(770.0, 0), "$770");
        assert_eq!(money(154.0, 2), "$154.00");
        assert_eq!(money(-2500.0, 0), "-$2,500");
    }

    #[test]
    fn summary_rows_format_rates_as_percent() {
        let summary = Summary {
            total_revenue: 1234.5,
            conversion_rate: 0.035,
            refund_rate: 3.896,
            total_customers: 1200,
            ..Summary::default()
        };
        let rows = summary_rows(&summary);
        assert_eq!(rows[0], ("Total Revenue", "$1,234.50".to_string()));
        assert_eq!(rows[2].1, "3.50%");
        assert_eq!(rows[3].1, "1,200");
        assert_eq!(rows[4].1, "3.90%");
        assert_eq!(rows[6].1, "N/A");
    }

    #[test]
    fn percent_and_count() {
        assert_eq!(percent(3.896), "3.90%");
        assert_eq!(count(12345), "12,345");
    }
}
