use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::{Dataset, DateRange};

/// Segments offered when the dataset does not list any.
pub const DEFAULT_SEGMENTS: [&str; 3] = ["Enterprise", "SMB", "Individual"];

/// Semantic problems found after the JSON parsed successfully.
#[derive(Debug, Error, PartialEq)]
pub enum DatasetError {
    #[error("metadata date range is inverted: {start} is after {end}")]
    InvertedDateRange { start: String, end: String },

    #[error("transaction {id} has a non-finite amount")]
    NonFiniteAmount { id: String },
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a KPI dataset from a JSON file.
///
/// Expected top-level layout:
///
/// ```json
/// {
///   "metadata": { "generatedAt": "...", "dateRange": { "start": "2024-01-01", "end": "2024-03-31" } },
///   "summary": { ... },
///   "transactions": [ { "id": "T1", "date": "2024-01-01", "amount": 10.0, ... } ],
///   "dailyMetrics": [ ... ],
///   "products": [ ... ],
///   "filters": { "availableRegions": [...], "availableCategories": [...], "availableSegments": [...] }
/// }
/// ```
pub fn load_file(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading dataset {}", path.display()))?;
    parse_dataset(&text).with_context(|| format!("parsing dataset {}", path.display()))
}

/// Parse, validate and normalise a dataset from JSON text.
pub fn parse_dataset(text: &str) -> Result<Dataset> {
    let mut dataset: Dataset = serde_json::from_str(text).context("parsing dataset JSON")?;
    validate(&dataset)?;
    normalize_filter_options(&mut dataset);

    if dataset.metadata.transaction_count != 0
        && dataset.metadata.transaction_count != dataset.transactions.len()
    {
        log::warn!(
            "metadata declares {} transactions but {} were loaded",
            dataset.metadata.transaction_count,
            dataset.transactions.len()
        );
    }

    Ok(dataset)
}

// ---------------------------------------------------------------------------
// Validation & normalisation
// ---------------------------------------------------------------------------

fn validate(dataset: &Dataset) -> Result<(), DatasetError> {
    let DateRange { start, end } = dataset.metadata.date_range;
    if start > end {
        return Err(DatasetError::InvertedDateRange {
            start: start.to_string(),
            end: end.to_string(),
        });
    }
    if let Some(t) = dataset.transactions.iter().find(|t| !t.amount.is_finite()) {
        return Err(DatasetError::NonFiniteAmount { id: t.id.clone() });
    }
    Ok(())
}

/// Fill empty filter option lists from the top-level lists, then from
/// the transactions themselves.
fn normalize_filter_options(dataset: &mut Dataset) {
    if dataset.filters.available_regions.is_empty() {
        let from_list = labels(&dataset.regions);
        dataset.filters.available_regions = if from_list.is_empty() {
            distinct(dataset.transactions.iter().map(|t| t.region.as_str()))
        } else {
            from_list
        };
    }

    if dataset.filters.available_categories.is_empty() {
        dataset.filters.available_categories =
            distinct(dataset.transactions.iter().map(|t| t.category.as_str()));
    }

    if dataset.filters.available_segments.is_empty() {
        let from_list = labels(&dataset.customer_segments);
        dataset.filters.available_segments = if from_list.is_empty() {
            DEFAULT_SEGMENTS.iter().map(|s| s.to_string()).collect()
        } else {
            from_list
        };
    }
}

/// Extract display names from a list of strings or `{ "name": ... }` objects.
fn labels(values: &[JsonValue]) -> Vec<String> {
    values
        .iter()
        .filter_map(|v| match v {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Object(obj) => obj
                .get("name")
                .and_then(|n| n.as_str())
                .map(|s| s.to_string()),
            _ => None,
        })
        .collect()
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .map(|s| s.to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const MINIMAL: &str = r#"{
        "metadata": {
            "generatedAt": "2024-04-01T00:00:00Z",
            "transactionCount": 2,
            "daysOfData": 3,
            "dateRange": { "start": "2024-01-01", "end": "2024-01-03" }
        },
        "transactions": [
            { "id": "T1", "date": "2024-01-01", "amount": 100.0, "category": "Books",
              "region": "Europe", "customer": { "id": "C1", "segment": "SMB" }, "status": "completed" },
            { "id": "T2", "date": "2024-01-02", "amount": 50.0, "category": "Games",
              "region": "Asia", "customer": { "id": "C2", "segment": "Enterprise" }, "status": "refunded" }
        ],
        "regions": [ { "name": "Asia" }, { "name": "Europe" }, { "name": "Africa" } ]
    }"#;

    #[test]
    fn fills_missing_filter_options() {
        let ds = parse_dataset(MINIMAL).unwrap();
        assert_eq!(ds.filters.available_regions, vec!["Asia", "Europe", "Africa"]);
        assert_eq!(ds.filters.available_categories, vec!["Books", "Games"]);
        assert_eq!(ds.filters.available_segments, DEFAULT_SEGMENTS.to_vec());
        assert!(ds.daily_metrics.is_empty());
        assert_eq!(ds.summary.top_region, "N/A");
    }

    #[test]
    fn keeps_explicit_filter_options() {
        let text = MINIMAL.replace(
            r#""regions""#,
            r#""filters": { "availableRegions": ["Europe"], "availableCategories": ["Books"],
                            "availableSegments": ["SMB"] },
               "regions""#,
        );
        let ds = parse_dataset(&text).unwrap();
        assert_eq!(ds.filters.available_regions, vec!["Europe"]);
        assert_eq!(ds.filters.available_categories, vec!["Books"]);
        assert_eq!(ds.filters.available_segments, vec!["SMB"]);
    }

    #[test]
    fn rejects_inverted_date_range() {
        let text = MINIMAL.replace(
            r#""start": "2024-01-01", "end": "2024-01-03""#,
            r#""start": "2024-02-01", "end": "2024-01-03""#,
        );
        let err = parse_dataset(&text).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DatasetError>(),
            Some(DatasetError::InvertedDateRange { .. })
        ));
    }

    #[test]
    fn reports_malformed_dates() {
        let text = MINIMAL.replace("2024-01-02", "02/01/2024");
        let err = parse_dataset(&text).unwrap_err();
        assert!(format!("{err:#}").contains("parsing dataset JSON"));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        let err = format!("{:#}", load_file(file.path()).unwrap_err());
        let name = file.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(err.contains(&name), "{err}");
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();
        let ds = load_file(file.path()).unwrap();
        assert_eq!(ds.len(), 2);
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = load_file(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(format!("{err:#}").contains("/definitely/not/here.json"));
    }
}
