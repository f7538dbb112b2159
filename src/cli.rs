use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};

use crate::color::ColorMap;
use crate::data::filter::{filtered_indices, DatePreset, FilterState, SegmentChoice};
use crate::data::loader;
use crate::data::model::{Dataset, DateRange};
use crate::report;

/// Dataset opened when no path is given on the command line.
pub const DEFAULT_DATASET: &str = "data/kpi_dataset_small.json";

#[derive(Parser, Debug)]
#[command(name = "kpi-dashboard", version, about = "Business performance dashboard")]
pub struct Cli {
    /// Dataset JSON file to open
    pub data: Option<PathBuf>,

    /// Write the HTML report to OUT and exit without opening a window
    #[arg(long, value_name = "OUT")]
    pub report: Option<PathBuf>,

    /// Period for the report
    #[arg(long, value_enum, default_value_t = Period::All)]
    pub period: Period,

    /// First day of a custom range (overrides --period)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub from: Option<NaiveDate>,

    /// Last day of a custom range (overrides --period)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub to: Option<NaiveDate>,

    /// Only include this region (repeatable)
    #[arg(long = "region", value_name = "REGION")]
    pub regions: Vec<String>,

    /// Only include this category (repeatable)
    #[arg(long = "category", value_name = "CATEGORY")]
    pub categories: Vec<String>,

    /// Only include this customer segment
    #[arg(long)]
    pub segment: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Period {
    All,
    #[value(name = "7d")]
    Last7,
    #[value(name = "30d")]
    Last30,
    #[value(name = "90d")]
    Last90,
}

impl From<Period> for DatePreset {
    fn from(p: Period) -> Self {
        match p {
            Period::All => DatePreset::AllTime,
            Period::Last7 => DatePreset::Last7Days,
            Period::Last30 => DatePreset::Last30Days,
            Period::Last90 => DatePreset::Last90Days,
        }
    }
}

impl Cli {
    /// Dataset to open at startup: the argument, else the default file
    /// when present.
    pub fn dataset_path(&self) -> Option<PathBuf> {
        self.data.clone().or_else(|| {
            let default = PathBuf::from(DEFAULT_DATASET);
            default.exists().then_some(default)
        })
    }

    /// Build the filter state described by the flags.
    pub fn filters(&self, dataset: &Dataset) -> Result<FilterState> {
        let mut filters = FilterState::for_dataset(dataset);

        if self.from.is_some() || self.to.is_some() {
            let bounds = dataset.date_range();
            let custom = DateRange {
                start: self.from.unwrap_or(bounds.start),
                end: self.to.unwrap_or(bounds.end),
            };
            if custom.start > custom.end {
                bail!("--from {} is after --to {}", custom.start, custom.end);
            }
            filters.preset = DatePreset::Custom;
            filters.custom = custom;
        } else {
            filters.preset = self.period.into();
        }

        if !self.regions.is_empty() {
            filters.regions = checked("region", &self.regions, &dataset.filters.available_regions)?;
        }
        if !self.categories.is_empty() {
            filters.categories =
                checked("category", &self.categories, &dataset.filters.available_categories)?;
        }
        if let Some(segment) = &self.segment {
            if !dataset.filters.available_segments.contains(segment) {
                bail!(
                    "unknown segment '{segment}', expected one of: {}",
                    dataset.filters.available_segments.join(", ")
                );
            }
            filters.segment = SegmentChoice::Only(segment.clone());
        }

        Ok(filters)
    }
}

fn checked(
    what: &str,
    requested: &[String],
    available: &[String],
) -> Result<std::collections::BTreeSet<String>> {
    if let Some(unknown) = requested.iter().find(|r| !available.contains(r)) {
        bail!(
            "unknown {what} '{unknown}', expected one of: {}",
            available.join(", ")
        );
    }
    Ok(requested.iter().cloned().collect())
}

/// Load the dataset, apply the flag filters and write the report.
pub fn write_report(cli: &Cli, data: &Path, out: &Path) -> Result<()> {
    let dataset = loader::load_file(data)?;
    let filters = cli.filters(&dataset)?;
    let indices = filtered_indices(&dataset, &filters);
    log::info!(
        "Rendering report for {} of {} transactions",
        indices.len(),
        dataset.len()
    );

    let colors = ColorMap::new(&dataset.filters.available_regions);
    let period = filters.date_range(dataset.date_range());
    let html = report::render_report(&dataset, &indices, period, &colors)?;
    std::fs::write(out, html).with_context(|| format!("writing report {}", out.display()))?;
    log::info!("Wrote report to {}", out.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::testing::{date, sample_dataset};

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("kpi-dashboard").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_select_everything() {
        let ds = sample_dataset();
        let cli = parse(&[]);
        assert_eq!(cli.filters(&ds).unwrap(), FilterState::for_dataset(&ds));
    }

    #[test]
    fn period_and_dimensions() {
        let ds = sample_dataset();
        let cli = parse(&["--period", "7d", "--region", "Asia", "--region", "Europe", "--segment", "SMB"]);
        let filters = cli.filters(&ds).unwrap();
        assert_eq!(filters.preset, DatePreset::Last7Days);
        assert_eq!(filters.regions.len(), 2);
        assert_eq!(filters.segment, SegmentChoice::Only("SMB".into()));
        // T5 and T7
        assert_eq!(filtered_indices(&ds, &filters), vec![4, 6]);
    }

    #[test]
    fn custom_range_fills_missing_bound() {
        let ds = sample_dataset();
        let filters = parse(&["--from", "2024-01-25"]).filters(&ds).unwrap();
        assert_eq!(filters.preset, DatePreset::Custom);
        assert_eq!(filters.custom.start, date(2024, 1, 25));
        assert_eq!(filters.custom.end, date(2024, 1, 31));
    }

    #[test]
    fn rejects_unknown_values() {
        let ds = sample_dataset();
        assert!(parse(&["--region", "Atlantis"]).filters(&ds).is_err());
        assert!(parse(&["--segment", "Government"]).filters(&ds).is_err());
        assert!(parse(&["--from", "2024-02-01", "--to", "2024-01-01"]).filters(&ds).is_err());
        assert!(Cli::try_parse_from(["kpi-dashboard", "--from", "yesterday"]).is_err());
    }

    #[test]
    fn headless_report_end_to_end() {
        let ds = sample_dataset();
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data.json");
        std::fs::write(&data, serde_json::to_string(&ds).unwrap()).unwrap();
        let out = dir.path().join("report.html");

        let cli = parse(&["--category", "Books"]);
        write_report(&cli, &data, &out).unwrap();

        let html = std::fs::read_to_string(&out).unwrap();
        assert!(html.contains(r#""id":"T2""#));
        assert!(!html.contains(r#""id":"T1""#));

        let cli = parse(&["--from", "2024-01-02", "--to", "2024-01-25"]);
        write_report(&cli, &data, &out).unwrap();
        let html = std::fs::read_to_string(&out).unwrap();
        assert!(html.contains("2024-01-02 to 2024-01-25"));
    }
}
