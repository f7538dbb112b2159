use std::collections::BTreeSet;
use std::fmt;

use chrono::{Days, NaiveDate};

use super::model::{Dataset, DateRange, Transaction};

// ---------------------------------------------------------------------------
// Period presets
// ---------------------------------------------------------------------------

/// Period selector offered in the side panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePreset {
    AllTime,
    Last7Days,
    Last30Days,
    Last90Days,
    Custom,
}

impl DatePreset {
    pub const ALL: [DatePreset; 5] = [
        DatePreset::AllTime,
        DatePreset::Last7Days,
        DatePreset::Last30Days,
        DatePreset::Last90Days,
        DatePreset::Custom,
    ];

    fn lookback_days(self) -> Option<u64> {
        match self {
            DatePreset::Last7Days => Some(7),
            DatePreset::Last30Days => Some(30),
            DatePreset::Last90Days => Some(90),
            DatePreset::AllTime | DatePreset::Custom => None,
        }
    }
}

impl fmt::Display for DatePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DatePreset::AllTime => "All Time",
            DatePreset::Last7Days => "Last 7 Days",
            DatePreset::Last30Days => "Last 30 Days",
            DatePreset::Last90Days => "Last 90 Days",
            DatePreset::Custom => "Custom Range",
        };
        write!(f, "{label}")
    }
}

// ---------------------------------------------------------------------------
// Segment choice
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SegmentChoice {
    #[default]
    All,
    Only(String),
}

impl SegmentChoice {
    pub fn matches(&self, segment: &str) -> bool {
        match self {
            SegmentChoice::All => true,
            SegmentChoice::Only(s) => s == segment,
        }
    }
}

impl fmt::Display for SegmentChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentChoice::All => write!(f, "All"),
            SegmentChoice::Only(s) => write!(f, "{s}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Filter state
// ---------------------------------------------------------------------------

/// Everything the user has selected in the filter panel.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    pub preset: DatePreset,
    /// Bounds used when `preset` is [`DatePreset::Custom`].
    pub custom: DateRange,
    pub regions: BTreeSet<String>,
    pub categories: BTreeSet<String>,
    pub segment: SegmentChoice,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            preset: DatePreset::AllTime,
            custom: DateRange {
                start: NaiveDate::MIN,
                end: NaiveDate::MAX,
            },
            regions: BTreeSet::new(),
            categories: BTreeSet::new(),
            segment: SegmentChoice::All,
        }
    }
}

impl FilterState {
    /// Start with everything selected over the whole dataset range.
    pub fn for_dataset(dataset: &Dataset) -> Self {
        Self {
            preset: DatePreset::AllTime,
            custom: dataset.date_range(),
            regions: dataset.filters.available_regions.iter().cloned().collect(),
            categories: dataset.filters.available_categories.iter().cloned().collect(),
            segment: SegmentChoice::All,
        }
    }

    /// Resolve the preset against the dataset's range.
    ///
    /// "Last N days" counts back from the last day of the dataset, not
    /// from today.
    pub fn date_range(&self, bounds: DateRange) -> DateRange {
        match self.preset {
            DatePreset::AllTime => bounds,
            DatePreset::Custom => self.custom,
            preset => {
                let days = preset.lookback_days().unwrap_or_default();
                let start = bounds
                    .end
                    .checked_sub_days(Days::new(days))
                    .unwrap_or(NaiveDate::MIN);
                DateRange {
                    start,
                    end: bounds.end,
                }
            }
        }
    }

    pub fn matches(&self, t: &Transaction, range: DateRange) -> bool {
        range.contains(t.date)
            && self.regions.contains(&t.region)
            && self.categories.contains(&t.category)
            && self.segment.matches(t.segment())
    }
}

/// Return indices of transactions that pass all active filters, in
/// dataset order.
///
/// An empty region or category selection means nothing is selected, so
/// nothing passes.
pub fn filtered_indices(dataset: &Dataset, filters: &FilterState) -> Vec<usize> {
    let range = filters.date_range(dataset.date_range());
    dataset
        .transactions
        .iter()
        .enumerate()
        .filter(|(_, t)| filters.matches(t, range))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::data::testing::{date, sample_dataset};

    #[test]
    fn default_filters_keep_everything() {
        let ds = sample_dataset();
        let filters = FilterState::for_dataset(&ds);
        assert_eq!(filtered_indices(&ds, &filters), (0..ds.len()).collect::<Vec<_>>());
    }

    #[test]
    fn last_seven_days_counts_back_from_dataset_end() {
        let ds = sample_dataset();
        let mut filters = FilterState::for_dataset(&ds);
        filters.preset = DatePreset::Last7Days;
        let range = filters.date_range(ds.date_range());
        assert_eq!(range.end, date(2024, 1, 31));
        assert_eq!(range.start, date(2024, 1, 24));

        for i in filtered_indices(&ds, &filters) {
            assert!(ds.transactions[i].date >= date(2024, 1, 24));
        }
    }

    #[test]
    fn custom_range_is_inclusive() {
        let ds = sample_dataset();
        let mut filters = FilterState::for_dataset(&ds);
        filters.preset = DatePreset::Custom;
        filters.custom = DateRange {
            start: date(2024, 1, 2),
            end: date(2024, 1, 2),
        };
        let ids: Vec<&str> = filtered_indices(&ds, &filters)
            .into_iter()
            .map(|i| ds.transactions[i].id.as_str())
            .collect();
        assert_eq!(ids, vec!["T3", "T4"]);
    }

    #[test]
    fn empty_region_selection_passes_nothing() {
        let ds = sample_dataset();
        let mut filters = FilterState::for_dataset(&ds);
        filters.regions.clear();
        assert!(filtered_indices(&ds, &filters).is_empty());
    }

    #[test]
    fn segment_and_category_combine() {
        let ds = sample_dataset();
        let mut filters = FilterState::for_dataset(&ds);
        filters.segment = SegmentChoice::Only("SMB".into());
        filters.categories = ["Electronics".to_string()].into();
        for i in filtered_indices(&ds, &filters) {
            let t = &ds.transactions[i];
            assert_eq!(t.segment(), "SMB");
            assert_eq!(t.category, "Electronics");
        }
        assert!(!filtered_indices(&ds, &filters).is_empty());
    }

    proptest! {
        #[test]
        fn narrowing_regions_never_adds_rows(mask in proptest::collection::vec(any::<bool>(), 3)) {
            let ds = sample_dataset();
            let all = FilterState::for_dataset(&ds);
            let mut narrowed = all.clone();
            narrowed.regions = ds.filters.available_regions
                .iter()
                .zip(&mask)
                .filter(|(_, keep)| **keep)
                .map(|(r, _)| r.clone())
                .collect();

            let full = filtered_indices(&ds, &all);
            let subset = filtered_indices(&ds, &narrowed);
            prop_assert!(subset.iter().all(|i| full.contains(i)));
            prop_assert!(subset.iter().all(|&i| narrowed.regions.contains(&ds.transactions[i].region)));
        }
    }
}
