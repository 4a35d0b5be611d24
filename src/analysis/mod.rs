//! Filtering and aggregation engine.
//!
//! Every output here is recomputed from a record snapshot and a filter
//! selection; nothing is cached between calls.

pub mod filter;
pub mod histogram;
pub mod views;
pub mod vocabulary;

pub use filter::filter_records;
pub use histogram::{bin, HistogramBin};
pub use views::{build_all, ChartView, ViewId, ViewOptions};
pub use vocabulary::extract_all;

use crate::models::{FilterSelection, Record, Vocabulary};
use serde::{Deserialize, Serialize};

/// Everything the dashboard renders for one store + selection pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardViews {
    pub vocabularies: Vec<Vocabulary>,
    pub filtered: Vec<Record>,
    pub charts: Vec<ChartView>,
    pub histogram: Vec<HistogramBin>,
}

impl DashboardViews {
    /// Look up a chart view by id.
    #[cfg(test)]
    pub fn chart(&self, id: ViewId) -> Option<&ChartView> {
        self.charts.iter().find(|c| c.id == id)
    }
}

/// Compute vocabularies, the filtered subset and every view.
pub fn compute_views(
    records: &[Record],
    selection: &FilterSelection,
    options: &ViewOptions,
) -> DashboardViews {
    let subset = filter_records(records, selection);
    views_for_subset(extract_all(records), &subset, options)
}

/// Build the views for a subset that was filtered elsewhere (for example by
/// the remote filter endpoint), keeping the given vocabularies.
pub fn views_for_subset(
    vocabularies: Vec<Vocabulary>,
    subset: &[&Record],
    options: &ViewOptions,
) -> DashboardViews {
    DashboardViews {
        vocabularies,
        filtered: subset.iter().map(|&r| r.clone()).collect(),
        charts: build_all(subset, options),
        histogram: bin(subset, options),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Choice, Field};

    fn asia(intensity: f64, likelihood: f64, published: &str) -> Record {
        Record {
            region: Some("Asia".to_string()),
            intensity: Some(intensity),
            likelihood: Some(likelihood),
            published: Some(published.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_two_asia_records_scenario() {
        let records = vec![asia(5.0, 1.0, "2020-01-01"), asia(7.0, 2.0, "2021-01-01")];

        let views = compute_views(&records, &FilterSelection::default(), &ViewOptions::default());

        assert_eq!(views.filtered, records);

        let relevance = views.chart(ViewId::RegionRelevance).unwrap();
        assert_eq!(relevance.labels, vec!["Asia", "Asia"]);

        assert_eq!(
            views.histogram,
            vec![
                HistogramBin {
                    year: Some(2020),
                    intensity: Some(5.0)
                },
                HistogramBin {
                    year: Some(2021),
                    intensity: Some(7.0)
                },
            ]
        );
    }

    #[test]
    fn test_unmatched_country_gives_empty_views() {
        let records = vec![asia(5.0, 1.0, "2020-01-01")];
        let selection = FilterSelection::default().with(Field::Country, Choice::parse("India"));

        let views = compute_views(&records, &selection, &ViewOptions::default());

        assert!(views.filtered.is_empty());
        assert!(views.histogram.is_empty());
        for chart in &views.charts {
            assert!(chart.labels.is_empty());
            assert!(chart.series.iter().all(|s| s.values.is_empty()));
        }
        // vocabularies still describe the whole store
        let regions = views
            .vocabularies
            .iter()
            .find(|v| v.field == Field::Region)
            .unwrap();
        assert_eq!(regions.len(), 2);
    }

    #[test]
    fn test_topics_scenario() {
        let records = vec![
            Record {
                topic: Some("Health".to_string()),
                ..Default::default()
            },
            Record {
                topic: Some("Legal".to_string()),
                ..Default::default()
            },
        ];
        let selection = FilterSelection::default().with_topics(["Health", "Finance"]);

        let views = compute_views(&records, &selection, &ViewOptions::default());

        assert_eq!(views.filtered.len(), 1);
        assert_eq!(views.filtered[0].topic.as_deref(), Some("Health"));
    }

    #[test]
    fn test_histogram_matches_subset_length() {
        let records = vec![
            asia(5.0, 1.0, "2020-01-01"),
            asia(6.0, 1.0, "2020-06-01"),
            Record::default(),
        ];

        let views = compute_views(&records, &FilterSelection::default(), &ViewOptions::default());

        assert_eq!(views.histogram.len(), views.filtered.len());
    }

    #[test]
    fn test_compute_views_is_pure() {
        let records = vec![asia(5.0, 10.0, "2020-01-01"), asia(7.0, 2.0, "2021-01-01")];
        let selection = FilterSelection::default().with(Field::Year, Choice::parse("20"));

        let first = compute_views(&records, &selection, &ViewOptions::default());
        let second = compute_views(&records, &selection, &ViewOptions::default());

        assert_eq!(first, second);
    }

    #[test]
    fn test_views_for_prefiltered_subset() {
        let store = vec![asia(5.0, 1.0, "2020-01-01"), asia(7.0, 2.0, "2021-01-01")];
        let remote = vec![asia(7.0, 2.0, "2021-01-01")];
        let subset: Vec<&Record> = remote.iter().collect();

        let views = views_for_subset(extract_all(&store), &subset, &ViewOptions::default());

        assert_eq!(views.filtered.len(), 1);
        let years = views
            .vocabularies
            .iter()
            .find(|v| v.field == Field::Year)
            .unwrap();
        assert_eq!(years.len(), 3);
    }
}
