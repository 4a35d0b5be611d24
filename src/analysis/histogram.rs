//! Year histogram.
//!
//! One bin per record, ordered by publication year. Records sharing a year
//! are not summed; they render as neighbouring bars.

use crate::analysis::views::ViewOptions;
use crate::models::Record;
use serde::{Deserialize, Serialize};

/// One bar of the year histogram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    /// Publication year; `None` when absent or non-numeric. Sorts first.
    pub year: Option<i32>,
    pub intensity: Option<f64>,
}

/// Bin the subset by publication year, ascending.
///
/// With `drop_incomplete`, records lacking a numeric year or an intensity
/// are excluded; otherwise the output has one bin per input record.
pub fn bin(records: &[&Record], options: &ViewOptions) -> Vec<HistogramBin> {
    let mut bins: Vec<HistogramBin> = records
        .iter()
        .map(|r| HistogramBin {
            year: r.year().and_then(parse_year),
            intensity: r.intensity,
        })
        .filter(|b| !options.drop_incomplete || (b.year.is_some() && b.intensity.is_some()))
        .collect();

    // stable: equal years keep subset order
    bins.sort_by_key(|b| b.year);

    bins
}

/// Largest intensity in the histogram, used to scale bars.
pub fn peak_intensity(bins: &[HistogramBin]) -> Option<f64> {
    bins.iter()
        .filter_map(|b| b.intensity)
        .fold(None, |peak, v| match peak {
            Some(p) if p >= v => Some(p),
            _ => Some(v),
        })
}

fn parse_year(text: &str) -> Option<i32> {
    text.trim().parse::<i32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(published: Option<&str>, intensity: Option<f64>) -> Record {
        Record {
            published: published.map(String::from),
            intensity,
            ..Default::default()
        }
    }

    #[test]
    fn test_bins_sorted_by_year() {
        let records = vec![
            record(Some("2021-01-01"), Some(7.0)),
            record(Some("2020-01-01"), Some(5.0)),
        ];
        let refs: Vec<&Record> = records.iter().collect();

        let bins = bin(&refs, &ViewOptions::default());

        assert_eq!(
            bins,
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
    fn test_one_bin_per_record() {
        let records = vec![
            record(Some("2017-03-01"), Some(1.0)),
            record(Some("2016-01-01"), Some(2.0)),
            record(Some("2017-01-01"), Some(3.0)),
            record(None, Some(4.0)),
            record(Some("January, 20 2017"), None),
        ];
        let refs: Vec<&Record> = records.iter().collect();

        let bins = bin(&refs, &ViewOptions::default());

        assert_eq!(bins.len(), records.len());
        // unparseable years sort first, in subset order
        assert_eq!(bins[0].year, None);
        assert_eq!(bins[0].intensity, Some(4.0));
        assert_eq!(bins[1].year, None);
        assert_eq!(bins[2].year, Some(2016));
        // 2017 entries keep their relative order
        assert_eq!(bins[3].intensity, Some(1.0));
        assert_eq!(bins[4].intensity, Some(3.0));
    }

    #[test]
    fn test_drop_incomplete_excludes_unbinnable() {
        let records = vec![
            record(None, Some(4.0)),
            record(Some("2016-01-01"), None),
            record(Some("2016-01-01"), Some(2.0)),
        ];
        let refs: Vec<&Record> = records.iter().collect();

        let bins = bin(
            &refs,
            &ViewOptions {
                drop_incomplete: true,
            },
        );

        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].year, Some(2016));
    }

    #[test]
    fn test_peak_intensity() {
        let bins = vec![
            HistogramBin {
                year: Some(2016),
                intensity: Some(3.0),
            },
            HistogramBin {
                year: Some(2017),
                intensity: None,
            },
            HistogramBin {
                year: Some(2018),
                intensity: Some(9.0),
            },
        ];

        assert_eq!(peak_intensity(&bins), Some(9.0));
        assert_eq!(peak_intensity(&[]), None);
    }
}
