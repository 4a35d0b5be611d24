//! Chart-ready views of a filtered subset.
//!
//! Every builder is a pure function of the subset. Except for the
//! likelihood view, each record contributes exactly one label/value pair:
//! repeated regions or topics are emitted verbatim, never merged.

use crate::models::Record;
use serde::{Deserialize, Serialize};

/// Identifies one of the dashboard's chart views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewId {
    LikelihoodIntensity,
    RegionRelevance,
    RegionImpact,
    TopicIntensity,
    TopicIntensityTrend,
}

/// Chart type the presentation layer should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Doughnut,
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegendPosition {
    Top,
    Right,
}

/// Named color sets used by the series styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Palette {
    Teal,
    Rose,
    /// Cycles rose, amber and blue; used by the doughnuts.
    Tricolor,
}

impl Palette {
    /// Fill colors, translucent.
    pub fn background(&self) -> &'static [&'static str] {
        match self {
            Palette::Teal => &["rgba(75,192,192,0.2)"],
            Palette::Rose => &["rgba(255,99,132,0.2)"],
            Palette::Tricolor => &[
                "rgba(255,99,132,0.2)",
                "rgba(255,205,86,0.2)",
                "rgba(54,162,235,0.2)",
            ],
        }
    }

    /// Border colors, opaque.
    pub fn border(&self) -> &'static [&'static str] {
        match self {
            Palette::Teal => &["rgba(75,192,192,1)"],
            Palette::Rose => &["rgba(255,99,132,1)"],
            Palette::Tricolor => &[
                "rgba(255,99,132,1)",
                "rgba(255,205,86,1)",
                "rgba(54,162,235,1)",
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesStyle {
    pub palette: Palette,
    pub background: Vec<String>,
    pub border: Vec<String>,
    pub border_width: u8,
    /// Whether the area under a line is filled.
    pub fill: bool,
}

impl SeriesStyle {
    fn new(palette: Palette, border_width: u8, fill: bool) -> Self {
        Self {
            palette,
            background: palette.background().iter().map(|c| c.to_string()).collect(),
            border: palette.border().iter().map(|c| c.to_string()).collect(),
            border_width,
            fill,
        }
    }
}

/// One data series; `None` values are gaps in the chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<Option<f64>>,
    pub style: SeriesStyle,
}

/// Presentation hints. Configuration only; no data depends on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Presentation {
    pub kind: ChartKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_axis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_axis: Option<String>,
    pub legend: LegendPosition,
    pub begin_at_zero: bool,
}

impl Presentation {
    fn cartesian(kind: ChartKind, title: &str, x_axis: &str, y_axis: &str) -> Self {
        Self {
            kind,
            title: title.to_string(),
            x_axis: Some(x_axis.to_string()),
            y_axis: Some(y_axis.to_string()),
            legend: LegendPosition::Top,
            begin_at_zero: kind == ChartKind::Bar,
        }
    }

    fn doughnut(title: &str) -> Self {
        Self {
            kind: ChartKind::Doughnut,
            title: title.to_string(),
            x_axis: None,
            y_axis: None,
            legend: LegendPosition::Right,
            begin_at_zero: false,
        }
    }
}

/// A derived label/value structure ready for visualization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartView {
    pub id: ViewId,
    pub labels: Vec<String>,
    pub series: Vec<Series>,
    pub presentation: Presentation,
}

impl ChartView {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Null-handling policy shared by every view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewOptions {
    /// Drop records lacking the label or the value a view plots.
    ///
    /// When false, only the likelihood view drops records (those without a
    /// likelihood) and the others emit `None` gaps.
    pub drop_incomplete: bool,
}

/// Likelihood→Intensity bar series, sorted by the string form of the
/// likelihood ("10" sorts before "2").
pub fn likelihood_intensity(records: &[&Record], options: &ViewOptions) -> ChartView {
    let mut rows: Vec<(String, Option<f64>)> = records
        .iter()
        .filter_map(|r| r.likelihood.map(|l| (l.to_string(), r.intensity)))
        .filter(|(_, intensity)| !options.drop_incomplete || intensity.is_some())
        .collect();

    rows.sort_by(|a, b| a.0.cmp(&b.0));

    let (labels, values) = rows.into_iter().unzip();

    ChartView {
        id: ViewId::LikelihoodIntensity,
        labels,
        series: vec![Series {
            name: "Intensity".to_string(),
            values,
            style: SeriesStyle::new(Palette::Teal, 1, true),
        }],
        presentation: Presentation::cartesian(
            ChartKind::Bar,
            "Likelihood-Intensity Chart",
            "Likelihood",
            "Intensity",
        ),
    }
}

/// Region→Relevance doughnut, one slice per record.
pub fn region_relevance(records: &[&Record], options: &ViewOptions) -> ChartView {
    let (labels, values) = per_record(records, options, |r| r.region.as_deref(), |r| r.relevance);

    ChartView {
        id: ViewId::RegionRelevance,
        labels,
        series: vec![Series {
            name: "Relevance".to_string(),
            values,
            style: SeriesStyle::new(Palette::Tricolor, 1, true),
        }],
        presentation: Presentation::doughnut("Region-Relevance Chart"),
    }
}

/// Region→Impact bar series, one bar per record.
pub fn region_impact(records: &[&Record], options: &ViewOptions) -> ChartView {
    let (labels, values) = per_record(records, options, |r| r.region.as_deref(), |r| r.impact);

    ChartView {
        id: ViewId::RegionImpact,
        labels,
        series: vec![Series {
            name: "Impact".to_string(),
            values,
            style: SeriesStyle::new(Palette::Rose, 1, true),
        }],
        presentation: Presentation::cartesian(
            ChartKind::Bar,
            "Region-Impact Chart",
            "Region",
            "Impact",
        ),
    }
}

/// Topic→Intensity doughnut, one slice per record.
pub fn topic_intensity(records: &[&Record], options: &ViewOptions) -> ChartView {
    let (labels, values) = per_record(records, options, |r| r.topic.as_deref(), |r| r.intensity);

    ChartView {
        id: ViewId::TopicIntensity,
        labels,
        series: vec![Series {
            name: "Intensity".to_string(),
            values,
            style: SeriesStyle::new(Palette::Tricolor, 1, true),
        }],
        presentation: Presentation::doughnut("Topic-Intensity Chart"),
    }
}

/// Topic→Intensity line series, one point per record.
pub fn topic_intensity_trend(records: &[&Record], options: &ViewOptions) -> ChartView {
    let (labels, values) = per_record(records, options, |r| r.topic.as_deref(), |r| r.intensity);

    ChartView {
        id: ViewId::TopicIntensityTrend,
        labels,
        series: vec![Series {
            name: "Intensity".to_string(),
            values,
            style: SeriesStyle::new(Palette::Teal, 2, false),
        }],
        presentation: Presentation::cartesian(
            ChartKind::Line,
            "Topic-Intensity Relationship",
            "Topic",
            "Intensity",
        ),
    }
}

/// Build every chart view, in dashboard order.
pub fn build_all(records: &[&Record], options: &ViewOptions) -> Vec<ChartView> {
    vec![
        likelihood_intensity(records, options),
        region_relevance(records, options),
        region_impact(records, options),
        topic_intensity(records, options),
        topic_intensity_trend(records, options),
    ]
}

fn per_record<L, V>(
    records: &[&Record],
    options: &ViewOptions,
    label_of: L,
    value_of: V,
) -> (Vec<String>, Vec<Option<f64>>)
where
    L: Fn(&Record) -> Option<&str>,
    V: Fn(&Record) -> Option<f64>,
{
    records
        .iter()
        .map(|&r| (label_of(r), value_of(r)))
        .filter(|(label, value)| !options.drop_incomplete || (label.is_some() && value.is_some()))
        .map(|(label, value)| (label.unwrap_or_default().to_string(), value))
        .unzip()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(region: Option<&str>, likelihood: Option<f64>, intensity: Option<f64>) -> Record {
        Record {
            region: region.map(String::from),
            topic: Some("oil".to_string()),
            likelihood,
            intensity,
            relevance: intensity.map(|i| i / 2.0),
            impact: Some(1.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_likelihood_sorted_lexicographically() {
        let records = vec![
            record(Some("Asia"), Some(2.0), Some(20.0)),
            record(Some("Asia"), Some(10.0), Some(100.0)),
            record(Some("Asia"), Some(1.0), Some(10.0)),
        ];
        let refs: Vec<&Record> = records.iter().collect();

        let view = likelihood_intensity(&refs, &ViewOptions::default());

        assert_eq!(view.labels, vec!["1", "10", "2"]);
        assert_eq!(
            view.series[0].values,
            vec![Some(10.0), Some(100.0), Some(20.0)]
        );
    }

    #[test]
    fn test_likelihood_drops_null_likelihood() {
        let records = vec![
            record(Some("Asia"), None, Some(5.0)),
            record(Some("Asia"), Some(3.0), None),
        ];
        let refs: Vec<&Record> = records.iter().collect();

        let view = likelihood_intensity(&refs, &ViewOptions::default());
        assert_eq!(view.labels, vec!["3"]);
        assert_eq!(view.series[0].values, vec![None]);
        assert_eq!(view.labels.len(), view.series[0].values.len());

        let strict = likelihood_intensity(
            &refs,
            &ViewOptions {
                drop_incomplete: true,
            },
        );
        assert!(strict.is_empty());
    }

    #[test]
    fn test_region_views_do_not_merge_labels() {
        let records = vec![
            record(Some("Asia"), Some(1.0), Some(5.0)),
            record(Some("Asia"), Some(2.0), Some(7.0)),
        ];
        let refs: Vec<&Record> = records.iter().collect();

        let relevance = region_relevance(&refs, &ViewOptions::default());
        assert_eq!(relevance.labels, vec!["Asia", "Asia"]);
        assert_eq!(relevance.series[0].values, vec![Some(2.5), Some(3.5)]);

        let impact = region_impact(&refs, &ViewOptions::default());
        assert_eq!(impact.labels, vec!["Asia", "Asia"]);
        assert_eq!(impact.series[0].values, vec![Some(1.0), Some(1.0)]);
    }

    #[test]
    fn test_per_record_views_keep_gaps_by_default() {
        let records = vec![
            record(None, Some(1.0), None),
            record(Some("Europe"), Some(1.0), Some(4.0)),
        ];
        let refs: Vec<&Record> = records.iter().collect();

        let lenient = region_relevance(&refs, &ViewOptions::default());
        assert_eq!(lenient.labels, vec!["", "Europe"]);
        assert_eq!(lenient.series[0].values, vec![None, Some(2.0)]);

        let strict = region_relevance(
            &refs,
            &ViewOptions {
                drop_incomplete: true,
            },
        );
        assert_eq!(strict.labels, vec!["Europe"]);
        assert_eq!(strict.series[0].values, vec![Some(2.0)]);
    }

    #[test]
    fn test_topic_variants_share_data() {
        let records = vec![
            record(Some("Asia"), Some(1.0), Some(5.0)),
            record(Some("Asia"), Some(2.0), Some(7.0)),
        ];
        let refs: Vec<&Record> = records.iter().collect();

        let doughnut = topic_intensity(&refs, &ViewOptions::default());
        let line = topic_intensity_trend(&refs, &ViewOptions::default());

        assert_eq!(doughnut.labels, line.labels);
        assert_eq!(doughnut.series[0].values, line.series[0].values);
        assert_eq!(doughnut.presentation.kind, ChartKind::Doughnut);
        assert_eq!(line.presentation.kind, ChartKind::Line);
        assert!(!line.series[0].style.fill);
    }

    #[test]
    fn test_build_all_is_idempotent() {
        let records = vec![
            record(Some("Asia"), Some(3.0), Some(5.0)),
            record(None, None, None),
        ];
        let refs: Vec<&Record> = records.iter().collect();

        let first = build_all(&refs, &ViewOptions::default());
        let second = build_all(&refs, &ViewOptions::default());

        assert_eq!(first.len(), 5);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_subset_yields_empty_views() {
        let views = build_all(&[], &ViewOptions::default());

        for view in views {
            assert!(view.labels.is_empty());
            assert!(view.series.iter().all(|s| s.values.is_empty()));
        }
    }

    #[test]
    fn test_palette_colors() {
        assert_eq!(Palette::Tricolor.background().len(), 3);
        assert_eq!(Palette::Teal.border(), &["rgba(75,192,192,1)"]);
    }
}
