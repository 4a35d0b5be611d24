//! Markdown and JSON dashboard reports.
//!
//! The report stands in for the chart widgets: every chart view becomes a
//! table and the year histogram a column of text bars.

use crate::analysis::histogram::peak_intensity;
use crate::analysis::{ChartView, HistogramBin};
use crate::config::ReportConfig;
use crate::models::{DashboardReport, FilterSelection, ReportMetadata, Vocabulary};
use anyhow::Result;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &DashboardReport, config: &ReportConfig) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# SectorLens Dashboard\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_notices_section(&report.notices));
    output.push_str(&generate_filters_section(&report.selection));
    output.push_str(&generate_options_section(
        &report.views.vocabularies,
        config.max_vocabulary_values,
    ));

    output.push_str("## Charts\n\n");
    for chart in &report.views.charts {
        output.push_str(&generate_chart_section(chart));
    }

    output.push_str(&generate_histogram_section(
        &report.views.histogram,
        config.histogram_bar_width,
    ));

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** {}\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Records Loaded:** {}\n", metadata.records_loaded));
    section.push_str(&format!(
        "- **Records Matched:** {}\n",
        metadata.records_matched
    ));
    if metadata.remote_filter {
        section.push_str("- **Filtering:** server-side\n");
    }
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

fn generate_notices_section(notices: &[String]) -> String {
    if notices.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Notices\n\n");
    for notice in notices {
        section.push_str(&format!("> ⚠️ {}\n", notice));
    }
    section.push('\n');

    section
}

/// Generate the active filter table.
fn generate_filters_section(selection: &FilterSelection) -> String {
    let mut section = String::new();

    section.push_str("## Active Filters\n\n");

    if selection.is_empty() {
        section.push_str("No filters applied; showing every record.\n\n");
        return section;
    }

    section.push_str("| Field | Value |\n");
    section.push_str("|:---|:---|\n");

    for field in selection.constrained_fields() {
        section.push_str(&format!("| {} | {} |\n", field, selection.choice(field)));
    }

    if !selection.topics.is_empty() {
        let topics: Vec<&str> = selection.topics.iter().map(String::as_str).collect();
        section.push_str(&format!("| Topics | {} |\n", topics.join(", ")));
    }
    section.push('\n');

    section
}

/// Generate the filter option lists.
fn generate_options_section(vocabularies: &[Vocabulary], max_values: usize) -> String {
    let mut section = String::new();

    section.push_str("## Filter Options\n\n");
    section.push_str("| Field | Options | Values |\n");
    section.push_str("|:---|:---:|:---|\n");

    for vocab in vocabularies {
        let observed = vocab.observed();
        let mut shown: Vec<String> = observed
            .iter()
            .take(max_values)
            .map(|v| option_label(v.as_deref()))
            .collect();
        if observed.len() > max_values {
            shown.push(format!("… {} more", observed.len() - max_values));
        }

        section.push_str(&format!(
            "| {} | {} | {} |\n",
            vocab.field,
            observed.len(),
            shown.join(", ")
        ));
    }
    section.push('\n');

    section
}

/// Generate one chart view as a table.
fn generate_chart_section(chart: &ChartView) -> String {
    let mut section = String::new();
    let p = &chart.presentation;

    section.push_str(&format!("### {}\n\n", p.title));

    let axes = match (&p.x_axis, &p.y_axis) {
        (Some(x), Some(y)) => format!(" | x: {} | y: {}", x, y),
        _ => String::new(),
    };
    section.push_str(&format!("*{:?} chart{}*\n\n", p.kind, axes));

    if chart.is_empty() {
        section.push_str("No data for the current filters.\n\n");
        return section;
    }

    let label_header = p.x_axis.as_deref().unwrap_or("Label");
    section.push_str(&format!("| {} |", label_header));
    for series in &chart.series {
        section.push_str(&format!(" {} |", series.name));
    }
    section.push('\n');
    section.push_str("|:---|");
    for _ in &chart.series {
        section.push_str("---:|");
    }
    section.push('\n');

    for (idx, label) in chart.labels.iter().enumerate() {
        section.push_str(&format!("| {} |", option_label(Some(label))));
        for series in &chart.series {
            let value = series.values.get(idx).copied().flatten();
            section.push_str(&format!(" {} |", format_value(value)));
        }
        section.push('\n');
    }
    section.push('\n');

    section
}

/// Generate the year histogram as text bars.
fn generate_histogram_section(bins: &[HistogramBin], bar_width: usize) -> String {
    let mut section = String::new();

    section.push_str("## Intensity by Year\n\n");

    if bins.is_empty() {
        section.push_str("No data for the current filters.\n\n");
        return section;
    }

    let peak = peak_intensity(bins).unwrap_or(0.0);

    section.push_str("```\n");
    for bin in bins {
        let year = bin
            .year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "----".to_string());
        section.push_str(&format!(
            "{} | {} {}\n",
            year,
            bar(bin.intensity, peak, bar_width),
            format_value(bin.intensity)
        ));
    }
    section.push_str("```\n\n");

    section
}

fn bar(value: Option<f64>, peak: f64, width: usize) -> String {
    let len = match value {
        Some(v) if peak > 0.0 && v > 0.0 => ((v / peak) * width as f64).round() as usize,
        _ => 0,
    };
    "█".repeat(len.min(width))
}

fn option_label(value: Option<&str>) -> String {
    match value {
        None => "(none)".to_string(),
        Some("") => "(blank)".to_string(),
        Some(v) => v.replace('|', "\\|"),
    }
}

fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "-".to_string(),
    }
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by SectorLens v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &DashboardReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Render the filter options alone, for `--options-only`.
pub fn generate_options_listing(vocabularies: &[Vocabulary]) -> String {
    let mut output = String::new();

    for vocab in vocabularies {
        output.push_str(&format!(
            "{} ({} options)\n",
            vocab.field,
            vocab.observed().len()
        ));
        for value in vocab.observed() {
            output.push_str(&format!("  - {}\n", option_label(value.as_deref())));
        }
    }

    output.push_str("\nSelect a \"(none)\" entry with --missing <field>.\n");

    output
}
