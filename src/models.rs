//! Data models for the analytics dashboard.
//!
//! This module contains the record schema, the filter selection, the
//! per-field vocabularies and the report envelope shared by the engine,
//! the transport layer and the report writer.

use chrono::{DateTime, Utc};
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

use crate::analysis::DashboardViews;

/// One analytic observation as returned by the data API.
///
/// The API is loose about types (`end_year` arrives as `""` or `2027`,
/// scores occasionally as strings), so every field is read leniently and a
/// value that cannot be represented becomes absent instead of failing the
/// whole payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, deserialize_with = "lenient_text")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub sector: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub topic: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub region: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub pestle: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub source: Option<String>,
    /// ISO-like date string; the year is its first four characters.
    #[serde(default, deserialize_with = "lenient_text")]
    pub published: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub end_year: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub likelihood: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub intensity: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub relevance: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub impact: Option<f64>,
    /// Headline of the observation, carried for display only.
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub city: Option<String>,
}

impl Record {
    /// Returns the publication year text (first four characters of `published`).
    pub fn year(&self) -> Option<&str> {
        self.published.as_deref().map(first_chars::<4>)
    }
}

/// Returns the first `N` characters of `s`, or all of it when shorter.
fn first_chars<const N: usize>(s: &str) -> &str {
    match s.char_indices().nth(N) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// A filterable record field.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Country,
    Sector,
    Topic,
    /// Publication year, derived from `published`.
    Year,
    EndYear,
    Region,
    Pestle,
    Source,
}

impl Field {
    /// Every filterable field, in filter-panel order.
    pub const ALL: [Field; 8] = [
        Field::EndYear,
        Field::Topic,
        Field::Sector,
        Field::Region,
        Field::Pestle,
        Field::Source,
        Field::Country,
        Field::Year,
    ];

    /// Extracts this field's value from a record.
    pub fn value<'a>(&self, record: &'a Record) -> Option<&'a str> {
        match self {
            Field::Country => record.country.as_deref(),
            Field::Sector => record.sector.as_deref(),
            Field::Topic => record.topic.as_deref(),
            Field::Year => record.year(),
            Field::EndYear => record.end_year.as_deref(),
            Field::Region => record.region.as_deref(),
            Field::Pestle => record.pestle.as_deref(),
            Field::Source => record.source.as_deref(),
        }
    }

    /// Query parameter name used by the remote filter endpoint.
    pub fn query_key(&self) -> &'static str {
        match self {
            Field::Country => "country",
            Field::Sector => "sector",
            Field::Topic => "topic",
            Field::Year => "year",
            Field::EndYear => "endYear",
            Field::Region => "region",
            Field::Pestle => "pestle",
            Field::Source => "source",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Country => write!(f, "Country"),
            Field::Sector => write!(f, "Sector"),
            Field::Topic => write!(f, "Topic"),
            Field::Year => write!(f, "Year"),
            Field::EndYear => write!(f, "End Year"),
            Field::Region => write!(f, "Region"),
            Field::Pestle => write!(f, "PESTLE"),
            Field::Source => write!(f, "Source"),
        }
    }
}

/// The user's choice for one single-value field.
///
/// Serialized as `""` for [`Choice::Any`], `null` for [`Choice::Missing`]
/// and the plain string otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Choice {
    /// No constraint; every record passes.
    #[default]
    Any,
    /// Matches records where the field is absent.
    Missing,
    Value(String),
}

impl Choice {
    /// Parses a raw selection value; the empty string means "All".
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() {
            Choice::Any
        } else {
            Choice::Value(raw.to_string())
        }
    }

    /// Converts a vocabulary entry into the choice that selects it.
    pub fn from_option(value: Option<&str>) -> Self {
        match value {
            None => Choice::Missing,
            Some(raw) => Choice::parse(raw),
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Choice::Any)
    }
}

impl From<Option<String>> for Choice {
    fn from(value: Option<String>) -> Self {
        Choice::from_option(value.as_deref())
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::Any => write!(f, "All"),
            Choice::Missing => write!(f, "(none)"),
            Choice::Value(v) => write!(f, "{}", v),
        }
    }
}

impl Serialize for Choice {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Choice::Any => serializer.serialize_str(""),
            Choice::Missing => serializer.serialize_none(),
            Choice::Value(v) => serializer.serialize_str(v),
        }
    }
}

impl<'de> Deserialize<'de> for Choice {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Choice::from(Option::<String>::deserialize(deserializer)?))
    }
}

/// The current set of user-chosen field constraints.
///
/// Unset fields never exclude a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSelection {
    #[serde(default)]
    pub country: Choice,
    #[serde(default)]
    pub sector: Choice,
    #[serde(default)]
    pub topic: Choice,
    #[serde(default)]
    pub year: Choice,
    #[serde(default)]
    pub end_year: Choice,
    #[serde(default)]
    pub region: Choice,
    #[serde(default)]
    pub pestle: Choice,
    #[serde(default)]
    pub source: Choice,
    /// Multi-value topic constraint; empty means pass-through.
    #[serde(default)]
    pub topics: BTreeSet<String>,
}

impl FilterSelection {
    /// Returns the choice currently set for a single-value field.
    pub fn choice(&self, field: Field) -> &Choice {
        match field {
            Field::Country => &self.country,
            Field::Sector => &self.sector,
            Field::Topic => &self.topic,
            Field::Year => &self.year,
            Field::EndYear => &self.end_year,
            Field::Region => &self.region,
            Field::Pestle => &self.pestle,
            Field::Source => &self.source,
        }
    }

    fn choice_mut(&mut self, field: Field) -> &mut Choice {
        match field {
            Field::Country => &mut self.country,
            Field::Sector => &mut self.sector,
            Field::Topic => &mut self.topic,
            Field::Year => &mut self.year,
            Field::EndYear => &mut self.end_year,
            Field::Region => &mut self.region,
            Field::Pestle => &mut self.pestle,
            Field::Source => &mut self.source,
        }
    }

    /// Returns a copy with `field` set to `choice`.
    pub fn with(mut self, field: Field, choice: Choice) -> Self {
        *self.choice_mut(field) = choice;
        self
    }

    /// Returns a copy with the multi-value topic constraint replaced.
    pub fn with_topics<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.topics = topics
            .into_iter()
            .map(Into::into)
            .filter(|t: &String| !t.is_empty())
            .collect();
        self
    }

    /// Fields that currently constrain the result, in panel order.
    pub fn constrained_fields(&self) -> Vec<Field> {
        Field::ALL
            .into_iter()
            .filter(|field| !self.choice(*field).is_any())
            .collect()
    }

    /// True when no field is constrained.
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty() && self.constrained_fields().is_empty()
    }

    /// Serializes the selection as query parameters for the remote filter
    /// endpoint. `topics` is repeated once per selected topic.
    ///
    /// A [`Choice::Missing`] constraint has no query spelling and is omitted.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();

        for field in Field::ALL {
            if let Choice::Value(v) = self.choice(field) {
                params.push((field.query_key(), v.clone()));
            }
        }

        for topic in &self.topics {
            params.push(("topics", topic.clone()));
        }

        params
    }
}

/// Distinct option list for one filterable field.
///
/// The first entry is always the `""` "All" sentinel; `None` entries stand
/// for records where the field is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    pub field: Field,
    pub values: Vec<Option<String>>,
}

impl Vocabulary {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[allow(dead_code)] // Pairs with len()
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The observed values, without the leading sentinel.
    pub fn observed(&self) -> &[Option<String>] {
        self.values.get(1..).unwrap_or(&[])
    }

    /// The selectable choices, sentinel first.
    pub fn choices(&self) -> impl Iterator<Item = Choice> + '_ {
        self.values.iter().map(|v| Choice::from_option(v.as_deref()))
    }
}

/// Metadata about one dashboard computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Where the records came from (URL or file path).
    pub source: String,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Records in the store snapshot.
    pub records_loaded: usize,
    /// Records in the filtered subset.
    pub records_matched: usize,
    /// Whether the subset came from the server-side filter endpoint.
    pub remote_filter: bool,
    /// Wall-clock time spent fetching and computing, in seconds.
    pub duration_seconds: f64,
}

/// The complete dashboard report handed to the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardReport {
    pub metadata: ReportMetadata,
    pub selection: FilterSelection,
    pub views: DashboardViews,
    /// Non-fatal notices raised while loading (failed or discarded fetches).
    pub notices: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_lenient_parsing() {
        let json = r#"{
            "country": "India",
            "end_year": 2027,
            "likelihood": "3",
            "intensity": 6,
            "relevance": "",
            "impact": null,
            "published": "January, 20 2017 03:51:25",
            "url": "http://example.com",
            "added": "January, 20 2017 03:51:25"
        }"#;

        let record: Record = serde_json::from_str(json).unwrap();
        assert_eq!(record.country.as_deref(), Some("India"));
        assert_eq!(record.end_year.as_deref(), Some("2027"));
        assert_eq!(record.likelihood, Some(3.0));
        assert_eq!(record.intensity, Some(6.0));
        assert_eq!(record.relevance, None);
        assert_eq!(record.impact, None);
        assert_eq!(record.sector, None);
    }

    #[test]
    fn test_record_year() {
        let record = Record {
            published: Some("2020-01-01".to_string()),
            ..Default::default()
        };
        assert_eq!(record.year(), Some("2020"));

        let short = Record {
            published: Some("20".to_string()),
            ..Default::default()
        };
        assert_eq!(short.year(), Some("20"));

        assert_eq!(Record::default().year(), None);
    }

    #[test]
    fn test_choice_parse() {
        assert_eq!(Choice::parse(""), Choice::Any);
        assert_eq!(Choice::parse("Asia"), Choice::Value("Asia".to_string()));
        assert_eq!(Choice::from_option(None), Choice::Missing);
        assert_eq!(Choice::from_option(Some("")), Choice::Any);
    }

    #[test]
    fn test_choice_serde() {
        let selection = FilterSelection::default()
            .with(Field::Country, Choice::parse("India"))
            .with(Field::Region, Choice::Missing);

        let json = serde_json::to_value(&selection).unwrap();
        assert_eq!(json["country"], "India");
        assert_eq!(json["sector"], "");
        assert!(json["region"].is_null());

        let back: FilterSelection = serde_json::from_value(json).unwrap();
        assert_eq!(back, selection);
    }

    #[test]
    fn test_selection_query() {
        let selection = FilterSelection::default()
            .with(Field::EndYear, Choice::parse("2027"))
            .with(Field::Sector, Choice::Missing)
            .with_topics(["oil", "gas", ""]);

        let query = selection.to_query();
        assert_eq!(
            query,
            vec![
                ("endYear", "2027".to_string()),
                ("topics", "gas".to_string()),
                ("topics", "oil".to_string()),
            ]
        );
    }

    #[test]
    fn test_selection_is_empty() {
        assert!(FilterSelection::default().is_empty());
        assert!(!FilterSelection::default().with_topics(["oil"]).is_empty());
        assert_eq!(
            FilterSelection::default()
                .with(Field::Year, Choice::parse("2016"))
                .constrained_fields(),
            vec![Field::Year]
        );
    }
}
