//! Filter predicate engine.
//!
//! All constraints are combined with logical AND. Single-value fields
//! match by strict equality, the year field by substring of the
//! publication year, and the multi-value topic set by membership.

use crate::models::{Choice, Field, FilterSelection, Record};

/// Returns true if `record` satisfies every active constraint.
pub fn matches(record: &Record, selection: &FilterSelection) -> bool {
    let fields_pass = Field::ALL.into_iter().all(|field| {
        let choice = selection.choice(field);
        let value = field.value(record);

        match field {
            Field::Year => year_passes(choice, value),
            _ => value_passes(choice, value),
        }
    });

    fields_pass && topics_pass(selection, record.topic.as_deref())
}

/// Produce the subset of `records` matching `selection`, in original order.
pub fn filter_records<'a>(records: &'a [Record], selection: &FilterSelection) -> Vec<&'a Record> {
    records
        .iter()
        .filter(|record| matches(record, selection))
        .collect()
}

fn value_passes(choice: &Choice, value: Option<&str>) -> bool {
    match choice {
        Choice::Any => true,
        Choice::Missing => value.is_none(),
        Choice::Value(wanted) => value == Some(wanted.as_str()),
    }
}

// Substring match: "201" keeps every year from 2010 to 2019.
fn year_passes(choice: &Choice, year: Option<&str>) -> bool {
    match choice {
        Choice::Any => true,
        Choice::Missing => year.is_none(),
        Choice::Value(wanted) => year.is_some_and(|y| y.contains(wanted.as_str())),
    }
}

fn topics_pass(selection: &FilterSelection, topic: Option<&str>) -> bool {
    selection.topics.is_empty() || topic.is_some_and(|t| selection.topics.contains(t))
}
