//! Filter-option vocabularies.
//!
//! A vocabulary lists the distinct values of one field in first-seen order,
//! prefixed with the `""` "All" sentinel. Absent values are kept as a
//! distinct `None` entry so they stay selectable.

use crate::models::{Field, Record, Vocabulary};
use std::collections::HashSet;

/// Extract the vocabulary for one field.
pub fn extract(records: &[Record], field: Field) -> Vocabulary {
    let mut seen: HashSet<Option<&str>> = HashSet::new();
    let mut values = vec![Some(String::new())];

    for record in records {
        let value = field.value(record);
        if seen.insert(value) {
            values.push(value.map(str::to_string));
        }
    }

    Vocabulary { field, values }
}

/// Extract vocabularies for every filterable field.
pub fn extract_all(records: &[Record]) -> Vec<Vocabulary> {
    Field::ALL
        .into_iter()
        .map(|field| extract(records, field))
        .collect()
}
