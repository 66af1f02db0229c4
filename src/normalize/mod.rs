// src/normalize/mod.rs

//! Raw statistics rows → [`EntityMetric`].
//!
//! Both source schemas share the numeric columns; only the identity columns
//! differ, see [`fields`].

pub mod fields;

use std::collections::HashMap;

use crate::model::{coerce_number, Dataset, EntityMetric, Metric, TOTAL_RECORDS};
use fields::{fields_for, SchemaFields};

/// Anything that can hand out a cell by column name.
pub trait FieldSource {
    fn field(&self, column: &str) -> Option<&str>;
}

impl FieldSource for HashMap<String, String> {
    fn field(&self, column: &str) -> Option<&str> {
        self.get(column).map(String::as_str)
    }
}

/// First alias with a non-blank value.
fn first_present<'a, R: FieldSource + ?Sized>(raw: &'a R, aliases: &[&str]) -> Option<&'a str> {
    aliases
        .iter()
        .filter_map(|col| raw.field(col))
        .map(str::trim)
        .find(|v| !v.is_empty())
}

/// Normalize one raw row of `dataset`'s schema.
///
/// Returns `None` when the row has no key; every other gap degrades to a
/// fallback value or zero.
pub fn normalize<R: FieldSource + ?Sized>(raw: &R, dataset: Dataset) -> Option<EntityMetric> {
    normalize_with(raw, fields_for(dataset))
}

pub fn normalize_with<R: FieldSource + ?Sized>(
    raw: &R,
    schema: &SchemaFields,
) -> Option<EntityMetric> {
    let key = first_present(raw, schema.key)?.to_string();

    let name = first_present(raw, schema.name)
        .map(str::to_string)
        .unwrap_or_else(|| key.clone());

    let url = match first_present(raw, schema.url) {
        Some(url) => url.to_string(),
        None => schema
            .canonical_url_prefix
            .map(|prefix| format!("{}{}", prefix, key))
            .unwrap_or_default(),
    };

    let mut metric = EntityMetric {
        total_records: coerce_number(raw.field(TOTAL_RECORDS)),
        key,
        name,
        url,
        ..Default::default()
    };
    for m in Metric::ALL {
        let pair = metric.pair_mut(m);
        pair.count = coerce_number(raw.field(m.count_column()));
        pair.pct = coerce_number(raw.field(m.pct_column()));
    }
    Some(metric)
}
