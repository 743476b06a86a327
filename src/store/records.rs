//! Decoding of record documents. Both backends hand their JSON through here so that callers see
//! the same shapes whichever backend produced them. Field names are matched without regard to case.

use crate::model::{Budget, Category, Labeled, Transaction};
use crate::Result;
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

const CATEGORY_NAME: &str = "categoryName";

/// A persisted record type and the field names it is written with.
pub(crate) trait Record: Serialize + DeserializeOwned {
    const FIELDS: &'static [&'static str];
}

impl Record for Category {
    const FIELDS: &'static [&'static str] = &["id", "name", "description", "color"];
}

impl Record for Transaction {
    const FIELDS: &'static [&'static str] = &[
        "id",
        "date",
        "amount",
        "description",
        "categoryId",
        "isIncome",
    ];
}

impl Record for Budget {
    const FIELDS: &'static [&'static str] = &["categoryId", "monthYear", "allocatedAmount"];
}

/// Decodes a JSON array of `T`. A blank document is an empty collection.
pub(crate) fn decode<T: Record>(text: &str) -> Result<Vec<T>> {
    rows(text)?
        .into_iter()
        .enumerate()
        .map(|(ix, row)| {
            let row = canonical_keys(row, T::FIELDS.iter().copied());
            serde_json::from_value(Value::Object(row))
                .with_context(|| format!("Malformed record at index {ix}"))
        })
        .collect()
}

/// Decodes a JSON array of `T` records that also carry a `categoryName`.
pub(crate) fn decode_labeled<T: Record>(text: &str) -> Result<Vec<Labeled<T>>> {
    rows(text)?
        .into_iter()
        .enumerate()
        .map(|(ix, row)| {
            let fields = T::FIELDS.iter().copied().chain([CATEGORY_NAME]);
            let row = canonical_keys(row, fields);
            serde_json::from_value(Value::Object(row))
                .with_context(|| format!("Malformed record at index {ix}"))
        })
        .collect()
}

/// Encodes a collection the way it is stored on disk.
pub(crate) fn encode<T: Serialize>(items: &[T]) -> Result<String> {
    serde_json::to_string_pretty(items).context("Unable to serialize records")
}

fn rows(text: &str) -> Result<Vec<Map<String, Value>>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(text).context("Expected a JSON array of records")
}

fn canonical_keys<'a>(
    row: Map<String, Value>,
    fields: impl Iterator<Item = &'a str> + Clone,
) -> Map<String, Value> {
    row.into_iter()
        .map(|(key, value)| {
            let canonical = fields
                .clone()
                .find(|field| field.eq_ignore_ascii_case(&key))
                .map_or(key, str::to_string);
            (canonical, value)
        })
        .collect()
}
