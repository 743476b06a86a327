use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// Label for a record whose category cannot be resolved.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// A record as it is read back from a store: the persisted record plus the display name of the
/// category it references. The name is resolved on every read and is never written, so the stores
/// only ever accept the bare record for writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Labeled<T> {
    #[serde(flatten)]
    record: T,
    #[serde(default = "uncategorized")]
    category_name: String,
}

fn uncategorized() -> String {
    UNCATEGORIZED.to_string()
}

impl<T> Labeled<T> {
    pub fn new(record: T, category_name: impl Into<String>) -> Self {
        Self {
            record,
            category_name: category_name.into(),
        }
    }

    pub fn record(&self) -> &T {
        &self.record
    }

    pub fn into_record(self) -> T {
        self.record
    }

    pub fn category_name(&self) -> &str {
        &self.category_name
    }
}

impl<T> Deref for Labeled<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.record
    }
}
