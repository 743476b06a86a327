//! Record shapes the engine persists and encodes, and the case-insensitive decoding of its documents.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Label attached to transactions and budgets whose category cannot be resolved.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Missing fields read as their defaults, the color as black.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub color: String,
}

impl Default for Category {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            description: String::new(),
            color: "#000000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Transaction {
    pub id: i32,
    pub date: String,
    pub amount: f64,
    pub description: String,
    pub category_id: i32,
    pub is_income: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Budget {
    pub category_id: i32,
    pub month_year: String,
    pub allocated_amount: f64,
}

/// Field names as they are written. Reads accept any casing of these.
pub(crate) trait Fields {
    const FIELDS: &'static [&'static str];
}

impl Fields for Category {
    const FIELDS: &'static [&'static str] = &["id", "name", "description", "color"];
}

impl Fields for Transaction {
    const FIELDS: &'static [&'static str] = &[
        "id",
        "date",
        "amount",
        "description",
        "categoryId",
        "isIncome",
    ];
}

impl Fields for Budget {
    const FIELDS: &'static [&'static str] = &["categoryId", "monthYear", "allocatedAmount"];
}

/// A record joined with the name of the category it references. Only ever encoded, never stored.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Labeled<'a, T> {
    #[serde(flatten)]
    pub(crate) record: &'a T,
    pub(crate) category_name: &'a str,
}

/// Decodes a JSON array of records, matching field names without regard to case. A blank document
/// is an empty collection.
pub(crate) fn decode<T>(text: &str) -> serde_json::Result<Vec<T>>
where
    T: DeserializeOwned + Fields,
{
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let rows: Vec<Map<String, Value>> = serde_json::from_str(text)?;
    rows.into_iter()
        .map(|row| serde_json::from_value(Value::Object(canonical_keys::<T>(row))))
        .collect()
}

fn canonical_keys<T: Fields>(row: Map<String, Value>) -> Map<String, Value> {
    row.into_iter()
        .map(|(key, value)| {
            let canonical = T::FIELDS
                .iter()
                .find(|field| field.eq_ignore_ascii_case(&key))
                .map_or(key, |field| field.to_string());
            (canonical, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_ignores_field_case() {
        let text = r#"[{"ID": 3, "Date": "2024-01-02", "AMOUNT": 1.5, "description": "x",
            "CATEGORYID": 2, "isincome": true}]"#;
        let decoded: Vec<Transaction> = decode(text).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].id, 3);
        assert_eq!(decoded[0].category_id, 2);
        assert!(decoded[0].is_income);
    }

    #[test]
    fn test_decode_blank_is_empty() {
        let decoded: Vec<Budget> = decode("  \n").unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_labeled_flattens() {
        let budget = Budget {
            category_id: 1,
            month_year: "2024-03".into(),
            allocated_amount: 200.0,
        };
        let json = serde_json::to_value(Labeled {
            record: &budget,
            category_name: "Food",
        })
        .unwrap();
        assert_eq!(json["categoryId"], 1);
        assert_eq!(json["categoryName"], "Food");
    }
}
