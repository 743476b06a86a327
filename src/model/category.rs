use serde::{Deserialize, Serialize};
use std::fmt;

const DEFAULT_COLOR: &str = "#000000";

/// A spending or income category. Deleting a category never touches the transactions or budgets
/// that reference it; those simply become uncategorized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Category {
    /// Positive and unique. A non-positive id asks the store to assign one.
    pub id: i32,
    pub name: String,
    pub description: String,
    /// Hex color code, e.g. `#4CAF50`.
    pub color: String,
}

impl Default for Category {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            description: String::new(),
            color: DEFAULT_COLOR.to_string(),
        }
    }
}

impl Category {
    /// A category without an id, ready to be added.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            name: name.into(),
            description: description.into(),
            color: color.into(),
        }
    }

    pub fn with_id(mut self, id: i32) -> Self {
        self.id = id;
        self
    }

    /// Find a category by ID in a slice.
    pub fn find_by_id(categories: &[Category], id: i32) -> Option<&Category> {
        categories.iter().find(|c| c.id == id)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Category [ID: {}, Name: {}, Description: {}, Color: {}]",
            self.id, self.name, self.description, self.color
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_take_defaults() {
        let category: Category = serde_json::from_str(r#"{"id": 4, "name": "Rent"}"#).unwrap();
        assert_eq!(category.id, 4);
        assert_eq!(category.description, "");
        assert_eq!(category.color, DEFAULT_COLOR);
    }

    #[test]
    fn test_display() {
        let category = Category::new("Groceries", "Food", "#4CAF50").with_id(2);
        assert_eq!(
            category.to_string(),
            "Category [ID: 2, Name: Groceries, Description: Food, Color: #4CAF50]"
        );
    }
}
