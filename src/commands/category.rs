//! Category command handlers.

use crate::args::{CategoryArgs, IdArgs};
use crate::commands::{listing, plural, Out};
use crate::model::Category;
use crate::store::Storage;
use crate::Result;
use anyhow::Context;

fn category(args: &CategoryArgs) -> Category {
    Category::new(args.name(), args.description(), args.color()).with_id(args.id())
}

/// Adds a category and returns it with the id it was stored under.
///
/// # Errors
/// - Returns an error if a category with the requested id already exists or the write fails.
pub fn add_category(store: &mut dyn Storage, args: &CategoryArgs) -> Result<Out<Category>> {
    let category = category(args);
    let id = store
        .add_category(&category)
        .with_context(|| format!("Unable to add category '{}'", category.name))?;
    let category = category.with_id(id);
    Ok(Out::new(format!("Added {category}"), category))
}

/// Replaces the category with the id in `args`.
///
/// # Errors
/// - Returns an error if no such category exists or the write fails.
pub fn update_category(store: &mut dyn Storage, args: &CategoryArgs) -> Result<Out<Category>> {
    let category = category(args);
    store
        .update_category(&category)
        .with_context(|| format!("Unable to update category {}", category.id))?;
    Ok(Out::new(format!("Updated {category}"), category))
}

/// Removes a category. Transactions and budgets referring to it are kept and show up as
/// uncategorized.
///
/// # Errors
/// - Returns an error if no such category exists or the write fails.
pub fn delete_category(store: &mut dyn Storage, args: &IdArgs) -> Result<Out<()>> {
    store
        .delete_category(args.id())
        .with_context(|| format!("Unable to delete category {}", args.id()))?;
    Ok(format!("Deleted category {}", args.id()).into())
}

pub fn list_categories(store: &dyn Storage) -> Result<Out<Vec<Category>>> {
    let categories = store.categories();
    let heading = plural(categories.len(), "category", "categories");
    Ok(Out::new(listing(heading, &categories), categories))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::test::TestEnv;

    #[test]
    fn test_category_commands() {
        let env = TestEnv::new();
        let mut store = env.store();
        let out = add_category(store.as_mut(), &CategoryArgs::new(0, "Food", "", "#fff")).unwrap();
        assert_eq!(out.structure().unwrap().id, 1);
        assert!(out.message().contains("Food"));

        let err = add_category(store.as_mut(), &CategoryArgs::new(1, "Dup", "", "#fff"))
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<StoreError>(),
            Some(&StoreError::DuplicateId(1))
        );

        update_category(store.as_mut(), &CategoryArgs::new(1, "Groceries", "", "#0f0")).unwrap();
        let listed = list_categories(store.as_ref()).unwrap();
        assert!(listed.message().starts_with("1 category"));
        assert_eq!(listed.structure().unwrap()[0].name, "Groceries");

        delete_category(store.as_mut(), &IdArgs::new(1)).unwrap();
        assert!(delete_category(store.as_mut(), &IdArgs::new(1)).is_err());
    }
}
