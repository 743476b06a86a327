//! Runs the same scenarios against both backends.

use crate::error::StoreError;
use crate::model::{Budget, BudgetKey, Category, Transaction, UNCATEGORIZED};
use crate::store::{DocumentStore, EngineApi, EngineStore, Storage};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::path::Path;
use tempfile::TempDir;

fn backends(dir: &Path) -> Vec<Box<dyn Storage>> {
    vec![
        Box::new(DocumentStore::open(dir.join("document")).unwrap()),
        Box::new(EngineStore::open(EngineApi::linked(), &dir.join("engine")).unwrap()),
    ]
}

#[test]
fn test_empty_store_scenario() {
    let dir = TempDir::new().unwrap();
    for mut store in backends(dir.path()) {
        let kind = store.kind();
        let food = store
            .add_category(&Category::new("Food", "Groceries", "#4CAF50"))
            .unwrap();
        assert_eq!(food, 1, "{kind}");
        let txn = store
            .add_transaction(&Transaction::new("2024-03-05", dec!(50.0), "lunch", 1, false))
            .unwrap();
        assert_eq!(txn, 1, "{kind}");

        let read = store.transaction(1).unwrap();
        assert_eq!(read.category_name(), "Food", "{kind}");
        assert_eq!(read.amount, dec!(50.0), "{kind}");
        assert!(store.transaction(2).is_none(), "{kind}");
    }
}

#[test]
fn test_duplicates_leave_collections_unchanged() {
    let dir = TempDir::new().unwrap();
    for mut store in backends(dir.path()) {
        let kind = store.kind();
        store
            .add_category(&Category::new("Food", "", "#fff").with_id(3))
            .unwrap();
        store
            .add_transaction(&Transaction::new("2024-03-05", dec!(1.0), "", 3, true).with_id(8))
            .unwrap();
        store.add_budget(&Budget::new(3, "2024-03", dec!(200.0))).unwrap();
        let categories = store.categories();
        let transactions = store.transactions();
        let budgets = store.budgets();

        assert_eq!(
            store.add_category(&Category::new("Other", "", "#000").with_id(3)),
            Err(StoreError::DuplicateId(3)),
            "{kind}"
        );
        assert_eq!(
            store.add_transaction(
                &Transaction::new("2024-04-01", dec!(2.0), "", 3, false).with_id(8)
            ),
            Err(StoreError::DuplicateId(8)),
            "{kind}"
        );
        assert_eq!(
            store.add_budget(&Budget::new(3, "2024-03", dec!(1.0))),
            Err(StoreError::DuplicateKey {
                category_id: 3,
                month_year: "2024-03".to_string()
            }),
            "{kind}"
        );
        assert_eq!(store.categories(), categories, "{kind}");
        assert_eq!(store.transactions(), transactions, "{kind}");
        assert_eq!(store.budgets(), budgets, "{kind}");

        // Next ids continue from the largest one in use.
        assert_eq!(
            store.add_category(&Category::new("Rent", "", "#000")).unwrap(),
            4,
            "{kind}"
        );
        assert_eq!(
            store
                .add_transaction(&Transaction::new("2024-03-06", dec!(2.0), "", 3, false))
                .unwrap(),
            9,
            "{kind}"
        );
    }
}

#[test]
fn test_missing_keys_fail_without_change() {
    let dir = TempDir::new().unwrap();
    for mut store in backends(dir.path()) {
        let kind = store.kind();
        store.add_category(&Category::new("Food", "", "#fff")).unwrap();
        assert_eq!(
            store.update_category(&Category::new("X", "", "#fff").with_id(5)),
            Err(StoreError::NotFound),
            "{kind}"
        );
        assert_eq!(store.delete_category(5), Err(StoreError::NotFound), "{kind}");
        assert_eq!(store.delete_transaction(1), Err(StoreError::NotFound), "{kind}");
        assert_eq!(
            store.delete_budget(&BudgetKey::new(1, "2024-03")),
            Err(StoreError::NotFound),
            "{kind}"
        );
        assert_eq!(store.categories().len(), 1, "{kind}");
    }
}

#[test]
fn test_dangling_references_survive_delete() {
    let dir = TempDir::new().unwrap();
    for mut store in backends(dir.path()) {
        let kind = store.kind();
        let id = store.add_category(&Category::new("Food", "", "#fff")).unwrap();
        store
            .add_transaction(&Transaction::new("2024-03-05", dec!(5.0), "", id, false))
            .unwrap();
        store.add_budget(&Budget::new(id, "2024-03", dec!(20.0))).unwrap();
        store.delete_category(id).unwrap();

        let txns = store.transactions_by_category(id);
        assert_eq!(txns.len(), 1, "{kind}");
        assert_eq!(txns[0].category_name(), UNCATEGORIZED, "{kind}");
        let budgets = store.budgets_by_month("2024-03");
        assert_eq!(budgets.len(), 1, "{kind}");
        assert_eq!(budgets[0].category_name(), UNCATEGORIZED, "{kind}");
    }
}

#[test]
fn test_data_is_shared_across_backends() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data");
    {
        let mut engine = EngineStore::open(EngineApi::linked(), &path).unwrap();
        engine.add_category(&Category::new("Food", "", "#fff")).unwrap();
        engine
            .add_transaction(&Transaction::new("2024-03-05", dec!(50.0), "lunch", 1, false))
            .unwrap();
        engine.add_budget(&Budget::new(1, "2024-03", dec!(200.0))).unwrap();
    }
    let mut document = DocumentStore::open(&path).unwrap();
    assert_eq!(document.transactions_by_month("2024-03").len(), 1);
    document
        .add_transaction(&Transaction::new("2024-03-09", dec!(10.0), "pay", 1, true))
        .unwrap();

    let engine = EngineStore::open(EngineApi::linked(), &path).unwrap();
    assert_eq!(engine.categories(), document.categories());
    assert_eq!(engine.transactions(), document.transactions());
    assert_eq!(engine.budgets(), document.budgets());
}

#[test]
fn test_case_insensitive_documents() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data");
    std::fs::create_dir_all(&path).unwrap();
    std::fs::write(
        path.join("transactions.json"),
        r#"[{"ID": 1, "Date": "2024-03-05", "AMOUNT": 5.0, "CATEGORYID": 2, "isincome": true}]"#,
    )
    .unwrap();
    let document = DocumentStore::open(&path).unwrap();
    let txn = document.transaction(1).unwrap();
    assert_eq!(txn.category_id, 2);
    assert!(txn.is_income);
    assert_eq!(txn.category_name(), UNCATEGORIZED);

    let engine = EngineStore::open(EngineApi::linked(), &path).unwrap();
    assert_eq!(engine.transactions(), document.transactions());
}

#[test]
fn test_changes_touch_only_their_record() {
    let dir = TempDir::new().unwrap();
    for mut store in backends(dir.path()) {
        let kind = store.kind();
        for name in ["Food", "Rent", "Travel"] {
            store.add_category(&Category::new(name, "", "#fff")).unwrap();
        }
        for (date, amount) in [
            ("2024-03-01", dec!(1.10)),
            ("2024-03-02", dec!(2.20)),
            ("2024-03-03", dec!(3.30)),
        ] {
            store
                .add_transaction(&Transaction::new(date, amount, "", 1, false))
                .unwrap();
        }
        for month in ["2024-01", "2024-02", "2024-03"] {
            store.add_budget(&Budget::new(1, month, dec!(100))).unwrap();
        }
        let categories = store.categories();
        let transactions = store.transactions();
        let budgets = store.budgets();

        store
            .update_category(&Category::new("Groceries", "weekly", "#0f0").with_id(2))
            .unwrap();
        let changed = Transaction::new("2024-03-09", dec!(9.99), "x", 3, true).with_id(2);
        store.update_transaction(&changed).unwrap();
        store
            .update_budget(&Budget::new(1, "2024-02", dec!(250)))
            .unwrap();

        let updated = store.categories();
        assert_eq!(updated.len(), 3, "{kind}");
        assert_eq!(updated[0], categories[0], "{kind}");
        assert_eq!(updated[1].name, "Groceries", "{kind}");
        assert_eq!(updated[2], categories[2], "{kind}");
        let updated = store.transactions();
        assert_eq!(updated.len(), 3, "{kind}");
        assert_eq!(updated[0], transactions[0], "{kind}");
        assert_eq!(updated[1].amount, dec!(9.99), "{kind}");
        assert_eq!(updated[1].category_name(), "Travel", "{kind}");
        assert_eq!(updated[2], transactions[2], "{kind}");
        let updated = store.budgets();
        assert_eq!(updated.len(), 3, "{kind}");
        assert_eq!(updated[0], budgets[0], "{kind}");
        assert_eq!(updated[1].allocated_amount, dec!(250), "{kind}");
        assert_eq!(updated[2], budgets[2], "{kind}");

        store.delete_category(2).unwrap();
        store.delete_transaction(2).unwrap();
        store.delete_budget(&BudgetKey::new(1, "2024-02")).unwrap();

        assert_eq!(
            store.categories(),
            vec![categories[0].clone(), categories[2].clone()],
            "{kind}"
        );
        assert_eq!(
            store.transactions(),
            vec![transactions[0].clone(), transactions[2].clone()],
            "{kind}"
        );
        assert_eq!(
            store.budgets(),
            vec![budgets[0].clone(), budgets[2].clone()],
            "{kind}"
        );
    }
}

#[test]
fn test_unstorable_amounts_leave_collections_unchanged() {
    let dir = TempDir::new().unwrap();
    for mut store in backends(dir.path()) {
        let kind = store.kind();
        for amount in [dec!(10), dec!(20)] {
            store
                .add_transaction(&Transaction::new("2024-03-05", amount, "", 1, false))
                .unwrap();
        }
        store.add_budget(&Budget::new(1, "2024-03", dec!(5))).unwrap();
        let transactions = store.transactions();
        let budgets = store.budgets();

        for amount in [Decimal::MAX, Decimal::MIN] {
            let txn = Transaction::new("2024-03-06", amount, "", 1, false);
            assert!(
                matches!(store.add_transaction(&txn), Err(StoreError::InvalidArgument(_))),
                "{kind}"
            );
            assert!(
                matches!(
                    store.update_transaction(&txn.with_id(1)),
                    Err(StoreError::InvalidArgument(_))
                ),
                "{kind}"
            );
            assert!(
                matches!(
                    store.update_budget(&Budget::new(1, "2024-03", amount)),
                    Err(StoreError::InvalidArgument(_))
                ),
                "{kind}"
            );
        }
        assert_eq!(store.transactions(), transactions, "{kind}");
        assert_eq!(store.budgets(), budgets, "{kind}");
        assert_eq!(
            store
                .add_transaction(&Transaction::new("2024-03-07", dec!(1), "", 1, false))
                .unwrap(),
            3,
            "{kind}"
        );
    }
}

#[test]
fn test_no_id_after_the_largest() {
    let dir = TempDir::new().unwrap();
    for mut store in backends(dir.path()) {
        let kind = store.kind();
        store
            .add_category(&Category::new("Food", "", "#fff").with_id(i32::MAX))
            .unwrap();
        let last = Transaction::new("2024-03-05", dec!(1), "", 1, false).with_id(i32::MAX);
        store.add_transaction(&last).unwrap();

        assert!(
            matches!(
                store.add_category(&Category::new("Rent", "", "#fff")),
                Err(StoreError::InvalidArgument(_))
            ),
            "{kind}"
        );
        assert!(
            matches!(
                store.add_transaction(&Transaction::new("2024-03-06", dec!(1), "", 1, false)),
                Err(StoreError::InvalidArgument(_))
            ),
            "{kind}"
        );
        assert_eq!(store.categories().len(), 1, "{kind}");
        assert_eq!(store.transactions().len(), 1, "{kind}");
    }
}
