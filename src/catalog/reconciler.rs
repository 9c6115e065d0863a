//! Idempotent convergence of the store onto the canonical definition.
//!
//! One pass walks categories, then achievements, doing a fetch-then-write per
//! key with no batching. Per-key failures are recorded and the pass moves on;
//! a failing entry never stops the rest. Item seeding runs last and is
//! best-effort: its failures are logged and kept out of the result.

use crate::catalog::definition::CatalogDefinition;
use crate::catalog::model::{CatalogEntity, Category, EntityError, Item, ReconciliationResult};
use crate::core::error::CuratorError;
use crate::core::store::{CatalogStore, Predicate, Table};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Created,
    Updated,
    Unchanged,
}

/// Run one reconciliation pass.
///
/// Only a malformed definition returns `Err`; store failures for individual
/// entries land in `ReconciliationResult::errors`.
pub fn ensure<S: CatalogStore + ?Sized>(
    store: &S,
    definition: &CatalogDefinition,
) -> Result<ReconciliationResult, CuratorError> {
    definition.validate()?;

    let mut result = ReconciliationResult::default();
    reconcile_entities(store, &definition.categories, &mut result);
    reconcile_entities(store, &definition.achievements, &mut result);
    result.seeded_count = seed_items(store, &definition.categories);

    info!(
        version = %definition.version,
        created = result.created_count,
        updated = result.updated_count,
        seeded = result.seeded_count,
        errors = result.errors.len(),
        "catalog reconciliation pass finished"
    );
    Ok(result)
}

fn reconcile_entities<S: CatalogStore + ?Sized, E: CatalogEntity>(
    store: &S,
    entries: &[E],
    result: &mut ReconciliationResult,
) {
    for entry in entries {
        match reconcile_one(store, entry) {
            Ok(Outcome::Created) => result.created_count += 1,
            Ok(Outcome::Updated) => result.updated_count += 1,
            Ok(Outcome::Unchanged) => {}
            Err(e) => {
                warn!(kind = E::KIND, key = entry.key(), error = %e, "catalog entry failed");
                result.errors.push(EntityError {
                    entity_key: entry.key().to_string(),
                    message: format!("Failed to process {} {}: {}", E::KIND, entry.key(), e),
                });
            }
        }
    }
}

fn reconcile_one<S: CatalogStore + ?Sized, E: CatalogEntity>(
    store: &S,
    entry: &E,
) -> Result<Outcome, CuratorError> {
    let Some(record) = store.get_by_key(E::TABLE, entry.key())? else {
        store.insert(E::TABLE, entry.to_row()?)?;
        debug!(kind = E::KIND, key = entry.key(), "created");
        return Ok(Outcome::Created);
    };

    // A row we cannot decode (e.g. an enum value written by someone else)
    // is drift like any other and gets the canonical fields back.
    let drifted = match E::from_record(&record) {
        Ok(stored) => entry.differing_fields(&stored),
        Err(e) => {
            debug!(kind = E::KIND, key = entry.key(), error = %e, "stored row undecodable");
            vec!["<undecodable>"]
        }
    };
    if drifted.is_empty() {
        return Ok(Outcome::Unchanged);
    }

    store.update(E::TABLE, entry.key(), entry.mutable_fields()?)?;
    debug!(kind = E::KIND, key = entry.key(), fields = ?drifted, "updated");
    Ok(Outcome::Updated)
}

/// Give every empty category one placeholder item. Returns how many were seeded.
fn seed_items<S: CatalogStore + ?Sized>(store: &S, categories: &[Category]) -> usize {
    let mut seeded = 0;
    for category in categories {
        match seed_category(store, category) {
            Ok(true) => seeded += 1,
            Ok(false) => {}
            Err(e) => warn!(key = %category.key, error = %e, "item seeding failed"),
        }
    }
    seeded
}

fn seed_category<S: CatalogStore + ?Sized>(
    store: &S,
    category: &Category,
) -> Result<bool, CuratorError> {
    // Absent when its own creation failed above; already reported there.
    let Some(record) = store.get_by_key(Table::Categories, &category.key)? else {
        return Ok(false);
    };
    let existing = store.count_where(Table::Items, &Predicate::eq("category_id", record.id.as_str()))?;
    if existing > 0 {
        return Ok(false);
    }
    store.insert(Table::Items, Item::placeholder(category, &record.id).to_row()?)?;
    debug!(key = %category.key, "seeded placeholder item");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::verifier;
    use crate::core::memory_store::{MemoryStore, StoreOp};
    use serde_json::json;

    #[test]
    fn test_empty_store_creates_everything() {
        let def = CatalogDefinition::builtin();
        let store = MemoryStore::new();
        let result = ensure(&store, &def).unwrap();
        assert!(result.success());
        assert_eq!(result.created_count, 11);
        assert_eq!(result.updated_count, 0);
        assert_eq!(result.seeded_count, 8);
        assert_eq!(store.rows(Table::Items).len(), 8);
    }

    #[test]
    fn test_second_pass_is_noop() {
        let def = CatalogDefinition::builtin();
        let store = MemoryStore::new();
        ensure(&store, &def).unwrap();
        let second = ensure(&store, &def).unwrap();
        assert!(second.is_noop());
        assert!(second.success());
        assert_eq!(second.seeded_count, 0);
        assert_eq!(store.rows(Table::Items).len(), 8);
    }

    #[test]
    fn test_single_field_drift_is_updated_in_full() {
        let def = CatalogDefinition::builtin();
        let store = MemoryStore::new();
        ensure(&store, &def).unwrap();

        let patch = json!({"name": "Emails (old)"}).as_object().cloned().unwrap();
        store.update(Table::Categories, "email", patch).unwrap();

        let result = ensure(&store, &def).unwrap();
        assert_eq!(result.updated_count, 1);
        assert_eq!(result.created_count, 0);
        let stored = store.get_by_key(Table::Categories, "email").unwrap().unwrap();
        assert_eq!(Category::from_record(&stored).unwrap(), def.categories[0]);
    }

    #[test]
    fn test_undecodable_row_is_overwritten() {
        let def = CatalogDefinition::builtin();
        let store = MemoryStore::new();
        ensure(&store, &def).unwrap();

        let patch = json!({"tier": "platinum"}).as_object().cloned().unwrap();
        store.update(Table::Achievements, "toolkit_master", patch).unwrap();

        let result = ensure(&store, &def).unwrap();
        assert_eq!(result.updated_count, 1);
        let stored = store
            .get_by_key(Table::Achievements, "toolkit_master")
            .unwrap()
            .unwrap();
        assert_eq!(stored.fields["tier"], json!("gold"));
    }

    #[test]
    fn test_one_failing_insert_is_isolated() {
        let def = CatalogDefinition::builtin();
        let store = MemoryStore::new();
        store.fail_on(Table::Categories, StoreOp::Insert, Some("data"));

        let result = ensure(&store, &def).unwrap();
        assert!(!result.success());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].entity_key, "data");
        assert!(
            result.errors[0]
                .message
                .starts_with("Failed to process category data: ")
        );
        assert_eq!(result.created_count, def.categories.len() - 1 + def.achievements.len());
        // The missing category gets no seed; the others do.
        assert_eq!(result.seeded_count, 7);
    }

    #[test]
    fn test_failing_update_is_recorded_per_achievement() {
        let def = CatalogDefinition::builtin();
        let store = MemoryStore::new();
        ensure(&store, &def).unwrap();
        let patch = json!({"criteria_value": 99}).as_object().cloned().unwrap();
        store.update(Table::Achievements, "first_unlock", patch).unwrap();
        store.fail_on(Table::Achievements, StoreOp::Update, Some("first_unlock"));

        let result = ensure(&store, &def).unwrap();
        assert_eq!(result.updated_count, 0);
        assert_eq!(result.errors.len(), 1);
        assert!(
            result.errors[0]
                .message
                .starts_with("Failed to process achievement first_unlock: ")
        );
    }

    #[test]
    fn test_seeding_failures_do_not_flip_success() {
        let def = CatalogDefinition::builtin();
        let store = MemoryStore::new();
        store.fail_on(Table::Items, StoreOp::Insert, None);

        let result = ensure(&store, &def).unwrap();
        assert!(result.success());
        assert_eq!(result.created_count, 11);
        assert_eq!(result.seeded_count, 0);
        assert!(store.rows(Table::Items).is_empty());
    }

    #[test]
    fn test_existing_items_are_not_reseeded() {
        let def = CatalogDefinition::builtin();
        let store = MemoryStore::new();
        store.fail_on(Table::Items, StoreOp::Insert, None);
        ensure(&store, &def).unwrap();
        store.clear_faults();

        let email = store.get_by_key(Table::Categories, "email").unwrap().unwrap();
        let custom = json!({"category_id": email.id.clone(), "name": "Real template", "is_active": true});
        store
            .insert(Table::Items, custom.as_object().cloned().unwrap())
            .unwrap();

        let result = ensure(&store, &def).unwrap();
        assert_eq!(result.seeded_count, 7);
        assert_eq!(
            store
                .count_where(Table::Items, &Predicate::eq("category_id", email.id.as_str()))
                .unwrap(),
            1
        );
    }

    #[test]
    fn test_malformed_definition_propagates() {
        let mut def = CatalogDefinition::builtin();
        def.categories[3].key = String::new();
        let store = MemoryStore::new();
        assert!(matches!(
            ensure(&store, &def),
            Err(CuratorError::InvalidDefinition(_))
        ));
        assert!(store.rows(Table::Categories).is_empty());
    }

    #[test]
    fn test_externally_deleted_row_is_recreated() {
        let def = CatalogDefinition::builtin();
        let store = MemoryStore::new();
        ensure(&store, &def).unwrap();
        assert!(store.remove(Table::Achievements, "category_explorer"));

        let drift = verifier::verify(&store, &def);
        assert_eq!(drift.missing_achievement_keys, vec!["category_explorer".to_string()]);

        let result = ensure(&store, &def).unwrap();
        assert_eq!(result.created_count, 1);
        assert!(verifier::verify(&store, &def).is_valid());
    }
}
