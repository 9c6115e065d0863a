//! Cheap drift-presence check.
//!
//! Two `list_keys` reads, one per entity table, set-differenced against the
//! canonical keys. Field values are not compared; that is the reconciler's job.

use crate::catalog::definition::CatalogDefinition;
use crate::catalog::model::VerificationResult;
use crate::core::error::CuratorError;
use crate::core::store::{CatalogStore, Table};
use rustc_hash::FxHashSet;
use tracing::{debug, warn};

/// Report which canonical keys are absent, propagating store read errors.
pub fn try_verify<S: CatalogStore + ?Sized>(
    store: &S,
    definition: &CatalogDefinition,
) -> Result<VerificationResult, CuratorError> {
    let categories: FxHashSet<String> = store.list_keys(Table::Categories)?.into_iter().collect();
    let achievements: FxHashSet<String> =
        store.list_keys(Table::Achievements)?.into_iter().collect();

    let result = VerificationResult {
        missing_category_keys: missing(definition.category_keys(), &categories),
        missing_achievement_keys: missing(definition.achievement_keys(), &achievements),
    };
    debug!(
        missing_categories = result.missing_category_keys.len(),
        missing_achievements = result.missing_achievement_keys.len(),
        "catalog verification finished"
    );
    Ok(result)
}

/// Like [`try_verify`], but an unreadable store reports every key missing so
/// callers fall through to reconciliation instead of trusting it.
pub fn verify<S: CatalogStore + ?Sized>(
    store: &S,
    definition: &CatalogDefinition,
) -> VerificationResult {
    match try_verify(store, definition) {
        Ok(result) => result,
        Err(e) => {
            warn!(error = %e, "catalog verification failed; assuming full drift");
            fully_invalid(definition)
        }
    }
}

/// Every canonical key reported missing.
pub fn fully_invalid(definition: &CatalogDefinition) -> VerificationResult {
    VerificationResult {
        missing_category_keys: definition.category_keys().map(str::to_string).collect(),
        missing_achievement_keys: definition.achievement_keys().map(str::to_string).collect(),
    }
}

fn missing<'a>(required: impl Iterator<Item = &'a str>, existing: &FxHashSet<String>) -> Vec<String> {
    required
        .filter(|key| !existing.contains(*key))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::model::CatalogEntity;
    use crate::core::memory_store::{MemoryStore, StoreOp};

    #[test]
    fn test_empty_store_misses_everything_in_definition_order() {
        let def = CatalogDefinition::builtin();
        let result = verify(&MemoryStore::new(), &def);
        assert!(!result.is_valid());
        assert_eq!(result.missing_category_keys[0], "email");
        assert_eq!(result.missing_category_keys.len(), 8);
        assert_eq!(result.missing_achievement_keys.len(), 3);
    }

    #[test]
    fn test_partial_store_reports_only_absent_keys() {
        let def = CatalogDefinition::builtin();
        let store = MemoryStore::new();
        for c in &def.categories[1..] {
            store.insert(Table::Categories, c.to_row().unwrap()).unwrap();
        }
        for a in &def.achievements {
            store.insert(Table::Achievements, a.to_row().unwrap()).unwrap();
        }
        let result = verify(&store, &def);
        assert_eq!(result.missing_category_keys, vec!["email".to_string()]);
        assert!(result.missing_achievement_keys.is_empty());
    }

    #[test]
    fn test_extra_stored_keys_do_not_invalidate() {
        let mut def = CatalogDefinition::builtin();
        let store = MemoryStore::new();
        for c in &def.categories {
            store.insert(Table::Categories, c.to_row().unwrap()).unwrap();
        }
        for a in &def.achievements {
            store.insert(Table::Achievements, a.to_row().unwrap()).unwrap();
        }
        def.categories.pop();
        assert!(verify(&store, &def).is_valid());
    }

    #[test]
    fn test_read_failure_is_fail_safe() {
        let def = CatalogDefinition::builtin();
        let store = MemoryStore::new();
        store.fail_on(Table::Achievements, StoreOp::ListKeys, None);

        assert!(try_verify(&store, &def).is_err());
        let result = verify(&store, &def);
        assert_eq!(result, fully_invalid(&def));
        assert_eq!(result.missing_category_keys.len(), 8);
    }
}
