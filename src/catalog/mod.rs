//! The catalog reconciliation engine.
//!
//! - [`definition`]: the canonical, compiled-in catalog
//! - [`verifier`]: two-read drift presence check
//! - [`reconciler`]: idempotent convergence pass with per-entry isolation
//! - [`stats`]: categories joined to item counts
//! - [`retry`]: once-per-session orchestration with bounded backoff
//!
//! [`Catalog`] binds one store to one definition and is the surface callers use.

pub mod definition;
pub mod model;
pub mod reconciler;
pub mod retry;
pub mod stats;
pub mod verifier;

use crate::core::error::CuratorError;
use crate::core::store::CatalogStore;
use definition::CatalogDefinition;
use model::{CategoryStats, ReconciliationResult, VerificationResult};

pub struct Catalog<S> {
    store: S,
    definition: CatalogDefinition,
}

impl<S: CatalogStore> Catalog<S> {
    pub fn new(store: S, definition: CatalogDefinition) -> Self {
        Self { store, definition }
    }

    pub fn with_builtin(store: S) -> Self {
        Self::new(store, CatalogDefinition::builtin())
    }

    pub fn ensure(&self) -> Result<ReconciliationResult, CuratorError> {
        reconciler::ensure(&self.store, &self.definition)
    }

    pub fn verify(&self) -> VerificationResult {
        verifier::verify(&self.store, &self.definition)
    }

    pub fn try_verify(&self) -> Result<VerificationResult, CuratorError> {
        verifier::try_verify(&self.store, &self.definition)
    }

    pub fn get_stats(&self) -> Vec<CategoryStats> {
        stats::get_stats(&self.store)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn definition(&self) -> &CatalogDefinition {
        &self.definition
    }

    pub fn into_store(self) -> S {
        self.store
    }
}
