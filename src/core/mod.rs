//! Storage plumbing shared by the catalog engine.
//!
//! Everything here is domain-agnostic with respect to reconciliation: the
//! store contract and its two implementations, schema, config, and errors.

pub mod config;
pub mod db;
pub mod error;
pub mod memory_store;
pub mod output;
pub mod schemas;
pub mod sqlite_store;
pub mod store;
pub mod time;
