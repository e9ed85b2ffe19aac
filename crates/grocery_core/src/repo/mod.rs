//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the item data access contract used by the store.
//! - Isolate SQLite query details from store and controller orchestration.
//!
//! # Invariants
//! - Repository writes enforce item validation before persistence.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod item_repo;
