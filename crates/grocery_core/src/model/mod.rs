//! Grocery list domain model.
//!
//! # Responsibility
//! - Define the canonical item record shared by store, controller and FFI.
//!
//! # Invariants
//! - Every item is identified by a stable `ItemId`.
//! - Identity is id-based; two items are equal iff their ids are equal.

pub mod item;
