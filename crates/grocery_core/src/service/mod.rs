//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep controller/FFI layers decoupled from storage details.

pub mod item_store;
