//! Flutter bridge for the grocery list core.

pub mod api;
