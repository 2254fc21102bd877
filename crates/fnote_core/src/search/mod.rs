//! Card query construction and execution.
//!
//! # Responsibility
//! - Turn structured search parameters into deterministic card lists.
//! - Keep result shaping inside core.

pub mod query;
