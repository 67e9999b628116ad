//! Analytics entry points.
//!
//! # Responsibility
//! - Expose dashboard aggregation APIs over the knowledge store.
//! - Keep metric shaping and window arithmetic inside core.

pub mod dashboard;
