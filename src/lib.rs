//! Axis — Financial Decision Stabilization Layer
//!
//! Turns an unstructured financial decision narrative into a structured,
//! multi-section decision report through a staged pipeline of model calls:
//!
//! EXTRACTION → {TRADEOFF ∥ VOLATILITY ∥ SCENARIO} → {SUMMARY ∥ SNAPSHOT ∥ DRIFT?} → ASSEMBLE
//!
//! All domain judgment comes from the external model. This crate only
//! sequences calls, enforces per-stage schemas, merges deterministic
//! fields, and propagates failures.

pub mod api;
pub mod enrichment;
pub mod error;
pub mod gateway;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod schema;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use schema::Stage;
