// src/output/mod.rs
//! Delivering results, with planning kept apart from the I/O.
//!
//! Callers build an [`OutputPlan`] from pure data and hand it to
//! [`deliver`], the only place that writes files or standard streams.

mod types;
mod writer;

pub use types::{DeliveryTarget, OutputPlan, OutputReport};
pub use writer::{deliver, render_json};
