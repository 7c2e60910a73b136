//! Shared domain layer for the deposit/lending dashboard.
//!
//! Holds the row and period models, the error taxonomy, number and date
//! formatting used by every presentation surface, and CLI settings with
//! persisted last-used parameters.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
