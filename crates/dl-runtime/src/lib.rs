//! Runtime layer for the deposit/lending dashboard.
//!
//! Owns the cached dataset handle and turns it into page models for the
//! presentation layer.

pub mod data_manager;
pub mod pages;

pub use dl_core as core;
pub use dl_data as data;
