//! Album directory reconciliation library - shared modules for the CLI.

pub mod catalog;
pub mod classify;
pub mod discover;
pub mod matcher;
pub mod models;
pub mod normalize;
pub mod plan;
pub mod progress;
pub mod reconcile;
pub mod scoring;
pub mod store;
