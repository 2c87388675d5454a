//! Per-page git authorship for documentation sites.
//!
//! For every page of a documentation tree, [`engine::AttributionEngine`]
//! reads the source file's git history, aggregates its authors and applies
//! the configured fallback when there is no history. [`site::build`] drives a
//! whole build and writes HTML with the authorship blocks injected.

pub mod aggregate;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exclude;
pub mod fallback;
pub mod history;
pub mod render;
pub mod site;
