//! EDC Landscape - exploratory viewer core for design archetype corpora
//!
//! A fixed set of research papers and their extracted design-pattern
//! entries (EDC tags) is projected into 2-D offline; this crate loads the
//! published JSON layouts, normalizes them into one canonical model, and
//! provides the query pieces the viewer needs: nearest neighbors, legend
//! coloring, text/year filtering and per-issue detail models. The egui
//! viewer in [`gui`] consumes all of it as a library.

pub mod adapters;
pub mod detail;
pub mod fetch;
pub mod filter;
pub mod gui;
pub mod issue_config;
pub mod knn;
pub mod legend;
pub mod logging;
pub mod model;
pub mod store;
pub mod view;
