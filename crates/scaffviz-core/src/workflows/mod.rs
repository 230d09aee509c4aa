//! # Workflows Module
//!
//! High-level entry points that drive a [`crate::engine::table::MoleculeTable`]
//! through a complete task.
//!
//! ## Architecture
//!
//! - **Preparation Workflow** ([`prepare`]) - Descriptors, scaffolds, scaffold
//!   groups and an optional manifold projection, each computed only when stale
//! - **Plot Workflow** ([`plot`]) - Resolves axes, colouring and hover cards into
//!   a serializable [`plot::ScatterPlot`]
//! - **Performance Workflow** ([`performance`]) - Joins model predictions onto a
//!   table and configures a plot that colours molecules by error, split,
//!   prediction or label
//!
//! Workflows report phases through [`crate::engine::progress::ProgressReporter`]
//! and leave rendering and serving to the front end.

pub mod performance;
pub mod plot;
pub mod prepare;
