//! # scaffviz Core Library
//!
//! Chemical-space visualisation for compound tables: load a table of SMILES with
//! assay metadata, derive fingerprints and scaffolds, project the descriptor space
//! to two dimensions and describe an interactive scatter plot of the result.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture.
//!
//! - **[`core`]: The Foundation.** Stateless chemistry (`Molecule`, SMILES I/O,
//!   Murcko scaffolds), descriptor and manifold generators, the `Frame` table model
//!   and TSV I/O.
//!
//! - **[`engine`]: The Logic Core.** The stateful `MoleculeTable`, which appends derived
//!   columns lazily, persists itself on every mutation and keeps a content-addressed
//!   column cache next to the table file so repeated requests are served from disk.
//!
//! - **[`workflows`]: The Public API.** End-to-end procedures built on the engine:
//!   preparing a table from a `PipelineConfig`, building the `ScatterPlot` model and
//!   overlaying model-performance data.

pub mod core;
pub mod engine;
pub mod workflows;
