//! # Engine Module
//!
//! The stateful layer of scaffviz: a [`table::MoleculeTable`] that owns a
//! compound table on disk and grows it with derived columns on request.
//!
//! ## Architecture
//!
//! - **Molecule Table** ([`table`]) - Lazy derived columns, persistence on every mutation
//! - **Column Cache** ([`cache`]) - Content-addressed sidecar deciding whether a column group is current
//! - **Scaffold Grouping** ([`grouping`]) - Collapsing rare scaffolds into `Other`
//! - **Configuration** ([`config`]) - Pipeline and plot settings with a validating builder
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events for front ends
//! - **Error Handling** ([`error`]) - The aggregated error type of the library
//!
//! A derived column group is identified by its kind, generator, parameters and
//! a hash of its input. It is computed at most once per identity unless a
//! recalculation is requested; changed parameters or input make it stale and
//! it is recomputed in place.

pub mod cache;
pub mod config;
pub mod error;
pub mod grouping;
pub mod progress;
pub mod table;
