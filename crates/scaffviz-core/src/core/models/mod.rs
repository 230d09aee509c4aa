//! # Core Models Module
//!
//! In-memory representation of a compound table.
//!
//! - [`frame`] - Ordered named columns of equal length, with text or numeric cells
//! - [`columns`] - The naming scheme for derived columns and the registry that decodes it
//!
//! Column presence is the only schema: a table "has descriptors" exactly when
//! a column named `Descriptor_<generator>_<index>` exists.

pub mod columns;
pub mod frame;
