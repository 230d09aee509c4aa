//! Reading and writing of tabular compound files.
//!
//! Tables travel as tab-separated text with a header row. The [`traits::TableFile`]
//! trait keeps the format behind a small interface so that the table layer
//! only deals with [`Frame`](crate::core::models::frame::Frame)s.

pub mod traits;
pub mod tsv;
