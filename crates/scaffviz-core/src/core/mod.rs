//! # Core Module
//!
//! Stateless building blocks of the scaffviz pipeline.
//!
//! ## Architecture
//!
//! - **Chemistry** ([`chem`]) - SMILES parsing, canonical SMILES output, ring perception
//! - **Descriptors** ([`descriptors`]) - Fixed-length numeric vectors per molecule (Morgan bits, physchem)
//! - **Scaffolds** ([`scaffolds`]) - Bemis-Murcko frameworks and their generic variant
//! - **Manifolds** ([`manifold`]) - PCA and t-SNE projections of the descriptor space
//! - **Table Models** ([`models`]) - Frames, columns and the derived-column naming scheme
//! - **File I/O** ([`io`]) - Tab-separated table reading and atomic writing
//!
//! Nothing in this layer touches the on-disk cache or persists state; that is
//! the job of the [`engine`](crate::engine).

pub mod chem;
pub mod descriptors;
pub mod io;
pub mod manifold;
pub mod models;
pub mod scaffolds;
