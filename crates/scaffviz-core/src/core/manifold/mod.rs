pub mod pca;
pub mod scaling;
pub mod tsne;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use pca::Pca;
pub use scaling::StandardScaler;
pub use tsne::{Tsne, TsneInit};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ManifoldError {
    #[error("Cannot embed an empty descriptor matrix")]
    EmptyInput,

    #[error("At least {required} samples are required, got {actual}")]
    TooFewSamples { required: usize, actual: usize },

    #[error("Perplexity ({perplexity}) must be smaller than the number of samples ({samples})")]
    InvalidPerplexity { perplexity: f64, samples: usize },

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Descriptor matrix contains non-finite values")]
    NonFinite,
}

/// Low-dimensional coordinates produced by a [`Manifold`], one row per sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub coordinates: DMatrix<f64>,
    /// Human readable axis titles, one per output dimension.
    pub axis_titles: Vec<String>,
}

/// A dimensionality reduction fitted and applied in one step.
///
/// The label prefixes the stored coordinate columns (`<label>_1`, `<label>_2`, ...).
pub trait Manifold: Send + Sync {
    fn label(&self) -> String;

    /// Parameter summary folded into the cache fingerprint.
    fn params(&self) -> String;

    /// Number of output dimensions.
    fn components(&self) -> usize;

    fn fit_transform(&self, data: &DMatrix<f64>) -> Result<Embedding, ManifoldError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "kebab-case")]
pub enum ManifoldKind {
    Pca(Pca),
    Tsne(Tsne),
}

impl ManifoldKind {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "PCA" => Some(ManifoldKind::Pca(Pca::default())),
            "TSNE" => Some(ManifoldKind::Tsne(Tsne::default())),
            _ => None,
        }
    }

    fn inner(&self) -> &dyn Manifold {
        match self {
            ManifoldKind::Pca(pca) => pca,
            ManifoldKind::Tsne(tsne) => tsne,
        }
    }
}

impl Manifold for ManifoldKind {
    fn label(&self) -> String {
        self.inner().label()
    }

    fn params(&self) -> String {
        self.inner().params()
    }

    fn components(&self) -> usize {
        self.inner().components()
    }

    fn fit_transform(&self, data: &DMatrix<f64>) -> Result<Embedding, ManifoldError> {
        self.inner().fit_transform(data)
    }
}

fn validate(data: &DMatrix<f64>, min_samples: usize) -> Result<(), ManifoldError> {
    if data.nrows() == 0 || data.ncols() == 0 {
        return Err(ManifoldError::EmptyInput);
    }
    if data.nrows() < min_samples {
        return Err(ManifoldError::TooFewSamples {
            required: min_samples,
            actual: data.nrows(),
        });
    }
    if data.iter().any(|v| !v.is_finite()) {
        return Err(ManifoldError::NonFinite);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_through_registry() {
        for label in ["PCA", "TSNE"] {
            assert_eq!(ManifoldKind::from_label(label).unwrap().label(), label);
        }
        assert!(ManifoldKind::from_label("UMAP").is_none());
    }

    #[test]
    fn validation_rejects_degenerate_input() {
        assert_eq!(
            validate(&DMatrix::zeros(0, 3), 2),
            Err(ManifoldError::EmptyInput)
        );
        assert_eq!(
            validate(&DMatrix::zeros(1, 3), 2),
            Err(ManifoldError::TooFewSamples {
                required: 2,
                actual: 1
            })
        );
        let mut data = DMatrix::zeros(3, 2);
        data[(1, 1)] = f64::NAN;
        assert_eq!(validate(&data, 2), Err(ManifoldError::NonFinite));
    }

    #[test]
    fn kind_deserializes_from_tagged_table() {
        let kind: ManifoldKind =
            serde_json::from_str(r#"{"method": "pca", "components": 3}"#).unwrap();
        assert_eq!(kind, ManifoldKind::Pca(Pca::new(3)));
    }
}
