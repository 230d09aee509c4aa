use super::{Embedding, Manifold, ManifoldError, validate};
use nalgebra::{DMatrix, SymmetricEigen};
use serde::{Deserialize, Serialize};

/// Principal component analysis on mean-centered descriptors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Pca {
    pub components: usize,
}

impl Default for Pca {
    fn default() -> Self {
        Self { components: 2 }
    }
}

/// Result of a PCA fit: projected samples and the share of variance per component.
#[derive(Debug, Clone, PartialEq)]
pub struct PcaFit {
    pub scores: DMatrix<f64>,
    pub explained_variance_ratio: Vec<f64>,
}

impl Pca {
    pub fn new(components: usize) -> Self {
        Self { components }
    }

    /// Projects `data` onto its leading principal components.
    ///
    /// The eigen-decomposition runs on whichever of the covariance (features x
    /// features) or Gram (samples x samples) matrix is smaller. Component signs
    /// are fixed so that the largest absolute score of each component is positive.
    pub fn fit(&self, data: &DMatrix<f64>) -> Result<PcaFit, ManifoldError> {
        validate(data, 2)?;
        let (n, d) = data.shape();
        if self.components == 0 || self.components > n.min(d) {
            return Err(ManifoldError::InvalidParameter {
                name: "components",
                reason: format!(
                    "must be between 1 and {} for a {}x{} matrix",
                    n.min(d),
                    n,
                    d
                ),
            });
        }

        let mut centered = data.clone();
        for mut column in centered.column_iter_mut() {
            let mean = column.mean();
            column.add_scalar_mut(-mean);
        }

        let use_gram = n < d;
        let symmetric = if use_gram {
            &centered * centered.transpose()
        } else {
            centered.transpose() * &centered
        };
        let eigen = SymmetricEigen::new(symmetric);

        let mut order: Vec<usize> = (0..eigen.eigenvalues.len()).collect();
        order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));

        let total: f64 = eigen.eigenvalues.iter().map(|v| v.max(0.0)).sum();
        let mut scores = DMatrix::zeros(n, self.components);
        let mut ratios = Vec::with_capacity(self.components);

        for (component, &index) in order.iter().take(self.components).enumerate() {
            let value = eigen.eigenvalues[index].max(0.0);
            let vector = eigen.eigenvectors.column(index);
            let projected = if use_gram {
                vector * value.sqrt()
            } else {
                &centered * vector
            };
            let pivot = projected
                .iter()
                .copied()
                .max_by(|a, b| a.abs().total_cmp(&b.abs()))
                .unwrap_or(0.0);
            let sign = if pivot < 0.0 { -1.0 } else { 1.0 };
            scores.set_column(component, &(projected * sign));
            ratios.push(if total > 0.0 { value / total } else { 0.0 });
        }

        Ok(PcaFit {
            scores,
            explained_variance_ratio: ratios,
        })
    }
}

impl Manifold for Pca {
    fn label(&self) -> String {
        "PCA".to_string()
    }

    fn params(&self) -> String {
        format!("components={}", self.components)
    }

    fn components(&self) -> usize {
        self.components
    }

    fn fit_transform(&self, data: &DMatrix<f64>) -> Result<Embedding, ManifoldError> {
        let fit = self.fit(data)?;
        let axis_titles = fit
            .explained_variance_ratio
            .iter()
            .enumerate()
            .map(|(i, ratio)| format!("PC_{} ({:.1} %)", i + 1, ratio * 100.0))
            .collect();
        Ok(Embedding {
            coordinates: fit.scores,
            axis_titles,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_with_noise() -> DMatrix<f64> {
        DMatrix::from_row_slice(
            5,
            3,
            &[
                0.0, 0.0, 0.1, //
                1.0, 2.0, -0.1, //
                2.0, 4.0, 0.1, //
                3.0, 6.0, -0.1, //
                5.0, 10.0, 0.0,
            ],
        )
    }

    #[test]
    fn first_component_captures_dominant_direction() {
        let fit = Pca::new(2).fit(&line_with_noise()).unwrap();
        assert_eq!(fit.scores.shape(), (5, 2));
        assert!(fit.explained_variance_ratio[0] > 0.99);
        assert!(fit.explained_variance_ratio[0] >= fit.explained_variance_ratio[1]);
        let first = fit.scores.column(0);
        assert!(first[4] > first[0]);
        assert!(first.sum().abs() < 1e-9);
    }

    #[test]
    fn wide_matrices_use_gram_decomposition_consistently() {
        let tall = Pca::new(2).fit(&line_with_noise()).unwrap();
        let wide = Pca::new(2).fit(&line_with_noise().transpose()).unwrap();
        assert_eq!(wide.scores.shape(), (3, 2));
        assert!(wide.scores.column(0).max() - wide.scores.column(0).min() > 0.0);

        let mut padded: DMatrix<f64> = DMatrix::zeros(5, 8);
        padded.view_mut((0, 0), (5, 3)).copy_from(&line_with_noise());
        let via_gram = Pca::new(2).fit(&padded).unwrap();
        for (a, b) in tall.scores.column(0).iter().zip(via_gram.scores.column(0).iter()) {
            assert!((a - b).abs() < 1e-8);
        }
    }

    #[test]
    fn axis_titles_report_explained_variance() {
        let embedding = Pca::new(2).fit_transform(&line_with_noise()).unwrap();
        assert!(embedding.axis_titles[0].starts_with("PC_1 ("));
        assert!(embedding.axis_titles[0].ends_with(" %)"));
    }

    #[test]
    fn too_many_components_is_rejected() {
        assert!(matches!(
            Pca::new(4).fit(&line_with_noise()),
            Err(ManifoldError::InvalidParameter { name: "components", .. })
        ));
    }
}
