use super::pca::Pca;
use super::scaling::StandardScaler;
use super::{Embedding, Manifold, ManifoldError, validate};
use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

const EXAGGERATION_ITERATIONS: usize = 250;
const MIN_GAIN: f64 = 0.01;
const MIN_PROBABILITY: f64 = 1e-12;
const ENTROPY_TOLERANCE: f64 = 1e-5;
const BINARY_SEARCH_STEPS: usize = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TsneInit {
    #[default]
    Pca,
    Random,
}

/// Exact t-distributed stochastic neighbor embedding.
///
/// Input features are standardized first. Memory and time grow with the square
/// of the number of samples, which suits tables of up to a few thousand rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct Tsne {
    pub components: usize,
    pub perplexity: f64,
    /// `None` selects `max(n / early_exaggeration / 4, 50)`.
    pub learning_rate: Option<f64>,
    pub iterations: usize,
    pub early_exaggeration: f64,
    pub init: TsneInit,
    pub seed: u64,
}

impl Default for Tsne {
    fn default() -> Self {
        Self {
            components: 2,
            perplexity: 30.0,
            learning_rate: None,
            iterations: 1000,
            early_exaggeration: 12.0,
            init: TsneInit::Pca,
            seed: 42,
        }
    }
}

impl Tsne {
    pub fn embed(&self, data: &DMatrix<f64>) -> Result<DMatrix<f64>, ManifoldError> {
        validate(data, 2)?;
        let n = data.nrows();
        if !(self.perplexity > 0.0) || self.perplexity >= n as f64 {
            return Err(ManifoldError::InvalidPerplexity {
                perplexity: self.perplexity,
                samples: n,
            });
        }
        if self.components == 0 {
            return Err(ManifoldError::InvalidParameter {
                name: "components",
                reason: "must be at least 1".to_string(),
            });
        }
        if let Some(rate) = self.learning_rate.filter(|rate| !(*rate > 0.0)) {
            return Err(ManifoldError::InvalidParameter {
                name: "learning-rate",
                reason: format!("must be positive, got {}", rate),
            });
        }

        let scaled = StandardScaler.fit_transform(data);
        let p = joint_probabilities(&squared_distances(&scaled), n, self.perplexity);
        let mut y = self.initial_embedding(&scaled);
        self.optimize(&p, &mut y, n);

        let mut coordinates = DMatrix::from_row_slice(n, self.components, &y);
        for mut column in coordinates.column_iter_mut() {
            let mean = column.mean();
            column.add_scalar_mut(-mean);
        }
        Ok(coordinates)
    }

    fn initial_embedding(&self, scaled: &DMatrix<f64>) -> Vec<f64> {
        let n = scaled.nrows();
        let c = self.components;
        if self.init == TsneInit::Pca {
            if let Ok(fit) = Pca::new(c).fit(scaled) {
                let first = fit.scores.column(0);
                let mean = first.mean();
                let std = (first.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64).sqrt();
                if std > 0.0 {
                    let mut y = Vec::with_capacity(n * c);
                    for row in fit.scores.row_iter() {
                        y.extend(row.iter().map(|v| v / std * 1e-4));
                    }
                    return y;
                }
            }
            debug!("PCA initialization unavailable, falling back to random initialization.");
        }
        let mut rng = StdRng::seed_from_u64(self.seed);
        (0..n * c).map(|_| rng.random_range(-1e-4..1e-4)).collect()
    }

    fn optimize(&self, p: &[f64], y: &mut [f64], n: usize) {
        let c = self.components;
        let learning_rate = self
            .learning_rate
            .unwrap_or_else(|| (n as f64 / self.early_exaggeration / 4.0).max(50.0));
        let mut update = vec![0.0; n * c];
        let mut gains: Vec<f64> = vec![1.0; n * c];

        for iteration in 0..self.iterations {
            let (exaggeration, momentum) = if iteration < EXAGGERATION_ITERATIONS {
                (self.early_exaggeration, 0.5)
            } else {
                (1.0, 0.8)
            };
            let gradient = gradient(p, y, n, c, exaggeration);
            for k in 0..n * c {
                let g = gradient[k];
                let gain = if (g > 0.0) != (update[k] > 0.0) {
                    gains[k] + 0.2
                } else {
                    gains[k] * 0.8
                };
                gains[k] = f64::max(gain, MIN_GAIN);
                update[k] = momentum * update[k] - learning_rate * gains[k] * g;
                y[k] += update[k];
            }
        }
    }
}

impl Manifold for Tsne {
    fn label(&self) -> String {
        "TSNE".to_string()
    }

    fn params(&self) -> String {
        format!(
            "components={};perplexity={};learning_rate={:?};iterations={};early_exaggeration={};init={:?};seed={}",
            self.components,
            self.perplexity,
            self.learning_rate,
            self.iterations,
            self.early_exaggeration,
            self.init,
            self.seed
        )
    }

    fn components(&self) -> usize {
        self.components
    }

    fn fit_transform(&self, data: &DMatrix<f64>) -> Result<Embedding, ManifoldError> {
        let coordinates = self.embed(data)?;
        let axis_titles = (1..=self.components)
            .map(|dim| format!("{}_{}", self.label(), dim))
            .collect();
        Ok(Embedding {
            coordinates,
            axis_titles,
        })
    }
}

fn squared_distances(data: &DMatrix<f64>) -> Vec<f64> {
    let n = data.nrows();
    let gram = data * data.transpose();
    (0..n)
        .into_par_iter()
        .map(|i| {
            (0..n)
                .map(|j| (gram[(i, i)] + gram[(j, j)] - 2.0 * gram[(i, j)]).max(0.0))
                .collect::<Vec<f64>>()
        })
        .collect::<Vec<_>>()
        .concat()
}

/// Row-conditional probabilities whose entropy matches `ln(perplexity)`.
fn conditional_row(distances: &[f64], i: usize, target_entropy: f64) -> Vec<f64> {
    let n = distances.len();
    let floor = distances
        .iter()
        .enumerate()
        .filter(|&(j, _)| j != i)
        .map(|(_, &d)| d)
        .fold(f64::INFINITY, f64::min);
    let shifted: Vec<f64> = distances.iter().map(|&d| d - floor).collect();

    let mut beta = 1.0;
    let (mut low, mut high) = (0.0, f64::INFINITY);
    let mut row = vec![0.0; n];
    for _ in 0..BINARY_SEARCH_STEPS {
        let mut sum = 0.0;
        for j in 0..n {
            row[j] = if j == i { 0.0 } else { (-shifted[j] * beta).exp() };
            sum += row[j];
        }
        let sum = sum.max(f64::MIN_POSITIVE);
        let mut expected = 0.0;
        for j in 0..n {
            row[j] /= sum;
            expected += shifted[j] * row[j];
        }
        let entropy = sum.ln() + beta * expected;
        let difference = entropy - target_entropy;
        if difference.abs() < ENTROPY_TOLERANCE {
            break;
        }
        if difference > 0.0 {
            low = beta;
            beta = if high.is_infinite() { beta * 2.0 } else { (beta + high) / 2.0 };
        } else {
            high = beta;
            beta = (beta + low) / 2.0;
        }
    }
    row
}

fn joint_probabilities(distances: &[f64], n: usize, perplexity: f64) -> Vec<f64> {
    let target = perplexity.ln();
    let conditional: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|i| conditional_row(&distances[i * n..(i + 1) * n], i, target))
        .collect();
    let mut joint = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..n {
            if i != j {
                joint[i * n + j] =
                    ((conditional[i][j] + conditional[j][i]) / (2.0 * n as f64)).max(MIN_PROBABILITY);
            }
        }
    }
    joint
}

fn gradient(p: &[f64], y: &[f64], n: usize, c: usize, exaggeration: f64) -> Vec<f64> {
    let affinity = |i: usize, j: usize| {
        let distance: f64 = (0..c).map(|k| (y[i * c + k] - y[j * c + k]).powi(2)).sum();
        1.0 / (1.0 + distance)
    };
    // Row sums are reduced sequentially so repeated runs are bit-identical.
    let normalization = (0..n)
        .into_par_iter()
        .map(|i| (0..n).filter(|&j| j != i).map(|j| affinity(i, j)).sum::<f64>())
        .collect::<Vec<f64>>()
        .iter()
        .sum::<f64>()
        .max(f64::MIN_POSITIVE);

    (0..n)
        .into_par_iter()
        .map(|i| {
            let mut g = vec![0.0; c];
            for j in (0..n).filter(|&j| j != i) {
                let q = affinity(i, j);
                let force = (exaggeration * p[i * n + j] - q / normalization) * q;
                for k in 0..c {
                    g[k] += 4.0 * force * (y[i * c + k] - y[j * c + k]);
                }
            }
            g
        })
        .collect::<Vec<_>>()
        .concat()
}
