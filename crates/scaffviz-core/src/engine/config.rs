use crate::core::descriptors::DescriptorKind;
use crate::core::manifold::ManifoldKind;
use crate::core::scaffolds::ScaffoldKind;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Port {0} is used by more than one view")]
    DuplicatePort(u16),

    #[error(
        "Each view needs its own table, prediction set and port: got {tables} table(s), {predictions} prediction set(s) and {ports} port(s)"
    )]
    CountMismatch {
        tables: usize,
        predictions: usize,
        ports: usize,
    },
}

pub const DEFAULT_MOLS_PER_GROUP: usize = 10;
pub const DEFAULT_PLOT_HEIGHT: u32 = 800;

#[derive(Debug, Clone, PartialEq)]
pub struct PlotConfig {
    pub x: Option<String>,
    pub y: Option<String>,
    pub color_by: Option<String>,
    /// Defaults to the SMILES column.
    pub title_column: Option<String>,
    pub card_columns: Vec<String>,
    pub mols_per_group: usize,
    pub height: u32,
    pub width: u32,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            x: None,
            y: None,
            color_by: None,
            title_column: None,
            card_columns: Vec::new(),
            mols_per_group: DEFAULT_MOLS_PER_GROUP,
            height: DEFAULT_PLOT_HEIGHT,
            width: DEFAULT_PLOT_HEIGHT * 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub smiles_column: String,
    pub descriptors: Vec<DescriptorKind>,
    pub scaffolds: Vec<ScaffoldKind>,
    pub manifold: Option<ManifoldKind>,
    pub recalculate: bool,
    pub plot: PlotConfig,
}

#[derive(Default)]
pub struct PipelineConfigBuilder {
    smiles_column: Option<String>,
    descriptors: Option<Vec<DescriptorKind>>,
    scaffolds: Option<Vec<ScaffoldKind>>,
    manifold: Option<ManifoldKind>,
    recalculate: bool,
    x: Option<String>,
    y: Option<String>,
    color_by: Option<String>,
    title_column: Option<String>,
    card_columns: Vec<String>,
    mols_per_group: Option<usize>,
    height: Option<u32>,
    width: Option<u32>,
}

impl PipelineConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn smiles_column(mut self, column: impl Into<String>) -> Self {
        self.smiles_column = Some(column.into());
        self
    }
    pub fn descriptors(mut self, descriptors: Vec<DescriptorKind>) -> Self {
        self.descriptors = Some(descriptors);
        self
    }
    pub fn scaffolds(mut self, scaffolds: Vec<ScaffoldKind>) -> Self {
        self.scaffolds = Some(scaffolds);
        self
    }
    pub fn manifold(mut self, manifold: Option<ManifoldKind>) -> Self {
        self.manifold = manifold;
        self
    }
    pub fn recalculate(mut self, recalculate: bool) -> Self {
        self.recalculate = recalculate;
        self
    }
    pub fn x(mut self, column: Option<String>) -> Self {
        self.x = column;
        self
    }
    pub fn y(mut self, column: Option<String>) -> Self {
        self.y = column;
        self
    }
    pub fn color_by(mut self, column: Option<String>) -> Self {
        self.color_by = column;
        self
    }
    pub fn title_column(mut self, column: Option<String>) -> Self {
        self.title_column = column;
        self
    }
    pub fn card_columns(mut self, columns: Vec<String>) -> Self {
        self.card_columns = columns;
        self
    }
    pub fn mols_per_group(mut self, n: usize) -> Self {
        self.mols_per_group = Some(n);
        self
    }
    pub fn height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }
    pub fn width(mut self, width: Option<u32>) -> Self {
        self.width = width;
        self
    }

    pub fn build(self) -> Result<PipelineConfig, ConfigError> {
        let descriptors = self
            .descriptors
            .ok_or(ConfigError::MissingParameter("descriptors"))?;
        if self.manifold.is_some() && descriptors.is_empty() {
            return Err(ConfigError::InvalidParameter {
                name: "descriptors",
                reason: "a manifold needs at least one descriptor generator".to_string(),
            });
        }
        let mols_per_group = self
            .mols_per_group
            .ok_or(ConfigError::MissingParameter("mols_per_group"))?;
        if mols_per_group == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "mols_per_group",
                reason: "must be at least 1".to_string(),
            });
        }
        let height = self.height.ok_or(ConfigError::MissingParameter("height"))?;
        let plot = PlotConfig {
            x: self.x,
            y: self.y,
            color_by: self.color_by,
            title_column: self.title_column,
            card_columns: self.card_columns,
            mols_per_group,
            height,
            width: self.width.unwrap_or(height * 2),
        };
        Ok(PipelineConfig {
            smiles_column: self
                .smiles_column
                .ok_or(ConfigError::MissingParameter("smiles_column"))?,
            descriptors,
            scaffolds: self
                .scaffolds
                .ok_or(ConfigError::MissingParameter("scaffolds"))?,
            manifold: self.manifold,
            recalculate: self.recalculate,
            plot,
        })
    }
}

/// Checks that a set of served views is consistent.
///
/// Ports must be unique. Every table needs its own port, and when prediction
/// sets are given there must be exactly one per table.
pub fn validate_views(
    ports: &[u16],
    tables: usize,
    predictions: Option<usize>,
) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for &port in ports {
        if !seen.insert(port) {
            return Err(ConfigError::DuplicatePort(port));
        }
    }
    let predictions_match = predictions.is_none_or(|count| count == tables);
    if ports.len() != tables || !predictions_match {
        return Err(ConfigError::CountMismatch {
            tables,
            predictions: predictions.unwrap_or(tables),
            ports: ports.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::manifold::Pca;

    fn complete() -> PipelineConfigBuilder {
        PipelineConfigBuilder::new()
            .smiles_column("SMILES")
            .descriptors(vec![DescriptorKind::DEFAULT_MORGAN])
            .scaffolds(vec![ScaffoldKind::Murcko])
            .mols_per_group(10)
            .height(800)
    }

    #[test]
    fn builder_fills_plot_defaults() {
        let config = complete().build().unwrap();
        assert_eq!(config.plot.width, 1600);
        assert_eq!(config.plot.mols_per_group, 10);
        assert!(config.manifold.is_none());
        assert!(!config.recalculate);
    }

    #[test]
    fn builder_reports_missing_parameters() {
        let result = PipelineConfigBuilder::new()
            .descriptors(vec![])
            .scaffolds(vec![])
            .mols_per_group(5)
            .height(600)
            .build();
        assert_eq!(result, Err(ConfigError::MissingParameter("smiles_column")));
    }

    #[test]
    fn manifold_without_descriptors_is_rejected() {
        let result = complete()
            .descriptors(vec![])
            .manifold(Some(ManifoldKind::Pca(Pca::default())))
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidParameter { name: "descriptors", .. })
        ));
    }

    #[test]
    fn views_need_unique_ports_and_matching_counts() {
        assert_eq!(validate_views(&[9292, 9293], 2, Some(2)), Ok(()));
        assert_eq!(validate_views(&[9292], 1, None), Ok(()));
        assert_eq!(
            validate_views(&[9292, 9292], 2, None),
            Err(ConfigError::DuplicatePort(9292))
        );
        assert_eq!(
            validate_views(&[9292, 9293], 2, Some(1)),
            Err(ConfigError::CountMismatch {
                tables: 2,
                predictions: 1,
                ports: 2
            })
        );
        assert!(validate_views(&[9292], 2, None).is_err());
    }
}
