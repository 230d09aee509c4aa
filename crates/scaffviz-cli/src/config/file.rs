use crate::error::{CliError, Result};
use scaffviz::core::manifold::TsneInit;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileTableConfig {
    pub smiles_column: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileDescriptorsConfig {
    pub morgan: Option<bool>,
    pub morgan_radius: Option<u32>,
    pub morgan_bits: Option<usize>,
    pub physchem: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileScaffoldsConfig {
    pub murcko: Option<bool>,
    pub generic_murcko: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileManifoldConfig {
    pub method: Option<String>,
    pub components: Option<usize>,
    pub perplexity: Option<f64>,
    pub learning_rate: Option<f64>,
    pub iterations: Option<usize>,
    pub early_exaggeration: Option<f64>,
    pub init: Option<TsneInit>,
    pub seed: Option<u64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FilePlotConfig {
    pub x: Option<String>,
    pub y: Option<String>,
    pub color_by: Option<String>,
    pub title_column: Option<String>,
    pub card_columns: Option<Vec<String>>,
    pub mols_per_group: Option<usize>,
    pub height: Option<u32>,
    pub width: Option<u32>,
    pub recalculate: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub table: Option<FileTableConfig>,
    pub descriptors: Option<FileDescriptorsConfig>,
    pub scaffolds: Option<FileScaffoldsConfig>,
    pub manifold: Option<FileManifoldConfig>,
    pub plot: Option<FilePlotConfig>,
    pub server: Option<FileServerConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}
