use scaffviz::engine::config::{DEFAULT_MOLS_PER_GROUP, DEFAULT_PLOT_HEIGHT};
use scaffviz::engine::table::DEFAULT_SMILES_COLUMN;

pub struct DefaultsConfig {
    pub smiles_column: String,
    pub morgan: bool,
    pub morgan_radius: u32,
    pub morgan_bits: usize,
    pub physchem: bool,
    pub murcko: bool,
    pub generic_murcko: bool,
    pub manifold: String,
    pub mols_per_group: usize,
    pub height: u32,
    pub host: String,
    pub port: u16,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            smiles_column: DEFAULT_SMILES_COLUMN.to_string(),
            morgan: true,
            morgan_radius: 2,
            morgan_bits: 2048,
            physchem: false,
            murcko: true,
            generic_murcko: false,
            manifold: "pca".to_string(),
            mols_per_group: DEFAULT_MOLS_PER_GROUP,
            height: DEFAULT_PLOT_HEIGHT,
            host: "127.0.0.1".to_string(),
            port: 9292,
        }
    }
}
