use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const DESCRIPTOR_PREFIX: &str = "Descriptor_";
pub const SCAFFOLD_PREFIX: &str = "Scaffold_";
pub const SCAFFOLD_GROUP_PREFIX: &str = "ScaffoldGroup_";
/// Category assigned to scaffolds with too few members to form their own group.
pub const OTHER_GROUP: &str = "Other";

/// The families of derived columns a table can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupKind {
    Descriptor,
    Scaffold,
    ScaffoldGroup,
    Manifold,
}

impl GroupKind {
    pub fn as_str(self) -> &'static str {
        match self {
            GroupKind::Descriptor => "descriptor",
            GroupKind::Scaffold => "scaffold",
            GroupKind::ScaffoldGroup => "scaffold-group",
            GroupKind::Manifold => "manifold",
        }
    }
}

/// What a column of a molecule table holds, decoded from its name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Smiles,
    Data,
    Descriptor { generator: String, index: usize },
    Scaffold { generator: String },
    ScaffoldGroup { scaffold: String, threshold: usize },
    Manifold { method: String, dim: usize },
}

impl ColumnKind {
    /// Column name for derived kinds, `None` for plain data and the SMILES column.
    pub fn column_name(&self) -> Option<String> {
        match self {
            ColumnKind::Smiles | ColumnKind::Data => None,
            ColumnKind::Descriptor { generator, index } => {
                Some(format!("{DESCRIPTOR_PREFIX}{generator}_{index}"))
            }
            ColumnKind::Scaffold { generator } => Some(format!("{SCAFFOLD_PREFIX}{generator}")),
            ColumnKind::ScaffoldGroup {
                scaffold,
                threshold,
            } => Some(format!("{SCAFFOLD_GROUP_PREFIX}{scaffold}_{threshold}")),
            ColumnKind::Manifold { method, dim } => Some(format!("{method}_{dim}")),
        }
    }

    pub fn group(&self) -> Option<GroupKind> {
        match self {
            ColumnKind::Smiles | ColumnKind::Data => None,
            ColumnKind::Descriptor { .. } => Some(GroupKind::Descriptor),
            ColumnKind::Scaffold { .. } => Some(GroupKind::Scaffold),
            ColumnKind::ScaffoldGroup { .. } => Some(GroupKind::ScaffoldGroup),
            ColumnKind::Manifold { .. } => Some(GroupKind::Manifold),
        }
    }

    /// Derived values that are stored as numbers.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ColumnKind::Descriptor { .. } | ColumnKind::Manifold { .. }
        )
    }
}

pub fn descriptor_column(generator: &str, index: usize) -> String {
    format!("{DESCRIPTOR_PREFIX}{generator}_{index}")
}

pub fn scaffold_column(generator: &str) -> String {
    format!("{SCAFFOLD_PREFIX}{generator}")
}

pub fn scaffold_group_column(scaffold_column: &str, threshold: usize) -> String {
    format!("{SCAFFOLD_GROUP_PREFIX}{scaffold_column}_{threshold}")
}

pub fn manifold_column(method: &str, dim: usize) -> String {
    format!("{method}_{dim}")
}

/// Decodes column names into [`ColumnKind`]s.
///
/// Manifold columns carry no reserved prefix, so the registry keeps the set of
/// manifold labels it should recognize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRegistry {
    smiles_column: String,
    manifolds: BTreeSet<String>,
}

impl ColumnRegistry {
    pub fn new(smiles_column: impl Into<String>) -> Self {
        Self {
            smiles_column: smiles_column.into(),
            manifolds: ["PCA", "TSNE"].into_iter().map(String::from).collect(),
        }
    }

    pub fn smiles_column(&self) -> &str {
        &self.smiles_column
    }

    pub fn register_manifold(&mut self, label: impl Into<String>) {
        self.manifolds.insert(label.into());
    }

    pub fn classify(&self, name: &str) -> ColumnKind {
        if name == self.smiles_column {
            return ColumnKind::Smiles;
        }
        if let Some(rest) = name.strip_prefix(SCAFFOLD_GROUP_PREFIX) {
            if let Some((scaffold, threshold)) = rest.rsplit_once('_') {
                if let (false, Ok(threshold)) = (scaffold.is_empty(), threshold.parse()) {
                    return ColumnKind::ScaffoldGroup {
                        scaffold: scaffold.to_string(),
                        threshold,
                    };
                }
            }
            return ColumnKind::Data;
        }
        if let Some(rest) = name.strip_prefix(DESCRIPTOR_PREFIX) {
            if let Some((generator, index)) = rest.rsplit_once('_') {
                if let (false, Ok(index)) = (generator.is_empty(), index.parse()) {
                    return ColumnKind::Descriptor {
                        generator: generator.to_string(),
                        index,
                    };
                }
            }
            return ColumnKind::Data;
        }
        if let Some(generator) = name.strip_prefix(SCAFFOLD_PREFIX) {
            if !generator.is_empty() {
                return ColumnKind::Scaffold {
                    generator: generator.to_string(),
                };
            }
            return ColumnKind::Data;
        }
        if let Some((method, dim)) = name.rsplit_once('_') {
            if self.manifolds.contains(method) {
                if let Ok(dim @ 1..) = dim.parse::<usize>() {
                    return ColumnKind::Manifold {
                        method: method.to_string(),
                        dim,
                    };
                }
            }
        }
        ColumnKind::Data
    }
}
