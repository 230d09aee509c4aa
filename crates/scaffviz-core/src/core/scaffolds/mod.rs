pub mod murcko;

use crate::core::chem::Molecule;
use serde::{Deserialize, Serialize};

pub use murcko::MurckoScaffold;

/// A generator reducing a molecule to its scaffold.
///
/// The label names the scaffold column (`Scaffold_<label>`) and must be
/// unique among the generators applied to one table.
pub trait Scaffold: Send + Sync {
    fn label(&self) -> String;

    /// Parameter summary folded into the cache fingerprint.
    fn params(&self) -> String {
        String::new()
    }

    fn scaffold(&self, mol: &Molecule) -> Molecule;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScaffoldKind {
    Murcko,
    GenericMurcko,
}

impl ScaffoldKind {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Murcko" => Some(ScaffoldKind::Murcko),
            "GenericMurcko" => Some(ScaffoldKind::GenericMurcko),
            _ => None,
        }
    }

    fn generator(self) -> MurckoScaffold {
        match self {
            ScaffoldKind::Murcko => MurckoScaffold::new(),
            ScaffoldKind::GenericMurcko => MurckoScaffold::generic(),
        }
    }
}

impl Scaffold for ScaffoldKind {
    fn label(&self) -> String {
        self.generator().label()
    }

    fn scaffold(&self, mol: &Molecule) -> Molecule {
        self.generator().scaffold(mol)
    }
}
