pub mod morgan;
pub mod physchem;

use crate::core::chem::Molecule;
use serde::{Deserialize, Serialize};

pub use morgan::MorganFingerprint;
pub use physchem::PhyschemDescriptors;

/// A generator mapping a molecule to a fixed-length numeric vector.
///
/// Values land in columns `Descriptor_<label>_<index>`. Molecules that cannot
/// be parsed receive [`Descriptor::placeholder`] so every row keeps the same
/// width.
pub trait Descriptor: Send + Sync {
    fn label(&self) -> String;

    /// Parameter summary folded into the cache fingerprint.
    fn params(&self) -> String {
        String::new()
    }

    fn len(&self) -> usize;

    fn compute(&self, mol: &Molecule) -> Vec<f64>;

    fn placeholder(&self) -> Vec<f64> {
        vec![0.0; self.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum DescriptorKind {
    MorganFp { radius: u32, n_bits: usize },
    Physchem,
}

impl DescriptorKind {
    pub const DEFAULT_MORGAN: DescriptorKind = DescriptorKind::MorganFp {
        radius: 2,
        n_bits: 2048,
    };

    fn generator(&self) -> Box<dyn Descriptor> {
        match *self {
            DescriptorKind::MorganFp { radius, n_bits } => {
                Box::new(MorganFingerprint::new(radius, n_bits))
            }
            DescriptorKind::Physchem => Box::new(PhyschemDescriptors),
        }
    }
}

impl Descriptor for DescriptorKind {
    fn label(&self) -> String {
        self.generator().label()
    }

    fn params(&self) -> String {
        self.generator().params()
    }

    fn len(&self) -> usize {
        self.generator().len()
    }

    fn compute(&self, mol: &Molecule) -> Vec<f64> {
        self.generator().compute(mol)
    }
}
