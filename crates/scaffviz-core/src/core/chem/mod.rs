pub mod aromaticity;
pub mod element;
pub mod molecule;
pub mod ring;
pub mod smiles;
pub mod writer;

pub use molecule::{Atom, Bond, BondOrder, Molecule};
pub use smiles::{SmilesError, parse_smiles};
pub use writer::{canonical_smiles, write_smiles};
