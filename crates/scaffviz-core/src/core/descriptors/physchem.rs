use super::Descriptor;
use crate::core::chem::ring::{ring_bonds, ring_count};
use crate::core::chem::{BondOrder, Molecule};

/// A compact set of whole-molecule physicochemical properties.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhyschemDescriptors;

impl PhyschemDescriptors {
    pub const NAMES: [&'static str; 7] = [
        "MolecularWeight",
        "HeavyAtoms",
        "HDonors",
        "HAcceptors",
        "Rings",
        "AromaticAtoms",
        "RotatableBonds",
    ];
}

fn molecular_weight(mol: &Molecule) -> f64 {
    mol.atoms()
        .iter()
        .map(|atom| atom.element.atomic_weight + atom.hydrogens as f64 * 1.008)
        .sum()
}

fn is_polar(mol: &Molecule, atom: usize) -> bool {
    matches!(mol.atom(atom).atomic_number(), 7 | 8)
}

fn rotatable_bonds(mol: &Molecule) -> usize {
    let in_ring = ring_bonds(mol);
    mol.bonds()
        .iter()
        .enumerate()
        .filter(|&(index, bond)| {
            bond.order == BondOrder::Single
                && !in_ring[index]
                && mol.degree(bond.begin) > 1
                && mol.degree(bond.end) > 1
        })
        .count()
}

impl Descriptor for PhyschemDescriptors {
    fn label(&self) -> String {
        "Physchem".to_string()
    }

    fn len(&self) -> usize {
        Self::NAMES.len()
    }

    fn compute(&self, mol: &Molecule) -> Vec<f64> {
        let donors = (0..mol.atom_count())
            .filter(|&atom| is_polar(mol, atom) && mol.atom(atom).hydrogens > 0)
            .count();
        let acceptors = (0..mol.atom_count())
            .filter(|&atom| is_polar(mol, atom))
            .count();
        let aromatic = mol.atoms().iter().filter(|atom| atom.aromatic).count();
        vec![
            molecular_weight(mol),
            mol.heavy_atom_count() as f64,
            donors as f64,
            acceptors as f64,
            ring_count(mol) as f64,
            aromatic as f64,
            rotatable_bonds(mol) as f64,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chem::parse_smiles;

    #[test]
    fn aspirin_properties_match_reference_values() {
        let mol = parse_smiles("CC(=O)Oc1ccccc1C(=O)O").unwrap();
        let values = PhyschemDescriptors.compute(&mol);
        assert_eq!(values.len(), 7);
        assert!((values[0] - 180.16).abs() < 0.1);
        assert_eq!(values[1], 13.0);
        assert_eq!(values[2], 1.0);
        assert_eq!(values[3], 4.0);
        assert_eq!(values[4], 1.0);
        assert_eq!(values[5], 6.0);
        assert_eq!(values[6], 3.0);
    }
}
