use super::Scaffold;
use crate::core::chem::element;
use crate::core::chem::{BondOrder, Molecule};

/// Bemis-Murcko framework: ring systems plus the linkers joining them.
///
/// Terminal atoms are pruned until none remain, except atoms attached to the
/// framework by a double bond (exocyclic carbonyls and the like). Atoms that
/// lose a substituent gain the corresponding hydrogens. The generic variant
/// turns every atom into an aliphatic carbon and every bond into a single bond.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MurckoScaffold {
    generic: bool,
}

impl MurckoScaffold {
    pub fn new() -> Self {
        Self { generic: false }
    }

    pub fn generic() -> Self {
        Self { generic: true }
    }
}

impl Scaffold for MurckoScaffold {
    fn label(&self) -> String {
        if self.generic {
            "GenericMurcko".to_string()
        } else {
            "Murcko".to_string()
        }
    }

    fn scaffold(&self, mol: &Molecule) -> Molecule {
        let framework = framework(mol);
        if self.generic {
            make_generic(&framework)
        } else {
            framework
        }
    }
}

fn framework(mol: &Molecule) -> Molecule {
    let n = mol.atom_count();
    let mut keep = vec![true; n];
    let mut degree: Vec<usize> = (0..n).map(|atom| mol.degree(atom)).collect();
    let mut queue: Vec<usize> = (0..n).filter(|&atom| degree[atom] <= 1).collect();

    while let Some(atom) = queue.pop() {
        if !keep[atom] {
            continue;
        }
        keep[atom] = false;
        for &(neighbor, _) in mol.neighbors(atom) {
            if keep[neighbor] {
                degree[neighbor] -= 1;
                if degree[neighbor] <= 1 {
                    queue.push(neighbor);
                }
            }
        }
    }

    let framework_atoms = keep.clone();
    for atom in 0..n {
        if framework_atoms[atom] || mol.degree(atom) != 1 {
            continue;
        }
        let (neighbor, bond) = mol.neighbors(atom)[0];
        if framework_atoms[neighbor] && mol.bond(bond).order == BondOrder::Double {
            keep[atom] = true;
        }
    }

    let mut hydrogens: Vec<u8> = mol.atoms().iter().map(|atom| atom.hydrogens).collect();
    for bond in mol.bonds() {
        match (keep[bond.begin], keep[bond.end]) {
            (true, false) => hydrogens[bond.begin] += bond.order.valence_contribution(),
            (false, true) => hydrogens[bond.end] += bond.order.valence_contribution(),
            _ => {}
        }
    }

    let (mut scaffold, mapping) = mol.subgraph(&keep);
    for (old, new) in mapping.iter().enumerate() {
        if let Some(new) = *new {
            scaffold.atoms_mut()[new].hydrogens = hydrogens[old];
        }
    }
    scaffold
}

fn make_generic(mol: &Molecule) -> Molecule {
    let Some(carbon) = element::by_symbol("C") else {
        return mol.clone();
    };
    let mut generic = Molecule::new();
    for atom in mol.atoms() {
        let mut replacement = atom.clone();
        replacement.element = carbon;
        replacement.aromatic = false;
        replacement.charge = 0;
        replacement.isotope = None;
        generic.add_atom(replacement);
    }
    for bond in mol.bonds() {
        generic.add_bond(bond.begin, bond.end, BondOrder::Single);
    }
    for atom in 0..generic.atom_count() {
        let hydrogens = generic.default_hydrogens(atom);
        generic.atoms_mut()[atom].hydrogens = hydrogens;
    }
    generic
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chem::{canonical_smiles, parse_smiles, write_smiles};

    fn murcko(smiles: &str) -> String {
        write_smiles(&MurckoScaffold::new().scaffold(&parse_smiles(smiles).unwrap()))
    }

    fn generic(smiles: &str) -> String {
        write_smiles(&MurckoScaffold::generic().scaffold(&parse_smiles(smiles).unwrap()))
    }

    #[test]
    fn substituents_are_removed_from_ring() {
        assert_eq!(murcko("Cc1ccccc1"), "c1ccccc1");
        assert_eq!(murcko("OCCc1ccc(Cl)cc1"), "c1ccccc1");
    }

    #[test]
    fn linkers_between_rings_are_kept() {
        let scaffold = murcko("c1ccccc1CCNC(=O)c1ccncc1C");
        assert_eq!(
            scaffold,
            canonical_smiles("c1ccccc1CCNC(=O)c1ccncc1").unwrap()
        );
    }

    #[test]
    fn acyclic_molecules_have_empty_scaffold() {
        assert_eq!(murcko("CCCCO"), "");
    }

    #[test]
    fn aromatic_nitrogen_losing_substituent_gains_hydrogen() {
        assert_eq!(murcko("Cn1cccc1"), canonical_smiles("c1cc[nH]c1").unwrap());
    }

    #[test]
    fn exocyclic_double_bonds_are_retained() {
        assert_eq!(
            murcko("CC1CCC(=O)CC1"),
            canonical_smiles("O=C1CCCCC1").unwrap()
        );
    }

    #[test]
    fn generic_scaffold_is_all_carbon_single_bonds() {
        assert_eq!(generic("c1ccncc1"), "C1CCCCC1");
        assert_eq!(generic("c1ccccc1C(=O)c1ccccc1"), canonical_smiles("C1CCCCC1C(C)C1CCCCC1").unwrap());
    }
}
