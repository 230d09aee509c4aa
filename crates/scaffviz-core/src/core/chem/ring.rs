use super::molecule::Molecule;
use std::collections::HashSet;

/// Flags every bond that lies on at least one cycle.
///
/// A bond is a ring bond exactly when it is not a bridge of the molecular
/// graph, so a single low-link traversal is enough.
pub fn ring_bonds(mol: &Molecule) -> Vec<bool> {
    let n = mol.atom_count();
    let mut discovery = vec![usize::MAX; n];
    let mut low = vec![0usize; n];
    let mut bridges = HashSet::new();
    let mut timer = 0;

    for root in 0..n {
        if discovery[root] != usize::MAX {
            continue;
        }
        // (atom, parent bond, next neighbor slot)
        let mut stack: Vec<(usize, Option<usize>, usize)> = vec![(root, None, 0)];
        discovery[root] = timer;
        low[root] = timer;
        timer += 1;

        while let Some(top) = stack.len().checked_sub(1) {
            let (atom, parent_bond, slot) = stack[top];
            if let Some(&(neighbor, bond)) = mol.neighbors(atom).get(slot) {
                stack[top].2 += 1;
                if Some(bond) == parent_bond {
                    continue;
                }
                if discovery[neighbor] == usize::MAX {
                    discovery[neighbor] = timer;
                    low[neighbor] = timer;
                    timer += 1;
                    stack.push((neighbor, Some(bond), 0));
                } else {
                    low[atom] = low[atom].min(discovery[neighbor]);
                }
            } else {
                stack.pop();
                if let (Some(bond), Some(&(parent, _, _))) = (parent_bond, stack.last()) {
                    low[parent] = low[parent].min(low[atom]);
                    if low[atom] > discovery[parent] {
                        bridges.insert(bond);
                    }
                }
            }
        }
    }

    (0..mol.bond_count())
        .map(|bond| !bridges.contains(&bond))
        .collect()
}

/// Flags every atom that participates in at least one ring bond.
pub fn ring_atoms(mol: &Molecule) -> Vec<bool> {
    let in_ring = ring_bonds(mol);
    let mut atoms = vec![false; mol.atom_count()];
    for (index, bond) in mol.bonds().iter().enumerate() {
        if in_ring[index] {
            atoms[bond.begin] = true;
            atoms[bond.end] = true;
        }
    }
    atoms
}

/// Enumerates every simple cycle of at most `max_size` atoms.
///
/// Each cycle is reported once, as its atoms in path order starting from the
/// lowest atom index.
pub fn small_rings(mol: &Molecule, max_size: usize) -> Vec<Vec<usize>> {
    let in_ring = ring_bonds(mol);
    let mut rings = Vec::new();
    let mut seen = HashSet::new();
    for start in 0..mol.atom_count() {
        let mut path = vec![start];
        extend_ring(mol, &in_ring, max_size, &mut path, &mut rings, &mut seen);
    }
    rings
}

fn extend_ring(
    mol: &Molecule,
    in_ring: &[bool],
    max_size: usize,
    path: &mut Vec<usize>,
    rings: &mut Vec<Vec<usize>>,
    seen: &mut HashSet<Vec<usize>>,
) {
    let start = path[0];
    let last = path[path.len() - 1];
    for &(neighbor, bond) in mol.neighbors(last) {
        if !in_ring[bond] {
            continue;
        }
        if neighbor == start && path.len() >= 3 {
            let mut members = path.clone();
            members.sort_unstable();
            if seen.insert(members) {
                rings.push(path.clone());
            }
        } else if neighbor > start && path.len() < max_size && !path.contains(&neighbor) {
            path.push(neighbor);
            extend_ring(mol, in_ring, max_size, path, rings, seen);
            path.pop();
        }
    }
}

/// Number of independent cycles (the cyclomatic number of the graph).
pub fn ring_count(mol: &Molecule) -> usize {
    let components = mol
        .components()
        .into_iter()
        .collect::<HashSet<_>>()
        .len();
    (mol.bond_count() + components).saturating_sub(mol.atom_count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chem::smiles::parse_smiles;

    #[test]
    fn acyclic_molecule_has_no_ring_bonds() {
        let mol = parse_smiles("CCCO").unwrap();
        assert!(ring_bonds(&mol).iter().all(|&r| !r));
        assert_eq!(ring_count(&mol), 0);
    }

    #[test]
    fn substituent_bond_of_toluene_is_a_bridge() {
        let mol = parse_smiles("Cc1ccccc1").unwrap();
        let bonds = ring_bonds(&mol);
        assert!(!bonds[0]);
        assert_eq!(bonds.iter().filter(|&&r| r).count(), 6);
        let atoms = ring_atoms(&mol);
        assert!(!atoms[0]);
        assert!(atoms[1..].iter().all(|&r| r));
    }

    #[test]
    fn fused_and_linked_rings_are_counted() {
        let naphthalene = parse_smiles("c1ccc2ccccc2c1").unwrap();
        assert_eq!(ring_count(&naphthalene), 2);

        let biphenyl = parse_smiles("c1ccccc1-c1ccccc1").unwrap();
        assert_eq!(ring_count(&biphenyl), 2);
        let linker = biphenyl
            .bonds()
            .iter()
            .position(|b| b.order == crate::core::chem::molecule::BondOrder::Single)
            .unwrap();
        assert!(!ring_bonds(&biphenyl)[linker]);
    }

    #[test]
    fn small_rings_of_fused_system_exclude_the_perimeter() {
        let naphthalene = parse_smiles("c1ccc2ccccc2c1").unwrap();
        let rings = small_rings(&naphthalene, 6);
        assert_eq!(rings.len(), 2);
        assert!(rings.iter().all(|ring| ring.len() == 6));
        assert_eq!(small_rings(&naphthalene, 10).len(), 3);

        let spiro = parse_smiles("C1CCC2(C1)CCC2").unwrap();
        let mut sizes: Vec<usize> = small_rings(&spiro, 6).iter().map(Vec::len).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![4, 5]);
    }
}
