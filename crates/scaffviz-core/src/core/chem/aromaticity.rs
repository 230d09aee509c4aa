use super::molecule::{BondOrder, Molecule};
use super::ring::{ring_bonds, small_rings};

const MIN_AROMATIC_RING: usize = 5;
const MAX_AROMATIC_RING: usize = 6;

/// Brings Kekulé and aromatic spellings of the same structure to one graph.
///
/// Five- and six-membered rings are marked aromatic when every member can
/// donate pi electrons and the ring holds `4n + 2` of them. Electron counts
/// are read from the bond orders as written, so fused Kekulé systems are
/// perceived ring by ring. Hydrogen counts are kept as parsed.
///
/// Afterwards, acyclic bonds between two aromatic atoms are stored as single
/// bonds, so `c1ccccc1-c1ccccc1` and `c1ccccc1c1ccccc1` give the same graph.
pub fn perceive_aromaticity(mol: &mut Molecule) {
    let in_ring = ring_bonds(mol);
    let mut aromatic_atoms = Vec::new();
    let mut aromatic_bonds = Vec::new();

    for ring in small_rings(mol, MAX_AROMATIC_RING) {
        if ring.len() < MIN_AROMATIC_RING {
            continue;
        }
        let Some(bonds) = ring_bond_indices(mol, &ring) else {
            continue;
        };
        if bonds
            .iter()
            .all(|&bond| mol.bond(bond).order == BondOrder::Aromatic)
        {
            continue;
        }
        let electrons: Option<u8> = ring
            .iter()
            .map(|&atom| pi_electrons(mol, atom, &in_ring))
            .sum();
        if electrons.is_some_and(|count| count % 4 == 2) {
            aromatic_atoms.extend(ring);
            aromatic_bonds.extend(bonds);
        }
    }

    for atom in aromatic_atoms {
        mol.atoms_mut()[atom].aromatic = true;
    }
    for bond in aromatic_bonds {
        mol.set_bond_order(bond, BondOrder::Aromatic);
    }

    for index in 0..mol.bond_count() {
        let bond = *mol.bond(index);
        if !in_ring[index]
            && bond.order == BondOrder::Aromatic
            && mol.atom(bond.begin).aromatic
            && mol.atom(bond.end).aromatic
        {
            mol.set_bond_order(index, BondOrder::Single);
        }
    }
}

fn ring_bond_indices(mol: &Molecule, ring: &[usize]) -> Option<Vec<usize>> {
    ring.iter()
        .zip(ring.iter().cycle().skip(1))
        .map(|(&a, &b)| {
            mol.neighbors(a)
                .iter()
                .find(|&&(neighbor, _)| neighbor == b)
                .map(|&(_, bond)| bond)
        })
        .collect()
}

/// Pi electrons `atom` donates to a ring, `None` if it rules the ring out.
fn pi_electrons(mol: &Molecule, atom: usize, in_ring: &[bool]) -> Option<u8> {
    let current = mol.atom(atom);
    let mut doubles = 0;
    let mut endocyclic = false;
    for &(_, bond) in mol.neighbors(atom) {
        match mol.bond(bond).order {
            BondOrder::Double => {
                doubles += 1;
                endocyclic |= in_ring[bond];
            }
            BondOrder::Triple => return None,
            BondOrder::Single | BondOrder::Aromatic => {}
        }
    }

    let symbol = current.element.symbol;
    match doubles {
        0 => {
            let lone_pair = match symbol {
                "N" | "P" => {
                    current.hydrogens > 0 || mol.degree(atom) == 3 || current.charge < 0
                }
                "O" | "S" | "Se" => current.charge == 0,
                "C" => current.charge < 0,
                _ => false,
            };
            if lone_pair {
                Some(2)
            } else if current.aromatic {
                Some(1)
            } else {
                None
            }
        }
        1 if endocyclic => Some(1),
        // Ring carbonyl carbons, as in pyridones and uracils.
        1 if symbol == "C" => Some(0),
        _ => None,
    }
}
