use super::Descriptor;
use crate::core::chem::{BondOrder, Molecule};
use crate::core::chem::ring::ring_atoms;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

#[inline]
fn fnv1a(hash: u64, value: u64) -> u64 {
    value
        .to_le_bytes()
        .iter()
        .fold(hash, |h, &byte| (h ^ byte as u64).wrapping_mul(FNV_PRIME))
}

fn bond_code(order: BondOrder) -> u64 {
    match order {
        BondOrder::Single => 1,
        BondOrder::Double => 2,
        BondOrder::Triple => 3,
        BondOrder::Aromatic => 4,
    }
}

/// Circular (ECFP-like) fingerprint folded into `n_bits` binary features.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MorganFingerprint {
    radius: u32,
    n_bits: usize,
}

impl MorganFingerprint {
    pub fn new(radius: u32, n_bits: usize) -> Self {
        Self {
            radius,
            n_bits: n_bits.max(1),
        }
    }

    pub fn bits(&self, mol: &Molecule) -> Vec<bool> {
        let mut bits = vec![false; self.n_bits];
        let n = mol.atom_count();
        if n == 0 {
            return bits;
        }

        let in_ring = ring_atoms(mol);
        let mut identifiers: Vec<u64> = mol
            .atoms()
            .iter()
            .enumerate()
            .map(|(index, atom)| {
                [
                    atom.atomic_number() as u64,
                    mol.degree(index) as u64,
                    atom.hydrogens as u64,
                    atom.charge as i64 as u64,
                    in_ring[index] as u64,
                    atom.aromatic as u64,
                ]
                .into_iter()
                .fold(FNV_OFFSET, fnv1a)
            })
            .collect();

        for &id in &identifiers {
            bits[(id % self.n_bits as u64) as usize] = true;
        }

        for iteration in 0..self.radius {
            identifiers = (0..n)
                .map(|atom| {
                    let mut around: Vec<(u64, u64)> = mol
                        .neighbors(atom)
                        .iter()
                        .map(|&(neighbor, bond)| (bond_code(mol.bond(bond).order), identifiers[neighbor]))
                        .collect();
                    around.sort_unstable();
                    around.into_iter().fold(
                        fnv1a(fnv1a(FNV_OFFSET, iteration as u64), identifiers[atom]),
                        |h, (order, id)| fnv1a(fnv1a(h, order), id),
                    )
                })
                .collect();
            for &id in &identifiers {
                bits[(id % self.n_bits as u64) as usize] = true;
            }
        }
        bits
    }
}

impl Descriptor for MorganFingerprint {
    fn label(&self) -> String {
        "MorganFP".to_string()
    }

    fn params(&self) -> String {
        format!("radius={};n_bits={}", self.radius, self.n_bits)
    }

    fn len(&self) -> usize {
        self.n_bits
    }

    fn compute(&self, mol: &Molecule) -> Vec<f64> {
        self.bits(mol)
            .into_iter()
            .map(|bit| if bit { 1.0 } else { 0.0 })
            .collect()
    }
}
