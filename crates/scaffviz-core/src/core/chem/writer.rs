use super::molecule::{BondOrder, Molecule};
use super::ring::ring_atoms;
use super::smiles::{SmilesError, parse_smiles};
use std::fmt::Write;

/// Writes a canonical SMILES string for `mol`.
///
/// Atoms are ranked from graph invariants refined to a fixed point, with ties
/// broken one at a time. Each fragment is traversed depth-first from its
/// lowest-ranked atom, visiting neighbors in rank order. Equivalent input
/// graphs therefore produce identical strings regardless of atom order.
pub fn write_smiles(mol: &Molecule) -> String {
    if mol.is_empty() {
        return String::new();
    }
    let ranks = canonical_ranks(mol);
    let mut writer = SmilesWriter::new(mol, &ranks);
    writer.write_all()
}

/// Parses `smiles` and writes it back in canonical form.
pub fn canonical_smiles(smiles: &str) -> Result<String, SmilesError> {
    parse_smiles(smiles).map(|mol| write_smiles(&mol))
}

fn bond_code(order: BondOrder) -> u8 {
    match order {
        BondOrder::Single => 1,
        BondOrder::Double => 2,
        BondOrder::Triple => 3,
        BondOrder::Aromatic => 4,
    }
}

fn dense_rank<T: Ord>(keys: &[T]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by(|&a, &b| keys[a].cmp(&keys[b]));
    let mut ranks = vec![0; keys.len()];
    let mut current = 0;
    for window in 1..order.len() {
        if keys[order[window]] != keys[order[window - 1]] {
            current += 1;
        }
        ranks[order[window]] = current;
    }
    ranks
}

fn distinct(ranks: &[usize]) -> usize {
    ranks.iter().max().map_or(0, |&max| max + 1)
}

fn refine(mol: &Molecule, mut ranks: Vec<usize>) -> Vec<usize> {
    loop {
        let keys: Vec<(usize, Vec<(usize, u8)>)> = (0..mol.atom_count())
            .map(|atom| {
                let mut around: Vec<(usize, u8)> = mol
                    .neighbors(atom)
                    .iter()
                    .map(|&(neighbor, bond)| (ranks[neighbor], bond_code(mol.bond(bond).order)))
                    .collect();
                around.sort_unstable();
                (ranks[atom], around)
            })
            .collect();
        let next = dense_rank(&keys);
        if distinct(&next) == distinct(&ranks) {
            return next;
        }
        ranks = next;
    }
}

fn canonical_ranks(mol: &Molecule) -> Vec<usize> {
    let in_ring = ring_atoms(mol);
    let invariants: Vec<_> = mol
        .atoms()
        .iter()
        .enumerate()
        .map(|(index, atom)| {
            (
                atom.atomic_number(),
                atom.aromatic,
                mol.degree(index),
                atom.hydrogens,
                atom.charge,
                atom.isotope.unwrap_or(0),
                in_ring[index],
            )
        })
        .collect();

    let mut ranks = refine(mol, dense_rank(&invariants));
    while distinct(&ranks) < mol.atom_count() {
        let mut counts = vec![0usize; distinct(&ranks)];
        for &rank in &ranks {
            counts[rank] += 1;
        }
        let Some(tied) = counts.iter().position(|&count| count > 1) else {
            break;
        };
        let Some(chosen) = ranks.iter().position(|&rank| rank == tied) else {
            break;
        };
        let split: Vec<usize> = ranks
            .iter()
            .enumerate()
            .map(|(index, &rank)| {
                if rank == tied && index != chosen {
                    rank * 2 + 1
                } else {
                    rank * 2
                }
            })
            .collect();
        ranks = refine(mol, dense_rank(&split));
    }
    ranks
}

struct SmilesWriter<'a> {
    mol: &'a Molecule,
    ranks: &'a [usize],
    visited: Vec<bool>,
    classified: Vec<bool>,
    children: Vec<Vec<(usize, usize)>>,
    ring_marks: Vec<Vec<usize>>,
    ring_digits: Vec<Option<u16>>,
    free_digits: Vec<bool>,
    out: String,
}

impl<'a> SmilesWriter<'a> {
    fn new(mol: &'a Molecule, ranks: &'a [usize]) -> Self {
        Self {
            mol,
            ranks,
            visited: vec![false; mol.atom_count()],
            classified: vec![false; mol.bond_count()],
            children: vec![Vec::new(); mol.atom_count()],
            ring_marks: vec![Vec::new(); mol.atom_count()],
            ring_digits: vec![None; mol.bond_count()],
            free_digits: vec![true; 100],
            out: String::new(),
        }
    }

    fn write_all(&mut self) -> String {
        let mut starts: Vec<usize> = (0..self.mol.atom_count()).collect();
        starts.sort_by_key(|&atom| self.ranks[atom]);
        let mut first = true;
        for start in starts {
            if self.visited[start] {
                continue;
            }
            self.build_tree(start, None);
            if !first {
                self.out.push('.');
            }
            first = false;
            self.emit(start, None);
        }
        std::mem::take(&mut self.out)
    }

    fn sorted_neighbors(&self, atom: usize) -> Vec<(usize, usize)> {
        let mut neighbors = self.mol.neighbors(atom).to_vec();
        neighbors.sort_by_key(|&(neighbor, _)| self.ranks[neighbor]);
        neighbors
    }

    fn build_tree(&mut self, atom: usize, parent_bond: Option<usize>) {
        self.visited[atom] = true;
        for (neighbor, bond) in self.sorted_neighbors(atom) {
            if Some(bond) == parent_bond || self.classified[bond] {
                continue;
            }
            self.classified[bond] = true;
            if self.visited[neighbor] {
                self.ring_marks[neighbor].push(bond);
                self.ring_marks[atom].push(bond);
            } else {
                self.children[atom].push((neighbor, bond));
                self.build_tree(neighbor, Some(bond));
            }
        }
    }

    fn emit(&mut self, atom: usize, incoming: Option<usize>) {
        if let Some(bond) = incoming {
            self.emit_bond(bond);
        }
        self.emit_atom(atom);

        let marks = self.ring_marks[atom].clone();
        let (closing, opening): (Vec<usize>, Vec<usize>) = marks
            .into_iter()
            .partition(|&bond| self.ring_digits[bond].is_some());
        for bond in closing {
            if let Some(digit) = self.ring_digits[bond] {
                self.push_digit(digit);
                self.free_digits[digit as usize] = true;
            }
        }
        for bond in opening {
            let digit = self
                .free_digits
                .iter()
                .skip(1)
                .position(|&free| free)
                .map_or(99, |offset| offset as u16 + 1);
            self.free_digits[digit as usize] = false;
            self.ring_digits[bond] = Some(digit);
            self.emit_bond(bond);
            self.push_digit(digit);
        }

        let children = self.children[atom].clone();
        let last = children.len().saturating_sub(1);
        for (index, (child, bond)) in children.into_iter().enumerate() {
            if index < last {
                self.out.push('(');
                self.emit(child, Some(bond));
                self.out.push(')');
            } else {
                self.emit(child, Some(bond));
            }
        }
    }

    fn push_digit(&mut self, digit: u16) {
        if digit < 10 {
            let _ = write!(self.out, "{}", digit);
        } else {
            let _ = write!(self.out, "%{:02}", digit);
        }
    }

    fn emit_bond(&mut self, bond: usize) {
        let bond = self.mol.bond(bond);
        let both_aromatic =
            self.mol.atom(bond.begin).aromatic && self.mol.atom(bond.end).aromatic;
        match bond.order {
            BondOrder::Single if both_aromatic => self.out.push('-'),
            BondOrder::Aromatic if !both_aromatic => self.out.push(':'),
            BondOrder::Single | BondOrder::Aromatic => {}
            BondOrder::Double => self.out.push('='),
            BondOrder::Triple => self.out.push('#'),
        }
    }

    fn emit_atom(&mut self, index: usize) {
        let atom = self.mol.atom(index);
        let symbol = if atom.aromatic {
            atom.element.symbol.to_ascii_lowercase()
        } else {
            atom.element.symbol.to_string()
        };
        let shorthand = atom.element.is_organic_subset()
            && atom.charge == 0
            && atom.isotope.is_none()
            && (!atom.aromatic || atom.element.has_aromatic_form())
            && atom.hydrogens == self.mol.default_hydrogens(index);
        if shorthand {
            self.out.push_str(&symbol);
            return;
        }

        self.out.push('[');
        if let Some(isotope) = atom.isotope {
            let _ = write!(self.out, "{}", isotope);
        }
        self.out.push_str(&symbol);
        match atom.hydrogens {
            0 => {}
            1 => self.out.push('H'),
            n => {
                let _ = write!(self.out, "H{}", n);
            }
        }
        match atom.charge {
            0 => {}
            1 => self.out.push('+'),
            -1 => self.out.push('-'),
            c if c > 0 => {
                let _ = write!(self.out, "+{}", c);
            }
            c => {
                let _ = write!(self.out, "-{}", c.unsigned_abs());
            }
        }
        self.out.push(']');
    }
}
