use super::element::Element;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Aromatic,
}

impl BondOrder {
    /// Contribution of the bond to the valence of each endpoint, aromatic bonds count as one.
    pub fn valence_contribution(self) -> u8 {
        match self {
            BondOrder::Single | BondOrder::Aromatic => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
        }
    }

    pub fn symbol(self) -> Option<char> {
        match self {
            BondOrder::Single => Some('-'),
            BondOrder::Double => Some('='),
            BondOrder::Triple => Some('#'),
            BondOrder::Aromatic => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub element: &'static Element,
    pub charge: i8,
    pub isotope: Option<u16>,
    pub aromatic: bool,
    pub hydrogens: u8,
}

impl Atom {
    pub fn new(element: &'static Element) -> Self {
        Self {
            element,
            charge: 0,
            isotope: None,
            aromatic: false,
            hydrogens: 0,
        }
    }

    #[inline]
    pub fn atomic_number(&self) -> u8 {
        self.element.atomic_number
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bond {
    pub begin: usize,
    pub end: usize,
    pub order: BondOrder,
}

impl Bond {
    /// The endpoint of the bond that is not `atom`.
    #[inline]
    pub fn other(&self, atom: usize) -> usize {
        if self.begin == atom {
            self.end
        } else {
            self.begin
        }
    }
}

/// A hydrogen-suppressed molecular graph.
///
/// Hydrogens are stored as counts on their heavy atoms. The adjacency list
/// holds `(neighbor, bond index)` pairs in bond insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Molecule {
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    adjacency: Vec<Vec<(usize, usize)>>,
}

impl Molecule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_atom(&mut self, atom: Atom) -> usize {
        self.atoms.push(atom);
        self.adjacency.push(Vec::new());
        self.atoms.len() - 1
    }

    pub fn add_bond(&mut self, begin: usize, end: usize, order: BondOrder) -> usize {
        let index = self.bonds.len();
        self.bonds.push(Bond { begin, end, order });
        self.adjacency[begin].push((end, index));
        self.adjacency[end].push((begin, index));
        index
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atoms_mut(&mut self) -> &mut [Atom] {
        &mut self.atoms
    }

    pub fn atom(&self, index: usize) -> &Atom {
        &self.atoms[index]
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn bond(&self, index: usize) -> &Bond {
        &self.bonds[index]
    }

    pub fn set_bond_order(&mut self, index: usize, order: BondOrder) {
        self.bonds[index].order = order;
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn neighbors(&self, atom: usize) -> &[(usize, usize)] {
        &self.adjacency[atom]
    }

    pub fn degree(&self, atom: usize) -> usize {
        self.adjacency[atom].len()
    }

    pub fn bond_between(&self, a: usize, b: usize) -> Option<&Bond> {
        self.adjacency[a]
            .iter()
            .find(|&&(neighbor, _)| neighbor == b)
            .map(|&(_, bond)| &self.bonds[bond])
    }

    /// Sum of bond valence contributions, with one extra unit for aromatic atoms
    /// to account for the delocalized pi bond.
    pub fn explicit_valence(&self, atom: usize) -> u8 {
        let bonded: u8 = self.adjacency[atom]
            .iter()
            .map(|&(_, bond)| self.bonds[bond].order.valence_contribution())
            .sum();
        if self.atoms[atom].aromatic {
            bonded + 1
        } else {
            bonded
        }
    }

    /// Hydrogen count implied by the default valence model of the atom's element.
    pub fn default_hydrogens(&self, atom: usize) -> u8 {
        let used = self.explicit_valence(atom) as i16;
        let valences = self.atoms[atom].element.valences;
        if self.atoms[atom].aromatic {
            let first = valences.first().copied().unwrap_or(0) as i16;
            return (first - used).max(0) as u8;
        }
        valences
            .iter()
            .map(|&v| v as i16)
            .find(|&v| v >= used)
            .map(|v| (v - used) as u8)
            .unwrap_or(0)
    }

    pub fn heavy_atom_count(&self) -> usize {
        self.atoms
            .iter()
            .filter(|atom| atom.atomic_number() > 1)
            .count()
    }

    /// Builds the induced subgraph over the atoms flagged in `keep`.
    ///
    /// Returns the new molecule together with a map from old to new atom indices.
    pub fn subgraph(&self, keep: &[bool]) -> (Molecule, Vec<Option<usize>>) {
        let mut result = Molecule::new();
        let mut mapping = vec![None; self.atoms.len()];
        for (index, atom) in self.atoms.iter().enumerate() {
            if keep[index] {
                mapping[index] = Some(result.add_atom(atom.clone()));
            }
        }
        for bond in &self.bonds {
            if let (Some(begin), Some(end)) = (mapping[bond.begin], mapping[bond.end]) {
                result.add_bond(begin, end, bond.order);
            }
        }
        (result, mapping)
    }

    /// Labels each atom with the index of its connected component.
    pub fn components(&self) -> Vec<usize> {
        let mut labels = vec![usize::MAX; self.atoms.len()];
        let mut next = 0;
        for start in 0..self.atoms.len() {
            if labels[start] != usize::MAX {
                continue;
            }
            let mut stack = vec![start];
            labels[start] = next;
            while let Some(atom) = stack.pop() {
                for &(neighbor, _) in &self.adjacency[atom] {
                    if labels[neighbor] == usize::MAX {
                        labels[neighbor] = next;
                        stack.push(neighbor);
                    }
                }
            }
            next += 1;
        }
        labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chem::element::by_symbol;

    fn ethanol() -> Molecule {
        let mut mol = Molecule::new();
        let c1 = mol.add_atom(Atom::new(by_symbol("C").unwrap()));
        let c2 = mol.add_atom(Atom::new(by_symbol("C").unwrap()));
        let o = mol.add_atom(Atom::new(by_symbol("O").unwrap()));
        mol.add_bond(c1, c2, BondOrder::Single);
        mol.add_bond(c2, o, BondOrder::Single);
        mol
    }

    #[test]
    fn adjacency_tracks_added_bonds() {
        let mol = ethanol();
        assert_eq!(mol.atom_count(), 3);
        assert_eq!(mol.bond_count(), 2);
        assert_eq!(mol.degree(1), 2);
        assert!(mol.bond_between(0, 2).is_none());
        assert_eq!(mol.bond_between(2, 1).unwrap().order, BondOrder::Single);
    }

    #[test]
    fn default_hydrogens_follow_lowest_fitting_valence() {
        let mol = ethanol();
        assert_eq!(mol.default_hydrogens(0), 3);
        assert_eq!(mol.default_hydrogens(1), 2);
        assert_eq!(mol.default_hydrogens(2), 1);
    }

    #[test]
    fn subgraph_keeps_only_internal_bonds() {
        let mol = ethanol();
        let (sub, mapping) = mol.subgraph(&[false, true, true]);
        assert_eq!(sub.atom_count(), 2);
        assert_eq!(sub.bond_count(), 1);
        assert_eq!(mapping, vec![None, Some(0), Some(1)]);
    }

    #[test]
    fn components_label_disconnected_fragments() {
        let mut mol = ethanol();
        mol.add_atom(Atom::new(by_symbol("Na").unwrap()));
        let labels = mol.components();
        assert_eq!(labels[0], labels[2]);
        assert_ne!(labels[0], labels[3]);
    }
}
