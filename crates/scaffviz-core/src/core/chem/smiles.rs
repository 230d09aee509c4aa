use super::aromaticity::perceive_aromaticity;
use super::element::{self, Element};
use super::molecule::{Atom, BondOrder, Molecule};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SmilesError {
    #[error("Empty SMILES string")]
    Empty,

    #[error("Unexpected character '{character}' at position {position}")]
    UnexpectedCharacter { character: char, position: usize },

    #[error("Unexpected end of input inside bracket atom starting at position {0}")]
    UnterminatedBracket(usize),

    #[error("Unknown element symbol '{0}'")]
    UnknownElement(String),

    #[error("Element '{0}' cannot be aromatic")]
    InvalidAromatic(String),

    #[error("Bond or ring closure at position {0} has no preceding atom")]
    DanglingBond(usize),

    #[error("Ring closure {0} was opened but never closed")]
    UnclosedRing(u16),

    #[error("Ring closure {0} joins an atom to itself or to an already bonded neighbor")]
    InvalidRingClosure(u16),

    #[error("Unbalanced parentheses")]
    UnbalancedParentheses,
}

/// Parses a SMILES string into a hydrogen-suppressed [`Molecule`].
///
/// Supports the organic subset, bracket atoms (isotope, hydrogen count,
/// charge), branches, ring closures including `%nn`, explicit bond symbols
/// and dot-separated fragments. Stereo markers are accepted and discarded.
/// Kekulé rings are converted to their aromatic form after parsing.
pub fn parse_smiles(smiles: &str) -> Result<Molecule, SmilesError> {
    let trimmed = smiles.trim();
    if trimmed.is_empty() {
        return Err(SmilesError::Empty);
    }
    let mut parser = Parser::new(trimmed);
    parser.parse()?;
    parser.finish()
}

struct PendingRing {
    atom: usize,
    order: Option<BondOrder>,
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    mol: Molecule,
    bracketed: Vec<bool>,
    rings: BTreeMap<u16, PendingRing>,
    branches: Vec<Option<usize>>,
    previous: Option<usize>,
    pending_bond: Option<BondOrder>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
            mol: Molecule::new(),
            bracketed: Vec::new(),
            rings: BTreeMap::new(),
            branches: Vec::new(),
            previous: None,
            pending_bond: None,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let ch = self.peek();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn unexpected(&self, ch: u8) -> SmilesError {
        SmilesError::UnexpectedCharacter {
            character: ch as char,
            position: self.pos,
        }
    }

    fn parse(&mut self) -> Result<(), SmilesError> {
        while let Some(ch) = self.peek() {
            match ch {
                b'(' => {
                    if self.previous.is_none() {
                        return Err(SmilesError::DanglingBond(self.pos));
                    }
                    self.bump();
                    self.branches.push(self.previous);
                }
                b')' => {
                    self.bump();
                    self.previous = self
                        .branches
                        .pop()
                        .ok_or(SmilesError::UnbalancedParentheses)?;
                    self.pending_bond = None;
                }
                b'-' | b'/' | b'\\' => {
                    self.bump();
                    self.pending_bond = Some(BondOrder::Single);
                }
                b'=' => {
                    self.bump();
                    self.pending_bond = Some(BondOrder::Double);
                }
                b'#' => {
                    self.bump();
                    self.pending_bond = Some(BondOrder::Triple);
                }
                b':' => {
                    self.bump();
                    self.pending_bond = Some(BondOrder::Aromatic);
                }
                b'.' => {
                    self.bump();
                    self.previous = None;
                    self.pending_bond = None;
                }
                b'%' => {
                    self.bump();
                    let digits = [self.bump(), self.bump()];
                    let number = match digits {
                        [Some(a), Some(b)] if a.is_ascii_digit() && b.is_ascii_digit() => {
                            (a - b'0') as u16 * 10 + (b - b'0') as u16
                        }
                        _ => return Err(SmilesError::UnexpectedCharacter {
                            character: '%',
                            position: self.pos.saturating_sub(3),
                        }),
                    };
                    self.ring_closure(number)?;
                }
                b'0'..=b'9' => {
                    self.bump();
                    self.ring_closure((ch - b'0') as u16)?;
                }
                b'[' => self.bracket_atom()?,
                _ => self.organic_atom()?,
            }
        }
        Ok(())
    }

    fn organic_atom(&mut self) -> Result<(), SmilesError> {
        let Some(ch) = self.peek() else {
            return Ok(());
        };
        let (symbol, aromatic, width) = match (ch, self.peek_at(1)) {
            (b'B', Some(b'r')) => ("Br", false, 2),
            (b'C', Some(b'l')) => ("Cl", false, 2),
            (b'B', _) => ("B", false, 1),
            (b'C', _) => ("C", false, 1),
            (b'N', _) => ("N", false, 1),
            (b'O', _) => ("O", false, 1),
            (b'P', _) => ("P", false, 1),
            (b'S', _) => ("S", false, 1),
            (b'F', _) => ("F", false, 1),
            (b'I', _) => ("I", false, 1),
            (b'b', _) => ("B", true, 1),
            (b'c', _) => ("C", true, 1),
            (b'n', _) => ("N", true, 1),
            (b'o', _) => ("O", true, 1),
            (b'p', _) => ("P", true, 1),
            (b's', _) => ("S", true, 1),
            _ => return Err(self.unexpected(ch)),
        };
        self.pos += width;
        let element = lookup(symbol)?;
        let mut atom = Atom::new(element);
        atom.aromatic = aromatic;
        self.push_atom(atom, false);
        Ok(())
    }

    fn bracket_atom(&mut self) -> Result<(), SmilesError> {
        let start = self.pos;
        self.bump();

        let isotope = self.number().map(|n| n as u16);

        let first = self.bump().ok_or(SmilesError::UnterminatedBracket(start))?;
        if !first.is_ascii_alphabetic() {
            return Err(SmilesError::UnexpectedCharacter {
                character: first as char,
                position: self.pos - 1,
            });
        }
        let aromatic = first.is_ascii_lowercase();
        let mut symbol = String::from(first.to_ascii_uppercase() as char);
        if let Some(next) = self.peek() {
            if next.is_ascii_lowercase() {
                let candidate = format!("{}{}", symbol, next as char);
                if element::by_symbol(&candidate).is_some() {
                    self.bump();
                    symbol = candidate;
                }
            }
        }
        let element = lookup(&symbol)?;
        if aromatic && !matches!(symbol.as_str(), "B" | "C" | "N" | "O" | "P" | "S" | "Se" | "As" | "Te") {
            return Err(SmilesError::InvalidAromatic(symbol));
        }

        self.skip_chirality();

        let mut hydrogens = 0u8;
        if self.peek() == Some(b'H') {
            self.bump();
            hydrogens = self.number().map(|n| n as u8).unwrap_or(1);
        }

        let mut charge: i8 = 0;
        if let Some(sign @ (b'+' | b'-')) = self.peek() {
            let unit: i8 = if sign == b'+' { 1 } else { -1 };
            self.bump();
            if let Some(magnitude) = self.number() {
                charge = unit * magnitude as i8;
            } else {
                charge = unit;
                while self.peek() == Some(sign) {
                    self.bump();
                    charge += unit;
                }
            }
        }

        if self.peek() == Some(b':') {
            self.bump();
            self.number();
        }

        match self.bump() {
            Some(b']') => {}
            Some(other) => {
                return Err(SmilesError::UnexpectedCharacter {
                    character: other as char,
                    position: self.pos - 1,
                });
            }
            None => return Err(SmilesError::UnterminatedBracket(start)),
        }

        let mut atom = Atom::new(element);
        atom.aromatic = aromatic;
        atom.isotope = isotope;
        atom.hydrogens = hydrogens;
        atom.charge = charge;
        self.push_atom(atom, true);
        Ok(())
    }

    fn skip_chirality(&mut self) {
        if self.peek() != Some(b'@') {
            return;
        }
        while self.peek() == Some(b'@') {
            self.bump();
        }
        let class = [self.peek(), self.peek_at(1)];
        if matches!(
            class,
            [Some(b'T'), Some(b'H')]
                | [Some(b'A'), Some(b'L')]
                | [Some(b'S'), Some(b'P')]
                | [Some(b'T'), Some(b'B')]
                | [Some(b'O'), Some(b'H')]
        ) {
            self.pos += 2;
            self.number();
        }
    }

    fn number(&mut self) -> Option<u32> {
        let mut value: Option<u32> = None;
        while let Some(ch) = self.peek().filter(u8::is_ascii_digit) {
            self.bump();
            value = Some(value.unwrap_or(0) * 10 + (ch - b'0') as u32);
        }
        value
    }

    fn push_atom(&mut self, atom: Atom, bracketed: bool) {
        let index = self.mol.add_atom(atom);
        self.bracketed.push(bracketed);
        if let Some(previous) = self.previous {
            let order = self
                .pending_bond
                .take()
                .unwrap_or_else(|| self.default_order(previous, index));
            self.mol.add_bond(previous, index, order);
        }
        self.pending_bond = None;
        self.previous = Some(index);
    }

    fn default_order(&self, a: usize, b: usize) -> BondOrder {
        if self.mol.atom(a).aromatic && self.mol.atom(b).aromatic {
            BondOrder::Aromatic
        } else {
            BondOrder::Single
        }
    }

    fn ring_closure(&mut self, number: u16) -> Result<(), SmilesError> {
        let current = self
            .previous
            .ok_or(SmilesError::DanglingBond(self.pos.saturating_sub(1)))?;
        let explicit = self.pending_bond.take();
        match self.rings.remove(&number) {
            Some(open) => {
                if open.atom == current || self.mol.bond_between(open.atom, current).is_some() {
                    return Err(SmilesError::InvalidRingClosure(number));
                }
                let order = explicit
                    .or(open.order)
                    .unwrap_or_else(|| self.default_order(open.atom, current));
                self.mol.add_bond(open.atom, current, order);
            }
            None => {
                self.rings.insert(
                    number,
                    PendingRing {
                        atom: current,
                        order: explicit,
                    },
                );
            }
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Molecule, SmilesError> {
        if let Some((&number, _)) = self.rings.iter().next() {
            return Err(SmilesError::UnclosedRing(number));
        }
        if !self.branches.is_empty() {
            return Err(SmilesError::UnbalancedParentheses);
        }
        if self.pending_bond.is_some() {
            return Err(SmilesError::DanglingBond(self.pos));
        }
        for index in 0..self.mol.atom_count() {
            if !self.bracketed[index] {
                let hydrogens = self.mol.default_hydrogens(index);
                self.mol.atoms_mut()[index].hydrogens = hydrogens;
            }
        }
        perceive_aromaticity(&mut self.mol);
        Ok(self.mol)
    }
}

fn lookup(symbol: &str) -> Result<&'static Element, SmilesError> {
    element::by_symbol(symbol).ok_or_else(|| SmilesError::UnknownElement(symbol.to_string()))
}
