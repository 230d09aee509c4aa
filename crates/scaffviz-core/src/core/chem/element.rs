use phf::{Map, phf_map};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Element {
    pub atomic_number: u8,
    pub symbol: &'static str,
    pub atomic_weight: f64,
    /// Allowed valences in ascending order, used to derive implicit hydrogens.
    pub valences: &'static [u8],
}

impl Element {
    /// Whether the element may be written outside brackets in SMILES.
    pub fn is_organic_subset(&self) -> bool {
        matches!(
            self.symbol,
            "B" | "C" | "N" | "O" | "P" | "S" | "F" | "Cl" | "Br" | "I"
        )
    }

    /// Whether the element has a lowercase aromatic form in the organic subset.
    pub fn has_aromatic_form(&self) -> bool {
        matches!(self.symbol, "B" | "C" | "N" | "O" | "P" | "S")
    }
}

macro_rules! element {
    ($n:expr, $sym:expr, $w:expr, [$($v:expr),*]) => {
        Element { atomic_number: $n, symbol: $sym, atomic_weight: $w, valences: &[$($v),*] }
    };
}

#[rustfmt::skip]
static ELEMENTS: Map<&'static str, Element> = phf_map! {
    "H"  => element!(1,  "H",  1.008,   [1]),
    "He" => element!(2,  "He", 4.003,   [0]),
    "Li" => element!(3,  "Li", 6.941,   [1]),
    "Be" => element!(4,  "Be", 9.012,   [2]),
    "B"  => element!(5,  "B",  10.81,   [3]),
    "C"  => element!(6,  "C",  12.011,  [4]),
    "N"  => element!(7,  "N",  14.007,  [3, 5]),
    "O"  => element!(8,  "O",  15.999,  [2]),
    "F"  => element!(9,  "F",  18.998,  [1]),
    "Ne" => element!(10, "Ne", 20.180,  [0]),
    "Na" => element!(11, "Na", 22.990,  [1]),
    "Mg" => element!(12, "Mg", 24.305,  [2]),
    "Al" => element!(13, "Al", 26.982,  [3]),
    "Si" => element!(14, "Si", 28.086,  [4]),
    "P"  => element!(15, "P",  30.974,  [3, 5]),
    "S"  => element!(16, "S",  32.06,   [2, 4, 6]),
    "Cl" => element!(17, "Cl", 35.45,   [1]),
    "Ar" => element!(18, "Ar", 39.948,  [0]),
    "K"  => element!(19, "K",  39.098,  [1]),
    "Ca" => element!(20, "Ca", 40.078,  [2]),
    "Ti" => element!(22, "Ti", 47.867,  [4]),
    "Cr" => element!(24, "Cr", 51.996,  [3]),
    "Mn" => element!(25, "Mn", 54.938,  [2]),
    "Fe" => element!(26, "Fe", 55.845,  [2, 3]),
    "Co" => element!(27, "Co", 58.933,  [2, 3]),
    "Ni" => element!(28, "Ni", 58.693,  [2]),
    "Cu" => element!(29, "Cu", 63.546,  [1, 2]),
    "Zn" => element!(30, "Zn", 65.38,   [2]),
    "Ga" => element!(31, "Ga", 69.723,  [3]),
    "Ge" => element!(32, "Ge", 72.63,   [4]),
    "As" => element!(33, "As", 74.922,  [3, 5]),
    "Se" => element!(34, "Se", 78.96,   [2, 4, 6]),
    "Br" => element!(35, "Br", 79.904,  [1]),
    "Kr" => element!(36, "Kr", 83.798,  [0]),
    "Rb" => element!(37, "Rb", 85.468,  [1]),
    "Sr" => element!(38, "Sr", 87.62,   [2]),
    "Zr" => element!(40, "Zr", 91.224,  [4]),
    "Mo" => element!(42, "Mo", 95.95,   [6]),
    "Ru" => element!(44, "Ru", 101.07,  [4]),
    "Rh" => element!(45, "Rh", 102.906, [3]),
    "Pd" => element!(46, "Pd", 106.42,  [2]),
    "Ag" => element!(47, "Ag", 107.868, [1]),
    "Cd" => element!(48, "Cd", 112.414, [2]),
    "In" => element!(49, "In", 114.818, [3]),
    "Sn" => element!(50, "Sn", 118.710, [2, 4]),
    "Sb" => element!(51, "Sb", 121.760, [3, 5]),
    "Te" => element!(52, "Te", 127.60,  [2, 4, 6]),
    "I"  => element!(53, "I",  126.904, [1]),
    "Xe" => element!(54, "Xe", 131.293, [0]),
    "Cs" => element!(55, "Cs", 132.905, [1]),
    "Ba" => element!(56, "Ba", 137.327, [2]),
    "Pt" => element!(78, "Pt", 195.084, [2, 4]),
    "Au" => element!(79, "Au", 196.967, [1, 3]),
    "Hg" => element!(80, "Hg", 200.592, [1, 2]),
    "Bi" => element!(83, "Bi", 208.980, [3, 5]),
};

pub fn by_symbol(symbol: &str) -> Option<&'static Element> {
    ELEMENTS.get(symbol)
}

pub fn by_atomic_number(atomic_number: u8) -> Option<&'static Element> {
    ELEMENTS
        .values()
        .find(|element| element.atomic_number == atomic_number)
}
