// File: atom.rs
// Author: Hyunbin Kim (khb7840@gmail.com)
// Copyright © 2025 Hyunbin Kim, All rights reserved

use crate::structure::coordinate::Point;

#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub atom_name: [u8; 4],
    pub atom_serial: u64,
    pub alt_loc: u8,
    pub res_name: [u8; 3],
    pub res_serial: i64,
    pub insertion_code: u8,
    pub chain: u8,
    pub b_factor: f32,
    /// The original record, kept so that writing only touches the coordinate columns
    pub line: String,
}

impl Atom {
    pub fn get_coordinate(&self) -> Point {
        [self.x, self.y, self.z]
    }

    pub fn is_ca(&self) -> bool {
        self.atom_name_trimmed() == "CA"
    }

    pub fn atom_name_trimmed(&self) -> &str {
        std::str::from_utf8(&self.atom_name).map(str::trim).unwrap_or("")
    }

    /// Blank or the first alternate location
    pub fn is_primary_location(&self) -> bool {
        self.alt_loc == b' ' || self.alt_loc == b'A'
    }

    /// (chain, residue number, insertion code)
    pub fn residue_key(&self) -> (u8, i64, u8) {
        (self.chain, self.res_serial, self.insertion_code)
    }

    pub fn one_letter_code(&self) -> u8 {
        three_to_one(&self.res_name)
    }
}

/// Standard amino acids plus the common modified residues. Unknown residues map to `X`.
pub fn three_to_one(res_name: &[u8; 3]) -> u8 {
    match res_name {
        b"ALA" => b'A',
        b"ARG" => b'R',
        b"ASN" => b'N',
        b"ASP" => b'D',
        b"CYS" => b'C',
        b"GLN" => b'Q',
        b"GLU" => b'E',
        b"GLY" => b'G',
        b"HIS" => b'H',
        b"ILE" => b'I',
        b"LEU" => b'L',
        b"LYS" => b'K',
        b"MET" => b'M',
        b"PHE" => b'F',
        b"PRO" => b'P',
        b"SER" => b'S',
        b"THR" => b'T',
        b"TRP" => b'W',
        b"TYR" => b'Y',
        b"VAL" => b'V',
        b"MSE" => b'M',
        b"SEC" => b'U',
        b"PYL" => b'O',
        _ => b'X',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_to_one() {
        assert_eq!(three_to_one(b"ALA"), b'A');
        assert_eq!(three_to_one(b"TRP"), b'W');
        assert_eq!(three_to_one(b"MSE"), b'M');
        assert_eq!(three_to_one(b"HOH"), b'X');
    }
}
