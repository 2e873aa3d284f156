use crate::structure::atom::Atom;
use crate::structure::coordinate::Point;
use crate::structure::io::StructureError;
use crate::structure::point_set::PointSet;
use std::collections::HashSet;

/// Structure is the main data structure for storing the information of a protein structure.
/// Atoms are kept in file order.
#[derive(Debug, Clone, Default)]
pub struct Structure {
    pub num_chains: usize,
    pub chains: Vec<u8>,
    pub atoms: Vec<Atom>,
    pub num_atoms: usize,
    pub num_residues: usize,
}

impl Structure {
    pub fn new() -> Structure {
        Structure {
            num_chains: 0,
            chains: Vec::new(),
            atoms: Vec::new(),
            num_atoms: 0,
            num_residues: 0,
        }
    }

    pub fn update(&mut self, atom: Atom, record: &mut (u8, i64, u8)) {
        // record stores previous chain ID, residue serial and insertion code
        if record.0 != atom.chain {
            if !self.chains.contains(&atom.chain) {
                self.chains.push(atom.chain);
                self.num_chains += 1;
            }
            record.0 = atom.chain;
        }
        if (record.1, record.2) != (atom.res_serial, atom.insertion_code) {
            self.num_residues += 1;
            record.1 = atom.res_serial;
            record.2 = atom.insertion_code;
        }
        self.num_atoms += 1;
        self.atoms.push(atom);
    }

    fn in_chain(atom: &Atom, chain: Option<u8>) -> bool {
        chain.map_or(true, |c| atom.chain == c)
    }

    /// Indices of the atoms that make up the C-alpha trace:
    /// CA atoms at the primary location, one per (chain, residue number, insertion code).
    pub fn ca_indices(&self, chain: Option<u8>) -> Vec<usize> {
        let mut seen = HashSet::new();
        self.atoms
            .iter()
            .enumerate()
            .filter(|(_, atom)| {
                atom.is_ca() && atom.is_primary_location() && Self::in_chain(atom, chain)
            })
            .filter(|(_, atom)| seen.insert(atom.residue_key()))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Indices of all atoms of the chain at the primary location.
    pub fn atom_indices(&self, chain: Option<u8>) -> Vec<usize> {
        self.atoms
            .iter()
            .enumerate()
            .filter(|(_, atom)| atom.is_primary_location() && Self::in_chain(atom, chain))
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn coordinates(&self, indices: &[usize]) -> Vec<Point> {
        indices.iter().map(|&i| self.atoms[i].get_coordinate()).collect()
    }

    /// C-alpha coordinates and sequence of one chain, or of all chains when `chain` is None.
    pub fn to_point_set(&self, chain: Option<u8>) -> Result<PointSet, StructureError> {
        let indices = self.ca_indices(chain);
        if indices.is_empty() {
            return Err(StructureError::NoAtoms {
                chain: chain.map(char::from),
            });
        }
        let coords = self.coordinates(&indices);
        let sequence = indices.iter().map(|&i| self.atoms[i].one_letter_code()).collect();
        Ok(PointSet::with_sequence(coords, sequence))
    }
}
