//!
pub mod parser;
pub mod pdb;

use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureFileFormat {
    PDB,
    GzPDB,
    Unknown,
}

impl StructureFileFormat {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let name = path.as_ref().to_string_lossy().to_ascii_lowercase();
        if name.ends_with(".pdb.gz") || name.ends_with(".ent.gz") {
            StructureFileFormat::GzPDB
        } else if name.ends_with(".pdb") || name.ends_with(".ent") {
            StructureFileFormat::PDB
        } else {
            StructureFileFormat::Unknown
        }
    }
}

impl fmt::Display for StructureFileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructureFileFormat::PDB => write!(f, "pdb"),
            StructureFileFormat::GzPDB => write!(f, "pdb.gz"),
            StructureFileFormat::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StructureError {
    #[error("Unable to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Error reading line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Error writing structure: {0}")]
    Write(#[from] std::io::Error),

    #[error("No C-alpha atoms found{}", chain_suffix(.chain))]
    NoAtoms { chain: Option<char> },

    #[error("{0} coordinates given for {1} atoms")]
    CoordinateCount(usize, usize),
}

fn chain_suffix(chain: &Option<char>) -> String {
    match chain {
        Some(c) => format!(" for chain {}", c),
        None => String::new(),
    }
}
