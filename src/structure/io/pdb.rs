use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use flate2::read::GzDecoder;

use super::super::core::*;
use super::parser::*;
use super::*;
use crate::align::se3::RigidTransform;
use crate::structure::coordinate::Point;

/// A PDB reader
#[derive(Debug)]
pub struct Reader<R: io::Read> {
    /// The underlying reader
    pub reader: R,
    pub input_type: StructureFileFormat,
}

impl<R: io::Read> Reader<R> {
    pub fn new(reader: R) -> Self {
        Reader {
            reader,
            input_type: StructureFileFormat::PDB,
        }
    }

    pub fn read_structure(self) -> Result<Structure, StructureError> {
        match self.input_type {
            StructureFileFormat::GzPDB => parse_lines(BufReader::new(GzDecoder::new(self.reader))),
            _ => parse_lines(BufReader::new(self.reader)),
        }
    }

    pub fn read_structure_from_gz(self) -> Result<Structure, StructureError> {
        parse_lines(BufReader::new(GzDecoder::new(self.reader)))
    }
}

impl Reader<File> {
    /// Read from a file path. Gzipped input is detected from the extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, StructureError> {
        let file = File::open(&path).map_err(|source| StructureError::Open {
            path: path.as_ref().display().to_string(),
            source,
        })?;
        let mut reader = Reader::new(file);
        if StructureFileFormat::from_path(&path) == StructureFileFormat::GzPDB {
            reader.input_type = StructureFileFormat::GzPDB;
        }
        Ok(reader)
    }
}

fn parse_lines<B: BufRead>(reader: B) -> Result<Structure, StructureError> {
    let mut structure = Structure::new();
    let mut record = (b' ', i64::MIN, b' ');

    // Reading each line of PDB, parse and build the atom list.
    for (idx, line) in reader.lines().enumerate() {
        let atomline = line.map_err(|source| StructureError::Read { line: idx + 1, source })?;
        if !atomline.starts_with("ATOM  ") {
            // Only the first model is read
            if atomline.starts_with("ENDMDL") {
                break;
            }
            continue;
        }
        // Conversion error. Just skip the line.
        if let Ok(atom) = parse_line(&atomline) {
            structure.update(atom, &mut record);
        }
    }
    Ok(structure)
}

/// Read the structure at `path`, plain or gzipped.
pub fn read_structure<P: AsRef<Path>>(path: P) -> Result<Structure, StructureError> {
    Reader::from_file(path)?.read_structure()
}

/// Write the selected atoms with new coordinates in columns 31-54.
/// Every other column of the original record is kept.
pub fn write_atoms<W: Write>(
    writer: &mut W, structure: &Structure, indices: &[usize], coords: &[Point],
) -> Result<(), StructureError> {
    if indices.len() != coords.len() {
        return Err(StructureError::CoordinateCount(coords.len(), indices.len()));
    }
    for (&idx, p) in indices.iter().zip(coords.iter()) {
        let line = &structure.atoms[idx].line;
        let tail = line.get(54..).unwrap_or("");
        writeln!(
            writer,
            "{}{:8.3}{:8.3}{:8.3}{}",
            &line[..30], p[0], p[1], p[2], tail.trim_end()
        )?;
    }
    writeln!(writer, "END")?;
    Ok(())
}

/// Apply `transform` to every atom of `chain` (all chains when None) and write the result as PDB.
pub fn write_transformed<P: AsRef<Path>>(
    path: P, structure: &Structure, chain: Option<u8>, transform: &RigidTransform,
) -> Result<(), StructureError> {
    let indices = structure.atom_indices(chain);
    let coords = transform.apply_all(&structure.coordinates(&indices));
    let file = File::create(&path).map_err(|source| StructureError::Open {
        path: path.as_ref().display().to_string(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    write_atoms(&mut writer, structure, &indices, &coords)?;
    writer.flush()?;
    Ok(())
}
