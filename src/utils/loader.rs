// File: loader.rs
// Created: 2024-02-29 21:54:20
// Author: Hyunbin Kim (khb7840@gmail.com)
// Copyright © 2024 Hyunbin Kim, All rights reserved

use std::io::BufRead;
use std::path::{Path, PathBuf};

const ALLOWED_EXTENSIONS: [&str; 4] = ["pdb", "pdb.gz", "ent", "ent.gz"];

/// One line of a pair list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairEntry {
    pub mobile_id: String,
    pub reference_id: String,
}

/// Read a pair list: `mobile_id reference_id` per line.
/// Blank lines and lines starting with `#` are skipped; extra columns are ignored.
pub fn read_pair_list<P: AsRef<Path>>(path: P) -> std::io::Result<Vec<PairEntry>> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    let mut pairs = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split_whitespace();
        match (fields.next(), fields.next()) {
            (Some(mobile), Some(reference)) => pairs.push(PairEntry {
                mobile_id: mobile.to_string(),
                reference_id: reference.to_string(),
            }),
            _ => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("line {}: expected two structure ids, got '{}'", line_no + 1, line),
                ))
            }
        }
    }
    Ok(pairs)
}

/// Find the structure file of `id` under `dir`.
/// Tries `<id>.pdb`, `<id>.pdb.gz`, `<id>.ent`, `<id>.ent.gz` and then `<id>` itself.
pub fn resolve_structure_path(dir: &str, id: &str) -> Option<PathBuf> {
    let base = Path::new(dir);
    ALLOWED_EXTENSIONS
        .iter()
        .map(|ext| base.join(format!("{}.{}", id, ext)))
        .chain(std::iter::once(base.join(id)))
        .find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("sinkalign_loader_{}_{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_read_pair_list() {
        let dir = temp_dir("pairs");
        let path = dir.join("pairs.txt");
        std::fs::write(&path, "# mobile reference\n1abc 2xyz\n\n  3def\t4ghi extra\n").unwrap();
        let pairs = read_pair_list(&path).unwrap();
        assert_eq!(
            pairs,
            vec![
                PairEntry { mobile_id: "1abc".to_string(), reference_id: "2xyz".to_string() },
                PairEntry { mobile_id: "3def".to_string(), reference_id: "4ghi".to_string() },
            ]
        );

        std::fs::write(&path, "1abc\n").unwrap();
        let err = read_pair_list(&path).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_resolve_structure_path() {
        let dir = temp_dir("resolve");
        std::fs::write(dir.join("1abc.pdb.gz"), b"").unwrap();
        std::fs::write(dir.join("2xyz.pdb"), b"").unwrap();
        let dir_str = dir.to_str().unwrap();
        assert_eq!(resolve_structure_path(dir_str, "1abc"), Some(dir.join("1abc.pdb.gz")));
        assert_eq!(resolve_structure_path(dir_str, "2xyz"), Some(dir.join("2xyz.pdb")));
        assert_eq!(resolve_structure_path(dir_str, "2xyz.pdb"), Some(dir.join("2xyz.pdb")));
        assert_eq!(resolve_structure_path(dir_str, "9zzz"), None);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
