mod common;

use std::io::Write;

use common::*;
use flate2::write::GzEncoder;
use flate2::Compression;
use sinkalign::prelude::*;
use sinkalign::structure::io::pdb::{read_structure, write_transformed};

#[test]
fn test_gzipped_and_plain_read_the_same() {
    let dir = temp_dir("gz");
    let text = pdb_text(&scattered_cloud(12), 'A');
    std::fs::write(dir.join("plain.pdb"), &text).unwrap();
    let mut encoder = GzEncoder::new(std::fs::File::create(dir.join("packed.pdb.gz")).unwrap(), Compression::default());
    encoder.write_all(text.as_bytes()).unwrap();
    encoder.finish().unwrap();

    let plain = read_structure(dir.join("plain.pdb")).unwrap().to_point_set(None).unwrap();
    let packed = read_structure(dir.join("packed.pdb.gz")).unwrap().to_point_set(None).unwrap();
    assert_eq!(plain, packed);
    assert_eq!(plain.len(), 12);
    assert_eq!(plain.sequence_string(), "AGSLKEFWAGSL");
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_first_model_alt_locations_and_chains() {
    let text = "\
MODEL        1
ATOM      1  CA  ALA A   1       1.000   2.000   3.000  1.00 10.00           C
ATOM      2  CA AGLY A   2       2.000   2.000   3.000  0.50 10.00           C
ATOM      3  CA BGLY A   2       2.100   2.000   3.000  0.50 10.00           C
HETATM    4 ZN    ZN A 101       9.000   9.000   9.000  1.00 10.00          ZN
ATOM      5  CA  SER B   1       3.000   2.000   3.000  1.00 10.00           C
ENDMDL
MODEL        2
ATOM      1  CA  ALA A   1      11.000  12.000  13.000  1.00 10.00           C
ENDMDL
";
    let structure = PDBReader::new(text.as_bytes()).read_structure().unwrap();
    assert_eq!(structure.num_atoms, 4);
    assert_eq!(structure.num_chains, 2);
    let all = structure.to_point_set(None).unwrap();
    assert_eq!(all.sequence_string(), "AGS");
    assert_eq!(all.coords[1], [2.0, 2.0, 3.0]);
    let chain_a = structure.to_point_set(Some(b'A')).unwrap();
    assert_eq!(chain_a.len(), 2);
}

#[test]
fn test_write_transformed_keeps_other_columns() {
    let dir = temp_dir("write");
    let path = dir.join("in.pdb");
    std::fs::write(&path, pdb_text(&scattered_cloud(3), 'A')).unwrap();
    let structure = read_structure(&path).unwrap();

    let out = dir.join("out.pdb");
    let shift = RigidTransform { rotation: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]], translation: [1.0, 0.0, -1.0] };
    write_transformed(&out, &structure, None, &shift).unwrap();
    let written = std::fs::read_to_string(&out).unwrap();
    let original: Vec<&str> = structure.atoms.iter().map(|a| a.line.as_str()).collect();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines.len(), original.len() + 1);
    assert_eq!(*lines.last().unwrap(), "END");
    for (new, old) in lines.iter().zip(original.iter()) {
        assert_eq!(&new[..30], &old[..30]);
        assert_eq!(&new[54..], &old[54..]);
        let x_old: f64 = old[30..38].trim().parse().unwrap();
        let x_new: f64 = new[30..38].trim().parse().unwrap();
        assert!((x_new - x_old - 1.0).abs() < 1.5e-3);
    }
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_missing_file_is_an_error() {
    let err = read_structure("/nonexistent/sinkalign/missing.pdb").unwrap_err();
    assert!(matches!(err, StructureError::Open { .. }));
}
