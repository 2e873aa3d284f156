// Shared fixtures for the integration tests
#![allow(dead_code)]

use std::path::PathBuf;

use sinkalign::align::se3::exp_so3;
use sinkalign::structure::coordinate::{add, mat_vec, Point};

pub const RESIDUES: [&str; 8] = ["ALA", "GLY", "SER", "LEU", "LYS", "GLU", "PHE", "TRP"];

/// Irregular but deterministic C-alpha-like cloud; no two points closer than 1.5 A
pub fn scattered_cloud(n: usize) -> Vec<Point> {
    (0..n)
        .map(|i| {
            let i = i as f64;
            [
                8.0 * (1.3 * i + 0.2).sin(),
                8.0 * (2.1 * i + 1.1).sin(),
                8.0 * (0.9 * i + 0.4).cos() * (0.37 * i + 0.3).sin(),
            ]
        })
        .collect()
}

pub fn rotate_and_shift(points: &[Point], w: Point, t: Point) -> Vec<Point> {
    let rotation = exp_so3(w);
    points.iter().map(|&p| add(mat_vec(&rotation, p), t)).collect()
}

/// PDB text with an N and a CA atom per residue, residues numbered from 1
pub fn pdb_text(coords: &[Point], chain: char) -> String {
    let mut text = String::from("HEADER    SYNTHETIC\n");
    let mut serial = 1;
    for (i, p) in coords.iter().enumerate() {
        let res_name = RESIDUES[i % RESIDUES.len()];
        let n = [p[0] - 0.8, p[1] + 0.9, p[2] - 0.7];
        for (name, q, element) in [(" N  ", n, "N"), (" CA ", *p, "C")] {
            text.push_str(&format!(
                "ATOM  {:>5} {} {} {}{:>4}    {:8.3}{:8.3}{:8.3}  1.00 20.00           {}\n",
                serial, name, res_name, chain, i + 1, q[0], q[1], q[2], element
            ));
            serial += 1;
        }
    }
    text.push_str("END\n");
    text
}

pub fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("sinkalign_it_{}_{}", name, std::process::id()));
    if dir.exists() {
        std::fs::remove_dir_all(&dir).unwrap();
    }
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
