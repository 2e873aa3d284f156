//! Protein structure data and file handling.
//!
//! `io` reads and writes PDB files, `core` holds the parsed atoms and extracts the
//! C-alpha trace as a `PointSet`. `qcp` and `metrics` evaluate a superposition.

pub mod atom;
pub mod coordinate;
pub mod core;
pub mod io;
pub mod metrics;
pub mod point_set;
pub mod qcp;
