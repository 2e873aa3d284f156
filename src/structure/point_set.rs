// File: point_set.rs
// Author: Hyunbin Kim (khb7840@gmail.com)
// Copyright © 2025 Hyunbin Kim, All rights reserved

use crate::structure::coordinate::{centroid, sub, Point};

/// Ordered C-alpha coordinates of one structure, one point per residue.
/// `sequence` holds one-letter residue codes aligned with `coords`, or is empty
/// when residue identities are unknown.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointSet {
    pub coords: Vec<Point>,
    pub sequence: Vec<u8>,
}

impl PointSet {
    pub fn new(coords: Vec<Point>) -> Self {
        PointSet { coords, sequence: Vec::new() }
    }

    pub fn with_sequence(coords: Vec<Point>, sequence: Vec<u8>) -> Self {
        PointSet { coords, sequence }
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn centroid(&self) -> Point {
        centroid(&self.coords)
    }

    /// Coordinates shifted so that their centroid is the origin.
    pub fn centered(&self) -> Vec<Point> {
        let center = self.centroid();
        self.coords.iter().map(|&p| sub(p, center)).collect()
    }

    /// One-letter code of residue `idx`, if known.
    pub fn residue(&self, idx: usize) -> Option<u8> {
        if self.sequence.len() == self.coords.len() {
            self.sequence.get(idx).copied()
        } else {
            None
        }
    }

    pub fn sequence_string(&self) -> String {
        String::from_utf8_lossy(&self.sequence).into_owned()
    }
}
