// File: report.rs
// Author: Hyunbin Kim (khb7840@gmail.com)
// Copyright © 2025 Hyunbin Kim, All rights reserved

// Text outputs of a finished alignment: the transformation matrix file and the
// human readable report.

use std::path::Path;

use crate::align::driver::AlignmentResult;

/// Names shown in the outputs for one aligned pair.
#[derive(Debug, Clone)]
pub struct PairLabel {
    pub mobile_name: String,
    pub reference_name: String,
    pub mobile_chain: Option<char>,
    pub reference_chain: Option<char>,
    pub mobile_length: usize,
    pub reference_length: usize,
}

fn chain_label(chain: Option<char>) -> String {
    match chain {
        Some(c) => c.to_string(),
        None => "All".to_string(),
    }
}

/// TM-align style matrix. Applies to the original mobile coordinates.
pub fn format_matrix(result: &AlignmentResult, label: &PairLabel) -> String {
    let u = &result.global_transform.rotation;
    let t = &result.global_transform.translation;
    let mut out = format!(
        "# Transformation matrix for {} -> {}\n",
        label.mobile_name, label.reference_name
    );
    out.push_str("# x' = u * x + t applied to the original mobile coordinates\n");
    out.push_str(&format!("t[0] = {:.8}, t[1] = {:.8}, t[2] = {:.8}\n", t[0], t[1], t[2]));
    for (i, row) in u.iter().enumerate() {
        out.push_str(&format!(
            "u[{i}][0] = {:.8}, u[{i}][1] = {:.8}, u[{i}][2] = {:.8}\n",
            row[0], row[1], row[2], i = i
        ));
    }
    out
}

pub fn format_report(result: &AlignmentResult, label: &PairLabel) -> String {
    let hard = &result.hard;
    let identity = match hard.sequence_identity {
        Some(identity) => format!("{:.3}", identity),
        None => "NA".to_string(),
    };
    let mut out = format!(
        "Name of Chain_1: {} (chain {})\n\
         Name of Chain_2: {} (chain {})\n\
         Length of Chain_1: {} residues\n\
         Length of Chain_2: {} residues\n\n",
        label.mobile_name, chain_label(label.mobile_chain),
        label.reference_name, chain_label(label.reference_chain),
        label.mobile_length, label.reference_length,
    );
    out.push_str(&format!(
        "Sinkhorn score = {:.5} (best of {} steps, step {})\n",
        result.soft_score, result.steps_run, result.best_step
    ));
    out.push_str(&format!("Aligned length = {}\n", hard.aligned_length));
    out.push_str(&format!("RMSD of the aligned pairs = {:.2} A\n", hard.rmsd));
    out.push_str(&format!(
        "TM-score (normalized by reference, L={}, d0={:.2}) = {:.5}\n",
        label.reference_length, hard.d0_reference, hard.tm_score_reference
    ));
    out.push_str(&format!(
        "TM-score (normalized by mobile, L={}, d0={:.2}) = {:.5}\n",
        label.mobile_length, hard.d0_mobile, hard.tm_score_mobile
    ));
    out.push_str(&format!("Sequence identity in aligned region = {}\n\n", identity));
    out.push_str("Aligned pairs (mobile, reference):\n");
    for chunk in result.pairs.chunks(6) {
        let line: Vec<String> = chunk
            .iter()
            .map(|p| format!("({}, {})", p.mobile, p.reference))
            .collect();
        out.push_str(&line.join(" "));
        out.push('\n');
    }
    out
}

pub fn write_matrix<P: AsRef<Path>>(
    path: P, result: &AlignmentResult, label: &PairLabel,
) -> std::io::Result<()> {
    std::fs::write(path, format_matrix(result, label))
}

pub fn write_report<P: AsRef<Path>>(
    path: P, result: &AlignmentResult, label: &PairLabel,
) -> std::io::Result<()> {
    std::fs::write(path, format_report(result, label))
}
