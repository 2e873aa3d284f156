// File: align_pair.rs
// Created: 2025-03-11 10:12:40
// Author: Hyunbin Kim (khb7840@gmail.com)
// Copyright © 2025 Hyunbin Kim, All rights reserved
// Description
// Workflow for aligning one mobile structure onto one reference structure.
// Outputs: superposed mobile PDB, transformation matrix and text report.

use crate::align::driver::Aligner;
use crate::align::report::{format_report, write_matrix, write_report, PairLabel};
use crate::cli::config::{load_config, write_config_to_file};
use crate::cli::*;
use crate::prelude::*;
use crate::structure::io::pdb::{read_structure, write_transformed};
use crate::utils::log::{print_warnings, step_msg};

pub const DEFAULT_PRINT_FREQ: usize = 100;

/// Progress is printed every `print_freq` steps and at the last step.
pub fn is_progress_step(step: usize, print_freq: usize, steps: usize) -> bool {
    step % print_freq.max(1) == 0 || step + 1 == steps
}

pub const HELP_ALIGN: &str = "\
usage: sinkalign align -m <i:PDB> -r <i:PDB> [OPTIONS]

input/output:
 -m, --mobile <PATH>              Mobile structure (PDB, optionally gzipped) [REQUIRED]
 -r, --reference <PATH>           Reference structure (PDB, optionally gzipped) [REQUIRED]
 --mobile-chain <CHAR>            Use only this chain of the mobile structure [all]
 --reference-chain <CHAR>         Use only this chain of the reference structure [all]
 -o, --output <PATH>              Write the superposed mobile structure as PDB
 --matrix-out <PATH>              Write the transformation matrix
 --report <PATH>                  Write the alignment report to a file [stdout]

optimization:
 -s, --steps <INT>                Number of optimization steps [5000]
 -l, --lr <FLOAT>                 Learning rate [0.001]
 --weight-decay <FLOAT>           Decoupled weight decay [0.01]
 --epsilon <FLOAT>                Entropic regularization of the transport [0.05]
 --gamma <FLOAT>                  Sharpness of the transport, sets epsilon = 1/gamma
 --sinkhorn-iters <INT>           Sinkhorn iterations per step [10]
 --d0 <FLOAT>                     Kernel scale in Angstroms [from reference length]
 --cutoff <FLOAT>                 Smooth distance cutoff in Angstroms [7.0]
 --no-cutoff                      Disable the distance cutoff
 --steepness <FLOAT>              Steepness of the distance cutoff [2.0]
 --seed <INT>                     Seed of the initial perturbation [0]
 --init-noise <FLOAT>             Half-width of the uniform initial perturbation [0.0]
 --patience <INT>                 Stop after this many steps without improvement [off]
 --tolerance <FLOAT>              Minimum improvement counted by --patience [1e-6]
 --max-residues <INT>             Maximum number of residues per structure [5000]

general options:
 -c, --config <PATH>              Load configuration from a TOML file; explicit options override it
 --save-config <PATH>             Write the effective configuration as TOML
 --print-freq <INT>               Print progress every N steps with --verbose [100]
 -v, --verbose                    Print verbose messages
 -h, --help                       Print this help menu

examples:
# Align with default settings and write all outputs
sinkalign align -m 1abc.pdb -r 2xyz.pdb -o 1abc_on_2xyz.pdb --matrix-out matrix.txt

# Shorter run with early stopping, chain A of both structures
sinkalign align -m 1abc.pdb -r 2xyz.pdb --mobile-chain A --reference-chain A -s 1000 --patience 200 -v
";

fn file_name(path: &str) -> String {
    std::path::Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}

pub fn align_pair(env: AppArgs) {
    match env {
        AppArgs::Align {
            mobile,
            reference,
            mobile_chain,
            reference_chain,
            output,
            matrix_out,
            report,
            config,
            save_config,
            overrides,
            print_freq,
            verbose,
            help: _,
        } => {
            if verbose { print_logo(); }
            // help is already handled in main.rs
            let (mobile_path, reference_path) = match (mobile, reference) {
                (Some(m), Some(r)) => (m, r),
                _ => {
                    print_log_msg(FAIL, "Both --mobile and --reference are required");
                    eprintln!("{}", HELP_ALIGN);
                    std::process::exit(1);
                }
            };
            let align_config = load_config(config.as_deref(), &overrides).unwrap_or_else(|e| {
                print_log_msg(FAIL, &e.to_string());
                std::process::exit(1);
            });
            if let Some(path) = &save_config {
                if let Err(e) = write_config_to_file(path, &align_config) {
                    print_log_msg(FAIL, &e.to_string());
                    std::process::exit(1);
                }
            }

            // Load structures
            let load = |path: &str, chain: Option<char>| {
                read_structure(path).and_then(|structure| {
                    let points = structure.to_point_set(chain.map(|c| c as u8))?;
                    Ok((structure, points))
                })
            };
            let (mobile_structure, mobile_points) = load(mobile_path.as_str(), mobile_chain).unwrap_or_else(|e| {
                print_log_msg(FAIL, &format!("{}: {}", mobile_path, e));
                std::process::exit(1);
            });
            let (_, reference_points) = load(reference_path.as_str(), reference_chain).unwrap_or_else(|e| {
                print_log_msg(FAIL, &format!("{}: {}", reference_path, e));
                std::process::exit(1);
            });
            if verbose {
                print_log_msg(INFO, &format!(
                    "Aligning {} ({} residues) onto {} ({} residues) for {} steps",
                    mobile_path, mobile_points.len(), reference_path, reference_points.len(),
                    align_config.steps
                ));
            }

            let steps = align_config.steps;
            let aligner = Aligner::new(align_config).unwrap_or_else(|e| {
                print_log_msg(FAIL, &e.to_string());
                std::process::exit(1);
            });
            let mut progress = |step: usize, score: f64| {
                if verbose && is_progress_step(step, print_freq, steps) {
                    print_log_msg(INFO, &step_msg(step, score));
                }
            };
            let result = aligner
                .run(&mobile_points, &reference_points, None, &mut progress)
                .unwrap_or_else(|e| {
                    print_log_msg(FAIL, &format!("{} -> {}: {}", mobile_path, reference_path, e));
                    std::process::exit(1);
                });
            print_warnings(&format!("{} -> {}", mobile_path, reference_path), &result.warnings);
            if verbose {
                print_log_msg(INFO, &format!(
                    "Best Sinkhorn score {:.6} at step {} of {}",
                    result.soft_score, result.best_step, result.steps_run
                ));
            }

            let label = PairLabel {
                mobile_name: file_name(&mobile_path),
                reference_name: file_name(&reference_path),
                mobile_chain,
                reference_chain,
                mobile_length: mobile_points.len(),
                reference_length: reference_points.len(),
            };
            match &report {
                Some(path) => {
                    if let Err(e) = write_report(path, &result, &label) {
                        print_log_msg(FAIL, &format!("Unable to write report {}: {}", path, e));
                        std::process::exit(1);
                    }
                }
                None => print!("{}", format_report(&result, &label)),
            }
            if let Some(path) = &matrix_out {
                if let Err(e) = write_matrix(path, &result, &label) {
                    print_log_msg(FAIL, &format!("Unable to write matrix {}: {}", path, e));
                    std::process::exit(1);
                }
            }
            if let Some(path) = &output {
                let chain = mobile_chain.map(|c| c as u8);
                if let Err(e) = write_transformed(path, &mobile_structure, chain, &result.global_transform) {
                    print_log_msg(FAIL, &format!("{}: {}", path, e));
                    std::process::exit(1);
                }
            }
            print_log_msg(DONE, &format!(
                "TM-score = {:.5} (aligned length {}, RMSD {:.2})",
                result.hard_score(), result.hard.aligned_length, result.hard.rmsd
            ));
        }
        _ => {
            eprintln!("{}", HELP_ALIGN);
            std::process::exit(1);
        }
    }
}
