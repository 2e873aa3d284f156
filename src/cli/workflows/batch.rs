// File: batch.rs
// Created: 2025-03-12 14:03:51
// Author: Hyunbin Kim (khb7840@gmail.com)
// Copyright © 2025 Hyunbin Kim, All rights reserved

//! Workflow for aligning many structure pairs.
//! Every (pair, cutoff) combination is an independent run on the rayon pool.
//! Outputs of one cutoff go to `<output>/cutoff_<c>/` and a summary TSV with one
//! row per run, failed runs included, is written to the output directory.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use peak_alloc::PeakAlloc;
use rayon::prelude::*;

use crate::align::report::{format_report, write_matrix, PairLabel};
use crate::cli::config::{load_config, write_config_to_file};
use crate::cli::*;
use crate::prelude::*;
use crate::structure::io::pdb::{read_structure, write_transformed};
use crate::utils::log::print_warnings;
use crate::utils::formatter::{Column, TsvFormatter, Value};
use crate::utils::loader::{read_pair_list, resolve_structure_path, PairEntry};

pub const SUMMARY_FILE: &str = "summary.tsv";

pub const HELP_BATCH: &str = "\
usage: sinkalign batch -p <i:PAIRS> -d <i:DIR> -o <o:DIR> [OPTIONS]

input/output:
 -p, --pairs <PATH>               Pair list, one 'mobile_id reference_id' per line [REQUIRED]
 -d, --structures <DIR>           Directory with <id>.pdb or <id>.pdb.gz files [REQUIRED]
 -o, --output <DIR>               Output directory [REQUIRED]
 --cutoffs <FLOAT,...>            Distance cutoffs to run, one output directory each [7.0]

execution:
 -t, --threads <INT>              Number of threads [1]
 --fail-fast                      Cancel remaining runs after the first failure

optimization:
 -s, --steps <INT>                Number of optimization steps [5000]
 -l, --lr <FLOAT>                 Learning rate [0.001]
 --weight-decay <FLOAT>           Decoupled weight decay [0.01]
 --epsilon <FLOAT>                Entropic regularization of the transport [0.05]
 --gamma <FLOAT>                  Sharpness of the transport, sets epsilon = 1/gamma
 --sinkhorn-iters <INT>           Sinkhorn iterations per step [10]
 --d0 <FLOAT>                     Kernel scale in Angstroms [from reference length]
 --cutoff <FLOAT>                 Single cutoff used when --cutoffs is not given [7.0]
 --no-cutoff                      Run without a distance cutoff when --cutoffs is not given
 --steepness <FLOAT>              Steepness of the distance cutoff [2.0]
 --seed <INT>                     Seed of the initial perturbation [0]
 --init-noise <FLOAT>             Half-width of the uniform initial perturbation [0.0]
 --patience <INT>                 Stop after this many steps without improvement [off]
 --tolerance <FLOAT>              Minimum improvement counted by --patience [1e-6]
 --max-residues <INT>             Maximum number of residues per structure [5000]

general options:
 -c, --config <PATH>              Load configuration from a TOML file; explicit options override it
 --save-config                    Write the effective configuration to <output>/config.toml
 -v, --verbose                    Print verbose messages
 -h, --help                       Print this help menu

examples:
sinkalign batch -p pairs.txt -d structures/ -o results/ --cutoffs 5.0,7.0 -t 8
";

/// Outcome of one (pair, cutoff) run
#[derive(Debug, Clone)]
pub struct BatchRecord {
    pub mobile_id: String,
    pub reference_id: String,
    pub cutoff: Option<f64>,
    pub outcome: Result<RunSummary, String>,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub mobile_length: usize,
    pub reference_length: usize,
    pub soft_score: f64,
    pub tm_score_reference: f64,
    pub tm_score_mobile: f64,
    pub rmsd: f64,
    pub aligned_length: usize,
    pub sequence_identity: Option<f64>,
    pub steps_run: usize,
    pub warnings: Vec<NumericalWarning>,
}

impl BatchRecord {
    pub fn status(&self) -> &str {
        match &self.outcome {
            Ok(_) => "OK",
            Err(_) => "FAIL",
        }
    }

    fn summary(&self) -> Option<&RunSummary> {
        self.outcome.as_ref().ok()
    }
}

fn summary_value<F: Fn(&RunSummary) -> Value>(record: &BatchRecord, f: F) -> Value {
    record.summary().map(f).unwrap_or(Value::Missing)
}

pub fn summary_formatter() -> TsvFormatter<BatchRecord> {
    TsvFormatter::new(vec![
        Column::new("mobile", "Mobile structure id", |r: &BatchRecord| Value::from(r.mobile_id.clone())),
        Column::new("reference", "Reference structure id", |r: &BatchRecord| Value::from(r.reference_id.clone())),
        Column::new("cutoff", "Distance cutoff", |r: &BatchRecord| r.cutoff.map_or(Value::Missing, |c| Value::Float(c, 1))),
        Column::new("status", "OK or FAIL", |r: &BatchRecord| Value::from(r.status())),
        Column::new("mobile_len", "Mobile residues", |r: &BatchRecord| summary_value(r, |s| Value::from(s.mobile_length))),
        Column::new("reference_len", "Reference residues", |r: &BatchRecord| summary_value(r, |s| Value::from(s.reference_length))),
        Column::new("aligned_len", "Aligned pairs", |r: &BatchRecord| summary_value(r, |s| Value::from(s.aligned_length))),
        Column::new("soft_score", "Best Sinkhorn score", |r: &BatchRecord| summary_value(r, |s| Value::from(s.soft_score))),
        Column::new("tm_score", "TM-score by reference length", |r: &BatchRecord| summary_value(r, |s| Value::from(s.tm_score_reference))),
        Column::new("tm_score_mobile", "TM-score by mobile length", |r: &BatchRecord| summary_value(r, |s| Value::from(s.tm_score_mobile))),
        Column::new("rmsd", "RMSD of aligned pairs", |r: &BatchRecord| summary_value(r, |s| Value::from(s.rmsd))),
        Column::new("seq_id", "Sequence identity", |r: &BatchRecord| summary_value(r, |s| Value::from(s.sequence_identity))),
        Column::new("steps", "Steps run", |r: &BatchRecord| summary_value(r, |s| Value::from(s.steps_run))),
        Column::new("warnings", "Numerical warnings", |r: &BatchRecord| summary_value(r, |s| Value::from(s.warnings.len()))),
        Column::new("error", "Failure reason", |r: &BatchRecord| match &r.outcome {
            Ok(_) => Value::Missing,
            Err(e) => Value::from(e.as_str()),
        }),
    ])
}

/// The configured cutoff alone when no list is given. Every element must be a positive number.
pub fn parse_cutoffs(cutoffs: Option<&str>, default: Option<f64>) -> Result<Vec<Option<f64>>, String> {
    match cutoffs {
        None => Ok(vec![default]),
        Some(text) => text
            .split(',')
            .map(|c| {
                c.trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|v| *v > 0.0 && v.is_finite())
                    .map(Some)
                    .ok_or_else(|| format!("Invalid cutoff '{}'", c))
            })
            .collect(),
    }
}

pub fn cutoff_dir_name(cutoff: Option<f64>) -> String {
    match cutoff {
        Some(c) => format!("cutoff_{:.1}", c),
        None => "no_cutoff".to_string(),
    }
}

/// Align one pair and write its outputs into `out_dir`.
pub fn run_pair(
    pair: &PairEntry, structure_dir: &str, out_dir: &Path, config: &AlignConfig, cancel: &AtomicBool,
) -> Result<RunSummary, String> {
    let load = |id: &str| {
        let path = resolve_structure_path(structure_dir, id)
            .ok_or_else(|| format!("No structure file for {} in {}", id, structure_dir))?;
        let structure = read_structure(&path).map_err(|e| e.to_string())?;
        let points = structure.to_point_set(None).map_err(|e| format!("{}: {}", id, e))?;
        Ok::<_, String>((structure, points))
    };
    let (mobile_structure, mobile) = load(pair.mobile_id.as_str())?;
    let (_, reference) = load(pair.reference_id.as_str())?;

    let result = align_with_cancel(&mobile, &reference, config, cancel).map_err(|e| e.to_string())?;

    let stem = format!("{}_vs_{}", pair.mobile_id, pair.reference_id);
    let label = PairLabel {
        mobile_name: pair.mobile_id.clone(),
        reference_name: pair.reference_id.clone(),
        mobile_chain: None,
        reference_chain: None,
        mobile_length: mobile.len(),
        reference_length: reference.len(),
    };
    let pdb_path = out_dir.join(format!("{}_aligned_to_{}.pdb", pair.mobile_id, pair.reference_id));
    write_transformed(&pdb_path, &mobile_structure, None, &result.global_transform)
        .map_err(|e| e.to_string())?;
    write_matrix(out_dir.join(format!("{}.matrix.txt", stem)), &result, &label)
        .map_err(|e| e.to_string())?;
    let mut log = format_report(&result, &label);
    for warning in &result.warnings {
        log.push_str(&format!("WARNING: {}\n", warning));
    }
    std::fs::write(out_dir.join(format!("{}.log", stem)), log).map_err(|e| e.to_string())?;

    Ok(RunSummary {
        mobile_length: mobile.len(),
        reference_length: reference.len(),
        soft_score: result.soft_score,
        tm_score_reference: result.hard.tm_score_reference,
        tm_score_mobile: result.hard.tm_score_mobile,
        rmsd: result.hard.rmsd,
        aligned_length: result.hard.aligned_length,
        sequence_identity: result.hard.sequence_identity,
        steps_run: result.steps_run,
        warnings: result.warnings,
    })
}

/// Run every (cutoff, pair) combination on the current rayon pool.
/// Records come back ordered by cutoff, then by position in `pairs`.
pub fn run_batch(
    pairs: &[PairEntry], structure_dir: &str, output_dir: &Path,
    cutoffs: &[Option<f64>], base: &AlignConfig, fail_fast: bool, verbose: bool,
) -> std::io::Result<Vec<BatchRecord>> {
    let mut tasks: Vec<(Option<f64>, &PairEntry, PathBuf)> = Vec::with_capacity(cutoffs.len() * pairs.len());
    for &cutoff in cutoffs {
        let dir = output_dir.join(cutoff_dir_name(cutoff));
        std::fs::create_dir_all(&dir)?;
        for pair in pairs {
            tasks.push((cutoff, pair, dir.clone()));
        }
    }
    let cancel = AtomicBool::new(false);
    let records: Vec<BatchRecord> = tasks
        .par_iter()
        .map(|(cutoff, pair, dir)| {
            let config = AlignConfig { cutoff: *cutoff, ..base.clone() };
            let outcome = run_pair(pair, structure_dir, dir, &config, &cancel);
            match &outcome {
                Ok(summary) => {
                    if verbose {
                        let run_label = format!("{} -> {} ({})", pair.mobile_id, pair.reference_id, cutoff_dir_name(*cutoff));
                        print_warnings(&run_label, &summary.warnings);
                        print_log_msg(INFO, &format!("{}: TM-score {:.4}", run_label, summary.tm_score_reference));
                    }
                }
                Err(reason) => {
                    print_log_msg(FAIL, &format!("{} -> {}: {}", pair.mobile_id, pair.reference_id, reason));
                    if fail_fast {
                        cancel.store(true, Ordering::Relaxed);
                    }
                }
            }
            BatchRecord {
                mobile_id: pair.mobile_id.clone(),
                reference_id: pair.reference_id.clone(),
                cutoff: *cutoff,
                outcome,
            }
        })
        .collect();
    Ok(records)
}

pub fn write_summary(path: &Path, records: &[BatchRecord]) -> std::io::Result<()> {
    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    summary_formatter().write_all(&mut writer, records)?;
    std::io::Write::flush(&mut writer)
}

/// Runs the batch subcommand. Memory usage is read from `alloc`, which the
/// binary registers as its global allocator.
pub fn batch(env: AppArgs, alloc: &PeakAlloc) {
    match env {
        AppArgs::Batch {
            pair_list,
            structure_dir,
            output_dir,
            cutoffs,
            threads,
            fail_fast,
            config,
            save_config,
            overrides,
            verbose,
            help: _,
        } => {
            if verbose { print_logo(); }
            let (pair_list, structure_dir, output_dir) = match (pair_list, structure_dir, output_dir) {
                (Some(p), Some(d), Some(o)) => (p, d, o),
                _ => {
                    print_log_msg(FAIL, "--pairs, --structures and --output are required");
                    eprintln!("{}", HELP_BATCH);
                    std::process::exit(1);
                }
            };
            let base_config = load_config(config.as_deref(), &overrides).unwrap_or_else(|e| {
                print_log_msg(FAIL, &e.to_string());
                std::process::exit(1);
            });
            let cutoffs = parse_cutoffs(cutoffs.as_deref(), base_config.cutoff).unwrap_or_else(|e| {
                print_log_msg(FAIL, &e);
                std::process::exit(1);
            });
            let pairs = read_pair_list(&pair_list).unwrap_or_else(|e| {
                print_log_msg(FAIL, &format!("Unable to read pair list {}: {}", pair_list, e));
                std::process::exit(1);
            });
            let output_path = PathBuf::from(&output_dir);
            if let Err(e) = std::fs::create_dir_all(&output_path) {
                print_log_msg(FAIL, &format!("Unable to create {}: {}", output_dir, e));
                std::process::exit(1);
            }
            if save_config {
                let path = output_path.join("config.toml");
                if let Err(e) = write_config_to_file(&path.to_string_lossy(), &base_config) {
                    print_log_msg(FAIL, &e.to_string());
                    std::process::exit(1);
                }
            }
            if verbose {
                print_log_msg(INFO, &format!(
                    "Aligning {} pairs with {} cutoff(s) on {} threads (Allocated {}MB)",
                    pairs.len(), cutoffs.len(), threads, alloc.current_usage_as_mb()
                ));
            }

            let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build().unwrap_or_else(|e| {
                print_log_msg(FAIL, &format!("Unable to build thread pool: {}", e));
                std::process::exit(1);
            });
            let records = pool
                .install(|| run_batch(&pairs, &structure_dir, &output_path, &cutoffs, &base_config, fail_fast, verbose))
                .unwrap_or_else(|e| {
                    print_log_msg(FAIL, &format!("Unable to create output directories: {}", e));
                    std::process::exit(1);
                });

            let summary_path = output_path.join(SUMMARY_FILE);
            if let Err(e) = write_summary(&summary_path, &records) {
                print_log_msg(FAIL, &format!("Unable to write {}: {}", summary_path.display(), e));
                std::process::exit(1);
            }
            let failed = records.iter().filter(|r| r.outcome.is_err()).count();
            if failed > 0 {
                print_log_msg(WARN, &format!("{} of {} runs failed", failed, records.len()));
            }
            print_log_msg(DONE, &format!(
                "{} runs written to {} (Peak memory {}MB)",
                records.len(), summary_path.display(), alloc.peak_usage_as_mb()
            ));
        }
        _ => {
            eprintln!("{}", HELP_BATCH);
            std::process::exit(1);
        }
    }
}
