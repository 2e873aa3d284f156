mod common;

use std::sync::atomic::AtomicBool;

use common::*;
use sinkalign::align::se3::exp_so3;
use sinkalign::cli::workflows::batch::{cutoff_dir_name, run_batch, write_summary, SUMMARY_FILE};
use sinkalign::prelude::*;
use sinkalign::structure::coordinate::{dist, mat_mul, rotation_angle};
use sinkalign::structure::io::pdb::{read_structure, write_transformed};
use sinkalign::utils::loader::PairEntry;

const PERTURBATION: [f64; 3] = [0.12, -0.1, 0.15];
const SHIFT: [f64; 3] = [5.0, -3.0, 2.0];

fn write_pair(dir: &std::path::Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let reference = scattered_cloud(24);
    let mobile = rotate_and_shift(&reference, PERTURBATION, SHIFT);
    let reference_path = dir.join("ref.pdb");
    let mobile_path = dir.join("mob.pdb");
    std::fs::write(&reference_path, pdb_text(&reference, 'A')).unwrap();
    std::fs::write(&mobile_path, pdb_text(&mobile, 'A')).unwrap();
    (mobile_path, reference_path)
}

fn recovery_config() -> AlignConfig {
    AlignConfig { steps: 300, learning_rate: 0.01, ..Default::default() }
}

#[test]
fn test_align_pdb_files_recovers_rotation() {
    let dir = temp_dir("recover");
    let (mobile_path, reference_path) = write_pair(&dir);
    let mobile_structure = read_structure(&mobile_path).unwrap();
    let mobile = mobile_structure.to_point_set(Some(b'A')).unwrap();
    let reference = read_structure(&reference_path).unwrap().to_point_set(Some(b'A')).unwrap();
    assert_eq!(mobile.len(), 24);
    assert_eq!(mobile.sequence_string(), reference.sequence_string());

    let result = align(&mobile, &reference, &recovery_config()).unwrap();
    let residual = mat_mul(&result.global_transform.rotation, &exp_so3(PERTURBATION));
    assert!(rotation_angle(&residual) < 1e-3, "residual angle {}", rotation_angle(&residual));
    assert!(result.soft_score > 0.99);
    assert_eq!(result.hard.aligned_length, 24);
    assert!(result.hard_score() > 0.99);
    assert!(result.hard.rmsd < 0.01);
    assert_eq!(result.hard.sequence_identity, Some(1.0));
    for (moved, target) in result.transformed_mobile.iter().zip(reference.coords.iter()) {
        assert!(dist(*moved, *target) < 0.01);
    }

    // The superposed structure lands on the reference
    let out_path = dir.join("mob_aligned.pdb");
    write_transformed(&out_path, &mobile_structure, Some(b'A'), &result.global_transform).unwrap();
    let written = read_structure(&out_path).unwrap();
    assert_eq!(written.num_atoms, 48);
    let superposed = written.to_point_set(None).unwrap();
    for (moved, target) in superposed.coords.iter().zip(reference.coords.iter()) {
        assert!(dist(*moved, *target) < 0.01);
    }
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_missing_chain_and_empty_input() {
    let dir = temp_dir("chains");
    let (mobile_path, _) = write_pair(&dir);
    let structure = read_structure(&mobile_path).unwrap();
    assert!(matches!(
        structure.to_point_set(Some(b'B')),
        Err(StructureError::NoAtoms { chain: Some('B') })
    ));
    let points = structure.to_point_set(None).unwrap();
    let err = align(&PointSet::default(), &points, &recovery_config()).unwrap_err();
    assert_eq!(err, AlignError::EmptyInput { side: Side::Mobile });
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_cancelled_run_has_no_result() {
    let points = PointSet::new(scattered_cloud(10));
    let cancel = AtomicBool::new(true);
    let err = align_with_cancel(&points, &points, &recovery_config(), &cancel).unwrap_err();
    assert_eq!(err, AlignError::Cancelled { step: 0 });
}

#[test]
fn test_batch_outputs_per_cutoff() {
    let dir = temp_dir("batch");
    let structures = dir.join("structures");
    std::fs::create_dir_all(&structures).unwrap();
    write_pair(&structures);
    let output = dir.join("out");
    let pairs = vec![
        PairEntry { mobile_id: "mob".to_string(), reference_id: "ref".to_string() },
        PairEntry { mobile_id: "mob".to_string(), reference_id: "missing".to_string() },
    ];
    let config = AlignConfig { steps: 30, ..Default::default() };
    let cutoffs = vec![Some(5.0), Some(7.0)];
    let records = run_batch(
        &pairs, structures.to_str().unwrap(), &output, &cutoffs, &config, false, false,
    )
    .unwrap();

    assert_eq!(records.len(), 4);
    assert_eq!(records.iter().filter(|r| r.outcome.is_ok()).count(), 2);
    assert_eq!(records[0].cutoff, Some(5.0));
    assert_eq!(records[1].status(), "FAIL");
    assert_eq!(records[3].cutoff, Some(7.0));
    for cutoff_dir in ["cutoff_5.0", "cutoff_7.0"] {
        let base = output.join(cutoff_dir);
        assert!(base.join("mob_aligned_to_ref.pdb").is_file());
        assert!(base.join("mob_vs_ref.matrix.txt").is_file());
        assert!(base.join("mob_vs_ref.log").is_file());
        assert!(!base.join("mob_vs_missing.log").exists());
    }

    // Warnings of each run are carried into its record and its log
    for record in records.iter().filter(|r| r.outcome.is_ok()) {
        let summary = record.outcome.as_ref().unwrap();
        let log = std::fs::read_to_string(
            output.join(cutoff_dir_name(record.cutoff)).join("mob_vs_ref.log"),
        )
        .unwrap();
        assert_eq!(log.lines().filter(|l| l.starts_with("WARNING: ")).count(), summary.warnings.len());
    }

    let summary_path = output.join(SUMMARY_FILE);
    write_summary(&summary_path, &records).unwrap();
    let summary = std::fs::read_to_string(&summary_path).unwrap();
    assert_eq!(summary.lines().count(), 5);
    assert!(summary.lines().nth(2).unwrap().contains("\tFAIL\t"));
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_fail_fast_cancels_remaining_runs() {
    let dir = temp_dir("fail_fast");
    let structures = dir.join("structures");
    std::fs::create_dir_all(&structures).unwrap();
    write_pair(&structures);
    let output = dir.join("out");
    let pairs = vec![
        PairEntry { mobile_id: "mob".to_string(), reference_id: "missing".to_string() },
        PairEntry { mobile_id: "mob".to_string(), reference_id: "ref".to_string() },
        PairEntry { mobile_id: "ref".to_string(), reference_id: "mob".to_string() },
    ];
    let config = AlignConfig { steps: 30, ..Default::default() };
    // One thread runs the pairs in list order
    let pool = rayon::ThreadPoolBuilder::new().num_threads(1).build().unwrap();
    let records = pool
        .install(|| run_batch(&pairs, structures.to_str().unwrap(), &output, &[Some(7.0)], &config, true, false))
        .unwrap();

    assert_eq!(records.len(), 3);
    assert!(records[0].outcome.as_ref().unwrap_err().starts_with("No structure file"));
    let cancelled = AlignError::Cancelled { step: 0 }.to_string();
    for record in &records[1..] {
        assert_eq!(record.status(), "FAIL");
        assert_eq!(record.outcome.as_ref().unwrap_err(), &cancelled);
    }
    assert!(!output.join("cutoff_7.0").join("mob_vs_ref.log").exists());
    std::fs::remove_dir_all(&dir).unwrap();
}
