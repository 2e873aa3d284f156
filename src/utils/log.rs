// File: log.rs
// Created: 2023-12-05 21:05:10
// Author: Hyunbin Kim (khb7840@gmail.com)
// Copyright © 2023 Hyunbin Kim, All rights reserved

use crate::align::NumericalWarning;

// Colored string for log
pub const INFO: &str = "\x1b[1;32m[INFO]\x1b[0m";
pub const FAIL: &str = "\x1b[1;31m[FAIL]\x1b[0m";
pub const WARN: &str = "\x1b[1;33m[WARN]\x1b[0m";
pub const DONE: &str = "\x1b[1;34m[DONE]\x1b[0m";

pub fn log_msg(prefix: &str, msg: &str) -> String { format!("{} {}", prefix, msg) }
pub fn print_log_msg(prefix: &str, msg: &str) { eprintln!("{}", log_msg(prefix, msg)); }

/// Progress line of the optimizer
pub fn step_msg(step: usize, score: f64) -> String {
    format!("Step {:05}: Sinkhorn score = {:.6}", step, score)
}

pub fn warning_msgs(label: &str, warnings: &[NumericalWarning]) -> Vec<String> {
    warnings.iter().map(|w| log_msg(WARN, &format!("{}: {}", label, w))).collect()
}

pub fn print_warnings(label: &str, warnings: &[NumericalWarning]) {
    for msg in warning_msgs(label, warnings) {
        eprintln!("{}", msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    // Test log with colored prefix
    #[test]
    fn test_colored_log() {
        let msg = "Aligned 2 pairs";
        let info = log_msg(INFO, msg);
        let fail = log_msg(FAIL, msg);
        let warn = log_msg(WARN, msg);
        let done = log_msg(DONE, msg);

        assert_eq!(info, "\x1b[1;32m[INFO]\x1b[0m Aligned 2 pairs");
        assert_eq!(fail, "\x1b[1;31m[FAIL]\x1b[0m Aligned 2 pairs");
        assert_eq!(warn, "\x1b[1;33m[WARN]\x1b[0m Aligned 2 pairs");
        assert_eq!(done, "\x1b[1;34m[DONE]\x1b[0m Aligned 2 pairs");
    }

    #[test]
    fn test_step_msg() {
        assert_eq!(step_msg(100, 0.5), "Step 00100: Sinkhorn score = 0.500000");
        assert_eq!(step_msg(0, 0.123456789), "Step 00000: Sinkhorn score = 0.123457");
    }

    #[test]
    fn test_warning_msgs() {
        let warnings = [NumericalWarning::SmallAngle, NumericalWarning::StiffKernel { ratio: 250.0 }];
        let msgs = warning_msgs("a -> b", &warnings);
        assert_eq!(msgs.len(), 2);
        assert!(msgs[0].starts_with("\x1b[1;33m[WARN]\x1b[0m a -> b: Rotation angle"));
        assert!(msgs[1].contains("a -> b: Cost range is 250.0x"));
    }
}
