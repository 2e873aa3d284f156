//! Command line interface for sinkalign

// File: mod.rs
// Created: 2023-09-05 16:36:23
// Author: Hyunbin Kim (khb7840@gmail.com)
// Copyright © 2024 Hyunbin Kim, All rights reserved

// Arguments of CLI app are defined here

pub mod workflows;
pub mod config;

use crate::cli::config::ConfigOverrides;

pub enum AppArgs {
    Global {
        help: bool,
    },
    Align {
        mobile: Option<String>,
        reference: Option<String>,
        mobile_chain: Option<char>,
        reference_chain: Option<char>,
        // Outputs
        output: Option<String>,
        matrix_out: Option<String>,
        report: Option<String>,
        // Configuration file and explicit overrides
        config: Option<String>,
        save_config: Option<String>,
        overrides: ConfigOverrides,
        print_freq: usize,
        verbose: bool,
        help: bool,
    },
    Batch {
        pair_list: Option<String>,
        structure_dir: Option<String>,
        output_dir: Option<String>,
        // Comma separated distance cutoffs, one output directory each
        cutoffs: Option<String>,
        threads: usize,
        fail_fast: bool,
        config: Option<String>,
        save_config: bool,
        overrides: ConfigOverrides,
        verbose: bool,
        help: bool,
    },
}

pub fn print_logo() {
    let logo = [
        "",
        "\x1b[91m░█▀▀░▀█▀░█▀█░█░█\x1b[93m░█▀█░█░░░▀█▀░█▀▀░█▀█\x1b[0m",
        "\x1b[91m░▀▀█░░█░░█░█░█▀▄\x1b[93m░█▀█░█░░░░█░░█░█░█░█\x1b[0m",
        "\x1b[91m░▀▀▀░▀▀▀░▀░▀░▀░▀\x1b[93m░▀░▀░▀▀▀░▀▀▀░▀▀▀░▀░▀\x1b[0m",
        "",
    ];

    for line in &logo {
        eprintln!("{}", line);
    }
}
