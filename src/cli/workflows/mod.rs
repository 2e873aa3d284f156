// File: mod.rs
// Created: 2023-05-26 15:35:22
// Author: Hyunbin Kim (khb7840@gmail.com)

//! # Workflows
//! This module contains the workflows for the CLI.
//! There are two workflows: `align_pair` for a single pair of structures and
//! `batch` for a list of pairs over one or more distance cutoffs.

pub mod align_pair;
pub mod batch;
