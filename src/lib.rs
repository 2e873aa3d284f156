//! # About project
//!
//! Sinkalign aligns two protein structures (C-alpha only) by gradient ascent on a
//! differentiable TM-score surrogate. The rigid transform is parameterized on the
//! Lie algebra of SE(3) and residue correspondences are soft, computed with
//! entropy-regularized optimal transport (Sinkhorn).

pub mod align;
pub mod cli;
pub mod structure;
pub mod utils;

pub mod prelude {
    pub use crate::align::config::AlignConfig;
    pub use crate::align::driver::{align, align_with_cancel, AlignmentResult, Aligner};
    pub use crate::align::se3::{RigidTransform, TransformParameters};
    pub use crate::align::{AlignError, NumericalWarning, Side};
    pub use crate::structure::core::Structure;
    pub use crate::structure::io::pdb::Reader as PDBReader;
    pub use crate::structure::io::StructureError;
    pub use crate::structure::point_set::PointSet;
    pub use crate::utils::log::{log_msg, print_log_msg, DONE, FAIL, INFO, WARN};
}
