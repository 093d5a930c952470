//! Harmonic weight algorithms.
//!
//! This module contains the numerical pipeline and its helpers:
//!
//! - **Assembly**: cotangent Laplacian from rings or triangles ([`laplacian`])
//! - **Constraints**: Dirichlet boundary rows ([`constraint`]) and presets
//!   for choosing them ([`selector`])
//! - **Solving**: sparse and dense LU ([`solver`]) with fill-reducing
//!   column orderings ([`ordering`])
//! - **Pipeline**: end-to-end entry points ([`harmonic`])
//! - **Display**: heat colors, level curves and height deformation ([`colormap`])

pub mod colormap;
pub mod constraint;
pub mod harmonic;
pub mod laplacian;
pub mod ordering;
pub mod progress;
pub mod selector;
pub mod solver;
pub mod sparse;
pub mod weights;

pub use progress::{Progress, Stage};
