//! OpenControl workspace loading and certification gap analysis.
//!
//! This crate provides:
//! - Descriptor parsing for components, standards and certifications (`descriptor`)
//! - A concurrent workspace loader with collected, per-entity errors (`workspace`)
//! - The justification index of component claims (`justification`)
//! - Gap analysis of a certification against a loaded workspace (`gap`)
//! - Text and JSON report export (`export`)

pub mod cancel;
pub mod config;
pub mod controls;
pub mod descriptor;
pub mod error;
pub mod export;
pub mod gap;
pub mod justification;
pub mod registry;
pub mod workspace;

pub use cancel::CancelToken;
pub use config::WorkspaceConfig;
pub use error::{AnalysisError, ErrorKind, LoadError, LoadErrors};
pub use gap::{compute_gap_analysis, GapAnalyzer, GapResult};
pub use workspace::{load_workspace, LoadOutcome, Model};
