//! Gap report export: the plain-text listing and a JSON document.

pub mod json_export;

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::gap::GapResult;

/// Serializable summary of a [`GapResult`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GapReport {
    /// Certification the workspace was measured against.
    pub certification: String,
    /// Number of controls the certification requires.
    pub required_controls: usize,
    /// Number of distinct controls claimed by any component.
    pub documented_controls: usize,
    /// `standard@control` keys with no claim, sorted.
    pub missing_controls: Vec<String>,
    /// Component data loaded only partially.
    #[serde(default)]
    pub degraded: bool,
    /// Load failures met along the way, one message each.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// RFC 3339 timestamp of when this report was created.
    pub generated_at: String,
}

impl GapReport {
    pub fn from_result(result: &GapResult) -> Self {
        Self {
            certification: result.certification.clone(),
            required_controls: result.master_controls.len(),
            documented_controls: result.satisfied_controls.len(),
            missing_controls: result.missing_keys().map(ToString::to_string).collect(),
            degraded: result.degraded,
            warnings: result.warnings.iter().map(ToString::to_string).collect(),
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn missing_count(&self) -> usize {
        self.missing_controls.len()
    }
}

/// `Number of missing controls: N` followed by one key per line.
pub fn render_text(result: &GapResult) -> String {
    let mut out = format!("Number of missing controls: {}\n", result.missing_count());
    for key in result.missing_keys() {
        let _ = writeln!(out, "{}", key);
    }
    out
}
