//! Certification gap analysis.
//!
//! Three single-pass traversals over a loaded [`Model`]:
//! 1. master: every control the certification requires;
//! 2. actual: every control some admitted component claims (first claim
//!    wins, components in key order);
//! 3. missing: master minus actual.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{info, warn};

use crate::cancel::CancelToken;
use crate::config::WorkspaceConfig;
use crate::controls::{Certification, Control, ControlRef, Satisfies};
use crate::error::{AnalysisError, LoadErrors};
use crate::workspace::{load_workspace, resolve_certification, LoadOutcome, Model, Phase};

/// The first claim seen for a control and the component that made it.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SatisfiedControl {
    pub component_key: String,
    pub claim: Satisfies,
}

/// Outcome of a gap analysis. Every map iterates in `standard@control`
/// order.
#[derive(Debug, Clone)]
pub struct GapResult {
    pub certification: String,
    pub master_controls: BTreeMap<ControlRef, Control>,
    pub satisfied_controls: BTreeMap<ControlRef, SatisfiedControl>,
    pub missing_controls: BTreeMap<ControlRef, Control>,
    /// Component data loaded only partially; some claims may be absent.
    pub degraded: bool,
    /// Every failure recorded while loading, in phase order.
    pub warnings: LoadErrors,
}

impl GapResult {
    pub fn missing_count(&self) -> usize {
        self.missing_controls.len()
    }

    pub fn missing_keys(&self) -> impl Iterator<Item = &ControlRef> + '_ {
        self.missing_controls.keys()
    }

    /// Required controls that at least one component claims.
    pub fn satisfied_required_count(&self) -> usize {
        self.master_controls.len() - self.missing_controls.len()
    }
}

/// Computes [`GapResult`]s from load outcomes.
#[derive(Debug, Default, Clone, Copy)]
pub struct GapAnalyzer;

impl GapAnalyzer {
    /// Analyze a loaded workspace.
    ///
    /// Refuses when the certification or the component directory failed to
    /// load; a refusal is never reported as an empty gap. Individual
    /// component failures still allow a result, flagged `degraded`.
    pub fn analyze(&self, outcome: &LoadOutcome) -> Result<GapResult, AnalysisError> {
        let certification = match &outcome.model.certification {
            Some(cert) if !outcome.phase_failed(Phase::Certification) => cert,
            _ => {
                return Err(AnalysisError::CertificationUnavailable {
                    errors: phase_errors(outcome, Phase::Certification),
                })
            }
        };
        if outcome.phase_failed(Phase::Components) {
            return Err(AnalysisError::ComponentsUnavailable {
                errors: phase_errors(outcome, Phase::Components),
            });
        }

        let master_controls = master_controls(certification);
        let satisfied_controls = satisfied_controls(&outcome.model);
        let missing_controls = missing_controls(&master_controls, &satisfied_controls);
        let degraded = outcome.phase_errors(Phase::Components).is_some();

        if degraded {
            warn!(
                event = "gap_degraded",
                certification = %certification.key,
                "component set loaded partially; missing controls may be overstated"
            );
        }
        info!(
            event = "gap_computed",
            certification = %certification.key,
            required = master_controls.len(),
            documented = satisfied_controls.len(),
            missing = missing_controls.len(),
        );

        Ok(GapResult {
            certification: certification.key.clone(),
            master_controls,
            satisfied_controls,
            missing_controls,
            degraded,
            warnings: outcome.errors(),
        })
    }
}

fn phase_errors(outcome: &LoadOutcome, phase: Phase) -> LoadErrors {
    outcome.phase_errors(phase).cloned().unwrap_or_default()
}

/// Pass 1: every control the certification requires. First occurrence wins.
fn master_controls(certification: &Certification) -> BTreeMap<ControlRef, Control> {
    let mut master = BTreeMap::new();
    for (key, control) in certification.required_controls() {
        master.entry(key).or_insert_with(|| control.clone());
    }
    master
}

/// Pass 2: every claimed control. The first claiming component wins; later
/// claims on the same pair are ignored.
fn satisfied_controls(model: &Model) -> BTreeMap<ControlRef, SatisfiedControl> {
    let mut actual = BTreeMap::new();
    for (component_key, component) in model.components.all() {
        for claim in &component.satisfies {
            actual
                .entry(claim.control_ref())
                .or_insert_with(|| SatisfiedControl {
                    component_key: component_key.clone(),
                    claim: claim.clone(),
                });
        }
    }
    actual
}

/// Pass 3: `master \ actual`.
fn missing_controls(
    master: &BTreeMap<ControlRef, Control>,
    actual: &BTreeMap<ControlRef, SatisfiedControl>,
) -> BTreeMap<ControlRef, Control> {
    master
        .iter()
        .filter(|(key, _)| !actual.contains_key(*key))
        .map(|(key, control)| (key.clone(), control.clone()))
        .collect()
}

/// Resolve the configured certification, load the workspace and analyze it.
pub async fn compute_gap_analysis(
    config: &WorkspaceConfig,
    cancel: &CancelToken,
) -> Result<GapResult, AnalysisError> {
    let certification_path = resolve_certification(config).await?;
    let outcome = load_workspace(config, &certification_path, cancel).await;
    GapAnalyzer.analyze(&outcome)
}
