//! Concurrent workspace loader.
//!
//! Loads `components/`, `standards/` and one certification file into a
//! [`Model`]. The three phases run concurrently and are joined before
//! anything is returned. Within the component and standard phases one task
//! per directory entry is spawned on a shared, bounded [`TaskPool`]; each
//! phase drains its own tasks and is the only writer to its registry.

pub mod certification;
mod components;
pub mod pool;
mod standards;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::cancel::CancelToken;
use crate::config::WorkspaceConfig;
use crate::controls::{Certification, Component, Standard};
use crate::error::{LoadError, LoadErrors};
use crate::justification::JustificationIndex;
use crate::registry::Registry;
use pool::TaskPool;

pub use certification::{list_certifications, resolve_certification};

/// One of the three independent load phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Components,
    Standards,
    Certification,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Components => "components",
            Phase::Standards => "standards",
            Phase::Certification => "certification",
        }
    }

    /// Singular name of the entity this phase loads.
    pub fn entity_name(self) -> &'static str {
        match self {
            Phase::Components => "component",
            Phase::Standards => "standard",
            Phase::Certification => "certification",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregated, cross-referenced workspace. Read-only once loading returns.
#[derive(Debug, Default)]
pub struct Model {
    pub components: Registry<Component>,
    pub standards: Registry<Standard>,
    pub certification: Option<Certification>,
    pub justifications: JustificationIndex,
}

/// A (possibly partial) model together with every failure met while
/// building it.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub model: Model,
    phase_errors: BTreeMap<Phase, LoadErrors>,
    failed: BTreeSet<Phase>,
}

impl LoadOutcome {
    /// All failures, grouped by phase in `Phase` order.
    pub fn errors(&self) -> LoadErrors {
        let mut all = LoadErrors::new();
        for errors in self.phase_errors.values() {
            all.extend(errors.clone());
        }
        all
    }

    pub fn phase_errors(&self, phase: Phase) -> Option<&LoadErrors> {
        self.phase_errors.get(&phase).filter(|e| !e.is_empty())
    }

    /// Whether `phase` failed outright (unreadable root, unreadable or
    /// invalid certification, cancellation).
    pub fn phase_failed(&self, phase: Phase) -> bool {
        self.failed.contains(&phase)
    }

    pub fn failed_phases(&self) -> impl Iterator<Item = Phase> + '_ {
        self.failed.iter().copied()
    }

    /// No failures of any kind were recorded.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.phase_errors.values().all(LoadErrors::is_empty)
    }

    pub(crate) fn record<T>(&mut self, phase: Phase, output: PhaseOutput<T>) -> T {
        if output.failed {
            self.failed.insert(phase);
        }
        self.phase_errors.insert(phase, output.errors);
        output.value
    }
}

/// Result of one phase: what was built, what went wrong, and whether the
/// phase as a whole failed.
pub(crate) struct PhaseOutput<T> {
    pub value: T,
    pub errors: LoadErrors,
    pub failed: bool,
}

impl<T> PhaseOutput<T> {
    fn fatal(value: T, error: LoadError) -> Self {
        Self {
            value,
            errors: LoadErrors::from(vec![error]),
            failed: true,
        }
    }
}

/// Load the workspace rooted at `config.opencontrol_dir` together with the
/// certification at `certification_path`.
///
/// Never fails as a whole: the returned outcome carries the partial model
/// and every failure. Cancelling `cancel` stops tasks that have not started.
pub async fn load_workspace(
    config: &WorkspaceConfig,
    certification_path: &Path,
    cancel: &CancelToken,
) -> LoadOutcome {
    // Local child so fail-fast never cancels the caller's token.
    let run_cancel = cancel.child();
    let pool = TaskPool::new(config.concurrency_limit(), run_cancel.clone());
    let components_dir = config.components_dir();
    let standards_dir = config.standards_dir();

    debug!(
        event = "load_start",
        root = %config.opencontrol_dir.display(),
        certification = %certification_path.display(),
        concurrency = config.concurrency_limit(),
    );

    let (components, standards, certification) = tokio::join!(
        fail_fast(
            components::load_components(&components_dir, &pool),
            config,
            &run_cancel
        ),
        fail_fast(
            standards::load_standards(&standards_dir, &pool),
            config,
            &run_cancel
        ),
        fail_fast(
            certification::load_certification(certification_path, &run_cancel),
            config,
            &run_cancel
        ),
    );

    let mut outcome = LoadOutcome::default();
    let (component_registry, justifications) = outcome.record(Phase::Components, components);
    let standard_registry = outcome.record(Phase::Standards, standards);
    let certification = outcome.record(Phase::Certification, certification);
    outcome.model = Model {
        components: component_registry,
        standards: standard_registry,
        certification,
        justifications,
    };

    info!(
        event = "load_complete",
        components = outcome.model.components.len(),
        standards = outcome.model.standards.len(),
        certification = outcome.model.certification.is_some(),
        errors = outcome.errors().len(),
    );
    outcome
}

async fn fail_fast<T>(
    phase: impl std::future::Future<Output = PhaseOutput<T>>,
    config: &WorkspaceConfig,
    cancel: &CancelToken,
) -> PhaseOutput<T> {
    let output = phase.await;
    if output.failed && config.fail_fast {
        cancel.cancel();
    }
    output
}

/// A directory entry classified by type.
pub(crate) struct Entry {
    pub path: PathBuf,
    pub name: String,
    pub is_dir: bool,
}

/// List `dir`, following symlinks, skipping hidden entries. Sorted by name.
///
/// Failing to open or iterate the directory is fatal for the caller's
/// phase; failing to stat one entry is reported for that entry only.
pub(crate) async fn list_dir(dir: &Path) -> Result<(Vec<Entry>, LoadErrors), LoadError> {
    let mut reader = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| LoadError::directory_unreadable(dir, &e))?;

    let mut entries = Vec::new();
    let mut errors = LoadErrors::new();
    while let Some(entry) = reader
        .next_entry()
        .await
        .map_err(|e| LoadError::directory_unreadable(dir, &e))?
    {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let path = entry.path();
        match tokio::fs::metadata(&path).await {
            Ok(meta) => entries.push(Entry {
                path,
                name,
                is_dir: meta.is_dir(),
            }),
            Err(e) => errors.push(LoadError::file_unreadable(&path, &e)),
        }
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok((entries, errors))
}
