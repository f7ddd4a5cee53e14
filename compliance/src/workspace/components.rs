//! Component phase: one task per directory under `components/`.

use std::path::{Path, PathBuf};

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::pool::TaskPool;
use super::{list_dir, Phase, PhaseOutput};
use crate::config::COMPONENT_FILE;
use crate::controls::Component;
use crate::descriptor::parse_component;
use crate::error::{LoadError, LoadErrors, LoadResult};
use crate::justification::JustificationIndex;
use crate::registry::{Admission, Registry};

struct LoadedComponent {
    component: Component,
    path: PathBuf,
}

pub(super) async fn load_components(
    dir: &Path,
    pool: &TaskPool,
) -> PhaseOutput<(Registry<Component>, JustificationIndex)> {
    let registry = Registry::new();
    let mut justifications = JustificationIndex::new();

    if pool.is_cancelled() {
        let error = LoadError::Cancelled {
            phase: Phase::Components,
        };
        return PhaseOutput::fatal((registry, justifications), error);
    }

    let (entries, mut errors) = match list_dir(dir).await {
        Ok(listing) => listing,
        Err(error) => {
            warn!(event = "phase_failed", phase = %Phase::Components, error = %error);
            return PhaseOutput::fatal((registry, justifications), error);
        }
    };

    let mut tasks = JoinSet::new();
    for entry in entries.into_iter().filter(|e| e.is_dir) {
        pool.spawn(&mut tasks, read_component(entry.path, entry.name));
    }

    let mut cancelled = 0usize;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Some(Ok(loaded))) => {
                let key = loaded.component.key.clone();
                match registry.add(key.clone(), loaded.component) {
                    Admission::Added => {
                        if let Some(component) = registry.get(&key) {
                            justifications.load_mappings(&component);
                        }
                        debug!(event = "component_admitted", key = %key);
                    }
                    Admission::AlreadyExists => {
                        let error = LoadError::duplicate_key(Phase::Components, &key, &loaded.path);
                        warn!(event = "component_rejected", key = %key, error = %error);
                        errors.push(error);
                    }
                }
            }
            Ok(Some(Err(error))) => {
                warn!(event = "component_failed", error = %error);
                errors.push(error);
            }
            Ok(None) => cancelled += 1,
            Err(join_error) => errors.push(LoadError::TaskFailed {
                phase: Phase::Components,
                message: join_error.to_string(),
            }),
        }
    }

    finish(registry, justifications, errors, cancelled)
}

fn finish(
    registry: Registry<Component>,
    justifications: JustificationIndex,
    mut errors: LoadErrors,
    cancelled: usize,
) -> PhaseOutput<(Registry<Component>, JustificationIndex)> {
    let failed = cancelled > 0;
    if failed {
        errors.push(LoadError::Cancelled {
            phase: Phase::Components,
        });
    }
    info!(
        event = "phase_complete",
        phase = %Phase::Components,
        admitted = registry.len(),
        claimed_controls = justifications.len(),
        errors = errors.len(),
        cancelled,
    );
    PhaseOutput {
        value: (registry, justifications),
        errors,
        failed,
    }
}

/// Read and parse `<dir>/component.yaml`, defaulting the key to `dir_name`.
async fn read_component(dir: PathBuf, dir_name: String) -> LoadResult<LoadedComponent> {
    let path = dir.join(COMPONENT_FILE);
    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => {}
        _ => return Err(LoadError::component_file_missing(&path)),
    }

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| LoadError::file_unreadable(&path, &e))?;
    let mut component = parse_component(&bytes).map_err(|e| LoadError::schema(&path, e))?;
    if component.key.is_empty() {
        component.key = dir_name;
    }
    Ok(LoadedComponent { component, path })
}
