//! Standard phase: one task per file under `standards/`.

use std::path::{Path, PathBuf};

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::pool::TaskPool;
use super::{list_dir, Phase, PhaseOutput};
use crate::controls::Standard;
use crate::descriptor::parse_standard;
use crate::error::{LoadError, LoadResult};
use crate::registry::{Admission, Registry};

pub(super) async fn load_standards(dir: &Path, pool: &TaskPool) -> PhaseOutput<Registry<Standard>> {
    let registry = Registry::new();

    if pool.is_cancelled() {
        let error = LoadError::Cancelled {
            phase: Phase::Standards,
        };
        return PhaseOutput::fatal(registry, error);
    }

    let (entries, mut errors) = match list_dir(dir).await {
        Ok(listing) => listing,
        Err(error) => {
            warn!(event = "phase_failed", phase = %Phase::Standards, error = %error);
            return PhaseOutput::fatal(registry, error);
        }
    };

    let mut tasks = JoinSet::new();
    for entry in entries.into_iter().filter(|e| !e.is_dir) {
        pool.spawn(&mut tasks, read_standard(entry.path));
    }

    let mut cancelled = 0usize;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Some(Ok((path, standard)))) => {
                let key = standard.key.clone();
                match registry.add(key.clone(), standard) {
                    Admission::Added => debug!(event = "standard_admitted", key = %key),
                    Admission::AlreadyExists => {
                        let error = LoadError::duplicate_key(Phase::Standards, &key, &path);
                        warn!(event = "standard_rejected", key = %key, error = %error);
                        errors.push(error);
                    }
                }
            }
            Ok(Some(Err(error))) => {
                warn!(event = "standard_failed", error = %error);
                errors.push(error);
            }
            Ok(None) => cancelled += 1,
            Err(join_error) => errors.push(LoadError::TaskFailed {
                phase: Phase::Standards,
                message: join_error.to_string(),
            }),
        }
    }

    let failed = cancelled > 0;
    if failed {
        errors.push(LoadError::Cancelled {
            phase: Phase::Standards,
        });
    }
    info!(
        event = "phase_complete",
        phase = %Phase::Standards,
        admitted = registry.len(),
        errors = errors.len(),
        cancelled,
    );
    PhaseOutput {
        value: registry,
        errors,
        failed,
    }
}

async fn read_standard(path: PathBuf) -> LoadResult<(PathBuf, Standard)> {
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| LoadError::file_unreadable(&path, &e))?;
    let standard = parse_standard(&bytes).map_err(|e| LoadError::schema(&path, e))?;
    Ok((path, standard))
}
