//! Certification lookup and the certification load phase.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::{Phase, PhaseOutput};
use crate::cancel::CancelToken;
use crate::config::{WorkspaceConfig, CERTIFICATION_EXTENSION};
use crate::controls::Certification;
use crate::descriptor::parse_certification;
use crate::error::{LoadError, LoadResult};

/// Map `config.certification` to `<root>/certifications/<name>.yaml`.
///
/// An empty or unknown name yields `CertificationNotFound` listing the
/// certifications that do exist.
pub async fn resolve_certification(config: &WorkspaceConfig) -> LoadResult<PathBuf> {
    let dir = config.certifications_dir();
    let name = config.certification.trim();
    let path = dir.join(format!("{}.{}", name, CERTIFICATION_EXTENSION));

    let plain_name = !name.is_empty() && !name.contains(['/', '\\']) && name != "..";
    if plain_name {
        if let Ok(meta) = tokio::fs::metadata(&path).await {
            if meta.is_file() {
                return Ok(path);
            }
        }
    }

    Err(LoadError::CertificationNotFound {
        name: name.to_string(),
        path,
        available: list_certifications(&dir).await,
    })
}

/// Names of the certifications under `dir`, sorted. An unreadable
/// directory lists nothing.
pub async fn list_certifications(dir: &Path) -> Vec<String> {
    let mut names = Vec::new();
    let Ok(mut reader) = tokio::fs::read_dir(dir).await else {
        return names;
    };
    while let Ok(Some(entry)) = reader.next_entry().await {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(CERTIFICATION_EXTENSION) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            if !stem.starts_with('.') {
                names.push(stem.to_string());
            }
        }
    }
    names.sort();
    names
}

pub(super) async fn load_certification(
    path: &Path,
    cancel: &CancelToken,
) -> PhaseOutput<Option<Certification>> {
    if cancel.is_cancelled() {
        let error = LoadError::Cancelled {
            phase: Phase::Certification,
        };
        return PhaseOutput::fatal(None, error);
    }

    match read_certification(path).await {
        Ok(certification) => {
            info!(
                event = "phase_complete",
                phase = %Phase::Certification,
                certification = %certification.key,
                required_controls = certification.len(),
            );
            PhaseOutput {
                value: Some(certification),
                errors: Default::default(),
                failed: false,
            }
        }
        Err(error) => {
            warn!(event = "phase_failed", phase = %Phase::Certification, error = %error);
            PhaseOutput::fatal(None, error)
        }
    }
}

async fn read_certification(path: &Path) -> LoadResult<Certification> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| LoadError::file_unreadable(path, &e))?;
    let mut certification = parse_certification(&bytes).map_err(|e| LoadError::schema(path, e))?;
    if certification.key.is_empty() {
        certification.key = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
    }
    Ok(certification)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::fs;

    fn workspace_with(certs: &[&str]) -> tempfile::TempDir {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("certifications");
        fs::create_dir_all(&dir).unwrap();
        for name in certs {
            fs::write(
                dir.join(format!("{}.yaml", name)),
                "standards:\n  NIST-800-53:\n    AC-2:\n",
            )
            .unwrap();
        }
        fs::write(dir.join("notes.txt"), "ignored").unwrap();
        root
    }

    #[tokio::test]
    async fn test_resolve_existing() {
        let root = workspace_with(&["LATO", "FedRAMP-low"]);
        let config = WorkspaceConfig::new(root.path(), "LATO");
        let path = resolve_certification(&config).await.unwrap();
        assert!(path.ends_with("certifications/LATO.yaml"));
    }

    #[tokio::test]
    async fn test_resolve_unknown_lists_available() {
        let root = workspace_with(&["LATO", "FedRAMP-low"]);
        let config = WorkspaceConfig::new(root.path(), "FedRAMP-high");
        let err = resolve_certification(&config).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CertificationNotFound);
        match err {
            LoadError::CertificationNotFound { available, .. } => {
                assert_eq!(available, vec!["FedRAMP-low", "LATO"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_resolve_rejects_empty_and_path_like_names() {
        let root = workspace_with(&["LATO"]);
        for name in ["", "  ", "../certifications/LATO"] {
            let config = WorkspaceConfig::new(root.path(), name);
            let err = resolve_certification(&config).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::CertificationNotFound, "{:?}", name);
        }
    }

    #[tokio::test]
    async fn test_key_defaults_to_file_stem() {
        let root = workspace_with(&["LATO"]);
        let output = load_certification(
            &root.path().join("certifications/LATO.yaml"),
            &CancelToken::new(),
        )
        .await;
        assert!(!output.failed);
        assert_eq!(output.value.unwrap().key, "LATO");
    }
}
