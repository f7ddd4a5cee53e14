//! Integration tests for the compliance crate.
//!
//! These tests build OpenControl workspaces on disk and exercise the full
//! pipeline: resolve the certification, load, analyze, and render.

use std::fs;
use std::path::Path;

use masonry_compliance::error::{AnalysisError, ErrorKind};
use masonry_compliance::export::{json_export, render_text};
use masonry_compliance::workspace::{load_workspace, resolve_certification, Phase};
use masonry_compliance::{compute_gap_analysis, CancelToken, WorkspaceConfig};

const LATO: &str = "standards:\n  NIST-800-53:\n    controls:\n      AC-2:\n        name: Account Management\n";

const NIST: &str = "key: NIST-800-53\ncontrols:\n  AC-2:\n    name: Account Management\n    family: AC\n  AU-1:\n    name: Audit and Accountability Policy\n    family: AU\n";

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// A workspace with one standard, one certification and the given
/// `(directory, component.yaml)` pairs.
fn workspace(components: &[(&str, Option<&str>)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("components")).unwrap();
    write(&root.join("standards/NIST-800-53.yaml"), NIST);
    write(&root.join("certifications/LATO.yaml"), LATO);
    for (name, yaml) in components {
        let component_dir = root.join("components").join(name);
        fs::create_dir_all(&component_dir).unwrap();
        if let Some(yaml) = yaml {
            fs::write(component_dir.join("component.yaml"), yaml).unwrap();
        }
    }
    dir
}

fn claim(schema_version: &str, key: Option<&str>, control: &str) -> String {
    let mut yaml = format!("schema_version: {}\n", schema_version);
    if let Some(key) = key {
        yaml.push_str(&format!("key: {}\n", key));
    }
    // 2.0.0 narratives are a single string; later versions use sections.
    let narrative = if schema_version == "2.0.0" {
        "    narrative: covered\n"
    } else {
        "    narrative:\n      - text: covered\n"
    };
    yaml.push_str(&format!(
        "satisfies:\n  - standard_key: NIST-800-53\n    control_key: {}\n{}",
        control, narrative
    ));
    yaml
}

fn config(dir: &tempfile::TempDir) -> WorkspaceConfig {
    WorkspaceConfig::new(dir.path(), "LATO").with_concurrency(4)
}

#[tokio::test]
async fn test_empty_gap() {
    let ac2 = claim("3.0.0", None, "AC-2");
    let dir = workspace(&[("ec2", Some(&ac2))]);

    let result = compute_gap_analysis(&config(&dir), &CancelToken::new())
        .await
        .unwrap();

    assert_eq!(result.missing_count(), 0);
    assert!(!result.degraded);
    assert_eq!(render_text(&result), "Number of missing controls: 0\n");
}

#[tokio::test]
async fn test_single_gap() {
    let dir = workspace(&[]);

    let result = compute_gap_analysis(&config(&dir), &CancelToken::new())
        .await
        .unwrap();

    assert_eq!(
        render_text(&result),
        "Number of missing controls: 1\nNIST-800-53@AC-2\n"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_partial_failure_keeps_valid_component() {
    let ac2 = claim("3.1.0", None, "AC-2");
    let dir = workspace(&[("valid", Some(&ac2)), ("hollow", None)]);
    let cfg = config(&dir);
    let cert_path = resolve_certification(&cfg).await.unwrap();

    let outcome = load_workspace(&cfg, &cert_path, &CancelToken::new()).await;
    let errors = outcome.phase_errors(Phase::Components).unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors.of_kind(ErrorKind::ComponentFileMissing).count(),
        1
    );
    assert!(!outcome.phase_failed(Phase::Components));
    assert_eq!(outcome.model.components.keys(), vec!["valid"]);

    // The gap still runs, flagged as degraded.
    let result = compute_gap_analysis(&cfg, &CancelToken::new()).await.unwrap();
    assert!(result.degraded);
    assert_eq!(result.missing_count(), 0);
    assert!(result.warnings.contains_kind(ErrorKind::ComponentFileMissing));
}

#[tokio::test]
async fn test_unresolvable_certification_is_refused() {
    let dir = workspace(&[]);
    let cfg = WorkspaceConfig::new(dir.path(), "FedRAMP-moderate");

    let err = compute_gap_analysis(&cfg, &CancelToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::CertificationNotFound);
    match &err {
        AnalysisError::CertificationNotFound { available, .. } => {
            assert_eq!(available, &vec!["LATO".to_string()]);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    let message = err.to_string();
    assert!(message.contains("Certification 'FedRAMP-moderate' not found"));
    assert!(message.contains("LATO"));
}

#[tokio::test]
async fn test_missing_certification_name_lists_available() {
    let dir = workspace(&[]);
    write(&dir.path().join("certifications/FedRAMP-low.yaml"), LATO);
    let cfg = WorkspaceConfig::new(dir.path(), "");

    let err = compute_gap_analysis(&cfg, &CancelToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CertificationNotFound);
    assert_eq!(
        err.to_string(),
        "Missing certification argument\nUse one of the following:\n  FedRAMP-low\n  LATO"
    );
}

#[tokio::test]
async fn test_unquoted_numeric_control_ids() {
    let dir = workspace(&[(
        "firewall",
        Some("schema_version: 3.1.0\nsatisfies:\n  - standard_key: PCI-DSS\n    control_key: 1.1\n"),
    )]);
    write(
        &dir.path().join("standards/PCI-DSS.yaml"),
        "key: PCI-DSS\ncontrols:\n  1.1:\n    name: Firewall configuration\n  10:\n",
    );
    write(
        &dir.path().join("certifications/LATO.yaml"),
        "standards:\n  PCI-DSS:\n    1.1:\n    10:\n",
    );

    let result = compute_gap_analysis(&config(&dir), &CancelToken::new())
        .await
        .unwrap();
    assert!(!result.degraded, "{}", result.warnings);
    assert_eq!(
        render_text(&result),
        "Number of missing controls: 1\nPCI-DSS@10\n"
    );
}

#[tokio::test]
async fn test_invalid_certification_is_refused() {
    let dir = workspace(&[]);
    write(&dir.path().join("certifications/LATO.yaml"), "standards: [oops\n");

    let err = compute_gap_analysis(&config(&dir), &CancelToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::CertificationUnavailable { .. }));
    assert_eq!(err.kind(), ErrorKind::MalformedSyntax);
}

#[tokio::test]
async fn test_missing_components_dir_is_refused() {
    let dir = workspace(&[]);
    fs::remove_dir_all(dir.path().join("components")).unwrap();

    let err = compute_gap_analysis(&config(&dir), &CancelToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::ComponentsUnavailable { .. }));
    assert_eq!(err.kind(), ErrorKind::DirectoryUnreadable);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_duplicate_component_keys_rejected() {
    let first = claim("3.0.0", Some("shared"), "AC-2");
    let second = claim("2.0.0", Some("shared"), "AU-1");
    let dir = workspace(&[("a", Some(&first)), ("b", Some(&second))]);
    let cfg = config(&dir);
    let cert_path = resolve_certification(&cfg).await.unwrap();

    let outcome = load_workspace(&cfg, &cert_path, &CancelToken::new()).await;
    assert_eq!(outcome.model.components.len(), 1);
    assert_eq!(
        outcome.errors().of_kind(ErrorKind::DuplicateKey).count(),
        1
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_duplicate_claims_collapse() {
    let ac2 = claim("3.0.0", None, "AC-2");
    let ac2_again = claim("2.0.0", None, "AC-2");
    let dir = workspace(&[("ec2", Some(&ac2)), ("iam", Some(&ac2_again))]);

    let result = compute_gap_analysis(&config(&dir), &CancelToken::new())
        .await
        .unwrap();
    assert_eq!(result.satisfied_controls.len(), 1);
    assert_eq!(result.missing_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_repeated_analysis_is_idempotent() {
    let au1 = claim("3.0.0", None, "AU-1");
    let dir = workspace(&[("logging", Some(&au1)), ("empty", None)]);
    write(
        &dir.path().join("certifications/LATO.yaml"),
        "standards:\n  NIST-800-53:\n    AC-2:\n    AU-1:\n  PCI-DSS:\n    '1.1':\n",
    );
    let cfg = config(&dir);

    let mut runs = Vec::new();
    for _ in 0..5 {
        let result = compute_gap_analysis(&cfg, &CancelToken::new()).await.unwrap();
        runs.push(render_text(&result));
    }
    assert!(runs.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(
        runs[0],
        "Number of missing controls: 2\nNIST-800-53@AC-2\nPCI-DSS@1.1\n"
    );
}

#[tokio::test]
async fn test_json_report() {
    let dir = workspace(&[]);
    let result = compute_gap_analysis(&config(&dir), &CancelToken::new())
        .await
        .unwrap();

    let report = json_export::from_json(&json_export::to_json(&result).unwrap()).unwrap();
    assert_eq!(report.certification, "LATO");
    assert_eq!(report.required_controls, 1);
    assert_eq!(report.missing_controls, vec!["NIST-800-53@AC-2"]);
}

#[tokio::test]
async fn test_cancelled_run_is_refused() {
    let ac2 = claim("3.0.0", None, "AC-2");
    let dir = workspace(&[("ec2", Some(&ac2))]);
    let cancel = CancelToken::new();
    cancel.cancel();

    let err = compute_gap_analysis(&config(&dir), &cancel).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cancelled);
}
