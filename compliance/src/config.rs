//! Workspace configuration passed explicitly through every loader layer.

use std::path::{Path, PathBuf};

/// Default OpenControl workspace directory.
pub const DEFAULT_OPENCONTROL_DIR: &str = "opencontrols";
/// Default number of descriptor loads in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 16;

pub const COMPONENTS_DIR: &str = "components";
pub const STANDARDS_DIR: &str = "standards";
pub const CERTIFICATIONS_DIR: &str = "certifications";
/// Descriptor file expected inside every component directory.
pub const COMPONENT_FILE: &str = "component.yaml";
/// Extension of certification descriptors under `certifications/`.
pub const CERTIFICATION_EXTENSION: &str = "yaml";

/// Settings for one load / gap-analysis run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceConfig {
    /// Root of the OpenControl workspace.
    pub opencontrol_dir: PathBuf,
    /// Certification name, resolved under `certifications/`.
    pub certification: String,
    /// Upper bound on concurrent descriptor loads across all phases.
    pub concurrency: usize,
    /// Cancel sibling phases as soon as one phase fails outright.
    pub fail_fast: bool,
}

impl WorkspaceConfig {
    pub fn new(opencontrol_dir: impl Into<PathBuf>, certification: impl Into<String>) -> Self {
        Self {
            opencontrol_dir: opencontrol_dir.into(),
            certification: certification.into(),
            concurrency: DEFAULT_CONCURRENCY,
            fail_fast: false,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Concurrency limit, never below one.
    pub fn concurrency_limit(&self) -> usize {
        self.concurrency.max(1)
    }

    pub fn components_dir(&self) -> PathBuf {
        self.opencontrol_dir.join(COMPONENTS_DIR)
    }

    pub fn standards_dir(&self) -> PathBuf {
        self.opencontrol_dir.join(STANDARDS_DIR)
    }

    pub fn certifications_dir(&self) -> PathBuf {
        self.opencontrol_dir.join(CERTIFICATIONS_DIR)
    }

    pub fn root(&self) -> &Path {
        &self.opencontrol_dir
    }
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self::new(DEFAULT_OPENCONTROL_DIR, String::new())
    }
}
