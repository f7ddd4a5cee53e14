//! Loader and analysis error types with reason codes.
//!
//! Per-entity failures are collected into [`LoadErrors`] rather than
//! returned one at a time, so a single run reports every problem found in a
//! workspace.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::workspace::Phase;

/// Machine-readable failure class. The discriminant doubles as the stable
/// reason code reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorKind {
    /// A root directory (components/, standards/) could not be listed.
    DirectoryUnreadable = 100,
    /// A descriptor file exists but could not be read.
    FileUnreadable = 101,
    /// A component directory has no `component.yaml`.
    ComponentFileMissing = 102,
    /// Descriptor bytes are not valid YAML/JSON or have the wrong shape.
    MalformedSyntax = 200,
    /// Descriptor declares a schema version with no mapping rules.
    UnsupportedSchemaVersion = 201,
    /// Descriptor omits a field its schema requires.
    MissingRequiredField = 202,
    /// A registry already holds an entity with the same key.
    DuplicateKey = 300,
    /// The requested certification has no descriptor file.
    CertificationNotFound = 400,
    /// Work was skipped because the run was cancelled.
    Cancelled = 500,
    /// A loader task panicked or was aborted by the runtime.
    TaskFailed = 900,
}

impl ErrorKind {
    /// Stable numeric reason code.
    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::DirectoryUnreadable => "directory_unreadable",
            ErrorKind::FileUnreadable => "file_unreadable",
            ErrorKind::ComponentFileMissing => "component_file_missing",
            ErrorKind::MalformedSyntax => "malformed_syntax",
            ErrorKind::UnsupportedSchemaVersion => "unsupported_schema_version",
            ErrorKind::MissingRequiredField => "missing_required_field",
            ErrorKind::DuplicateKey => "duplicate_key",
            ErrorKind::CertificationNotFound => "certification_not_found",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::TaskFailed => "task_failed",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schema-level failure raised by the descriptor parser.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("malformed descriptor: {message}")]
    MalformedSyntax { message: String },

    #[error("unsupported schema version '{version}'")]
    UnsupportedSchemaVersion { version: String },

    #[error("missing required field '{field}'")]
    MissingRequiredField { field: String },
}

impl SchemaError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedSyntax {
            message: message.into(),
        }
    }

    pub fn unsupported_version(version: impl Into<String>) -> Self {
        Self::UnsupportedSchemaVersion {
            version: version.into(),
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingRequiredField {
            field: field.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SchemaError::MalformedSyntax { .. } => ErrorKind::MalformedSyntax,
            SchemaError::UnsupportedSchemaVersion { .. } => ErrorKind::UnsupportedSchemaVersion,
            SchemaError::MissingRequiredField { .. } => ErrorKind::MissingRequiredField,
        }
    }
}

impl From<serde_yaml::Error> for SchemaError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::malformed(err.to_string())
    }
}

/// A single failure encountered while loading a workspace.
#[derive(Error, Debug, Clone)]
pub enum LoadError {
    #[error("Unable to read the directory {}: {message}", .path.display())]
    DirectoryUnreadable { path: PathBuf, message: String },

    #[error("Unable to read the file {}: {message}", .path.display())]
    FileUnreadable { path: PathBuf, message: String },

    #[error("Component file does not exist: {}", .path.display())]
    ComponentFileMissing { path: PathBuf },

    #[error("{}: {source}", .path.display())]
    Schema {
        path: PathBuf,
        #[source]
        source: SchemaError,
    },

    #[error("Duplicate {} key '{key}' in {}; keeping the first admitted entry", .entity.entity_name(), .path.display())]
    DuplicateKey {
        entity: Phase,
        key: String,
        path: PathBuf,
    },

    #[error("{}", not_found_message(.name, .path, .available))]
    CertificationNotFound {
        name: String,
        path: PathBuf,
        available: Vec<String>,
    },

    #[error("Loading {phase} was cancelled")]
    Cancelled { phase: Phase },

    #[error("A {phase} loader task failed: {message}")]
    TaskFailed { phase: Phase, message: String },
}

impl LoadError {
    pub fn directory_unreadable(path: &Path, err: &std::io::Error) -> Self {
        Self::DirectoryUnreadable {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    pub fn file_unreadable(path: &Path, err: &std::io::Error) -> Self {
        Self::FileUnreadable {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    pub fn component_file_missing(path: &Path) -> Self {
        Self::ComponentFileMissing {
            path: path.to_path_buf(),
        }
    }

    pub fn schema(path: &Path, source: SchemaError) -> Self {
        Self::Schema {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn duplicate_key(entity: Phase, key: impl Into<String>, path: &Path) -> Self {
        Self::DuplicateKey {
            entity,
            key: key.into(),
            path: path.to_path_buf(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LoadError::DirectoryUnreadable { .. } => ErrorKind::DirectoryUnreadable,
            LoadError::FileUnreadable { .. } => ErrorKind::FileUnreadable,
            LoadError::ComponentFileMissing { .. } => ErrorKind::ComponentFileMissing,
            LoadError::Schema { source, .. } => source.kind(),
            LoadError::DuplicateKey { .. } => ErrorKind::DuplicateKey,
            LoadError::CertificationNotFound { .. } => ErrorKind::CertificationNotFound,
            LoadError::Cancelled { .. } => ErrorKind::Cancelled,
            LoadError::TaskFailed { .. } => ErrorKind::TaskFailed,
        }
    }

    /// Stable numeric reason code, see [`ErrorKind::code`].
    pub fn code(&self) -> u32 {
        self.kind().code()
    }
}

fn not_found_message(name: &str, path: &Path, available: &[String]) -> String {
    let mut message = if name.is_empty() {
        "Missing certification argument".to_string()
    } else {
        format!("Certification '{}' not found: {} does not exist", name, path.display())
    };
    if available.is_empty() {
        message.push_str("\nNo certifications are available");
    } else {
        message.push_str("\nUse one of the following:");
        for candidate in available {
            message.push_str("\n  ");
            message.push_str(candidate);
        }
    }
    message
}

/// Result type for single-entity loader operations.
pub type LoadResult<T> = std::result::Result<T, LoadError>;

/// Ordered collection of load failures.
///
/// Display renders one failure per line, in the order they were recorded.
#[derive(Debug, Clone, Default)]
pub struct LoadErrors {
    errors: Vec<LoadError>,
}

impl LoadErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: LoadError) {
        self.errors.push(error);
    }

    pub fn extend(&mut self, other: LoadErrors) {
        self.errors.extend(other.errors);
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LoadError> {
        self.errors.iter()
    }

    /// Failures of one class, in recorded order.
    pub fn of_kind(&self, kind: ErrorKind) -> impl Iterator<Item = &LoadError> + '_ {
        self.errors.iter().filter(move |e| e.kind() == kind)
    }

    pub fn contains_kind(&self, kind: ErrorKind) -> bool {
        self.errors.iter().any(|e| e.kind() == kind)
    }

    pub fn into_vec(self) -> Vec<LoadError> {
        self.errors
    }
}

impl From<Vec<LoadError>> for LoadErrors {
    fn from(errors: Vec<LoadError>) -> Self {
        Self { errors }
    }
}

impl<'a> IntoIterator for &'a LoadErrors {
    type Item = &'a LoadError;
    type IntoIter = std::slice::Iter<'a, LoadError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl fmt::Display for LoadErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for LoadErrors {}

/// Reasons the gap analyzer refuses to run.
#[derive(Error, Debug, Clone)]
pub enum AnalysisError {
    #[error("{}", not_found_message(.name, .path, .available))]
    CertificationNotFound {
        name: String,
        path: PathBuf,
        available: Vec<String>,
    },

    #[error("Unable to load certification data:\n{errors}")]
    CertificationUnavailable { errors: LoadErrors },

    #[error("Unable to load component data:\n{errors}")]
    ComponentsUnavailable { errors: LoadErrors },
}

impl AnalysisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalysisError::CertificationNotFound { .. } => ErrorKind::CertificationNotFound,
            AnalysisError::CertificationUnavailable { errors }
            | AnalysisError::ComponentsUnavailable { errors } => errors
                .iter()
                .next()
                .map(LoadError::kind)
                .unwrap_or(ErrorKind::Cancelled),
        }
    }

    /// The underlying load failures, when the refusal came from loading.
    pub fn errors(&self) -> Option<&LoadErrors> {
        match self {
            AnalysisError::CertificationNotFound { .. } => None,
            AnalysisError::CertificationUnavailable { errors }
            | AnalysisError::ComponentsUnavailable { errors } => Some(errors),
        }
    }
}

impl From<LoadError> for AnalysisError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::CertificationNotFound {
                name,
                path,
                available,
            } => AnalysisError::CertificationNotFound {
                name,
                path,
                available,
            },
            other => AnalysisError::CertificationUnavailable {
                errors: LoadErrors::from(vec![other]),
            },
        }
    }
}

/// Failure while encoding or decoding a gap report.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("JSON serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("JSON deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),
}
