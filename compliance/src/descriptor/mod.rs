//! Descriptor parsing for components, standards and certifications.
//!
//! Descriptors are YAML (JSON is accepted as a YAML subset). Each kind
//! dispatches on its `schema_version` field to version-specific mapping
//! rules; an unknown version is rejected, never parsed best-effort.
//!
//! All functions here are pure and may be called from any number of loader
//! tasks at once.

pub mod certification;
pub mod component;
mod scalar;
pub mod standard;

use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};

use crate::controls::{Certification, Component, Standard};
use crate::error::SchemaError;

pub use certification::parse_certification;
pub use component::{parse_component, ComponentSchema};
pub use standard::parse_standard;

/// Schema version assumed for standards and certifications that omit one.
pub const CATALOG_SCHEMA_VERSION: &str = "1.0.0";

/// The entity a descriptor is expected to describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorKind {
    Component,
    Standard,
    Certification,
}

/// A parsed descriptor of any kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Descriptor {
    Component(Component),
    Standard(Standard),
    Certification(Certification),
}

/// Parse raw descriptor bytes as the given kind.
pub fn parse_descriptor(bytes: &[u8], kind: DescriptorKind) -> Result<Descriptor, SchemaError> {
    match kind {
        DescriptorKind::Component => parse_component(bytes).map(Descriptor::Component),
        DescriptorKind::Standard => parse_standard(bytes).map(Descriptor::Standard),
        DescriptorKind::Certification => {
            parse_certification(bytes).map(Descriptor::Certification)
        }
    }
}

/// Parse bytes into a top-level YAML mapping.
fn parse_document(bytes: &[u8]) -> Result<Mapping, SchemaError> {
    match serde_yaml::from_slice::<Value>(bytes)? {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Err(SchemaError::malformed("descriptor is empty")),
        other => Err(SchemaError::malformed(format!(
            "expected a mapping at the top level, found {}",
            value_kind(&other)
        ))),
    }
}

/// Decode a whole document into a version-specific raw shape.
fn decode<T: DeserializeOwned>(doc: Mapping) -> Result<T, SchemaError> {
    serde_yaml::from_value(Value::Mapping(doc)).map_err(SchemaError::from)
}

/// Read `schema_version` from a document, normalised to `major.minor.patch`.
///
/// Returns `Ok(None)` when the field is absent or null. An unquoted
/// fractional version is rejected: YAML reads `3.10` as the float `3.1`, so
/// its written form cannot be recovered.
fn schema_version(doc: &Mapping) -> Result<Option<String>, SchemaError> {
    let raw = match doc.get("schema_version") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) if n.is_u64() => n.to_string(),
        Some(Value::Number(n)) => {
            return Err(SchemaError::malformed(format!(
                "schema_version {} is a number; write it as a quoted string",
                n
            )))
        }
        Some(other) => {
            return Err(SchemaError::malformed(format!(
                "schema_version must be a string, found {}",
                value_kind(other)
            )))
        }
    };
    normalize_version(&raw).map(Some)
}

/// `"2"`, `"2.0"` and `"2.0.0"` all normalise to `"2.0.0"`.
fn normalize_version(raw: &str) -> Result<String, SchemaError> {
    let trimmed = raw.trim().trim_start_matches(['v', 'V']);
    let parts: Vec<&str> = trimmed.split('.').collect();
    if trimmed.is_empty() || parts.len() > 3 {
        return Err(SchemaError::unsupported_version(raw));
    }
    let mut numbers = [0u64; 3];
    for (slot, part) in numbers.iter_mut().zip(&parts) {
        *slot = part
            .parse()
            .map_err(|_| SchemaError::unsupported_version(raw))?;
    }
    Ok(format!("{}.{}.{}", numbers[0], numbers[1], numbers[2]))
}

/// Standards and certifications share a single supported version.
fn check_catalog_version(doc: &Mapping) -> Result<String, SchemaError> {
    match schema_version(doc)? {
        None => Ok(CATALOG_SCHEMA_VERSION.to_string()),
        Some(v) if v == CATALOG_SCHEMA_VERSION => Ok(v),
        Some(v) => Err(SchemaError::unsupported_version(v)),
    }
}

/// Treat a missing or blank string as absent.
fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn require(value: Option<String>, field: &str) -> Result<String, SchemaError> {
    non_empty(value).ok_or_else(|| SchemaError::missing_field(field))
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
