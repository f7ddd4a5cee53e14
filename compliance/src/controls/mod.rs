//! Control catalog types shared by the loader and the gap analyzer.

pub mod certification;
pub mod component;

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize, Serializer};

pub use certification::Certification;
pub use component::{Component, CoveredBy, NarrativeSection, Parameter, Reference, Satisfies};

/// A single requirement within a standard.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Control {
    /// Control key within its standard (e.g. "AC-2").
    pub id: String,
    /// Human-readable control name.
    #[serde(default)]
    pub name: String,
    /// Control family (e.g. "AC" for access control).
    #[serde(default)]
    pub family: String,
    /// Requirement text.
    #[serde(default)]
    pub description: String,
}

impl Control {
    /// A control known only by its key, as certifications usually list them.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

/// A named catalog of controls (e.g. NIST-800-53).
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Standard {
    pub key: String,
    pub controls: BTreeMap<String, Control>,
}

impl Standard {
    pub fn control(&self, control_key: &str) -> Option<&Control> {
        self.controls.get(control_key)
    }
}

/// Composite `standard@control` key.
///
/// Identity, ordering and hashing use the composite string alone, which is
/// also the order reports are printed in. Refs that render the same text
/// (`A@B` + `C` and `A` + `B@C`) are the same key.
#[derive(Debug, Clone)]
pub struct ControlRef {
    composite: String,
    split: usize,
}

impl ControlRef {
    pub fn new(standard_key: &str, control_key: &str) -> Self {
        Self {
            composite: format!("{}@{}", standard_key, control_key),
            split: standard_key.len(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.composite
    }

    pub fn standard_key(&self) -> &str {
        &self.composite[..self.split]
    }

    pub fn control_key(&self) -> &str {
        &self.composite[self.split + 1..]
    }
}

impl PartialEq for ControlRef {
    fn eq(&self, other: &Self) -> bool {
        self.composite == other.composite
    }
}

impl Eq for ControlRef {}

impl PartialOrd for ControlRef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ControlRef {
    fn cmp(&self, other: &Self) -> Ordering {
        self.composite.cmp(&other.composite)
    }
}

impl Hash for ControlRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.composite.hash(state);
    }
}

impl fmt::Display for ControlRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.composite)
    }
}

impl Serialize for ControlRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.composite)
    }
}
