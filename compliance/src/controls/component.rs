//! Components and the controls they claim to satisfy.

use serde::{Deserialize, Serialize};

use super::ControlRef;

/// A unit of software or process documented in the workspace.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Component {
    /// Registry key. Defaults to the component's directory name.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Normalised schema version the descriptor was parsed with.
    pub schema_version: String,
    pub responsible_role: Option<String>,
    pub references: Vec<Reference>,
    /// Claims in declaration order.
    pub satisfies: Vec<Satisfies>,
}

impl Component {
    /// Composite keys of every claim, in declaration order.
    pub fn control_refs(&self) -> impl Iterator<Item = ControlRef> + '_ {
        self.satisfies.iter().map(Satisfies::control_ref)
    }
}

/// A component's claim that it addresses one control of one standard.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Satisfies {
    pub standard_key: String,
    pub control_key: String,
    pub narrative: Vec<NarrativeSection>,
    pub implementation_statuses: Vec<String>,
    pub control_origins: Vec<String>,
    pub parameters: Vec<Parameter>,
    pub covered_by: Vec<CoveredBy>,
}

impl Satisfies {
    pub fn control_ref(&self) -> ControlRef {
        ControlRef::new(&self.standard_key, &self.control_key)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct NarrativeSection {
    #[serde(default)]
    pub key: Option<String>,
    pub text: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameter {
    pub key: String,
    #[serde(default)]
    pub text: String,
}

/// Pointer to a verification artifact backing a claim.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct CoveredBy {
    #[serde(default)]
    pub system_key: Option<String>,
    #[serde(default)]
    pub component_key: Option<String>,
    pub verification_key: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Reference {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}
