//! Component descriptors (`component.yaml`).
//!
//! Supported schema versions and how their `satisfies` entries differ:
//!
//! | version | narrative             | status / origin                               |
//! |---------|-----------------------|-----------------------------------------------|
//! | 2.0.0   | single string         | `implementation_status`, `control_origin`     |
//! | 3.0.0   | list of `{key, text}` | `implementation_status`, `control_origin`     |
//! | 3.1.0   | list of `{key, text}` | `implementation_statuses`, `control_origins`  |

use serde::Deserialize;

use super::scalar::Scalar;
use super::{decode, non_empty, parse_document, require, schema_version};
use crate::controls::{Component, CoveredBy, NarrativeSection, Parameter, Reference, Satisfies};
use crate::error::SchemaError;

/// Parse a component descriptor.
///
/// The returned component's `key` is empty when the descriptor omits it;
/// the loader fills it from the directory name.
pub fn parse_component(bytes: &[u8]) -> Result<Component, SchemaError> {
    let doc = parse_document(bytes)?;
    let version =
        schema_version(&doc)?.ok_or_else(|| SchemaError::missing_field("schema_version"))?;
    let schema = ComponentSchema::decode(&version, doc)?;
    schema.into_component(version)
}

/// A component document decoded with the rules of one schema version.
#[derive(Debug)]
pub enum ComponentSchema {
    V2_0(RawComponent<SatisfiesV2_0>),
    V3_0(RawComponent<SatisfiesV3_0>),
    V3_1(RawComponent<SatisfiesV3_1>),
}

impl ComponentSchema {
    pub const SUPPORTED_VERSIONS: [&'static str; 3] = ["2.0.0", "3.0.0", "3.1.0"];

    /// Decode `doc` with the field rules for `version` (already normalised).
    pub fn decode(version: &str, doc: serde_yaml::Mapping) -> Result<Self, SchemaError> {
        match version {
            "2.0.0" => decode(doc).map(Self::V2_0),
            "3.0.0" => decode(doc).map(Self::V3_0),
            "3.1.0" => decode(doc).map(Self::V3_1),
            other => Err(SchemaError::unsupported_version(other)),
        }
    }

    pub fn into_component(self, version: String) -> Result<Component, SchemaError> {
        match self {
            Self::V2_0(raw) => raw.into_component(version, SatisfiesV2_0::map),
            Self::V3_0(raw) => raw.into_component(version, SatisfiesV3_0::map),
            Self::V3_1(raw) => raw.into_component(version, SatisfiesV3_1::map),
        }
    }
}

/// Fields common to every component schema version.
#[derive(Deserialize, Debug)]
pub struct RawComponent<S> {
    #[serde(default)]
    key: Option<Scalar>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    responsible_role: Option<String>,
    #[serde(default)]
    references: Vec<Reference>,
    #[serde(default = "Vec::new")]
    satisfies: Vec<S>,
}

impl<S> RawComponent<S> {
    fn into_component(
        self,
        schema_version: String,
        map: fn(S, usize) -> Result<Satisfies, SchemaError>,
    ) -> Result<Component, SchemaError> {
        let satisfies = self
            .satisfies
            .into_iter()
            .enumerate()
            .map(|(index, entry)| map(entry, index))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Component {
            key: non_empty(self.key.map(String::from)).unwrap_or_default(),
            name: non_empty(self.name).unwrap_or_default(),
            schema_version,
            responsible_role: non_empty(self.responsible_role),
            references: self.references,
            satisfies,
        })
    }
}

fn claim_keys(
    standard_key: Option<Scalar>,
    control_key: Option<Scalar>,
    index: usize,
) -> Result<(String, String), SchemaError> {
    Ok((
        require(
            standard_key.map(String::from),
            &format!("satisfies[{}].standard_key", index),
        )?,
        require(
            control_key.map(String::from),
            &format!("satisfies[{}].control_key", index),
        )?,
    ))
}

fn single(value: Option<String>) -> Vec<String> {
    non_empty(value).into_iter().collect()
}

#[derive(Deserialize, Debug)]
pub struct SatisfiesV2_0 {
    standard_key: Option<Scalar>,
    control_key: Option<Scalar>,
    narrative: Option<String>,
    implementation_status: Option<String>,
    control_origin: Option<String>,
    #[serde(default)]
    parameters: Vec<Parameter>,
    #[serde(default)]
    covered_by: Vec<CoveredBy>,
}

impl SatisfiesV2_0 {
    fn map(self, index: usize) -> Result<Satisfies, SchemaError> {
        let (standard_key, control_key) = claim_keys(self.standard_key, self.control_key, index)?;
        let narrative = non_empty(self.narrative)
            .map(|text| vec![NarrativeSection { key: None, text }])
            .unwrap_or_default();
        Ok(Satisfies {
            standard_key,
            control_key,
            narrative,
            implementation_statuses: single(self.implementation_status),
            control_origins: single(self.control_origin),
            parameters: self.parameters,
            covered_by: self.covered_by,
        })
    }
}

#[derive(Deserialize, Debug)]
pub struct SatisfiesV3_0 {
    standard_key: Option<Scalar>,
    control_key: Option<Scalar>,
    #[serde(default)]
    narrative: Vec<NarrativeSection>,
    implementation_status: Option<String>,
    control_origin: Option<String>,
    #[serde(default)]
    parameters: Vec<Parameter>,
    #[serde(default)]
    covered_by: Vec<CoveredBy>,
}

impl SatisfiesV3_0 {
    fn map(self, index: usize) -> Result<Satisfies, SchemaError> {
        let (standard_key, control_key) = claim_keys(self.standard_key, self.control_key, index)?;
        Ok(Satisfies {
            standard_key,
            control_key,
            narrative: self.narrative,
            implementation_statuses: single(self.implementation_status),
            control_origins: single(self.control_origin),
            parameters: self.parameters,
            covered_by: self.covered_by,
        })
    }
}

#[derive(Deserialize, Debug)]
pub struct SatisfiesV3_1 {
    standard_key: Option<Scalar>,
    control_key: Option<Scalar>,
    #[serde(default)]
    narrative: Vec<NarrativeSection>,
    #[serde(default)]
    implementation_statuses: Vec<String>,
    #[serde(default)]
    control_origins: Vec<String>,
    #[serde(default)]
    parameters: Vec<Parameter>,
    #[serde(default)]
    covered_by: Vec<CoveredBy>,
}

impl SatisfiesV3_1 {
    fn map(self, index: usize) -> Result<Satisfies, SchemaError> {
        let (standard_key, control_key) = claim_keys(self.standard_key, self.control_key, index)?;
        Ok(Satisfies {
            standard_key,
            control_key,
            narrative: self.narrative,
            implementation_statuses: self.implementation_statuses,
            control_origins: self.control_origins,
            parameters: self.parameters,
            covered_by: self.covered_by,
        })
    }
}
