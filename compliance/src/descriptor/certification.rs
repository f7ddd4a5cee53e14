//! Certification descriptors (`certifications/<name>.yaml`).
//!
//! Each standard entry lists its required controls either under a
//! `controls` mapping or directly:
//!
//! ```yaml
//! standards:
//!   NIST-800-53:
//!     controls:
//!       AC-2: {}
//!   PCI-DSS:
//!     "1.1": {}
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_yaml::Value;

use super::scalar::Scalar;
use super::standard::{map_controls, RawControl};
use super::{check_catalog_version, decode, non_empty, parse_document};
use crate::controls::{Certification, Control};
use crate::error::SchemaError;

#[derive(Deserialize)]
struct RawCertification {
    key: Option<Scalar>,
    name: Option<Scalar>,
    standards: Option<BTreeMap<Scalar, Value>>,
}

/// Parse a certification descriptor.
///
/// The returned certification's `key` is empty when the descriptor declares
/// neither `key` nor `name`; the loader fills it from the file stem.
pub fn parse_certification(bytes: &[u8]) -> Result<Certification, SchemaError> {
    let doc = parse_document(bytes)?;
    check_catalog_version(&doc)?;
    let raw: RawCertification = decode(doc)?;

    let standards = raw
        .standards
        .ok_or_else(|| SchemaError::missing_field("standards"))?
        .into_iter()
        .map(|(standard_key, body)| {
            let standard_key = String::from(standard_key);
            let controls = required_controls(&standard_key, body)?;
            Ok((standard_key, controls))
        })
        .collect::<Result<BTreeMap<_, _>, SchemaError>>()?;

    Ok(Certification {
        key: non_empty(raw.key.map(String::from))
            .or(non_empty(raw.name.map(String::from)))
            .unwrap_or_default(),
        standards,
    })
}

fn required_controls(
    standard_key: &str,
    body: Value,
) -> Result<BTreeMap<String, Control>, SchemaError> {
    let controls = match body {
        Value::Null => return Ok(BTreeMap::new()),
        Value::Mapping(mut mapping) => match mapping.remove("controls") {
            Some(nested @ Value::Mapping(_)) => nested,
            Some(Value::Null) => return Ok(BTreeMap::new()),
            Some(other) => {
                mapping.insert(Value::from("controls"), other);
                Value::Mapping(mapping)
            }
            None => Value::Mapping(mapping),
        },
        _ => {
            return Err(SchemaError::malformed(format!(
                "standards.{} must be a mapping of controls",
                standard_key
            )))
        }
    };

    let raw: BTreeMap<Scalar, Option<RawControl>> =
        serde_yaml::from_value(controls).map_err(|e| {
            SchemaError::malformed(format!("standards.{}: {}", standard_key, e))
        })?;
    Ok(map_controls(raw))
}
