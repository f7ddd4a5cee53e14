//! Standard descriptors (`standards/<name>.yaml`).

use std::collections::BTreeMap;

use serde::Deserialize;

use super::scalar::Scalar;
use super::{check_catalog_version, decode, non_empty, parse_document, require};
use crate::controls::{Control, Standard};
use crate::error::SchemaError;

#[derive(Deserialize)]
struct RawStandard {
    key: Option<Scalar>,
    name: Option<Scalar>,
    controls: Option<BTreeMap<Scalar, Option<RawControl>>>,
}

/// Control body as written in standards and certifications. Every field is
/// optional; `controls: {AC-2: }` is a valid entry.
#[derive(Deserialize, Default)]
pub(super) struct RawControl {
    name: Option<String>,
    family: Option<String>,
    description: Option<String>,
}

impl RawControl {
    pub(super) fn into_control(self, id: &str) -> Control {
        Control {
            id: id.to_string(),
            name: non_empty(self.name).unwrap_or_default(),
            family: non_empty(self.family).unwrap_or_default(),
            description: non_empty(self.description).unwrap_or_default(),
        }
    }
}

pub(super) fn map_controls(raw: BTreeMap<Scalar, Option<RawControl>>) -> BTreeMap<String, Control> {
    raw.into_iter()
        .map(|(id, body)| {
            let id = String::from(id);
            let control = body.unwrap_or_default().into_control(&id);
            (id, control)
        })
        .collect()
}

/// Parse a standard descriptor. `name` is accepted in place of `key`.
pub fn parse_standard(bytes: &[u8]) -> Result<Standard, SchemaError> {
    let doc = parse_document(bytes)?;
    check_catalog_version(&doc)?;
    let raw: RawStandard = decode(doc)?;

    let key = require(
        non_empty(raw.key.map(String::from)).or(raw.name.map(String::from)),
        "key",
    )?;
    let controls = raw
        .controls
        .ok_or_else(|| SchemaError::missing_field("controls"))?;

    Ok(Standard {
        key,
        controls: map_controls(controls),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_parse_standard() {
        let yaml = br#"
key: NIST-800-53
controls:
  AC-2:
    family: AC
    name: Account Management
    description: The organization manages information system accounts.
  AC-3:
"#;
        let standard = parse_standard(yaml).unwrap();
        assert_eq!(standard.key, "NIST-800-53");
        assert_eq!(standard.controls.len(), 2);
        let ac2 = standard.control("AC-2").unwrap();
        assert_eq!(ac2.id, "AC-2");
        assert_eq!(ac2.family, "AC");
        assert_eq!(standard.control("AC-3").unwrap().name, "");
    }

    #[test]
    fn test_name_is_an_alias_for_key() {
        let standard = parse_standard(b"name: PCI-DSS\ncontrols: {}\n").unwrap();
        assert_eq!(standard.key, "PCI-DSS");
    }

    #[test]
    fn test_required_fields() {
        let err = parse_standard(b"controls: {}\n").unwrap_err();
        assert_eq!(err, SchemaError::missing_field("key"));

        let err = parse_standard(b"key: NIST-800-53\n").unwrap_err();
        assert_eq!(err, SchemaError::missing_field("controls"));
    }

    #[test]
    fn test_unquoted_numeric_keys() {
        let yaml = b"key: 3\ncontrols:\n  1.1:\n    name: Firewall configuration\n  10:\n  10.2.1:\n";
        let standard = parse_standard(yaml).unwrap();
        assert_eq!(standard.key, "3");
        let keys: Vec<&str> = standard.controls.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["1.1", "10", "10.2.1"]);
        assert_eq!(standard.control("1.1").unwrap().id, "1.1");
        assert_eq!(standard.control("1.1").unwrap().name, "Firewall configuration");
    }

    #[test]
    fn test_catalog_version() {
        assert!(parse_standard(b"schema_version: 1.0.0\nkey: S\ncontrols: {}\n").is_ok());
        let err = parse_standard(b"schema_version: 2.0.0\nkey: S\ncontrols: {}\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedSchemaVersion);
    }
}
