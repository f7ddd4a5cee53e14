//! JSON serialization for gap reports.

use super::GapReport;
use crate::error::ExportError;
use crate::gap::GapResult;

/// Serialize a [`GapResult`] as a pretty-printed [`GapReport`].
pub fn to_json(result: &GapResult) -> Result<String, ExportError> {
    report_to_json(&GapReport::from_result(result))
}

pub fn report_to_json(report: &GapReport) -> Result<String, ExportError> {
    serde_json::to_string_pretty(report).map_err(ExportError::Serialization)
}

/// Deserialize a [`GapReport`] from JSON.
pub fn from_json(json: &str) -> Result<GapReport, ExportError> {
    serde_json::from_str(json).map_err(ExportError::Deserialization)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::Control;
    use crate::error::LoadErrors;
    use std::collections::BTreeMap;

    fn result() -> GapResult {
        let mut missing = BTreeMap::new();
        missing.insert(
            crate::controls::ControlRef::new("NIST-800-53", "AC-2"),
            Control::with_id("AC-2"),
        );
        GapResult {
            certification: "LATO".to_string(),
            master_controls: missing.clone(),
            satisfied_controls: BTreeMap::new(),
            missing_controls: missing,
            degraded: false,
            warnings: LoadErrors::new(),
        }
    }

    #[test]
    fn test_json_shape() {
        let json = to_json(&result()).unwrap();
        assert!(json.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["certification"], "LATO");
        assert_eq!(value["missing_controls"][0], "NIST-800-53@AC-2");
        assert_eq!(value["degraded"], false);
        // Empty warnings are omitted.
        assert!(value.get("warnings").is_none());
    }

    #[test]
    fn test_from_json_reads_back_report() {
        let json = to_json(&result()).unwrap();
        let report = from_json(&json).unwrap();
        assert_eq!(report.required_controls, 1);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            from_json("{\"certification\": 3}"),
            Err(ExportError::Deserialization(_))
        ));
    }
}
