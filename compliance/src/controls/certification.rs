//! Certifications: the subset of each standard's controls that must be met.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Control, ControlRef};

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Certification {
    /// Certification name. Defaults to the descriptor's file stem.
    pub key: String,
    /// standard key -> required control key -> control.
    pub standards: BTreeMap<String, BTreeMap<String, Control>>,
}

impl Certification {
    /// Every required control with its composite key, standards in key order.
    pub fn required_controls(&self) -> impl Iterator<Item = (ControlRef, &Control)> + '_ {
        self.standards.iter().flat_map(|(standard_key, controls)| {
            controls
                .iter()
                .map(move |(control_key, control)| (ControlRef::new(standard_key, control_key), control))
        })
    }

    pub fn requires(&self, standard_key: &str, control_key: &str) -> bool {
        self.standards
            .get(standard_key)
            .is_some_and(|controls| controls.contains_key(control_key))
    }

    /// Number of required standard/control pairs.
    pub fn len(&self) -> usize {
        self.standards.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
