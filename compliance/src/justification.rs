//! Index from `standard@control` to the components claiming it.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::controls::{Component, ControlRef, Satisfies};

/// One component's claim on a control.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Justification {
    pub component_key: String,
    pub claim: Satisfies,
}

/// Built incrementally as components are admitted to the registry. Never
/// fed rejected duplicates.
#[derive(Debug, Default)]
pub struct JustificationIndex {
    mappings: BTreeMap<ControlRef, Vec<Justification>>,
}

impl JustificationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every claim of a newly admitted component.
    ///
    /// A component that claims the same pair twice is listed once, with its
    /// first claim.
    pub fn load_mappings(&mut self, component: &Component) {
        for claim in &component.satisfies {
            let justifications = self.mappings.entry(claim.control_ref()).or_default();
            if justifications
                .iter()
                .any(|j| j.component_key == component.key)
            {
                continue;
            }
            justifications.push(Justification {
                component_key: component.key.clone(),
                claim: claim.clone(),
            });
        }
    }

    pub fn get(&self, standard_key: &str, control_key: &str) -> &[Justification] {
        self.for_ref(&ControlRef::new(standard_key, control_key))
    }

    pub fn for_ref(&self, control: &ControlRef) -> &[Justification] {
        self.mappings
            .get(control)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Keys of the components claiming `control`, in admission order.
    pub fn components_for<'a>(&'a self, control: &ControlRef) -> impl Iterator<Item = &'a str> + 'a {
        self.for_ref(control).iter().map(|j| j.component_key.as_str())
    }

    /// Iterate pairs in `standard@control` order.
    pub fn iter(&self) -> impl Iterator<Item = (&ControlRef, &[Justification])> + '_ {
        self.mappings.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Number of distinct claimed pairs.
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}
