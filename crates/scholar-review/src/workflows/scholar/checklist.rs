use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Pending,
    Verified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementKind {
    Mandatory,
    Optional,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub label: String,
    pub status: DocumentStatus,
    pub checked: bool,
    #[serde(rename = "type")]
    pub kind: RequirementKind,
}

const DOCUMENT_DEFAULTS: &[(&str, &str, RequirementKind)] = &[
    ("application_form", "Application Form", RequirementKind::Mandatory),
    ("degree_certificates", "Degree Certificates", RequirementKind::Mandatory),
    ("mark_sheets", "Consolidated Mark Sheets", RequirementKind::Mandatory),
    ("identity_proof", "Identity Proof", RequirementKind::Mandatory),
    ("research_proposal", "Research Proposal", RequirementKind::Mandatory),
    ("community_certificate", "Community Certificate", RequirementKind::Optional),
    ("experience_certificate", "Experience Certificate", RequirementKind::Optional),
    ("no_objection_certificate", "No Objection Certificate", RequirementKind::Optional),
];

const FROZEN_STATUSES: &[&str] = &["completed", "verified", "approved"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChecklistError {
    #[error("checklist is frozen once verification is complete")]
    Frozen,
    #[error("unknown checklist item '{0}'")]
    UnknownItem(String),
}

/// Verification lock derived from the owning application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecklistFreeze(bool);

impl ChecklistFreeze {
    pub fn from_application(verification_status: Option<&str>, eligibility_confirmed: bool) -> Self {
        let status_frozen = verification_status
            .map(|status| {
                let status = status.trim();
                FROZEN_STATUSES
                    .iter()
                    .any(|frozen| status.eq_ignore_ascii_case(frozen))
            })
            .unwrap_or(false);
        Self(status_frozen || eligibility_confirmed)
    }

    pub fn is_frozen(self) -> bool {
        self.0
    }
}

/// Per-scholar document checklist keyed by document id. Deserialising a stored partial map
/// merges it over the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, ChecklistItem>",
    into = "BTreeMap<String, ChecklistItem>"
)]
pub struct ChecklistState {
    items: BTreeMap<String, ChecklistItem>,
}

impl From<BTreeMap<String, ChecklistItem>> for ChecklistState {
    fn from(persisted: BTreeMap<String, ChecklistItem>) -> Self {
        Self::merged(Some(&persisted))
    }
}

impl From<ChecklistState> for BTreeMap<String, ChecklistItem> {
    fn from(state: ChecklistState) -> Self {
        state.items
    }
}

impl Default for ChecklistState {
    fn default() -> Self {
        Self::merged(None)
    }
}

impl ChecklistState {
    /// Defaults overlaid with whatever was persisted. Persisted keys win; keys added to the
    /// defaults later always show up.
    pub fn merged(persisted: Option<&BTreeMap<String, ChecklistItem>>) -> Self {
        let mut items: BTreeMap<String, ChecklistItem> = DOCUMENT_DEFAULTS
            .iter()
            .map(|(key, label, kind)| {
                (
                    key.to_string(),
                    ChecklistItem {
                        label: label.to_string(),
                        status: DocumentStatus::Pending,
                        checked: false,
                        kind: *kind,
                    },
                )
            })
            .collect();

        if let Some(persisted) = persisted {
            for (key, item) in persisted {
                items.insert(key.clone(), item.clone());
            }
        }

        Self { items }
    }

    pub fn items(&self) -> &BTreeMap<String, ChecklistItem> {
        &self.items
    }

    pub fn get(&self, key: &str) -> Option<&ChecklistItem> {
        self.items.get(key)
    }

    pub fn set_item(
        &mut self,
        key: &str,
        verified: bool,
        freeze: ChecklistFreeze,
    ) -> Result<(), ChecklistError> {
        if freeze.is_frozen() {
            return Err(ChecklistError::Frozen);
        }

        let item = self
            .items
            .get_mut(key)
            .ok_or_else(|| ChecklistError::UnknownItem(key.to_string()))?;
        item.checked = verified;
        item.status = if verified {
            DocumentStatus::Verified
        } else {
            DocumentStatus::Pending
        };
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.items
            .values()
            .filter(|item| item.kind == RequirementKind::Mandatory)
            .all(|item| item.status == DocumentStatus::Verified)
    }

    pub fn pending_mandatory(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter(|(_, item)| {
                item.kind == RequirementKind::Mandatory && item.status == DocumentStatus::Pending
            })
            .map(|(key, _)| key.as_str())
            .collect()
    }
}
