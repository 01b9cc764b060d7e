use std::collections::BTreeMap;

use crate::workflows::scholar::checklist::{
    ChecklistError, ChecklistFreeze, ChecklistItem, ChecklistState, DocumentStatus,
    RequirementKind,
};

const MANDATORY: [&str; 5] = [
    "application_form",
    "degree_certificates",
    "mark_sheets",
    "identity_proof",
    "research_proposal",
];

fn open() -> ChecklistFreeze {
    ChecklistFreeze::from_application(None, false)
}

#[test]
fn defaults_start_pending() {
    let checklist = ChecklistState::default();

    assert_eq!(checklist.items().len(), 8);
    assert!(!checklist.is_complete());
    assert_eq!(checklist.pending_mandatory().len(), MANDATORY.len());
    assert!(checklist
        .items()
        .values()
        .all(|item| item.status == DocumentStatus::Pending && !item.checked));
}

#[test]
fn completes_once_mandatory_items_are_verified() {
    let mut checklist = ChecklistState::default();
    for key in MANDATORY {
        checklist.set_item(key, true, open()).expect("item updates");
    }

    assert!(checklist.is_complete());
    assert!(checklist.pending_mandatory().is_empty());
    assert_eq!(
        checklist
            .get("community_certificate")
            .map(|item| item.status),
        Some(DocumentStatus::Pending)
    );

    checklist
        .set_item("identity_proof", false, open())
        .expect("item can be unchecked");
    assert!(!checklist.is_complete());
}

#[test]
fn freezes_after_verification_or_eligibility() {
    assert!(ChecklistFreeze::from_application(Some("Verified"), false).is_frozen());
    assert!(ChecklistFreeze::from_application(Some(" completed "), false).is_frozen());
    assert!(ChecklistFreeze::from_application(None, true).is_frozen());
    assert!(!ChecklistFreeze::from_application(Some("in progress"), false).is_frozen());

    let mut checklist = ChecklistState::default();
    let frozen = ChecklistFreeze::from_application(Some("approved"), false);
    assert_eq!(
        checklist.set_item("application_form", true, frozen),
        Err(ChecklistError::Frozen)
    );
    assert_eq!(checklist, ChecklistState::default());
}

#[test]
fn unknown_items_are_rejected() {
    let mut checklist = ChecklistState::default();
    assert_eq!(
        checklist.set_item("passport_photo", true, open()),
        Err(ChecklistError::UnknownItem("passport_photo".to_string()))
    );
}

#[test]
fn persisted_partial_map_merges_over_defaults() {
    let stored = r#"{
        "application_form": {
            "label": "Application Form",
            "status": "verified",
            "checked": true,
            "type": "mandatory"
        },
        "guide_consent": {
            "label": "Guide Consent Letter",
            "status": "pending",
            "checked": false,
            "type": "optional"
        }
    }"#;

    let checklist: ChecklistState = serde_json::from_str(stored).expect("checklist parses");

    assert_eq!(checklist.items().len(), 9);
    assert_eq!(
        checklist.get("application_form").map(|item| item.status),
        Some(DocumentStatus::Verified)
    );
    assert_eq!(
        checklist.get("mark_sheets").map(|item| item.kind),
        Some(RequirementKind::Mandatory)
    );
    assert!(checklist.get("guide_consent").is_some());
}

#[test]
fn merged_prefers_persisted_entries() {
    let mut persisted = BTreeMap::new();
    persisted.insert(
        "research_proposal".to_string(),
        ChecklistItem {
            label: "Synopsis".to_string(),
            status: DocumentStatus::Verified,
            checked: true,
            kind: RequirementKind::Mandatory,
        },
    );

    let checklist = ChecklistState::merged(Some(&persisted));
    let item = checklist.get("research_proposal").expect("item present");
    assert_eq!(item.label, "Synopsis");
    assert!(item.checked);
}
