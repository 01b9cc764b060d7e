use chrono::Utc;

use crate::workflows::scholar::domain::{PublicationMarker, ReviewDecision, WorkflowState};
use crate::workflows::scholar::legacy::{
    self, publication_marker_from_legacy, publication_marker_to_legacy, LegacyDecodeError,
    LegacyWorkflowFields,
};

fn fields(owner: &str, status: &str, forward: Option<&str>) -> LegacyWorkflowFields {
    LegacyWorkflowFields {
        current_owner: owner.to_string(),
        status: status.to_string(),
        faculty_forward: forward.map(str::to_string),
        dept_review: None,
        rejection_reason: None,
    }
}

#[test]
fn encodes_sentinel_strings() {
    let pickup = legacy::encode(
        &WorkflowState::AwaitingCoordinatorPickup {
            faculty_label: "Engineering".to_string(),
        },
        None,
    );
    assert_eq!(pickup.current_owner, "director");
    assert_eq!(pickup.status, "Forwarded to Engineering");
    assert_eq!(pickup.faculty_forward, None);

    let returned = legacy::encode(
        &WorkflowState::ReturnedToCoordinator {
            department_code: "CSE".to_string(),
        },
        Some(&ReviewDecision::Rejected {
            reason: "Guide unavailable".to_string(),
        }),
    );
    assert_eq!(returned.current_owner, "research_coordinator");
    assert_eq!(returned.status, "FORWARDED_TO_CSE");
    assert_eq!(returned.faculty_forward.as_deref(), Some("Back_To_RC"));
    assert_eq!(returned.dept_review.as_deref(), Some("Rejected"));
    assert_eq!(returned.rejection_reason.as_deref(), Some("Guide unavailable"));
}

#[test]
fn every_state_survives_the_legacy_layout() {
    let states = [
        WorkflowState::Uploaded,
        WorkflowState::AwaitingCoordinatorPickup {
            faculty_label: "Science".to_string(),
        },
        WorkflowState::WithCoordinator {
            faculty_label: "Science".to_string(),
        },
        WorkflowState::WithDepartment {
            department_code: "CHEM".to_string(),
        },
        WorkflowState::ReturnedToCoordinator {
            department_code: "CHEM".to_string(),
        },
        WorkflowState::ReturnedToDirector {
            department_code: "CHEM".to_string(),
        },
    ];
    let review = ReviewDecision::Queried {
        question: "Attach NOC".to_string(),
    };

    for state in states {
        let encoded = legacy::encode(&state, Some(&review));
        let (decoded, decoded_review) = legacy::decode(&encoded).expect("decodes");
        assert_eq!(decoded, state);
        assert_eq!(decoded_review.as_ref(), Some(&review));
    }
}

#[test]
fn decodes_back_to_coordinator_marker() {
    let (state, review) =
        legacy::decode(&fields("research_coordinator", "FORWARDED_TO_BME", Some("Back_To_RC")))
            .expect("decodes");
    assert_eq!(
        state,
        WorkflowState::ReturnedToCoordinator {
            department_code: "BME".to_string()
        }
    );
    assert_eq!(review, None);
}

#[test]
fn refuses_contradictory_columns() {
    let error = legacy::decode(&fields("department", "FORWARDED_TO_BME", Some("Back_To_RC")))
        .expect_err("department cannot hold a returned record");
    assert!(matches!(error, LegacyDecodeError::InconsistentState { .. }));

    let error = legacy::decode(&fields("director", "FORWARDED_TO_BME", Some("Back_To_RC")))
        .expect_err("director with coordinator marker");
    assert!(matches!(error, LegacyDecodeError::InconsistentState { .. }));

    let error = legacy::decode(&fields("registrar", "uploaded", None)).expect_err("unknown owner");
    assert_eq!(error, LegacyDecodeError::UnknownOwner("registrar".to_string()));
}

#[test]
fn decodes_free_text_decisions() {
    let mut rejected = fields("department", "FORWARDED_TO_BME", None);
    rejected.dept_review = Some("Rejected".to_string());
    rejected.rejection_reason = Some("  Incomplete transcripts ".to_string());
    let (_, review) = legacy::decode(&rejected).expect("decodes");
    assert_eq!(
        review,
        Some(ReviewDecision::Rejected {
            reason: "Incomplete transcripts".to_string()
        })
    );

    let mut approved = fields("department", "FORWARDED_TO_BME", None);
    approved.dept_review = Some("Approved".to_string());
    let (_, review) = legacy::decode(&approved).expect("decodes");
    assert_eq!(review, Some(ReviewDecision::Approved { remarks: None }));

    let mut garbled = fields("department", "FORWARDED_TO_BME", None);
    garbled.dept_review = Some("maybe later".to_string());
    assert!(matches!(
        legacy::decode(&garbled),
        Err(LegacyDecodeError::UnknownDecision(_))
    ));
}

#[test]
fn publication_markers_use_department_codes() {
    let marker = PublicationMarker {
        department_code: "CSE".to_string(),
        published_at: Utc::now(),
    };
    assert_eq!(publication_marker_to_legacy(&marker), "Published_To_CSE");

    let parsed =
        publication_marker_from_legacy("Published_To_CSE", marker.published_at).expect("parses");
    assert_eq!(parsed, marker);

    assert!(publication_marker_from_legacy("Published_To_", Utc::now()).is_err());
    assert!(publication_marker_from_legacy("Published", Utc::now()).is_err());
}
