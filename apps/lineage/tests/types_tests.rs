//! Unit tests for API types serialization/deserialization.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use lineage::api::{
    CreatePersonRequest, DeleteResponse, ErrorResponse, ExportResponse, FamilyResponse,
    HealthResponse, PersonJson, PersonQuery, PersonResponse, StatusResponse,
};
use lineage_core::{Gender, LineageError, Person, PersonDraft, PersonId};

fn person(id: i64, name: &str, gender: Option<Gender>) -> Person {
    let mut draft = PersonDraft::new(name);
    draft.gender = gender;
    Person::from_draft(PersonId(id), draft)
}

// =============================================================================
// HEALTH / STATUS TESTS
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[test]
fn test_status_response_serialization() {
    let status = StatusResponse {
        person_count: 12,
        next_id: 15,
        backend: "redb".to_string(),
    };

    let json = serde_json::to_string(&status).unwrap();
    assert!(json.contains("\"person_count\":12"));
    assert!(json.contains("\"next_id\":15"));
    assert!(json.contains("\"backend\":\"redb\""));
}

// =============================================================================
// PERSON JSON TESTS
// =============================================================================

#[test]
fn test_person_json_uses_exact_gender_labels() {
    let male = PersonJson::from(&person(1, "A", Some(Gender::Male)));
    let female = PersonJson::from(&person(2, "B", Some(Gender::Female)));
    let other = PersonJson::from(&person(3, "C", Some(Gender::Other("Agender".to_string()))));
    let unknown = PersonJson::from(&person(4, "D", None));

    assert_eq!(male.gender.as_deref(), Some("Male"));
    assert_eq!(female.gender.as_deref(), Some("Female"));
    assert_eq!(other.gender.as_deref(), Some("Agender"));
    assert_eq!(unknown.gender, None);
}

#[test]
fn test_person_json_null_parents() {
    let json = serde_json::to_value(PersonJson::from(&person(1, "A", None))).unwrap();
    assert!(json["father_id"].is_null());
    assert!(json["mother_id"].is_null());
}

// =============================================================================
// CREATE REQUEST TESTS
// =============================================================================

#[test]
fn test_create_request_minimal_body() {
    let request: CreatePersonRequest =
        serde_json::from_str(r#"{"full_name":"Grace Hopper"}"#).unwrap();

    let draft = request.to_draft().unwrap();
    assert_eq!(draft.full_name, "Grace Hopper");
    assert_eq!(draft.gender, None);
    assert_eq!(draft.father_id, None);
    assert_eq!(draft.mother_id, None);
}

#[test]
fn test_create_request_full_body() {
    let request: CreatePersonRequest = serde_json::from_str(
        r#"{"full_name":"Kid","gender":"Male","father_id":1,"mother_id":2}"#,
    )
    .unwrap();

    let draft = request.to_draft().unwrap();
    assert_eq!(draft.gender, Some(Gender::Male));
    assert_eq!(draft.father_id, Some(PersonId(1)));
    assert_eq!(draft.mother_id, Some(PersonId(2)));
}

#[test]
fn test_create_request_keeps_lowercase_gender_as_other() {
    let request: CreatePersonRequest =
        serde_json::from_str(r#"{"full_name":"Kid","gender":"female"}"#).unwrap();

    let draft = request.to_draft().unwrap();
    assert_eq!(draft.gender, Some(Gender::Other("female".to_string())));
}

#[test]
fn test_create_request_rejects_blank_gender() {
    let request: CreatePersonRequest =
        serde_json::from_str(r#"{"full_name":"Kid","gender":""}"#).unwrap();

    assert!(matches!(
        request.to_draft(),
        Err(LineageError::InvalidInput(_))
    ));
}

#[test]
fn test_create_request_rejects_same_parent_twice() {
    let request: CreatePersonRequest =
        serde_json::from_str(r#"{"full_name":"Kid","father_id":3,"mother_id":3}"#).unwrap();

    assert!(request.to_draft().is_err());
}

#[test]
fn test_create_request_missing_name_fails_to_parse() {
    let result: Result<CreatePersonRequest, _> = serde_json::from_str(r#"{"gender":"Male"}"#);
    assert!(result.is_err());
}

// =============================================================================
// RESPONSE ENVELOPE TESTS
// =============================================================================

#[test]
fn test_person_response_success_and_error() {
    let ok = PersonResponse::success(&person(4, "D", None));
    assert!(ok.success);
    assert_eq!(ok.person.unwrap().id, 4);

    let err = PersonResponse::error("nope");
    assert!(!err.success);
    assert!(err.person.is_none());
    assert_eq!(err.error.as_deref(), Some("nope"));
}

#[test]
fn test_delete_response_error() {
    let response = DeleteResponse::error("Person 9 not found");
    assert!(!response.success);
    assert!(response.error.unwrap().contains("9"));
}

#[test]
fn test_error_response_shape() {
    let json = serde_json::to_string(&ErrorResponse::new("boom")).unwrap();
    assert_eq!(json, r#"{"success":false,"error":"boom"}"#);
}

#[test]
fn test_person_query_parses_from_json() {
    let query: PersonQuery = serde_json::from_str(r#"{"person_id":7}"#).unwrap();
    assert_eq!(query.person_id, 7);
}

// =============================================================================
// FAMILY RESPONSE TESTS
// =============================================================================

#[test]
fn test_family_response_counts_genders() {
    let members = vec![
        person(1, "A", Some(Gender::Male)),
        person(2, "B", Some(Gender::Female)),
        person(3, "C", None),
        person(4, "D", Some(Gender::Male)),
        person(5, "E", Some(Gender::Other("Two-Spirit".to_string()))),
    ];

    let response = FamilyResponse::new(PersonId(1), &members);
    assert!(response.found);
    assert_eq!(response.members.len(), 5);
    assert_eq!(response.male, 2);
    assert_eq!(response.female, 1);
    assert_eq!(response.other, 1);
    assert_eq!(response.unknown, 1);
}

#[test]
fn test_family_response_empty_is_not_found() {
    let response = FamilyResponse::new(PersonId(5), &[]);
    assert!(!response.found);
    assert_eq!(response.person_id, 5);
    assert_eq!(response.male + response.female + response.other + response.unknown, 0);
}

// =============================================================================
// EXPORT RESPONSE TESTS
// =============================================================================

#[test]
fn test_export_response_base64() {
    let response = ExportResponse::success(b"LINE", 0);
    assert!(response.success);
    assert_eq!(response.data.as_deref(), Some("TElORQ=="));
}

#[test]
fn test_export_response_error() {
    let response = ExportResponse::error("disk full");
    assert!(!response.success);
    assert!(response.data.is_none());
    assert_eq!(response.person_count, 0);
}
