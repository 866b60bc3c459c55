//! Integration tests for the Lineage HTTP API.
//!
//! Uses axum-test to test the API handlers without starting a real server.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use axum::http::HeaderValue;
use axum_test::TestServer;
use lineage::api::{
    AppState, CountResponse, CreatePersonRequest, DeleteResponse, ExportResponse, FamilyResponse,
    GenerationsResponse, HealthResponse, PersonJson, PersonResponse, StatusResponse,
    create_router,
};
use lineage::config::ServerConfig;
use lineage_core::{Gender, PersonDraft, PersonId, PersonStore, StorageBackend};
use serde_json::json;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Create a test server over a fresh in-memory store.
fn create_test_server() -> TestServer {
    let state = AppState::new(StorageBackend::in_memory());
    TestServer::new(create_router(state)).unwrap()
}

/// Create a test server over a small family:
///
/// ```text
/// 1 Grandpa (M)
/// └── 3 Father (M) + 2 Mother (F)
///     ├── 4 Son (M)
///     └── 5 Daughter (F)
/// ```
fn create_populated_test_server() -> TestServer {
    let mut store = StorageBackend::in_memory();
    store
        .insert(PersonDraft::new("Grandpa").with_gender(Gender::Male))
        .unwrap();
    store
        .insert(PersonDraft::new("Mother").with_gender(Gender::Female))
        .unwrap();
    store
        .insert(
            PersonDraft::new("Father")
                .with_gender(Gender::Male)
                .with_father(PersonId(1)),
        )
        .unwrap();
    store
        .insert(
            PersonDraft::new("Son")
                .with_gender(Gender::Male)
                .with_father(PersonId(3))
                .with_mother(PersonId(2)),
        )
        .unwrap();
    store
        .insert(
            PersonDraft::new("Daughter")
                .with_gender(Gender::Female)
                .with_father(PersonId(3))
                .with_mother(PersonId(2)),
        )
        .unwrap();

    TestServer::new(create_router(AppState::new(store))).unwrap()
}

fn ids(members: &[PersonJson]) -> Vec<i64> {
    members.iter().map(|p| p.id).collect()
}

// =============================================================================
// HEALTH AND STATUS TESTS
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let server = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_status_empty_registry() {
    let server = create_test_server();

    let response = server.get("/status").await;

    response.assert_status_ok();
    let status: StatusResponse = response.json();
    assert_eq!(status.person_count, 0);
    assert_eq!(status.next_id, 1);
    assert_eq!(status.backend, "memory");
}

#[tokio::test]
async fn test_status_populated_registry() {
    let server = create_populated_test_server();

    let status: StatusResponse = server.get("/status").await.json();
    assert_eq!(status.person_count, 5);
    assert_eq!(status.next_id, 6);
}

// =============================================================================
// CREATE / READ / DELETE TESTS
// =============================================================================

#[tokio::test]
async fn test_create_person() {
    let server = create_test_server();

    let request = CreatePersonRequest {
        full_name: "Ada Lovelace".to_string(),
        gender: Some("Female".to_string()),
        father_id: None,
        mother_id: None,
    };

    let response = server.post("/persons").json(&request).await;

    response.assert_status_ok();
    let result: PersonResponse = response.json();
    assert!(result.success);
    let person = result.person.unwrap();
    assert_eq!(person.id, 1);
    assert_eq!(person.full_name, "Ada Lovelace");
    assert_eq!(person.gender.as_deref(), Some("Female"));
}

#[tokio::test]
async fn test_create_person_trailing_slash() {
    let server = create_test_server();

    let response = server
        .post("/persons/")
        .json(&json!({ "full_name": "Solo" }))
        .await;

    response.assert_status_ok();
    let result: PersonResponse = response.json();
    assert_eq!(result.person.unwrap().gender, None);
}

#[tokio::test]
async fn test_create_person_unknown_parent_rejected() {
    let server = create_test_server();

    let response = server
        .post("/persons")
        .json(&json!({ "full_name": "Orphan", "father_id": 42 }))
        .await;

    response.assert_status_bad_request();
    let result: PersonResponse = response.json();
    assert!(!result.success);
    assert!(result.error.unwrap().contains("father_id"));
}

#[tokio::test]
async fn test_create_person_custom_gender_label() {
    let server = create_test_server();

    let response = server
        .post("/persons")
        .json(&json!({ "full_name": "Pat", "gender": "male" }))
        .await;

    response.assert_status_ok();
    let result: PersonResponse = response.json();
    assert_eq!(result.person.unwrap().gender.as_deref(), Some("male"));
}

#[tokio::test]
async fn test_create_person_blank_gender_label() {
    let server = create_test_server();

    let response = server
        .post("/persons")
        .json(&json!({ "full_name": "Pat", "gender": "  " }))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_create_person_blank_name() {
    let server = create_test_server();

    let response = server
        .post("/persons")
        .json(&json!({ "full_name": "   " }))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_list_persons_in_id_order() {
    let server = create_populated_test_server();

    let response = server.get("/persons").await;

    response.assert_status_ok();
    let persons: Vec<PersonJson> = response.json();
    assert_eq!(ids(&persons), vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_get_person() {
    let server = create_populated_test_server();

    let result: PersonResponse = server.get("/persons/4").await.json();
    let person = result.person.unwrap();
    assert_eq!(person.full_name, "Son");
    assert_eq!(person.father_id, Some(3));
    assert_eq!(person.mother_id, Some(2));
}

#[tokio::test]
async fn test_get_missing_person_is_404() {
    let server = create_test_server();

    let response = server.get("/persons/99").await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn test_delete_person() {
    let server = create_populated_test_server();

    let response = server.delete("/persons/5").await;
    response.assert_status_ok();
    let result: DeleteResponse = response.json();
    assert!(result.success);

    server.get("/persons/5").await.assert_status_not_found();
}

#[tokio::test]
async fn test_delete_missing_person_is_404() {
    let server = create_test_server();

    let response = server.delete("/persons/7").await;
    response.assert_status_not_found();
    let result: DeleteResponse = response.json();
    assert!(!result.success);
}

#[tokio::test]
async fn test_ids_not_reused_after_delete() {
    let server = create_test_server();

    server
        .post("/persons")
        .json(&json!({ "full_name": "First" }))
        .await
        .assert_status_ok();
    server.delete("/persons/1").await.assert_status_ok();

    let result: PersonResponse = server
        .post("/persons")
        .json(&json!({ "full_name": "Second" }))
        .await
        .json();
    assert_eq!(result.person.unwrap().id, 2);
}

// =============================================================================
// RELATIONSHIP TESTS
// =============================================================================

#[tokio::test]
async fn test_family_of_parent() {
    let server = create_populated_test_server();

    let response = server.get("/persons/3/family").await;

    response.assert_status_ok();
    let family: FamilyResponse = response.json();
    assert!(family.found);
    // Self, own father, children; the children's mother is not included.
    assert_eq!(ids(&family.members), vec![1, 3, 4, 5]);
    assert_eq!(family.male, 3);
    assert_eq!(family.female, 1);
}

#[tokio::test]
async fn test_family_excludes_siblings() {
    let server = create_populated_test_server();

    let family: FamilyResponse = server.get("/persons/4/family").await.json();
    assert_eq!(ids(&family.members), vec![2, 3, 4]);
}

#[tokio::test]
async fn test_family_of_unknown_person_is_empty() {
    let server = create_populated_test_server();

    let response = server.get("/persons/404/family").await;

    response.assert_status_ok();
    let family: FamilyResponse = response.json();
    assert!(!family.found);
    assert!(family.members.is_empty());
}

#[tokio::test]
async fn test_family_after_parent_deleted() {
    let server = create_populated_test_server();

    server.delete("/persons/3").await.assert_status_ok();

    let family: FamilyResponse = server.get("/persons/4/family").await.json();
    assert_eq!(ids(&family.members), vec![2, 4]);
}

#[tokio::test]
async fn test_family_size_counts_self_and_children() {
    let server = create_populated_test_server();

    let response = server.get("/persons/count").add_query_param("person_id", 3).await;

    response.assert_status_ok();
    let count: CountResponse = response.json();
    assert_eq!(count.person_id, 3);
    assert_eq!(count.count, 3);
}

#[tokio::test]
async fn test_generations() {
    let server = create_populated_test_server();

    let response = server.get("/persons/gen").add_query_param("person_id", 4).await;

    response.assert_status_ok();
    let result: GenerationsResponse = response.json();
    assert_eq!(result.generations, 3);
}

#[tokio::test]
async fn test_generations_without_father_is_one() {
    let server = create_populated_test_server();

    let result: GenerationsResponse = server
        .get("/persons/gen")
        .add_query_param("person_id", 2)
        .await
        .json();
    assert_eq!(result.generations, 1);
}

#[tokio::test]
async fn test_generations_unknown_person_is_404() {
    let server = create_test_server();

    let response = server.get("/persons/gen").add_query_param("person_id", 9).await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn test_gender_counts() {
    let server = create_populated_test_server();

    let male: CountResponse = server
        .get("/persons/male_count")
        .add_query_param("person_id", 3)
        .await
        .json();
    let female: CountResponse = server
        .get("/persons/female_count")
        .add_query_param("person_id", 3)
        .await
        .json();

    assert_eq!(male.count, 3);
    assert_eq!(female.count, 1);
}

#[tokio::test]
async fn test_other_label_counts_as_neither() {
    let server = create_populated_test_server();

    server
        .post("/persons")
        .json(&json!({ "full_name": "Sam", "gender": "Nonbinary", "father_id": 3 }))
        .await
        .assert_status_ok();

    let family: FamilyResponse = server.get("/persons/3/family").await.json();
    let male: CountResponse = server
        .get("/persons/male_count")
        .add_query_param("person_id", 3)
        .await
        .json();
    let female: CountResponse = server
        .get("/persons/female_count")
        .add_query_param("person_id", 3)
        .await
        .json();

    assert_eq!(family.members.len(), 5);
    assert_eq!(family.other, 1);
    assert!(male.count + female.count < family.members.len());
}

#[tokio::test]
async fn test_gender_count_unknown_person_is_zero() {
    let server = create_test_server();

    let response = server
        .get("/persons/male_count")
        .add_query_param("person_id", 1)
        .await;

    response.assert_status_ok();
    let count: CountResponse = response.json();
    assert_eq!(count.count, 0);
}

#[tokio::test]
async fn test_non_numeric_person_id_rejected() {
    let server = create_test_server();

    server
        .get("/persons/gen")
        .add_query_param("person_id", "abc")
        .await
        .assert_status_bad_request();
    server.get("/persons/abc").await.assert_status_bad_request();
}

#[tokio::test]
async fn test_missing_person_id_rejected() {
    let server = create_test_server();

    let response = server.get("/persons/count").await;
    assert!(response.status_code().is_client_error());
}

// =============================================================================
// EXPORT TESTS
// =============================================================================

#[tokio::test]
async fn test_export_empty_registry() {
    let server = create_test_server();

    let response = server.post("/export").await;

    response.assert_status_ok();
    let result: ExportResponse = response.json();
    assert!(result.success);
    assert!(result.data.is_some());
    assert_eq!(result.person_count, 0);
}

#[tokio::test]
async fn test_export_populated_registry() {
    let server = create_populated_test_server();

    let result: ExportResponse = server.post("/export").await.json();
    assert!(result.success);
    assert_eq!(result.person_count, 5);
}

// =============================================================================
// PERSISTENT BACKEND TESTS
// =============================================================================

#[tokio::test]
async fn test_redb_backend_serves_requests() {
    let dir = tempfile::tempdir().unwrap();
    let store = StorageBackend::open_redb(dir.path().join("api.redb")).unwrap();
    let server = TestServer::new(create_router(AppState::new(store))).unwrap();

    server
        .post("/persons")
        .json(&json!({ "full_name": "Root", "gender": "Male" }))
        .await
        .assert_status_ok();
    server
        .post("/persons")
        .json(&json!({ "full_name": "Child", "gender": "Male", "father_id": 1 }))
        .await
        .assert_status_ok();

    let status: StatusResponse = server.get("/status").await.json();
    assert_eq!(status.backend, "redb");
    assert_eq!(status.person_count, 2);

    let result: GenerationsResponse = server
        .get("/persons/gen")
        .add_query_param("person_id", 2)
        .await
        .json();
    assert_eq!(result.generations, 2);
}

// =============================================================================
// ERROR HANDLING TESTS
// =============================================================================

#[tokio::test]
async fn test_404_on_unknown_endpoint() {
    let server = create_test_server();

    let response = server.get("/unknown").await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn test_method_not_allowed() {
    let server = create_test_server();

    // /health is GET only
    let response = server.post("/health").await;
    assert_eq!(response.status_code().as_u16(), 405);
}

#[tokio::test]
async fn test_invalid_json_body() {
    let server = create_test_server();

    let response = server
        .post("/persons")
        .text("not valid json")
        .content_type("application/json")
        .await;

    assert!(response.status_code().is_client_error());
}

// =============================================================================
// AUTHENTICATION MIDDLEWARE TESTS
// =============================================================================

/// Create a test server with authentication enabled.
fn create_auth_test_server(api_key: &str) -> TestServer {
    let config = ServerConfig {
        api_key: Some(api_key.to_string()),
        ..ServerConfig::default()
    };
    let state = AppState::with_config(StorageBackend::in_memory(), config);
    TestServer::new(create_router(state)).unwrap()
}

#[tokio::test]
async fn test_auth_valid_bearer_token() {
    let api_key = "test-secret-key-12345";
    let server = create_auth_test_server(api_key);

    let response = server
        .get("/status")
        .add_header(
            axum::http::header::AUTHORIZATION,
            format!("Bearer {}", api_key)
                .parse::<HeaderValue>()
                .unwrap(),
        )
        .await;

    response.assert_status_ok();
    let status: StatusResponse = response.json();
    assert_eq!(status.person_count, 0);
}

#[tokio::test]
async fn test_auth_valid_raw_token() {
    let api_key = "test-raw-key-67890";
    let server = create_auth_test_server(api_key);

    let response = server
        .get("/persons")
        .add_header(
            axum::http::header::AUTHORIZATION,
            api_key.parse::<HeaderValue>().unwrap(),
        )
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_auth_invalid_token_rejected() {
    let server = create_auth_test_server("correct-key");

    let response = server
        .get("/status")
        .add_header(
            axum::http::header::AUTHORIZATION,
            "Bearer wrong-key".parse::<HeaderValue>().unwrap(),
        )
        .await;

    assert_eq!(response.status_code().as_u16(), 401);
}

#[tokio::test]
async fn test_auth_missing_header_rejected() {
    let server = create_auth_test_server("some-key");

    let response = server.delete("/persons/1").await;

    assert_eq!(response.status_code().as_u16(), 401);
}

#[tokio::test]
async fn test_auth_health_endpoint_bypasses_auth() {
    let server = create_auth_test_server("some-key");

    let response = server.get("/health").await;

    response.assert_status_ok();
}

// =============================================================================
// RATE LIMIT TESTS
// =============================================================================

#[tokio::test]
async fn test_rate_limit_rejects_burst() {
    let config = ServerConfig {
        rate_limit: 1,
        ..ServerConfig::default()
    };
    let state = AppState::with_config(StorageBackend::in_memory(), config);
    let server = TestServer::new(create_router(state)).unwrap();

    server.get("/health").await.assert_status_ok();
    let response = server.get("/health").await;
    assert_eq!(response.status_code().as_u16(), 429);
}

#[tokio::test]
async fn test_rate_limit_disabled_with_zero() {
    let config = ServerConfig {
        rate_limit: 0,
        ..ServerConfig::default()
    };
    let state = AppState::with_config(StorageBackend::in_memory(), config);
    let server = TestServer::new(create_router(state)).unwrap();

    for _ in 0..5 {
        server.get("/health").await.assert_status_ok();
    }
}
