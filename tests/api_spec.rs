use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use person_registry::api::{create_router, AlertHeaders};
use person_registry::config::DEFAULT_APP_NAME;
use person_registry::db::Database;
use person_registry::index::SqliteIndex;
use person_registry::models::*;
use person_registry::service::PersonService;
use serde_json::{json, Value};

fn setup() -> TestServer {
    let db = Database::open_memory().expect("Failed to create database");
    db.migrate().expect("Failed to migrate");
    let index = SqliteIndex::open_memory().expect("Failed to open index");
    let service = PersonService::new(db, Arc::new(index));
    let alerts = AlertHeaders::new(DEFAULT_APP_NAME).expect("Invalid app name");
    TestServer::new(create_router(service, alerts)).expect("Failed to create test server")
}

fn john_doe() -> PersonPayload {
    PersonPayload::from(PersonFields::new("John", "Doe", Some(30)))
}

async fn create_test_person(server: &TestServer) -> Person {
    server
        .post("/api/persons")
        .json(&john_doe())
        .await
        .json::<Person>()
}

fn field_errors(body: &Value) -> Vec<(String, String)> {
    body["fieldErrors"]
        .as_array()
        .map(|errors| {
            errors
                .iter()
                .map(|e| {
                    (
                        e["field"].as_str().unwrap_or_default().to_string(),
                        e["message"].as_str().unwrap_or_default().to_string(),
                    )
                })
                .collect()
        })
        .unwrap_or_default()
}

// ============================================================
// Create
// ============================================================

mod create_person {
    use super::*;

    #[tokio::test]
    async fn returns_created_person_with_location_and_alert() {
        let server = setup();

        let response = server.post("/api/persons").json(&john_doe()).await;

        response.assert_status(StatusCode::CREATED);
        let person: Person = response.json();
        assert_eq!(person.fields, PersonFields::new("John", "Doe", Some(30)));
        assert_eq!(
            response.header("location"),
            format!("/api/persons/{}", person.id).as_str()
        );
        assert_eq!(
            response.header("x-personregistryapp-alert"),
            "personRegistryApp.person.created"
        );
        assert_eq!(
            response.header("x-personregistryapp-params"),
            person.id.to_string().as_str()
        );
        assert_eq!(response.header("x-personregistryapp-index-sync"), "synced");
    }

    #[tokio::test]
    async fn created_person_can_be_read_back() {
        let server = setup();
        let created = create_test_person(&server).await;

        let response = server.get(&format!("/api/persons/{}", created.id)).await;

        response.assert_status_ok();
        let found: Person = response.json();
        assert_eq!(found, created);
        assert_eq!(found.fields, created.fields);
    }

    #[tokio::test]
    async fn rejects_person_that_already_has_an_id() {
        let server = setup();

        let response = server
            .post("/api/persons")
            .json(&json!({ "id": 12, "firstName": "John", "lastName": "Doe" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(
            response.header("failure"),
            "A new person cannot already have an ID"
        );

        let persons: Vec<Person> = server.get("/api/persons").await.json();
        assert!(persons.is_empty());
    }

    #[tokio::test]
    async fn rejects_short_names_with_field_errors() {
        let server = setup();

        let response = server
            .post("/api/persons")
            .json(&json!({ "firstName": "Jo", "lastName": "Do" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["message"], "error.validation");
        assert_eq!(
            field_errors(&body),
            vec![
                ("firstName".to_string(), "Size".to_string()),
                ("lastName".to_string(), "Size".to_string()),
            ]
        );
        assert_eq!(body["fieldErrors"][0]["objectName"], "person");
    }

    #[tokio::test]
    async fn rejects_age_outside_range() {
        let server = setup();

        for (age, constraint) in [(17, "Min"), (101, "Max")] {
            let response = server
                .post("/api/persons")
                .json(&json!({ "firstName": "John", "lastName": "Doe", "age": age }))
                .await;

            response.assert_status(StatusCode::BAD_REQUEST);
            let body: Value = response.json();
            assert_eq!(
                field_errors(&body),
                vec![("age".to_string(), constraint.to_string())]
            );
        }

        let persons: Vec<Person> = server.get("/api/persons").await.json();
        assert!(persons.is_empty());
    }

    #[tokio::test]
    async fn rejects_age_beyond_integer_range_as_field_error() {
        let server = setup();

        let response = server
            .post("/api/persons")
            .json(&json!({ "firstName": "John", "lastName": "Doe", "age": 3000000000i64 }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(
            field_errors(&body),
            vec![("age".to_string(), "Max".to_string())]
        );
    }

    #[tokio::test]
    async fn rejects_mistyped_body_with_bad_request() {
        let server = setup();

        let response = server
            .post("/api/persons")
            .json(&json!({ "firstName": "John", "lastName": "Doe", "age": "thirty" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["message"], "error.http.400");

        let persons: Vec<Person> = server.get("/api/persons").await.json();
        assert!(persons.is_empty());
    }

    #[tokio::test]
    async fn rejects_missing_names() {
        let server = setup();

        let response = server.post("/api/persons").json(&json!({ "age": 40 })).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(
            field_errors(&body),
            vec![
                ("firstName".to_string(), "NotNull".to_string()),
                ("lastName".to_string(), "NotNull".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn accepts_boundary_ages_and_missing_age() {
        let server = setup();

        for body in [
            json!({ "firstName": "Ann", "lastName": "Lee", "age": 18 }),
            json!({ "firstName": "Ann", "lastName": "Lee", "age": 100 }),
            json!({ "firstName": "Ann", "lastName": "Lee" }),
        ] {
            server
                .post("/api/persons")
                .json(&body)
                .await
                .assert_status(StatusCode::CREATED);
        }
    }
}

// ============================================================
// Update
// ============================================================

mod update_person {
    use super::*;

    #[tokio::test]
    async fn updates_an_existing_person() {
        let server = setup();
        let created = create_test_person(&server).await;

        let mut payload = PersonPayload::from(created.clone());
        payload.last_name = Some("Smith".to_string());

        let response = server.put("/api/persons").json(&payload).await;

        response.assert_status_ok();
        let updated: Person = response.json();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.fields.last_name, "Smith");
        assert_eq!(
            response.header("x-personregistryapp-alert"),
            "personRegistryApp.person.updated"
        );

        let found: Person = server
            .get(&format!("/api/persons/{}", created.id))
            .await
            .json();
        assert_eq!(found.fields.last_name, "Smith");
    }

    #[tokio::test]
    async fn without_id_creates_the_person() {
        let server = setup();

        let response = server.put("/api/persons").json(&john_doe()).await;

        response.assert_status(StatusCode::CREATED);
        let person: Person = response.json();
        assert_eq!(person.fields, PersonFields::new("John", "Doe", Some(30)));
        assert_eq!(
            response.header("x-personregistryapp-alert"),
            "personRegistryApp.person.created"
        );

        let persons: Vec<Person> = server.get("/api/persons").await.json();
        assert_eq!(persons, vec![person]);
    }

    #[tokio::test]
    async fn rejects_age_beyond_integer_range_as_field_error() {
        let server = setup();
        let created = create_test_person(&server).await;

        let response = server
            .put("/api/persons")
            .json(&json!({
                "id": created.id,
                "firstName": "John",
                "lastName": "Doe",
                "age": -5000000000i64
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(
            field_errors(&body),
            vec![("age".to_string(), "Min".to_string())]
        );
    }

    #[tokio::test]
    async fn rejects_id_never_assigned_and_keeps_creating() {
        let server = setup();

        let response = server
            .put("/api/persons")
            .json(&json!({ "id": i64::MAX, "firstName": "John", "lastName": "Doe" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.header("failure"), "Entity not found");
        let body: Value = response.json();
        assert_eq!(body["message"], "error.idnotfound");

        server
            .post("/api/persons")
            .json(&json!({ "firstName": "Jane", "lastName": "Roe" }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    #[tokio::test]
    async fn rejects_invalid_fields() {
        let server = setup();
        let created = create_test_person(&server).await;

        let response = server
            .put("/api/persons")
            .json(&json!({ "id": created.id, "firstName": "John", "lastName": "Doe", "age": 5 }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);

        let found: Person = server
            .get(&format!("/api/persons/{}", created.id))
            .await
            .json();
        assert_eq!(found.fields.age, Some(30));
    }
}

// ============================================================
// Read
// ============================================================

mod get_persons {
    use super::*;

    #[tokio::test]
    async fn returns_empty_list_when_no_persons_exist() {
        let server = setup();

        let response = server.get("/api/persons").await;

        response.assert_status_ok();
        let persons: Vec<Person> = response.json();
        assert!(persons.is_empty());
    }

    #[tokio::test]
    async fn returns_all_persons() {
        let server = setup();
        create_test_person(&server).await;
        create_test_person(&server).await;

        let persons: Vec<Person> = server.get("/api/persons").await.json();
        assert_eq!(persons.len(), 2);
    }

    #[tokio::test]
    async fn returns_404_for_unknown_id() {
        let server = setup();

        let response = server.get("/api/persons/999").await;

        response.assert_status(StatusCode::NOT_FOUND);
    }
}

// ============================================================
// Delete
// ============================================================

mod delete_person {
    use super::*;

    #[tokio::test]
    async fn deletes_the_person() {
        let server = setup();
        let created = create_test_person(&server).await;

        let response = server.delete(&format!("/api/persons/{}", created.id)).await;

        response.assert_status_ok();
        assert_eq!(
            response.header("x-personregistryapp-alert"),
            "personRegistryApp.person.deleted"
        );
        server
            .get(&format!("/api/persons/{}", created.id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn deleting_twice_or_unknown_id_succeeds() {
        let server = setup();
        let created = create_test_person(&server).await;

        server
            .delete(&format!("/api/persons/{}", created.id))
            .await
            .assert_status_ok();
        server
            .delete(&format!("/api/persons/{}", created.id))
            .await
            .assert_status_ok();
        server.delete("/api/persons/424242").await.assert_status_ok();
    }
}

// ============================================================
// Search
// ============================================================

mod search_persons {
    use super::*;

    #[tokio::test]
    async fn finds_person_by_last_name() {
        let server = setup();
        let created = create_test_person(&server).await;
        server
            .post("/api/persons")
            .json(&json!({ "firstName": "Jane", "lastName": "Roe" }))
            .await;

        let response = server.get("/api/_search/persons/Doe").await;

        response.assert_status_ok();
        let persons: Vec<Person> = response.json();
        assert_eq!(persons, vec![created]);
    }

    #[tokio::test]
    async fn no_longer_finds_deleted_person() {
        let server = setup();
        let created = create_test_person(&server).await;
        server.delete(&format!("/api/persons/{}", created.id)).await;

        let persons: Vec<Person> = server.get("/api/_search/persons/Doe").await.json();
        assert!(persons.is_empty());
    }

    #[tokio::test]
    async fn reflects_updates() {
        let server = setup();
        let created = create_test_person(&server).await;
        let mut payload = PersonPayload::from(created);
        payload.last_name = Some("Smith".to_string());
        server.put("/api/persons").json(&payload).await;

        let by_old: Vec<Person> = server.get("/api/_search/persons/Doe").await.json();
        let by_new: Vec<Person> = server.get("/api/_search/persons/Smith").await.json();
        assert!(by_old.is_empty());
        assert_eq!(by_new.len(), 1);
    }

    #[tokio::test]
    async fn returns_empty_list_for_query_without_terms() {
        let server = setup();
        create_test_person(&server).await;

        let response = server.get("/api/_search/persons/%22%28%2A").await;

        response.assert_status_ok();
        let persons: Vec<Person> = response.json();
        assert!(persons.is_empty());
    }
}

mod health {
    use super::*;

    #[tokio::test]
    async fn reports_ok() {
        let server = setup();

        let response = server.get("/api/health").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "ok");
    }
}
