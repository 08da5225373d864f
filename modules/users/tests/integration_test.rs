//! Integration-style tests for the users module.
//!
//! Key points:
//! - Each test runs on a fresh in-memory SQLite DB and applies migrations.
//! - Service is constructed with a SeaORM-backed repository (Domain Port + Adapter).
//! - Local client is tested against the same Service.
//! - REST layer is exercised via an Axum Router registered through real routes.

use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use tower::ServiceExt;

use users::{
    api::rest::dto::UserDto,
    contract::{client::UsersApi, error::UsersError, model::NewUser, model::UserPatch},
    domain::{
        error::DomainError,
        repo::{NewUserRecord, RepoError, UsersRepository},
        service::{Service, ServiceConfig},
    },
    gateways::local::UsersLocalClient,
    infra::storage::sea_orm_repo::SeaOrmUsersRepository,
    UsersConfig, UsersModule,
};

/// Create a fresh test database for each test (in-memory SQLite) and run migrations.
async fn create_test_db() -> DatabaseConnection {
    let handle = db::DbHandle::connect("sqlite::memory:", db::ConnectOpts::default())
        .await
        .expect("Failed to connect to test database");
    let conn = handle.sea();
    UsersModule::migrate(&conn)
        .await
        .expect("Failed to run migrations");
    conn
}

/// Build the domain Service with a SeaORM-backed repository.
async fn create_test_service() -> Arc<Service> {
    let db = create_test_db().await;
    let repo = SeaOrmUsersRepository::new(db);
    Arc::new(Service::new(Arc::new(repo), ServiceConfig::default()))
}

/// Build an Axum router by calling the real route registration.
async fn create_test_router() -> Router {
    let module = UsersModule::init(create_test_db().await, &UsersConfig::default());
    module.register_rest(Router::new())
}

fn new_user(name: &str, email: &str, age: i32) -> NewUser {
    NewUser {
        name: name.to_string(),
        email: email.to_string(),
        age: Some(age),
    }
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Result<Value> {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&body)?)
}

#[tokio::test]
async fn repository_assigns_ids_and_round_trips_timestamps() -> Result<()> {
    let repo = SeaOrmUsersRepository::new(create_test_db().await);
    let created_at = chrono::DateTime::parse_from_rfc3339("2024-03-01T10:20:30.123456Z")?
        .with_timezone(&chrono::Utc);

    let first = repo
        .insert(NewUserRecord {
            name: "Alice".into(),
            email: "alice@example.com".into(),
            age: 30,
            created_at,
        })
        .await?;
    let second = repo
        .insert(NewUserRecord {
            name: "Bob".into(),
            email: "bob@example.com".into(),
            age: 41,
            created_at,
        })
        .await?;
    assert!(second.id > first.id);

    let loaded = repo.find_by_id(first.id).await?.expect("row exists");
    assert_eq!(loaded, first);
    assert_eq!(loaded.created_at, created_at);

    let all = repo.find_all().await?;
    assert_eq!(
        all.iter().map(|u| u.id).collect::<Vec<_>>(),
        vec![first.id, second.id]
    );
    assert_eq!(
        repo.find_by_email("bob@example.com").await?.map(|u| u.id),
        Some(second.id)
    );
    assert!(repo.find_by_email("BOB@example.com").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn repository_reports_unique_violation_and_rolls_back() -> Result<()> {
    let repo = SeaOrmUsersRepository::new(create_test_db().await);
    let record = NewUserRecord {
        name: "Alice".into(),
        email: "dup@example.com".into(),
        age: 30,
        created_at: chrono::Utc::now(),
    };
    repo.insert(record.clone()).await?;

    let err = repo.insert(record).await.unwrap_err();
    assert!(matches!(err, RepoError::ConstraintViolation(_)), "{err:?}");

    // the failed transaction left nothing behind and the connection is usable
    assert_eq!(repo.find_all().await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn repository_update_and_delete_missing_rows() -> Result<()> {
    let repo = SeaOrmUsersRepository::new(create_test_db().await);
    let ghost = users::contract::model::User {
        id: 99,
        name: "Ghost".into(),
        email: "ghost@example.com".into(),
        age: 1,
        created_at: chrono::Utc::now(),
    };

    let err = repo.update(ghost).await.unwrap_err();
    assert!(matches!(err, RepoError::NotFound { id: 99 }), "{err:?}");
    assert!(!repo.delete(99).await?);
    Ok(())
}

#[tokio::test]
async fn domain_service_crud() -> Result<()> {
    let service = create_test_service().await;

    let created = service
        .create_user(new_user("Test User", "test@example.com", 33))
        .await?;
    assert_eq!(created.email, "test@example.com");

    let retrieved = service.get_user(created.id).await?.expect("user exists");
    assert_eq!(retrieved, created);

    let users = service.list_users().await?;
    assert_eq!(users, vec![created.clone()]);

    let updated = service
        .update_user(
            created.id,
            UserPatch {
                name: Some("Updated Name".into()),
                ..UserPatch::default()
            },
        )
        .await?;
    assert_eq!(updated.name, "Updated Name");
    assert_eq!(updated.email, "test@example.com");
    assert_eq!(updated.created_at, created.created_at);

    assert!(service.delete_user(created.id).await?);
    assert!(service.get_user(created.id).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn domain_service_email_uniqueness() -> Result<()> {
    let service = create_test_service().await;
    service
        .create_user(new_user("User 1", "unique@example.com", 20))
        .await?;

    let result = service
        .create_user(new_user("User 2", "unique@example.com", 21))
        .await;
    assert!(matches!(
        result,
        Err(DomainError::EmailAlreadyExists { .. })
    ));

    // an update that keeps its own email is not a conflict
    let user = service
        .create_user(new_user("User 3", "third@example.com", 22))
        .await?;
    let same = service
        .update_user(
            user.id,
            UserPatch {
                email: Some("third@example.com".into()),
                age: Some(23),
                ..UserPatch::default()
            },
        )
        .await?;
    assert_eq!(same.age, 23);
    Ok(())
}

#[tokio::test]
async fn local_client_maps_errors() -> Result<()> {
    let client: Arc<dyn UsersApi> =
        Arc::new(UsersLocalClient::new(create_test_service().await));

    let created = client
        .create_user(new_user("Client User", "client@example.com", 40))
        .await?;
    assert_eq!(client.get_user(created.id).await?, Some(created.clone()));

    let dup = client
        .create_user(new_user("Other", "client@example.com", 41))
        .await
        .unwrap_err();
    assert_eq!(dup, UsersError::conflict("client@example.com"));

    let missing = client
        .update_user(12345, UserPatch::default())
        .await
        .unwrap_err();
    assert_eq!(missing, UsersError::not_found(12345));

    let invalid = client
        .create_user(NewUser {
            name: "No Age".into(),
            email: "noage@example.com".into(),
            age: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(invalid, UsersError::Validation { .. }));
    Ok(())
}

#[tokio::test]
async fn rest_create_get_list() -> Result<()> {
    let router = create_test_router().await;

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/users",
            json!({"name": "Alice", "email": "alice@example.com", "age": 30}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await?;
    assert_eq!(created["name"], "Alice");
    assert!(created["createdAt"].is_string());
    let id = created["id"].as_i64().expect("numeric id");

    let response = router
        .clone()
        .oneshot(empty_request("GET", &format!("/api/users/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fetched: UserDto = serde_json::from_value(body_json(response).await?)?;
    assert_eq!(fetched.email, "alice@example.com");

    let response = router
        .oneshot(empty_request("GET", "/api/users"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let list = body_json(response).await?;
    assert_eq!(list.as_array().map(Vec::len), Some(1));
    Ok(())
}

#[tokio::test]
async fn rest_error_statuses() -> Result<()> {
    let router = create_test_router().await;
    let alice = json!({"name": "Alice", "email": "alice@example.com", "age": 30});

    let response = router
        .clone()
        .oneshot(json_request("POST", "/api/users", alice.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // duplicate email
    let response = router
        .clone()
        .oneshot(json_request("POST", "/api/users", alice))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/problem+json"
    );
    let problem = body_json(response).await?;
    assert_eq!(problem["code"], "USERS_EMAIL_CONFLICT");

    // missing age
    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/users",
            json!({"name": "Bob", "email": "bob@example.com"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await?["code"], "USERS_VALIDATION");

    // malformed body
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/users")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // unknown id
    let response = router
        .clone()
        .oneshot(json_request("PUT", "/api/users/999", json!({"age": 5})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await?["code"], "USERS_NOT_FOUND");

    let response = router
        .oneshot(empty_request("GET", "/api/users/999"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn rest_non_numeric_id_is_a_validation_problem() -> Result<()> {
    let router = create_test_router().await;

    let requests = [
        empty_request("GET", "/api/users/abc"),
        json_request("PUT", "/api/users/abc", json!({"age": 5})),
        empty_request("DELETE", "/api/users/abc"),
        empty_request("GET", "/api/users/99999999999"),
    ];
    for request in requests {
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/problem+json"
        );
        let problem = body_json(response).await?;
        assert_eq!(problem["code"], "USERS_VALIDATION");
        assert_eq!(problem["status"], 400);
    }
    Ok(())
}

#[tokio::test]
async fn rest_update_and_delete_twice() -> Result<()> {
    let router = create_test_router().await;

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/users",
            json!({"name": "Carol", "email": "carol@example.com", "age": 28}),
        ))
        .await
        .unwrap();
    let id = body_json(response).await?["id"].as_i64().unwrap();

    let response = router
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/users/{id}"),
            json!({"name": "  ", "age": 29}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await?;
    assert_eq!(updated["name"], "Carol");
    assert_eq!(updated["age"], 29);

    let response = router
        .clone()
        .oneshot(empty_request("DELETE", &format!("/api/users/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = router
        .oneshot(empty_request("DELETE", &format!("/api/users/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[test]
fn openapi_lists_user_paths() {
    let doc = <users::api::rest::openapi::UsersApiDoc as utoipa::OpenApi>::openapi();
    assert!(doc.paths.paths.contains_key("/api/users"));
    assert!(doc.paths.paths.contains_key("/api/users/{id}"));
}
