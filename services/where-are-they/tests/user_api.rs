mod common;

use axum::http::StatusCode;
use common::{api, TestApp};
use serde_json::{json, Value};

fn observer_body(username: &str, email: &str) -> Value {
    json!({
        "name": "Laura",
        "last_name": "Gomez",
        "id_number": "30111222",
        "username": username,
        "password": "s3cret-pass",
        "email": email
    })
}

fn observed_body(username: &str, email: &str, privacy_key: &str) -> Value {
    json!({
        "name": "Ruben",
        "last_name": "Diaz",
        "id_number": "28999000",
        "username": username,
        "password": "driver-pass",
        "email": email,
        "privacy_key": privacy_key,
        "company_name": "Transportes Diaz"
    })
}

#[tokio::test]
async fn observer_user_is_created_without_exposing_the_password() {
    let app = TestApp::new();

    let (status, created) = app
        .post(&api("/users/observer"), observer_body("laura", "laura@example.com"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["type"], json!("observer"));
    assert_eq!(created["username"], json!("laura"));
    assert_eq!(created["children"], json!([]));
    assert_eq!(created["observed_users"], json!([]));
    assert!(created.get("password").is_none());
    assert!(created["id"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn observed_user_keeps_its_privacy_key() {
    let app = TestApp::new();

    let (status, created) = app
        .post(
            &api("/users/observed"),
            observed_body("ruben", "ruben@example.com", "privacy-key-42"),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["type"], json!("observed"));
    assert_eq!(created["privacy_key"], json!("privacy-key-42"));
    assert_eq!(created["company_name"], json!("Transportes Diaz"));

    let id = created["id"].as_i64().unwrap();
    let (status, loaded) = app.get(&api(&format!("/users/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(loaded, created);
}

#[tokio::test]
async fn observed_user_without_privacy_key_gets_one() {
    let app = TestApp::new();
    let mut body = observed_body("ruben", "ruben@example.com", "unused-key");
    body.as_object_mut().unwrap().remove("privacy_key");

    let (status, created) = app.post(&api("/users/observed"), body).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!created["privacy_key"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_username_and_email_conflict() {
    let app = TestApp::new();
    app.post(&api("/users/observer"), observer_body("laura", "laura@example.com"))
        .await;

    let (status, error) = app
        .post(&api("/users/observer"), observer_body("laura", "other@example.com"))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["message"], json!("username already in use"));

    let (status, error) = app
        .post(
            &api("/users/observed"),
            observed_body("ruben", "laura@example.com", "privacy-key-42"),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["message"], json!("email already in use"));
}

#[tokio::test]
async fn invalid_registration_is_rejected() {
    let app = TestApp::new();

    let (status, _) = app
        .post(&api("/users/observer"), observer_body("laura", "not-an-email"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut with_id = observer_body("laura", "laura@example.com");
    with_id["id"] = json!(5);
    let (status, _) = app.post(&api("/users/observer"), with_id).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut short_password = observer_body("laura", "laura@example.com");
    short_password["password"] = json!("short");
    let (status, _) = app.post(&api("/users/observer"), short_password).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_returns_the_specialized_account() {
    let app = TestApp::new();
    app.post(&api("/users/observer"), observer_body("laura", "laura@example.com"))
        .await;

    let (status, account) = app
        .post(
            &api("/users/login"),
            json!({ "username": "laura", "password": "s3cret-pass" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(account["type"], json!("observer"));
    assert_eq!(account["username"], json!("laura"));
}

#[tokio::test]
async fn wrong_credentials_are_unauthorized() {
    let app = TestApp::new();
    app.post(&api("/users/observer"), observer_body("laura", "laura@example.com"))
        .await;

    let (status, wrong_password) = app
        .post(
            &api("/users/login"),
            json!({ "username": "laura", "password": "guess-again" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password["message"], json!("incorrect user or password"));

    let (status, unknown_user) = app
        .post(
            &api("/users/login"),
            json!({ "username": "nobody", "password": "s3cret-pass" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password, unknown_user);
}

#[tokio::test]
async fn missing_user_is_not_found() {
    let app = TestApp::new();

    let (status, error) = app.get(&api("/users/404")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["message"], json!("user 404 not found"));
}

#[tokio::test]
async fn observer_adds_observed_user_by_privacy_key() {
    let app = TestApp::new();
    let (_, observer) = app
        .post(&api("/users/observer"), observer_body("laura", "laura@example.com"))
        .await;
    let (_, observed) = app
        .post(
            &api("/users/observed"),
            observed_body("ruben", "ruben@example.com", "privacy-key-42"),
        )
        .await;
    let observer_id = observer["id"].as_i64().unwrap();
    let uri = api(&format!("/users/observer/{}/observed", observer_id));

    let (status, updated) = app
        .post(&uri, json!({ "privacy_key": "privacy-key-42" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let watched = updated["observed_users"].as_array().unwrap();
    assert_eq!(watched.len(), 1);
    assert_eq!(watched[0]["id"], observed["id"]);
    assert_eq!(watched[0]["privacy_key"], json!("privacy-key-42"));

    let (status, _) = app
        .post(&uri, json!({ "privacy_key": "privacy-key-42" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn unknown_privacy_key_is_not_found() {
    let app = TestApp::new();
    let observer = app.store.seed_observer("laura").await;
    let uri = api(&format!("/users/observer/{}/observed", observer));

    let (status, _) = app.post(&uri, json!({ "privacy_key": "nope" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.store.mutations(), 0);
}
