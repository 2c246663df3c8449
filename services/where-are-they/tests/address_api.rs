mod common;

use axum::http::StatusCode;
use common::{api, TestApp};
use serde_json::{json, Value};

fn address_body(observer_user_id: i64) -> Value {
    json!({
        "name": "Casa",
        "street": "25 de Mayo",
        "number": "1010",
        "floor": "2",
        "apartment": "B",
        "postal_code": "5000",
        "city": "Cordoba",
        "province": "Cordoba",
        "country": "Argentina",
        "latitude": "-31.4135",
        "longitude": "-64.18105",
        "observer_user_id": observer_user_id
    })
}

#[tokio::test]
async fn create_assigns_an_id_and_get_returns_the_same_address() {
    let app = TestApp::new();
    let observer = app.store.seed_observer("mama").await;

    let (status, created) = app.post(&api("/addresses"), address_body(observer)).await;
    assert_eq!(status, StatusCode::OK);
    let id = created["id"].as_i64().unwrap();
    assert!(id > 0);

    let (status, loaded) = app.get(&api(&format!("/addresses/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(loaded, created);

    let mut expected = address_body(observer);
    expected["id"] = json!(id);
    assert_eq!(loaded, expected);
}

#[tokio::test]
async fn create_with_client_id_is_rejected() {
    let app = TestApp::new();
    let observer = app.store.seed_observer("mama").await;
    let mut body = address_body(observer);
    body["id"] = json!(1);

    let (status, error) = app.post(&api("/addresses"), body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["status"], json!(400));
    assert_eq!(error["code"], json!("BAD_REQUEST"));
    assert_eq!(app.store.mutations(), 0);
}

#[tokio::test]
async fn unknown_fields_are_rejected() {
    let app = TestApp::new();
    let observer = app.store.seed_observer("mama").await;
    let mut body = address_body(observer);
    body["nickname"] = json!("home");

    let (status, _) = app.post(&api("/addresses"), body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_required_field_is_rejected() {
    let app = TestApp::new();
    let observer = app.store.seed_observer("mama").await;
    let mut body = address_body(observer);
    body.as_object_mut().unwrap().remove("street");

    let (status, _) = app.post(&api("/addresses"), body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_latitude_is_rejected() {
    let app = TestApp::new();
    let observer = app.store.seed_observer("mama").await;
    let mut body = address_body(observer);
    body["latitude"] = json!("123.5");

    let (status, error) = app.post(&api("/addresses"), body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error["message"].as_str().unwrap().contains("latitude"));
}

#[tokio::test]
async fn unknown_observer_is_not_found() {
    let app = TestApp::new();

    let (status, error) = app.post(&api("/addresses"), address_body(77)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["message"], json!("observer user 77 not found"));
}

#[tokio::test]
async fn update_requires_an_id() {
    let app = TestApp::new();
    let observer = app.store.seed_observer("mama").await;

    let (status, _) = app.put(&api("/addresses"), address_body(observer)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_changes_the_stored_address() {
    let app = TestApp::new();
    let observer = app.store.seed_observer("mama").await;
    let (_, created) = app.post(&api("/addresses"), address_body(observer)).await;

    let mut body = address_body(observer);
    body["id"] = created["id"].clone();
    body["name"] = json!("Trabajo");
    let (status, updated) = app.put(&api("/addresses"), body.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated, body);
}

#[tokio::test]
async fn update_and_delete_of_missing_address_are_not_found_without_mutation() {
    let app = TestApp::new();
    let observer = app.store.seed_observer("mama").await;
    let mut body = address_body(observer);
    body["id"] = json!(999);

    let (status, _) = app.put(&api("/addresses"), body).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.delete(&api("/addresses/999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(app.store.mutations(), 0);
}

#[tokio::test]
async fn delete_then_get_is_not_found() {
    let app = TestApp::new();
    let observer = app.store.seed_observer("mama").await;
    let (_, created) = app.post(&api("/addresses"), address_body(observer)).await;
    let id = created["id"].as_i64().unwrap();

    let (status, body) = app.delete(&api(&format!("/addresses/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true, "id": id }));

    let (status, error) = app.get(&api(&format!("/addresses/{}", id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["code"], json!("NOT_FOUND"));
}

#[tokio::test]
async fn out_of_range_id_is_a_bad_request_envelope() {
    let app = TestApp::new();

    let (status, body) = app.delete(&api("/addresses/99999999999999999999")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("BAD_REQUEST"));
    assert_eq!(app.store.mutations(), 0);
}
