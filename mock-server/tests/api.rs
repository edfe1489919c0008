use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, router, Contact, ContactPage, MockState};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn seed_emails(state: &MockState, emails: &[&str]) {
    for email in emails {
        let mut props = serde_json::Map::new();
        props.insert("email".into(), json!(email));
        props.insert("firstname".into(), json!("Test"));
        state.seed(props);
    }
}

// --- list ---

#[tokio::test]
async fn list_contacts_empty() {
    let resp = app()
        .oneshot(get("/crm/v3/objects/contacts"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let page: ContactPage = body_json(resp).await;
    assert!(page.results.is_empty());
    assert!(page.paging.is_none());
}

#[tokio::test]
async fn list_contacts_pages_with_after_cursor() {
    let state = MockState::shared();
    seed_emails(&state, &["a@x.com", "b@x.com", "c@x.com"]);

    let resp = router(state.clone())
        .oneshot(get("/crm/v3/objects/contacts?limit=2"))
        .await
        .unwrap();
    let page: Value = body_json(resp).await;
    assert_eq!(page["results"].as_array().unwrap().len(), 2);
    let after = page["paging"]["next"]["after"].as_str().unwrap().to_string();
    assert_eq!(after, "103");

    let resp = router(state)
        .oneshot(get(&format!("/crm/v3/objects/contacts?limit=2&after={after}")))
        .await
        .unwrap();
    let page: Value = body_json(resp).await;
    assert_eq!(page["results"][0]["properties"]["email"], "c@x.com");
    assert!(page.get("paging").is_none());
}

#[tokio::test]
async fn list_contacts_restricts_properties() {
    let state = MockState::shared();
    seed_emails(&state, &["a@x.com"]);

    let resp = router(state)
        .oneshot(get("/crm/v3/objects/contacts?properties=email%2Clastname"))
        .await
        .unwrap();
    let page: ContactPage = body_json(resp).await;
    let props = &page.results[0].properties;
    assert!(props.contains_key("email"));
    assert!(!props.contains_key("firstname"));
}

#[tokio::test]
async fn list_contacts_rejects_bad_cursor() {
    let resp = app()
        .oneshot(get("/crm/v3/objects/contacts?after=nope"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- create ---

#[tokio::test]
async fn create_contact_returns_201() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/crm/v3/objects/contacts",
            r#"{"properties":{"email":"a@b.com","firstname":"A"}}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let contact: Contact = body_json(resp).await;
    assert_eq!(contact.properties["email"], "a@b.com");
    assert!(!contact.id.is_empty());
    assert!(!contact.created_at.is_empty());
}

#[tokio::test]
async fn create_contact_missing_properties_is_400() {
    let resp = app()
        .oneshot(json_request("POST", "/crm/v3/objects/contacts", r#"{}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = body_json(resp).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["category"], "VALIDATION_ERROR");
    assert!(body["message"].as_str().unwrap().contains("properties"));
}

#[tokio::test]
async fn update_contact_with_malformed_json_is_400() {
    let state = MockState::shared();
    let contact = state.seed(serde_json::Map::new());
    let resp = router(state)
        .oneshot(json_request(
            "PATCH",
            &format!("/crm/v3/objects/contacts/{}", contact.id),
            r#"{"properties":"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = body_json(resp).await;
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn search_with_wrong_field_types_is_400() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/crm/v3/objects/contacts/search",
            r#"{"filterGroups":"nope"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = body_json(resp).await;
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn search_cursor_past_the_end_returns_empty_page() {
    let state = MockState::shared();
    seed_emails(&state, &["a@x.com", "b@x.com"]);
    let resp = router(state)
        .oneshot(json_request(
            "POST",
            "/crm/v3/objects/contacts/search",
            &json!({"filterGroups": [], "limit": 10, "after": u64::MAX.to_string()}).to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let page: ContactPage = body_json(resp).await;
    assert!(page.results.is_empty());
    assert!(page.paging.is_none());
    assert_eq!(page.total, Some(2));
}

// --- get ---

#[tokio::test]
async fn get_contact_not_found() {
    let resp = app()
        .oneshot(get("/crm/v3/objects/contacts/999"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = body_json(resp).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["category"], "OBJECT_NOT_FOUND");
}

#[tokio::test]
async fn get_contact_non_numeric_id_not_found() {
    let resp = app()
        .oneshot(get("/crm/v3/objects/contacts/not-an-id"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- update ---

#[tokio::test]
async fn update_contact_not_found() {
    let resp = app()
        .oneshot(json_request(
            "PATCH",
            "/crm/v3/objects/contacts/999",
            r#"{"properties":{"firstname":"Nope"}}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- delete ---

#[tokio::test]
async fn delete_contact_not_found() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/crm/v3/objects/contacts/999")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- search ---

#[tokio::test]
async fn search_contains_token_on_email() {
    let state = MockState::shared();
    seed_emails(&state, &["alice@example.com", "bob@example.com"]);

    let resp = router(state)
        .oneshot(json_request(
            "POST",
            "/crm/v3/objects/contacts/search",
            r#"{"filterGroups":[{"filters":[{"propertyName":"email","operator":"CONTAINS_TOKEN","value":"alice"}]}],"limit":10}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let page: ContactPage = body_json(resp).await;
    assert_eq!(page.total, Some(1));
    assert_eq!(page.results[0].properties["email"], "alice@example.com");
}

#[tokio::test]
async fn search_respects_limit_and_reports_paging() {
    let state = MockState::shared();
    seed_emails(&state, &["a@example.com", "b@example.com", "c@example.com"]);

    let resp = router(state)
        .oneshot(json_request(
            "POST",
            "/crm/v3/objects/contacts/search",
            r#"{"filterGroups":[{"filters":[{"propertyName":"email","operator":"CONTAINS_TOKEN","value":"example"}]}],"limit":2}"#,
        ))
        .await
        .unwrap();

    let page: Value = body_json(resp).await;
    assert_eq!(page["total"], 3);
    assert_eq!(page["results"].as_array().unwrap().len(), 2);
    assert_eq!(page["paging"]["next"]["after"], "2");
}

// --- properties ---

#[tokio::test]
async fn list_properties_includes_lifecycle_options() {
    let resp = app()
        .oneshot(get("/crm/v3/properties/contacts"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    let results = body["results"].as_array().unwrap();
    let stage = results
        .iter()
        .find(|p| p["name"] == "lifecyclestage")
        .unwrap();
    assert_eq!(stage["fieldType"], "radio");
    assert!(stage["options"]
        .as_array()
        .unwrap()
        .iter()
        .any(|o| o["value"] == "customer"));
}

// --- auth and recording ---

#[tokio::test]
async fn token_required_when_configured() {
    let state = MockState::with_token("s3cret");

    let resp = router(state.clone())
        .oneshot(get("/crm/v3/properties/contacts"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = router(state.clone())
        .oneshot(
            Request::builder()
                .uri("/crm/v3/properties/contacts")
                .header(http::header::AUTHORIZATION, "Bearer s3cret")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let requests = state.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].authorization, None);
    assert_eq!(requests[1].authorization.as_deref(), Some("Bearer s3cret"));
}

// --- full CRUD lifecycle ---

#[tokio::test]
async fn crud_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    // create
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/crm/v3/objects/contacts",
            r#"{"properties":{"email":"walk@dog.com","firstname":"Walk"}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Contact = body_json(resp).await;
    let id = created.id.clone();

    // update — partial: only lastname
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "PATCH",
            &format!("/crm/v3/objects/contacts/{id}"),
            r#"{"properties":{"lastname":"Dog"}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Contact = body_json(resp).await;
    assert_eq!(updated.properties["firstname"], "Walk"); // unchanged
    assert_eq!(updated.properties["lastname"], "Dog");
    assert_eq!(updated.created_at, created.created_at);

    // get
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&format!("/crm/v3/objects/contacts/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: Contact = body_json(resp).await;
    assert_eq!(fetched.id, id);

    // delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(
            Request::builder()
                .method("DELETE")
                .uri(&format!("/crm/v3/objects/contacts/{id}"))
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    // get after delete — 404
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&format!("/crm/v3/objects/contacts/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
