//! In-memory stand-in for the HubSpot CRM v3 contacts API.
//!
//! Serves the contacts CRUD, search and properties endpoints from a
//! `BTreeMap`, records every request it sees, and optionally insists on a
//! bearer token. Error bodies follow the CRM's `{"status":"error",...}` shape.

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, RwLock,
    },
};

use axum::{
    extract::{rejection::JsonRejection, Path, Query, Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;
use tracing::debug;

pub const CONTACTS_PATH: &str = "/crm/v3/objects/contacts";
pub const SEARCH_PATH: &str = "/crm/v3/objects/contacts/search";
pub const PROPERTIES_PATH: &str = "/crm/v3/properties/contacts";

const DEFAULT_PAGE_SIZE: usize = 10;
const FIRST_ID: u64 = 101;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    pub properties: Map<String, Value>,
    pub created_at: String,
    pub updated_at: String,
    pub archived: bool,
}

#[derive(Debug, Deserialize)]
pub struct ContactInput {
    pub properties: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ContactPage {
    pub results: Vec<Contact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paging: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<usize>,
    pub after: Option<String>,
    pub properties: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GetParams {
    pub properties: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchBody {
    #[serde(default)]
    pub filter_groups: Vec<FilterGroup>,
    pub limit: Option<usize>,
    pub after: Option<String>,
    pub properties: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct FilterGroup {
    pub filters: Vec<Filter>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    pub property_name: String,
    pub operator: String,
    #[serde(default)]
    pub value: Option<Value>,
}

/// A request as seen by the server, before any handler runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
}

impl RecordedRequest {
    /// Decoded value of query parameter `key`.
    pub fn query_param(&self, key: &str) -> Option<String> {
        let uri: axum::http::Uri = format!("/?{}", self.query.as_deref()?).parse().ok()?;
        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(&uri).ok()?;
        pairs.into_iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

/// Server state: the contact store, the request log and the expected token.
#[derive(Debug)]
pub struct MockState {
    contacts: RwLock<BTreeMap<u64, Contact>>,
    next_id: AtomicU64,
    token: Option<String>,
    requests: Mutex<Vec<RecordedRequest>>,
}

pub type Shared = Arc<MockState>;

impl MockState {
    /// State that accepts any (or no) authorization header.
    pub fn shared() -> Shared {
        Self::build(None)
    }

    /// State that answers 401 unless `Authorization: Bearer <token>` is sent.
    pub fn with_token(token: &str) -> Shared {
        Self::build(Some(token.to_string()))
    }

    fn build(token: Option<String>) -> Shared {
        Arc::new(MockState {
            contacts: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(FIRST_ID),
            token,
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Store a new contact directly, bypassing HTTP.
    pub fn seed(&self, properties: Map<String, Value>) -> Contact {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = timestamp();
        let contact = Contact {
            id: id.to_string(),
            properties,
            created_at: now.clone(),
            updated_at: now,
            archived: false,
        };
        self.contacts
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, contact.clone());
        contact
    }

    pub fn contact_count(&self) -> usize {
        self.contacts.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Snapshot of every request received so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn record(&self, request: RecordedRequest) {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);
    }
}

pub fn app() -> Router {
    router(MockState::shared())
}

pub fn router(state: Shared) -> Router {
    Router::new()
        .route(CONTACTS_PATH, get(list_contacts).post(create_contact))
        .route(SEARCH_PATH, post(search_contacts))
        .route(
            "/crm/v3/objects/contacts/{id}",
            get(get_contact).patch(update_contact).delete(delete_contact),
        )
        .route(PROPERTIES_PATH, get(list_properties))
        .layer(middleware::from_fn_with_state(state.clone(), audit))
        .with_state(state)
}

pub async fn run_with_state(listener: TcpListener, state: Shared) -> Result<(), std::io::Error> {
    axum::serve(listener, router(state)).await
}

/// Record the request, then reject it if a token is required and missing.
async fn audit(State(state): State<Shared>, req: Request, next: Next) -> Response {
    let authorization = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let recorded = RecordedRequest {
        method: req.method().to_string(),
        path: req.uri().path().to_string(),
        query: req.uri().query().map(str::to_string),
        authorization: authorization.clone(),
    };
    debug!(method = %recorded.method, path = %recorded.path, "mock request");
    state.record(recorded);

    if let Some(token) = &state.token {
        let expected = format!("Bearer {token}");
        if authorization.as_deref() != Some(expected.as_str()) {
            return error(
                StatusCode::UNAUTHORIZED,
                "INVALID_AUTHENTICATION",
                "Authentication credentials not found.",
            )
            .into_response();
        }
    }
    next.run(req).await
}

fn error(status: StatusCode, category: &str, message: &str) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(json!({"status": "error", "message": message, "category": category})),
    )
}

fn not_found(id: &str) -> (StatusCode, Json<Value>) {
    error(
        StatusCode::NOT_FOUND,
        "OBJECT_NOT_FOUND",
        &format!("resource not found: contact {id}"),
    )
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Malformed or mistyped JSON bodies are a 400, as the CRM answers them.
fn bad_body(rejection: JsonRejection) -> (StatusCode, Json<Value>) {
    error(
        StatusCode::BAD_REQUEST,
        "VALIDATION_ERROR",
        &format!("invalid request body: {}", rejection.body_text()),
    )
}

fn parse_id(id: &str) -> Result<u64, (StatusCode, Json<Value>)> {
    id.parse().map_err(|_| not_found(id))
}

/// Keep only the properties named in a comma-separated list.
fn project(mut contact: Contact, wanted: Option<&[String]>) -> Contact {
    if let Some(wanted) = wanted {
        contact.properties.retain(|k, _| wanted.iter().any(|w| w == k));
    }
    contact
}

fn split_names(list: Option<&str>) -> Option<Vec<String>> {
    list.map(|l| {
        l.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}

fn next_paging(after: String) -> Value {
    json!({"next": {"after": after, "link": format!("?after={after}")}})
}

async fn list_contacts(
    State(state): State<Shared>,
    Query(params): Query<ListParams>,
) -> Result<Json<ContactPage>, (StatusCode, Json<Value>)> {
    let start = match params.after.as_deref() {
        Some(after) => after.parse::<u64>().map_err(|_| {
            error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", "invalid after cursor")
        })?,
        None => 0,
    };
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
    let wanted = split_names(params.properties.as_deref());

    let contacts = state.contacts.read().unwrap_or_else(|e| e.into_inner());
    let mut remaining = contacts.range(start..);
    let results: Vec<Contact> = remaining
        .by_ref()
        .take(limit)
        .map(|(_, c)| project(c.clone(), wanted.as_deref()))
        .collect();
    let paging = remaining.next().map(|(id, _)| next_paging(id.to_string()));

    Ok(Json(ContactPage {
        results,
        paging,
        total: None,
    }))
}

async fn get_contact(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Query(params): Query<GetParams>,
) -> Result<Json<Contact>, (StatusCode, Json<Value>)> {
    let key = parse_id(&id)?;
    let contacts = state.contacts.read().unwrap_or_else(|e| e.into_inner());
    let contact = contacts.get(&key).cloned().ok_or_else(|| not_found(&id))?;
    let wanted = split_names(params.properties.as_deref());
    Ok(Json(project(contact, wanted.as_deref())))
}

async fn create_contact(
    State(state): State<Shared>,
    input: Result<Json<ContactInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Contact>), (StatusCode, Json<Value>)> {
    let Json(input) = input.map_err(bad_body)?;
    Ok((StatusCode::CREATED, Json(state.seed(input.properties))))
}

async fn update_contact(
    State(state): State<Shared>,
    Path(id): Path<String>,
    input: Result<Json<ContactInput>, JsonRejection>,
) -> Result<Json<Contact>, (StatusCode, Json<Value>)> {
    let key = parse_id(&id)?;
    let Json(input) = input.map_err(bad_body)?;
    let mut contacts = state.contacts.write().unwrap_or_else(|e| e.into_inner());
    let contact = contacts.get_mut(&key).ok_or_else(|| not_found(&id))?;
    contact.properties.extend(input.properties);
    contact.updated_at = timestamp();
    Ok(Json(contact.clone()))
}

async fn delete_contact(
    State(state): State<Shared>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<Value>)> {
    let key = parse_id(&id)?;
    let mut contacts = state.contacts.write().unwrap_or_else(|e| e.into_inner());
    contacts
        .remove(&key)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| not_found(&id))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn filter_matches(contact: &Contact, filter: &Filter) -> bool {
    let actual = contact
        .properties
        .get(&filter.property_name)
        .and_then(scalar_text);
    let expected = filter.value.as_ref().and_then(scalar_text);
    match (filter.operator.as_str(), actual, expected) {
        ("EQ", Some(actual), Some(expected)) => actual == expected,
        ("NEQ", actual, expected) => actual != expected,
        ("CONTAINS_TOKEN", Some(actual), Some(expected)) => {
            let token = expected.trim_matches('*').to_lowercase();
            actual.to_lowercase().contains(&token)
        }
        ("HAS_PROPERTY", actual, _) => actual.is_some(),
        ("NOT_HAS_PROPERTY", actual, _) => actual.is_none(),
        _ => false,
    }
}

/// Groups are ORed, filters within a group are ANDed. No groups matches all.
fn search_matches(contact: &Contact, groups: &[FilterGroup]) -> bool {
    groups.is_empty()
        || groups
            .iter()
            .any(|g| g.filters.iter().all(|f| filter_matches(contact, f)))
}

async fn search_contacts(
    State(state): State<Shared>,
    body: Result<Json<SearchBody>, JsonRejection>,
) -> Result<Json<ContactPage>, (StatusCode, Json<Value>)> {
    let Json(body) = body.map_err(bad_body)?;
    let offset = match body.after.as_deref() {
        Some(after) => after.parse::<usize>().map_err(|_| {
            error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", "invalid after cursor")
        })?,
        None => 0,
    };
    let limit = body.limit.unwrap_or(DEFAULT_PAGE_SIZE).max(1);

    let contacts = state.contacts.read().unwrap_or_else(|e| e.into_inner());
    let matched: Vec<&Contact> = contacts
        .values()
        .filter(|c| search_matches(c, &body.filter_groups))
        .collect();
    let total = matched.len();
    let results = matched
        .iter()
        .skip(offset)
        .take(limit)
        .map(|c| project((*c).clone(), body.properties.as_deref()))
        .collect();
    let end = offset.saturating_add(limit);
    let paging = (end < total).then(|| next_paging(end.to_string()));

    Ok(Json(ContactPage {
        results,
        paging,
        total: Some(total),
    }))
}

async fn list_properties() -> Json<Value> {
    Json(json!({"results": schema()}))
}

fn option(label: &str, value: &str, order: u32) -> Value {
    json!({"label": label, "value": value, "displayOrder": order, "hidden": false})
}

fn schema() -> Vec<Value> {
    vec![
        json!({
            "name": "email", "label": "Email", "type": "string", "fieldType": "text",
            "description": "A contact's email address", "groupName": "contactinformation"
        }),
        json!({
            "name": "firstname", "label": "First Name", "type": "string", "fieldType": "text",
            "description": "A contact's first name", "groupName": "contactinformation"
        }),
        json!({
            "name": "lastname", "label": "Last Name", "type": "string", "fieldType": "text",
            "description": "A contact's last name", "groupName": "contactinformation"
        }),
        json!({
            "name": "lifecyclestage", "label": "Lifecycle Stage", "type": "enumeration",
            "fieldType": "radio",
            "description": "The qualification of contacts to sales readiness",
            "groupName": "contactinformation",
            "options": [
                option("Subscriber", "subscriber", 0),
                option("Lead", "lead", 1),
                option("Marketing Qualified Lead", "marketingqualifiedlead", 2),
                option("Sales Qualified Lead", "salesqualifiedlead", 3),
                option("Opportunity", "opportunity", 4),
                option("Customer", "customer", 5),
                option("Evangelist", "evangelist", 6),
                option("Other", "other", 7),
            ]
        }),
        json!({
            "name": "hs_lead_status", "label": "Lead Status", "type": "enumeration",
            "fieldType": "select",
            "description": "The contact's sales, prospecting or outreach status",
            "groupName": "sales_properties",
            "options": [
                option("New", "NEW", 0),
                option("Open", "OPEN", 1),
                option("In Progress", "IN_PROGRESS", 2),
                option("Open Deal", "OPEN_DEAL", 3),
                option("Unqualified", "UNQUALIFIED", 4),
                option("Attempted to Contact", "ATTEMPTED_TO_CONTACT", 5),
                option("Connected", "CONNECTED", 6),
                option("Bad Timing", "BAD_TIMING", 7),
            ]
        }),
    ]
}
