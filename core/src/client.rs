//! Stateless request builder and response parser for the contacts API.
//!
//! # Design
//! `ContactsClient` holds only the bearer token and `base_url`. Each
//! operation is split into a `build_*` method that produces an `HttpRequest`
//! and a `parse_*` method that consumes an `HttpResponse`. Every `build_*`
//! goes through `request`, which attaches the auth header and, when there is
//! a body, the JSON content type. Every `parse_*` goes through
//! `check_status`.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ClientError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::query::parse_search_query;
use crate::types::{
    Contact, ContactInput, ContactPage, Properties, PropertiesResponse, Property, SearchRequest,
    DEFAULT_PROPERTIES,
};

/// Production API host.
pub const DEFAULT_BASE_URL: &str = "https://api.hubapi.com";

const CONTACTS_PATH: &str = "/crm/v3/objects/contacts";
const SEARCH_PATH: &str = "/crm/v3/objects/contacts/search";
const PROPERTIES_PATH: &str = "/crm/v3/properties/contacts";

/// Builds requests for and parses responses from the contacts API without
/// touching the network.
#[derive(Clone)]
pub struct ContactsClient {
    token: String,
    base_url: String,
}

impl std::fmt::Debug for ContactsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContactsClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ContactsClient {
    pub fn new(token: &str) -> Self {
        Self {
            token: token.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_list_contacts(&self, limit: u32, after: Option<&str>) -> HttpRequest {
        let mut query = vec![("limit".to_string(), limit.to_string())];
        if let Some(after) = after.filter(|a| !a.is_empty()) {
            query.push(("after".to_string(), after.to_string()));
        }
        query.push(properties_param());
        self.request(HttpMethod::Get, CONTACTS_PATH, query)
    }

    pub fn build_get_contact(&self, id: &str) -> HttpRequest {
        self.request(
            HttpMethod::Get,
            &contact_path(id),
            vec![properties_param()],
        )
    }

    pub fn build_create_contact(&self, properties: &Properties) -> Result<HttpRequest, ClientError> {
        self.request_with_body(HttpMethod::Post, CONTACTS_PATH, &ContactInput { properties })
    }

    pub fn build_update_contact(
        &self,
        id: &str,
        properties: &Properties,
    ) -> Result<HttpRequest, ClientError> {
        self.request_with_body(
            HttpMethod::Patch,
            &contact_path(id),
            &ContactInput { properties },
        )
    }

    pub fn build_delete_contact(&self, id: &str) -> HttpRequest {
        self.request(HttpMethod::Delete, &contact_path(id), Vec::new())
    }

    pub fn build_search_contacts(&self, query: &str, limit: u32) -> Result<HttpRequest, ClientError> {
        let body = SearchRequest {
            filter_groups: vec![parse_search_query(query)],
            limit,
            properties: DEFAULT_PROPERTIES.iter().map(|p| p.to_string()).collect(),
        };
        self.request_with_body(HttpMethod::Post, SEARCH_PATH, &body)
    }

    pub fn build_list_properties(&self) -> HttpRequest {
        self.request(HttpMethod::Get, PROPERTIES_PATH, Vec::new())
    }

    /// Parse a list or search response.
    pub fn parse_contact_page(&self, response: HttpResponse) -> Result<ContactPage, ClientError> {
        decode(response)
    }

    /// Parse a get, create or update response.
    pub fn parse_contact(&self, response: HttpResponse) -> Result<Contact, ClientError> {
        decode(response)
    }

    /// Any 2xx counts; the body is not read.
    pub fn parse_delete_contact(&self, response: HttpResponse) -> Result<(), ClientError> {
        check_status(response).map(drop)
    }

    pub fn parse_list_properties(&self, response: HttpResponse) -> Result<Vec<Property>, ClientError> {
        decode::<PropertiesResponse>(response).map(|r| r.results)
    }

    fn request(&self, method: HttpMethod, path: &str, query: Vec<(String, String)>) -> HttpRequest {
        HttpRequest {
            method,
            url: format!("{}{path}", self.base_url),
            query,
            headers: vec![(
                "authorization".to_string(),
                format!("Bearer {}", self.token),
            )],
            body: None,
        }
    }

    fn request_with_body<B: Serialize>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
    ) -> Result<HttpRequest, ClientError> {
        let body = serde_json::to_string(body).map_err(ClientError::Encoding)?;
        let mut req = self.request(method, path, Vec::new());
        req.headers
            .push(("content-type".to_string(), "application/json".to_string()));
        req.body = Some(body);
        Ok(req)
    }
}

fn properties_param() -> (String, String) {
    ("properties".to_string(), DEFAULT_PROPERTIES.join(","))
}

/// Return the raw body of a 2xx response, or an `Api` error with the status
/// and body text.
fn check_status(response: HttpResponse) -> Result<Vec<u8>, ClientError> {
    if response.is_success() {
        return Ok(response.body);
    }
    Err(ClientError::Api {
        status: response.status,
        body: response.text(),
    })
}

fn decode<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ClientError> {
    let body = check_status(response)?;
    serde_json::from_slice(&body).map_err(ClientError::Decoding)
}

/// Path of a single contact. Bytes outside the unreserved set are
/// percent-encoded so an id cannot alter the path or add a query.
fn contact_path(id: &str) -> String {
    let mut path = format!("{CONTACTS_PATH}/");
    for b in id.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~') {
            path.push(char::from(b));
        } else {
            path.push_str(&format!("%{b:02X}"));
        }
    }
    path
}
