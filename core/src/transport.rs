//! Blocking HTTP execution of `ContactsClient` requests.
//!
//! # Design
//! `HubSpotClient` pairs a `ContactsClient` with a `ureq::Agent`. Every
//! public operation is `build_*`, then `execute`, then `parse_*`; `execute`
//! is the only function that performs I/O. Status codes are never treated
//! as transport errors here so the parse step sees every response.

use std::time::Duration;

use tracing::debug;
use ureq::typestate::{WithBody, WithoutBody};
use ureq::{Agent, RequestBuilder};

use crate::client::ContactsClient;
use crate::error::ClientError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{Contact, ContactPage, Properties, Property};

/// Per-request timeout applied unless overridden.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Synchronous client for the HubSpot contacts API.
#[derive(Clone)]
pub struct HubSpotClient {
    contacts: ContactsClient,
    agent: Agent,
}

impl std::fmt::Debug for HubSpotClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubSpotClient")
            .field("contacts", &self.contacts)
            .finish_non_exhaustive()
    }
}

impl HubSpotClient {
    /// Client for `token`, talking to `base_url` or the production host.
    pub fn new(token: &str, base_url: Option<&str>) -> Self {
        let mut contacts = ContactsClient::new(token);
        if let Some(base_url) = base_url {
            contacts = contacts.with_base_url(base_url);
        }
        Self {
            contacts,
            agent: build_agent(DEFAULT_TIMEOUT),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = build_agent(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        self.contacts.base_url()
    }

    /// One page of contacts starting at `after`.
    pub fn list_contacts(&self, limit: u32, after: Option<&str>) -> Result<ContactPage, ClientError> {
        let req = self.contacts.build_list_contacts(limit, after);
        self.contacts.parse_contact_page(self.execute(req)?)
    }

    /// Every contact, following cursors until the server stops returning one.
    ///
    /// Pages are fetched one after another. The first failure is returned and
    /// the pages fetched so far are dropped.
    pub fn list_all_contacts(&self, limit: u32) -> Result<Vec<Contact>, ClientError> {
        let mut contacts = Vec::new();
        let mut after: Option<String> = None;
        loop {
            let page = self.list_contacts(limit, after.as_deref())?;
            debug!(count = page.results.len(), after = ?after, "fetched contacts page");
            let next = page.next_cursor().map(str::to_string);
            contacts.extend(page.results);
            match next {
                Some(cursor) => after = Some(cursor),
                None => return Ok(contacts),
            }
        }
    }

    pub fn get_contact(&self, id: &str) -> Result<Contact, ClientError> {
        let req = self.contacts.build_get_contact(id);
        self.contacts.parse_contact(self.execute(req)?)
    }

    pub fn create_contact(&self, properties: &Properties) -> Result<Contact, ClientError> {
        let req = self.contacts.build_create_contact(properties)?;
        self.contacts.parse_contact(self.execute(req)?)
    }

    /// Only the supplied properties change on the server.
    pub fn update_contact(&self, id: &str, properties: &Properties) -> Result<Contact, ClientError> {
        let req = self.contacts.build_update_contact(id, properties)?;
        self.contacts.parse_contact(self.execute(req)?)
    }

    pub fn delete_contact(&self, id: &str) -> Result<(), ClientError> {
        let req = self.contacts.build_delete_contact(id);
        self.contacts.parse_delete_contact(self.execute(req)?)
    }

    pub fn search_contacts(&self, query: &str, limit: u32) -> Result<ContactPage, ClientError> {
        let req = self.contacts.build_search_contacts(query, limit)?;
        self.contacts.parse_contact_page(self.execute(req)?)
    }

    pub fn list_properties(&self) -> Result<Vec<Property>, ClientError> {
        let req = self.contacts.build_list_properties();
        self.contacts.parse_list_properties(self.execute(req)?)
    }

    /// Send `req` and read the whole response, whatever its status.
    fn execute(&self, req: HttpRequest) -> Result<HttpResponse, ClientError> {
        debug!(method = req.method.as_str(), url = %req.url, "sending request");

        let result = match req.method {
            HttpMethod::Get => send_empty(self.agent.get(&req.url), &req),
            HttpMethod::Delete => send_empty(self.agent.delete(&req.url), &req),
            HttpMethod::Post => send_body(self.agent.post(&req.url), &req),
            HttpMethod::Patch => send_body(self.agent.patch(&req.url), &req),
        };
        let mut response = result?;

        let status = response.status().as_u16();
        let body = response.body_mut().read_to_vec()?;
        debug!(status, bytes = body.len(), "received response");

        Ok(HttpResponse { status, body })
    }
}

fn build_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .http_status_as_error(false)
        .timeout_global(Some(timeout))
        .build()
        .new_agent()
}

fn decorate<B>(mut builder: RequestBuilder<B>, req: &HttpRequest) -> RequestBuilder<B> {
    for (key, value) in &req.query {
        builder = builder.query(key, value);
    }
    for (name, value) in &req.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn send_empty(
    builder: RequestBuilder<WithoutBody>,
    req: &HttpRequest,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    decorate(builder, req).call()
}

fn send_body(
    builder: RequestBuilder<WithBody>,
    req: &HttpRequest,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    let builder = decorate(builder, req);
    match &req.body {
        Some(body) => builder.send(body.as_bytes()),
        None => builder.send_empty(),
    }
}
