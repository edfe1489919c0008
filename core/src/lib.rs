//! Blocking client for the HubSpot CRM v3 contacts API.
//!
//! # Overview
//! `ContactsClient` builds `HttpRequest` values and parses `HttpResponse`
//! values without touching the network. `HubSpotClient` executes them over
//! `ureq` with a bounded timeout and exposes one method per operation:
//! list, get, create, update, delete, search and property listing.
//!
//! # Design
//! - Every request carries `Authorization: Bearer <token>`.
//! - Any 2xx status is success; anything else is `ClientError::Api` with the
//!   raw body. No retries.
//! - Pagination cursors are opaque and forwarded verbatim.

pub mod client;
pub mod error;
pub mod http;
pub mod query;
pub mod transport;
pub mod types;

pub use client::{ContactsClient, DEFAULT_BASE_URL};
pub use error::ClientError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use query::parse_search_query;
pub use transport::{HubSpotClient, DEFAULT_TIMEOUT};
pub use types::{
    Contact, ContactPage, Filter, FilterGroup, FilterOperator, NextPage, Paging, Properties,
    Property, PropertyOption, PropertyValue, SearchRequest, DEFAULT_PROPERTIES,
};
