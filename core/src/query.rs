//! Turns a free-text search query into a CRM filter group.
//!
//! `property=value` becomes an exact match on that property. Anything else is
//! a token match against `email`. Only one condition is ever produced.

use crate::types::{Filter, FilterGroup, FilterOperator};

/// Property searched when the query names none.
pub const DEFAULT_SEARCH_PROPERTY: &str = "email";

/// Parse `query` into the single filter group sent to the search endpoint.
pub fn parse_search_query(query: &str) -> FilterGroup {
    let filter = match query.split_once('=') {
        Some((property, value)) => Filter {
            property_name: property.trim().to_string(),
            operator: FilterOperator::Eq,
            value: value.trim().to_string(),
        },
        None => Filter {
            property_name: DEFAULT_SEARCH_PROPERTY.to_string(),
            operator: FilterOperator::ContainsToken,
            value: query.trim().to_string(),
        },
    };
    FilterGroup {
        filters: vec![filter],
    }
}
