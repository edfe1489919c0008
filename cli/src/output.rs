//! Table and JSON rendering of command results.

use anyhow::Result;
use clap::ValueEnum;
use hsctl_core::{Contact, Property};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Table,
    Json,
}

pub fn render_contacts(contacts: &[Contact], format: Format) -> Result<String> {
    if format == Format::Json {
        return Ok(serde_json::to_string_pretty(contacts)?);
    }

    let mut out = format!(
        "{:<20} {:<40} {:<20} {:<20} {:<20}\n",
        "ID", "Email", "First Name", "Last Name", "Lifecycle Stage"
    );
    out.push_str(&"-".repeat(120));
    out.push('\n');
    for contact in contacts {
        out.push_str(&format!(
            "{:<20} {:<40} {:<20} {:<20} {:<20}\n",
            contact.id,
            contact.property("email"),
            contact.property("firstname"),
            contact.property("lastname"),
            contact.property("lifecyclestage"),
        ));
    }
    out.push_str(&format!("\nTotal: {} contact(s)", contacts.len()));
    Ok(out)
}

pub fn render_properties(properties: &[Property], format: Format) -> Result<String> {
    if format == Format::Json {
        return Ok(serde_json::to_string_pretty(properties)?);
    }

    let mut out = format!(
        "{:<30} {:<30} {:<20} {:<15}\n",
        "Name", "Label", "Type", "Field Type"
    );
    out.push_str(&"-".repeat(95));
    out.push('\n');
    for p in properties {
        out.push_str(&format!(
            "{:<30} {:<30} {:<20} {:<15}\n",
            p.name, p.label, p.value_type, p.field_type
        ));
    }
    out.push_str(&format!("\nTotal: {} property(ies)", properties.len()));
    Ok(out)
}
