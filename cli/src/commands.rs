use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::{bail, Context, Result};
use dialoguer::Confirm;
use hsctl_core::{ClientError, HubSpotClient, PropertyValue};

use crate::cli::{ContactsCommand, PropertyArgs};
use crate::output::{render_contacts, render_properties, Format};

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

pub fn run_contacts(client: &HubSpotClient, command: ContactsCommand) -> Result<()> {
    match command {
        ContactsCommand::List { limit, all, format } => {
            let contacts = if all {
                client.list_all_contacts(limit)
            } else {
                client.list_contacts(limit, None).map(|page| page.results)
            }
            .map_err(failed("list contacts"))?;
            println!("{}", render_contacts(&contacts, format)?);
        }
        ContactsCommand::Properties { format } => {
            let properties = client.list_properties().map_err(failed("list properties"))?;
            println!("{}", render_properties(&properties, format)?);
        }
        ContactsCommand::Create(args) => {
            let contact = create(client, &args)?;
            println!("Contact created successfully:");
            println!("{}", render_contacts(&[contact], Format::Table)?);
        }
        ContactsCommand::Update { id, properties } => {
            let contact = update(client, &id, &properties)?;
            println!("Contact updated successfully:");
            println!("{}", render_contacts(&[contact], Format::Table)?);
        }
        ContactsCommand::Delete { id, force } => {
            if !force && !confirm_delete(client, &id).context("failed to delete contact")? {
                println!("Deletion cancelled.");
                return Ok(());
            }
            client.delete_contact(&id).map_err(failed("delete contact"))?;
            println!("Contact {id} deleted successfully.");
        }
        ContactsCommand::Query {
            query,
            limit,
            format,
        } => {
            let page = client
                .search_contacts(&query, limit)
                .map_err(failed("search contacts"))?;
            println!("{}", render_contacts(&page.results, format)?);
        }
    }
    Ok(())
}

pub fn create(client: &HubSpotClient, args: &PropertyArgs) -> Result<hsctl_core::Contact> {
    let properties = args.to_properties();
    if properties.is_empty() {
        bail!("at least one property is required to create a contact");
    }
    client
        .create_contact(&properties)
        .map_err(failed("create contact"))
}

pub fn update(
    client: &HubSpotClient,
    id: &str,
    args: &PropertyArgs,
) -> Result<hsctl_core::Contact> {
    let properties = args.to_properties();
    if properties.is_empty() {
        bail!("at least one property is required to update a contact");
    }
    client
        .update_contact(id, &properties)
        .map_err(failed("update contact"))
}

fn confirm_delete(client: &HubSpotClient, id: &str) -> Result<bool> {
    let prompt = delete_prompt(client, id)?;
    if !(io::stdin().is_terminal() && io::stderr().is_terminal()) {
        return read_confirmation(&prompt, io::stdin().lock(), io::stderr());
    }
    let answer = Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact_opt()
        .context("failed to read confirmation")?;
    Ok(answer.unwrap_or(false))
}

/// Fetch the contact and describe it for the delete confirmation.
pub fn delete_prompt(client: &HubSpotClient, id: &str) -> Result<String> {
    let contact = client.get_contact(id).map_err(failed("get contact"))?;
    let email = contact
        .properties
        .get("email")
        .and_then(PropertyValue::as_str)
        .unwrap_or("N/A");
    Ok(format!(
        "Are you sure you want to delete contact {id} (email: {email})?"
    ))
}

/// Line-based confirmation for piped input. Only `y` or `yes` confirm.
pub fn read_confirmation(
    prompt: &str,
    mut input: impl BufRead,
    mut output: impl Write,
) -> Result<bool> {
    write!(output, "{prompt} (y/N): ")?;
    output.flush()?;
    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("failed to read confirmation")?;
    let answer = line.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}

/// Wrap a client error with the action that failed.
fn failed(action: &str) -> impl FnOnce(ClientError) -> anyhow::Error + '_ {
    move |err| {
        let hint = if err.is_timeout() { " (request timed out)" } else { "" };
        anyhow::Error::new(err).context(format!("failed to {action}{hint}"))
    }
}

pub fn print_version() {
    println!("hsctl version {}", env!("CARGO_PKG_VERSION"));
    println!("Commit: {}", option_env!("HSCTL_COMMIT").unwrap_or("unknown"));
    println!("Build Date: {}", option_env!("HSCTL_BUILD_DATE").unwrap_or("unknown"));
    println!(
        "Platform: {}/{}",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
}
