use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use hsctl_core::{HubSpotClient, Properties};

use crate::commands;
use crate::config::Config;
use crate::output::Format;

// =============================================================================
// CLI CONFIGURATION
// =============================================================================

/// A CLI tool for managing HubSpot contacts.
///
/// Lists, creates, updates, deletes and searches contacts through the HubSpot
/// CRM v3 API.
#[derive(Debug, Parser)]
#[command(name = "hsctl", version)]
pub struct Cli {
    /// HubSpot API key
    #[arg(long, global = true, env = "HUBSPOT_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Config file (default is <config dir>/hsctl/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// API endpoint override
    #[arg(long, global = true, env = "HUBSPOT_BASE_URL", value_name = "URL")]
    pub base_url: Option<String>,

    /// Log requests to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage HubSpot contacts
    Contacts {
        #[command(subcommand)]
        command: ContactsCommand,
    },
    /// Print version and build information
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ContactsCommand {
    /// List contacts
    List {
        /// Maximum number of contacts per page
        #[arg(short, long, default_value_t = 100)]
        limit: u32,
        /// Follow pagination until every contact is retrieved
        #[arg(short, long)]
        all: bool,
        #[arg(short, long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },
    /// List all contact properties
    Properties {
        #[arg(short, long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },
    /// Create a new contact
    Create(PropertyArgs),
    /// Update a contact's properties
    Update {
        /// Contact ID
        id: String,
        #[command(flatten)]
        properties: PropertyArgs,
    },
    /// Delete a contact by ID
    Delete {
        /// Contact ID
        id: String,
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
    /// Search for contacts (`property=value`, or text matched against email)
    Query {
        query: String,
        /// Maximum number of results
        #[arg(short, long, default_value_t = 100)]
        limit: u32,
        #[arg(short, long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct PropertyArgs {
    /// Email address
    #[arg(short, long)]
    pub email: Option<String>,
    /// First name
    #[arg(long)]
    pub firstname: Option<String>,
    /// Last name
    #[arg(long)]
    pub lastname: Option<String>,
    /// Lifecycle stage (e.g. lead, customer)
    #[arg(long)]
    pub lifecycle_stage: Option<String>,
    /// Additional properties (format: key1=value1,key2=value2)
    #[arg(short, long)]
    pub properties: Option<String>,
}

impl PropertyArgs {
    /// Collect the named flags, then the `--properties` pairs, skipping empty
    /// values and pairs without `=`.
    pub fn to_properties(&self) -> Properties {
        let mut props = Properties::new();
        let named = [
            ("email", &self.email),
            ("firstname", &self.firstname),
            ("lastname", &self.lastname),
            ("lifecyclestage", &self.lifecycle_stage),
        ];
        for (name, value) in named {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                props.insert(name.to_string(), value.into());
            }
        }
        if let Some(extra) = &self.properties {
            for pair in extra.split(',') {
                if let Some((key, value)) = pair.split_once('=') {
                    props.insert(key.trim().to_string(), value.trim().into());
                }
            }
        }
        props
    }
}

// =============================================================================
// DISPATCH
// =============================================================================

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Command::Version => {
                commands::print_version();
                Ok(())
            }
            Command::Contacts { command } => {
                let config = Config::load(self.config.as_deref())?;
                let api_key = config.resolve_api_key(self.api_key.as_deref())?;
                let base_url = self.base_url.or(config.base_url);
                let client = HubSpotClient::new(&api_key, base_url.as_deref());
                commands::run_contacts(&client, command)
            }
        }
    }
}
