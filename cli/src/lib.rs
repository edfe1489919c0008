//! Command layer for `hsctl`.
//!
//! - `cli`: argument definitions and dispatch.
//! - `commands`: one function per contacts subcommand, calling into
//!   `hsctl_core::HubSpotClient`.
//! - `config`: `config.toml` loading and API key resolution.
//! - `output`: table and JSON rendering.
//! - `logging`: tracing subscriber setup.

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod output;
