pub mod address_cmd;
pub mod leads_cmd;
mod output;
pub mod patch_args;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use clap::Subcommand;
use tracing_subscriber::EnvFilter;

use crate::address_cmd::AddressCli;
use crate::leads_cmd::BulkDeleteArgs;
use crate::leads_cmd::BulkUpdateArgs;
use crate::leads_cmd::ListArgs;
use crate::leads_cmd::SelectAllArgs;
use crate::leads_cmd::UpdateArgs;

/// Browse, filter, and bulk-edit the leads of a unit.
#[derive(Debug, Parser)]
#[command(name = "leaddesk", version)]
pub struct Cli {
    /// Directory holding config.toml and views.toml.
    /// Defaults to $LEADDESK_HOME, then ~/.leaddesk.
    #[arg(long, global = true, value_name = "DIR")]
    pub config_home: Option<PathBuf>,

    /// Unit to work in. Defaults to `unit_id` from config.toml.
    #[arg(long, global = true, value_name = "UNIT_ID")]
    pub unit: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show one page of leads and remember the view for the unit.
    List(ListArgs),

    /// Normalize or edit addresses without contacting the record store.
    Address(AddressCli),

    /// Print the ids of every lead matching a view.
    SelectAll(SelectAllArgs),

    /// Patch a single lead.
    Update(UpdateArgs),

    /// Patch many leads in one request.
    BulkUpdate(BulkUpdateArgs),

    /// Delete many leads in one request.
    BulkDelete(BulkDeleteArgs),
}

/// Logs go to stderr so stdout stays parseable. `RUST_LOG` overrides the
/// default `warn` level.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub async fn run(cli: Cli) -> Result<()> {
    let Cli {
        config_home,
        unit,
        command,
    } = cli;
    match command {
        Command::Address(address_cli) => address_cli.run(),
        Command::List(args) => {
            let workspace = leads_cmd::Workspace::open(config_home, unit)?;
            args.run(workspace).await
        }
        Command::SelectAll(args) => {
            let workspace = leads_cmd::Workspace::open(config_home, unit)?;
            args.run(workspace).await
        }
        Command::Update(args) => {
            let workspace = leads_cmd::Workspace::open(config_home, unit)?;
            args.run(workspace).await
        }
        Command::BulkUpdate(args) => {
            let workspace = leads_cmd::Workspace::open(config_home, unit)?;
            args.run(workspace).await
        }
        Command::BulkDelete(args) => {
            let workspace = leads_cmd::Workspace::open(config_home, unit)?;
            args.run(workspace).await
        }
    }
}

/// Parses `KEY=VALUE`; the value may be empty.
pub(crate) fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("expected KEY=VALUE, got '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
