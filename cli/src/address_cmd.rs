use anyhow::Result;
use clap::Parser;
use clap::Subcommand;
use leaddesk_core::QueryUpdate;
use leaddesk_core::address;

use crate::parse_key_value;

#[derive(Debug, Parser)]
pub struct AddressCli {
    #[command(subcommand)]
    pub command: AddressCommand,
}

#[derive(Debug, Subcommand)]
pub enum AddressCommand {
    /// Print the canonical form of an address.
    Normalize {
        /// Address such as `page=2&statusId=won`; a leading `?` is accepted.
        address: String,
    },

    /// Apply KEY=VALUE edits to an address. An empty value clears the key.
    /// Any change other than `page` sends the view back to its first page.
    Merge {
        address: String,

        #[arg(value_name = "KEY=VALUE", value_parser = parse_key_value, required = true)]
        edits: Vec<(String, String)>,
    },
}

impl AddressCli {
    pub fn run(self) -> Result<()> {
        let out = match self.command {
            AddressCommand::Normalize { address } => address::normalize(&address),
            AddressCommand::Merge { address, edits } => {
                let update = parse_update(&edits)?;
                address::merge(&address, &update)
            }
        };
        println!("{out}");
        Ok(())
    }
}

pub(crate) fn parse_update(pairs: &[(String, String)]) -> Result<QueryUpdate> {
    Ok(QueryUpdate::from_pairs(
        pairs.iter().map(|(key, value)| (key.as_str(), value.as_str())),
    )?)
}
