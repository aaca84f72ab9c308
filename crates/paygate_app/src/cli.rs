use std::time::Duration;

use clap::{Parser, Subcommand};
use paygate_core::DeployOptions;

/// Deploy, configure and verify the PaymentGate contract.
#[derive(Debug, Parser)]
#[command(name = "paygate", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Deploy PaymentGate, point it at the deployer and verify its source.
    Deploy {
        /// Network name, e.g. `bscTestnet` or `polygon`.
        #[arg(long)]
        network: String,

        /// Do not submit source verification.
        #[arg(long)]
        skip_verify: bool,

        /// Seconds to wait for each transaction receipt.
        #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
        confirmation_timeout: Option<u64>,
    },

    /// Print the address of every configured signing account.
    Accounts {
        #[arg(long)]
        network: String,
    },
}

impl Command {
    pub fn network(&self) -> &str {
        match self {
            Command::Deploy { network, .. } | Command::Accounts { network } => network,
        }
    }

    /// Operator choices for a `deploy` run; defaults for every other command.
    pub fn deploy_options(&self) -> DeployOptions {
        match self {
            Command::Deploy {
                skip_verify,
                confirmation_timeout,
                ..
            } => DeployOptions {
                skip_verify: *skip_verify,
                confirmation_timeout: confirmation_timeout.map(Duration::from_secs),
            },
            Command::Accounts { .. } => DeployOptions::default(),
        }
    }
}
