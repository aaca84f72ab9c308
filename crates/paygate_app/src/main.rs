mod cli;

use std::path::PathBuf;
use std::process::ExitCode;

use alloy_dyn_abi::DynSolValue;
use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use paygate_chain::{
    AlloyChainClient, ChainClient, ContractArtifact, EtherscanVerifier, VerificationSource,
    load_signers,
};
use paygate_core::logging::{DEFAULT_FILTER, init_logging};
use paygate_core::{DeployConfig, DeployOptions, NetworkConfig};
use paygate_deploy::{DeploymentRequest, Orchestrator};

use crate::cli::{Cli, Command};

const ENV_LOG_DIR: &str = "PAYGATE_LOG_DIR";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // A missing .env file is normal; variables may come from the shell.
    dotenvy::dotenv().ok();

    let log_dir = std::env::var(ENV_LOG_DIR).ok().map(PathBuf::from);
    let _log_guard = match init_logging(log_dir.as_deref(), DEFAULT_FILTER) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{e:#}");
            return ExitCode::FAILURE;
        }
    };

    let result = match &cli.command {
        Command::Deploy { .. } => {
            deploy(cli.command.network(), &cli.command.deploy_options()).await
        }
        Command::Accounts { network } => accounts(network),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Run the full deployment. `Ok(false)` means the contract exists but a later
/// step did not succeed; the report on stdout says which.
async fn deploy(network: &str, options: &DeployOptions) -> anyhow::Result<bool> {
    let config = DeployConfig::from_env(network, options)
        .with_context(|| format!("Invalid configuration for network {network}"))?;
    info!(network = %config.network.name, verify = config.verify, "starting deployment");

    let artifact = ContractArtifact::load(&config.contract.artifact)?;
    let client = AlloyChainClient::connect(&config.network).await?;
    let deployer = client.signer_address();

    let cancel = CancellationToken::new();
    spawn_ctrl_c_handler(cancel.clone());

    let mut orchestrator = Orchestrator::new(client, artifact.clone(), config.run)
        .with_cancellation(cancel);
    if config.verify {
        let explorer = config
            .network
            .explorer
            .as_ref()
            .context("Explorer configuration missing for verification")?;
        let source = VerificationSource::load(
            &config.contract.artifact,
            &artifact,
            config.contract.build_info.as_deref(),
        )?;
        orchestrator = orchestrator.with_verifier(EtherscanVerifier::new(explorer, source)?);
    }

    let request = DeploymentRequest::new(
        vec![DynSolValue::Address(config.contract.constructor_argument)],
        deployer,
    );
    let report = orchestrator.run(&request).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    if config.report_gas {
        eprint!("{}", report.gas.render(&config.network.native_symbol));
    }
    if !report.is_success() {
        warn!(address = %report.handle.address, "deployment finished with failed steps");
    }
    Ok(report.is_success())
}

/// Print the address of every signing key configured for `network`.
fn accounts(network: &str) -> anyhow::Result<bool> {
    let config = NetworkConfig::from_env(network)
        .with_context(|| format!("Invalid configuration for network {network}"))?;
    for signer in load_signers(&config)? {
        println!("{}", signer.address());
    }
    Ok(true)
}

fn spawn_ctrl_c_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Ctrl-C received, cancelling deployment");
            cancel.cancel();
        }
    });
}
