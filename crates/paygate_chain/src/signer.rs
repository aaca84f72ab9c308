use std::str::FromStr;

use alloy_signer_local::PrivateKeySigner;
use paygate_core::NetworkConfig;
use tracing::debug;

use crate::error::ChainError;

/// Parse every signing key configured for a network.
///
/// Keys may carry a `0x` prefix. The parse error is not echoed back so a
/// malformed key never ends up in a log line.
pub fn load_signers(network: &NetworkConfig) -> Result<Vec<PrivateKeySigner>, ChainError> {
    network
        .signing_keys
        .iter()
        .enumerate()
        .map(|(index, key)| {
            let trimmed = key.trim().trim_start_matches("0x");
            PrivateKeySigner::from_str(trimmed).map_err(|_| {
                ChainError::InvalidKey(format!(
                    "key #{index} for {} is not a valid secp256k1 key",
                    network.name
                ))
            })
        })
        .collect()
}

/// The account that signs deployment and configuration transactions.
pub fn primary_signer(network: &NetworkConfig) -> Result<PrivateKeySigner, ChainError> {
    let signer = load_signers(network)?
        .into_iter()
        .next()
        .ok_or_else(|| ChainError::NoSigner(network.name.clone()))?;
    debug!(network = %network.name, address = %signer.address(), "loaded deployer account");
    Ok(signer)
}
