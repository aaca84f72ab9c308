//! Chain and explorer error types.

use std::path::PathBuf;

/// Errors from the signing account, the RPC endpoint or contract artifacts.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// A configured signing key could not be parsed.
    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    /// No signing key was configured for the network.
    #[error("No signing key configured for {0}")]
    NoSigner(String),

    /// The RPC endpoint could not be reached or answered with an error.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// The network rejected a transaction before inclusion.
    #[error("Transaction rejected: {0}")]
    Rejected(String),

    /// The endpoint serves a different chain than the configured network.
    #[error("Chain ID mismatch: expected {expected}, endpoint reports {actual}")]
    ChainIdMismatch { expected: u64, actual: u64 },

    /// A contract artifact is missing, unreadable or malformed.
    #[error("Artifact error in {path}: {reason}")]
    Artifact { path: PathBuf, reason: String },
}

/// Errors talking to an Etherscan-compatible explorer API.
#[derive(Debug, thiserror::Error)]
pub enum ExplorerError {
    /// Transport-level failure (DNS, TLS, timeout, connection reset).
    #[error("Explorer request failed: {0}")]
    Http(reqwest::Error),

    /// The explorer answered with a non-success HTTP status.
    #[error("Explorer returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The explorer answered with a body we could not interpret.
    #[error("Unexpected explorer response: {0}")]
    UnexpectedResponse(String),
}

// Request URLs carry the API key as a query parameter.
impl From<reqwest::Error> for ExplorerError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.without_url())
    }
}
