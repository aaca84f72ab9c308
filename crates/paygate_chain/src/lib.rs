//! Chain-facing pieces of the PayGate toolchain: signing accounts, contract
//! artifacts, the RPC client, explorer verification and gas reporting.

pub mod artifact;
pub mod client;
pub mod contract;
pub mod error;
pub mod explorer;
pub mod gas;
pub mod signer;

// Re-export primary types for convenient access.
pub use artifact::{ContractArtifact, VerificationSource};
pub use client::{AlloyChainClient, ChainClient, TxReceipt};
pub use error::{ChainError, ExplorerError};
pub use explorer::{EtherscanVerifier, SourceVerifier, VerificationOutcome, VerificationRequest};
pub use gas::GasReport;
pub use signer::{load_signers, primary_signer};
