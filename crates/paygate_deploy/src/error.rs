use std::fmt;
use std::time::Duration;

use alloy_primitives::TxHash;
use paygate_chain::ChainError;
use serde::Serialize;

/// Stage of the deployment sequence an error or outcome belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Creation,
    Configuration,
    Verification,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Step::Creation => "creation",
            Step::Configuration => "configuration",
            Step::Verification => "verification",
        })
    }
}

/// Failures of the deployment sequence.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// The network refused the transaction before inclusion.
    #[error("{step} transaction was rejected: {source}")]
    Submission {
        step: Step,
        #[source]
        source: ChainError,
    },

    /// Polling for the receipt failed at the RPC layer.
    #[error("Receipt query for {step} transaction {tx_hash} failed: {source}")]
    Receipt {
        step: Step,
        tx_hash: TxHash,
        #[source]
        source: ChainError,
    },

    /// The transaction was not included within the confirmation timeout.
    #[error("{step} transaction {tx_hash} not confirmed after {waited:?}")]
    ConfirmationTimeout {
        step: Step,
        tx_hash: TxHash,
        waited: Duration,
    },

    /// The transaction was mined but execution reverted.
    #[error("{step} transaction {tx_hash} reverted")]
    Reverted { step: Step, tx_hash: TxHash },

    #[error("Creation receipt for {0} carries no contract address")]
    MissingContractAddress(TxHash),

    /// The operator cancelled the run.
    #[error("Deployment cancelled during {0}")]
    Cancelled(Step),
}
