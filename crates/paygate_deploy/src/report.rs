use alloy_primitives::{Address, TxHash};
use chrono::{DateTime, Utc};
use paygate_chain::{GasReport, TxReceipt, VerificationOutcome};
use serde::Serialize;

/// The contract produced by a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeployedContractHandle {
    pub address: Address,
    pub creation_tx_hash: TxHash,
}

/// Result of the post-deploy configuration call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Confirmed { tx_hash: TxHash },
    Failed { reason: String },
    /// The run was cancelled before the step finished.
    Cancelled,
}

/// Summary of a run whose creation step succeeded.
///
/// Produced even when later steps fail or the run is cancelled, so the
/// deployed address always reaches the operator.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentReport {
    /// Network name the contract lives on.
    pub network: String,
    pub handle: DeployedContractHandle,
    pub deployer: Address,
    pub creation: TxReceipt,
    pub configuration: StepOutcome,
    pub verification: VerificationOutcome,
    #[serde(skip)]
    pub gas: GasReport,
    pub finished_at: DateTime<Utc>,
}

impl DeploymentReport {
    /// True when the contract is configured and its source is (or already
    /// was) verified, or verification was skipped on purpose.
    pub fn is_success(&self) -> bool {
        matches!(self.configuration, StepOutcome::Confirmed { .. })
            && !self.verification.is_failure()
    }
}
