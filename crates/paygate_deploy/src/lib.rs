//! Deployment orchestration for the `PaymentGate` contract.
//!
//! [`Orchestrator::run`] drives a strictly sequential flow:
//!
//! 1. submit the creation transaction and wait for its receipt;
//! 2. call `setReceiverContract(deployer)` on the new address and wait again;
//! 3. wait for the explorer to index the contract (bounded backoff);
//! 4. submit source verification with the original constructor arguments.
//!
//! A failed creation aborts everything. Failures after creation are recorded
//! in the [`DeploymentReport`] so the deployed address is never lost.

pub mod error;
pub mod orchestrator;
pub mod report;

pub use error::{DeployError, Step};
pub use orchestrator::{DeploymentRequest, Orchestrator};
pub use report::{DeployedContractHandle, DeploymentReport, StepOutcome};
