use std::time::Duration;

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, TxHash};
use chrono::Utc;
use paygate_chain::contract::set_receiver_calldata;
use paygate_chain::{
    ChainClient, ContractArtifact, GasReport, SourceVerifier, TxReceipt, VerificationOutcome,
    VerificationRequest,
};
use paygate_core::RunSettings;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{DeployError, Step};
use crate::report::{DeployedContractHandle, DeploymentReport, StepOutcome};

/// What to deploy and who deploys it. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentRequest {
    pub constructor_arguments: Vec<DynSolValue>,
    /// Account that signs the transactions and becomes the configured receiver.
    pub deployer: Address,
}

impl DeploymentRequest {
    pub fn new(constructor_arguments: Vec<DynSolValue>, deployer: Address) -> Self {
        Self {
            constructor_arguments,
            deployer,
        }
    }
}

/// Runs the deploy → configure → verify sequence against one network.
pub struct Orchestrator<C, V> {
    client: C,
    verifier: Option<V>,
    artifact: ContractArtifact,
    settings: RunSettings,
    cancel: CancellationToken,
}

impl<C, V> Orchestrator<C, V>
where
    C: ChainClient,
    V: SourceVerifier,
{
    /// Build an orchestrator without a verifier; verification is skipped
    /// unless [`Orchestrator::with_verifier`] is called.
    pub fn new(client: C, artifact: ContractArtifact, settings: RunSettings) -> Self {
        Self {
            client,
            verifier: None,
            artifact,
            settings,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_verifier(mut self, verifier: V) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Token that aborts the run at its next suspension point when cancelled.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Execute the full sequence.
    ///
    /// Returns `Err` only when no contract exists: creation rejected,
    /// reverted, unconfirmed or cancelled. Once the contract is deployed every
    /// later failure, cancellation included, is recorded in the report.
    pub async fn run(&self, request: &DeploymentRequest) -> Result<DeploymentReport, DeployError> {
        let mut gas = GasReport::new();

        let (handle, creation) = self.create(request).await?;
        gas.record("creation", &creation);

        let configuration = match self.configure(&handle, request.deployer).await {
            Ok(receipt) => {
                gas.record("configuration", &receipt);
                StepOutcome::Confirmed {
                    tx_hash: receipt.tx_hash,
                }
            }
            Err(DeployError::Cancelled(_)) => {
                warn!(address = %handle.address, "cancelled during configuration; contract stays deployed");
                StepOutcome::Cancelled
            }
            Err(err) => {
                error!(address = %handle.address, error = %err, "configuration failed; contract stays deployed");
                StepOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        };

        let verification = if self.cancel.is_cancelled() {
            VerificationOutcome::Cancelled
        } else {
            self.verify(&handle, &request.constructor_arguments).await
        };

        Ok(DeploymentReport {
            network: self.client.network().to_string(),
            handle,
            deployer: request.deployer,
            creation,
            configuration,
            verification,
            gas,
            finished_at: Utc::now(),
        })
    }

    // ── Steps ──────────────────────────────────────────────────────

    async fn create(
        &self,
        request: &DeploymentRequest,
    ) -> Result<(DeployedContractHandle, TxReceipt), DeployError> {
        let init_code = self.artifact.init_code(&request.constructor_arguments);
        info!(
            contract = %self.artifact.contract_name,
            deployer = %request.deployer,
            args = request.constructor_arguments.len(),
            "submitting creation transaction"
        );

        let tx_hash = self
            .client
            .send_creation(init_code)
            .await
            .map_err(|source| DeployError::Submission {
                step: Step::Creation,
                source,
            })?;
        info!(tx = %tx_hash, "creation transaction submitted");

        let receipt = self.await_receipt(Step::Creation, tx_hash).await?;
        if !receipt.success {
            return Err(DeployError::Reverted {
                step: Step::Creation,
                tx_hash,
            });
        }
        let address = receipt
            .contract_address
            .ok_or(DeployError::MissingContractAddress(tx_hash))?;

        info!(address = %address, block = ?receipt.block_number, "contract deployed");
        Ok((
            DeployedContractHandle {
                address,
                creation_tx_hash: tx_hash,
            },
            receipt,
        ))
    }

    async fn configure(
        &self,
        handle: &DeployedContractHandle,
        receiver: Address,
    ) -> Result<TxReceipt, DeployError> {
        let calldata = set_receiver_calldata(receiver);
        let tx_hash = self
            .client
            .send_call(handle.address, calldata)
            .await
            .map_err(|source| DeployError::Submission {
                step: Step::Configuration,
                source,
            })?;
        debug!(tx = %tx_hash, receiver = %receiver, "configuration transaction submitted");

        let receipt = self.await_receipt(Step::Configuration, tx_hash).await?;
        if !receipt.success {
            return Err(DeployError::Reverted {
                step: Step::Configuration,
                tx_hash,
            });
        }
        info!(receiver = %receiver, "receiver contract set");
        Ok(receipt)
    }

    async fn verify(
        &self,
        handle: &DeployedContractHandle,
        constructor_arguments: &[DynSolValue],
    ) -> VerificationOutcome {
        let Some(verifier) = &self.verifier else {
            info!("source verification skipped");
            return VerificationOutcome::Skipped;
        };

        if let Err(err) = self.wait_for_indexing(verifier, handle.address).await {
            warn!(address = %handle.address, error = %err, "verification not submitted");
            return VerificationOutcome::Cancelled;
        }

        let request = VerificationRequest {
            address: handle.address,
            constructor_arguments: constructor_arguments.to_vec(),
        };
        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                warn!(address = %handle.address, "cancelled while awaiting the explorer verdict");
                return VerificationOutcome::Cancelled;
            }
            result = verifier.verify(&request) => result,
        };

        let outcome = result.unwrap_or_else(|e| VerificationOutcome::Failed(e.to_string()));
        match &outcome {
            VerificationOutcome::Failed(reason) => {
                error!(address = %handle.address, reason = %reason, "source verification failed")
            }
            other => info!(address = %handle.address, outcome = ?other, "source verification finished"),
        }
        outcome
    }

    // ── Suspension points ──────────────────────────────────────────

    /// Poll for the receipt of `tx_hash` until it appears, the confirmation
    /// timeout elapses, or the run is cancelled.
    async fn await_receipt(&self, step: Step, tx_hash: TxHash) -> Result<TxReceipt, DeployError> {
        let interval = self.settings.receipt_poll_interval;
        let timeout = self.settings.confirmation_timeout;

        let poll = async {
            loop {
                match self.client.receipt(tx_hash).await {
                    Ok(Some(receipt)) => return Ok(receipt),
                    Ok(None) => tokio::time::sleep(interval).await,
                    Err(source) => {
                        return Err(DeployError::Receipt {
                            step,
                            tx_hash,
                            source,
                        });
                    }
                }
            }
        };

        debug!(%step, tx = %tx_hash, ?timeout, "waiting for confirmation");
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(DeployError::Cancelled(step)),
            result = tokio::time::timeout(timeout, poll) => match result {
                Ok(receipt) => receipt,
                Err(_) => Err(DeployError::ConfirmationTimeout {
                    step,
                    tx_hash,
                    waited: timeout,
                }),
            },
        }
    }

    /// Wait until the explorer knows the contract, with bounded backoff.
    ///
    /// The initial delay always elapses before the first probe. Running out
    /// of probes is not an error: verification is submitted anyway and the
    /// explorer decides.
    async fn wait_for_indexing(&self, verifier: &V, address: Address) -> Result<(), DeployError> {
        let policy = self.settings.indexing;
        let attempts = policy.max_attempts.max(1);

        for attempt in 0..attempts {
            self.pause(policy.delay_before(attempt)).await?;
            match verifier.is_indexed(address).await {
                Ok(true) => {
                    debug!(attempt, "explorer has indexed the contract");
                    return Ok(());
                }
                Ok(false) => debug!(attempt, "explorer has not indexed the contract yet"),
                Err(e) => warn!(attempt, error = %e, "explorer readiness probe failed"),
            }
        }

        warn!(attempts, "explorer still not indexed; submitting verification anyway");
        Ok(())
    }

    async fn pause(&self, delay: Duration) -> Result<(), DeployError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(DeployError::Cancelled(Step::Verification)),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Bytes, address};
    use async_trait::async_trait;
    use paygate_chain::{ChainError, ExplorerError};
    use paygate_core::IndexingPolicy;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tokio::time::Instant;

    const DEPLOYED: Address = address!("5FbDB2315678afecb367f032d93F642f64180aa3");
    const ARGUMENT: Address = address!("AAA0000000000000000000000000000000000111");
    const DEPLOYER: Address = address!("BBB0000000000000000000000000000000000222");
    const CREATION_TX: TxHash = TxHash::repeat_byte(0xc1);
    const CONFIG_TX: TxHash = TxHash::repeat_byte(0xc2);

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Creation(Bytes),
        Configuration { to: Address, calldata: Bytes },
        Confirmed(TxHash),
        Probe,
        Verify(VerificationRequest),
    }

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(Instant, Call)>>,
    }

    impl Recorder {
        fn push(&self, call: Call) {
            self.calls.lock().push((Instant::now(), call));
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().iter().map(|(_, c)| c.clone()).collect()
        }

        fn time_of(&self, pred: impl Fn(&Call) -> bool) -> Option<Instant> {
            self.calls.lock().iter().find(|(_, c)| pred(c)).map(|(t, _)| *t)
        }

        fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
            self.calls.lock().iter().filter(|(_, c)| pred(c)).count()
        }
    }

    struct MockClient {
        recorder: Arc<Recorder>,
        reject_creation: bool,
        reject_configuration: bool,
        revert_creation: bool,
        revert_configuration: bool,
        never_confirm: bool,
        /// Leaves only the configuration transaction pending forever.
        stall_configuration: bool,
        /// How many polls report "pending" before each receipt appears.
        pending_polls: u32,
        polls: Mutex<u32>,
    }

    impl MockClient {
        fn new(recorder: Arc<Recorder>) -> Self {
            Self {
                recorder,
                reject_creation: false,
                reject_configuration: false,
                revert_creation: false,
                revert_configuration: false,
                never_confirm: false,
                stall_configuration: false,
                pending_polls: 0,
                polls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl ChainClient for MockClient {
        fn network(&self) -> &str {
            "bscTestnet"
        }

        fn signer_address(&self) -> Address {
            DEPLOYER
        }

        async fn send_creation(&self, init_code: Bytes) -> Result<TxHash, ChainError> {
            self.recorder.push(Call::Creation(init_code));
            if self.reject_creation {
                return Err(ChainError::Rejected("insufficient funds for gas".into()));
            }
            Ok(CREATION_TX)
        }

        async fn send_call(&self, to: Address, calldata: Bytes) -> Result<TxHash, ChainError> {
            self.recorder.push(Call::Configuration { to, calldata });
            if self.reject_configuration {
                return Err(ChainError::Rejected("nonce too low".into()));
            }
            Ok(CONFIG_TX)
        }

        async fn receipt(&self, tx_hash: TxHash) -> Result<Option<TxReceipt>, ChainError> {
            if self.never_confirm || (self.stall_configuration && tx_hash == CONFIG_TX) {
                return Ok(None);
            }
            {
                let mut polls = self.polls.lock();
                if *polls < self.pending_polls {
                    *polls += 1;
                    return Ok(None);
                }
                *polls = 0;
            }
            self.recorder.push(Call::Confirmed(tx_hash));
            let is_creation = tx_hash == CREATION_TX;
            Ok(Some(TxReceipt {
                tx_hash,
                block_number: Some(100),
                gas_used: if is_creation { 1_200_000 } else { 46_000 },
                effective_gas_price: 5_000_000_000,
                contract_address: is_creation.then_some(DEPLOYED),
                success: if is_creation {
                    !self.revert_creation
                } else {
                    !self.revert_configuration
                },
            }))
        }
    }

    struct MockVerifier {
        recorder: Arc<Recorder>,
        /// Probes answering "not indexed" before the explorer catches up.
        unindexed_probes: u32,
        probes: Mutex<u32>,
        outcome: Result<VerificationOutcome, String>,
    }

    impl MockVerifier {
        fn new(recorder: Arc<Recorder>) -> Self {
            Self {
                recorder,
                unindexed_probes: 0,
                probes: Mutex::new(0),
                outcome: Ok(VerificationOutcome::Verified),
            }
        }
    }

    #[async_trait]
    impl SourceVerifier for MockVerifier {
        async fn is_indexed(&self, _address: Address) -> Result<bool, ExplorerError> {
            self.recorder.push(Call::Probe);
            let mut probes = self.probes.lock();
            *probes += 1;
            Ok(*probes > self.unindexed_probes)
        }

        async fn verify(
            &self,
            request: &VerificationRequest,
        ) -> Result<VerificationOutcome, ExplorerError> {
            self.recorder.push(Call::Verify(request.clone()));
            self.outcome
                .clone()
                .map_err(ExplorerError::UnexpectedResponse)
        }
    }

    fn artifact() -> ContractArtifact {
        ContractArtifact {
            contract_name: "PaymentGate".into(),
            source_name: "contracts/PaymentGate.sol".into(),
            abi: serde_json::json!([]),
            bytecode: Bytes::from_static(&[0x60, 0x80, 0x60, 0x40]),
        }
    }

    fn settings() -> RunSettings {
        RunSettings {
            confirmation_timeout: Duration::from_secs(60),
            receipt_poll_interval: Duration::from_secs(1),
            indexing: IndexingPolicy::default(),
        }
    }

    fn request() -> DeploymentRequest {
        DeploymentRequest::new(vec![DynSolValue::Address(ARGUMENT)], DEPLOYER)
    }

    fn orchestrator(
        client: MockClient,
        verifier: MockVerifier,
    ) -> Orchestrator<MockClient, MockVerifier> {
        Orchestrator::new(client, artifact(), settings()).with_verifier(verifier)
    }

    fn is_verify(call: &Call) -> bool {
        matches!(call, Call::Verify(_))
    }

    #[tokio::test(start_paused = true)]
    async fn end_to_end_sequence() {
        let recorder = Arc::new(Recorder::default());
        let orch = orchestrator(
            MockClient::new(recorder.clone()),
            MockVerifier::new(recorder.clone()),
        );

        let report = orch.run(&request()).await.unwrap();

        assert!(report.is_success());
        assert_eq!(report.network, "bscTestnet");
        assert_eq!(report.handle.address, DEPLOYED);
        assert_eq!(report.handle.creation_tx_hash, CREATION_TX);
        assert_eq!(report.gas.total_gas(), 1_246_000);

        let calls = recorder.calls();
        let expected_init_code = artifact().init_code(&request().constructor_arguments);
        assert_eq!(
            calls,
            vec![
                Call::Creation(expected_init_code.clone()),
                Call::Confirmed(CREATION_TX),
                Call::Configuration {
                    to: DEPLOYED,
                    calldata: set_receiver_calldata(DEPLOYER),
                },
                Call::Confirmed(CONFIG_TX),
                Call::Probe,
                Call::Verify(VerificationRequest {
                    address: DEPLOYED,
                    constructor_arguments: vec![DynSolValue::Address(ARGUMENT)],
                }),
            ]
        );
        assert!(expected_init_code.ends_with(ARGUMENT.as_slice()));

        let confirmed = recorder
            .time_of(|c| *c == Call::Confirmed(CONFIG_TX))
            .unwrap();
        let verified = recorder.time_of(is_verify).unwrap();
        assert!(verified - confirmed >= Duration::from_millis(5_000));
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_creation_makes_no_downstream_calls() {
        let recorder = Arc::new(Recorder::default());
        let mut client = MockClient::new(recorder.clone());
        client.reject_creation = true;
        let orch = orchestrator(client, MockVerifier::new(recorder.clone()));

        let err = orch.run(&request()).await.unwrap_err();

        assert!(matches!(
            err,
            DeployError::Submission {
                step: Step::Creation,
                ..
            }
        ));
        assert_eq!(recorder.calls().len(), 1);
        assert!(matches!(recorder.calls()[0], Call::Creation(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn reverted_creation_is_fatal() {
        let recorder = Arc::new(Recorder::default());
        let mut client = MockClient::new(recorder.clone());
        client.revert_creation = true;
        let orch = orchestrator(client, MockVerifier::new(recorder.clone()));

        let err = orch.run(&request()).await.unwrap_err();

        assert!(matches!(
            err,
            DeployError::Reverted {
                step: Step::Creation,
                ..
            }
        ));
        assert_eq!(
            recorder.count(|c| matches!(c, Call::Configuration { .. }) || is_verify(c)),
            0
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failed_configuration_still_verifies_with_original_arguments() {
        let recorder = Arc::new(Recorder::default());
        let mut client = MockClient::new(recorder.clone());
        client.reject_configuration = true;
        let orch = orchestrator(client, MockVerifier::new(recorder.clone()));

        let report = orch.run(&request()).await.unwrap();

        assert!(!report.is_success());
        assert_eq!(report.handle.address, DEPLOYED);
        assert!(matches!(report.configuration, StepOutcome::Failed { .. }));
        assert_eq!(report.verification, VerificationOutcome::Verified);
        assert_eq!(report.gas.entries().len(), 1);

        let verify_calls: Vec<_> = recorder
            .calls()
            .into_iter()
            .filter(is_verify)
            .collect();
        assert_eq!(
            verify_calls,
            vec![Call::Verify(VerificationRequest {
                address: DEPLOYED,
                constructor_arguments: vec![DynSolValue::Address(ARGUMENT)],
            })]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn indexing_delay_holds_for_any_confirmation_latency() {
        for pending_polls in [0, 1, 4, 30] {
            let recorder = Arc::new(Recorder::default());
            let mut client = MockClient::new(recorder.clone());
            client.pending_polls = pending_polls;
            let orch = orchestrator(client, MockVerifier::new(recorder.clone()));

            orch.run(&request()).await.unwrap();

            let confirmed = recorder
                .time_of(|c| *c == Call::Confirmed(CONFIG_TX))
                .unwrap();
            let verified = recorder.time_of(is_verify).unwrap();
            assert!(
                verified - confirmed >= Duration::from_millis(5_000),
                "pending_polls = {pending_polls}"
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn readiness_probes_back_off_until_indexed() {
        let recorder = Arc::new(Recorder::default());
        let mut verifier = MockVerifier::new(recorder.clone());
        verifier.unindexed_probes = 2;
        let orch = orchestrator(MockClient::new(recorder.clone()), verifier);

        orch.run(&request()).await.unwrap();

        assert_eq!(recorder.count(|c| *c == Call::Probe), 3);
        let confirmed = recorder
            .time_of(|c| *c == Call::Confirmed(CONFIG_TX))
            .unwrap();
        let verified = recorder.time_of(is_verify).unwrap();
        // 5s + 10s + 20s of backoff before the third, successful probe.
        let waited = verified - confirmed;
        assert!(waited >= Duration::from_secs(35));
        assert!(waited < Duration::from_secs(36));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_readiness_probes_still_submit_verification() {
        let recorder = Arc::new(Recorder::default());
        let mut verifier = MockVerifier::new(recorder.clone());
        verifier.unindexed_probes = u32::MAX;
        let orch = orchestrator(MockClient::new(recorder.clone()), verifier);

        let report = orch.run(&request()).await.unwrap();

        let max_attempts = IndexingPolicy::default().max_attempts as usize;
        assert_eq!(recorder.count(|c| *c == Call::Probe), max_attempts);
        assert_eq!(recorder.count(is_verify), 1);
        assert_eq!(report.verification, VerificationOutcome::Verified);
    }

    #[tokio::test(start_paused = true)]
    async fn verifier_error_is_recorded_not_raised() {
        let recorder = Arc::new(Recorder::default());
        let mut verifier = MockVerifier::new(recorder.clone());
        verifier.outcome = Err("Invalid API Key".into());
        let orch = orchestrator(MockClient::new(recorder.clone()), verifier);

        let report = orch.run(&request()).await.unwrap();

        assert!(matches!(report.configuration, StepOutcome::Confirmed { .. }));
        assert!(matches!(
            report.verification,
            VerificationOutcome::Failed(ref reason) if reason.contains("Invalid API Key")
        ));
        assert!(!report.is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn no_verifier_skips_verification() {
        let recorder = Arc::new(Recorder::default());
        let orch: Orchestrator<MockClient, MockVerifier> =
            Orchestrator::new(MockClient::new(recorder.clone()), artifact(), settings());

        let report = orch.run(&request()).await.unwrap();

        assert_eq!(report.verification, VerificationOutcome::Skipped);
        assert!(report.is_success());
        assert_eq!(recorder.count(|c| *c == Call::Probe || is_verify(c)), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn unconfirmed_creation_times_out() {
        let recorder = Arc::new(Recorder::default());
        let mut client = MockClient::new(recorder.clone());
        client.never_confirm = true;
        let orch = orchestrator(client, MockVerifier::new(recorder.clone()));

        let started = Instant::now();
        let err = orch.run(&request()).await.unwrap_err();

        match err {
            DeployError::ConfirmationTimeout {
                step,
                tx_hash,
                waited,
            } => {
                assert_eq!(step, Step::Creation);
                assert_eq!(tx_hash, CREATION_TX);
                assert_eq!(waited, Duration::from_secs(60));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(started.elapsed() >= Duration::from_secs(60));
        assert_eq!(recorder.count(|c| matches!(c, Call::Configuration { .. })), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_confirmation_wait() {
        let recorder = Arc::new(Recorder::default());
        let mut client = MockClient::new(recorder.clone());
        client.never_confirm = true;
        let cancel = CancellationToken::new();
        let orch = orchestrator(client, MockVerifier::new(recorder.clone()))
            .with_cancellation(cancel.clone());

        let trigger = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            cancel.cancel();
        });

        let started = Instant::now();
        let err = orch.run(&request()).await.unwrap_err();
        trigger.await.unwrap();

        assert!(matches!(err, DeployError::Cancelled(Step::Creation)));
        assert!(started.elapsed() < Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_indexing_wait() {
        let recorder = Arc::new(Recorder::default());
        let cancel = CancellationToken::new();
        let orch = orchestrator(
            MockClient::new(recorder.clone()),
            MockVerifier::new(recorder.clone()),
        )
        .with_cancellation(cancel.clone());

        // Both confirmations resolve immediately, so at t=2s the run is
        // inside the initial 5s indexing delay.
        let trigger = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            cancel.cancel();
        });

        let report = orch.run(&request()).await.unwrap();
        trigger.await.unwrap();

        assert_eq!(report.handle.address, DEPLOYED);
        assert!(matches!(report.configuration, StepOutcome::Confirmed { .. }));
        assert_eq!(report.verification, VerificationOutcome::Cancelled);
        assert!(!report.is_success());
        assert_eq!(recorder.count(|c| *c == Call::Probe || is_verify(c)), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_during_configuration_keeps_the_deployed_address() {
        let recorder = Arc::new(Recorder::default());
        let mut client = MockClient::new(recorder.clone());
        client.stall_configuration = true;
        let cancel = CancellationToken::new();
        let orch = orchestrator(client, MockVerifier::new(recorder.clone()))
            .with_cancellation(cancel.clone());

        let trigger = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            cancel.cancel();
        });

        let report = orch.run(&request()).await.unwrap();
        trigger.await.unwrap();

        assert_eq!(report.network, "bscTestnet");
        assert_eq!(report.handle.address, DEPLOYED);
        assert_eq!(report.configuration, StepOutcome::Cancelled);
        assert_eq!(report.verification, VerificationOutcome::Cancelled);
        assert!(!report.is_success());
        assert_eq!(recorder.count(|c| *c == Call::Probe || is_verify(c)), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn unconfirmed_configuration_still_verifies() {
        let recorder = Arc::new(Recorder::default());
        let mut client = MockClient::new(recorder.clone());
        client.stall_configuration = true;
        let orch = orchestrator(client, MockVerifier::new(recorder.clone()));

        let report = orch.run(&request()).await.unwrap();

        match &report.configuration {
            StepOutcome::Failed { reason } => assert!(reason.contains("not confirmed"), "{reason}"),
            other => panic!("unexpected configuration outcome: {other:?}"),
        }
        assert_eq!(report.handle.address, DEPLOYED);
        assert_eq!(report.verification, VerificationOutcome::Verified);
        assert_only_verification_uses_original_arguments(&recorder);
    }

    #[tokio::test(start_paused = true)]
    async fn reverted_configuration_still_verifies() {
        let recorder = Arc::new(Recorder::default());
        let mut client = MockClient::new(recorder.clone());
        client.revert_configuration = true;
        let orch = orchestrator(client, MockVerifier::new(recorder.clone()));

        let report = orch.run(&request()).await.unwrap();

        match &report.configuration {
            StepOutcome::Failed { reason } => assert!(reason.contains("reverted"), "{reason}"),
            other => panic!("unexpected configuration outcome: {other:?}"),
        }
        assert_eq!(report.verification, VerificationOutcome::Verified);
        assert!(!report.is_success());
        assert_only_verification_uses_original_arguments(&recorder);
    }

    fn assert_only_verification_uses_original_arguments(recorder: &Recorder) {
        let verify_calls: Vec<_> = recorder.calls().into_iter().filter(is_verify).collect();
        assert_eq!(
            verify_calls,
            vec![Call::Verify(VerificationRequest {
                address: DEPLOYED,
                constructor_arguments: vec![DynSolValue::Address(ARGUMENT)],
            })]
        );
    }
}
