use std::time::Duration;

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, hex};
use async_trait::async_trait;
use paygate_core::ExplorerConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::artifact::VerificationSource;
use crate::contract::encode_constructor_args;
use crate::error::ExplorerError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const STATUS_POLL_INTERVAL: Duration = Duration::from_secs(3);
const STATUS_MAX_ATTEMPTS: u32 = 20;

/// Deployed address plus the constructor arguments it was created with.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationRequest {
    pub address: Address,
    pub constructor_arguments: Vec<DynSolValue>,
}

/// Terminal result of a verification attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum VerificationOutcome {
    Verified,
    AlreadyVerified,
    Failed(String),
    /// Verification was disabled by the operator.
    Skipped,
    /// The run was cancelled before the explorer gave a verdict.
    Cancelled,
}

impl VerificationOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_) | Self::Cancelled)
    }
}

/// Block-explorer service that can publish verified source for a contract.
#[async_trait]
pub trait SourceVerifier: Send + Sync {
    /// Whether the explorer already knows the contract at `address`.
    async fn is_indexed(&self, address: Address) -> Result<bool, ExplorerError>;

    /// Submit source verification and wait for the explorer's verdict.
    async fn verify(
        &self,
        request: &VerificationRequest,
    ) -> Result<VerificationOutcome, ExplorerError>;
}

// ---------------------------------------------------------------------------
// Etherscan-compatible API
// ---------------------------------------------------------------------------

/// The envelope every Etherscan-family endpoint answers with.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    result: Value,
}

impl ApiResponse {
    fn ok(&self) -> bool {
        self.status.as_deref() == Some("1")
    }

    fn result_text(&self) -> String {
        match &self.result {
            Value::String(s) => s.clone(),
            Value::Null => self.message.clone().unwrap_or_default(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum StatusKind {
    Pending,
    Verified,
    AlreadyVerified,
    Failed(String),
}

fn classify_status(result: &str) -> StatusKind {
    let lower = result.to_lowercase();
    if lower.contains("pending") {
        StatusKind::Pending
    } else if lower.contains("already verified") {
        StatusKind::AlreadyVerified
    } else if lower.starts_with("pass") {
        StatusKind::Verified
    } else {
        StatusKind::Failed(result.to_string())
    }
}

/// [`SourceVerifier`] for BscScan, BttcScan, PolygonScan and other explorers
/// that expose the Etherscan contract API.
pub struct EtherscanVerifier {
    client: Client,
    api_url: Url,
    browser_url: Url,
    api_key: String,
    source: VerificationSource,
    status_poll_interval: Duration,
    status_max_attempts: u32,
}

impl EtherscanVerifier {
    pub fn new(explorer: &ExplorerConfig, source: VerificationSource) -> Result<Self, ExplorerError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_url: explorer.api_url.clone(),
            browser_url: explorer.browser_url.clone(),
            api_key: explorer.api_key.clone(),
            source,
            status_poll_interval: STATUS_POLL_INTERVAL,
            status_max_attempts: STATUS_MAX_ATTEMPTS,
        })
    }

    /// Override how often and how long the verification status is polled.
    pub fn with_status_polling(mut self, interval: Duration, max_attempts: u32) -> Self {
        self.status_poll_interval = interval;
        self.status_max_attempts = max_attempts.max(1);
        self
    }

    /// Public page showing the verified source of `address`.
    pub fn contract_page(&self, address: Address) -> String {
        format!(
            "{}/address/{address}#code",
            self.browser_url.as_str().trim_end_matches('/')
        )
    }

    // ── Internal helpers ───────────────────────────────────────────

    async fn get(&self, params: &[(&str, &str)]) -> Result<ApiResponse, ExplorerError> {
        let response = self
            .client
            .get(self.api_url.clone())
            .query(params)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn post_form(&self, form: &[(&str, &str)]) -> Result<ApiResponse, ExplorerError> {
        let response = self
            .client
            .post(self.api_url.clone())
            .form(form)
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn parse(response: reqwest::Response) -> Result<ApiResponse, ExplorerError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ExplorerError::Status {
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_str(&body)
            .map_err(|e| ExplorerError::UnexpectedResponse(format!("{e}: {body}")))
    }

    async fn submit(&self, request: &VerificationRequest) -> Result<Submission, ExplorerError> {
        let address = request.address.to_string();
        let constructor_args = hex::encode(encode_constructor_args(&request.constructor_arguments));
        let form = [
            ("apikey", self.api_key.as_str()),
            ("module", "contract"),
            ("action", "verifysourcecode"),
            ("contractaddress", address.as_str()),
            ("sourceCode", self.source.standard_json_input.as_str()),
            ("codeformat", "solidity-standard-json-input"),
            ("contractname", self.source.contract_name.as_str()),
            ("compilerversion", self.source.compiler_version.as_str()),
            // Etherscan's own spelling.
            ("constructorArguements", constructor_args.as_str()),
        ];

        let response = self.post_form(&form).await?;
        let text = response.result_text();
        if response.ok() {
            return Ok(Submission::Queued(text));
        }
        if classify_status(&text) == StatusKind::AlreadyVerified {
            return Ok(Submission::Done(VerificationOutcome::AlreadyVerified));
        }
        Ok(Submission::Done(VerificationOutcome::Failed(text)))
    }

    async fn await_verdict(&self, guid: &str) -> Result<VerificationOutcome, ExplorerError> {
        for attempt in 1..=self.status_max_attempts {
            tokio::time::sleep(self.status_poll_interval).await;
            let response = self
                .get(&[
                    ("module", "contract"),
                    ("action", "checkverifystatus"),
                    ("guid", guid),
                ])
                .await?;
            let text = response.result_text();
            match classify_status(&text) {
                StatusKind::Pending => {
                    debug!(guid, attempt, "verification still pending");
                }
                StatusKind::Verified => return Ok(VerificationOutcome::Verified),
                StatusKind::AlreadyVerified => return Ok(VerificationOutcome::AlreadyVerified),
                StatusKind::Failed(reason) => return Ok(VerificationOutcome::Failed(reason)),
            }
        }
        warn!(guid, "explorer never finished verification");
        Ok(VerificationOutcome::Failed(format!(
            "verification still pending after {} status checks",
            self.status_max_attempts
        )))
    }
}

enum Submission {
    Queued(String),
    Done(VerificationOutcome),
}

#[async_trait]
impl SourceVerifier for EtherscanVerifier {
    async fn is_indexed(&self, address: Address) -> Result<bool, ExplorerError> {
        let address = address.to_string();
        let response = self
            .get(&[
                ("module", "proxy"),
                ("action", "eth_getCode"),
                ("address", address.as_str()),
                ("tag", "latest"),
            ])
            .await?;
        match &response.result {
            Value::String(code) if code.starts_with("0x") => Ok(code.len() > 2),
            _ => Err(ExplorerError::UnexpectedResponse(response.result_text())),
        }
    }

    async fn verify(
        &self,
        request: &VerificationRequest,
    ) -> Result<VerificationOutcome, ExplorerError> {
        info!(
            address = %request.address,
            contract = %self.source.contract_name,
            compiler = %self.source.compiler_version,
            "submitting source verification"
        );
        let outcome = match self.submit(request).await? {
            Submission::Done(outcome) => outcome,
            Submission::Queued(guid) => {
                debug!(guid = %guid, "verification queued");
                self.await_verdict(&guid).await?
            }
        };
        if !outcome.is_failure() {
            info!(page = %self.contract_page(request.address), "source verified");
        }
        Ok(outcome)
    }
}
