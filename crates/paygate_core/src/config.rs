use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use alloy_primitives::Address;
use tracing::debug;
use url::Url;

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Pre-existing account handed to the `PaymentGate` constructor.
pub const DEFAULT_CONSTRUCTOR_ARGUMENT: &str = "0x4976A688f130248Fa4AFcf4903440547C63c3288";

/// Hardhat artifact location for the `PaymentGate` contract.
pub const DEFAULT_ARTIFACT_PATH: &str = "artifacts/contracts/PaymentGate.sol/PaymentGate.json";

const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 600;
const DEFAULT_RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Minimum wait between the configuration receipt and the first explorer probe.
pub const INDEXING_INITIAL_DELAY: Duration = Duration::from_millis(5_000);
const INDEXING_MAX_DELAY: Duration = Duration::from_secs(30);
const INDEXING_MAX_ATTEMPTS: u32 = 6;

const ENV_PRIVATE_KEY: &str = "PRIVATE_KEY";
const ENV_ARTIFACT: &str = "PAYMENT_GATE_ARTIFACT";
const ENV_BUILD_INFO: &str = "PAYMENT_GATE_BUILD_INFO";
const ENV_ARGUMENT: &str = "PAYMENT_GATE_ARGUMENT";
const ENV_CONFIRMATION_TIMEOUT: &str = "CONFIRMATION_TIMEOUT_SECS";
const ENV_REPORT_GAS: &str = "REPORT_GAS";

// ---------------------------------------------------------------------------
// Recognized networks
// ---------------------------------------------------------------------------

/// API and browser endpoints of an Etherscan-compatible explorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExplorerUrls {
    pub api: &'static str,
    pub browser: &'static str,
}

/// Static description of a network the toolchain can deploy to.
#[derive(Debug, Clone, Copy)]
pub struct NetworkSpec {
    pub name: &'static str,
    pub chain_id: u64,
    /// Ticker of the native currency, used when printing fees.
    pub native_symbol: &'static str,
    /// Environment variable holding the JSON-RPC endpoint.
    pub rpc_env: &'static str,
    /// Environment variable holding the explorer API key, if the network has one.
    pub explorer_key_env: Option<&'static str>,
    pub explorer: Option<ExplorerUrls>,
}

pub const NETWORKS: &[NetworkSpec] = &[
    NetworkSpec {
        name: "bsc",
        chain_id: 56,
        native_symbol: "BNB",
        rpc_env: "BSC_RPC_URL",
        explorer_key_env: Some("BSC_EXPLORER_API_KEY"),
        explorer: Some(ExplorerUrls {
            api: "https://api.bscscan.com/api",
            browser: "https://bscscan.com",
        }),
    },
    NetworkSpec {
        name: "bscTestnet",
        chain_id: 97,
        native_symbol: "tBNB",
        rpc_env: "BSC_TESTNET_RPC_URL",
        explorer_key_env: Some("BSC_EXPLORER_API_KEY"),
        explorer: Some(ExplorerUrls {
            api: "https://api-testnet.bscscan.com/api",
            browser: "https://testnet.bscscan.com",
        }),
    },
    NetworkSpec {
        name: "bitTorrentTestnet",
        chain_id: 1029,
        native_symbol: "BTT",
        rpc_env: "BITTORRENT_TESTNET_RPC_URL",
        explorer_key_env: Some("BITTORRENT_EXPLORER_API_KEY"),
        explorer: Some(ExplorerUrls {
            api: "https://api-testnet.bttcscan.com/api",
            browser: "https://testnet.bttcscan.com",
        }),
    },
    NetworkSpec {
        name: "okc",
        chain_id: 66,
        native_symbol: "OKT",
        rpc_env: "OKC_RPC_URL",
        explorer_key_env: None,
        explorer: None,
    },
    NetworkSpec {
        name: "okcTestnet",
        chain_id: 65,
        native_symbol: "OKT",
        rpc_env: "OKC_TESTNET_RPC_URL",
        explorer_key_env: None,
        explorer: None,
    },
    NetworkSpec {
        name: "polygonTestnet",
        chain_id: 80001,
        native_symbol: "MATIC",
        rpc_env: "POLYGON_TESTNET_RPC_URL",
        explorer_key_env: Some("POLYGON_EXPLORER_API_KEY"),
        explorer: Some(ExplorerUrls {
            api: "https://api-mumbai.polygonscan.com/api",
            browser: "https://mumbai.polygonscan.com",
        }),
    },
    NetworkSpec {
        name: "polygon",
        chain_id: 137,
        native_symbol: "MATIC",
        rpc_env: "POLYGON_RPC_URL",
        explorer_key_env: Some("POLYGON_EXPLORER_API_KEY"),
        explorer: Some(ExplorerUrls {
            api: "https://api.polygonscan.com/api",
            browser: "https://polygonscan.com",
        }),
    },
];

/// Look up a recognized network by its exact name.
pub fn network_spec(name: &str) -> Option<&'static NetworkSpec> {
    NETWORKS.iter().find(|spec| spec.name == name)
}

fn known_network_names() -> String {
    NETWORKS
        .iter()
        .map(|spec| spec.name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Validate that a URL is well-formed and uses HTTP or HTTPS.
pub fn validate_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => {
            let scheme = parsed.scheme();
            (scheme == "http" || scheme == "https") && parsed.host().is_some()
        }
        Err(_) => false,
    }
}

// ---------------------------------------------------------------------------
// Lookup helpers
// ---------------------------------------------------------------------------

/// Read a variable, treating empty or whitespace-only values as absent.
fn optional<F>(lookup: &F, var: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required<F>(lookup: &F, var: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, var).ok_or_else(|| ConfigError::MissingVar(var.to_string()))
}

fn parse_endpoint(var: &str, value: &str) -> Result<Url, ConfigError> {
    if !validate_url(value) {
        return Err(ConfigError::InvalidUrl {
            var: var.to_string(),
            value: value.to_string(),
        });
    }
    Url::parse(value).map_err(|_| ConfigError::InvalidUrl {
        var: var.to_string(),
        value: value.to_string(),
    })
}

fn parse_address(var: &str, value: &str) -> Result<Address, ConfigError> {
    Address::from_str(value).map_err(|_| ConfigError::InvalidAddress {
        var: var.to_string(),
        value: value.to_string(),
    })
}

// ---------------------------------------------------------------------------
// NetworkConfig
// ---------------------------------------------------------------------------

/// Explorer endpoints and credentials for source verification.
#[derive(Clone)]
pub struct ExplorerConfig {
    pub api_url: Url,
    pub browser_url: Url,
    pub api_key: String,
}

impl ExplorerConfig {
    /// Pair the static explorer endpoints of `network` with an API key.
    fn new(network: &str, urls: ExplorerUrls, api_key: String) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: parse_endpoint(&format!("{network} explorer api"), urls.api)?,
            browser_url: parse_endpoint(&format!("{network} explorer browser"), urls.browser)?,
            api_key,
        })
    }
}

impl fmt::Debug for ExplorerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExplorerConfig")
            .field("api_url", &self.api_url.as_str())
            .field("browser_url", &self.browser_url.as_str())
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// A fully resolved network entry: endpoint, signers and optional explorer.
#[derive(Clone)]
pub struct NetworkConfig {
    pub name: String,
    pub chain_id: u64,
    pub native_symbol: String,
    pub rpc_url: Url,
    pub signing_keys: Vec<String>,
    pub explorer: Option<ExplorerConfig>,
}

impl fmt::Debug for NetworkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkConfig")
            .field("name", &self.name)
            .field("chain_id", &self.chain_id)
            .field("rpc_url", &self.rpc_url.as_str())
            .field("signing_keys", &format!("<{} redacted>", self.signing_keys.len()))
            .field("explorer", &self.explorer)
            .finish()
    }
}

impl NetworkConfig {
    /// Resolve a recognized network from the process environment.
    pub fn from_env(name: &str) -> Result<Self, ConfigError> {
        Self::from_lookup(name, &|var: &str| std::env::var(var).ok())
    }

    /// Resolve a recognized network through an arbitrary variable lookup.
    ///
    /// Fails fast on an unknown name, a missing or malformed RPC endpoint, or
    /// a missing signing key. The explorer entry is `None` when the network
    /// has no explorer or its API key is not set.
    pub fn from_lookup<F>(name: &str, lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let spec = network_spec(name).ok_or_else(|| ConfigError::UnknownNetwork {
            name: name.to_string(),
            known: known_network_names(),
        })?;

        let rpc_raw = required(lookup, spec.rpc_env)?;
        let rpc_url = parse_endpoint(spec.rpc_env, &rpc_raw)?;
        let signing_keys = vec![required(lookup, ENV_PRIVATE_KEY)?];

        let explorer = match (spec.explorer, spec.explorer_key_env) {
            (Some(urls), Some(key_env)) => match optional(lookup, key_env) {
                Some(api_key) => Some(ExplorerConfig::new(spec.name, urls, api_key)?),
                None => None,
            },
            _ => None,
        };

        debug!(
            network = spec.name,
            chain_id = spec.chain_id,
            explorer = explorer.is_some(),
            "network resolved"
        );

        Ok(Self {
            name: spec.name.to_string(),
            chain_id: spec.chain_id,
            native_symbol: spec.native_symbol.to_string(),
            rpc_url,
            signing_keys,
            explorer,
        })
    }
}

// ---------------------------------------------------------------------------
// Deployment settings
// ---------------------------------------------------------------------------

/// Where the contract artifacts live and what the constructor receives.
#[derive(Debug, Clone)]
pub struct ContractSettings {
    pub artifact: PathBuf,
    /// Explicit build-info file; derived from the artifact's `.dbg.json` when `None`.
    pub build_info: Option<PathBuf>,
    pub constructor_argument: Address,
}

/// Bounded exponential backoff used while waiting for the explorer to index
/// a freshly deployed contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexingPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl Default for IndexingPolicy {
    fn default() -> Self {
        Self {
            initial_delay: INDEXING_INITIAL_DELAY,
            max_delay: INDEXING_MAX_DELAY,
            max_attempts: INDEXING_MAX_ATTEMPTS,
        }
    }
}

impl IndexingPolicy {
    /// Delay before readiness probe number `attempt` (zero-based).
    ///
    /// The first probe always waits the full initial delay; later probes
    /// double it, capped at `max_delay`.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
            .max(self.initial_delay)
    }
}

/// Timing knobs handed to the orchestrator at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    pub confirmation_timeout: Duration,
    pub receipt_poll_interval: Duration,
    pub indexing: IndexingPolicy,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            confirmation_timeout: Duration::from_secs(DEFAULT_CONFIRMATION_TIMEOUT_SECS),
            receipt_poll_interval: DEFAULT_RECEIPT_POLL_INTERVAL,
            indexing: IndexingPolicy::default(),
        }
    }
}

/// Operator choices that come from the command line rather than the environment.
#[derive(Debug, Clone, Default)]
pub struct DeployOptions {
    pub skip_verify: bool,
    pub confirmation_timeout: Option<Duration>,
}

/// Everything a deployment run needs, resolved and validated up front.
#[derive(Debug, Clone)]
pub struct DeployConfig {
    pub network: NetworkConfig,
    pub contract: ContractSettings,
    pub run: RunSettings,
    pub verify: bool,
    pub report_gas: bool,
}

impl DeployConfig {
    pub fn from_env(network: &str, options: &DeployOptions) -> Result<Self, ConfigError> {
        Self::from_lookup(network, options, &|var: &str| std::env::var(var).ok())
    }

    pub fn from_lookup<F>(
        network: &str,
        options: &DeployOptions,
        lookup: &F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let network = NetworkConfig::from_lookup(network, lookup)?;
        let verify = !options.skip_verify;

        if verify && network.explorer.is_none() {
            let spec = network_spec(&network.name);
            let reason = match spec.and_then(|s| s.explorer_key_env) {
                Some(key_env) => format!("set {key_env} or pass --skip-verify"),
                None => "no explorer is configured; pass --skip-verify".to_string(),
            };
            return Err(ConfigError::MissingExplorer {
                network: network.name.clone(),
                reason,
            });
        }

        let artifact = optional(lookup, ENV_ARTIFACT)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACT_PATH));
        let build_info = optional(lookup, ENV_BUILD_INFO).map(PathBuf::from);
        let argument_raw = optional(lookup, ENV_ARGUMENT)
            .unwrap_or_else(|| DEFAULT_CONSTRUCTOR_ARGUMENT.to_string());
        let constructor_argument = parse_address(ENV_ARGUMENT, &argument_raw)?;

        let mut run = RunSettings::default();
        if let Some(timeout) = options.confirmation_timeout {
            run.confirmation_timeout = timeout;
        } else if let Some(raw) = optional(lookup, ENV_CONFIRMATION_TIMEOUT) {
            let secs = raw.parse::<u64>().map_err(|_| ConfigError::InvalidNumber {
                var: ENV_CONFIRMATION_TIMEOUT.to_string(),
                value: raw.clone(),
            })?;
            run.confirmation_timeout = Duration::from_secs(secs);
        }
        if run.confirmation_timeout.is_zero() {
            let var = if options.confirmation_timeout.is_some() {
                "--confirmation-timeout"
            } else {
                ENV_CONFIRMATION_TIMEOUT
            };
            return Err(ConfigError::InvalidNumber {
                var: var.to_string(),
                value: "0".to_string(),
            });
        }

        Ok(Self {
            network,
            contract: ContractSettings {
                artifact,
                build_info,
                constructor_argument,
            },
            run,
            verify,
            // Any value, including an empty one, turns the report on.
            report_gas: lookup(ENV_REPORT_GAS).is_some(),
        })
    }
}
