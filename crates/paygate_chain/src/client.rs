use alloy_network::{EthereumWallet, ReceiptResponse, TransactionBuilder};
use alloy_primitives::{Address, Bytes, TxHash};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_types::{TransactionReceipt, TransactionRequest};
use async_trait::async_trait;
use paygate_core::NetworkConfig;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::ChainError;
use crate::signer::primary_signer;

/// Client-side view of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    pub effective_gas_price: u128,
    /// Set only for contract-creation transactions.
    pub contract_address: Option<Address>,
    pub success: bool,
}

impl From<&TransactionReceipt> for TxReceipt {
    fn from(receipt: &TransactionReceipt) -> Self {
        Self {
            tx_hash: receipt.transaction_hash(),
            block_number: receipt.block_number(),
            gas_used: receipt.gas_used(),
            effective_gas_price: receipt.effective_gas_price(),
            contract_address: receipt.contract_address(),
            success: receipt.status(),
        }
    }
}

/// The network and signing account the orchestrator drives.
///
/// Submissions return as soon as the node accepts the transaction; inclusion
/// is observed separately through [`ChainClient::receipt`].
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Name of the network the client is connected to.
    fn network(&self) -> &str;

    /// Address of the account that signs every submission.
    fn signer_address(&self) -> Address;

    /// Submit a contract-creation transaction carrying `init_code`.
    async fn send_creation(&self, init_code: Bytes) -> Result<TxHash, ChainError>;

    /// Submit a call transaction to `to` with `calldata`.
    async fn send_call(&self, to: Address, calldata: Bytes) -> Result<TxHash, ChainError>;

    /// Receipt of `tx_hash`, or `None` while it is still pending.
    async fn receipt(&self, tx_hash: TxHash) -> Result<Option<TxReceipt>, ChainError>;
}

// ---------------------------------------------------------------------------
// Alloy implementation
// ---------------------------------------------------------------------------

/// [`ChainClient`] over an alloy HTTP provider with a local signing wallet.
///
/// Nonce, gas and chain ID are filled by the provider's default fillers.
pub struct AlloyChainClient {
    provider: DynProvider,
    signer: Address,
    network: String,
}

impl AlloyChainClient {
    /// Connect to the network's RPC endpoint and check that it serves the
    /// configured chain.
    pub async fn connect(network: &NetworkConfig) -> Result<Self, ChainError> {
        let signer = primary_signer(network)?;
        let signer_address = signer.address();
        let wallet = EthereumWallet::from(signer);

        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect_http(network.rpc_url.clone());

        let actual = provider.get_chain_id().await.map_err(|e| {
            ChainError::Rpc(format!("Failed to connect to {}: {e}", network.rpc_url))
        })?;
        if actual != network.chain_id {
            return Err(ChainError::ChainIdMismatch {
                expected: network.chain_id,
                actual,
            });
        }

        info!(
            network = %network.name,
            chain_id = actual,
            deployer = %signer_address,
            "connected to RPC endpoint"
        );

        Ok(Self {
            provider: provider.erased(),
            signer: signer_address,
            network: network.name.clone(),
        })
    }

    async fn submit(&self, tx: TransactionRequest) -> Result<TxHash, ChainError> {
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| ChainError::Rejected(e.to_string()))?;
        let hash = *pending.tx_hash();
        debug!(network = %self.network, tx = %hash, "transaction submitted");
        Ok(hash)
    }
}

#[async_trait]
impl ChainClient for AlloyChainClient {
    fn network(&self) -> &str {
        &self.network
    }

    fn signer_address(&self) -> Address {
        self.signer
    }

    async fn send_creation(&self, init_code: Bytes) -> Result<TxHash, ChainError> {
        let tx = TransactionRequest::default()
            .with_from(self.signer)
            .with_deploy_code(init_code);
        self.submit(tx).await
    }

    async fn send_call(&self, to: Address, calldata: Bytes) -> Result<TxHash, ChainError> {
        let tx = TransactionRequest::default()
            .with_from(self.signer)
            .with_to(to)
            .with_input(calldata);
        self.submit(tx).await
    }

    async fn receipt(&self, tx_hash: TxHash) -> Result<Option<TxReceipt>, ChainError> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| ChainError::Rpc(format!("Failed to get receipt for {tx_hash}: {e}")))?;
        Ok(receipt.as_ref().map(TxReceipt::from))
    }
}
