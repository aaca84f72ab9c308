use std::path::{Path, PathBuf};

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Bytes, hex};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::contract::encode_constructor_args;
use crate::error::ChainError;

// ---------------------------------------------------------------------------
// On-disk formats (Hardhat)
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HardhatArtifact {
    contract_name: String,
    source_name: String,
    abi: serde_json::Value,
    bytecode: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebugFile {
    build_info: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildInfo {
    solc_long_version: String,
    input: serde_json::Value,
}

fn artifact_error(path: &Path, reason: impl Into<String>) -> ChainError {
    ChainError::Artifact {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ChainError> {
    let content = std::fs::read_to_string(path).map_err(|e| artifact_error(path, e.to_string()))?;
    serde_json::from_str(&content).map_err(|e| artifact_error(path, e.to_string()))
}

// ---------------------------------------------------------------------------
// ContractArtifact
// ---------------------------------------------------------------------------

/// Compiled contract: ABI and creation bytecode.
#[derive(Debug, Clone)]
pub struct ContractArtifact {
    pub contract_name: String,
    pub source_name: String,
    pub abi: serde_json::Value,
    pub bytecode: Bytes,
}

impl ContractArtifact {
    /// Load a Hardhat artifact JSON file.
    ///
    /// Rejects artifacts without deployable bytecode (interfaces, abstract
    /// contracts, or unlinked libraries).
    pub fn load(path: &Path) -> Result<Self, ChainError> {
        let raw: HardhatArtifact = read_json(path)?;

        let hex_code = raw.bytecode.trim();
        if hex_code.contains("__$") {
            return Err(artifact_error(path, "bytecode has unlinked library references"));
        }
        let bytecode = hex::decode(hex_code)
            .map_err(|e| artifact_error(path, format!("bytecode is not hex: {e}")))?;
        if bytecode.is_empty() {
            return Err(artifact_error(
                path,
                format!("{} has no creation bytecode", raw.contract_name),
            ));
        }

        debug!(
            contract = %raw.contract_name,
            bytes = bytecode.len(),
            "loaded contract artifact"
        );

        Ok(Self {
            contract_name: raw.contract_name,
            source_name: raw.source_name,
            abi: raw.abi,
            bytecode: bytecode.into(),
        })
    }

    /// `path/to/Source.sol:Contract`, the name explorers expect.
    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }

    /// Creation bytecode with the ABI-encoded constructor arguments appended.
    pub fn init_code(&self, args: &[DynSolValue]) -> Bytes {
        let mut code = self.bytecode.to_vec();
        code.extend_from_slice(&encode_constructor_args(args));
        code.into()
    }
}

// ---------------------------------------------------------------------------
// VerificationSource
// ---------------------------------------------------------------------------

/// Everything an explorer needs to rebuild the bytecode from source.
#[derive(Debug, Clone)]
pub struct VerificationSource {
    pub contract_name: String,
    /// `v`-prefixed long compiler version, e.g. `v0.8.4+commit.c7e474f2`.
    pub compiler_version: String,
    /// Solidity standard-JSON compiler input, serialized.
    pub standard_json_input: String,
}

impl VerificationSource {
    /// Load the build info belonging to `artifact`.
    ///
    /// When `build_info` is `None` the path is taken from the artifact's
    /// `.dbg.json` sibling, which Hardhat writes relative to itself.
    pub fn load(
        artifact_path: &Path,
        artifact: &ContractArtifact,
        build_info: Option<&Path>,
    ) -> Result<Self, ChainError> {
        let build_info_path = match build_info {
            Some(path) => path.to_path_buf(),
            None => locate_build_info(artifact_path)?,
        };
        let info: BuildInfo = read_json(&build_info_path)?;

        let version = info.solc_long_version.trim();
        let compiler_version = if version.starts_with('v') {
            version.to_string()
        } else {
            format!("v{version}")
        };

        let standard_json_input = serde_json::to_string(&info.input)
            .map_err(|e| artifact_error(&build_info_path, e.to_string()))?;

        Ok(Self {
            contract_name: artifact.fully_qualified_name(),
            compiler_version,
            standard_json_input,
        })
    }
}

fn locate_build_info(artifact_path: &Path) -> Result<PathBuf, ChainError> {
    let dbg_path = artifact_path.with_extension("dbg.json");
    let dbg: DebugFile = read_json(&dbg_path)?;
    let base = dbg_path.parent().unwrap_or_else(|| Path::new("."));
    Ok(base.join(dbg.build_info))
}
