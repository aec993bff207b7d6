//! # Node Configuration
//!
//! Settings come from three layers, later ones winning:
//!
//! 1. built-in defaults (the protocol's `DEFAULT_*` constants),
//! 2. an optional TOML file (`--config` / `IFC_CONFIG`),
//! 3. command-line flags and their `IFC_*` environment variables.
//!
//! ```toml
//! booster_url     = "http://127.0.0.1:3000"
//! chain_rpc_url   = "http://127.0.0.1:8545"
//! operator_key    = "operator.key"
//! signer_address  = "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
//! api_port        = 9841
//! metrics_port    = 9842
//! objection_time  = 86400
//! finalize_time   = 172800
//! commit_abi      = "root-only"   # or "with-timings"
//! ```
//!
//! `commit_abi` is file-only: it describes the deployed contract, not a run.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use ifc_protocol::config::{
    CommitAbi, StageTimings, DEFAULT_API_PORT, DEFAULT_BOOSTER_URL, DEFAULT_CHAIN_RPC_URL,
    DEFAULT_FINALIZE_TIME_SECS, DEFAULT_METRICS_PORT, DEFAULT_OBJECTION_TIME_SECS,
};
use ifc_protocol::crypto::{Address, Credential, IfcKeypair};

use crate::cli::CommonArgs;

/// Default location of the operator key file.
pub const DEFAULT_KEY_PATH: &str = "operator.key";

/// Resolved node configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Base URL of the booster node.
    pub booster_url: String,
    /// JSON-RPC endpoint of the anchor chain node.
    pub chain_rpc_url: String,
    /// File holding the hex-encoded secp256k1 operator key.
    pub operator_key: PathBuf,
    /// Address signatures must recover to. Defaults to the key's own.
    pub signer_address: Option<String>,
    pub api_port: u16,
    pub metrics_port: u16,
    /// Seconds, attached to every commit.
    pub objection_time: u64,
    /// Seconds, attached to every commit.
    pub finalize_time: u64,
    /// Which `addNewStage` the anchor contract exposes. Timings are only
    /// sent with `with-timings`.
    pub commit_abi: CommitAbi,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            booster_url: DEFAULT_BOOSTER_URL.to_string(),
            chain_rpc_url: DEFAULT_CHAIN_RPC_URL.to_string(),
            operator_key: PathBuf::from(DEFAULT_KEY_PATH),
            signer_address: None,
            api_port: DEFAULT_API_PORT,
            metrics_port: DEFAULT_METRICS_PORT,
            objection_time: DEFAULT_OBJECTION_TIME_SECS,
            finalize_time: DEFAULT_FINALIZE_TIME_SECS,
            commit_abi: CommitAbi::default(),
        }
    }
}

impl NodeConfig {
    /// Parse a TOML file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// Defaults, then the file named by `args.config` if any, then flags.
    pub fn load(args: &CommonArgs) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply(args);
        Ok(config)
    }

    fn apply(&mut self, args: &CommonArgs) {
        if let Some(url) = &args.booster_url {
            self.booster_url = url.clone();
        }
        if let Some(url) = &args.chain_rpc_url {
            self.chain_rpc_url = url.clone();
        }
        if let Some(path) = &args.operator_key {
            self.operator_key = path.clone();
        }
        if let Some(address) = &args.signer_address {
            self.signer_address = Some(address.clone());
        }
        if let Some(t) = args.objection_time {
            self.objection_time = t;
        }
        if let Some(t) = args.finalize_time {
            self.finalize_time = t;
        }
    }

    pub fn timings(&self) -> StageTimings {
        StageTimings {
            objection_time: self.objection_time,
            finalize_time: self.finalize_time,
        }
    }

    /// The configured signer address, if one was set.
    pub fn signer_address(&self) -> Result<Option<Address>> {
        self.signer_address
            .as_deref()
            .map(|s| {
                s.parse::<Address>()
                    .with_context(|| format!("invalid signer address {s}"))
            })
            .transpose()
    }

    /// Read the operator key and pair it with the configured signer address.
    pub fn load_credential(&self) -> Result<Credential> {
        let path = &self.operator_key;
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read operator key {}", path.display()))?;
        let keypair = IfcKeypair::from_hex(text.trim())
            .with_context(|| format!("invalid operator key in {}", path.display()))?;

        let credential = match self.signer_address()? {
            Some(address) => Credential::with_signer_address(keypair, address),
            None => Credential::new(keypair),
        };
        if !credential.is_consistent() {
            tracing::warn!(
                configured = %credential.signer_address(),
                derived = %credential.derived_address(),
                "operator key does not match the configured signer address; signing will fail"
            );
        }
        Ok(credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> CommonArgs {
        CommonArgs {
            config: None,
            booster_url: None,
            chain_rpc_url: None,
            operator_key: None,
            signer_address: None,
            objection_time: None,
            finalize_time: None,
            log_format: "pretty".into(),
        }
    }

    #[test]
    fn test_defaults_without_file() {
        let config = NodeConfig::load(&args()).unwrap();
        assert_eq!(config, NodeConfig::default());
        assert!(config.timings().is_consistent());
    }

    #[test]
    fn test_file_then_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node.toml");
        std::fs::write(
            &path,
            "booster_url = \"http://booster:3000\"\nobjection_time = 60\nfinalize_time = 120\n",
        )
        .unwrap();

        let mut a = args();
        a.config = Some(path);
        a.finalize_time = Some(600);
        let config = NodeConfig::load(&a).unwrap();

        assert_eq!(config.booster_url, "http://booster:3000");
        assert_eq!(config.chain_rpc_url, DEFAULT_CHAIN_RPC_URL);
        assert_eq!(config.objection_time, 60);
        assert_eq!(config.finalize_time, 600);
    }

    #[test]
    fn test_commit_abi_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node.toml");
        std::fs::write(&path, "commit_abi = \"with-timings\"\n").unwrap();
        assert_eq!(
            NodeConfig::from_file(&path).unwrap().commit_abi,
            CommitAbi::WithTimings
        );
        assert_eq!(NodeConfig::default().commit_abi, CommitAbi::RootOnly);
    }

    #[test]
    fn test_bad_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node.toml");
        std::fs::write(&path, "api_port = \"not a port\"").unwrap();
        assert!(NodeConfig::from_file(&path).is_err());
    }

    #[test]
    fn test_load_credential() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("operator.key");
        std::fs::write(&key_path, format!("{}\n", "00".repeat(31) + "01")).unwrap();

        let config = NodeConfig {
            operator_key: key_path,
            ..Default::default()
        };
        let credential = config.load_credential().unwrap();
        assert_eq!(
            credential.signer_address().to_hex(),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn test_invalid_signer_address() {
        let config = NodeConfig {
            signer_address: Some("0x1234".into()),
            ..Default::default()
        };
        assert!(config.signer_address().is_err());
    }
}
