//! # CLI Interface
//!
//! Defines the command-line argument structure for `ifc-node` using
//! `clap` derive. `run` starts the operator daemon; the other subcommands
//! perform a single protocol operation and print the result as JSON.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// IFC sidechain operator node.
///
/// Signs payment commitments, commits stage roots to the anchor contract,
/// and answers disputes. Serves a REST API and Prometheus metrics.
#[derive(Parser, Debug)]
#[command(
    name = "ifc-node",
    about = "IFC sidechain operator node",
    version,
    propagate_version = true
)]
pub struct IfcNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the operator binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the operator daemon (API + metrics).
    Run(RunArgs),
    /// Generate a fresh operator key file.
    Init(InitArgs),
    /// Sign a raw payment (JSON) for a stage and print the commitment.
    SignPayment(SignPaymentArgs),
    /// Commit the booster's pending root for a stage.
    Commit(StageArgs),
    /// Finalize a stage.
    Finalize(StageArgs),
    /// Exonerate a payment in a stage with its slice.
    Exonerate(ExonerateArgs),
    /// Submit a penalty for payments in a stage.
    Penalty(PenaltyArgs),
    /// Build a signed withdrawal and send it to the booster.
    Withdraw(WithdrawArgs),
    /// Print version information and exit.
    Version,
}

/// Settings shared by every subcommand that talks to the booster or chain.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Path to the node configuration file (TOML).
    #[arg(long, short = 'c', env = "IFC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Booster node base URL.
    #[arg(long, env = "IFC_BOOSTER_URL")]
    pub booster_url: Option<String>,

    /// Anchor chain JSON-RPC URL.
    #[arg(long, env = "IFC_CHAIN_RPC_URL")]
    pub chain_rpc_url: Option<String>,

    /// File holding the hex-encoded operator key.
    #[arg(long, env = "IFC_OPERATOR_KEY")]
    pub operator_key: Option<PathBuf>,

    /// Expected signer address (0x-prefixed).
    #[arg(long, env = "IFC_SIGNER_ADDRESS")]
    pub signer_address: Option<String>,

    /// Objection window attached to commits, in seconds.
    #[arg(long, env = "IFC_OBJECTION_TIME")]
    pub objection_time: Option<u64>,

    /// Finalize delay attached to commits, in seconds.
    #[arg(long, env = "IFC_FINALIZE_TIME")]
    pub finalize_time: Option<u64>,

    /// Log output format: "pretty" or "json".
    #[arg(long, env = "IFC_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Port for the REST API. Overrides the config file.
    #[arg(long, env = "IFC_API_PORT")]
    pub api_port: Option<u16>,

    /// Port for the Prometheus metrics endpoint. Overrides the config file.
    #[arg(long, env = "IFC_METRICS_PORT")]
    pub metrics_port: Option<u16>,
}

/// Arguments for the `init` subcommand.
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Where to write the key.
    #[arg(long, env = "IFC_OPERATOR_KEY", default_value = crate::config::DEFAULT_KEY_PATH)]
    pub operator_key: PathBuf,

    /// Overwrite an existing key file.
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `sign-payment` subcommand.
#[derive(Parser, Debug)]
pub struct SignPaymentArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Raw payment JSON file, or "-" for stdin.
    #[arg(long, short = 'p')]
    pub payment: PathBuf,

    /// Stage to sign for. Defaults to the payment's own stageHeight.
    #[arg(long)]
    pub stage_height: Option<u64>,

    /// Forward the signed commitment to the booster.
    #[arg(long)]
    pub send: bool,
}

/// Arguments for `commit` and `finalize`.
#[derive(Parser, Debug)]
pub struct StageArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Stage height.
    pub stage_height: u64,
}

/// Arguments for the `exonerate` subcommand.
#[derive(Parser, Debug)]
pub struct ExonerateArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Stage height.
    pub stage_height: u64,

    /// Hash of the disputed payment (hex).
    pub payment_hash: String,

    /// Proof JSON file. Fetched from the booster when omitted.
    #[arg(long)]
    pub proof: Option<PathBuf>,
}

/// Arguments for the `penalty` subcommand.
#[derive(Parser, Debug)]
pub struct PenaltyArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Stage height.
    pub stage_height: u64,

    /// Payment hashes (hex).
    #[arg(required = true)]
    pub payment_hashes: Vec<String>,
}

/// Arguments for the `withdraw` subcommand.
#[derive(Parser, Debug)]
pub struct WithdrawArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Amount to withdraw.
    pub value: u64,

    /// Asset to withdraw. Defaults to the native asset.
    #[arg(long)]
    pub asset_id: Option<u64>,
}
