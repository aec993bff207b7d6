// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # IFC Operator Node
//!
//! Entry point for the `ifc-node` binary. Parses CLI arguments, initializes
//! logging, wires the operator credential to the booster and the anchor
//! chain, and either serves the HTTP API or runs one protocol operation.
//!
//! - `run`          — start the operator daemon
//! - `init`         — generate an operator key file
//! - `sign-payment` — sign a raw payment for a stage
//! - `commit`, `finalize`, `exonerate`, `penalty` — one stage transition
//! - `withdraw`     — build, sign and send a withdrawal light transaction
//! - `version`      — print build version information

mod api;
mod cli;
mod config;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tokio::signal;

use ifc_protocol::chain::JsonRpcChainClient;
use ifc_protocol::crypto::hash::parse_h256;
use ifc_protocol::crypto::IfcKeypair;
use ifc_protocol::gateway::{BoosterGateway, HttpGateway};
use ifc_protocol::light_tx::LightTransactionFactory;
use ifc_protocol::payment::{PaymentSigner, RawPayment};
use ifc_protocol::stage::{ExonerationProof, StageLifecycle};

use cli::{Commands, CommonArgs, IfcNodeCli};
use config::NodeConfig;
use logging::LogFormat;
use metrics::NodeMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = IfcNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Init(args) => init_key(args),
        Commands::SignPayment(args) => sign_payment(args).await,
        Commands::Commit(args) => {
            let ctx = Operator::connect(&args.common)?;
            print_json(&ctx.lifecycle.commit(args.stage_height).await?)
        }
        Commands::Finalize(args) => {
            let ctx = Operator::connect(&args.common)?;
            print_json(&ctx.lifecycle.finalize(args.stage_height).await?)
        }
        Commands::Exonerate(args) => exonerate(args).await,
        Commands::Penalty(args) => {
            let ctx = Operator::connect(&args.common)?;
            let hashes = args
                .payment_hashes
                .iter()
                .map(|h| parse_h256(h).with_context(|| format!("invalid payment hash {h}")))
                .collect::<Result<Vec<_>>>()?;
            print_json(&ctx.lifecycle.pay_penalty(args.stage_height, hashes).await?)
        }
        Commands::Withdraw(args) => withdraw(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Everything a subcommand needs to act as the operator.
struct Operator {
    config: NodeConfig,
    signer: PaymentSigner,
    gateway: Arc<HttpGateway>,
    lifecycle: Arc<StageLifecycle>,
}

impl Operator {
    /// Load config and key, start logging, build the gateway and chain clients.
    fn connect(args: &CommonArgs) -> Result<Self> {
        logging::init_logging(
            logging::DEFAULT_FILTER,
            LogFormat::from_str_lossy(&args.log_format),
        );
        let config = NodeConfig::load(args)?;
        let credential = config.load_credential()?;

        let gateway = Arc::new(HttpGateway::new(config.booster_url.clone()));
        let chain = Arc::new(JsonRpcChainClient::new(
            config.chain_rpc_url.clone(),
            credential.signer_address(),
        ));
        let lifecycle = Arc::new(
            StageLifecycle::new(gateway.clone(), chain, config.timings())
                .with_commit_abi(config.commit_abi),
        );

        Ok(Self {
            config,
            signer: PaymentSigner::new(credential),
            gateway,
            lifecycle,
        })
    }
}

/// Starts the operator daemon: API server and metrics endpoint.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    let ctx = Operator::connect(&args.common)?;
    let api_port = args.api_port.unwrap_or(ctx.config.api_port);
    let metrics_port = args.metrics_port.unwrap_or(ctx.config.metrics_port);

    tracing::info!(
        signer = %ctx.signer.signer_address(),
        booster = %ctx.config.booster_url,
        chain = %ctx.config.chain_rpc_url,
        api_port,
        metrics_port,
        "starting ifc-node"
    );

    // Fail early if the booster is down rather than on the first commit.
    match ctx.lifecycle.contract_address().await {
        Ok(address) => tracing::info!(contract = %address, "anchor contract resolved"),
        Err(e) => tracing::warn!(error = %e, "could not resolve contract address yet"),
    }

    let node_metrics = Arc::new(NodeMetrics::new().context("failed to register metrics")?);

    let app_state = api::AppState {
        version: format!(
            "{} (protocol {})",
            env!("CARGO_PKG_VERSION"),
            ifc_protocol::config::PROTOCOL_VERSION,
        ),
        signer: ctx.signer.clone(),
        lifecycle: Arc::clone(&ctx.lifecycle),
        metrics: Arc::clone(&node_metrics),
        started_at: chrono::Utc::now(),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", api_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!("API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&node_metrics));
    let metrics_addr = format!("0.0.0.0:{}", metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    let metrics_server = tokio::spawn(async move {
        if let Err(e) = axum::serve(metrics_listener, metrics_router).await {
            tracing::error!("Metrics server error: {}", e);
        }
    });

    // --- Serve ---
    axum::serve(api_listener, api_router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server error")?;

    metrics_server.abort();
    tracing::info!("ifc-node stopped");
    Ok(())
}

/// Generates an operator key file readable only by its owner.
fn init_key(args: cli::InitArgs) -> Result<()> {
    logging::init_logging("ifc_node=info", LogFormat::Pretty);

    let key_path = &args.operator_key;
    if key_path.exists() && !args.force {
        anyhow::bail!(
            "{} already exists; pass --force to overwrite it",
            key_path.display()
        );
    }
    if let Some(parent) = key_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let keypair = IfcKeypair::generate();
    std::fs::write(key_path, hex::encode(keypair.secret_key_bytes()))
        .with_context(|| format!("failed to write operator key to {}", key_path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(key_path, std::fs::Permissions::from_mode(0o600))?;
    }

    let address = keypair.address();
    tracing::info!(address = %address, key_path = %key_path.display(), "operator key generated");

    println!("Operator key generated.");
    println!("  Key file : {}", key_path.display());
    println!("  Address  : {}", address);

    Ok(())
}

/// Signs a raw payment read from a file (or stdin) and prints the commitment.
async fn sign_payment(args: cli::SignPaymentArgs) -> Result<()> {
    let ctx = Operator::connect(&args.common)?;

    let text = read_input(&args.payment)?;
    let raw: RawPayment = serde_json::from_str(&text).context("payment is not valid JSON")?;
    let stage_height = args
        .stage_height
        .or(raw.stage_height)
        .context("no stage height: pass --stage-height or set stageHeight")?;

    let commitment = ctx.signer.sign_commitment(&raw, stage_height)?;
    if args.send {
        let resp = ctx
            .lifecycle
            .send_payments(std::slice::from_ref(&commitment))
            .await?;
        tracing::info!(response = %resp, "commitment forwarded to booster");
    }
    print_json(&commitment)
}

async fn exonerate(args: cli::ExonerateArgs) -> Result<()> {
    let ctx = Operator::connect(&args.common)?;
    let payment_hash = parse_h256(&args.payment_hash)
        .with_context(|| format!("invalid payment hash {}", args.payment_hash))?;

    let handle = match &args.proof {
        Some(path) => {
            let proof: ExonerationProof = serde_json::from_str(&read_input(path)?)
                .with_context(|| format!("invalid proof in {}", path.display()))?;
            ctx.lifecycle
                .exonerate_with_proof(args.stage_height, &payment_hash, &proof)
                .await?
        }
        None => {
            ctx.lifecycle
                .exonerate(args.stage_height, &payment_hash)
                .await?
        }
    };
    print_json(&handle)
}

/// Builds a signed withdrawal with the operator key and sends it.
async fn withdraw(args: cli::WithdrawArgs) -> Result<()> {
    let ctx = Operator::connect(&args.common)?;
    let factory = LightTransactionFactory::new(ctx.config.load_credential()?);

    let tx = factory.propose_withdrawal(args.asset_id, args.value)?;
    let receipt = ctx
        .gateway
        .send_light_tx(&tx)
        .await
        .context("booster rejected the withdrawal")?;

    print_json(&serde_json::json!({ "lightTx": tx, "receipt": receipt }))
}

/// Reads a whole file, or stdin for "-".
fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("ifc-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol {}", ifc_protocol::config::PROTOCOL_VERSION);
    println!("rustc    {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported. If a handler cannot be
/// installed the other one still applies.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received, draining connections");
}
