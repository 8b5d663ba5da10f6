#![forbid(unsafe_code)]
//! Serve the local chain to peers, optionally mining on top of it.

use clap::Parser;
use hanukcoin::chain::Chain;
use hanukcoin::cli::{init_tracing, parse_host_port};
use hanukcoin::config::{load_config, DEFAULT_CONFIG_PATH};
use hanukcoin::miner::mine_parallel;
use hanukcoin::network::{serve, unix_timestamp, NodeState, SharedState};
use hanukcoin::wallet_code;
use hanukcoin::wire::NodeInfo;
use hanukcoin::DifficultyPolicy;
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Override network.listen_port
    #[arg(long)]
    port: Option<u16>,
    /// Mine blocks in the background with miner.wallet_name
    #[arg(long)]
    mine: bool,
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();
    let mut config = load_config(&cli.config)?;
    if let Some(port) = cli.port {
        config.network.listen_port = port;
    }
    let policy = config.policy();

    // Fail fast: the genesis record must verify before anything is served
    let chain = Chain::new(policy)?;

    let peers = config
        .network
        .peers
        .iter()
        .filter_map(|p| match parse_host_port(p) {
            Some((host, port)) => Some(NodeInfo::new("", host, port, 0)),
            None => {
                warn!(peer = %p, "ignoring malformed peer address");
                None
            }
        })
        .collect();
    let me = NodeInfo::new(
        config.network.node_name.clone(),
        config.network.listen_host.clone(),
        config.network.listen_port,
        unix_timestamp(),
    );
    let state = NodeState::new(me, peers, chain).shared();

    if cli.mine {
        let wallet = wallet_code(&config.miner.wallet_name);
        let wallet_hex = format!("{:08x}", wallet);
        info!(wallet = %wallet_hex, "background mining enabled");
        tokio::spawn(mining_loop(
            state.clone(),
            policy,
            wallet,
            config.miner.attempt_budget,
            config.miner.threads,
        ));
    }

    let listener = TcpListener::bind(config.listen_addr()).await?;
    serve(listener, state).await?;
    Ok(())
}

/// Mine on the current tip forever, appending every block found.
///
/// Appends go through the write lock; a block whose predecessor is no longer
/// the tip is rejected by `Chain::append` and mining starts over.
async fn mining_loop(
    state: SharedState,
    policy: DifficultyPolicy,
    wallet: u32,
    budget: u64,
    threads: usize,
) {
    loop {
        let tip = state.read().await.chain.tip().clone();
        if tip.wallet_number() == wallet {
            // A wallet may not mine two blocks in a row; wait for a peer.
            tokio::time::sleep(Duration::from_secs(5)).await;
            continue;
        }

        let mined = tokio::task::spawn_blocking(move || {
            mine_parallel(policy, wallet, &tip, budget, threads)
        })
        .await;

        match mined {
            Ok(Some(block)) => {
                let serial = block.serial_number();
                match state.write().await.chain.append(block) {
                    Ok(()) => info!(serial, "appended mined block"),
                    Err(e) => warn!(serial, error = %e, "discarded mined block"),
                }
            }
            Ok(None) => info!("mining budget exhausted, retrying"),
            Err(e) => {
                warn!(error = %e, "mining task failed");
                return;
            }
        }
    }
}
