#![forbid(unsafe_code)]
//! Show what peers know about the network and their chains.

use clap::Parser;
use colored::*;
use hanukcoin::block::{Block, BLOCK_SIZE};
use hanukcoin::chain::validate_chain;
use hanukcoin::cli::{block_table, init_tracing, node_table, parse_host_port};
use hanukcoin::config::{load_config, DEFAULT_CONFIG_PATH};
use hanukcoin::network::fetch_from_peer;
use hanukcoin::wire::PeerMessage;
use hanukcoin::DifficultyPolicy;
use std::path::PathBuf;
use tokio::task::JoinSet;
use tracing::warn;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Peers to query, as HOST:PORT
    peers: Vec<String>,
    /// Read a chain of raw 36-byte records instead of querying peers
    #[arg(long, conflicts_with = "peers")]
    file: Option<PathBuf>,
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    let policy = config.policy();

    if let Some(path) = cli.file {
        let bytes = std::fs::read(&path)?;
        if bytes.len() % BLOCK_SIZE != 0 {
            return Err(format!("{} is not a whole number of records", path.display()).into());
        }
        let blocks = bytes
            .chunks(BLOCK_SIZE)
            .map(Block::from_bytes)
            .collect::<Result<Vec<_>, _>>()?;
        print_chain(&path.display().to_string(), &blocks, &policy);
        return Ok(());
    }

    let peers = if cli.peers.is_empty() {
        config.network.peers.clone()
    } else {
        cli.peers
    };
    if peers.is_empty() {
        eprintln!("{}", "❌ Please provide HOST:PORT".red());
        return Ok(());
    }
    for peer in &peers {
        if parse_host_port(peer).is_none() {
            eprintln!("{}", format!("❌ Not a HOST:PORT: {}", peer).red());
            return Ok(());
        }
    }

    let mut tasks = JoinSet::new();
    for peer in peers {
        tasks.spawn(async move {
            let result = fetch_from_peer(&peer, &PeerMessage::empty_request()).await;
            (peer, result)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let (peer, result) = joined?;
        match result {
            Ok(msg) => {
                println!("{}", format!("==== Nodes from {} ====", peer).bright_cyan().bold());
                println!("{}", node_table(&msg.nodes));
                print_chain(&peer, &msg.blocks, &policy);
            }
            Err(e) => {
                warn!(peer = %peer, error = %e, "query failed");
                eprintln!("{}", format!("❌ {}: {}", peer, e).red());
            }
        }
    }

    Ok(())
}

fn print_chain(source: &str, blocks: &[Block], policy: &DifficultyPolicy) {
    println!("{}", format!("==== Blocks from {} ====", source).bright_cyan().bold());
    if blocks.is_empty() {
        println!("{}", "(no blocks)".dimmed());
        return;
    }
    println!("{}", block_table(blocks, policy));
    match validate_chain(blocks, policy) {
        Ok(()) => println!("{} {} blocks", "✅ Valid chain:".green().bold(), blocks.len()),
        Err(e) => println!("{} {}", "❌ Invalid chain:".red().bold(), e),
    }
}
