#![forbid(unsafe_code)]
//! Mine blocks on top of genesis, alternating between two wallets.

use clap::Parser;
use colored::*;
use hanukcoin::chain::Chain;
use hanukcoin::cli::{block_table, init_tracing};
use hanukcoin::config::{load_config, DEFAULT_CONFIG_PATH};
use hanukcoin::miner::{mine_parallel, Miner};
use hanukcoin::{is_valid_chain, wallet_code, Block, DifficultyPolicy};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Number of blocks to mine
    count: usize,
    /// Wallet name mining odd serial numbers (defaults to miner.wallet_name)
    #[arg(long)]
    wallet: Option<String>,
    /// Wallet name mining even serial numbers
    #[arg(long, default_value = "TEST2")]
    other_wallet: String,
    /// Attempts per search before starting over
    #[arg(long)]
    budget: Option<u64>,
    /// Parallel workers per search
    #[arg(long)]
    threads: Option<usize>,
    /// Override difficulty.base_zero_bits
    #[arg(long)]
    base_zero_bits: Option<u32>,
    /// Write the mined chain as raw 36-byte records
    #[arg(long)]
    out: Option<PathBuf>,
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    let policy = cli
        .base_zero_bits
        .map(DifficultyPolicy::new)
        .unwrap_or_else(|| config.policy());
    let budget = cli.budget.unwrap_or(config.miner.attempt_budget).max(1);
    let threads = cli.threads.unwrap_or(config.miner.threads).max(1);
    let first_name = cli.wallet.unwrap_or(config.miner.wallet_name);

    let mut wallets = [wallet_code(&first_name), wallet_code(&cli.other_wallet)];
    if wallets[0] == wallets[1] {
        return Err("the two wallets must differ".into());
    }

    println!(
        "{}",
        format!("⛏️  Mining {} blocks (base {} zero bits)", cli.count, policy.base_zero_bits())
            .bright_cyan()
            .bold()
    );

    let mut chain = Chain::new(policy)?;
    let mut miner = Miner::from_entropy(policy);
    let total = Instant::now();

    for _ in 0..cli.count {
        let prev = chain.tip().clone();
        let serial = prev.serial_number() + 1;

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")?);
        spinner.set_message(format!(
            "block #{} needs {} zero bits",
            serial,
            policy.required_zero_bits(serial)
        ));
        spinner.enable_steady_tick(Duration::from_millis(120));

        let started = Instant::now();
        let mut searches = 0u64;
        let block = loop {
            searches += 1;
            let found = if threads > 1 {
                mine_parallel(policy, wallets[0], &prev, budget, threads)
            } else {
                miner.mine(wallets[0], &prev, budget)
            };
            if let Some(block) = found {
                break block;
            }
        };
        spinner.finish_and_clear();

        chain.append(block.clone())?;
        wallets.swap(0, 1);
        print_block(&block, started.elapsed(), searches);
    }

    println!();
    println!("{}", block_table(chain.blocks(), &policy));
    let valid = is_valid_chain(chain.blocks(), &policy);
    println!(
        "Chain of {} blocks in {}: {}",
        chain.len(),
        humantime::format_duration(Duration::from_secs(total.elapsed().as_secs())),
        if valid { "VALID".green().bold() } else { "INVALID".red().bold() }
    );

    if let Some(path) = cli.out {
        let bytes: Vec<u8> = chain
            .blocks()
            .iter()
            .flat_map(|b| b.as_bytes().iter().copied())
            .collect();
        fs::write(&path, bytes)?;
        println!("Wrote {} records to {}", chain.len(), path.display());
    }

    Ok(())
}

fn print_block(block: &Block, took: Duration, searches: u64) {
    println!(
        "{} #{} by {:08x} in {} ({} search{})",
        "✅".green(),
        block.serial_number(),
        block.wallet_number(),
        humantime::format_duration(Duration::from_millis(took.as_millis() as u64)),
        searches,
        if searches == 1 { "" } else { "es" }
    );
    println!("{}", block.bin_dump().dimmed());
}
