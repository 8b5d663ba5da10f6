//! Helpers shared by the command-line binaries.

use crate::block::Block;
use crate::difficulty::DifficultyPolicy;
use crate::wire::NodeInfo;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber, honouring `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Parse `HOST:PORT`, returning `None` when the port is missing or invalid.
pub fn parse_host_port(s: &str) -> Option<(String, u16)> {
    let (host, port) = s.rsplit_once(':')?;
    if host.is_empty() {
        return None;
    }
    let port = port.parse::<u16>().ok()?;
    Some((host.to_string(), port))
}

pub fn node_table(nodes: &[NodeInfo]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Name", "Address", "Last seen"]);
    for node in nodes {
        table.add_row(vec![
            Cell::new(&node.name),
            Cell::new(node.addr()),
            Cell::new(format_timestamp(node.last_seen)),
        ]);
    }
    table
}

/// One row per block, colouring each by whether it links to the row above.
pub fn block_table(blocks: &[Block], policy: &DifficultyPolicy) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Serial", "Wallet", "Prev sig", "Puzzle", "Sig", "Status"]);

    for (i, block) in blocks.iter().enumerate() {
        let status = match i {
            0 => block.verify_signature(policy),
            _ => block.verify_links_to(&blocks[i - 1], policy),
        };
        let color = if status.is_ok() { Color::Green } else { Color::Red };
        table.add_row(vec![
            Cell::new(block.serial_number()),
            Cell::new(format!("{:08x}", block.wallet_number())),
            Cell::new(hex::encode(block.prev_sig_high())),
            Cell::new(format!("{:016x}", block.puzzle())),
            Cell::new(hex::encode(block.sig_part())),
            Cell::new(status).fg(color),
        ]);
    }
    table
}

fn format_timestamp(ts: i32) -> String {
    match chrono::DateTime::from_timestamp(i64::from(ts), 0) {
        Some(dt) if ts > 0 => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        _ => "never".to_string(),
    }
}
