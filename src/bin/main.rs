#![forbid(unsafe_code)]

use colored::*;

fn main() {
    println!("{}", "HanukCoin CLI".bright_cyan().bold());
    println!("{}", "-------------".bright_cyan());
    println!();
    println!(
        "{}",
        "Functionality lives in separate binaries.".yellow()
    );
    println!(
        "{}",
        "Use 'cargo run --bin <binary_name>' to run a specific command.".yellow()
    );
    println!();
    println!("{}", "Available binaries:".bright_green().underline());
    println!("  - {}  mine blocks on top of genesis", "hanukcoin-mine".bright_white());
    println!("  - {}  query peers and print their chain", "hanukcoin-show-chain".bright_white());
    println!("  - {}  serve the local chain to peers", "hanukcoin-node".bright_white());
    println!();
    println!("{}", "Example:".bright_green().underline());
    println!("{}", "  cargo run --release --bin hanukcoin-mine -- 3".italic());
}
