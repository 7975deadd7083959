use clap::Parser;

use crate::utils::constants::DEFAULT_SUCCESSOR_LIST_LEN;

#[derive(Parser, Debug)]
#[command(about = "A Chord DHT node speaking HTTP")]
pub struct Cli {
    /// Public endpoint of this node, e.g. 127.0.0.1:5000
    pub endpoint: String,

    /// Identifier space bit width
    #[arg(value_parser = clap::value_parser!(u32).range(1..=64))]
    pub m: u32,

    /// Endpoint of a ring member to join on startup
    #[arg(short, long)]
    pub peer: Option<String>,

    /// Successor list length
    #[arg(long, default_value_t = DEFAULT_SUCCESSOR_LIST_LEN)]
    pub successors: usize,
}
