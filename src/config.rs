//! Command-line configuration for the accuracy benchmark

use clap::Parser;

use crate::engine::StockfishLauncher;

#[derive(Parser, Debug, Clone)]
#[command(name = "benchmark", about = "Engine-driven accuracy benchmark over chess.com games")]
pub struct BenchConfig {
    /// chess.com username whose games are analyzed
    #[arg(default_value = "hikaru")]
    pub username: String,

    /// Maximum number of games to fetch and analyze
    #[arg(default_value_t = 1000)]
    pub games: usize,

    /// Games analyzed concurrently, each with its own engine process
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: u16,

    /// Engine threads per worker
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    pub threads: u16,

    /// Fixed search depth per position
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u32).range(1..))]
    pub depth: u32,

    /// Path to the UCI engine binary
    #[arg(long = "engine", env = "STOCKFISH_PATH", default_value = "stockfish")]
    pub engine_path: String,
}

impl BenchConfig {
    /// Threads the run may keep busy: workers times engine threads.
    pub fn total_cpu(&self) -> usize {
        self.workers as usize * self.threads as usize
    }

    pub fn launcher(&self) -> StockfishLauncher {
        StockfishLauncher {
            path: self.engine_path.clone(),
            threads: self.threads as usize,
            depth: self.depth,
        }
    }
}
