//! Measures how fast games can be replayed move by move into FENs, without
//! any engine in the loop.

use std::time::Instant;

use anyhow::Context;
use chess_accuracy_bench::batch::Progress;
use chess_accuracy_bench::pgn::{parse_pgn_moves, Replay};
use chess_accuracy_bench::ChessComClient;
use clap::Parser;
use rayon::prelude::*;

const PROGRESS_EVERY: usize = 100;

#[derive(Parser)]
#[command(name = "pgn_benchmark", about = "PGN replay throughput over chess.com games")]
struct Args {
    #[arg(default_value = "hikaru")]
    username: String,
    #[arg(default_value_t = 1000)]
    games: usize,
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u16).range(1..))]
    workers: u16,
}

/// Plies replayed until the first move that does not apply.
fn replay_game(pgn: &str) -> usize {
    let mut replay = Replay::new();
    for san in parse_pgn_moves(pgn) {
        if replay.play_san(san).is_err() {
            break;
        }
        let _ = replay.fen();
    }
    replay.ply()
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    println!("Rust PGN Parsing Benchmark");
    println!("{}", "=".repeat(50));
    println!("Library: shakmaty");
    println!("Username: {}", args.username);
    println!("Max games: {}", args.games);
    println!("Workers: {}", args.workers);
    println!();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.workers as usize)
        .build()?;

    println!("Fetching games...");
    let fetch_start = Instant::now();
    let client = ChessComClient::new()?;
    let pgns: Vec<String> = client
        .collect_games(&args.username, args.games)
        .with_context(|| format!("failed to fetch games for {}", args.username))?
        .into_iter()
        .filter_map(|g| g.pgn)
        .collect();
    let fetch_time = fetch_start.elapsed();
    println!("Fetched {} games in {:.2}s\n", pgns.len(), fetch_time.as_secs_f64());

    println!("Parsing PGNs...");
    let parse_start = Instant::now();
    let progress = Progress::new("Parsed games", pgns.len(), PROGRESS_EVERY);
    let plies: Vec<usize> = pool.install(|| {
        pgns.par_iter()
            .map(|pgn| {
                let n = replay_game(pgn);
                progress.tick();
                n
            })
            .collect()
    });
    let parse_time = parse_start.elapsed();

    let parsed = plies.iter().filter(|&&n| n > 0).count();
    let total_moves: usize = plies.iter().sum();

    println!("\nResults");
    println!("{}", "=".repeat(50));
    println!("Games parsed: {parsed}");
    println!("Total moves: {total_moves}");
    println!("\nPerformance");
    println!("{}", "=".repeat(50));
    println!("Parse time: {:.4}s", parse_time.as_secs_f64());
    println!("Games per second: {:.2}", parsed as f64 / parse_time.as_secs_f64());
    println!("Moves per second: {:.2}", total_moves as f64 / parse_time.as_secs_f64());
    Ok(())
}
