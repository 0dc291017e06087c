use std::time::Instant;

use anyhow::Context;
use chess_accuracy_bench::batch::run_batch;
use chess_accuracy_bench::config::BenchConfig;
use chess_accuracy_bench::ChessComClient;
use clap::Parser;
use tracing::info;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = BenchConfig::parse();

    println!("Rust Chess Benchmark");
    println!("{}", "=".repeat(50));
    println!("Username: {}", args.username);
    println!("Max games: {}", args.games);
    println!("Workers: {}", args.workers);
    println!("SF threads/worker: {}", args.threads);
    println!("Total CPU: {}", args.total_cpu());
    println!("Depth: {}", args.depth);
    println!("Engine: {}", args.engine_path);
    println!();

    println!("Fetching archives...");
    let fetch_start = Instant::now();
    let client = ChessComClient::new()?;
    let games = client
        .collect_games(&args.username, args.games)
        .with_context(|| format!("failed to fetch games for {}", args.username))?;
    let fetch_time = fetch_start.elapsed();
    println!("Fetched {} games in {:.2}s\n", games.len(), fetch_time.as_secs_f64());

    println!("Analyzing games...");
    let report = run_batch(&games, &args.username, &args.launcher(), args.workers as usize)?;
    info!(analyzed = report.analyzed(), skipped = report.skipped(), "Analysis finished");

    let analysis_time = report.elapsed;
    println!("\nResults");
    println!("{}", "=".repeat(50));
    println!("Games analyzed: {}", report.analyzed());
    println!("Games skipped: {}", report.skipped());
    println!("Total moves: {}", report.total_moves());
    println!("Average accuracy for {}: {:.2}%", args.username, report.average_accuracy());
    println!("\nPerformance");
    println!("{}", "=".repeat(50));
    println!("Fetch time: {:.2}s", fetch_time.as_secs_f64());
    println!("Analysis time: {:.2}s", analysis_time.as_secs_f64());
    println!("Total time: {:.2}s", (fetch_time + analysis_time).as_secs_f64());
    println!("Games per second: {:.4}", report.games_per_sec());
    println!("Moves per second: {:.2}", report.moves_per_sec());
    Ok(())
}
