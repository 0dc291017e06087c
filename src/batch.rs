//! Fans games out over a bounded worker pool, one engine per game

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::info;

use crate::accuracy::mean;
use crate::analyzer::{analyze_game, GameResult};
use crate::archive::GameRecord;
use crate::engine::EngineLauncher;
use crate::error::BenchError;

/// Analysis progress is logged every this many completed games.
pub const PROGRESS_EVERY: usize = 10;

/// Completion counter shared by all workers. Logging only; it never
/// influences scheduling.
pub struct Progress {
    label: &'static str,
    total: usize,
    every: usize,
    completed: AtomicUsize,
    start: Instant,
}

impl Progress {
    pub fn new(label: &'static str, total: usize, every: usize) -> Self {
        Self {
            label,
            total,
            every: every.max(1),
            completed: AtomicUsize::new(0),
            start: Instant::now(),
        }
    }

    /// Records one completion and returns the running count.
    pub fn tick(&self) -> usize {
        let c = self.completed.fetch_add(1, Ordering::Relaxed) + 1;
        if c % self.every == 0 || c == self.total {
            let games_per_sec = c as f64 / self.start.elapsed().as_secs_f64();
            info!(
                completed = c,
                total = self.total,
                games_per_sec,
                "{}",
                self.label
            );
        }
        c
    }

    #[cfg(test)]
    fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }
}

/// Everything a finished batch produced.
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// Analyzed games in input order.
    pub results: Vec<GameResult>,
    pub total_games: usize,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn analyzed(&self) -> usize {
        self.results.len()
    }

    pub fn skipped(&self) -> usize {
        self.total_games - self.results.len()
    }

    pub fn total_moves(&self) -> usize {
        self.results.iter().map(|r| r.total_moves).sum()
    }

    /// Mean over games of the target user's per-game accuracy.
    pub fn average_accuracy(&self) -> f64 {
        let per_game: Vec<f64> = self.results.iter().map(GameResult::target_accuracy).collect();
        mean(&per_game)
    }

    pub fn games_per_sec(&self) -> f64 {
        self.analyzed() as f64 / self.elapsed.as_secs_f64()
    }

    pub fn moves_per_sec(&self) -> f64 {
        self.total_moves() as f64 / self.elapsed.as_secs_f64()
    }
}

/// Analyzes every game for `username` with at most `workers` games, and so
/// at most `workers` engine processes, in flight at once.
pub fn run_batch<L: EngineLauncher>(
    games: &[GameRecord],
    username: &str,
    launcher: &L,
    workers: usize,
) -> Result<BatchReport, BenchError> {
    let pool = ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .thread_name(|i| format!("analyzer-{i}"))
        .build()?;

    let start = Instant::now();
    let progress = Progress::new("Analyzed games", games.len(), PROGRESS_EVERY);

    let results: Vec<GameResult> = pool.install(|| {
        games
            .par_iter()
            .filter_map(|game| {
                let result = analyze_game(game, username, launcher);
                progress.tick();
                result
            })
            .collect()
    });

    Ok(BatchReport {
        results,
        total_games: games.len(),
        elapsed: start.elapsed(),
    })
}
