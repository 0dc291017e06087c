//! Replays one game through a private engine and scores every half-move

use std::time::{Duration, Instant};

use shakmaty::Color;
use tracing::debug;

use crate::accuracy::{mean, move_accuracy, win_probability};
use crate::archive::GameRecord;
use crate::engine::{EngineLauncher, Evaluator};
use crate::error::BenchError;
use crate::pgn::{parse_pgn_moves, Replay};

/// Outcome of analyzing a single game.
#[derive(Debug, Clone)]
pub struct GameResult {
    pub url: Option<String>,
    pub white: String,
    pub black: String,
    /// Color played by the user the batch was run for.
    pub target_color: Color,
    pub white_accuracies: Vec<f64>,
    pub black_accuracies: Vec<f64>,
    pub white_accuracy: f64,
    pub black_accuracy: f64,
    pub total_moves: usize,
    /// Set when an illegal move ended the replay before the last move.
    pub truncated: bool,
    pub elapsed: Duration,
}

impl GameResult {
    pub fn accuracy_for(&self, color: Color) -> f64 {
        match color {
            Color::White => self.white_accuracy,
            Color::Black => self.black_accuracy,
        }
    }

    pub fn target_accuracy(&self) -> f64 {
        self.accuracy_for(self.target_color)
    }
}

/// Analyzes `game` for `username`, or returns `None` when the game has to be
/// skipped. No failure here escapes to the caller.
pub fn analyze_game<L: EngineLauncher>(game: &GameRecord, username: &str, launcher: &L) -> Option<GameResult> {
    let Some(pgn) = game.pgn.as_deref().filter(|p| !p.trim().is_empty()) else {
        debug!(url = game.url.as_deref(), "skipping game without pgn");
        return None;
    };

    let white = game.white_username();
    let black = game.black_username();
    let is_target = |name: Option<&str>| name.is_some_and(|n| n.eq_ignore_ascii_case(username));
    let target_color = if is_target(white) {
        Color::White
    } else if is_target(black) {
        Color::Black
    } else {
        debug!(white, black, username, "skipping game without target player");
        return None;
    };

    let moves = parse_pgn_moves(pgn);
    if moves.is_empty() {
        debug!(url = game.url.as_deref(), "skipping game without moves");
        return None;
    }

    let start = Instant::now();
    // The engine is dropped, and so shut down, on every path out of here.
    let scored = launcher
        .launch()
        .and_then(|mut engine| score_moves(&mut engine, &moves));
    let scored = match scored {
        Ok(scored) => scored,
        Err(e) => {
            debug!(url = game.url.as_deref(), error = %e, "skipping game");
            return None;
        }
    };

    Some(GameResult {
        url: game.url.clone(),
        white: white.unwrap_or_default().to_string(),
        black: black.unwrap_or_default().to_string(),
        target_color,
        white_accuracy: mean(&scored.white),
        black_accuracy: mean(&scored.black),
        total_moves: scored.white.len() + scored.black.len(),
        white_accuracies: scored.white,
        black_accuracies: scored.black,
        truncated: scored.truncated,
        elapsed: start.elapsed(),
    })
}

#[derive(Debug, Default)]
struct ScoredMoves {
    white: Vec<f64>,
    black: Vec<f64>,
    truncated: bool,
}

/// Scores `moves` in order. An illegal move stops the replay but keeps what
/// was scored so far; engine failures abort.
fn score_moves<E: Evaluator>(engine: &mut E, moves: &[&str]) -> Result<ScoredMoves, BenchError> {
    let mut replay = Replay::new();
    let mut scored = ScoredMoves {
        white: Vec::with_capacity(moves.len() / 2 + 1),
        black: Vec::with_capacity(moves.len() / 2 + 1),
        truncated: false,
    };

    let mut prev = engine.evaluate(&replay.fen())?;
    for san in moves {
        let mover = replay.side_to_move();
        if let Err(e) = replay.play_san(san) {
            debug!(error = %e, "stopping replay");
            scored.truncated = true;
            break;
        }

        let curr = engine.evaluate(&replay.fen())?;
        let acc = move_accuracy(win_probability(prev, mover), win_probability(curr, mover));
        match mover {
            Color::White => scored.white.push(acc),
            Color::Black => scored.black.push(acc),
        }
        prev = curr;
    }
    Ok(scored)
}
