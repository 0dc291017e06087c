//! Fetches a player's chess.com games, replays them through a UCI engine and
//! scores every half-move from the engine's win/draw/loss estimate.

pub mod accuracy;
pub mod analyzer;
pub mod archive;
pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod pgn;
pub mod wdl;

pub use analyzer::{analyze_game, GameResult};
pub use archive::{ChessComClient, GameRecord, PlayerRecord};
pub use batch::{run_batch, BatchReport};
pub use engine::{EngineLauncher, Evaluator, StockfishEngine, StockfishLauncher, UciSession};
pub use error::BenchError;
pub use wdl::Wdl;
