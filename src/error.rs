//! Error types shared by the engine client, the analyzer and the fetcher

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BenchError {
    #[error("engine `{path}` failed to start: {reason}")]
    EngineStartup { path: String, reason: String },

    #[error("engine closed its output while waiting for `{waiting_for}`")]
    EngineClosed { waiting_for: &'static str },

    #[error("engine I/O error: {0}")]
    EngineIo(#[from] std::io::Error),

    #[error("illegal move `{san}` at ply {ply}")]
    IllegalMove { ply: usize, san: String },

    #[error("fetch error: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
