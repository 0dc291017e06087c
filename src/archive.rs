//! chess.com public archive client

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::info;

use crate::error::BenchError;

const API_BASE: &str = "https://api.chess.com/pub/player";
const USER_AGENT: &str = "ChessBenchmark/1.0";

#[derive(Deserialize)]
struct ArchivesResponse {
    archives: Vec<String>,
}

#[derive(Deserialize)]
struct GamesResponse {
    games: Vec<GameRecord>,
}

/// One game as listed in a monthly archive.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GameRecord {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub pgn: Option<String>,
    #[serde(default)]
    pub white: Option<PlayerRecord>,
    #[serde(default)]
    pub black: Option<PlayerRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerRecord {
    #[serde(default)]
    pub username: Option<String>,
}

impl GameRecord {
    pub fn white_username(&self) -> Option<&str> {
        self.white.as_ref()?.username.as_deref()
    }

    pub fn black_username(&self) -> Option<&str> {
        self.black.as_ref()?.username.as_deref()
    }
}

pub struct ChessComClient {
    client: Client,
}

impl ChessComClient {
    pub fn new() -> Result<Self, BenchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self { client })
    }

    /// Monthly archive URLs, newest first as the API returns them.
    pub fn fetch_archives(&self, username: &str) -> Result<Vec<String>, BenchError> {
        let url = format!("{API_BASE}/{username}/games/archives");
        let resp: ArchivesResponse = self.client.get(url).send()?.error_for_status()?.json()?;
        Ok(resp.archives)
    }

    pub fn fetch_games(&self, archive_url: &str) -> Result<Vec<GameRecord>, BenchError> {
        let resp: GamesResponse = self
            .client
            .get(archive_url)
            .send()?
            .error_for_status()?
            .json()?;
        Ok(resp.games)
    }

    /// Collects up to `max_games` games, oldest archive first.
    pub fn collect_games(&self, username: &str, max_games: usize) -> Result<Vec<GameRecord>, BenchError> {
        let mut archives = self.fetch_archives(username)?;
        archives.reverse();

        let mut all_games = Vec::new();
        for url in &archives {
            if all_games.len() >= max_games {
                break;
            }
            let games = self.fetch_games(url)?;
            info!(archive = archive_label(url), games = games.len(), "Fetched archive");
            all_games.extend(games);
        }
        all_games.truncate(max_games);
        Ok(all_games)
    }
}

/// `year/month` tail of an archive URL.
pub fn archive_label(url: &str) -> &str {
    let url = url.trim_end_matches('/');
    match url.rmatch_indices('/').nth(1) {
        Some((idx, _)) => &url[idx + 1..],
        None => url,
    }
}
