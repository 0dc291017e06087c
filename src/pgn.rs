//! Move-text tokenizer and a board that replays SAN moves into FENs

use std::str::FromStr;

use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::{Chess, Color, EnPassantMode, Position};

use crate::error::BenchError;

const RESULTS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];

/// Extracts the mainline SAN tokens of a PGN.
///
/// Tag pairs, `{}`/`;` comments, `()` variations, NAGs, move numbers and the
/// result marker are dropped. Annotation glyphs (`!`, `?`) are trimmed.
pub fn parse_pgn_moves(pgn: &str) -> Vec<&str> {
    let mut moves = Vec::with_capacity(100);
    let mut in_moves = false;
    let mut comment = false;
    let mut variation = 0usize;

    for line in pgn.lines() {
        let line = line.trim();
        if !in_moves && line.starts_with('[') {
            continue;
        }
        if !line.is_empty() {
            in_moves = true;
        }

        let bytes = line.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            let b = bytes[i];
            if comment {
                comment = b != b'}';
                i += 1;
                continue;
            }
            match b {
                b'{' => comment = true,
                b';' => break,
                b'(' => variation += 1,
                b')' => variation = variation.saturating_sub(1),
                _ if b.is_ascii_whitespace() || variation > 0 => {}
                _ => {
                    let start = i;
                    while i < bytes.len() && !is_delimiter(bytes[i]) {
                        i += 1;
                    }
                    if let Some(token) = clean_token(&line[start..i]) {
                        moves.push(token);
                    }
                    continue;
                }
            }
            i += 1;
        }
    }
    moves
}

fn is_delimiter(b: u8) -> bool {
    b.is_ascii_whitespace() || matches!(b, b'{' | b'(' | b')' | b';')
}

/// Strips a move-number prefix (`12.`, `12...`) and annotation glyphs.
fn clean_token(token: &str) -> Option<&str> {
    if RESULTS.contains(&token) || token.starts_with('$') {
        return None;
    }
    let token = match token.find('.') {
        Some(_) => token.trim_start_matches(|c: char| c.is_ascii_digit() || c == '.'),
        None => token,
    };
    let token = token.trim_end_matches(['!', '?']);
    (!token.is_empty()).then_some(token)
}

/// A position advanced one SAN move at a time.
#[derive(Debug, Clone, Default)]
pub struct Replay {
    pos: Chess,
    ply: usize,
}

impl Replay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn side_to_move(&self) -> Color {
        self.pos.turn()
    }

    /// Half-moves applied so far.
    pub fn ply(&self) -> usize {
        self.ply
    }

    pub fn fen(&self) -> String {
        Fen::from_position(&self.pos, EnPassantMode::Legal).to_string()
    }

    /// Applies `san`, leaving the position untouched if it is not legal here.
    pub fn play_san(&mut self, san: &str) -> Result<(), BenchError> {
        let illegal = || BenchError::IllegalMove {
            ply: self.ply,
            san: san.to_string(),
        };
        let san_plus = SanPlus::from_str(san).map_err(|_| illegal())?;
        let mv = san_plus.san.to_move(&self.pos).map_err(|_| illegal())?;
        self.pos = self.pos.clone().play(mv).map_err(|_| illegal())?;
        self.ply += 1;
        Ok(())
    }
}
