//! PGN ingestion: split multi-game text into records and replay each one.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::engine::{RulesEngine, ShakmatyEngine};
use crate::game_data::{Game, GameStatus, Player, Title};

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\[(\w+)\s+"([^"]*)"\]"#).unwrap());

/// A run of one or more blank (or whitespace-only) lines.
static BLANK_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n(?:[ \t]*\n)+").unwrap());

/// One game record as found in the source text, before replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawGame {
    pub headers: String,
    pub body: String,
}

impl RawGame {
    /// Canonical PGN text: tag section, blank line, movetext.
    pub fn pgn_text(&self) -> String {
        format!("{}\n\n{}", self.headers, self.body)
    }
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n")
}

/// Split a block into its leading tag lines and the rest.
///
/// Tag parsing stops at the first non-tag line and does not resume.
fn split_block(block: &str) -> (Vec<&str>, Vec<&str>) {
    let mut header_lines = Vec::new();
    let mut body_lines = Vec::new();
    let mut in_headers = true;

    for line in block.lines() {
        if in_headers && line.trim_start().starts_with('[') {
            header_lines.push(line);
        } else {
            in_headers = false;
            body_lines.push(line);
        }
    }

    (header_lines, body_lines)
}

/// Split multi-game PGN text into header/body records.
///
/// Blocks are separated by blank-line runs. A block without tag lines is
/// the movetext of the preceding record when that record has none yet;
/// otherwise it is dropped.
pub fn split_games(text: &str) -> Vec<RawGame> {
    let text = normalize_newlines(text);
    let mut games: Vec<RawGame> = Vec::new();
    let mut dropped = 0usize;

    for block in BLANK_RUN_RE.split(&text) {
        if block.trim().is_empty() {
            continue;
        }

        let (header_lines, body_lines) = split_block(block);
        if header_lines.is_empty() {
            match games.last_mut() {
                Some(last) if last.body.trim().is_empty() => {
                    last.body = body_lines.join("\n");
                }
                _ => dropped += 1,
            }
            continue;
        }

        games.push(RawGame {
            headers: header_lines.join("\n"),
            body: body_lines.join("\n"),
        });
    }

    if dropped > 0 {
        debug!(dropped, "Dropped PGN blocks without headers");
    }
    games
}

/// Tag pairs of a header section. A repeated key keeps its last value.
pub fn parse_headers(headers: &str) -> HashMap<String, String> {
    HEADER_RE
        .captures_iter(headers)
        .map(|cap| (cap[1].to_string(), cap[2].to_string()))
        .collect()
}

/// Leading-digit rating parse; anything else is 0.
fn parse_rating(value: Option<&String>) -> u32 {
    value
        .map(|v| {
            let digits: String = v.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().unwrap_or(0)
        })
        .unwrap_or(0)
}

fn player(tags: &HashMap<String, String>, color: &str) -> Player {
    let name = tags
        .get(color)
        .filter(|v| !v.is_empty())
        .cloned()
        .unwrap_or_else(|| "Unknown".to_string());
    let rating = parse_rating(tags.get(&format!("{color}Elo")));
    let title = tags
        .get(&format!("{color}Title"))
        .and_then(|t| Title::parse(t));

    Player {
        name,
        title,
        rating,
    }
}

fn non_empty(tags: &HashMap<String, String>, key: &str) -> Option<String> {
    tags.get(key).filter(|v| !v.is_empty()).cloned()
}

/// Build a [`Game`] from one record. Never fails: an unplayable movetext
/// leaves the histories empty and the status `started`.
pub fn parse_game<E: RulesEngine>(raw: &RawGame, engine: &E) -> Game {
    let tags = parse_headers(&raw.headers);
    let players = [player(&tags, "White"), player(&tags, "Black")];
    let pgn = raw.pgn_text();

    debug!(white = %players[0].name, black = %players[1].name, "Parsing game");

    let (fen, fen_history, move_history, status) = match engine.replay(&pgn) {
        Ok(replay) => {
            let status = if replay.terminal.checkmate {
                GameStatus::Mate
            } else if replay.terminal.draw {
                GameStatus::Draw
            } else if replay.terminal.stalemate {
                GameStatus::Stalemate
            } else {
                GameStatus::Started
            };
            let fen = replay.final_fen().map(str::to_string);
            (fen, replay.fen_history, replay.move_history, status)
        }
        Err(e) => {
            warn!(
                white = %players[0].name,
                black = %players[1].name,
                error = %e,
                "Failed to replay PGN movetext"
            );
            (None, Vec::new(), Vec::new(), GameStatus::Started)
        }
    };

    Game {
        id: non_empty(&tags, "GameId"),
        name: non_empty(&tags, "Event"),
        players,
        status,
        fen,
        fen_history,
        move_history,
        pgn,
    }
}

/// Parse every game in `text` with the given engine, in input order.
pub fn parse_pgn_with<E: RulesEngine>(text: &str, engine: &E) -> Vec<Game> {
    debug!(len = text.len(), "Parsing PGN");
    let raw_games = split_games(text);
    let games: Vec<Game> = raw_games.iter().map(|raw| parse_game(raw, engine)).collect();
    debug!(games = games.len(), "Parsed PGN");
    games
}

/// Parse every game in `text` with the shakmaty engine.
pub fn parse_pgn(text: &str) -> Vec<Game> {
    parse_pgn_with(text, &ShakmatyEngine)
}

/// First game in `text`, if any.
pub fn parse_single_pgn(text: &str) -> Option<Game> {
    split_games(text)
        .first()
        .map(|raw| parse_game(raw, &ShakmatyEngine))
}

/// Accumulates streamed PGN chunks and releases only whole records.
///
/// A record is complete once its movetext block is followed by a blank
/// line; the trailing partial record stays buffered.
#[derive(Debug, Default)]
pub struct PgnBuffer {
    pending: String,
}

impl PgnBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &str) {
        self.pending.push_str(&normalize_newlines(chunk));
    }

    pub fn is_empty(&self) -> bool {
        self.pending.trim().is_empty()
    }

    /// Drain every complete record, or `None` if no record is complete yet.
    pub fn take_complete(&mut self) -> Option<String> {
        let mut block_start = 0;
        let mut cut = None;

        for sep in BLANK_RUN_RE.find_iter(&self.pending) {
            let block = &self.pending[block_start..sep.start()];
            let (_, body_lines) = split_block(block);
            if body_lines.iter().any(|l| !l.trim().is_empty()) {
                cut = Some(sep.end());
            }
            block_start = sep.end();
        }

        let cut = cut?;
        let rest = self.pending.split_off(cut);
        Some(std::mem::replace(&mut self.pending, rest))
    }

    /// Whatever is left once the stream has ended.
    pub fn finish(self) -> Option<String> {
        (!self.pending.trim().is_empty()).then_some(self.pending)
    }
}
