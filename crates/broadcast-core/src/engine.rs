//! Rules-engine seam.
//!
//! Ingestion and analysis only talk to chess rules through [`RulesEngine`],
//! which works on FEN strings so callers never hold engine-specific types.
//! [`ShakmatyEngine`] is the production implementation: `shakmaty` for
//! positions and move legality, `pgn-reader` for PGN movetext.

use std::io::Cursor;
use std::ops::ControlFlow;

use pgn_reader::{RawTag, Reader, SanPlus, Skip, Visitor};
use shakmaty::{
    fen::Fen, san::San, uci::UciMove, CastlingMode, Chess, Color, EnPassantMode, File, Move,
    Position, Rank, Role, Square,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::EngineError;
use crate::square::BoardSquare;

pub const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    King,
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub side: Side,
    pub kind: PieceKind,
}

/// A from/to move attempt, optionally promoting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRequest {
    pub from: BoardSquare,
    pub to: BoardSquare,
    pub promotion: Option<PieceKind>,
}

impl MoveRequest {
    /// Parse a UCI-like move such as `e2e4` or `e7e8q`.
    pub fn from_uci(uci: &str) -> Result<Self, EngineError> {
        let invalid = || EngineError::InvalidUci(uci.to_string());
        if !uci.is_ascii() || !(4..=5).contains(&uci.len()) {
            return Err(invalid());
        }
        let from: BoardSquare = uci[0..2].parse().map_err(|_| invalid())?;
        let to: BoardSquare = uci[2..4].parse().map_err(|_| invalid())?;
        let promotion = match uci.as_bytes().get(4) {
            None => None,
            Some(b'q') => Some(PieceKind::Queen),
            Some(b'r') => Some(PieceKind::Rook),
            Some(b'b') => Some(PieceKind::Bishop),
            Some(b'n') => Some(PieceKind::Knight),
            Some(_) => return Err(invalid()),
        };
        Ok(Self { from, to, promotion })
    }
}

/// Outcome of a successful move attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayedMove {
    pub san: String,
    pub uci: String,
    pub fen: String,
}

/// Terminal flags of the final replayed position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Terminal {
    pub checkmate: bool,
    /// Fifty-move rule, insufficient material or threefold repetition.
    pub draw: bool,
    pub stalemate: bool,
}

/// Per-ply histories produced by replaying a PGN record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Replay {
    /// Index 0 is the starting position.
    pub fen_history: Vec<String>,
    /// Aligned with `fen_history`; entry 0 is always `None`.
    pub move_history: Vec<Option<String>>,
    pub terminal: Terminal,
}

impl Replay {
    pub fn final_fen(&self) -> Option<&str> {
        self.fen_history.last().map(String::as_str)
    }
}

/// Narrow interface to a chess rules implementation.
pub trait RulesEngine {
    /// Load a full PGN record (tags + movetext) and replay its mainline.
    fn replay(&self, pgn: &str) -> Result<Replay, EngineError>;

    /// Piece standing on `square` in the position `fen`.
    fn piece_at(&self, fen: &str, square: BoardSquare) -> Result<Option<Piece>, EngineError>;

    /// Side to move in the position `fen`.
    fn turn(&self, fen: &str) -> Result<Side, EngineError>;

    /// Attempt a move. Illegal moves are reported as `EngineError::IllegalMove`.
    fn play(&self, fen: &str, request: MoveRequest) -> Result<PlayedMove, EngineError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ShakmatyEngine;

impl ShakmatyEngine {
    pub fn new() -> Self {
        Self
    }
}

fn load_position(fen: &str) -> Result<Chess, EngineError> {
    let invalid = |reason: String| EngineError::InvalidFen {
        fen: fen.to_string(),
        reason,
    };
    let parsed: Fen = fen.parse().map_err(|e| invalid(format!("{e}")))?;
    parsed
        .into_position(CastlingMode::Standard)
        .map_err(|e| invalid(format!("{e}")))
}

fn fen_of(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}

/// Repetition key: placement, side to move, castling and en passant.
fn repetition_key(fen: &str) -> String {
    fen.split_whitespace().take(4).collect::<Vec<_>>().join(" ")
}

pub(crate) fn to_square(square: BoardSquare) -> Square {
    Square::from_coords(
        File::new(square.file() as u32),
        Rank::new(square.rank() as u32),
    )
}

pub(crate) fn to_side(color: Color) -> Side {
    match color {
        Color::White => Side::White,
        Color::Black => Side::Black,
    }
}

pub(crate) fn to_kind(role: Role) -> PieceKind {
    match role {
        Role::King => PieceKind::King,
        Role::Queen => PieceKind::Queen,
        Role::Rook => PieceKind::Rook,
        Role::Bishop => PieceKind::Bishop,
        Role::Knight => PieceKind::Knight,
        Role::Pawn => PieceKind::Pawn,
    }
}

fn to_role(kind: PieceKind) -> Role {
    match kind {
        PieceKind::King => Role::King,
        PieceKind::Queen => Role::Queen,
        PieceKind::Rook => Role::Rook,
        PieceKind::Bishop => Role::Bishop,
        PieceKind::Knight => Role::Knight,
        PieceKind::Pawn => Role::Pawn,
    }
}

/// SAN with check (`+`) or mate (`#`) suffix; plays `mv` on `pos`.
fn san_and_play(pos: &mut Chess, mv: Move) -> String {
    let mut san = San::from_move(&*pos, mv).to_string();
    pos.play_unchecked(mv);
    if pos.is_checkmate() {
        san.push('#');
    } else if pos.is_check() {
        san.push('+');
    }
    san
}

/// True when the final position has occurred at least three times.
fn is_threefold(fen_history: &[String]) -> bool {
    let Some(last) = fen_history.last() else {
        return false;
    };
    let key = repetition_key(last);
    fen_history
        .iter()
        .filter(|fen| repetition_key(fen) == key)
        .count()
        >= 3
}

fn terminal_of(pos: &Chess, fen_history: &[String]) -> Terminal {
    let threefold = is_threefold(fen_history);

    Terminal {
        checkmate: pos.is_checkmate(),
        draw: pos.halfmoves() >= 100 || pos.is_insufficient_material() || threefold,
        stalemate: pos.is_stalemate(),
    }
}

/// Movetext state while replaying one game.
struct ReplayState {
    pos: Chess,
    fen_history: Vec<String>,
    move_history: Vec<Option<String>>,
    error: Option<EngineError>,
}

/// Visitor that records every mainline position of a single game.
struct Replayer;

impl Visitor for Replayer {
    type Tags = Option<String>;
    type Movetext = ReplayState;
    type Output = Result<Replay, EngineError>;

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, Self::Tags> {
        ControlFlow::Continue(None)
    }

    fn tag(
        &mut self,
        tags: &mut Self::Tags,
        name: &[u8],
        value: RawTag<'_>,
    ) -> ControlFlow<Self::Output> {
        if name.eq_ignore_ascii_case(b"FEN") {
            *tags = Some(value.decode_utf8_lossy().into_owned());
        }
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, tags: Self::Tags) -> ControlFlow<Self::Output, Self::Movetext> {
        let (pos, error) = match tags.as_deref() {
            Some(fen) if fen != STANDARD_START_FEN => {
                warn!(fen = %fen, "Game starts from a custom position");
                match load_position(fen) {
                    Ok(pos) => (pos, None),
                    Err(e) => (Chess::default(), Some(e)),
                }
            }
            _ => (Chess::default(), None),
        };

        let start_fen = fen_of(&pos);
        ControlFlow::Continue(ReplayState {
            pos,
            fen_history: vec![start_fen],
            move_history: vec![None],
            error,
        })
    }

    fn san(&mut self, state: &mut Self::Movetext, san_plus: SanPlus) -> ControlFlow<Self::Output> {
        if state.error.is_some() {
            return ControlFlow::Continue(());
        }

        match san_plus.san.to_move(&state.pos) {
            Ok(mv) => {
                let uci = UciMove::from_standard(mv).to_string();
                state.pos.play_unchecked(mv);
                state.fen_history.push(fen_of(&state.pos));
                state.move_history.push(Some(uci));
            }
            Err(e) => {
                state.error = Some(EngineError::IllegalMove(format!(
                    "{} at ply {}: {e}",
                    san_plus,
                    state.fen_history.len()
                )));
            }
        }
        ControlFlow::Continue(())
    }

    fn begin_variation(&mut self, _state: &mut Self::Movetext) -> ControlFlow<Self::Output, Skip> {
        ControlFlow::Continue(Skip(true))
    }

    fn end_game(&mut self, state: Self::Movetext) -> Self::Output {
        if let Some(e) = state.error {
            return Err(e);
        }
        let terminal = terminal_of(&state.pos, &state.fen_history);
        Ok(Replay {
            fen_history: state.fen_history,
            move_history: state.move_history,
            terminal,
        })
    }
}

impl RulesEngine for ShakmatyEngine {
    fn replay(&self, pgn: &str) -> Result<Replay, EngineError> {
        let mut reader = Reader::new(Cursor::new(pgn.as_bytes()));
        match reader.read_game(&mut Replayer) {
            Ok(Some(result)) => result,
            Ok(None) => Err(EngineError::NoGame),
            Err(e) => Err(EngineError::Replay(e.to_string())),
        }
    }

    fn piece_at(&self, fen: &str, square: BoardSquare) -> Result<Option<Piece>, EngineError> {
        let pos = load_position(fen)?;
        Ok(pos.board().piece_at(to_square(square)).map(|p| Piece {
            side: to_side(p.color),
            kind: to_kind(p.role),
        }))
    }

    fn turn(&self, fen: &str) -> Result<Side, EngineError> {
        Ok(to_side(load_position(fen)?.turn()))
    }

    fn play(&self, fen: &str, request: MoveRequest) -> Result<PlayedMove, EngineError> {
        let mut pos = load_position(fen)?;
        let uci = UciMove::Normal {
            from: to_square(request.from),
            to: to_square(request.to),
            promotion: request.promotion.map(to_role),
        };
        let mv = uci
            .to_move(&pos)
            .map_err(|e| EngineError::IllegalMove(format!("{uci}: {e}")))?;

        let uci = UciMove::from_standard(mv).to_string();
        let san = san_and_play(&mut pos, mv);
        Ok(PlayedMove {
            san,
            uci,
            fen: fen_of(&pos),
        })
    }
}
