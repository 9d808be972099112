//! Interactive analysis: branch off a game's mainline and walk the
//! combined (mainline + branch) timeline.
//!
//! Every operation is a pure transition `(context, state, event) -> state`.
//! [`AnalysisSession`] wraps a context and the current state for callers
//! that prefer methods.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::{MoveRequest, PieceKind, RulesEngine, STANDARD_START_FEN};
use crate::game_data::Game;
use crate::square::{BoardSquare, Direction};

/// One move played while branching from the mainline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisMove {
    pub san: String,
    pub uci: String,
    pub fen: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisState {
    pub is_analyzing: bool,
    pub cursor_square: BoardSquare,
    pub selected_square: Option<BoardSquare>,
    /// Index into the combined timeline.
    pub current_move_index: usize,
    pub analysis_moves: Vec<AnalysisMove>,
    /// Mainline ply the branch diverges from; `None` when not analyzing.
    pub analysis_start_index: Option<usize>,
}

impl AnalysisState {
    pub fn new(current_move_index: usize) -> Self {
        Self {
            is_analyzing: false,
            cursor_square: BoardSquare::DEFAULT_CURSOR,
            selected_square: None,
            current_move_index,
            analysis_moves: Vec::new(),
            analysis_start_index: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisEvent {
    Enter,
    Exit,
    MoveCursor(Direction),
    Select,
    GoTo(usize),
    Next,
    Prev,
}

/// Read-only view of a game's mainline histories.
#[derive(Debug, Clone, Copy)]
pub struct Mainline<'g> {
    pub fen_history: &'g [String],
    pub move_history: &'g [Option<String>],
    /// Where the cursor returns when leaving analysis without a branch start.
    pub initial_move_index: usize,
}

impl<'g> Mainline<'g> {
    /// Mainline of `game`, starting at `initial_move_index` (clamped to the last ply).
    pub fn from_game(game: &'g Game, initial_move_index: usize) -> Self {
        let last = game.fen_history.len().saturating_sub(1);
        Self {
            fen_history: &game.fen_history,
            move_history: &game.move_history,
            initial_move_index: initial_move_index.min(last),
        }
    }

    /// Mainline of `game` positioned on its final ply.
    pub fn at_end(game: &'g Game) -> Self {
        Self::from_game(game, usize::MAX)
    }

    fn last_index(&self) -> usize {
        self.fen_history.len().saturating_sub(1)
    }
}

/// Everything a transition needs besides the state itself.
#[derive(Debug, Clone)]
pub struct AnalysisContext<'g, E> {
    pub mainline: Mainline<'g>,
    pub engine: E,
    /// Board drawn from Black's side.
    pub flipped: bool,
}

impl<'g, E: RulesEngine> AnalysisContext<'g, E> {
    pub fn new(mainline: Mainline<'g>, engine: E) -> Self {
        Self {
            mainline,
            engine,
            flipped: false,
        }
    }

    /// Highest reachable index of the combined timeline.
    pub fn max_index(&self, state: &AnalysisState) -> usize {
        match state.analysis_start_index {
            Some(start) if state.is_analyzing => start + state.analysis_moves.len(),
            _ => self.mainline.last_index(),
        }
    }

    /// Mainline up to the branch point followed by the branch positions.
    pub fn combined_fen_history(&self, state: &AnalysisState) -> Vec<String> {
        let original = self.mainline.fen_history;
        match state.analysis_start_index {
            Some(start) if !state.analysis_moves.is_empty() => {
                let mut fens: Vec<String> = original.iter().take(start + 1).cloned().collect();
                if fens.is_empty() {
                    fens.push(STANDARD_START_FEN.to_string());
                }
                fens.extend(state.analysis_moves.iter().map(|m| m.fen.clone()));
                fens
            }
            _ => original.to_vec(),
        }
    }

    pub fn current_fen(&self, state: &AnalysisState) -> String {
        self.combined_fen_history(state)
            .get(state.current_move_index)
            .or_else(|| self.mainline.fen_history.last())
            .cloned()
            .unwrap_or_else(|| STANDARD_START_FEN.to_string())
    }

    pub fn total_move_count(&self, state: &AnalysisState) -> usize {
        self.combined_fen_history(state).len()
    }

    /// SAN of the first `limit` mainline plies; plies that fail to replay are skipped.
    fn mainline_sans(&self, limit: usize) -> Vec<String> {
        let Mainline {
            fen_history,
            move_history,
            ..
        } = self.mainline;

        (1..move_history.len())
            .take(limit)
            .filter_map(|ply| {
                let uci = move_history[ply].as_deref()?;
                let fen = fen_history.get(ply - 1)?;
                let request = MoveRequest::from_uci(uci).ok()?;
                self.engine.play(fen, request).ok().map(|played| played.san)
            })
            .collect()
    }

    /// Move list in SAN: mainline up to the branch point, then the branch.
    pub fn combined_moves(&self, state: &AnalysisState) -> Vec<String> {
        match state.analysis_start_index {
            Some(start) if !state.analysis_moves.is_empty() => {
                let mut sans = self.mainline_sans(start);
                sans.extend(state.analysis_moves.iter().map(|m| m.san.clone()));
                sans
            }
            _ => self.mainline_sans(usize::MAX),
        }
    }

    pub fn is_analysis_move(&self, state: &AnalysisState, index: usize) -> bool {
        match state.analysis_start_index {
            Some(start) => state.is_analyzing && index > start,
            None => false,
        }
    }
}

/// Apply one event to `state`, returning the next state.
pub fn transition<E: RulesEngine>(
    ctx: &AnalysisContext<'_, E>,
    state: &AnalysisState,
    event: AnalysisEvent,
) -> AnalysisState {
    match event {
        AnalysisEvent::Enter => enter(state),
        AnalysisEvent::Exit => exit(ctx, state),
        AnalysisEvent::MoveCursor(direction) => move_cursor(ctx, state, direction),
        AnalysisEvent::Select => select(ctx, state),
        AnalysisEvent::GoTo(index) => go_to(ctx, state, index),
        AnalysisEvent::Next => go_to(ctx, state, state.current_move_index.saturating_add(1)),
        AnalysisEvent::Prev => go_to(ctx, state, state.current_move_index.saturating_sub(1)),
    }
}

fn enter(state: &AnalysisState) -> AnalysisState {
    AnalysisState {
        is_analyzing: true,
        cursor_square: BoardSquare::DEFAULT_CURSOR,
        selected_square: None,
        current_move_index: state.current_move_index,
        analysis_moves: Vec::new(),
        analysis_start_index: Some(state.current_move_index),
    }
}

fn exit<E>(ctx: &AnalysisContext<'_, E>, state: &AnalysisState) -> AnalysisState {
    AnalysisState {
        is_analyzing: false,
        cursor_square: state.cursor_square,
        selected_square: None,
        current_move_index: state
            .analysis_start_index
            .unwrap_or(ctx.mainline.initial_move_index),
        analysis_moves: Vec::new(),
        analysis_start_index: None,
    }
}

fn move_cursor<E>(
    ctx: &AnalysisContext<'_, E>,
    state: &AnalysisState,
    direction: Direction,
) -> AnalysisState {
    if !state.is_analyzing {
        return state.clone();
    }
    AnalysisState {
        cursor_square: state.cursor_square.step(direction, ctx.flipped),
        ..state.clone()
    }
}

fn select<E: RulesEngine>(ctx: &AnalysisContext<'_, E>, state: &AnalysisState) -> AnalysisState {
    if !state.is_analyzing {
        return state.clone();
    }

    let fen = ctx.current_fen(state);
    let cursor = state.cursor_square;

    let Some(from) = state.selected_square else {
        let piece = ctx.engine.piece_at(&fen, cursor);
        let turn = ctx.engine.turn(&fen);
        return match (piece, turn) {
            (Ok(Some(piece)), Ok(turn)) if piece.side == turn => AnalysisState {
                selected_square: Some(cursor),
                ..state.clone()
            },
            _ => state.clone(),
        };
    };

    if from == cursor {
        return AnalysisState {
            selected_square: None,
            ..state.clone()
        };
    }

    let promotion = match ctx.engine.piece_at(&fen, from) {
        Ok(Some(piece)) if piece.kind == PieceKind::Pawn && cursor.is_promotion_rank(piece.side) => {
            Some(PieceKind::Queen)
        }
        _ => None,
    };
    let request = MoveRequest {
        from,
        to: cursor,
        promotion,
    };

    match ctx.engine.play(&fen, request) {
        Ok(played) => {
            let start = state.analysis_start_index.unwrap_or(state.current_move_index);
            // Playing from before the branch point re-roots the branch there.
            let (start, mut moves) = if state.current_move_index < start {
                (state.current_move_index, Vec::new())
            } else {
                let keep = state.current_move_index - start;
                (start, state.analysis_moves.iter().take(keep).cloned().collect())
            };
            moves.push(AnalysisMove {
                san: played.san,
                uci: played.uci,
                fen: played.fen,
            });

            AnalysisState {
                selected_square: None,
                current_move_index: start + moves.len(),
                analysis_moves: moves,
                analysis_start_index: Some(start),
                ..state.clone()
            }
        }
        Err(e) => {
            debug!(from = %from, to = %cursor, error = %e, "Analysis move rejected");
            AnalysisState {
                selected_square: None,
                ..state.clone()
            }
        }
    }
}

fn go_to<E: RulesEngine>(
    ctx: &AnalysisContext<'_, E>,
    state: &AnalysisState,
    index: usize,
) -> AnalysisState {
    let clamped = index.min(ctx.max_index(state));
    if clamped == state.current_move_index {
        return state.clone();
    }
    AnalysisState {
        current_move_index: clamped,
        ..state.clone()
    }
}

/// One game view's analysis session.
#[derive(Debug, Clone)]
pub struct AnalysisSession<'g, E> {
    ctx: AnalysisContext<'g, E>,
    state: AnalysisState,
}

impl<'g, E: RulesEngine> AnalysisSession<'g, E> {
    pub fn new(mainline: Mainline<'g>, engine: E) -> Self {
        let state = AnalysisState::new(mainline.initial_move_index);
        Self {
            ctx: AnalysisContext::new(mainline, engine),
            state,
        }
    }

    pub fn state(&self) -> &AnalysisState {
        &self.state
    }

    pub fn context(&self) -> &AnalysisContext<'g, E> {
        &self.ctx
    }

    pub fn is_flipped(&self) -> bool {
        self.ctx.flipped
    }

    pub fn set_flipped(&mut self, flipped: bool) {
        self.ctx.flipped = flipped;
    }

    pub fn dispatch(&mut self, event: AnalysisEvent) {
        self.state = transition(&self.ctx, &self.state, event);
    }

    pub fn enter_analysis(&mut self) {
        self.dispatch(AnalysisEvent::Enter);
    }

    pub fn exit_analysis(&mut self) {
        self.dispatch(AnalysisEvent::Exit);
    }

    pub fn move_cursor(&mut self, direction: Direction) {
        self.dispatch(AnalysisEvent::MoveCursor(direction));
    }

    pub fn select_square(&mut self) {
        self.dispatch(AnalysisEvent::Select);
    }

    pub fn go_to_move(&mut self, index: usize) {
        self.dispatch(AnalysisEvent::GoTo(index));
    }

    pub fn next_move(&mut self) {
        self.dispatch(AnalysisEvent::Next);
    }

    pub fn prev_move(&mut self) {
        self.dispatch(AnalysisEvent::Prev);
    }

    pub fn current_fen(&self) -> String {
        self.ctx.current_fen(&self.state)
    }

    pub fn combined_fen_history(&self) -> Vec<String> {
        self.ctx.combined_fen_history(&self.state)
    }

    pub fn combined_moves(&self) -> Vec<String> {
        self.ctx.combined_moves(&self.state)
    }

    pub fn total_move_count(&self) -> usize {
        self.ctx.total_move_count(&self.state)
    }

    pub fn is_analysis_move(&self, index: usize) -> bool {
        self.ctx.is_analysis_move(&self.state, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Piece, PlayedMove, Replay, Side};
    use crate::error::EngineError;

    /// Positions are "start" followed by `|uci` per played move. White owns
    /// ranks 1-2 (pawns on 2), Black ranks 7-8 (pawns on 7); any move is
    /// legal except one landing on a4.
    #[derive(Debug, Clone, Copy)]
    struct FakeEngine;

    impl RulesEngine for FakeEngine {
        fn replay(&self, _pgn: &str) -> Result<Replay, EngineError> {
            Err(EngineError::NoGame)
        }

        fn piece_at(&self, _fen: &str, square: BoardSquare) -> Result<Option<Piece>, EngineError> {
            let piece = |side, kind| Some(Piece { side, kind });
            Ok(match square.rank() {
                0 => piece(Side::White, PieceKind::Rook),
                1 => piece(Side::White, PieceKind::Pawn),
                6 => piece(Side::Black, PieceKind::Pawn),
                7 => piece(Side::Black, PieceKind::Rook),
                _ => None,
            })
        }

        fn turn(&self, fen: &str) -> Result<Side, EngineError> {
            if fen == "broken" {
                return Err(EngineError::NoGame);
            }
            Ok(if fen.matches('|').count() % 2 == 0 {
                Side::White
            } else {
                Side::Black
            })
        }

        fn play(&self, fen: &str, request: MoveRequest) -> Result<PlayedMove, EngineError> {
            if request.to.to_string() == "a4" {
                return Err(EngineError::IllegalMove("a4".to_string()));
            }
            let promo = if request.promotion == Some(PieceKind::Queen) { "q" } else { "" };
            let uci = format!("{}{}{}", request.from, request.to, promo);
            Ok(PlayedMove {
                san: format!("{}-{}", request.from, request.to),
                fen: format!("{fen}|{uci}"),
                uci,
            })
        }
    }

    fn mainline_histories(plies: usize) -> (Vec<String>, Vec<Option<String>>) {
        let moves = ["e2e4", "e7e5", "g2g3", "b7b6", "d2d4", "d7d5", "c2c4", "c7c5", "h2h3", "h7h6"];
        let mut fens = vec!["start".to_string()];
        let mut history = vec![None];
        for uci in moves.iter().take(plies) {
            let next = format!("{}|{uci}", fens.last().unwrap());
            fens.push(next);
            history.push(Some(uci.to_string()));
        }
        (fens, history)
    }

    fn session<'g>(
        fens: &'g [String],
        moves: &'g [Option<String>],
        start: usize,
    ) -> AnalysisSession<'g, FakeEngine> {
        AnalysisSession::new(
            Mainline {
                fen_history: fens,
                move_history: moves,
                initial_move_index: start,
            },
            FakeEngine,
        )
    }

    fn sq(s: &str) -> BoardSquare {
        s.parse().unwrap()
    }

    /// Drive the cursor to `target` from wherever it is (unflipped board).
    fn cursor_to(s: &mut AnalysisSession<'_, FakeEngine>, target: &str) {
        let target = sq(target);
        while s.state().cursor_square.rank() < target.rank() {
            s.move_cursor(Direction::Up);
        }
        while s.state().cursor_square.rank() > target.rank() {
            s.move_cursor(Direction::Down);
        }
        while s.state().cursor_square.file() < target.file() {
            s.move_cursor(Direction::Right);
        }
        while s.state().cursor_square.file() > target.file() {
            s.move_cursor(Direction::Left);
        }
        assert_eq!(s.state().cursor_square, target);
    }

    fn play(s: &mut AnalysisSession<'_, FakeEngine>, from: &str, to: &str) {
        cursor_to(s, from);
        s.select_square();
        assert_eq!(s.state().selected_square, Some(sq(from)));
        cursor_to(s, to);
        s.select_square();
    }

    #[test]
    fn test_enter_records_branch_point() {
        let (fens, moves) = mainline_histories(4);
        let mut s = session(&fens, &moves, 4);
        s.go_to_move(2);
        s.enter_analysis();

        let state = s.state();
        assert!(state.is_analyzing);
        assert_eq!(state.analysis_start_index, Some(2));
        assert_eq!(state.cursor_square, sq("e4"));
        assert_eq!(state.selected_square, None);
        assert!(state.analysis_moves.is_empty());
    }

    #[test]
    fn test_reenter_discards_branch() {
        let (fens, moves) = mainline_histories(4);
        let mut s = session(&fens, &moves, 2);
        s.enter_analysis();
        play(&mut s, "e2", "e3");
        assert_eq!(s.state().analysis_moves.len(), 1);

        s.enter_analysis();
        assert!(s.state().analysis_moves.is_empty());
        assert_eq!(s.state().analysis_start_index, Some(3));
    }

    #[test]
    fn test_reenter_inside_branch_shows_mainline_at_same_index() {
        let (fens, moves) = mainline_histories(6);
        let mut s = session(&fens, &moves, 2);
        s.enter_analysis();
        play(&mut s, "e2", "e3");
        play(&mut s, "e7", "e6");
        assert_eq!(s.current_fen(), format!("{}|e2e3|e7e6", fens[2]));

        s.enter_analysis();
        let state = s.state();
        assert_eq!(state.current_move_index, 4);
        assert_eq!(state.analysis_start_index, Some(4));
        assert_eq!(s.current_fen(), fens[4]);
    }

    #[test]
    fn test_cursor_and_select_are_noops_when_idle() {
        let (fens, moves) = mainline_histories(2);
        let mut s = session(&fens, &moves, 2);
        let before = s.state().clone();
        s.move_cursor(Direction::Up);
        s.select_square();
        assert_eq!(s.state(), &before);
    }

    #[test]
    fn test_cursor_respects_orientation() {
        let (fens, moves) = mainline_histories(0);
        let mut s = session(&fens, &moves, 0);
        s.enter_analysis();
        s.move_cursor(Direction::Up);
        assert_eq!(s.state().cursor_square, sq("e5"));

        s.set_flipped(true);
        s.move_cursor(Direction::Up);
        s.move_cursor(Direction::Up);
        s.move_cursor(Direction::Left);
        assert_eq!(s.state().cursor_square, sq("f3"));
    }

    #[test]
    fn test_select_requires_own_piece() {
        let (fens, moves) = mainline_histories(0);
        let mut s = session(&fens, &moves, 0);
        s.enter_analysis();

        // empty square
        s.select_square();
        assert_eq!(s.state().selected_square, None);

        // opponent piece
        cursor_to(&mut s, "e7");
        s.select_square();
        assert_eq!(s.state().selected_square, None);

        cursor_to(&mut s, "e2");
        s.select_square();
        assert_eq!(s.state().selected_square, Some(sq("e2")));

        // same square cancels
        s.select_square();
        assert_eq!(s.state().selected_square, None);
    }

    #[test]
    fn test_rejected_move_only_clears_selection() {
        let (fens, moves) = mainline_histories(0);
        let mut s = session(&fens, &moves, 0);
        s.enter_analysis();
        cursor_to(&mut s, "a2");
        s.select_square();
        cursor_to(&mut s, "a4");
        let before = s.state().clone();
        s.select_square();

        let after = s.state();
        assert_eq!(after.selected_square, None);
        assert_eq!(after.analysis_moves, before.analysis_moves);
        assert_eq!(after.current_move_index, before.current_move_index);
    }

    #[test]
    fn test_pawn_on_last_rank_promotes_to_queen() {
        let (fens, moves) = mainline_histories(0);
        let mut s = session(&fens, &moves, 0);
        s.enter_analysis();
        play(&mut s, "b2", "b8");
        assert_eq!(s.state().analysis_moves[0].uci, "b2b8q");

        // a rook reaching the last rank does not promote
        play(&mut s, "b7", "b5");
        play(&mut s, "c1", "c8");
        assert_eq!(s.state().analysis_moves[2].uci, "c1c8");
    }

    #[test]
    fn test_branch_truncation() {
        let (fens, moves) = mainline_histories(10);
        let mut s = session(&fens, &moves, 3);
        s.enter_analysis();
        play(&mut s, "e7", "e6");
        play(&mut s, "e2", "e3");
        play(&mut s, "d7", "d6");
        assert_eq!(s.state().analysis_moves.len(), 3);
        assert_eq!(s.state().current_move_index, 6);

        s.go_to_move(4);
        play(&mut s, "e2", "e4");
        let state = s.state();
        assert_eq!(state.analysis_moves.len(), 2);
        assert_eq!(state.analysis_moves[0].san, "e7-e6");
        assert_eq!(state.analysis_moves[1].san, "e2-e4");
        assert_eq!(state.current_move_index, 5);
    }

    #[test]
    fn test_move_before_branch_point_reroots_branch() {
        let (fens, moves) = mainline_histories(6);
        let mut s = session(&fens, &moves, 4);
        s.enter_analysis();
        play(&mut s, "e2", "e3");
        s.go_to_move(1);
        play(&mut s, "a7", "a6");

        let state = s.state();
        assert_eq!(state.analysis_start_index, Some(1));
        assert_eq!(state.analysis_moves.len(), 1);
        assert_eq!(state.current_move_index, 2);
        assert_eq!(s.current_fen(), "start|e2e4|a7a6");
    }

    #[test]
    fn test_exit_restores_mainline() {
        let (fens, moves) = mainline_histories(6);
        let mut s = session(&fens, &moves, 4);
        s.enter_analysis();
        play(&mut s, "e2", "e3");
        play(&mut s, "e7", "e6");
        assert_ne!(s.combined_fen_history(), fens);

        s.exit_analysis();
        let state = s.state();
        assert!(!state.is_analyzing);
        assert_eq!(state.current_move_index, 4);
        assert_eq!(state.analysis_start_index, None);
        assert!(state.analysis_moves.is_empty());
        assert_eq!(s.combined_fen_history(), fens);
    }

    #[test]
    fn test_exit_without_branch_returns_to_initial_index() {
        let (fens, moves) = mainline_histories(6);
        let mut s = session(&fens, &moves, 5);
        s.go_to_move(2);
        s.exit_analysis();
        assert_eq!(s.state().current_move_index, 5);
    }

    #[test]
    fn test_navigation_clamps() {
        let (fens, moves) = mainline_histories(4);
        let mut s = session(&fens, &moves, 4);
        s.next_move();
        assert_eq!(s.state().current_move_index, 4);
        s.go_to_move(100);
        assert_eq!(s.state().current_move_index, 4);
        s.go_to_move(0);
        s.prev_move();
        assert_eq!(s.state().current_move_index, 0);

        s.go_to_move(2);
        s.enter_analysis();
        s.next_move();
        assert_eq!(s.state().current_move_index, 2);
        play(&mut s, "e2", "e3");
        s.go_to_move(100);
        assert_eq!(s.state().current_move_index, 3);
    }

    #[test]
    fn test_derived_views() {
        let (fens, moves) = mainline_histories(4);
        let mut s = session(&fens, &moves, 2);
        assert_eq!(s.combined_moves(), vec!["e2-e4", "e7-e5", "g2-g3", "b7-b6"]);
        assert_eq!(s.current_fen(), fens[2]);
        assert!(!s.is_analysis_move(3));

        s.enter_analysis();
        play(&mut s, "e2", "e3");
        assert_eq!(s.combined_moves(), vec!["e2-e4", "e7-e5", "e2-e3"]);
        assert_eq!(s.total_move_count(), 4);
        assert_eq!(s.current_fen(), "start|e2e4|e7e5|e2e3");
        assert!(!s.is_analysis_move(2));
        assert!(s.is_analysis_move(3));
    }

    #[test]
    fn test_empty_mainline_falls_back_to_start_position() {
        let mut s = session(&[], &[], 0);
        assert_eq!(s.current_fen(), STANDARD_START_FEN);
        assert!(s.combined_moves().is_empty());
        s.next_move();
        assert_eq!(s.state().current_move_index, 0);
    }

    #[test]
    fn test_engine_failure_keeps_state() {
        let fens = vec!["broken".to_string()];
        let moves = vec![None];
        let mut s = session(&fens, &moves, 0);
        s.enter_analysis();
        cursor_to(&mut s, "e2");
        let before = s.state().clone();
        s.select_square();
        assert_eq!(s.state(), &before);
    }

    #[test]
    fn test_transition_is_pure() {
        let (fens, moves) = mainline_histories(4);
        let ctx = AnalysisContext::new(
            Mainline {
                fen_history: &fens,
                move_history: &moves,
                initial_move_index: 4,
            },
            FakeEngine,
        );
        let state = AnalysisState::new(4);
        let next = transition(&ctx, &state, AnalysisEvent::Prev);
        assert_eq!(state.current_move_index, 4);
        assert_eq!(next.current_move_index, 3);
    }
}
