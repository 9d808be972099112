#![allow(dead_code)]

use broadcast_core::{AnalysisSession, BoardSquare, Direction, RulesEngine};

/// 1. f3 e5 2. g4 Qh4#
pub const FOOLS_MATE: &str = r#"[Event "Blitz"]
[White "Fool"]
[Black "Sage"]
[WhiteElo "1200"]
[BlackElo "1800"]
[Result "0-1"]

1. f3 e5 2. g4 Qh4# 0-1"#;

/// Ten-move stalemate with Black to move.
pub const STALEMATE: &str = r#"[Event "Study"]
[White "Loyd"]
[Black "Nobody"]
[Result "1/2-1/2"]

1. e3 a5 2. Qh5 Ra6 3. Qxa5 h5 4. h4 Rah6 5. Qxc7 f6 6. Qxd7+ Kf7
7. Qxb7 Qd3 8. Qxb8 Qh7 9. Qxc8 Kg6 10. Qe6 1/2-1/2"#;

/// Knights shuffle back to the start position a third time.
pub const REPETITION: &str = r#"[Event "Blitz"]
[White "Shuffle"]
[Black "Shuffle"]
[Result "1/2-1/2"]

1. Nf3 Nf6 2. Ng1 Ng8 3. Nf3 Nf6 4. Ng1 Ng8 1/2-1/2"#;

/// Same shuffle, then both sides play on.
pub const REPETITION_THEN_PLAY: &str = r#"[Event "Blitz"]
[White "Shuffle"]
[Black "Onward"]

1. Nf3 Nf6 2. Ng1 Ng8 3. Nf3 Nf6 4. Ng1 Ng8 5. e4 e5 *"#;

/// Ruy Lopez, ten plies, still in progress.
pub const RUY_LOPEZ: &str = r#"[Event "Round 3"]
[GameId "ruy123"]
[White "Caruana"]
[Black "Nakamura"]
[WhiteTitle "GM"]
[BlackTitle "GM"]
[WhiteElo "2805"]
[BlackElo "2780"]

1. e4 e5 2. Nf3 Nc6 3. Bb5 a6 4. Ba4 Nf6 5. O-O Be7 *"#;

/// Valid headers, illegal second move.
pub const ILLEGAL: &str = r#"[Event "Broken"]
[White "Bad"]
[Black "Input"]

1. e4 e5 2. Ke3 *"#;

pub fn join(records: &[&str]) -> String {
    records.join("\n\n")
}

/// Walk the cursor to `target` on an unflipped board.
pub fn cursor_to<E: RulesEngine>(session: &mut AnalysisSession<'_, E>, target: &str) {
    let target: BoardSquare = target.parse().unwrap();
    while session.state().cursor_square.rank() < target.rank() {
        session.move_cursor(Direction::Up);
    }
    while session.state().cursor_square.rank() > target.rank() {
        session.move_cursor(Direction::Down);
    }
    while session.state().cursor_square.file() < target.file() {
        session.move_cursor(Direction::Right);
    }
    while session.state().cursor_square.file() > target.file() {
        session.move_cursor(Direction::Left);
    }
    assert_eq!(session.state().cursor_square, target);
}

/// Pick up the piece on `from` and drop it on `to`.
pub fn play<E: RulesEngine>(session: &mut AnalysisSession<'_, E>, from: &str, to: &str) {
    cursor_to(session, from);
    session.select_square();
    assert_eq!(
        session.state().selected_square.map(|s| s.to_string()).as_deref(),
        Some(from)
    );
    cursor_to(session, to);
    session.select_square();
}
