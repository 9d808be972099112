//! Text rendering of games and analysis sessions.

use std::fmt::Write;

use broadcast_core::board::{move_pairs, render_board, BoardView};
use broadcast_core::{AnalysisSession, Game, Player, RulesEngine};

pub fn player_label(player: &Player) -> String {
    let name = if player.name.is_empty() {
        "?"
    } else {
        player.name.as_str()
    };
    match (player.title, player.rating) {
        (Some(title), 0) => format!("{title:?} {name}"),
        (Some(title), rating) => format!("{title:?} {name} ({rating})"),
        (None, 0) => name.to_string(),
        (None, rating) => format!("{name} ({rating})"),
    }
}

fn status_label(game: &Game) -> String {
    format!("{:?}", game.status).to_lowercase()
}

/// One row of the `list` output.
pub fn game_line(number: usize, game: &Game, current: bool) -> String {
    let marker = if current { '>' } else { ' ' };
    let mut line = format!(
        "{marker}{number:>3}. {} vs {} [{}] {} plies",
        player_label(game.white()),
        player_label(game.black()),
        status_label(game),
        game.ply_count()
    );
    if let Some(name) = &game.name {
        let _ = write!(line, " - {name}");
    }
    line
}

/// Header, board and position counter for the session's current ply.
pub fn position_view<E: RulesEngine>(game: &Game, session: &AnalysisSession<'_, E>) -> String {
    let state = session.state();
    let view = BoardView {
        flipped: session.is_flipped(),
        cursor: state.is_analyzing.then_some(state.cursor_square),
        selected: state.selected_square,
    };

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} vs {} [{}]",
        player_label(game.white()),
        player_label(game.black()),
        status_label(game)
    );
    out.push_str(&render_board(&session.current_fen(), &view));

    let index = state.current_move_index;
    let last = session.total_move_count().saturating_sub(1);
    let _ = write!(out, "ply {index}/{last}");
    if index > 0 {
        if let Some(san) = session.combined_moves().get(index - 1) {
            let _ = write!(out, "  last: {san}");
        }
    }
    if state.is_analyzing {
        let _ = write!(out, "  [analysis] cursor {}", state.cursor_square);
        if let Some(selected) = state.selected_square {
            let _ = write!(out, " selected {selected}");
        }
    }
    out.push('\n');
    out
}

/// Numbered move list; branch moves carry a `*` and the current ply a `>`.
pub fn moves_view<E: RulesEngine>(session: &AnalysisSession<'_, E>) -> String {
    let current = session.state().current_move_index;
    let mark = |ply: usize, san: &str| {
        let branch = if session.is_analysis_move(ply) { "*" } else { "" };
        let here = if ply == current { ">" } else { "" };
        format!("{here}{san}{branch}")
    };

    let mut out = String::new();
    for pair in move_pairs(&session.combined_moves()) {
        let white_ply = pair.number * 2 - 1;
        let _ = write!(out, "{:>3}. ", pair.number);
        if let Some(white) = &pair.white {
            let _ = write!(out, "{:<10}", mark(white_ply, white));
        }
        if let Some(black) = &pair.black {
            out.push_str(&mark(white_ply + 1, black));
        }
        out.push('\n');
    }
    if out.is_empty() {
        out.push_str("(no moves)\n");
    }
    out
}
