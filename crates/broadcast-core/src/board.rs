//! Plain-text board and move-list helpers for line-oriented front-ends.

use serde::Serialize;
use shakmaty::Board;

use crate::engine::{to_kind, to_side, to_square, Piece, PieceKind, Side, STANDARD_START_FEN};
use crate::square::BoardSquare;

pub fn piece_symbol(piece: Piece) -> char {
    match (piece.side, piece.kind) {
        (Side::White, PieceKind::King) => '♔',
        (Side::White, PieceKind::Queen) => '♕',
        (Side::White, PieceKind::Rook) => '♖',
        (Side::White, PieceKind::Bishop) => '♗',
        (Side::White, PieceKind::Knight) => '♘',
        (Side::White, PieceKind::Pawn) => '♙',
        (Side::Black, PieceKind::King) => '♚',
        (Side::Black, PieceKind::Queen) => '♛',
        (Side::Black, PieceKind::Rook) => '♜',
        (Side::Black, PieceKind::Bishop) => '♝',
        (Side::Black, PieceKind::Knight) => '♞',
        (Side::Black, PieceKind::Pawn) => '♟',
    }
}

/// How a board should be drawn.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoardView {
    pub flipped: bool,
    pub cursor: Option<BoardSquare>,
    pub selected: Option<BoardSquare>,
}

fn parse_board(fen: &str) -> Board {
    let placement = fen.split_whitespace().next().unwrap_or_default();
    Board::from_ascii_board_fen(placement.as_bytes()).unwrap_or_else(|_| {
        let start = STANDARD_START_FEN.split(' ').next().unwrap_or_default();
        Board::from_ascii_board_fen(start.as_bytes()).unwrap_or_default()
    })
}

/// Render the placement of `fen` as text, one line per rank plus a file legend.
///
/// The cursor is drawn as `[x]` and the selected square as `(x)`.
pub fn render_board(fen: &str, view: &BoardView) -> String {
    let board = parse_board(fen);
    let ranks: Vec<u8> = if view.flipped {
        (0..8).collect()
    } else {
        (0..8).rev().collect()
    };
    let files: Vec<u8> = if view.flipped {
        (0..8).rev().collect()
    } else {
        (0..8).collect()
    };

    let mut out = String::new();
    for &rank in &ranks {
        out.push_str(&format!("{} ", rank + 1));
        for &file in &files {
            let Some(square) = BoardSquare::new(file, rank) else {
                continue;
            };
            let symbol = board
                .piece_at(to_square(square))
                .map(|p| {
                    piece_symbol(Piece {
                        side: to_side(p.color),
                        kind: to_kind(p.role),
                    })
                })
                .unwrap_or('·');

            let (open, close) = if view.selected == Some(square) {
                ('(', ')')
            } else if view.cursor == Some(square) {
                ('[', ']')
            } else {
                (' ', ' ')
            };
            out.push(open);
            out.push(symbol);
            out.push(close);
        }
        out.push('\n');
    }

    out.push_str("  ");
    for &file in &files {
        out.push(' ');
        out.push((b'a' + file) as char);
        out.push(' ');
    }
    out.push('\n');
    out
}

/// A numbered white/black move pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovePair {
    pub number: usize,
    pub white: Option<String>,
    pub black: Option<String>,
}

/// Group a SAN move list into numbered pairs, White first.
pub fn move_pairs(moves: &[String]) -> Vec<MovePair> {
    moves
        .chunks(2)
        .enumerate()
        .map(|(i, pair)| MovePair {
            number: i + 1,
            white: pair.first().cloned(),
            black: pair.get(1).cloned(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_start_position() {
        let text = render_board(STANDARD_START_FEN, &BoardView::default());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], "8  ♜  ♞  ♝  ♛  ♚  ♝  ♞  ♜ ");
        assert_eq!(lines[4], "4  ·  ·  ·  ·  ·  ·  ·  · ");
        assert_eq!(lines[7], "1  ♖  ♘  ♗  ♕  ♔  ♗  ♘  ♖ ");
        assert_eq!(lines[8], "   a  b  c  d  e  f  g  h ");
    }

    #[test]
    fn test_render_flipped_with_markers() {
        let view = BoardView {
            flipped: true,
            cursor: "e4".parse().ok(),
            selected: "e2".parse().ok(),
        };
        let text = render_board(STANDARD_START_FEN, &view);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "1  ♖  ♘  ♗  ♔  ♕  ♗  ♘  ♖ ");
        assert_eq!(lines[1], "2  ♙  ♙  ♙ (♙) ♙  ♙  ♙  ♙ ");
        assert_eq!(lines[3], "4  ·  ·  · [·] ·  ·  ·  · ");
        assert_eq!(lines[8], "   h  g  f  e  d  c  b  a ");
    }

    #[test]
    fn test_render_invalid_fen_uses_start_position() {
        assert_eq!(
            render_board("garbage", &BoardView::default()),
            render_board(STANDARD_START_FEN, &BoardView::default())
        );
    }

    #[test]
    fn test_move_pairs() {
        let moves: Vec<String> = ["e4", "e5", "Nf3"].iter().map(|s| s.to_string()).collect();
        let pairs = move_pairs(&moves);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].white.as_deref(), Some("e4"));
        assert_eq!(pairs[0].black.as_deref(), Some("e5"));
        assert_eq!(pairs[1].number, 2);
        assert_eq!(pairs[1].black, None);
        assert!(move_pairs(&[]).is_empty());
    }
}
