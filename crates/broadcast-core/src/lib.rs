//! Core of the broadcast viewer: PGN ingestion into per-game histories and
//! the branchable analysis state machine layered on top of them.

pub mod analysis;
pub mod board;
pub mod engine;
pub mod error;
pub mod game_data;
pub mod pgn;
pub mod square;

pub use analysis::{AnalysisEvent, AnalysisMove, AnalysisSession, AnalysisState, Mainline};
pub use engine::{RulesEngine, ShakmatyEngine, STANDARD_START_FEN};
pub use error::{EngineError, SquareError};
pub use game_data::{Game, GameStatus, Player, Title};
pub use pgn::{parse_pgn, parse_single_pgn, PgnBuffer};
pub use square::{BoardSquare, Direction};
