use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Title {
    GM,
    IM,
    FM,
    WGM,
    WIM,
    WFM,
    NM,
    CM,
    WCM,
}

impl Title {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "GM" => Some(Title::GM),
            "IM" => Some(Title::IM),
            "FM" => Some(Title::FM),
            "WGM" => Some(Title::WGM),
            "WIM" => Some(Title::WIM),
            "WFM" => Some(Title::WFM),
            "NM" => Some(Title::NM),
            "CM" => Some(Title::CM),
            "WCM" => Some(Title::WCM),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub title: Option<Title>,
    pub rating: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    #[default]
    Started,
    Playing,
    Aborted,
    Mate,
    Draw,
    Resign,
    Stalemate,
    Timeout,
    Outoftime,
}

impl GameStatus {
    /// True once the game can no longer continue.
    pub fn is_finished(self) -> bool {
        !matches!(self, GameStatus::Started | GameStatus::Playing)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: Option<String>,
    pub name: Option<String>,
    pub players: [Player; 2], // [white, black]
    pub status: GameStatus,
    /// Final position; `None` when the movetext could not be replayed.
    pub fen: Option<String>,
    pub fen_history: Vec<String>,
    pub move_history: Vec<Option<String>>, // UCI, entry 0 is None
    pub pgn: String,
}

impl Game {
    pub fn white(&self) -> &Player {
        &self.players[0]
    }

    pub fn black(&self) -> &Player {
        &self.players[1]
    }

    /// Number of half-moves replayed.
    pub fn ply_count(&self) -> usize {
        self.fen_history.len().saturating_sub(1)
    }

    pub fn last_move(&self) -> Option<&str> {
        self.move_history.iter().rev().flatten().next().map(String::as_str)
    }
}
