//! Line commands read from stdin.

use std::str::FromStr;

use broadcast_core::{AnalysisEvent, Direction};

use crate::error::ViewerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// List loaded games
    List,
    /// Redraw the current position
    Show,
    /// Open a game by its 1-based number
    Game(usize),
    /// Print the combined move list
    Moves,
    /// Swap board orientation
    Flip,
    Help,
    Quit,
    /// Forwarded to the analysis session
    Analysis(AnalysisEvent),
}

fn number(arg: Option<&str>, command: &'static str) -> Result<usize, ViewerError> {
    let arg = arg.ok_or(ViewerError::MissingArgument(command))?;
    arg.parse()
        .map_err(|_| ViewerError::InvalidNumber(arg.to_string()))
}

impl FromStr for Command {
    type Err = ViewerError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(Command::Show);
        };
        let arg = words.next();

        let command = match head.to_ascii_lowercase().as_str() {
            "list" | "ls" => Command::List,
            "show" => Command::Show,
            "game" => Command::Game(number(arg, "game")?),
            "moves" => Command::Moves,
            "flip" => Command::Flip,
            "help" | "?" => Command::Help,
            "quit" | "q" => Command::Quit,
            "analyze" | "a" => Command::Analysis(AnalysisEvent::Enter),
            "exit" | "x" => Command::Analysis(AnalysisEvent::Exit),
            "up" | "k" => Command::Analysis(AnalysisEvent::MoveCursor(Direction::Up)),
            "down" | "j" => Command::Analysis(AnalysisEvent::MoveCursor(Direction::Down)),
            "left" | "h" => Command::Analysis(AnalysisEvent::MoveCursor(Direction::Left)),
            "right" | "l" => Command::Analysis(AnalysisEvent::MoveCursor(Direction::Right)),
            "select" | "s" => Command::Analysis(AnalysisEvent::Select),
            "next" | "n" => Command::Analysis(AnalysisEvent::Next),
            "prev" | "p" => Command::Analysis(AnalysisEvent::Prev),
            "goto" | "g" => Command::Analysis(AnalysisEvent::GoTo(number(arg, "goto")?)),
            other => return Err(ViewerError::UnknownCommand(other.to_string())),
        };
        Ok(command)
    }
}

pub const HELP: &str = "\
commands:
  list                 list loaded games
  game N               open game N
  show                 redraw the board
  moves                print the move list
  next | prev          step through moves
  goto N               jump to ply N
  analyze | exit       enter or leave analysis
  up down left right   move the cursor (also k j h l)
  select               pick up or drop a piece at the cursor
  flip                 swap board orientation
  quit";
