//! Viewer configuration from environment variables and command-line flags

use std::env;
use std::str::FromStr;

use clap::Parser;

use crate::error::ViewerError;

/// Where a freshly opened game is positioned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StartPly {
    #[default]
    Last,
    Ply(usize),
}

impl StartPly {
    /// Resolve against a game with `ply_count` half-moves.
    pub fn resolve(self, ply_count: usize) -> usize {
        match self {
            StartPly::Last => ply_count,
            StartPly::Ply(ply) => ply.min(ply_count),
        }
    }
}

impl FromStr for StartPly {
    type Err = ViewerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "last" | "end" => Ok(StartPly::Last),
            other => other
                .parse()
                .map(StartPly::Ply)
                .map_err(|_| ViewerError::Config(format!("invalid start ply '{other}'"))),
        }
    }
}

#[derive(Parser, Debug, Default)]
#[command(name = "broadcast-viewer")]
#[command(about = "Browse broadcast PGN games and analyze positions from the terminal")]
pub struct Args {
    /// PGN files or glob patterns (falls back to VIEWER_PGN_GLOB)
    #[arg(value_name = "PGN")]
    pub inputs: Vec<String>,

    /// Draw the board from Black's side
    #[arg(short, long)]
    pub flipped: bool,

    /// Ply to open games at: a number or "last"
    #[arg(short, long, value_name = "PLY")]
    pub start: Option<String>,

    /// Print parsed games as JSON and exit
    #[arg(long)]
    pub json: bool,

    /// Game to open first (1-based)
    #[arg(short, long, default_value = "1")]
    pub game: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewerConfig {
    /// PGN files or glob patterns to load
    pub inputs: Vec<String>,

    /// Board orientation
    pub flipped: bool,

    /// Initial ply for each opened game
    pub start: StartPly,
}

fn env_bool(name: &str) -> bool {
    env::var(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

impl ViewerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ViewerError> {
        let inputs = env::var("VIEWER_PGN_GLOB")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .into_iter()
            .collect();

        let start = match env::var("VIEWER_START") {
            Ok(v) => v.parse()?,
            Err(_) => StartPly::Last,
        };

        Ok(Self {
            inputs,
            flipped: env_bool("VIEWER_FLIPPED"),
            start,
        })
    }

    /// Command-line flags take precedence over the environment.
    pub fn with_args(mut self, args: &Args) -> Result<Self, ViewerError> {
        if !args.inputs.is_empty() {
            self.inputs = args.inputs.clone();
        }
        if args.flipped {
            self.flipped = true;
        }
        if let Some(start) = &args.start {
            self.start = start.parse()?;
        }
        Ok(self)
    }
}
