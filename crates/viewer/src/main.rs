//! Terminal viewer for broadcast PGN files.
//!
//! Loads every game from the given files, then reads commands from stdin to
//! browse games, step through moves and branch off into analysis.

mod commands;
mod config;
mod error;
mod view;

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use broadcast_core::{parse_pgn, AnalysisSession, Game, Mainline, PgnBuffer, ShakmatyEngine};
use clap::Parser;
use tracing::{debug, info, warn};

use crate::commands::{Command, HELP};
use crate::config::{Args, StartPly, ViewerConfig};
use crate::error::ViewerError;

fn resolve_inputs(patterns: &[String]) -> Result<Vec<PathBuf>, ViewerError> {
    let mut paths = Vec::new();
    for pattern in patterns {
        let matched: Vec<PathBuf> = glob::glob(pattern)?.filter_map(|p| p.ok()).collect();
        if matched.is_empty() {
            warn!(pattern = %pattern, "No files matched");
        }
        paths.extend(matched);
    }
    if paths.is_empty() {
        return Err(ViewerError::NoInput(patterns.join(", ")));
    }
    Ok(paths)
}

/// Stream a PGN file through a [`PgnBuffer`], parsing records as they complete.
fn load_file(path: &Path) -> Result<Vec<Game>, ViewerError> {
    let reader = BufReader::new(File::open(path)?);
    let mut buffer = PgnBuffer::new();
    let mut games = Vec::new();

    for line in reader.lines() {
        buffer.push(&line?);
        buffer.push("\n");
        if let Some(complete) = buffer.take_complete() {
            games.extend(parse_pgn(&complete));
        }
    }
    if let Some(rest) = buffer.finish() {
        games.extend(parse_pgn(&rest));
    }

    info!(path = %path.display(), games = games.len(), "Loaded PGN file");
    Ok(games)
}

fn open_game(game: &Game, start: StartPly, flipped: bool) -> AnalysisSession<'_, ShakmatyEngine> {
    let mainline = Mainline::from_game(game, start.resolve(game.ply_count()));
    let mut session = AnalysisSession::new(mainline, ShakmatyEngine);
    session.set_flipped(flipped);
    session
}

fn print_list(games: &[Game], current: usize) {
    for (i, game) in games.iter().enumerate() {
        println!("{}", view::game_line(i + 1, game, i == current));
    }
}

fn run(games: &[Game], config: &ViewerConfig, first: usize) -> Result<()> {
    let mut current = first.saturating_sub(1).min(games.len() - 1);
    let mut session = open_game(&games[current], config.start, config.flipped);
    print!("{}", view::position_view(&games[current], &session));

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                println!("{e} (type 'help')");
                continue;
            }
        };
        debug!(?command, "Command");

        match command {
            Command::Quit => break,
            Command::Help => println!("{HELP}"),
            Command::List => print_list(games, current),
            Command::Moves => print!("{}", view::moves_view(&session)),
            Command::Show => print!("{}", view::position_view(&games[current], &session)),
            Command::Flip => {
                session.set_flipped(!session.is_flipped());
                print!("{}", view::position_view(&games[current], &session));
            }
            Command::Game(number) => {
                if number == 0 || number > games.len() {
                    println!("no game {number} ({} loaded)", games.len());
                    continue;
                }
                current = number - 1;
                session = open_game(&games[current], config.start, session.is_flipped());
                print!("{}", view::position_view(&games[current], &session));
            }
            Command::Analysis(event) => {
                session.dispatch(event);
                print!("{}", view::position_view(&games[current], &session));
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(io::stderr)
        .init();

    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let config = ViewerConfig::from_env()?.with_args(&args)?;
    if config.inputs.is_empty() {
        anyhow::bail!("no PGN input given (pass files or set VIEWER_PGN_GLOB)");
    }

    let mut games = Vec::new();
    for path in resolve_inputs(&config.inputs)? {
        games.extend(load_file(&path)?);
    }
    info!(games = games.len(), flipped = config.flipped, "Viewer ready");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&games)?);
        return Ok(());
    }
    if games.is_empty() {
        anyhow::bail!("no games found in {}", config.inputs.join(", "));
    }

    run(&games, &config, args.game)
}
