//! seen: command-line host for the seen presence tracker.
//!
//! ## Subcommands
//!
//! - `run`: Apply presence events streamed as JSON lines on stdin
//! - `get`: How long a player (and their bot) has been online or away
//! - `top` / `liver`: Rankings of offline / online players
//! - `reconcile`: Correct online state against a roster
//! - `remove`: Operator correction, drops players' data

mod logging;
mod render;

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use seen_core::{
    now_secs, PresenceEvent, SeenConfig, SeenEngine, SeenError, SeenPaths, TopKind, TopQuery,
};

#[derive(Parser)]
#[command(name = "seen")]
#[command(about = "Tracks when players were last seen on a server")]
#[command(version)]
struct Cli {
    /// Server working directory; data lives under config/seen/
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply presence events read from stdin, one JSON object per line
    Run {
        /// Players online right now (comma separated); reconciled before reading events
        #[arg(long, value_delimiter = ',')]
        roster: Option<Vec<String>>,
    },

    /// Show how long a player has been online or away
    Get {
        #[arg(value_name = "PLAYER")]
        name: String,
    },

    /// Players away the longest. Options: -bot | -all | -merge, -full
    Top {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Players online right now. Options: -bot | -all | -merge
    Liver {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Mark exactly these players online and everyone else offline
    Reconcile {
        #[arg(value_name = "PLAYER")]
        names: Vec<String>,
    },

    /// Delete players' data
    Remove {
        #[arg(value_name = "PLAYER", required = true)]
        names: Vec<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let paths = SeenPaths::under(&cli.root);
    let _logging_guard = logging::init(&paths.log_dir);

    match run(cli.command, &paths) {
        Ok(()) => ExitCode::SUCCESS,
        Err(SeenError::ConflictingQueryArguments(args)) => {
            eprintln!("Illegal argument: {}", args);
            eprintln!("Usage: seen top [-bot | -all | -merge] [-full]");
            eprintln!("       seen liver [-bot | -all | -merge]");
            ExitCode::from(2)
        }
        Err(err) => {
            tracing::error!(error = %err, "seen failed");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands, paths: &SeenPaths) -> Result<(), SeenError> {
    // Validate query options before touching any file.
    let query = match &command {
        Commands::Top { args } => Some(parse_query(args, TopKind::Seen)?),
        Commands::Liver { args } => Some(parse_query(args, TopKind::Liver)?),
        _ => None,
    };

    let config = SeenConfig::load(&paths.config_file)?;
    let engine = SeenEngine::open(config, paths.persistence())?;

    match command {
        Commands::Run { roster } => run_events(&engine, roster),
        Commands::Get { name } => {
            let now = now_secs();
            let found = engine.lookup(&name);
            if found.is_empty() {
                println!("No data for {}", name);
            }
            for session in &found {
                println!("{}", render::session_line(session, now));
            }
            Ok(())
        }
        Commands::Top { .. } | Commands::Liver { .. } => {
            if let Some((kind, query)) = query {
                let ranked = engine.top(kind, &query);
                let header = render::ranking_header(kind, &query, engine.config().seen_top_max);
                println!("{}", render::ranking(&header, &ranked, now_secs()));
            }
            Ok(())
        }
        Commands::Reconcile { names } => {
            let result = engine.reconcile(names.as_slice(), now_secs())?;
            println!(
                "{} went offline, {} went online",
                result.went_offline.len(),
                result.went_online.len()
            );
            Ok(())
        }
        Commands::Remove { names } => {
            let removed = engine.remove(names.as_slice())?;
            println!("Removed {} players' data: {}", removed.len(), removed.join(", "));
            Ok(())
        }
    }
}

fn parse_query(args: &[String], kind: TopKind) -> Result<(TopKind, TopQuery), SeenError> {
    Ok((kind, TopQuery::parse(&args.join(" "), kind)?))
}

/// Streams events until stdin closes, then forces everyone offline.
fn run_events(engine: &SeenEngine, roster: Option<Vec<String>>) -> Result<(), SeenError> {
    if let Some(roster) = roster {
        let result = engine.reconcile(roster.as_slice(), now_secs())?;
        tracing::info!(
            went_offline = result.went_offline.len(),
            went_online = result.went_online.len(),
            "Startup reconciliation done"
        );
    }

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.map_err(|e| SeenError::Io {
            context: "reading events from stdin".to_string(),
            source: e,
        })?;
        if line.trim().is_empty() {
            continue;
        }

        let event: PresenceEvent = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(error = %err, line = %line, "Ignoring malformed event");
                continue;
            }
        };
        tracing::debug!(event = ?event, "Received event");

        // Save failures are already logged and memory stays authoritative.
        if let Err(err) = engine.apply(event) {
            tracing::warn!(error = %err, "Event not fully applied");
        }
    }

    engine.shutdown(now_secs())
}
