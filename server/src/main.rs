use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use futures_util::{FutureExt, StreamExt};
use serde::Serialize;
use sweepcast_server::broadcast::TurnStream;
use sweepcast_server::{Config, GameRegistry, handle_request};
use time::OffsetDateTime;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    /// JSON config file, command line flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory to save game layouts to
    #[arg(long)]
    store_dir: Option<PathBuf>,

    /// Length of generated game ids
    #[arg(long)]
    id_length: Option<usize>,

    /// Seconds a finished game stays around
    #[arg(long)]
    finished_ttl_secs: Option<u64>,
}

impl Args {
    fn config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_json_file(path)?,
            None => Config::default(),
        };
        if let Some(dir) = &self.store_dir {
            config.store_dir = Some(dir.clone());
        }
        if let Some(length) = self.id_length {
            config.id_length = length;
        }
        if let Some(ttl) = self.finished_ttl_secs {
            config.finished_ttl_secs = ttl;
        }
        Ok(config)
    }
}

/// Reads one command per line from stdin and answers on stdout.
///
/// Lines starting with `{` are action requests. `watch <id> <from>` prints the
/// turns of a game after `from`, `games <from>` the revisions of the game list.
fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();

    let config = args.config()?;
    log::debug!("config: {:?}", config);
    let store = config.open_store()?;
    let registry = GameRegistry::new(config, store);

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        registry.evict_finished(OffsetDateTime::now_utc());
        if let Err(err) = run_command(&registry, line, &mut stdout) {
            writeln!(stdout, "{}", serde_json::json!({ "error": err.to_string() }))?;
        }
        stdout.flush()?;
    }

    log::info!("Input closed, shutting down with {} live game(s)", registry.len());
    Ok(())
}

fn run_command(registry: &GameRegistry, line: &str, out: &mut impl Write) -> anyhow::Result<()> {
    if line.starts_with('{') {
        let resp = handle_request(registry, line);
        writeln!(out, "{}", serde_json::to_string(&resp)?)?;
        return Ok(());
    }

    let mut words = line.split_whitespace();
    match (words.next(), words.next(), words.next()) {
        (Some("watch"), Some(id), from) => {
            let game = registry.lookup(id)?;
            drain(game.subscribe(parse_from(from)?), out)
        }
        (Some("games"), from, None) => drain(registry.subscribe_game_list(parse_from(from)?), out),
        _ => anyhow::bail!("unrecognized command: {line}"),
    }
}

fn parse_from(word: Option<&str>) -> anyhow::Result<u32> {
    word.map_or(Ok(0), |word| {
        word.parse()
            .with_context(|| format!("invalid turn number {word:?}"))
    })
}

/// Writes out everything the stream already holds, without waiting for more.
fn drain<T: Serialize>(mut stream: TurnStream<T>, out: &mut impl Write) -> anyhow::Result<()> {
    while let Some(Some(event)) = stream.next().now_or_never() {
        writeln!(out, "{}", serde_json::to_string(&event)?)?;
    }
    Ok(())
}
