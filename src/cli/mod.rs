//! CLI definitions and dispatch.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use chunkstash::logging::{self, LogFormat, RequestTimer};
use chunkstash::{CacheConfig, ChunkCache};

mod entries;
mod get;
mod put;
mod stats;

/// Stash oversized edit-chunk results on disk and fetch them by key.
#[derive(Debug, Parser)]
#[command(name = "chunkstash", version, about)]
pub(crate) struct Cli {
    /// Path to a TOML config file (dir, ttl_secs, max_entries)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the cache directory
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Cache a JSON array of chunks and print its key
    Put {
        /// Prompt text the chunks were produced for
        #[arg(long)]
        prompt: String,
        /// JSON file holding the chunk array (stdin if omitted)
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Print the chunks stored under a key
    Get { key: String },
    /// Show entry count, TTL, cap and directory
    Stats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// List stored entries, oldest first
    Ls,
    /// Remove one entry
    Rm { key: String },
    /// Remove every entry
    Clear,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Put { .. } => "put",
            Command::Get { .. } => "get",
            Command::Stats { .. } => "stats",
            Command::Ls => "ls",
            Command::Rm { .. } => "rm",
            Command::Clear => "clear",
        }
    }
}

/// Build the cache config from `--config` and `--dir`.
pub(crate) fn resolve_config(
    config: Option<&PathBuf>,
    dir: Option<&PathBuf>,
) -> Result<CacheConfig> {
    let mut cfg = match config {
        Some(path) => CacheConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => CacheConfig::default(),
    };
    if let Some(dir) = dir {
        cfg = cfg.with_dir(dir);
    }
    Ok(cfg)
}

pub(crate) fn run(cli: Cli) -> Result<ExitCode> {
    logging::init(if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    });

    let config = resolve_config(cli.config.as_ref(), cli.dir.as_ref())?;
    let mut cache = ChunkCache::new(config);

    let mut timer = RequestTimer::new("cli");
    let name = cli.command.name();
    timer.start(name);

    let ok = match cli.command {
        Command::Put { prompt, file } => put::cmd_put(&mut cache, &prompt, file.as_deref())?,
        Command::Get { key } => get::cmd_get(&cache, &key)?,
        Command::Stats { json } => stats::cmd_stats(&cache, json)?,
        Command::Ls => entries::cmd_ls(&cache),
        Command::Rm { key } => entries::cmd_rm(&cache, &key),
        Command::Clear => entries::cmd_clear(&cache),
    };

    timer.finish(name);
    Ok(if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}
