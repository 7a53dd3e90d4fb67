use clap::{Parser, Subcommand};
use osr_reader::{decode_with, DecodeOptions, ReplayRecord, TrailerPolicy};
use std::path::{Path, PathBuf};
use tracing::{debug, warn, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "osr", about = "Inspect osu! .osr replay files")]
struct Cli {
    /// Keep HardRock replays in their stored (upside-down) coordinates
    #[arg(long, global = true)]
    raw_coords: bool,
    /// Trailer handling: auto (default), legacy, modern
    #[arg(long, global = true, default_value = "auto")]
    format: String,
    /// Verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show header fields and derived statistics
    Info {
        input: PathBuf,
    },
    /// Print the event table
    Events {
        input: PathBuf,
        /// First time (ms) to include
        #[arg(long)]
        start: Option<i64>,
        /// Last time (ms) to include
        #[arg(long)]
        end: Option<i64>,
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Show the event nearest to a time (ms)
    At {
        input: PathBuf,
        #[arg(allow_hyphen_values = true)]
        time: i64,
    },
    /// Dump the decoded replay as JSON
    Json {
        input: PathBuf,
        #[arg(short, long)]
        pretty: bool,
    },
    /// Decode many replays and print one summary line each
    Batch {
        #[arg(required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let opts = DecodeOptions {
        flip_hard_rock: !cli.raw_coords,
        trailer:        parse_trailer(&cli.format),
    };

    match cli.command {

        // ── Info ─────────────────────────────────────────────────────────────
        Commands::Info { input } => {
            let replay = load(&input, &opts)?;
            println!("── Replay ───────────────────────────────────────────────");
            println!("  Path           {}", input.display());
            println!("  Mode           {}", replay.game_mode);
            println!("  Version        {}", replay.game_version);
            println!("  Player         {}", replay.player_name);
            println!("  Beatmap MD5    {}", replay.beatmap_hash);
            println!("  Replay MD5     {}", replay.replay_hash);
            println!("  Played at      {}", replay.timestamp);
            println!("  Score          {}", replay.score);
            println!("  Max combo      {}{}", replay.max_combo, if replay.is_perfect { " (FC)" } else { "" });
            println!("  Hits           300:{} geki:{} 100:{} katu:{} 50:{} miss:{}",
                replay.count_300, replay.count_geki, replay.count_100,
                replay.count_katu, replay.count_50, replay.count_miss);
            println!("  Accuracy       {}", replay.accuracy());
            println!("  Mods           {}", if replay.mods.is_empty() { "NM".to_string() } else { replay.mods.to_string() });
            if let Some(keys) = replay.mania_keys {
                println!("  Keys           {keys}K");
            }
            println!("  Events         {}", replay.events.len());
            println!("  Life bar       {}", replay.life_bar_graph.as_ref().map_or(0, |g| g.split(',').count()));
            println!("  Score ID       {}", replay.score_id.map_or_else(|| "—".to_string(), |id| id.to_string()));
            println!("  RNG seed       {}", replay.rng_seed.map_or_else(|| "—".to_string(), |s| s.to_string()));
        }

        // ── Events ───────────────────────────────────────────────────────────
        Commands::Events { input, start, end, limit } => {
            let replay = load(&input, &opts)?;
            let indices = replay.events_in_range(start.unwrap_or(i64::MIN), end.unwrap_or(i64::MAX));
            println!("{:>7} {:>10} {:>10} {:>10} {:>8}", "#", "Time", "X", "Y", "Keys");
            for i in indices.into_iter().take(limit.unwrap_or(usize::MAX)) {
                let e = &replay.events[i];
                println!("{:>7} {:>10} {:>10.3} {:>10.3} {:>8}", i, e.time, e.x, e.y, e.keys);
            }
        }

        // ── At ───────────────────────────────────────────────────────────────
        Commands::At { input, time } => {
            let replay = load(&input, &opts)?;
            match replay.index_at_time(time) {
                Some(i) => {
                    let e = &replay.events[i];
                    println!("#{}  time={}  x={:.3}  y={:.3}  keys={}", i, e.time, e.x, e.y, e.keys);
                }
                None => println!("Replay has no events"),
            }
        }

        // ── Json ─────────────────────────────────────────────────────────────
        Commands::Json { input, pretty } => {
            let replay = load(&input, &opts)?;
            let out = if pretty {
                serde_json::to_string_pretty(&replay)?
            } else {
                serde_json::to_string(&replay)?
            };
            println!("{out}");
        }

        // ── Batch ────────────────────────────────────────────────────────────
        Commands::Batch { inputs } => {
            let mut failed = 0usize;
            for (path, result) in inputs.iter().zip(decode_all(&inputs, &opts)) {
                match result {
                    Ok(replay) => println!("{}  {}", path.display(), replay.summary()),
                    Err(e) => {
                        failed += 1;
                        eprintln!("{}  error: {}", path.display(), e);
                    }
                }
            }
            println!("Decoded {}/{} replay(s)", inputs.len() - failed, inputs.len());
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn load(path: &Path, opts: &DecodeOptions) -> Result<ReplayRecord, Box<dyn std::error::Error>> {
    debug!("reading {}", path.display());
    let bytes = std::fs::read(path)?;
    Ok(decode_with(&bytes, opts)?)
}

fn decode_all(paths: &[PathBuf], opts: &DecodeOptions) -> Vec<Result<ReplayRecord, String>> {
    let one = |path: &PathBuf| load(path, opts).map_err(|e| e.to_string());

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        paths.par_iter().map(one).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        paths.iter().map(one).collect()
    }
}

fn parse_trailer(s: &str) -> TrailerPolicy {
    TrailerPolicy::from_name(s).unwrap_or_else(|| {
        warn!("Unknown format '{}', defaulting to auto", s);
        TrailerPolicy::Auto
    })
}
