#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line runner for Tikmings campaigns.
//!
//! Frames are simulated as fast as possible; a text backend can draw the
//! playfield every few frames and a summary is printed once the run ends.

mod levels;
mod script;
mod session;
mod text_backend;

use std::{io, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use tikmings_rendering::RenderingBackend;
use tikmings_system_clock::{Clock, ClockConfig};
use tikmings_system_progression::{Progression, DEFAULT_OVERLAY_TICKS};
use tikmings_world::{Campaign, DEFAULT_LIVES};
use tracing::info;

use crate::{session::Session, text_backend::TextBackend};

#[derive(Parser, Debug)]
#[command(
    name = "tikmings",
    version,
    about = "Run a Tikmings campaign headlessly"
)]
struct Cli {
    /// Level pack to play; the bundled campaign is used when omitted.
    #[arg(long)]
    levels: Option<PathBuf>,
    /// Skill assignments to replay, as a TOML file of [[assign]] entries.
    #[arg(long)]
    script: Option<PathBuf>,
    /// Lives available to the campaign.
    #[arg(long, default_value_t = DEFAULT_LIVES)]
    lives: u32,
    /// Upper bound on simulated frames.
    #[arg(long, default_value_t = 36_000)]
    frames: u64,
    /// Simulated frame rate driving the wall-clock timer.
    #[arg(long, default_value_t = 60)]
    fps: u32,
    /// Rendered frames per simulation tick.
    #[arg(long, default_value_t = ClockConfig::default().frames_per_tick())]
    frames_per_tick: u32,
    /// Ticks the outcome overlay stays up before the campaign moves on.
    #[arg(long, default_value_t = DEFAULT_OVERLAY_TICKS)]
    overlay_ticks: u32,
    /// Restart the campaign after game over or victory instead of stopping.
    #[arg(long)]
    auto_restart: bool,
    /// Draw the playfield every N frames; 0 disables drawing.
    #[arg(long, default_value_t = 0)]
    render_every: u64,
    /// Width of the drawn playfield in characters.
    #[arg(long, default_value_t = 100)]
    columns: u32,
    /// Print the run summary as JSON.
    #[arg(long)]
    json: bool,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();
}

/// Entry point for the Tikmings command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let specs = levels::load(cli.levels.as_deref())?;
    let campaign = Campaign::new(specs).context("level pack failed validation")?;
    let script = match cli.script.as_deref() {
        Some(path) => script::load(path)?,
        None => script::AssignmentScript::default(),
    };
    info!(
        levels = ?campaign.names().collect::<Vec<_>>(),
        assignments = script.len(),
        "loaded campaign"
    );

    let heartbeat = ClockConfig::default().heartbeat();
    let clock = Clock::new(ClockConfig::new(cli.frames_per_tick, heartbeat));
    let progression = Progression::new(cli.overlay_ticks).with_auto_restart(cli.auto_restart);
    let mut session = Session::new(campaign, cli.lives, clock, progression, script);
    let frame_dt = Duration::from_secs_f64(1.0 / f64::from(cli.fps.max(1)));
    let mut backend = TextBackend::new(io::stdout(), cli.columns);

    for frame in 1..=cli.frames {
        session.frame(frame_dt);
        if cli.render_every > 0 && frame % cli.render_every == 0 {
            backend.present(&session.presentation())?;
        }
        if session.finished() {
            break;
        }
    }

    let summary = session.summary();
    if cli.json {
        let json = serde_json::to_string_pretty(&summary).context("failed to encode summary")?;
        println!("{json}");
    } else {
        print!("{summary}");
    }
    Ok(())
}
