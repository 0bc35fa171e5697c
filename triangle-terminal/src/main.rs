mod render;
mod show;

use std::env;
use std::io;

use anyhow::Context;
use clap::Parser;
use clap::builder::PossibleValuesParser;
use log::*;
use rand::{SeedableRng, rngs::SmallRng};
use triangle_lights_core::config::Config;
use triangle_lights_core::lights::PatternRunner;
use triangle_lights_core::lights::patterns::{PATTERN_NAMES, pattern_by_name};

use crate::show::{RealClock, Show};

#[derive(Parser, Debug)]
#[command(name = "triangle-terminal")]
#[command(about = "Preview the triangle light patterns in a true color terminal")]
#[command(version)]
struct Cli {
    /// Pattern to play. Repeat to play several in order. Plays all of them if not set
    #[arg(short, long = "pattern", value_parser = PossibleValuesParser::new(PATTERN_NAMES))]
    patterns: Vec<String>,

    /// Seconds to play each pattern before asking it to stop
    #[arg(short, long)]
    seconds: Option<u32>,

    #[arg(long)]
    fps: Option<u16>,

    #[arg(long)]
    leds: Option<usize>,

    /// Every segment gets its own row
    #[arg(long)]
    segments: Option<usize>,

    /// The strip runs much dimmer than this, but the terminal is easier to see at full brightness
    #[arg(short, long, default_value_t = 255)]
    brightness: u8,

    /// Seed for the random number generator. Random if not set
    #[arg(long)]
    seed: Option<u64>,

    /// How many times to play the whole list. 0 plays forever
    #[arg(long, default_value_t = 1)]
    cycles: u32,
}

impl Cli {
    fn config(&self) -> Config {
        let mut config = Config::default();

        if let Some(x) = self.seconds {
            config.ms_per_light_pattern = x.saturating_mul(1_000);
        }
        if let Some(x) = self.fps {
            config.frames_per_second = x;
        }
        if let Some(x) = self.leds {
            config.num_leds = x;
        }
        if let Some(x) = self.segments {
            config.num_segments = x;
        }
        config.default_brightness = self.brightness;

        config
    }

    fn runners(&self) -> anyhow::Result<Vec<PatternRunner>> {
        let names: Vec<&str> = if self.patterns.is_empty() {
            PATTERN_NAMES.to_vec()
        } else {
            self.patterns.iter().map(String::as_str).collect()
        };

        names
            .into_iter()
            .map(|name| {
                pattern_by_name(name)
                    .map(PatternRunner::new)
                    .with_context(|| format!("unknown pattern: {name}"))
            })
            .collect()
    }
}

fn main() -> anyhow::Result<()> {
    if env::var_os("RUST_LOG").is_none() {
        // SAFETY: nothing else is running yet
        unsafe { env::set_var("RUST_LOG", "info") };
    }

    env_logger::builder()
        .format_timestamp_millis()
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    debug!("{:?}", cli);

    let config = cli.config();
    let mut runners = cli.runners()?;

    let rng = match cli.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    };

    info!(
        "playing {} patterns on {} leds at {} fps",
        runners.len(),
        config.num_leds,
        config.frames_per_second
    );

    let mut show = Show::new(config, RealClock::new(), rng, io::stdout().lock())?;

    show.run(&mut runners, cli.cycles)?;

    info!("drew {} frames", show.frames_drawn());

    Ok(())
}
