use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Error;
use clap::Parser;
use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    lights::{SegmentMap, SegmentPixels},
    strip::gamma::scale_brightness,
};

pub const DEFAULT_PIXELS: usize = 8;
pub const DEFAULT_STEP_DELAY_MS: u64 = 20;
pub const DEFAULT_BRIGHTNESS: f64 = 40.0;

/// Network health indicator
///
/// Reads JSON commands from stdin, one per line, and shows the health of
/// the local network, the gateway and the internet on an LED strip.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Number of pixels on the strip
    #[arg(short, long)]
    pub pixels: Option<usize>,
    /// Delay between the steps of a wipe, in milliseconds
    #[arg(short = 'w', long = "wait-ms", value_name = "MS")]
    pub wait_ms: Option<u64>,
    /// Brightness from 0 to 100
    #[arg(short, long)]
    pub brightness: Option<f64>,
    /// Apply the gamma table before pushing pixels
    #[arg(short, long, value_name = "BOOL", action = clap::ArgAction::Set)]
    pub gamma: Option<bool>,
    /// Configuration file
    #[arg(short, long, default_value = "config.ron", value_name = "FILE")]
    pub config: PathBuf,
    /// Loop through every indicator state instead of reading commands
    #[arg(long)]
    pub self_test: bool,
}

/// Contents of the configuration file. Everything except the segment
/// layout can be overridden from the command line.
#[derive(Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub pixels: Option<usize>,
    #[serde(default)]
    pub step_delay_ms: Option<u64>,
    #[serde(default)]
    pub brightness: Option<f64>,
    #[serde(default)]
    pub gamma: Option<bool>,
    #[serde(default)]
    pub segments: SegmentPixels,
}

impl Config {
    pub fn load(path: &Path) -> Result<Config, Error> {
        let config = std::fs::read_to_string(path)?;
        let config: Config = ron::from_str(&config)?;
        Ok(config)
    }

    /// Load `path` if it exists, fall back to the defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Config, Error> {
        if path.exists() {
            info!("Loading config from {}", path.display());
            Config::load(path)
        } else {
            info!("No config at {}, using defaults", path.display());
            Ok(Config::default())
        }
    }
}

/// Startup settings after merging the command line over the config file.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub pixel_count: usize,
    pub step_delay: Duration,
    pub brightness: u8,
    pub gamma: bool,
    pub segments: SegmentMap,
}

impl Settings {
    pub fn resolve(cli: &Cli, config: Config) -> Result<Settings, Error> {
        let pixel_count = cli.pixels.or(config.pixels).unwrap_or(DEFAULT_PIXELS);
        let step_delay_ms = cli
            .wait_ms
            .or(config.step_delay_ms)
            .unwrap_or(DEFAULT_STEP_DELAY_MS);
        let brightness = cli
            .brightness
            .or(config.brightness)
            .unwrap_or(DEFAULT_BRIGHTNESS);
        let gamma = cli.gamma.or(config.gamma).unwrap_or(true);

        let segments = SegmentMap::new(config.segments, pixel_count)?;

        Ok(Settings {
            pixel_count,
            step_delay: Duration::from_millis(step_delay_ms),
            brightness: scale_brightness(brightness),
            gamma,
            segments,
        })
    }
}
