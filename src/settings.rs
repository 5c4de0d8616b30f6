use std::path::PathBuf;

use clap::Parser;

use crate::sprite::palette::{self, Variant};

/// Screen pixels per sheet pixel unless overridden.
pub const DEFAULT_PIXEL_SIZE: u32 = 3;
const MAX_PIXEL_SIZE: u32 = 12;

#[derive(Parser, Debug)]
#[command(version, about = "A little bird that perches on your open windows")]
pub struct Cli {
    /// Species to start as (shimaenaga, bluebird, cardinal, bluejay, robin, goldfinch, chickadee)
    #[arg(long, value_name = "ID", default_value = palette::DEFAULT_VARIANT_ID)]
    pub variant: String,

    /// Screen pixels per sprite pixel
    #[arg(long, value_name = "N", default_value_t = DEFAULT_PIXEL_SIZE)]
    pub pixel_size: u32,

    /// Load sprites from this PNG instead of the bundled sheet
    #[arg(long, value_name = "PATH")]
    pub sheet: Option<PathBuf>,

    /// Start with the bird hidden (show it from the tray)
    #[arg(long)]
    pub hidden: bool,

    /// Seed the behaviour RNG for reproducible runs
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,
}

/// Resolved runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub variant: &'static Variant,
    pub pixel_size: u32,
    pub sheet: Option<PathBuf>,
    pub start_hidden: bool,
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            variant: palette::default_variant(),
            pixel_size: DEFAULT_PIXEL_SIZE,
            sheet: None,
            start_hidden: false,
            seed: None,
        }
    }
}

impl From<Cli> for Settings {
    fn from(cli: Cli) -> Self {
        let variant = palette::variant_by_id(&cli.variant).unwrap_or_else(|| {
            log::warn!(
                "Unknown variant '{}', using {}",
                cli.variant,
                palette::DEFAULT_VARIANT_ID
            );
            palette::default_variant()
        });

        let pixel_size = cli.pixel_size.clamp(1, MAX_PIXEL_SIZE);
        if pixel_size != cli.pixel_size {
            log::warn!("Pixel size {} out of range, using {pixel_size}", cli.pixel_size);
        }

        Self {
            variant,
            pixel_size,
            sheet: cli.sheet,
            start_hidden: cli.hidden,
            seed: cli.seed,
        }
    }
}
