mod app;
mod creature;
mod input;
mod motion;
mod platform;
mod render;
mod settings;
mod sprite;
mod tray;

use clap::Parser;
use env_logger::Env;

use settings::{Cli, Settings};

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let settings = Settings::from(Cli::parse());
    log::info!("Perchbird starting up");

    if let Err(e) = app::run(settings) {
        log::error!("Fatal error: {e}");
        std::process::exit(1);
    }
}
