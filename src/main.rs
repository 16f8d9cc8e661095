use std::error::Error;

use clap::Parser;
use log::{info, warn};

use emoji_pua_font::build::build_font;
use emoji_pua_font::config::{Args, Config};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = Config::load(&args)?;
    let report = build_font(&config)?;

    let unresolved = report.font.mapping.unresolved();
    if !unresolved.is_empty() {
        warn!(
            "{} codepoints were lost during subsetting",
            unresolved.len()
        );
    }
    info!(
        "Done: {} emoji mapped, {} missing",
        report.font.mapping.len(),
        report.font.resolution.missing.len()
    );

    Ok(())
}
