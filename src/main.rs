use anyhow::Error;
use clap::Parser;
use health_indicator::prelude::*;
use log::info;
use tokio::{io::BufReader, signal};

#[cfg(feature = "pi")]
fn open_strip(settings: &Settings) -> Result<SpiStrip, Error> {
    SpiStrip::init(settings.pixel_count, settings.gamma)
}

#[cfg(not(feature = "pi"))]
fn open_strip(settings: &Settings) -> Result<MemoryStrip, Error> {
    info!("Built without the pi feature, pixels are only kept in memory");
    Ok(MemoryStrip::new(settings.pixel_count, settings.gamma))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();

    let cli = Cli::parse();
    let config = Config::load_or_default(&cli.config)?;
    let settings = Settings::resolve(&cli, config)?;
    info!(
        "Starting with {} pixels, brightness {}, gamma {}",
        settings.pixel_count, settings.brightness, settings.gamma
    );

    // The writer owns the strip from here on
    let (strip, writer) = spawn(open_strip(&settings)?);
    strip.set_brightness(settings.brightness).await;

    let mut engine = Engine::new(strip, settings.segments, settings.step_delay);

    let stdin = BufReader::new(tokio::io::stdin());

    // Listening for ctrl-c starts before the sweep so an early interrupt
    // still shuts down cleanly
    tokio::select! {
        result = serve(&mut engine, cli.self_test, stdin) => result?,
        _ = signal::ctrl_c() => info!("Interrupted"),
    }

    engine.shutdown().await;
    drop(engine);
    writer.await?;

    info!("Stopped");
    Ok(())
}
