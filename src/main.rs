use std::path::PathBuf;

use tickpulse::{EngineCommand, EngineConfig, PlayerApp, PulseMeter, SongLibrary, spawn_engine};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let meter = PulseMeter::new();
    let engine = spawn_engine(SongLibrary::bundled()?, meter.clone(), EngineConfig::default())?;

    if let Some(path) = std::env::args().nth(1) {
        let _ = engine.command_tx.send(EngineCommand::LoadLibrary(PathBuf::from(path)));
    }

    let tempo = tickpulse::timing::Tempo::DEFAULT.bpm();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([480.0, 320.0])
            .with_min_inner_size([480.0, 300.0])
            .with_title("Tickpulse"),
        ..Default::default()
    };

    eframe::run_native(
        "Tickpulse",
        options,
        Box::new(move |_cc| Ok(Box::new(PlayerApp::new(engine, meter, tempo)))),
    )?;

    Ok(())
}
