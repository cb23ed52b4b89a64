#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use air_canvas::{
    config::{AppConfig, Cli},
    model_download,
    pipeline::{self, OrtLandmarkProvider},
    ui,
};
use anyhow::Result;
use clap::Parser;
use gpui::Application;

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    if cli.list_cameras {
        for device in pipeline::camera::available_cameras()? {
            println!("{}: {}", device.index, device.label);
        }
        return Ok(());
    }

    let config = AppConfig::from_cli(cli)?;
    model_download::ensure_models_ready(&config.detector.models_dir).inspect_err(|err| {
        log::error!("hand landmark models unavailable: {err:?}");
    })?;
    // Loaded here, before the window exists, so Start never waits on it.
    let provider = OrtLandmarkProvider::new(&config.detector).inspect_err(|err| {
        log::error!("failed to load hand landmark models: {err:?}");
    })?;

    Application::new()
        .with_assets(gpui_component_assets::Assets)
        .run(move |app| {
            gpui_component::init(app);

            if let Err(err) = ui::launch_ui(app, config, Box::new(provider)) {
                log::error!("failed to launch ui: {err:?}");
            }
        });

    Ok(())
}
