pub mod app;

use anyhow::anyhow;
use eframe::{self, egui};

use innovest_api::Client;

pub use app::InnovestApp;

/// Launches the egui application with default window options.
pub fn run() -> anyhow::Result<()> {
    run_with_options(default_native_options())
}

/// Launches the egui app with caller-provided options. Service credentials
/// are read from the environment.
pub fn run_with_options(options: eframe::NativeOptions) -> anyhow::Result<()> {
    let _ = env_logger::builder().is_test(false).try_init();
    let client = Client::from_env()?;
    eframe::run_native(
        "Innovest",
        options,
        Box::new(move |cc| Ok(Box::new(InnovestApp::new(cc, client)))),
    )
    .map_err(|err| anyhow!(err.to_string()))
}

fn default_native_options() -> eframe::NativeOptions {
    eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([480.0, 860.0])
            .with_min_inner_size([380.0, 640.0]),
        ..Default::default()
    }
}
