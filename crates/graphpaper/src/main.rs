//! Binary entry point: logging, CLI parsing, and window bring-up.

mod app;
mod cli;
mod render;
mod session;
mod view;

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

use crate::app::GraphApp;

fn main() -> Result<()> {
    initialise_tracing();
    let args = cli::parse();
    tracing::debug!(?args, "starting graphpaper");

    let options = eframe::NativeOptions {
        renderer: eframe::Renderer::Glow,
        viewport: eframe::egui::ViewportBuilder::default()
            .with_title("graphpaper")
            .with_inner_size([args.size.width as f32, args.size.height as f32]),
        ..Default::default()
    };

    eframe::run_native(
        "graphpaper",
        options,
        Box::new(move |cc| {
            let app = GraphApp::new(cc, &args)?;
            Ok(Box::new(app) as Box<dyn eframe::App>)
        }),
    )
    .map_err(|err| anyhow!("window event loop failed: {err}"))
}

fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
