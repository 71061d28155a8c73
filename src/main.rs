use std::path::PathBuf;

use clap::Parser;
use eframe::egui;
use mark_tally::app::MarkTallyApp;
use mark_tally::Options;

/// Place typed markers on an image and export grouped counts.
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// PNG or JPEG image to open on startup
    image: Option<PathBuf>,

    /// Options file to use instead of the one in the user config directory
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<(), eframe::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    log::info!("mark-tally v{} starting", env!("CARGO_PKG_VERSION"));

    let config_path = cli.config.unwrap_or_else(Options::config_path);
    let options = Options::load_from_file(&config_path);

    let title = match cli.image.as_deref().and_then(|p| p.file_name()) {
        Some(name) => format!("mark-tally - {}", name.to_string_lossy()),
        None => "mark-tally".to_string(),
    };

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title(&title),
        ..Default::default()
    };

    let image = cli.image;
    eframe::run_native(
        &title,
        native_options,
        Box::new(move |_cc| {
            Ok(Box::new(MarkTallyApp::new(options, config_path, image)))
        }),
    )
}
