//! Folder Digester - turn any folder into a prompt-friendly text digest
//!
//! Pick a folder, pick an output file, and the digest (summary, directory
//! tree and file contents) is produced on a background thread.

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod config;
mod dialogs;
mod ingest;
mod job;

use std::sync::Arc;

use app::DigestApp;
use config::AppSettings;
use ingest::FolderIngestor;

/// Process-wide setup, done once before any window exists
fn init_logging() {
    let default_level = if cfg!(debug_assertions) {
        "info"
    } else {
        "warn"
    };
    let env = env_logger::Env::default().default_filter_or(default_level);
    let _ = env_logger::Builder::from_env(env).try_init();
}

fn main() -> eframe::Result<()> {
    init_logging();

    let settings_path = AppSettings::default_path();
    let settings = AppSettings::load_or_default(settings_path.as_deref());
    let options = settings.ingest_options();
    log::info!(
        "Decoding with {:?}, max file size {}",
        options.encodings.labels(),
        ingest::format_size(options.max_file_size)
    );
    let ingestor = Arc::new(FolderIngestor::new(options));

    let native_options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([700.0, 550.0])
            .with_min_inner_size([500.0, 400.0])
            .with_title("Folder Digester"),
        ..Default::default()
    };

    eframe::run_native(
        "Folder Digester",
        native_options,
        Box::new(move |cc| {
            Ok(Box::new(DigestApp::new(
                cc,
                settings,
                settings_path,
                ingestor,
            )))
        }),
    )
}
