//! GUI module - Application state and UI rendering
//!
//! This module contains the main window: input validation, the single
//! in-flight digest job, the status log and the result dialogs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use eframe::egui;
use thiserror::Error;

use crate::config::{AppSettings, DEFAULT_OUTPUT};
use crate::dialogs::{DialogService, NativeDialogs};
use crate::ingest::{DigestOutput, DigestRequest, Ingestor};
use crate::job::{JobEvent, JobRunner, JobState};

const BANNER: &str = "============================================================";

/// Input problems caught before any job is started
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please select a folder to digest.")]
    NoFolder,
    #[error("The selected folder does not exist.")]
    InvalidFolder,
    #[error("Please specify an output file.")]
    NoOutput,
}

impl ValidationError {
    pub fn title(&self) -> &'static str {
        match self {
            Self::NoFolder => "No Folder",
            Self::InvalidFolder => "Invalid Folder",
            Self::NoOutput => "No Output",
        }
    }

    fn to_dialog(&self) -> Dialog {
        let title = self.title().to_string();
        let message = self.to_string();
        match self {
            Self::InvalidFolder => Dialog::Error { title, message },
            Self::NoFolder | Self::NoOutput => Dialog::Warning { title, message },
        }
    }
}

/// Check the raw text inputs and build a request from them
pub fn validate_inputs(folder: &str, output: &str) -> Result<DigestRequest, ValidationError> {
    let folder = folder.trim();
    let output = output.trim();

    if folder.is_empty() {
        return Err(ValidationError::NoFolder);
    }
    if !Path::new(folder).exists() {
        return Err(ValidationError::InvalidFolder);
    }
    if output.is_empty() {
        return Err(ValidationError::NoOutput);
    }

    Ok(DigestRequest::new(folder, output))
}

/// `<parent>/<name>_digest.txt` next to the chosen folder
pub fn default_output_for(folder: &Path) -> PathBuf {
    let name = folder
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "folder".to_string());
    let file = format!("{}_digest.txt", name);
    match folder.parent() {
        Some(parent) => parent.join(file),
        None => PathBuf::from(file),
    }
}

/// Modal dialog currently shown on top of the window
#[derive(Debug, Clone, PartialEq, Eq)]
enum Dialog {
    Warning { title: String, message: String },
    Error { title: String, message: String },
    Success { output: PathBuf },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Progress {
    Idle,
    Indeterminate,
    Complete,
}

/// Application state
pub struct DigestApp {
    folder_input: String,
    output_input: String,
    runner: JobRunner,
    progress: Progress,
    status_log: Vec<String>,
    dialog: Option<Dialog>,
    /// Destination of the job in flight, echoed by the success dialog
    current_output: Option<PathBuf>,
    dialogs: Box<dyn DialogService>,
    settings: AppSettings,
    settings_path: Option<PathBuf>,
}

impl DigestApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        settings: AppSettings,
        settings_path: Option<PathBuf>,
        ingestor: Arc<dyn Ingestor>,
    ) -> Self {
        let ctx = cc.egui_ctx.clone();
        let runner = JobRunner::new(ingestor, Arc::new(move || ctx.request_repaint()));
        Self::with_parts(settings, settings_path, runner, Box::new(NativeDialogs))
    }

    fn with_parts(
        settings: AppSettings,
        settings_path: Option<PathBuf>,
        runner: JobRunner,
        dialogs: Box<dyn DialogService>,
    ) -> Self {
        let folder_input = settings
            .last_folder
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let output_input = settings
            .last_output
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| DEFAULT_OUTPUT.to_string());

        let mut app = Self {
            folder_input,
            output_input,
            runner,
            progress: Progress::Idle,
            status_log: Vec::new(),
            dialog: None,
            current_output: None,
            dialogs,
            settings,
            settings_path,
        };
        app.show_instructions();
        app
    }

    fn show_instructions(&mut self) {
        self.status_log.extend(
            [
                "Ready to process a folder.",
                "",
                "Instructions:",
                "1. Click 'Browse...' to select a folder",
                "2. Choose output file location (optional)",
                "3. Click 'Create Digest' to start",
            ]
            .map(String::from),
        );
    }

    fn push_status(&mut self, line: impl AsRef<str>) {
        let stamp = chrono::Local::now().format("%H:%M:%S");
        self.status_log.push(format!("[{}] {}", stamp, line.as_ref()));
    }

    /// The trigger is only usable while no job is in flight
    fn trigger_enabled(&self) -> bool {
        self.runner.state() != JobState::Running
    }

    fn browse_folder(&mut self) {
        if let Some(folder) = self.dialogs.pick_folder() {
            self.output_input = default_output_for(&folder).display().to_string();
            self.folder_input = folder.display().to_string();
        }
    }

    fn browse_output(&mut self) {
        let suggested = PathBuf::from(self.output_input.trim());
        if let Some(file) = self.dialogs.pick_output(&suggested) {
            self.output_input = file.display().to_string();
        }
    }

    fn start_digest(&mut self) {
        if !self.trigger_enabled() {
            return;
        }

        let request = match validate_inputs(&self.folder_input, &self.output_input) {
            Ok(request) => request,
            Err(e) => {
                log::warn!("Rejected digest request: {}", e);
                self.dialog = Some(e.to_dialog());
                return;
            }
        };

        self.status_log.clear();
        self.progress = Progress::Indeterminate;
        self.remember_paths(&request);
        self.current_output = Some(request.output.clone());

        if let Err(e) = self.runner.start(request) {
            self.progress = Progress::Idle;
            self.current_output = None;
            self.push_status(format!("Error: {}", e));
            self.dialog = Some(Dialog::Error {
                title: "Error".to_string(),
                message: format!("Failed to create digest:\n\n{}", e),
            });
        }
    }

    fn remember_paths(&mut self, request: &DigestRequest) {
        self.settings.last_folder = Some(request.source.clone());
        self.settings.last_output = Some(request.output.clone());
        if let Some(path) = &self.settings_path {
            if let Err(e) = self.settings.save(path) {
                log::warn!("Failed to save settings to {}: {}", path.display(), e);
            }
        }
    }

    /// Apply everything the worker reported since the last frame
    fn process_job_events(&mut self) {
        for event in self.runner.poll() {
            match event {
                JobEvent::Status(line) => self.push_status(line),
                JobEvent::Completed(output) => self.on_completed(output),
                JobEvent::Failed(reason) => self.on_failed(reason),
            }
        }
    }

    fn on_completed(&mut self, output: DigestOutput) {
        let destination = self.current_output.take().unwrap_or_default();

        self.status_log.push(BANNER.to_string());
        self.status_log.push("SUMMARY".to_string());
        self.status_log.push(BANNER.to_string());
        self.status_log.extend(output.summary.lines().map(String::from));
        self.status_log.push(String::new());
        self.push_status("Digest completed successfully!");
        self.push_status(format!("Saved to: {}", destination.display()));

        self.progress = Progress::Complete;
        self.dialog = Some(Dialog::Success {
            output: destination,
        });
    }

    fn on_failed(&mut self, reason: String) {
        self.current_output = None;
        self.progress = Progress::Idle;
        self.push_status(format!("Error: {}", reason));
        self.dialog = Some(Dialog::Error {
            title: "Error".to_string(),
            message: format!("Failed to create digest:\n\n{}", reason),
        });
    }

    fn dismiss_dialog(&mut self) {
        self.dialog = None;
        self.runner.reset();
    }

    /// Reveal the written digest in the system file browser
    fn open_output_folder(path: &Path) {
        let target = path.parent().filter(|p| !p.as_os_str().is_empty());
        let result = match target {
            Some(parent) => open::that(parent),
            None => open::that("."),
        };
        if let Err(e) = result {
            log::warn!("Failed to open folder for {}: {}", path.display(), e);
        }
    }

    fn render_header(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.heading("Folder Digester");
            ui.label(
                egui::RichText::new("Convert any folder into a prompt-friendly text digest")
                    .small(),
            );
        });
        ui.separator();
    }

    fn render_inputs(&mut self, ui: &mut egui::Ui) {
        let running = self.runner.is_running();

        ui.label(egui::RichText::new("Select Folder to Digest").strong());
        ui.horizontal(|ui| {
            let width = (ui.available_width() - 90.0).max(120.0);
            ui.add_enabled(
                !running,
                egui::TextEdit::singleline(&mut self.folder_input).desired_width(width),
            );
            if ui
                .add_enabled(!running, egui::Button::new("Browse..."))
                .clicked()
            {
                self.browse_folder();
            }
        });

        ui.add_space(6.0);
        ui.label(egui::RichText::new("Output File").strong());
        ui.horizontal(|ui| {
            let width = (ui.available_width() - 90.0).max(120.0);
            ui.add_enabled(
                !running,
                egui::TextEdit::singleline(&mut self.output_input).desired_width(width),
            );
            if ui
                .add_enabled(!running, egui::Button::new("Save As..."))
                .clicked()
            {
                self.browse_output();
            }
        });

        ui.add_space(10.0);
        ui.vertical_centered(|ui| {
            let button = egui::Button::new(egui::RichText::new("Create Digest").strong().size(16.0))
                .min_size(egui::vec2(180.0, 36.0));
            if ui.add_enabled(self.trigger_enabled(), button).clicked() {
                self.start_digest();
            }

            ui.add_space(6.0);
            match self.progress {
                Progress::Idle => {
                    ui.add(egui::ProgressBar::new(0.0).desired_width(300.0));
                }
                Progress::Indeterminate => {
                    ui.add(
                        egui::ProgressBar::new(0.0)
                            .desired_width(300.0)
                            .animate(true)
                            .text("Working..."),
                    );
                }
                Progress::Complete => {
                    ui.add(
                        egui::ProgressBar::new(1.0)
                            .desired_width(300.0)
                            .show_percentage(),
                    );
                }
            }
        });
    }

    fn render_status(&mut self, ui: &mut egui::Ui) {
        ui.add_space(6.0);
        ui.label(egui::RichText::new("Status").strong());
        egui::ScrollArea::vertical()
            .id_salt("status_log")
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                for line in &self.status_log {
                    ui.label(egui::RichText::new(line).monospace().size(11.0));
                }
            });
    }

    fn render_dialog(&mut self, ctx: &egui::Context) {
        let dialog = match self.dialog.clone() {
            Some(d) => d,
            None => return,
        };

        let title = match &dialog {
            Dialog::Warning { title, .. } | Dialog::Error { title, .. } => title.clone(),
            Dialog::Success { .. } => "Success".to_string(),
        };

        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                match &dialog {
                    Dialog::Warning { message, .. } => {
                        ui.label(egui::RichText::new(message).color(egui::Color32::YELLOW));
                    }
                    Dialog::Error { message, .. } => {
                        ui.label(egui::RichText::new(message).color(egui::Color32::RED));
                    }
                    Dialog::Success { output } => {
                        ui.label("Digest created successfully!");
                        ui.add_space(4.0);
                        ui.label("Saved to:");
                        ui.label(egui::RichText::new(output.display().to_string()).monospace());
                    }
                }

                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("OK").clicked() {
                        self.dismiss_dialog();
                    }
                    if let Dialog::Success { output } = &dialog {
                        if ui.button("Open folder").clicked() {
                            Self::open_output_folder(output);
                            self.dismiss_dialog();
                        }
                    }
                });
            });
    }
}

impl eframe::App for DigestApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_job_events();
        if self.runner.is_running() {
            ctx.request_repaint();
        }

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            self.render_header(ui);
        });

        // Everything behind an open dialog is inert until it is dismissed
        let interactive = self.dialog.is_none();
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_enabled_ui(interactive, |ui| {
                self.render_inputs(ui);
                self.render_status(ui);
            });
        });

        self.render_dialog(ctx);
    }
}
