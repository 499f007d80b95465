//! Native file dialogs behind a trait so the window logic can be tested.

use std::path::{Path, PathBuf};

use rfd::FileDialog;

pub trait DialogService {
    /// Ask for the folder to digest
    fn pick_folder(&self) -> Option<PathBuf>;

    /// Ask where to save the digest, starting from `suggested`
    fn pick_output(&self, suggested: &Path) -> Option<PathBuf>;
}

/// Production implementation backed by `rfd`
pub struct NativeDialogs;

impl DialogService for NativeDialogs {
    fn pick_folder(&self) -> Option<PathBuf> {
        FileDialog::new()
            .set_title("Select Folder to Digest")
            .pick_folder()
    }

    fn pick_output(&self, suggested: &Path) -> Option<PathBuf> {
        let mut dialog = FileDialog::new()
            .set_title("Save Digest As")
            .add_filter("Text files", &["txt"])
            .add_filter("All files", &["*"]);

        if let Some(name) = suggested.file_name() {
            dialog = dialog.set_file_name(name.to_string_lossy());
        }
        if let Some(dir) = suggested.parent().filter(|d| d.is_dir()) {
            dialog = dialog.set_directory(dir);
        } else if let Some(docs) = dirs::document_dir() {
            dialog = dialog.set_directory(docs);
        }

        dialog.save_file()
    }
}
