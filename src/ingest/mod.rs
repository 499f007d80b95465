//! Ingest module - Folder-to-text digest service
//!
//! The rest of the application only talks to the [`Ingestor`] trait.
//! [`FolderIngestor`] is the bundled implementation: traversal and gitignore
//! matching come from the `ignore` crate, decoding from `encoding_rs`.

mod encoding;
mod folder;
mod tree;
mod walker;

use std::path::PathBuf;

use thiserror::Error;

pub use encoding::EncodingPolicy;
pub use folder::FolderIngestor;

/// Default upper bound for a single file's content in the digest
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// A validated request to digest one folder into one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestRequest {
    pub source: PathBuf,
    pub output: PathBuf,
}

impl DigestRequest {
    pub fn new(source: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            output: output.into(),
        }
    }
}

/// The three parts of a digest, as returned by the service
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DigestOutput {
    pub summary: String,
    pub tree: String,
    pub content: String,
}

/// Options fixed at startup and handed to the ingestor
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub encodings: EncodingPolicy,
    pub max_file_size: u64,
    pub include_hidden: bool,
    pub respect_gitignore: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            encodings: EncodingPolicy::default(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            include_hidden: false,
            respect_gitignore: true,
        }
    }
}

/// Everything that can go wrong inside a single ingestion call
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Source path does not exist: {0}")]
    SourceMissing(PathBuf),

    #[error("Source path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write digest to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The single call contract of the ingestion service.
///
/// `status` receives human-readable progress lines while the call runs.
/// Implementations persist the combined digest to `request.output` before
/// returning `Ok`.
pub trait Ingestor: Send + Sync {
    fn ingest(
        &self,
        request: &DigestRequest,
        status: &dyn Fn(String),
    ) -> Result<DigestOutput, IngestError>;
}

/// Format bytes into human-readable size
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Rough token count: one token per four characters
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Compact token count, e.g. `950`, `1.2k`, `3.4M`
pub fn format_tokens(tokens: usize) -> String {
    if tokens >= 1_000_000 {
        format!("{:.1}M", tokens as f64 / 1_000_000.0)
    } else if tokens >= 1_000 {
        format!("{:.1}k", tokens as f64 / 1_000.0)
    } else {
        tokens.to_string()
    }
}
