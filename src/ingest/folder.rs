//! Folder ingestor - the bundled implementation of the digest service

use std::fs;
use std::path::Path;

use rayon::prelude::*;

use super::encoding::looks_binary;
use super::tree::render_tree;
use super::walker::{collect_files, WalkedFile};
use super::{
    estimate_tokens, format_size, format_tokens, DigestOutput, DigestRequest, IngestError,
    IngestOptions, Ingestor,
};

const SEPARATOR: &str = "================================================";

/// Walks a local folder and writes summary, tree and file contents
pub struct FolderIngestor {
    options: IngestOptions,
}

impl FolderIngestor {
    pub fn new(options: IngestOptions) -> Self {
        Self { options }
    }

    /// Produce the text block for one file
    fn render_file(&self, file: &WalkedFile) -> String {
        let display = file.relative.to_string_lossy().replace('\\', "/");
        let body = self.read_text(file);

        let mut block = String::with_capacity(body.len() + 128);
        block.push_str(SEPARATOR);
        block.push('\n');
        block.push_str(&format!("FILE: {display}\n"));
        block.push_str(SEPARATOR);
        block.push('\n');
        block.push_str(&body);
        if !body.ends_with('\n') {
            block.push('\n');
        }
        block.push('\n');
        block
    }

    fn read_text(&self, file: &WalkedFile) -> String {
        if file.size > self.options.max_file_size {
            return format!("[File too large: {} bytes]", file.size);
        }

        match fs::read(&file.path) {
            Ok(bytes) if looks_binary(&bytes) => "[Binary file]".to_string(),
            Ok(bytes) => {
                let (text, encoding) = self.options.encodings.decode(&bytes);
                log::debug!("Decoded {} as {}", file.path.display(), encoding);
                text
            }
            Err(e) => {
                log::warn!("Failed to read {}: {}", file.path.display(), e);
                format!("[Error reading file: {}]", e)
            }
        }
    }
}

impl Ingestor for FolderIngestor {
    fn ingest(
        &self,
        request: &DigestRequest,
        status: &dyn Fn(String),
    ) -> Result<DigestOutput, IngestError> {
        let root = request.source.as_path();
        let metadata = fs::metadata(root).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => IngestError::SourceMissing(root.to_path_buf()),
            _ => IngestError::Read {
                path: root.to_path_buf(),
                source: e,
            },
        })?;
        if !metadata.is_dir() {
            return Err(IngestError::NotADirectory(root.to_path_buf()));
        }

        status(format!("Scanning {}", root.display()));
        let files = collect_files(root, &self.options, &request.output);
        status(format!("Found {} files", files.len()));
        log::info!("Ingesting {} files from {}", files.len(), root.display());

        // par_iter keeps the walk order when collecting
        let blocks: Vec<String> = files.par_iter().map(|f| self.render_file(f)).collect();
        let content = blocks.concat();

        let root_name = display_name(root);
        let tree = render_tree(&root_name, files.iter().map(|f| f.relative.as_path()));

        let total_size: u64 = files.iter().map(|f| f.size).sum();
        let tokens = estimate_tokens(&tree) + estimate_tokens(&content);
        let summary = format!(
            "Directory: {}\nFiles analyzed: {}\nTotal size: {}\n\nEstimated tokens: {}",
            root_name,
            files.len(),
            format_size(total_size),
            format_tokens(tokens)
        );

        let output = DigestOutput {
            summary,
            tree,
            content,
        };

        status("Writing digest".to_string());
        write_digest(&request.output, &output)?;
        log::info!("Digest written to {}", request.output.display());

        Ok(output)
    }
}

fn display_name(root: &Path) -> String {
    root.canonicalize()
        .ok()
        .as_deref()
        .and_then(Path::file_name)
        .or_else(|| root.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string())
}

/// Persist the combined digest; an existing file is overwritten
fn write_digest(path: &Path, output: &DigestOutput) -> Result<(), IngestError> {
    let combined = format!("{}\n\n{}\n{}", output.summary, output.tree, output.content);
    fs::write(path, combined).map_err(|e| IngestError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::PathBuf;

    fn sample_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join("src")).unwrap();
        fs::write(root.join("src/lib.rs"), "pub fn answer() -> u32 { 42 }\n").unwrap();
        fs::write(root.join("notes.txt"), [0x63, 0x61, 0x66, 0xE9]).unwrap();
        fs::write(root.join("logo.png"), [0x89, b'P', b'N', b'G', 0x00, 0x01]).unwrap();
        dir
    }

    #[test]
    fn test_ingest_writes_digest() {
        let src = sample_tree();
        let out_dir = tempfile::tempdir().unwrap();
        let output = out_dir.path().join("digest.txt");
        let request = DigestRequest::new(src.path(), &output);

        let ingestor = FolderIngestor::new(IngestOptions::default());
        let lines = RefCell::new(Vec::new());
        let result = ingestor
            .ingest(&request, &|line| lines.borrow_mut().push(line))
            .unwrap();

        assert!(result.summary.contains("Files analyzed: 3"));
        assert!(result.summary.contains("Estimated tokens:"));
        assert!(result.tree.contains("└── lib.rs"));
        assert!(result.content.contains("FILE: src/lib.rs"));
        assert!(result.content.contains("pub fn answer()"));
        assert!(result.content.contains("café"));
        assert!(result.content.contains("[Binary file]"));

        let written = fs::read_to_string(&output).unwrap();
        assert!(written.starts_with("Directory: "));
        assert!(written.contains(&result.tree));
        assert!(written.ends_with(&result.content));

        let lines = lines.into_inner();
        assert!(lines[0].starts_with("Scanning "));
        assert_eq!(lines[1], "Found 3 files");
        assert_eq!(lines.last().unwrap(), "Writing digest");
    }

    #[test]
    fn test_large_files_are_skipped() {
        let src = sample_tree();
        let output = src.path().join("digest.txt");
        let options = IngestOptions {
            max_file_size: 8,
            ..IngestOptions::default()
        };

        let result = FolderIngestor::new(options)
            .ingest(&DigestRequest::new(src.path(), &output), &|_| {})
            .unwrap();
        assert!(result.content.contains("[File too large: 30 bytes]"));
        assert!(!result.content.contains("FILE: digest.txt"));
    }

    #[test]
    fn test_second_run_overwrites() {
        let src = sample_tree();
        let output = src.path().join("digest.txt");
        let ingestor = FolderIngestor::new(IngestOptions::default());
        let request = DigestRequest::new(src.path(), &output);

        ingestor.ingest(&request, &|_| {}).unwrap();
        fs::write(src.path().join("extra.md"), "more").unwrap();
        ingestor.ingest(&request, &|_| {}).unwrap();

        let written = fs::read_to_string(&output).unwrap();
        assert!(written.contains("Files analyzed: 4"));
        assert_eq!(written.matches("Directory structure:").count(), 1);
    }

    #[test]
    fn test_missing_source() {
        let err = FolderIngestor::new(IngestOptions::default())
            .ingest(
                &DigestRequest::new("/definitely/not/here", "/tmp/out.txt"),
                &|_| {},
            )
            .unwrap_err();
        assert!(matches!(err, IngestError::SourceMissing(_)));
    }

    #[test]
    fn test_source_must_be_directory() {
        let src = sample_tree();
        let file = src.path().join("notes.txt");
        let err = FolderIngestor::new(IngestOptions::default())
            .ingest(&DigestRequest::new(&file, src.path().join("o.txt")), &|_| {})
            .unwrap_err();
        assert!(matches!(err, IngestError::NotADirectory(_)));
    }

    #[test]
    fn test_unwritable_output_is_reported() {
        let src = sample_tree();
        let output: PathBuf = src.path().join("missing-dir").join("digest.txt");
        let err = FolderIngestor::new(IngestOptions::default())
            .ingest(&DigestRequest::new(src.path(), &output), &|_| {})
            .unwrap_err();
        assert!(matches!(err, IngestError::Write { .. }));
        assert!(!output.exists());
    }
}
