//! Turning a folder of PDFs into chunk texts.
//!
//! Discovery is non-recursive: only `*.pdf` files directly inside the given
//! folder are considered, sorted so the resulting chunk sequence does not
//! depend on directory iteration order. A parse failure aborts the whole
//! ingestion with an explicit error; it is never masked as an empty result.

use crate::chunking::split_into_chunks;
use crate::config::ChunkingOptions;
use crate::error::IngestError;
use crate::extractor::{LopdfExtractor, PdfExtractor};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub fn discover_pdf_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .max_depth(1)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let is_pdf = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        if is_pdf {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

pub fn digest_file(path: &Path) -> Result<String, IngestError> {
    let bytes = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

#[derive(Debug, Clone)]
pub struct IngestedFile {
    pub path: PathBuf,
    pub checksum: String,
    pub chunk_count: usize,
    pub ingested_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct IngestionReport {
    pub files: Vec<IngestedFile>,
    /// All chunk texts across all files, in split-sequence order.
    pub chunks: Vec<String>,
}

/// Extracts and splits every PDF directly inside `folder`.
pub fn chunk_pdf_folder(
    folder: &Path,
    options: &ChunkingOptions,
) -> Result<IngestionReport, IngestError> {
    let paths = discover_pdf_files(folder);
    if paths.is_empty() {
        return Err(IngestError::NoDocuments(folder.display().to_string()));
    }

    let extractor = LopdfExtractor;
    let mut files = Vec::with_capacity(paths.len());
    let mut chunks = Vec::new();

    for path in paths {
        path.file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| IngestError::MissingFileName(path.display().to_string()))?;

        let checksum = digest_file(&path)?;
        let pages = extractor.extract_pages(&path)?;

        let text = pages
            .iter()
            .map(|page| page.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let file_chunks = split_into_chunks(&text, options)?;

        files.push(IngestedFile {
            path,
            checksum,
            chunk_count: file_chunks.len(),
            ingested_at: Utc::now(),
        });
        chunks.extend(file_chunks);
    }

    Ok(IngestionReport { files, chunks })
}
