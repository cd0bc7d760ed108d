use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::error::PipelineError;
use crate::model::ParsedVerseRecord;
use crate::pipeline::VerseLineParser;
use crate::registry::{BookEntry, BookRegistry};
use crate::util::sha256_hex;

#[derive(Debug, Error)]
pub enum CorpusFileError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{} is not valid {encoding}", path.display())]
    Decode {
        path: PathBuf,
        encoding: &'static str,
    },
}

impl CorpusFileError {
    pub fn path(&self) -> &Path {
        match self {
            Self::Read { path, .. } | Self::Decode { path, .. } => path,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CorpusFile {
    pub entry: &'static BookEntry,
    pub path: PathBuf,
}

#[derive(Debug)]
pub struct CorpusBook {
    pub entry: &'static BookEntry,
    pub path: PathBuf,
    pub sha256: String,
    pub records: Vec<ParsedVerseRecord>,
    pub skipped_lines: usize,
}

impl CorpusBook {
    pub fn filename(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Yields one parsed book per corpus file, in book-code order.
pub struct CorpusReader {
    files: std::vec::IntoIter<CorpusFile>,
    encoding: &'static Encoding,
    parser: VerseLineParser,
}

impl CorpusReader {
    /// Discovers book files under `root` and resolves every embedded code
    /// before any file is read, so an unknown code aborts the run up front.
    pub fn open(
        root: &Path,
        encoding: &'static Encoding,
        registry: &BookRegistry,
        only: &[&'static BookEntry],
    ) -> Result<Self> {
        let files = discover_book_files(root, registry)?;
        let files: Vec<CorpusFile> = if only.is_empty() {
            files
        } else {
            files
                .into_iter()
                .filter(|file| only.iter().any(|entry| entry.code == file.entry.code))
                .collect()
        };

        Ok(Self {
            files: files.into_iter(),
            encoding,
            parser: VerseLineParser::new()?,
        })
    }

    pub fn remaining(&self) -> usize {
        self.files.len()
    }

    pub fn pending_books(&self) -> Vec<&'static BookEntry> {
        self.files.as_slice().iter().map(|file| file.entry).collect()
    }

    fn read_book(&self, file: CorpusFile) -> Result<CorpusBook, CorpusFileError> {
        let raw = fs::read(&file.path).map_err(|source| CorpusFileError::Read {
            path: file.path.clone(),
            source,
        })?;

        let (decoded, had_errors) = self.encoding.decode_without_bom_handling(&raw);
        if had_errors {
            return Err(CorpusFileError::Decode {
                path: file.path,
                encoding: self.encoding.name(),
            });
        }

        let mut records = Vec::new();
        let mut skipped_lines = 0;
        for line in decoded.lines() {
            match self.parser.parse(line) {
                Some(record) => records.push(record),
                None if !line.trim().is_empty() => skipped_lines += 1,
                None => {}
            }
        }

        Ok(CorpusBook {
            entry: file.entry,
            sha256: sha256_hex(&raw),
            path: file.path,
            records,
            skipped_lines,
        })
    }
}

impl Iterator for CorpusReader {
    type Item = Result<CorpusBook, CorpusFileError>;

    fn next(&mut self) -> Option<Self::Item> {
        let file = self.files.next()?;
        Some(self.read_book(file))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.files.size_hint()
    }
}

pub fn discover_book_files(root: &Path, registry: &BookRegistry) -> Result<Vec<CorpusFile>> {
    // Codes lead the filename; the registry decides whether one is real.
    let code_regex = Regex::new(r"^(\d+-\d+)").context("failed to compile book code regex")?;

    let entries =
        fs::read_dir(root).with_context(|| format!("failed to read {}", root.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read entry in {}", root.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            continue;
        }

        let filename = entry.file_name().to_string_lossy().into_owned();
        let Some(code) = code_regex.captures(&filename).and_then(|c| c.get(1)) else {
            debug!(path = %path.display(), "ignoring file without book code");
            continue;
        };

        let book = registry.by_code(code.as_str())?;
        files.push(CorpusFile { entry: book, path });
    }

    if files.is_empty() {
        return Err(PipelineError::EmptyCorpus(root.to_path_buf()).into());
    }

    files.sort_by(|a, b| a.entry.code.cmp(b.entry.code).then(a.path.cmp(&b.path)));
    Ok(files)
}
