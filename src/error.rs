use std::path::PathBuf;

use thiserror::Error;

/// Errors that make a run impossible to complete. These cross component
/// boundaries and abort the command; everything per-line, per-chapter and
/// per-batch is absorbed where it happens.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("unknown book code: {0}")]
    UnknownBookCode(String),

    #[error("unknown book abbreviation: {0}")]
    UnknownBookAbbr(String),

    #[error("book ordinal out of range (1-66): {0}")]
    UnknownOrdinal(u32),

    #[error("book {0} is not seeded in the store; run `init` first")]
    BookNotSeeded(String),

    #[error("translation {0} is not seeded in the store; run `init` first")]
    TranslationNotSeeded(String),

    #[error("no canonical verses exist for book {0}; run `import` before attaching translations")]
    CanonicalVersesMissing(String),

    #[error("no book files found under {}", .0.display())]
    EmptyCorpus(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
