pub mod batch;
pub mod canonical;
pub mod corpus;
pub mod fetcher;
pub mod merger;
pub mod parser;

pub use batch::{BatchExecutor, BatchReport};
pub use canonical::CanonicalVerseSync;
pub use corpus::{CorpusBook, CorpusReader};
pub use fetcher::{FetchError, FetcherSettings, FixedDelay, TranslationFetcher};
pub use merger::{MergeReport, TranslationMerger};
pub use parser::VerseLineParser;
