use serde::{Deserialize, Serialize};

/// One verse line as read from the corpus. Exists only within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedVerseRecord {
    pub chapter: u32,
    pub verse: u32,
    pub text: String,
}

impl ParsedVerseRecord {
    /// Renders the record back into corpus line form, without annotations.
    #[cfg(test)]
    pub fn reference_line(&self, book_prefix: &str) -> String {
        if self.text.is_empty() {
            format!("{}{}:{}", book_prefix, self.chapter, self.verse)
        } else {
            format!("{}{}:{} {}", book_prefix, self.chapter, self.verse, self.text)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookRow {
    pub id: i64,
    pub abbr: String,
    pub name_ko: String,
    pub book_order: u32,
    pub chapters: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRow {
    pub id: i64,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationEntry {
    pub verse: u32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FetchedVerse {
    pub verse: u32,
    pub text: String,
}

impl From<FetchedVerse> for TranslationEntry {
    fn from(value: FetchedVerse) -> Self {
        Self {
            verse: value.verse,
            text: value.text,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusSourceEntry {
    pub code: String,
    pub filename: String,
    pub sha256: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BookSyncOutcome {
    pub abbr: String,
    pub parsed_records: usize,
    pub skipped_lines: usize,
    pub canonical_keys: usize,
    pub canonical_inserted: usize,
    pub canonical_resolved: usize,
    pub canonical_failed: usize,
    pub translations_written: usize,
    pub translations_dropped: usize,
    pub translations_failed: usize,
    pub chapters_fetched: usize,
    pub fetch_failures: usize,
    pub status: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncTotals {
    pub books_processed: usize,
    pub books_skipped: usize,
    pub parsed_records: usize,
    pub skipped_lines: usize,
    pub canonical_inserted: usize,
    pub canonical_resolved: usize,
    pub canonical_failed: usize,
    pub translations_written: usize,
    pub translations_dropped: usize,
    pub translations_failed: usize,
    pub fetch_failures: usize,
}

impl SyncTotals {
    pub fn absorb(&mut self, outcome: &BookSyncOutcome) {
        self.books_processed += 1;
        self.parsed_records += outcome.parsed_records;
        self.skipped_lines += outcome.skipped_lines;
        self.canonical_inserted += outcome.canonical_inserted;
        self.canonical_resolved += outcome.canonical_resolved;
        self.canonical_failed += outcome.canonical_failed;
        self.translations_written += outcome.translations_written;
        self.translations_dropped += outcome.translations_dropped;
        self.translations_failed += outcome.translations_failed;
        self.fetch_failures += outcome.fetch_failures;
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncRunReport {
    pub report_version: u32,
    pub run_id: String,
    pub command: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub db_path: String,
    pub translation_code: String,
    pub totals: SyncTotals,
    pub books: Vec<BookSyncOutcome>,
    pub source_hashes: Vec<CorpusSourceEntry>,
    pub warnings: Vec<String>,
}
