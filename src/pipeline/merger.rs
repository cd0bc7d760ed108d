use std::collections::HashMap;

use anyhow::{Context, Result};
use rusqlite::params;
use tracing::{debug, warn};

use crate::error::PipelineError;
use crate::model::{BookRow, ParsedVerseRecord, TranslationEntry, TranslationRow};
use crate::pipeline::BatchExecutor;
use crate::pipeline::canonical::canonical_count_for_book;
use crate::store::Store;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub entries: usize,
    pub written: usize,
    /// Entries with no canonical verse to attach to.
    pub dropped: usize,
    pub failed: usize,
    pub failed_batches: usize,
}

impl MergeReport {
    pub fn merge(&mut self, other: MergeReport) {
        self.entries += other.entries;
        self.written += other.written;
        self.dropped += other.dropped;
        self.failed += other.failed;
        self.failed_batches += other.failed_batches;
    }
}

/// Attaches translation text to canonical verses of one book. Ids are always
/// looked up from the store, never carried over from the canonical pass.
pub struct TranslationMerger<'a> {
    store: &'a Store,
    book: &'a BookRow,
    translation: &'a TranslationRow,
    executor: BatchExecutor,
}

impl<'a> TranslationMerger<'a> {
    /// Fails when the book has no canonical verses at all, since every entry
    /// would be dropped.
    pub fn for_book(
        store: &'a Store,
        book: &'a BookRow,
        translation: &'a TranslationRow,
        batch_size: usize,
    ) -> Result<Self> {
        let executor = BatchExecutor::new(batch_size)?;
        if canonical_count_for_book(store, book.id)? == 0 {
            return Err(PipelineError::CanonicalVersesMissing(book.abbr.clone()).into());
        }

        Ok(Self {
            store,
            book,
            translation,
            executor,
        })
    }

    pub fn merge_chapter(&self, chapter: u32, entries: &[TranslationEntry]) -> MergeReport {
        let mut report = MergeReport {
            entries: entries.len(),
            ..MergeReport::default()
        };

        let verse_ids = match self.chapter_verse_ids(chapter) {
            Ok(ids) => ids,
            Err(err) => {
                warn!(
                    book = %self.book.abbr,
                    chapter,
                    error = %format!("{err:#}"),
                    "canonical lookup failed; chapter not merged"
                );
                report.failed = entries.len();
                report.failed_batches = 1;
                return report;
            }
        };

        let mut rows = Vec::with_capacity(entries.len());
        for entry in entries {
            match verse_ids.get(&entry.verse) {
                Some(&verse_id) => rows.push((verse_id, entry.text.as_str())),
                None => report.dropped += 1,
            }
        }

        if report.dropped > 0 {
            debug!(
                book = %self.book.abbr,
                chapter,
                dropped = report.dropped,
                "entries without canonical verse dropped"
            );
        }

        let label = format!(
            "translation:{}:{}:{}",
            self.translation.code, self.book.abbr, chapter
        );
        let batches = self
            .executor
            .run(&label, &rows, |group| self.upsert_batch(group));
        report.written = batches.processed;
        report.failed = batches.failed_items;
        report.failed_batches = batches.failed_batches;

        report
    }

    /// Groups corpus records by chapter, in first-seen order, and merges each
    /// chapter against the store.
    pub fn merge_records(&self, records: &[ParsedVerseRecord]) -> MergeReport {
        let mut chapters: Vec<(u32, Vec<TranslationEntry>)> = Vec::new();
        let mut index_by_chapter = HashMap::new();

        for record in records {
            let slot = *index_by_chapter.entry(record.chapter).or_insert_with(|| {
                chapters.push((record.chapter, Vec::new()));
                chapters.len() - 1
            });
            chapters[slot].1.push(TranslationEntry {
                verse: record.verse,
                text: record.text.clone(),
            });
        }

        let mut report = MergeReport::default();
        for (chapter, entries) in &chapters {
            report.merge(self.merge_chapter(*chapter, entries));
        }
        report
    }

    fn chapter_verse_ids(&self, chapter: u32) -> Result<HashMap<u32, i64>> {
        let mut statement = self
            .store
            .connection()
            .prepare_cached("SELECT verse, id FROM verses WHERE book_id = ?1 AND chapter = ?2")?;
        let mut rows = statement.query(params![self.book.id, chapter])?;

        let mut ids = HashMap::new();
        while let Some(row) = rows.next()? {
            ids.insert(row.get::<_, u32>(0)?, row.get::<_, i64>(1)?);
        }
        Ok(ids)
    }

    fn upsert_batch(&self, rows: &[(i64, &str)]) -> Result<usize> {
        let tx = self
            .store
            .connection()
            .unchecked_transaction()
            .context("failed to begin translation batch")?;

        {
            let mut statement = tx.prepare(
                "
                INSERT INTO verse_translations(verse_id, translation_id, text)
                VALUES(?1, ?2, ?3)
                ON CONFLICT(verse_id, translation_id) DO UPDATE SET
                  text=excluded.text
                ",
            )?;
            for (verse_id, text) in rows {
                statement
                    .execute(params![verse_id, self.translation.id, text])
                    .with_context(|| format!("failed to upsert translation for verse id {verse_id}"))?;
            }
        }

        tx.commit().context("failed to commit translation batch")?;
        Ok(rows.len())
    }
}
