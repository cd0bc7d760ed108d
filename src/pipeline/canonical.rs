use std::collections::{BTreeMap, HashSet};

use anyhow::{Context, Result};
use rusqlite::{OptionalExtension, params};
use tracing::info;

use crate::model::{BookRow, ParsedVerseRecord};
use crate::pipeline::{BatchExecutor, BatchReport};
use crate::store::Store;

pub type VerseKey = (u32, u32);

#[derive(Debug, Default)]
pub struct CanonicalSyncReport {
    pub distinct_keys: usize,
    pub duplicates_collapsed: usize,
    pub inserted: usize,
    /// Ids re-read from the store after each batch, keyed by (chapter, verse).
    pub verse_ids: BTreeMap<VerseKey, i64>,
    pub batches: BatchReport,
}

impl CanonicalSyncReport {
    pub fn resolved(&self) -> usize {
        self.verse_ids.len()
    }

    pub fn failed_keys(&self) -> usize {
        self.batches.failed_items
    }
}

/// Persists (book, chapter, verse) identity rows. Re-running with the same
/// input inserts nothing and resolves the same ids.
pub struct CanonicalVerseSync<'a> {
    store: &'a Store,
    executor: BatchExecutor,
}

struct ResolvedBatch {
    inserted: usize,
    ids: Vec<(VerseKey, i64)>,
}

impl<'a> CanonicalVerseSync<'a> {
    pub fn new(store: &'a Store, batch_size: usize) -> Result<Self> {
        Ok(Self {
            store,
            executor: BatchExecutor::new(batch_size)?,
        })
    }

    pub fn sync_book(&self, book: &BookRow, records: &[ParsedVerseRecord]) -> CanonicalSyncReport {
        let (keys, duplicates_collapsed) = distinct_keys(records);
        let mut report = CanonicalSyncReport {
            distinct_keys: keys.len(),
            duplicates_collapsed,
            ..CanonicalSyncReport::default()
        };

        let label = format!("canonical:{}", book.abbr);
        let mut inserted = 0;
        let mut verse_ids = BTreeMap::new();
        report.batches = self.executor.run(&label, &keys, |group| {
            let resolved = self.upsert_batch(book.id, group)?;
            inserted += resolved.inserted;
            let count = resolved.ids.len();
            verse_ids.extend(resolved.ids);
            Ok(count)
        });
        report.inserted = inserted;
        report.verse_ids = verse_ids;

        info!(
            book = %book.abbr,
            distinct = report.distinct_keys,
            duplicates = report.duplicates_collapsed,
            inserted = report.inserted,
            resolved = report.resolved(),
            failed_batches = report.batches.failed_batches,
            "canonical pass completed"
        );

        report
    }

    /// One transaction per batch: insert missing triples, then read back the
    /// id of every key in the batch, whether it was inserted now or earlier.
    fn upsert_batch(&self, book_id: i64, keys: &[VerseKey]) -> Result<ResolvedBatch> {
        let tx = self
            .store
            .connection()
            .unchecked_transaction()
            .context("failed to begin canonical batch")?;
        let mut inserted = 0;
        let mut ids = Vec::with_capacity(keys.len());

        {
            let mut insert_statement = tx.prepare(
                "
                INSERT INTO verses(book_id, chapter, verse)
                VALUES(?1, ?2, ?3)
                ON CONFLICT(book_id, chapter, verse) DO NOTHING
                ",
            )?;
            for (chapter, verse) in keys {
                inserted += insert_statement
                    .execute(params![book_id, chapter, verse])
                    .with_context(|| format!("failed to upsert verse {chapter}:{verse}"))?;
            }

            let mut select_statement = tx.prepare(
                "SELECT id FROM verses WHERE book_id = ?1 AND chapter = ?2 AND verse = ?3",
            )?;
            for &(chapter, verse) in keys {
                let id: Option<i64> = select_statement
                    .query_row(params![book_id, chapter, verse], |row| row.get(0))
                    .optional()?;
                let id = id.with_context(|| {
                    format!("verse {chapter}:{verse} missing after upsert")
                })?;
                ids.push(((chapter, verse), id));
            }
        }

        tx.commit().context("failed to commit canonical batch")?;
        Ok(ResolvedBatch { inserted, ids })
    }
}

/// Distinct (chapter, verse) keys in first-seen order, plus how many repeats
/// were collapsed.
fn distinct_keys(records: &[ParsedVerseRecord]) -> (Vec<VerseKey>, usize) {
    let mut seen = HashSet::with_capacity(records.len());
    let mut keys = Vec::with_capacity(records.len());
    for record in records {
        if seen.insert((record.chapter, record.verse)) {
            keys.push((record.chapter, record.verse));
        }
    }
    let collapsed = records.len() - keys.len();
    (keys, collapsed)
}

pub fn canonical_count_for_book(store: &Store, book_id: i64) -> Result<i64> {
    let count = store
        .connection()
        .query_row(
            "SELECT COUNT(*) FROM verses WHERE book_id = ?1",
            [book_id],
            |row| row.get(0),
        )
        .context("failed to count canonical verses")?;
    Ok(count)
}
