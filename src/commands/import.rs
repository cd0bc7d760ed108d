use anyhow::Result;
use tracing::{info, warn};

use crate::cli::ImportArgs;
use crate::config::ImportConfig;
use crate::error::PipelineError;
use crate::model::{BookSyncOutcome, CorpusSourceEntry, SyncRunReport, TranslationRow};
use crate::pipeline::{CanonicalVerseSync, CorpusBook, CorpusReader, TranslationMerger};
use crate::registry::BookRegistry;
use crate::store::Store;

use super::{finish_report, prepare_store, start_report};

pub fn run(args: ImportArgs) -> Result<()> {
    let registry = BookRegistry;
    let config = ImportConfig::from_args(&args, &registry)?;

    info!(
        corpus_root = %config.corpus_root.display(),
        db_path = %config.sync.db_path.display(),
        translation = %config.sync.translation_code,
        canonical_only = config.canonical_only,
        "starting corpus import"
    );

    let store = prepare_store(&config.sync.db_path)?;
    let mut report = import_corpus(&config, &store, &registry)?;
    finish_report(&mut report, config.sync.report_path.as_deref())
}

pub(crate) fn import_corpus(
    config: &ImportConfig,
    store: &Store,
    registry: &BookRegistry,
) -> Result<SyncRunReport> {
    let mut report = start_report("import", &config.sync);

    let translation = if config.canonical_only {
        None
    } else {
        Some(store.translation_by_code(&config.sync.translation_code)?)
    };

    let reader = CorpusReader::open(
        &config.corpus_root,
        config.encoding,
        registry,
        &config.sync.books,
    )?;
    info!(
        files = reader.remaining(),
        encoding = config.encoding.name(),
        "corpus files discovered"
    );
    if config.sync.books_explicit {
        let pending = reader.pending_books();
        for book in &config.sync.books {
            if !pending.iter().any(|entry| entry.code == book.code) {
                warn!(book = book.abbr, code = book.code, "selected book has no corpus file");
                report
                    .warnings
                    .push(format!("{}: no corpus file for book code {}", book.abbr, book.code));
            }
        }
    }

    let canonical = CanonicalVerseSync::new(store, config.sync.canonical_batch_size)?;

    for item in reader {
        let book = match item {
            Ok(book) => book,
            Err(err) => {
                warn!(
                    path = %err.path().display(),
                    error = %err,
                    "corpus file unreadable; book skipped"
                );
                report.totals.books_skipped += 1;
                report.warnings.push(err.to_string());
                continue;
            }
        };

        report.source_hashes.push(CorpusSourceEntry {
            code: book.entry.code.to_string(),
            filename: book.filename(),
            sha256: book.sha256.clone(),
        });

        let outcome = import_book(
            store,
            &canonical,
            translation.as_ref(),
            config.sync.translation_batch_size,
            &book,
        )?;
        if outcome.status != "completed" {
            report.warnings.push(format!(
                "{}: {} (parsed {}, skipped lines {}, canonical failed {}, dropped {}, failed {})",
                outcome.abbr,
                outcome.status,
                outcome.parsed_records,
                outcome.skipped_lines,
                outcome.canonical_failed,
                outcome.translations_dropped,
                outcome.translations_failed
            ));
        }
        report.totals.absorb(&outcome);
        report.books.push(outcome);
    }

    Ok(report)
}

fn import_book(
    store: &Store,
    canonical: &CanonicalVerseSync<'_>,
    translation: Option<&TranslationRow>,
    translation_batch_size: usize,
    book: &CorpusBook,
) -> Result<BookSyncOutcome> {
    let mut outcome = BookSyncOutcome {
        abbr: book.entry.abbr.to_string(),
        parsed_records: book.records.len(),
        skipped_lines: book.skipped_lines,
        ..BookSyncOutcome::default()
    };

    if book.records.is_empty() {
        warn!(
            book = book.entry.abbr,
            path = %book.path.display(),
            skipped_lines = book.skipped_lines,
            "no verse lines parsed; book produced no rows"
        );
        outcome.status = "empty".to_string();
        return Ok(outcome);
    }

    let book_row = store.book_by_abbr(book.entry.abbr)?;
    let sync = canonical.sync_book(&book_row, &book.records);
    outcome.canonical_keys = sync.distinct_keys;
    outcome.canonical_inserted = sync.inserted;
    outcome.canonical_resolved = sync.resolved();
    outcome.canonical_failed = sync.failed_keys();

    if let Some(translation) = translation {
        match TranslationMerger::for_book(store, &book_row, translation, translation_batch_size) {
            Ok(merger) => {
                let merge = merger.merge_records(&book.records);
                outcome.translations_written = merge.written;
                outcome.translations_dropped = merge.dropped;
                outcome.translations_failed = merge.failed;
            }
            Err(err) if matches!(
                err.downcast_ref::<PipelineError>(),
                Some(PipelineError::CanonicalVersesMissing(_))
            ) =>
            {
                // Every canonical batch failed; those failures are already logged.
                warn!(book = book.entry.abbr, "no canonical verses persisted; translation text not attached");
                outcome.translations_failed = book.records.len();
            }
            Err(err) => return Err(err),
        }
    }

    outcome.status = if outcome.canonical_resolved == 0 {
        "empty"
    } else if outcome.canonical_failed > 0
        || outcome.translations_dropped > 0
        || outcome.translations_failed > 0
    {
        "partial"
    } else {
        "completed"
    }
    .to_string();

    info!(
        book = book.entry.abbr,
        parsed = outcome.parsed_records,
        skipped_lines = outcome.skipped_lines,
        canonical_inserted = outcome.canonical_inserted,
        canonical_resolved = outcome.canonical_resolved,
        written = outcome.translations_written,
        dropped = outcome.translations_dropped,
        status = %outcome.status,
        "book imported"
    );

    Ok(outcome)
}
