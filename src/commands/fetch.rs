use anyhow::Result;
use tracing::{debug, info, warn};

use crate::cli::FetchArgs;
use crate::config::FetchConfig;
use crate::error::PipelineError;
use crate::model::{BookRow, BookSyncOutcome, SyncRunReport, TranslationEntry};
use crate::pipeline::{FetchError, FixedDelay, MergeReport, TranslationFetcher, TranslationMerger};
use crate::registry::{BookEntry, BookRegistry};
use crate::store::Store;

use super::{finish_report, prepare_store, start_report};

pub fn run(args: FetchArgs) -> Result<()> {
    let registry = BookRegistry;
    let config = FetchConfig::from_args(&args, &registry)?;

    info!(
        provider = %config.provider.base_url,
        provider_translation = %config.provider.provider_code,
        translation = %config.sync.translation_code,
        books = config.sync.books.len(),
        request_delay_ms = config.request_delay.as_millis() as u64,
        "starting translation fetch"
    );

    let store = prepare_store(&config.sync.db_path)?;
    let fetcher = TranslationFetcher::new(
        config.provider.clone(),
        Box::new(FixedDelay::new(config.request_delay)),
    )?;
    let mut report = fetch_translations(&config, &store, &fetcher)?;
    finish_report(&mut report, config.sync.report_path.as_deref())
}

/// Fetches every selected chapter and merges it into the store. Provider
/// failures are counted per chapter and never abort the run. A selected book
/// without canonical verses aborts it before the first request.
pub(crate) fn fetch_translations(
    config: &FetchConfig,
    store: &Store,
    fetcher: &TranslationFetcher,
) -> Result<SyncRunReport> {
    let mut report = start_report("fetch", &config.sync);
    let translation = store.translation_by_code(&config.sync.translation_code)?;
    info!(
        translation = %translation.code,
        name = %translation.name,
        "fetching translation text"
    );

    let mut book_rows = Vec::with_capacity(config.sync.books.len());
    for entry in &config.sync.books {
        let book_row = store.book_by_abbr(entry.abbr)?;
        // The provider addresses books by canonical order; the seeded row must agree.
        if BookRegistry.by_ordinal(book_row.book_order)?.code != entry.code {
            return Err(PipelineError::InvalidConfig(format!(
                "book {} is seeded with order {} which belongs to another book; re-run `init`",
                book_row.abbr, book_row.book_order
            ))
            .into());
        }
        book_rows.push((*entry, book_row));
    }

    let mut mergers = Vec::with_capacity(book_rows.len());
    for (entry, book_row) in &book_rows {
        let merger = TranslationMerger::for_book(
            store,
            book_row,
            &translation,
            config.sync.translation_batch_size,
        )?;
        mergers.push((*entry, book_row, merger));
    }

    for (entry, book_row, merger) in &mergers {
        let outcome = fetch_book(config, fetcher, merger, book_row, *entry);
        if outcome.status != "completed" {
            report.warnings.push(format!(
                "{}: {} (chapters fetched {}, fetch failures {}, written {}, dropped {}, failed {})",
                outcome.abbr,
                outcome.status,
                outcome.chapters_fetched,
                outcome.fetch_failures,
                outcome.translations_written,
                outcome.translations_dropped,
                outcome.translations_failed
            ));
        }
        report.totals.absorb(&outcome);
        report.books.push(outcome);
    }

    Ok(report)
}

fn fetch_book(
    config: &FetchConfig,
    fetcher: &TranslationFetcher,
    merger: &TranslationMerger<'_>,
    book_row: &BookRow,
    entry: &'static BookEntry,
) -> BookSyncOutcome {
    let mut outcome = BookSyncOutcome {
        abbr: entry.abbr.to_string(),
        ..BookSyncOutcome::default()
    };
    let mut merged = MergeReport::default();

    let chapters = config.chapters_for(entry);
    debug!(
        book = entry.abbr,
        name = %book_row.name_ko,
        selected = chapters.len(),
        total = book_row.chapters,
        "fetching book"
    );

    for chapter in chapters {
        let verses = match fetcher.fetch_chapter(book_row.book_order, chapter) {
            Ok(verses) => verses,
            Err(FetchError::NoData { url }) => {
                warn!(book = entry.abbr, chapter, url = %url, "provider returned no data");
                outcome.fetch_failures += 1;
                continue;
            }
            Err(err) => {
                warn!(book = entry.abbr, chapter, error = %err, "chapter fetch failed");
                outcome.fetch_failures += 1;
                continue;
            }
        };

        outcome.chapters_fetched += 1;
        outcome.parsed_records += verses.len();
        let entries: Vec<TranslationEntry> = verses.into_iter().map(TranslationEntry::from).collect();
        let chapter_report = merger.merge_chapter(chapter, &entries);
        info!(
            book = entry.abbr,
            chapter,
            entries = chapter_report.entries,
            written = chapter_report.written,
            dropped = chapter_report.dropped,
            failed = chapter_report.failed,
            "chapter merged"
        );
        merged.merge(chapter_report);
    }

    outcome.translations_written = merged.written;
    outcome.translations_dropped = merged.dropped;
    outcome.translations_failed = merged.failed;

    outcome.status = if merged.written == 0 {
        warn!(book = entry.abbr, "no translation rows written for book");
        "empty"
    } else if outcome.fetch_failures > 0 || merged.dropped > 0 || merged.failed > 0 {
        "partial"
    } else {
        "completed"
    }
    .to_string();

    info!(
        book = entry.abbr,
        chapters_fetched = outcome.chapters_fetched,
        fetch_failures = outcome.fetch_failures,
        written = outcome.translations_written,
        dropped = outcome.translations_dropped,
        status = %outcome.status,
        "book fetched"
    );

    outcome
}
