pub mod fetch;
pub mod import;
pub mod init;
pub mod verify;


use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};

use crate::config::SyncSettings;
use crate::model::{SyncRunReport, SyncTotals};
use crate::registry::BookRegistry;
use crate::store::Store;
use crate::util::{now_utc_string, run_id_for, write_json_pretty};

const REPORT_VERSION: u32 = 1;

/// Opens the store and makes sure the schema and seed rows exist. Both steps
/// are idempotent, so `import` and `fetch` work on a fresh database.
fn prepare_store(db_path: &Path) -> Result<Store> {
    let store = Store::open(db_path)?;
    store.ensure_schema()?;
    store.seed_books(&BookRegistry)?;
    store.seed_translations()?;
    Ok(store)
}

fn start_report(command: &str, sync: &SyncSettings) -> SyncRunReport {
    let started_ts = Utc::now();
    let started_at = now_utc_string();

    SyncRunReport {
        report_version: REPORT_VERSION,
        run_id: run_id_for(command, started_ts),
        command: command.to_string(),
        status: "running".to_string(),
        started_at: started_at.clone(),
        updated_at: started_at,
        db_path: sync.db_path.display().to_string(),
        translation_code: sync.translation_code.clone(),
        totals: SyncTotals::default(),
        books: Vec::new(),
        source_hashes: Vec::new(),
        warnings: Vec::new(),
    }
}

fn has_gaps(totals: &SyncTotals) -> bool {
    totals.books_skipped > 0
        || totals.canonical_failed > 0
        || totals.translations_dropped > 0
        || totals.translations_failed > 0
        || totals.fetch_failures > 0
}

/// Logs the run summary and writes the JSON report when a path is set.
fn finish_report(report: &mut SyncRunReport, report_path: Option<&Path>) -> Result<()> {
    report.updated_at = now_utc_string();
    report.status = if has_gaps(&report.totals) || !report.warnings.is_empty() {
        "completed_with_gaps".to_string()
    } else {
        "completed".to_string()
    };

    let totals = &report.totals;
    info!(
        run_id = %report.run_id,
        status = %report.status,
        books = totals.books_processed,
        books_skipped = totals.books_skipped,
        parsed = totals.parsed_records,
        skipped_lines = totals.skipped_lines,
        canonical_inserted = totals.canonical_inserted,
        canonical_resolved = totals.canonical_resolved,
        canonical_failed = totals.canonical_failed,
        written = totals.translations_written,
        dropped = totals.translations_dropped,
        failed = totals.translations_failed,
        fetch_failures = totals.fetch_failures,
        "{} run finished",
        report.command
    );
    for warning in &report.warnings {
        warn!(warning = %warning, "run warning");
    }

    if let Some(path) = report_path {
        write_json_pretty(path, &*report)?;
        info!(path = %path.display(), "wrote run report");
    }

    Ok(())
}
