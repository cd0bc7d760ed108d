use anyhow::{Context, Result};
use rusqlite::params;
use tracing::{info, warn};

use crate::cli::VerifyArgs;
use crate::model::TranslationRow;
use crate::store::Store;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationCoverage {
    pub code: String,
    pub available: bool,
    pub rows: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterShortfall {
    pub abbr: String,
    pub expected: u32,
    pub present: u32,
}

/// A chapter with canonical verses but no text in the checked translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterGap {
    pub abbr: String,
    pub chapter: u32,
    pub canonical: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationSummary {
    pub canonical_verses: i64,
    pub translations: Vec<TranslationCoverage>,
    pub books_without_verses: Vec<String>,
    pub books_missing_chapters: Vec<ChapterShortfall>,
    pub chapter_gaps: Vec<ChapterGap>,
}

pub fn run(args: VerifyArgs) -> Result<()> {
    let db_path = &args.store.db_path;
    info!(db_path = %db_path.display(), "verify requested");

    if !db_path.exists() {
        warn!(path = %db_path.display(), "database file missing");
        return Ok(());
    }

    let store = Store::open(db_path)?;
    let translation = args
        .translation
        .as_deref()
        .map(|code| store.translation_by_code(code))
        .transpose()?;
    let summary = summarize(&store, translation.as_ref())?;

    info!(
        canonical_verses = summary.canonical_verses,
        books_without_verses = summary.books_without_verses.len(),
        books_missing_chapters = summary.books_missing_chapters.len(),
        "canonical coverage"
    );
    for coverage in &summary.translations {
        info!(
            translation = %coverage.code,
            available = coverage.available,
            rows = coverage.rows,
            "translation coverage"
        );
    }
    if !summary.books_without_verses.is_empty() {
        warn!(
            books = %summary.books_without_verses.join(","),
            "books with no canonical verses"
        );
    }
    for shortfall in &summary.books_missing_chapters {
        warn!(
            book = %shortfall.abbr,
            expected = shortfall.expected,
            present = shortfall.present,
            "book is missing chapters"
        );
    }
    if let Some(translation) = &translation {
        for gap in &summary.chapter_gaps {
            warn!(
                translation = %translation.code,
                book = %gap.abbr,
                chapter = gap.chapter,
                canonical = gap.canonical,
                "chapter has no translation text"
            );
        }
        info!(
            translation = %translation.code,
            gaps = summary.chapter_gaps.len(),
            "translation gap check finished"
        );
    }

    Ok(())
}

pub(crate) fn summarize(
    store: &Store,
    translation: Option<&TranslationRow>,
) -> Result<VerificationSummary> {
    let conn = store.connection();
    let canonical_verses = store.count_rows("SELECT COUNT(*) FROM verses")?;

    let mut statement = conn.prepare(
        "
        SELECT t.code, t.available, COUNT(vt.id)
        FROM translations t
        LEFT JOIN verse_translations vt ON vt.translation_id = t.id
        GROUP BY t.id
        ORDER BY t.id
        ",
    )?;
    let translations = statement
        .query_map([], |row| {
            Ok(TranslationCoverage {
                code: row.get(0)?,
                available: row.get(1)?,
                rows: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to count translation rows")?;

    let mut statement = conn.prepare(
        "
        SELECT b.abbr_eng, b.chapters, COUNT(DISTINCT v.chapter)
        FROM books b
        LEFT JOIN verses v ON v.book_id = b.id
        GROUP BY b.id
        ORDER BY b.book_order
        ",
    )?;
    let chapter_counts = statement
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u32>(1)?,
                row.get::<_, u32>(2)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to count canonical chapters")?;

    let mut books_without_verses = Vec::new();
    let mut books_missing_chapters = Vec::new();
    for (abbr, expected, present) in chapter_counts {
        if present == 0 {
            books_without_verses.push(abbr);
        } else if present < expected {
            books_missing_chapters.push(ChapterShortfall {
                abbr,
                expected,
                present,
            });
        }
    }

    let chapter_gaps = match translation {
        Some(translation) => chapter_gaps(store, translation)?,
        None => Vec::new(),
    };

    Ok(VerificationSummary {
        canonical_verses,
        translations,
        books_without_verses,
        books_missing_chapters,
        chapter_gaps,
    })
}

fn chapter_gaps(store: &Store, translation: &TranslationRow) -> Result<Vec<ChapterGap>> {
    let mut statement = store.connection().prepare(
        "
        SELECT b.abbr_eng, v.chapter, COUNT(v.id)
        FROM verses v
        JOIN books b ON b.id = v.book_id
        LEFT JOIN verse_translations vt
          ON vt.verse_id = v.id AND vt.translation_id = ?1
        GROUP BY b.id, v.chapter
        HAVING COUNT(vt.id) = 0
        ORDER BY b.book_order, v.chapter
        ",
    )?;
    let gaps = statement
        .query_map(params![translation.id], |row| {
            Ok(ChapterGap {
                abbr: row.get(0)?,
                chapter: row.get(1)?,
                canonical: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()
        .with_context(|| format!("failed to check chapter gaps for {}", translation.code))?;
    Ok(gaps)
}
