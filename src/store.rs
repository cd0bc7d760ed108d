use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};

use crate::error::PipelineError;
use crate::model::{BookRow, TranslationRow};
use crate::registry::BookRegistry;
use crate::util::now_utc_string;

pub const DB_SCHEMA_VERSION: &str = "1.0.0";

/// Translations known to the pipeline. Only the available ones receive text.
pub const SEED_TRANSLATIONS: &[(&str, &str, &str, bool)] = &[
    ("korHRV", "개역개정", "ko", true),
    ("korRV", "개역한글", "ko", false),
    ("korNRSV", "새번역", "ko", false),
    ("NIV", "NIV2011", "en", true),
];

/// Store handle scoped to one pipeline run. Components borrow it; there is no
/// process-wide connection.
pub struct Store {
    connection: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let connection =
            Connection::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        Self::from_connection(connection)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let connection = Connection::open_in_memory().context("failed to open in-memory store")?;
        let store = Self::from_connection(connection)?;
        store.ensure_schema()?;
        store.seed_books(&BookRegistry)?;
        store.seed_translations()?;
        Ok(store)
    }

    fn from_connection(connection: Connection) -> Result<Self> {
        connection
            .pragma_update(None, "journal_mode", "WAL")
            .context("failed to set journal_mode=WAL")?;
        connection
            .pragma_update(None, "synchronous", "NORMAL")
            .context("failed to set synchronous=NORMAL")?;
        connection
            .pragma_update(None, "foreign_keys", "ON")
            .context("failed to enable foreign_keys")?;
        Ok(Self { connection })
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn ensure_schema(&self) -> Result<()> {
        self.connection
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS metadata (
                  key TEXT PRIMARY KEY,
                  value TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS books (
                  id INTEGER PRIMARY KEY,
                  abbr_eng TEXT NOT NULL UNIQUE,
                  name_ko TEXT NOT NULL,
                  name_en TEXT NOT NULL,
                  short_ko TEXT NOT NULL,
                  testament TEXT NOT NULL,
                  book_order INTEGER NOT NULL UNIQUE,
                  chapters INTEGER NOT NULL
                );

                CREATE TABLE IF NOT EXISTS translations (
                  id INTEGER PRIMARY KEY,
                  code TEXT NOT NULL UNIQUE,
                  name TEXT NOT NULL,
                  language TEXT NOT NULL,
                  available INTEGER NOT NULL DEFAULT 1
                );

                CREATE TABLE IF NOT EXISTS verses (
                  id INTEGER PRIMARY KEY AUTOINCREMENT,
                  book_id INTEGER NOT NULL,
                  chapter INTEGER NOT NULL,
                  verse INTEGER NOT NULL,
                  UNIQUE(book_id, chapter, verse),
                  FOREIGN KEY(book_id) REFERENCES books(id)
                );

                CREATE TABLE IF NOT EXISTS verse_translations (
                  id INTEGER PRIMARY KEY,
                  verse_id INTEGER NOT NULL,
                  translation_id INTEGER NOT NULL,
                  text TEXT NOT NULL,
                  UNIQUE(verse_id, translation_id),
                  FOREIGN KEY(verse_id) REFERENCES verses(id),
                  FOREIGN KEY(translation_id) REFERENCES translations(id)
                );

                CREATE INDEX IF NOT EXISTS idx_verses_book_chapter ON verses(book_id, chapter);
                CREATE INDEX IF NOT EXISTS idx_verse_translations_translation
                  ON verse_translations(translation_id);
                ",
            )
            .context("failed to initialize schema")?;

        self.connection.execute(
            "INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value",
            [DB_SCHEMA_VERSION],
        )?;
        self.connection.execute(
            "INSERT INTO metadata(key, value) VALUES('db_updated_at', ?1)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value",
            [now_utc_string()],
        )?;

        Ok(())
    }

    pub fn seed_books(&self, registry: &BookRegistry) -> Result<usize> {
        let tx = self.connection.unchecked_transaction()?;

        {
            let mut statement = tx.prepare(
                "
                INSERT INTO books(abbr_eng, name_ko, name_en, short_ko, testament, book_order, chapters)
                VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(abbr_eng) DO UPDATE SET
                  name_ko=excluded.name_ko,
                  name_en=excluded.name_en,
                  short_ko=excluded.short_ko,
                  testament=excluded.testament,
                  book_order=excluded.book_order,
                  chapters=excluded.chapters
                ",
            )?;

            for entry in registry.entries() {
                statement
                    .execute(params![
                        entry.abbr,
                        entry.name_ko,
                        entry.name_en,
                        entry.short_ko,
                        entry.testament().as_str(),
                        entry.ordinal,
                        entry.chapters
                    ])
                    .with_context(|| format!("failed to seed book {}", entry.abbr))?;
            }
        }

        tx.commit()?;
        Ok(registry.entries().len())
    }

    pub fn seed_translations(&self) -> Result<usize> {
        let tx = self.connection.unchecked_transaction()?;

        {
            let mut statement = tx.prepare(
                "
                INSERT INTO translations(code, name, language, available)
                VALUES(?1, ?2, ?3, ?4)
                ON CONFLICT(code) DO UPDATE SET
                  name=excluded.name,
                  language=excluded.language,
                  available=excluded.available
                ",
            )?;

            for (code, name, language, available) in SEED_TRANSLATIONS {
                statement
                    .execute(params![code, name, language, available])
                    .with_context(|| format!("failed to seed translation {code}"))?;
            }
        }

        tx.commit()?;
        Ok(SEED_TRANSLATIONS.len())
    }

    pub fn book_by_abbr(&self, abbr: &str) -> Result<BookRow> {
        let row = self
            .connection
            .query_row(
                "SELECT id, abbr_eng, name_ko, book_order, chapters FROM books WHERE abbr_eng = ?1",
                [abbr],
                |row| {
                    Ok(BookRow {
                        id: row.get(0)?,
                        abbr: row.get(1)?,
                        name_ko: row.get(2)?,
                        book_order: row.get(3)?,
                        chapters: row.get(4)?,
                    })
                },
            )
            .optional()
            .with_context(|| format!("failed to look up book {abbr}"))?;

        row.ok_or_else(|| PipelineError::BookNotSeeded(abbr.to_string()).into())
    }

    pub fn translation_by_code(&self, code: &str) -> Result<TranslationRow> {
        let row = self
            .connection
            .query_row(
                "SELECT id, code, name FROM translations WHERE code = ?1",
                [code],
                |row| {
                    Ok(TranslationRow {
                        id: row.get(0)?,
                        code: row.get(1)?,
                        name: row.get(2)?,
                    })
                },
            )
            .optional()
            .with_context(|| format!("failed to look up translation {code}"))?;

        row.ok_or_else(|| PipelineError::TranslationNotSeeded(code.to_string()).into())
    }

    pub fn count_rows(&self, sql: &str) -> Result<i64> {
        let count = self
            .connection
            .query_row(sql, [], |row| row.get(0))
            .with_context(|| format!("failed to count rows: {sql}"))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeding_is_idempotent() {
        let store = Store::open_in_memory().unwrap();
        store.seed_books(&BookRegistry).unwrap();
        store.seed_translations().unwrap();

        assert_eq!(store.count_rows("SELECT COUNT(*) FROM books").unwrap(), 66);
        assert_eq!(
            store.count_rows("SELECT COUNT(*) FROM translations").unwrap(),
            SEED_TRANSLATIONS.len() as i64
        );
    }

    #[test]
    fn lookups_return_seeded_rows() {
        let store = Store::open_in_memory().unwrap();
        let psalms = store.book_by_abbr("Psa").unwrap();
        assert_eq!(psalms.book_order, 19);
        assert_eq!(psalms.chapters, 150);

        let niv = store.translation_by_code("NIV").unwrap();
        assert_eq!(niv.name, "NIV2011");
    }

    #[test]
    fn missing_rows_are_configuration_errors() {
        let store = Store::open_in_memory().unwrap();
        let err = store.translation_by_code("ESV").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::TranslationNotSeeded(code)) if code == "ESV"
        ));

        let err = store.book_by_abbr("Xyz").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::BookNotSeeded(_))
        ));
    }

    #[test]
    fn file_backed_store_reopens_with_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scripture.sqlite");
        {
            let store = Store::open(&path).unwrap();
            store.ensure_schema().unwrap();
            store.seed_books(&BookRegistry).unwrap();
        }

        let store = Store::open(&path).unwrap();
        assert_eq!(store.count_rows("SELECT COUNT(*) FROM books").unwrap(), 66);
    }
}
