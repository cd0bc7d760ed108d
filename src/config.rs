use std::path::PathBuf;
use std::time::Duration;

use encoding_rs::Encoding;
use reqwest::Url;

use crate::cli::{FetchArgs, ImportArgs, SyncArgs};
use crate::error::PipelineError;
use crate::pipeline::FetcherSettings;
use crate::registry::{BookEntry, BookRegistry};

/// Settings shared by every sync command, validated before any component is
/// built.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub db_path: PathBuf,
    pub translation_code: String,
    pub books: Vec<&'static BookEntry>,
    /// True when `--book` narrowed the selection.
    pub books_explicit: bool,
    pub canonical_batch_size: usize,
    pub translation_batch_size: usize,
    pub report_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub sync: SyncSettings,
    pub corpus_root: PathBuf,
    pub encoding: &'static Encoding,
    pub canonical_only: bool,
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub sync: SyncSettings,
    pub provider: FetcherSettings,
    pub chapters: Vec<u32>,
    pub request_delay: Duration,
}

impl SyncSettings {
    fn from_args(
        args: &SyncArgs,
        translation_code: &str,
        registry: &BookRegistry,
    ) -> Result<Self, PipelineError> {
        if args.canonical_batch_size == 0 || args.translation_batch_size == 0 {
            return Err(invalid("batch sizes must be greater than zero"));
        }
        if translation_code.trim().is_empty() {
            return Err(invalid("translation code must not be empty"));
        }

        Ok(Self {
            db_path: args.store.db_path.clone(),
            translation_code: translation_code.trim().to_string(),
            books: registry.select(&args.books)?,
            books_explicit: !args.books.is_empty(),
            canonical_batch_size: args.canonical_batch_size,
            translation_batch_size: args.translation_batch_size,
            report_path: args.report_path.clone(),
        })
    }
}

impl ImportConfig {
    pub fn from_args(args: &ImportArgs, registry: &BookRegistry) -> Result<Self, PipelineError> {
        let sync = SyncSettings::from_args(&args.sync, &args.translation, registry)?;

        if !args.corpus_root.is_dir() {
            return Err(invalid(format!(
                "corpus root is not a directory: {}",
                args.corpus_root.display()
            )));
        }

        let encoding = Encoding::for_label(args.corpus_encoding.as_bytes()).ok_or_else(|| {
            invalid(format!("unknown corpus encoding: {}", args.corpus_encoding))
        })?;

        Ok(Self {
            sync,
            corpus_root: args.corpus_root.clone(),
            encoding,
            canonical_only: args.canonical_only,
        })
    }
}

impl FetchConfig {
    pub fn from_args(args: &FetchArgs, registry: &BookRegistry) -> Result<Self, PipelineError> {
        let sync = SyncSettings::from_args(&args.sync, &args.translation, registry)?;

        let url = Url::parse(&args.provider_url)
            .map_err(|err| invalid(format!("invalid provider url {}: {err}", args.provider_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!(
                "provider url must be http or https: {}",
                args.provider_url
            )));
        }
        if args.provider_translation.trim().is_empty() {
            return Err(invalid("provider translation code must not be empty"));
        }
        if args.timeout_secs == 0 {
            return Err(invalid("timeout must be at least one second"));
        }
        if args.chapters.contains(&0) {
            return Err(invalid("chapter numbers start at 1"));
        }

        let mut chapters = args.chapters.clone();
        chapters.sort_unstable();
        chapters.dedup();

        Ok(Self {
            sync,
            provider: FetcherSettings {
                base_url: url.as_str().trim_end_matches('/').to_string(),
                provider_code: args.provider_translation.trim().to_string(),
                timeout: Duration::from_secs(args.timeout_secs),
            },
            chapters,
            request_delay: Duration::from_millis(args.request_delay_ms),
        })
    }

    /// Chapters to fetch for one book: the explicit selection clipped to the
    /// book's range, or every chapter.
    pub fn chapters_for(&self, book: &BookEntry) -> Vec<u32> {
        if self.chapters.is_empty() {
            return (1..=book.chapters).collect();
        }
        self.chapters
            .iter()
            .copied()
            .filter(|chapter| *chapter <= book.chapters)
            .collect()
    }
}

fn invalid(message: impl Into<String>) -> PipelineError {
    PipelineError::InvalidConfig(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::StoreArgs;

    fn sync_args() -> SyncArgs {
        SyncArgs {
            store: StoreArgs {
                db_path: PathBuf::from("scripture.sqlite"),
            },
            books: Vec::new(),
            canonical_batch_size: 100,
            translation_batch_size: 50,
            report_path: None,
        }
    }

    fn fetch_args() -> FetchArgs {
        FetchArgs {
            sync: sync_args(),
            translation: "NIV".to_string(),
            provider_translation: "NIV2011".to_string(),
            provider_url: "https://bolls.life/".to_string(),
            chapters: Vec::new(),
            request_delay_ms: 100,
            timeout_secs: 10,
        }
    }

    #[test]
    fn import_config_resolves_encoding_and_books() {
        let dir = tempfile::tempdir().unwrap();
        let mut sync = sync_args();
        sync.books = vec!["Psa".to_string(), "Gen".to_string()];
        let args = ImportArgs {
            sync,
            corpus_root: dir.path().to_path_buf(),
            corpus_encoding: "euc-kr".to_string(),
            translation: "korHRV".to_string(),
            canonical_only: false,
        };

        let config = ImportConfig::from_args(&args, &BookRegistry).unwrap();
        assert_eq!(config.encoding, encoding_rs::EUC_KR);
        let abbrs: Vec<&str> = config.sync.books.iter().map(|book| book.abbr).collect();
        assert_eq!(abbrs, vec!["Gen", "Psa"]);
    }

    #[test]
    fn import_config_rejects_bad_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = ImportArgs {
            sync: sync_args(),
            corpus_root: dir.path().join("missing"),
            corpus_encoding: "euc-kr".to_string(),
            translation: "korHRV".to_string(),
            canonical_only: false,
        };
        assert!(matches!(
            ImportConfig::from_args(&args, &BookRegistry),
            Err(PipelineError::InvalidConfig(_))
        ));

        args.corpus_root = dir.path().to_path_buf();
        args.corpus_encoding = "klingon".to_string();
        assert!(ImportConfig::from_args(&args, &BookRegistry).is_err());

        args.corpus_encoding = "euc-kr".to_string();
        args.sync.canonical_batch_size = 0;
        assert!(ImportConfig::from_args(&args, &BookRegistry).is_err());

        args.sync.canonical_batch_size = 100;
        args.sync.books = vec!["Xyz".to_string()];
        assert!(matches!(
            ImportConfig::from_args(&args, &BookRegistry),
            Err(PipelineError::UnknownBookAbbr(_))
        ));
    }

    #[test]
    fn fetch_config_normalizes_provider_settings() {
        let mut args = fetch_args();
        args.chapters = vec![31, 3, 31];

        let config = FetchConfig::from_args(&args, &BookRegistry).unwrap();
        assert_eq!(config.provider.base_url, "https://bolls.life");
        assert_eq!(config.chapters, vec![3, 31]);
        assert_eq!(config.request_delay, Duration::from_millis(100));

        let obadiah = BookRegistry.by_abbr("Oba").unwrap();
        assert_eq!(config.chapters_for(obadiah), Vec::<u32>::new());
        let psalms = BookRegistry.by_abbr("Psa").unwrap();
        assert_eq!(config.chapters_for(psalms), vec![3, 31]);
    }

    #[test]
    fn fetch_config_defaults_to_every_chapter() {
        let config = FetchConfig::from_args(&fetch_args(), &BookRegistry).unwrap();
        let ruth = BookRegistry.by_abbr("Rut").unwrap();
        assert_eq!(config.chapters_for(ruth), vec![1, 2, 3, 4]);
        assert_eq!(config.sync.books.len(), 66);
    }

    #[test]
    fn fetch_config_rejects_bad_provider_settings() {
        let mut args = fetch_args();
        args.provider_url = "ftp://bolls.life".to_string();
        assert!(FetchConfig::from_args(&args, &BookRegistry).is_err());

        let mut args = fetch_args();
        args.provider_url = "not a url".to_string();
        assert!(FetchConfig::from_args(&args, &BookRegistry).is_err());

        let mut args = fetch_args();
        args.chapters = vec![0];
        assert!(FetchConfig::from_args(&args, &BookRegistry).is_err());

        let mut args = fetch_args();
        args.translation = "  ".to_string();
        assert!(FetchConfig::from_args(&args, &BookRegistry).is_err());
    }
}
