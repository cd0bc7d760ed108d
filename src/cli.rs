use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "scripture-sync",
    version,
    about = "Canonical verse import and translation sync tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the schema and seed books and translations.
    Init(InitArgs),
    /// Import the local corpus as canonical verses plus translation text.
    Import(ImportArgs),
    /// Attach translation text fetched from the remote provider.
    Fetch(FetchArgs),
    /// Print coverage counts for the store.
    Verify(VerifyArgs),
}

#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    #[arg(long, env = "SCRIPTURE_DB_PATH", default_value = "scripture.sqlite")]
    pub db_path: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct SyncArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Restrict the run to these book abbreviations (e.g. `Gen`, `Psa`).
    #[arg(long = "book")]
    pub books: Vec<String>,

    #[arg(long, default_value_t = 100)]
    pub canonical_batch_size: usize,

    #[arg(long, default_value_t = 100)]
    pub translation_batch_size: usize,

    /// Write a JSON run report to this path.
    #[arg(long)]
    pub report_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct InitArgs {
    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    #[command(flatten)]
    pub sync: SyncArgs,

    #[arg(long, env = "SCRIPTURE_CORPUS_ROOT")]
    pub corpus_root: PathBuf,

    #[arg(long, default_value = "euc-kr")]
    pub corpus_encoding: String,

    /// Translation the corpus text is attached to.
    #[arg(long, default_value = "korHRV")]
    pub translation: String,

    #[arg(long, default_value_t = false)]
    pub canonical_only: bool,
}

#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    #[command(flatten)]
    pub sync: SyncArgs,

    /// Translation code in the store.
    #[arg(long, default_value = "NIV")]
    pub translation: String,

    /// Translation code on the provider side.
    #[arg(long, default_value = "NIV2011")]
    pub provider_translation: String,

    #[arg(long, env = "SCRIPTURE_PROVIDER_URL", default_value = "https://bolls.life")]
    pub provider_url: String,

    /// Only fetch these chapter numbers in each selected book.
    #[arg(long = "chapter")]
    pub chapters: Vec<u32>,

    #[arg(long, default_value_t = 100)]
    pub request_delay_ms: u64,

    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,
}

#[derive(Args, Debug, Clone)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Also report chapters missing text for this translation.
    #[arg(long)]
    pub translation: Option<String>,
}
