use anyhow::Result;
use tracing::info;

use crate::cli::InitArgs;
use crate::registry::BookRegistry;
use crate::store::{DB_SCHEMA_VERSION, Store};

pub fn run(args: InitArgs) -> Result<()> {
    info!(db_path = %args.store.db_path.display(), "initializing store");

    let store = Store::open(&args.store.db_path)?;
    store.ensure_schema()?;
    let books = store.seed_books(&BookRegistry)?;
    let translations = store.seed_translations()?;

    info!(
        schema_version = DB_SCHEMA_VERSION,
        books,
        translations,
        "store initialized"
    );
    Ok(())
}
