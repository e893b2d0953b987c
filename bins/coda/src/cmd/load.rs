use tracing::info;

use coda_api::{PassthroughParser, RowParser, SchemaParser};
use coda_loader::LoadSummary;
use storage_file::{FileStore, FileStoreConfig, WriteMode};
use storage_memory::MemoryStore;

use crate::config::{Effective, LoadArgs, StoreConfig};
use crate::error::CliError;

pub async fn run(args: LoadArgs) -> Result<(), CliError> {
    let eff = Effective::new(&args.common)?;
    let loader = super::build_loader(&eff)?;

    let parser: Box<dyn RowParser> = if args.validate {
        Box::new(SchemaParser::new(loader.schema().await))
    } else {
        Box::new(PassthroughParser)
    };

    let store = match args.out {
        Some(path) => StoreConfig::File(FileStoreConfig { path, write_mode: WriteMode::Upsert }),
        None => eff.store.clone().unwrap_or(StoreConfig::Memory),
    };

    match store {
        StoreConfig::File(cfg) => {
            let store = FileStore::from_config(&cfg);
            let summary = loader.load(&store, parser.as_ref()).await?;
            report(&summary);
            info!(path = %store.path().display(), rows = summary.rows_stored, "rows written");
        }
        // без файла строки печатаются в stdout как JSON Lines
        StoreConfig::Memory => {
            let store = MemoryStore::new();
            let summary = loader.load(&store, parser.as_ref()).await?;
            for (id, data) in store.snapshot().await {
                println!("{}", serde_json::json!({ "id": id, "data": data }));
            }
            report(&summary);
        }
    }
    Ok(())
}

fn report(summary: &LoadSummary) {
    eprintln!(
        "fetched {} rows, stored {}, expanded {} references, {} requests in {:.1}s",
        summary.rows_fetched,
        summary.rows_stored,
        summary.expanded_references,
        summary.requests,
        summary.elapsed.as_secs_f64()
    );
}
