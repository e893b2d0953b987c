use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

use coda_api::SortBy;
use coda_loader::config::{DOC_ID_ENV, TABLE_ID_ENV, TOKEN_ENV};
use coda_loader::{LoaderOptions, QueryFilter};
use storage_file::FileStoreConfig;

use crate::error::CliError;

#[derive(Parser)]
#[command(name = "coda", about = "Загрузка таблиц Coda с раскрытием lookup-ссылок")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Загрузить строки таблицы в хранилище
    Load(LoadArgs),
    /// Вывести схему валидации, выведенную из колонок
    Schema(CommonArgs),
    /// Загрузить одну строку по id
    Row(RowArgs),
    /// Сгенерировать Rust-модуль с константами id колонок
    Columns(ColumnsArgs),
}

// ═══════════════════════════════════════════════════════════════
//  CLI args
// ═══════════════════════════════════════════════════════════════

#[derive(Args, Clone, Debug)]
pub struct CommonArgs {
    /// Путь к coda.toml
    #[arg(long, default_value = "coda.toml", env = "CODA_CONFIG")]
    pub config: String,

    /// API token
    #[arg(long, env = TOKEN_ENV, hide_env_values = true)]
    pub token: Option<String>,

    /// Document id
    #[arg(long = "doc", env = DOC_ID_ENV)]
    pub doc_id: Option<String>,

    /// Table id or name
    #[arg(long = "table", env = TABLE_ID_ENV)]
    pub table_id: Option<String>,

    /// Raw filter, e.g. `c-status:"Open"`
    #[arg(long)]
    pub query: Option<String>,

    /// createdAt | natural | updatedAt
    #[arg(long)]
    pub sort_by: Option<SortBy>,

    /// Row limit per query
    #[arg(long)]
    pub limit: Option<usize>,

    /// Глубина раскрытия lookup-ссылок (0 = выключено)
    #[arg(long)]
    pub depth: Option<u32>,

    /// Keep ``` wrapping in string values
    #[arg(long)]
    pub no_sanitize: bool,

    #[arg(long)]
    pub base_url: Option<String>,

    #[arg(long)]
    pub page_size: Option<u32>,

    /// Per-request timeout
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Per-row expansion deadline
    #[arg(long)]
    pub row_timeout_ms: Option<u64>,
}

#[derive(Args, Clone, Debug)]
pub struct LoadArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// JSON Lines output file (overrides `[store]`)
    #[arg(long)]
    pub out: Option<String>,

    /// Validate rows against the inferred schema
    #[arg(long)]
    pub validate: bool,
}

#[derive(Args, Clone, Debug)]
pub struct RowArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    pub row_id: String,
}

#[derive(Args, Clone, Debug)]
pub struct ColumnsArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Output file (stdout if omitted)
    #[arg(long)]
    pub out: Option<String>,
}

// ═══════════════════════════════════════════════════════════════
//  Config file (TOML)
// ═══════════════════════════════════════════════════════════════

/// ```toml
/// [loader]
/// table_id = "grid-tasks"
/// max_lookup_depth = 2
/// query = { column = "c-status", values = ["Open", "Blocked"] }
///
/// [store]
/// kind = "file"
/// path = "out/tasks.jsonl"
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub loader: LoaderOptions,
    pub store: Option<StoreConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreConfig {
    Memory,
    File(FileStoreConfig),
}

pub fn load_config(path: &str) -> Result<ConfigFile, CliError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| CliError::Config { context: "read", detail: format!("'{path}': {e}") })?;
    parse_config(&content)
        .map_err(|e| CliError::Config { context: "parse", detail: format!("'{path}': {e}") })
}

fn parse_config(content: &str) -> Result<ConfigFile, toml::de::Error> {
    toml::from_str(content)
}

// ═══════════════════════════════════════════════════════════════
//  Effective — merged config
// ═══════════════════════════════════════════════════════════════

/// Итоговая конфигурация после мержа: coda.toml < env/CLI
pub struct Effective {
    pub options: LoaderOptions,
    pub store: Option<StoreConfig>,
}

impl Effective {
    pub fn new(args: &CommonArgs) -> Result<Self, CliError> {
        let cfg = match load_config(&args.config) {
            Ok(c) => c,
            Err(e) => {
                if std::path::Path::new(&args.config).exists() {
                    return Err(e);
                }
                ConfigFile::default()
            }
        };
        Ok(Self::merge(args, cfg))
    }

    fn merge(args: &CommonArgs, cfg: ConfigFile) -> Self {
        let file = cfg.loader;
        let options = LoaderOptions {
            token: args.token.clone().or(file.token),
            doc_id: args.doc_id.clone().or(file.doc_id),
            table_id: args.table_id.clone().or(file.table_id),
            query: args.query.clone().map(QueryFilter::Raw).or(file.query),
            sort_by: args.sort_by.or(file.sort_by),
            limit: args.limit.or(file.limit),
            sanitize_strings: if args.no_sanitize { Some(false) } else { file.sanitize_strings },
            max_lookup_depth: args.depth.or(file.max_lookup_depth),
            base_url: args.base_url.clone().or(file.base_url),
            page_size: args.page_size.or(file.page_size),
            request_timeout_ms: args.timeout_ms.or(file.request_timeout_ms),
            progress_interval_ms: file.progress_interval_ms,
            row_timeout_ms: args.row_timeout_ms.or(file.row_timeout_ms),
        };
        Self { options, store: cfg.store }
    }
}
