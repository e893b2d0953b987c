use std::collections::HashSet;

use inflector::Inflector;

use coda_api::Column;

use crate::config::{ColumnsArgs, Effective};
use crate::error::CliError;

pub async fn run(args: ColumnsArgs) -> Result<(), CliError> {
    let eff = Effective::new(&args.common)?;
    let loader = super::build_loader(&eff)?;
    let columns = loader.columns().await?;
    let module = render_module(&loader.settings().table_id, &columns);

    match args.out {
        Some(path) => {
            std::fs::write(&path, module)
                .map_err(|source| CliError::Write { path: path.clone(), source })?;
            tracing::info!(path = %path, columns = columns.len(), "column helpers written");
        }
        None => print!("{module}"),
    }
    Ok(())
}

/// Rust module with one `pub const` per column id.
pub fn render_module(table: &str, columns: &[Column]) -> String {
    let mut out = format!("//! Column ids of table `{table}`. Generated by `coda columns`.\n");
    let mut taken = HashSet::new();
    for column in columns {
        let name = unique(const_name(column), &mut taken);
        let label = column.name.replace(['\n', '\r'], " ");
        out.push_str(&format!(
            "\n/// {label} ({})\npub const {name}: &str = {:?};\n",
            column.format.kind, column.id
        ));
    }
    out
}

/// SCREAMING_SNAKE_CASE identifier from a column name. Emoji and symbols
/// are dropped; `_` stands in for an empty result and prefixes names
/// starting with a digit.
pub fn identifier(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() => Some(c),
            c if c.is_whitespace() => Some(' '),
            '_' | '-' | '.' | '/' => Some(' '),
            _ => None,
        })
        .collect();

    let ident = cleaned
        .split_whitespace()
        .map(|word| word.to_screaming_snake_case())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("_");

    match ident.chars().next() {
        None => "_".to_string(),
        Some(c) if c.is_ascii_digit() => format!("_{ident}"),
        Some(_) => ident,
    }
}

/// Unusable names fall back to the column id behind the placeholder.
fn const_name(column: &Column) -> String {
    match identifier(&column.name) {
        ident if ident == "_" => format!("_{}", identifier(&column.id)),
        ident => ident,
    }
}

fn unique(ident: String, taken: &mut HashSet<String>) -> String {
    if taken.insert(ident.clone()) {
        return ident;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{ident}_{n}");
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}
