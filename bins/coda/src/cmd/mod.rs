pub mod columns;
pub mod load;
pub mod row;
pub mod schema;

use std::sync::Arc;

use coda_loader::CodaLoader;
use source_http::HttpSource;

use crate::config::Effective;
use crate::error::CliError;

/// Validate settings first, then bind the HTTP source to them.
pub fn build_loader(eff: &Effective) -> Result<CodaLoader, CliError> {
    let settings = eff.options.clone().resolve()?;
    let api = HttpSource::new(
        &settings.base_url,
        &settings.token,
        &settings.doc_id,
        settings.request_timeout,
    )?;
    tracing::debug!(?settings, "loader configured");
    Ok(CodaLoader::new(settings, Arc::new(api)))
}
