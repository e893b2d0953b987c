use crate::config::{Effective, RowArgs};
use crate::error::CliError;

pub async fn run(args: RowArgs) -> Result<(), CliError> {
    let eff = Effective::new(&args.common)?;
    let loader = super::build_loader(&eff)?;
    let row = loader.fetch_row(&args.row_id).await?;
    println!("{}", serde_json::to_string_pretty(&row)?);
    Ok(())
}
