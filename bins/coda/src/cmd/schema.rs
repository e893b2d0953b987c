use crate::config::{CommonArgs, Effective};
use crate::error::CliError;

pub async fn run(args: CommonArgs) -> Result<(), CliError> {
    let eff = Effective::new(&args)?;
    let loader = super::build_loader(&eff)?;
    let schema = loader.schema().await;
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
