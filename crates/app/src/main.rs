mod app;
mod config;
mod error;

use crate::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "balance_studio={level},client={level},ledger={level}",
            level = config.log_level
        ))
        .init();

    let app = app::App::new(config)?;
    app.run().await?;
    Ok(())
}
