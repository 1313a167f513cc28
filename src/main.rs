use clap::Parser;
use portlook::cli::{init_logging, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(path) = init_logging(&cli)? {
        tracing::debug!("logging to {}", path.display());
    }

    if let Err(err) = cli.run().await {
        tracing::error!("{}", err);
        return Err(err.into());
    }

    Ok(())
}
