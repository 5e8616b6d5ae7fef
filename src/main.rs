use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lyricscout::app::AppContext;
use lyricscout::cli::{commands, Cli, Commands};
use lyricscout::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    if let Commands::Config = cli.command {
        commands::show_config(&config, cli.config.as_deref())?;
        return Ok(());
    }

    let ctx = AppContext::new(config).await?;

    let outcome = match cli.command {
        Commands::Lookup { ref title, json } => commands::lookup(&ctx, title, json).await,
        Commands::Serve { .. } => commands::serve(&ctx).await,
        Commands::Config => Ok(()),
    };

    ctx.shutdown().await?;
    outcome?;

    Ok(())
}
