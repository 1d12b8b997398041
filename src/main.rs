use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use smartmark::app::AppContext;
use smartmark::cli::{commands, Cli, Commands};
use smartmark::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(Commands::is_tui(&cli.command))?;

    let config = Config::load()?;
    let ctx = AppContext::new(config)?;

    match cli.command {
        None | Some(Commands::Tui) => {
            smartmark::tui::run(Arc::new(ctx)).await?;
        }
        Some(Commands::Login) => commands::login(&ctx).await?,
        Some(Commands::Logout) => commands::logout(&ctx).await?,
        Some(Commands::Whoami) => commands::whoami(&ctx).await?,
        Some(Commands::List) => commands::list(&ctx).await?,
        Some(Commands::Add { url }) => commands::add(&ctx, &url).await?,
        Some(Commands::Delete { id }) => commands::delete(&ctx, &id).await?,
    }

    Ok(())
}

/// The TUI owns the terminal, so its logs go to a file in the data directory.
fn init_tracing(tui: bool) -> anyhow::Result<()> {
    let registry = tracing_subscriber::registry().with(EnvFilter::from_default_env());

    if tui {
        let dir = dirs::data_dir()
            .context("Could not find data directory")?
            .join("smartmark");
        std::fs::create_dir_all(&dir)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("smartmark.log"))?;
        registry
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
    Ok(())
}
