use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tidings::app::AppContext;
use tidings::cli::{commands, BookmarkAction, Cli, Commands};
use tidings::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(key) = cli.api_key {
        config.api.api_key = Some(key);
    }

    let ctx = AppContext::new(config)?;

    match cli.command {
        Commands::Feed {
            pages,
            follow,
            offline,
        } => {
            commands::show_feed(&ctx, pages, follow, offline).await?;
        }
        Commands::Save { url, search_pages } => {
            commands::save(&ctx, &url, search_pages).await?;
        }
        Commands::Bookmarks { action } => match action {
            BookmarkAction::List => commands::list_bookmarks(&ctx)?,
            BookmarkAction::Remove { url } => commands::remove_bookmark(&ctx, &url)?,
            BookmarkAction::Clear => commands::clear_bookmarks(&ctx)?,
        },
        Commands::Status => {
            commands::status(&ctx).await?;
        }
    }

    Ok(())
}
