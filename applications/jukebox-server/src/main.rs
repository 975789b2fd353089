/// Jukebox Server - song catalog, playlists and credit renewal daemon
use clap::{Parser, Subcommand};
use jukebox_core::{SearchPage, SongId};
use jukebox_server::{config::ServerConfig, services::YtDlpResolver, Result};
use jukebox_storage::Jukebox;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "jukebox-server")]
#[command(about = "Shared jukebox engine with per-user playlists", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the daemon (credit renewal) until interrupted
    Serve,
    /// Search the catalog by keywords
    Search {
        #[arg(required = true)]
        keywords: Vec<String>,
    },
    /// Show a song with its duplicate linkage
    Info { id: SongId },
    /// Forbid a song from being played
    Blacklist { id: SongId },
    /// Lift a blacklist
    Permit { id: SongId },
    /// Change a song's title
    Rename {
        id: SongId,
        #[arg(required = true)]
        title: Vec<String>,
    },
    /// Mark SOURCE as a duplicate of TARGET
    Merge { source: SongId, target: SongId },
    /// Remove a song's duplicate relation
    Split { id: SongId },
    /// List songs that failed to resolve
    FailedList,
    /// Clear the failed flag of one song, or of every song
    FailedClear { id: Option<SongId> },
    /// Run one credit renewal cycle now
    Renew,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jukebox_server=info,jukebox_storage=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = ServerConfig::load(cli.config.as_deref())?;
    config.validate()?;

    let jukebox = open(&config).await?;

    let result = run(&jukebox, cli.command).await;
    jukebox.pool().close().await;
    Ok(result?)
}

async fn open(config: &ServerConfig) -> Result<Jukebox> {
    let pool = jukebox_storage::create_pool(&config.storage.database_url).await?;
    jukebox_storage::run_migrations(&pool).await?;
    tracing::info!("Database connected");

    let resolver = Arc::new(YtDlpResolver::new(config.resolver.ytdlp_path.clone()));
    Ok(Jukebox::new(pool, config.songs.clone(), resolver))
}

async fn run(jukebox: &Jukebox, command: Commands) -> Result<()> {
    match command {
        Commands::Serve => serve(jukebox).await?,
        Commands::Search { keywords } => {
            let page = jukebox.search(&keywords).await?;
            print_page(&page);
        }
        Commands::Info { id } => {
            let info = jukebox.info(id).await?;
            let song = &info.song;
            println!("[{}] {}", song.id, song.title);
            println!("  locator:     {}", song.locator);
            println!("  duration:    {}s", song.duration);
            println!("  last played: {}", song.last_played);
            println!("  credits:     {}", song.credit_count);
            println!(
                "  hype/skip/plays: {}/{}/{} (group total {}/{}/{})",
                song.hype_count,
                song.skip_votes,
                song.play_count,
                info.total_hype_count,
                info.total_skip_votes,
                info.total_play_count
            );
            println!("  blacklisted: {}", song.is_blacklisted);
            println!("  failed:      {}", song.has_failed);
            if let Some(target) = &info.duplicates {
                println!("  duplicate of [{}] {}", target.id, target.title);
            }
            for duplicate in &info.duplicated_by {
                println!("  duplicated by [{}] {}", duplicate.id, duplicate.title);
            }
        }
        Commands::Blacklist { id } => {
            jukebox.blacklist(id).await?;
            println!("Song [{id}] has been blacklisted");
        }
        Commands::Permit { id } => {
            jukebox.permit(id).await?;
            println!("Song [{id}] has been removed from the blacklist");
        }
        Commands::Rename { id, title } => {
            jukebox.rename(id, &title.join(" ")).await?;
            println!("Song [{id}] has been renamed");
        }
        Commands::Merge { source, target } => {
            jukebox.merge(source, target).await?;
            println!("Song [{source}] has been marked as a duplicate of [{target}]");
        }
        Commands::Split { id } => {
            jukebox.split(id).await?;
            println!("Song [{id}] has been split");
        }
        Commands::FailedList => {
            let page = jukebox.list_failed().await?;
            print_page(&page);
        }
        Commands::FailedClear { id } => {
            let cleared = jukebox.clear_failed(id).await?;
            println!("Failed flag cleared on {cleared} song(s)");
        }
        Commands::Renew => {
            jukebox.ensure_credit_checkpoint().await?;
            let outcome = jukebox.renew_credits().await?;
            println!(
                "Added {} credit(s), checkpoint at {}",
                outcome.credits_added, outcome.checkpoint
            );
        }
    }

    Ok(())
}

async fn serve(jukebox: &Jukebox) -> Result<()> {
    tracing::info!("Starting Jukebox Server");

    jukebox.ensure_credit_checkpoint().await?;

    let cancel = CancellationToken::new();
    let scheduler = tokio::spawn(jukebox_storage::credits::run_scheduler(
        jukebox.clone(),
        cancel.clone(),
    ));

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested");

    cancel.cancel();
    scheduler.await?;

    tracing::info!("Jukebox Server stopped");
    Ok(())
}

fn print_page(page: &SearchPage) {
    for song in &page.items {
        println!("  [{}] {}", song.id, song.title);
    }
    if page.total > page.items.len() as i64 {
        println!("  ... and {} more", page.total - page.items.len() as i64);
    }
    println!("{} song(s) found", page.total);
}
