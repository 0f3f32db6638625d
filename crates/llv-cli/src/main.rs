mod server;

use std::path::PathBuf;

use llv_core::render;
use llv_core::store::EntityStore;
use llv_store::{SessionStore, persistence_enabled};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rmcp::{ServiceExt, transport::stdio};

#[derive(Parser)]
#[command(name = "llv", about = "Lines-loops-vibes creativity engine CLI and MCP server")]
struct Cli {
    /// Override the data directory (or set LLV_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server on stdio transport
    Serve,

    /// Render a saved session as the system visualization
    Show {
        /// Session name (defaults to the shared session)
        session: Option<String>,

        /// Hide per-entity rhythm patterns
        #[arg(long)]
        no_rhythms: bool,

        /// Beat-grid window size
        #[arg(long, default_value_t = 16)]
        time_window: u32,
    },

    /// Show entity counts for a saved session
    Stats {
        /// Session name (defaults to the shared session)
        session: Option<String>,
    },
}

fn open_sessions(cli: &Cli) -> Result<SessionStore> {
    let env_dir = std::env::var("LLV_DATA_DIR").ok().map(PathBuf::from);
    let dir = cli.data_dir.clone().or(env_dir);
    SessionStore::open(dir.as_deref()).context("failed to open session store")
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Serve => cmd_serve(&cli).await,
        Commands::Show {
            session,
            no_rhythms,
            time_window,
        } => cmd_show(&cli, session.as_deref(), !no_rhythms, *time_window),
        Commands::Stats { session } => cmd_stats(&cli, session.as_deref()),
    }
}

async fn cmd_serve(cli: &Cli) -> Result<()> {
    let sessions = open_sessions(cli)?;
    let restore = persistence_enabled();
    tracing::info!(
        "starting MCP server (data dir {}, persistence {})",
        sessions.data_dir().display(),
        if restore { "on" } else { "off" },
    );

    let server = server::LlvServer::new(sessions, restore);
    let service = server
        .serve(stdio())
        .await
        .context("failed to start MCP server")?;
    service.waiting().await?;
    Ok(())
}

/// Load a saved session into a fresh store; `Ok(None)` when no file exists.
fn load_session(cli: &Cli, session: Option<&str>) -> Result<Option<EntityStore>> {
    let sessions = open_sessions(cli)?;
    let mut store = EntityStore::new();
    let mut rng = SmallRng::from_os_rng();
    let stats = sessions
        .load_into(&mut store, session, false, &mut rng)
        .context("failed to load session")?;
    Ok(stats.map(|_| store))
}

fn cmd_show(cli: &Cli, session: Option<&str>, show_rhythms: bool, time_window: u32) -> Result<()> {
    match load_session(cli, session)? {
        Some(store) => println!("{}", render::system_overview(&store, show_rhythms, time_window)),
        None => println!("(no saved session)"),
    }
    Ok(())
}

fn cmd_stats(cli: &Cli, session: Option<&str>) -> Result<()> {
    let sessions = open_sessions(cli)?;
    let path = sessions.session_path(session);

    match load_session(cli, session)? {
        Some(store) => {
            let (lines, loops, vibes, contexts) = store.counts();
            let file_size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            println!("session:   {}", path.display());
            println!("lines:     {lines}");
            println!("loops:     {loops}");
            println!("vibes:     {vibes}");
            println!("contexts:  {contexts}");
            println!("file_size: {:.1}KB", file_size as f64 / 1024.0);
        }
        None => println!("(no saved session at {})", path.display()),
    }
    Ok(())
}
