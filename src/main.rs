use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use keydash::api::{self, AppState};
use keydash::cli;
use keydash::clipboard::{Clipboard, CommandClipboard, NoClipboard};
use keydash::config;
use keydash::dashboard::Dashboard;
use keydash::models::api_key::KeyId;
use keydash::store::memory::MemoryKeyStore;
use keydash::store::rest::RestKeyStore;
use keydash::store::KeyStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "keydash=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    let dashboard = build_dashboard(&cfg, args.in_memory)?;

    let result = match args.command {
        Some(cli::Commands::Serve { port }) => {
            run_server(dashboard, port.unwrap_or(cfg.port)).await
        }
        Some(cli::Commands::Keys { command }) => {
            handle_key_command(command, &dashboard).await
        }
        None => run_server(dashboard, cfg.port).await,
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

fn build_dashboard(cfg: &config::Config, in_memory: bool) -> anyhow::Result<Dashboard> {
    let store: Arc<dyn KeyStore> = if in_memory {
        tracing::warn!("Using in-memory key store; keys will not be persisted");
        Arc::new(MemoryKeyStore::new())
    } else {
        let (url, key) = cfg.store_credentials()?;
        let store = RestKeyStore::new(url, &cfg.table, key)?;
        tracing::info!("Using key store at {}", store.collection_url());
        Arc::new(store)
    };

    let clipboard: Arc<dyn Clipboard> = match cfg
        .clipboard_cmd
        .as_deref()
        .and_then(CommandClipboard::from_command_line)
    {
        Some(cb) => Arc::new(cb),
        None => {
            tracing::debug!("No clipboard command configured; copy is unavailable");
            Arc::new(NoClipboard)
        }
    };

    Ok(Dashboard::new(store, clipboard, cfg.dashboard_settings()))
}

async fn run_server(dashboard: Dashboard, port: u16) -> anyhow::Result<()> {
    // The page shows its loading state until the first fetch resolves.
    let loader = dashboard.clone();
    tokio::spawn(async move {
        if let Err(e) = loader.load().await {
            tracing::warn!("Initial key load failed: {}", e);
        }
    });

    let state = Arc::new(AppState { dashboard });
    let app = api::app(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("keydash dashboard listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn handle_key_command(
    cmd: cli::KeyCommands,
    dashboard: &Dashboard,
) -> anyhow::Result<()> {
    dashboard.load().await?;

    let outcome = match cmd {
        cli::KeyCommands::List { reveal } => {
            let keys = dashboard.keys().await;
            if keys.is_empty() {
                println!("No API keys found. Create one to get started.");
            } else {
                println!("{:<38} {:<24} {:<8} KEY", "ID", "NAME", "USAGE");
                for k in keys {
                    println!(
                        "{:<38} {:<24} {:<8} {}",
                        k.id,
                        k.name,
                        k.usage,
                        k.display_key(reveal)
                    );
                }
            }
            Ok(())
        }
        cli::KeyCommands::Create { name } => dashboard.create_key(&name).await.map(|created| {
            println!("  ID:  {}\n  Key: {}", created.id, created.key);
        }),
        cli::KeyCommands::Rename { id, name } => dashboard.rename_key(&KeyId::from(id), &name).await,
        cli::KeyCommands::Delete { id } => dashboard.delete_key(&KeyId::from(id)).await.map(|_| ()),
        cli::KeyCommands::Copy { id } => dashboard.copy_key_by_id(&KeyId::from(id)).await,
        cli::KeyCommands::Show { id } => {
            let id = KeyId::from(id);
            match dashboard.key(&id).await {
                Some(k) => {
                    println!("{}", k.key);
                    Ok(())
                }
                None => anyhow::bail!("API key not found: {}", id),
            }
        }
    };

    if let Some(note) = dashboard.notification().await {
        println!("{}", note.message);
    }
    outcome.map_err(anyhow::Error::from)
}
