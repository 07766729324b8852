//! Team-Up server binary: connection requests between users over HTTP.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use teamup_core::TeamUpConfig;
use teamup_server::{build_router, validate, AppState};

fn resolve_data_dir() -> PathBuf {
    std::env::var("TEAMUP_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    // Handle CLI subcommands
    if args.len() > 1 {
        match args[1].as_str() {
            "--validate" | "validate" => {
                let data_dir = if args.len() > 2 {
                    PathBuf::from(&args[2])
                } else {
                    resolve_data_dir()
                };
                let report = validate::validate(&data_dir);
                validate::print_report(&report);
                std::process::exit(if report.is_clean() { 0 } else { 1 });
            }
            "--help" | "-h" | "help" => {
                println!("Team-Up connection request server");
                println!();
                println!("Usage: teamup [command]");
                println!();
                println!("Commands:");
                println!("  (none)                   Start the server");
                println!("  validate [data-dir]      Check a SQLite store for broken relationships");
                println!("  help                     Show this help message");
                println!();
                println!("Environment: PORT, HOST, TEAMUP_STORAGE=memory|sqlite, TEAMUP_DATA_DIR");
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'teamup help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    let data_dir = resolve_data_dir();
    let config = TeamUpConfig::from_env(&data_dir)?;
    let addr = config.bind_addr();
    info!(
        "Data directory: {}, storage: {}",
        data_dir.display(),
        config.storage
    );

    let state = Arc::new(
        AppState::open(config).map_err(|e| anyhow::anyhow!("Failed to open store: {}", e))?,
    );
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Team-Up server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
