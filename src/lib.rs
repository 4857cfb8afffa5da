pub mod api;
pub mod config;
pub mod db;
pub mod entities;
pub mod security;

use tokio::signal;

pub use config::Config;
use db::Store;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        None | Some("serve" | "-d" | "--daemon") => run_server(config).await,

        Some("bootstrap-admin") => {
            let username = args.get(2).map_or("admin", String::as_str);
            cmd_bootstrap_admin(&config, username).await
        }

        Some("reset-password") => {
            let Some(username) = args.get(2) else {
                println!("Usage: boardarr reset-password <username>");
                return Ok(());
            };
            cmd_reset_password(&config, username).await
        }

        Some("help" | "-h" | "--help") => {
            print_help();
            Ok(())
        }

        Some(other) => {
            println!("Unknown command: {other}");
            println!();
            print_help();
            Ok(())
        }
    }
}

fn print_help() {
    println!("Boardarr - Multi-tenant dashboard backend");
    println!();
    println!("USAGE:");
    println!("  boardarr [COMMAND]");
    println!();
    println!("COMMANDS:");
    println!("  serve                     Run the API server (default)");
    println!("  bootstrap-admin [name]    Create the admin account if missing");
    println!("  reset-password <name>     Reset a user's password");
    println!("  help                      Show this help message");
    println!();
    println!("CONFIG:");
    println!("  Edit boardarr.toml, or set BOARDARR_CONFIG / BOARDARR_DATABASE_URL.");
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    info!("Boardarr v{} starting...", env!("CARGO_PKG_VERSION"));

    let state = api::create_app_state_from_config(config.clone()).await?;
    let app = api::router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("API server listening at http://{addr}");

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Server error: {e}");
        }
    });

    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {e}"),
    }

    server_handle.abort();
    info!("Server stopped");

    Ok(())
}

async fn cmd_bootstrap_admin(config: &Config, username: &str) -> anyhow::Result<()> {
    let store = Store::with_pool_options(
        &config.general.database_url,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    if let Some(existing) = store.find_user_by_username(username).await? {
        println!(
            "User '{}' already exists (admin: {}). Nothing to do.",
            existing.username, existing.is_admin
        );
        return Ok(());
    }

    let password = security::generate_secret();
    store.create_user(username, &password, true).await?;

    println!("✓ Admin account created: {username}");
    println!();
    println!("  Password: {password}");
    println!();
    println!("This password is shown once. Change it after first login.");

    Ok(())
}

async fn cmd_reset_password(config: &Config, username: &str) -> anyhow::Result<()> {
    let store = Store::with_pool_options(
        &config.general.database_url,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let Some(user) = store.find_user_by_username(username).await? else {
        println!("User '{username}' not found.");
        return Ok(());
    };

    let password = security::generate_secret();
    store.update_user_password(user.id, &password).await?;

    println!("✓ Password reset for: {username}");
    println!();
    println!("  New password: {password}");
    println!();
    println!("This password is shown once. Existing sessions stay valid.");

    Ok(())
}
