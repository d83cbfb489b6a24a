use hotel_backoffice::{config, migrator};
use tracing::{error, info};

/// Applies (`up`, the default) or rolls back (`down`) the schema for the
/// configured database. `DATABASE_URL` overrides the configured URL.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => config::load_config()?.database_url,
    };
    let command = std::env::args().nth(1).unwrap_or_else(|| "up".to_string());

    info!(%command, "Starting database migration");

    match command.as_str() {
        "up" => migrator::run_migration(&database_url).await?,
        "down" => migrator::revert_all(&database_url).await?,
        other => {
            error!("Unknown migration command '{}'; expected 'up' or 'down'", other);
            anyhow::bail!("unknown migration command: {}", other);
        }
    }

    info!("Migration command finished");
    Ok(())
}
