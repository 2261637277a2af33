use anyhow::Context;
use mimalloc::MiMalloc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ticket_client::{
    api_client::LoginRequest,
    config::{Config, LogFormat},
    TicketClient,
};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env().context("Failed to load configuration")?;

    let registry = tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(&config.app.rust_log));
    match config.app.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    info!("Starting ticket mirror sync ({})", config.app.environment);

    let client = TicketClient::new(config.clone())
        .await
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to open mirror")?;
    info!("Mirror ready at {}", config.mirror.url);

    // Публичный список событий доступен без токена
    match client.api.get_events().await {
        Ok(events) => {
            client.sync().mirror_events(&events).await.context("Failed to mirror events")?;
        }
        Err(e) => warn!("Event list unavailable, keeping mirrored copy: {}", e),
    }

    let Some(account) = config.api.service_account.clone() else {
        info!("API_EMAIL/API_PASSWORD not set, skipping admin ticket sync");
        return Ok(());
    };

    // Права администратора приходят с сервера вместе с токеном
    let session = client
        .api
        .login(&LoginRequest { email: account.email, password: account.password })
        .await
        .context("Service account login failed")?;

    let mut admin = client.admin(session)?;
    let outcome = admin.refresh().await?;
    info!(
        "Admin refresh: {:?}, {} pending deletes synced, {} still pending",
        outcome.freshness, outcome.deletes_synced, outcome.deletes_pending
    );

    for event in admin.events().await? {
        admin.select_event(Some(&event.id));
        let users = admin.users().await?;
        info!("Event '{}' ({} seats left): {} users", event.name, event.seats_left(), users.len());

        for user in users {
            admin.select_user(Some(&user.id));
            let tickets = admin.tickets().await?;
            let seats: Vec<u32> = tickets.iter().flat_map(|t| t.seat_numbers.iter().copied()).collect();
            info!("  {} <{}>: {} tickets, seats {:?}", user.name, user.email, tickets.len(), seats);
        }
    }

    Ok(())
}
