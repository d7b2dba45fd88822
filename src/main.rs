use notification_client::{logging, Config, NotificationClient, StoreEvent, ToastEvent};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init_tracing();

    tracing::info!("Starting notification client");

    let config = Config::from_env()?;
    let token = std::env::var("SESSION_TOKEN")
        .map_err(|_| anyhow::anyhow!("SESSION_TOKEN is not set"))?;

    let mut client = NotificationClient::new(config, token)?;

    let mut store_events = client.subscribe_store().await;
    let mut toast_events = client.subscribe_toasts().await;

    tokio::spawn(async move {
        while let Some(event) = store_events.recv().await {
            match event {
                StoreEvent::NotificationAdded(n) => {
                    tracing::info!(id = %n.id, title = %n.title, "notification added")
                }
                StoreEvent::UnreadCountChanged(count) => {
                    tracing::info!(count, "unread count changed")
                }
                StoreEvent::SnapshotLoaded { total } => {
                    tracing::info!(total, "snapshot loaded")
                }
            }
        }
    });

    tokio::spawn(async move {
        while let Some(event) = toast_events.recv().await {
            match event {
                ToastEvent::Shown(n) => tracing::info!(id = %n.id, "toast shown"),
                ToastEvent::Dismissed(id) => tracing::info!(%id, "toast dismissed"),
                ToastEvent::Expired(id) => tracing::info!(%id, "toast expired"),
            }
        }
    });

    client.start().await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    client.shutdown().await;

    Ok(())
}
