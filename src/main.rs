use hawkdash::api::{create_api_router, ApiState};
use hawkdash::push::{PushClient, PushSubscription};
use hawkdash::{
    BackendClient, BackendDataProvider, LiveDataStore, LocalStore, NotificationHub, Session,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hawkdash=info,tower_http=info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting HawkDash dashboard engine");

    // Configuration from environment variables
    let api_bind = std::env::var("API_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let backend_url = std::env::var("BACKEND_API_URL")
        .map_err(|_| anyhow::anyhow!("BACKEND_API_URL must be set. Example: https://monitoring.example.com"))?;
    let local_db = std::env::var("LOCAL_DB").unwrap_or_else(|_| "hawkdash.db".to_string());
    let refresh_seconds: Option<u64> = std::env::var("REFRESH_SECONDS")
        .ok()
        .and_then(|v| v.parse().ok());
    let environment: Option<i32> = std::env::var("ENVIRONMENT")
        .ok()
        .and_then(|v| v.parse().ok());
    let alert_days: u32 = std::env::var("ALERT_DAYS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(7);

    let session = match std::env::var("AUTH_TOKEN") {
        Ok(token) => Session::with_token(token),
        Err(_) => Session::anonymous(),
    };

    info!("Opening local store at {}", local_db);
    let store = Arc::new(LocalStore::open(&local_db).await?);

    info!("Backend API: {}", backend_url);
    let client = Arc::new(BackendClient::new(backend_url, session));
    let provider = Arc::new(BackendDataProvider::new(
        Arc::clone(&client),
        environment,
        alert_days,
    ));
    let live = Arc::new(LiveDataStore::new(provider));

    // First fetch happens eagerly so the API has data as soon as possible.
    // A failure here is not fatal: the timer (or a manual refresh) retries.
    if let Err(e) = live.refresh().await {
        warn!("Initial data fetch failed, starting without a snapshot: {e}");
    }

    match refresh_seconds {
        Some(secs) => {
            info!("Auto-refresh every {secs}s");
            live.schedule_refresh(Some(secs));
        }
        None => info!("Auto-refresh disabled (set REFRESH_SECONDS to enable)"),
    }

    let hub = Arc::new(NotificationHub::new());

    // Optional push channel: forwards backend notifications into the hub.
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    if let Ok(push_url) = std::env::var("PUSH_WS_URL") {
        let subscription = PushSubscription {
            environments: environment.into_iter().collect(),
            ..PushSubscription::default()
        };
        let push = PushClient::new(push_url, subscription, Arc::clone(&hub));
        tokio::spawn(async move {
            if let Err(e) = push.run(shutdown_rx).await {
                warn!("Push channel terminated: {e}");
            }
        });
    } else {
        info!("No PUSH_WS_URL configured, realtime notifications disabled");
        drop(shutdown_rx);
    }

    let api_state = ApiState {
        store,
        live,
        hub,
    };
    let app = create_api_router(api_state);

    let api_addr: SocketAddr = api_bind.parse()?;
    info!("Starting HTTP API server on {}", api_addr);

    let listener = tokio::net::TcpListener::bind(api_addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

    let _ = shutdown_tx.send(true);
    Ok(())
}
