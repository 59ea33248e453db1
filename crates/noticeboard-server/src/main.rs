use std::net::SocketAddr;
use std::path::PathBuf;

use tracing::info;

use noticeboard_api::AppStateInner;
use noticeboard_db::Database;

const DEFAULT_LOG_FILTER: &str =
    "noticeboard_server=debug,noticeboard_api=debug,noticeboard_db=debug,tower_http=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .init();

    // Config
    let db_path: PathBuf = std::env::var("NOTICEBOARD_DB_PATH")
        .unwrap_or_else(|_| "noticeboard.db".into())
        .into();
    let host = std::env::var("NOTICEBOARD_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("NOTICEBOARD_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    let db = Database::open(&db_path)?;
    info!("Board holds {} notices", db.count_notices()?);

    let app = noticeboard_api::router(AppStateInner::new(db));

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Noticeboard server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                tracing::warn!("SIGTERM handler unavailable: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
