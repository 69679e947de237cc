mod service;

use std::{net::SocketAddr, sync::Arc};

use bscr::{
    config::{DbConfig, ScrapeConfig},
    db::{PgStore, connect_lazy},
    scrape::ChromeDriver,
};

#[derive(clap::Parser)]
#[command(about = "Web UI for searching and saving bus listings")]
struct Args {
    /// Address to serve the UI on
    #[arg(short, long, env = "LISTEN", default_value = "127.0.0.1:8000")]
    listen: SocketAddr,
    #[command(flatten)]
    db: DbConfig,
    #[command(flatten)]
    scrape: ScrapeConfig,
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(target: "server", "cannot listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!(target: "server", "shutting down ...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use axum::{
        Router,
        routing::{get, post},
        serve,
    };
    use clap::Parser;
    use tokio::net::TcpListener;

    pretty_env_logger::init_timed();

    let args = Args::parse();

    let store = PgStore::new(connect_lazy(&args.db));
    if let Err(e) = store.ensure_schema().await {
        tracing::warn!(target: "db", "database unavailable, searches will not be saved until it is back: {e}");
    }

    let state = Arc::new(service::AppState::new(ChromeDriver::new(args.scrape), store));

    let app: Router = Router::new()
        .route("/", get(service::index))
        .route("/search", post(service::search))
        .route("/history", get(service::history))
        .with_state(state);

    let listener = TcpListener::bind(args.listen).await?;
    tracing::info!(target: "server", "listening on \x1b[1;36mhttp://{}\x1b[0m", listener.local_addr()?);

    serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
