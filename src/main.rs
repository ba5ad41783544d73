use std::net::SocketAddr;
use std::sync::Arc;

use commission_market::{
    config::{get_config, init_config, LogFormat},
    database::pool::create_pool,
    routes,
    store::{memory::MemoryStore, postgres::PgStore},
    AppState,
};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info,sqlx=warn"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_config()?;
    let config = get_config();
    init_tracing(config.log_format);

    let app_state = match config.database_url.as_deref() {
        Some(url) => {
            let pool = create_pool(url, config.database_max_connections).await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            info!("Connected to Postgres, migrations applied");
            AppState::new(Arc::new(PgStore::new(pool)), &config.jwt_secret)
        }
        None => {
            warn!("DATABASE_URL is not set, state lives in memory and is lost on restart");
            AppState::new(Arc::new(MemoryStore::new()), &config.jwt_secret)
        }
    };

    let app = routes::router(app_state, config.api_rps);

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
