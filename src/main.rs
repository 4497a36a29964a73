use std::sync::Arc;

use api_rest::AppState;
use chitfund_core::config::{
    actor_from_env_values, data_dir_from_env_value, store_file_from_env_value,
};
use chitfund_core::{ChangeNotifier, CoreConfig, JsonFileRepository, SubscriberDirectory};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the chit fund onboarding server
///
/// Resolves configuration once, opens the JSON subscriber store and serves the REST API.
///
/// # Environment Variables
/// - `CHITFUND_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `CHITFUND_DATA_DIR`: Directory holding the subscriber store (default: "chitfund_data")
/// - `CHITFUND_STORE_FILE`: Store file name inside the data directory (default: "subscribers.json")
/// - `CHITFUND_ACTOR_NAME` / `CHITFUND_ACTOR_ROLE`: Actor stamped on new records
///
/// A `.env` file in the working directory is loaded first if present.
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - configuration values are invalid,
/// - the existing store cannot be read,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("chitfund_run=info".parse()?)
                .add_directive("chitfund_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = CoreConfig::new(
        data_dir_from_env_value(std::env::var("CHITFUND_DATA_DIR").ok()),
        store_file_from_env_value(std::env::var("CHITFUND_STORE_FILE").ok())?,
        actor_from_env_values(
            std::env::var("CHITFUND_ACTOR_NAME").ok(),
            std::env::var("CHITFUND_ACTOR_ROLE").ok(),
        )?,
    )?;

    let directory = Arc::new(SubscriberDirectory::new(
        Arc::new(JsonFileRepository::from_config(&cfg)),
        ChangeNotifier::default(),
    ));
    let state = AppState::new(&cfg, directory)?;

    let rest_addr = std::env::var("CHITFUND_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    tracing::info!("++ Starting chit fund REST on {}", rest_addr);
    tracing::info!("++ Subscriber store at {}", cfg.store_path().display());

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, api_rest::router(state))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("-- Shutting down");
        })
        .await?;

    Ok(())
}
