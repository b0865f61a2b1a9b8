// Relay server binary.
// Serves the stateless token-injecting proxy the dashboard front end
// talks to. Configuration comes from the environment.

use homeroom::relay::{RelayConfig, router};

#[tokio::main]
async fn main() -> homeroom::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = RelayConfig::from_env();
    let app = router(&config)?;

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("relay listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
