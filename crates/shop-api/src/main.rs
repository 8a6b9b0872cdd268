//! # Storefront
//!
//! Hosted-checkout storefront server.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export PRIMER_API_KEY=...
//!
//! # Run the server
//! storefront
//! ```

use shop_api::{routes, state::AppState};
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    print_banner();

    let state = AppState::new()?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Products loaded: {}", state.catalog.len());
    info!("Session provider: {}", state.provider.provider_name());
    if !state.provider.is_configured() {
        warn!("Session provider has no API key; checkout will fail until PRIMER_API_KEY is set");
    }

    let app = routes::create_router(state);

    info!("🛒 Storefront starting on http://{}", addr);

    if !is_prod {
        info!("📝 Health: http://{}/health", addr);
        info!("💳 Client session: POST http://{}/api/client-session", addr);
        info!("🔑 Provider check: GET http://{}/api/provider-check", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
  🛒 Storefront 🛒
  ━━━━━━━━━━━━━━━━━━━━━━━
  Hosted checkout, sandbox edition
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}
