use std::sync::Arc;

use chrono::{Duration, Utc};

use buildmart_auth::{ActorRole, AuthClaims, StaticTokenValidator};
use buildmart_core::ActorId;
use buildmart_pricing::{GeocodeProvider, HttpGeocodeProvider, Warehouse};
use buildmart_sync::InMemoryAccountingClient;

use buildmart_api::app::{self, services};

const GEOCODE_ENDPOINT_DEFAULT: &str = "https://maps.googleapis.com/maps/api/geocode/json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    buildmart_observability::init();

    let validator = Arc::new(StaticTokenValidator::new());
    register_dev_tokens(&validator);

    let geocode_provider: Arc<dyn GeocodeProvider> = {
        let endpoint = std::env::var("GEOCODE_ENDPOINT")
            .unwrap_or_else(|_| GEOCODE_ENDPOINT_DEFAULT.to_string());
        let api_key = std::env::var("GEOCODE_API_KEY").unwrap_or_else(|_| {
            tracing::warn!("GEOCODE_API_KEY not set; lookups will fall back to regional coordinates");
            String::new()
        });
        Arc::new(HttpGeocodeProvider::new(endpoint, api_key))
    };

    // The accounting backend's wire client is deployment-specific; the stub
    // keeps the sync pipeline exercisable out of the box.
    tracing::warn!("no accounting backend configured; using in-memory stub");
    let accounting = Arc::new(InMemoryAccountingClient::new());

    let services = Arc::new(services::build_services(services::ServiceConfig {
        warehouses: load_warehouses()?,
        geocode_provider,
        accounting,
    }));

    let app = app::build_app(validator, services);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Warehouse catalog from `WAREHOUSES_FILE` (JSON array), or the built-in
/// demo catalog.
fn load_warehouses() -> anyhow::Result<Vec<Warehouse>> {
    match std::env::var("WAREHOUSES_FILE") {
        Ok(path) => {
            let raw = std::fs::read_to_string(&path)?;
            let warehouses: Vec<Warehouse> = serde_json::from_str(&raw)?;
            tracing::info!(count = warehouses.len(), path, "warehouse catalog loaded");
            Ok(warehouses)
        }
        Err(_) => {
            tracing::warn!("WAREHOUSES_FILE not set; using built-in demo catalog");
            Ok(services::default_warehouses())
        }
    }
}

/// Dev token table. `ADMIN_API_TOKEN` names the admin bearer token;
/// customer/vendor tokens are only ever minted per-deployment.
fn register_dev_tokens(validator: &StaticTokenValidator) {
    let admin_token = std::env::var("ADMIN_API_TOKEN").unwrap_or_else(|_| {
        tracing::warn!("ADMIN_API_TOKEN not set; using insecure dev default");
        "dev-admin-token".to_string()
    });
    let now = Utc::now();
    validator.register(
        admin_token,
        AuthClaims {
            sub: ActorId::new(),
            role: ActorRole::Admin,
            issued_at: now,
            expires_at: now + Duration::days(365),
        },
    );
}
