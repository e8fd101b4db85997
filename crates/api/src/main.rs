use std::env;

use anyhow::Context;

use attest_api::app::{build_app, AppConfig, AppServices};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    attest_observability::init();

    let config = config_from_env();
    let services = AppServices::new(&config)?;
    let app = build_app(services);

    let addr = env::var("ATTEST_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    tracing::info!(%addr, "attest-api listening");
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

fn config_from_env() -> AppConfig {
    AppConfig {
        access_secret: secret_from_env("ATTEST_ACCESS_SECRET", "dev-access-secret"),
        refresh_secret: secret_from_env("ATTEST_REFRESH_SECRET", "dev-refresh-secret"),
        signing_secret: secret_from_env("ATTEST_SIGNING_SECRET", "dev-signing-secret"),
        bootstrap_admin_email: env::var("ATTEST_ADMIN_EMAIL")
            .unwrap_or_else(|_| "admin@attest.local".to_string()),
        bootstrap_admin_password: secret_from_env("ATTEST_ADMIN_PASSWORD", "change-me-now"),
    }
}

fn secret_from_env(key: &str, dev_default: &str) -> String {
    match env::var(key) {
        Ok(value) if !value.is_empty() => value,
        _ => {
            tracing::warn!(key, "using insecure development default");
            dev_default.to_string()
        }
    }
}
