pub mod registry;

pub(crate) mod api;
pub(crate) mod core;
pub(crate) mod schemas;
pub(crate) mod services;
pub(crate) mod tasks;

#[cfg(test)]
mod test_support;

use tokio::sync::watch;

use crate::core::security::{self, PortalRole};
use crate::core::{config::Settings, state::AppState, telemetry};
use crate::registry::Registry;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;
    core::metrics::init(&settings)?;

    let sync_source = services::sync::source_from_settings(&settings)?;
    let state = AppState::new(settings, Registry::new(), sync_source);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let refresh_handle = state.sync_source().cloned().map(|source| {
        tokio::spawn(tasks::scheduler::run_refresh_loop(state.clone(), source, shutdown_rx))
    });
    if !state.settings().sync().is_enabled() {
        tracing::warn!("SYNC_SOURCE not configured; registry changes only through the API");
    }

    let app = api::router::router(state.clone());
    let listener = tokio::net::TcpListener::bind(state.settings().server_addr()).await?;

    tracing::info!(
        host = %state.settings().server_host(),
        port = state.settings().server_port(),
        environment = %state.settings().runtime().environment.as_str(),
        "Gradegate API listening"
    );

    let result =
        axum::serve(listener, app).with_graceful_shutdown(core::shutdown::shutdown_signal()).await;

    if shutdown_tx.send(true).is_err() {
        tracing::debug!("Refresh loop already stopped");
    }
    if let Some(handle) = refresh_handle {
        if let Err(err) = handle.await {
            tracing::error!(error = %err, "Refresh loop join failed");
        }
    }

    result?;

    Ok(())
}

/// Mints a bearer token for `role` with the current settings. Used by the
/// `issue-token` operator binary.
pub fn issue_token(
    role: &str,
    subject: &str,
    student_ids: &[String],
    expires_minutes: Option<i64>,
) -> anyhow::Result<String> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    let role: PortalRole = role.parse()?;
    let token = security::create_access_token(
        subject,
        role,
        student_ids,
        &settings,
        expires_minutes.map(::time::Duration::minutes),
    )?;

    Ok(token)
}
