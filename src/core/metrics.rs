use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;
use crate::registry::{BatchAction, LifecycleError, RefreshReport};

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled || PROM_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

pub(crate) fn record_transition<T>(action: BatchAction, result: &Result<T, LifecycleError>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(err) => err.kind(),
    };
    metrics::counter!(
        "grade_transitions_total",
        "action" => action.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

pub(crate) fn record_score_update<T>(result: &Result<T, LifecycleError>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(err) => err.kind(),
    };
    metrics::counter!("grade_score_updates_total", "outcome" => outcome).increment(1);
}

pub(crate) fn record_refresh(report: Option<&RefreshReport>) {
    let outcome = match report {
        Some(report) if report.rejected.is_empty() => "ok",
        Some(_) => "partial",
        None => "failed",
    };
    metrics::counter!("registry_refresh_total", "outcome" => outcome).increment(1);
}
