use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;

use crate::core::config::{Settings, SyncSourceKind};
use crate::core::metrics;
use crate::core::state::AppState;
use crate::registry::{RefreshReport, RegistrySnapshot};

/// Something the refresh loop can pull the shared-store snapshot from.
#[async_trait]
pub(crate) trait SnapshotSource: Send + Sync {
    fn describe(&self) -> String;

    async fn fetch(&self) -> Result<RegistrySnapshot>;
}

#[derive(Debug, Clone)]
pub(crate) struct FileSnapshotSource {
    path: PathBuf,
}

impl FileSnapshotSource {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SnapshotSource for FileSnapshotSource {
    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }

    async fn fetch(&self) -> Result<RegistrySnapshot> {
        let raw = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("Failed to read snapshot file {}", self.path.display()))?;
        serde_json::from_slice(&raw)
            .with_context(|| format!("Invalid snapshot JSON in {}", self.path.display()))
    }
}

#[derive(Debug, Clone)]
pub(crate) struct HttpSnapshotSource {
    client: Client,
    url: String,
    api_key: String,
}

impl HttpSnapshotSource {
    pub(crate) fn new(url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(timeout)
            .build()
            .context("Failed to build snapshot HTTP client")?;

        Ok(Self { client, url: url.to_string(), api_key: api_key.to_string() })
    }
}

#[async_trait]
impl SnapshotSource for HttpSnapshotSource {
    fn describe(&self) -> String {
        format!("http:{}", self.url)
    }

    async fn fetch(&self) -> Result<RegistrySnapshot> {
        let mut request = self.client.get(&self.url);
        if !self.api_key.is_empty() {
            request = request.header("apikey", &self.api_key).bearer_auth(&self.api_key);
        }

        let response = request.send().await.context("Snapshot request failed")?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Snapshot endpoint returned {status}: {body}");
        }

        response.json::<RegistrySnapshot>().await.context("Invalid snapshot payload")
    }
}

pub(crate) fn source_from_settings(settings: &Settings) -> Result<Option<Arc<dyn SnapshotSource>>> {
    let sync = settings.sync();
    let source: Arc<dyn SnapshotSource> = match &sync.source {
        SyncSourceKind::Disabled => return Ok(None),
        SyncSourceKind::File(path) => Arc::new(FileSnapshotSource::new(path.clone())),
        SyncSourceKind::Http(url) => {
            Arc::new(HttpSnapshotSource::new(url, &sync.api_key, sync.timeout())?)
        }
    };
    Ok(Some(source))
}

/// Pulls one snapshot and merges it. The fetch runs without the registry lock;
/// only the merge holds the write lock.
pub(crate) async fn refresh_registry(
    state: &AppState,
    source: &dyn SnapshotSource,
) -> Result<RefreshReport> {
    let snapshot = match source.fetch().await {
        Ok(snapshot) => snapshot,
        Err(err) => {
            metrics::record_refresh(None);
            return Err(err.context(format!("Refresh from {} failed", source.describe())));
        }
    };

    Ok(merge_snapshot(state, snapshot, &source.describe()).await)
}

/// Merges a snapshot under the registry write lock and reports the outcome.
pub(crate) async fn merge_snapshot(
    state: &AppState,
    snapshot: RegistrySnapshot,
    origin: &str,
) -> RefreshReport {
    let report = {
        let mut registry = state.registry().write().await;
        registry.apply_snapshot(snapshot)
    };
    metrics::record_refresh(Some(&report));

    if !report.rejected.is_empty() {
        tracing::warn!(
            origin,
            rejected = ?report.rejected,
            "Refresh skipped invalid snapshot entries"
        );
    }
    if !report.is_noop() {
        tracing::info!(
            origin,
            students_added = report.students_added,
            students_updated = report.students_updated,
            assignments_added = report.assignments_added,
            records_created = report.records_created,
            transactions_added = report.transactions_added,
            "Registry refreshed"
        );
    }

    report
}
