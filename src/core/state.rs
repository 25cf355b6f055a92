use std::sync::Arc;

use tokio::sync::RwLock;

use crate::core::config::Settings;
use crate::registry::Registry;
use crate::services::sync::SnapshotSource;

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    registry: RwLock<Registry>,
    sync_source: Option<Arc<dyn SnapshotSource>>,
}

impl AppState {
    pub(crate) fn new(
        settings: Settings,
        registry: Registry,
        sync_source: Option<Arc<dyn SnapshotSource>>,
    ) -> Self {
        Self {
            inner: Arc::new(InnerState {
                settings,
                registry: RwLock::new(registry),
                sync_source,
            }),
        }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn registry(&self) -> &RwLock<Registry> {
        &self.inner.registry
    }

    pub(crate) fn sync_source(&self) -> Option<&Arc<dyn SnapshotSource>> {
        self.inner.sync_source.as_ref()
    }
}
