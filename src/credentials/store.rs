//! In-memory credential store with a one-time persisted fallback.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::bundle::CredentialSet;
use super::source::CredentialSource;

/// Holds the session's credentials.
///
/// An explicit [`set_credentials`](Self::set_credentials) always wins. When
/// nothing was set, the first read loads from the persisted source once; a
/// failed or empty load is not retried. Once anything was set explicitly the
/// persisted source is never consulted, so an explicitly empty set stays empty.
pub struct CredentialStore {
    source: Option<Arc<dyn CredentialSource>>,
    state: RwLock<StoreState>,
}

#[derive(Default)]
struct StoreState {
    explicit: Option<Arc<CredentialSet>>,
    persisted: Option<Arc<CredentialSet>>,
    fallback_attempted: bool,
}

impl CredentialStore {
    /// Creates a store without a persisted source.
    #[must_use]
    pub fn new() -> Self {
        Self {
            source: None,
            state: RwLock::new(StoreState::default()),
        }
    }

    /// Creates a store that falls back to `source`.
    #[must_use]
    pub fn with_source(source: Arc<dyn CredentialSource>) -> Self {
        Self {
            source: Some(source),
            state: RwLock::new(StoreState::default()),
        }
    }

    /// Replaces the stored credentials wholesale.
    pub async fn set_credentials(&self, credentials: CredentialSet) {
        let mut state = self.state.write().await;
        info!("Credentials set for {:?}", credentials.providers());
        state.explicit = Some(Arc::new(credentials));
    }

    /// Returns true once credentials have been set explicitly.
    pub async fn is_explicitly_set(&self) -> bool {
        self.state.read().await.explicit.is_some()
    }

    /// Returns a snapshot of the current credentials.
    pub async fn get_credentials(&self) -> Arc<CredentialSet> {
        {
            let state = self.state.read().await;
            if let Some(explicit) = &state.explicit {
                return Arc::clone(explicit);
            }
            if state.fallback_attempted {
                return state.persisted.clone().unwrap_or_default();
            }
        }

        let mut state = self.state.write().await;
        // Another caller may have set or loaded while we waited for the lock
        if let Some(explicit) = &state.explicit {
            return Arc::clone(explicit);
        }
        if !state.fallback_attempted {
            state.fallback_attempted = true;
            state.persisted = self.load_persisted().await;
        }
        state.persisted.clone().unwrap_or_default()
    }

    async fn load_persisted(&self) -> Option<Arc<CredentialSet>> {
        let source = self.source.as_ref()?;
        match source.load().await {
            Ok(Some(set)) => {
                info!(
                    "Loaded persisted credentials for {:?} from {}",
                    set.providers(),
                    source.name()
                );
                Some(Arc::new(set))
            }
            Ok(None) => {
                debug!("No persisted credentials in {}", source.name());
                None
            }
            Err(e) => {
                warn!("Ignoring persisted credentials from {}: {e}", source.name());
                None
            }
        }
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("source", &self.source.as_ref().map(|s| s.name()))
            .finish_non_exhaustive()
    }
}
