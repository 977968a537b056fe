//! Memoizing registry of initialized backends.
//!
//! Loading a synthesis engine can take minutes, so each backend preset is
//! initialized at most once per registry and kept for the registry's
//! lifetime. Entries are never evicted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::OnceCell;

use crate::backend::SynthesisBackend;
use crate::backends::create_backend;
use crate::config::Config;
use crate::error::{Result, TtsError};

/// Default deadline for a backend to become ready
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(600);

type Slot = Arc<OnceCell<Arc<dyn SynthesisBackend>>>;

/// Registry mapping a backend preset name to its loaded instance
pub struct BackendRegistry {
    config: Config,
    load_timeout: Duration,
    slots: Mutex<HashMap<String, Slot>>,
}

impl BackendRegistry {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            load_timeout: DEFAULT_LOAD_TIMEOUT,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Set the deadline applied to each backend load
    pub fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Insert an already-initialized backend under `name`.
    ///
    /// Returns false if `name` was already loaded.
    pub fn register(&self, name: &str, backend: Arc<dyn SynthesisBackend>) -> bool {
        self.slot(name).set(backend).is_ok()
    }

    /// Get the backend for `name`, loading it on first use.
    ///
    /// The load runs under the registry's deadline. A failed or timed-out
    /// load leaves the slot empty, so a later call tries again.
    pub async fn get(&self, name: &str) -> Result<Arc<dyn SynthesisBackend>> {
        let slot = self.slot(name);
        if let Some(backend) = slot.get() {
            return Ok(Arc::clone(backend));
        }

        let preset = self.config.get_backend(name)?.clone();
        let timeout = self.load_timeout;

        let backend = slot
            .get_or_try_init(|| async move {
                log::info!("Loading backend '{}' ({})", name, preset.kind);
                match tokio::time::timeout(timeout, create_backend(&preset)).await {
                    Ok(Ok(backend)) => Ok(Arc::from(backend)),
                    Ok(Err(e)) => Err(e),
                    Err(_) => Err(TtsError::LoadTimeout {
                        backend: name.to_string(),
                        timeout,
                    }),
                }
            })
            .await?;

        Ok(Arc::clone(backend))
    }

    /// Names of backends that finished loading
    pub fn loaded(&self) -> Vec<String> {
        let slots = self.slots.lock().unwrap();
        let mut names: Vec<String> = slots
            .iter()
            .filter(|(_, slot)| slot.initialized())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    fn slot(&self, name: &str) -> Slot {
        let mut slots = self.slots.lock().unwrap();
        Arc::clone(slots.entry(name.to_string()).or_default())
    }
}
