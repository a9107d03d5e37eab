//! Dispatches bound hotkeys against the bridge store.

use firerate_bridge::BridgeStore;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

use crate::bindings::{Action, Bindings};
use crate::combo::Combo;
use crate::error::HotkeyError;
use crate::randomizer::Randomizer;

/// Result of handling one combination.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// Nothing bound to the combination
    Unbound,
    /// A feature was written
    Applied {
        /// Feature name
        feature: String,
        /// Value stored after clamping
        value: f64,
    },
    /// Random mode toggled; `true` when now running
    RandomMode(bool),
    /// Quit requested
    Quit,
}

/// Bindings, store and random mode wired together.
#[derive(Debug)]
pub struct OverrideLayer {
    store: Arc<BridgeStore>,
    bindings: Bindings,
    randomizer: Randomizer,
}

impl OverrideLayer {
    /// Layer over validated `bindings`.
    pub fn new(store: Arc<BridgeStore>, bindings: Bindings, randomizer: Randomizer) -> Self {
        Self {
            store,
            bindings,
            randomizer,
        }
    }

    /// Active bindings.
    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Random mode controller.
    pub fn randomizer(&self) -> &Randomizer {
        &self.randomizer
    }

    /// Perform the action bound to `combo`.
    ///
    /// # Errors
    ///
    /// [`HotkeyError::Bridge`] when the write fails, [`HotkeyError::Task`]
    /// if the blocking write task died.
    pub async fn handle(&mut self, combo: &Combo) -> Result<Dispatch, HotkeyError> {
        let Some(action) = self.bindings.lookup(combo).cloned() else {
            debug!(%combo, "No binding");
            return Ok(Dispatch::Unbound);
        };

        match action {
            Action::Set { feature, value } => {
                let store = Arc::clone(&self.store);
                let name = feature.clone();
                let stored =
                    tokio::task::spawn_blocking(move || store.set(&name, value)).await??;
                info!(%feature, value = %self.display(&feature, stored), "Set");
                Ok(Dispatch::Applied {
                    feature,
                    value: stored,
                })
            }
            Action::Adjust { feature, delta } => {
                let store = Arc::clone(&self.store);
                let name = feature.clone();
                let stored =
                    tokio::task::spawn_blocking(move || store.adjust(&name, delta)).await??;
                info!(%feature, value = %self.display(&feature, stored), delta, "Adjusted");
                Ok(Dispatch::Applied {
                    feature,
                    value: stored,
                })
            }
            Action::ToggleRandom => Ok(Dispatch::RandomMode(self.randomizer.toggle().await)),
            Action::Quit => Ok(Dispatch::Quit),
        }
    }

    /// Handle combinations from `events` until quit, `shutdown`, or the
    /// source closing. Random mode is stopped before returning.
    ///
    /// A failed action is logged and does not end the loop.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<Combo>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Self {
        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                event = events.recv() => {
                    let Some(combo) = event else {
                        info!("Hotkey source closed");
                        break;
                    };
                    match self.handle(&combo).await {
                        Ok(Dispatch::Quit) => {
                            info!(%combo, "Quit requested");
                            break;
                        }
                        Ok(_) => {}
                        Err(e) => error!(%combo, error = %e, "Hotkey action failed"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        if self.randomizer.stop().await {
            info!("Random mode stopped for shutdown");
        }
        self
    }

    fn display(&self, feature: &str, value: f64) -> String {
        self.store
            .format_value(feature, value)
            .unwrap_or_else(|_| value.to_string())
    }
}
