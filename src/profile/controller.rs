//! Profile acquisition: cached read vs. compute trigger, with forced refresh.
//!
//! [`ProfileController`] is the single writer of its [`AcquisitionState`] and
//! publishes every transition on a `watch` channel for the rendering layer.
//! Each `acquire` takes a monotonic generation number; completions from a
//! superseded generation are dropped instead of overwriting newer state.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use gitfolio_config::Config;
use tokio::sync::watch;

use super::source::ProfileSource;
use super::state::{AcquisitionEvent, AcquisitionPath, AcquisitionState};
use super::types::ComputeResponse;

const MAX_USERNAME_LEN: usize = 39;

/// Orchestrates profile acquisition against a [`ProfileSource`].
pub struct ProfileController<S: ProfileSource> {
    source: Arc<S>,
    /// Wait after a successful compute before publishing `Ready`.
    settle_delay: Duration,
    /// Generation of the most recently started acquisition.
    generation: AtomicU64,
    state_tx: watch::Sender<AcquisitionState>,
}

impl<S: ProfileSource> ProfileController<S> {
    pub fn new(source: S, settle_delay: Duration) -> Self {
        Self::with_shared_source(Arc::new(source), settle_delay)
    }

    pub fn with_shared_source(source: Arc<S>, settle_delay: Duration) -> Self {
        let (state_tx, _) = watch::channel(AcquisitionState::Idle);
        Self {
            source,
            settle_delay,
            generation: AtomicU64::new(0),
            state_tx,
        }
    }

    pub fn from_config(source: S, config: &Config) -> Self {
        Self::new(source, config.settle_delay())
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> AcquisitionState {
        self.state_tx.borrow().clone()
    }

    /// Receive every subsequent state transition.
    pub fn subscribe(&self) -> watch::Receiver<AcquisitionState> {
        self.state_tx.subscribe()
    }

    /// Generation of the latest acquisition (0 before the first).
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Acquire the profile for `username`, settling in `Ready` or `Failed`.
    ///
    /// Without `force_refresh` a stored record is used when the cache read
    /// succeeds; any cache failure falls through to the compute trigger.
    /// With `force_refresh` the cache is never consulted.
    ///
    /// Concurrent calls are not coalesced. If a newer call starts before this
    /// one settles, this call's outcome is discarded and the returned value
    /// is whatever state is current at that point.
    pub async fn acquire(&self, username: &str, force_refresh: bool) -> AcquisitionState {
        let username = username.trim();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        self.transition(
            generation,
            AcquisitionEvent::Started {
                username: username.to_string(),
                refresh: force_refresh,
            },
        );
        crate::debug_info!(
            "ACQUIRE",
            "gen {} start username={} refresh={}",
            generation,
            username,
            force_refresh
        );

        let event = match check_username(username) {
            Err(reason) => AcquisitionEvent::Failed {
                username: username.to_string(),
                reason,
            },
            Ok(()) => self.resolve(username, force_refresh).await,
        };

        if !self.transition(generation, event) {
            log::debug!(
                "Discarding stale acquisition for '{}' (generation {} superseded by {})",
                username,
                generation,
                self.generation()
            );
            crate::debug_info!("ACQUIRE", "gen {} discarded as stale", generation);
        }
        self.state()
    }

    async fn resolve(&self, username: &str, force_refresh: bool) -> AcquisitionEvent {
        if !force_refresh {
            match self.source.cached_profile(username).await {
                Ok(record) => {
                    crate::debug_info!("ACQUIRE", "cache hit for {}", username);
                    return AcquisitionEvent::Resolved {
                        record,
                        path: AcquisitionPath::Cache,
                    };
                }
                Err(e) if e.is_not_found() => {
                    crate::debug_info!("ACQUIRE", "cache miss for {}", username);
                }
                Err(e) => {
                    log::warn!(
                        "Cached profile read for '{}' from {} failed, running analysis instead: {}",
                        username,
                        self.source.name(),
                        e
                    );
                }
            }
        }

        log::info!("Analyzing profile '{}' via {}", username, self.source.name());
        match self.source.compute_profile(username).await {
            Ok(ComputeResponse {
                data: Some(record), ..
            }) => {
                // Charts are written after the response returns; give them a
                // head start before dependants start loading them.
                if !self.settle_delay.is_zero() {
                    tokio::time::sleep(self.settle_delay).await;
                }
                AcquisitionEvent::Resolved {
                    record,
                    path: AcquisitionPath::Compute,
                }
            }
            Ok(ComputeResponse { message, .. }) => {
                let reason = message
                    .filter(|m| !m.is_empty())
                    .map(|m| format!("Analysis returned no profile data: {m}"))
                    .unwrap_or_else(|| "Analysis returned no profile data".to_string());
                log::error!("Analysis of '{}' failed: {}", username, reason);
                AcquisitionEvent::Failed {
                    username: username.to_string(),
                    reason,
                }
            }
            Err(e) => {
                log::error!("Analysis of '{}' failed: {}", username, e);
                crate::debug_error!("ACQUIRE", "compute failed for {}: {}", username, e);
                AcquisitionEvent::Failed {
                    username: username.to_string(),
                    reason: e.user_message(),
                }
            }
        }
    }

    /// Apply `event` if `generation` is still current. Returns whether the
    /// state was updated.
    fn transition(&self, generation: u64, event: AcquisitionEvent) -> bool {
        self.state_tx.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            let next = state.apply(event);
            crate::debug_trace!("ACQUIRE", "gen {} -> {:?}", generation, next.status());
            *state = next;
            true
        })
    }
}

/// GitHub usernames are ASCII alphanumerics and hyphens, at most 39 long.
fn check_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username must not be empty".to_string());
    }
    let valid = username.len() <= MAX_USERNAME_LEN
        && !username.starts_with('-')
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(format!("Invalid GitHub username '{}'", username))
    }
}
