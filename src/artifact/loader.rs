//! Cancellable retrying artifact loader.
//!
//! Each load waits the policy's initial delay, probes, and on failure waits a
//! linearly growing backoff before probing again. Every wait and every probe
//! races the load's [`CancellationToken`]; once the token fires no further
//! probe starts and no further state is published.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::probe::ArtifactProbe;
use super::state::ArtifactLoadState;
use crate::retry::RetryPolicy;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArtifactError {
    #[error("artifact load of {url} cancelled after {attempt} retries")]
    Cancelled { url: String, attempt: u32 },
}

/// Drives [`ArtifactLoadState`] for one URL at a time against a probe.
pub struct ArtifactLoader<P: ArtifactProbe> {
    probe: Arc<P>,
    policy: RetryPolicy,
}

impl<P: ArtifactProbe> Clone for ArtifactLoader<P> {
    fn clone(&self) -> Self {
        Self {
            probe: Arc::clone(&self.probe),
            policy: self.policy,
        }
    }
}

impl<P: ArtifactProbe> ArtifactLoader<P> {
    pub fn new(probe: P, policy: RetryPolicy) -> Self {
        Self::with_shared_probe(Arc::new(probe), policy)
    }

    pub fn with_shared_probe(probe: Arc<P>, policy: RetryPolicy) -> Self {
        Self { probe, policy }
    }

    pub fn probe(&self) -> &Arc<P> {
        &self.probe
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run a load to completion on the current task.
    ///
    /// Returns the terminal state, or [`ArtifactError::Cancelled`] if `cancel`
    /// fired first.
    pub async fn load(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<ArtifactLoadState, ArtifactError> {
        let (state_tx, _) = watch::channel(ArtifactLoadState::pending());
        self.run(url, cancel, &state_tx).await
    }

    /// Start a load on a background task.
    ///
    /// The returned handle owns the load: cancelling or dropping it stops
    /// further probes and state changes.
    pub fn spawn(&self, url: impl Into<String>) -> ArtifactHandle {
        let url = url.into();
        let cancel = CancellationToken::new();
        let (state_tx, state_rx) = watch::channel(ArtifactLoadState::pending());

        let loader = self.clone();
        let task_url = url.clone();
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            match loader.run(&task_url, &token, &state_tx).await {
                Ok(state) => {
                    crate::debug_info!("ARTIFACT", "{} settled: {:?}", task_url, state.status);
                }
                Err(e) => {
                    crate::debug_info!("ARTIFACT", "{}", e);
                }
            }
        });

        ArtifactHandle {
            url,
            state_rx,
            cancel,
            task: Some(task),
        }
    }

    async fn run(
        &self,
        url: &str,
        cancel: &CancellationToken,
        state_tx: &watch::Sender<ArtifactLoadState>,
    ) -> Result<ArtifactLoadState, ArtifactError> {
        let mut state = ArtifactLoadState::pending();
        let cancelled = |state: &ArtifactLoadState| ArtifactError::Cancelled {
            url: url.to_string(),
            attempt: state.attempt,
        };

        if !wait_unless_cancelled(self.policy.initial_delay, cancel).await {
            return Err(cancelled(&state));
        }

        loop {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled(&state)),
                result = self.probe.probe(url) => result,
            };

            if let Err(e) = &result {
                crate::debug_log!(
                    "ARTIFACT",
                    "probe {} of {} failed: {}",
                    state.attempt + 1,
                    url,
                    e
                );
            }

            let step = state.on_probe(url, result.is_ok(), &self.policy);
            if cancel.is_cancelled() {
                return Err(cancelled(&state));
            }
            state = step.state;
            state_tx.send_replace(state.clone());

            match step.retry_after {
                None => {
                    if state.is_unavailable() {
                        log::warn!(
                            "Artifact {} unavailable after {} retries",
                            url,
                            state.attempt
                        );
                    }
                    return Ok(state);
                }
                Some(delay) => {
                    crate::debug_trace!(
                        "ARTIFACT",
                        "retry {} of {} in {:?}",
                        state.attempt,
                        url,
                        delay
                    );
                    if !wait_unless_cancelled(delay, cancel).await {
                        return Err(cancelled(&state));
                    }
                }
            }
        }
    }
}

/// Sleep for `delay` unless `cancel` fires first. Returns `false` if cancelled.
async fn wait_unless_cancelled(delay: Duration, cancel: &CancellationToken) -> bool {
    if delay.is_zero() {
        return !cancel.is_cancelled();
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

/// Owner of a spawned artifact load.
///
/// Dropping the handle cancels the load.
pub struct ArtifactHandle {
    url: String,
    state_rx: watch::Receiver<ArtifactLoadState>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ArtifactHandle {
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Latest published state.
    pub fn state(&self) -> ArtifactLoadState {
        self.state_rx.borrow().clone()
    }

    /// Receive every subsequent state change.
    pub fn subscribe(&self) -> watch::Receiver<ArtifactLoadState> {
        self.state_rx.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Wait for the load task to finish and return the last published state.
    ///
    /// After a cancel this is the state at the time of cancellation, which
    /// may still be pending.
    pub async fn wait(&mut self) -> ArtifactLoadState {
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            log::error!("Artifact load task for {} failed: {}", self.url, e);
        }
        self.state()
    }
}

impl Drop for ArtifactHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
