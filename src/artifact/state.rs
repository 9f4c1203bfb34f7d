//! Per-artifact load state and its pure transitions.

use std::time::Duration;

use crate::retry::RetryPolicy;

/// Where a single artifact load stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactStatus {
    /// Still probing (or waiting to probe).
    Pending,
    /// Probe succeeded; the URL is safe to display.
    Loaded(String),
    /// Retries exhausted.
    Unavailable,
}

/// State of one artifact loader. `Loaded` and `Unavailable` are terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLoadState {
    /// Retries scheduled so far; never exceeds the policy's `max_retries`.
    pub attempt: u32,
    pub status: ArtifactStatus,
    /// Backoff scheduled so far, excluding the initial delay.
    pub scheduled_delay: Duration,
}

/// Result of feeding one probe outcome into the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactStep {
    pub state: ArtifactLoadState,
    /// Wait before the next probe; `None` once terminal.
    pub retry_after: Option<Duration>,
}

impl Default for ArtifactLoadState {
    fn default() -> Self {
        Self::pending()
    }
}

impl ArtifactLoadState {
    /// Initial state: `pending(0)`.
    pub fn pending() -> Self {
        Self {
            attempt: 0,
            status: ArtifactStatus::Pending,
            scheduled_delay: Duration::ZERO,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self.status, ArtifactStatus::Pending)
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.status, ArtifactStatus::Loaded(_))
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self.status, ArtifactStatus::Unavailable)
    }

    /// The displayable URL once loaded.
    pub fn loaded_url(&self) -> Option<&str> {
        match &self.status {
            ArtifactStatus::Loaded(url) => Some(url),
            _ => None,
        }
    }

    /// Advance after a probe of `url`.
    ///
    /// Success loads the URL. Failure schedules retry `attempt + 1` after
    /// `policy.delay_for_retry(attempt + 1)` while retries remain, and
    /// becomes unavailable once `attempt == max_retries`. Terminal states
    /// are left unchanged.
    pub fn on_probe(&self, url: &str, succeeded: bool, policy: &RetryPolicy) -> ArtifactStep {
        if self.is_terminal() {
            return ArtifactStep {
                state: self.clone(),
                retry_after: None,
            };
        }

        if succeeded {
            return ArtifactStep {
                state: ArtifactLoadState {
                    status: ArtifactStatus::Loaded(url.to_string()),
                    ..self.clone()
                },
                retry_after: None,
            };
        }

        if policy.allows_retry(self.attempt) {
            let attempt = self.attempt + 1;
            let delay = policy.delay_for_retry(attempt);
            ArtifactStep {
                state: ArtifactLoadState {
                    attempt,
                    status: ArtifactStatus::Pending,
                    scheduled_delay: self.scheduled_delay + delay,
                },
                retry_after: Some(delay),
            }
        } else {
            ArtifactStep {
                state: ArtifactLoadState {
                    status: ArtifactStatus::Unavailable,
                    ..self.clone()
                },
                retry_after: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "http://localhost:8000/charts/torvalds/languages.png";

    fn policy() -> RetryPolicy {
        RetryPolicy::new(5, Duration::from_millis(300))
    }

    #[test]
    fn test_success_is_terminal() {
        let step = ArtifactLoadState::pending().on_probe(URL, true, &policy());
        assert_eq!(step.retry_after, None);
        assert_eq!(step.state.loaded_url(), Some(URL));
        assert_eq!(step.state.attempt, 0);
    }

    #[test]
    fn test_failure_schedules_linear_backoff() {
        let p = policy();
        let first = ArtifactLoadState::pending().on_probe(URL, false, &p);
        assert_eq!(first.state.attempt, 1);
        assert_eq!(first.retry_after, Some(Duration::from_millis(300)));

        let second = first.state.on_probe(URL, false, &p);
        assert_eq!(second.state.attempt, 2);
        assert_eq!(second.retry_after, Some(Duration::from_millis(600)));
        assert_eq!(second.state.scheduled_delay, Duration::from_millis(900));
    }

    #[test]
    fn test_exhaustion_becomes_unavailable() {
        let p = policy();
        let mut state = ArtifactLoadState::pending();
        let mut probes = 0;
        loop {
            probes += 1;
            let step = state.on_probe(URL, false, &p);
            state = step.state;
            if step.retry_after.is_none() {
                break;
            }
        }
        assert!(state.is_unavailable());
        assert_eq!(state.attempt, 5);
        // The first probe plus five retries
        assert_eq!(probes, 6);
        assert_eq!(state.scheduled_delay, p.total_backoff(5));
    }

    #[test]
    fn test_terminal_states_do_not_move() {
        let p = policy();
        let loaded = ArtifactLoadState::pending().on_probe(URL, true, &p).state;
        let again = loaded.on_probe(URL, false, &p);
        assert_eq!(again.state, loaded);
        assert_eq!(again.retry_after, None);

        let unavailable = ArtifactLoadState {
            attempt: 5,
            status: ArtifactStatus::Unavailable,
            scheduled_delay: Duration::ZERO,
        };
        assert_eq!(unavailable.on_probe(URL, true, &p).state, unavailable);
    }

    #[test]
    fn test_zero_retries_fails_after_one_probe() {
        let p = RetryPolicy::new(0, Duration::from_millis(300));
        let step = ArtifactLoadState::pending().on_probe(URL, false, &p);
        assert!(step.state.is_unavailable());
        assert_eq!(step.state.attempt, 0);
    }
}
