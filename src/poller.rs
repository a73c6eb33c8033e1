//! Bounded polling of a started generation.
//!
//! Check, collect, and if nothing is ready wait a fixed delay, tell the user
//! and try again. Running out of attempts is a normal [`PollOutcome::Timeout`].
//! The delay is a plain `tokio::time::sleep`, so dropping the future (an
//! abandoned turn) cancels the wait.

use crate::api::GenerationProvider;
use crate::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl PollPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(15, Duration::from_secs(4))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Ready(Vec<String>),
    Timeout,
}

/// Receives one notification after every unsuccessful attempt.
#[async_trait]
pub trait ProgressNotifier: Send + Sync {
    async fn notify(&self, attempt: u32) -> Result<()>;
}

/// Poll `provider` until images are ready, the budget runs out, or a check
/// fails. Check errors abort immediately.
pub async fn poll_until_ready(
    provider: &mut dyn GenerationProvider,
    policy: &PollPolicy,
    progress: &dyn ProgressNotifier,
) -> Result<PollOutcome> {
    for attempt in 0..policy.max_attempts {
        provider.check_generation().await?;

        let images = provider.take_ready_images();
        if !images.is_empty() {
            info!(
                "Generation ready after {} attempt(s) with {} image(s)",
                attempt + 1,
                images.len()
            );
            return Ok(PollOutcome::Ready(images));
        }

        debug!(
            "Generation not ready (attempt {}/{}), waiting {:?}",
            attempt + 1,
            policy.max_attempts,
            policy.delay
        );
        tokio::time::sleep(policy.delay).await;
        progress.notify(attempt).await?;
    }

    warn!(
        "Generation not ready after {} attempts, giving up",
        policy.max_attempts
    );
    Ok(PollOutcome::Timeout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockGenerationProvider;
    use crate::Error;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingNotifier {
        attempts: Arc<Mutex<Vec<u32>>>,
    }

    #[async_trait]
    impl ProgressNotifier for RecordingNotifier {
        async fn notify(&self, attempt: u32) -> Result<()> {
            self.attempts.lock().unwrap().push(attempt);
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_images_once_ready() {
        let mut provider = MockGenerationProvider::new()
            .with_image("aW1n".to_string())
            .with_checks_until_ready(3);
        let notifier = RecordingNotifier::default();

        let outcome = poll_until_ready(&mut provider, &PollPolicy::default(), &notifier)
            .await
            .unwrap();

        assert_eq!(outcome, PollOutcome::Ready(vec!["aW1n".to_string()]));
        assert_eq!(provider.get_check_count(), 3);
        assert_eq!(*notifier.attempts.lock().unwrap(), vec![0, 1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_on_first_check_sends_no_progress() {
        let mut provider = MockGenerationProvider::new().with_image("aW1n".to_string());
        let notifier = RecordingNotifier::default();

        let outcome = poll_until_ready(&mut provider, &PollPolicy::default(), &notifier)
            .await
            .unwrap();

        assert!(matches!(outcome, PollOutcome::Ready(_)));
        assert!(notifier.attempts.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_after_budget() {
        let mut provider = MockGenerationProvider::new().never_ready();
        let notifier = RecordingNotifier::default();
        let started = tokio::time::Instant::now();

        let outcome = poll_until_ready(&mut provider, &PollPolicy::default(), &notifier)
            .await
            .unwrap();

        assert_eq!(outcome, PollOutcome::Timeout);
        assert_eq!(provider.get_check_count(), 15);
        let notifications = notifier.attempts.lock().unwrap().len();
        assert!(notifications < 16);
        assert_eq!(notifications, 15);
        assert_eq!(started.elapsed(), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_error_aborts_immediately() {
        let mut provider = MockGenerationProvider::new().with_check_failure("FAIL".to_string());
        let notifier = RecordingNotifier::default();

        let err = poll_until_ready(&mut provider, &PollPolicy::default(), &notifier)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ImageGeneration(_)));
        assert_eq!(provider.get_check_count(), 1);
        assert!(notifier.attempts.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_poll_stops_checking() {
        let provider = MockGenerationProvider::new().never_ready();
        let probe = provider.clone();
        let notifier = RecordingNotifier::default();

        let poll = async move {
            let mut provider = provider;
            poll_until_ready(&mut provider, &PollPolicy::default(), &notifier).await
        };
        let result = tokio::time::timeout(Duration::from_secs(10), poll).await;

        assert!(result.is_err());
        let checks = probe.get_check_count();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(probe.get_check_count(), checks);
    }
}
