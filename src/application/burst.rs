//! Concurrent burst dispatch.
//!
//! [`BurstEngine::fire`] spawns one task per action, staggers their first
//! attempts, retries each independently and waits for every task to reach a
//! terminal outcome. Partial failure is a normal result, not an error.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use crate::domain::{ActionOutcome, BurstRequest, BurstResult, GroupId};
use crate::port::SessionClient;

/// Fires bursts of identical messages into one group.
#[derive(Clone)]
pub struct BurstEngine {
    client: Arc<dyn SessionClient>,
    target: GroupId,
    retry_backoff: Duration,
}

impl BurstEngine {
    pub fn new(client: Arc<dyn SessionClient>, target: GroupId, retry_backoff: Duration) -> Self {
        Self {
            client,
            target,
            retry_backoff,
        }
    }

    /// Dispatch `request.count` actions concurrently and aggregate the outcomes.
    ///
    /// Never fails: actions that exhaust their retries are counted as unsent.
    pub async fn fire(&self, request: &BurstRequest) -> BurstResult {
        info!(
            group = %self.target,
            count = request.count,
            payload = %request.payload,
            "Firing burst"
        );

        let start = Instant::now();
        let mut tasks = JoinSet::new();
        for index in 0..request.count {
            let client = Arc::clone(&self.client);
            let target = self.target.clone();
            let payload = Arc::clone(&request.payload);
            let stagger = request.per_action_delay * index;
            let max_retries = request.max_retries;
            let backoff = self.retry_backoff;

            tasks.spawn(async move {
                if !stagger.is_zero() {
                    sleep(stagger).await;
                }
                send_with_retry(client.as_ref(), &target, &payload, index, max_retries, backoff)
                    .await
            });
        }

        let mut outcomes = Vec::with_capacity(request.count as usize);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => warn!(error = %e, "Burst action task did not complete"),
            }
        }
        let elapsed = start.elapsed();

        let result = BurstResult::from_outcomes(request.count, &outcomes, elapsed);
        info!(
            sent = result.sent_count,
            total = result.total_count,
            attempts = result.attempts,
            elapsed_ms = result.elapsed_millis(),
            "Burst complete"
        );
        result
    }
}

/// Attempt one action up to `max_retries` times.
async fn send_with_retry(
    client: &dyn SessionClient,
    target: &GroupId,
    payload: &str,
    index: u32,
    max_retries: u32,
    backoff: Duration,
) -> ActionOutcome {
    let mut attempts = 0;
    while attempts < max_retries {
        attempts += 1;
        match client.send_action(target, payload).await {
            Ok(()) => {
                return ActionOutcome {
                    index,
                    succeeded: true,
                    attempts_used: attempts,
                };
            }
            Err(e) if attempts == max_retries => {
                error!(action = index + 1, attempts, error = %e, "Message failed");
            }
            Err(e) => {
                debug!(action = index + 1, attempt = attempts, error = %e, "Send failed, retrying");
                sleep(backoff).await;
            }
        }
    }

    ActionOutcome {
        index,
        succeeded: false,
        attempts_used: attempts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::session::RecordingClient;

    fn request(count: u32, delay_ms: u64, max_retries: u32) -> BurstRequest {
        BurstRequest {
            count,
            payload: "🔥".into(),
            per_action_delay: Duration::from_millis(delay_ms),
            max_retries,
        }
    }

    fn engine(client: &Arc<RecordingClient>) -> BurstEngine {
        BurstEngine::new(
            client.clone(),
            GroupId::from("target@g.us"),
            Duration::from_millis(15),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn all_successful_sends_are_counted() {
        let client = Arc::new(RecordingClient::new());
        let result = engine(&client).fire(&request(8, 0, 3)).await;

        assert_eq!(result.sent_count, 8);
        assert_eq!(result.total_count, 8);
        assert_eq!(result.attempts, 8);
        assert_eq!(client.sent().len(), 8);
        assert!(client.sent().iter().all(|(id, text)| id.as_str() == "target@g.us" && text == "🔥"));
    }

    #[tokio::test(start_paused = true)]
    async fn all_failing_sends_still_return() {
        let client = Arc::new(RecordingClient::new().failing_always());
        let result = engine(&client).fire(&request(4, 0, 3)).await;

        assert_eq!(result.sent_count, 0);
        assert_eq!(result.total_count, 4);
        assert_eq!(result.attempts, 12);
        assert!(client.sent().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_on_last_allowed_attempt() {
        let client = Arc::new(RecordingClient::new().failing_first(2));
        let result = engine(&client).fire(&request(1, 0, 3)).await;

        assert_eq!(result.sent_count, 1);
        assert_eq!(result.attempts, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_exactly_max_retries() {
        let client = Arc::new(RecordingClient::new().failing_first(3));
        let result = engine(&client).fire(&request(1, 0, 3)).await;

        assert_eq!(result.sent_count, 0);
        assert_eq!(result.attempts, 3);
        assert_eq!(client.send_attempts(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn partial_failure_does_not_abort_siblings() {
        let client = Arc::new(RecordingClient::new().failing_first(3));
        let result = engine(&client).fire(&request(3, 0, 1)).await;

        assert_eq!(result.sent_count, 0);
        assert_eq!(result.attempts, 3);

        let client = Arc::new(RecordingClient::new().failing_first(2));
        let result = engine(&client).fire(&request(5, 0, 1)).await;
        assert_eq!(result.sent_count, 3);
        assert_eq!(result.total_count, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn stagger_runs_actions_concurrently() {
        let client = Arc::new(RecordingClient::new().with_latency(Duration::from_millis(30)));
        let result = engine(&client).fire(&request(5, 20, 3)).await;

        assert_eq!(result.sent_count, 5);
        // Last action starts at 4 * 20ms and takes 30ms; serial dispatch would take 230ms.
        assert!(result.elapsed >= Duration::from_millis(110));
        assert!(result.elapsed < Duration::from_millis(150), "took {:?}", result.elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_wait_for_backoff() {
        let client = Arc::new(RecordingClient::new().failing_first(2));
        let result = engine(&client).fire(&request(1, 0, 3)).await;

        assert!(result.elapsed >= Duration::from_millis(30));
        assert!(result.elapsed < Duration::from_millis(45), "took {:?}", result.elapsed);
    }
}
