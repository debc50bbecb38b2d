//! [`Dispatcher`]: parallel fan-out to a set of adapters with per-adapter
//! timeout, rate-limit retry with jittered backoff, and partial-failure
//! tolerance.
//!
//! This is the component with the most moving parts in the pipeline — see
//! the module-level invariants on [`Dispatcher::fan_out`].

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::adapter::AdapterContract;
use crate::model::{QueryParams, SearchError, SearchResponse};

/// At most this many retries are attempted for a `rateLimit` response
/// before the dispatcher gives up on that adapter.
pub const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Per-adapter soft timeout applied to every individual call attempt.
pub const DEFAULT_SOFT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy)]
pub struct DispatchConfig {
    pub soft_timeout: Duration,
    pub max_retry_attempts: u32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            soft_timeout: DEFAULT_SOFT_TIMEOUT,
            max_retry_attempts: MAX_RETRY_ATTEMPTS,
        }
    }
}

/// Exponential backoff with jitter: `1000 * 2^(n-1) * (1 + U(0, 0.3))` ms,
/// for retry number `n` (1-based).
fn backoff_ms(retry_number: u32) -> u64 {
    let base_ms = 1000u64.checked_shl(retry_number.saturating_sub(1)).unwrap_or(u64::MAX);
    let jitter = 1.0 + rand::thread_rng().gen_range(0.0..0.3);
    (base_ms as f64 * jitter).round() as u64
}

/// Run one adapter's `search`, retrying only `rateLimit` failures, bounded
/// by `config.max_retry_attempts`. Every call attempt and every backoff
/// sleep honours `cancel`.
async fn run_with_retry(
    adapter: Arc<dyn AdapterContract>,
    params: QueryParams,
    config: DispatchConfig,
    cancel: CancellationToken,
) -> Result<SearchResponse, SearchError> {
    let mut retries_done: u32 = 0;
    loop {
        let attempt = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                return Err(SearchError::Network(format!("{}: request cancelled", adapter.id())));
            }
            result = tokio::time::timeout(config.soft_timeout, adapter.search(&params)) => result,
        };

        let outcome = match attempt {
            Err(_elapsed) => {
                return Err(SearchError::Network(format!(
                    "{} timed out after {:?}",
                    adapter.id(),
                    config.soft_timeout
                )));
            }
            Ok(outcome) => outcome,
        };

        match outcome {
            Ok(response) => return Ok(response),
            Err(SearchError::RateLimit { retry_after_ms }) => {
                if retries_done >= config.max_retry_attempts {
                    return Err(SearchError::RateLimit { retry_after_ms });
                }
                retries_done += 1;
                let sleep_ms = retry_after_ms.min(backoff_ms(retries_done));
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => {
                        return Err(SearchError::Network(format!("{}: request cancelled", adapter.id())));
                    }
                    () = tokio::time::sleep(Duration::from_millis(sleep_ms)) => {}
                }
            }
            Err(other) => return Err(other),
        }
    }
}

/// Parallel fan-out / fan-in across a pre-ordered list of adapters.
pub struct Dispatcher {
    config: DispatchConfig,
}

impl Dispatcher {
    #[must_use]
    pub fn new(config: DispatchConfig) -> Self {
        Self { config }
    }

    /// Fan out to every adapter in `adapters` concurrently and collect the
    /// successful responses, in invocation (= input) order.
    ///
    /// - Every task is spawned before any is awaited (true concurrency).
    /// - Partial failure is tolerated: any number of adapters may fail as
    ///   long as at least one succeeds.
    /// - If every adapter fails, the first-by-invocation-order error is
    ///   returned; an empty `adapters` list returns
    ///   [`SearchError::NoAdapterAvailable`].
    /// - If `cancel` fires before all tasks complete, every in-flight task
    ///   is aborted and the caller gets a cancellation error — never a
    ///   partial result.
    pub async fn fan_out(
        &self,
        adapters: Vec<Arc<dyn AdapterContract>>,
        params: QueryParams,
        cancel: CancellationToken,
    ) -> Result<Vec<SearchResponse>, SearchError> {
        if adapters.is_empty() {
            return Err(SearchError::NoAdapterAvailable(
                "no adapter selected for this category".into(),
            ));
        }

        let handles: Vec<_> = adapters
            .iter()
            .map(|adapter| {
                let adapter = Arc::clone(adapter);
                let params = params.clone();
                let config = self.config;
                let cancel = cancel.clone();
                tokio::spawn(run_with_retry(adapter, params, config, cancel))
            })
            .collect();

        let joined = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                for handle in &handles {
                    handle.abort();
                }
                return Err(SearchError::Network("request cancelled".into()));
            }
            joined = join_all(handles) => joined,
        };

        let mut responses = Vec::with_capacity(joined.len());
        let mut first_error: Option<SearchError> = None;
        for (adapter, outcome) in adapters.iter().zip(joined) {
            match outcome {
                Ok(Ok(response)) => responses.push(response),
                Ok(Err(error)) => {
                    warn!(adapter = adapter.id(), error = %error, "adapter failed");
                    if first_error.is_none() {
                        first_error = Some(error);
                    }
                }
                Err(join_error) => {
                    let error = SearchError::Network(format!(
                        "{} task failed: {join_error}",
                        adapter.id()
                    ));
                    warn!(adapter = adapter.id(), error = %error, "adapter task panicked");
                    if first_error.is_none() {
                        first_error = Some(error);
                    }
                }
            }
        }

        if responses.is_empty() {
            Err(first_error.unwrap_or_else(|| {
                SearchError::NoAdapterAvailable("every adapter failed".into())
            }))
        } else {
            Ok(responses)
        }
    }
}

/// Wall-clock ceiling for one adapter:
/// `soft_timeout + 1000 * (2^MAX_RETRY_ATTEMPTS - 1) * 1.3` plus scheduler
/// slack. Exposed for tests that want to assert against it directly.
#[must_use]
pub fn worst_case_wall_time(config: &DispatchConfig) -> Duration {
    let backoff_ceiling_ms =
        (1000.0 * (2f64.powi(config.max_retry_attempts as i32) - 1.0) * 1.3).ceil() as u64;
    config.soft_timeout + Duration::from_millis(backoff_ceiling_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::test_support::MockAdapter;
    use crate::model::{QueryCategory, SearchResult};
    use tokio::time::Instant;

    fn params() -> QueryParams {
        QueryParams::new("test query", None).unwrap()
    }

    fn ok_response(source: &str) -> SearchResponse {
        SearchResponse {
            query: params(),
            results: vec![SearchResult {
                id: format!("{source}-1"),
                title: format!("{source} result"),
                url: format!("https://example.com/{source}"),
                snippet: "snippet".into(),
                published: None,
                rank: Some(1),
                source: source.into(),
                source_type: None,
                relevance_score: None,
            }],
            total_results: 1,
            search_time_ms: 1,
            source: source.into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn partial_failure_returns_the_successes() {
        // brave fails, wikipedia succeeds.
        let brave = Arc::new(
            MockAdapter::new("brave", &[QueryCategory::General])
                .returning(vec![Err(SearchError::Network("down".into()))]),
        );
        let wikipedia = Arc::new(
            MockAdapter::new("wikipedia", &[QueryCategory::General])
                .returning(vec![Ok(ok_response("wikipedia"))]),
        );

        let dispatcher = Dispatcher::new(DispatchConfig::default());
        let result = dispatcher
            .fan_out(vec![brave, wikipedia], params(), CancellationToken::new())
            .await
            .expect("at least one adapter succeeded");

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].source, "wikipedia");
    }

    #[tokio::test(start_paused = true)]
    async fn all_fail_returns_first_by_invocation_order() {
        let a = Arc::new(
            MockAdapter::new("a", &[QueryCategory::General])
                .returning(vec![Err(SearchError::Authorization("no key".into()))]),
        );
        let b = Arc::new(
            MockAdapter::new("b", &[QueryCategory::General])
                .returning(vec![Err(SearchError::Network("down".into()))]),
        );

        let dispatcher = Dispatcher::new(DispatchConfig::default());
        let err = dispatcher
            .fan_out(vec![a, b], params(), CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, SearchError::Authorization(_)));
    }

    #[tokio::test]
    async fn empty_adapter_list_is_no_adapter_available() {
        let dispatcher = Dispatcher::new(DispatchConfig::default());
        let err = dispatcher
            .fan_out(vec![], params(), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::NoAdapterAvailable(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_retries_then_succeeds() {
        // Scenario 4: first attempt rate-limited with a 50ms retry-after,
        // second attempt succeeds.
        let adapter = Arc::new(
            MockAdapter::new("brave", &[QueryCategory::General]).returning(vec![
                Err(SearchError::RateLimit { retry_after_ms: 50 }),
                Ok(ok_response("brave")),
            ]),
        );

        let start = Instant::now();
        let dispatcher = Dispatcher::new(DispatchConfig::default());
        let result = dispatcher
            .fan_out(vec![adapter.clone()], params(), CancellationToken::new())
            .await
            .expect("second attempt should succeed");

        assert_eq!(result[0].source, "brave");
        assert!(Instant::now().duration_since(start) >= Duration::from_millis(50));
        assert_eq!(adapter.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_exhausts_retries_then_fails() {
        let adapter = Arc::new(
            MockAdapter::new("brave", &[QueryCategory::General]).returning(vec![
                Err(SearchError::RateLimit { retry_after_ms: 10 }),
                Err(SearchError::RateLimit { retry_after_ms: 10 }),
                Err(SearchError::RateLimit { retry_after_ms: 10 }),
                Err(SearchError::RateLimit { retry_after_ms: 10 }),
            ]),
        );

        let dispatcher = Dispatcher::new(DispatchConfig::default());
        let err = dispatcher
            .fan_out(vec![adapter.clone()], params(), CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, SearchError::RateLimit { .. }));
        assert_eq!(adapter.call_count(), 1 + MAX_RETRY_ATTEMPTS as usize);
    }

    #[tokio::test(start_paused = true)]
    async fn non_rate_limit_errors_are_not_retried() {
        let adapter = Arc::new(
            MockAdapter::new("brave", &[QueryCategory::General])
                .returning(vec![Err(SearchError::InvalidQuery { issues: vec!["bad".into()] })]),
        );

        let dispatcher = Dispatcher::new(DispatchConfig::default());
        let _ = dispatcher
            .fan_out(vec![adapter.clone()], params(), CancellationToken::new())
            .await;

        assert_eq!(adapter.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_yields_no_partial_result() {
        let slow = Arc::new(
            MockAdapter::new("slow", &[QueryCategory::General])
                .with_delay(Duration::from_secs(30))
                .returning(vec![Ok(ok_response("slow"))]),
        );

        let cancel = CancellationToken::new();
        let dispatcher = Dispatcher::new(DispatchConfig::default());

        let cancel_clone = cancel.clone();
        let fan_out = dispatcher.fan_out(vec![slow], params(), cancel);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cancel_clone.cancel();
        });

        let result = fan_out.await;
        assert!(result.is_err());
    }

    #[test]
    fn backoff_grows_exponentially() {
        // Deterministic modulo the bounded jitter factor in [1.0, 1.3).
        assert!(backoff_ms(1) >= 1000 && backoff_ms(1) < 1300);
        assert!(backoff_ms(2) >= 2000 && backoff_ms(2) < 2600);
        assert!(backoff_ms(3) >= 4000 && backoff_ms(3) < 5200);
    }

    #[test]
    fn worst_case_wall_time_matches_spec_formula() {
        let config = DispatchConfig::default();
        let expected = config.soft_timeout + Duration::from_millis(9100);
        assert_eq!(worst_case_wall_time(&config), expected);
    }
}
