// EndpointRaceCoordinator - concurrent multi-mirror requests
//
// Policy: every endpoint is asked at once, each bounded by its own timeout,
// and all outcomes are awaited. The winner is the first success in priority
// order, not the first response to arrive.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use futures::future::join_all;
use parking_lot::Mutex;
use tokio::time::{timeout, Instant};

use super::errors::ResolveError;
use super::models::{EndpointDescriptor, EndpointHealth, HealthReport, HealthStatus};
use super::traits::MirrorTransport;
use super::utils::now_rfc3339;

/// Result of a race. `AllFailed` is an ordinary value, not an error.
#[derive(Debug)]
pub enum RaceOutcome<T> {
    Won {
        endpoint: EndpointDescriptor,
        value: T,
    },
    AllFailed {
        failures: Vec<(String, ResolveError)>,
    },
}

impl<T> RaceOutcome<T> {
    pub fn into_result(self) -> Result<(EndpointDescriptor, T), ResolveError> {
        match self {
            Self::Won { endpoint, value } => Ok((endpoint, value)),
            Self::AllFailed { failures } => Err(ResolveError::AllSourcesFailed {
                attempts: failures
                    .into_iter()
                    .map(|(endpoint, err)| format!("{}: {}", endpoint, err))
                    .collect(),
            }),
        }
    }
}

pub struct EndpointRaceCoordinator {
    endpoints: Vec<EndpointDescriptor>,
    per_endpoint_timeout: Duration,
    last_seen: Mutex<HashMap<String, EndpointHealth>>,
}

impl EndpointRaceCoordinator {
    pub fn new(endpoints: Vec<EndpointDescriptor>, per_endpoint_timeout: Duration) -> Self {
        Self {
            endpoints,
            per_endpoint_timeout,
            last_seen: Mutex::new(HashMap::new()),
        }
    }

    pub fn endpoints(&self) -> &[EndpointDescriptor] {
        &self.endpoints
    }

    /// Race the configured endpoints.
    pub async fn race<T, F, Fut>(&self, request: F) -> RaceOutcome<T>
    where
        F: Fn(EndpointDescriptor) -> Fut,
        Fut: Future<Output = Result<T, ResolveError>>,
    {
        self.race_over(&self.endpoints, request).await
    }

    /// Race an explicit endpoint list.
    ///
    /// A request exceeding the timeout fails for its endpoint only; sibling
    /// requests keep running until they settle.
    pub async fn race_over<T, F, Fut>(
        &self,
        endpoints: &[EndpointDescriptor],
        request: F,
    ) -> RaceOutcome<T>
    where
        F: Fn(EndpointDescriptor) -> Fut,
        Fut: Future<Output = Result<T, ResolveError>>,
    {
        // Stable sort: equal priorities keep their list order
        let mut ordered = endpoints.to_vec();
        ordered.sort_by_key(|endpoint| endpoint.priority);

        let attempts = ordered.iter().map(|endpoint| {
            let started = Instant::now();
            let pending = timeout(self.per_endpoint_timeout, request(endpoint.clone()));
            async move {
                let outcome = match pending.await {
                    Ok(result) => result,
                    Err(_) => Err(ResolveError::Timeout {
                        origin: endpoint.base_url.clone(),
                        after: self.per_endpoint_timeout,
                    }),
                };
                (endpoint, outcome, started.elapsed())
            }
        });

        let settled = join_all(attempts).await;

        let mut winner = None;
        let mut failures = Vec::new();
        for (endpoint, outcome, elapsed) in settled {
            self.record(endpoint, outcome.as_ref().err(), elapsed);
            match outcome {
                Ok(value) if winner.is_none() => winner = Some((endpoint.clone(), value)),
                Ok(_) => {}
                Err(err) => {
                    tracing::debug!("[Race] {} failed: {}", endpoint.base_url, err);
                    failures.push((endpoint.base_url.clone(), err));
                }
            }
        }

        match winner {
            Some((endpoint, value)) => {
                tracing::info!("[Race] Response from: {}", endpoint.base_url);
                RaceOutcome::Won { endpoint, value }
            }
            None => {
                tracing::warn!("[Race] All {} endpoints failed", ordered.len());
                RaceOutcome::AllFailed { failures }
            }
        }
    }

    /// Probe each endpoint in turn on `path`.
    pub async fn check_health(&self, transport: &dyn MirrorTransport, path: &str) -> HealthReport {
        let mut entries = Vec::with_capacity(self.endpoints.len());

        for endpoint in &self.endpoints {
            let started = Instant::now();
            let outcome = match timeout(self.per_endpoint_timeout, transport.get_json(endpoint, path))
                .await
            {
                Ok(Ok(_)) => Ok(()),
                Ok(Err(err)) => Err(err),
                Err(_) => Err(ResolveError::Timeout {
                    origin: endpoint.base_url.clone(),
                    after: self.per_endpoint_timeout,
                }),
            };
            let elapsed = started.elapsed();
            let health = self.record(endpoint, outcome.as_ref().err(), elapsed);

            match &outcome {
                Ok(()) => tracing::info!("[Health] {}: {}ms", endpoint.base_url, elapsed.as_millis()),
                Err(err) => tracing::warn!("[Health] {}: {}", endpoint.base_url, err),
            }
            entries.push((endpoint.base_url.clone(), health));
        }

        HealthReport { entries }
    }

    /// Last outcome observed per endpoint, from races and health checks
    pub fn last_seen(&self) -> HealthReport {
        let seen = self.last_seen.lock();
        HealthReport {
            entries: self
                .endpoints
                .iter()
                .filter_map(|e| seen.get(&e.base_url).map(|h| (e.base_url.clone(), h.clone())))
                .collect(),
        }
    }

    fn record(
        &self,
        endpoint: &EndpointDescriptor,
        error: Option<&ResolveError>,
        elapsed: Duration,
    ) -> EndpointHealth {
        let health = match error {
            None => EndpointHealth {
                status: HealthStatus::Healthy,
                response_time: Some(elapsed.as_millis() as u64),
                error: None,
                last_check: now_rfc3339(),
            },
            Some(err) => EndpointHealth {
                status: HealthStatus::Unhealthy,
                response_time: None,
                error: Some(err.to_string()),
                last_check: now_rfc3339(),
            },
        };
        self.last_seen
            .lock()
            .insert(endpoint.base_url.clone(), health.clone());
        health
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn endpoints(names: &[&str]) -> Vec<EndpointDescriptor> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| EndpointDescriptor::new(*name, i as u32))
            .collect()
    }

    fn coordinator(names: &[&str]) -> EndpointRaceCoordinator {
        EndpointRaceCoordinator::new(endpoints(names), Duration::from_secs(8))
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_success_in_priority_order_wins() {
        let race = coordinator(&["A", "B", "C"]);

        let outcome = race
            .race(|endpoint| async move {
                match endpoint.base_url.as_str() {
                    "A" => Err(ResolveError::unavailable("A", "HTTP 500")),
                    "B" => {
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        Ok("from B")
                    }
                    _ => {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok("from C")
                    }
                }
            })
            .await;

        match outcome {
            RaceOutcome::Won { endpoint, value } => {
                assert_eq!(endpoint.base_url, "B");
                assert_eq!(value, "from B");
            }
            RaceOutcome::AllFailed { .. } => panic!("expected a winner"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_failed_is_a_value() {
        let race = coordinator(&["A", "B"]);

        let outcome: RaceOutcome<()> = race
            .race(|endpoint| async move {
                Err(ResolveError::malformed(endpoint.base_url, "not json"))
            })
            .await;

        match outcome {
            RaceOutcome::AllFailed { failures } => {
                let names: Vec<&str> = failures.iter().map(|(n, _)| n.as_str()).collect();
                assert_eq!(names, vec!["A", "B"]);
            }
            RaceOutcome::Won { .. } => panic!("nothing should win"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fails_only_that_endpoint() {
        let race = coordinator(&["slow", "ok"]);
        let started = Instant::now();

        let outcome = race
            .race(|endpoint| async move {
                if endpoint.base_url == "slow" {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                }
                Ok(endpoint.base_url)
            })
            .await;

        // settle-all: the slow endpoint is waited for up to its timeout
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(8) && waited < Duration::from_secs(9));
        let (endpoint, value) = outcome.into_result().unwrap();
        assert_eq!(endpoint.base_url, "ok");
        assert_eq!(value, "ok");

        let seen = race.last_seen();
        assert_eq!(seen.get("slow").map(|h| h.status), Some(HealthStatus::Unhealthy));
        assert_eq!(seen.get("ok").map(|h| h.status), Some(HealthStatus::Healthy));
    }

    #[tokio::test(start_paused = true)]
    async fn test_priority_overrides_list_order() {
        let race = EndpointRaceCoordinator::new(
            vec![
                EndpointDescriptor::new("low", 5),
                EndpointDescriptor::new("high", 1),
            ],
            Duration::from_secs(8),
        );

        let outcome = race.race(|endpoint| async move { Ok(endpoint.base_url) }).await;
        let (endpoint, _) = outcome.into_result().unwrap();
        assert_eq!(endpoint.base_url, "high");
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_endpoint_is_asked() {
        let race = coordinator(&["A", "B", "C"]);
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = calls.clone();
        let _ = race
            .race(move |_| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_into_result_lists_failures() {
        let race = coordinator(&["A"]);
        let outcome: RaceOutcome<()> = race
            .race(|_| async { Err(ResolveError::unavailable("A", "down")) })
            .await;

        let err = outcome.into_result().unwrap_err();
        assert_eq!(err.to_string(), "All sources failed: A: A unavailable: down");
    }
}
