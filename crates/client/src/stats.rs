// Read-only usage overview and service health.

use tracing::warn;

use ragdesk_common::types::{HealthStatus, Stats};

use crate::gateway::{ApiError, RemoteApi};
use crate::session::SessionContext;

/// Usage overview for the signed-in user; `None` (logged) on failure.
pub async fn fetch_stats<A: RemoteApi>(api: &A, session: &SessionContext) -> Option<Stats> {
    match try_fetch_stats(api, session).await {
        Ok(stats) => Some(stats),
        Err(error) => {
            warn!(error = %error, "failed to load stats");
            None
        }
    }
}

pub async fn try_fetch_stats<A: RemoteApi>(
    api: &A,
    session: &SessionContext,
) -> Result<Stats, ApiError> {
    let token = session.bearer()?;
    api.stats(&token).await
}

/// Unauthenticated liveness probe.
pub async fn check_health<A: RemoteApi>(api: &A) -> Result<HealthStatus, ApiError> {
    api.health().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{signed_in, status_error, FakeApi};

    #[tokio::test]
    async fn stats_are_fetched_with_the_session_token() {
        let api = FakeApi::new();
        api.push_stats(Ok(Stats { total_queries: 7, ..Stats::default() }));

        let stats = fetch_stats(api.as_ref(), &signed_in()).await.unwrap();

        assert_eq!(stats.total_queries, 7);
        assert_eq!(api.tokens(), ["tok"]);
    }

    #[tokio::test]
    async fn failure_yields_none() {
        let api = FakeApi::new();
        api.push_stats(Err(status_error(500, "oops")));

        assert_eq!(fetch_stats(api.as_ref(), &signed_in()).await, None);
    }

    #[tokio::test]
    async fn signed_out_skips_the_call() {
        let api = FakeApi::new();

        assert_eq!(fetch_stats(api.as_ref(), &SessionContext::default()).await, None);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn health_needs_no_session() {
        let api = FakeApi::new();
        api.push_health(Ok(HealthStatus { status: "ok".into(), timestamp: None }));

        assert_eq!(check_health(api.as_ref()).await.unwrap().status, "ok");
    }
}
