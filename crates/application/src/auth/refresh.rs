//! `OAuth2` refresh for tokens kept in the endpoint registry.

use tracing::{info, warn};
use workbench_domain::{AuthScheme, EndpointUpdate};

use crate::ports::{Clock, TokenRefresher};
use crate::store::SessionStore;

/// Refreshes the endpoint's `OAuth2` token if it is expired and refreshable.
///
/// The new token replaces the old one in the registry. A failed refresh is
/// logged and the stale token stays in place. Returns true if the token was
/// replaced.
pub async fn refresh_endpoint_token(
    store: &SessionStore,
    refresher: &dyn TokenRefresher,
    clock: &dyn Clock,
    endpoint: &str,
) -> bool {
    let token = store
        .read(|state| {
            state
                .endpoint_config(endpoint)
                .and_then(|config| match &config.authentication {
                    Some(AuthScheme::OAuth2(token)) => Some(token.clone()),
                    _ => None,
                })
        })
        .await;
    let Some(mut token) = token else {
        return false;
    };
    if !token.is_expired_at(clock.now()) {
        return false;
    }
    if !token.can_refresh() {
        warn!(endpoint, "OAuth2 token expired and cannot be refreshed");
        return false;
    }
    let (Some(token_endpoint), Some(client_id), Some(refresh_token)) = (
        token.token_endpoint.clone(),
        token.client_id.clone(),
        token.refresh_token.clone(),
    ) else {
        return false;
    };

    match refresher
        .refresh(&token_endpoint, &client_id, &refresh_token)
        .await
    {
        Ok(refreshed) => {
            token.apply_refresh(refreshed, clock.now());
            store
                .update(|state| {
                    state.add_or_update_endpoint(
                        endpoint,
                        EndpointUpdate::authentication(AuthScheme::OAuth2(token)),
                    );
                })
                .await;
            info!(endpoint, "Refreshed OAuth2 token");
            true
        }
        Err(e) => {
            warn!(endpoint, error = %e, "OAuth2 token refresh failed, using stale token");
            false
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::ports::BoxFuture;
    use crate::store::PersistentStore;
    use crate::test_support::{FixedClock, MemoryStorage};
    use chrono::Duration;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use workbench_domain::{AuthError, OAuth2Auth, RefreshedToken, WorkbenchSettings};

    const ENDPOINT: &str = "https://ex.org/sparql";

    struct StubRefresher {
        result: Result<RefreshedToken, AuthError>,
        calls: Mutex<Vec<(String, String, String)>>,
    }

    impl StubRefresher {
        fn new(result: Result<RefreshedToken, AuthError>) -> Self {
            Self {
                result,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl TokenRefresher for StubRefresher {
        fn refresh<'a>(
            &'a self,
            token_endpoint: &'a str,
            client_id: &'a str,
            refresh_token: &'a str,
        ) -> BoxFuture<'a, Result<RefreshedToken, AuthError>> {
            self.calls.lock().push((
                token_endpoint.to_string(),
                client_id.to_string(),
                refresh_token.to_string(),
            ));
            let result = self.result.clone();
            Box::pin(async move { result })
        }
    }

    async fn session_with(token: OAuth2Auth, clock: &Arc<FixedClock>) -> SessionStore {
        let store = PersistentStore::new(Arc::new(MemoryStorage::default()), clock.clone(), "ns");
        let session = SessionStore::load(store, &WorkbenchSettings::default()).await;
        session
            .update(|state| {
                state.add_or_update_endpoint(
                    ENDPOINT,
                    EndpointUpdate::authentication(AuthScheme::OAuth2(token)),
                );
            })
            .await;
        session
    }

    fn refreshable(clock: &FixedClock) -> OAuth2Auth {
        OAuth2Auth {
            refresh_token: Some("r1".to_string()),
            expiry: Some(clock.now() - Duration::seconds(1)),
            client_id: Some("client".to_string()),
            token_endpoint: Some("https://auth.example/token".to_string()),
            ..OAuth2Auth::new("old")
        }
    }

    async fn stored_token(session: &SessionStore) -> OAuth2Auth {
        session
            .read(|state| match &state.endpoint_config(ENDPOINT).unwrap().authentication {
                Some(AuthScheme::OAuth2(token)) => token.clone(),
                other => panic!("unexpected auth {other:?}"),
            })
            .await
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed_and_stored() {
        let clock = Arc::new(FixedClock::default());
        let session = session_with(refreshable(&clock), &clock).await;
        let refresher = StubRefresher::new(Ok(RefreshedToken {
            access_token: "new".to_string(),
            refresh_token: None,
            expires_in_secs: Some(3600),
        }));

        assert!(refresh_endpoint_token(&session, &refresher, clock.as_ref(), ENDPOINT).await);

        let token = stored_token(&session).await;
        assert_eq!(token.access_token, "new");
        assert_eq!(token.refresh_token.as_deref(), Some("r1"));
        assert_eq!(token.expiry, Some(clock.now() + Duration::seconds(3600)));
        assert_eq!(
            *refresher.calls.lock(),
            vec![(
                "https://auth.example/token".to_string(),
                "client".to_string(),
                "r1".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_valid_token_is_left_alone() {
        let clock = Arc::new(FixedClock::default());
        let mut token = refreshable(&clock);
        token.expiry = Some(clock.now() + Duration::hours(1));
        let session = session_with(token, &clock).await;
        let refresher = StubRefresher::new(Err(AuthError::MissingRefreshConfiguration));

        assert!(!refresh_endpoint_token(&session, &refresher, clock.as_ref(), ENDPOINT).await);
        assert!(refresher.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_stale_token() {
        let clock = Arc::new(FixedClock::default());
        let session = session_with(refreshable(&clock), &clock).await;
        let refresher = StubRefresher::new(Err(AuthError::RefreshFailed {
            message: "invalid_grant".to_string(),
        }));

        assert!(!refresh_endpoint_token(&session, &refresher, clock.as_ref(), ENDPOINT).await);
        assert_eq!(stored_token(&session).await.access_token, "old");
    }

    #[tokio::test]
    async fn test_missing_refresh_metadata_skips_refresh() {
        let clock = Arc::new(FixedClock::default());
        let mut token = refreshable(&clock);
        token.client_id = None;
        let session = session_with(token, &clock).await;
        let refresher = StubRefresher::new(Err(AuthError::MissingRefreshConfiguration));

        assert!(!refresh_endpoint_token(&session, &refresher, clock.as_ref(), ENDPOINT).await);
        assert!(refresher.calls.lock().is_empty());
    }
}
