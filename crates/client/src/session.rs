//! Authenticated session with coalesced token refresh.
//!
//! The session is the single owner of the token pair. Any number of callers
//! may ask for a refresh concurrently; only one network call goes out, and
//! every waiter receives the token it produced.

use std::sync::Arc;

use api_types::auth::{RefreshResponse, TokenPair};
use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::error::{ClientError, Result};

/// Port for the token refresh endpoint.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse>;
}

/// Owner of durable token storage. Writes are best effort; the in-memory
/// session state is authoritative for the lifetime of the process.
pub trait TokenStore: Send + Sync {
    fn save(&self, tokens: &TokenPair);
    fn clear(&self);
}

/// Store for tests and short-lived processes.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    saved: std::sync::Mutex<Option<TokenPair>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn latest(&self) -> Option<TokenPair> {
        self.saved.lock().map(|guard| guard.clone()).unwrap_or(None)
    }
}

impl TokenStore for MemoryTokenStore {
    fn save(&self, tokens: &TokenPair) {
        if let Ok(mut guard) = self.saved.lock() {
            *guard = Some(tokens.clone());
        }
    }

    fn clear(&self) {
        if let Ok(mut guard) = self.saved.lock() {
            *guard = None;
        }
    }
}

struct TokenState {
    access: String,
    refresh: String,
    /// Bumped on every successful refresh. Lets a waiter that queued behind
    /// an in-flight refresh detect that the work is already done.
    generation: u64,
}

struct SessionInner {
    auth: Arc<dyn AuthApi>,
    store: Arc<dyn TokenStore>,
    state: RwLock<TokenState>,
    refresh_gate: Mutex<()>,
}

#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    #[must_use]
    pub fn new(auth: Arc<dyn AuthApi>, store: Arc<dyn TokenStore>, tokens: TokenPair) -> Self {
        store.save(&tokens);
        Self {
            inner: Arc::new(SessionInner {
                auth,
                store,
                state: RwLock::new(TokenState {
                    access: tokens.access,
                    refresh: tokens.refresh,
                    generation: 0,
                }),
                refresh_gate: Mutex::new(()),
            }),
        }
    }

    pub async fn access_token(&self) -> String {
        self.inner.state.read().await.access.clone()
    }

    pub async fn tokens(&self) -> TokenPair {
        let state = self.inner.state.read().await;
        TokenPair {
            access: state.access.clone(),
            refresh: state.refresh.clone(),
        }
    }

    /// Exchanges the refresh token for a fresh access token.
    ///
    /// Concurrent callers coalesce onto one network call: whoever holds the
    /// gate performs the exchange, and everyone queued behind it returns the
    /// token that exchange produced. A failed exchange ends the session and
    /// clears the stored tokens.
    pub async fn refresh_access_token(&self) -> Result<String> {
        let start_generation = self.inner.state.read().await.generation;
        let _gate = self.inner.refresh_gate.lock().await;

        {
            let state = self.inner.state.read().await;
            if state.generation > start_generation {
                return Ok(state.access.clone());
            }
        }

        let refresh_token = self.inner.state.read().await.refresh.clone();
        let response = match self.inner.auth.refresh(&refresh_token).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(error = %err, "token refresh failed, ending session");
                self.inner.store.clear();
                return Err(ClientError::SessionExpired);
            }
        };

        let mut state = self.inner.state.write().await;
        state.access = response.access;
        if let Some(rotated) = response.refresh {
            state.refresh = rotated;
        }
        state.generation += 1;
        self.inner.store.save(&TokenPair {
            access: state.access.clone(),
            refresh: state.refresh.clone(),
        });
        tracing::debug!(generation = state.generation, "access token refreshed");
        Ok(state.access.clone())
    }

    /// Drops the stored tokens. The in-memory pair stays until the session
    /// itself is dropped so in-flight requests can still fail cleanly.
    pub fn sign_out(&self) {
        self.inner.store.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingAuth {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AuthApi for CountingAuth {
        async fn refresh(&self, _refresh_token: &str) -> Result<RefreshResponse> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(RefreshResponse {
                access: format!("access-{call}"),
                refresh: None,
            })
        }
    }

    struct FailingAuth;

    #[async_trait]
    impl AuthApi for FailingAuth {
        async fn refresh(&self, _refresh_token: &str) -> Result<RefreshResponse> {
            Err(ClientError::Rejected("refresh token revoked".into()))
        }
    }

    fn session_with(auth: Arc<dyn AuthApi>, store: Arc<MemoryTokenStore>) -> Session {
        Session::new(
            auth,
            store,
            TokenPair {
                access: "stale".into(),
                refresh: "refresh-1".into(),
            },
        )
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_refreshes_coalesce_into_one_call() {
        let auth = Arc::new(CountingAuth {
            calls: AtomicUsize::new(0),
        });
        let session = session_with(auth.clone(), Arc::new(MemoryTokenStore::default()));

        let mut handles = Vec::new();
        for _ in 0..5 {
            let session = session.clone();
            handles.push(tokio::spawn(
                async move { session.refresh_access_token().await },
            ));
        }
        for handle in handles {
            let token = handle.await.unwrap().unwrap();
            assert_eq!(token, "access-1");
        }
        assert_eq!(auth.calls.load(Ordering::SeqCst), 1);
        assert_eq!(session.access_token().await, "access-1");
    }

    #[tokio::test]
    async fn sequential_refreshes_each_hit_the_network() {
        let auth = Arc::new(CountingAuth {
            calls: AtomicUsize::new(0),
        });
        let session = session_with(auth.clone(), Arc::new(MemoryTokenStore::default()));

        assert_eq!(session.refresh_access_token().await.unwrap(), "access-1");
        assert_eq!(session.refresh_access_token().await.unwrap(), "access-2");
        assert_eq!(auth.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn rotated_refresh_token_is_kept_and_persisted() {
        struct RotatingAuth;

        #[async_trait]
        impl AuthApi for RotatingAuth {
            async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse> {
                assert_eq!(refresh_token, "refresh-1");
                Ok(RefreshResponse {
                    access: "access-next".into(),
                    refresh: Some("refresh-2".into()),
                })
            }
        }

        let store = Arc::new(MemoryTokenStore::default());
        let session = session_with(Arc::new(RotatingAuth), store.clone());
        session.refresh_access_token().await.unwrap();

        let tokens = session.tokens().await;
        assert_eq!(tokens.refresh, "refresh-2");
        let saved = store.latest().unwrap();
        assert_eq!(saved.access, "access-next");
        assert_eq!(saved.refresh, "refresh-2");
    }

    #[tokio::test]
    async fn failed_refresh_expires_the_session_and_clears_storage() {
        let store = Arc::new(MemoryTokenStore::default());
        let session = session_with(Arc::new(FailingAuth), store.clone());
        assert!(store.latest().is_some());

        let err = session.refresh_access_token().await.unwrap_err();
        assert_eq!(err.to_string(), "Session expired. Please log in again.");
        assert!(store.latest().is_none());
    }
}
