use charchat_contracts::session::{
    parse_oauth_callback, CheckOutcome, Session, StoredTokens, TokenStore,
};
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::error::ClientError;

/// Owns the session and its durable token store.
///
/// Every component that issues authenticated calls borrows this instead of
/// reaching for global storage.
#[derive(Debug)]
pub struct SessionManager<S: TokenStore> {
    store: S,
    session: Session,
}

impl<S: TokenStore> SessionManager<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            session: Session::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn bearer(&self) -> Option<&str> {
        self.session.token()
    }

    pub fn require_bearer(&self) -> Result<String, ClientError> {
        match self.session.token() {
            Some(token) if self.session.is_authenticated() => Ok(token.to_string()),
            _ => Err(ClientError::SignInRequired),
        }
    }

    /// Reads the persisted tokens and verifies them.
    pub fn load(&mut self, backend: &dyn Backend) -> Result<(), ClientError> {
        let tokens = self.store.load().map_err(ClientError::store)?;
        self.session = Session::from_tokens(tokens);
        self.check(backend)
    }

    /// Re-runs the whoami check so balances reflect server-side changes.
    pub fn refresh(&mut self, backend: &dyn Backend) -> Result<(), ClientError> {
        self.check(backend)
    }

    /// Refresh after a state-changing action; failures are only logged.
    pub fn refresh_quietly(&mut self, backend: &dyn Backend) {
        if let Err(err) = self.refresh(backend) {
            warn!(error = %err, "session refresh failed");
        }
    }

    pub fn sign_in(
        &mut self,
        backend: &dyn Backend,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> Result<bool, ClientError> {
        let access_token = access_token.trim();
        if access_token.is_empty() {
            return Err(ClientError::Validation(
                "access token must not be empty".to_string(),
            ));
        }
        let tokens = StoredTokens {
            auth_token: Some(access_token.to_string()),
            refresh_token: refresh_token
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
        };
        self.adopt(backend, tokens)?;
        Ok(self.session.is_authenticated())
    }

    /// Consumes an OAuth redirect URL. Returns the URL to show once the
    /// tokens are stripped, or `None` when the URL carried no token pair (the
    /// persisted session is loaded instead).
    pub fn consume_oauth_callback(
        &mut self,
        backend: &dyn Backend,
        url: &str,
    ) -> Result<Option<String>, ClientError> {
        let callback = parse_oauth_callback(url)
            .map_err(|err| ClientError::Validation(format!("{err:#}")))?;
        match callback {
            Some(callback) => {
                info!("oauth callback delivered tokens");
                self.adopt(backend, callback.tokens)?;
                Ok(Some(callback.visible_url))
            }
            None => {
                self.load(backend)?;
                Ok(None)
            }
        }
    }

    pub fn logout(&mut self) -> Result<(), ClientError> {
        info!("signing out");
        self.session.invalidate();
        self.store.clear().map_err(ClientError::store)
    }

    /// Reacts to the failure of a protected call. A 401/403 means the token
    /// went stale: it is dropped and the session turns anonymous.
    pub fn note_failure(&mut self, err: &ClientError) {
        if !err.is_auth_failure() {
            return;
        }
        info!("backend rejected the token; continuing anonymously");
        self.invalidate();
    }

    /// Drops a token the backend no longer accepts. Same effect as logout,
    /// except store failures are only logged.
    pub fn invalidate(&mut self) {
        self.session.invalidate();
        if let Err(store_err) = self.store.clear() {
            warn!(error = %format!("{store_err:#}"), "failed clearing stale token");
        }
    }

    fn adopt(&mut self, backend: &dyn Backend, tokens: StoredTokens) -> Result<(), ClientError> {
        self.store.save(&tokens).map_err(ClientError::store)?;
        self.session.adopt_tokens(tokens);
        self.check(backend)
    }

    fn check(&mut self, backend: &dyn Backend) -> Result<(), ClientError> {
        let Some(token) = self.session.begin_check() else {
            debug!("no stored token; anonymous");
            return Ok(());
        };

        let outcome = match backend.whoami(&token) {
            Ok(me) => CheckOutcome::Verified(me.into_user_info()),
            Err(ClientError::Unauthorized { status, .. })
            | Err(ClientError::Http { status, .. }) => {
                debug!(status, "stored token rejected");
                CheckOutcome::Rejected
            }
            Err(err) => {
                warn!(error = %err, "auth check failed");
                CheckOutcome::Unreachable
            }
        };

        let rejected = outcome == CheckOutcome::Rejected;
        self.session.complete_check(outcome);
        if let Some(user) = self.session.user() {
            info!(user_id = user.id, coins = user.coins, "authenticated");
        }
        if rejected {
            if let Err(store_err) = self.store.clear() {
                warn!(error = %format!("{store_err:#}"), "failed clearing rejected token");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use charchat_contracts::session::{AuthPhase, MemoryTokenStore};

    use super::*;
    use crate::testing::FakeBackend;

    fn stored(token: &str) -> MemoryTokenStore {
        MemoryTokenStore::with_tokens(StoredTokens {
            auth_token: Some(token.to_string()),
            refresh_token: Some("refresh".to_string()),
        })
    }

    #[test]
    fn absent_token_is_anonymous_without_request() -> anyhow::Result<()> {
        let backend = FakeBackend::new();
        let mut manager = SessionManager::new(MemoryTokenStore::new());
        manager.load(&backend)?;

        assert_eq!(manager.session().phase(), AuthPhase::Anonymous);
        assert!(manager.session().user().is_none());
        assert!(backend.calls().is_empty());
        Ok(())
    }

    #[test]
    fn valid_token_populates_user() -> anyhow::Result<()> {
        let backend = FakeBackend::new().with_user(7, "anna@example.com", 120);
        let mut manager = SessionManager::new(stored("good"));
        manager.load(&backend)?;

        assert!(manager.session().is_authenticated());
        assert_eq!(manager.session().coins(), 120);
        assert_eq!(backend.calls(), vec!["whoami:good"]);
        assert_eq!(manager.require_bearer()?, "good");
        Ok(())
    }

    #[test]
    fn invalid_token_is_removed_silently() -> anyhow::Result<()> {
        let backend = FakeBackend::new().rejecting_tokens();
        let store = stored("stale");
        let mut manager = SessionManager::new(store.clone());
        manager.load(&backend)?;

        assert!(!manager.session().is_authenticated());
        assert!(manager.session().user().is_none());
        assert_eq!(store.snapshot(), StoredTokens::default());
        assert_eq!(manager.require_bearer(), Err(ClientError::SignInRequired));
        Ok(())
    }

    #[derive(Debug)]
    struct ReadOnlyStore(StoredTokens);

    impl TokenStore for ReadOnlyStore {
        fn load(&self) -> anyhow::Result<StoredTokens> {
            Ok(self.0.clone())
        }

        fn save(&self, _tokens: &StoredTokens) -> anyhow::Result<()> {
            anyhow::bail!("token store is read-only")
        }

        fn clear(&self) -> anyhow::Result<()> {
            anyhow::bail!("token store is read-only")
        }
    }

    #[test]
    fn rejected_token_with_read_only_store_still_loads() -> anyhow::Result<()> {
        let backend = FakeBackend::new().rejecting_tokens();
        let mut manager = SessionManager::new(ReadOnlyStore(StoredTokens {
            auth_token: Some("stale".to_string()),
            refresh_token: None,
        }));
        manager.load(&backend)?;

        assert!(!manager.session().is_authenticated());
        assert!(manager.session().user().is_none());
        assert_eq!(manager.require_bearer(), Err(ClientError::SignInRequired));
        Ok(())
    }

    #[test]
    fn unreachable_backend_keeps_token() -> anyhow::Result<()> {
        let backend = FakeBackend::new().offline();
        let store = stored("good");
        let mut manager = SessionManager::new(store.clone());
        manager.load(&backend)?;

        assert!(!manager.session().is_authenticated());
        assert_eq!(store.snapshot().auth_token.as_deref(), Some("good"));
        Ok(())
    }

    #[test]
    fn sign_in_persists_and_verifies() -> anyhow::Result<()> {
        let backend = FakeBackend::new().with_user(7, "anna", 10);
        let store = MemoryTokenStore::new();
        let mut manager = SessionManager::new(store.clone());
        manager.load(&backend)?;

        assert!(manager.sign_in(&backend, " fresh ", None)?);
        assert_eq!(store.snapshot().auth_token.as_deref(), Some("fresh"));
        assert_eq!(manager.session().user().map(|user| user.id), Some(7));

        assert!(matches!(
            manager.sign_in(&backend, "  ", None),
            Err(ClientError::Validation(_))
        ));
        Ok(())
    }

    #[test]
    fn oauth_callback_stores_tokens_and_strips_url() -> anyhow::Result<()> {
        let backend = FakeBackend::new().with_user(7, "anna", 10);
        let store = MemoryTokenStore::new();
        let mut manager = SessionManager::new(store.clone());

        let visible = manager.consume_oauth_callback(
            &backend,
            "http://localhost:5175/?access_token=abc&refresh_token=def",
        )?;
        assert_eq!(visible.as_deref(), Some("http://localhost:5175/"));
        assert_eq!(
            store.snapshot(),
            StoredTokens {
                auth_token: Some("abc".to_string()),
                refresh_token: Some("def".to_string()),
            }
        );
        assert!(manager.session().is_authenticated());
        Ok(())
    }

    #[test]
    fn plain_url_falls_back_to_stored_session() -> anyhow::Result<()> {
        let backend = FakeBackend::new().with_user(7, "anna", 10);
        let mut manager = SessionManager::new(stored("good"));
        let visible = manager.consume_oauth_callback(&backend, "http://localhost:5175/chat")?;
        assert_eq!(visible, None);
        assert!(manager.session().is_authenticated());
        Ok(())
    }

    #[test]
    fn logout_clears_store() -> anyhow::Result<()> {
        let backend = FakeBackend::new().with_user(7, "anna", 10);
        let store = stored("good");
        let mut manager = SessionManager::new(store.clone());
        manager.load(&backend)?;
        manager.logout()?;

        assert_eq!(manager.session().phase(), AuthPhase::Anonymous);
        assert_eq!(store.snapshot(), StoredTokens::default());
        Ok(())
    }

    #[test]
    fn unauthorized_protected_call_downgrades_session() -> anyhow::Result<()> {
        let backend = FakeBackend::new().with_user(7, "anna", 10);
        let store = stored("good");
        let mut manager = SessionManager::new(store.clone());
        manager.load(&backend)?;

        manager.note_failure(&ClientError::Http {
            status: 500,
            detail: None,
            body: String::new(),
        });
        assert!(manager.session().is_authenticated());

        manager.note_failure(&ClientError::Unauthorized {
            status: 401,
            detail: None,
        });
        assert!(!manager.session().is_authenticated());
        assert_eq!(store.snapshot(), StoredTokens::default());
        Ok(())
    }
}
