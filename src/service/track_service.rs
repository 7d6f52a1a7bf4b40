//! Track service: authenticates, persists and fans out track updates.

use std::sync::Arc;

use crate::auth::TokenAuthority;
use crate::domain::{LiveUpdate, SubscriberRegistry, Subscription, Token, TrackUpdate};
use crate::error::LiveError;
use crate::persistence::{StoreError, TrackStore};

/// Orchestration layer between the HTTP surface, the token authority, the
/// store and the subscriber registry.
///
/// Holds no lock across store calls; the store's uniqueness constraint is
/// the only guard against duplicate updates.
#[derive(Debug, Clone)]
pub struct TrackService {
    authority: Arc<TokenAuthority>,
    store: Arc<dyn TrackStore>,
    subscribers: Arc<SubscriberRegistry>,
}

impl TrackService {
    /// Creates a new `TrackService`.
    #[must_use]
    pub fn new(
        authority: Arc<TokenAuthority>,
        store: Arc<dyn TrackStore>,
        subscribers: Arc<SubscriberRegistry>,
    ) -> Self {
        Self {
            authority,
            store,
            subscribers,
        }
    }

    /// Returns a reference to the inner [`SubscriberRegistry`].
    #[must_use]
    pub fn subscribers(&self) -> &Arc<SubscriberRegistry> {
        &self.subscribers
    }

    /// Mints a token for `user_id` on behalf of the admin key holder.
    ///
    /// # Errors
    ///
    /// Returns [`LiveError::AuthDenied`] if `presented_key` is wrong.
    pub fn issue(&self, presented_key: &str, user_id: &str) -> Result<Token, LiveError> {
        let token = self.authority.mint(user_id, presented_key)?;
        tracing::info!(
            user_id,
            issued_at = token.issued_at,
            expires_at = token.expires_at,
            "issued token"
        );
        Ok(token)
    }

    /// Checks that `bearer` is a valid token for exactly `path_user`.
    ///
    /// # Errors
    ///
    /// - [`LiveError::AuthDenied`] if the token does not verify.
    /// - [`LiveError::Forbidden`] if it was issued for another user.
    pub fn authorize(&self, bearer: &str, path_user: &str) -> Result<(), LiveError> {
        let token_user = self.authority.verify(bearer)?;
        if token_user != path_user {
            return Err(LiveError::Forbidden {
                token_user,
                path_user: path_user.to_string(),
            });
        }
        Ok(())
    }

    /// Records `update` in session `(user_id, started)` and pushes it to
    /// the user's live viewers.
    ///
    /// Viewers are only notified once the write has succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`LiveError::Conflict`] for a duplicate `when`, or
    /// [`LiveError::StorageFailure`] if the store fails.
    pub async fn ingest(
        &self,
        user_id: &str,
        started: i64,
        update: TrackUpdate,
    ) -> Result<(), LiveError> {
        let idx = update.index;
        if let Err(err) = self.store.append_update(user_id, started, &update).await {
            match &err {
                StoreError::Conflict => {
                    tracing::warn!(user_id, started, idx, "duplicate track update");
                }
                _ => {
                    tracing::error!(user_id, started, idx, error = %err, "adding track update");
                }
            }
            return Err(LiveError::from_write(err));
        }

        let delivery = self.subscribers.publish(LiveUpdate {
            user_id: user_id.to_string(),
            started,
            update,
        });
        tracing::debug!(
            user_id,
            started,
            idx,
            delivered = delivery.delivered,
            dropped = delivery.dropped,
            "track update ingested"
        );
        Ok(())
    }

    /// Lists `user_id`'s session start times, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`LiveError::Internal`] if the store fails.
    pub async fn list_sessions(&self, user_id: &str) -> Result<Vec<i64>, LiveError> {
        self.store
            .list_sessions(user_id)
            .await
            .map_err(LiveError::from_read)
    }

    /// Returns one session's updates in index order.
    ///
    /// # Errors
    ///
    /// Returns [`LiveError::Internal`] if the store fails.
    pub async fn get_session(
        &self,
        user_id: &str,
        started: i64,
    ) -> Result<Vec<TrackUpdate>, LiveError> {
        self.store
            .get_session(user_id, started)
            .await
            .map_err(LiveError::from_read)
    }

    /// Deletes a session. Reserved.
    ///
    /// # Errors
    ///
    /// Returns [`LiveError::NotImplemented`] while the store does not
    /// support deletion.
    pub async fn delete_session(&self, user_id: &str, started: i64) -> Result<(), LiveError> {
        self.store
            .delete_session(user_id, started)
            .await
            .map_err(LiveError::from_write)
    }

    /// Registers a live viewer for `user_id`.
    #[must_use]
    pub fn subscribe(&self, user_id: &str) -> Subscription {
        self.subscribers.subscribe(user_id)
    }

    /// Releases every live viewer, then the store.
    pub async fn shutdown(&self) {
        self.subscribers.shutdown();
        self.store.close().await;
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    const URL: &str = "http://localhost:8080";
    const KEY: &str = "secret";

    fn make_service() -> (TrackService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let service = TrackService::new(
            Arc::new(TokenAuthority::new(URL, KEY)),
            Arc::clone(&store) as Arc<dyn TrackStore>,
            Arc::new(SubscriberRegistry::new(8)),
        );
        (service, store)
    }

    #[test]
    fn issued_token_authorizes_its_user_only() {
        let (service, _) = make_service();
        let Ok(token) = service.issue(KEY, "alice") else {
            panic!("issue should succeed");
        };
        tokio_test::assert_ok!(service.authorize(&token.raw_token, "alice"));
        assert!(matches!(
            service.authorize(&token.raw_token, "bob"),
            Err(LiveError::Forbidden { .. })
        ));
        assert!(matches!(
            service.authorize("garbage", "alice"),
            Err(LiveError::AuthDenied(_))
        ));
    }

    #[test]
    fn issue_with_wrong_key_is_denied() {
        let (service, _) = make_service();
        assert!(matches!(
            service.issue("wrong", "alice"),
            Err(LiveError::AuthDenied(_))
        ));
    }

    #[tokio::test]
    async fn ingest_persists_then_publishes() {
        let (service, store) = make_service();
        let mut viewer = service.subscribe("alice");

        let update = TrackUpdate::new("d1", "A", "B", 1_000_005, 0);
        tokio_test::assert_ok!(service.ingest("alice", 1_000_000, update.clone()).await);
        assert_eq!(store.len(), 1);

        let Some(live) = viewer.recv().await else {
            panic!("viewer should receive the update");
        };
        assert_eq!(live.user_id, "alice");
        assert_eq!(live.started, 1_000_000);
        assert_eq!(live.update, update);
    }

    #[tokio::test]
    async fn duplicate_is_not_published() {
        let (service, _) = make_service();
        let update = TrackUpdate::new("d1", "A", "B", 1_000_005, 0);
        tokio_test::assert_ok!(service.ingest("alice", 1_000_000, update.clone()).await);

        let mut viewer = service.subscribe("alice");
        let retry = service.ingest("alice", 1_000_000, update).await;
        assert!(matches!(retry, Err(LiveError::Conflict)));

        service.subscribers().shutdown();
        assert!(viewer.recv().await.is_none());
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn duplicate_is_logged_with_session_context() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let (service, _) = make_service();
        let update = TrackUpdate::new("d1", "A", "B", 1_000_005, 3);
        tokio_test::assert_ok!(service.ingest("alice", 1_000_000, update.clone()).await);
        let retry = service.ingest("alice", 1_000_000, update).await;
        assert!(matches!(retry, Err(LiveError::Conflict)));

        let text = String::from_utf8_lossy(&logs.0.lock()).into_owned();
        let Some(line) = text.lines().find(|l| l.contains("duplicate track update")) else {
            panic!("duplicate was not logged: {text}");
        };
        assert!(line.contains("WARN"), "{line}");
        assert!(line.contains("alice"), "{line}");
        assert!(line.contains("started=1000000"), "{line}");
        assert!(line.contains("idx=3"), "{line}");
    }

    #[tokio::test]
    async fn delete_session_is_not_implemented() {
        let (service, _) = make_service();
        let result = service.delete_session("alice", 1).await;
        assert!(matches!(result, Err(LiveError::NotImplemented)));
    }

    #[tokio::test]
    async fn shutdown_ends_live_streams() {
        let (service, _) = make_service();
        let mut viewer = service.subscribe("alice");
        service.shutdown().await;
        assert!(viewer.recv().await.is_none());
    }
}
