//! Registry of open variant editor sessions.
//!
//! Sessions are cached in memory and expire after a period of inactivity.
//! Each editor sits behind its own async mutex, so requests against the same
//! session run one at a time.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::variants::VariantEditor;

/// An editor shared between the requests of one session.
pub type SharedEditor = Arc<Mutex<VariantEditor>>;

/// Upper bound on concurrently open sessions.
const MAX_SESSIONS: u64 = 10_000;

/// In-memory editor sessions keyed by a random session ID.
#[derive(Clone)]
pub struct EditorSessions {
    cache: Cache<Uuid, SharedEditor>,
}

impl EditorSessions {
    /// Create a registry whose sessions expire after `idle_ttl` without use.
    #[must_use]
    pub fn new(idle_ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(MAX_SESSIONS)
            .time_to_idle(idle_ttl)
            .build();
        Self { cache }
    }

    /// Register an editor and return its session ID.
    pub async fn open(&self, editor: VariantEditor) -> Uuid {
        let id = Uuid::new_v4();
        self.cache.insert(id, Arc::new(Mutex::new(editor))).await;
        id
    }

    /// Look up an open session.
    pub async fn get(&self, id: Uuid) -> Option<SharedEditor> {
        self.cache.get(&id).await
    }

    /// Close a session. Unknown IDs are ignored.
    pub async fn discard(&self, id: Uuid) {
        self.cache.invalidate(&id).await;
    }
}

impl std::fmt::Debug for EditorSessions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSessions")
            .field("open", &self.cache.entry_count())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use univendor_core::ProductId;

    use super::*;
    use crate::models::ProductSummary;

    fn editor() -> VariantEditor {
        VariantEditor::new(ProductSummary {
            id: ProductId::new(1),
            name: "Tee".to_string(),
            sku: None,
            selling_price: Some(Decimal::from(20)),
        })
    }

    #[tokio::test]
    async fn test_open_get_discard() {
        let sessions = EditorSessions::new(Duration::from_secs(60));
        let id = sessions.open(editor()).await;

        let shared = sessions.get(id).await.unwrap();
        assert_eq!(shared.lock().await.product().name, "Tee");

        sessions.discard(id).await;
        assert!(sessions.get(id).await.is_none());
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let sessions = EditorSessions::new(Duration::from_secs(60));
        let first = sessions.open(editor()).await;
        let second = sessions.open(editor()).await;
        assert_ne!(first, second);

        sessions
            .get(first)
            .await
            .unwrap()
            .lock()
            .await
            .add_attribute("Material")
            .unwrap();

        let untouched = sessions.get(second).await.unwrap();
        assert_eq!(untouched.lock().await.attributes().len(), 2);
    }
}
