//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AdminConfig;
use crate::services::{EditorSessions, LocalImageStorage};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pool: PgPool,
    sessions: EditorSessions,
    images: LocalImageStorage,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Admin configuration (session TTL and upload settings)
    /// * `pool` - `PostgreSQL` connection pool
    #[must_use]
    pub fn new(config: &AdminConfig, pool: PgPool) -> Self {
        let sessions = EditorSessions::new(config.editor_session_ttl);
        let images = LocalImageStorage::new(&config.upload_dir, &config.upload_base_url);

        Self {
            inner: Arc::new(AppStateInner {
                pool,
                sessions,
                images,
            }),
        }
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Open variant editor sessions.
    #[must_use]
    pub fn sessions(&self) -> &EditorSessions {
        &self.inner.sessions
    }

    /// Storage for uploaded variant images.
    #[must_use]
    pub fn images(&self) -> &LocalImageStorage {
        &self.inner.images
    }
}
