use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio_util::sync::CancellationToken;

use crate::{
    config::Preferences,
    db::{DbConn, DbPool},
    errors::AppResult,
    fetcher::FeedSource,
};

/// Everything a command handler may touch: preferences, storage, the feed source,
/// and the cancellation signal forwarded to long-running work.
pub struct AppState {
    config: RwLock<Preferences>,
    pool: DbPool,
    feed_source: Arc<dyn FeedSource>,
    cancel: CancellationToken,
}

impl AppState {
    pub fn new(
        config: Preferences,
        pool: DbPool,
        feed_source: Arc<dyn FeedSource>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config: RwLock::new(config),
            pool,
            feed_source,
            cancel,
        }
    }

    pub fn config(&self) -> RwLockReadGuard<'_, Preferences> {
        self.config.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn config_mut(&self) -> RwLockWriteGuard<'_, Preferences> {
        self.config.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Name of the active user, read fresh on every call.
    pub fn current_user_name(&self) -> Option<String> {
        self.config().current_user().map(str::to_string)
    }

    pub fn conn(&self) -> AppResult<DbConn> {
        Ok(self.pool.get()?)
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn feed_source(&self) -> &dyn FeedSource {
        self.feed_source.as_ref()
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }
}
