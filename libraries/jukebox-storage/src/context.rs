use std::sync::Arc;

use chrono::Utc;
use jukebox_core::{
    EngineConfig, InsertOutcome, MediaResolver, PlayRecord, PlaylistItem, Result, SearchPage,
    SongId, SongInfo, User, UserId,
};
use sqlx::SqlitePool;

use crate::credits::{self, RenewalOutcome};
use crate::{duplicates, playlists, selector, songs, stats, users};

/// Jukebox engine backed by `SQLite`
///
/// Ties the pool, the engine settings and the media resolver together and
/// exposes every caller-facing operation. Cheap to clone; clones share the
/// pool.
#[derive(Clone)]
pub struct Jukebox {
    pool: SqlitePool,
    config: Arc<EngineConfig>,
    resolver: Arc<dyn MediaResolver>,
}

impl Jukebox {
    pub fn new(pool: SqlitePool, config: EngineConfig, resolver: Arc<dyn MediaResolver>) -> Self {
        Self {
            pool,
            config: Arc::new(config),
            resolver,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn resolver(&self) -> &dyn MediaResolver {
        self.resolver.as_ref()
    }

    // Play selection
    pub async fn next_for_user(&self, user_id: UserId) -> Result<PlayRecord> {
        selector::next_for_user(self, user_id).await
    }

    pub async fn next_autoplay(&self) -> Result<Option<PlayRecord>> {
        selector::next_autoplay(self).await
    }

    pub async fn record_outcome(&self, record: &PlayRecord) -> Result<()> {
        stats::record_outcome(&self.pool, record, Utc::now(), self.config.rotate_by_default).await
    }

    // Playlists
    pub async fn append(&self, user_id: UserId, inputs: &[String]) -> Result<InsertOutcome> {
        playlists::append(self, user_id, inputs).await
    }

    pub async fn prepend(&self, user_id: UserId, inputs: &[String]) -> Result<InsertOutcome> {
        playlists::prepend(self, user_id, inputs).await
    }

    pub async fn push(&self, user_id: UserId, keywords: &[String]) -> Result<(SongId, String)> {
        playlists::push(self, user_id, keywords).await
    }

    pub async fn pop(&self, user_id: UserId, count: i64) -> Result<u64> {
        playlists::pop(&self.pool, user_id, count, self.config.rotate_by_default).await
    }

    pub async fn clear(&self, user_id: UserId) -> Result<u64> {
        playlists::clear(&self.pool, user_id).await
    }

    pub async fn shuffle(&self, user_id: UserId) -> Result<()> {
        playlists::shuffle(&self.pool, user_id, self.config.rotate_by_default).await
    }

    pub async fn list(&self, user_id: UserId, offset: i64, limit: i64) -> Result<Vec<PlaylistItem>> {
        playlists::list(&self.pool, user_id, offset, limit).await
    }

    pub async fn playlist_len(&self, user_id: UserId) -> Result<i64> {
        users::playlist_len(&self.pool, user_id).await
    }

    // Users
    pub async fn user(&self, user_id: UserId) -> Result<Option<User>> {
        users::get(&self.pool, user_id).await
    }

    pub async fn get_rotate(&self, user_id: UserId) -> Result<bool> {
        users::get_rotate(&self.pool, user_id, self.config.rotate_by_default).await
    }

    pub async fn set_rotate(&self, user_id: UserId, rotate: bool) -> Result<()> {
        users::set_rotate(&self.pool, user_id, rotate).await
    }

    // Catalog
    pub async fn blacklist(&self, song_id: SongId) -> Result<()> {
        songs::blacklist(&self.pool, song_id).await
    }

    pub async fn permit(&self, song_id: SongId) -> Result<()> {
        songs::permit(&self.pool, song_id).await
    }

    pub async fn rename(&self, song_id: SongId, title: &str) -> Result<()> {
        songs::rename(&self.pool, song_id, title).await
    }

    /// Search capped at the configured page limit
    pub async fn search(&self, keywords: &[String]) -> Result<SearchPage> {
        songs::search(&self.pool, keywords, self.config.page_limit).await
    }

    pub async fn info(&self, song_id: SongId) -> Result<SongInfo> {
        songs::info(&self.pool, song_id).await
    }

    pub async fn list_failed(&self) -> Result<SearchPage> {
        songs::list_failed(&self.pool, self.config.page_limit).await
    }

    /// Clear one song's failed flag, or every flag when `song_id` is `None`
    pub async fn clear_failed(&self, song_id: Option<SongId>) -> Result<u64> {
        songs::clear_failed(&self.pool, song_id).await
    }

    // Duplicates
    pub async fn merge(&self, source_id: SongId, target_id: SongId) -> Result<()> {
        duplicates::merge(&self.pool, source_id, target_id).await
    }

    pub async fn split(&self, song_id: SongId) -> Result<()> {
        duplicates::split(&self.pool, song_id).await
    }

    // Credits
    /// One renewal cycle as of now
    pub async fn renew_credits(&self) -> Result<RenewalOutcome> {
        credits::renew(
            &self.pool,
            Utc::now(),
            self.config.credit_renewal_period(),
            self.config.credit_cap,
        )
        .await
    }

    pub async fn ensure_credit_checkpoint(&self) -> Result<()> {
        credits::ensure_checkpoint(&self.pool, Utc::now()).await?;
        Ok(())
    }
}
