use std::{collections::HashMap, sync::Arc};

use anyhow::{Context, Result};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Duration, Utc};
use cookie::time::Duration as CookieDuration;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, types::Json};
use tokio::sync::RwLock;
use tracing::error;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "mbtb_session";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    #[default]
    None,
    User,
    Admin,
}

/// Per-browser state carried between requests.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_type: UserType,
    pub auth_token: Option<String>,
    pub admin_auth_token: Option<String>,
    /// Set by image retrieval; gates `/admin_images/czi/{filename}`.
    pub admin_file_access: bool,
    pub admin_filename: Option<String>,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.user_type == UserType::Admin && self.admin_auth_token.is_some()
    }

    pub fn is_authenticated(&self) -> bool {
        match self.user_type {
            UserType::None => false,
            UserType::User => self.auth_token.is_some(),
            UserType::Admin => self.admin_auth_token.is_some(),
        }
    }

    pub fn may_view_image(&self, filename: &str) -> bool {
        self.admin_file_access && self.admin_filename.as_deref() == Some(filename)
    }
}

/// A loaded session together with the id it is stored under.
#[derive(Clone, Debug)]
pub struct SessionContext {
    pub id: Uuid,
    pub data: Session,
}

type MemoryEntries = Arc<RwLock<HashMap<Uuid, (Session, DateTime<Utc>)>>>;

#[derive(Clone)]
enum Backend {
    Postgres(PgPool),
    Memory(MemoryEntries),
}

#[derive(Clone)]
pub struct SessionStore {
    backend: Backend,
    ttl: Duration,
}

impl SessionStore {
    pub fn postgres(pool: PgPool, ttl: Duration) -> Self {
        Self {
            backend: Backend::Postgres(pool),
            ttl,
        }
    }

    pub fn memory(ttl: Duration) -> Self {
        Self {
            backend: Backend::Memory(Arc::default()),
            ttl,
        }
    }

    /// Resolve the session named by the request cookie, or start a fresh one.
    pub async fn load(&self, jar: &CookieJar) -> SessionContext {
        let existing = jar
            .get(SESSION_COOKIE)
            .and_then(|cookie| Uuid::parse_str(cookie.value()).ok());

        if let Some(id) = existing {
            match self.fetch(id).await {
                Ok(Some(data)) => return SessionContext { id, data },
                Ok(None) => {}
                Err(err) => error!(?err, "failed to load session"),
            }
        }

        SessionContext {
            id: Uuid::new_v4(),
            data: Session::default(),
        }
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<Session>> {
        match &self.backend {
            Backend::Postgres(pool) => {
                let row: Option<Json<Session>> = sqlx::query_scalar(
                    "SELECT data FROM sessions WHERE id = $1 AND expires_at > NOW()",
                )
                .bind(id)
                .fetch_optional(pool)
                .await
                .context("failed to query session")?;
                Ok(row.map(|Json(session)| session))
            }
            Backend::Memory(entries) => {
                let guard = entries.read().await;
                Ok(guard
                    .get(&id)
                    .filter(|(_, expires_at)| *expires_at > Utc::now())
                    .map(|(session, _)| session.clone()))
            }
        }
    }

    /// Persist the session and attach its cookie to `jar`.
    pub async fn commit(&self, ctx: &SessionContext, jar: CookieJar) -> Result<CookieJar> {
        let expires_at = Utc::now() + self.ttl;

        match &self.backend {
            Backend::Postgres(pool) => {
                sqlx::query(
                    "INSERT INTO sessions (id, data, expires_at) VALUES ($1, $2, $3)
                     ON CONFLICT (id) DO UPDATE SET data = EXCLUDED.data, expires_at = EXCLUDED.expires_at",
                )
                .bind(ctx.id)
                .bind(Json(&ctx.data))
                .bind(expires_at)
                .execute(pool)
                .await
                .context("failed to save session")?;
            }
            Backend::Memory(entries) => {
                let mut guard = entries.write().await;
                guard.insert(ctx.id, (ctx.data.clone(), expires_at));
            }
        }

        Ok(jar.add(self.cookie(ctx.id)))
    }

    /// Drop the session server-side and expire the cookie.
    pub async fn destroy(&self, ctx: &SessionContext, jar: CookieJar) -> CookieJar {
        let result = match &self.backend {
            Backend::Postgres(pool) => sqlx::query("DELETE FROM sessions WHERE id = $1")
                .bind(ctx.id)
                .execute(pool)
                .await
                .map(|_| ())
                .context("failed to delete session"),
            Backend::Memory(entries) => {
                entries.write().await.remove(&ctx.id);
                Ok(())
            }
        };

        if let Err(err) = result {
            error!(?err, "failed to remove session during logout");
        }

        let mut removal = Cookie::new(SESSION_COOKIE, "");
        removal.set_path("/");
        removal.set_http_only(true);
        removal.set_same_site(SameSite::Lax);
        removal.set_max_age(CookieDuration::seconds(0));
        jar.remove(removal)
    }

    pub async fn purge_expired(&self) -> Result<u64> {
        match &self.backend {
            Backend::Postgres(pool) => {
                let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
                    .execute(pool)
                    .await
                    .context("failed to purge expired sessions")?;
                Ok(result.rows_affected())
            }
            Backend::Memory(entries) => {
                let now = Utc::now();
                let mut guard = entries.write().await;
                let before = guard.len();
                guard.retain(|_, (_, expires_at)| *expires_at > now);
                Ok((before - guard.len()) as u64)
            }
        }
    }

    fn cookie(&self, id: Uuid) -> Cookie<'static> {
        let mut cookie = Cookie::new(SESSION_COOKIE, id.to_string());
        cookie.set_path("/");
        cookie.set_http_only(true);
        cookie.set_same_site(SameSite::Lax);
        cookie.set_max_age(CookieDuration::seconds(self.ttl.num_seconds()));
        cookie
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jar_with(id: Uuid) -> CookieJar {
        CookieJar::new().add(Cookie::new(SESSION_COOKIE, id.to_string()))
    }

    #[tokio::test]
    async fn committed_session_is_loaded_back() {
        let store = SessionStore::memory(Duration::hours(1));
        let mut ctx = store.load(&CookieJar::new()).await;
        assert_eq!(ctx.data, Session::default());

        ctx.data.user_type = UserType::User;
        ctx.data.auth_token = Some("tok123".to_string());
        let jar = store.commit(&ctx, CookieJar::new()).await.unwrap();
        assert_eq!(
            jar.get(SESSION_COOKIE).map(|cookie| cookie.value().to_string()),
            Some(ctx.id.to_string())
        );

        let loaded = store.load(&jar_with(ctx.id)).await;
        assert_eq!(loaded.id, ctx.id);
        assert_eq!(loaded.data.auth_token.as_deref(), Some("tok123"));
        assert!(loaded.data.is_authenticated());
        assert!(!loaded.data.is_admin());
    }

    #[tokio::test]
    async fn unknown_or_garbled_cookie_starts_fresh() {
        let store = SessionStore::memory(Duration::hours(1));
        let unknown = Uuid::new_v4();
        let ctx = store.load(&jar_with(unknown)).await;
        assert_ne!(ctx.id, unknown);

        let garbled = CookieJar::new().add(Cookie::new(SESSION_COOKIE, "not-a-uuid"));
        let ctx = store.load(&garbled).await;
        assert_eq!(ctx.data, Session::default());
    }

    #[tokio::test]
    async fn expired_sessions_are_ignored_and_purged() {
        let store = SessionStore::memory(Duration::seconds(-1));
        let mut ctx = store.load(&CookieJar::new()).await;
        ctx.data.user_type = UserType::Admin;
        ctx.data.admin_auth_token = Some("admin".to_string());
        store.commit(&ctx, CookieJar::new()).await.unwrap();

        let loaded = store.load(&jar_with(ctx.id)).await;
        assert_ne!(loaded.id, ctx.id);
        assert_eq!(store.purge_expired().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn destroy_forgets_session() {
        let store = SessionStore::memory(Duration::hours(1));
        let ctx = store.load(&CookieJar::new()).await;
        let jar = store.commit(&ctx, CookieJar::new()).await.unwrap();

        store.destroy(&ctx, jar).await;
        let loaded = store.load(&jar_with(ctx.id)).await;
        assert_ne!(loaded.id, ctx.id);
    }

    #[test]
    fn image_access_requires_matching_filename() {
        let session = Session {
            admin_file_access: true,
            admin_filename: Some("BB99-102".to_string()),
            ..Session::default()
        };
        assert!(session.may_view_image("BB99-102"));
        assert!(!session.may_view_image("BB99-103"));
        assert!(!Session::default().may_view_image("BB99-102"));
    }
}
