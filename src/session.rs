// In-memory admin session store and the extractor gating admin routes.
// Sessions are cookie tokens with a TTL; there is a single admin identity
// coming from configuration, so no user table is involved.

use std::future::{ready, Ready};
use std::sync::Arc;

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::error::Error;
use crate::AppState;

pub const SESSION_COOKIE: &str = "admin_session";
const TOKEN_LEN: usize = 48;

#[derive(Debug, Clone)]
pub struct Session {
    pub admin_email: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    sessions: DashMap<String, Session>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl_hours: i64) -> Self {
        SessionStore {
            inner: Arc::new(SessionInner {
                sessions: DashMap::new(),
                ttl: Duration::hours(ttl_hours),
            }),
        }
    }

    pub fn create(&self, admin_email: &str) -> String {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LEN)
            .map(char::from)
            .collect();
        self.inner.sessions.insert(
            token.clone(),
            Session {
                admin_email: admin_email.to_string(),
                expires_at: Utc::now() + self.inner.ttl,
            },
        );
        token
    }

    // Expired sessions are evicted on access.
    pub fn get(&self, token: &str) -> Option<Session> {
        let session = self.inner.sessions.get(token)?.clone();
        if session.expires_at <= Utc::now() {
            self.inner.sessions.remove(token);
            return None;
        }
        Some(session)
    }

    pub fn remove(&self, token: &str) {
        self.inner.sessions.remove(token);
    }
}

/// Extractor for admin-only routes. Resolves the session cookie against the
/// store; anything else is a 401 before the handler runs.
pub struct AdminGuard {
    pub admin_email: String,
}

impl FromRequest for AdminGuard {
    type Error = Error;
    type Future = Ready<Result<Self, Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let session = req
            .app_data::<web::Data<AppState>>()
            .and_then(|state| {
                let cookie = req.cookie(SESSION_COOKIE)?;
                state.sessions.get(cookie.value())
            });
        let result = match session {
            Some(session) => Ok(AdminGuard {
                admin_email: session.admin_email,
            }),
            None => Err(Error::Unauthorized),
        };
        ready(result)
    }
}
