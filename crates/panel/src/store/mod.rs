// Presence rows per page: register, heartbeat, leave, list.
//
// Rows are keyed by (page, identity). Listing evicts rows whose last
// heartbeat is older than the staleness window. Every mutation is announced
// on a broadcast channel so live panels can refetch instead of polling.

pub mod color;
pub mod nickname;

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};

use pagepresence_common::types::PresenceEntry;

use crate::identity::IdentityResolver;
use color::assign_color;
use nickname::{validate_nickname, NicknameBook, NicknameError};

const ANONYMOUS: &str = "anonymous";
const CHANGE_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PresenceError {
    #[error("page_id required")]
    PageIdRequired,

    #[error("user_id or token required")]
    IdentityRequired,

    #[error(transparent)]
    Nickname(#[from] NicknameError),
}

/// Parameters of a presence registration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterRequest {
    pub token: Option<String>,
    /// Display id the client resolved itself, used without a token.
    pub client_user_id: Option<String>,
    pub target_element_id: Option<String>,
}

/// Result of a registration: who the page sees, in which color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub identity: String,
    pub display_name: String,
    pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaveRequest {
    pub token: Option<String>,
    pub client_user_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatOutcome {
    Refreshed,
    /// No row for this identity (never registered or evicted); register again.
    Unknown,
}

/// Notification that a page's presence rows changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceChange {
    pub page_id: String,
}

/// The presence backend as seen by a live panel.
///
/// All methods return `Send` futures so the panel loop can run on a
/// multi-threaded runtime.
pub trait PresenceService: Send + Sync + 'static {
    fn register(
        &self,
        page_id: &str,
        request: RegisterRequest,
    ) -> impl Future<Output = Result<Registration, PresenceError>> + Send;

    fn heartbeat(
        &self,
        page_id: &str,
        identity: &str,
        target_element_id: Option<&str>,
    ) -> impl Future<Output = Result<HeartbeatOutcome, PresenceError>> + Send;

    fn leave(
        &self,
        page_id: &str,
        request: LeaveRequest,
    ) -> impl Future<Output = Result<(), PresenceError>> + Send;

    /// Current snapshot for a page, most recently seen first.
    fn list(
        &self,
        page_id: &str,
    ) -> impl Future<Output = Result<Vec<PresenceEntry>, PresenceError>> + Send;

    /// Push notifications, when the backend supports them.
    fn subscribe(&self) -> Option<broadcast::Receiver<PresenceChange>>;
}

#[derive(Debug, Clone)]
struct PresenceRow {
    display_name: String,
    target_element_id: Option<String>,
    color: String,
    last_seen: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct StoreState {
    /// (page_id, identity) -> row
    rows: HashMap<(String, String), PresenceRow>,
    nicknames: NicknameBook,
}

/// In-process presence backend.
#[derive(Debug, Clone)]
pub struct InMemoryPresenceStore<R: IdentityResolver> {
    inner: Arc<StoreInner<R>>,
}

#[derive(Debug)]
struct StoreInner<R> {
    resolver: R,
    stale_after: chrono::Duration,
    state: RwLock<StoreState>,
    changes: broadcast::Sender<PresenceChange>,
}

impl<R: IdentityResolver> InMemoryPresenceStore<R> {
    pub fn new(resolver: R, stale_after: Duration) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(StoreInner {
                resolver,
                stale_after: chrono::Duration::from_std(stale_after)
                    .unwrap_or(chrono::Duration::MAX),
                state: RwLock::new(StoreState::default()),
                changes,
            }),
        }
    }

    async fn resolve(&self, token: Option<&str>) -> Option<crate::identity::Identity> {
        match token.filter(|token| !token.is_empty()) {
            Some(token) => self.inner.resolver.resolve(token).await,
            None => None,
        }
    }

    fn announce(&self, page_id: &str) {
        // No receivers is fine: nobody is watching this page.
        let _ = self.inner.changes.send(PresenceChange { page_id: page_id.to_string() });
    }

    pub async fn register_at(
        &self,
        page_id: &str,
        request: RegisterRequest,
        now: DateTime<Utc>,
    ) -> Result<Registration, PresenceError> {
        if page_id.is_empty() {
            return Err(PresenceError::PageIdRequired);
        }
        let resolved = self.resolve(request.token.as_deref()).await;
        let client_user_id = request.client_user_id.filter(|id| !id.is_empty());

        let mut state = self.inner.state.write().await;
        let (identity, display_name) = match resolved {
            Some(identity) => {
                let display_name = state
                    .nicknames
                    .get(&identity.subject_id)
                    .map(str::to_string)
                    .unwrap_or(identity.display_name);
                (identity.subject_id, display_name)
            }
            None => {
                let display_name = client_user_id.unwrap_or_else(|| ANONYMOUS.to_string());
                (format!("anon:{display_name}"), display_name)
            }
        };

        let color = assign_color(&identity).to_string();
        state.rows.insert(
            (page_id.to_string(), identity.clone()),
            PresenceRow {
                display_name: display_name.clone(),
                target_element_id: request.target_element_id.filter(|id| !id.is_empty()),
                color: color.clone(),
                last_seen: now,
            },
        );
        drop(state);

        info!(page = %page_id, identity = %identity, "presence registered");
        self.announce(page_id);
        Ok(Registration { identity, display_name, color })
    }

    pub async fn heartbeat_at(
        &self,
        page_id: &str,
        identity: &str,
        target_element_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<HeartbeatOutcome, PresenceError> {
        if page_id.is_empty() {
            return Err(PresenceError::PageIdRequired);
        }
        let mut state = self.inner.state.write().await;
        let Some(row) = state.rows.get_mut(&(page_id.to_string(), identity.to_string())) else {
            debug!(page = %page_id, identity = %identity, "heartbeat for unknown presence row");
            return Ok(HeartbeatOutcome::Unknown);
        };
        row.target_element_id = target_element_id.filter(|id| !id.is_empty()).map(str::to_string);
        row.last_seen = now;
        drop(state);

        self.announce(page_id);
        Ok(HeartbeatOutcome::Refreshed)
    }

    pub async fn leave_at(&self, page_id: &str, request: LeaveRequest) -> Result<(), PresenceError> {
        if page_id.is_empty() {
            return Err(PresenceError::PageIdRequired);
        }
        let identity = match self.resolve(request.token.as_deref()).await {
            Some(identity) => identity.subject_id,
            None => match request.client_user_id.filter(|id| !id.is_empty()) {
                Some(user_id) => format!("anon:{user_id}"),
                None => return Err(PresenceError::IdentityRequired),
            },
        };

        let removed =
            self.inner.state.write().await.rows.remove(&(page_id.to_string(), identity.clone()));
        if removed.is_some() {
            info!(page = %page_id, identity = %identity, "presence left");
            self.announce(page_id);
        }
        Ok(())
    }

    pub async fn list_at(
        &self,
        page_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<PresenceEntry>, PresenceError> {
        if page_id.is_empty() {
            return Err(PresenceError::PageIdRequired);
        }
        let cutoff = now.checked_sub_signed(self.inner.stale_after).unwrap_or(DateTime::<Utc>::MIN_UTC);

        let mut state = self.inner.state.write().await;
        let before = state.rows.len();
        state.rows.retain(|_, row| row.last_seen >= cutoff);
        let evicted = before - state.rows.len();
        if evicted > 0 {
            debug!(evicted, "evicted stale presence rows");
        }

        let mut entries: Vec<PresenceEntry> = state
            .rows
            .iter()
            .filter(|((page, _), _)| page == page_id)
            .map(|((_, identity), row)| PresenceEntry {
                subject_id: identity.clone(),
                target_element_id: row.target_element_id.clone(),
                color: row.color.clone(),
                last_seen: row.last_seen,
                display_name: Some(row.display_name.clone()),
            })
            .collect();
        entries.sort_by(|a, b| {
            b.last_seen.cmp(&a.last_seen).then_with(|| a.subject_id.cmp(&b.subject_id))
        });
        Ok(entries)
    }

    /// Save a nickname for the token's identity and rename its presence rows
    /// on every page.
    pub async fn save_nickname(&self, token: &str, raw: &str) -> Result<String, PresenceError> {
        if token.is_empty() {
            return Err(NicknameError::TokenRequired.into());
        }
        let nickname = validate_nickname(raw)?;
        let identity = self.resolve(Some(token)).await.ok_or(NicknameError::UnknownIdentity)?;

        let now = Utc::now();
        let mut state = self.inner.state.write().await;
        state.nicknames.set(&identity.subject_id, nickname.clone());
        let mut touched = Vec::new();
        for ((page, row_identity), row) in state.rows.iter_mut() {
            if *row_identity == identity.subject_id {
                row.display_name = nickname.clone();
                row.last_seen = now;
                touched.push(page.clone());
            }
        }
        drop(state);

        for page in &touched {
            self.announce(page);
        }
        info!(identity = %identity.subject_id, pages = touched.len(), "nickname saved");
        Ok(nickname)
    }

    pub async fn get_nickname(&self, token: &str) -> Result<Option<String>, PresenceError> {
        if token.is_empty() {
            return Err(NicknameError::TokenRequired.into());
        }
        let identity = self.resolve(Some(token)).await.ok_or(NicknameError::UnknownIdentity)?;
        let state = self.inner.state.read().await;
        Ok(state.nicknames.get(&identity.subject_id).map(str::to_string))
    }
}

impl<R: IdentityResolver> PresenceService for InMemoryPresenceStore<R> {
    async fn register(
        &self,
        page_id: &str,
        request: RegisterRequest,
    ) -> Result<Registration, PresenceError> {
        self.register_at(page_id, request, Utc::now()).await
    }

    async fn heartbeat(
        &self,
        page_id: &str,
        identity: &str,
        target_element_id: Option<&str>,
    ) -> Result<HeartbeatOutcome, PresenceError> {
        self.heartbeat_at(page_id, identity, target_element_id, Utc::now()).await
    }

    async fn leave(&self, page_id: &str, request: LeaveRequest) -> Result<(), PresenceError> {
        self.leave_at(page_id, request).await
    }

    async fn list(&self, page_id: &str) -> Result<Vec<PresenceEntry>, PresenceError> {
        self.list_at(page_id, Utc::now()).await
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<PresenceChange>> {
        Some(self.inner.changes.subscribe())
    }
}
