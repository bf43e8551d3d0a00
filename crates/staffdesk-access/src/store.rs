// StaffDesk
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Collaborator seams: actor lookup, grant persistence and notifications
//!
//! The hosted backend sits behind [`ActorDirectory`] and [`GrantStore`]. The
//! in-memory implementations here back the tests and the CLI.

use crate::error::{AccessError, AccessResult};
use crate::grant::{ActorId, Grant, GrantRecord, SessionId};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::{error, info, warn};

/// Resolves an authenticated session to the actor linked to it
#[async_trait]
pub trait ActorDirectory: Send + Sync {
    /// Find the actor bound to a session, `None` if no actor is linked
    async fn find_actor_for_session(&self, session: &SessionId) -> AccessResult<Option<ActorId>>;
}

/// Persists `(actor, resource, allowed)` grants
#[async_trait]
pub trait GrantStore: Send + Sync {
    /// List every grant row stored for an actor
    async fn list_grants(&self, actor_id: &ActorId) -> AccessResult<Vec<GrantRecord>>;

    /// Insert or replace grants, keyed on `(actor_id, resource)`
    async fn upsert_grants(&self, grants: &[Grant]) -> AccessResult<()>;
}

/// Severity of a user-facing notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Non-fatal message surfaced to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }
}

/// Surfaces notices to the user (toasts in the web client)
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Notifier that writes notices to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => info!(notice = %notice.message, "User notice"),
            NoticeLevel::Warning => warn!(notice = %notice.message, "User notice"),
            NoticeLevel::Error => error!(notice = %notice.message, "User notice"),
        }
    }
}

/// Notifier that keeps every notice, for inspection
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}

/// Session to actor links held in memory
#[derive(Debug, Default)]
pub struct InMemoryActorDirectory {
    links: DashMap<SessionId, ActorId>,
    failing: AtomicBool,
}

impl InMemoryActorDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link a session to an actor, replacing any previous link
    pub fn link(&self, session: SessionId, actor_id: ActorId) {
        self.links.insert(session, actor_id);
    }

    /// Remove a link. Grants of the actor are untouched.
    pub fn unlink(&self, session: &SessionId) -> Option<ActorId> {
        self.links.remove(session).map(|(_, actor_id)| actor_id)
    }

    /// Make every lookup fail, simulating an unreachable backend
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ActorDirectory for InMemoryActorDirectory {
    async fn find_actor_for_session(&self, session: &SessionId) -> AccessResult<Option<ActorId>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AccessError::ActorResolution {
                message: format!("directory unavailable while resolving session {}", session),
            });
        }
        Ok(self.links.get(session).map(|entry| entry.value().clone()))
    }
}

/// Grant rows held in memory, per actor
#[derive(Debug, Default)]
pub struct InMemoryGrantStore {
    rows: DashMap<ActorId, Vec<GrantRecord>>,
    failing: AtomicBool,
    upsert_calls: AtomicUsize,
}

impl InMemoryGrantStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw row, bypassing key validation
    pub fn insert_record(&self, actor_id: ActorId, record: GrantRecord) {
        let mut rows = self.rows.entry(actor_id).or_default();
        upsert_row(&mut rows, record);
    }

    /// Make every call fail, simulating an unreachable backend
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of upsert calls received, successful or not
    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    /// Number of rows stored for an actor
    pub fn row_count(&self, actor_id: &ActorId) -> usize {
        self.rows.get(actor_id).map(|rows| rows.len()).unwrap_or(0)
    }
}

fn upsert_row(rows: &mut Vec<GrantRecord>, record: GrantRecord) {
    match rows.iter_mut().find(|row| row.resource == record.resource) {
        Some(existing) => existing.allowed = record.allowed,
        None => rows.push(record),
    }
}

#[async_trait]
impl GrantStore for InMemoryGrantStore {
    async fn list_grants(&self, actor_id: &ActorId) -> AccessResult<Vec<GrantRecord>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AccessError::GrantLoad {
                message: format!("grant store unavailable while listing grants for {}", actor_id),
            });
        }
        Ok(self.rows.get(actor_id).map(|rows| rows.value().clone()).unwrap_or_default())
    }

    async fn upsert_grants(&self, grants: &[Grant]) -> AccessResult<()> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);

        if self.failing.load(Ordering::SeqCst) {
            return Err(AccessError::Store {
                message: format!("grant store unavailable while saving {} grants", grants.len()),
            });
        }

        for grant in grants {
            let mut rows = self.rows.entry(grant.actor_id.clone()).or_default();
            upsert_row(&mut rows, grant.to_record());
        }
        Ok(())
    }
}
