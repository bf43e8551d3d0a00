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

//! Permission resolution for the signed-in actor
//!
//! The resolver answers module, tab and action checks synchronously from the
//! last loaded [`Snapshot`]. Loads go through [`ActorDirectory`] and
//! [`GrantStore`] and replace the snapshot wholesale with an atomic swap.
//!
//! Policy:
//! - no actor, or an actor with zero grants: only public module paths are reachable
//! - otherwise a module needs an explicit allowing grant (public paths per [`PublicPathPolicy`])
//! - a tab needs its module reachable plus its own allowing grant
//! - an action needs its tab reachable plus its own allowing grant

use crate::audit::AuditLogger;
use crate::config::{PublicPathPolicy, ResolverConfig};
use crate::grant::{ActorId, SessionId};
use crate::permission_set::PermissionSet;
use crate::resource::{ResourceKey, ResourceLevel};
use crate::store::{ActorDirectory, GrantStore, Notice, Notifier, TracingNotifier};
use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use metrics::counter;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Authentication changes forwarded by the surrounding application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// A user signed in with a new session
    SignedIn(SessionId),
    /// The session was renewed or its identity changed
    SessionRefreshed(SessionId),
    /// The user signed out
    SignedOut,
}

/// Resolver state: the bound actor and its grants
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    session: Option<SessionId>,
    actor: Option<ActorId>,
    permissions: PermissionSet,
    loaded_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// No session and no actor
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A session that did not resolve to an actor
    pub fn unresolved(session: SessionId) -> Self {
        Self {
            session: Some(session),
            ..Self::default()
        }
    }

    /// An actor with its loaded grants
    pub fn for_actor(session: SessionId, actor: ActorId, permissions: PermissionSet) -> Self {
        Self {
            session: Some(session),
            actor: Some(actor),
            permissions,
            loaded_at: Some(Utc::now()),
        }
    }

    pub fn session(&self) -> Option<&SessionId> {
        self.session.as_ref()
    }

    pub fn actor(&self) -> Option<&ActorId> {
        self.actor.as_ref()
    }

    pub fn permissions(&self) -> &PermissionSet {
        &self.permissions
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }
}

/// What a refresh did to the resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The loaded snapshot replaced the previous one
    Applied {
        actor: Option<ActorId>,
        grant_count: usize,
        /// An upstream failure forced an anonymous or empty snapshot
        degraded: bool,
    },
    /// A newer load was applied first; this result was discarded
    Superseded,
}

/// Load counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverStats {
    /// Snapshots swapped in
    pub loads_applied: u64,

    /// Actor lookups or grant loads that failed
    pub load_failures: u64,

    /// Load results discarded because a newer one was applied
    pub loads_superseded: u64,
}

/// Decides module/tab/action access for the current actor
pub struct PermissionResolver {
    config: ResolverConfig,
    directory: Arc<dyn ActorDirectory>,
    store: Arc<dyn GrantStore>,
    notifier: Arc<dyn Notifier>,
    audit_logger: Arc<AuditLogger>,

    /// Current snapshot, swapped wholesale
    snapshot: ArcSwap<Snapshot>,

    /// Last ticket handed to a load
    next_ticket: AtomicU64,

    /// Ticket of the snapshot currently applied
    applied_ticket: Mutex<u64>,

    loads_applied: AtomicU64,
    load_failures: AtomicU64,
    loads_superseded: AtomicU64,
}

impl PermissionResolver {
    /// Create a resolver with an anonymous snapshot
    pub fn new(config: ResolverConfig, directory: Arc<dyn ActorDirectory>, store: Arc<dyn GrantStore>) -> Self {
        let audit_logger = Arc::new(AuditLogger::with_max_events(config.audit_max_events));

        Self {
            config,
            directory,
            store,
            notifier: Arc::new(TracingNotifier),
            audit_logger,
            snapshot: ArcSwap::from_pointee(Snapshot::anonymous()),
            next_ticket: AtomicU64::new(0),
            applied_ticket: Mutex::new(0),
            loads_applied: AtomicU64::new(0),
            load_failures: AtomicU64::new(0),
            loads_superseded: AtomicU64::new(0),
        }
    }

    /// Route user-facing notices somewhere other than the log
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Share an audit logger with other components
    pub fn with_audit_logger(mut self, audit_logger: Arc<AuditLogger>) -> Self {
        self.audit_logger = audit_logger;
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn audit_logger(&self) -> &Arc<AuditLogger> {
        &self.audit_logger
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.load_full()
    }

    /// Actor bound to the current snapshot
    pub fn current_actor(&self) -> Option<ActorId> {
        self.snapshot.load().actor.clone()
    }

    pub fn stats(&self) -> ResolverStats {
        ResolverStats {
            loads_applied: self.loads_applied.load(Ordering::Relaxed),
            load_failures: self.load_failures.load(Ordering::Relaxed),
            loads_superseded: self.loads_superseded.load(Ordering::Relaxed),
        }
    }

    /// Whether the current actor can reach a module
    pub fn can_access_module(&self, path: &str) -> bool {
        let snapshot = self.snapshot.load();
        self.module_allowed(&snapshot, path)
    }

    /// Whether the current actor can reach a tab; requires the module too
    pub fn can_access_tab(&self, path: &str, tab: &str) -> bool {
        let snapshot = self.snapshot.load();
        self.tab_allowed(&snapshot, path, tab)
    }

    /// Whether the current actor can perform an action; requires the tab too
    pub fn can_perform_action(&self, path: &str, tab: &str, action: &str) -> bool {
        let snapshot = self.snapshot.load();
        self.action_allowed(&snapshot, path, tab, action)
    }

    /// Check any key at its own level
    pub fn can_access(&self, key: &ResourceKey) -> bool {
        let snapshot = self.snapshot.load();
        let tab = key.tab_name().unwrap_or_default();

        match key.level() {
            ResourceLevel::Module => self.module_allowed(&snapshot, key.path()),
            ResourceLevel::Tab => self.tab_allowed(&snapshot, key.path(), tab),
            ResourceLevel::Action => self.action_allowed(&snapshot, key.path(), tab, key.action_name().unwrap_or_default()),
        }
    }

    fn module_allowed(&self, snapshot: &Snapshot, path: &str) -> bool {
        let public = self.config.is_public(path);

        if snapshot.actor.is_none() || snapshot.permissions.is_empty() {
            return public;
        }

        if public && self.config.public_path_policy == PublicPathPolicy::Always {
            return true;
        }

        match ResourceKey::module(path) {
            Ok(key) => snapshot.permissions.is_allowed(&key),
            Err(_) => false,
        }
    }

    fn tab_allowed(&self, snapshot: &Snapshot, path: &str, tab: &str) -> bool {
        if !self.module_allowed(snapshot, path) {
            return false;
        }

        match ResourceKey::tab(path, tab) {
            Ok(key) => snapshot.permissions.is_allowed(&key),
            Err(_) => false,
        }
    }

    fn action_allowed(&self, snapshot: &Snapshot, path: &str, tab: &str, action: &str) -> bool {
        if !self.tab_allowed(snapshot, path, tab) {
            return false;
        }

        match ResourceKey::action(path, tab, action) {
            Ok(key) => snapshot.permissions.is_allowed(&key),
            Err(_) => false,
        }
    }

    /// Discard the current grants and reload them for the current session.
    ///
    /// Call after any administrative save that may affect the signed-in
    /// actor; the snapshot never invalidates itself.
    pub async fn refresh(&self) -> RefreshOutcome {
        let session = self.snapshot.load().session.clone();
        self.bind_session(session).await
    }

    /// Load the snapshot for a session, or drop to anonymous without one.
    ///
    /// Never fails: lookup and load errors degrade to an anonymous or empty
    /// snapshot. A result is discarded if a newer load was applied meanwhile.
    pub async fn bind_session(&self, session: Option<SessionId>) -> RefreshOutcome {
        let ticket = self.take_ticket();
        let start_time = Instant::now();

        let (snapshot, degraded) = match &session {
            Some(session) => self.load_snapshot(session).await,
            None => (Snapshot::anonymous(), false),
        };

        let duration = start_time.elapsed();
        if duration > self.config.slow_load_threshold {
            warn!(
                session = ?session.as_ref().map(|s| s.as_str()),
                duration_ms = %duration.as_millis(),
                "Slow permission load detected"
            );
        }

        let outcome = self.apply(ticket, snapshot, degraded);

        if let RefreshOutcome::Applied { actor: Some(actor), grant_count, degraded: false } = &outcome {
            let rejected = self.snapshot.load().permissions.rejected();
            self.audit_logger.log_permissions_loaded(actor.as_str(), *grant_count, rejected);
        }

        outcome
    }

    /// React to an authentication change from the host application
    pub async fn handle_auth_event(&self, event: AuthEvent) -> RefreshOutcome {
        debug!(event = ?event, "Handling auth event");

        match event {
            AuthEvent::SignedIn(session) | AuthEvent::SessionRefreshed(session) => self.bind_session(Some(session)).await,
            AuthEvent::SignedOut => self.clear(),
        }
    }

    /// Drop to the anonymous snapshot, superseding any load in flight
    pub fn clear(&self) -> RefreshOutcome {
        let ticket = self.take_ticket();
        self.apply(ticket, Snapshot::anonymous(), false)
    }

    fn take_ticket(&self) -> u64 {
        self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn load_snapshot(&self, session: &SessionId) -> (Snapshot, bool) {
        let actor = match self.directory.find_actor_for_session(session).await {
            Ok(Some(actor)) => actor,
            Ok(None) => {
                debug!(session = %session, "No actor linked to session");
                return (Snapshot::unresolved(session.clone()), false);
            }
            Err(e) => {
                warn!(session = %session, error = %e, "Actor lookup failed, treating session as anonymous");
                self.load_failures.fetch_add(1, Ordering::Relaxed);
                counter!("staffdesk_permission_load_failures", 1);
                self.audit_logger.log_actor_resolution_failed(session.as_str(), &e.to_string());
                return (Snapshot::unresolved(session.clone()), true);
            }
        };

        match self.store.list_grants(&actor).await {
            Ok(records) => (Snapshot::for_actor(session.clone(), actor, PermissionSet::from_records(&records)), false),
            Err(e) => {
                warn!(actor = %actor, error = %e, "Grant load failed, applying empty permission set");
                self.load_failures.fetch_add(1, Ordering::Relaxed);
                counter!("staffdesk_permission_load_failures", 1);
                self.audit_logger.log_permissions_load_failed(actor.as_str(), &e.to_string());
                self.notifier.notify(Notice::error(format!("Permissions could not be loaded: {}", e)));
                (Snapshot::for_actor(session.clone(), actor, PermissionSet::empty()), true)
            }
        }
    }

    fn apply(&self, ticket: u64, snapshot: Snapshot, degraded: bool) -> RefreshOutcome {
        let mut applied = self.applied_ticket.lock();

        if ticket <= *applied {
            self.loads_superseded.fetch_add(1, Ordering::Relaxed);
            counter!("staffdesk_permission_loads_superseded", 1);
            debug!(ticket, applied = *applied, "Discarding superseded permission load");
            return RefreshOutcome::Superseded;
        }

        *applied = ticket;

        let actor = snapshot.actor.clone();
        let grant_count = snapshot.permissions.len();
        self.snapshot.store(Arc::new(snapshot));
        self.loads_applied.fetch_add(1, Ordering::Relaxed);
        counter!("staffdesk_permission_loads_applied", 1);

        info!(
            actor = ?actor.as_ref().map(|a| a.as_str()),
            grant_count,
            degraded,
            "Permission snapshot applied"
        );

        RefreshOutcome::Applied { actor, grant_count, degraded }
    }
}

impl fmt::Debug for PermissionResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermissionResolver")
            .field("config", &self.config)
            .field("actor", &self.current_actor())
            .field("stats", &self.stats())
            .finish()
    }
}
