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

//! Audit logging for permission loads and grant administration

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use tracing::{info, warn};

/// Audit event types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AuditEventType {
    /// A permission set was loaded and applied
    PermissionsLoaded,
    /// Grants could not be loaded; an empty set was applied
    PermissionsLoadFailed,
    /// The session could not be resolved to an actor
    ActorResolutionFailed,
    /// An administrator saved a grant matrix
    GrantsSaved,
    /// Saving a grant matrix failed
    GrantSaveFailed,
}

/// Audit event result
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AuditResult {
    /// Operation succeeded
    Success,
    /// Operation failed
    Failure,
}

/// Audit event entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID
    pub id: String,

    /// Event type
    pub event_type: AuditEventType,

    /// Event timestamp
    pub timestamp: DateTime<Utc>,

    /// Actor who caused the event, "anonymous" when unknown
    pub actor: String,

    /// Actor whose grants were affected, for administrative saves
    pub target_actor: Option<String>,

    /// Event result
    pub result: AuditResult,

    /// Additional event details
    pub details: HashMap<String, String>,
}

impl AuditEvent {
    /// Create a new audit event
    pub fn new(event_type: AuditEventType, actor: impl Into<String>, result: AuditResult) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event_type,
            timestamp: Utc::now(),
            actor: actor.into(),
            target_actor: None,
            result,
            details: HashMap::new(),
        }
    }

    /// Set target actor
    pub fn with_target_actor(mut self, target_actor: impl Into<String>) -> Self {
        self.target_actor = Some(target_actor.into());
        self
    }

    /// Add detail
    pub fn with_detail(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.details.insert(key.into(), value.to_string());
        self
    }
}

/// Bounded in-memory audit log mirrored to structured logging
#[derive(Debug)]
pub struct AuditLogger {
    events: RwLock<VecDeque<AuditEvent>>,

    /// Maximum number of events to keep in memory
    max_events: usize,
}

impl AuditLogger {
    /// Create a new audit logger
    pub fn new() -> Self {
        Self::with_max_events(10_000)
    }

    /// Create audit logger with custom max events
    pub fn with_max_events(max_events: usize) -> Self {
        Self {
            events: RwLock::new(VecDeque::new()),
            max_events,
        }
    }

    /// Log an audit event
    pub fn log_event(&self, event: AuditEvent) {
        match event.result {
            AuditResult::Success => {
                info!(
                    event_type = ?event.event_type,
                    actor = %event.actor,
                    target_actor = ?event.target_actor,
                    details = ?event.details,
                    "Audit event: {:?}", event.event_type
                );
            }
            AuditResult::Failure => {
                warn!(
                    event_type = ?event.event_type,
                    actor = %event.actor,
                    target_actor = ?event.target_actor,
                    details = ?event.details,
                    "Audit event: {:?} failed", event.event_type
                );
            }
        }

        let mut events = self.events.write();
        events.push_back(event);

        while events.len() > self.max_events {
            events.pop_front();
        }
    }

    /// Log a successfully applied permission load
    pub fn log_permissions_loaded(&self, actor: &str, grant_count: usize, rejected: usize) {
        self.log_event(
            AuditEvent::new(AuditEventType::PermissionsLoaded, actor, AuditResult::Success)
                .with_detail("grant_count", grant_count)
                .with_detail("rejected", rejected),
        );
    }

    /// Log a failed grant load
    pub fn log_permissions_load_failed(&self, actor: &str, reason: &str) {
        self.log_event(AuditEvent::new(AuditEventType::PermissionsLoadFailed, actor, AuditResult::Failure).with_detail("reason", reason));
    }

    /// Log a failed session resolution
    pub fn log_actor_resolution_failed(&self, session: &str, reason: &str) {
        self.log_event(
            AuditEvent::new(AuditEventType::ActorResolutionFailed, "anonymous", AuditResult::Failure)
                .with_detail("session", session)
                .with_detail("reason", reason),
        );
    }

    /// Log a grant matrix save
    pub fn log_grants_saved(&self, saved_by: &str, target_actor: &str, grant_count: usize) {
        self.log_event(
            AuditEvent::new(AuditEventType::GrantsSaved, saved_by, AuditResult::Success)
                .with_target_actor(target_actor)
                .with_detail("grant_count", grant_count),
        );
    }

    /// Log a failed grant matrix save
    pub fn log_grant_save_failed(&self, saved_by: &str, target_actor: &str, reason: &str) {
        self.log_event(
            AuditEvent::new(AuditEventType::GrantSaveFailed, saved_by, AuditResult::Failure)
                .with_target_actor(target_actor)
                .with_detail("reason", reason),
        );
    }

    /// Most recent events first
    pub fn get_events(&self, limit: Option<usize>) -> Vec<AuditEvent> {
        let events = self.events.read();
        events.iter().rev().take(limit.unwrap_or(usize::MAX)).cloned().collect()
    }

    /// Most recent events of one type first
    pub fn get_events_by_type(&self, event_type: AuditEventType, limit: Option<usize>) -> Vec<AuditEvent> {
        let events = self.events.read();
        events
            .iter()
            .rev()
            .filter(|event| event.event_type == event_type)
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    /// Clear all audit events
    pub fn clear_events(&self) {
        self.events.write().clear();
        info!("Audit log cleared");
    }

    /// Get audit statistics
    pub fn get_statistics(&self) -> AuditStatistics {
        let events = self.events.read();

        let mut stats = AuditStatistics {
            total_events: events.len(),
            ..Default::default()
        };

        for event in events.iter() {
            match event.result {
                AuditResult::Success => stats.successful_events += 1,
                AuditResult::Failure => stats.failed_events += 1,
            }

            *stats.events_by_type.entry(event.event_type).or_insert(0) += 1;
        }

        stats
    }
}

/// Audit statistics
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AuditStatistics {
    /// Total number of events
    pub total_events: usize,

    /// Number of successful events
    pub successful_events: usize,

    /// Number of failed events
    pub failed_events: usize,

    /// Events by type
    pub events_by_type: HashMap<AuditEventType, usize>,
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::new()
    }
}
