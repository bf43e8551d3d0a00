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

//! StaffDesk access control
//!
//! Hierarchical permission resolution for the StaffDesk back-office: modules
//! contain tabs, tabs contain actions, and each level is reachable only when
//! its parent is. Grants are loaded through [`store::GrantStore`] for the actor
//! bound to the current session and answered from an immutable snapshot.

pub mod admin;
pub mod audit;
pub mod catalog;
pub mod config;
pub mod error;
pub mod grant;
pub mod permission_set;
pub mod resolver;
pub mod resource;
pub mod store;

pub use admin::{GrantAdministration, GrantMatrix, MatrixRow, SaveReport};
pub use audit::{AuditEvent, AuditEventType, AuditLogger, AuditResult, AuditStatistics};
pub use catalog::{CatalogBuilder, CatalogDefinition, ResourceCatalog};
pub use config::{PublicPathPolicy, ResolverConfig};
pub use error::{AccessError, AccessResult};
pub use grant::{ActorId, Grant, GrantRecord, SessionId};
pub use permission_set::PermissionSet;
pub use resolver::{AuthEvent, PermissionResolver, RefreshOutcome, ResolverStats, Snapshot};
pub use resource::{ResourceKey, ResourceLevel};
pub use store::{ActorDirectory, GrantStore, InMemoryActorDirectory, InMemoryGrantStore, Notice, NoticeLevel, Notifier, RecordingNotifier, TracingNotifier};
