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

//! Actors, sessions and stored grants

use crate::resource::ResourceKey;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Internal principal that grants are attached to (a linked employee record)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActorId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Opaque identifier of an authenticated session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A stored allow/deny decision for one actor and one resource.
///
/// Unique per `(actor_id, resource)`; writing the same pair again replaces `allowed`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grant {
    pub actor_id: ActorId,
    pub resource: ResourceKey,
    pub allowed: bool,
}

impl Grant {
    pub fn new(actor_id: ActorId, resource: ResourceKey, allowed: bool) -> Self {
        Self { actor_id, resource, allowed }
    }

    /// Shorthand for an allowing grant
    pub fn allow(actor_id: ActorId, resource: ResourceKey) -> Self {
        Self::new(actor_id, resource, true)
    }

    /// Shorthand for a denying grant
    pub fn deny(actor_id: ActorId, resource: ResourceKey) -> Self {
        Self::new(actor_id, resource, false)
    }

    /// The per-actor wire form returned by grant listings
    pub fn to_record(&self) -> GrantRecord {
        GrantRecord {
            resource: self.resource.to_string(),
            allowed: self.allowed,
        }
    }
}

/// Grant row as returned by a grant listing.
///
/// `resource` is kept as the raw stored string: rows written by older
/// clients may not decode, and those are skipped rather than trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantRecord {
    pub resource: String,
    pub allowed: bool,
}

impl GrantRecord {
    pub fn new(resource: impl Into<String>, allowed: bool) -> Self {
        Self { resource: resource.into(), allowed }
    }

    /// Decode the stored resource string
    pub fn key(&self) -> Option<ResourceKey> {
        self.resource.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_record_conversion() {
        let grant = Grant::allow(ActorId::new("emp-1"), ResourceKey::module("/employees").unwrap());
        let record = grant.to_record();

        assert_eq!(record, GrantRecord::new("module:/employees", true));
        assert_eq!(record.key(), Some(grant.resource.clone()));
    }

    #[test]
    fn test_undecodable_record() {
        let record = GrantRecord::new("invalid-resource", true);
        assert!(record.key().is_none());
    }

    #[test]
    fn test_grant_record_json_shape() {
        let records: Vec<GrantRecord> = serde_json::from_str(r#"[{"resource":"tab:/employees:list","allowed":false}]"#).unwrap();
        assert_eq!(records, vec![GrantRecord::new("tab:/employees:list", false)]);
    }

    #[test]
    fn test_ids_serialize_transparently() {
        assert_eq!(serde_json::to_string(&ActorId::new("emp-7")).unwrap(), "\"emp-7\"");
        assert_eq!(SessionId::from("sess-1").as_str(), "sess-1");
    }
}
