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

//! Immutable snapshot of one actor's grants

use crate::grant::{Grant, GrantRecord};
use crate::resource::ResourceKey;
use std::collections::HashMap;
use tracing::warn;

/// Full snapshot of the grants loaded for the current actor.
///
/// Built wholesale from a listing and replaced wholesale on refresh; there is
/// no way to patch an existing set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet {
    /// Explicit decisions by resource
    decisions: HashMap<ResourceKey, bool>,

    /// Records dropped because their resource string did not decode
    rejected: usize,
}

impl PermissionSet {
    /// An empty set, equivalent to "zero grants overall"
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a set from listing rows, skipping rows that do not decode
    pub fn from_records(records: &[GrantRecord]) -> Self {
        let mut set = Self::default();

        for record in records {
            match record.key() {
                Some(key) => {
                    set.decisions.insert(key, record.allowed);
                }
                None => {
                    warn!(resource = %record.resource, "Skipping grant with undecodable resource key");
                    set.rejected += 1;
                }
            }
        }

        set
    }

    /// Build a set from typed grants
    pub fn from_grants<'a>(grants: impl IntoIterator<Item = &'a Grant>) -> Self {
        Self {
            decisions: grants.into_iter().map(|grant| (grant.resource.clone(), grant.allowed)).collect(),
            rejected: 0,
        }
    }

    /// Whether the actor has no grants at all
    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    /// Number of distinct resources with a stored decision
    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    /// Number of listing rows skipped while building this set
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Stored decision for a key, if any
    pub fn decision(&self, key: &ResourceKey) -> Option<bool> {
        self.decisions.get(key).copied()
    }

    /// True only for an explicit allowing grant
    pub fn is_allowed(&self, key: &ResourceKey) -> bool {
        self.decision(key).unwrap_or(false)
    }

    /// Iterate stored decisions
    pub fn iter(&self) -> impl Iterator<Item = (&ResourceKey, bool)> {
        self.decisions.iter().map(|(key, allowed)| (key, *allowed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grant::ActorId;

    #[test]
    fn test_from_records() {
        let records = vec![
            GrantRecord::new("module:/employees", true),
            GrantRecord::new("tab:/employees:list", false),
            GrantRecord::new("invalid-resource", true),
        ];

        let set = PermissionSet::from_records(&records);

        assert_eq!(set.len(), 2);
        assert_eq!(set.rejected(), 1);
        assert!(set.is_allowed(&ResourceKey::module("/employees").unwrap()));
        assert_eq!(set.decision(&ResourceKey::tab("/employees", "list").unwrap()), Some(false));
        assert!(!set.is_allowed(&ResourceKey::tab("/employees", "list").unwrap()));
        assert_eq!(set.decision(&ResourceKey::module("/reports").unwrap()), None);
    }

    #[test]
    fn test_duplicate_records_last_wins() {
        let records = vec![GrantRecord::new("module:/employees", true), GrantRecord::new("module:/employees", false)];

        let set = PermissionSet::from_records(&records);
        assert_eq!(set.len(), 1);
        assert!(!set.is_allowed(&ResourceKey::module("/employees").unwrap()));
    }

    #[test]
    fn test_only_rejected_records_is_empty() {
        let set = PermissionSet::from_records(&[GrantRecord::new("module:employees", true)]);
        assert!(set.is_empty());
        assert_eq!(set.rejected(), 1);
    }

    #[test]
    fn test_from_grants() {
        let actor = ActorId::new("emp-1");
        let grants = vec![Grant::allow(actor.clone(), ResourceKey::module("/reports").unwrap()), Grant::deny(actor, ResourceKey::module("/permissions").unwrap())];

        let set = PermissionSet::from_grants(&grants);
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().filter(|(_, allowed)| *allowed).count(), 1);
    }
}
