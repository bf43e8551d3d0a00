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

use proptest::prelude::*;
use staffdesk_access::{ActorId, AuthEvent, GrantRecord, InMemoryActorDirectory, InMemoryGrantStore, PermissionResolver, ResolverConfig, SessionId};
use std::sync::Arc;

const MODULES: [&str; 3] = ["/employees", "/reports", "/car-rental"];
const TABS: [&str; 2] = ["list", "add"];
const ACTIONS: [&str; 2] = ["edit", "delete"];

fn all_keys() -> Vec<String> {
    let mut keys = Vec::new();
    for module in MODULES {
        keys.push(format!("module:{}", module));
        for tab in TABS {
            keys.push(format!("tab:{}:{}", module, tab));
            for action in ACTIONS {
                keys.push(format!("action:{}:{}:{}", module, tab, action));
            }
        }
    }
    keys
}

/// Arbitrary subsets of the key space, each with a decision
fn grant_rows() -> impl Strategy<Value = Vec<GrantRecord>> {
    let keys = all_keys();
    prop::collection::vec((0..keys.len(), any::<bool>()), 0..20)
        .prop_map(move |picks| picks.into_iter().map(|(i, allowed)| GrantRecord::new(keys[i].clone(), allowed)).collect())
}

fn resolver_for(rows: &[GrantRecord]) -> PermissionResolver {
    let directory = Arc::new(InMemoryActorDirectory::new());
    let store = Arc::new(InMemoryGrantStore::new());
    directory.link(SessionId::new("sess"), ActorId::new("emp"));
    for row in rows {
        store.insert_record(ActorId::new("emp"), row.clone());
    }

    let resolver = PermissionResolver::new(ResolverConfig::default(), directory, store);
    let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
    runtime.block_on(resolver.handle_auth_event(AuthEvent::SignedIn(SessionId::new("sess"))));
    resolver
}

/// Last decision for a key, matching upsert semantics
fn stored(rows: &[GrantRecord], key: &str) -> Option<bool> {
    rows.iter().rev().find(|row| row.resource == key).map(|row| row.allowed)
}

proptest! {
    #[test]
    fn test_children_never_outrank_parents(rows in grant_rows()) {
        let resolver = resolver_for(&rows);

        for module in MODULES {
            for tab in TABS {
                if resolver.can_access_tab(module, tab) {
                    prop_assert!(resolver.can_access_module(module));
                }
                for action in ACTIONS {
                    if resolver.can_perform_action(module, tab, action) {
                        prop_assert!(resolver.can_access_tab(module, tab));
                    }
                }
            }
        }
    }

    #[test]
    fn test_module_needs_explicit_allow(rows in grant_rows()) {
        let resolver = resolver_for(&rows);

        for module in MODULES {
            let expected = !rows.is_empty() && stored(&rows, &format!("module:{}", module)) == Some(true);
            prop_assert_eq!(resolver.can_access_module(module), expected);
        }
        prop_assert!(resolver.can_access_module("/"));
        prop_assert!(resolver.can_access_module("/login"));
    }

    #[test]
    fn test_action_is_conjunction_of_levels(rows in grant_rows()) {
        let resolver = resolver_for(&rows);

        for module in MODULES {
            for tab in TABS {
                for action in ACTIONS {
                    let expected = stored(&rows, &format!("module:{}", module)) == Some(true)
                        && stored(&rows, &format!("tab:{}:{}", module, tab)) == Some(true)
                        && stored(&rows, &format!("action:{}:{}:{}", module, tab, action)) == Some(true);
                    prop_assert_eq!(resolver.can_perform_action(module, tab, action), expected);
                }
            }
        }
    }
}
