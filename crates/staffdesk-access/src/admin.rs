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

//! Grant administration: the permissions matrix
//!
//! An administrator edits the catalog crossed with one actor's grants. Rows
//! without a stored grant display as allowed; this display default is
//! separate from the resolver, which denies anything not explicitly granted.

use crate::audit::AuditLogger;
use crate::catalog::ResourceCatalog;
use crate::error::{AccessError, AccessResult};
use crate::grant::{ActorId, Grant, GrantRecord};
use crate::permission_set::PermissionSet;
use crate::resolver::{PermissionResolver, RefreshOutcome};
use crate::resource::ResourceKey;
use crate::store::GrantStore;
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// One catalog entry in the matrix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixRow {
    pub key: ResourceKey,

    /// Decision currently persisted, if any
    pub stored: Option<bool>,

    /// Unsaved edit, if any
    pub edited: Option<bool>,
}

impl MatrixRow {
    /// Value shown to the administrator and written on save
    pub fn effective(&self) -> bool {
        self.edited.or(self.stored).unwrap_or(true)
    }

    pub fn is_dirty(&self) -> bool {
        matches!(self.edited, Some(edited) if Some(edited) != self.stored)
    }
}

/// Catalog crossed with one actor's grants, plus unsaved edits
#[derive(Debug, Clone)]
pub struct GrantMatrix {
    actor_id: ActorId,
    rows: Vec<MatrixRow>,
    index: HashMap<ResourceKey, usize>,
}

impl GrantMatrix {
    /// Build a matrix from a catalog and the actor's stored rows
    pub fn build(actor_id: ActorId, catalog: &ResourceCatalog, records: &[GrantRecord]) -> Self {
        let stored = PermissionSet::from_records(records);

        let rows: Vec<MatrixRow> = catalog
            .keys()
            .map(|key| MatrixRow {
                key: key.clone(),
                stored: stored.decision(key),
                edited: None,
            })
            .collect();

        let index = rows.iter().enumerate().map(|(i, row)| (row.key.clone(), i)).collect();

        Self { actor_id, rows, index }
    }

    pub fn actor_id(&self) -> &ActorId {
        &self.actor_id
    }

    /// Rows in catalog order
    pub fn rows(&self) -> &[MatrixRow] {
        &self.rows
    }

    pub fn row(&self, key: &ResourceKey) -> Option<&MatrixRow> {
        self.index.get(key).map(|&i| &self.rows[i])
    }

    /// Record an edit for one resource
    pub fn set(&mut self, key: &ResourceKey, allowed: bool) -> AccessResult<()> {
        let i = *self.index.get(key).ok_or_else(|| AccessError::UnknownResource { key: key.to_string() })?;
        self.rows[i].edited = Some(allowed);
        Ok(())
    }

    /// Apply the same value to a module and everything under it
    pub fn set_module(&mut self, path: &str, allowed: bool) -> AccessResult<usize> {
        let module = ResourceKey::module(path)?;
        if !self.index.contains_key(&module) {
            return Err(AccessError::UnknownResource { key: module.to_string() });
        }

        let mut changed = 0;
        for row in self.rows.iter_mut().filter(|row| row.key.is_within(&module)) {
            row.edited = Some(allowed);
            changed += 1;
        }
        Ok(changed)
    }

    /// Whether any row differs from what is stored
    pub fn is_dirty(&self) -> bool {
        self.rows.iter().any(MatrixRow::is_dirty)
    }

    /// Rows with a pending change
    pub fn edits(&self) -> Vec<(&ResourceKey, bool)> {
        self.rows.iter().filter(|row| row.is_dirty()).map(|row| (&row.key, row.effective())).collect()
    }

    /// Drop all unsaved edits
    pub fn discard_edits(&mut self) {
        for row in &mut self.rows {
            row.edited = None;
        }
    }

    /// Every row as a grant with its effective value
    pub fn to_grants(&self) -> Vec<Grant> {
        self.rows.iter().map(|row| Grant::new(self.actor_id.clone(), row.key.clone(), row.effective())).collect()
    }

    fn commit(&mut self) {
        for row in &mut self.rows {
            row.stored = Some(row.effective());
            row.edited = None;
        }
    }
}

/// Result of a successful save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    pub actor_id: ActorId,

    /// Grants written
    pub saved: usize,

    /// Resolver reload triggered because the saved actor is signed in
    pub refresh: Option<RefreshOutcome>,
}

/// Administrative access to grants
pub struct GrantAdministration {
    catalog: Arc<ResourceCatalog>,
    store: Arc<dyn GrantStore>,
    resolver: Option<Arc<PermissionResolver>>,
    audit_logger: Arc<AuditLogger>,
}

impl GrantAdministration {
    pub fn new(catalog: Arc<ResourceCatalog>, store: Arc<dyn GrantStore>) -> Self {
        Self {
            catalog,
            store,
            resolver: None,
            audit_logger: Arc::new(AuditLogger::new()),
        }
    }

    /// Refresh this resolver after saves that touch its actor; shares its audit log
    pub fn with_resolver(mut self, resolver: Arc<PermissionResolver>) -> Self {
        self.audit_logger = resolver.audit_logger().clone();
        self.resolver = Some(resolver);
        self
    }

    pub fn catalog(&self) -> &ResourceCatalog {
        &self.catalog
    }

    pub fn audit_logger(&self) -> &Arc<AuditLogger> {
        &self.audit_logger
    }

    /// Load the matrix for an actor
    pub async fn open_matrix(&self, actor_id: &ActorId) -> AccessResult<GrantMatrix> {
        let records = self.store.list_grants(actor_id).await?;
        Ok(GrantMatrix::build(actor_id.clone(), &self.catalog, &records))
    }

    /// Persist every row of the matrix as an upsert.
    ///
    /// On failure the matrix keeps its edits so the save can be retried.
    pub async fn save(&self, matrix: &mut GrantMatrix, saved_by: &ActorId) -> AccessResult<SaveReport> {
        let grants = matrix.to_grants();
        let actor_id = matrix.actor_id().clone();

        if let Err(e) = self.store.upsert_grants(&grants).await {
            warn!(actor = %actor_id, saved_by = %saved_by, error = %e, "Grant save failed, edits preserved");
            counter!("staffdesk_grant_save_failures", 1);
            self.audit_logger.log_grant_save_failed(saved_by.as_str(), actor_id.as_str(), &e.to_string());
            return Err(AccessError::SaveFailed { message: e.to_string() });
        }

        matrix.commit();
        counter!("staffdesk_grant_saves", 1);
        self.audit_logger.log_grants_saved(saved_by.as_str(), actor_id.as_str(), grants.len());

        info!(
            actor = %actor_id,
            saved_by = %saved_by,
            grant_count = grants.len(),
            "Grants saved"
        );

        let refresh = match &self.resolver {
            Some(resolver) if resolver.current_actor().as_ref() == Some(&actor_id) => Some(resolver.refresh().await),
            _ => None,
        };

        Ok(SaveReport {
            actor_id,
            saved: grants.len(),
            refresh,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolverConfig;
    use crate::grant::SessionId;
    use crate::resolver::AuthEvent;
    use crate::store::{InMemoryActorDirectory, InMemoryGrantStore};

    fn catalog() -> Arc<ResourceCatalog> {
        Arc::new(
            ResourceCatalog::builder()
                .module("/employees")
                .tab("/employees", "list")
                .action("/employees", "list", "delete")
                .tab("/employees", "add")
                .module("/reports")
                .build()
                .unwrap(),
        )
    }

    fn key(s: &str) -> ResourceKey {
        s.parse().unwrap()
    }

    #[test]
    fn test_unsaved_rows_display_allowed() {
        let records = vec![GrantRecord::new("tab:/employees:add", false)];
        let matrix = GrantMatrix::build(ActorId::new("emp-1"), &catalog(), &records);

        assert_eq!(matrix.rows().len(), 5);
        assert!(matrix.row(&key("module:/employees")).unwrap().effective());
        assert_eq!(matrix.row(&key("module:/employees")).unwrap().stored, None);
        assert!(!matrix.row(&key("tab:/employees:add")).unwrap().effective());
        assert!(!matrix.is_dirty());
    }

    #[test]
    fn test_edits() {
        let mut matrix = GrantMatrix::build(ActorId::new("emp-1"), &catalog(), &[]);

        matrix.set(&key("module:/reports"), false).unwrap();
        assert!(matrix.is_dirty());
        assert_eq!(matrix.edits(), vec![(&key("module:/reports"), false)]);

        assert!(matches!(matrix.set(&key("module:/ghost"), true), Err(AccessError::UnknownResource { .. })));

        matrix.discard_edits();
        assert!(!matrix.is_dirty());
    }

    #[test]
    fn test_set_module_cascades() {
        let mut matrix = GrantMatrix::build(ActorId::new("emp-1"), &catalog(), &[]);

        let changed = matrix.set_module("/employees", false).unwrap();
        assert_eq!(changed, 4);
        assert!(!matrix.row(&key("action:/employees:list:delete")).unwrap().effective());
        assert!(matrix.row(&key("module:/reports")).unwrap().effective());

        assert!(matrix.set_module("/ghost", false).is_err());
    }

    #[tokio::test]
    async fn test_save_writes_full_matrix() {
        let store = Arc::new(InMemoryGrantStore::new());
        let admin = GrantAdministration::new(catalog(), store.clone());
        let actor = ActorId::new("emp-1");

        let mut matrix = admin.open_matrix(&actor).await.unwrap();
        matrix.set(&key("tab:/employees:add"), false).unwrap();

        let report = admin.save(&mut matrix, &ActorId::new("admin")).await.unwrap();

        assert_eq!(report.saved, 5);
        assert!(report.refresh.is_none());
        assert_eq!(store.row_count(&actor), 5);
        assert!(!matrix.is_dirty());
        assert_eq!(matrix.row(&key("tab:/employees:add")).unwrap().stored, Some(false));

        let reopened = admin.open_matrix(&actor).await.unwrap();
        assert_eq!(reopened.row(&key("module:/employees")).unwrap().stored, Some(true));
    }

    #[tokio::test]
    async fn test_failed_save_preserves_edits() {
        let store = Arc::new(InMemoryGrantStore::new());
        let admin = GrantAdministration::new(catalog(), store.clone());
        let actor = ActorId::new("emp-1");

        let mut matrix = admin.open_matrix(&actor).await.unwrap();
        matrix.set(&key("module:/reports"), false).unwrap();

        store.set_failing(true);
        let result = admin.save(&mut matrix, &ActorId::new("admin")).await;
        assert!(matches!(result, Err(AccessError::SaveFailed { .. })));
        assert!(matrix.is_dirty());
        assert_eq!(matrix.row(&key("module:/reports")).unwrap().edited, Some(false));

        store.set_failing(false);
        admin.save(&mut matrix, &ActorId::new("admin")).await.unwrap();
        assert!(!matrix.is_dirty());
        assert_eq!(store.upsert_calls(), 2);

        let stats = admin.audit_logger().get_statistics();
        assert_eq!(stats.failed_events, 1);
        assert_eq!(stats.successful_events, 1);
    }

    #[tokio::test]
    async fn test_save_refreshes_signed_in_actor() {
        let directory = Arc::new(InMemoryActorDirectory::new());
        let store = Arc::new(InMemoryGrantStore::new());
        directory.link(SessionId::new("sess-1"), ActorId::new("emp-1"));

        let resolver = Arc::new(PermissionResolver::new(ResolverConfig::default(), directory, store.clone()));
        resolver.handle_auth_event(AuthEvent::SignedIn(SessionId::new("sess-1"))).await;
        assert!(!resolver.can_access_module("/reports"));

        let admin = GrantAdministration::new(catalog(), store).with_resolver(resolver.clone());
        let mut matrix = admin.open_matrix(&ActorId::new("emp-1")).await.unwrap();
        matrix.set(&key("module:/employees"), false).unwrap();

        let report = admin.save(&mut matrix, &ActorId::new("admin")).await.unwrap();

        assert!(matches!(report.refresh, Some(RefreshOutcome::Applied { .. })));
        assert!(resolver.can_access_module("/reports"));
        assert!(!resolver.can_access_module("/employees"));
        assert!(!resolver.can_access_tab("/employees", "list"));
    }

    #[tokio::test]
    async fn test_save_for_other_actor_skips_refresh() {
        let directory = Arc::new(InMemoryActorDirectory::new());
        let store = Arc::new(InMemoryGrantStore::new());
        directory.link(SessionId::new("sess-1"), ActorId::new("emp-1"));

        let resolver = Arc::new(PermissionResolver::new(ResolverConfig::default(), directory, store.clone()));
        resolver.handle_auth_event(AuthEvent::SignedIn(SessionId::new("sess-1"))).await;

        let admin = GrantAdministration::new(catalog(), store).with_resolver(resolver.clone());
        let mut matrix = admin.open_matrix(&ActorId::new("emp-2")).await.unwrap();

        let report = admin.save(&mut matrix, &ActorId::new("emp-1")).await.unwrap();
        assert!(report.refresh.is_none());
        assert!(!resolver.can_access_module("/reports"));
    }
}
