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

//! Catalog of every module, tab and action the application defines
//!
//! The catalog is supplied by the surrounding application, either through
//! [`CatalogBuilder`] or as JSON:
//!
//! ```json
//! {"modules":[{"path":"/employees","tabs":[{"name":"list","actions":["edit","delete"]}]}]}
//! ```

use crate::error::{AccessError, AccessResult};
use crate::resource::ResourceKey;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Serializable catalog description
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogDefinition {
    #[serde(default)]
    pub modules: Vec<ModuleDefinition>,
}

/// A module and its tabs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModuleDefinition {
    pub path: String,
    #[serde(default)]
    pub tabs: Vec<TabDefinition>,
}

/// A tab and its actions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TabDefinition {
    pub name: String,
    #[serde(default)]
    pub actions: Vec<String>,
}

#[derive(Debug, Clone)]
struct CatalogTab {
    key: ResourceKey,
    actions: Vec<ResourceKey>,
}

#[derive(Debug, Clone)]
struct CatalogModule {
    key: ResourceKey,
    tabs: Vec<CatalogTab>,
}

/// Validated, ordered enumeration of resource keys
#[derive(Debug, Clone)]
pub struct ResourceCatalog {
    modules: Vec<CatalogModule>,
    index: HashSet<ResourceKey>,
    definition: CatalogDefinition,
}

impl ResourceCatalog {
    /// Start assembling a catalog
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// Validate a definition into a catalog
    pub fn from_definition(definition: CatalogDefinition) -> AccessResult<Self> {
        let mut index = HashSet::new();
        let mut modules = Vec::with_capacity(definition.modules.len());

        for module_def in &definition.modules {
            let module_key = insert_unique(&mut index, ResourceKey::module(module_def.path.as_str())?)?;
            let mut tabs = Vec::with_capacity(module_def.tabs.len());

            for tab_def in &module_def.tabs {
                let tab_key = insert_unique(&mut index, ResourceKey::tab(module_def.path.as_str(), tab_def.name.as_str())?)?;
                let mut actions = Vec::with_capacity(tab_def.actions.len());

                for action in &tab_def.actions {
                    actions.push(insert_unique(&mut index, ResourceKey::action(module_def.path.as_str(), tab_def.name.as_str(), action.as_str())?)?);
                }

                tabs.push(CatalogTab { key: tab_key, actions });
            }

            modules.push(CatalogModule { key: module_key, tabs });
        }

        Ok(Self { modules, index, definition })
    }

    /// Parse and validate a JSON catalog
    pub fn from_json(json: &str) -> AccessResult<Self> {
        let definition: CatalogDefinition = serde_json::from_str(json)?;
        Self::from_definition(definition)
    }

    /// The definition this catalog was built from
    pub fn definition(&self) -> &CatalogDefinition {
        &self.definition
    }

    /// Every key, parent-first: a module, then each of its tabs followed by that tab's actions
    pub fn keys(&self) -> impl Iterator<Item = &ResourceKey> + '_ {
        self.modules.iter().flat_map(|module| std::iter::once(&module.key).chain(module.tabs.iter().flat_map(|tab| std::iter::once(&tab.key).chain(tab.actions.iter()))))
    }

    /// Module keys in declaration order
    pub fn modules(&self) -> impl Iterator<Item = &ResourceKey> + '_ {
        self.modules.iter().map(|module| &module.key)
    }

    /// Tab keys declared under a module path
    pub fn tabs_of(&self, path: &str) -> Vec<&ResourceKey> {
        self.modules
            .iter()
            .filter(|module| module.key.path() == path)
            .flat_map(|module| module.tabs.iter().map(|tab| &tab.key))
            .collect()
    }

    /// Action keys declared under a tab
    pub fn actions_of(&self, path: &str, tab: &str) -> Vec<&ResourceKey> {
        self.modules
            .iter()
            .filter(|module| module.key.path() == path)
            .flat_map(|module| module.tabs.iter())
            .filter(|entry| entry.key.tab_name() == Some(tab))
            .flat_map(|entry| entry.actions.iter())
            .collect()
    }

    pub fn contains(&self, key: &ResourceKey) -> bool {
        self.index.contains(key)
    }

    /// Total number of keys at all levels
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

fn insert_unique(index: &mut HashSet<ResourceKey>, key: ResourceKey) -> AccessResult<ResourceKey> {
    if !index.insert(key.clone()) {
        return Err(AccessError::DuplicateResource { key: key.to_string() });
    }
    Ok(key)
}

/// Fluent catalog assembly.
///
/// Tabs and actions must be declared after their parent; a missing parent is
/// reported by [`CatalogBuilder::build`].
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    definition: CatalogDefinition,
    errors: Vec<AccessError>,
}

impl CatalogBuilder {
    pub fn module(mut self, path: impl Into<String>) -> Self {
        self.definition.modules.push(ModuleDefinition { path: path.into(), tabs: Vec::new() });
        self
    }

    pub fn tab(mut self, path: &str, name: impl Into<String>) -> Self {
        let name = name.into();
        match self.definition.modules.iter_mut().find(|module| module.path == path) {
            Some(module) => module.tabs.push(TabDefinition { name, actions: Vec::new() }),
            None => self.errors.push(AccessError::UnknownResource { key: format!("module:{}", path) }),
        }
        self
    }

    pub fn action(mut self, path: &str, tab: &str, action: impl Into<String>) -> Self {
        let action = action.into();
        let target = self
            .definition
            .modules
            .iter_mut()
            .find(|module| module.path == path)
            .and_then(|module| module.tabs.iter_mut().find(|entry| entry.name == tab));

        match target {
            Some(entry) => entry.actions.push(action),
            None => self.errors.push(AccessError::UnknownResource { key: format!("tab:{}:{}", path, tab) }),
        }
        self
    }

    pub fn build(self) -> AccessResult<ResourceCatalog> {
        if let Some(error) = self.errors.into_iter().next() {
            return Err(error);
        }
        ResourceCatalog::from_definition(self.definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hr_catalog() -> ResourceCatalog {
        ResourceCatalog::builder()
            .module("/")
            .module("/employees")
            .tab("/employees", "list-employees")
            .action("/employees", "list-employees", "edit")
            .action("/employees", "list-employees", "delete")
            .tab("/employees", "add-employee")
            .module("/car-rental")
            .tab("/car-rental", "log")
            .build()
            .unwrap()
    }

    #[test]
    fn test_keys_are_parent_first() {
        let catalog = hr_catalog();
        let keys: Vec<String> = catalog.keys().map(|key| key.to_string()).collect();

        assert_eq!(
            keys,
            vec![
                "module:/",
                "module:/employees",
                "tab:/employees:list-employees",
                "action:/employees:list-employees:edit",
                "action:/employees:list-employees:delete",
                "tab:/employees:add-employee",
                "module:/car-rental",
                "tab:/car-rental:log",
            ]
        );
        assert_eq!(catalog.len(), 8);
    }

    #[test]
    fn test_every_key_has_its_parent() {
        let catalog = hr_catalog();
        for key in catalog.keys() {
            if let Some(parent) = key.parent() {
                assert!(catalog.contains(&parent), "{} has no parent in catalog", key);
            }
        }
    }

    #[test]
    fn test_lookups() {
        let catalog = hr_catalog();

        assert_eq!(catalog.modules().count(), 3);
        assert_eq!(catalog.tabs_of("/employees").len(), 2);
        assert_eq!(catalog.actions_of("/employees", "list-employees").len(), 2);
        assert!(catalog.actions_of("/employees", "add-employee").is_empty());
        assert!(catalog.tabs_of("/missing").is_empty());
        assert!(catalog.contains(&ResourceKey::action("/employees", "list-employees", "delete").unwrap()));
        assert!(!catalog.contains(&ResourceKey::action("/employees", "add-employee", "delete").unwrap()));
    }

    #[test]
    fn test_builder_rejects_orphans() {
        let result = ResourceCatalog::builder().tab("/employees", "list").build();
        assert!(matches!(result, Err(AccessError::UnknownResource { .. })));

        let result = ResourceCatalog::builder().module("/employees").action("/employees", "list", "edit").build();
        assert!(matches!(result, Err(AccessError::UnknownResource { .. })));
    }

    #[test]
    fn test_duplicates_rejected() {
        let result = ResourceCatalog::builder().module("/employees").module("/employees").build();
        assert!(matches!(result, Err(AccessError::DuplicateResource { .. })));
    }

    #[test]
    fn test_invalid_names_rejected() {
        let result = ResourceCatalog::builder().module("employees").build();
        assert!(matches!(result, Err(AccessError::InvalidResourceKey { .. })));
    }

    #[test]
    fn test_from_json() {
        let catalog = ResourceCatalog::from_json(r#"{"modules":[{"path":"/reports","tabs":[{"name":"daily","actions":["export"]}]},{"path":"/login"}]}"#).unwrap();

        assert_eq!(catalog.len(), 4);
        assert!(catalog.contains(&ResourceKey::action("/reports", "daily", "export").unwrap()));
        assert_eq!(catalog.definition().modules[1].path, "/login");
    }
}
