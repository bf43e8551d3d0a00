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

//! Resource keys for modules, tabs and actions
//!
//! A [`ResourceKey`] names something an actor can be granted access to.
//! Keys are only built through validating constructors, and are stored and
//! exchanged as a canonical string:
//!
//! - `module:<path>`
//! - `tab:<path>:<tab>`
//! - `action:<path>:<tab>:<action>`

use crate::error::{AccessError, AccessResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MODULE_PREFIX: &str = "module";
const TAB_PREFIX: &str = "tab";
const ACTION_PREFIX: &str = "action";

/// Level of a resource in the module/tab/action hierarchy
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ResourceLevel {
    /// Top-level routed area
    Module,
    /// Sub-view within a module
    Tab,
    /// Operation within a tab
    Action,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Segments {
    Module { path: String },
    Tab { path: String, tab: String },
    Action { path: String, tab: String, action: String },
}

/// Structured identifier for a module, tab or action
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceKey {
    segments: Segments,
}

impl ResourceKey {
    /// Key for a module path such as `/employees`
    pub fn module(path: impl Into<String>) -> AccessResult<Self> {
        let path = path.into();
        validate_path(&path)?;
        Ok(Self { segments: Segments::Module { path } })
    }

    /// Key for a tab inside a module
    pub fn tab(path: impl Into<String>, tab: impl Into<String>) -> AccessResult<Self> {
        let path = path.into();
        let tab = tab.into();
        validate_path(&path)?;
        validate_segment("tab", &tab)?;
        Ok(Self { segments: Segments::Tab { path, tab } })
    }

    /// Key for an action inside a tab
    pub fn action(path: impl Into<String>, tab: impl Into<String>, action: impl Into<String>) -> AccessResult<Self> {
        let path = path.into();
        let tab = tab.into();
        let action = action.into();
        validate_path(&path)?;
        validate_segment("tab", &tab)?;
        validate_segment("action", &action)?;
        Ok(Self {
            segments: Segments::Action { path, tab, action },
        })
    }

    /// Hierarchy level of this key
    pub fn level(&self) -> ResourceLevel {
        match &self.segments {
            Segments::Module { .. } => ResourceLevel::Module,
            Segments::Tab { .. } => ResourceLevel::Tab,
            Segments::Action { .. } => ResourceLevel::Action,
        }
    }

    /// Module path, present at every level
    pub fn path(&self) -> &str {
        match &self.segments {
            Segments::Module { path } | Segments::Tab { path, .. } | Segments::Action { path, .. } => path,
        }
    }

    /// Tab name for tab and action keys
    pub fn tab_name(&self) -> Option<&str> {
        match &self.segments {
            Segments::Module { .. } => None,
            Segments::Tab { tab, .. } | Segments::Action { tab, .. } => Some(tab),
        }
    }

    /// Action name for action keys
    pub fn action_name(&self) -> Option<&str> {
        match &self.segments {
            Segments::Action { action, .. } => Some(action),
            _ => None,
        }
    }

    /// The containing key: action to tab, tab to module, module to none
    pub fn parent(&self) -> Option<ResourceKey> {
        match &self.segments {
            Segments::Module { .. } => None,
            Segments::Tab { path, .. } => Some(Self {
                segments: Segments::Module { path: path.clone() },
            }),
            Segments::Action { path, tab, .. } => Some(Self {
                segments: Segments::Tab { path: path.clone(), tab: tab.clone() },
            }),
        }
    }

    /// Whether `self` sits under `ancestor` (or is `ancestor`)
    pub fn is_within(&self, ancestor: &ResourceKey) -> bool {
        let mut current = Some(self.clone());
        while let Some(key) = current {
            if &key == ancestor {
                return true;
            }
            current = key.parent();
        }
        false
    }

    /// Canonical string form
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.segments {
            Segments::Module { path } => write!(f, "{}:{}", MODULE_PREFIX, path),
            Segments::Tab { path, tab } => write!(f, "{}:{}:{}", TAB_PREFIX, path, tab),
            Segments::Action { path, tab, action } => write!(f, "{}:{}:{}:{}", ACTION_PREFIX, path, tab, action),
        }
    }
}

impl FromStr for ResourceKey {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();

        match parts.as_slice() {
            [MODULE_PREFIX, path] => Self::module(*path),
            [TAB_PREFIX, path, tab] => Self::tab(*path, *tab),
            [ACTION_PREFIX, path, tab, action] => Self::action(*path, *tab, *action),
            _ => Err(AccessError::invalid_key(format!("'{}' is not a canonical module, tab or action key", s))),
        }
    }
}

impl TryFrom<String> for ResourceKey {
    type Error = AccessError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ResourceKey> for String {
    fn from(key: ResourceKey) -> Self {
        key.to_string()
    }
}

fn validate_path(path: &str) -> AccessResult<()> {
    if !path.starts_with('/') {
        return Err(AccessError::invalid_key(format!("module path '{}' must start with '/'", path)));
    }

    if let Some(bad) = path.chars().find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '/' | '-' | '_' | '.'))) {
        return Err(AccessError::invalid_key(format!("module path '{}' contains invalid character {:?}", path, bad)));
    }

    Ok(())
}

fn validate_segment(kind: &str, segment: &str) -> AccessResult<()> {
    if segment.is_empty() {
        return Err(AccessError::invalid_key(format!("{} name must not be empty", kind)));
    }

    if let Some(bad) = segment.chars().find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))) {
        return Err(AccessError::invalid_key(format!("{} name '{}' contains invalid character {:?}", kind, segment, bad)));
    }

    Ok(())
}
