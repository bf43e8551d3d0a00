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

//! Configuration for permission resolution

use crate::error::{AccessError, AccessResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Paths reachable without any grant
pub const DEFAULT_PUBLIC_PATHS: [&str; 3] = ["/", "/login", "/404"];

/// When public paths bypass the grant lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PublicPathPolicy {
    /// Public paths are always reachable
    Always,
    /// Public paths are reachable only while the actor has no grants at all;
    /// once any grant exists they need an explicit module grant
    WhenNoGrants,
}

impl FromStr for PublicPathPolicy {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "always" => Ok(PublicPathPolicy::Always),
            "when-no-grants" => Ok(PublicPathPolicy::WhenNoGrants),
            other => Err(AccessError::Config {
                message: format!("unknown public path policy '{}', expected 'always' or 'when-no-grants'", other),
            }),
        }
    }
}

/// Resolver configuration
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Module paths that never need a grant
    pub public_paths: Vec<String>,

    /// How public paths interact with a non-empty grant set
    pub public_path_policy: PublicPathPolicy,

    /// Maximum number of audit events kept in memory
    pub audit_max_events: usize,

    /// Loads slower than this are logged as warnings
    pub slow_load_threshold: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            public_paths: DEFAULT_PUBLIC_PATHS.iter().map(|path| path.to_string()).collect(),
            public_path_policy: PublicPathPolicy::Always,
            audit_max_events: 10_000,
            slow_load_threshold: Duration::from_millis(500),
        }
    }
}

impl ResolverConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AccessResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> AccessResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let public_paths = lookup("STAFFDESK_PUBLIC_PATHS")
            .map(|v| v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
            .unwrap_or(defaults.public_paths);

        let public_path_policy = match lookup("STAFFDESK_PUBLIC_PATH_POLICY") {
            Some(v) => v.parse()?,
            None => defaults.public_path_policy,
        };

        let audit_max_events = match lookup("STAFFDESK_AUDIT_MAX_EVENTS") {
            Some(v) => v.trim().parse().map_err(|_| AccessError::Config {
                message: format!("STAFFDESK_AUDIT_MAX_EVENTS must be a number, got '{}'", v),
            })?,
            None => defaults.audit_max_events,
        };

        let slow_load_threshold = match lookup("STAFFDESK_SLOW_LOAD_MS") {
            Some(v) => Duration::from_millis(v.trim().parse().map_err(|_| AccessError::Config {
                message: format!("STAFFDESK_SLOW_LOAD_MS must be a number, got '{}'", v),
            })?),
            None => defaults.slow_load_threshold,
        };

        Ok(Self {
            public_paths,
            public_path_policy,
            audit_max_events,
            slow_load_threshold,
        })
    }

    /// Replace the public path policy
    pub fn with_public_path_policy(mut self, policy: PublicPathPolicy) -> Self {
        self.public_path_policy = policy;
        self
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.public_paths.iter().any(|public| public == path)
    }
}
