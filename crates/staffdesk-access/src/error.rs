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

//! Error handling for access control operations

use thiserror::Error;

/// Errors raised by key parsing, catalog assembly, stores and administration.
///
/// Resolution checks never surface these; they degrade to deny instead.
#[derive(Error, Debug)]
pub enum AccessError {
    #[error("Invalid resource key: {message}")]
    InvalidResourceKey { message: String },

    #[error("Unknown resource: {key}")]
    UnknownResource { key: String },

    #[error("Duplicate resource in catalog: {key}")]
    DuplicateResource { key: String },

    #[error("Actor resolution failed: {message}")]
    ActorResolution { message: String },

    #[error("Grant load failed: {message}")]
    GrantLoad { message: String },

    #[error("Grant save failed: {message}")]
    SaveFailed { message: String },

    #[error("Store error: {message}")]
    Store { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Serde JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AccessError {
    /// Get the error type identifier
    pub fn error_type(&self) -> &'static str {
        match self {
            AccessError::InvalidResourceKey { .. } => "invalid_resource_key",
            AccessError::UnknownResource { .. } => "unknown_resource",
            AccessError::DuplicateResource { .. } => "duplicate_resource",
            AccessError::ActorResolution { .. } => "actor_resolution",
            AccessError::GrantLoad { .. } => "grant_load",
            AccessError::SaveFailed { .. } => "save_failed",
            AccessError::Store { .. } => "store",
            AccessError::Config { .. } => "config",
            AccessError::Json(_) => "json_error",
        }
    }

    pub(crate) fn invalid_key(message: impl Into<String>) -> Self {
        AccessError::InvalidResourceKey { message: message.into() }
    }
}

/// Result type for access control operations
pub type AccessResult<T> = Result<T, AccessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AccessError::UnknownResource { key: "module:/ghost".to_string() };
        assert_eq!(err.to_string(), "Unknown resource: module:/ghost");
        assert_eq!(err.error_type(), "unknown_resource");
    }

    #[test]
    fn test_json_error_conversion() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err: AccessError = parse.unwrap_err().into();
        assert_eq!(err.error_type(), "json_error");
    }
}
