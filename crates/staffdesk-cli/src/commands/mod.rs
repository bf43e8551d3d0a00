pub mod check;
pub mod keys;
pub mod matrix;

use anyhow::{Context, Result};
use staffdesk_access::{ActorId, GrantRecord, InMemoryActorDirectory, InMemoryGrantStore, PermissionResolver, ResolverConfig, ResourceCatalog, SessionId};
use std::path::Path;
use std::sync::Arc;

/// Actor that grant files are loaded for
pub const CLI_ACTOR: &str = "cli";

/// Session linked to [`CLI_ACTOR`]
pub const CLI_SESSION: &str = "cli-session";

pub struct CommandContext {
    pub config: ResolverConfig,
    pub directory: Arc<InMemoryActorDirectory>,
    pub store: Arc<InMemoryGrantStore>,
}

impl CommandContext {
    pub fn new(config: ResolverConfig) -> Self {
        let directory = Arc::new(InMemoryActorDirectory::new());
        directory.link(SessionId::new(CLI_SESSION), ActorId::new(CLI_ACTOR));

        Self {
            config,
            directory,
            store: Arc::new(InMemoryGrantStore::new()),
        }
    }

    /// Load a grant file into the store for the CLI actor
    pub fn load_grants(&self, path: &Path) -> Result<usize> {
        let content = std::fs::read_to_string(path).with_context(|| format!("reading grant file {}", path.display()))?;
        let records: Vec<GrantRecord> = serde_json::from_str(&content).with_context(|| format!("parsing grant file {}", path.display()))?;

        let count = records.len();
        for record in records {
            self.store.insert_record(ActorId::new(CLI_ACTOR), record);
        }
        Ok(count)
    }

    pub fn resolver(&self) -> PermissionResolver {
        PermissionResolver::new(self.config.clone(), self.directory.clone(), self.store.clone())
    }
}

pub fn load_catalog(path: &Path) -> Result<ResourceCatalog> {
    let content = std::fs::read_to_string(path).with_context(|| format!("reading catalog {}", path.display()))?;
    Ok(ResourceCatalog::from_json(&content)?)
}
