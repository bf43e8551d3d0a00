use super::{CLI_SESSION, CommandContext};
use anyhow::{Context, Result};
use staffdesk_access::{AuthEvent, RefreshOutcome, ResourceKey, SessionId};
use std::path::Path;
use tracing::debug;

pub async fn check_resource(ctx: &CommandContext, grants: Option<&Path>, anonymous: bool, resource: &str) -> Result<()> {
    let key: ResourceKey = resource.parse().with_context(|| format!("invalid resource key '{}'", resource))?;

    if let Some(path) = grants {
        let count = ctx.load_grants(path)?;
        debug!(count, "Loaded grant rows");
    }

    let resolver = ctx.resolver();
    if !anonymous {
        if let RefreshOutcome::Applied { degraded: true, .. } = resolver.handle_auth_event(AuthEvent::SignedIn(SessionId::new(CLI_SESSION))).await {
            anyhow::bail!("permissions could not be loaded");
        }
    }

    let allowed = resolver.can_access(&key);
    println!("{}", if allowed { "allow" } else { "deny" });

    Ok(())
}
