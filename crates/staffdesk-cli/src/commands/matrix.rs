use super::{CLI_ACTOR, CommandContext, load_catalog};
use anyhow::Result;
use serde::Serialize;
use staffdesk_access::{ActorId, GrantAdministration};
use std::path::Path;
use std::sync::Arc;

#[derive(Serialize)]
struct MatrixLine {
    resource: String,
    stored: Option<bool>,
    allowed: bool,
}

pub async fn show_matrix(ctx: &CommandContext, catalog_path: &Path, grants: Option<&Path>, json: bool) -> Result<()> {
    let catalog = Arc::new(load_catalog(catalog_path)?);
    if let Some(path) = grants {
        ctx.load_grants(path)?;
    }

    let admin = GrantAdministration::new(catalog, ctx.store.clone());
    let matrix = admin.open_matrix(&ActorId::new(CLI_ACTOR)).await?;

    let lines: Vec<MatrixLine> = matrix
        .rows()
        .iter()
        .map(|row| MatrixLine {
            resource: row.key.to_string(),
            stored: row.stored,
            allowed: row.effective(),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&lines)?);
        return Ok(());
    }

    println!("{:<50} {:<8} {:<8}", "Resource", "Stored", "Allowed");
    println!("{}", "-".repeat(68));

    for line in lines {
        let stored = match line.stored {
            Some(true) => "yes",
            Some(false) => "no",
            None => "-",
        };
        println!("{:<50} {:<8} {:<8}", line.resource, stored, if line.allowed { "yes" } else { "no" });
    }

    Ok(())
}
