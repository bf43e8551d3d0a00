use super::load_catalog;
use anyhow::Result;
use std::path::Path;

pub fn list_keys(catalog_path: &Path) -> Result<()> {
    let catalog = load_catalog(catalog_path)?;

    if catalog.is_empty() {
        println!("Catalog is empty.");
        return Ok(());
    }

    for key in catalog.keys() {
        println!("{}", key);
    }

    Ok(())
}
