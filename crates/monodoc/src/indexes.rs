//! Creation of declared indexes at startup.

use monodoc_common::Result;

use crate::config::IndexConfig;
use crate::registry::Registry;
use crate::store::Database;

/// Ask each registered type's collection to create its declared indexes.
///
/// Returns how many index specs were requested. Stops at the first store
/// error; indexes created before it stay in place.
pub async fn ensure_indexes(registry: &Registry, db: &dyn Database, config: &IndexConfig) -> Result<usize> {
    if !config.ensure_on_startup {
        tracing::debug!("Index creation on startup is disabled");
        return Ok(0);
    }

    let mut requested = 0;
    for descriptor in registry.descriptors() {
        let specs = descriptor.all_index();
        if specs.is_empty() {
            continue;
        }
        let collection = db.collection(&descriptor.collection);
        for mut spec in specs {
            spec.background |= config.background;
            collection.ensure_index(&spec).await?;
            tracing::info!("Ensured index {} on {}", spec.name(), descriptor.collection);
            requested += 1;
        }
    }
    Ok(requested)
}
