//! Propagation of saves and deletes into denormalized copies.
//!
//! Every step is one `update_all` call on the configured collection,
//! awaited before the next one starts. Nothing is rolled back: when a
//! later step fails, earlier steps stay applied and the failure is left in
//! the [`CascadeReport`] for the caller to act on.
//!
//! Step order per config:
//!
//! | relation | save                                               | delete          |
//! |----------|----------------------------------------------------|-----------------|
//! | one      | unset old query, set query                         | unset query     |
//! | many     | pull old query, pull query, push query             | pull query      |

use monodoc_common::{Document, OdmError, Result, Value, get_path, set_path};

use crate::config::CascadeSettings;
use crate::schema::{Model, RelationType};
use crate::store::{Filter, Update, UpdateInfo};

mod config;

pub use config::{Cascade, CascadeConfig, CascadeConfigBuilder};

/// What happened to one config during a cascade call.
#[derive(Debug, Clone)]
pub struct CascadeOutcome {
    pub collection: String,
    pub through: String,
    pub relation: RelationType,
    pub result: Result<UpdateInfo>,
}

#[derive(Debug, Clone, Default)]
pub struct CascadeReport {
    pub outcomes: Vec<CascadeOutcome>,
}

impl CascadeReport {
    pub fn total_matched(&self) -> u64 {
        self.successes().map(|info| info.matched).sum()
    }

    pub fn total_modified(&self) -> u64 {
        self.successes().map(|info| info.modified).sum()
    }

    pub fn errors(&self) -> Vec<&OdmError> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err())
            .collect()
    }

    pub fn is_ok(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    /// The first failure, if any config failed.
    pub fn into_result(self) -> Result<Self> {
        let first = self
            .outcomes
            .iter()
            .find_map(|o| o.result.as_ref().err())
            .cloned();
        match first {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }

    fn successes(&self) -> impl Iterator<Item = &UpdateInfo> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    fn record(&mut self, config: &CascadeConfig, result: Result<UpdateInfo>) {
        if let Err(e) = &result {
            tracing::warn!(
                "cascade into {}.{} failed: {e}",
                config.collection.name(),
                config.through
            );
        }
        self.outcomes.push(CascadeOutcome {
            collection: config.collection.name().to_string(),
            through: config.through.clone(),
            relation: config.relation,
            result,
        });
    }
}

#[derive(Debug, Clone, Default)]
pub struct CascadeEngine {
    settings: CascadeSettings,
}

impl CascadeEngine {
    pub fn new(settings: CascadeSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &CascadeSettings {
        &self.settings
    }

    /// Propagate a saved document into every related collection.
    ///
    /// `snapshot` is the document as it was written, keyed by storage path.
    /// Documents without the [`Cascade`] capability are skipped.
    pub async fn cascade_save(&self, model: &dyn Model, snapshot: &Document) -> Result<CascadeReport> {
        let mut report = CascadeReport::default();
        let Some(cascade) = model.cascade() else {
            return Ok(report);
        };
        let configs = cascade.cascade_configs();
        if configs.is_empty() {
            return Ok(report);
        }

        let id = match lookup(snapshot, &self.settings.id_field) {
            Some(id) if !id.is_null() => id.clone(),
            _ => {
                return Err(OdmError::MissingId(format!(
                    "snapshot has no {} to cascade",
                    self.settings.id_field
                )));
            }
        };

        for config in &configs {
            let result = match self.payload(&id, config, snapshot) {
                Ok(payload) => self.save_with_config(config, &id, payload).await,
                Err(e) => Err(e),
            };
            report.record(config, result);
        }
        Ok(report)
    }

    /// Retract a deleted document from every related collection.
    pub async fn cascade_delete(&self, model: &dyn Model) -> Result<CascadeReport> {
        let mut report = CascadeReport::default();
        let Some(cascade) = model.cascade() else {
            return Ok(report);
        };
        let id = model
            .id()
            .map(Value::ObjectId)
            .ok_or_else(|| OdmError::MissingId("cannot cascade a delete without an id".into()))?;

        for config in &cascade.cascade_configs() {
            let result = self.delete_with_config(config, &id).await;
            report.record(config, result);
        }
        Ok(report)
    }

    /// Run the save steps of one config, stopping at the first failure.
    pub async fn save_with_config(
        &self,
        config: &CascadeConfig,
        id: &Value,
        payload: Document,
    ) -> Result<UpdateInfo> {
        let mut total = UpdateInfo::default();
        match config.relation {
            RelationType::One => {
                if let Some(old) = config.effective_old_query() {
                    total += self.step(config, old, Update::unset(&config.through)).await?;
                }
                total += self
                    .step(config, &config.query, Update::set(&config.through, payload))
                    .await?;
            }
            RelationType::Many => {
                if let Some(old) = config.effective_old_query() {
                    total += self.step(config, old, self.pull(config, id)).await?;
                }
                total += self.step(config, &config.query, self.pull(config, id)).await?;
                total += self
                    .step(config, &config.query, Update::push(&config.through, payload))
                    .await?;
            }
        }
        Ok(total)
    }

    /// Run the delete step of one config.
    pub async fn delete_with_config(&self, config: &CascadeConfig, id: &Value) -> Result<UpdateInfo> {
        let update = match config.relation {
            RelationType::One => Update::unset(&config.through),
            RelationType::Many => self.pull(config, id),
        };
        self.step(config, &config.query, update).await
    }

    /// Primary key plus the configured properties, nested by path.
    pub fn payload(&self, id: &Value, config: &CascadeConfig, snapshot: &Document) -> Result<Document> {
        let mut payload = Document::new();
        payload.insert(self.settings.id_field.clone(), id.clone());
        for property in &config.properties {
            let value = lookup(snapshot, property).cloned().unwrap_or(Value::Null);
            set_path(&mut payload, property, value)?;
        }
        Ok(payload)
    }

    fn pull(&self, config: &CascadeConfig, id: &Value) -> Update {
        Update::pull(
            &config.through,
            Filter::new().eq(self.settings.id_field.as_str(), id.clone()),
        )
    }

    async fn step(&self, config: &CascadeConfig, filter: &Filter, update: Update) -> Result<UpdateInfo> {
        let info = config.collection.update_all(filter, &update).await?;
        tracing::debug!(
            "{} {} {} where {filter}: matched {}, modified {}",
            config.collection.name(),
            update.operator(),
            update.path(),
            info.matched,
            info.modified
        );
        Ok(info)
    }
}

/// Read a snapshot value by literal key first, then as a nested path.
fn lookup<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    doc.get(path).or_else(|| get_path(doc, path))
}
