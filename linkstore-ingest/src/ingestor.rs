//! Decodes payloads and writes them through the store.

use linkstore_model::{DecodeError, Entity};
use linkstore_storage::Store;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{IngestConfig, IngestMode};
use crate::payload::LinkedPayload;

/// Outcome of one ingested batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Entities upserted into the store.
    pub written: usize,
    /// Objects skipped for lacking an id or not being objects.
    pub skipped_malformed: usize,
    /// Collection names the registry does not know.
    pub skipped_unknown_collections: usize,
    /// Decoded entities the store refused or could not commit.
    pub failed: usize,
}

/// Runs the decode+write loop for linked payloads.
///
/// Cheap to clone; clones share the same store.
#[derive(Debug, Clone)]
pub struct Ingestor {
    store: Store,
    config: IngestConfig,
}

impl Ingestor {
    pub fn new(store: Store, config: IngestConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Ingests `payload` and resolves once every write has committed.
    ///
    /// In [`IngestMode::Background`] the work runs on the blocking pool so
    /// the awaiting task is never blocked on SQLite; the report is handed
    /// back to that task.
    pub async fn parse_linked(&self, payload: LinkedPayload) -> IngestReport {
        match self.config.mode {
            IngestMode::Inline => self.parse_linked_sync(&payload),
            IngestMode::Background => {
                let ingestor = self.clone();
                match tokio::task::spawn_blocking(move || ingestor.parse_linked_sync(&payload)).await {
                    Ok(report) => report,
                    Err(e) => {
                        warn!("spawn_blocking panicked during ingestion: {}", e);
                        IngestReport::default()
                    }
                }
            }
        }
    }

    /// Ingests `payload`, then calls `completion` with the report.
    ///
    /// Inline mode runs both before returning. Background mode returns
    /// immediately; `completion` runs after the batch's last write, on the
    /// current tokio runtime or, outside one, on a dedicated thread.
    pub fn parse_linked_with<F>(&self, payload: LinkedPayload, completion: F)
    where
        F: FnOnce(IngestReport) + Send + 'static,
    {
        if self.config.mode == IngestMode::Inline {
            completion(self.parse_linked_sync(&payload));
            return;
        }

        let ingestor = self.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    let report = ingestor.parse_linked(payload).await;
                    completion(report);
                });
            }
            Err(_) => {
                debug!("No tokio runtime; ingesting on a dedicated thread");
                std::thread::spawn(move || completion(ingestor.parse_linked_sync(&payload)));
            }
        }
    }

    /// Ingests `payload` on the calling thread.
    ///
    /// All decoded entities are upserted in a single write transaction, in
    /// payload order within each collection, so duplicates later in the
    /// batch merge over earlier ones.
    pub fn parse_linked_sync(&self, payload: &LinkedPayload) -> IngestReport {
        let mut report = IngestReport::default();
        let entities = self.decode_all(payload, &mut report);
        let total = entities.len();

        if total == 0 {
            debug!("Nothing to write: {:?}", report);
            return report;
        }
        if !self.store.is_available() {
            debug!("Dropping {} decoded entities: store unavailable", total);
            report.failed = total;
            return report;
        }

        let result = self.store.writer().transaction(|tx| {
            let mut written = 0;
            for entity in entities {
                let key = entity.key();
                match tx.write(entity) {
                    Ok(_) => written += 1,
                    Err(e) => warn!("Skipping {}: {}", key, e),
                }
            }
            Ok(written)
        });

        match result {
            Ok(written) => {
                report.written = written;
                report.failed = total - written;
            }
            Err(e) => {
                warn!("Ingest batch of {} entities was not committed: {}", total, e);
                report.failed = total;
            }
        }

        info!(
            "Ingested batch: {} written, {} malformed, {} unknown collections, {} failed",
            report.written, report.skipped_malformed, report.skipped_unknown_collections, report.failed
        );
        report
    }

    fn decode_all(&self, payload: &LinkedPayload, report: &mut IngestReport) -> Vec<Entity> {
        let registry = self.store.registry();
        let mut entities = Vec::with_capacity(payload.object_count());

        for (name, objects) in payload.iter() {
            let Some(entry) = registry.lookup(name) else {
                debug!("Skipping {} objects of unknown collection {:?}", objects.len(), name);
                report.skipped_unknown_collections += 1;
                continue;
            };

            for raw in objects {
                let decoded = match raw.as_object() {
                    Some(map) => (entry.decoder)(&entry.schema, map),
                    None => Err(DecodeError::NotAnObject),
                };
                match decoded {
                    Ok(entity) => entities.push(entity),
                    Err(e) => {
                        debug!("Skipping malformed {} object: {}", name, e);
                        report.skipped_malformed += 1;
                    }
                }
            }
        }
        entities
    }
}
