use std::collections::BTreeSet;
use std::sync::Arc;

use hook_store::{CaptureId, CaptureStore, StoreError};
use metrics::histogram;
use tracing::{debug, instrument};

use crate::metrics_consts::SAMPLES_RESOLVED;
use crate::parser::ParsedSample;

/// Resolves capture ids into parsed samples.
#[derive(Clone)]
pub struct PayloadLoader {
    store: Arc<dyn CaptureStore + Send + Sync>,
}

impl PayloadLoader {
    pub fn new(store: Arc<dyn CaptureStore + Send + Sync>) -> Self {
        Self { store }
    }

    /// Load the samples for `ids`, ordered by ascending id.
    ///
    /// Repeated ids resolve once. Ids with no stored capture are skipped, so the result may be
    /// shorter than the input or empty.
    #[instrument(skip_all, fields(requested = ids.len()))]
    pub async fn load(&self, ids: &[CaptureId]) -> Result<Vec<ParsedSample>, StoreError> {
        let unique: Vec<CaptureId> = ids
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut samples: Vec<ParsedSample> = self
            .store
            .fetch_bodies(&unique)
            .await?
            .iter()
            .map(ParsedSample::from)
            .collect();

        // Stores return bodies in no particular order.
        samples.sort_by_key(|sample| sample.id);
        samples.dedup_by_key(|sample| sample.id);

        if samples.len() < unique.len() {
            debug!(
                unique = unique.len(),
                resolved = samples.len(),
                "some requested captures were not found"
            );
        }
        histogram!(SAMPLES_RESOLVED).record(samples.len() as f64);

        Ok(samples)
    }
}
