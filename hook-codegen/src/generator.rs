use std::sync::Arc;
use std::time::Instant;

use hook_store::{CaptureId, CaptureStore};
use metrics::{counter, histogram};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::emitter::{emit, EmitOptions};
use crate::error::GenerateError;
use crate::loader::PayloadLoader;
use crate::metrics_consts::{GENERATE_TIME, GENERATE_TOTAL};
use crate::unifier::UnifiedSchema;

/// Source text of a generated handler module.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GeneratedArtifact {
    pub code: String,
}

/// Turns a set of captured webhooks into a typed handler.
#[derive(Clone)]
pub struct HandlerGenerator {
    loader: PayloadLoader,
    options: EmitOptions,
}

impl HandlerGenerator {
    pub fn new(store: Arc<dyn CaptureStore + Send + Sync>, options: EmitOptions) -> Self {
        Self {
            loader: PayloadLoader::new(store),
            options,
        }
    }

    /// Load, unify and emit. The artifact depends on the set of resolved captures, not on the
    /// order or repetition of `ids`.
    #[instrument(skip_all, fields(requested = ids.len()))]
    pub async fn generate(&self, ids: &[CaptureId]) -> Result<GeneratedArtifact, GenerateError> {
        let start = Instant::now();
        let result = self.try_generate(ids).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(error) => {
                warn!(%error, "failed to generate handler");
                error.outcome()
            }
        };
        counter!(GENERATE_TOTAL, &[("outcome", outcome)]).increment(1);
        histogram!(GENERATE_TIME).record(start.elapsed().as_millis() as f64);

        result
    }

    async fn try_generate(&self, ids: &[CaptureId]) -> Result<GeneratedArtifact, GenerateError> {
        if ids.is_empty() {
            return Err(GenerateError::EmptyInput);
        }

        let samples = self
            .loader
            .load(ids)
            .await
            .map_err(GenerateError::StoreUnavailable)?;

        let schema = UnifiedSchema::unify(&samples);
        debug!(
            samples = schema.tally.total,
            excluded = schema.tally.excluded(),
            root = %schema.root,
            "unified samples"
        );

        let code = emit(&schema, &self.options)?;
        Ok(GeneratedArtifact { code })
    }
}
