use std::sync::Arc;

use eyre::{Result, WrapErr};
use hook_codegen::{EmitOptions, HandlerGenerator};
use hook_store::{CaptureStore, MemoryCaptureStore, PgCaptureStore};
use tracing::{error, info, warn};

use crate::config::{Config, StoreBackend};

/// Everything handlers need, built once at startup and cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CaptureStore + Send + Sync>,
    pub generator: HandlerGenerator,
}

impl AppState {
    pub fn new(store: Arc<dyn CaptureStore + Send + Sync>, options: EmitOptions) -> Self {
        Self {
            generator: HandlerGenerator::new(store.clone(), options),
            store,
        }
    }

    pub async fn from_config(config: &Config) -> Result<Self> {
        let options = config.emit_options();
        options
            .validate()
            .wrap_err("invalid ROOT_TYPE_NAME or HANDLER_NAME")?;

        let store: Arc<dyn CaptureStore + Send + Sync> = match config.store_backend {
            StoreBackend::Postgres => {
                match PgCaptureStore::new(&config.database_url, config.max_pg_connections).await {
                    Ok(store) => {
                        info!("Successfully created Postgres capture store");
                        Arc::new(store)
                    }
                    Err(e) => {
                        error!(
                            error = %e,
                            max_connections = config.max_pg_connections,
                            "Failed to create Postgres capture store"
                        );
                        return Err(e).wrap_err("failed to connect to the capture database");
                    }
                }
            }
            StoreBackend::Memory => {
                warn!("using the in-memory capture store, captures are lost on restart");
                Arc::new(MemoryCaptureStore::new())
            }
        };

        Ok(Self::new(store, options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_from_config_rejects_reserved_handler_name() {
        let config = Config {
            handler_name: "return".to_string(),
            ..Config::default_for_test()
        };
        assert!(AppState::from_config(&config).await.is_err());
    }

    #[tokio::test]
    async fn test_from_config_memory_backend() {
        let state = AppState::from_config(&Config::default_for_test())
            .await
            .unwrap();
        assert!(state.store.find_many(10, None).await.unwrap().is_empty());
    }
}
