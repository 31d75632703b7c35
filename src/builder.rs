use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};

use crate::{
    AgentflowError, Config, Result, StoreType, Studio,
    execution::{HttpStatusSource, HttpStatusStream, StatusSource, StatusStream},
    store::{DbStore, MemStore, PostgresStore, Store},
    suggest::{HttpSuggestionProvider, SuggestionAdapter, SuggestionProvider},
};

/// Builds a [`Studio`], with the http backends unless overridden.
#[derive(Default)]
pub struct StudioBuilder {
    config: Config,
    rt: Option<Arc<Runtime>>,
    db: Option<Arc<dyn DbStore>>,
    status_source: Option<Arc<dyn StatusSource>>,
    status_stream: Option<Arc<dyn StatusStream>>,
    provider: Option<Arc<dyn SuggestionProvider>>,
}

impl StudioBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(
        mut self,
        config: Config,
    ) -> Self {
        self.config = config;
        self
    }

    pub fn async_worker_thread_number(
        mut self,
        n: u16,
    ) -> Self {
        self.config.async_worker_thread_number = n;
        self
    }

    pub fn runtime(
        mut self,
        runtime: Arc<Runtime>,
    ) -> Self {
        self.rt = Some(runtime);
        self
    }

    /// Use `db` instead of the backend named by the config.
    pub fn store(
        mut self,
        db: Arc<dyn DbStore>,
    ) -> Self {
        self.db = Some(db);
        self
    }

    pub fn status_source(
        mut self,
        source: Arc<dyn StatusSource>,
    ) -> Self {
        self.status_source = Some(source);
        self
    }

    pub fn status_stream(
        mut self,
        stream: Arc<dyn StatusStream>,
    ) -> Self {
        self.status_stream = Some(stream);
        self
    }

    pub fn suggestion_provider(
        mut self,
        provider: Arc<dyn SuggestionProvider>,
    ) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn build(&self) -> Result<Studio> {
        let config = self.config.clone();
        let runtime = match &self.rt {
            Some(rt) => rt.clone(),
            None => Arc::new(
                Builder::new_multi_thread()
                    .worker_threads(config.async_worker_thread_number.max(1).into())
                    .enable_all()
                    .build()
                    .map_err(|e| AgentflowError::Config(format!("failed to build runtime: {}", e)))?,
            ),
        };

        let db: Arc<dyn DbStore> = match &self.db {
            Some(db) => db.clone(),
            None => match config.store.store_type {
                StoreType::Mem => Arc::new(MemStore::new()),
                StoreType::Postgres => {
                    let postgres = config
                        .store
                        .postgres
                        .as_ref()
                        .ok_or_else(|| AgentflowError::Config("postgres configuration is required when store type is postgres".to_string()))?;
                    Arc::new(PostgresStore::new(&postgres.database_url, runtime.clone())?)
                }
            },
        };
        let store = Store::open(db.as_ref())?;

        let source: Arc<dyn StatusSource> = match &self.status_source {
            Some(source) => source.clone(),
            None => Arc::new(HttpStatusSource::new(&config.status)?),
        };
        let stream: Arc<dyn StatusStream> = match &self.status_stream {
            Some(stream) => stream.clone(),
            None => Arc::new(HttpStatusStream::new(&config.status)?),
        };
        let provider: Arc<dyn SuggestionProvider> = match &self.provider {
            Some(provider) => provider.clone(),
            None => Arc::new(HttpSuggestionProvider::new(&config.suggestion)?),
        };
        let adapter = Arc::new(SuggestionAdapter::new(provider, &config.suggestion));

        Ok(Studio::new(config, store, source, stream, adapter, runtime))
    }
}
