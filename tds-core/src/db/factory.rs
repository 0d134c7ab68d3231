use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::repository::{RepositoryError, SectionRepository};

/// Which rate-chart store to open and how to reach it.
///
/// `connection_string` is handed to the backend as is: for `sqlite` it is a
/// file path, a `sqlite:` URL or `:memory:`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub backend: String,
    pub connection_string: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: ":memory:".to_string(),
        }
    }
}

/// Opens a [`SectionRepository`] for one storage backend.
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    fn backend_name(&self) -> &'static str;

    async fn create(&self, config: &DbConfig) -> Result<Box<dyn SectionRepository>, RepositoryError>;
}

/// Storage backends the binaries can be pointed at with `--backend`.
#[derive(Default)]
pub struct RepositoryRegistry {
    factories: BTreeMap<&'static str, Box<dyn RepositoryFactory>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a backend. A later factory with the same name wins.
    pub fn register(&mut self, factory: Box<dyn RepositoryFactory>) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Registered backend names in alphabetical order.
    pub fn available_backends(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }

    /// Opens the store named by `config.backend`.
    ///
    /// # Errors
    ///
    /// [`RepositoryError::Configuration`] for an unregistered backend, or
    /// whatever the backend reports while connecting.
    pub async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn SectionRepository>, RepositoryError> {
        let Some(factory) = self.factories.get(config.backend.as_str()) else {
            return Err(RepositoryError::Configuration(format!(
                "unknown backend '{}'; available: {}",
                config.backend,
                self.available_backends().join(", ")
            )));
        };

        factory.create(config).await
    }

    /// [`create`](Self::create) for handlers that share one store.
    pub async fn create_shared(
        &self,
        config: &DbConfig,
    ) -> Result<Arc<dyn SectionRepository>, RepositoryError> {
        self.create(config).await.map(Arc::from)
    }
}
