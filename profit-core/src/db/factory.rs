use std::collections::HashMap;

use async_trait::async_trait;

use super::repository::{RepositoryError, ResultRepository};

/// Backend-agnostic connection configuration.
///
/// `backend` must match the [`RepositoryFactory::backend_name`] of a
/// registered factory. `connection_string` is passed through to that
/// factory unchanged; its meaning is backend-specific.
///
/// | backend    | connection_string examples                  |
/// |------------|---------------------------------------------|
/// | `sqlite`   | `profitability.db`, `:memory:`              |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// Lowercase identifier matching a registered factory (e.g. `"sqlite"`).
    pub backend: String,
    /// Opaque value forwarded to the factory's `create` method.
    pub connection_string: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: "profitability.db".to_string(),
        }
    }
}

/// One implementation per storage backend. Each backend crate exports a
/// unit struct implementing this trait, registered with a
/// [`RepositoryRegistry`] at startup.
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    /// Unique, lowercase identifier for this backend.
    fn backend_name(&self) -> &'static str;

    /// Open (or create) the store and return a ready-to-use repository.
    /// Implementations run their schema migrations here.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn ResultRepository>, RepositoryError>;
}

/// Registry of [`RepositoryFactory`] instances, keyed by backend name.
pub struct RepositoryRegistry {
    factories: HashMap<&'static str, Box<dyn RepositoryFactory>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a backend factory, replacing any factory with the same name.
    pub fn register(
        &mut self,
        factory: Box<dyn RepositoryFactory>,
    ) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Names of every registered backend, sorted alphabetically.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Dispatch to the factory that matches `config.backend`.
    ///
    /// # Errors
    /// * [`RepositoryError::Configuration`] when no factory is registered
    ///   for the requested backend name.
    /// * Any error the chosen factory itself returns.
    pub async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn ResultRepository>, RepositoryError> {
        let factory = self
            .factories
            .get(config.backend.as_str())
            .ok_or_else(|| {
                RepositoryError::Configuration(format!(
                    "unknown backend '{}'; available: {:?}",
                    config.backend,
                    self.available_backends()
                ))
            })?;

        factory.create(config).await
    }
}

impl Default for RepositoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// tests
// ─────────────────────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;

    use crate::models::{NewResultRecord, ResultRecord};

    use super::{
        DbConfig, RepositoryError, RepositoryFactory, RepositoryRegistry, ResultRepository,
    };

    // ── stub repository ──────────────────────────────────────────────────
    // The tests only verify routing, so no method is ever called.
    struct StubRepository;

    #[async_trait]
    impl ResultRepository for StubRepository {
        async fn append(
            &self,
            _record: NewResultRecord,
        ) -> Result<i64, RepositoryError> {
            unimplemented!()
        }
        async fn get(
            &self,
            _id: i64,
        ) -> Result<ResultRecord, RepositoryError> {
            unimplemented!()
        }
        async fn list_all(&self) -> Result<Vec<ResultRecord>, RepositoryError> {
            unimplemented!()
        }
    }

    // ── stub factories ───────────────────────────────────────────────────
    struct StubFactory {
        name: &'static str,
        called: Arc<AtomicBool>,
    }

    #[async_trait]
    impl RepositoryFactory for StubFactory {
        fn backend_name(&self) -> &'static str {
            self.name
        }

        async fn create(
            &self,
            _config: &DbConfig,
        ) -> Result<Box<dyn ResultRepository>, RepositoryError> {
            self.called.store(true, Ordering::SeqCst);
            Ok(Box::new(StubRepository))
        }
    }

    fn stub_factory(name: &'static str) -> (Box<dyn RepositoryFactory>, Arc<AtomicBool>) {
        let called = Arc::new(AtomicBool::new(false));
        let factory = StubFactory {
            name,
            called: Arc::clone(&called),
        };
        (Box::new(factory), called)
    }

    struct FailingFactory;

    #[async_trait]
    impl RepositoryFactory for FailingFactory {
        fn backend_name(&self) -> &'static str {
            "failing"
        }

        async fn create(
            &self,
            _config: &DbConfig,
        ) -> Result<Box<dyn ResultRepository>, RepositoryError> {
            Err(RepositoryError::Connection("store not writable".to_string()))
        }
    }

    fn config_for(backend: &str) -> DbConfig {
        DbConfig {
            backend: backend.to_string(),
            connection_string: ":memory:".to_string(),
        }
    }

    // ── DbConfig ─────────────────────────────────────────────────────────
    #[test]
    fn default_config_uses_sqlite_file() {
        let config = DbConfig::default();

        assert_eq!(config.backend, "sqlite");
        assert_eq!(config.connection_string, "profitability.db");
    }

    // ── registration ─────────────────────────────────────────────────────
    #[test]
    fn new_registry_is_empty() {
        assert!(RepositoryRegistry::new().available_backends().is_empty());
    }

    #[test]
    fn available_backends_are_sorted() {
        let mut reg = RepositoryRegistry::new();
        reg.register(stub_factory("sqlite").0);
        reg.register(stub_factory("postgres").0);
        reg.register(stub_factory("memory").0);

        assert_eq!(reg.available_backends(), vec!["memory", "postgres", "sqlite"]);
    }

    #[test]
    fn registering_same_name_replaces_factory() {
        let mut reg = RepositoryRegistry::new();
        reg.register(stub_factory("sqlite").0);
        reg.register(stub_factory("sqlite").0);

        assert_eq!(reg.available_backends(), vec!["sqlite"]);
    }

    // ── dispatch ─────────────────────────────────────────────────────────
    #[tokio::test]
    async fn create_dispatches_to_matching_factory() {
        let mut reg = RepositoryRegistry::new();
        let (sqlite_factory, sqlite_called) = stub_factory("sqlite");
        let (memory_factory, memory_called) = stub_factory("memory");
        reg.register(sqlite_factory);
        reg.register(memory_factory);

        let result = reg.create(&config_for("sqlite")).await;

        assert!(result.is_ok(), "expected Ok, got {:#?}", result.err());
        assert!(sqlite_called.load(Ordering::SeqCst));
        assert!(!memory_called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn configuration_error_names_requested_and_available_backends() {
        let mut reg = RepositoryRegistry::new();
        reg.register(stub_factory("sqlite").0);

        match reg.create(&config_for("postgres")).await {
            Err(RepositoryError::Configuration(msg)) => {
                assert!(msg.contains("postgres"), "error should name the requested backend");
                assert!(msg.contains("sqlite"), "error should list available backends");
            }
            Err(other) => panic!("expected Configuration error, got {other:#?}"),
            Ok(_) => panic!("expected Configuration error, got Ok"),
        }
    }

    #[tokio::test]
    async fn create_propagates_factory_error() {
        let mut reg = RepositoryRegistry::new();
        reg.register(Box::new(FailingFactory));

        match reg.create(&config_for("failing")).await {
            Err(err) => assert_eq!(
                err,
                RepositoryError::Connection("store not writable".to_string())
            ),
            Ok(_) => panic!("expected Connection error, got Ok"),
        }
    }
}
