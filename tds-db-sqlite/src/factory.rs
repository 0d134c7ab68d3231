use std::path::PathBuf;

use async_trait::async_trait;

use tds_core::db::repository::{RepositoryError, SectionRepository};
use tds_core::db::{DbConfig, RepositoryFactory};

use crate::repository::SqliteRepository;

/// Environment variable that overrides the seeds directory.
pub const SEEDS_DIR_ENV: &str = "TDS_DB_SQLITE_SEEDS_DIR";

/// Resolve the seeds directory at runtime so it works in both development and
/// packaged distribution.
///
/// Resolution order:
/// 1. **`TDS_DB_SQLITE_SEEDS_DIR`** if set.
/// 2. **`./seeds`** if the directory exists in the current working directory.
/// 3. **`$CARGO_MANIFEST_DIR/seeds`** as a last resort (dev and tests run
///    from the build tree).
pub fn seeds_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(SEEDS_DIR_ENV) {
        return PathBuf::from(dir);
    }
    let cwd_seeds = PathBuf::from("./seeds");
    if cwd_seeds.is_dir() {
        return cwd_seeds;
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("seeds")
}

/// [`RepositoryFactory`] for SQLite.
///
/// Register this with a [`tds_core::db::RepositoryRegistry`] to make the
/// `"sqlite"` backend available:
///
/// ```rust,no_run
/// use tds_core::db::RepositoryRegistry;
/// use tds_db_sqlite::SqliteRepositoryFactory;
///
/// let mut registry = RepositoryRegistry::new();
/// registry.register(Box::new(SqliteRepositoryFactory));
/// ```
pub struct SqliteRepositoryFactory;

#[async_trait]
impl RepositoryFactory for SqliteRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Open the database described by `config.connection_string`, run
    /// migrations and apply the rate chart seeds.
    ///
    /// Accepted connection-string values:
    /// * A bare file path, e.g. `"tds.db"`. The file is created if it does
    ///   not exist.
    /// * A sqlx URL such as `"sqlite://tds.db"`.
    /// * `":memory:"` for an ephemeral database.
    ///
    /// Seeds only insert missing rows, so sections edited through the
    /// section loader survive a restart.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn SectionRepository>, RepositoryError> {
        let repo = SqliteRepository::new(&config.connection_string)
            .await
            .map_err(|e| RepositoryError::Connection(format!("{e:#}")))?;
        repo.run_migrations()
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;
        repo.run_seeds(&seeds_dir())
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;
        Ok(Box::new(repo))
    }
}

#[cfg(test)]
mod tests {
    use tds_core::db::{DbConfig, RepositoryFactory};

    use super::SqliteRepositoryFactory;

    #[test]
    fn backend_name_is_sqlite() {
        assert_eq!(SqliteRepositoryFactory.backend_name(), "sqlite");
    }

    /// Full round-trip: factory to a seeded in-memory repository.
    #[tokio::test]
    async fn creates_seeded_in_memory_repository() {
        let config = DbConfig {
            backend: "sqlite".to_string(),
            connection_string: ":memory:".to_string(),
        };

        let repo = SqliteRepositoryFactory
            .create(&config)
            .await
            .expect("failed to create in-memory repository");

        let section = repo.get_section("194H").await.expect("194H should be seeded");
        assert_eq!(section.description, "Commission / Brokerage");
    }

    #[tokio::test]
    async fn unreachable_path_is_connection_error() {
        let config = DbConfig {
            backend: "sqlite".to_string(),
            connection_string: "/nonexistent-dir/sub/tds.db".to_string(),
        };

        let result = SqliteRepositoryFactory.create(&config).await;

        assert!(matches!(
            result,
            Err(tds_core::RepositoryError::Connection(_))
        ));
    }
}
