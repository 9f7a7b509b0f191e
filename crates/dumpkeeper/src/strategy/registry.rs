use std::collections::BTreeMap;

use super::{DumpStrategy, PostgresStrategy, SqliteStrategy};
use crate::error::{BackupError, Result};

/// Dialect name to [`DumpStrategy`] mapping.
///
/// Built once at startup and handed to the orchestrator. Supporting a new
/// database means registering another strategy here, not touching the
/// orchestrator.
pub struct StrategyRegistry {
    strategies: BTreeMap<&'static str, Box<dyn DumpStrategy>>,
}

impl StrategyRegistry {
    /// Creates a registry without any strategy.
    pub fn empty() -> Self {
        Self {
            strategies: BTreeMap::new(),
        }
    }

    /// Creates a registry with the built-in SQLite and PostgreSQL strategies.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(SqliteStrategy));
        registry.register(Box::new(PostgresStrategy));
        registry
    }

    /// Registers a strategy under its dialect, returning the one it replaces.
    pub fn register(&mut self, strategy: Box<dyn DumpStrategy>) -> Option<Box<dyn DumpStrategy>> {
        self.strategies.insert(strategy.dialect(), strategy)
    }

    /// Looks up the strategy for `dialect`.
    pub fn get(&self, dialect: &str) -> Result<&dyn DumpStrategy> {
        self.strategies
            .get(dialect)
            .map(|strategy| strategy.as_ref())
            .ok_or_else(|| BackupError::UnknownDialect {
                dialect: dialect.to_string(),
            })
    }

    /// Registered dialect names in alphabetical order.
    pub fn dialects(&self) -> Vec<&'static str> {
        self.strategies.keys().copied().collect()
    }

    /// Registered strategies in dialect order.
    pub fn strategies(&self) -> impl Iterator<Item = &dyn DumpStrategy> {
        self.strategies.values().map(|strategy| strategy.as_ref())
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::Path;

    use dumpkeeper_core::ConnectionInfo;

    use super::*;
    use crate::error::ErrorKind;

    struct FakeStrategy(&'static str);

    impl DumpStrategy for FakeStrategy {
        fn dialect(&self) -> &'static str {
            self.0
        }

        fn tools(&self) -> &'static [&'static str] {
            &[]
        }

        fn dump(&self, _: &ConnectionInfo, _: &mut dyn Write) -> Result<()> {
            Ok(())
        }

        fn load(&self, _: &ConnectionInfo, _: &Path) -> Result<()> {
            Ok(())
        }

        fn drop_schema(&self, _: &ConnectionInfo) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_defaults_cover_sqlite_and_postgresql() {
        let registry = StrategyRegistry::with_defaults();

        assert_eq!(registry.dialects(), vec!["postgresql", "sqlite"]);
        assert_eq!(registry.get("sqlite").unwrap().dialect(), "sqlite");
        assert_eq!(registry.get("postgresql").unwrap().dialect(), "postgresql");
    }

    #[test]
    fn test_unknown_dialect_is_configuration_error() {
        let registry = StrategyRegistry::with_defaults();

        let error = registry.get("mysql").err().unwrap();

        assert_eq!(error.kind(), ErrorKind::Configuration);
        assert!(matches!(error, BackupError::UnknownDialect { dialect } if dialect == "mysql"));
    }

    #[test]
    fn test_register_adds_dialect() {
        let mut registry = StrategyRegistry::empty();
        assert!(registry.get("mysql").is_err());

        let replaced = registry.register(Box::new(FakeStrategy("mysql")));

        assert!(replaced.is_none());
        assert_eq!(registry.get("mysql").unwrap().dialect(), "mysql");
    }

    #[test]
    fn test_register_replaces_existing() {
        let mut registry = StrategyRegistry::with_defaults();

        let replaced = registry.register(Box::new(FakeStrategy("sqlite")));

        assert_eq!(replaced.unwrap().dialect(), "sqlite");
        assert_eq!(registry.dialects().len(), 2);
        assert!(registry.get("sqlite").unwrap().tools().is_empty());
    }
}
