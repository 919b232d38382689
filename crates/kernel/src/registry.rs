use anyhow::Context;
use std::sync::Arc;

use quill_db::Database;

use crate::module::{InitCtx, Migration, Module};

/// Module registry managing the lifecycle of every registered module.
///
/// Modules are initialized and started in registration order and stopped in
/// reverse order.
pub struct ModuleRegistry {
    modules: Vec<Arc<dyn Module>>,
}

impl ModuleRegistry {
    /// Create a new module registry
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// Register a module with the registry
    pub fn register(&mut self, module: Arc<dyn Module>) {
        tracing::debug!(module = module.name(), "module registered");
        self.modules.push(module);
    }

    /// Get all registered modules in registration order
    pub fn modules(&self) -> impl Iterator<Item = &Arc<dyn Module>> {
        self.modules.iter()
    }

    /// Get a module by name
    pub fn get_module(&self, name: &str) -> Option<&Arc<dyn Module>> {
        self.modules.iter().find(|module| module.name() == name)
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    pub async fn init_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!("initializing {} modules", self.modules.len());

        for module in &self.modules {
            tracing::info!(module = module.name(), "initializing module");

            module
                .init(ctx)
                .await
                .with_context(|| format!("failed to initialize module '{}'", module.name()))?;
        }

        Ok(())
    }

    pub async fn start_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!("starting {} modules", self.modules.len());

        for module in &self.modules {
            tracing::info!(module = module.name(), "starting module");

            module
                .start(ctx)
                .await
                .with_context(|| format!("failed to start module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Stop modules in reverse registration order
    pub async fn stop_modules(&self) -> anyhow::Result<()> {
        tracing::info!("stopping {} modules", self.modules.len());

        for module in self.modules.iter().rev() {
            tracing::info!(module = module.name(), "stopping module");

            module
                .stop()
                .await
                .with_context(|| format!("failed to stop module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Collect all migrations from all modules
    pub fn collect_migrations(&self) -> Vec<(String, Migration)> {
        let mut migrations = Vec::new();

        for module in &self.modules {
            for migration in module.migrations() {
                migrations.push((module.name().to_string(), migration));
            }
        }

        // Sort by module name and migration ID for deterministic ordering
        migrations.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.id.cmp(b.1.id)));

        migrations
    }

    /// Apply every pending migration to `db`. Returns how many were applied.
    pub async fn run_migrations(&self, db: &Database) -> anyhow::Result<usize> {
        let mut applied = 0;

        for (module, migration) in self.collect_migrations() {
            let key = format!("{}/{}", module, migration.id);
            if db.is_applied(&key).await {
                tracing::debug!(migration = %key, "migration already applied");
                continue;
            }

            for field in migration.unique {
                db.ensure_unique(migration.collection, field)
                    .await
                    .with_context(|| format!("failed to apply migration '{}'", key))?;
            }
            // Only recorded once every index exists, so a failed run is retried
            db.mark_applied(&key).await;

            tracing::info!(
                migration = %key,
                collection = migration.collection,
                "migration applied"
            );
            applied += 1;
        }

        Ok(applied)
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TestModule {
        name: &'static str,
        stopped_at: Arc<AtomicUsize>,
        clock: Arc<AtomicUsize>,
    }

    impl TestModule {
        fn new(name: &'static str, clock: &Arc<AtomicUsize>) -> Self {
            Self {
                name,
                stopped_at: Arc::new(AtomicUsize::new(0)),
                clock: Arc::clone(clock),
            }
        }
    }

    #[async_trait::async_trait]
    impl Module for TestModule {
        fn name(&self) -> &'static str {
            self.name
        }

        fn migrations(&self) -> Vec<Migration> {
            vec![
                Migration {
                    id: "002_index",
                    collection: "things",
                    unique: &["slug"],
                },
                Migration {
                    id: "001_init",
                    collection: "things",
                    unique: &[],
                },
            ]
        }

        async fn stop(&self) -> anyhow::Result<()> {
            let tick = self.clock.fetch_add(1, Ordering::SeqCst) + 1;
            self.stopped_at.store(tick, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingModule;

    #[async_trait::async_trait]
    impl Module for FailingModule {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
            anyhow::bail!("boom")
        }
    }

    #[test]
    fn test_module_registry_creation() {
        let registry = ModuleRegistry::new();
        assert_eq!(registry.modules().count(), 0);
        assert!(registry.collect_migrations().is_empty());
    }

    #[test]
    fn test_migration_collection_is_sorted() {
        let clock = Arc::new(AtomicUsize::new(0));
        let mut registry = ModuleRegistry::new();
        registry.register(Arc::new(TestModule::new("zeta", &clock)));
        registry.register(Arc::new(TestModule::new("alpha", &clock)));

        let order: Vec<_> = registry
            .collect_migrations()
            .into_iter()
            .map(|(module, m)| format!("{}/{}", module, m.id))
            .collect();
        assert_eq!(
            order,
            ["alpha/001_init", "alpha/002_index", "zeta/001_init", "zeta/002_index"]
        );
    }

    #[test]
    fn test_get_module_by_name() {
        let clock = Arc::new(AtomicUsize::new(0));
        let mut registry = ModuleRegistry::new();
        registry.register(Arc::new(TestModule::new("things", &clock)));

        assert!(registry.get_module("things").is_some());
        assert!(registry.get_module("missing").is_none());
        assert_eq!(registry.module_count(), 1);
    }

    #[tokio::test]
    async fn test_run_migrations_is_idempotent() {
        let clock = Arc::new(AtomicUsize::new(0));
        let mut registry = ModuleRegistry::new();
        registry.register(Arc::new(TestModule::new("things", &clock)));
        let db = Database::new("test");

        assert_eq!(registry.run_migrations(&db).await.unwrap(), 2);
        assert_eq!(registry.run_migrations(&db).await.unwrap(), 0);

        let things = db.collection::<serde_json::Value>("things");
        things.save(&serde_json::json!({"slug": "a"})).await.unwrap();
        assert!(things.save(&serde_json::json!({"slug": "a"})).await.is_err());
    }

    #[tokio::test]
    async fn test_failed_migration_is_retried_after_data_is_fixed() {
        let clock = Arc::new(AtomicUsize::new(0));
        let mut registry = ModuleRegistry::new();
        registry.register(Arc::new(TestModule::new("things", &clock)));
        let db = Database::new("test");

        let things = db.collection::<serde_json::Value>("things");
        let first = things.save(&serde_json::json!({"slug": "a"})).await.unwrap();
        things.save(&serde_json::json!({"slug": "a"})).await.unwrap();

        let err = registry.run_migrations(&db).await.unwrap_err();
        assert!(err.to_string().contains("things/"));

        let id = first["id"].as_str().unwrap();
        things.find_by_id_and_remove(id).await.unwrap();

        assert!(registry.run_migrations(&db).await.unwrap() > 0);
        assert!(things.save(&serde_json::json!({"slug": "a"})).await.is_err());
    }

    #[tokio::test]
    async fn test_module_lifecycle_stops_in_reverse() {
        let clock = Arc::new(AtomicUsize::new(0));
        let first = Arc::new(TestModule::new("first", &clock));
        let second = Arc::new(TestModule::new("second", &clock));

        let mut registry = ModuleRegistry::new();
        registry.register(first.clone());
        registry.register(second.clone());

        let settings = Settings::default();
        let db = Database::new("test");
        let ctx = InitCtx {
            settings: &settings,
            db: &db,
        };

        registry.init_modules(&ctx).await.unwrap();
        registry.start_modules(&ctx).await.unwrap();
        registry.stop_modules().await.unwrap();

        assert_eq!(second.stopped_at.load(Ordering::SeqCst), 1);
        assert_eq!(first.stopped_at.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_init_failure_names_module() {
        let mut registry = ModuleRegistry::new();
        registry.register(Arc::new(FailingModule));

        let settings = Settings::default();
        let db = Database::new("test");
        let ctx = InitCtx {
            settings: &settings,
            db: &db,
        };

        let err = registry.init_modules(&ctx).await.unwrap_err();
        assert!(err.to_string().contains("broken"));
    }
}
