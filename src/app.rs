use anyhow::Context;
use axum::Router;
use quill_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use crate::{modules, state::AppState};

/// Fully initialized application: modules registered, migrated, and started.
pub struct App {
    settings: Settings,
    registry: ModuleRegistry,
}

impl App {
    /// Register every module, then run init, migrations, and start in order.
    pub async fn bootstrap(settings: Settings) -> anyhow::Result<Self> {
        let state = AppState::from_settings(&settings);

        let mut registry = ModuleRegistry::new();
        modules::register_all(&mut registry, &state);

        let ctx = InitCtx {
            settings: &settings,
            db: &state.db,
        };
        registry.init_modules(&ctx).await?;
        let applied = registry
            .run_migrations(&state.db)
            .await
            .context("failed to run migrations")?;
        registry.start_modules(&ctx).await?;

        tracing::info!(
            modules = registry.module_count(),
            migrations = applied,
            database = state.db.name(),
            "application bootstrap complete"
        );

        Ok(Self { settings, registry })
    }

    /// Router with every module mounted and the global middlewares applied
    pub fn router(&self) -> Router {
        quill_http::build_router(&self.registry, &self.settings)
    }

    /// Serve until a shutdown signal arrives, then stop every module.
    pub async fn run(self) -> anyhow::Result<()> {
        let served = quill_http::start_server(&self.registry, &self.settings).await;
        self.registry.stop_modules().await?;
        served
    }
}

/// Bootstrap the application with `settings` and serve it.
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    App::bootstrap(settings).await?.run().await
}
