//! Application context providing the dependency injection root.

use std::sync::Arc;

use crate::config::Config;
use crate::error::AppError;
use crate::models::ServiceCatalog;

/// Extract a value from a reference to another type.
///
/// Services implement `FromRef<Context>` so handlers can resolve them from the
/// shared context without threading individual dependencies around.
pub trait FromRef<T> {
    fn from_ref(input: &T) -> Self;
}

/// Any Clone type can be extracted from itself.
impl<T: Clone> FromRef<T> for T {
    fn from_ref(input: &T) -> Self {
        input.clone()
    }
}

/// Root application context.
///
/// Holds only read-only shared state, so cloning it into concurrent MCP
/// sessions or evaluations never needs locking.
#[derive(Clone)]
pub struct Context {
    /// Service catalog snapshot used for every evaluation.
    pub catalog: Arc<ServiceCatalog>,
    /// Application configuration.
    pub config: Arc<Config>,
}

impl Context {
    /// Creates a new context with the given dependencies.
    pub fn new(catalog: ServiceCatalog, config: Config) -> Self {
        Self {
            catalog: Arc::new(catalog),
            config: Arc::new(config),
        }
    }

    /// Build the context from configuration, loading the configured catalog
    /// or the built-in one.
    pub fn from_config(config: Config) -> Result<Self, AppError> {
        let catalog = match config.catalog.path.as_deref() {
            Some(path) => {
                tracing::info!(path, "Loading service catalog");
                ServiceCatalog::from_path(path)?
            }
            None => {
                tracing::debug!("Using built-in service catalog");
                ServiceCatalog::builtin()?
            }
        };

        Ok(Self::new(catalog, config))
    }
}

impl FromRef<Context> for Arc<ServiceCatalog> {
    fn from_ref(ctx: &Context) -> Self {
        ctx.catalog.clone()
    }
}

impl FromRef<Context> for Arc<Config> {
    fn from_ref(ctx: &Context) -> Self {
        ctx.config.clone()
    }
}
