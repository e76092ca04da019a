pub mod args;
pub mod config;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod logging;

// Re-export commonly used items for convenience
pub use config::AppConfig;
pub use errors::AppError;
pub use infrastructure::container::{
    ContainerError, Dependency, ScopeKey, ScopedHandle, ServiceContainer, ServiceDefinition,
    ServiceLifetime,
};
pub use infrastructure::provider::{build_container, ProviderFactory};
