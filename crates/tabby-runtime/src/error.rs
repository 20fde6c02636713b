//! Runtime error types.

use tabby_core::RegistryError;
use thiserror::Error;

pub use crate::config::{ConfigError, ConfigResult};

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An API extension clashed with registered actions.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The dispatch worker panicked or was cancelled.
    #[error("Dispatch worker failed: {0}")]
    Worker(String),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
