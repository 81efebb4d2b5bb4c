// Error types for the Trellis framework core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Binding resolution error: {0}")]
    BindingResolution(String),

    #[error("Circular dependency detected while resolving [{0}]")]
    CircularDependency(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("Route not found: {0}")]
    RouteNotFound(String),

    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("Bootstrap error: {0}")]
    Bootstrap(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for failures that optional-parameter defaults may recover from.
    ///
    /// A detected dependency cycle is deliberately excluded: falling back to
    /// a default would mask a wiring bug that must fail fast.
    pub fn is_resolution_failure(&self) -> bool {
        matches!(self, Error::BindingResolution(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
