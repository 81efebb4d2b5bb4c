// Trellis - a service-container web framework core for Rust
//
// The container resolves string-keyed services with contextual bindings
// and explicit type metadata; the pipeline wraps a traveler in layered
// middleware; the router dispatches pattern-matched requests to handlers
// or container-resolved controllers.

// Re-export core functionality
pub use trellis_core::*;

pub use trellis_log;

// Re-export optional crates
#[cfg(feature = "config")]
pub use trellis_config;

#[cfg(feature = "validation")]
pub use trellis_validation;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        AppKernel,
        Application,
        Container,
        Controller,
        Error,
        Kernel,
        Next,
        Params,
        Pipe,
        PipeSpec,
        Pipeline,
        Request,
        RouteTarget,
        Router,
        TypeMetadata,
        action,
        controller,
        handler,
        instance,
    };

    pub use trellis_log::{Level, LogWriter};

    #[cfg(feature = "config")]
    pub use trellis_config::ConfigRepository;

    #[cfg(feature = "validation")]
    pub use trellis_validation::Validator;
}
