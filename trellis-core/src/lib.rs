// Core library for the Trellis framework
// Service container, type metadata, middleware pipeline, routing, and the
// bootstrap/kernel contracts that glue them together.

pub mod application;
pub mod bootstrap;
pub mod container;
pub mod error;
pub mod facade;
pub mod kernel;
pub mod logging;
pub mod pipeline;
pub mod reflect;
pub mod routing;

// Re-export commonly used types
pub use application::*;
pub use bootstrap::*;
pub use container::*;
pub use error::*;
pub use kernel::*;
pub use pipeline::*;
pub use reflect::*;
pub use routing::{Controller, Request, RouteHandler, RouteTarget, Router, action, controller, handler};
