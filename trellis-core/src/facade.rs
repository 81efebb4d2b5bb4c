// Typed facade accessors backed by the container.
//
// The dynamic static-proxy pattern becomes a plain function: resolve the
// accessor id and downcast to the expected service type.

use crate::application::Application;
use crate::error::Result;
use std::sync::Arc;
use trellis_log::LogWriter;

/// Resolve the service registered under `accessor` as a `T`.
pub fn facade<T: Send + Sync + 'static>(app: &Application, accessor: &str) -> Result<Arc<T>> {
    app.container().resolve::<T>(accessor)
}

/// The `"log"` facade.
pub fn log(app: &Application) -> Result<Arc<LogWriter>> {
    facade(app, "log")
}

/// The `"config"` facade, typed by the caller's repository type.
pub fn config<T: Send + Sync + 'static>(app: &Application) -> Result<Arc<T>> {
    facade(app, "config")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facade_resolves_and_downcasts() {
        let app = Application::new();
        app.set("greeting", "hello".to_string());

        let value = facade::<String>(&app, "greeting").unwrap();
        assert_eq!(*value, "hello");
    }

    #[test]
    fn test_facade_through_alias() {
        let app = Application::new();
        app.set("cache.store", 7usize);
        app.alias("Cache", "cache.store");

        let value = facade::<usize>(&app, "Cache").unwrap();
        assert_eq!(*value, 7);
    }

    #[test]
    fn test_facade_wrong_type_fails() {
        let app = Application::new();
        app.set("greeting", "hello".to_string());
        assert!(facade::<usize>(&app, "greeting").is_err());
    }
}
