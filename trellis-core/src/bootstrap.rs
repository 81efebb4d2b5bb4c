// Bootstrap and service-provider contracts.

use crate::application::Application;
use crate::container::{Instance, instance};
use crate::error::Result;
use std::sync::Arc;

/// One step of the application bootstrap sequence.
pub trait Bootstrapper: Send + Sync {
    fn bootstrap(&self, app: &Application) -> Result<()>;
}

/// Wrap a bootstrapper so it can be stored in the container and resolved
/// by [`Application::bootstrap_with`].
pub fn bootstrapper(b: impl Bootstrapper + 'static) -> Instance {
    instance(Arc::new(b) as Arc<dyn Bootstrapper>)
}

/// Registers services into the container during bootstrap.
pub trait ServiceProvider: Send + Sync {
    fn register(&self, app: &Application) -> Result<()>;
}

/// Wrap a provider for container storage.
pub fn provider(p: impl ServiceProvider + 'static) -> Instance {
    instance(Arc::new(p) as Arc<dyn ServiceProvider>)
}

/// Registers the `"log"` singleton: a [`trellis_log::LogWriter`] appending
/// under the application base path (current directory when unset).
pub struct LogServiceProvider;

impl ServiceProvider for LogServiceProvider {
    fn register(&self, app: &Application) -> Result<()> {
        let base = app
            .path()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| ".".into());

        app.singleton_factory("log", move |_, _| {
            let writer = trellis_log::LogWriter::open(&base, "local")?;
            Ok(instance(writer))
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_log::LogWriter;

    #[test]
    fn test_log_provider_registers_shared_writer() {
        let dir = tempfile::tempdir().unwrap();
        let app = Application::with_path(dir.path());
        LogServiceProvider.register(&app).unwrap();

        let first = app.resolve::<LogWriter>("log").unwrap();
        let second = app.resolve::<LogWriter>("log").unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        first.info("booted");
        let content =
            std::fs::read_to_string(dir.path().join("logs/app.log")).unwrap();
        assert!(content.contains("local.INFO: booted"));
    }
}
