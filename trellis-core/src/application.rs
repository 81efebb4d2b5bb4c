// Application object: owns the container and drives the bootstrap sequence.

use crate::bootstrap::Bootstrapper;
use crate::container::Container;
use crate::error::{Error, Result};
use crate::logging::{debug, info};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// The application: a [`Container`] plus the base path and bootstrap state.
///
/// Derefs to the container, so all binding and resolution operations are
/// available directly on the application.
#[derive(Clone, Default)]
pub struct Application {
    container: Container,
    path: Option<PathBuf>,
    bootstrapped: Arc<AtomicBool>,
}

impl Application {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an application rooted at the given base path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            container: Container::new(),
            path: Some(path.into()),
            bootstrapped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Base path for configuration and logs, when set.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Resolve and run each named bootstrapper in order.
    ///
    /// Each id must resolve to an `Arc<dyn Bootstrapper>` through the
    /// container.
    pub fn bootstrap_with<S: AsRef<str>>(&self, bootstrappers: &[S]) -> Result<()> {
        self.bootstrapped.store(true, Ordering::SeqCst);

        for id in bootstrappers {
            let id = id.as_ref();
            debug!(bootstrapper = id, "Bootstrapping");
            let bootstrapper = self
                .container
                .resolve::<Arc<dyn Bootstrapper>>(id)
                .map_err(|e| {
                    Error::Bootstrap(format!("cannot resolve bootstrapper [{}]: {}", id, e))
                })?;
            bootstrapper.bootstrap(self)?;
        }

        info!(count = bootstrappers.len(), "Application bootstrap complete");
        Ok(())
    }

    pub fn has_been_bootstrapped(&self) -> bool {
        self.bootstrapped.load(Ordering::SeqCst)
    }
}

impl Deref for Application {
    type Target = Container;

    fn deref(&self) -> &Container {
        &self.container
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::{Bootstrapper, bootstrapper};
    use crate::error::Result;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static RUNS: AtomicUsize = AtomicUsize::new(0);

    struct Marker;

    impl Bootstrapper for Marker {
        fn bootstrap(&self, app: &Application) -> Result<()> {
            RUNS.fetch_add(1, Ordering::SeqCst);
            app.set("booted.marker", true);
            Ok(())
        }
    }

    #[test]
    fn test_bootstrap_with_runs_each_bootstrapper() {
        let app = Application::new();
        app.bind_factory("bootstrap.marker", |_, _| Ok(bootstrapper(Marker)));

        assert!(!app.has_been_bootstrapped());
        app.bootstrap_with(&["bootstrap.marker"]).unwrap();

        assert!(app.has_been_bootstrapped());
        assert!(RUNS.load(Ordering::SeqCst) >= 1);
        assert!(*app.resolve::<bool>("booted.marker").unwrap());
    }

    #[test]
    fn test_unresolvable_bootstrapper_is_a_bootstrap_error() {
        let app = Application::new();
        let err = app.bootstrap_with(&["bootstrap.missing"]).unwrap_err();

        match err {
            Error::Bootstrap(message) => {
                assert!(message.contains("bootstrap.missing"), "message: {}", message);
            }
            other => panic!("expected Bootstrap error, got {:?}", other),
        }
    }

    #[test]
    fn test_deref_exposes_container() {
        let app = Application::new();
        app.set("via-deref", 1usize);
        assert!(app.bound("via-deref"));
    }
}
