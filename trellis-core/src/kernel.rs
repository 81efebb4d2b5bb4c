// Request kernel: bootstrap once, then pipe requests into the router.

use crate::application::Application;
use crate::error::Result;
use crate::logging::debug;
use crate::pipeline::Pipeline;
use crate::routing::{Request, Router};
use std::sync::Arc;

/// Entry point contract for request handling.
pub trait Kernel {
    /// Run the bootstrap sequence if it has not run yet.
    fn bootstrap(&self) -> Result<()>;

    /// Handle one request and return the response body.
    fn handle(&self, request: Request) -> Result<String>;

    fn application(&self) -> &Application;
}

/// Default kernel: configured bootstrappers, then a middleware pipeline
/// that terminates in router dispatch.
pub struct AppKernel {
    app: Application,
    router: Arc<Router>,
    bootstrappers: Vec<String>,
    middleware: Vec<String>,
}

impl AppKernel {
    pub fn new(app: Application, router: Router) -> Self {
        Self {
            app,
            router: Arc::new(router),
            bootstrappers: Vec::new(),
            middleware: Vec::new(),
        }
    }

    /// Set the ordered bootstrapper ids resolved through the container.
    pub fn with_bootstrappers<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bootstrappers = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Set the ordered middleware pipe specs (`"name"` or `"name:args"`).
    pub fn with_middleware<I, S>(mut self, specs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.middleware = specs.into_iter().map(Into::into).collect();
        self
    }

    pub fn router(&self) -> &Router {
        &self.router
    }
}

impl Kernel for AppKernel {
    fn bootstrap(&self) -> Result<()> {
        if self.app.has_been_bootstrapped() {
            return Ok(());
        }
        self.app.bootstrap_with(&self.bootstrappers)
    }

    fn handle(&self, request: Request) -> Result<String> {
        self.bootstrap()?;
        debug!(method = %request.method, path = %request.path, "Handling request");

        let router = Arc::clone(&self.router);
        let container = self.app.container().clone();

        Pipeline::<Request, String>::new(self.app.container().clone())
            .send(request)
            .through(self.middleware.iter().map(String::as_str))
            .then(move |request| router.dispatch(&container, &request))
    }

    fn application(&self) -> &Application {
        &self.app
    }
}
