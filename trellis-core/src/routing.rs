// String-matched routing table in front of the container.
//
// Routes map an HTTP method and URI (with `:any`/`:num`/`:all`
// placeholders) to either a handler closure or a `"service@action"`
// controller target resolved through the container at dispatch time.

use crate::container::{Container, Instance, instance};
use crate::error::{Error, Result};
use crate::logging::{debug, trace};
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

// Placeholder classes substituted into the URI before regex matching.
const PATTERNS: [(&str, &str); 3] = [(":any", "[^/]+"), (":num", "[0-9]+"), (":all", ".*")];

/// Minimal request payload for dispatch; also the kernel's pipeline
/// traveler. HTTP transport itself lives outside this crate.
#[derive(Clone, Debug)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub input: HashMap<String, String>,
}

impl Request {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into().to_uppercase(),
            path: path.into(),
            input: HashMap::new(),
        }
    }

    pub fn with_input(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.input.insert(key.into(), value.into());
        self
    }
}

/// A controller reachable through `"service@action"` route targets.
pub trait Controller: Send + Sync {
    fn call(&self, action: &str, params: Vec<String>) -> Result<String>;
}

/// Wrap a controller for container storage.
pub fn controller(c: impl Controller + 'static) -> Instance {
    instance(Arc::new(c) as Arc<dyn Controller>)
}

/// Handler closure route target.
pub type RouteHandler = Arc<dyn Fn(Vec<String>) -> Result<String> + Send + Sync>;

/// Target of a route.
#[derive(Clone)]
pub enum RouteTarget {
    Handler(RouteHandler),
    /// Parsed once from `"service@action"` at registration.
    Action { service: String, action: String },
}

/// A closure route target.
pub fn handler<F>(f: F) -> RouteTarget
where
    F: Fn(Vec<String>) -> Result<String> + Send + Sync + 'static,
{
    RouteTarget::Handler(Arc::new(f))
}

/// Parse a `"service@action"` controller target.
pub fn action(spec: &str) -> Result<RouteTarget> {
    match spec.split_once('@') {
        Some((service, action)) if !service.is_empty() && !action.is_empty() => {
            Ok(RouteTarget::Action {
                service: service.to_string(),
                action: action.to_string(),
            })
        }
        _ => Err(Error::RouteNotFound(format!(
            "Invalid controller target [{}]; expected \"service@action\"",
            spec
        ))),
    }
}

struct Route {
    method: String,
    uri: String,
    regex: Option<Regex>,
    target: RouteTarget,
}

/// The routing table. An explicit value owned by the application entry
/// point; there is no process-global route state.
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
    prefix: Vec<String>,
    error_handler: Option<RouteHandler>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, uri: &str, target: RouteTarget) -> Result<&mut Self> {
        self.add("GET", uri, target)
    }

    pub fn post(&mut self, uri: &str, target: RouteTarget) -> Result<&mut Self> {
        self.add("POST", uri, target)
    }

    pub fn put(&mut self, uri: &str, target: RouteTarget) -> Result<&mut Self> {
        self.add("PUT", uri, target)
    }

    pub fn delete(&mut self, uri: &str, target: RouteTarget) -> Result<&mut Self> {
        self.add("DELETE", uri, target)
    }

    pub fn options(&mut self, uri: &str, target: RouteTarget) -> Result<&mut Self> {
        self.add("OPTIONS", uri, target)
    }

    pub fn head(&mut self, uri: &str, target: RouteTarget) -> Result<&mut Self> {
        self.add("HEAD", uri, target)
    }

    /// Register the target for both GET and POST.
    pub fn any(&mut self, uri: &str, target: RouteTarget) -> Result<&mut Self> {
        self.add("GET", uri, target.clone())?;
        self.add("POST", uri, target)
    }

    /// Register routes under a shared URI prefix.
    pub fn group<F>(&mut self, prefix: &str, routes: F) -> Result<()>
    where
        F: FnOnce(&mut Router) -> Result<()>,
    {
        self.prefix.push(prefix.trim_matches('/').to_string());
        let result = routes(self);
        self.prefix.pop();
        result
    }

    /// Handler invoked when no route matches.
    pub fn on_error<F>(&mut self, f: F)
    where
        F: Fn(Vec<String>) -> Result<String> + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(f));
    }

    fn add(&mut self, method: &str, uri: &str, target: RouteTarget) -> Result<&mut Self> {
        let uri = self.prefixed(uri);

        // URIs with placeholders are compiled once at registration.
        let regex = if uri.contains(':') {
            let mut pattern = uri.clone();
            for (placeholder, class) in PATTERNS {
                pattern = pattern.replace(placeholder, class);
            }
            let compiled = Regex::new(&format!("^{}$", pattern)).map_err(|e| {
                Error::RouteNotFound(format!("Invalid route pattern [{}]: {}", uri, e))
            })?;
            Some(compiled)
        } else {
            None
        };

        debug!(method, uri = %uri, "Registering route");
        self.routes.push(Route {
            method: method.to_string(),
            uri,
            regex,
            target,
        });
        Ok(self)
    }

    fn prefixed(&self, uri: &str) -> String {
        let mut segments: Vec<&str> = self
            .prefix
            .iter()
            .map(String::as_str)
            .filter(|s| !s.is_empty())
            .collect();
        let trimmed = uri.trim_matches('/');
        if !trimmed.is_empty() {
            segments.push(trimmed);
        }
        if segments.is_empty() {
            "/".to_string()
        } else {
            segments.join("/")
        }
    }

    /// Match the request and run its target, resolving controller
    /// services through the container.
    pub fn dispatch(&self, container: &Container, request: &Request) -> Result<String> {
        let path = normalize(&request.path);
        trace!(method = %request.method, path = %path, "Dispatching");

        let mut uri_matched = false;

        // Literal routes first.
        for route in self.routes.iter().filter(|r| r.regex.is_none()) {
            if route.uri == path {
                if route.method == request.method {
                    return self.run(container, &route.target, Vec::new());
                }
                uri_matched = true;
            }
        }

        // Then the placeholder scan; captures become target params.
        for route in &self.routes {
            if let Some(regex) = &route.regex {
                if let Some(captures) = regex.captures(&path) {
                    if route.method == request.method {
                        let params = captures
                            .iter()
                            .skip(1)
                            .flatten()
                            .map(|m| m.as_str().to_string())
                            .collect();
                        return self.run(container, &route.target, params);
                    }
                    uri_matched = true;
                }
            }
        }

        if uri_matched {
            return Err(Error::MethodNotAllowed(format!(
                "{} {}",
                request.method, request.path
            )));
        }

        if let Some(handler) = &self.error_handler {
            return handler(Vec::new());
        }

        Err(Error::RouteNotFound(request.path.clone()))
    }

    fn run(&self, container: &Container, target: &RouteTarget, params: Vec<String>) -> Result<String> {
        match target {
            RouteTarget::Handler(handler) => handler(params),
            RouteTarget::Action { service, action } => {
                let ctl = container.resolve::<Arc<dyn Controller>>(service)?;
                ctl.call(action, params)
            }
        }
    }
}

fn normalize(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}
