// Middleware pipeline: onion-style composition over the container.
//
// Pipes are folded right-to-left around a destination closure, so the
// first pipe is the outermost wrapper. Each stage receives the traveler
// and a continuation; not calling the continuation short-circuits the
// remainder of the chain.

use crate::container::{Container, Instance, instance};
use crate::error::{Error, Result};
use crate::logging::trace;
use std::sync::Arc;

/// Continuation invoked by a pipe to run the rest of the chain.
pub type Next<T, R> = Box<dyn FnOnce(T) -> Result<R>>;

/// One stage of a pipeline.
///
/// `args` carries the literal arguments from a `"name:arg1,arg2"` pipe
/// specification; it is empty for direct handler objects.
pub trait Pipe<T, R = T>: Send + Sync {
    fn handle(&self, traveler: T, next: Next<T, R>, args: &[String]) -> Result<R>;
}

impl<T, R, F> Pipe<T, R> for F
where
    F: Fn(T, Next<T, R>) -> Result<R> + Send + Sync,
{
    fn handle(&self, traveler: T, next: Next<T, R>, _args: &[String]) -> Result<R> {
        self(traveler, next)
    }
}

/// Parsed pipe specification.
pub enum PipeSpec<T, R = T> {
    /// A container id plus literal string arguments.
    Named { name: String, args: Vec<String> },
    /// A directly invocable handler.
    Handler(Arc<dyn Pipe<T, R>>),
}

impl<T, R> Clone for PipeSpec<T, R> {
    fn clone(&self) -> Self {
        match self {
            PipeSpec::Named { name, args } => PipeSpec::Named {
                name: name.clone(),
                args: args.clone(),
            },
            PipeSpec::Handler(pipe) => PipeSpec::Handler(Arc::clone(pipe)),
        }
    }
}

impl<T, R> PipeSpec<T, R> {
    /// Parse `"name"` or `"name:arg1,arg2"` into a structured descriptor.
    /// The textual form exists only at the configuration boundary.
    pub fn parse(spec: &str) -> Self {
        match spec.split_once(':') {
            Some((name, rest)) => PipeSpec::Named {
                name: name.to_string(),
                args: rest.split(',').map(str::to_string).collect(),
            },
            None => PipeSpec::Named {
                name: spec.to_string(),
                args: Vec::new(),
            },
        }
    }

    /// Wrap a handler object.
    pub fn handler(pipe: impl Pipe<T, R> + 'static) -> Self {
        PipeSpec::Handler(Arc::new(pipe))
    }
}

impl<T, R> From<&str> for PipeSpec<T, R> {
    fn from(spec: &str) -> Self {
        PipeSpec::parse(spec)
    }
}

impl<T, R> From<String> for PipeSpec<T, R> {
    fn from(spec: String) -> Self {
        PipeSpec::parse(&spec)
    }
}

/// Wrap a pipe so it can be bound in the container and resolved by name.
pub fn pipe_instance<T: 'static, R: 'static>(pipe: impl Pipe<T, R> + 'static) -> Instance {
    instance(Arc::new(pipe) as Arc<dyn Pipe<T, R>>)
}

/// Fluent pipeline over a traveler of type `T` producing an `R`.
pub struct Pipeline<T, R = T> {
    container: Container,
    traveler: Option<T>,
    pipes: Vec<PipeSpec<T, R>>,
    method: String,
}

impl<T: 'static, R: 'static> Pipeline<T, R> {
    pub fn new(container: Container) -> Self {
        Self {
            container,
            traveler: None,
            pipes: Vec::new(),
            method: "handle".to_string(),
        }
    }

    /// Set the payload threaded through the pipes.
    pub fn send(mut self, traveler: T) -> Self {
        self.traveler = Some(traveler);
        self
    }

    /// Set the ordered pipe list. The first pipe runs first and wraps
    /// everything after it.
    pub fn through<I, P>(mut self, pipes: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PipeSpec<T, R>>,
    {
        self.pipes = pipes.into_iter().map(Into::into).collect();
        self
    }

    /// Record the capability name invoked on each pipe. Dispatch always
    /// goes through [`Pipe::handle`]; the name is surfaced in trace logs.
    pub fn via(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Run the pipeline and return the destination's result.
    ///
    /// Named pipes are resolved through the container as the chain
    /// unwinds; a resolution failure propagates out of `then` with no
    /// partial retry.
    pub fn then<F>(self, destination: F) -> Result<R>
    where
        F: FnOnce(T) -> Result<R> + 'static,
    {
        let Pipeline {
            container,
            traveler,
            pipes,
            method,
        } = self;

        let traveler = traveler
            .ok_or_else(|| Error::Pipeline("no traveler was sent through the pipeline".into()))?;

        let mut stack: Next<T, R> = Box::new(destination);

        for spec in pipes.into_iter().rev() {
            let container = container.clone();
            let method = method.clone();
            let next = stack;

            stack = Box::new(move |traveler: T| match spec {
                PipeSpec::Handler(pipe) => pipe.handle(traveler, next, &[]),
                PipeSpec::Named { name, args } => {
                    trace!(pipe = %name, method = %method, "Resolving pipeline stage");
                    let pipe = container.resolve::<Arc<dyn Pipe<T, R>>>(&name)?;
                    pipe.handle(traveler, next, &args)
                }
            });
        }

        stack(traveler)
    }
}
