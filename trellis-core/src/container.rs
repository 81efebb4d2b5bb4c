// Service container with metadata-driven automatic dependency resolution.
//
// Bindings map string ids to factories; `make` walks contextual overrides,
// the binding registry, and the type-metadata table to produce instances,
// recursively resolving declared constructor dependencies.

use crate::error::{Error, Result};
use crate::logging::{debug, trace};
use crate::reflect::{ParamSpec, TypeHint, TypeMetadata, TypeRegistry};
use parking_lot::RwLock;
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// A resolved service instance.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Wrap a value as a container instance.
pub fn instance<T: Send + Sync + 'static>(value: T) -> Instance {
    Arc::new(value)
}

/// Factory signature for callable bindings.
pub type Factory = Arc<dyn Fn(&Container, &Params) -> Result<Instance> + Send + Sync>;

type ContextualFactory = Arc<dyn Fn(&Container) -> Result<Instance> + Send + Sync>;

/// Explicit constructor parameters supplied to `make_with`/`build_with`.
///
/// Positional values are re-keyed by declared parameter name before
/// resolution, so explicit overrides bind correctly regardless of
/// caller-supplied ordering.
#[derive(Clone, Default)]
pub struct Params {
    named: HashMap<String, Instance>,
    positional: Vec<Instance>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Supply a value for the named parameter.
    pub fn with<T: Send + Sync + 'static>(self, name: impl Into<String>, value: T) -> Self {
        self.with_instance(name, instance(value))
    }

    /// Supply an already-wrapped instance for the named parameter.
    pub fn with_instance(mut self, name: impl Into<String>, value: Instance) -> Self {
        self.named.insert(name.into(), value);
        self
    }

    /// Supply a value positionally; it is re-keyed by declaration order.
    pub fn positional<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        self.positional.push(instance(value));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.named.is_empty() && self.positional.is_empty()
    }

    fn get(&self, name: &str) -> Option<&Instance> {
        self.named.get(name)
    }

    /// Fold positional values into the named map by declaration order.
    fn keyed_by(&self, specs: &[ParamSpec]) -> Params {
        let mut named = self.named.clone();
        for (index, value) in self.positional.iter().enumerate() {
            if let Some(spec) = specs.get(index) {
                named.insert(spec.name().to_string(), value.clone());
            }
        }
        Params {
            named,
            positional: Vec::new(),
        }
    }
}

impl fmt::Debug for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Params")
            .field("named", &self.named.keys().collect::<Vec<_>>())
            .field("positional", &self.positional.len())
            .finish()
    }
}

/// Concrete target of a binding.
#[derive(Clone)]
pub enum Concrete {
    /// A type name, built through the metadata registry (or another
    /// binding when it names a different abstract).
    Type(String),
    /// A factory invoked with the container and explicit parameters.
    Factory(Factory),
}

impl fmt::Debug for Concrete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Concrete::Type(name) => write!(f, "Concrete::Type({:?})", name),
            Concrete::Factory(_) => write!(f, "Concrete::Factory"),
        }
    }
}

struct Binding {
    concrete: Concrete,
    shared: bool,
}

/// Override target for a contextual binding.
#[derive(Clone)]
pub enum ContextualTarget {
    Type(String),
    Value(Instance),
    Factory(ContextualFactory),
}

#[derive(Default)]
struct ContainerInner {
    bindings: RwLock<HashMap<String, Binding>>,
    instances: RwLock<HashMap<String, Instance>>,
    resolved: RwLock<HashSet<String>>,
    aliases: RwLock<HashMap<String, String>>,
    // consumer id -> dependency id -> override
    contextual: RwLock<HashMap<String, HashMap<String, ContextualTarget>>>,
    build_stack: RwLock<Vec<String>>,
    // Abstract ids currently in flight in `make`; a repeat is a cycle.
    resolving: RwLock<HashSet<String>>,
    types: RwLock<TypeRegistry>,
}

/// The service container.
///
/// Clones share state. A single container instance assumes exclusive,
/// single-caller use for the duration of any `make`/`build` call: the
/// build stack and in-flight set are per-container, not per-thread.
#[derive(Clone, Default)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

impl Container {
    pub fn new() -> Self {
        debug!("Creating new service container");
        Self::default()
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Register constructor metadata for a concrete type.
    pub fn describe(&self, metadata: TypeMetadata) {
        trace!(type_name = metadata.name(), "Registering type metadata");
        self.inner.types.write().insert(metadata);
    }

    /// Register a binding. `None` means "build the abstract id itself";
    /// a different id is an alias resolved through `make`.
    pub fn bind(&self, abstract_id: &str, concrete: Option<&str>) {
        self.bind_shared(abstract_id, concrete, false);
    }

    /// Register a shared (singleton) binding.
    pub fn singleton(&self, abstract_id: &str, concrete: Option<&str>) {
        self.bind_shared(abstract_id, concrete, true);
    }

    /// Register a factory binding.
    pub fn bind_factory<F>(&self, abstract_id: &str, factory: F)
    where
        F: Fn(&Container, &Params) -> Result<Instance> + Send + Sync + 'static,
    {
        self.insert_binding(abstract_id, Concrete::Factory(Arc::new(factory)), false);
    }

    /// Register a shared factory binding.
    pub fn singleton_factory<F>(&self, abstract_id: &str, factory: F)
    where
        F: Fn(&Container, &Params) -> Result<Instance> + Send + Sync + 'static,
    {
        self.insert_binding(abstract_id, Concrete::Factory(Arc::new(factory)), true);
    }

    fn bind_shared(&self, abstract_id: &str, concrete: Option<&str>, shared: bool) {
        let concrete = concrete.unwrap_or(abstract_id);
        let factory = Self::closure_for(abstract_id, concrete);
        self.insert_binding(abstract_id, Concrete::Factory(factory), shared);
    }

    fn insert_binding(&self, abstract_id: &str, concrete: Concrete, shared: bool) {
        debug!(abstract_id, shared, "Registering binding");
        self.inner
            .bindings
            .write()
            .insert(abstract_id.to_string(), Binding { concrete, shared });
    }

    // Wraps a non-factory concrete: build directly when it names the
    // abstract itself, otherwise recurse through `make` (alias chain).
    fn closure_for(abstract_id: &str, concrete: &str) -> Factory {
        let abstract_id = abstract_id.to_string();
        let concrete = concrete.to_string();
        Arc::new(move |container, params| {
            if abstract_id == concrete {
                container.build_inner(&concrete, params)
            } else {
                container.make_inner(&concrete, params)
            }
        })
    }

    /// Register an alias consulted at the top of `make`.
    pub fn alias(&self, alias: &str, abstract_id: &str) {
        self.inner
            .aliases
            .write()
            .insert(alias.to_string(), abstract_id.to_string());
    }

    /// Start a contextual binding: "when building `consumer`...".
    pub fn when(&self, consumer: &str) -> ContextualBuilder<'_> {
        ContextualBuilder {
            container: self,
            consumer: consumer.to_string(),
            dependency: None,
        }
    }

    fn add_contextual(&self, consumer: &str, dependency: &str, target: ContextualTarget) {
        self.inner
            .contextual
            .write()
            .entry(consumer.to_string())
            .or_default()
            .insert(dependency.to_string(), target);
    }

    // ------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------

    /// Resolve the given abstract id.
    pub fn make(&self, abstract_id: &str) -> Result<Instance> {
        self.make_inner(abstract_id, &Params::new())
    }

    /// Resolve with explicit constructor parameters.
    pub fn make_with(&self, abstract_id: &str, params: Params) -> Result<Instance> {
        self.make_inner(abstract_id, &params)
    }

    /// Resolve and downcast to a concrete type.
    pub fn resolve<T: Send + Sync + 'static>(&self, abstract_id: &str) -> Result<Arc<T>> {
        self.make(abstract_id)?.downcast::<T>().map_err(|_| {
            Error::BindingResolution(format!(
                "Resolved instance for [{}] is not a {}",
                abstract_id,
                std::any::type_name::<T>()
            ))
        })
    }

    fn make_inner(&self, abstract_id: &str, params: &Params) -> Result<Instance> {
        let abstract_id = self.alias_of(abstract_id);

        if let Some(existing) = self.inner.instances.read().get(&abstract_id) {
            trace!(abstract_id = %abstract_id, "Returning cached shared instance");
            return Ok(existing.clone());
        }

        let _in_flight = ResolvingGuard::enter(self, &abstract_id)?;

        let concrete = self.concrete_of(&abstract_id);
        trace!(abstract_id = %abstract_id, concrete = ?concrete, "Resolving");

        let object = if Self::is_buildable(&concrete, &abstract_id) {
            self.build_concrete(&concrete, params)?
        } else {
            match concrete {
                Concrete::Type(target) => self.make_inner(&target, params)?,
                Concrete::Factory(_) => unreachable!("factories are always buildable"),
            }
        };

        if self.is_shared(&abstract_id) {
            self.inner
                .instances
                .write()
                .insert(abstract_id.clone(), object.clone());
        }

        self.inner.resolved.write().insert(abstract_id.clone());
        debug!(abstract_id = %abstract_id, "Resolved");

        Ok(object)
    }

    /// Build a concrete type directly, bypassing bindings.
    pub fn build(&self, concrete: &str) -> Result<Instance> {
        self.build_inner(concrete, &Params::new())
    }

    /// Build with explicit constructor parameters.
    pub fn build_with(&self, concrete: &str, params: Params) -> Result<Instance> {
        self.build_inner(concrete, &params)
    }

    fn build_concrete(&self, concrete: &Concrete, params: &Params) -> Result<Instance> {
        match concrete {
            Concrete::Factory(factory) => factory(self, params),
            Concrete::Type(name) => self.build_inner(name, params),
        }
    }

    fn build_inner(&self, concrete: &str, params: &Params) -> Result<Instance> {
        let metadata = self.inner.types.read().get(concrete).ok_or_else(|| {
            Error::BindingResolution(format!(
                "Target type [{}] has no registered constructor metadata",
                concrete
            ))
        })?;

        if metadata.params().is_empty() {
            // No declared dependencies: instantiate right away without
            // touching the build stack.
            return metadata.construct(self, Vec::new());
        }

        let arguments = {
            // The stack frame only needs to cover dependency resolution;
            // the constructor itself must not observe it. Popped on every
            // exit path, including failures.
            let _frame = BuildGuard::push(self, concrete);
            let params = params.keyed_by(metadata.params());
            self.resolve_dependencies(&metadata, &params)?
        };

        metadata.construct(self, arguments)
    }

    fn resolve_dependencies(
        &self,
        metadata: &TypeMetadata,
        params: &Params,
    ) -> Result<Vec<Instance>> {
        let mut dependencies = Vec::with_capacity(metadata.params().len());

        for spec in metadata.params() {
            // Explicitly supplied values win, verbatim.
            if let Some(value) = params.get(spec.name()) {
                dependencies.push(value.clone());
                continue;
            }

            let value = match spec.hint() {
                TypeHint::Class(class) => self.resolve_class(spec, class)?,
                TypeHint::Untyped => self.resolve_scalar(metadata.name(), spec)?,
            };
            dependencies.push(value);
        }

        Ok(dependencies)
    }

    fn resolve_class(&self, spec: &ParamSpec, class: &str) -> Result<Instance> {
        match self.make(class) {
            Ok(value) => Ok(value),
            // Optional parameters fall back to their declared default.
            Err(e) if e.is_resolution_failure() => match spec.default() {
                Some(default) => Ok(default.clone()),
                None => Err(e),
            },
            Err(e) => Err(e),
        }
    }

    fn resolve_scalar(&self, declaring: &str, spec: &ParamSpec) -> Result<Instance> {
        // Scalars are contextually keyed by `$name`.
        if let Some(target) = self.contextual_of(&format!("${}", spec.name())) {
            return match target {
                ContextualTarget::Value(value) => Ok(value),
                ContextualTarget::Factory(factory) => factory(self),
                ContextualTarget::Type(name) => self.make(&name),
            };
        }

        if let Some(default) = spec.default() {
            return Ok(default.clone());
        }

        Err(Error::BindingResolution(format!(
            "Unresolvable dependency resolving [{}] in class [{}]",
            spec.name(),
            declaring
        )))
    }

    // Contextual override first, then the registry, then auto-resolution
    // of the id as a concrete type.
    fn concrete_of(&self, abstract_id: &str) -> Concrete {
        if let Some(target) = self.contextual_of(abstract_id) {
            return match target {
                ContextualTarget::Type(name) => Concrete::Type(name),
                ContextualTarget::Value(value) => {
                    Concrete::Factory(Arc::new(move |_, _| Ok(value.clone())))
                }
                ContextualTarget::Factory(factory) => {
                    Concrete::Factory(Arc::new(move |container, _| factory(container)))
                }
            };
        }

        match self.inner.bindings.read().get(abstract_id) {
            Some(binding) => binding.concrete.clone(),
            None => Concrete::Type(abstract_id.to_string()),
        }
    }

    // Overrides are scoped to the type currently on top of the build stack.
    fn contextual_of(&self, dependency: &str) -> Option<ContextualTarget> {
        let stack = self.inner.build_stack.read();
        let parent = stack.last()?;
        self.inner
            .contextual
            .read()
            .get(parent)?
            .get(dependency)
            .cloned()
    }

    fn is_buildable(concrete: &Concrete, abstract_id: &str) -> bool {
        match concrete {
            Concrete::Factory(_) => true,
            Concrete::Type(name) => name == abstract_id,
        }
    }

    fn alias_of(&self, abstract_id: &str) -> String {
        self.inner
            .aliases
            .read()
            .get(abstract_id)
            .cloned()
            .unwrap_or_else(|| abstract_id.to_string())
    }

    // ------------------------------------------------------------------
    // Map-style access
    // ------------------------------------------------------------------

    /// True if the id has a binding, cached instance, or alias.
    pub fn bound(&self, abstract_id: &str) -> bool {
        self.inner.bindings.read().contains_key(abstract_id)
            || self.inner.instances.read().contains_key(abstract_id)
            || self.inner.aliases.read().contains_key(abstract_id)
    }

    /// Alias for [`Container::make`], mirroring map-style `get`.
    pub fn get(&self, key: &str) -> Result<Instance> {
        self.make(key)
    }

    /// Bind a literal value; it is wrapped in a zero-argument factory so
    /// value and factory registrations stay uniform.
    pub fn set<T: Send + Sync + 'static>(&self, key: &str, value: T) {
        let value = instance(value);
        self.bind_factory(key, move |_, _| Ok(value.clone()));
    }

    /// Drop the binding, cached instance, and resolved flag for `key`.
    pub fn forget(&self, key: &str) {
        self.inner.bindings.write().remove(key);
        self.inner.instances.write().remove(key);
        self.inner.resolved.write().remove(key);
    }

    /// True if an instance is cached or the binding is marked shared.
    pub fn is_shared(&self, abstract_id: &str) -> bool {
        if self.inner.instances.read().contains_key(abstract_id) {
            return true;
        }
        self.inner
            .bindings
            .read()
            .get(abstract_id)
            .map(|binding| binding.shared)
            .unwrap_or(false)
    }

    /// True once the id has been resolved at least once.
    pub fn is_resolved(&self, abstract_id: &str) -> bool {
        self.inner.resolved.read().contains(abstract_id)
    }

    #[cfg(test)]
    pub(crate) fn build_stack_depth(&self) -> usize {
        self.inner.build_stack.read().len()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("bindings", &self.inner.bindings.read().len())
            .field("instances", &self.inner.instances.read().len())
            .finish()
    }
}

/// Fluent contextual binding: `when(consumer).needs(dep).give_*(...)`.
pub struct ContextualBuilder<'a> {
    container: &'a Container,
    consumer: String,
    dependency: Option<String>,
}

impl ContextualBuilder<'_> {
    /// Name the class-typed dependency being overridden.
    pub fn needs(mut self, dependency: &str) -> Self {
        self.dependency = Some(dependency.to_string());
        self
    }

    /// Name a scalar constructor parameter being overridden.
    pub fn needs_param(mut self, name: &str) -> Self {
        self.dependency = Some(format!("${}", name));
        self
    }

    /// Give a different type to build for this consumer.
    pub fn give_type(self, concrete: &str) {
        self.give(ContextualTarget::Type(concrete.to_string()));
    }

    /// Give a literal value.
    pub fn give_value<T: Send + Sync + 'static>(self, value: T) {
        self.give(ContextualTarget::Value(instance(value)));
    }

    /// Give a factory invoked with the container.
    pub fn give_factory<F>(self, factory: F)
    where
        F: Fn(&Container) -> Result<Instance> + Send + Sync + 'static,
    {
        self.give(ContextualTarget::Factory(Arc::new(factory)));
    }

    fn give(self, target: ContextualTarget) {
        let dependency = self
            .dependency
            .expect("contextual binding requires needs() before give()");
        self.container
            .add_contextual(&self.consumer, &dependency, target);
    }
}

// RAII frame on the build stack; popped on every exit path.
struct BuildGuard<'a> {
    container: &'a Container,
}

impl<'a> BuildGuard<'a> {
    fn push(container: &'a Container, concrete: &str) -> Self {
        container
            .inner
            .build_stack
            .write()
            .push(concrete.to_string());
        Self { container }
    }
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        self.container.inner.build_stack.write().pop();
    }
}

// Marks an abstract id as in flight for the duration of `make`; a repeat
// entry is a dependency cycle and fails fast.
struct ResolvingGuard<'a> {
    container: &'a Container,
    abstract_id: String,
}

impl<'a> ResolvingGuard<'a> {
    fn enter(container: &'a Container, abstract_id: &str) -> Result<Self> {
        if !container
            .inner
            .resolving
            .write()
            .insert(abstract_id.to_string())
        {
            return Err(Error::CircularDependency(abstract_id.to_string()));
        }
        Ok(Self {
            container,
            abstract_id: abstract_id.to_string(),
        })
    }
}

impl Drop for ResolvingGuard<'_> {
    fn drop(&mut self) {
        self.container.inner.resolving.write().remove(&self.abstract_id);
    }
}
