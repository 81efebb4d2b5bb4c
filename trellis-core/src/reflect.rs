// Constructor metadata registry: the static stand-in for runtime reflection.
//
// Each constructible type declares its ordered parameter list (name, type
// hint, optional default) and a constructor callback up front; the container
// consumes this table where a dynamic runtime would introspect signatures.

use crate::container::{Container, Instance, instance};
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Declared type of a constructor parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeHint {
    /// The parameter expects an instance resolvable under the given id.
    Class(String),
    /// Primitive/scalar parameter with no class type.
    Untyped,
}

/// One declared constructor parameter.
#[derive(Clone)]
pub struct ParamSpec {
    name: String,
    hint: TypeHint,
    default: Option<Instance>,
}

impl ParamSpec {
    /// A class-typed parameter resolved through the container.
    pub fn class(name: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hint: TypeHint::Class(class.into()),
            default: None,
        }
    }

    /// A scalar parameter with no class type.
    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hint: TypeHint::Untyped,
            default: None,
        }
    }

    /// Attach a declared default value.
    pub fn with_default<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        self.default = Some(instance(value));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hint(&self) -> &TypeHint {
        &self.hint
    }

    pub fn default(&self) -> Option<&Instance> {
        self.default.as_ref()
    }
}

impl fmt::Debug for ParamSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamSpec")
            .field("name", &self.name)
            .field("hint", &self.hint)
            .field("has_default", &self.default.is_some())
            .finish()
    }
}

/// Resolved constructor arguments, in declaration order.
pub struct ConstructorArgs {
    type_name: String,
    args: Vec<Instance>,
}

impl ConstructorArgs {
    pub(crate) fn new(type_name: &str, args: Vec<Instance>) -> Self {
        Self {
            type_name: type_name.to_string(),
            args,
        }
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Downcast the argument at `index` to a shared handle.
    pub fn get<T: Send + Sync + 'static>(&self, index: usize) -> Result<Arc<T>> {
        let arg = self.args.get(index).ok_or_else(|| {
            Error::BindingResolution(format!(
                "Constructor of [{}] expected an argument at position {}",
                self.type_name, index
            ))
        })?;
        arg.clone().downcast::<T>().map_err(|_| {
            Error::BindingResolution(format!(
                "Constructor argument {} of [{}] is not a {}",
                index,
                self.type_name,
                std::any::type_name::<T>()
            ))
        })
    }

    /// Downcast and clone the argument at `index` into an owned value.
    pub fn value<T: Clone + Send + Sync + 'static>(&self, index: usize) -> Result<T> {
        Ok(self.get::<T>(index)?.as_ref().clone())
    }
}

type Constructor = Arc<dyn Fn(&Container, ConstructorArgs) -> Result<Instance> + Send + Sync>;

/// Registered constructor signature for a concrete type.
#[derive(Clone)]
pub struct TypeMetadata {
    name: String,
    params: Vec<ParamSpec>,
    constructor: Constructor,
}

impl TypeMetadata {
    /// Start describing a type.
    pub fn of(name: impl Into<String>) -> TypeMetadataBuilder {
        TypeMetadataBuilder {
            name: name.into(),
            params: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub(crate) fn construct(&self, container: &Container, args: Vec<Instance>) -> Result<Instance> {
        (self.constructor)(container, ConstructorArgs::new(&self.name, args))
    }
}

impl fmt::Debug for TypeMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeMetadata")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}

/// Builder for [`TypeMetadata`].
pub struct TypeMetadataBuilder {
    name: String,
    params: Vec<ParamSpec>,
}

impl TypeMetadataBuilder {
    /// Append a declared parameter. Declaration order is resolution order.
    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Finish with a constructor receiving resolved arguments.
    pub fn constructs<F>(self, constructor: F) -> TypeMetadata
    where
        F: Fn(&Container, ConstructorArgs) -> Result<Instance> + Send + Sync + 'static,
    {
        TypeMetadata {
            name: self.name,
            params: self.params,
            constructor: Arc::new(constructor),
        }
    }

    /// Finish a parameterless type with a plain value factory.
    pub fn constructs_value<T, F>(self, factory: F) -> TypeMetadata
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.constructs(move |_, _| Ok(instance(factory())))
    }
}

/// Table of registered type metadata, keyed by type name.
#[derive(Default)]
pub(crate) struct TypeRegistry {
    types: HashMap<String, Arc<TypeMetadata>>,
}

impl TypeRegistry {
    pub(crate) fn insert(&mut self, metadata: TypeMetadata) {
        self.types.insert(metadata.name.clone(), Arc::new(metadata));
    }

    pub(crate) fn get(&self, name: &str) -> Option<Arc<TypeMetadata>> {
        self.types.get(name).cloned()
    }
}
