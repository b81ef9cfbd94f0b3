//! A small runtime object model for dynamically typed values.
//!
//! Three cooperating facilities:
//!
//! - **Typed wrappers**: values are cast into instances of types registered
//!   at runtime ([`Runtime::create`] / [`Runtime::cast`]). Casting is
//!   idempotent: a value that already is an instance of the target type (or
//!   a descendant) comes back unchanged, identity intact.
//! - **Singleton registries**: [`Runtime::instance`] returns the per-type
//!   unnamed singleton, or a named singleton keyed by its first argument,
//!   each constructed at most once through the type's factory.
//! - **Callable references**: [`CallableRef`] normalizes free functions,
//!   static methods, bound instance methods and invokable values into one
//!   invocation primitive, validating shape at construction and
//!   invocability fresh at every call.
//!
//! The model is single-threaded and synchronous: instances are `Rc`-shared
//! and all operations return or fail immediately. Embedders running under
//! threads must serialize access themselves.
//!
//! ```
//! use tyro::{Runtime, Value};
//!
//! let mut rt = Runtime::new();
//! let list = rt.cast("collection", Value::from(vec![Value::from(1), Value::from(2)])).unwrap();
//! let same = rt.cast("collection", list.clone()).unwrap();
//! assert!(list.is(&same));
//! ```

use std::fmt::Write;
use std::rc::Rc;

use ahash::AHashMap;

mod args;
mod callable;
mod collection;
mod exceptions;
mod registry;
mod singleton;
mod text;
mod value;

pub use callable::{CallableRef, Target};
pub use exceptions::{Error, ErrorKind, ObjectResult};
pub use registry::{Factory, MethodFn, StaticFn, TypeId, TypeSpec};
pub use value::{Instance, InstanceRef, Map, Value};

use exceptions::{err_fmt, raise_fmt};
use registry::TypeRegistry;
use singleton::SingletonStore;

/// A free function registered in the runtime's function table.
pub type NativeFn = fn(&mut Runtime, Vec<Value>) -> ObjectResult<Value>;

/// The object model's process-wide state: the type table, the free-function
/// table and the singleton store.
///
/// All polymorphic dispatch goes through here: types are looked up by name
/// at runtime, construction goes through registered factory function
/// pointers, and ancestry is an explicit parent-link table populated at
/// registration time.
pub struct Runtime {
    registry: TypeRegistry,
    functions: AHashMap<String, NativeFn>,
    singletons: SingletonStore,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    /// Creates a runtime with the root `object` type and the built-in
    /// `collection` and `text` wrapper types registered.
    #[must_use]
    pub fn new() -> Self {
        let mut rt = Self {
            registry: TypeRegistry::new(),
            functions: AHashMap::new(),
            singletons: SingletonStore::new(),
        };
        collection::register(&mut rt).expect("a fresh type table accepts the built-in types");
        text::register(&mut rt).expect("a fresh type table accepts the built-in types");
        rt
    }

    // ------------------------------------------------------------------
    // registration
    // ------------------------------------------------------------------

    /// Registers a new type; errors on a duplicate name or unknown parent.
    pub fn register_type(&mut self, spec: TypeSpec) -> ObjectResult<TypeId> {
        self.registry.register(spec)
    }

    /// Registers (or replaces) a free function.
    pub fn register_function(&mut self, name: &str, function: NativeFn) {
        tracing::debug!(name, "registered function");
        self.functions.insert(name.to_string(), function);
    }

    #[must_use]
    pub fn type_id(&self, name: &str) -> Option<TypeId> {
        self.registry.id_of(name)
    }

    #[must_use]
    pub fn type_name(&self, ty: TypeId) -> &str {
        self.registry.name_of(ty)
    }

    pub(crate) fn factory_of(&self, ty: TypeId) -> Factory {
        self.registry.factory_of(ty)
    }

    pub(crate) fn has_member(&self, ty: TypeId, name: &str) -> bool {
        self.registry.has_member(ty, name)
    }

    // ------------------------------------------------------------------
    // instantiation and casting
    // ------------------------------------------------------------------

    /// Constructs a fresh instance of the named type, forwarding all
    /// arguments to its factory. Never cached.
    pub fn create(&mut self, type_name: &str, args: Vec<Value>) -> ObjectResult<Value> {
        let ty = self.registry.require(type_name)?;
        self.create_of(ty, args)
    }

    /// [`create`](Self::create) by type id; used wherever the concrete type
    /// is only known at runtime (late-bound construction).
    pub fn create_of(&mut self, ty: TypeId, args: Vec<Value>) -> ObjectResult<Value> {
        let factory = self.registry.factory_of(ty);
        factory(self, ty, args)
    }

    /// Idempotent coercion into the named type.
    ///
    /// A value that already is an instance of the type or one of its
    /// descendants is returned unchanged (same `Rc`, no copy); anything else
    /// is passed to the factory as the sole argument. Factory failures
    /// propagate unchanged.
    pub fn cast(&mut self, type_name: &str, value: Value) -> ObjectResult<Value> {
        let ty = self.registry.require(type_name)?;
        self.cast_of(ty, value)
    }

    /// [`cast`](Self::cast) by type id.
    pub fn cast_of(&mut self, ty: TypeId, value: Value) -> ObjectResult<Value> {
        if let Value::Instance(inst) = &value {
            if self.registry.is_instance_of(inst.ty(), ty) {
                return Ok(value);
            }
        }
        self.create_of(ty, vec![value])
    }

    // ------------------------------------------------------------------
    // singletons
    // ------------------------------------------------------------------

    /// Singleton accessor, mode selected by arity.
    ///
    /// With no arguments, returns the type's unnamed singleton, lazily
    /// constructed once with no factory arguments. With arguments, the first
    /// is the singleton name: a cached entry is returned as-is, otherwise a
    /// new instance is constructed through a callable reference to the
    /// type's `factory` static (with `[name]` when no further arguments
    /// were supplied, or with the remaining arguments, name discarded,
    /// otherwise) and cached under that name.
    pub fn instance(&mut self, type_name: &str, args: Vec<Value>) -> ObjectResult<Value> {
        let ty = self.registry.require(type_name)?;
        self.instance_of(ty, args)
    }

    /// [`instance`](Self::instance) by type id.
    pub fn instance_of(&mut self, ty: TypeId, mut args: Vec<Value>) -> ObjectResult<Value> {
        if args.is_empty() {
            if let Some(cached) = self.singletons.get(ty, None) {
                return Ok(cached);
            }
            let value = self.create_of(ty, Vec::new())?;
            self.singletons.insert(ty, None, value.clone());
            tracing::debug!(ty = self.registry.name_of(ty), "constructed unnamed singleton");
            return Ok(value);
        }

        let name_value = args.remove(0);
        let Some(key) = name_value.as_key() else {
            raise_fmt!(ErrorKind::TypeError;
                "singleton name must be a str or int, got '{}'", name_value.type_str());
        };
        if let Some(cached) = self.singletons.get(ty, Some(&key)) {
            return Ok(cached);
        }

        // Construction goes through a callable pair [type, "factory"] so the
        // late-bound factory static performs the dispatch.
        let type_name = self.registry.name_of(ty).to_string();
        let factory = CallableRef::from_pair(&[Value::from(type_name), Value::from("factory")])?;
        let ctor_args = if args.is_empty() { vec![name_value] } else { args };
        let value = factory.apply(self, Some(ctor_args))?;

        tracing::debug!(ty = self.registry.name_of(ty), name = %key, "constructed named singleton");
        self.singletons.insert(ty, Some(key), value.clone());
        Ok(value)
    }

    /// Number of cached singletons across all types.
    #[must_use]
    pub fn singleton_count(&self) -> usize {
        self.singletons.len()
    }

    /// Drops every cached singleton so tests can start clean.
    pub fn reset_singletons(&mut self) {
        self.singletons.reset();
    }

    // ------------------------------------------------------------------
    // introspection
    // ------------------------------------------------------------------

    /// Whether a type with the given name exists and strictly descends from
    /// the named base type. Unknown names on either side are `false`.
    #[must_use]
    pub fn is_child(&self, type_name: &str, name: &str) -> bool {
        match self.registry.id_of(type_name) {
            Some(ty) => self.registry.is_child(ty, name),
            None => false,
        }
    }

    /// Whether the instance exposes a callable member of that name, own or
    /// inherited, instance or static.
    #[must_use]
    pub fn has_method(&self, receiver: &InstanceRef, name: &str) -> bool {
        self.registry.has_member(receiver.ty(), name)
    }

    /// A callable reference bound to `(receiver, name)` for deferred
    /// invocation.
    #[must_use]
    pub fn callback(&self, receiver: &InstanceRef, name: &str) -> CallableRef {
        CallableRef::bound(receiver, name)
    }

    /// Equality between two values.
    ///
    /// When the left side is an instance whose type defines an `equals`
    /// method, that method decides (invoked with the right side as the sole
    /// argument, result taken by truthiness). The default for instances is
    /// same type plus structurally equal payloads; non-instances compare
    /// structurally.
    pub fn equals(&mut self, left: &Value, right: &Value) -> ObjectResult<bool> {
        if let Value::Instance(receiver) = left {
            if let Some(method) = self.registry.find_method(receiver.ty(), "equals") {
                let outcome = method(self, receiver, vec![right.clone()])?;
                return Ok(outcome.truthy());
            }
            if let Value::Instance(other) = right {
                return Ok(receiver.ty() == other.ty()
                    && receiver.payload().value_eq(&other.payload()));
            }
            return Ok(false);
        }
        Ok(left.value_eq(right))
    }

    /// Debug dump of an instance: type, ancestry, payload.
    ///
    /// With `return_output` the text is returned; otherwise it is written to
    /// stderr and `None` comes back.
    #[must_use]
    pub fn dump(&self, receiver: &InstanceRef, return_output: bool) -> Option<String> {
        let ty = receiver.ty();
        let ancestors: Vec<&str> = self
            .registry
            .ancestors(ty)
            .iter()
            .map(|parent| self.registry.name_of(*parent))
            .collect();
        let mut out = String::new();
        let _ = writeln!(
            out,
            "instance of '{}' at {:p}",
            self.registry.name_of(ty),
            Rc::as_ptr(receiver)
        );
        let _ = writeln!(out, "  ancestors: [{}]", ancestors.join(", "));
        let _ = writeln!(out, "  payload: {}", receiver.payload().repr());
        if return_output {
            Some(out)
        } else {
            eprint!("{out}");
            None
        }
    }

    // ------------------------------------------------------------------
    // invocation
    // ------------------------------------------------------------------

    /// Calls a registered free function by name.
    pub fn call_function(&mut self, name: &str, args: Vec<Value>) -> ObjectResult<Value> {
        let Some(function) = self.functions.get(name).copied() else {
            raise_fmt!(ErrorKind::NotCallable; "function '{name}' is not defined");
        };
        function(self, args)
    }

    /// Calls a method on an instance, falling back to a static of the same
    /// name on the instance's type.
    pub fn call_method(
        &mut self,
        receiver: &InstanceRef,
        name: &str,
        args: Vec<Value>,
    ) -> ObjectResult<Value> {
        if let Some(method) = self.registry.find_method(receiver.ty(), name) {
            return method(self, receiver, args);
        }
        if let Some(method) = self.registry.find_static(receiver.ty(), name) {
            return method(self, receiver.ty(), args);
        }
        raise_fmt!(ErrorKind::NotCallable;
            "'{}' instance has no method '{name}'", self.registry.name_of(receiver.ty()));
    }

    /// Calls a static method on a type by name.
    pub fn call_static(&mut self, type_name: &str, name: &str, args: Vec<Value>) -> ObjectResult<Value> {
        let ty = self.registry.require(type_name)?;
        let Some(method) = self.registry.find_static(ty, name) else {
            raise_fmt!(ErrorKind::NotCallable; "type '{type_name}' has no static method '{name}'");
        };
        method(self, ty, args)
    }

    /// Whether a resolved target can be invoked right now.
    pub(crate) fn target_callable(&self, target: &Target) -> bool {
        match target {
            Target::Function(name) => self.functions.contains_key(name),
            Target::Static { type_name, method } => self
                .registry
                .id_of(type_name)
                .is_some_and(|ty| self.registry.find_static(ty, method).is_some()),
            Target::Method { receiver, method } => self.registry.has_member(receiver.ty(), method),
            Target::Value(value) => value
                .as_instance()
                .is_some_and(|inst| self.registry.find_method(inst.ty(), "invoke").is_some()),
        }
    }

    /// Dispatches a resolved target with the given arguments.
    pub(crate) fn invoke_target(&mut self, target: &Target, args: Vec<Value>) -> ObjectResult<Value> {
        match target {
            Target::Function(name) => self.call_function(name, args),
            Target::Static { type_name, method } => self.call_static(type_name, method, args),
            Target::Method { receiver, method } => self.call_method(receiver, method, args),
            Target::Value(value) => match value.as_instance() {
                Some(receiver) => {
                    let method = self
                        .registry
                        .find_method(receiver.ty(), "invoke")
                        .ok_or_else(|| err_fmt!(ErrorKind::NotCallable;
                            "'{}' instance is not invokable", self.registry.name_of(receiver.ty())))?;
                    method(self, receiver, args)
                }
                None => raise_fmt!(ErrorKind::NotCallable;
                    "'{}' value is not invokable", value.type_str()),
            },
        }
    }
}
