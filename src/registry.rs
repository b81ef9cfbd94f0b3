use ahash::AHashMap;
use smallvec::SmallVec;

use crate::exceptions::{err_fmt, raise_fmt, raise_static, ErrorKind, ObjectResult};
use crate::value::{InstanceRef, Value};
use crate::Runtime;

/// Index of a registered type in the type table.
pub type TypeId = usize;

/// Constructor capability of a registered type.
///
/// Receives the runtime, the type the call was made through (so a factory
/// registered on a parent still constructs the subtype it was invoked on),
/// and the constructor arguments.
pub type Factory = fn(&mut Runtime, TypeId, Vec<Value>) -> ObjectResult<Value>;

/// Bound method on a wrapper instance.
pub type MethodFn = fn(&mut Runtime, &InstanceRef, Vec<Value>) -> ObjectResult<Value>;

/// Static method on a registered type; the `TypeId` is the type the call was
/// dispatched through.
pub type StaticFn = fn(&mut Runtime, TypeId, Vec<Value>) -> ObjectResult<Value>;

/// The root of every ancestor chain.
pub(crate) const ROOT: TypeId = 0;

/// Declarative description of a type to register: name, optional parent
/// (defaults to the root `object` type), factory, and member tables.
pub struct TypeSpec {
    name: String,
    parent: Option<String>,
    factory: Factory,
    methods: Vec<(String, MethodFn)>,
    statics: Vec<(String, StaticFn)>,
}

impl TypeSpec {
    #[must_use]
    pub fn new(name: &str, factory: Factory) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            factory,
            methods: Vec::new(),
            statics: Vec::new(),
        }
    }

    /// Names the parent type; unset means the root `object` type.
    #[must_use]
    pub fn parent(mut self, name: &str) -> Self {
        self.parent = Some(name.to_string());
        self
    }

    #[must_use]
    pub fn with_method(mut self, name: &str, method: MethodFn) -> Self {
        self.methods.push((name.to_string(), method));
        self
    }

    #[must_use]
    pub fn with_static(mut self, name: &str, method: StaticFn) -> Self {
        self.statics.push((name.to_string(), method));
        self
    }
}

struct TypeDesc {
    name: String,
    parent: Option<TypeId>,
    factory: Factory,
    methods: AHashMap<String, MethodFn>,
    statics: AHashMap<String, StaticFn>,
}

/// The process-wide type table: every registered type with its parent link,
/// factory and member tables. Ancestry and member lookup walk the parent
/// chain, so subtypes inherit methods and statics.
pub(crate) struct TypeRegistry {
    types: Vec<TypeDesc>,
    index: AHashMap<String, TypeId>,
}

/// Root factory: the base type is abstract.
fn object_factory(_rt: &mut Runtime, _ty: TypeId, _args: Vec<Value>) -> ObjectResult<Value> {
    raise_static!(ErrorKind::TypeError; "type 'object' is abstract and cannot be instantiated")
}

/// Late-bound `factory` static: dispatches to the factory of whichever type
/// the call was made through. Registered once on the root and inherited by
/// every type, which is what lets a callable pair `[name, "factory"]`
/// construct any subtype.
fn dispatch_factory(rt: &mut Runtime, ty: TypeId, args: Vec<Value>) -> ObjectResult<Value> {
    let factory = rt.factory_of(ty);
    factory(rt, ty, args)
}

impl TypeRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            types: Vec::new(),
            index: AHashMap::new(),
        };
        let root = registry
            .register(TypeSpec::new("object", object_factory).with_static("factory", dispatch_factory))
            .expect("registering the root type cannot fail on an empty table");
        debug_assert_eq!(root, ROOT);
        registry
    }

    pub fn register(&mut self, spec: TypeSpec) -> ObjectResult<TypeId> {
        if self.index.contains_key(&spec.name) {
            raise_fmt!(ErrorKind::TypeError; "type '{}' is already registered", spec.name);
        }
        let parent = match &spec.parent {
            Some(name) => Some(self.require(name)?),
            None if self.types.is_empty() => None,
            None => Some(ROOT),
        };
        let ty = self.types.len();
        self.types.push(TypeDesc {
            name: spec.name.clone(),
            parent,
            factory: spec.factory,
            methods: spec.methods.into_iter().collect(),
            statics: spec.statics.into_iter().collect(),
        });
        self.index.insert(spec.name.clone(), ty);
        tracing::debug!(name = %spec.name, ty, "registered type");
        Ok(ty)
    }

    pub fn id_of(&self, name: &str) -> Option<TypeId> {
        self.index.get(name).copied()
    }

    pub fn require(&self, name: &str) -> ObjectResult<TypeId> {
        self.id_of(name)
            .ok_or_else(|| err_fmt!(ErrorKind::UnknownType; "type '{name}' is not registered"))
    }

    pub fn name_of(&self, ty: TypeId) -> &str {
        &self.types[ty].name
    }

    pub fn factory_of(&self, ty: TypeId) -> Factory {
        self.types[ty].factory
    }

    /// Strict ancestor chain, nearest parent first. The receiver itself is
    /// not included.
    pub fn ancestors(&self, ty: TypeId) -> SmallVec<[TypeId; 4]> {
        let mut chain = SmallVec::new();
        let mut current = self.types[ty].parent;
        while let Some(parent) = current {
            chain.push(parent);
            current = self.types[parent].parent;
        }
        chain
    }

    /// Whether `ty` is `of` or one of its descendants.
    pub fn is_instance_of(&self, ty: TypeId, of: TypeId) -> bool {
        ty == of || self.ancestors(ty).contains(&of)
    }

    /// Whether the type named `name` exists and strictly descends from `ty`.
    /// Absence of the name is `false`, never an error.
    pub fn is_child(&self, ty: TypeId, name: &str) -> bool {
        match self.id_of(name) {
            Some(child) => self.ancestors(child).contains(&ty),
            None => false,
        }
    }

    /// Looks up an instance method on the type or any ancestor.
    pub fn find_method(&self, ty: TypeId, name: &str) -> Option<MethodFn> {
        if let Some(method) = self.types[ty].methods.get(name) {
            return Some(*method);
        }
        self.ancestors(ty)
            .iter()
            .find_map(|parent| self.types[*parent].methods.get(name).copied())
    }

    /// Looks up a static method on the type or any ancestor.
    pub fn find_static(&self, ty: TypeId, name: &str) -> Option<StaticFn> {
        if let Some(method) = self.types[ty].statics.get(name) {
            return Some(*method);
        }
        self.ancestors(ty)
            .iter()
            .find_map(|parent| self.types[*parent].statics.get(name).copied())
    }

    /// Whether the type exposes a callable member of this name, instance or
    /// static, own or inherited.
    pub fn has_member(&self, ty: TypeId, name: &str) -> bool {
        self.find_method(ty, name).is_some() || self.find_static(ty, name).is_some()
    }
}
