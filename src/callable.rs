use std::fmt;

use crate::exceptions::{raise_fmt, raise_static, ErrorKind, ObjectResult};
use crate::value::{InstanceRef, Value};
use crate::Runtime;

/// Normalized invocation target of a [`CallableRef`], one variant per
/// reference shape.
#[derive(Debug, Clone)]
pub enum Target {
    /// A free function looked up by name in the runtime's function table.
    Function(String),
    /// A static method on a registered type, the `"type::method"` form.
    Static { type_name: String, method: String },
    /// A method bound to a live instance.
    Method { receiver: InstanceRef, method: String },
    /// A value that is invocable by itself (an instance whose type defines
    /// an `invoke` method).
    Value(Value),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function(name) => f.write_str(name),
            Self::Static { type_name, method } => write!(f, "{type_name}::{method}"),
            Self::Method { method, .. } => write!(f, "<instance>.{method}"),
            Self::Value(value) => write!(f, "<invokable {}>", value.type_str()),
        }
    }
}

/// A reference to invocable code in one of four shapes: free function,
/// static method, bound instance method, or invokable value.
///
/// Shape is validated once at construction for the pair form; after that the
/// wrapper is mutable through [`set_owner`](Self::set_owner) and
/// [`set_member`](Self::set_member), and every [`resolve`](Self::resolve) /
/// [`is_callable`](Self::is_callable) / [`apply`](Self::apply) re-reads the
/// current state. A reference may therefore be built before its target
/// exists and still fails safely at call time.
#[derive(Debug, Clone)]
pub struct CallableRef {
    owner: Option<Value>,
    member: Option<String>,
}

impl fmt::Display for CallableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.resolve() {
            Ok(target) => write!(f, "{target}"),
            Err(_) => f.write_str("<unresolved reference>"),
        }
    }
}

impl CallableRef {
    /// Builds a reference from a single value plus an optional member name.
    ///
    /// A two-slot list value is treated as an ordered pair and validated by
    /// [`from_pair`](Self::from_pair). With no member the value itself is
    /// stored as the directly invocable target (a bare string names a free
    /// function); with a member the value becomes the owner.
    pub fn new(value: Value, member: Option<&str>) -> ObjectResult<Self> {
        if let Value::List(items) = &value {
            return Self::from_pair(items);
        }
        Ok(Self {
            owner: Some(value),
            member: member.map(str::to_string),
        })
    }

    /// Builds a reference from an ordered `[owner, member]` pair.
    ///
    /// Fails with [`ErrorKind::InvalidReference`] unless the pair has exactly
    /// two elements, the first a string or an instance, the second a string.
    pub fn from_pair(items: &[Value]) -> ObjectResult<Self> {
        if items.len() != 2 {
            raise_fmt!(ErrorKind::InvalidReference;
                "callable pair must have exactly two items, got {}", items.len());
        }
        if !matches!(items[0], Value::Str(_) | Value::Instance(_)) {
            raise_fmt!(ErrorKind::InvalidReference;
                "first item of a callable pair must be a str or an instance, got '{}'",
                items[0].type_str());
        }
        let Value::Str(member) = &items[1] else {
            raise_fmt!(ErrorKind::InvalidReference;
                "second item of a callable pair must be a str, got '{}'", items[1].type_str());
        };
        Ok(Self {
            owner: Some(items[0].clone()),
            member: Some(member.clone()),
        })
    }

    /// Reference to a free function by name.
    #[must_use]
    pub fn function(name: &str) -> Self {
        Self {
            owner: None,
            member: Some(name.to_string()),
        }
    }

    /// Reference bound to a method on a live instance.
    #[must_use]
    pub fn bound(receiver: &InstanceRef, method: &str) -> Self {
        Self {
            owner: Some(Value::Instance(receiver.clone())),
            member: Some(method.to_string()),
        }
    }

    #[must_use]
    pub fn owner(&self) -> Option<&Value> {
        self.owner.as_ref()
    }

    /// Reassigns the owner. No re-validation happens here; the next
    /// resolution sees the new state.
    pub fn set_owner(&mut self, owner: Option<Value>) {
        self.owner = owner;
    }

    #[must_use]
    pub fn member(&self) -> Option<&str> {
        self.member.as_deref()
    }

    /// Reassigns the member name. No re-validation happens here.
    pub fn set_member(&mut self, member: Option<&str>) {
        self.member = member.map(str::to_string);
    }

    /// Produces the normalized invocation target from the current
    /// owner/member state.
    ///
    /// Fails with [`ErrorKind::InvalidReference`] when the state matches no
    /// shape (no owner and no member, or a non-string non-instance owner
    /// combined with a member).
    pub fn resolve(&self) -> ObjectResult<Target> {
        match (&self.owner, &self.member) {
            (None, Some(member)) => Ok(Target::Function(member.clone())),
            (Some(Value::Str(name)), None) => Ok(Target::Function(name.clone())),
            (Some(Value::Str(type_name)), Some(member)) => Ok(Target::Static {
                type_name: type_name.clone(),
                method: member.clone(),
            }),
            (Some(Value::Instance(receiver)), Some(member)) => Ok(Target::Method {
                receiver: receiver.clone(),
                method: member.clone(),
            }),
            (Some(owner), None) => Ok(Target::Value(owner.clone())),
            (Some(owner), Some(_)) => raise_fmt!(ErrorKind::InvalidReference;
                "owner of a member reference must be a str or an instance, got '{}'",
                owner.type_str()),
            (None, None) => raise_static!(ErrorKind::InvalidReference; "reference has no target"),
        }
    }

    /// Whether the runtime can invoke the target right now. Never errors:
    /// malformed shapes and missing targets both report `false`.
    #[must_use]
    pub fn is_callable(&self, rt: &Runtime) -> bool {
        match self.resolve() {
            Ok(target) => rt.target_callable(&target),
            Err(_) => false,
        }
    }

    /// Whether the owner is set and the member names a method on it (on the
    /// type itself for a string owner, on the instance's type otherwise).
    #[must_use]
    pub fn is_method(&self, rt: &Runtime) -> bool {
        let Some(member) = &self.member else {
            return false;
        };
        match &self.owner {
            Some(Value::Str(type_name)) => rt
                .type_id(type_name)
                .is_some_and(|ty| rt.has_member(ty, member)),
            Some(Value::Instance(receiver)) => rt.has_member(receiver.ty(), member),
            _ => false,
        }
    }

    /// Invokes with a variadic argument list.
    pub fn call(&self, rt: &mut Runtime, args: Vec<Value>) -> ObjectResult<Value> {
        self.apply(rt, Some(args))
    }

    /// Alias of [`call`](Self::call).
    pub fn invoke(&self, rt: &mut Runtime, args: Vec<Value>) -> ObjectResult<Value> {
        self.apply(rt, Some(args))
    }

    /// Invokes with an explicit argument sequence; `None` invokes with zero
    /// arguments.
    ///
    /// Fails with [`ErrorKind::NotCallable`] when
    /// [`is_callable`](Self::is_callable) is false at call time; the check
    /// is fresh, not cached from construction.
    pub fn apply(&self, rt: &mut Runtime, args: Option<Vec<Value>>) -> ObjectResult<Value> {
        if !self.is_callable(rt) {
            raise_fmt!(ErrorKind::NotCallable; "reference '{self}' is not callable");
        }
        let target = self.resolve()?;
        rt.invoke_target(&target, args.unwrap_or_default())
    }
}
