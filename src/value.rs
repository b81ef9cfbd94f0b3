use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::exceptions::{err_fmt, ErrorKind, ObjectResult};
use crate::registry::TypeId;

/// Ordered string-keyed mapping, preserving insertion order.
pub type Map = IndexMap<String, Value>;

/// Primary value type flowing through the object model.
///
/// Small scalars are stored inline; containers own their elements; typed
/// wrapper instances are shared behind `Rc` so that casting and the singleton
/// registries can hand out the same instance repeatedly with reference
/// identity intact (`Value::is` / `Rc::ptr_eq`).
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(Map),
    /// A typed wrapper instance produced by a registered factory.
    Instance(InstanceRef),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            other => f.write_str(&other.repr()),
        }
    }
}

impl Value {
    /// Returns the value's own type name (registered wrapper types render as
    /// `"instance"` here; ask the [`Runtime`](crate::Runtime) for their
    /// registered name).
    #[must_use]
    pub fn type_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Instance(_) => "instance",
        }
    }

    /// Truthiness: empty containers, zero numbers, the empty string and
    /// `None` are false; instances are always true.
    #[must_use]
    pub fn truthy(&self) -> bool {
        match self {
            Self::None => false,
            Self::Bool(b) => *b,
            Self::Int(v) => *v != 0,
            Self::Float(v) => *v != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::List(items) => !items.is_empty(),
            Self::Map(map) => !map.is_empty(),
            Self::Instance(_) => true,
        }
    }

    /// Loose structural equality.
    ///
    /// Numbers compare across `Int`/`Float`/`Bool`, containers compare
    /// element-wise, instances compare by identity (payload-aware instance
    /// equality lives on [`Runtime::equals`](crate::Runtime::equals) where
    /// the type table is available).
    #[must_use]
    pub fn value_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Int(a), Self::Float(b)) | (Self::Float(b), Self::Int(a)) => *a as f64 == *b,
            (Self::Bool(a), Self::Int(b)) | (Self::Int(b), Self::Bool(a)) => i64::from(*a) == *b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.value_eq(y))
            }
            (Self::Map(a), Self::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b)
                        .all(|((ka, va), (kb, vb))| ka == kb && va.value_eq(vb))
            }
            (Self::Instance(a), Self::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Strict identity: same variant and equal contents, with no numeric
    /// coercion; instances are identical only when they are the same `Rc`.
    #[must_use]
    pub fn is(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.is(y))
            }
            (Self::Map(a), Self::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b)
                        .all(|((ka, va), (kb, vb))| ka == kb && va.is(vb))
            }
            (Self::Instance(a), Self::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Quoted, human-readable rendering.
    #[must_use]
    pub fn repr(&self) -> String {
        match self {
            Self::None => "none".to_string(),
            Self::Bool(true) => "true".to_string(),
            Self::Bool(false) => "false".to_string(),
            Self::Int(v) => format!("{v}"),
            Self::Float(v) => format!("{v}"),
            Self::Str(s) => string_repr(s),
            Self::List(items) => {
                let parts: Vec<String> = items.iter().map(Self::repr).collect();
                format!("[{}]", parts.join(", "))
            }
            Self::Map(map) => {
                let parts: Vec<String> = map
                    .iter()
                    .map(|(k, v)| format!("{}: {}", string_repr(k), v.repr()))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
            Self::Instance(_) => "<instance>".to_string(),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_instance(&self) -> Option<&InstanceRef> {
        match self {
            Self::Instance(inst) => Some(inst),
            _ => None,
        }
    }

    /// Renders the value as a registry key, if it has a scalar key form.
    ///
    /// Strings key as themselves and integers by their decimal rendering;
    /// everything else has no key form.
    #[must_use]
    pub fn as_key(&self) -> Option<String> {
        match self {
            Self::Str(s) => Some(s.clone()),
            Self::Int(v) => Some(v.to_string()),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

impl From<Map> for Value {
    fn from(v: Map) -> Self {
        Self::Map(v)
    }
}

impl From<InstanceRef> for Value {
    fn from(v: InstanceRef) -> Self {
        Self::Instance(v)
    }
}

impl TryFrom<&Value> for i64 {
    type Error = crate::exceptions::Error;

    fn try_from(value: &Value) -> ObjectResult<Self> {
        match value {
            Value::Int(v) => Ok(*v),
            Value::Bool(b) => Ok(i64::from(*b)),
            other => Err(err_fmt!(ErrorKind::TypeError; "cannot interpret '{}' as an int", other.type_str())),
        }
    }
}

impl TryFrom<&Value> for f64 {
    type Error = crate::exceptions::Error;

    fn try_from(value: &Value) -> ObjectResult<Self> {
        match value {
            Value::Float(v) => Ok(*v),
            Value::Int(v) => Ok(*v as f64),
            other => Err(err_fmt!(ErrorKind::TypeError; "cannot interpret '{}' as a float", other.type_str())),
        }
    }
}

impl TryFrom<&Value> for bool {
    type Error = crate::exceptions::Error;

    fn try_from(value: &Value) -> ObjectResult<Self> {
        match value {
            Value::Bool(b) => Ok(*b),
            other => Err(err_fmt!(ErrorKind::TypeError; "cannot interpret '{}' as a bool", other.type_str())),
        }
    }
}

impl TryFrom<&Value> for String {
    type Error = crate::exceptions::Error;

    fn try_from(value: &Value) -> ObjectResult<Self> {
        match value {
            Value::Str(s) => Ok(s.clone()),
            other => Err(err_fmt!(ErrorKind::TypeError; "cannot interpret '{}' as a str", other.type_str())),
        }
    }
}

/// A typed wrapper instance: the registered type it belongs to plus the one
/// payload value it wraps.
///
/// Instances are handed around as [`InstanceRef`] (`Rc<Instance>`); the
/// payload sits behind a `RefCell` so bound methods can mutate it through a
/// shared handle. The model is single-threaded by construction.
#[derive(Debug)]
pub struct Instance {
    ty: TypeId,
    payload: RefCell<Value>,
}

/// Shared handle to an [`Instance`]; identity is `Rc::ptr_eq`.
pub type InstanceRef = Rc<Instance>;

impl Instance {
    /// Allocates a new instance of the given registered type.
    #[must_use]
    pub fn new(ty: TypeId, payload: Value) -> InstanceRef {
        Rc::new(Self {
            ty,
            payload: RefCell::new(payload),
        })
    }

    #[must_use]
    pub fn ty(&self) -> TypeId {
        self.ty
    }

    /// Borrows the wrapped payload.
    ///
    /// # Panics
    /// Panics if the payload is already mutably borrowed, which only happens
    /// when a method re-enters its own receiver.
    #[must_use]
    pub fn payload(&self) -> Ref<'_, Value> {
        self.payload.borrow()
    }

    /// Mutably borrows the wrapped payload.
    ///
    /// # Panics
    /// Panics under re-entrant borrows, as [`Instance::payload`] does.
    #[must_use]
    pub fn payload_mut(&self) -> RefMut<'_, Value> {
        self.payload.borrow_mut()
    }

    /// Clones the payload out of the cell.
    #[must_use]
    pub fn payload_value(&self) -> Value {
        self.payload.borrow().clone()
    }

    pub fn set_payload(&self, payload: Value) {
        *self.payload.borrow_mut() = payload;
    }
}

/// Quotes a string the way diagnostics render it, preferring single quotes
/// and escaping control characters.
#[must_use]
pub(crate) fn string_repr(s: &str) -> String {
    let escaped = s
        .replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('\t', "\\t")
        .replace('\r', "\\r");
    if escaped.contains('\'') && !escaped.contains('"') {
        format!("\"{escaped}\"")
    } else {
        format!("'{}'", escaped.replace('\'', "\\'"))
    }
}
