//! The built-in `collection` wrapper type: keyed and sequenced bulk
//! operations over a list or map payload.

use std::cmp::Ordering;

use crate::args;
use crate::callable::CallableRef;
use crate::exceptions::{raise_fmt, ErrorKind, ObjectResult};
use crate::registry::{TypeId, TypeSpec};
use crate::value::{Instance, InstanceRef, Map, Value};
use crate::Runtime;

pub(crate) fn register(rt: &mut Runtime) -> ObjectResult<TypeId> {
    rt.register_type(
        TypeSpec::new("collection", factory)
            .with_method("count", count)
            .with_method("is_empty", is_empty)
            .with_method("clear", clear)
            .with_method("has", has)
            .with_method("get", get)
            .with_method("set", set)
            .with_method("keys", keys)
            .with_method("values", values)
            .with_method("push", push)
            .with_method("pop", pop)
            .with_method("shift", shift)
            .with_method("unshift", unshift)
            .with_method("contains", contains)
            .with_method("filter", filter)
            .with_method("flip", flip)
            .with_method("reverse", reverse)
            .with_method("sort", sort)
            .with_method("slice", slice)
            .with_method("splice", splice)
            .with_method("join", join)
            .with_method("find", find)
            .with_method("path", path),
    )
}

/// Accepts no arguments (empty list), or one list, map, or collection
/// instance whose payload is copied. The `ty` parameter keeps subtypes
/// constructing themselves through the shared factory.
fn factory(_rt: &mut Runtime, ty: TypeId, mut ctor_args: Vec<Value>) -> ObjectResult<Value> {
    let payload = match ctor_args.len() {
        0 => Value::List(Vec::new()),
        1 => match ctor_args.remove(0) {
            Value::None => Value::List(Vec::new()),
            payload @ (Value::List(_) | Value::Map(_)) => payload,
            Value::Instance(inst) => match inst.payload_value() {
                payload @ (Value::List(_) | Value::Map(_)) => payload,
                other => raise_fmt!(ErrorKind::TypeError;
                    "collection() cannot adopt an instance wrapping '{}'", other.type_str()),
            },
            other => raise_fmt!(ErrorKind::TypeError;
                "collection() expects a list or map, got '{}'", other.type_str()),
        },
        n => raise_fmt!(ErrorKind::TypeError; "collection() takes at most 1 argument ({n} given)"),
    };
    Ok(Value::Instance(Instance::new(ty, payload)))
}

/// Looks a key up in a list (by decimal index) or map payload.
fn lookup(payload: &Value, key: &str) -> Option<Value> {
    match payload {
        Value::Map(map) => map.get(key).cloned(),
        Value::List(items) => key.parse::<usize>().ok().and_then(|idx| items.get(idx)).cloned(),
        _ => None,
    }
}

fn count(_rt: &mut Runtime, receiver: &InstanceRef, args: Vec<Value>) -> ObjectResult<Value> {
    args::exactly("count", &args, 0)?;
    let len = match &*receiver.payload() {
        Value::List(items) => items.len(),
        Value::Map(map) => map.len(),
        _ => 0,
    };
    Ok(Value::Int(len as i64))
}

fn is_empty(rt: &mut Runtime, receiver: &InstanceRef, args: Vec<Value>) -> ObjectResult<Value> {
    args::exactly("is_empty", &args, 0)?;
    let len = count(rt, receiver, Vec::new())?;
    Ok(Value::Bool(len.as_int() == Some(0)))
}

fn clear(_rt: &mut Runtime, receiver: &InstanceRef, args: Vec<Value>) -> ObjectResult<Value> {
    args::exactly("clear", &args, 0)?;
    let empty = match &*receiver.payload() {
        Value::Map(_) => Value::Map(Map::new()),
        _ => Value::List(Vec::new()),
    };
    receiver.set_payload(empty);
    Ok(Value::None)
}

fn has(_rt: &mut Runtime, receiver: &InstanceRef, args: Vec<Value>) -> ObjectResult<Value> {
    args::exactly("has", &args, 1)?;
    let key = args::key_arg("has", &args, 0)?;
    Ok(Value::Bool(lookup(&receiver.payload(), &key).is_some()))
}

fn get(_rt: &mut Runtime, receiver: &InstanceRef, args: Vec<Value>) -> ObjectResult<Value> {
    args::between("get", &args, 1, 2)?;
    let key = args::key_arg("get", &args, 0)?;
    match lookup(&receiver.payload(), &key) {
        Some(value) => Ok(value),
        None => Ok(args.get(1).cloned().unwrap_or(Value::None)),
    }
}

fn set(_rt: &mut Runtime, receiver: &InstanceRef, args: Vec<Value>) -> ObjectResult<Value> {
    args::exactly("set", &args, 2)?;
    let key = args::key_arg("set", &args, 0)?;
    let value = args[1].clone();
    match &mut *receiver.payload_mut() {
        Value::Map(map) => {
            map.insert(key, value);
        }
        Value::List(items) => {
            let Ok(idx) = key.parse::<usize>() else {
                raise_fmt!(ErrorKind::TypeError; "list payload requires an int key, got '{key}'");
            };
            if idx < items.len() {
                items[idx] = value;
            } else if idx == items.len() {
                items.push(value);
            } else {
                raise_fmt!(ErrorKind::ValueError; "index {idx} is out of range for length {}", items.len());
            }
        }
        other => raise_fmt!(ErrorKind::TypeError; "cannot set into '{}' payload", other.type_str()),
    }
    Ok(Value::Instance(receiver.clone()))
}

fn keys(rt: &mut Runtime, receiver: &InstanceRef, args: Vec<Value>) -> ObjectResult<Value> {
    args::exactly("keys", &args, 0)?;
    let keys: Vec<Value> = match &*receiver.payload() {
        Value::Map(map) => map.keys().map(|k| Value::from(k.as_str())).collect(),
        Value::List(items) => (0..items.len() as i64).map(Value::Int).collect(),
        _ => Vec::new(),
    };
    rt.create_of(receiver.ty(), vec![Value::List(keys)])
}

fn values(rt: &mut Runtime, receiver: &InstanceRef, args: Vec<Value>) -> ObjectResult<Value> {
    args::exactly("values", &args, 0)?;
    let values: Vec<Value> = match &*receiver.payload() {
        Value::Map(map) => map.values().cloned().collect(),
        Value::List(items) => items.clone(),
        _ => Vec::new(),
    };
    rt.create_of(receiver.ty(), vec![Value::List(values)])
}

fn push(_rt: &mut Runtime, receiver: &InstanceRef, args: Vec<Value>) -> ObjectResult<Value> {
    args::exactly("push", &args, 1)?;
    match &mut *receiver.payload_mut() {
        Value::List(items) => {
            items.push(args[0].clone());
            Ok(Value::Int(items.len() as i64))
        }
        other => raise_fmt!(ErrorKind::TypeError; "push() requires a list payload, got '{}'", other.type_str()),
    }
}

fn pop(_rt: &mut Runtime, receiver: &InstanceRef, args: Vec<Value>) -> ObjectResult<Value> {
    args::exactly("pop", &args, 0)?;
    match &mut *receiver.payload_mut() {
        Value::List(items) => Ok(items.pop().unwrap_or(Value::None)),
        other => raise_fmt!(ErrorKind::TypeError; "pop() requires a list payload, got '{}'", other.type_str()),
    }
}

fn shift(_rt: &mut Runtime, receiver: &InstanceRef, args: Vec<Value>) -> ObjectResult<Value> {
    args::exactly("shift", &args, 0)?;
    match &mut *receiver.payload_mut() {
        Value::List(items) => {
            if items.is_empty() {
                Ok(Value::None)
            } else {
                Ok(items.remove(0))
            }
        }
        other => raise_fmt!(ErrorKind::TypeError; "shift() requires a list payload, got '{}'", other.type_str()),
    }
}

fn unshift(_rt: &mut Runtime, receiver: &InstanceRef, args: Vec<Value>) -> ObjectResult<Value> {
    args::exactly("unshift", &args, 1)?;
    match &mut *receiver.payload_mut() {
        Value::List(items) => {
            items.insert(0, args[0].clone());
            Ok(Value::Int(items.len() as i64))
        }
        other => raise_fmt!(ErrorKind::TypeError; "unshift() requires a list payload, got '{}'", other.type_str()),
    }
}

/// Loose membership: compares with `value_eq`, so `2` is found among
/// floats and bools that equal it.
fn contains(_rt: &mut Runtime, receiver: &InstanceRef, args: Vec<Value>) -> ObjectResult<Value> {
    args::exactly("contains", &args, 1)?;
    let needle = &args[0];
    let found = match &*receiver.payload() {
        Value::List(items) => items.iter().any(|item| item.value_eq(needle)),
        Value::Map(map) => map.values().any(|item| item.value_eq(needle)),
        _ => false,
    };
    Ok(Value::Bool(found))
}

/// Keeps the elements the callback maps to a truthy value. The callback is
/// any callable reference form: a pair, a free-function name, or an
/// invokable instance.
fn filter(rt: &mut Runtime, receiver: &InstanceRef, mut args: Vec<Value>) -> ObjectResult<Value> {
    args::exactly("filter", &args, 1)?;
    let reference = CallableRef::new(args.remove(0), None)?;
    let filtered = match receiver.payload_value() {
        Value::List(items) => {
            let mut kept = Vec::new();
            for item in items {
                if reference.apply(rt, Some(vec![item.clone()]))?.truthy() {
                    kept.push(item);
                }
            }
            Value::List(kept)
        }
        Value::Map(map) => {
            let mut kept = Map::new();
            for (key, item) in map {
                if reference.apply(rt, Some(vec![item.clone()]))?.truthy() {
                    kept.insert(key, item);
                }
            }
            Value::Map(kept)
        }
        other => other,
    };
    rt.create_of(receiver.ty(), vec![filtered])
}

/// Exchanges keys and values in a new instance; list elements flip to a
/// map from element to index. Every value must have a scalar key form.
fn flip(rt: &mut Runtime, receiver: &InstanceRef, args: Vec<Value>) -> ObjectResult<Value> {
    args::exactly("flip", &args, 0)?;
    let mut flipped = Map::new();
    match &*receiver.payload() {
        Value::Map(map) => {
            for (key, item) in map {
                let Some(new_key) = item.as_key() else {
                    raise_fmt!(ErrorKind::TypeError;
                        "flip() requires str or int values, got '{}'", item.type_str());
                };
                flipped.insert(new_key, Value::from(key.as_str()));
            }
        }
        Value::List(items) => {
            for (idx, item) in items.iter().enumerate() {
                let Some(new_key) = item.as_key() else {
                    raise_fmt!(ErrorKind::TypeError;
                        "flip() requires str or int values, got '{}'", item.type_str());
                };
                flipped.insert(new_key, Value::Int(idx as i64));
            }
        }
        _ => {}
    }
    rt.create_of(receiver.ty(), vec![Value::Map(flipped)])
}

fn reverse(rt: &mut Runtime, receiver: &InstanceRef, args: Vec<Value>) -> ObjectResult<Value> {
    args::exactly("reverse", &args, 0)?;
    let reversed = match &*receiver.payload() {
        Value::List(items) => Value::List(items.iter().rev().cloned().collect()),
        Value::Map(map) => Value::Map(map.iter().rev().map(|(k, v)| (k.clone(), v.clone())).collect()),
        other => other.clone(),
    };
    rt.create_of(receiver.ty(), vec![reversed])
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::None => 0,
        Value::Bool(_) => 1,
        Value::Int(_) | Value::Float(_) => 2,
        Value::Str(_) => 3,
        Value::List(_) => 4,
        Value::Map(_) => 5,
        Value::Instance(_) => 6,
    }
}

/// Total order for sorting heterogeneous payloads: numbers compare
/// numerically, strings lexicographically, everything else by type rank.
fn value_order(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::Float(x), Value::Float(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (Value::Int(x), Value::Float(y)) => {
            (*x as f64).partial_cmp(y).unwrap_or(Ordering::Equal)
        }
        (Value::Float(x), Value::Int(y)) => {
            x.partial_cmp(&(*y as f64)).unwrap_or(Ordering::Equal)
        }
        (Value::Str(x), Value::Str(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Sorts a list payload in place.
fn sort(_rt: &mut Runtime, receiver: &InstanceRef, args: Vec<Value>) -> ObjectResult<Value> {
    args::exactly("sort", &args, 0)?;
    match &mut *receiver.payload_mut() {
        Value::List(items) => {
            items.sort_by(value_order);
            Ok(Value::Bool(true))
        }
        other => raise_fmt!(ErrorKind::TypeError; "sort() requires a list payload, got '{}'", other.type_str()),
    }
}

/// Clamps an offset/length pair the way sequence slicing conventionally
/// works: a negative offset counts back from the end, a negative length
/// drops that many elements from the end.
fn slice_bounds(len: usize, offset: i64, length: Option<i64>) -> (usize, usize) {
    let start = if offset < 0 {
        len.saturating_sub(offset.unsigned_abs() as usize)
    } else {
        (offset as usize).min(len)
    };
    let end = match length {
        None => len,
        Some(l) if l < 0 => len.saturating_sub(l.unsigned_abs() as usize),
        Some(l) => (start + l as usize).min(len),
    };
    (start, end.max(start))
}

fn slice(rt: &mut Runtime, receiver: &InstanceRef, args: Vec<Value>) -> ObjectResult<Value> {
    args::between("slice", &args, 1, 2)?;
    let offset = args::int_arg("slice", &args, 0)?;
    let length = args::opt_int_arg("slice", &args, 1)?;
    let sliced = match &*receiver.payload() {
        Value::List(items) => {
            let (start, end) = slice_bounds(items.len(), offset, length);
            Value::List(items[start..end].to_vec())
        }
        Value::Map(map) => {
            let (start, end) = slice_bounds(map.len(), offset, length);
            Value::Map(
                map.iter()
                    .skip(start)
                    .take(end - start)
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            )
        }
        other => other.clone(),
    };
    rt.create_of(receiver.ty(), vec![sliced])
}

/// Removes a span from a list payload in place, optionally inserting
/// replacement elements, and returns the removed span as a new instance.
/// Without a length the rest of the list is removed.
fn splice(rt: &mut Runtime, receiver: &InstanceRef, args: Vec<Value>) -> ObjectResult<Value> {
    args::between("splice", &args, 1, 3)?;
    let offset = args::int_arg("splice", &args, 0)?;
    let length = args::opt_int_arg("splice", &args, 1)?;
    let replacement: Vec<Value> = match args.get(2) {
        None | Some(Value::None) => Vec::new(),
        Some(Value::List(items)) => items.clone(),
        Some(single) => vec![single.clone()],
    };
    let removed = match &mut *receiver.payload_mut() {
        Value::List(items) => {
            let (start, end) = slice_bounds(items.len(), offset, length);
            items.splice(start..end, replacement).collect::<Vec<_>>()
        }
        other => raise_fmt!(ErrorKind::TypeError; "splice() requires a list payload, got '{}'", other.type_str()),
    };
    rt.create_of(receiver.ty(), vec![Value::List(removed)])
}

fn join(rt: &mut Runtime, receiver: &InstanceRef, args: Vec<Value>) -> ObjectResult<Value> {
    args::exactly("join", &args, 1)?;
    let glue = args::str_arg("join", &args, 0)?.to_string();
    let parts: Vec<String> = match &*receiver.payload() {
        Value::List(items) => items.iter().map(ToString::to_string).collect(),
        Value::Map(map) => map.values().map(ToString::to_string).collect(),
        _ => Vec::new(),
    };
    rt.create("text", vec![Value::from(parts.join(&glue))])
}

/// Walks the arguments as a lookup path through nested lists and maps;
/// a missing segment yields `none`.
fn find(_rt: &mut Runtime, receiver: &InstanceRef, args: Vec<Value>) -> ObjectResult<Value> {
    let mut current = receiver.payload_value();
    for part in &args {
        let Some(key) = part.as_key() else {
            raise_fmt!(ErrorKind::TypeError;
                "find() path segments must be str or int, got '{}'", part.type_str());
        };
        match lookup(&current, &key) {
            Some(next) => current = next,
            None => return Ok(Value::None),
        }
    }
    Ok(current)
}

/// Dot-separated path lookup. Delegates through a callable reference bound
/// to the receiver's own `find` so subtypes overriding `find` keep `path`
/// consistent.
fn path(rt: &mut Runtime, receiver: &InstanceRef, args: Vec<Value>) -> ObjectResult<Value> {
    args::between("path", &args, 1, 2)?;
    let path = args::str_arg("path", &args, 0)?;
    let parts: Vec<Value> = path.split('.').map(Value::from).collect();
    let found = rt.callback(receiver, "find").apply(rt, Some(parts))?;
    match found {
        Value::None => Ok(args.get(1).cloned().unwrap_or(Value::None)),
        value => Ok(value),
    }
}
