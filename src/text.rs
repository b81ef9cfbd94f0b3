//! The built-in `text` wrapper type: string transforms and regex-based
//! normalization over a string payload.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;

use crate::args;
use crate::exceptions::{err_fmt, raise_fmt, ErrorKind, ObjectResult};
use crate::registry::{TypeId, TypeSpec};
use crate::value::{Instance, InstanceRef, Value};
use crate::Runtime;

static NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("static pattern compiles"));
static CAMEL_LOWER_UPPER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z])([A-Z])").expect("static pattern compiles"));
static CAMEL_ACRONYM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z])([A-Z][a-z])").expect("static pattern compiles"));

pub(crate) fn register(rt: &mut Runtime) -> ObjectResult<TypeId> {
    rt.register_type(
        TypeSpec::new("text", factory)
            .with_method("length", length)
            .with_method("is_empty", is_empty)
            .with_method("append", append)
            .with_method("prepend", prepend)
            .with_method("upper", upper)
            .with_method("lower", lower)
            .with_method("ucfirst", ucfirst)
            .with_method("lcfirst", lcfirst)
            .with_method("ucwords", ucwords)
            .with_method("compile", compile)
            .with_method("trim", trim)
            .with_method("cut", cut)
            .with_method("find", find)
            .with_method("matches", matches_method)
            .with_method("replace", replace)
            .with_method("split", split)
            .with_method("compare", compare)
            .with_method("decamelize", decamelize)
            .with_method("camelize", camelize)
            .with_method("urlize", urlize),
    )
}

/// Accepts no arguments (empty string) or one scalar, rendered to its
/// string form; instances contribute their payload's rendering.
fn factory(_rt: &mut Runtime, ty: TypeId, mut ctor_args: Vec<Value>) -> ObjectResult<Value> {
    let payload = match ctor_args.len() {
        0 => String::new(),
        1 => match ctor_args.remove(0) {
            Value::None => String::new(),
            Value::Str(s) => s,
            scalar @ (Value::Bool(_) | Value::Int(_) | Value::Float(_)) => scalar.to_string(),
            Value::Instance(inst) => match inst.payload_value() {
                Value::Str(s) => s,
                other => other.to_string(),
            },
            other => raise_fmt!(ErrorKind::TypeError;
                "text() expects a scalar, got '{}'", other.type_str()),
        },
        n => raise_fmt!(ErrorKind::TypeError; "text() takes at most 1 argument ({n} given)"),
    };
    Ok(Value::Instance(Instance::new(ty, Value::Str(payload))))
}

/// Clones the string payload out of the receiver.
fn text_of(receiver: &InstanceRef) -> ObjectResult<String> {
    match &*receiver.payload() {
        Value::Str(s) => Ok(s.clone()),
        other => Err(err_fmt!(ErrorKind::TypeError;
            "text methods require a str payload, got '{}'", other.type_str())),
    }
}

/// Wraps a derived string in a fresh instance of the receiver's own type.
fn derive(rt: &mut Runtime, receiver: &InstanceRef, s: String) -> ObjectResult<Value> {
    rt.create_of(receiver.ty(), vec![Value::Str(s)])
}

fn length(_rt: &mut Runtime, receiver: &InstanceRef, args: Vec<Value>) -> ObjectResult<Value> {
    args::exactly("length", &args, 0)?;
    Ok(Value::Int(text_of(receiver)?.chars().count() as i64))
}

fn is_empty(_rt: &mut Runtime, receiver: &InstanceRef, args: Vec<Value>) -> ObjectResult<Value> {
    args::exactly("is_empty", &args, 0)?;
    Ok(Value::Bool(text_of(receiver)?.is_empty()))
}

fn append(_rt: &mut Runtime, receiver: &InstanceRef, args: Vec<Value>) -> ObjectResult<Value> {
    args::exactly("append", &args, 1)?;
    let suffix = args::str_arg("append", &args, 0)?;
    let mut s = text_of(receiver)?;
    s.push_str(suffix);
    receiver.set_payload(Value::Str(s));
    Ok(Value::None)
}

fn prepend(_rt: &mut Runtime, receiver: &InstanceRef, args: Vec<Value>) -> ObjectResult<Value> {
    args::exactly("prepend", &args, 1)?;
    let prefix = args::str_arg("prepend", &args, 0)?;
    let s = text_of(receiver)?;
    receiver.set_payload(Value::Str(format!("{prefix}{s}")));
    Ok(Value::None)
}

fn upper(rt: &mut Runtime, receiver: &InstanceRef, args: Vec<Value>) -> ObjectResult<Value> {
    args::exactly("upper", &args, 0)?;
    let s = text_of(receiver)?.to_uppercase();
    derive(rt, receiver, s)
}

fn lower(rt: &mut Runtime, receiver: &InstanceRef, args: Vec<Value>) -> ObjectResult<Value> {
    args::exactly("lower", &args, 0)?;
    let s = text_of(receiver)?.to_lowercase();
    derive(rt, receiver, s)
}

fn ucfirst_str(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn lcfirst_str(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn ucwords_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = c.is_whitespace();
    }
    out
}

fn ucfirst(rt: &mut Runtime, receiver: &InstanceRef, args: Vec<Value>) -> ObjectResult<Value> {
    args::exactly("ucfirst", &args, 0)?;
    let s = ucfirst_str(&text_of(receiver)?);
    derive(rt, receiver, s)
}

fn lcfirst(rt: &mut Runtime, receiver: &InstanceRef, args: Vec<Value>) -> ObjectResult<Value> {
    args::exactly("lcfirst", &args, 0)?;
    let s = lcfirst_str(&text_of(receiver)?);
    derive(rt, receiver, s)
}

/// Uppercases the first letter of every whitespace-separated word,
/// leaving the whitespace itself untouched.
fn ucwords(rt: &mut Runtime, receiver: &InstanceRef, args: Vec<Value>) -> ObjectResult<Value> {
    args::exactly("ucwords", &args, 0)?;
    let s = ucwords_str(&text_of(receiver)?);
    derive(rt, receiver, s)
}

/// Applies a map of literal search/replace pairs in insertion order.
fn compile(rt: &mut Runtime, receiver: &InstanceRef, args: Vec<Value>) -> ObjectResult<Value> {
    args::exactly("compile", &args, 1)?;
    let Some(params) = args[0].as_map() else {
        raise_fmt!(ErrorKind::TypeError;
            "compile() expects a map of replacements, got '{}'", args[0].type_str());
    };
    let mut s = text_of(receiver)?;
    for (search, replacement) in params {
        let Value::Str(replacement) = replacement else {
            raise_fmt!(ErrorKind::TypeError;
                "compile() replacements must be str, got '{}'", replacement.type_str());
        };
        s = s.replace(search.as_str(), replacement);
    }
    derive(rt, receiver, s)
}

fn trim(rt: &mut Runtime, receiver: &InstanceRef, args: Vec<Value>) -> ObjectResult<Value> {
    args::between("trim", &args, 0, 1)?;
    let s = text_of(receiver)?;
    let trimmed = match args.first() {
        None | Some(Value::None) => s.trim().to_string(),
        Some(_) => {
            let set: Vec<char> = args::str_arg("trim", &args, 0)?.chars().collect();
            s.trim_matches(|c| set.contains(&c)).to_string()
        }
    };
    derive(rt, receiver, trimmed)
}

fn cut(rt: &mut Runtime, receiver: &InstanceRef, args: Vec<Value>) -> ObjectResult<Value> {
    args::between("cut", &args, 1, 2)?;
    let start = args::int_arg("cut", &args, 0)?;
    let length = args::opt_int_arg("cut", &args, 1)?;
    let chars: Vec<char> = text_of(receiver)?.chars().collect();
    let from = if start < 0 {
        chars.len().saturating_sub(start.unsigned_abs() as usize)
    } else {
        (start as usize).min(chars.len())
    };
    let to = match length {
        None => chars.len(),
        Some(l) if l < 0 => chars.len().saturating_sub(l.unsigned_abs() as usize),
        Some(l) => (from + l as usize).min(chars.len()),
    };
    let s: String = chars[from..to.max(from)].iter().collect();
    derive(rt, receiver, s)
}

/// Char offset of the needle, or `none` when absent. The offset feeds
/// straight into `cut`, which counts chars too.
fn find(_rt: &mut Runtime, receiver: &InstanceRef, args: Vec<Value>) -> ObjectResult<Value> {
    args::exactly("find", &args, 1)?;
    let needle = args::str_arg("find", &args, 0)?;
    let s = text_of(receiver)?;
    match s.find(needle) {
        Some(pos) => Ok(Value::Int(s[..pos].chars().count() as i64)),
        None => Ok(Value::None),
    }
}

fn compile_pattern(pattern: &str) -> ObjectResult<Regex> {
    Regex::new(pattern).map_err(|e| err_fmt!(ErrorKind::ValueError; "invalid pattern: {e}"))
}

fn matches_method(_rt: &mut Runtime, receiver: &InstanceRef, args: Vec<Value>) -> ObjectResult<Value> {
    args::exactly("matches", &args, 1)?;
    let pattern = compile_pattern(args::str_arg("matches", &args, 0)?)?;
    Ok(Value::Bool(pattern.is_match(&text_of(receiver)?)))
}

/// Literal replacement by default; a truthy third argument switches the
/// search term to a regex pattern (group references use `$1` syntax).
fn replace(rt: &mut Runtime, receiver: &InstanceRef, args: Vec<Value>) -> ObjectResult<Value> {
    args::between("replace", &args, 2, 3)?;
    let search = args::str_arg("replace", &args, 0)?;
    let replacement = args::str_arg("replace", &args, 1)?;
    let use_regex = args.get(2).is_some_and(Value::truthy);
    let s = text_of(receiver)?;
    let replaced = if use_regex {
        compile_pattern(search)?.replace_all(&s, replacement).into_owned()
    } else {
        s.replace(search, replacement)
    };
    derive(rt, receiver, replaced)
}

/// Splits into a `collection` of string parts.
fn split(rt: &mut Runtime, receiver: &InstanceRef, args: Vec<Value>) -> ObjectResult<Value> {
    args::exactly("split", &args, 1)?;
    let delimiter = args::str_arg("split", &args, 0)?;
    let parts: Vec<Value> = text_of(receiver)?.split(delimiter).map(Value::from).collect();
    rt.create("collection", vec![Value::List(parts)])
}

fn compare(_rt: &mut Runtime, receiver: &InstanceRef, args: Vec<Value>) -> ObjectResult<Value> {
    args::between("compare", &args, 1, 2)?;
    let other = args::str_arg("compare", &args, 0)?;
    let length = args::opt_int_arg("compare", &args, 1)?;
    let s = text_of(receiver)?;
    let ordering = match length {
        None => s.as_str().cmp(other),
        Some(n) => {
            let n = n.max(0) as usize;
            let left: String = s.chars().take(n).collect();
            let right: String = other.chars().take(n).collect();
            left.cmp(&right)
        }
    };
    Ok(Value::Int(match ordering {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }))
}

fn decamelize_str(s: &str, separator: &str) -> String {
    let replacement = format!("${{1}}{separator}${{2}}");
    let step = CAMEL_LOWER_UPPER.replace_all(s, replacement.as_str());
    CAMEL_ACRONYM.replace_all(&step, replacement.as_str()).into_owned()
}

/// Inserts a separator at word boundaries of a camel-cased string.
fn decamelize(rt: &mut Runtime, receiver: &InstanceRef, args: Vec<Value>) -> ObjectResult<Value> {
    args::between("decamelize", &args, 0, 1)?;
    let separator = match args.first() {
        None | Some(Value::None) => " ",
        Some(_) => args::str_arg("decamelize", &args, 0)?,
    };
    let s = decamelize_str(&text_of(receiver)?, separator);
    derive(rt, receiver, s)
}

/// Normalizes any word-ish string into camel case; a truthy argument keeps
/// the first letter uppercase.
fn camelize(rt: &mut Runtime, receiver: &InstanceRef, args: Vec<Value>) -> ObjectResult<Value> {
    args::between("camelize", &args, 0, 1)?;
    let keep_first = args.first().is_some_and(Value::truthy);
    let lowered = decamelize_str(text_of(receiver)?.trim(), " ").to_lowercase();
    let spaced = NON_ALNUM.replace_all(&lowered, " ");
    let joined: String = spaced.split_whitespace().map(ucfirst_str).collect();
    let s = if keep_first { joined } else { lcfirst_str(&joined) };
    derive(rt, receiver, s)
}

/// Lowercases and collapses everything outside `[a-z0-9]` into single
/// hyphens, producing a URL slug.
fn urlize(rt: &mut Runtime, receiver: &InstanceRef, args: Vec<Value>) -> ObjectResult<Value> {
    args::exactly("urlize", &args, 0)?;
    let lowered = text_of(receiver)?.to_lowercase();
    let dashed = NON_ALNUM.replace_all(&lowered, "-");
    derive(rt, receiver, dashed.trim_matches('-').to_string())
}
