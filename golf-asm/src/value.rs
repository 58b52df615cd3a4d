//! Runtime values the evaluator produces: the things an expression can
//! ultimately stand for in operand position, plus the symbol environment
//! that maps names to them.

use crate::error::EvaluationError;
use golf_vm::RegisterId;
use std::collections::HashMap;

/// The legal range for any standalone integer GOLF ever carries, whether as
/// an operand or as one element of a `data(...)` integer sequence:
/// `[-2^63, 2^64)`, §3/§4.3.
pub const INT_RANGE_MIN: i128 = i64::MIN as i128;
pub const INT_RANGE_MAX: i128 = u64::MAX as i128;

/// A `data(...)` payload, pooled by content in [`crate::data`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DataLiteral {
    Bytes(Vec<u8>),
    Text(String),
    Ints(Vec<i128>),
}

/// A label as it lives in the symbol environment: bound to the logical
/// instruction index at its definition site, with an absolute byte offset
/// filled in once the encoder has laid out the stream.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelValue {
    pub name: Option<String>,
    pub instr_index: u32,
}

pub type NativeFn = fn(&[Value]) -> Result<Value, EvaluationError>;

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(i128),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Register(RegisterId),
    Label(LabelValue),
    Data(DataLiteral),
    Tuple(Vec<Value>),
    Namespace(HashMap<String, Value>),
    NativeFn(&'static str, NativeFn),
}

impl Value {
    /// Widens an integer or float value to `f64`, for use inside math
    /// functions that accept either.
    pub fn as_f64(&self) -> Result<f64, EvaluationError> {
        match self {
            Value::Int(i) => Ok(*i as f64),
            Value::Float(f) => Ok(*f),
            other => Err(EvaluationError::TypeMismatch(describe(other))),
        }
    }

    /// Narrows to a plain integer. Operand position requires this; math
    /// functions that return a whole number (`floor`, `gcd`, ...) do too.
    pub fn as_int(&self) -> Result<i128, EvaluationError> {
        match self {
            Value::Int(i) => Ok(*i),
            other => Err(EvaluationError::TypeMismatch(describe(other))),
        }
    }
}

pub fn describe(value: &Value) -> &'static str {
    match value {
        Value::Int(_) => "int",
        Value::Float(_) => "float",
        Value::Str(_) => "string",
        Value::Bytes(_) => "bytes",
        Value::Register(_) => "register",
        Value::Label(_) => "label",
        Value::Data(_) => "data literal",
        Value::Tuple(_) => "tuple",
        Value::Namespace(_) => "namespace",
        Value::NativeFn(..) => "function",
    }
}

/// The evaluator's symbol table: registers, the `math` namespace, `pow`,
/// `data`, and whatever the source has bound with `name = expr` or defined
/// as a label. A flat `HashMap` rather than a scoped environment, since
/// GOLF source has no nested scopes at all.
#[derive(Clone, Debug)]
pub struct Env {
    bindings: HashMap<String, Value>,
}

impl Env {
    pub fn new() -> Env {
        let mut bindings = HashMap::new();

        for c in b'a'..=b'z' {
            let letter = c as char;
            bindings.insert(letter.to_string(), Value::Register(RegisterId::from_letter(letter).unwrap()));
        }

        bindings.insert("pow".to_owned(), Value::NativeFn("pow", crate::builtins::pow));
        bindings.insert("data".to_owned(), Value::NativeFn("data", crate::builtins::data));

        let math_members = crate::builtins::math_members();
        for (name, value) in &math_members {
            bindings.insert(name.clone(), value.clone());
        }
        bindings.insert(
            "math".to_owned(),
            Value::Namespace(math_members.into_iter().collect()),
        );

        Env { bindings }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    pub fn is_label(&self, name: &str) -> bool {
        matches!(self.bindings.get(name), Some(Value::Label(_)))
    }

    pub fn bind(&mut self, name: String, value: Value) {
        self.bindings.insert(name, value);
    }

    pub fn resolve_path(&self, path: &[String]) -> Option<Value> {
        let mut current = self.bindings.get(path.first()?)?.clone();
        for segment in &path[1..] {
            current = match current {
                Value::Namespace(map) => map.get(segment)?.clone(),
                _ => return None,
            };
        }
        Some(current)
    }
}

impl Default for Env {
    fn default() -> Env {
        Env::new()
    }
}
