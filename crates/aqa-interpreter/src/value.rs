//! Value types for the AQA interpreter.
//!
//! `Return` and `Error` are ordinary variants of the sum: the evaluator
//! propagates them in-band instead of using host-language exceptions.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use aqa_syntax::ast::{Block, Ident};

use crate::env::EnvRef;

/// Signature shared by all built-in functions.
pub type BuiltinFn = fn(Vec<Value>) -> Value;

/// A runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Array(Vec<Value>),
    Map(HashMap<HashKey, (Value, Value)>),
    Null,
    /// Marker wrapping the value of a `RETURN` statement; unwrapped exactly
    /// once at the nearest subroutine boundary or the program root.
    Return(Box<Value>),
    /// In-band runtime error; any evaluation step that sees one stops and
    /// propagates it verbatim.
    Error(String),
    Subroutine(Rc<SubroutineValue>),
    Builtin { name: &'static str, func: BuiltinFn },
    Module(Rc<Module>),
}

/// A user-defined subroutine together with its captured environment.
#[derive(Debug)]
pub struct SubroutineValue {
    pub name: String,
    pub params: Vec<Ident>,
    pub body: Block,
    pub env: EnvRef,
}

/// The result of evaluating another file: its environment plus the set of
/// names visible to the importer.
#[derive(Debug)]
pub struct Module {
    pub env: EnvRef,
    pub exposed: HashSet<String>,
    pub path: String,
    pub is_builtin: bool,
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<module \"{}\">", self.path)
    }
}

/// A map key: the value's kind tag plus a 64-bit digest, so Int `1` and
/// Float `1.0` stay distinct keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashKey {
    pub kind: &'static str,
    pub digest: u64,
}

/// FNV-1a, 64-bit. Deterministic within (and across) processes.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x100_0000_01b3);
    }
    hash
}

/// Renders a float in round-trippable fixed-point form. Integral values keep
/// a trailing `.0` so REAL output stays distinguishable from INTEGER output.
pub fn format_float(value: f64) -> String {
    let s = format!("{}", value);
    if s.contains('.') || s.contains('e') || s.contains("inf") || s.contains("NaN") {
        s
    } else {
        format!("{}.0", s)
    }
}

impl Value {
    /// The kind name used in error messages, e.g. `INTEGER` or `STRING`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "INTEGER",
            Value::Float(_) => "FLOAT",
            Value::Bool(_) => "BOOLEAN",
            Value::Str(_) => "STRING",
            Value::Array(_) => "ARRAY",
            Value::Map(_) => "MAP",
            Value::Null => "NULL",
            Value::Return(_) => "RETURN_VALUE",
            Value::Error(_) => "ERROR",
            Value::Subroutine(_) => "SUBROUTINE",
            Value::Builtin { .. } => "BUILTIN",
            Value::Module(_) => "MODULE",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// The hash key for map storage and mixed-kind equality. Only Int,
    /// Float, Bool and Str are hashable.
    pub fn hash_key(&self) -> Option<HashKey> {
        let digest = match self {
            Value::Int(n) => *n as u64,
            Value::Float(f) => f.to_bits(),
            Value::Bool(b) => u64::from(*b),
            Value::Str(s) => fnv1a(s.as_bytes()),
            _ => return None,
        };

        Some(HashKey {
            kind: self.type_name(),
            digest,
        })
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Return(a), Value::Return(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::Subroutine(a), Value::Subroutine(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin { name: a, .. }, Value::Builtin { name: b, .. }) => a == b,
            (Value::Module(a), Value::Module(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(v) => write!(f, "{}", format_float(*v)),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Str(s) => write!(f, "{}", s),
            Value::Array(elements) => {
                write!(f, "[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                write!(f, "]")
            }
            Value::Map(pairs) => {
                let pairs: Vec<String> = pairs
                    .values()
                    .map(|(k, v)| format!("{}: {}", k, v))
                    .collect();
                write!(f, "MAP {{{}}}", pairs.join(", "))
            }
            Value::Null => write!(f, "null"),
            Value::Return(value) => write!(f, "{}", value),
            Value::Error(msg) => write!(f, "ERROR: {}", msg),
            Value::Subroutine(sub) => {
                let params: Vec<&str> = sub.params.iter().map(|p| p.name.as_str()).collect();
                write!(f, "SUBROUTINE {}({})", sub.name, params.join(", "))
            }
            Value::Builtin { name, .. } => write!(f, "builtin function {}", name),
            Value::Module(module) => write!(f, "{}", module),
        }
    }
}
