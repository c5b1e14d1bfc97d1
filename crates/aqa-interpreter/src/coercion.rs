//! Arithmetic coercion, applied once before every infix dispatch.
//!
//! Rules:
//!   Int  op  Float  => Float op Float
//!   Float op  Int   => Float op Float
//!   Str  `+` Int    => Str + Str        (and the three mirror cases)
//!
//! Same-type pairs pass through untouched, which also makes the table
//! idempotent. String pairs under other arithmetic operators are handled by
//! the evaluator re-dispatching through integer parses, not here.

use crate::value::{format_float, Value};

pub fn int_to_float(n: i64) -> Value {
    Value::Float(n as f64)
}

pub fn int_to_string(n: i64) -> Value {
    Value::Str(n.to_string())
}

pub fn float_to_string(f: f64) -> Value {
    Value::Str(format_float(f))
}

/// Coerces the operands of an infix expression so the evaluator only has to
/// dispatch on same-kind pairs.
pub fn coerce_infix(left: Value, op: &str, right: Value) -> (Value, Value) {
    match (&left, op, &right) {
        (Value::Str(_), "+", Value::Int(n)) => {
            let n = *n;
            (left, int_to_string(n))
        }
        (Value::Str(_), "+", Value::Float(f)) => {
            let f = *f;
            (left, float_to_string(f))
        }
        (Value::Int(n), "+", Value::Str(_)) => (int_to_string(*n), right),
        (Value::Float(f), "+", Value::Str(_)) => (float_to_string(*f), right),
        (Value::Int(n), _, Value::Float(_)) => (int_to_float(*n), right),
        (Value::Float(_), _, Value::Int(n)) => (left, int_to_float(*n)),
        _ => (left, right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widens_ints_against_floats_for_any_operator() {
        for op in ["+", "-", "*", "/", "<", "=="] {
            let (l, r) = coerce_infix(Value::Int(1), op, Value::Float(2.5));
            assert_eq!(l, Value::Float(1.0));
            assert_eq!(r, Value::Float(2.5));

            let (l, r) = coerce_infix(Value::Float(2.5), op, Value::Int(1));
            assert_eq!(l, Value::Float(2.5));
            assert_eq!(r, Value::Float(1.0));
        }
    }

    #[test]
    fn stringifies_numbers_only_under_plus() {
        let (l, r) = coerce_infix(Value::Str("n=".into()), "+", Value::Int(3));
        assert_eq!(l, Value::Str("n=".into()));
        assert_eq!(r, Value::Str("3".into()));

        let (l, r) = coerce_infix(Value::Float(1.5), "+", Value::Str("!".into()));
        assert_eq!(l, Value::Str("1.5".into()));
        assert_eq!(r, Value::Str("!".into()));

        // Under any other operator a Str/Int pair passes through unchanged.
        let (l, r) = coerce_infix(Value::Str("5".into()), "*", Value::Int(3));
        assert_eq!(l, Value::Str("5".into()));
        assert_eq!(r, Value::Int(3));
    }

    #[test]
    fn coercion_is_idempotent() {
        let (l, r) = coerce_infix(Value::Int(1), "+", Value::Float(2.0));
        let (l2, r2) = coerce_infix(l.clone(), "+", r.clone());
        assert_eq!(l, l2);
        assert_eq!(r, r2);
    }
}
