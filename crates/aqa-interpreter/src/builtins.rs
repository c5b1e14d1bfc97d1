//! The fixed built-in function table.
//!
//! Built-ins are plain function pointers keyed by uppercase name; lookup is
//! case-insensitive. Each one validates its own arity and argument kinds and
//! reports problems as in-band `Error` values.

use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::process;
use std::sync::OnceLock;

use rand::Rng;

use aqa_syntax::token::parse_int_literal;

use crate::value::{format_float, BuiltinFn, Value};

static BUILTINS: OnceLock<HashMap<&'static str, BuiltinFn>> = OnceLock::new();

fn table() -> &'static HashMap<&'static str, BuiltinFn> {
    BUILTINS.get_or_init(|| {
        let mut table: HashMap<&'static str, BuiltinFn> = HashMap::new();

        table.insert("LEN", builtin_len as BuiltinFn);
        table.insert("POSITION", builtin_position);
        table.insert("SUBSTRING", builtin_substring);
        table.insert("SLICE", builtin_slice);

        table.insert("STRING_TO_INT", builtin_string_to_int);
        table.insert("INT_TO_STRING", builtin_int_to_string);
        table.insert("STRING_TO_REAL", builtin_string_to_real);
        table.insert("REAL_TO_STRING", builtin_real_to_string);
        table.insert("CHAR_TO_CODE", builtin_char_to_code);
        table.insert("CODE_TO_CHAR", builtin_code_to_char);

        table.insert("RANDOM_INT", builtin_random_int);

        table.insert("OUTPUT", builtin_output);
        table.insert("PRINT", builtin_print);
        table.insert("INPUT", builtin_input);

        table.insert("FLOOR", builtin_floor);
        table.insert("CEIL", builtin_ceil);
        table.insert("SQRT", builtin_sqrt);
        table.insert("SUM", builtin_sum);

        table.insert("EXIT", builtin_exit);

        table
    })
}

/// Case-insensitive lookup of a built-in by name.
pub fn lookup(name: &str) -> Option<Value> {
    let upper = name.to_ascii_uppercase();
    table()
        .get_key_value(upper.as_str())
        .map(|(name, func)| Value::Builtin {
            name: *name,
            func: *func,
        })
}

/// Whether `name` (in any case) names a built-in. Assigning to such a name
/// is an error.
pub fn is_builtin(name: &str) -> bool {
    table().contains_key(name.to_ascii_uppercase().as_str())
}

fn wrong_arity(got: usize, want: &str) -> Value {
    Value::Error(format!(
        "wrong number of arguments. got={}, want={}",
        got, want
    ))
}

// ---- string / array ----

fn builtin_len(args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return wrong_arity(args.len(), "1");
    }

    match &args[0] {
        Value::Str(s) => Value::Int(s.len() as i64),
        Value::Array(elements) => Value::Int(elements.len() as i64),
        other => Value::Error(format!(
            "argument to `LEN` not supported, got={}",
            other.type_name()
        )),
    }
}

fn builtin_position(args: Vec<Value>) -> Value {
    if args.len() != 2 {
        return wrong_arity(args.len(), "2");
    }

    match (&args[0], &args[1]) {
        (Value::Str(haystack), Value::Str(needle)) => {
            for (i, ch) in haystack.bytes().enumerate() {
                if needle.len() == 1 && needle.as_bytes()[0] == ch {
                    return Value::Int(i as i64);
                }
            }
            Value::Null
        }
        (Value::Str(_), other) => Value::Error(format!(
            "argument to `POSITION` not supported, got={}",
            other.type_name()
        )),
        (Value::Array(elements), needle) => {
            for (i, element) in elements.iter().enumerate() {
                if element == needle {
                    return Value::Int(i as i64);
                }
            }
            Value::Null
        }
        (other, _) => Value::Error(format!(
            "argument to `POSITION` not supported, got={}",
            other.type_name()
        )),
    }
}

fn builtin_substring(args: Vec<Value>) -> Value {
    if args.len() != 3 {
        return wrong_arity(args.len(), "3");
    }

    let Value::Int(start) = args[0] else {
        return Value::Error(format!(
            "argument 1 to `SUBSTRING` not supported, got={}",
            args[0].type_name()
        ));
    };
    let Value::Int(end) = args[1] else {
        return Value::Error(format!(
            "argument 2 to `SUBSTRING` not supported, got={}",
            args[1].type_name()
        ));
    };
    let Value::Str(s) = &args[2] else {
        return Value::Error(format!(
            "argument 3 to `SUBSTRING` not supported, got={}",
            args[2].type_name()
        ));
    };

    // Inclusive on both ends.
    if start > end || start < 0 || end < 0 || end >= s.len() as i64 {
        return Value::Error(format!(
            "invalid bounds [{}:{}] in call to SUBSTRING",
            start, end
        ));
    }

    Value::Str(s[start as usize..=end as usize].to_string())
}

fn builtin_slice(args: Vec<Value>) -> Value {
    if args.len() != 3 {
        return wrong_arity(args.len(), "3");
    }

    let Value::Int(start) = args[0] else {
        return Value::Error(format!(
            "argument 1 to `SLICE` not supported, got={}",
            args[0].type_name()
        ));
    };
    let Value::Int(end) = args[1] else {
        return Value::Error(format!(
            "argument 2 to `SLICE` not supported, got={}",
            args[1].type_name()
        ));
    };
    let Value::Array(elements) = &args[2] else {
        return Value::Error(format!(
            "argument 3 to `SLICE` not supported, got={}",
            args[2].type_name()
        ));
    };

    if start > end || start < 0 || end < 0 || end >= elements.len() as i64 {
        return Value::Error(format!(
            "invalid bounds [{}:{}] in call to SLICE",
            start, end
        ));
    }

    Value::Array(elements[start as usize..=end as usize].to_vec())
}

// ---- conversion ----

fn builtin_string_to_int(args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return wrong_arity(args.len(), "1");
    }

    let Value::Str(s) = &args[0] else {
        return Value::Error(format!(
            "argument to `STRING_TO_INT` not supported, got={}",
            args[0].type_name()
        ));
    };

    match parse_int_literal(s) {
        Some(n) => Value::Int(n),
        None => Value::Error(format!(
            "failed to convert {:?} to integer in call to `STRING_TO_INT`",
            s
        )),
    }
}

fn builtin_int_to_string(args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return wrong_arity(args.len(), "1");
    }

    match args[0] {
        Value::Int(n) => Value::Str(n.to_string()),
        ref other => Value::Error(format!(
            "argument to `INT_TO_STRING` not supported, got={}",
            other.type_name()
        )),
    }
}

fn builtin_string_to_real(args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return wrong_arity(args.len(), "1");
    }

    let Value::Str(s) = &args[0] else {
        return Value::Error(format!(
            "argument to `STRING_TO_REAL` not supported, got={}",
            args[0].type_name()
        ));
    };

    match s.parse::<f64>() {
        Ok(f) => Value::Float(f),
        Err(_) => Value::Error(format!(
            "failed to convert {:?} to real in call to `STRING_TO_REAL`",
            s
        )),
    }
}

fn builtin_real_to_string(args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return wrong_arity(args.len(), "1");
    }

    match args[0] {
        Value::Float(f) => Value::Str(format_float(f)),
        ref other => Value::Error(format!(
            "argument to `REAL_TO_STRING` not supported, got={}",
            other.type_name()
        )),
    }
}

fn builtin_char_to_code(args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return wrong_arity(args.len(), "1");
    }

    let Value::Str(s) = &args[0] else {
        return Value::Error(format!(
            "argument to `CHAR_TO_CODE` not supported, got={}",
            args[0].type_name()
        ));
    };

    if s.len() != 1 {
        return Value::Error(format!(
            "argument to `CHAR_TO_CODE` not supported, cannot convert multiple characters, got={}",
            s
        ));
    }

    Value::Int(i64::from(s.as_bytes()[0]))
}

fn builtin_code_to_char(args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return wrong_arity(args.len(), "1");
    }

    match args[0] {
        Value::Int(code) => Value::Str(((code as u8) as char).to_string()),
        ref other => Value::Error(format!(
            "argument to `CODE_TO_CHAR` not supported, got={}",
            other.type_name()
        )),
    }
}

// ---- numeric ----

fn builtin_random_int(args: Vec<Value>) -> Value {
    if args.len() != 2 {
        return wrong_arity(args.len(), "2");
    }

    let Value::Int(lower) = args[0] else {
        return Value::Error(format!(
            "argument 1 to `RANDOM_INT` not supported, got={}",
            args[0].type_name()
        ));
    };
    let Value::Int(upper) = args[1] else {
        return Value::Error(format!(
            "argument 2 to `RANDOM_INT` not supported, got={}",
            args[1].type_name()
        ));
    };

    if upper < lower {
        return Value::Error(format!(
            "invalid bounds [{}:{}] in call to RANDOM_INT",
            lower, upper
        ));
    }

    // Inclusive on both ends.
    Value::Int(rand::thread_rng().gen_range(lower..=upper))
}

fn builtin_floor(args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return wrong_arity(args.len(), "1");
    }

    match args[0] {
        Value::Float(f) => Value::Int(f.floor() as i64),
        Value::Int(n) => Value::Int(n),
        ref other => Value::Error(format!(
            "argument to `FLOOR` not supported, got={}",
            other.type_name()
        )),
    }
}

fn builtin_ceil(args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return wrong_arity(args.len(), "1");
    }

    match args[0] {
        Value::Float(f) => Value::Int(f.ceil() as i64),
        Value::Int(n) => Value::Int(n),
        ref other => Value::Error(format!(
            "argument to `CEIL` not supported, got={}",
            other.type_name()
        )),
    }
}

fn builtin_sqrt(args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return wrong_arity(args.len(), "1");
    }

    match args[0] {
        Value::Float(f) => Value::Float(f.sqrt()),
        Value::Int(n) => Value::Float((n as f64).sqrt()),
        ref other => Value::Error(format!(
            "argument to `SQRT` not supported, got={}",
            other.type_name()
        )),
    }
}

fn builtin_sum(args: Vec<Value>) -> Value {
    if args.len() != 1 {
        // Varargs form: SUM(1, 2, 3) sums its arguments as an array.
        return builtin_sum(vec![Value::Array(args)]);
    }

    let Value::Array(elements) = &args[0] else {
        return Value::Error(format!(
            "argument to `SUM` not supported, got={}",
            args[0].type_name()
        ));
    };

    let mut int_total: i64 = 0;
    let mut float_total: f64 = 0.0;
    let mut any_float = false;

    for element in elements {
        match element {
            Value::Int(n) => int_total += n,
            Value::Float(f) => {
                float_total += f;
                any_float = true;
            }
            other => {
                return Value::Error(format!(
                    "array value '{}' is not a float or integer in call to `SUM`, got={}",
                    other,
                    other.type_name()
                ));
            }
        }
    }

    if any_float {
        Value::Float(int_total as f64 + float_total)
    } else {
        Value::Int(int_total)
    }
}

// ---- I/O ----

fn builtin_output(args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return wrong_arity(args.len(), "1");
    }

    println!("{}", args[0]);
    Value::Null
}

fn builtin_print(args: Vec<Value>) -> Value {
    let parts: Vec<String> = args.iter().map(ToString::to_string).collect();
    println!("{}", parts.join(" "));
    Value::Null
}

fn builtin_input(args: Vec<Value>) -> Value {
    if args.len() > 1 {
        return wrong_arity(args.len(), "0 or 1");
    }

    if let Some(prompt) = args.first() {
        let Value::Str(prompt) = prompt else {
            return Value::Error(format!(
                "argument to `INPUT` not supported, got={}",
                prompt.type_name()
            ));
        };
        print!("{}", prompt);
        let _ = io::stdout().flush();
    }

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line).is_err() {
        return Value::Error("could not read line from standard input".into());
    }

    Value::Str(line.trim_end_matches(['\n', '\r']).to_string())
}

// ---- system ----

fn builtin_exit(args: Vec<Value>) -> Value {
    match args.len() {
        0 => process::exit(0),
        1 => match args[0] {
            Value::Int(code) => process::exit(code as i32),
            ref other => Value::Error(format!(
                "argument to EXIT not supported: {}",
                other.type_name()
            )),
        },
        got => wrong_arity(got, "0|1"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert!(lookup("LEN").is_some());
        assert!(lookup("len").is_some());
        assert!(lookup("Len").is_some());
        assert!(lookup("missing").is_none());

        assert!(is_builtin("output"));
        assert!(!is_builtin("total"));
    }

    #[test]
    fn len_counts_strings_and_arrays() {
        assert_eq!(builtin_len(vec![Value::Str("hello".into())]), Value::Int(5));
        assert_eq!(
            builtin_len(vec![Value::Array(vec![Value::Int(1), Value::Int(2)])]),
            Value::Int(2)
        );
        assert_eq!(
            builtin_len(vec![Value::Int(1)]),
            Value::Error("argument to `LEN` not supported, got=INTEGER".into())
        );
        assert_eq!(
            builtin_len(vec![]),
            Value::Error("wrong number of arguments. got=0, want=1".into())
        );
    }

    #[test]
    fn substring_is_inclusive_and_bounds_checked() {
        assert_eq!(
            builtin_substring(vec![
                Value::Int(2),
                Value::Int(9),
                Value::Str("computer science".into())
            ]),
            Value::Str("mputer s".into())
        );

        let err = builtin_substring(vec![Value::Int(2), Value::Int(-1), Value::Str("hello".into())]);
        let Value::Error(msg) = err else {
            panic!("expected an error");
        };
        assert!(msg.contains("invalid bounds"));
    }

    #[test]
    fn slice_is_inclusive_and_bounds_checked() {
        let arr = Value::Array(vec![
            Value::Int(1),
            Value::Int(2),
            Value::Int(3),
            Value::Int(4),
        ]);

        assert_eq!(
            builtin_slice(vec![Value::Int(1), Value::Int(2), arr.clone()]),
            Value::Array(vec![Value::Int(2), Value::Int(3)])
        );

        let err = builtin_slice(vec![Value::Int(0), Value::Int(4), arr]);
        assert!(matches!(err, Value::Error(msg) if msg.contains("invalid bounds")));
    }

    #[test]
    fn position_finds_first_match_or_null() {
        assert_eq!(
            builtin_position(vec![Value::Str("hello".into()), Value::Str("l".into())]),
            Value::Int(2)
        );
        assert_eq!(
            builtin_position(vec![Value::Str("hello".into()), Value::Str("z".into())]),
            Value::Null
        );
        assert_eq!(
            builtin_position(vec![
                Value::Array(vec![Value::Int(5), Value::Int(7)]),
                Value::Int(7)
            ]),
            Value::Int(1)
        );
        assert_eq!(
            builtin_position(vec![
                Value::Array(vec![Value::Int(5)]),
                Value::Int(9)
            ]),
            Value::Null
        );
    }

    #[test]
    fn conversions_round_trip() {
        assert_eq!(
            builtin_string_to_int(vec![Value::Str("42".into())]),
            Value::Int(42)
        );
        assert_eq!(
            builtin_string_to_int(vec![Value::Str("0x10".into())]),
            Value::Int(16)
        );
        assert_eq!(
            builtin_int_to_string(vec![Value::Int(42)]),
            Value::Str("42".into())
        );
        assert_eq!(
            builtin_string_to_real(vec![Value::Str("2.5".into())]),
            Value::Float(2.5)
        );
        assert_eq!(
            builtin_real_to_string(vec![Value::Float(2.5)]),
            Value::Str("2.5".into())
        );
        assert_eq!(
            builtin_real_to_string(vec![Value::Float(2.0)]),
            Value::Str("2.0".into())
        );

        assert!(builtin_string_to_int(vec![Value::Str("nope".into())]).is_error());
        assert!(builtin_string_to_real(vec![Value::Str("nope".into())]).is_error());
    }

    #[test]
    fn char_code_conversions() {
        assert_eq!(
            builtin_char_to_code(vec![Value::Str("A".into())]),
            Value::Int(65)
        );
        assert_eq!(
            builtin_code_to_char(vec![Value::Int(97)]),
            Value::Str("a".into())
        );
        assert!(builtin_char_to_code(vec![Value::Str("AB".into())]).is_error());
    }

    #[test]
    fn numeric_builtins() {
        assert_eq!(builtin_floor(vec![Value::Float(2.9)]), Value::Int(2));
        assert_eq!(builtin_floor(vec![Value::Int(7)]), Value::Int(7));
        assert_eq!(builtin_ceil(vec![Value::Float(2.1)]), Value::Int(3));
        assert_eq!(builtin_sqrt(vec![Value::Int(9)]), Value::Float(3.0));
        assert_eq!(builtin_sqrt(vec![Value::Float(2.25)]), Value::Float(1.5));
    }

    #[test]
    fn sum_types_follow_the_elements() {
        assert_eq!(
            builtin_sum(vec![Value::Array(vec![Value::Int(1), Value::Int(2)])]),
            Value::Int(3)
        );
        assert_eq!(
            builtin_sum(vec![Value::Array(vec![Value::Int(1), Value::Float(0.5)])]),
            Value::Float(1.5)
        );
        // Varargs form.
        assert_eq!(
            builtin_sum(vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
            Value::Int(6)
        );
        assert!(builtin_sum(vec![Value::Array(vec![Value::Bool(true)])]).is_error());
    }

    #[test]
    fn random_int_stays_in_bounds() {
        for _ in 0..50 {
            let Value::Int(n) = builtin_random_int(vec![Value::Int(3), Value::Int(7)]) else {
                panic!("expected an integer");
            };
            assert!((3..=7).contains(&n));
        }

        // Both ends inclusive: a single-point range is fine.
        assert_eq!(
            builtin_random_int(vec![Value::Int(4), Value::Int(4)]),
            Value::Int(4)
        );
        assert!(builtin_random_int(vec![Value::Int(7), Value::Int(3)]).is_error());
    }

    #[test]
    fn exit_rejects_bad_arguments_without_exiting() {
        assert!(builtin_exit(vec![Value::Str("no".into())]).is_error());
        assert!(builtin_exit(vec![Value::Int(1), Value::Int(2)]).is_error());
    }
}
