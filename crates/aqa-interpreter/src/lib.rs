//! Runtime for AQA pseudocode.
//!
//! This crate walks the AST produced by `aqa-parser` against a
//! lexically-scoped environment: the value model, arithmetic coercion, the
//! built-in library, control flow and import resolution all live here.
//! Runtime failures are in-band [`Value::Error`]s; there are no exceptions
//! and no catch/recover inside the language.

pub mod builtins;
pub mod coercion;
pub mod env;
pub mod evaluator;
pub mod import;
pub mod value;

pub use env::{EnvRef, Environment};
pub use evaluator::{eval_expr, eval_program};
pub use value::{HashKey, Module, Value};

use std::io::Read;

use aqa_lexer::Lexer;
use aqa_parser::Parser;
use aqa_syntax::error::Error;

/// Evaluates a source string against the given environment.
///
/// Parse errors come back as a positioned error list with a Null value; an
/// evaluation error comes back as a single-element list. On success the
/// program's value is returned with an empty list.
pub fn eval_string(source: &str, env: &EnvRef) -> (Value, Vec<Error>) {
    let mut parser = Parser::new(Lexer::new(source));
    let program = parser.parse_program();

    if !parser.errors().is_empty() {
        let errors = parser.errors().iter().map(|e| e.to_error()).collect();
        return (Value::Null, errors);
    }

    match eval_program(&program, env) {
        Value::Error(msg) => (Value::Null, vec![Error::new(msg)]),
        value => (value, Vec::new()),
    }
}

/// Reads AQA source to the end of `reader` and evaluates it.
pub fn eval_file<R: Read>(reader: &mut R, env: &EnvRef) -> (Value, Vec<Error>) {
    let mut source = String::new();
    if let Err(err) = reader.read_to_string(&mut source) {
        let msg = format!("could not read source: {}", err);
        return (Value::Null, vec![Error::new(msg)]);
    }

    eval_string(&source, env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn run(input: &str) -> Value {
        let env = Environment::new();
        let mut parser = Parser::new(Lexer::new(input));
        let program = parser.parse_program();
        assert!(
            parser.errors().is_empty(),
            "parse errors for {:?}: {:?}",
            input,
            parser.errors()
        );
        eval_program(&program, &env)
    }

    fn expect_int(input: &str, expected: i64) {
        assert_eq!(run(input), Value::Int(expected), "input: {input}");
    }

    fn expect_float(input: &str, expected: f64) {
        let Value::Float(actual) = run(input) else {
            panic!("expected a float for {input:?}, got {:?}", run(input));
        };
        assert!(
            (actual - expected).abs() < 1e-9,
            "input: {input}, got {actual}"
        );
    }

    fn expect_bool(input: &str, expected: bool) {
        assert_eq!(run(input), Value::Bool(expected), "input: {input}");
    }

    fn expect_str(input: &str, expected: &str) {
        assert_eq!(
            run(input),
            Value::Str(expected.to_string()),
            "input: {input}"
        );
    }

    fn expect_null(input: &str) {
        assert_eq!(run(input), Value::Null, "input: {input}");
    }

    fn expect_error(input: &str, fragment: &str) {
        let result = run(input);
        let Value::Error(msg) = result else {
            panic!("expected an error for {input:?}, got {result:?}");
        };
        assert!(
            msg.contains(fragment),
            "error {msg:?} does not contain {fragment:?}"
        );
    }

    #[test]
    fn integer_arithmetic() {
        expect_int("5", 5);
        expect_int("-5", -5);
        expect_int("5 + 5 + 5 + 5 - 10", 10);
        expect_int("2 * 2 * 2 * 2 * 2", 32);
        expect_int("-50 + 100 + -50", 0);
        expect_int("5 * 2 + 10", 20);
        expect_int("5 + 2 * 10", 25);
        expect_int("50 / 2 * 2 + 10", 60);
        expect_int("2 * (5 + 10)", 30);
        expect_int("(5 + 10 * 2 + 15 / 3) * 2 + -10", 50);
    }

    #[test]
    fn division_returns_int_only_when_exact() {
        expect_int("6 / 3", 2);
        expect_float("7 / 2", 3.5);
        expect_int("7 DIV 2", 3);
        expect_int("-7 DIV 2", -4);
        expect_int("7 MOD 2", 1);

        expect_error("5 / 0", "division by zero");
        expect_error("5 DIV 0", "division by zero");
        expect_error("5 MOD 0", "division by zero");
    }

    #[test]
    fn bit_shifts() {
        expect_int("1 << 4", 16);
        expect_int("16 >> 2", 4);
        expect_int("1 << 2 + 1", 8);
        expect_error("1 << -1", "cannot perform bit shift using negative number");
        expect_error("1 >> -1", "cannot perform bit shift using negative number");
    }

    #[test]
    fn numeric_literals_in_all_bases_evaluate() {
        expect_int("0x10 + 0b1", 17);
        expect_int("0xFF", 255);
        expect_float("1.25 * 2", 2.5);
    }

    #[test]
    fn float_arithmetic_and_coercion() {
        expect_float("2.5 + 1.5", 4.0);
        expect_float("1 + 2.5", 3.5);
        expect_float("2.5 * 2", 5.0);
        expect_int("7.0 DIV 2", 3);
        expect_bool("2.5 == 2.5", true);
        expect_bool("1 == 1.0", true);
        expect_error("1.0 / 0", "division by zero");
    }

    #[test]
    fn boolean_expressions() {
        expect_bool("true", true);
        expect_bool("TRUE", true);
        expect_bool("false", false);
        expect_bool("1 < 2", true);
        expect_bool("1 > 2", false);
        expect_bool("1 == 1", true);
        expect_bool("1 = 1", true);
        expect_bool("1 != 2", true);
        expect_bool("(1 < 2) == true", true);
        expect_bool("true AND false", false);
        expect_bool("true OR false", true);
        expect_bool("true XOR true", false);
        expect_bool("true XOR false", true);
        expect_bool("!true", false);
        expect_bool("!!false", false);
        expect_bool("NOT false", true);
        // BOOLEAN binds tighter than PREFIX: NOT (true OR true).
        expect_bool("NOT true OR true", false);

        expect_error("!5", "unknown operator: !INTEGER");
    }

    #[test]
    fn string_operations() {
        expect_str("\"Hello\" + \" \" + \"World!\"", "Hello World!");
        expect_bool("'abc' == 'abc'", true);
        expect_bool("'abc' != 'abd'", true);
        // Arithmetic on strings re-dispatches through integer parses.
        expect_int("'5' * '3'", 15);
        expect_bool("'9' < '10'", true);
        expect_error("'a' - 'b'", "unknown operator: STRING - STRING");

        // Stringifying coercions under +.
        expect_str("'x=' + 5", "x=5");
        expect_str("5 + '!'", "5!");
        expect_str("1.5 + 's'", "1.5s");
        expect_str("'v' + 2.0", "v2.0");
    }

    #[test]
    fn mixed_kind_equality_uses_hash_keys() {
        expect_bool("1 == true", false);
        expect_bool("'1' == 1", false);
        expect_bool("'a' = 'a'", true);
        expect_error("5 + true", "type mismatch: INTEGER + BOOLEAN");
        expect_error("[1] + [2]", "unknown operator: ARRAY + ARRAY");
    }

    #[test]
    fn if_statements() {
        expect_int("IF true THEN 10 ENDIF", 10);
        expect_null("IF false THEN 10 ENDIF");
        expect_int("IF 1 THEN 10 ENDIF", 10);
        expect_int("IF 1 > 2 THEN 10 ELSE 20 ENDIF", 20);
        expect_int("IF 1 == 0 THEN 1 ELSE IF 1 == 2 THEN 2 ELSE 3 ENDIF", 3);
        expect_int(
            "IF 1 == 0 THEN 1 ELSE IF 1 == 2 THEN 2 ELSE IF 1 == 1 THEN 4 ELSE 3 ENDIF",
            4,
        );
        expect_int("IF false THEN 10 ELSE\n20\nENDIF", 20);

        // A Null condition is an error in a boolean context.
        expect_error("m <- MAP {}\nIF m['x'] THEN 1 ENDIF", "unknown operator: !null");
    }

    #[test]
    fn return_statements() {
        expect_int("return 10", 10);
        expect_int("return 10\n9", 10);
        expect_int("return 2 * 5\n9", 10);
        expect_int("9\nreturn 10\n9", 10);
        expect_int(
            "IF 10 > 1 THEN\nIF 10 > 1 THEN\nreturn 10\nENDIF\nreturn 1\nENDIF",
            10,
        );
    }

    #[test]
    fn while_loops() {
        expect_int("a <- 0\nWHILE a < 10\n  a <- a + 1\nENDWHILE\nreturn a", 10);
        expect_error("WHILE 1\nENDWHILE", "need a boolean for while loop, got=INTEGER");
        // A RETURN inside the body leaves the loop immediately.
        expect_int("a <- 0\nWHILE a < 10\n  return 42\nENDWHILE", 42);
    }

    #[test]
    fn for_loops_are_inclusive_on_both_bounds() {
        expect_int("a <- 0\nFOR i <- 1 TO 10\n  a <- a + i\nENDFOR\nreturn a", 55);
        expect_int("a <- 0\nFOR i <- 3 TO 3\n  a <- a + i\nENDFOR\nreturn a", 3);
        // lower > upper runs zero times.
        expect_int("a <- 0\nFOR i <- 5 TO 1\n  a <- a + 1\nENDFOR\nreturn a", 0);
        // The loop variable lives in the enclosing scope.
        expect_int("FOR i <- 1 TO 3\nENDFOR\nreturn i", 3);

        expect_error("FOR i <- 1.5 TO 3\nENDFOR", "lower bound");
        expect_error("FOR i <- 1 TO true\nENDFOR", "upper bound");
        expect_error("FOR LEN <- 1 TO 3\nENDFOR", "cannot assign to builtin: LEN");
    }

    #[test]
    fn repeat_tests_its_condition_before_the_first_iteration() {
        // Condition already true: the body never runs.
        expect_int("a <- 5\nREPEAT\n  a <- a + 1\nUNTIL a > 3\nreturn a", 5);
        // Otherwise the body runs until the condition becomes true.
        expect_int("a <- 0\nREPEAT\n  a <- a + 1\nUNTIL a == 3\nreturn a", 3);
        expect_error("REPEAT\nUNTIL 5", "need a boolean for repeat loop, got=INTEGER");
    }

    #[test]
    fn subroutines() {
        expect_int(
            "SUBROUTINE add(x, y)\nreturn x + y\nENDSUBROUTINE\nadd(add(1, 2), add(3, 4))",
            10,
        );
        expect_int(
            "SUBROUTINE fact(n)\nIF n == 0 THEN\nreturn 1\nENDIF\nreturn n * fact(n - 1)\nENDSUBROUTINE\nfact(5)",
            120,
        );
        expect_int("SUBROUTINE nop()\nENDSUBROUTINE\nnop()\nreturn 7", 7);

        expect_error(
            "SUBROUTINE f(x)\nreturn x\nENDSUBROUTINE\nf(1, 2)",
            "wrong number of arguments. got=2, want=1",
        );
        expect_error("x <- 5\nx(1)", "not a subroutine, function or builtin: INTEGER");
    }

    #[test]
    fn subroutine_assignments_shadow_instead_of_mutating_outer_scope() {
        expect_int(
            "a <- 1\nSUBROUTINE f()\na <- 2\nreturn a\nENDSUBROUTINE\nf()\nreturn a",
            1,
        );
    }

    #[test]
    fn constants_are_write_once_and_survive_captures() {
        expect_error("CONSTANT a <- 1\na <- 2", "cannot assign to constant: a");
        expect_error("CONSTANT a <- 1\nCONSTANT a <- 2", "cannot assign to constant: a");
        expect_int(
            "CONSTANT k <- 10\nSUBROUTINE f(x)\nreturn x + k\nENDSUBROUTINE\nf(5)",
            15,
        );
    }

    #[test]
    fn builtin_names_cannot_be_shadowed() {
        expect_error("LEN <- 5", "cannot assign to builtin: LEN");
        // Mixed-case spellings are identifiers, but still resolve to the
        // builtin table for the shadowing check.
        expect_error("Len <- 5", "cannot assign to builtin: Len");
        expect_error(
            "SUBROUTINE LEN()\nENDSUBROUTINE",
            "cannot assign to builtin: LEN",
        );
        expect_error(
            "SUBROUTINE f(OUTPUT)\nENDSUBROUTINE\nf(1)",
            "cannot assign to builtin: OUTPUT",
        );
    }

    #[test]
    fn builtins_dispatch_through_calls() {
        expect_int("LEN([1, 2, 3]) + LEN(\"ab\")", 5);
        expect_str("SUBSTRING(2, 9, \"computer science\")", "mputer s");
        expect_error("SUBSTRING(2, -1, \"hello\")", "invalid bounds");
        expect_int("FLOOR(2.9)", 2);
        expect_float("SQRT(9)", 3.0);
        expect_int("SUM([1, 2, 3])", 6);
        expect_int("STRING_TO_INT('42')", 42);
        // Case-insensitive lookup.
        expect_int("len('abc')", 3);
        // An error in an argument short-circuits the call.
        expect_error("LEN(missing)", "identifier not found: missing");
    }

    #[test]
    fn array_and_string_indexing() {
        expect_int("[1, 2, 3][1]", 2);
        expect_str("\"hello\"[1]", "e");
        expect_int("xs <- [1, 2, 3]\nreturn xs[0] + xs[2]", 4);
        expect_error("[1, 2, 3][5]", "index out of bounds: 5");
        expect_error("[1, 2, 3][-1]", "index out of bounds: -1");
        expect_error("5[0]", "index operator not supported: INTEGER");
    }

    #[test]
    fn map_literals_and_indexing() {
        expect_int("m <- MAP { \"a\": 1, \"b\": 2 }\nreturn m[\"a\"] + m[\"b\"]", 3);
        expect_null("m <- MAP { \"a\": 1 }\nreturn m[\"c\"]");
        // Duplicate keys overwrite.
        expect_int("MAP { 'a': 1, 'a': 2 }['a']", 2);
        // Int and Float keys are distinct.
        expect_null("m <- MAP { 1: 'int' }\nreturn m[1.0]");
        expect_str("m <- MAP { 1: 'int', true: 'bool' }\nreturn m[true]", "bool");

        expect_error("MAP { [1]: 2 }", "unusable as hash key: ARRAY");
        expect_error("m <- MAP {}\nreturn m[[1]]", "unusable as hash key: ARRAY");
    }

    #[test]
    fn errors_abort_loops_and_statement_lists() {
        expect_error("FOR i <- 1 TO 3\n  i + missing\nENDFOR", "identifier not found");
        expect_error("a <- 0\nWHILE a < 3\n  a <- a + missing\nENDWHILE", "identifier not found");
        expect_error("missing\nreturn 1", "identifier not found: missing");
    }

    #[test]
    fn imports_bind_whole_modules() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mathlib.aqa");
        std::fs::write(
            &path,
            "CONSTANT k <- 10\nSUBROUTINE double(x)\nreturn x * 2\nENDSUBROUTINE\n",
        )
        .unwrap();

        let input = format!(
            "IMPORT \"{}\" AS m\nreturn m.double(21) + m.k",
            path.display()
        );
        assert_eq!(run(&input), Value::Int(52));
    }

    #[test]
    fn imports_derive_default_aliases_from_filenames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("my-lib.aqa");
        std::fs::write(&path, "SUBROUTINE triple(x)\nreturn x * 3\nENDSUBROUTINE\n").unwrap();

        let input = format!("IMPORT \"{}\"\nreturn my_lib.triple(4)", path.display());
        assert_eq!(run(&input), Value::Int(12));
    }

    #[test]
    fn selective_imports_attach_modules() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lib.aqa");
        std::fs::write(
            &path,
            "SUBROUTINE double(x)\nreturn x * 2\nENDSUBROUTINE\nSUBROUTINE hidden()\nreturn 0\nENDSUBROUTINE\n",
        )
        .unwrap();

        let input = format!("IMPORT double FROM \"{}\"\nreturn double(4)", path.display());
        assert_eq!(run(&input), Value::Int(8));

        // Unlisted names stay invisible.
        let input = format!("IMPORT double FROM \"{}\"\nreturn hidden()", path.display());
        let Value::Error(msg) = run(&input) else {
            panic!("expected an error");
        };
        assert!(msg.contains("identifier not found: hidden"));

        // FROM * exposes everything.
        let input = format!(
            "IMPORT * FROM \"{}\"\nreturn double(2) + hidden()",
            path.display()
        );
        assert_eq!(run(&input), Value::Int(4));
    }

    #[test]
    fn import_failure_modes() {
        expect_error("IMPORT \"no_such_file.aqa\"", "could not read import");

        let dir = tempfile::tempdir().unwrap();
        let input = format!("IMPORT \"{}\"", dir.path().display());
        let Value::Error(msg) = run(&input) else {
            panic!("expected an error");
        };
        assert!(msg.contains("not yet implemented"));

        let bad = dir.path().join("bad.aqa");
        std::fs::write(&bad, "IF true\n").unwrap();
        let input = format!("IMPORT \"{}\"", bad.display());
        let Value::Error(msg) = run(&input) else {
            panic!("expected an error");
        };
        assert!(msg.contains("could not parse file"));

        let lib = dir.path().join("lib.aqa");
        std::fs::write(&lib, "x <- 1\n").unwrap();
        let input = format!("IMPORT nope FROM \"{}\"", lib.display());
        let Value::Error(msg) = run(&input) else {
            panic!("expected an error");
        };
        assert!(msg.contains("no function/variable \"nope\""));
    }

    #[test]
    fn dot_respects_module_exposure() {
        let module_env = Environment::new();
        module_env.borrow_mut().set("visible", Value::Int(1)).unwrap();
        module_env.borrow_mut().set("hidden", Value::Int(2)).unwrap();

        let module = Rc::new(Module {
            env: module_env,
            exposed: ["visible".to_string()].into_iter().collect(),
            path: "lib.aqa".into(),
            is_builtin: false,
        });

        let env = Environment::new();
        env.borrow_mut().set("m", Value::Module(module)).unwrap();

        let (value, errors) = eval_string("return m.visible", &env);
        assert!(errors.is_empty());
        assert_eq!(value, Value::Int(1));

        let (_, errors) = eval_string("return m.hidden", &env);
        assert!(errors[0].msg.contains("unexposed child \"hidden\""));

        let (_, errors) = eval_string("return m.nope", &env);
        assert!(errors[0].msg.contains("unknown child \"nope\""));
    }

    #[test]
    fn dot_requires_a_module() {
        expect_error("x <- 5\nreturn x.y", "cannot use dot operator on INTEGER");
    }

    #[test]
    fn eval_string_reports_errors_per_contract() {
        let env = Environment::new();

        let (value, errors) = eval_string("a <- 1\nreturn a + 1", &env);
        assert!(errors.is_empty());
        assert_eq!(value, Value::Int(2));

        let (value, errors) = eval_string("IF true\n1\nENDIF", &env);
        assert_eq!(value, Value::Null);
        assert!(!errors.is_empty());
        assert!(errors[0].line.is_some());

        let (value, errors) = eval_string("missing", &env);
        assert_eq!(value, Value::Null);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].msg.contains("identifier not found"));
    }

    #[test]
    fn eval_file_reads_from_any_reader() {
        let env = Environment::new();
        let mut reader = std::io::Cursor::new(b"a <- 2\nreturn a * 21".to_vec());

        let (value, errors) = eval_file(&mut reader, &env);
        assert!(errors.is_empty());
        assert_eq!(value, Value::Int(42));
    }
}
