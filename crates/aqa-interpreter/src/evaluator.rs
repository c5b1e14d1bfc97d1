//! The tree-walking evaluator.
//!
//! Every function here returns a [`Value`]; runtime failures are in-band
//! `Value::Error`s and `RETURN` statements travel as `Value::Return`
//! markers. The contract at every level is the same: on seeing an Error or
//! Return, stop and propagate.

use std::collections::HashMap;
use std::io::{self, BufRead};
use std::rc::Rc;

use aqa_syntax::ast::{Block, Expr, Ident, IfStmt, Program, Stmt, SubroutineDef};
use aqa_syntax::token::parse_int_literal;

use crate::builtins;
use crate::coercion::coerce_infix;
use crate::env::{EnvRef, Environment};
use crate::import::eval_import;
use crate::value::{SubroutineValue, Value};

/// Evaluates a whole program. An outer `Return` marker is unwrapped to its
/// contained value here; errors come back verbatim.
pub fn eval_program(program: &Program, env: &EnvRef) -> Value {
    let mut result = Value::Null;

    for stmt in &program.statements {
        match eval_stmt(stmt, env) {
            Value::Return(value) => return *value,
            Value::Error(msg) => return Value::Error(msg),
            value => result = value,
        }
    }

    result
}

/// Evaluates a block, preserving `Return` markers so enclosing subroutines
/// can see them.
fn eval_block(block: &Block, env: &EnvRef) -> Value {
    let mut result = Value::Null;

    for stmt in &block.statements {
        result = eval_stmt(stmt, env);
        if matches!(result, Value::Return(_) | Value::Error(_)) {
            return result;
        }
    }

    result
}

fn eval_stmt(stmt: &Stmt, env: &EnvRef) -> Value {
    match stmt {
        Stmt::Expr { expr, .. } => eval_expr(expr, env),
        Stmt::Assign { name, value, .. } => eval_assign(name, value, env),
        Stmt::Return { value, .. } => {
            let value = eval_expr(value, env);
            if value.is_error() {
                return value;
            }
            Value::Return(Box::new(value))
        }
        Stmt::Subroutine(def) => eval_subroutine_def(def, env),
        Stmt::If(stmt) => eval_if(stmt, env),
        Stmt::While { cond, body, .. } => eval_while(cond, body, env),
        Stmt::Repeat { body, until, .. } => eval_repeat(body, until, env),
        Stmt::For {
            var,
            lower,
            upper,
            body,
            ..
        } => eval_for(var, lower, upper, body, env),
        Stmt::Import(stmt) => eval_import(stmt, env),
    }
}

fn eval_assign(name: &Ident, value: &Expr, env: &EnvRef) -> Value {
    let value = eval_expr(value, env);
    if value.is_error() {
        return value;
    }

    if builtins::is_builtin(&name.name) {
        return Value::Error(format!("cannot assign to builtin: {}", name.name));
    }

    let result = if name.constant {
        env.borrow_mut().set_constant(&name.name, value)
    } else {
        env.borrow_mut().set(&name.name, value)
    };

    match result {
        Ok(()) => Value::Null,
        Err(msg) => Value::Error(msg),
    }
}

fn eval_subroutine_def(def: &SubroutineDef, env: &EnvRef) -> Value {
    if builtins::is_builtin(&def.name.name) {
        return Value::Error(format!("cannot assign to builtin: {}", def.name.name));
    }

    let sub = Value::Subroutine(Rc::new(SubroutineValue {
        name: def.name.name.clone(),
        params: def.params.clone(),
        body: def.body.clone(),
        env: Rc::clone(env),
    }));

    match env.borrow_mut().set(&def.name.name, sub) {
        Ok(()) => Value::Null,
        Err(msg) => Value::Error(msg),
    }
}

/// Truthiness for IF conditions: booleans as themselves, Null is an error,
/// anything else is truthy.
fn is_truthy(value: &Value) -> Result<bool, Value> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Null => Err(Value::Error("unknown operator: !null".into())),
        _ => Ok(true),
    }
}

fn eval_if(stmt: &IfStmt, env: &EnvRef) -> Value {
    let mut clause = Some(stmt);

    while let Some(current) = clause {
        let cond = eval_expr(&current.cond, env);
        if cond.is_error() {
            return cond;
        }

        match is_truthy(&cond) {
            Err(err) => return err,
            Ok(true) => return eval_block(&current.consequence, env),
            Ok(false) => clause = current.else_if.as_deref(),
        }
    }

    match &stmt.else_block {
        Some(block) => eval_block(block, env),
        None => Value::Null,
    }
}

fn eval_while(cond: &Expr, body: &Block, env: &EnvRef) -> Value {
    let mut result = Value::Null;

    loop {
        let value = eval_expr(cond, env);
        if value.is_error() {
            return value;
        }
        let Value::Bool(keep_going) = value else {
            return Value::Error(format!(
                "need a boolean for while loop, got={}",
                value.type_name()
            ));
        };
        if !keep_going {
            break;
        }

        result = eval_block(body, env);
        if matches!(result, Value::Return(_) | Value::Error(_)) {
            return result;
        }
    }

    result
}

/// `REPEAT … UNTIL cond` loops while the condition is false. The condition
/// is tested before the first iteration, so a REPEAT whose condition already
/// holds never runs its body.
fn eval_repeat(body: &Block, until: &Expr, env: &EnvRef) -> Value {
    let mut result = Value::Null;

    loop {
        let value = eval_expr(until, env);
        if value.is_error() {
            return value;
        }
        let Value::Bool(done) = value else {
            return Value::Error(format!(
                "need a boolean for repeat loop, got={}",
                value.type_name()
            ));
        };
        if done {
            break;
        }

        result = eval_block(body, env);
        if matches!(result, Value::Return(_) | Value::Error(_)) {
            return result;
        }
    }

    result
}

/// `FOR var <- lower TO upper` iterates inclusively on both bounds, binding
/// the loop variable in the enclosing environment each iteration. A lower
/// bound above the upper bound runs zero times.
fn eval_for(var: &Ident, lower: &Expr, upper: &Expr, body: &Block, env: &EnvRef) -> Value {
    let lower = eval_expr(lower, env);
    if lower.is_error() {
        return lower;
    }
    let Value::Int(lower) = lower else {
        return Value::Error(format!(
            "expected integer expression for `for` loop lower bound, got={}",
            lower.type_name()
        ));
    };

    let upper = eval_expr(upper, env);
    if upper.is_error() {
        return upper;
    }
    let Value::Int(upper) = upper else {
        return Value::Error(format!(
            "expected integer expression for `for` loop upper bound, got={}",
            upper.type_name()
        ));
    };

    let mut result = Value::Null;
    for i in lower..=upper {
        if builtins::is_builtin(&var.name) {
            return Value::Error(format!("cannot assign to builtin: {}", var.name));
        }
        if let Err(msg) = env.borrow_mut().set(&var.name, Value::Int(i)) {
            return Value::Error(msg);
        }

        result = eval_block(body, env);
        if matches!(result, Value::Return(_) | Value::Error(_)) {
            return result;
        }
    }

    result
}

pub fn eval_expr(expr: &Expr, env: &EnvRef) -> Value {
    match expr {
        Expr::IntLit { value, .. } => Value::Int(*value),
        Expr::FloatLit { value, .. } => Value::Float(*value),
        Expr::BoolLit { value, .. } => Value::Bool(*value),
        Expr::StringLit { value, .. } => Value::Str(value.clone()),
        Expr::Ident(ident) => eval_identifier(ident, env),

        Expr::ArrayLit { elements, .. } => match eval_expressions(elements, env) {
            Ok(values) => Value::Array(values),
            Err(err) => err,
        },
        Expr::MapLit { pairs, .. } => eval_map_literal(pairs, env),

        Expr::Prefix { op, right, .. } => {
            let right = eval_expr(right, env);
            if right.is_error() {
                return right;
            }
            eval_prefix(op, right)
        }

        Expr::Infix {
            left, op, right, ..
        } => {
            let left_value = eval_expr(left, env);
            if left_value.is_error() {
                return left_value;
            }

            if op == "." {
                let Expr::Ident(member) = right.as_ref() else {
                    return Value::Error(
                        "right-hand side of dot expression must be an identifier".into(),
                    );
                };
                return eval_dot(&left_value, &member.name);
            }

            let right_value = eval_expr(right, env);
            if right_value.is_error() {
                return right_value;
            }
            eval_infix(left_value, op, right_value)
        }

        Expr::Call { callee, args, .. } => {
            let callee = eval_expr(callee, env);
            if callee.is_error() {
                return callee;
            }
            let args = match eval_expressions(args, env) {
                Ok(values) => values,
                Err(err) => return err,
            };
            apply_subroutine(callee, args)
        }

        Expr::Index { left, index, .. } => {
            let left = eval_expr(left, env);
            if left.is_error() {
                return left;
            }
            let index = eval_expr(index, env);
            if index.is_error() {
                return index;
            }
            eval_index(&left, &index)
        }
    }
}

/// Evaluates expressions left to right; the first error short-circuits.
fn eval_expressions(exprs: &[Expr], env: &EnvRef) -> Result<Vec<Value>, Value> {
    let mut values = Vec::with_capacity(exprs.len());

    for expr in exprs {
        let value = eval_expr(expr, env);
        if value.is_error() {
            return Err(value);
        }
        values.push(value);
    }

    Ok(values)
}

/// Resolution order: environment chain, then the built-in table (uppercased
/// name), then `USERINPUT`, which reads a line from standard input.
fn eval_identifier(ident: &Ident, env: &EnvRef) -> Value {
    if let Some(value) = env.borrow().get(&ident.name) {
        return value;
    }

    if let Some(builtin) = builtins::lookup(&ident.name) {
        return builtin;
    }

    if ident.name == "USERINPUT" || ident.name == "userinput" {
        return read_user_input();
    }

    Value::Error(format!("identifier not found: {}", ident.name))
}

fn read_user_input() -> Value {
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line).is_err() {
        return Value::Error("could not read line from standard input".into());
    }
    Value::Str(line.trim_end_matches(['\n', '\r']).to_string())
}

/// Calls a user subroutine in a fresh frame over its captured environment,
/// or dispatches a built-in. A `Return` produced by the body is unwrapped
/// exactly once here.
pub fn apply_subroutine(callee: Value, args: Vec<Value>) -> Value {
    match callee {
        Value::Subroutine(sub) => {
            if args.len() != sub.params.len() {
                return Value::Error(format!(
                    "wrong number of arguments. got={}, want={}",
                    args.len(),
                    sub.params.len()
                ));
            }

            let frame = Environment::new_enclosed(&sub.env);
            for (param, arg) in sub.params.iter().zip(args) {
                if builtins::is_builtin(&param.name) {
                    return Value::Error(format!("cannot assign to builtin: {}", param.name));
                }
                if let Err(msg) = frame.borrow_mut().set(&param.name, arg) {
                    return Value::Error(msg);
                }
            }

            match eval_block(&sub.body, &frame) {
                Value::Return(value) => *value,
                other => other,
            }
        }

        Value::Builtin { func, .. } => func(args),

        other => Value::Error(format!(
            "not a subroutine, function or builtin: {}",
            other.type_name()
        )),
    }
}

fn eval_prefix(op: &str, right: Value) -> Value {
    match op {
        "!" | "NOT" => match right {
            Value::Bool(b) => Value::Bool(!b),
            Value::Null => Value::Error("unknown operator: !null".into()),
            other => Value::Error(format!("unknown operator: !{}", other.type_name())),
        },
        "-" => match right {
            Value::Int(n) => Value::Int(-n),
            Value::Float(f) => Value::Float(-f),
            other => Value::Error(format!("unknown operator: -{}", other.type_name())),
        },
        _ => Value::Error(format!("unknown operator: {}{}", op, right.type_name())),
    }
}

fn eval_infix(left: Value, op: &str, right: Value) -> Value {
    let (left, right) = coerce_infix(left, op, right);

    match (&left, &right) {
        (Value::Int(l), Value::Int(r)) => eval_integer_infix(*l, op, *r),
        (Value::Float(l), Value::Float(r)) => eval_float_infix(*l, op, *r),
        (Value::Str(l), Value::Str(r)) => eval_string_infix(l, op, r),
        (Value::Bool(l), Value::Bool(r)) => eval_boolean_infix(*l, op, *r),
        _ => {
            // Mixed hashable kinds still support equality, by hash key; Int 1
            // and Float 1.0 never reach this arm (coercion widened them).
            if op == "=" || op == "==" {
                if let (Some(l), Some(r)) = (left.hash_key(), right.hash_key()) {
                    return Value::Bool(l == r);
                }
            }

            if left.type_name() != right.type_name() {
                Value::Error(format!(
                    "type mismatch: {} {} {}",
                    left.type_name(),
                    op,
                    right.type_name()
                ))
            } else {
                Value::Error(format!(
                    "unknown operator: {} {} {}",
                    left.type_name(),
                    op,
                    right.type_name()
                ))
            }
        }
    }
}

/// Floor division; differs from Rust's truncating `/` on mixed-sign inputs.
fn floor_div(l: i64, r: i64) -> i64 {
    let quotient = l / r;
    if l % r != 0 && (l < 0) != (r < 0) {
        quotient - 1
    } else {
        quotient
    }
}

fn eval_integer_infix(l: i64, op: &str, r: i64) -> Value {
    match op {
        "+" => Value::Int(l.wrapping_add(r)),
        "-" => Value::Int(l.wrapping_sub(r)),
        "*" => Value::Int(l.wrapping_mul(r)),
        "/" => {
            if r == 0 {
                return Value::Error("division error: division by zero".into());
            }
            // Exact division stays an Integer; otherwise the result is a Float.
            if l % r == 0 {
                Value::Int(l / r)
            } else {
                Value::Float(l as f64 / r as f64)
            }
        }
        "DIV" => {
            if r == 0 {
                return Value::Error("division error: division by zero".into());
            }
            Value::Int(floor_div(l, r))
        }
        "MOD" => {
            if r == 0 {
                return Value::Error("division error: division by zero".into());
            }
            Value::Int(l % r)
        }
        "<<" => {
            if r < 0 {
                return Value::Error(format!(
                    "cannot perform bit shift using negative number: {} << {}",
                    l, r
                ));
            }
            if r >= 64 {
                Value::Int(0)
            } else {
                Value::Int(l.wrapping_shl(r as u32))
            }
        }
        ">>" => {
            if r < 0 {
                return Value::Error(format!(
                    "cannot perform bit shift using negative number: {} >> {}",
                    l, r
                ));
            }
            if r >= 64 {
                Value::Int(if l < 0 { -1 } else { 0 })
            } else {
                Value::Int(l >> r as u32)
            }
        }
        "==" | "=" => Value::Bool(l == r),
        "!=" => Value::Bool(l != r),
        ">" => Value::Bool(l > r),
        "<" => Value::Bool(l < r),
        ">=" => Value::Bool(l >= r),
        "<=" => Value::Bool(l <= r),
        _ => Value::Error(format!("unknown operator: INTEGER {} INTEGER", op)),
    }
}

fn eval_float_infix(l: f64, op: &str, r: f64) -> Value {
    match op {
        "+" => Value::Float(l + r),
        "-" => Value::Float(l - r),
        "*" => Value::Float(l * r),
        "/" => {
            if r == 0.0 {
                return Value::Error("division error: division by zero".into());
            }
            Value::Float(l / r)
        }
        "DIV" => {
            if r == 0.0 {
                return Value::Error("division error: division by zero".into());
            }
            Value::Int((l / r).floor() as i64)
        }
        "==" | "=" => Value::Bool(l == r),
        "!=" => Value::Bool(l != r),
        ">" => Value::Bool(l > r),
        "<" => Value::Bool(l < r),
        ">=" => Value::Bool(l >= r),
        "<=" => Value::Bool(l <= r),
        _ => Value::Error(format!("unknown operator: FLOAT {} FLOAT", op)),
    }
}

fn eval_string_infix(l: &str, op: &str, r: &str) -> Value {
    match op {
        "+" => Value::Str(format!("{}{}", l, r)),
        "==" | "=" => Value::Bool(l == r),
        "!=" => Value::Bool(l != r),
        _ => {
            // Arithmetic on strings re-dispatches through integer parses of
            // both operands.
            match (parse_int_literal(l), parse_int_literal(r)) {
                (Some(l), Some(r)) => eval_integer_infix(l, op, r),
                _ => Value::Error(format!("unknown operator: STRING {} STRING", op)),
            }
        }
    }
}

fn eval_boolean_infix(l: bool, op: &str, r: bool) -> Value {
    match op {
        "==" | "=" => Value::Bool(l == r),
        "!=" => Value::Bool(l != r),
        "AND" => Value::Bool(l && r),
        "OR" => Value::Bool(l || r),
        "XOR" => Value::Bool(l != r),
        _ => Value::Error(format!("unknown operator: BOOLEAN {} BOOLEAN", op)),
    }
}

fn eval_index(left: &Value, index: &Value) -> Value {
    match (left, index) {
        (Value::Array(elements), Value::Int(idx)) => {
            if *idx < 0 || *idx as usize >= elements.len() {
                return Value::Error(format!("index out of bounds: {}", idx));
            }
            elements[*idx as usize].clone()
        }
        (Value::Str(s), Value::Int(idx)) => {
            if *idx < 0 || *idx as usize >= s.len() {
                return Value::Error(format!("index out of bounds: {}", idx));
            }
            Value::Str((s.as_bytes()[*idx as usize] as char).to_string())
        }
        (Value::Map(pairs), _) => match index.hash_key() {
            Some(key) => pairs
                .get(&key)
                .map(|(_, value)| value.clone())
                .unwrap_or(Value::Null),
            None => Value::Error(format!("unusable as hash key: {}", index.type_name())),
        },
        _ => Value::Error(format!(
            "index operator not supported: {}",
            left.type_name()
        )),
    }
}

fn eval_map_literal(pairs: &[(Expr, Expr)], env: &EnvRef) -> Value {
    let mut map = HashMap::new();

    for (key_expr, value_expr) in pairs {
        let key = eval_expr(key_expr, env);
        if key.is_error() {
            return key;
        }
        let Some(hash) = key.hash_key() else {
            return Value::Error(format!("unusable as hash key: {}", key.type_name()));
        };

        let value = eval_expr(value_expr, env);
        if value.is_error() {
            return value;
        }

        // Duplicate keys overwrite.
        map.insert(hash, (key, value));
    }

    Value::Map(map)
}

/// `module.member`: the member must exist in the module's environment and be
/// in its exposed set.
fn eval_dot(left: &Value, member: &str) -> Value {
    let Value::Module(module) = left else {
        return Value::Error(format!(
            "cannot use dot operator on {}",
            left.type_name()
        ));
    };

    let Some(value) = module.env.borrow().get(member) else {
        return Value::Error(format!("unknown child {:?} in {}", member, module));
    };

    if !module.exposed.contains(member) {
        return Value::Error(format!("unexposed child {:?} in {}", member, module));
    }

    value
}
