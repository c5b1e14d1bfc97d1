//! Import resolution.
//!
//! An import evaluates another file in a fresh root environment and either
//! binds the resulting module under a name (whole-module import) or attaches
//! it to the importing environment's module list (selective import). Paths
//! resolve relative to the process working directory.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use aqa_lexer::Lexer;
use aqa_parser::Parser;
use aqa_syntax::ast::ImportStmt;

use crate::env::{EnvRef, Environment};
use crate::evaluator::eval_program;
use crate::value::{Module, Value};

/// Derives the default binding name for an imported path: the file's
/// basename minus extension, with runs of non-alphanumeric characters
/// collapsed to `_`.
pub fn path_to_module_name(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    let base = trimmed.rsplit('/').next().unwrap_or(trimmed);
    let stem = match base.rfind('.') {
        Some(pos) if pos > 0 => &base[..pos],
        _ => base,
    };

    let mut name = String::with_capacity(stem.len());
    let mut in_run = false;
    for ch in stem.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            name.push(ch);
            in_run = false;
        } else if !in_run {
            name.push('_');
            in_run = true;
        }
    }
    name
}

pub fn eval_import(stmt: &ImportStmt, env: &EnvRef) -> Value {
    let metadata = match fs::metadata(Path::new(&stmt.path)) {
        Ok(metadata) => metadata,
        Err(_) => return Value::Error(format!("could not read import {:?}", stmt.path)),
    };

    if metadata.is_dir() {
        return Value::Error("directory imports are not yet implemented".into());
    }

    eval_file_import(stmt, env)
}

fn eval_file_import(stmt: &ImportStmt, env: &EnvRef) -> Value {
    let source = match fs::read_to_string(&stmt.path) {
        Ok(source) => source,
        Err(_) => return Value::Error(format!("could not read file {:?}", stmt.path)),
    };

    let mut parser = Parser::new(Lexer::new(&source));
    let program = parser.parse_program();
    if !parser.errors().is_empty() {
        let messages: Vec<String> = parser.errors().iter().map(ToString::to_string).collect();
        return Value::Error(format!(
            "could not parse file {:?}: {}",
            stmt.path,
            messages.join("\n")
        ));
    }

    let file_env = Environment::new();
    if let Value::Error(msg) = eval_program(&program, &file_env) {
        return Value::Error(format!(
            "error importing file, error during evaluation: {}",
            msg
        ));
    }

    let expose_all = stmt.from.is_empty() || stmt.from.iter().any(|name| name == "*");
    let exposed: HashSet<String> = if expose_all {
        file_env.borrow().names()
    } else {
        stmt.from.iter().cloned().collect()
    };

    let module = Rc::new(Module {
        env: file_env,
        exposed,
        path: stmt.path.clone(),
        is_builtin: false,
    });

    // A selective import must name things that actually exist.
    for wanted in &stmt.from {
        if wanted == "*" {
            continue;
        }
        if module.env.borrow().get(wanted).is_none() {
            return Value::Error(format!("no function/variable {:?} in {}", wanted, module));
        }
    }

    if stmt.from.is_empty() {
        let name = stmt
            .alias
            .clone()
            .unwrap_or_else(|| path_to_module_name(&stmt.path));
        if let Err(msg) = env.borrow_mut().set(&name, Value::Module(module)) {
            return Value::Error(msg);
        }
    } else {
        env.borrow_mut().add_module(module);
    }

    Value::Null
}
