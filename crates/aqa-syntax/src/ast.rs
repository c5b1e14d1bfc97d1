//! AST (abstract syntax tree) types for AQA pseudocode.
//!
//! Every node keeps the token it started at so diagnostics can point back
//! into the source. The `Display` implementations print a canonical form in
//! which operator precedence is manifest: `a + b * c` prints as
//! `(a + (b * c))`.

use std::fmt;

use crate::token::Token;

/// An identifier reference or binding target. `constant` marks the target of
/// a `CONSTANT` assignment as write-once.
#[derive(Debug, Clone)]
pub struct Ident {
    pub token: Token,
    pub name: String,
    pub constant: bool,
}

impl Ident {
    pub fn new(token: Token) -> Self {
        let name = token.literal.clone();
        Self {
            token,
            name,
            constant: false,
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Expressions (literals, operations, calls, containers).
#[derive(Debug, Clone)]
pub enum Expr {
    Ident(Ident),
    IntLit {
        token: Token,
        value: i64,
    },
    FloatLit {
        token: Token,
        value: f64,
    },
    BoolLit {
        token: Token,
        value: bool,
    },
    StringLit {
        token: Token,
        value: String,
    },
    Prefix {
        token: Token,
        op: String,
        right: Box<Expr>,
    },
    Infix {
        token: Token,
        left: Box<Expr>,
        op: String,
        right: Box<Expr>,
    },
    Call {
        token: Token,
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Index {
        token: Token,
        left: Box<Expr>,
        index: Box<Expr>,
    },
    ArrayLit {
        token: Token,
        elements: Vec<Expr>,
    },
    /// Pair insertion order is kept for deterministic evaluation order, but
    /// is irrelevant to the resulting map's semantics.
    MapLit {
        token: Token,
        pairs: Vec<(Expr, Expr)>,
    },
}

impl Expr {
    /// The token this expression started at.
    pub fn token(&self) -> &Token {
        match self {
            Expr::Ident(ident) => &ident.token,
            Expr::IntLit { token, .. }
            | Expr::FloatLit { token, .. }
            | Expr::BoolLit { token, .. }
            | Expr::StringLit { token, .. }
            | Expr::Prefix { token, .. }
            | Expr::Infix { token, .. }
            | Expr::Call { token, .. }
            | Expr::Index { token, .. }
            | Expr::ArrayLit { token, .. }
            | Expr::MapLit { token, .. } => token,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Ident(ident) => write!(f, "{}", ident),
            Expr::IntLit { value, .. } => write!(f, "{}", value),
            Expr::FloatLit { value, .. } => write!(f, "{}", value),
            Expr::BoolLit { value, .. } => write!(f, "{}", value),
            Expr::StringLit { value, .. } => write!(f, "{}", value),
            Expr::Prefix { op, right, .. } => write!(f, "({}{})", op, right),
            Expr::Infix {
                left, op, right, ..
            } => write!(f, "({} {} {})", left, op, right),
            Expr::Call { callee, args, .. } => {
                let args: Vec<String> = args.iter().map(ToString::to_string).collect();
                write!(f, "{}({})", callee, args.join(", "))
            }
            Expr::Index { left, index, .. } => write!(f, "({}[{}])", left, index),
            Expr::ArrayLit { elements, .. } => {
                let elements: Vec<String> = elements.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", elements.join(", "))
            }
            Expr::MapLit { pairs, .. } => {
                let pairs: Vec<String> = pairs
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v))
                    .collect();
                write!(f, "MAP {{{}}}", pairs.join(", "))
            }
        }
    }
}

/// A keyword-delimited run of statements, e.g. the body between `THEN` and
/// `ENDIF`.
#[derive(Debug, Clone)]
pub struct Block {
    pub token: Token,
    pub statements: Vec<Stmt>,
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            write!(f, "{}", stmt)?;
        }
        Ok(())
    }
}

/// An `IF … THEN … ELSE IF … ELSE … ENDIF` statement. A chain of `ELSE IF`
/// clauses is represented by nesting in `else_if`; the final `ELSE` block, if
/// any, hangs off the outermost statement.
#[derive(Debug, Clone)]
pub struct IfStmt {
    pub token: Token,
    pub cond: Expr,
    pub consequence: Block,
    pub else_if: Option<Box<IfStmt>>,
    pub else_block: Option<Block>,
}

impl fmt::Display for IfStmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IF {} THEN {}", self.cond, self.consequence)?;

        let mut current = self.else_if.as_deref();
        while let Some(clause) = current {
            write!(f, " ELSE IF {} THEN {}", clause.cond, clause.consequence)?;
            current = clause.else_if.as_deref();
        }

        if let Some(else_block) = &self.else_block {
            write!(f, " ELSE {}", else_block)?;
        }

        write!(f, " ENDIF")
    }
}

/// A subroutine definition.
#[derive(Debug, Clone)]
pub struct SubroutineDef {
    pub token: Token,
    pub name: Ident,
    pub params: Vec<Ident>,
    pub body: Block,
}

impl fmt::Display for SubroutineDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self.params.iter().map(ToString::to_string).collect();
        write!(
            f,
            "SUBROUTINE {}({}) {} ENDSUBROUTINE",
            self.name,
            params.join(", "),
            self.body
        )
    }
}

/// One of the four import forms:
/// `IMPORT "path"`, `IMPORT "path" AS name`, `IMPORT a, b FROM "path"`,
/// `IMPORT * FROM "path"`.
#[derive(Debug, Clone)]
pub struct ImportStmt {
    pub token: Token,
    pub path: String,
    pub alias: Option<String>,
    pub from: Vec<String>,
}

impl fmt::Display for ImportStmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IMPORT \"{}\"", self.path)
    }
}

/// Statements (bindings, control flow, definitions, imports).
#[derive(Debug, Clone)]
pub enum Stmt {
    Expr {
        token: Token,
        expr: Expr,
    },
    Assign {
        token: Token,
        name: Ident,
        value: Expr,
    },
    Return {
        token: Token,
        value: Expr,
    },
    Subroutine(SubroutineDef),
    If(IfStmt),
    While {
        token: Token,
        cond: Expr,
        body: Block,
    },
    Repeat {
        token: Token,
        body: Block,
        until: Expr,
    },
    For {
        token: Token,
        var: Ident,
        lower: Expr,
        upper: Expr,
        body: Block,
    },
    Import(ImportStmt),
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Expr { expr, .. } => write!(f, "{}", expr),
            Stmt::Assign { name, value, .. } => {
                if name.constant {
                    write!(f, "CONSTANT ")?;
                }
                write!(f, "{} <- {}", name, value)
            }
            Stmt::Return { value, .. } => write!(f, "return {}", value),
            Stmt::Subroutine(def) => write!(f, "{}", def),
            Stmt::If(stmt) => write!(f, "{}", stmt),
            Stmt::While { cond, body, .. } => write!(f, "WHILE {} {} ENDWHILE", cond, body),
            Stmt::Repeat { body, until, .. } => write!(f, "REPEAT {} UNTIL {}", body, until),
            Stmt::For {
                var,
                lower,
                upper,
                body,
                ..
            } => write!(f, "FOR {} <- {} TO {} {} ENDFOR", var, lower, upper, body),
            Stmt::Import(stmt) => write!(f, "{}", stmt),
        }
    }
}

/// A parsed source file: a sequence of statements.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            write!(f, "{}", stmt)?;
        }
        Ok(())
    }
}
