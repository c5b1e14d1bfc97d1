//! AQA pseudocode syntax definitions and abstract syntax tree.
//!
//! This crate provides the foundational syntax elements for the AQA
//! pseudocode interpreter: token definitions, abstract syntax tree (AST)
//! nodes and shared error types. Every other crate in the workspace depends
//! on these types.
//!
//! # Overview
//!
//! - [`token`]: token kinds, positions and the keyword table
//! - [`ast`]: AST node definitions with canonical printing
//! - [`error`]: shared error and result types
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │             Evaluator               │  <- Walks the AST
//! ├─────────────────────────────────────┤
//! │              Parser                 │  <- Produces the AST
//! ├─────────────────────────────────────┤
//! │               Lexer                 │  <- Produces Tokens
//! ├─────────────────────────────────────┤
//! │           Source Code               │  <- Raw text input
//! └─────────────────────────────────────┘
//! ```
//!
//! A note on case: AQA pseudocode keywords are recognised both as `WHILE`
//! and `while`, but never in mixed case — `While` is an ordinary
//! identifier. See [`token::lookup_ident`].

/// Token definitions and the keyword table.
pub mod token;

/// Abstract syntax tree node definitions.
pub mod ast;

/// Error handling utilities and types.
pub mod error;

pub use ast::*;
pub use error::{Error, Result};
pub use token::{Token, TokenKind};
