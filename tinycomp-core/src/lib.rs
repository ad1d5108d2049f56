//! Core compiler pipeline for the tinycomp language.
//!
//! tinycomp is a small statically typed procedural language compiled to
//! JavaScript. The pipeline is:
//!
//!   source
//!     -> lexer       (tokens)
//!     -> parser      (AST)
//!     -> typecheck   (name resolution + types, producing HIR)
//!     -> lower       (by-reference calls become write-backs)
//!     -> codegen_js  (JavaScript text)
//!
//! The CLI depends on this crate rather than reimplementing the pipeline.

// ---------------------------------------------------------------------
// Error handling and diagnostics
// ---------------------------------------------------------------------

pub mod span;
pub mod error;

// ---------------------------------------------------------------------
// Front-end: lexing and parsing
// ---------------------------------------------------------------------

pub mod lexer;
pub mod parser;
pub mod ast;

// ---------------------------------------------------------------------
// Semantic layers: types, scopes, type checking, HIR
// ---------------------------------------------------------------------

pub mod eq;
pub mod types;
pub mod builtins;
pub mod scope;
pub mod reachability;
pub mod typecheck;
pub mod hir;

// ---------------------------------------------------------------------
// Back-end: lowering, code generation and compiler orchestration
// ---------------------------------------------------------------------

pub mod lower;
pub mod naming;
pub mod codegen_js;
pub mod compiler;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use codegen_js::generate_js;
pub use compiler::{compile, compile_to_string};
pub use error::{CompileError, CoreError};
pub use parser::parse;
pub use typecheck::analyze;
