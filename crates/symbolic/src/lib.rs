//! Symbolic math support for the graphpaper calculator.
//!
//! The crate turns raw equation text into a small closed AST, reduces it,
//! differentiates it, and renders it back out either as human-readable
//! notation or as shader-dialect source. The flow is:
//!
//! ```text
//!   "x^2+y^2-4"          "y = sin(x)"
//!        │ parse()             │
//!        ▼                     ▼
//!   Parsed::Expression    Parsed::Equation
//!        │ simplified()        │ difference()
//!        ▼                     ▼
//!      Expr ── differentiate() / to_glsl() / eval() / Display
//! ```
//!
//! Everything is a plain value type; no interning, no shared ownership.
//! The renderer crate consumes `Expr` for code generation and the GUI
//! shows `Display` notation back to the user.

mod ast;
mod codegen;
mod diff;
mod parse;
mod simplify;

pub use ast::{BinaryOp, Equation, Expr, Func, Parsed};
pub use codegen::{glsl_number, CodegenError};
pub use diff::differentiate;
pub use parse::{parse, ParseError};
