//! Renders an [`Expr`] as shader-dialect source.
//!
//! Output is a float-typed GLSL expression over the caller-supplied
//! variable names. Every binary node is parenthesised so the emitted
//! text never depends on GLSL precedence, which keeps synthesized
//! programs byte-stable for identical inputs. Small integer powers are
//! expanded into products because GLSL `pow` is undefined for negative
//! bases, and curves like `y = x^2` must exist for negative `x`.

use std::fmt::Write;

use thiserror::Error;

use crate::ast::{BinaryOp, Expr, Func};

#[derive(Debug, Error, PartialEq)]
pub enum CodegenError {
    #[error("variable `{0}` is not available in this context")]
    UnknownVariable(String),
}

impl Expr {
    /// Emits the expression as GLSL over the named free variables, in
    /// the given order. Any other free variable is an error.
    pub fn to_glsl(&self, vars: &[&str]) -> Result<String, CodegenError> {
        let mut out = String::new();
        emit(self, vars, &mut out)?;
        Ok(out)
    }
}

fn emit(expr: &Expr, vars: &[&str], out: &mut String) -> Result<(), CodegenError> {
    match expr {
        Expr::Number(n) => out.push_str(&glsl_number(*n)),
        Expr::Variable(name) => {
            if !vars.contains(&name.as_str()) {
                return Err(CodegenError::UnknownVariable(name.clone()));
            }
            out.push_str(name);
        }
        Expr::Neg(inner) => {
            out.push_str("(-");
            emit(inner, vars, out)?;
            out.push(')');
        }
        Expr::Binary(BinaryOp::Pow, base, exponent) => match integer_exponent(exponent) {
            Some(power) => {
                let mut base_code = String::new();
                emit(base, vars, &mut base_code)?;
                out.push('(');
                for i in 0..power {
                    if i > 0 {
                        out.push('*');
                    }
                    out.push_str(&base_code);
                }
                out.push(')');
            }
            None => {
                out.push_str("pow(");
                emit(base, vars, out)?;
                out.push(',');
                emit(exponent, vars, out)?;
                out.push(')');
            }
        },
        Expr::Binary(op, lhs, rhs) => {
            let symbol = match op {
                BinaryOp::Add => '+',
                BinaryOp::Sub => '-',
                BinaryOp::Mul => '*',
                BinaryOp::Div => '/',
                BinaryOp::Pow => unreachable!("handled above"),
            };
            out.push('(');
            emit(lhs, vars, out)?;
            out.push(symbol);
            emit(rhs, vars, out)?;
            out.push(')');
        }
        Expr::Call(func, arg) => {
            let name = match func {
                // GLSL spells the natural logarithm `log`.
                Func::Ln => "log",
                other => other.name(),
            };
            let _ = write!(out, "{name}(");
            emit(arg, vars, out)?;
            out.push(')');
        }
    }
    Ok(())
}

/// Exponents expanded to repeated multiplication instead of `pow`.
/// The cap keeps emitted expressions bounded; beyond it `pow` applies
/// and negative bases are on their own.
fn integer_exponent(expr: &Expr) -> Option<u32> {
    match expr {
        Expr::Number(n) if n.fract() == 0.0 && (2.0..=8.0).contains(n) => Some(*n as u32),
        _ => None,
    }
}

/// Formats a constant so GLSL reads it as a float literal.
pub fn glsl_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{n:.1}")
    } else {
        format!("{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Parsed;
    use crate::parse::parse;

    fn glsl(text: &str, vars: &[&str]) -> Result<String, CodegenError> {
        let Parsed::Expression(expr) = parse(text).expect("parse") else {
            panic!("expected expression");
        };
        expr.simplified().to_glsl(vars)
    }

    #[test]
    fn emits_float_literals() {
        assert_eq!(glsl("4", &[]).expect("glsl"), "4.0");
        assert_eq!(glsl("0.5", &[]).expect("glsl"), "0.5");
        assert_eq!(glsl("-4", &[]).expect("glsl"), "-4.0");
    }

    #[test]
    fn expands_small_integer_powers() {
        assert_eq!(glsl("x^2", &["x"]).expect("glsl"), "(x*x)");
        assert_eq!(glsl("x^3", &["x"]).expect("glsl"), "(x*x*x)");
        assert_eq!(glsl("x^9", &["x"]).expect("glsl"), "pow(x,9.0)");
        assert_eq!(glsl("x^0.5", &["x"]).expect("glsl"), "pow(x,0.5)");
    }

    #[test]
    fn odd_powers_survive_negative_bases() {
        // GLSL pow is undefined for negative bases, so every power a
        // plotted polynomial plausibly uses must avoid it.
        assert_eq!(glsl("x^5", &["x"]).expect("glsl"), "(x*x*x*x*x)");
        assert_eq!(glsl("x^7", &["x"]).expect("glsl"), "(x*x*x*x*x*x*x)");
        assert_eq!(
            glsl("x^8", &["x"]).expect("glsl"),
            "(x*x*x*x*x*x*x*x)"
        );
        // CPU oracle for the emitted product form at a negative x.
        let Parsed::Expression(expr) = parse("x^5").expect("parse") else {
            panic!("expected expression");
        };
        assert_eq!(expr.eval(&[("x", -2.0)]), Some(-32.0));
    }

    #[test]
    fn fully_parenthesises_binaries() {
        assert_eq!(
            glsl("x^2+y^2-4", &["x", "y"]).expect("glsl"),
            "(((x*x)+(y*y))-4.0)"
        );
    }

    #[test]
    fn maps_ln_to_log() {
        assert_eq!(glsl("ln(x)", &["x"]).expect("glsl"), "log(x)");
        assert_eq!(glsl("floor(x/2)", &["x"]).expect("glsl"), "floor((x/2.0))");
    }

    #[test]
    fn rejects_unknown_variables() {
        assert_eq!(
            glsl("x+z", &["x", "y"]),
            Err(CodegenError::UnknownVariable("z".into()))
        );
    }
}
