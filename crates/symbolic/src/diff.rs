//! Symbolic differentiation.
//!
//! Returns `None` where no usable derivative exists: `abs` and `floor`
//! are not differentiable where it matters for line thickness, and
//! non-constant exponents are out of scope. Callers are expected to
//! fall back to a non-slope-adjusted rendering in that case.

use crate::ast::{BinaryOp, Expr, Func};

/// Derivative of `expr` with respect to `var`, unreduced. Run
/// [`Expr::simplified`] on the result before display or code generation.
pub fn differentiate(expr: &Expr, var: &str) -> Option<Expr> {
    Some(match expr {
        Expr::Number(_) => Expr::Number(0.0),
        Expr::Variable(name) => {
            if name == var {
                Expr::Number(1.0)
            } else {
                Expr::Number(0.0)
            }
        }
        Expr::Neg(inner) => Expr::neg(differentiate(inner, var)?),
        Expr::Binary(op, lhs, rhs) => {
            let dl = differentiate(lhs, var)?;
            match op {
                BinaryOp::Add => Expr::binary(BinaryOp::Add, dl, differentiate(rhs, var)?),
                BinaryOp::Sub => Expr::binary(BinaryOp::Sub, dl, differentiate(rhs, var)?),
                BinaryOp::Mul => {
                    let dr = differentiate(rhs, var)?;
                    Expr::binary(
                        BinaryOp::Add,
                        Expr::binary(BinaryOp::Mul, dl, (**rhs).clone()),
                        Expr::binary(BinaryOp::Mul, (**lhs).clone(), dr),
                    )
                }
                BinaryOp::Div => {
                    let dr = differentiate(rhs, var)?;
                    // (l'r - lr') / r^2
                    Expr::binary(
                        BinaryOp::Div,
                        Expr::binary(
                            BinaryOp::Sub,
                            Expr::binary(BinaryOp::Mul, dl, (**rhs).clone()),
                            Expr::binary(BinaryOp::Mul, (**lhs).clone(), dr),
                        ),
                        Expr::binary(BinaryOp::Pow, (**rhs).clone(), Expr::Number(2.0)),
                    )
                }
                BinaryOp::Pow => {
                    // Only constant exponents: n * f^(n-1) * f'
                    let Expr::Number(n) = **rhs else {
                        return None;
                    };
                    Expr::binary(
                        BinaryOp::Mul,
                        Expr::binary(
                            BinaryOp::Mul,
                            Expr::Number(n),
                            Expr::binary(BinaryOp::Pow, (**lhs).clone(), Expr::Number(n - 1.0)),
                        ),
                        dl,
                    )
                }
            }
        }
        Expr::Call(func, arg) => {
            let outer = function_derivative(*func, arg)?;
            Expr::binary(BinaryOp::Mul, outer, differentiate(arg, var)?)
        }
    })
}

/// d/du f(u), or `None` when the function has no usable derivative.
fn function_derivative(func: Func, arg: &Expr) -> Option<Expr> {
    let u = || arg.clone();
    Some(match func {
        Func::Sin => Expr::call(Func::Cos, u()),
        Func::Cos => Expr::neg(Expr::call(Func::Sin, u())),
        Func::Tan => Expr::binary(
            BinaryOp::Div,
            Expr::Number(1.0),
            Expr::binary(
                BinaryOp::Pow,
                Expr::call(Func::Cos, u()),
                Expr::Number(2.0),
            ),
        ),
        Func::Asin => Expr::binary(
            BinaryOp::Div,
            Expr::Number(1.0),
            Expr::call(
                Func::Sqrt,
                Expr::binary(
                    BinaryOp::Sub,
                    Expr::Number(1.0),
                    Expr::binary(BinaryOp::Pow, u(), Expr::Number(2.0)),
                ),
            ),
        ),
        Func::Acos => Expr::neg(function_derivative(Func::Asin, arg)?),
        Func::Atan => Expr::binary(
            BinaryOp::Div,
            Expr::Number(1.0),
            Expr::binary(
                BinaryOp::Add,
                Expr::Number(1.0),
                Expr::binary(BinaryOp::Pow, u(), Expr::Number(2.0)),
            ),
        ),
        Func::Sqrt => Expr::binary(
            BinaryOp::Div,
            Expr::Number(1.0),
            Expr::binary(
                BinaryOp::Mul,
                Expr::Number(2.0),
                Expr::call(Func::Sqrt, u()),
            ),
        ),
        Func::Exp => Expr::call(Func::Exp, u()),
        Func::Ln => Expr::binary(BinaryOp::Div, Expr::Number(1.0), u()),
        Func::Abs | Func::Floor => return None,
    })
}
