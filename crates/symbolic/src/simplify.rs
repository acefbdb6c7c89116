//! Bottom-up algebraic reduction.
//!
//! Children are simplified first, then each node applies constant
//! folding and the usual identities. The result is what the shader
//! synthesizer and the display notation both consume, so reductions
//! must be value-preserving, never approximations.

use crate::ast::{BinaryOp, Equation, Expr, Parsed};

impl Expr {
    /// Returns a reduced copy of the expression.
    pub fn simplified(&self) -> Expr {
        match self {
            Expr::Number(_) | Expr::Variable(_) => self.clone(),
            Expr::Neg(inner) => simplify_neg(inner.simplified()),
            Expr::Binary(op, lhs, rhs) => {
                simplify_binary(*op, lhs.simplified(), rhs.simplified())
            }
            Expr::Call(func, arg) => {
                let arg = arg.simplified();
                if let Expr::Number(n) = arg {
                    let value = func.apply(n);
                    if value.is_finite() {
                        return Expr::Number(value);
                    }
                }
                Expr::call(*func, arg)
            }
        }
    }
}

impl Equation {
    pub fn simplified(&self) -> Equation {
        Equation {
            lhs: self.lhs.simplified(),
            rhs: self.rhs.simplified(),
        }
    }
}

impl Parsed {
    /// Reduces the payload, preserving the variant.
    pub fn simplified(&self) -> Parsed {
        match self {
            Parsed::Equation(eq) => Parsed::Equation(eq.simplified()),
            Parsed::Expression(expr) => Parsed::Expression(expr.simplified()),
        }
    }
}

fn simplify_neg(inner: Expr) -> Expr {
    match inner {
        Expr::Number(n) => Expr::Number(-n),
        Expr::Neg(deep) => *deep,
        other => Expr::neg(other),
    }
}

fn is_zero(expr: &Expr) -> bool {
    matches!(expr, Expr::Number(n) if *n == 0.0)
}

fn is_one(expr: &Expr) -> bool {
    matches!(expr, Expr::Number(n) if *n == 1.0)
}

fn simplify_binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    if let (Expr::Number(a), Expr::Number(b)) = (&lhs, &rhs) {
        let value = match op {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
            BinaryOp::Pow => a.powf(*b),
        };
        if value.is_finite() {
            return Expr::Number(value);
        }
    }

    match op {
        BinaryOp::Add => {
            if is_zero(&lhs) {
                return rhs;
            }
            if is_zero(&rhs) {
                return lhs;
            }
        }
        BinaryOp::Sub => {
            if is_zero(&rhs) {
                return lhs;
            }
            if is_zero(&lhs) {
                return simplify_neg(rhs);
            }
        }
        BinaryOp::Mul => {
            if is_zero(&lhs) || is_zero(&rhs) {
                return Expr::Number(0.0);
            }
            if is_one(&lhs) {
                return rhs;
            }
            if is_one(&rhs) {
                return lhs;
            }
        }
        BinaryOp::Div => {
            if is_one(&rhs) {
                return lhs;
            }
            if is_zero(&lhs) && !is_zero(&rhs) {
                return Expr::Number(0.0);
            }
        }
        BinaryOp::Pow => {
            if is_one(&rhs) {
                return lhs;
            }
            if is_zero(&rhs) {
                return Expr::Number(1.0);
            }
            if is_one(&lhs) {
                return Expr::Number(1.0);
            }
        }
    }

    Expr::binary(op, lhs, rhs)
}
