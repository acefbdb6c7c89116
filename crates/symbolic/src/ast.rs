use std::collections::BTreeSet;
use std::fmt;

/// The fixed set of functions the parser, differentiator and code
/// generator all agree on. Anything outside this list fails to parse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Func {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sqrt,
    Exp,
    Ln,
    Abs,
    Floor,
}

impl Func {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "sin" => Func::Sin,
            "cos" => Func::Cos,
            "tan" => Func::Tan,
            "asin" => Func::Asin,
            "acos" => Func::Acos,
            "atan" => Func::Atan,
            "sqrt" => Func::Sqrt,
            "exp" => Func::Exp,
            "ln" => Func::Ln,
            "abs" => Func::Abs,
            "floor" => Func::Floor,
            _ => return None,
        })
    }

    /// Name used in display notation.
    pub fn name(self) -> &'static str {
        match self {
            Func::Sin => "sin",
            Func::Cos => "cos",
            Func::Tan => "tan",
            Func::Asin => "asin",
            Func::Acos => "acos",
            Func::Atan => "atan",
            Func::Sqrt => "sqrt",
            Func::Exp => "exp",
            Func::Ln => "ln",
            Func::Abs => "abs",
            Func::Floor => "floor",
        }
    }

    pub fn apply(self, x: f64) -> f64 {
        match self {
            Func::Sin => x.sin(),
            Func::Cos => x.cos(),
            Func::Tan => x.tan(),
            Func::Asin => x.asin(),
            Func::Acos => x.acos(),
            Func::Atan => x.atan(),
            Func::Sqrt => x.sqrt(),
            Func::Exp => x.exp(),
            Func::Ln => x.ln(),
            Func::Abs => x.abs(),
            Func::Floor => x.floor(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

/// Expression tree over `f64` constants and named variables.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Number(f64),
    Variable(String),
    Neg(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(Func, Box<Expr>),
}

impl Expr {
    pub fn number(n: f64) -> Self {
        Expr::Number(n)
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Expr::Variable(name.into())
    }

    pub fn neg(inner: Expr) -> Self {
        Expr::Neg(Box::new(inner))
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    pub fn call(func: Func, arg: Expr) -> Self {
        Expr::Call(func, Box::new(arg))
    }

    /// Evaluates the expression numerically against the given variable
    /// bindings. Returns `None` if a free variable is unbound.
    pub fn eval(&self, bindings: &[(&str, f64)]) -> Option<f64> {
        Some(match self {
            Expr::Number(n) => *n,
            Expr::Variable(name) => {
                bindings
                    .iter()
                    .find(|(var, _)| var == name)
                    .map(|(_, value)| *value)?
            }
            Expr::Neg(inner) => -inner.eval(bindings)?,
            Expr::Binary(op, lhs, rhs) => {
                let lhs = lhs.eval(bindings)?;
                let rhs = rhs.eval(bindings)?;
                match op {
                    BinaryOp::Add => lhs + rhs,
                    BinaryOp::Sub => lhs - rhs,
                    BinaryOp::Mul => lhs * rhs,
                    BinaryOp::Div => lhs / rhs,
                    BinaryOp::Pow => lhs.powf(rhs),
                }
            }
            Expr::Call(func, arg) => func.apply(arg.eval(bindings)?),
        })
    }

    /// Collects the free variable names, sorted and deduplicated.
    pub fn free_variables(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut BTreeSet<String>) {
        match self {
            Expr::Number(_) => {}
            Expr::Variable(name) => {
                out.insert(name.clone());
            }
            Expr::Neg(inner) => inner.collect_variables(out),
            Expr::Binary(_, lhs, rhs) => {
                lhs.collect_variables(out);
                rhs.collect_variables(out);
            }
            Expr::Call(_, arg) => arg.collect_variables(out),
        }
    }
}

/// Precedence levels used for minimal parenthesisation in display
/// notation. Higher binds tighter.
fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Binary(BinaryOp::Add | BinaryOp::Sub, ..) => 1,
        Expr::Binary(BinaryOp::Mul | BinaryOp::Div, ..) => 2,
        Expr::Neg(_) => 3,
        Expr::Binary(BinaryOp::Pow, ..) => 4,
        Expr::Number(_) | Expr::Variable(_) | Expr::Call(..) => 5,
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_child(f: &mut fmt::Formatter<'_>, child: &Expr, min: u8) -> fmt::Result {
            if precedence(child) < min {
                write!(f, "({child})")
            } else {
                write!(f, "{child}")
            }
        }

        match self {
            Expr::Number(n) => write!(f, "{n}"),
            Expr::Variable(name) => f.write_str(name),
            Expr::Neg(inner) => {
                f.write_str("-")?;
                write_child(f, inner, 3)
            }
            Expr::Binary(op, lhs, rhs) => {
                let (symbol, prec) = match op {
                    BinaryOp::Add => ("+", 1),
                    BinaryOp::Sub => ("-", 1),
                    BinaryOp::Mul => ("*", 2),
                    BinaryOp::Div => ("/", 2),
                    BinaryOp::Pow => ("^", 4),
                };
                // Sub/Div/Pow are not associative on the right.
                write_child(f, lhs, prec)?;
                f.write_str(symbol)?;
                write_child(f, rhs, prec + 1)
            }
            Expr::Call(func, arg) => write!(f, "{}({arg})", func.name()),
        }
    }
}

/// A relation `lhs = rhs`, rendered implicitly as `lhs - rhs = 0`.
#[derive(Clone, Debug, PartialEq)]
pub struct Equation {
    pub lhs: Expr,
    pub rhs: Expr,
}

impl Equation {
    /// The implicit `lhs - rhs` form used for curve rendering.
    pub fn difference(&self) -> Expr {
        Expr::binary(BinaryOp::Sub, self.lhs.clone(), self.rhs.clone())
    }
}

impl fmt::Display for Equation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.lhs, self.rhs)
    }
}

/// What a successful parse produced: a full relation with an `=` sign,
/// or a bare expression treated downstream as `y = f(x)`.
#[derive(Clone, Debug, PartialEq)]
pub enum Parsed {
    Equation(Equation),
    Expression(Expr),
}

impl fmt::Display for Parsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parsed::Equation(eq) => eq.fmt(f),
            Parsed::Expression(expr) => expr.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> Expr {
        Expr::variable("x")
    }

    #[test]
    fn eval_resolves_bindings() {
        let expr = Expr::binary(BinaryOp::Add, x(), Expr::number(1.0));
        assert_eq!(expr.eval(&[("x", 2.0)]), Some(3.0));
        assert_eq!(expr.eval(&[("y", 2.0)]), None);
    }

    #[test]
    fn eval_applies_functions() {
        let expr = Expr::call(Func::Sqrt, Expr::number(9.0));
        assert_eq!(expr.eval(&[]), Some(3.0));
    }

    #[test]
    fn free_variables_are_deduplicated() {
        let expr = Expr::binary(BinaryOp::Mul, x(), Expr::binary(BinaryOp::Add, x(), Expr::variable("y")));
        let vars: Vec<_> = expr.free_variables().into_iter().collect();
        assert_eq!(vars, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn display_uses_minimal_parens() {
        let expr = Expr::binary(
            BinaryOp::Mul,
            Expr::binary(BinaryOp::Add, x(), Expr::number(1.0)),
            Expr::number(2.0),
        );
        assert_eq!(expr.to_string(), "(x+1)*2");

        let expr = Expr::binary(
            BinaryOp::Sub,
            x(),
            Expr::binary(BinaryOp::Sub, x(), Expr::number(1.0)),
        );
        assert_eq!(expr.to_string(), "x-(x-1)");
    }

    #[test]
    fn equation_difference_subtracts_sides() {
        let eq = Equation {
            lhs: x(),
            rhs: Expr::number(4.0),
        };
        assert_eq!(eq.difference().eval(&[("x", 7.0)]), Some(3.0));
        assert_eq!(eq.to_string(), "x = 4");
    }
}
