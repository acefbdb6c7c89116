//! Recursive-descent parser for equation text.
//!
//! Accepts the usual calculator grammar: `+ - * / ^` with standard
//! precedence, unary minus, parentheses, function calls from the fixed
//! [`Func`] set, and implicit multiplication (`2x`, `3(x+1)`, `x y`).
//! At most one `=` splits the input into an [`Equation`]; without it the
//! input is a bare [`Expr`].

use thiserror::Error;

use crate::ast::{BinaryOp, Equation, Expr, Func, Parsed};

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("unexpected character `{0}`")]
    UnexpectedCharacter(char),

    #[error("malformed number `{0}`")]
    InvalidNumber(String),

    #[error("unexpected `{0}`")]
    UnexpectedToken(String),

    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("more than one `=` in input")]
    RepeatedEquals,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    Equals,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(n) => n.to_string(),
            Token::Ident(name) => name.clone(),
            Token::Plus => "+".into(),
            Token::Minus => "-".into(),
            Token::Star => "*".into(),
            Token::Slash => "/".into(),
            Token::Caret => "^".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),
            Token::Equals => "=".into(),
        }
    }
}

fn tokenize(text: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(&ch) = chars.peek() {
        match ch {
            ' ' | '\t' => {
                chars.next();
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '^' => {
                chars.next();
                tokens.push(Token::Caret);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '=' => {
                chars.next();
                tokens.push(Token::Equals);
            }
            '0'..='9' | '.' => {
                let mut literal = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_digit() || c == '.' {
                        literal.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value: f64 = literal
                    .parse()
                    .map_err(|_| ParseError::InvalidNumber(literal.clone()))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_ascii_alphabetic() => {
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_alphanumeric() {
                        name.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(name));
            }
            other => return Err(ParseError::UnexpectedCharacter(other)),
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn expect(&mut self, wanted: Token) -> Result<(), ParseError> {
        match self.next() {
            Some(token) if token == wanted => Ok(()),
            Some(token) => Err(ParseError::UnexpectedToken(token.describe())),
            None => Err(ParseError::UnexpectedEnd),
        }
    }

    fn expression(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.next();
            let rhs = self.term()?;
            lhs = Expr::binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.next();
                    let rhs = self.unary()?;
                    lhs = Expr::binary(BinaryOp::Mul, lhs, rhs);
                }
                Some(Token::Slash) => {
                    self.next();
                    let rhs = self.unary()?;
                    lhs = Expr::binary(BinaryOp::Div, lhs, rhs);
                }
                // Adjacency is implicit multiplication: `2x`, `x(x+1)`, `2 sin(x)`.
                Some(Token::Number(_) | Token::Ident(_) | Token::LParen) => {
                    let rhs = self.unary()?;
                    lhs = Expr::binary(BinaryOp::Mul, lhs, rhs);
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        if matches!(self.peek(), Some(Token::Minus)) {
            self.next();
            return Ok(Expr::neg(self.unary()?));
        }
        self.power()
    }

    fn power(&mut self) -> Result<Expr, ParseError> {
        let base = self.primary()?;
        if matches!(self.peek(), Some(Token::Caret)) {
            self.next();
            // Right-associative; `-` in the exponent binds to the exponent.
            let exponent = self.unary()?;
            return Ok(Expr::binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        match self.next() {
            Some(Token::Number(value)) => Ok(Expr::number(value)),
            Some(Token::Ident(name)) => {
                if let Some(func) = Func::from_name(&name) {
                    if matches!(self.peek(), Some(Token::LParen)) {
                        self.next();
                        let arg = self.expression()?;
                        self.expect(Token::RParen)?;
                        return Ok(Expr::call(func, arg));
                    }
                    // A function name with no call syntax is not a variable.
                    return Err(ParseError::UnexpectedToken(name));
                }
                Ok(Expr::variable(name))
            }
            Some(Token::LParen) => {
                let inner = self.expression()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(token) => Err(ParseError::UnexpectedToken(token.describe())),
            None => Err(ParseError::UnexpectedEnd),
        }
    }
}

/// Parses equation text into either a relation or a bare expression.
pub fn parse(text: &str) -> Result<Parsed, ParseError> {
    let tokens = tokenize(text)?;
    let equals_count = tokens.iter().filter(|t| matches!(t, Token::Equals)).count();
    if equals_count > 1 {
        return Err(ParseError::RepeatedEquals);
    }

    let mut parser = Parser {
        tokens,
        position: 0,
    };
    let first = parser.expression()?;

    let parsed = if matches!(parser.peek(), Some(Token::Equals)) {
        parser.next();
        let rhs = parser.expression()?;
        Parsed::Equation(Equation { lhs: first, rhs })
    } else {
        Parsed::Expression(first)
    };

    match parser.peek() {
        None => Ok(parsed),
        Some(token) => Err(ParseError::UnexpectedToken(token.describe())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Func;

    fn parse_expr(text: &str) -> Expr {
        match parse(text).expect("parse") {
            Parsed::Expression(expr) => expr,
            Parsed::Equation(eq) => panic!("expected expression, got {eq}"),
        }
    }

    #[test]
    fn parses_precedence() {
        let expr = parse_expr("1+2*3");
        assert_eq!(expr.eval(&[]), Some(7.0));
        let expr = parse_expr("2^3^2");
        assert_eq!(expr.eval(&[]), Some(512.0));
        let expr = parse_expr("-x^2");
        assert_eq!(expr.eval(&[("x", 3.0)]), Some(-9.0));
    }

    #[test]
    fn parses_implicit_multiplication() {
        assert_eq!(parse_expr("2x").eval(&[("x", 5.0)]), Some(10.0));
        assert_eq!(parse_expr("3(x+1)").eval(&[("x", 1.0)]), Some(6.0));
        assert_eq!(parse_expr("2sin(0)").eval(&[]), Some(0.0));
    }

    #[test]
    fn parses_functions() {
        let expr = parse_expr("sqrt(abs(-16))");
        assert_eq!(expr.eval(&[]), Some(4.0));
        assert!(matches!(expr, Expr::Call(Func::Sqrt, _)));
    }

    #[test]
    fn parses_equation() {
        match parse("x^2+y^2 = 4").expect("parse") {
            Parsed::Equation(eq) => {
                assert_eq!(eq.difference().eval(&[("x", 2.0), ("y", 0.0)]), Some(0.0));
            }
            other => panic!("expected equation, got {other}"),
        }
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(parse(""), Err(ParseError::UnexpectedEnd));
        assert_eq!(parse("x="), Err(ParseError::UnexpectedEnd));
        assert_eq!(parse("1=2=3"), Err(ParseError::RepeatedEquals));
        assert!(matches!(parse("x$"), Err(ParseError::UnexpectedCharacter('$'))));
        assert!(matches!(parse("(x"), Err(ParseError::UnexpectedEnd)));
        assert!(matches!(parse("1..2"), Err(ParseError::InvalidNumber(_))));
        // Function names are not variables.
        assert!(matches!(parse("sin"), Err(ParseError::UnexpectedToken(_))));
    }
}
