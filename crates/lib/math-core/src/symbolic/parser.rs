use super::expr::{Constant, Expr, Func};
use super::number::{Number, Rational};
use crate::error::{MathError, MathResult};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(String),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Power,
    LParen,
    RParen,
    Equals,
}

fn tokenize(input: &str) -> MathResult<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut idx = 0;
    while idx < chars.len() {
        let c = chars[idx];
        match c {
            c if c.is_whitespace() => idx += 1,
            '0'..='9' | '.' => {
                let start = idx;
                while idx < chars.len() && (chars[idx].is_ascii_digit() || chars[idx] == '.') {
                    idx += 1;
                }
                if idx < chars.len() && matches!(chars[idx], 'e' | 'E') {
                    let mut probe = idx + 1;
                    if probe < chars.len() && matches!(chars[probe], '+' | '-') {
                        probe += 1;
                    }
                    if probe < chars.len() && chars[probe].is_ascii_digit() {
                        idx = probe;
                        while idx < chars.len() && chars[idx].is_ascii_digit() {
                            idx += 1;
                        }
                    }
                }
                tokens.push(Token::Number(chars[start..idx].iter().collect()));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = idx;
                while idx < chars.len() && (chars[idx].is_alphanumeric() || chars[idx] == '_') {
                    idx += 1;
                }
                tokens.push(Token::Ident(chars[start..idx].iter().collect()));
            }
            '*' if chars.get(idx + 1) == Some(&'*') => {
                tokens.push(Token::Power);
                idx += 2;
            }
            '=' if chars.get(idx + 1) == Some(&'=') => {
                tokens.push(Token::Equals);
                idx += 2;
            }
            _ => {
                tokens.push(match c {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '/' => Token::Slash,
                    '^' => Token::Power,
                    '(' | '[' => Token::LParen,
                    ')' | ']' => Token::RParen,
                    '=' => Token::Equals,
                    other => {
                        return Err(MathError::Parse(format!("unexpected character '{other}'")));
                    }
                });
                idx += 1;
            }
        }
    }
    Ok(tokens)
}

/// Deepest nesting of parentheses, calls, signs, and exponents accepted.
const MAX_DEPTH: usize = 100;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expect(&mut self, token: &Token) -> MathResult<()> {
        match self.next() {
            Some(ref t) if t == token => Ok(()),
            Some(other) => Err(MathError::Parse(format!("expected {token:?}, found {other:?}"))),
            None => Err(MathError::Parse(format!("expected {token:?} at end of input"))),
        }
    }

    fn sum(&mut self) -> MathResult<Expr> {
        let mut terms = vec![self.product()?];
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    terms.push(self.product()?);
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    terms.push(Expr::neg(self.product()?));
                }
                _ => break,
            }
        }
        Ok(if terms.len() == 1 {
            terms.remove(0)
        } else {
            Expr::Add(terms)
        })
    }

    fn product(&mut self) -> MathResult<Expr> {
        let mut factors = vec![self.unary()?];
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    factors.push(self.unary()?);
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let divisor = self.unary()?;
                    factors.push(Expr::pow(divisor, Expr::Num(Number::MINUS_ONE)));
                }
                _ => break,
            }
        }
        Ok(if factors.len() == 1 {
            factors.remove(0)
        } else {
            Expr::Mul(factors)
        })
    }

    fn unary(&mut self) -> MathResult<Expr> {
        if self.depth >= MAX_DEPTH {
            return Err(MathError::Parse("expression nested too deeply".to_string()));
        }
        self.depth += 1;
        let result = self.signed();
        self.depth -= 1;
        result
    }

    fn signed(&mut self) -> MathResult<Expr> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                let inner = self.unary()?;
                Ok(match inner {
                    Expr::Num(n) => Expr::Num(n.neg()),
                    other => Expr::neg(other),
                })
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> MathResult<Expr> {
        let base = self.primary()?;
        if self.peek() == Some(&Token::Power) {
            self.pos += 1;
            let exp = self.unary()?;
            return Ok(Expr::pow(base, exp));
        }
        Ok(base)
    }

    fn primary(&mut self) -> MathResult<Expr> {
        match self.next() {
            Some(Token::Number(text)) => parse_number(&text),
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    let arg = self.sum()?;
                    self.expect(&Token::RParen)?;
                    return apply_function(&name, arg);
                }
                Ok(match name.as_str() {
                    "pi" => Expr::Const(Constant::Pi),
                    "E" => Expr::Const(Constant::E),
                    "I" => Expr::Const(Constant::I),
                    _ => Expr::Sym(name),
                })
            }
            Some(Token::LParen) => {
                let inner = self.sum()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Some(other) => Err(MathError::Parse(format!("unexpected token {other:?}"))),
            None => Err(MathError::Parse("unexpected end of input".to_string())),
        }
    }
}

fn parse_number(text: &str) -> MathResult<Expr> {
    if text.contains(['.', 'e', 'E']) {
        let value: f64 = text
            .parse()
            .map_err(|_| MathError::Parse(format!("invalid number '{text}'")))?;
        return Ok(Expr::Num(Number::Float(value)));
    }
    match text.parse::<i128>() {
        Ok(value) => Ok(Expr::Num(Number::Exact(Rational::integer(value)))),
        Err(_) => text
            .parse::<f64>()
            .map(|value| Expr::Num(Number::Float(value)))
            .map_err(|_| MathError::Parse(format!("invalid number '{text}'"))),
    }
}

fn apply_function(name: &str, arg: Expr) -> MathResult<Expr> {
    if name == "sqrt" {
        return Ok(Expr::sqrt(arg));
    }
    Func::from_name(name)
        .map(|func| Expr::call(func, arg))
        .ok_or_else(|| MathError::Parse(format!("unknown function '{name}'")))
}

fn parse_tokens(tokens: Vec<Token>) -> MathResult<Expr> {
    if tokens.is_empty() {
        return Err(MathError::Parse("empty expression".to_string()));
    }
    let mut parser = Parser { tokens, pos: 0, depth: 0 };
    let expr = parser.sum()?;
    if let Some(token) = parser.peek() {
        return Err(MathError::Parse(format!("unexpected token {token:?}")));
    }
    expr.check_denominators()?;
    Ok(expr)
}

/// Parses an expression. `^` is accepted as exponentiation.
///
/// # Errors
/// Returns [`MathError::Parse`] on malformed input, unknown functions, or an
/// `=` sign.
pub fn parse(input: &str) -> MathResult<Expr> {
    let tokens = tokenize(input)?;
    if tokens.contains(&Token::Equals) {
        return Err(MathError::Parse("unexpected '=' in expression".to_string()));
    }
    parse_tokens(tokens)
}

/// Parses `lhs = rhs` into `lhs - rhs`; plain expressions pass through.
///
/// # Errors
/// Returns [`MathError::Parse`] on malformed input or more than one `=`.
pub fn parse_equation(input: &str) -> MathResult<Expr> {
    let tokens = tokenize(input)?;
    let mut sides = tokens.split(|t| *t == Token::Equals);
    let lhs = sides.next().map(<[Token]>::to_vec).unwrap_or_default();
    match (sides.next(), sides.next()) {
        (None, _) => parse_tokens(lhs),
        (Some(rhs), None) => {
            let lhs = parse_tokens(lhs)?;
            let rhs = parse_tokens(rhs.to_vec())?;
            Ok(Expr::sub(lhs, rhs))
        }
        (Some(_), Some(_)) => Err(MathError::Parse("equation has more than one '='".to_string())),
    }
}
