//! Selector condition parser.
//!
//! Conditions use a closed grammar: boolean connectives, comparisons, membership,
//! namespace identifiers, and literals. Calls, attribute access, subscripts, and
//! arithmetic do not tokenize or parse.

use super::ExprError;

/// Deepest `(` / `not` nesting a condition may use.
pub const MAX_NESTING: usize = 64;

/// Comparison operators, including membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    In,
    NotIn,
}

impl CmpOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtE => "<=",
            Self::Gt => ">",
            Self::GtE => ">=",
            Self::In => "in",
            Self::NotIn => "not in",
        }
    }
}

/// Condition AST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Name(String),
    Int(i64),
    Str(String),
    Bool(bool),
    Tuple(Vec<Expr>),
    Not(Box<Expr>),
    /// Two or more operands, evaluated left to right.
    And(Vec<Expr>),
    Or(Vec<Expr>),
    /// `first op1 e1 op2 e2 ...`, true iff every adjacent pair holds.
    Compare {
        first: Box<Expr>,
        rest: Vec<(CmpOp, Expr)>,
    },
}

impl Expr {
    /// Every identifier referenced anywhere in the expression.
    pub fn names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_names(&mut out);
        out
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Name(n) => out.push(n),
            Self::Int(_) | Self::Str(_) | Self::Bool(_) => {}
            Self::Tuple(items) | Self::And(items) | Self::Or(items) => {
                items.iter().for_each(|e| e.collect_names(out));
            }
            Self::Not(inner) => inner.collect_names(out),
            Self::Compare { first, rest } => {
                first.collect_names(out);
                rest.iter().for_each(|(_, e)| e.collect_names(out));
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Int(i64),
    Str(String),
    True,
    False,
    And,
    Or,
    Not,
    In,
    Cmp(CmpOp),
    LParen,
    RParen,
    Comma,
    Eof,
}

/// Parse a condition string into an [`Expr`].
pub fn parse_condition(input: &str) -> Result<Expr, ExprError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.parse_or()?;
    if parser.current() != &Token::Eof {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(expr)
}

fn tokenize(input: &str) -> Result<Vec<(usize, Token)>, ExprError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let c = chars[pos];
        if c.is_whitespace() {
            pos += 1;
            continue;
        }
        let start = pos;

        let token = match c {
            '(' => {
                pos += 1;
                Token::LParen
            }
            ')' => {
                pos += 1;
                Token::RParen
            }
            ',' => {
                pos += 1;
                Token::Comma
            }
            '\'' | '"' => {
                pos += 1;
                let body_start = pos;
                while pos < chars.len() && chars[pos] != c {
                    pos += 1;
                }
                if pos >= chars.len() {
                    return Err(ExprError::Parse {
                        position: start,
                        message: "unterminated string literal".to_owned(),
                    });
                }
                let literal: String = chars[body_start..pos].iter().collect();
                pos += 1;
                Token::Str(literal)
            }
            '=' | '!' | '<' | '>' => {
                pos += 1;
                let has_eq = pos < chars.len() && chars[pos] == '=';
                if has_eq {
                    pos += 1;
                }
                let op = match (c, has_eq) {
                    ('=', true) => CmpOp::Eq,
                    ('!', true) => CmpOp::NotEq,
                    ('<', false) => CmpOp::Lt,
                    ('<', true) => CmpOp::LtE,
                    ('>', false) => CmpOp::Gt,
                    ('>', true) => CmpOp::GtE,
                    _ => {
                        return Err(ExprError::Parse {
                            position: start,
                            message: format!("unsupported operator '{c}'"),
                        })
                    }
                };
                Token::Cmp(op)
            }
            d if d.is_ascii_digit() => {
                while pos < chars.len() && chars[pos].is_ascii_alphanumeric() {
                    pos += 1;
                }
                let digits: String = chars[start..pos].iter().collect();
                let value = digits.parse::<i64>().map_err(|_| ExprError::Parse {
                    position: start,
                    message: format!("invalid integer literal '{digits}'"),
                })?;
                Token::Int(value)
            }
            a if a.is_ascii_alphabetic() || a == '_' => {
                while pos < chars.len() && (chars[pos].is_ascii_alphanumeric() || chars[pos] == '_')
                {
                    pos += 1;
                }
                let ident: String = chars[start..pos].iter().collect();
                match ident.as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    "in" => Token::In,
                    "True" => Token::True,
                    "False" => Token::False,
                    _ => Token::Ident(ident),
                }
            }
            other => {
                return Err(ExprError::Parse {
                    position: start,
                    message: format!("unexpected character '{other}'"),
                })
            }
        };
        tokens.push((start, token));
    }

    tokens.push((chars.len(), Token::Eof));
    Ok(tokens)
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    depth: usize,
}

impl Parser {
    /// Token at `offset` past the cursor; the trailing `Eof` repeats forever.
    fn at(&self, offset: usize) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[(self.pos + offset).min(last)].1
    }

    fn current(&self) -> &Token {
        self.at(0)
    }

    fn peek(&self) -> &Token {
        self.at(1)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn error(&self, message: &str) -> ExprError {
        let position = self.tokens.get(self.pos).map_or(0, |(p, _)| *p);
        ExprError::Parse {
            position,
            message: message.to_owned(),
        }
    }

    /// Run `parse` one nesting level deeper, failing past [`MAX_NESTING`].
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ExprError>,
    ) -> Result<T, ExprError> {
        if self.depth >= MAX_NESTING {
            return Err(self.error("condition nested too deeply"));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn parse_or(&mut self) -> Result<Expr, ExprError> {
        let mut operands = vec![self.parse_and()?];
        while self.current() == &Token::Or {
            self.advance();
            operands.push(self.parse_and()?);
        }
        Ok(flatten(operands, Expr::Or))
    }

    fn parse_and(&mut self) -> Result<Expr, ExprError> {
        let mut operands = vec![self.parse_not()?];
        while self.current() == &Token::And {
            self.advance();
            operands.push(self.parse_not()?);
        }
        Ok(flatten(operands, Expr::And))
    }

    fn parse_not(&mut self) -> Result<Expr, ExprError> {
        if self.current() == &Token::Not {
            self.advance();
            let inner = self.nested(Self::parse_not)?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, ExprError> {
        let first = self.parse_atom()?;
        let mut rest = Vec::new();

        loop {
            let op = match self.current().clone() {
                Token::Cmp(op) => op,
                Token::In => CmpOp::In,
                Token::Not if self.peek() == &Token::In => {
                    self.advance();
                    CmpOp::NotIn
                }
                _ => break,
            };
            self.advance();
            rest.push((op, self.parse_atom()?));
        }

        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare {
                first: Box::new(first),
                rest,
            })
        }
    }

    fn parse_atom(&mut self) -> Result<Expr, ExprError> {
        let expr = match self.current().clone() {
            Token::Ident(name) => Expr::Name(name),
            Token::Int(v) => Expr::Int(v),
            Token::Str(s) => Expr::Str(s),
            Token::True => Expr::Bool(true),
            Token::False => Expr::Bool(false),
            Token::LParen => return self.nested(Self::parse_parenthesized),
            Token::Eof => return Err(self.error("unexpected end of condition")),
            _ => return Err(self.error("expected identifier, literal, or '('")),
        };
        self.advance();
        Ok(expr)
    }

    /// `()`, `(expr)`, or a tuple `(a, b, ...)` with optional trailing comma.
    fn parse_parenthesized(&mut self) -> Result<Expr, ExprError> {
        self.advance();
        if self.current() == &Token::RParen {
            self.advance();
            return Ok(Expr::Tuple(Vec::new()));
        }

        let first = self.parse_or()?;
        if self.current() != &Token::Comma {
            self.expect_rparen()?;
            return Ok(first);
        }

        let mut items = vec![first];
        while self.current() == &Token::Comma {
            self.advance();
            if self.current() == &Token::RParen {
                break;
            }
            items.push(self.parse_or()?);
        }
        self.expect_rparen()?;
        Ok(Expr::Tuple(items))
    }

    fn expect_rparen(&mut self) -> Result<(), ExprError> {
        if self.current() != &Token::RParen {
            return Err(self.error("expected ')'"));
        }
        self.advance();
        Ok(())
    }
}

/// A single operand stands alone; two or more form the connective.
fn flatten(mut operands: Vec<Expr>, connective: fn(Vec<Expr>) -> Expr) -> Expr {
    if operands.len() == 1 {
        if let Some(only) = operands.pop() {
            return only;
        }
    }
    connective(operands)
}
