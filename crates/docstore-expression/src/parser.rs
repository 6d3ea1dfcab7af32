//! Lexer and recursive-descent parser for the three expression forms.
//!
//! Keywords (`SET`, `AND`, `BETWEEN`, ...) are matched case-insensitively;
//! function names (`if_not_exists`, `size`, ...) are case-sensitive, so an
//! attribute may legally be called `Size`. Whitespace is insignificant
//! between tokens. Parsing fails on the first malformed token; no partial
//! tree is ever returned.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use crate::ast::{
    AddClause, ArithmeticOp, Comparator, ConditionExpression, DeleteClause, Path, PathOperator,
    Predicate, SetClause, UpdateExpression, Value, ValueFunction,
};
use crate::error::ExpressionError;

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    /// A bare attribute name.
    Identifier(String),
    /// A `#name` placeholder, prefix included.
    NameRef(String),
    /// A `:value` placeholder, prefix included.
    ValueRef(String),
    Compare(Comparator),
    Plus,
    Minus,
    Dot,
    Comma,
    LParen,
    RParen,
    LBracket,
    RBracket,
    And,
    Or,
    Not,
    Between,
    In,
    Set,
    Remove,
    Add,
    Delete,
    Function(ValueFunction),
    Predicate(Predicate),
    /// A non-negative integer, used for list indices.
    Number(usize),
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier(s) => write!(f, "identifier '{s}'"),
            Self::NameRef(s) | Self::ValueRef(s) => write!(f, "{s}"),
            Self::Compare(op) => write!(f, "'{op}'"),
            Self::Plus => write!(f, "'+'"),
            Self::Minus => write!(f, "'-'"),
            Self::Dot => write!(f, "'.'"),
            Self::Comma => write!(f, "','"),
            Self::LParen => write!(f, "'('"),
            Self::RParen => write!(f, "')'"),
            Self::LBracket => write!(f, "'['"),
            Self::RBracket => write!(f, "']'"),
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
            Self::Not => write!(f, "NOT"),
            Self::Between => write!(f, "BETWEEN"),
            Self::In => write!(f, "IN"),
            Self::Set => write!(f, "SET"),
            Self::Remove => write!(f, "REMOVE"),
            Self::Add => write!(f, "ADD"),
            Self::Delete => write!(f, "DELETE"),
            Self::Function(name) => write!(f, "{name}"),
            Self::Predicate(name) => write!(f, "{name}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Eof => write!(f, "end of expression"),
        }
    }
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
        }
    }

    fn tokenize(mut self) -> Result<Vec<Token>, ExpressionError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, ExpressionError> {
        while self.chars.peek().is_some_and(char::is_ascii_whitespace) {
            self.chars.next();
        }
        let Some(&ch) = self.chars.peek() else {
            return Ok(Token::Eof);
        };
        match ch {
            '#' => self.read_placeholder('#').map(Token::NameRef),
            ':' => self.read_placeholder(':').map(Token::ValueRef),
            '=' => {
                self.chars.next();
                Ok(Token::Compare(Comparator::Eq))
            }
            '<' => {
                self.chars.next();
                Ok(match self.chars.peek() {
                    Some('=') => {
                        self.chars.next();
                        Token::Compare(Comparator::Le)
                    }
                    Some('>') => {
                        self.chars.next();
                        Token::Compare(Comparator::Ne)
                    }
                    _ => Token::Compare(Comparator::Lt),
                })
            }
            '>' => {
                self.chars.next();
                Ok(if self.chars.peek() == Some(&'=') {
                    self.chars.next();
                    Token::Compare(Comparator::Ge)
                } else {
                    Token::Compare(Comparator::Gt)
                })
            }
            '+' => {
                self.chars.next();
                Ok(Token::Plus)
            }
            '-' => {
                self.chars.next();
                Ok(Token::Minus)
            }
            '.' => {
                self.chars.next();
                Ok(Token::Dot)
            }
            ',' => {
                self.chars.next();
                Ok(Token::Comma)
            }
            '(' => {
                self.chars.next();
                Ok(Token::LParen)
            }
            ')' => {
                self.chars.next();
                Ok(Token::RParen)
            }
            '[' => {
                self.chars.next();
                Ok(Token::LBracket)
            }
            ']' => {
                self.chars.next();
                Ok(Token::RBracket)
            }
            c if c.is_ascii_digit() => self.read_number(),
            c if is_ident_start(c) => Ok(self.read_identifier_or_keyword()),
            other => Err(ExpressionError::syntax(format!(
                "unexpected character '{other}'"
            ))),
        }
    }

    fn read_placeholder(&mut self, prefix: char) -> Result<String, ExpressionError> {
        self.chars.next();
        let name = self.read_ident_chars();
        if name.is_empty() {
            return Err(ExpressionError::syntax(format!(
                "expected a name after '{prefix}'"
            )));
        }
        Ok(format!("{prefix}{name}"))
    }

    fn read_number(&mut self) -> Result<Token, ExpressionError> {
        let mut digits = String::new();
        while let Some(&c) = self.chars.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            digits.push(c);
            self.chars.next();
        }
        let n: usize = digits.parse().map_err(|_| {
            ExpressionError::syntax(format!("'{digits}' is not a valid list index"))
        })?;
        Ok(Token::Number(n))
    }

    fn read_ident_chars(&mut self) -> String {
        let mut s = String::new();
        while let Some(&c) = self.chars.peek() {
            if !is_ident_continue(c) {
                break;
            }
            s.push(c);
            self.chars.next();
        }
        s
    }

    fn read_identifier_or_keyword(&mut self) -> Token {
        let ident = self.read_ident_chars();
        // Function names are case-sensitive, keywords are not.
        match ident.as_str() {
            "attribute_exists" => return Token::Predicate(Predicate::AttributeExists),
            "attribute_not_exists" => return Token::Predicate(Predicate::AttributeNotExists),
            "attribute_type" => return Token::Predicate(Predicate::AttributeType),
            "begins_with" => return Token::Predicate(Predicate::BeginsWith),
            "contains" => return Token::Predicate(Predicate::Contains),
            "if_not_exists" => return Token::Function(ValueFunction::IfNotExists),
            "list_append" => return Token::Function(ValueFunction::ListAppend),
            "size" => return Token::Function(ValueFunction::Size),
            _ => {}
        }
        match ident.to_ascii_lowercase().as_str() {
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            "between" => Token::Between,
            "in" => Token::In,
            "set" => Token::Set,
            "remove" => Token::Remove,
            "add" => Token::Add,
            "delete" => Token::Delete,
            _ => Token::Identifier(ident),
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens.get(self.pos).cloned().unwrap_or(Token::Eof);
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: &Token) -> Result<(), ExpressionError> {
        let token = self.advance();
        if token == *expected {
            Ok(())
        } else {
            Err(ExpressionError::syntax(format!(
                "expected {expected}, found {token}"
            )))
        }
    }

    fn at_end(&self) -> bool {
        matches!(self.peek(), Token::Eof)
    }

    fn expect_end(&self) -> Result<(), ExpressionError> {
        if self.at_end() {
            Ok(())
        } else {
            Err(ExpressionError::syntax(format!(
                "expected end of expression, found {}",
                self.peek()
            )))
        }
    }
}

// ---------------------------------------------------------------------------
// Paths and value operands (shared by all three grammars)
// ---------------------------------------------------------------------------

impl Parser {
    fn parse_path(&mut self) -> Result<Path, ExpressionError> {
        let root = self.parse_path_name()?;
        let mut path = Path::new(root);
        loop {
            match self.peek() {
                Token::Dot => {
                    self.advance();
                    let name = self.parse_path_name()?;
                    path.operators.push(PathOperator::Attribute(name));
                }
                Token::LBracket => {
                    self.advance();
                    let token = self.advance();
                    let Token::Number(idx) = token else {
                        return Err(ExpressionError::syntax(format!(
                            "expected list index, found {token}"
                        )));
                    };
                    self.expect(&Token::RBracket)?;
                    path.operators.push(PathOperator::Index(idx));
                }
                _ => return Ok(path),
            }
        }
    }

    fn parse_path_name(&mut self) -> Result<String, ExpressionError> {
        match self.advance() {
            Token::Identifier(name) | Token::NameRef(name) => Ok(name),
            other => Err(ExpressionError::syntax(format!(
                "expected attribute name or #name, found {other}"
            ))),
        }
    }

    /// Parse a value operand: a `:value` reference, a function call, or an
    /// attribute path.
    fn parse_operand(&mut self) -> Result<Value, ExpressionError> {
        match self.peek() {
            Token::ValueRef(_) => {
                let Token::ValueRef(name) = self.advance() else {
                    unreachable!("peeked ValueRef");
                };
                Ok(Value::ValueRef(name))
            }
            Token::Function(func) => {
                let func = *func;
                self.parse_function_call(func)
            }
            Token::Identifier(_) | Token::NameRef(_) => Ok(Value::PathRef(self.parse_path()?)),
            other => Err(ExpressionError::syntax(format!(
                "expected operand, found {other}"
            ))),
        }
    }

    fn parse_function_call(&mut self, func: ValueFunction) -> Result<Value, ExpressionError> {
        self.advance();
        self.expect(&Token::LParen)?;
        let mut args = vec![self.parse_operand()?];
        while matches!(self.peek(), Token::Comma) {
            self.advance();
            args.push(self.parse_operand()?);
        }
        self.expect(&Token::RParen)?;

        let arity = match func {
            ValueFunction::IfNotExists | ValueFunction::ListAppend => 2,
            ValueFunction::Size => 1,
        };
        if args.len() != arity {
            return Err(ExpressionError::syntax(format!(
                "{func}() takes {arity} argument(s), found {}",
                args.len()
            )));
        }
        if func == ValueFunction::IfNotExists && !matches!(args[0], Value::PathRef(_)) {
            return Err(ExpressionError::syntax(
                "if_not_exists() first argument must be an attribute path",
            ));
        }
        Ok(Value::FunctionCall { name: func, args })
    }
}

// ---------------------------------------------------------------------------
// Condition expressions (precedence: NOT > comparison > AND > OR)
// ---------------------------------------------------------------------------

impl Parser {
    fn parse_or_expr(&mut self) -> Result<ConditionExpression, ExpressionError> {
        let mut left = self.parse_and_expr()?;
        while matches!(self.peek(), Token::Or) {
            self.advance();
            let right = self.parse_and_expr()?;
            left = ConditionExpression::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and_expr(&mut self) -> Result<ConditionExpression, ExpressionError> {
        let mut left = self.parse_not_expr()?;
        while matches!(self.peek(), Token::And) {
            self.advance();
            let right = self.parse_not_expr()?;
            left = ConditionExpression::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_not_expr(&mut self) -> Result<ConditionExpression, ExpressionError> {
        if matches!(self.peek(), Token::Not) {
            self.advance();
            let inner = self.parse_not_expr()?;
            return Ok(ConditionExpression::Not(Box::new(inner)));
        }
        self.parse_primary_condition()
    }

    fn parse_primary_condition(&mut self) -> Result<ConditionExpression, ExpressionError> {
        if matches!(self.peek(), Token::LParen) {
            self.advance();
            let inner = self.parse_or_expr()?;
            self.expect(&Token::RParen)?;
            return Ok(ConditionExpression::Parenthesized(Box::new(inner)));
        }
        if let Token::Predicate(name) = self.peek() {
            let name = *name;
            return self.parse_predicate(name);
        }
        let left = self.parse_operand()?;
        self.parse_condition_postfix(left)
    }

    fn parse_predicate(&mut self, name: Predicate) -> Result<ConditionExpression, ExpressionError> {
        self.advance();
        self.expect(&Token::LParen)?;
        let mut args = vec![self.parse_operand()?];
        while matches!(self.peek(), Token::Comma) {
            self.advance();
            args.push(self.parse_operand()?);
        }
        self.expect(&Token::RParen)?;

        let arity = match name {
            Predicate::AttributeExists | Predicate::AttributeNotExists => 1,
            Predicate::AttributeType | Predicate::BeginsWith | Predicate::Contains => 2,
        };
        if args.len() != arity {
            return Err(ExpressionError::syntax(format!(
                "{name}() takes {arity} argument(s), found {}",
                args.len()
            )));
        }
        Ok(ConditionExpression::FunctionPredicate { name, args })
    }

    fn parse_condition_postfix(
        &mut self,
        left: Value,
    ) -> Result<ConditionExpression, ExpressionError> {
        match self.peek() {
            Token::Compare(op) => {
                let op = *op;
                self.advance();
                let right = self.parse_operand()?;
                Ok(ConditionExpression::Comparison { op, left, right })
            }
            Token::Between => {
                self.advance();
                let low = self.parse_operand()?;
                self.expect(&Token::And)?;
                let high = self.parse_operand()?;
                Ok(ConditionExpression::Between {
                    value: left,
                    low,
                    high,
                })
            }
            Token::In => {
                self.advance();
                self.expect(&Token::LParen)?;
                let mut list = vec![self.parse_operand()?];
                while matches!(self.peek(), Token::Comma) {
                    self.advance();
                    list.push(self.parse_operand()?);
                }
                self.expect(&Token::RParen)?;
                Ok(ConditionExpression::In { value: left, list })
            }
            other => Err(ExpressionError::syntax(format!(
                "expected comparison operator, BETWEEN, or IN, found {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Update expressions
// ---------------------------------------------------------------------------

impl Parser {
    fn parse_update(&mut self) -> Result<UpdateExpression, ExpressionError> {
        let mut update = UpdateExpression::default();
        while !self.at_end() {
            match self.advance() {
                Token::Set => {
                    if !update.set.is_empty() {
                        return Err(ExpressionError::syntax("duplicate SET clause"));
                    }
                    self.parse_set_clauses(&mut update.set)?;
                }
                Token::Remove => {
                    if !update.remove.is_empty() {
                        return Err(ExpressionError::syntax("duplicate REMOVE clause"));
                    }
                    self.parse_remove_clauses(&mut update.remove)?;
                }
                Token::Add => {
                    if !update.add.is_empty() {
                        return Err(ExpressionError::syntax("duplicate ADD clause"));
                    }
                    self.parse_add_clauses(&mut update.add)?;
                }
                Token::Delete => {
                    if !update.delete.is_empty() {
                        return Err(ExpressionError::syntax("duplicate DELETE clause"));
                    }
                    self.parse_delete_clauses(&mut update.delete)?;
                }
                other => {
                    return Err(ExpressionError::syntax(format!(
                        "expected SET, REMOVE, ADD, or DELETE, found {other}"
                    )));
                }
            }
        }
        if update.is_empty() {
            return Err(ExpressionError::syntax("empty update expression"));
        }
        Ok(update)
    }

    fn parse_set_clauses(&mut self, clauses: &mut Vec<SetClause>) -> Result<(), ExpressionError> {
        loop {
            let path = self.parse_path()?;
            self.expect(&Token::Compare(Comparator::Eq))?;
            let value = self.parse_set_value()?;
            clauses.push(SetClause { path, value });
            if !matches!(self.peek(), Token::Comma) {
                return Ok(());
            }
            self.advance();
        }
    }

    /// The right-hand side of a SET clause: an operand, optionally combined
    /// with one more operand through a single `+`/`-`. Chained arithmetic
    /// (`a + b - c`) is not part of the grammar.
    fn parse_set_value(&mut self) -> Result<Value, ExpressionError> {
        let left = self.parse_operand()?;
        let op = match self.peek() {
            Token::Plus => ArithmeticOp::Plus,
            Token::Minus => ArithmeticOp::Minus,
            _ => return Ok(left),
        };
        self.advance();
        let right = self.parse_operand()?;
        if matches!(self.peek(), Token::Plus | Token::Minus) {
            return Err(ExpressionError::syntax(
                "only a single '+' or '-' is allowed in a SET value",
            ));
        }
        Ok(Value::Arithmetic {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn parse_remove_clauses(&mut self, paths: &mut Vec<Path>) -> Result<(), ExpressionError> {
        loop {
            paths.push(self.parse_path()?);
            if !matches!(self.peek(), Token::Comma) {
                return Ok(());
            }
            self.advance();
        }
    }

    fn parse_add_clauses(&mut self, clauses: &mut Vec<AddClause>) -> Result<(), ExpressionError> {
        loop {
            let path = self.parse_path()?;
            let rhs = self.parse_operand()?;
            clauses.push(AddClause { path, rhs });
            if !matches!(self.peek(), Token::Comma) {
                return Ok(());
            }
            self.advance();
        }
    }

    fn parse_delete_clauses(
        &mut self,
        clauses: &mut Vec<DeleteClause>,
    ) -> Result<(), ExpressionError> {
        loop {
            let path = self.parse_path()?;
            let rhs = self.parse_operand()?;
            clauses.push(DeleteClause { path, rhs });
            if !matches!(self.peek(), Token::Comma) {
                return Ok(());
            }
            self.advance();
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Parse an update expression (SET / REMOVE / ADD / DELETE clause lists).
///
/// # Errors
///
/// Returns [`ExpressionError::Syntax`] for malformed input, including an
/// empty expression or a clause keyword appearing twice.
pub fn parse_update_expression(input: &str) -> Result<UpdateExpression, ExpressionError> {
    let mut parser = Parser::new(Lexer::new(input).tokenize()?);
    let update = parser.parse_update()?;
    parser.expect_end()?;
    Ok(update)
}

/// Parse a condition expression.
///
/// # Errors
///
/// Returns [`ExpressionError::Syntax`] for malformed input.
pub fn parse_condition_expression(input: &str) -> Result<ConditionExpression, ExpressionError> {
    let mut parser = Parser::new(Lexer::new(input).tokenize()?);
    let condition = parser.parse_or_expr()?;
    parser.expect_end()?;
    Ok(condition)
}

/// Parse a projection expression: a comma-separated list of attribute
/// paths. Syntactic duplicates are permitted; deduplication is a caller
/// concern.
///
/// # Errors
///
/// Returns [`ExpressionError::Syntax`] for malformed input.
pub fn parse_projection_expression(input: &str) -> Result<Vec<Path>, ExpressionError> {
    let mut parser = Parser::new(Lexer::new(input).tokenize()?);
    let mut paths = vec![parser.parse_path()?];
    while matches!(parser.peek(), Token::Comma) {
        parser.advance();
        paths.push(parser.parse_path()?);
    }
    parser.expect_end()?;
    Ok(paths)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_parse_simple_comparison() {
        let expr = parse_condition_expression("#name = :val").unwrap();
        match &expr {
            ConditionExpression::Comparison { op, left, right } => {
                assert_eq!(*op, Comparator::Eq);
                assert!(matches!(left, Value::PathRef(p) if p.root() == "#name"));
                assert!(matches!(right, Value::ValueRef(v) if v == ":val"));
            }
            other => panic!("expected Comparison, got {other:?}"),
        }
    }

    #[test]
    fn test_should_parse_all_comparison_operators() {
        for (input, expected) in [
            ("a = :v", Comparator::Eq),
            ("a <> :v", Comparator::Ne),
            ("a < :v", Comparator::Lt),
            ("a <= :v", Comparator::Le),
            ("a > :v", Comparator::Gt),
            ("a >= :v", Comparator::Ge),
        ] {
            let expr = parse_condition_expression(input).unwrap();
            match &expr {
                ConditionExpression::Comparison { op, .. } => {
                    assert_eq!(*op, expected, "for input {input}");
                }
                other => panic!("expected Comparison for '{input}', got {other:?}"),
            }
        }
    }

    #[test]
    fn test_should_parse_logical_operators_with_precedence() {
        // AND binds tighter than OR.
        let expr = parse_condition_expression("a = :x OR b = :y AND c = :z").unwrap();
        match &expr {
            ConditionExpression::Or(left, right) => {
                assert!(matches!(**left, ConditionExpression::Comparison { .. }));
                assert!(matches!(**right, ConditionExpression::And(_, _)));
            }
            other => panic!("expected Or at the top, got {other:?}"),
        }
    }

    #[test]
    fn test_should_parse_parentheses_overriding_precedence() {
        let expr = parse_condition_expression("(a = :x OR b = :y) AND c = :z").unwrap();
        match &expr {
            ConditionExpression::And(left, _) => match &**left {
                ConditionExpression::Parenthesized(inner) => {
                    assert!(matches!(**inner, ConditionExpression::Or(_, _)));
                }
                other => panic!("expected Parenthesized, got {other:?}"),
            },
            other => panic!("expected And at the top, got {other:?}"),
        }
    }

    #[test]
    fn test_should_parse_not_expression() {
        let expr = parse_condition_expression("NOT a = :v").unwrap();
        assert!(matches!(expr, ConditionExpression::Not(_)));
    }

    #[test]
    fn test_should_parse_between() {
        let expr = parse_condition_expression("age BETWEEN :low AND :high").unwrap();
        match &expr {
            ConditionExpression::Between { value, low, high } => {
                assert!(matches!(value, Value::PathRef(_)));
                assert!(matches!(low, Value::ValueRef(v) if v == ":low"));
                assert!(matches!(high, Value::ValueRef(v) if v == ":high"));
            }
            other => panic!("expected Between, got {other:?}"),
        }
    }

    #[test]
    fn test_should_parse_in_list() {
        let expr = parse_condition_expression("status IN (:a, :b, :c)").unwrap();
        match &expr {
            ConditionExpression::In { list, .. } => assert_eq!(list.len(), 3),
            other => panic!("expected In, got {other:?}"),
        }
    }

    #[test]
    fn test_should_parse_predicates() {
        let expr = parse_condition_expression("attribute_exists(#p)").unwrap();
        assert!(matches!(
            expr,
            ConditionExpression::FunctionPredicate {
                name: Predicate::AttributeExists,
                ..
            }
        ));
        let expr = parse_condition_expression("begins_with(name, :prefix)").unwrap();
        match &expr {
            ConditionExpression::FunctionPredicate { name, args } => {
                assert_eq!(*name, Predicate::BeginsWith);
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected FunctionPredicate, got {other:?}"),
        }
    }

    #[test]
    fn test_should_parse_size_as_comparison_operand() {
        let expr = parse_condition_expression("size(bar) > :v").unwrap();
        match &expr {
            ConditionExpression::Comparison { left, op, .. } => {
                assert_eq!(*op, Comparator::Gt);
                assert!(matches!(
                    left,
                    Value::FunctionCall {
                        name: ValueFunction::Size,
                        ..
                    }
                ));
            }
            other => panic!("expected Comparison, got {other:?}"),
        }
    }

    #[test]
    fn test_should_parse_nested_paths_with_indices() {
        let expr = parse_condition_expression("y.z[1] = :two").unwrap();
        match &expr {
            ConditionExpression::Comparison { left, .. } => match left {
                Value::PathRef(path) => {
                    assert_eq!(path.root(), "y");
                    assert_eq!(
                        path.operators,
                        vec![
                            PathOperator::Attribute("z".to_owned()),
                            PathOperator::Index(1)
                        ]
                    );
                }
                other => panic!("expected PathRef, got {other:?}"),
            },
            other => panic!("expected Comparison, got {other:?}"),
        }
    }

    #[test]
    fn test_should_parse_case_insensitive_keywords() {
        assert!(parse_condition_expression("a = :x and b = :y").is_ok());
        assert!(parse_update_expression("set a = :x remove b").is_ok());
    }

    #[test]
    fn test_should_keep_function_names_case_sensitive() {
        // `Size` is an ordinary attribute name, not the size() function.
        let expr = parse_condition_expression("Size > :v").unwrap();
        match &expr {
            ConditionExpression::Comparison { left, .. } => {
                assert!(matches!(left, Value::PathRef(p) if p.root() == "Size"));
            }
            other => panic!("expected Comparison, got {other:?}"),
        }
    }

    #[test]
    fn test_should_parse_update_with_all_clause_kinds() {
        let update =
            parse_update_expression("SET a = :v1 REMOVE b, c ADD d :v2 DELETE e :v3").unwrap();
        assert_eq!(update.set.len(), 1);
        assert_eq!(update.remove.len(), 2);
        assert_eq!(update.add.len(), 1);
        assert_eq!(update.delete.len(), 1);
    }

    #[test]
    fn test_should_parse_set_arithmetic() {
        let update = parse_update_expression("SET counter = counter + :inc").unwrap();
        assert!(matches!(
            update.set[0].value,
            Value::Arithmetic {
                op: ArithmeticOp::Plus,
                ..
            }
        ));
        let update = parse_update_expression("SET counter = :base - :dec").unwrap();
        assert!(matches!(
            update.set[0].value,
            Value::Arithmetic {
                op: ArithmeticOp::Minus,
                ..
            }
        ));
    }

    #[test]
    fn test_should_parse_if_not_exists_and_list_append() {
        let update = parse_update_expression("SET x = if_not_exists(x, :default)").unwrap();
        assert!(matches!(
            update.set[0].value,
            Value::FunctionCall {
                name: ValueFunction::IfNotExists,
                ..
            }
        ));
        let update = parse_update_expression("SET l = list_append(l, :more)").unwrap();
        assert!(matches!(
            update.set[0].value,
            Value::FunctionCall {
                name: ValueFunction::ListAppend,
                ..
            }
        ));
    }

    #[test]
    fn test_should_parse_arithmetic_around_if_not_exists() {
        let update = parse_update_expression("SET n = if_not_exists(n, :zero) + :inc").unwrap();
        match &update.set[0].value {
            Value::Arithmetic { op, left, .. } => {
                assert_eq!(*op, ArithmeticOp::Plus);
                assert!(matches!(
                    **left,
                    Value::FunctionCall {
                        name: ValueFunction::IfNotExists,
                        ..
                    }
                ));
            }
            other => panic!("expected Arithmetic, got {other:?}"),
        }
    }

    #[test]
    fn test_should_reject_chained_set_arithmetic() {
        let result = parse_update_expression("SET x = :a + :b + :c");
        assert!(matches!(result, Err(ExpressionError::Syntax { .. })));
        assert!(parse_update_expression("SET x = :a - :b + :c").is_err());
    }

    #[test]
    fn test_should_reject_duplicate_clause_keyword() {
        let result = parse_update_expression("SET a = :v SET b = :v");
        assert!(matches!(result, Err(ExpressionError::Syntax { .. })));
        assert!(parse_update_expression("REMOVE a REMOVE b").is_err());
    }

    #[test]
    fn test_should_reject_empty_or_whitespace_expressions() {
        assert!(parse_update_expression("").is_err());
        assert!(parse_update_expression("   ").is_err());
        assert!(parse_condition_expression("").is_err());
        assert!(parse_projection_expression("").is_err());
    }

    #[test]
    fn test_should_reject_trailing_tokens() {
        assert!(parse_condition_expression("a = :v extra").is_err());
        assert!(parse_projection_expression("a, b )").is_err());
    }

    #[test]
    fn test_should_reject_wrong_arity() {
        assert!(parse_condition_expression("attribute_exists(a, b)").is_err());
        assert!(parse_update_expression("SET x = if_not_exists(x)").is_err());
        assert!(parse_condition_expression("size(a, b) > :v").is_err());
    }

    #[test]
    fn test_should_reject_unexpected_characters() {
        let err = parse_condition_expression("a = %v").unwrap_err();
        assert!(err.to_string().contains("unexpected character"));
    }

    #[test]
    fn test_should_parse_projection_paths() {
        let paths = parse_projection_expression("id, info.rating, tags[0]").unwrap();
        assert_eq!(paths.len(), 3);
        assert_eq!(paths[1].to_string(), "info.rating");
        assert_eq!(paths[2].to_string(), "tags[0]");
    }

    #[test]
    fn test_should_permit_duplicate_projection_paths() {
        let paths = parse_projection_expression("a, a").unwrap();
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0], paths[1]);
    }
}
