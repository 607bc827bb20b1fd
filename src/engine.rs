//! Minimal Jex engine.
//!
//! The rest of the crate consumes exactly two operations: [`compile`] turns
//! script text into a [`Program`], and [`Program::execute`] runs it against
//! an input document plus optional metadata. Everything else in this module
//! is private.
//!
//! The language: statements end with `;`, line comments start with `//`.
//! `%let name = expr;` binds a script variable, `%set path.to.field = expr;`
//! sets a field in the output document (which starts as `{}`). Expressions
//! are JSON literals, variables, `$`/`$.path` (input access), `$meta`
//! (metadata access), and `+ - * /` with parentheses.

use std::collections::HashMap;
use std::fmt;

use serde_json::{Map, Number, Value};

/// Error raised by the engine while compiling or executing.
///
/// `line`/`column` are 1-based source positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineError {
    pub message: String,
    pub line: u32,
    pub column: u32,
}

impl EngineError {
    fn at(message: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            message: message.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (line {}, column {})", self.message, self.line, self.column)
    }
}

impl std::error::Error for EngineError {}

/// A compiled script, ready to execute any number of times.
#[derive(Debug, Clone)]
pub struct Program {
    stmts: Vec<Stmt>,
}

/// Compile script text into a [`Program`].
pub fn compile(source: &str) -> Result<Program, EngineError> {
    let (tokens, eof) = tokenize(source)?;
    Parser::new(tokens, eof).parse_program()
}

impl Program {
    /// Execute against an input document and optional metadata.
    ///
    /// Absent metadata is meaningful: any `$meta` evaluation fails at
    /// runtime when `meta` is `None`, which is distinct from an empty
    /// metadata object.
    pub fn execute(&self, input: &Value, meta: Option<&Value>) -> Result<Value, EngineError> {
        let mut vars: HashMap<String, Value> = HashMap::new();
        let mut out = Map::new();

        for stmt in &self.stmts {
            match stmt {
                Stmt::Let { name, expr } => {
                    let value = eval(expr, input, meta, &vars)?;
                    vars.insert(name.clone(), value);
                }
                Stmt::Set { path, expr } => {
                    let value = eval(expr, input, meta, &vars)?;
                    set_path(&mut out, path, value);
                }
            }
        }

        Ok(Value::Object(out))
    }
}

#[derive(Debug, Clone)]
enum Stmt {
    Let { name: String, expr: Expr },
    Set { path: Vec<String>, expr: Expr },
}

#[derive(Debug, Clone)]
struct Expr {
    kind: ExprKind,
    line: u32,
    column: u32,
}

#[derive(Debug, Clone)]
enum ExprKind {
    Lit(Value),
    Var(String),
    /// `$` with an optional field path; empty path is the whole input.
    Input(Vec<String>),
    /// `$meta` with an optional field path.
    Meta(Vec<String>),
    Array(Vec<Expr>),
    Object(Vec<(String, Expr)>),
    Neg(Box<Expr>),
    Binary(char, Box<Expr>, Box<Expr>),
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    /// `%let`, `%set` (name stored without the `%`)
    Directive(String),
    Ident(String),
    Str(String),
    Num(Number),
    /// `$` followed by an optional name; empty name is the input root.
    Dollar(String),
    Punct(char),
}

#[derive(Debug, Clone)]
struct Token {
    tok: Tok,
    line: u32,
    column: u32,
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) {
        loop {
            while self.peek().is_some_and(|c| c.is_whitespace()) {
                self.bump();
            }
            if self.peek() == Some('/') && self.peek_next() == Some('/') {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
                continue;
            }
            break;
        }
    }

    fn read_ident(&mut self, first: char) -> String {
        let mut s = first.to_string();
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            s.push(self.bump().unwrap());
        }
        s
    }
}

/// Tokenize the whole source, also returning the end-of-input position for
/// "unexpected end of script" diagnostics.
fn tokenize(source: &str) -> Result<(Vec<Token>, (u32, u32)), EngineError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();

    loop {
        lexer.skip_trivia();
        let (line, column) = (lexer.line, lexer.column);
        let c = match lexer.bump() {
            Some(c) => c,
            None => break,
        };

        let tok = match c {
            ';' | '=' | '.' | ',' | ':' | '(' | ')' | '[' | ']' | '{' | '}' | '+' | '-' | '*'
            | '/' => Tok::Punct(c),
            '%' => {
                if lexer.peek().is_some_and(|n| n.is_ascii_alphabetic()) {
                    let first = lexer.bump().unwrap();
                    Tok::Directive(lexer.read_ident(first))
                } else {
                    return Err(EngineError::at("expected directive name after '%'", line, column));
                }
            }
            '$' => {
                let mut name = String::new();
                while lexer
                    .peek()
                    .is_some_and(|n| n.is_ascii_alphanumeric() || n == '_')
                {
                    name.push(lexer.bump().unwrap());
                }
                Tok::Dollar(name)
            }
            '"' => {
                let mut s = String::new();
                loop {
                    match lexer.bump() {
                        None => {
                            return Err(EngineError::at("unterminated string", line, column));
                        }
                        Some('"') => break,
                        Some('\\') => match lexer.bump() {
                            Some('"') => s.push('"'),
                            Some('\\') => s.push('\\'),
                            Some('n') => s.push('\n'),
                            Some('t') => s.push('\t'),
                            Some('r') => s.push('\r'),
                            other => {
                                return Err(EngineError::at(
                                    format!(
                                        "invalid escape '\\{}'",
                                        other.map(String::from).unwrap_or_default()
                                    ),
                                    lexer.line,
                                    lexer.column,
                                ));
                            }
                        },
                        Some(other) => s.push(other),
                    }
                }
                Tok::Str(s)
            }
            c if c.is_ascii_digit() => {
                let mut text = c.to_string();
                while lexer
                    .peek()
                    .is_some_and(|n| n.is_ascii_digit() || n == '.' || n == 'e' || n == 'E')
                {
                    let n = lexer.bump().unwrap();
                    if (n == 'e' || n == 'E') && matches!(lexer.peek(), Some('+') | Some('-')) {
                        text.push(n);
                        text.push(lexer.bump().unwrap());
                        continue;
                    }
                    text.push(n);
                }
                let number = parse_number(&text)
                    .ok_or_else(|| EngineError::at(format!("invalid number '{text}'"), line, column))?;
                Tok::Num(number)
            }
            c if c.is_ascii_alphabetic() || c == '_' => Tok::Ident(lexer.read_ident(c)),
            other => {
                return Err(EngineError::at(format!("unexpected character '{other}'"), line, column));
            }
        };

        tokens.push(Token { tok, line, column });
    }

    Ok((tokens, (lexer.line, lexer.column)))
}

fn parse_number(text: &str) -> Option<Number> {
    if text.contains(['.', 'e', 'E']) {
        Number::from_f64(text.parse::<f64>().ok()?)
    } else {
        text.parse::<i64>().ok().map(Number::from)
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    eof: (u32, u32),
}

impl Parser {
    fn new(tokens: Vec<Token>, eof: (u32, u32)) -> Self {
        Self { tokens, pos: 0, eof }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eof_error(&self, expected: &str) -> EngineError {
        EngineError::at(
            format!("unexpected end of script, expected {expected}"),
            self.eof.0,
            self.eof.1,
        )
    }

    fn expect_punct(&mut self, c: char, expected: &str) -> Result<(), EngineError> {
        match self.next() {
            Some(Token { tok: Tok::Punct(p), .. }) if p == c => Ok(()),
            Some(token) => Err(EngineError::at(
                format!("expected {expected}"),
                token.line,
                token.column,
            )),
            None => Err(self.eof_error(expected)),
        }
    }

    fn parse_program(mut self) -> Result<Program, EngineError> {
        let mut stmts = Vec::new();
        while self.peek().is_some() {
            stmts.push(self.parse_stmt()?);
        }
        Ok(Program { stmts })
    }

    fn parse_stmt(&mut self) -> Result<Stmt, EngineError> {
        let token = match self.next() {
            Some(token) => token,
            None => return Err(self.eof_error("a statement")),
        };

        let stmt = match token.tok {
            Tok::Directive(name) if name == "let" => {
                let name = self.parse_ident()?;
                self.expect_punct('=', "'='")?;
                let expr = self.parse_expr()?;
                Stmt::Let { name, expr }
            }
            Tok::Directive(name) if name == "set" => {
                let path = self.parse_path()?;
                self.expect_punct('=', "'='")?;
                let expr = self.parse_expr()?;
                Stmt::Set { path, expr }
            }
            Tok::Directive(name) => {
                return Err(EngineError::at(
                    format!("unknown directive '%{name}'"),
                    token.line,
                    token.column,
                ));
            }
            _ => {
                return Err(EngineError::at(
                    "expected '%let' or '%set'",
                    token.line,
                    token.column,
                ));
            }
        };

        self.expect_punct(';', "';' to end the statement")?;
        Ok(stmt)
    }

    fn parse_ident(&mut self) -> Result<String, EngineError> {
        match self.next() {
            Some(Token { tok: Tok::Ident(name), .. }) => Ok(name),
            Some(token) => Err(EngineError::at("expected a name", token.line, token.column)),
            None => Err(self.eof_error("a name")),
        }
    }

    fn parse_path(&mut self) -> Result<Vec<String>, EngineError> {
        let mut path = vec![self.parse_ident()?];
        while matches!(self.peek(), Some(Token { tok: Tok::Punct('.'), .. })) {
            self.next();
            path.push(self.parse_ident()?);
        }
        Ok(path)
    }

    fn parse_expr(&mut self) -> Result<Expr, EngineError> {
        let mut lhs = self.parse_term()?;
        while let Some(Token { tok: Tok::Punct(op @ ('+' | '-')), .. }) = self.peek() {
            let op = *op;
            self.next();
            let rhs = self.parse_term()?;
            lhs = Expr {
                line: lhs.line,
                column: lhs.column,
                kind: ExprKind::Binary(op, Box::new(lhs), Box::new(rhs)),
            };
        }
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Expr, EngineError> {
        let mut lhs = self.parse_factor()?;
        while let Some(Token { tok: Tok::Punct(op @ ('*' | '/')), .. }) = self.peek() {
            let op = *op;
            self.next();
            let rhs = self.parse_factor()?;
            lhs = Expr {
                line: lhs.line,
                column: lhs.column,
                kind: ExprKind::Binary(op, Box::new(lhs), Box::new(rhs)),
            };
        }
        Ok(lhs)
    }

    fn parse_factor(&mut self) -> Result<Expr, EngineError> {
        let token = match self.next() {
            Some(token) => token,
            None => return Err(self.eof_error("an expression")),
        };
        let (line, column) = (token.line, token.column);
        let expr = |kind| Expr { kind, line, column };

        match token.tok {
            Tok::Num(n) => Ok(expr(ExprKind::Lit(Value::Number(n)))),
            Tok::Str(s) => Ok(expr(ExprKind::Lit(Value::String(s)))),
            Tok::Ident(name) => match name.as_str() {
                "true" => Ok(expr(ExprKind::Lit(Value::Bool(true)))),
                "false" => Ok(expr(ExprKind::Lit(Value::Bool(false)))),
                "null" => Ok(expr(ExprKind::Lit(Value::Null))),
                _ => Ok(expr(ExprKind::Var(name))),
            },
            Tok::Dollar(name) => {
                let path = self.parse_dollar_path()?;
                if name.is_empty() {
                    Ok(expr(ExprKind::Input(path)))
                } else if name == "meta" {
                    Ok(expr(ExprKind::Meta(path)))
                } else {
                    Err(EngineError::at(format!("unknown reference '${name}'"), line, column))
                }
            }
            Tok::Punct('-') => {
                let inner = self.parse_factor()?;
                Ok(expr(ExprKind::Neg(Box::new(inner))))
            }
            Tok::Punct('(') => {
                let inner = self.parse_expr()?;
                self.expect_punct(')', "')'")?;
                Ok(inner)
            }
            Tok::Punct('[') => {
                let mut items = Vec::new();
                if !matches!(self.peek(), Some(Token { tok: Tok::Punct(']'), .. })) {
                    loop {
                        items.push(self.parse_expr()?);
                        if matches!(self.peek(), Some(Token { tok: Tok::Punct(','), .. })) {
                            self.next();
                        } else {
                            break;
                        }
                    }
                }
                self.expect_punct(']', "']'")?;
                Ok(expr(ExprKind::Array(items)))
            }
            Tok::Punct('{') => {
                let mut fields = Vec::new();
                if !matches!(self.peek(), Some(Token { tok: Tok::Punct('}'), .. })) {
                    loop {
                        let key = match self.next() {
                            Some(Token { tok: Tok::Ident(k), .. })
                            | Some(Token { tok: Tok::Str(k), .. }) => k,
                            Some(token) => {
                                return Err(EngineError::at(
                                    "expected an object key",
                                    token.line,
                                    token.column,
                                ));
                            }
                            None => return Err(self.eof_error("an object key")),
                        };
                        self.expect_punct(':', "':'")?;
                        fields.push((key, self.parse_expr()?));
                        if matches!(self.peek(), Some(Token { tok: Tok::Punct(','), .. })) {
                            self.next();
                        } else {
                            break;
                        }
                    }
                }
                self.expect_punct('}', "'}'")?;
                Ok(expr(ExprKind::Object(fields)))
            }
            Tok::Punct(p) => {
                Err(EngineError::at(format!("unexpected '{p}'"), line, column))
            }
            Tok::Directive(name) => {
                Err(EngineError::at(format!("unexpected directive '%{name}'"), line, column))
            }
        }
    }

    /// Trailing `.field` segments after `$` or `$meta`.
    fn parse_dollar_path(&mut self) -> Result<Vec<String>, EngineError> {
        let mut path = Vec::new();
        while matches!(self.peek(), Some(Token { tok: Tok::Punct('.'), .. })) {
            self.next();
            path.push(self.parse_ident()?);
        }
        Ok(path)
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

fn eval(
    expr: &Expr,
    input: &Value,
    meta: Option<&Value>,
    vars: &HashMap<String, Value>,
) -> Result<Value, EngineError> {
    match &expr.kind {
        ExprKind::Lit(value) => Ok(value.clone()),
        ExprKind::Var(name) => vars.get(name).cloned().ok_or_else(|| {
            EngineError::at(format!("undefined variable '{name}'"), expr.line, expr.column)
        }),
        ExprKind::Input(path) => Ok(walk(input, path)),
        ExprKind::Meta(path) => {
            let meta = meta.ok_or_else(|| {
                EngineError::at("no metadata supplied for $meta", expr.line, expr.column)
            })?;
            Ok(walk(meta, path))
        }
        ExprKind::Array(items) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                values.push(eval(item, input, meta, vars)?);
            }
            Ok(Value::Array(values))
        }
        ExprKind::Object(fields) => {
            let mut map = Map::new();
            for (key, value) in fields {
                map.insert(key.clone(), eval(value, input, meta, vars)?);
            }
            Ok(Value::Object(map))
        }
        ExprKind::Neg(inner) => {
            let value = eval(inner, input, meta, vars)?;
            match value.as_f64() {
                Some(n) => number_value(-n).ok_or_else(|| overflow(expr)),
                None => Err(EngineError::at(
                    format!("cannot negate {}", type_name(&value)),
                    expr.line,
                    expr.column,
                )),
            }
        }
        ExprKind::Binary(op, lhs, rhs) => {
            let left = eval(lhs, input, meta, vars)?;
            let right = eval(rhs, input, meta, vars)?;
            apply_binary(*op, &left, &right, expr)
        }
    }
}

fn apply_binary(op: char, left: &Value, right: &Value, expr: &Expr) -> Result<Value, EngineError> {
    if op == '+' {
        if let (Value::String(a), Value::String(b)) = (left, right) {
            return Ok(Value::String(format!("{a}{b}")));
        }
    }

    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => {
            if op == '/' && b == 0.0 {
                return Err(EngineError::at("division by zero", expr.line, expr.column));
            }
            let n = match op {
                '+' => a + b,
                '-' => a - b,
                '*' => a * b,
                _ => a / b,
            };
            number_value(n).ok_or_else(|| overflow(expr))
        }
        _ => Err(EngineError::at(
            format!(
                "cannot apply '{op}' to {} and {}",
                type_name(left),
                type_name(right)
            ),
            expr.line,
            expr.column,
        )),
    }
}

fn overflow(expr: &Expr) -> EngineError {
    EngineError::at("numeric overflow", expr.line, expr.column)
}

/// Integral results stay integers; everything else becomes a float.
fn number_value(n: f64) -> Option<Value> {
    if !n.is_finite() {
        return None;
    }
    if n.fract() == 0.0 && n.abs() <= 9_007_199_254_740_992.0 {
        Some(Value::from(n as i64))
    } else {
        Number::from_f64(n).map(Value::Number)
    }
}

/// Field-path lookup. A missing or non-object step yields `null`.
fn walk(root: &Value, path: &[String]) -> Value {
    let mut current = root;
    for key in path {
        match current.get(key) {
            Some(next) => current = next,
            None => return Value::Null,
        }
    }
    current.clone()
}

fn set_path(out: &mut Map<String, Value>, path: &[String], value: Value) {
    let (last, parents) = match path.split_last() {
        Some(split) => split,
        None => return,
    };
    let mut current = out;
    for key in parents {
        let entry = current
            .entry(key.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        current = match entry.as_object_mut() {
            Some(map) => map,
            None => return,
        };
    }
    current.insert(last.clone(), value);
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
