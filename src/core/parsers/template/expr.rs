//! A tolerant parser for the subset of Angular template expressions that matters
//! for extraction: literals, conditionals, logical alternatives and pipes.
//!
//! Anything the grammar does not model is kept as an opaque [`Ast::Other`] node
//! holding its children, so pipes nested anywhere are still reachable.
//! Malformed input never fails: unknown tokens are skipped.

#[derive(Debug, Clone, PartialEq)]
pub enum Ast {
    Str(String),
    Conditional {
        test: Box<Ast>,
        then: Box<Ast>,
        otherwise: Box<Ast>,
    },
    Binary {
        op: String,
        left: Box<Ast>,
        right: Box<Ast>,
    },
    Pipe {
        input: Box<Ast>,
        name: String,
        args: Vec<Ast>,
    },
    Array(Vec<Ast>),
    Other(Vec<Ast>),
}

impl Ast {
    fn children(&self) -> Vec<&Ast> {
        match self {
            Ast::Str(_) => Vec::new(),
            Ast::Conditional {
                test,
                then,
                otherwise,
            } => vec![&**test, &**then, &**otherwise],
            Ast::Binary { left, right, .. } => vec![&**left, &**right],
            Ast::Pipe { input, args, .. } => std::iter::once(&**input).chain(args).collect(),
            Ast::Array(items) | Ast::Other(items) => items.iter().collect(),
        }
    }

    /// Visit this node and all of its descendants, parents first.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Ast)) {
        f(self);
        for child in self.children() {
            child.walk(f);
        }
    }

    /// Every literal this expression can evaluate to.
    ///
    /// Conditional branches and `||`/`??` operands are followed; everything else
    /// (concatenation, calls, variables) yields nothing.
    pub fn literals(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_literals(&mut out);
        out
    }

    fn collect_literals(&self, out: &mut Vec<String>) {
        match self {
            Ast::Str(s) => out.push(s.clone()),
            Ast::Conditional {
                then, otherwise, ..
            } => {
                then.collect_literals(out);
                otherwise.collect_literals(out);
            }
            Ast::Binary { op, left, right } if op == "||" || op == "??" => {
                left.collect_literals(out);
                right.collect_literals(out);
            }
            _ => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Str(String),
    Ident(String),
    Number,
    Op(&'static str),
    Unknown,
}

const OPERATORS: &[&str] = &[
    "===", "!==", "?.", "??", "||", "&&", "==", "!=", "<=", ">=", "|", "?", ":", "(", ")", "[",
    "]", "{", "}", ",", ".", "+", "-", "*", "/", "%", "!", "<", ">", "=", ";", "#",
];

const BINARY_OPERATORS: &[&str] = &[
    "===", "!==", "??", "||", "&&", "==", "!=", "<=", ">=", "+", "-", "*", "/", "%", "<", ">", "=",
];

fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '\'' || c == '"' || c == '`' {
            chars.next();
            let mut value = String::new();
            let mut has_substitution = false;
            while let Some((_, ch)) = chars.next() {
                match ch {
                    '\\' => {
                        if let Some((_, escaped)) = chars.next() {
                            value.push(match escaped {
                                'n' => '\n',
                                't' => '\t',
                                'r' => '\r',
                                other => other,
                            });
                        }
                    }
                    '$' if c == '`' && chars.peek().is_some_and(|&(_, n)| n == '{') => {
                        has_substitution = true;
                        value.push(ch);
                    }
                    ch if ch == c => break,
                    ch => value.push(ch),
                }
            }
            tokens.push(if has_substitution {
                Token::Unknown
            } else {
                Token::Str(value)
            });
        } else if c.is_ascii_digit() {
            while chars
                .peek()
                .is_some_and(|&(_, ch)| ch.is_ascii_alphanumeric() || ch == '.' || ch == '_')
            {
                chars.next();
            }
            tokens.push(Token::Number);
        } else if c.is_alphabetic() || c == '_' || c == '$' {
            let mut end = start;
            while let Some(&(i, ch)) = chars.peek() {
                if ch.is_alphanumeric() || ch == '_' || ch == '$' {
                    end = i + ch.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token::Ident(source[start..end].to_string()));
        } else if let Some(op) = OPERATORS.iter().find(|op| source[start..].starts_with(*op)) {
            for _ in 0..op.len() {
                chars.next();
            }
            tokens.push(Token::Op(*op));
        } else {
            chars.next();
            tokens.push(Token::Unknown);
        }
    }
    tokens
}

struct ExprParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl ExprParser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn is_op(&self, op: &str) -> bool {
        matches!(self.peek(), Some(Token::Op(o)) if *o == op)
    }

    fn eat_op(&mut self, op: &str) -> bool {
        if self.is_op(op) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn pipe(&mut self) -> Ast {
        let mut ast = self.conditional();
        while self.is_op("|") {
            self.pos += 1;
            let name = match self.peek() {
                Some(Token::Ident(name)) => name.clone(),
                _ => break,
            };
            self.pos += 1;
            let mut args = Vec::new();
            while self.eat_op(":") {
                args.push(self.conditional());
            }
            ast = Ast::Pipe {
                input: Box::new(ast),
                name,
                args,
            };
        }
        ast
    }

    fn conditional(&mut self) -> Ast {
        let test = self.binary();
        if !self.eat_op("?") {
            return test;
        }
        let then = self.pipe();
        let otherwise = if self.eat_op(":") {
            self.pipe()
        } else {
            Ast::Other(Vec::new())
        };
        Ast::Conditional {
            test: Box::new(test),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    fn binary(&mut self) -> Ast {
        let mut left = self.unary();
        while let Some(Token::Op(op)) = self.peek() {
            let op = *op;
            if !BINARY_OPERATORS.contains(&op) {
                break;
            }
            self.pos += 1;
            let right = self.unary();
            left = Ast::Binary {
                op: op.to_string(),
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        left
    }

    fn unary(&mut self) -> Ast {
        if self.eat_op("!") || self.eat_op("-") || self.eat_op("+") {
            return Ast::Other(vec![self.unary()]);
        }
        if matches!(self.peek(), Some(Token::Ident(word)) if word == "typeof" || word == "void") {
            self.pos += 1;
            return Ast::Other(vec![self.unary()]);
        }
        self.postfix()
    }

    fn postfix(&mut self) -> Ast {
        let mut ast = self.primary();
        loop {
            if self.eat_op(".") || self.eat_op("?.") {
                match self.peek() {
                    Some(Token::Ident(_)) => {
                        self.pos += 1;
                        ast = Ast::Other(vec![ast]);
                    }
                    Some(Token::Op("(")) | Some(Token::Op("[")) => {}
                    _ => break,
                }
            } else if self.eat_op("[") {
                let index = self.pipe();
                self.eat_op("]");
                ast = Ast::Other(vec![ast, index]);
            } else if self.eat_op("(") {
                let mut children = vec![ast];
                children.extend(self.list(")"));
                ast = Ast::Other(children);
            } else if self.is_op("!") && !self.is_binary_after_bang() {
                // Non-null assertion.
                self.pos += 1;
            } else {
                break;
            }
        }
        ast
    }

    /// `a!` vs `a != b`: `!=` is tokenized separately, so a lone `!` followed by
    /// something that can start an operand is a prefix of the next expression.
    fn is_binary_after_bang(&self) -> bool {
        matches!(
            self.tokens.get(self.pos + 1),
            Some(Token::Ident(_)) | Some(Token::Str(_)) | Some(Token::Number)
        )
    }

    fn primary(&mut self) -> Ast {
        let Some(token) = self.peek().cloned() else {
            return Ast::Other(Vec::new());
        };
        match token {
            Token::Str(value) => {
                self.pos += 1;
                Ast::Str(value)
            }
            Token::Ident(_) | Token::Number => {
                self.pos += 1;
                Ast::Other(Vec::new())
            }
            Token::Op("(") => {
                self.pos += 1;
                let inner = self.pipe();
                self.eat_op(")");
                inner
            }
            Token::Op("[") => {
                self.pos += 1;
                Ast::Array(self.list("]"))
            }
            Token::Op("{") => {
                self.pos += 1;
                let mut values = Vec::new();
                while self.peek().is_some() && !self.eat_op("}") {
                    let before = self.pos;
                    // Keys are identifiers or strings and never literals to extract.
                    self.pos += 1;
                    if self.eat_op(":") {
                        values.push(self.pipe());
                    }
                    self.eat_op(",");
                    if self.pos == before {
                        self.pos += 1;
                    }
                }
                Ast::Other(values)
            }
            _ => Ast::Other(Vec::new()),
        }
    }

    fn list(&mut self, close: &str) -> Vec<Ast> {
        let mut items = Vec::new();
        while self.peek().is_some() && !self.eat_op(close) {
            let before = self.pos;
            items.push(self.pipe());
            self.eat_op(",");
            if self.pos == before {
                self.pos += 1;
            }
        }
        items
    }
}

/// Parse an expression source into every top-level expression it contains.
///
/// Statement separators, micro-syntax keywords (`let x of xs; index as i`) and
/// stray tokens only split the input, they never make parsing fail.
pub fn parse_expressions(source: &str) -> Vec<Ast> {
    let mut parser = ExprParser {
        tokens: tokenize(source),
        pos: 0,
    };
    let mut expressions = Vec::new();
    while parser.peek().is_some() {
        let before = parser.pos;
        let ast = parser.pipe();
        if parser.pos == before {
            parser.pos += 1;
        } else {
            expressions.push(ast);
        }
    }
    expressions
}
