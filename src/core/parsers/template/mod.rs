//! Angular template scanning.
//!
//! The scanner is not a full HTML parser. It recovers what the template parsers
//! need in a single pass:
//! - every element with its attributes and its direct text children (for directives)
//! - the source of every Angular expression (for pipes): interpolations, bound and
//!   structural attributes, control-flow block parameters and `@let` declarations
//!
//! Unbalanced markup is tolerated: unmatched closing tags are ignored and
//! unclosed elements end with the template.

pub mod expr;

use std::sync::LazyLock;

use regex::Regex;

pub use expr::{Ast, parse_expressions};

/// `@if (`, `@else if (`, `@for (`, `@switch (`, `@case (`, `@defer (`
static BLOCK_PARAMS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@(?:if|else\s+if|for|switch|case|defer)\s*\(").unwrap()
});

/// `@let name = expression;`
static LET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@let\s+[\w$]+\s*=\s*([^;]*);").unwrap());

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
}

impl Attribute {
    /// Expression source of a property binding (`[x]`, `bind-x`) or structural directive (`*x`).
    ///
    /// Event and two-way bindings hold statements and are not reported.
    pub fn binding_expression(&self) -> Option<&str> {
        let name = self.name.as_str();
        let is_property = name.starts_with('[') && !name.starts_with("[(") && name.ends_with(']');
        if is_property || name.starts_with("bind-") || name.starts_with('*') {
            self.value.as_deref()
        } else {
            None
        }
    }

    /// The bare name of a property binding: `[translate]` and `bind-translate` give `translate`.
    pub fn bound_name(&self) -> Option<&str> {
        let name = self.name.as_str();
        if let Some(inner) = name.strip_prefix('[').and_then(|n| n.strip_suffix(']')) {
            (!inner.starts_with('(')).then_some(inner)
        } else {
            name.strip_prefix("bind-")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<Attribute>,
    /// Text between this element's tags that is not inside a child element.
    pub texts: Vec<String>,
}

impl Element {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

#[derive(Debug, Default)]
pub struct Template {
    pub elements: Vec<Element>,
    pub expressions: Vec<String>,
}

/// Scan a template source.
pub fn scan(source: &str) -> Template {
    let mut scanner = Scanner {
        source,
        pos: 0,
        stack: Vec::new(),
        template: Template::default(),
    };
    scanner.run();
    scanner.template
}

struct Scanner<'a> {
    source: &'a str,
    pos: usize,
    /// Indices into `template.elements` of the currently open elements.
    stack: Vec<usize>,
    template: Template,
}

impl Scanner<'_> {
    fn rest(&self) -> &str {
        &self.source[self.pos..]
    }

    fn byte(&self, offset: usize) -> Option<u8> {
        self.source.as_bytes().get(self.pos + offset).copied()
    }

    fn skip_past(&mut self, needle: &str) {
        self.pos = match self.rest().find(needle) {
            Some(i) => self.pos + i + needle.len(),
            None => self.source.len(),
        };
    }

    fn skip_whitespace(&mut self) {
        while self.byte(0).is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn run(&mut self) {
        while self.pos < self.source.len() {
            let rest = self.rest();
            if rest.starts_with("<!--") {
                self.skip_past("-->");
            } else if rest.starts_with("<!") {
                self.skip_past(">");
            } else if rest.starts_with("</") {
                self.closing_tag();
            } else if self.byte(0) == Some(b'<')
                && self.byte(1).is_some_and(|b| b.is_ascii_alphabetic())
            {
                self.start_tag();
            } else {
                self.text();
            }
        }
    }

    fn text(&mut self) {
        let start = self.pos;
        while self.pos < self.source.len() {
            // Byte-wise: `pos` may sit inside a multi-byte character here.
            if self.source.as_bytes()[self.pos..].starts_with(b"{{") {
                self.pos += 2;
                self.skip_past("}}");
                continue;
            }
            let next = self.byte(1);
            if self.byte(0) == Some(b'<')
                && next.is_some_and(|b| b.is_ascii_alphabetic() || b == b'/' || b == b'!')
            {
                break;
            }
            self.pos += 1;
        }
        let source = self.source;
        let text = &source[start..self.pos];

        self.collect_interpolations(text);
        self.collect_blocks(text);
        if let Some(&index) = self.stack.last() {
            self.template.elements[index].texts.push(text.to_string());
        }
    }

    fn collect_interpolations(&mut self, text: &str) {
        let mut rest = text;
        while let Some(open) = rest.find("{{") {
            let after = &rest[open + 2..];
            let Some(close) = after.find("}}") else {
                break;
            };
            self.template.expressions.push(after[..close].to_string());
            rest = &after[close + 2..];
        }
    }

    fn collect_blocks(&mut self, text: &str) {
        for m in BLOCK_PARAMS_REGEX.find_iter(text) {
            if let Some(params) = balanced_parens(&text[m.end()..]) {
                self.template.expressions.push(params.to_string());
            }
        }
        for captures in LET_REGEX.captures_iter(text) {
            if let Some(value) = captures.get(1) {
                self.template.expressions.push(value.as_str().to_string());
            }
        }
    }

    fn read_while(&mut self, mut keep: impl FnMut(u8) -> bool) -> &str {
        let start = self.pos;
        while self.byte(0).is_some_and(&mut keep) {
            self.pos += 1;
        }
        &self.source[start..self.pos]
    }

    fn start_tag(&mut self) {
        self.pos += 1;
        let name = self
            .read_while(|b| !b.is_ascii_whitespace() && b != b'>' && b != b'/')
            .to_ascii_lowercase();

        let mut attributes = Vec::new();
        let mut self_closing = false;
        loop {
            self.skip_whitespace();
            match self.byte(0) {
                None => break,
                Some(b'>') => {
                    self.pos += 1;
                    break;
                }
                Some(b'/') if self.byte(1) == Some(b'>') => {
                    self.pos += 2;
                    self_closing = true;
                    break;
                }
                _ => {}
            }

            let attr_name = self
                .read_while(|b| !b.is_ascii_whitespace() && b != b'=' && b != b'>' && b != b'/')
                .to_string();
            if attr_name.is_empty() {
                self.pos += 1;
                continue;
            }

            self.skip_whitespace();
            let value = if self.byte(0) == Some(b'=') {
                self.pos += 1;
                self.skip_whitespace();
                Some(self.attribute_value())
            } else {
                None
            };
            attributes.push(Attribute {
                name: attr_name,
                value,
            });
        }

        for attribute in &attributes {
            if let Some(expression) = attribute.binding_expression() {
                self.template.expressions.push(expression.to_string());
            } else if let Some(value) = &attribute.value
                && !attribute.name.starts_with('(')
                && !attribute.name.starts_with("on-")
            {
                self.collect_interpolations(value);
            }
        }

        let index = self.template.elements.len();
        self.template.elements.push(Element {
            name: name.clone(),
            attributes,
            texts: Vec::new(),
        });

        if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
            self.skip_past(&format!("</{name}"));
            self.skip_past(">");
        } else if !self_closing && !VOID_ELEMENTS.contains(&name.as_str()) {
            self.stack.push(index);
        }
    }

    fn attribute_value(&mut self) -> String {
        match self.byte(0) {
            Some(quote @ (b'"' | b'\'')) => {
                self.pos += 1;
                let value = self.read_while(|b| b != quote).to_string();
                self.pos = (self.pos + 1).min(self.source.len());
                value
            }
            _ => self
                .read_while(|b| !b.is_ascii_whitespace() && b != b'>')
                .to_string(),
        }
    }

    fn closing_tag(&mut self) {
        self.pos += 2;
        let name = self
            .read_while(|b| !b.is_ascii_whitespace() && b != b'>')
            .to_ascii_lowercase();
        self.skip_past(">");

        if let Some(depth) = self
            .stack
            .iter()
            .rposition(|&i| self.template.elements[i].name == name)
        {
            self.stack.truncate(depth);
        }
    }
}

/// Content up to the parenthesis closing an already opened one, skipping quoted strings.
fn balanced_parens(source: &str) -> Option<&str> {
    let mut depth = 1usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in source.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' | '`' => quote = Some(c),
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&source[..i]);
                }
            }
            _ => {}
        }
    }
    None
}
