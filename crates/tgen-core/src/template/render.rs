//! Compiling template text into nodes and evaluating them.

use super::{Attributes, TemplateError, TemplateGroup, Value};

/// Maximum template call depth before rendering gives up.
const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Text(String),
    Expr(Expr),
    If {
        branches: Vec<(Cond, Vec<Node>)>,
        otherwise: Vec<Node>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Attr(String),
    Literal(String),
    Call { name: String, args: Vec<Expr> },
    Apply {
        target: Box<Expr>,
        name: String,
        args: Vec<Expr>,
    },
    /// Anonymous `{...}` template, rendered in the enclosing scope.
    Subtemplate(Vec<Node>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Cond {
    Expr(Expr),
    Not(Box<Cond>),
    And(Box<Cond>, Box<Cond>),
    Or(Box<Cond>, Box<Cond>),
}

// =============================================================================
// Tokenizing
// =============================================================================

#[derive(Debug)]
enum Token {
    Text(String),
    Tag(String),
}

fn is_control(tag: &str) -> bool {
    tag.starts_with("if(") || tag.starts_with("elseif(") || tag == "else" || tag == "endif"
}

/// Splits template text into literal text and `<...>` tags.
///
/// Control tags and comments that sit alone on a line take the whole line
/// with them, including its newline.
fn tokenize(text: &str, origin: &str) -> Result<Vec<Token>, TemplateError> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut buf = String::new();
    let mut line_clean = true;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\\' && matches!(chars.get(i + 1), Some('<') | Some('>')) {
            buf.push(chars[i + 1]);
            line_clean = false;
            i += 2;
            continue;
        }

        if c != '<' {
            if c == '\n' {
                line_clean = true;
            } else if !c.is_whitespace() {
                line_clean = false;
            }
            buf.push(c);
            i += 1;
            continue;
        }

        let (tag, end, control) = if chars.get(i + 1) == Some(&'!') {
            let close = find_comment_end(&chars, i + 2)
                .ok_or_else(|| TemplateError::syntax(origin, "unterminated comment"))?;
            (None, close, true)
        } else {
            let close = find_tag_end(&chars, i + 1)
                .ok_or_else(|| TemplateError::syntax(origin, "unterminated `<` expression"))?;
            let tag: String = chars[i + 1..close].iter().collect();
            let tag = tag.trim().to_string();
            let control = is_control(&tag);
            (Some(tag), close, control)
        };

        let mut next = end + 1;
        if control && line_clean {
            if let Some(after) = rest_of_line_blank(&chars, next) {
                while buf.ends_with(' ') || buf.ends_with('\t') {
                    buf.pop();
                }
                next = after;
            } else {
                line_clean = false;
            }
        } else {
            line_clean = false;
        }

        if let Some(tag) = tag {
            if !buf.is_empty() {
                tokens.push(Token::Text(std::mem::take(&mut buf)));
            }
            tokens.push(Token::Tag(tag));
        }
        i = next;
    }

    if !buf.is_empty() {
        tokens.push(Token::Text(buf));
    }

    Ok(tokens)
}

/// Index of the `>` closing a tag, skipping over string literals and
/// anonymous `{...}` templates.
fn find_tag_end(chars: &[char], start: usize) -> Option<usize> {
    let mut in_string = false;
    let mut braces = 0usize;
    let mut i = start;
    while i < chars.len() {
        match chars[i] {
            '{' if !in_string => braces += 1,
            '}' if !in_string && braces > 0 => braces -= 1,
            _ if braces > 0 => {}
            '\\' if in_string => i += 1,
            '"' => in_string = !in_string,
            '>' if !in_string => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

/// Index of the `>` in the `!>` closing a comment.
fn find_comment_end(chars: &[char], start: usize) -> Option<usize> {
    (start..chars.len().saturating_sub(1))
        .find(|&i| chars[i] == '!' && chars[i + 1] == '>')
        .map(|i| i + 1)
}

/// If only blanks follow up to the end of the line, returns the index just
/// past the line break.
fn rest_of_line_blank(chars: &[char], start: usize) -> Option<usize> {
    let mut i = start;
    while i < chars.len() {
        match chars[i] {
            ' ' | '\t' | '\r' => i += 1,
            '\n' => return Some(i + 1),
            _ => return None,
        }
    }
    Some(i)
}

// =============================================================================
// Compiling
// =============================================================================

/// How a block of nodes ended.
enum Terminator {
    ElseIf(Cond),
    Else,
    EndIf,
}

/// Compiles template text into a node list.
pub(crate) fn compile(text: &str, origin: &str) -> Result<Vec<Node>, TemplateError> {
    let tokens = tokenize(text, origin)?;
    let mut pos = 0;
    let (nodes, terminator) = compile_block(&tokens, &mut pos, origin)?;
    match terminator {
        None => Ok(nodes),
        Some(_) => Err(TemplateError::syntax(origin, "`else`/`endif` without `if`")),
    }
}

fn compile_block(
    tokens: &[Token],
    pos: &mut usize,
    origin: &str,
) -> Result<(Vec<Node>, Option<Terminator>), TemplateError> {
    let mut nodes = Vec::new();

    while *pos < tokens.len() {
        let token = &tokens[*pos];
        *pos += 1;

        let tag = match token {
            Token::Text(text) => {
                nodes.push(Node::Text(text.clone()));
                continue;
            }
            Token::Tag(tag) => tag.as_str(),
        };

        if let Some(condition) = tag.strip_prefix("if(") {
            let condition = parse_condition(strip_close(condition, origin)?, origin)?;
            nodes.push(compile_if(condition, tokens, pos, origin)?);
        } else if let Some(condition) = tag.strip_prefix("elseif(") {
            let condition = parse_condition(strip_close(condition, origin)?, origin)?;
            return Ok((nodes, Some(Terminator::ElseIf(condition))));
        } else if tag == "else" {
            return Ok((nodes, Some(Terminator::Else)));
        } else if tag == "endif" {
            return Ok((nodes, Some(Terminator::EndIf)));
        } else if let Some(escapes) = tag.strip_prefix('\\') {
            nodes.push(Node::Text(expand_escapes(escapes, origin)?));
        } else {
            let mut parser = ExprParser::new(tag, origin);
            let expr = parser.expression()?;
            parser.finish()?;
            nodes.push(Node::Expr(expr));
        }
    }

    Ok((nodes, None))
}

fn compile_if(
    first: Cond,
    tokens: &[Token],
    pos: &mut usize,
    origin: &str,
) -> Result<Node, TemplateError> {
    let mut branches = Vec::new();
    let mut condition = first;

    loop {
        let (body, terminator) = compile_block(tokens, pos, origin)?;
        branches.push((condition, body));
        match terminator {
            Some(Terminator::ElseIf(next)) => condition = next,
            Some(Terminator::Else) => {
                let (otherwise, terminator) = compile_block(tokens, pos, origin)?;
                return match terminator {
                    Some(Terminator::EndIf) => Ok(Node::If {
                        branches,
                        otherwise,
                    }),
                    _ => Err(TemplateError::syntax(origin, "`else` without `endif`")),
                };
            }
            Some(Terminator::EndIf) => {
                return Ok(Node::If {
                    branches,
                    otherwise: Vec::new(),
                })
            }
            None => return Err(TemplateError::syntax(origin, "`if` without `endif`")),
        }
    }
}

fn strip_close<'a>(condition: &'a str, origin: &str) -> Result<&'a str, TemplateError> {
    condition
        .strip_suffix(')')
        .ok_or_else(|| TemplateError::syntax(origin, "condition is missing `)`"))
}

/// Expands the escapes of a `<\n>` style tag.
fn expand_escapes(escapes: &str, origin: &str) -> Result<String, TemplateError> {
    let mut out = String::new();
    let mut chars = std::iter::once('\\').chain(escapes.chars());
    while let Some(c) = chars.next() {
        if c != '\\' {
            return Err(TemplateError::syntax(origin, format!("bad escape tag `\\{}`", escapes)));
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(' ') => out.push(' '),
            _ => {
                return Err(TemplateError::syntax(origin, format!("bad escape tag `\\{}`", escapes)))
            }
        }
    }
    Ok(out)
}

fn parse_condition(text: &str, origin: &str) -> Result<Cond, TemplateError> {
    let mut parser = ExprParser::new(text, origin);
    let condition = parser.condition()?;
    parser.finish()?;
    Ok(condition)
}

/// Recursive descent parser for the inside of a tag.
struct ExprParser<'a> {
    chars: Vec<char>,
    pos: usize,
    origin: &'a str,
}

impl<'a> ExprParser<'a> {
    fn new(text: &str, origin: &'a str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            origin,
        }
    }

    fn error(&self, message: impl Into<String>) -> TemplateError {
        let text: String = self.chars.iter().collect();
        TemplateError::syntax(self.origin, format!("{} in `<{}>`", message.into(), text))
    }

    fn skip_ws(&mut self) {
        while self.chars.get(self.pos).is_some_and(|c| c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_ws();
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_ws();
        let end = self.pos + token.chars().count();
        if end <= self.chars.len() && self.chars[self.pos..end].iter().copied().eq(token.chars()) {
            self.pos = end;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &str) -> Result<(), TemplateError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(format!("expected `{}`", token)))
        }
    }

    fn finish(&mut self) -> Result<(), TemplateError> {
        match self.peek() {
            None => Ok(()),
            Some(c) => Err(self.error(format!("unexpected `{}`", c))),
        }
    }

    fn condition(&mut self) -> Result<Cond, TemplateError> {
        let mut left = self.conjunction()?;
        while self.eat("||") {
            let right = self.conjunction()?;
            left = Cond::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn conjunction(&mut self) -> Result<Cond, TemplateError> {
        let mut left = self.negation()?;
        while self.eat("&&") {
            let right = self.negation()?;
            left = Cond::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn negation(&mut self) -> Result<Cond, TemplateError> {
        if self.eat("!") {
            return Ok(Cond::Not(Box::new(self.negation()?)));
        }
        if self.eat("(") {
            let inner = self.condition()?;
            self.expect(")")?;
            return Ok(inner);
        }
        Ok(Cond::Expr(self.expression()?))
    }

    fn expression(&mut self) -> Result<Expr, TemplateError> {
        let mut expr = self.primary()?;
        while self.eat(":") {
            let name = self.identifier()?;
            self.expect("(")?;
            let args = self.arguments()?;
            expr = Expr::Apply {
                target: Box::new(expr),
                name,
                args,
            };
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, TemplateError> {
        match self.peek() {
            Some('"') => Ok(Expr::Literal(self.string()?)),
            Some('{') => self.subtemplate(),
            Some(c) if c.is_alphabetic() || c == '_' => {
                let name = self.identifier()?;
                if self.eat("(") {
                    let args = self.arguments()?;
                    Ok(Expr::Call { name, args })
                } else {
                    Ok(Expr::Attr(name))
                }
            }
            Some(c) => Err(self.error(format!("unexpected `{}`", c))),
            None => Err(self.error("empty expression")),
        }
    }

    /// Arguments after the opening parenthesis, up to and including `)`.
    fn arguments(&mut self) -> Result<Vec<Expr>, TemplateError> {
        let mut args = Vec::new();
        if self.eat(")") {
            return Ok(args);
        }
        loop {
            args.push(self.expression()?);
            if self.eat(")") {
                return Ok(args);
            }
            self.expect(",")?;
        }
    }

    fn identifier(&mut self) -> Result<String, TemplateError> {
        self.skip_ws();
        let start = self.pos;
        while self
            .chars
            .get(self.pos)
            .is_some_and(|c| c.is_alphanumeric() || *c == '_')
        {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error("expected a name"));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    /// An anonymous template; its body runs to the matching `}`.
    fn subtemplate(&mut self) -> Result<Expr, TemplateError> {
        self.expect("{")?;
        let start = self.pos;
        let mut depth = 1usize;
        while let Some(&c) = self.chars.get(self.pos) {
            self.pos += 1;
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        let body: String = self.chars[start..self.pos - 1].iter().collect();
                        return Ok(Expr::Subtemplate(compile(&body, self.origin)?));
                    }
                }
                _ => {}
            }
        }
        Err(self.error("unterminated `{`"))
    }

    fn string(&mut self) -> Result<String, TemplateError> {
        self.expect("\"")?;
        let mut out = String::new();
        loop {
            let c = self
                .chars
                .get(self.pos)
                .copied()
                .ok_or_else(|| self.error("unterminated string"))?;
            self.pos += 1;
            match c {
                '"' => return Ok(out),
                '\\' => {
                    let escaped = self
                        .chars
                        .get(self.pos)
                        .copied()
                        .ok_or_else(|| self.error("unterminated string"))?;
                    self.pos += 1;
                    match escaped {
                        'n' => out.push('\n'),
                        'r' => out.push('\r'),
                        't' => out.push('\t'),
                        other => out.push(other),
                    }
                }
                other => out.push(other),
            }
        }
    }
}

// =============================================================================
// Evaluation
// =============================================================================

/// Attribute bindings of one active template, chained to its caller.
pub(crate) struct Scope<'a> {
    attributes: &'a Attributes,
    parent: Option<&'a Scope<'a>>,
}

impl<'a> Scope<'a> {
    pub(crate) fn root(attributes: &'a Attributes) -> Self {
        Self {
            attributes,
            parent: None,
        }
    }

    fn lookup(&self, name: &str) -> Option<&Value> {
        self.attributes
            .get(name)
            .or_else(|| self.parent.and_then(|parent| parent.lookup(name)))
    }
}

/// Renders compiled nodes against a template group.
pub(crate) struct Renderer<'g> {
    group: &'g TemplateGroup,
}

impl<'g> Renderer<'g> {
    pub(crate) fn new(group: &'g TemplateGroup) -> Self {
        Self { group }
    }

    pub(crate) fn render(
        &self,
        nodes: &[Node],
        scope: &Scope<'_>,
        depth: usize,
    ) -> Result<String, TemplateError> {
        let mut out = String::new();
        self.render_into(nodes, scope, depth, &mut out)?;
        Ok(out)
    }

    fn render_into(
        &self,
        nodes: &[Node],
        scope: &Scope<'_>,
        depth: usize,
        out: &mut String,
    ) -> Result<(), TemplateError> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Expr(expr) => out.push_str(&self.eval(expr, scope, depth)?.to_string()),
                Node::If {
                    branches,
                    otherwise,
                } => {
                    let mut taken = None;
                    for (condition, body) in branches {
                        if self.test(condition, scope, depth)? {
                            taken = Some(body);
                            break;
                        }
                    }
                    self.render_into(taken.unwrap_or(otherwise), scope, depth, out)?;
                }
            }
        }
        Ok(())
    }

    fn test(&self, condition: &Cond, scope: &Scope<'_>, depth: usize) -> Result<bool, TemplateError> {
        Ok(match condition {
            Cond::Expr(expr) => self.eval(expr, scope, depth)?.is_true(),
            Cond::Not(inner) => !self.test(inner, scope, depth)?,
            Cond::And(left, right) => {
                self.test(left, scope, depth)? && self.test(right, scope, depth)?
            }
            Cond::Or(left, right) => {
                self.test(left, scope, depth)? || self.test(right, scope, depth)?
            }
        })
    }

    fn eval(&self, expr: &Expr, scope: &Scope<'_>, depth: usize) -> Result<Value, TemplateError> {
        match expr {
            Expr::Attr(name) => scope
                .lookup(name)
                .cloned()
                .ok_or_else(|| TemplateError::Unresolved(name.clone())),
            Expr::Literal(text) => Ok(Value::Text(text.clone())),
            Expr::Subtemplate(body) => self.render(body, scope, depth).map(Value::Text),
            Expr::Call { name, args } => {
                let values = args
                    .iter()
                    .map(|arg| self.eval(arg, scope, depth))
                    .collect::<Result<Vec<_>, _>>()?;
                self.call(name, values, scope, depth)
            }
            Expr::Apply { target, name, args } => {
                let mut values = vec![self.eval(target, scope, depth)?];
                for arg in args {
                    values.push(self.eval(arg, scope, depth)?);
                }
                self.call(name, values, scope, depth)
            }
        }
    }

    fn call(
        &self,
        name: &str,
        values: Vec<Value>,
        scope: &Scope<'_>,
        depth: usize,
    ) -> Result<Value, TemplateError> {
        if depth >= MAX_DEPTH {
            return Err(TemplateError::TooDeep(MAX_DEPTH));
        }

        let template = self
            .group
            .lookup(name)
            .ok_or_else(|| TemplateError::UnknownTemplate(name.to_string()))?;

        if values.len() > template.params.len() {
            return Err(TemplateError::ArgumentCount {
                name: name.to_string(),
                expected: template.params.len(),
                given: values.len(),
            });
        }

        let mut bound = Attributes::new();
        let mut values = values.into_iter();
        for param in &template.params {
            bound.insert(param.clone(), values.next().unwrap_or(Value::Absent));
        }

        let inner = Scope {
            attributes: &bound,
            parent: Some(scope),
        };
        self.render(&template.body, &inner, depth + 1)
            .map(Value::Text)
    }
}
