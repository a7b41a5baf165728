//! Template groups: named templates loaded from `.stg` files.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use super::render::{compile, Node, Renderer, Scope};
use super::{Attributes, TemplateError};

/// How many `import` levels a group file may chain.
const MAX_IMPORT_DEPTH: usize = 8;

/// A compiled template with its formal parameters.
#[derive(Debug, Clone)]
pub(crate) struct TemplateDef {
    pub(crate) params: Vec<String>,
    pub(crate) body: Vec<Node>,
}

/// A set of named templates, plus the groups it imports.
///
/// Lookups try the group's own templates first, then each import in order.
#[derive(Debug, Clone, Default)]
pub struct TemplateGroup {
    origin: String,
    templates: HashMap<String, TemplateDef>,
    imports: Vec<Arc<TemplateGroup>>,
}

impl TemplateGroup {
    /// Creates an empty group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty group that sees all templates of `group`.
    pub fn importing(group: Arc<TemplateGroup>) -> Self {
        let mut this = Self::new();
        this.import(group);
        this
    }

    /// Loads a group file. `import "other.stg"` lines are resolved relative
    /// to the file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TemplateError> {
        Self::load(path.as_ref(), 0)
    }

    fn load(path: &Path, depth: usize) -> Result<Self, TemplateError> {
        let origin = path.display().to_string();
        if depth > MAX_IMPORT_DEPTH {
            return Err(TemplateError::syntax(&origin, "imports nest too deeply"));
        }

        let source = std::fs::read_to_string(path).map_err(|e| TemplateError::io(path, e))?;
        let (mut group, imports) = Self::parse_with_imports(&source, &origin)?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        for import in imports {
            let imported = Self::load(&base.join(import), depth + 1)?;
            group.import(Arc::new(imported));
        }

        Ok(group)
    }

    /// Parses group file text. `origin` names the source in error messages.
    pub fn parse(source: &str, origin: &str) -> Result<Self, TemplateError> {
        let (group, imports) = Self::parse_with_imports(source, origin)?;
        if let Some(import) = imports.first() {
            return Err(TemplateError::syntax(
                origin,
                format!("cannot import `{}` without a file location", import),
            ));
        }
        Ok(group)
    }

    fn parse_with_imports(source: &str, origin: &str) -> Result<(Self, Vec<String>), TemplateError> {
        let mut parser = GroupParser::new(source, origin);
        let mut group = Self {
            origin: origin.to_string(),
            ..Self::default()
        };
        let mut imports = Vec::new();

        while let Some(statement) = parser.statement()? {
            match statement {
                Statement::Import(file) => imports.push(file),
                Statement::Define { name, params, body } => {
                    let body = compile(&body, origin)?;
                    if group
                        .templates
                        .insert(name.clone(), TemplateDef { params, body })
                        .is_some()
                    {
                        return Err(TemplateError::syntax(
                            origin,
                            format!("template `{}` is defined twice", name),
                        ));
                    }
                }
            }
        }

        Ok((group, imports))
    }

    /// Makes the templates of `group` visible from this group.
    pub fn import(&mut self, group: Arc<TemplateGroup>) {
        self.imports.push(group);
    }

    /// Returns true if `name` resolves in this group or an import.
    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<&TemplateDef> {
        self.templates
            .get(name)
            .or_else(|| self.imports.iter().find_map(|group| group.lookup(name)))
    }

    /// Renders ad-hoc template text in the context of this group.
    pub fn render_inline(&self, text: &str, attributes: &Attributes) -> Result<String, TemplateError> {
        let origin = if self.origin.is_empty() {
            "<inline>"
        } else {
            self.origin.as_str()
        };
        let nodes = compile(text, origin)?;
        Renderer::new(self).render(&nodes, &Scope::root(attributes), 0)
    }

    /// Renders a named template of this group with the given attributes.
    pub fn render(&self, name: &str, attributes: &Attributes) -> Result<String, TemplateError> {
        let template = self
            .lookup(name)
            .ok_or_else(|| TemplateError::UnknownTemplate(name.to_string()))?;

        let mut bound = attributes.clone();
        for param in &template.params {
            bound.entry(param.clone()).or_insert(super::Value::Absent);
        }
        Renderer::new(self).render(&template.body, &Scope::root(&bound), 0)
    }
}

// =============================================================================
// Group file parsing
// =============================================================================

enum Statement {
    Import(String),
    Define {
        name: String,
        params: Vec<String>,
        body: String,
    },
}

struct GroupParser<'a> {
    chars: Vec<char>,
    pos: usize,
    origin: &'a str,
}

impl<'a> GroupParser<'a> {
    fn new(source: &str, origin: &'a str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            origin,
        }
    }

    fn error(&self, message: impl Into<String>) -> TemplateError {
        let line = self.chars[..self.pos.min(self.chars.len())]
            .iter()
            .filter(|c| **c == '\n')
            .count()
            + 1;
        TemplateError::syntax(self.origin, format!("line {}: {}", line, message.into()))
    }

    fn at(&self, token: &str) -> bool {
        let end = self.pos + token.chars().count();
        end <= self.chars.len() && self.chars[self.pos..end].iter().copied().eq(token.chars())
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_trivia();
        if self.at(token) {
            self.pos += token.chars().count();
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

    /// Skips whitespace, `//` and `/* */` comments.
    fn skip_trivia(&mut self) {
        loop {
            while self.chars.get(self.pos).is_some_and(|c| c.is_whitespace()) {
                self.pos += 1;
            }
            if self.at("//") {
                while self.chars.get(self.pos).is_some_and(|c| *c != '\n') {
                    self.pos += 1;
                }
            } else if self.at("/*") {
                self.pos += 2;
                while self.pos < self.chars.len() && !self.at("*/") {
                    self.pos += 1;
                }
                self.pos = (self.pos + 2).min(self.chars.len());
            } else {
                return;
            }
        }
    }

    fn identifier(&mut self) -> Result<String, TemplateError> {
        self.skip_trivia();
        let start = self.pos;
        while self
            .chars
            .get(self.pos)
            .is_some_and(|c| c.is_alphanumeric() || *c == '_')
        {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error("expected a template name"));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn statement(&mut self) -> Result<Option<Statement>, TemplateError> {
        self.skip_trivia();
        if self.pos >= self.chars.len() {
            return Ok(None);
        }

        let name = self.identifier()?;
        match name.as_str() {
            "delimiters" => {
                let open = self.string()?;
                self.expect(",")?;
                let close = self.string()?;
                if open != "<" || close != ">" {
                    return Err(self.error("only `<` `>` delimiters are supported"));
                }
                return self.statement();
            }
            "import" => return Ok(Some(Statement::Import(self.string()?))),
            _ => {}
        }

        self.expect("(")?;
        let mut params = Vec::new();
        if !self.eat(")") {
            loop {
                params.push(self.identifier()?);
                if self.eat("=") {
                    return Err(self.error("default argument values are not supported"));
                }
                if self.eat(")") {
                    break;
                }
                self.expect(",")?;
            }
        }
        self.expect("::=")?;

        let body = if self.eat("<<") {
            let raw = self.until(">>")?;
            let raw = raw
                .strip_prefix("\r\n")
                .or_else(|| raw.strip_prefix('\n'))
                .unwrap_or(&raw);
            let raw = raw
                .strip_suffix("\r\n")
                .or_else(|| raw.strip_suffix('\n'))
                .unwrap_or(raw);
            raw.to_string()
        } else if self.eat("<%") {
            let raw = self.until("%>")?;
            raw.lines().map(str::trim_start).collect()
        } else {
            self.skip_trivia();
            if self.chars.get(self.pos) != Some(&'"') {
                return Err(self.error(format!("template `{}` has no body", name)));
            }
            self.string()?
        };

        Ok(Some(Statement::Define { name, params, body }))
    }

    /// Raw text up to (and consuming) `close`.
    fn until(&mut self, close: &str) -> Result<String, TemplateError> {
        let start = self.pos;
        while self.pos < self.chars.len() {
            if self.at(close) {
                let text = self.chars[start..self.pos].iter().collect();
                self.pos += close.chars().count();
                return Ok(text);
            }
            self.pos += 1;
        }
        Err(self.error(format!("missing `{}`", close)))
    }

    /// A double quoted string; `\"` stands for a quote, other escapes are
    /// left for the template compiler.
    fn string(&mut self) -> Result<String, TemplateError> {
        self.expect("\"")?;
        let mut out = String::new();
        while let Some(&c) = self.chars.get(self.pos) {
            self.pos += 1;
            match c {
                '"' => return Ok(out),
                '\\' if self.chars.get(self.pos) == Some(&'"') => {
                    out.push('"');
                    self.pos += 1;
                }
                other => out.push(other),
            }
        }
        Err(self.error("unterminated string"))
    }
}
