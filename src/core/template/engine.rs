//! Text template language
//!
//! Renders `{{ ... }}` actions against a YAML value. Supported:
//!
//! - field chains `.app.name`, the dot `.`, and the root `$` / `$.app`
//! - string (`"..."`, `` `...` ``), integer and boolean literals, parentheses
//! - pipelines `{{ .app.name | upper }}` (the piped value is the last argument)
//! - functions `eq`, `ne`, `not`, `and`, `or`, `len`, `lower`, `upper`,
//!   `getEnv NAME [DEFAULT]`
//! - `{{ if }} / {{ else if }} / {{ else }} / {{ end }}` and
//!   `{{ range }} / {{ else }} / {{ end }}`
//! - `{{-` and `-}}` trim surrounding whitespace, `{{/* ... */}}` is a comment
//!
//! Referencing a key that does not exist is an error.

use serde_yaml::Value;

use crate::error::TemplateError;

/// A parsed template
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    items: Vec<Item>,
}

#[derive(Debug, Clone)]
enum Item {
    Text(String),
    Action(Pipeline),
    If {
        branches: Vec<(Pipeline, Vec<Item>)>,
        otherwise: Vec<Item>,
    },
    Range {
        pipeline: Pipeline,
        body: Vec<Item>,
        otherwise: Vec<Item>,
    },
}

type Pipeline = Vec<Command>;

type Command = Vec<Term>;

#[derive(Debug, Clone)]
enum Term {
    Dot(Vec<String>),
    Root(Vec<String>),
    Literal(Value),
    Func(String),
    Group(Pipeline),
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Dot(Vec<String>),
    Root(Vec<String>),
    Ident(String),
    Literal(Value),
    Open,
    Close,
    Pipe,
}

enum Piece {
    Text(String),
    Action { content: String, line: usize },
}

enum Terminator {
    End,
    Else,
    ElseIf(Pipeline),
}

/// Parse and render in one step
///
/// Text without `{{` is returned as is.
pub fn render_str(name: &str, text: &str, context: &Value) -> Result<String, TemplateError> {
    if !text.contains("{{") {
        return Ok(text.to_string());
    }
    Template::parse(name, text)?.render(context)
}

impl Template {
    /// Parse template text; `name` is used in error messages
    pub fn parse(name: &str, text: &str) -> Result<Self, TemplateError> {
        let pieces = split(name, text)?;
        let mut parser = Parser {
            name,
            pieces,
            pos: 0,
            line: 1,
        };
        let (items, terminator) = parser.parse_list()?;
        if terminator.is_some() {
            return Err(parser.syntax("unexpected {{else}} or {{end}}"));
        }
        Ok(Self {
            name: name.to_string(),
            items,
        })
    }

    /// Render against `context`, which is both the initial dot and `$`
    pub fn render(&self, context: &Value) -> Result<String, TemplateError> {
        let exec = Exec {
            name: &self.name,
            root: context,
        };
        let mut out = String::new();
        exec.items(&self.items, context, &mut out)?;
        Ok(out)
    }
}

// ============================================
// Lexing
// ============================================

fn split(name: &str, text: &str) -> Result<Vec<Piece>, TemplateError> {
    let mut pieces = Vec::new();
    let mut rest = text;
    let mut line = 1;

    while let Some(start) = rest.find("{{") {
        let mut before = &rest[..start];
        let mut inner_start = start + 2;
        if trims_left(&rest[inner_start..]) {
            before = before.trim_end();
            inner_start += 1;
        }
        if !before.is_empty() {
            pieces.push(Piece::Text(before.to_string()));
        }
        line += rest[..inner_start].matches('\n').count();

        let Some(len) = rest[inner_start..].find("}}") else {
            return Err(TemplateError::Syntax {
                name: name.to_string(),
                line,
                message: "unclosed action".to_string(),
            });
        };
        let mut inner = &rest[inner_start..inner_start + len];
        let trim_right = inner.len() >= 2
            && inner.ends_with('-')
            && inner[..inner.len() - 1].ends_with(char::is_whitespace);
        if trim_right {
            inner = &inner[..inner.len() - 1];
        }
        pieces.push(Piece::Action {
            content: inner.trim().to_string(),
            line,
        });
        line += inner.matches('\n').count();

        rest = &rest[inner_start + len + 2..];
        if trim_right {
            let trimmed = rest.trim_start();
            line += rest[..rest.len() - trimmed.len()].matches('\n').count();
            rest = trimmed;
        }
    }
    if !rest.is_empty() {
        pieces.push(Piece::Text(rest.to_string()));
    }
    Ok(pieces)
}

fn trims_left(after_open: &str) -> bool {
    let mut chars = after_open.chars();
    chars.next() == Some('-') && chars.next().is_some_and(char::is_whitespace)
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn tokenize(src: &str) -> Result<Vec<Tok>, String> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    let read_chain = |i: &mut usize| -> Vec<String> {
        let mut path = Vec::new();
        while *i < chars.len() && chars[*i] == '.' && chars.get(*i + 1).is_some_and(|c| is_ident_char(*c)) {
            *i += 1;
            let start = *i;
            while *i < chars.len() && is_ident_char(chars[*i]) {
                *i += 1;
            }
            path.push(chars[start..*i].iter().collect());
        }
        path
    };

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Tok::Open);
                i += 1;
            }
            ')' => {
                tokens.push(Tok::Close);
                i += 1;
            }
            '|' => {
                tokens.push(Tok::Pipe);
                i += 1;
            }
            '.' => {
                let path = read_chain(&mut i);
                if path.is_empty() {
                    i += 1;
                }
                tokens.push(Tok::Dot(path));
            }
            '$' => {
                i += 1;
                tokens.push(Tok::Root(read_chain(&mut i)));
            }
            '"' => {
                let mut text = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => return Err("unterminated quoted string".to_string()),
                        Some('"') => break,
                        Some('\\') => {
                            let escaped = match chars.get(i + 1) {
                                Some('n') => '\n',
                                Some('t') => '\t',
                                Some(other) => *other,
                                None => return Err("unterminated quoted string".to_string()),
                            };
                            text.push(escaped);
                            i += 2;
                        }
                        Some(other) => {
                            text.push(*other);
                            i += 1;
                        }
                    }
                }
                i += 1;
                tokens.push(Tok::Literal(Value::String(text)));
            }
            '`' => {
                let start = i + 1;
                let Some(len) = chars[start..].iter().position(|c| *c == '`') else {
                    return Err("unterminated raw string".to_string());
                };
                tokens.push(Tok::Literal(Value::String(chars[start..start + len].iter().collect())));
                i = start + len + 1;
            }
            c if c.is_ascii_digit() || (c == '-' && chars.get(i + 1).is_some_and(char::is_ascii_digit)) => {
                let start = i;
                i += 1;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let value = if let Ok(int) = text.parse::<i64>() {
                    Value::from(int)
                } else {
                    let float = text
                        .parse::<f64>()
                        .map_err(|_| format!("bad number syntax: {text}"))?;
                    Value::from(float)
                };
                tokens.push(Tok::Literal(value));
            }
            c if is_ident_char(c) => {
                let start = i;
                while i < chars.len() && is_ident_char(chars[i]) {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                tokens.push(match word.as_str() {
                    "true" => Tok::Literal(Value::Bool(true)),
                    "false" => Tok::Literal(Value::Bool(false)),
                    "nil" => Tok::Literal(Value::Null),
                    _ => Tok::Ident(word),
                });
            }
            other => return Err(format!("unexpected {other:?} in action")),
        }
    }
    Ok(tokens)
}

// ============================================
// Parsing
// ============================================

struct Parser<'a> {
    name: &'a str,
    pieces: Vec<Piece>,
    pos: usize,
    line: usize,
}

impl Parser<'_> {
    fn syntax(&self, message: impl Into<String>) -> TemplateError {
        TemplateError::Syntax {
            name: self.name.to_string(),
            line: self.line,
            message: message.into(),
        }
    }

    fn parse_list(&mut self) -> Result<(Vec<Item>, Option<Terminator>), TemplateError> {
        let mut items = Vec::new();
        while self.pos < self.pieces.len() {
            let piece = std::mem::replace(&mut self.pieces[self.pos], Piece::Text(String::new()));
            self.pos += 1;
            let (content, line) = match piece {
                Piece::Text(text) => {
                    items.push(Item::Text(text));
                    continue;
                }
                Piece::Action { content, line } => (content, line),
            };
            self.line = line;
            if content.starts_with("/*") {
                if !content.ends_with("*/") {
                    return Err(self.syntax("unclosed comment"));
                }
                continue;
            }

            let tokens = tokenize(&content).map_err(|e| self.syntax(e))?;
            match tokens.first() {
                Some(Tok::Ident(word)) if word == "if" => {
                    let condition = self.pipeline(&tokens[1..])?;
                    items.push(self.parse_if(condition)?);
                }
                Some(Tok::Ident(word)) if word == "range" => {
                    let pipeline = self.pipeline(&tokens[1..])?;
                    items.push(self.parse_range(pipeline)?);
                }
                Some(Tok::Ident(word)) if word == "end" => {
                    if tokens.len() > 1 {
                        return Err(self.syntax("unexpected arguments to end"));
                    }
                    return Ok((items, Some(Terminator::End)));
                }
                Some(Tok::Ident(word)) if word == "else" => {
                    return match tokens.get(1) {
                        None => Ok((items, Some(Terminator::Else))),
                        Some(Tok::Ident(next)) if next == "if" => {
                            let condition = self.pipeline(&tokens[2..])?;
                            Ok((items, Some(Terminator::ElseIf(condition))))
                        }
                        Some(_) => Err(self.syntax("unexpected arguments to else")),
                    };
                }
                None => return Err(self.syntax("missing value for command")),
                Some(_) => items.push(Item::Action(self.pipeline(&tokens)?)),
            }
        }
        Ok((items, None))
    }

    fn parse_if(&mut self, condition: Pipeline) -> Result<Item, TemplateError> {
        let mut branches = Vec::new();
        let mut condition = condition;
        loop {
            let (body, terminator) = self.parse_list()?;
            branches.push((condition, body));
            match terminator {
                Some(Terminator::End) => {
                    return Ok(Item::If {
                        branches,
                        otherwise: Vec::new(),
                    })
                }
                Some(Terminator::ElseIf(next)) => condition = next,
                Some(Terminator::Else) => {
                    let otherwise = self.parse_closing_else()?;
                    return Ok(Item::If { branches, otherwise });
                }
                None => return Err(self.syntax("unexpected EOF in if")),
            }
        }
    }

    fn parse_range(&mut self, pipeline: Pipeline) -> Result<Item, TemplateError> {
        let (body, terminator) = self.parse_list()?;
        let otherwise = match terminator {
            Some(Terminator::End) => Vec::new(),
            Some(Terminator::Else) => self.parse_closing_else()?,
            Some(Terminator::ElseIf(_)) => return Err(self.syntax("else if is not allowed in range")),
            None => return Err(self.syntax("unexpected EOF in range")),
        };
        Ok(Item::Range {
            pipeline,
            body,
            otherwise,
        })
    }

    fn parse_closing_else(&mut self) -> Result<Vec<Item>, TemplateError> {
        match self.parse_list()? {
            (items, Some(Terminator::End)) => Ok(items),
            (_, None) => Err(self.syntax("unexpected EOF after else")),
            (_, Some(_)) => Err(self.syntax("expected end after else")),
        }
    }

    fn pipeline(&self, tokens: &[Tok]) -> Result<Pipeline, TemplateError> {
        let mut pos = 0;
        let pipeline = self.parse_pipeline(tokens, &mut pos)?;
        if pos != tokens.len() {
            return Err(self.syntax("unexpected ) in action"));
        }
        Ok(pipeline)
    }

    fn parse_pipeline(&self, tokens: &[Tok], pos: &mut usize) -> Result<Pipeline, TemplateError> {
        let mut commands = Vec::new();
        let mut command = Vec::new();
        while *pos < tokens.len() {
            match &tokens[*pos] {
                Tok::Close => break,
                Tok::Pipe => {
                    if command.is_empty() {
                        return Err(self.syntax("missing command before |"));
                    }
                    commands.push(std::mem::take(&mut command));
                    *pos += 1;
                }
                Tok::Open => {
                    *pos += 1;
                    let group = self.parse_pipeline(tokens, pos)?;
                    if tokens.get(*pos) != Some(&Tok::Close) {
                        return Err(self.syntax("unclosed left paren"));
                    }
                    *pos += 1;
                    command.push(Term::Group(group));
                }
                Tok::Dot(path) => {
                    command.push(Term::Dot(path.clone()));
                    *pos += 1;
                }
                Tok::Root(path) => {
                    command.push(Term::Root(path.clone()));
                    *pos += 1;
                }
                Tok::Literal(value) => {
                    command.push(Term::Literal(value.clone()));
                    *pos += 1;
                }
                Tok::Ident(name) => {
                    if !is_function(name) {
                        return Err(self.syntax(format!("function {name:?} not defined")));
                    }
                    command.push(Term::Func(name.clone()));
                    *pos += 1;
                }
            }
        }
        if command.is_empty() {
            return Err(self.syntax("missing value for command"));
        }
        commands.push(command);
        Ok(commands)
    }
}

fn is_function(name: &str) -> bool {
    matches!(
        name,
        "eq" | "ne" | "not" | "and" | "or" | "len" | "lower" | "upper" | "getEnv"
    )
}

// ============================================
// Execution
// ============================================

struct Exec<'a> {
    name: &'a str,
    root: &'a Value,
}

impl Exec<'_> {
    fn fail(&self, message: impl Into<String>) -> TemplateError {
        TemplateError::Render {
            name: self.name.to_string(),
            message: message.into(),
        }
    }

    fn items(&self, items: &[Item], dot: &Value, out: &mut String) -> Result<(), TemplateError> {
        for item in items {
            match item {
                Item::Text(text) => out.push_str(text),
                Item::Action(pipeline) => {
                    let value = self.pipeline(pipeline, dot)?;
                    out.push_str(&self.print(&value)?);
                }
                Item::If { branches, otherwise } => {
                    let mut taken = false;
                    for (condition, body) in branches {
                        if truthy(&self.pipeline(condition, dot)?) {
                            self.items(body, dot, out)?;
                            taken = true;
                            break;
                        }
                    }
                    if !taken {
                        self.items(otherwise, dot, out)?;
                    }
                }
                Item::Range {
                    pipeline,
                    body,
                    otherwise,
                } => {
                    let elements: Vec<Value> = match self.pipeline(pipeline, dot)? {
                        Value::Sequence(items) => items,
                        Value::Mapping(map) => map.into_iter().map(|(_, v)| v).collect(),
                        Value::Null => Vec::new(),
                        other => {
                            return Err(self.fail(format!("range can't iterate over {}", self.print(&other)?)))
                        }
                    };
                    if elements.is_empty() {
                        self.items(otherwise, dot, out)?;
                    }
                    for element in &elements {
                        self.items(body, element, out)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn pipeline(&self, pipeline: &Pipeline, dot: &Value) -> Result<Value, TemplateError> {
        let mut piped = None;
        for command in pipeline {
            piped = Some(self.command(command, dot, piped)?);
        }
        piped.ok_or_else(|| self.fail("empty pipeline"))
    }

    fn command(&self, command: &Command, dot: &Value, piped: Option<Value>) -> Result<Value, TemplateError> {
        match command.as_slice() {
            [Term::Func(name), args @ ..] => {
                let mut values = args
                    .iter()
                    .map(|arg| self.term(arg, dot))
                    .collect::<Result<Vec<_>, _>>()?;
                values.extend(piped);
                self.call(name, &values)
            }
            [single] if piped.is_none() => self.term(single, dot),
            _ => Err(self.fail("can't give argument to non-function")),
        }
    }

    fn term(&self, term: &Term, dot: &Value) -> Result<Value, TemplateError> {
        match term {
            Term::Dot(path) => self.lookup(dot, path),
            Term::Root(path) => self.lookup(self.root, path),
            Term::Literal(value) => Ok(value.clone()),
            Term::Func(name) => self.call(name, &[]),
            Term::Group(pipeline) => self.pipeline(pipeline, dot),
        }
    }

    fn lookup(&self, base: &Value, path: &[String]) -> Result<Value, TemplateError> {
        let mut current = base;
        for segment in path {
            current = match current {
                Value::Mapping(map) => map
                    .get(segment.as_str())
                    .ok_or_else(|| self.fail(format!("map has no entry for key {segment:?}")))?,
                Value::Sequence(items) => segment
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| items.get(index))
                    .ok_or_else(|| self.fail(format!("no element {segment:?} in list")))?,
                _ => return Err(self.fail(format!("can't evaluate field {segment} in a scalar"))),
            };
        }
        Ok(current.clone())
    }

    fn call(&self, name: &str, args: &[Value]) -> Result<Value, TemplateError> {
        let arity = |min: usize, max: usize| {
            if args.len() < min || args.len() > max {
                Err(self.fail(format!("wrong number of args for {name}: got {}", args.len())))
            } else {
                Ok(())
            }
        };
        match name {
            "eq" => {
                arity(2, usize::MAX)?;
                Ok(Value::Bool(args[1..].iter().any(|other| equal(&args[0], other))))
            }
            "ne" => {
                arity(2, 2)?;
                Ok(Value::Bool(!equal(&args[0], &args[1])))
            }
            "not" => {
                arity(1, 1)?;
                Ok(Value::Bool(!truthy(&args[0])))
            }
            "and" => {
                arity(1, usize::MAX)?;
                Ok(args
                    .iter()
                    .find(|v| !truthy(v))
                    .unwrap_or(&args[args.len() - 1])
                    .clone())
            }
            "or" => {
                arity(1, usize::MAX)?;
                Ok(args
                    .iter()
                    .find(|v| truthy(v))
                    .unwrap_or(&args[args.len() - 1])
                    .clone())
            }
            "len" => {
                arity(1, 1)?;
                let len = match &args[0] {
                    Value::String(s) => s.chars().count(),
                    Value::Sequence(items) => items.len(),
                    Value::Mapping(map) => map.len(),
                    _ => return Err(self.fail("len of a scalar")),
                };
                Ok(Value::from(len as u64))
            }
            "lower" => {
                arity(1, 1)?;
                Ok(Value::String(self.print(&args[0])?.to_lowercase()))
            }
            "upper" => {
                arity(1, 1)?;
                Ok(Value::String(self.print(&args[0])?.to_uppercase()))
            }
            "getEnv" => {
                arity(1, 2)?;
                let var = self.print(&args[0])?;
                let value = match std::env::var(&var) {
                    Ok(value) => value,
                    Err(_) => match args.get(1) {
                        Some(default) => self.print(default)?,
                        None => String::new(),
                    },
                };
                Ok(Value::String(value))
            }
            _ => Err(self.fail(format!("function {name:?} not defined"))),
        }
    }

    fn print(&self, value: &Value) -> Result<String, TemplateError> {
        match value {
            Value::Null => Ok(String::new()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Number(n) => Ok(n.to_string()),
            Value::String(s) => Ok(s.clone()),
            other => serde_json::to_string(other).map_err(|e| self.fail(e.to_string())),
        }
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Sequence(items) => !items.is_empty(),
        Value::Mapping(map) => !map.is_empty(),
        Value::Tagged(tagged) => truthy(&tagged.value),
    }
}

fn equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(yaml: &str) -> Value {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn render(text: &str, context: &str) -> Result<String, TemplateError> {
        render_str("test", text, &ctx(context))
    }

    // ============================================
    // Unit Tests - Substitution
    // ============================================

    #[test]
    fn test_replace_single_placeholder() {
        assert_eq!(render("Hello, {{.Name}}!", "{Name: Jane}").unwrap(), "Hello, Jane!");
    }

    #[test]
    fn test_replace_multiple_placeholders() {
        assert_eq!(
            render("{{.Greeting}}, {{.Name}}!", "{Greeting: Hi, Name: John}").unwrap(),
            "Hi, John!"
        );
    }

    #[test]
    fn test_no_placeholders() {
        assert_eq!(render("Hello, World!", "{}").unwrap(), "Hello, World!");
    }

    #[test]
    fn test_missing_key_is_error() {
        let err = render("Hello, {{.Name}} and {{.Friend}}!", "{Name: Jane}").unwrap_err();
        assert!(matches!(err, TemplateError::Render { .. }));
        assert!(err.to_string().contains("Friend"));
    }

    #[test]
    fn test_nested_values() {
        assert_eq!(
            render("User: {{.User.Name}}, Age: {{.User.Age}}", "{User: {Name: Jane, Age: 30}}").unwrap(),
            "User: Jane, Age: 30"
        );
    }

    #[test]
    fn test_special_characters_pass_through() {
        assert_eq!(
            render("Values: {{.a}}, {{.b}}, and {{.c}}!", "{a: '@', b: '%', c: '#'}").unwrap(),
            "Values: @, %, and #!"
        );
    }

    #[test]
    fn test_structured_value_prints_as_json() {
        assert_eq!(render("{{ .deps }}", "{deps: [a, b]}").unwrap(), r#"["a","b"]"#);
    }

    #[test]
    fn test_root_variable_inside_range() {
        assert_eq!(
            render("{{ range .items }}{{ . }}-{{ $.sep }};{{ end }}", "{items: [x, y], sep: '|'}").unwrap(),
            "x-|;y-|;"
        );
    }

    // ============================================
    // Unit Tests - Control flow
    // ============================================

    #[test]
    fn test_if_else_chain() {
        let text = "{{ if eq .lang \"go\" }}golang{{ else if eq .lang \"py\" }}python{{ else }}other{{ end }}";
        assert_eq!(render(text, "{lang: go}").unwrap(), "golang");
        assert_eq!(render(text, "{lang: py}").unwrap(), "python");
        assert_eq!(render(text, "{lang: rs}").unwrap(), "other");
    }

    #[test]
    fn test_if_on_boolean_option_yields_empty() {
        assert_eq!(render("{{ if .opt }}docs{{ end }}", "{opt: false}").unwrap(), "");
        assert_eq!(render("{{ if .opt }}docs{{ end }}", "{opt: true}").unwrap(), "docs");
    }

    #[test]
    fn test_range_else_on_empty() {
        assert_eq!(render("{{ range .l }}x{{ else }}none{{ end }}", "{l: []}").unwrap(), "none");
    }

    #[test]
    fn test_trim_markers() {
        assert_eq!(
            render("a  {{- .v -}}  \n b", "{v: X}").unwrap(),
            "aXb"
        );
    }

    #[test]
    fn test_comment_is_dropped() {
        assert_eq!(render("a{{/* note */}}b", "{}").unwrap(), "ab");
    }

    #[test]
    fn test_pipeline_and_functions() {
        assert_eq!(render("{{ .n | upper }}", "{n: abc}").unwrap(), "ABC");
        assert_eq!(render("{{ lower \"ABC\" }}", "{}").unwrap(), "abc");
        assert_eq!(render("{{ not (eq .n 1) }}", "{n: 2}").unwrap(), "true");
        assert_eq!(render("{{ and .a .b }}", "{a: x, b: ''}").unwrap(), "");
        assert_eq!(render("{{ or .a .b }}", "{a: '', b: y}").unwrap(), "y");
        assert_eq!(render("{{ len .l }}", "{l: [1, 2, 3]}").unwrap(), "3");
    }

    #[test]
    fn test_get_env_default() {
        assert_eq!(
            render("{{ getEnv \"FLEETKIT_ENGINE_TEST_UNSET\" \"fallback\" }}", "{}").unwrap(),
            "fallback"
        );
    }

    // ============================================
    // Unit Tests - Syntax errors
    // ============================================

    #[test]
    fn test_unclosed_action() {
        assert!(matches!(render("{{ .a", "{a: 1}"), Err(TemplateError::Syntax { .. })));
    }

    #[test]
    fn test_missing_end() {
        assert!(matches!(render("{{ if .a }}x", "{a: 1}"), Err(TemplateError::Syntax { .. })));
    }

    #[test]
    fn test_stray_end() {
        assert!(matches!(render("x{{ end }}", "{}"), Err(TemplateError::Syntax { .. })));
    }

    #[test]
    fn test_unknown_function() {
        assert!(matches!(render("{{ shout .a }}", "{a: 1}"), Err(TemplateError::Syntax { .. })));
    }

    #[test]
    fn test_syntax_error_reports_line() {
        match render("one\ntwo\n{{ if }}", "{}") {
            Err(TemplateError::Syntax { line, .. }) => assert_eq!(line, 3),
            other => panic!("Expected syntax error, got {other:?}"),
        }
    }
}
