/*
 * render.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Type-aware renderer.
//!
//! Renders a scanned template against a parameters object. Values resolve
//! through the section scope chain first, then through a root view built from
//! type and definition defaults overlaid by the document view and the
//! supplied parameters. Rendering never consults the derived schema, so a
//! failed schema build does not block it. Substitution respects declared
//! value types: `text`, `hidden`, and `array` values are emitted as JSON,
//! everything else raw (numbers and booleans therefore unquoted).
//!
//! Before rendering, [`apply_standalone`] runs a whitespace pass over the tag
//! sequence: section, comment, and partial tags standing alone on a line drop
//! that line, and a standalone partial captures its indentation, which is then
//! applied to each non-empty line it splices in.

use std::collections::HashMap;

use hashlink::LinkedHashMap;
use serde_json::{Map, Value};
use tracing::trace;

use crate::definitions::Definition;
use crate::error::{TemplateError, TemplateResult};
use crate::tag::{Tag, ValueType};

/// Maximum partial nesting before inclusion is treated as recursive.
pub(crate) const MAX_PARTIAL_DEPTH: usize = 50;

/// One frame of the section scope chain.
struct Scope<'s> {
    /// Name lookup map, present when the frame value is an object.
    map: Option<&'s Map<String, Value>>,
    /// The frame value itself, what `{{.}}` resolves to.
    dot: &'s Value,
}

pub(crate) struct Renderer<'a> {
    partials: &'a HashMap<String, Vec<Tag>>,
    /// Declared value types, from tag annotations anywhere in the template or
    /// its partials, and from definition-declared types.
    types: HashMap<String, ValueType>,
    /// Root view: type and definition defaults, overlaid by the document
    /// view, overlaid by the supplied parameters.
    root: Map<String, Value>,
}

impl<'a> Renderer<'a> {
    pub(crate) fn new(
        tags: &[Tag],
        partials: &'a HashMap<String, Vec<Tag>>,
        definitions: &LinkedHashMap<String, Definition>,
        default_view: &Map<String, Value>,
        parameters: &Map<String, Value>,
    ) -> Self {
        let mut types = HashMap::new();
        collect_types(tags, &mut types);
        for partial in partials.values() {
            collect_types(partial, &mut types);
        }
        for (name, definition) in definitions {
            if let Some(value_type) = definition
                .declared_type
                .as_deref()
                .and_then(ValueType::from_keyword)
            {
                types.entry(name.clone()).or_insert(value_type);
            }
        }

        let mut root = Map::new();
        for (name, value_type) in &types {
            root.insert(name.clone(), value_type.default_value());
        }
        for (name, definition) in definitions {
            if let Some(default) = &definition.default {
                root.insert(name.clone(), default.clone());
            }
        }
        for (name, value) in default_view {
            root.insert(name.clone(), value.clone());
        }
        for (name, value) in parameters {
            root.insert(name.clone(), value.clone());
        }

        Self {
            partials,
            types,
            root,
        }
    }

    pub(crate) fn render(&self, tags: &[Tag]) -> TemplateResult<String> {
        let mut out = String::new();
        let mut scopes = Vec::new();
        self.render_tags(tags, &mut scopes, 0, &mut out)?;
        Ok(out)
    }

    fn render_tags<'s>(
        &'s self,
        tags: &[Tag],
        scopes: &mut Vec<Scope<'s>>,
        depth: usize,
        out: &mut String,
    ) -> TemplateResult<()> {
        let mut i = 0;
        while i < tags.len() {
            match &tags[i] {
                Tag::Literal(text) => out.push_str(text),
                Tag::Comment(_) => {}
                Tag::Variable(tag_name) => {
                    let value = if tag_name.is_dot() {
                        scopes.last().map(|scope| scope.dot)
                    } else {
                        self.resolve(scopes, &tag_name.name)
                    };
                    if let Some(value) = value {
                        let value_type = tag_name
                            .value_type()
                            .or_else(|| self.types.get(&tag_name.name).copied());
                        out.push_str(&substitute(value, value_type)?);
                    }
                }
                Tag::SectionOpen(tag_name) => {
                    let end = section_end(tags, i);
                    let body = &tags[i + 1..end];
                    if let Some(value) = self.resolve(scopes, &tag_name.name) {
                        if is_truthy(value) {
                            trace!(section = %tag_name.name, "entering section");
                            self.render_section(body, value, scopes, depth, out)?;
                        }
                    }
                    i = end;
                }
                Tag::InvertedOpen(tag_name) => {
                    let end = section_end(tags, i);
                    let value = self.resolve(scopes, &tag_name.name);
                    if !value.is_some_and(is_truthy) {
                        self.render_tags(&tags[i + 1..end], scopes, depth, out)?;
                    }
                    i = end;
                }
                // Close tags are consumed by the matching open above.
                Tag::SectionClose(_) => {}
                Tag::Partial { name, indent } => {
                    if depth >= MAX_PARTIAL_DEPTH {
                        return Err(TemplateError::RecursivePartial {
                            name: name.clone(),
                            max_depth: MAX_PARTIAL_DEPTH,
                        });
                    }
                    let partial = self
                        .partials
                        .get(name)
                        .ok_or_else(|| TemplateError::PartialNotFound { name: name.clone() })?;
                    let mut spliced = String::new();
                    self.render_tags(partial, scopes, depth + 1, &mut spliced)?;
                    if indent.is_empty() {
                        out.push_str(&spliced);
                    } else {
                        for line in spliced.split_inclusive('\n') {
                            if line != "\n" {
                                out.push_str(indent);
                            }
                            out.push_str(line);
                        }
                    }
                }
            }
            i += 1;
        }
        Ok(())
    }

    fn render_section<'s>(
        &'s self,
        body: &[Tag],
        value: &'s Value,
        scopes: &mut Vec<Scope<'s>>,
        depth: usize,
        out: &mut String,
    ) -> TemplateResult<()> {
        match value {
            Value::Array(items) => {
                for item in items {
                    scopes.push(Scope {
                        map: item.as_object(),
                        dot: item,
                    });
                    self.render_tags(body, scopes, depth, out)?;
                    scopes.pop();
                }
            }
            Value::Object(map) => {
                scopes.push(Scope {
                    map: Some(map),
                    dot: value,
                });
                self.render_tags(body, scopes, depth, out)?;
                scopes.pop();
            }
            // Truthy scalar: render the body once, the scalar as the dot.
            other => {
                scopes.push(Scope {
                    map: None,
                    dot: other,
                });
                self.render_tags(body, scopes, depth, out)?;
                scopes.pop();
            }
        }
        Ok(())
    }

    fn resolve<'s>(&'s self, scopes: &[Scope<'s>], name: &str) -> Option<&'s Value> {
        for scope in scopes.iter().rev() {
            if let Some(value) = scope.map.and_then(|map| map.get(name)) {
                return Some(value);
            }
        }
        self.root.get(name)
    }
}

/// Mustache truthiness: null, false, zero, the empty string, and the empty
/// array are falsy; objects are always truthy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}

/// Substitute one resolved value according to its declared type.
fn substitute(value: &Value, value_type: Option<ValueType>) -> TemplateResult<String> {
    match value_type {
        Some(ValueType::Text | ValueType::Hidden | ValueType::Array) => {
            Ok(serde_json::to_string(value)?)
        }
        _ => Ok(match value {
            Value::String(text) => text.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }),
    }
}

/// Index of the close tag matching the open at `start`.
fn section_end(tags: &[Tag], start: usize) -> usize {
    let mut depth = 0;
    for (index, tag) in tags.iter().enumerate().skip(start + 1) {
        match tag {
            Tag::SectionOpen(_) | Tag::InvertedOpen(_) => depth += 1,
            Tag::SectionClose(_) => {
                if depth == 0 {
                    return index;
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    tags.len()
}

fn collect_types(tags: &[Tag], types: &mut HashMap<String, ValueType>) {
    for tag in tags {
        if let Tag::Variable(tag_name) | Tag::SectionOpen(tag_name) | Tag::InvertedOpen(tag_name) =
            tag
        {
            if !tag_name.is_dot() {
                if let Some(value_type) = tag_name.value_type() {
                    types.entry(tag_name.name.clone()).or_insert(value_type);
                }
            }
        }
    }
}

/// Standalone-line whitespace pass.
///
/// Section, comment, and partial tags alone on a line (surrounded only by
/// whitespace) drop the whole line. A standalone partial keeps the line's
/// indentation in its `indent` field for later splicing. Variable tags never
/// participate.
pub(crate) fn apply_standalone(tags: &[Tag]) -> Vec<Tag> {
    let mut out: Vec<Tag> = Vec::new();
    let mut at_line_start = true;
    let mut indent = String::new();
    let mut i = 0;

    while i < tags.len() {
        match &tags[i] {
            Tag::Literal(text) => {
                push_literal(&mut out, &mut at_line_start, &mut indent, text);
            }
            Tag::Variable(_) => {
                at_line_start = false;
                indent.clear();
                out.push(tags[i].clone());
            }
            tag => {
                let line_end = if at_line_start {
                    standalone_line_end(tags, i)
                } else {
                    None
                };
                if let Some(line_end) = line_end {
                    // Drop the line: strip the indent already emitted, keep
                    // the tag, and swallow the trailing whitespace + newline.
                    strip_trailing(&mut out, indent.len());
                    let captured = std::mem::take(&mut indent);
                    match tag {
                        Tag::Partial { name, .. } => out.push(Tag::Partial {
                            name: name.clone(),
                            indent: captured,
                        }),
                        other => out.push(other.clone()),
                    }
                    at_line_start = true;
                    if let LineEnd::Consume(rest) = line_end {
                        i += 2;
                        if !rest.is_empty() {
                            push_literal(&mut out, &mut at_line_start, &mut indent, &rest);
                        }
                        continue;
                    }
                } else {
                    at_line_start = false;
                    indent.clear();
                    out.push(tag.clone());
                }
            }
        }
        i += 1;
    }
    out
}

/// How a standalone tag's line terminates.
enum LineEnd {
    /// Nothing follows the tag.
    Eof,
    /// The following literal opens with the line break; `rest` is what
    /// remains of it once the break is swallowed.
    Consume(String),
}

/// Whether the tag at `i` ends its line with only whitespace. A tag at end of
/// input counts as line-ending.
fn standalone_line_end(tags: &[Tag], i: usize) -> Option<LineEnd> {
    match tags.get(i + 1) {
        None => Some(LineEnd::Eof),
        Some(Tag::Literal(text)) => match text.find('\n') {
            Some(pos) if text[..pos].chars().all(|c| c == ' ' || c == '\t') => {
                Some(LineEnd::Consume(text[pos + 1..].to_string()))
            }
            None if i + 2 == tags.len()
                && text.chars().all(|c| c == ' ' || c == '\t') =>
            {
                Some(LineEnd::Consume(String::new()))
            }
            _ => None,
        },
        Some(_) => None,
    }
}

fn push_literal(out: &mut Vec<Tag>, at_line_start: &mut bool, indent: &mut String, text: &str) {
    match text.rfind('\n') {
        Some(pos) => {
            let tail = &text[pos + 1..];
            *at_line_start = tail.chars().all(|c| c == ' ' || c == '\t');
            indent.clear();
            if *at_line_start {
                indent.push_str(tail);
            }
        }
        None => {
            if *at_line_start && text.chars().all(|c| c == ' ' || c == '\t') {
                indent.push_str(text);
            } else {
                *at_line_start = false;
                indent.clear();
            }
        }
    }
    out.push(Tag::Literal(text.to_string()));
}

/// Remove `count` bytes from the end of the last literal in `out`.
fn strip_trailing(out: &mut Vec<Tag>, count: usize) {
    if count == 0 {
        return;
    }
    if let Some(Tag::Literal(text)) = out.last_mut() {
        text.truncate(text.len() - count);
        if text.is_empty() {
            out.pop();
        }
    }
}
