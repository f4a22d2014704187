/*
 * scanner.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Tag scanner.
//!
//! Converts template text into an ordered sequence of [`Tag`]s. Literal text
//! between tags is preserved verbatim. The scanner checks section balance and
//! splits name annotations, but performs no schema logic.

use crate::error::{TemplateError, TemplateResult};
use crate::tag::{Annotation, Tag, TagName, ValueType};

/// Scan template text into a tag sequence.
///
/// Fails with a syntax error for an unterminated tag, an empty or malformed
/// tag name, or unbalanced section open/close tags.
pub fn scan(source: &str) -> TemplateResult<Vec<Tag>> {
    let mut tags = Vec::new();
    let mut open_sections: Vec<String> = Vec::new();
    let mut pos = 0;

    while let Some(found) = source[pos..].find("{{") {
        let start = pos + found;
        if start > pos {
            tags.push(Tag::Literal(source[pos..start].to_string()));
        }

        let inner_start = start + 2;
        let Some(found_end) = source[inner_start..].find("}}") else {
            return Err(TemplateError::UnterminatedTag { position: start });
        };
        let inner_end = inner_start + found_end;
        let raw = &source[inner_start..inner_end];
        pos = inner_end + 2;

        let trimmed = raw.trim_start();
        match trimmed.chars().next() {
            Some('!') => {
                tags.push(Tag::Comment(trimmed[1..].to_string()));
            }
            Some('#') => {
                let name = parse_tag_name(trimmed[1..].trim(), start)?;
                open_sections.push(name.name.clone());
                tags.push(Tag::SectionOpen(name));
            }
            Some('^') => {
                let name = parse_tag_name(trimmed[1..].trim(), start)?;
                open_sections.push(name.name.clone());
                tags.push(Tag::InvertedOpen(name));
            }
            Some('/') => {
                let name = trimmed[1..].trim();
                if name.is_empty() {
                    return Err(TemplateError::EmptyTagName { position: start });
                }
                match open_sections.pop() {
                    Some(open) if open == name => {}
                    _ => {
                        return Err(TemplateError::UnmatchedSectionClose {
                            name: name.to_string(),
                            position: start,
                        });
                    }
                }
                tags.push(Tag::SectionClose(name.to_string()));
            }
            Some('>') => {
                let name = trimmed[1..].trim();
                if name.is_empty() {
                    return Err(TemplateError::EmptyTagName { position: start });
                }
                tags.push(Tag::Partial {
                    name: name.to_string(),
                    indent: String::new(),
                });
            }
            _ => {
                let name = parse_tag_name(raw.trim(), start)?;
                tags.push(Tag::Variable(name));
            }
        }
    }

    if pos < source.len() {
        tags.push(Tag::Literal(source[pos..].to_string()));
    }

    if let Some(name) = open_sections.pop() {
        return Err(TemplateError::UnclosedSection { name });
    }

    Ok(tags)
}

/// Split a trimmed tag name into its base name and optional annotation.
///
/// `name` is plain, `name::type` is a type suffix, `name:schema:def` is an
/// external reference. Any other colon arrangement is a syntax error.
pub fn parse_tag_name(name: &str, position: usize) -> TemplateResult<TagName> {
    if name.is_empty() {
        return Err(TemplateError::EmptyTagName { position });
    }

    let parts: Vec<&str> = name.split(':').collect();
    match parts.as_slice() {
        [base] => Ok(TagName::plain(*base)),
        [base, "", keyword] if !base.is_empty() => {
            let Some(value_type) = ValueType::from_keyword(keyword) else {
                return Err(TemplateError::InvalidAnnotation {
                    name: name.to_string(),
                    position,
                });
            };
            Ok(TagName {
                name: (*base).to_string(),
                annotation: Some(Annotation::Type(value_type)),
            })
        }
        [base, schema_name, definition_name]
            if !base.is_empty() && !schema_name.is_empty() && !definition_name.is_empty() =>
        {
            Ok(TagName {
                name: (*base).to_string(),
                annotation: Some(Annotation::External {
                    schema_name: (*schema_name).to_string(),
                    definition_name: (*definition_name).to_string(),
                }),
            })
        }
        _ => Err(TemplateError::InvalidAnnotation {
            name: name.to_string(),
            position,
        }),
    }
}

/// The trimmed content of the first comment tag, if any.
pub fn first_comment(tags: &[Tag]) -> Option<&str> {
    tags.iter().find_map(|tag| match tag {
        Tag::Comment(text) => Some(text.trim()),
        _ => None,
    })
}
