//! Simple CSS selectors for event delegation.
//!
//! Supported: type (`a`), universal (`*`), class (`.x`), id (`#x`),
//! attribute presence and equality (`[data-x]`, `[data-x="y"]`), compounds of
//! those (`a.js-track[data-ga-action]`) and comma-separated groups.
//! Combinators are rejected.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use crate::dom::Element;
use crate::error::{Result, TrackError};

/// A parsed selector: one or more compound selectors, any of which may match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    groups: Vec<Compound>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<AttributeMatch>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttributeMatch {
    name: String,
    value: Option<String>,
}

impl Selector {
    /// Parse a selector.
    pub fn parse(source: &str) -> Result<Self> {
        let groups = source
            .split(',')
            .map(|group| parse_compound(source, group.trim()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            source: source.trim().to_string(),
            groups,
        })
    }

    /// The selector text as given.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Check whether `element` itself matches.
    pub fn matches(&self, element: &Element) -> bool {
        self.groups.iter().any(|group| group.matches(element))
    }

    /// The innermost element on the path from `target` up that matches.
    pub fn closest<'a>(&self, target: &'a Element) -> Option<&'a Element> {
        target.ancestors().find(|el| self.matches(el))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Compound {
    fn matches(&self, element: &Element) -> bool {
        if let Some(ref tag) = self.tag {
            if !tag.eq_ignore_ascii_case(&element.tag) {
                return false;
            }
        }

        if let Some(ref id) = self.id {
            if element.id.as_deref() != Some(id.as_str()) {
                return false;
            }
        }

        if !self.classes.iter().all(|class| element.has_class(class)) {
            return false;
        }

        self.attributes.iter().all(|attr| match (&attr.value, element.attribute(&attr.name)) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(expected), Some(actual)) => *expected == actual,
        })
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

fn parse_compound(source: &str, group: &str) -> Result<Compound> {
    if group.is_empty() {
        return Err(TrackError::selector(source, "empty selector"));
    }

    let mut chars = group.chars().peekable();
    let mut compound = Compound::default();

    match chars.peek() {
        Some('*') => {
            chars.next();
        }
        Some(&c) if is_ident_char(c) => {
            compound.tag = Some(read_ident(source, &mut chars)?);
        }
        _ => {}
    }

    while let Some(c) = chars.next() {
        match c {
            '.' => compound.classes.push(read_ident(source, &mut chars)?),
            '#' => {
                let id = read_ident(source, &mut chars)?;
                if compound.id.replace(id).is_some() {
                    return Err(TrackError::selector(source, "more than one id"));
                }
            }
            '[' => compound.attributes.push(read_attribute(source, &mut chars)?),
            c if c.is_whitespace() || matches!(c, '>' | '+' | '~') => {
                return Err(TrackError::selector(
                    source,
                    "combinators are not supported",
                ));
            }
            other => {
                return Err(TrackError::selector(
                    source,
                    format!("unexpected character '{other}'"),
                ));
            }
        }
    }

    Ok(compound)
}

fn read_ident(source: &str, chars: &mut Peekable<Chars<'_>>) -> Result<String> {
    let mut ident = String::new();
    while let Some(&c) = chars.peek() {
        if !is_ident_char(c) {
            break;
        }
        ident.push(c);
        chars.next();
    }

    if ident.is_empty() {
        Err(TrackError::selector(source, "expected a name"))
    } else {
        Ok(ident)
    }
}

fn read_attribute(source: &str, chars: &mut Peekable<Chars<'_>>) -> Result<AttributeMatch> {
    let name = read_ident(source, chars)?;

    match chars.next() {
        Some(']') => Ok(AttributeMatch { name, value: None }),
        Some('=') => {
            let value = match chars.peek() {
                Some(&quote) if quote == '"' || quote == '\'' => {
                    chars.next();
                    let mut value = String::new();
                    loop {
                        match chars.next() {
                            Some(c) if c == quote => break,
                            Some(c) => value.push(c),
                            None => {
                                return Err(TrackError::selector(source, "unterminated string"))
                            }
                        }
                    }
                    value
                }
                _ => read_ident(source, chars)?,
            };

            match chars.next() {
                Some(']') => Ok(AttributeMatch {
                    name,
                    value: Some(value),
                }),
                _ => Err(TrackError::selector(source, "expected ']'")),
            }
        }
        _ => Err(TrackError::selector(
            source,
            "only [name] and [name=value] are supported",
        )),
    }
}
