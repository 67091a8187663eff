//! Compound CSS selector subset used by component anchors.
//!
//! Supported: `tag`, `#id`, `.class`, `[attr]`, `[attr=value]` and any
//! compound of these (`input[type=file][name=proof]`, `.sub-menu.show`).
//! Combinators and pseudo-classes are rejected.

use std::fmt;
use std::str::FromStr;

use super::document::Element;
use super::DomError;

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrMatch {
    name: String,
    value: Option<String>,
}

/// A parsed compound selector.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrMatch>,
    source: String,
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn read_ident(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut out = String::new();
    while let Some(&c) = chars.peek() {
        if !is_ident_char(c) {
            break;
        }
        out.push(c);
        chars.next();
    }
    out
}

fn strip_quotes(value: &str) -> &str {
    let value = value.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

impl FromStr for Selector {
    type Err = DomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let source = s.trim();
        let invalid = || DomError::InvalidSelector(source.to_string());
        if source.is_empty() {
            return Err(invalid());
        }

        let mut selector = Selector {
            source: source.to_string(),
            ..Selector::default()
        };
        let mut chars = source.chars().peekable();

        if chars.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            selector.tag = Some(read_ident(&mut chars).to_ascii_lowercase());
        }

        while let Some(c) = chars.next() {
            match c {
                '#' => {
                    let ident = read_ident(&mut chars);
                    if ident.is_empty() || selector.id.is_some() {
                        return Err(invalid());
                    }
                    selector.id = Some(ident);
                }
                '.' => {
                    let ident = read_ident(&mut chars);
                    if ident.is_empty() {
                        return Err(invalid());
                    }
                    selector.classes.push(ident);
                }
                '[' => {
                    let mut body = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == ']' {
                            closed = true;
                            break;
                        }
                        body.push(c);
                    }
                    if !closed {
                        return Err(invalid());
                    }
                    let (name, value) = match body.split_once('=') {
                        Some((name, value)) => (name.trim(), Some(strip_quotes(value).to_string())),
                        None => (body.trim(), None),
                    };
                    if name.is_empty() || !name.chars().all(is_ident_char) {
                        return Err(invalid());
                    }
                    selector.attrs.push(AttrMatch {
                        name: name.to_ascii_lowercase(),
                        value,
                    });
                }
                _ => return Err(invalid()),
            }
        }

        Ok(selector)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Selector {
    /// Whether `element` satisfies every part of the compound selector.
    pub fn matches(&self, element: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if element.tag() != tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.id() != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| element.has_class(c)) {
            return false;
        }
        self.attrs.iter().all(|m| match (&m.value, element.attr(&m.name)) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(expected), Some(actual)) => expected == actual,
        })
    }
}
