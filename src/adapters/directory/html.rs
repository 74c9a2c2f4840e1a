//! Tolerant markup scanning for directory pages.
//!
//! Supports the selector subset card layouts need: `tag`, `.class`,
//! `tag.class`, and descendant chains separated by whitespace
//! (`div.faculty-info a`). Matching is case-insensitive on tag names and
//! tolerant of unclosed elements, which run to the end of their scope.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

static OPEN_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<([a-zA-Z][a-zA-Z0-9-]*)((?:[^>])*)>").unwrap());
static ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([a-zA-Z_:][-a-zA-Z0-9_:.]*)\s*(?:=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .unwrap()
});
static TAG_BOUNDARY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<(/?)([a-zA-Z][a-zA-Z0-9-]*)[^>]*>").unwrap());
static NON_RENDERED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<!--.*?-->|<script\b.*?</script\s*>|<style\b.*?</style\s*>|<template\b.*?</template\s*>")
        .unwrap()
});
static ANY_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static ENTITY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").unwrap());

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    tag: Option<String>,
    class: Option<String>,
}

impl Step {
    fn matches(&self, tag: &str, attrs: &str) -> bool {
        if let Some(expected) = &self.tag {
            if !expected.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        match &self.class {
            Some(class) => attribute(attrs, "class")
                .map(|value| value.split_whitespace().any(|c| c == class.as_str()))
                .unwrap_or(false),
            None => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    steps: Vec<Step>,
}

impl Selector {
    pub fn parse(selector: &str) -> Result<Self, String> {
        let mut steps = Vec::new();
        for part in selector.split_whitespace() {
            let (tag, class) = match part.split_once('.') {
                Some((tag, class)) => (tag, Some(class)),
                None => (part, None),
            };
            let valid_ident = |s: &str| {
                !s.is_empty()
                    && s
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            };
            if (!tag.is_empty() && !valid_ident(tag)) || class.is_some_and(|c| !valid_ident(c)) {
                return Err(format!("unsupported selector step '{}'", part));
            }
            if tag.is_empty() && class.is_none() {
                return Err(format!("empty selector step in '{}'", selector));
            }
            steps.push(Step {
                tag: (!tag.is_empty()).then(|| tag.to_ascii_lowercase()),
                class: class.map(str::to_string),
            });
        }

        if steps.is_empty() {
            return Err("selector is empty".to_string());
        }
        Ok(Self { steps })
    }
}

/// A matched element borrowed from the scanned document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Element<'a> {
    attrs: &'a str,
    inner: &'a str,
}

impl<'a> Element<'a> {
    pub fn attr(&self, name: &str) -> Option<String> {
        attribute(self.attrs, name)
    }

    /// Visible text with tags removed, entities decoded and whitespace collapsed.
    pub fn text(&self) -> String {
        text_content(self.inner)
    }

    pub fn select(&self, selector: &Selector) -> Vec<Element<'a>> {
        select(self.inner, selector)
    }

    pub fn select_first(&self, selector: &Selector) -> Option<Element<'a>> {
        self.select(selector).into_iter().next()
    }
}

/// All elements under `scope` matching `selector`, in document order.
pub fn select<'a>(scope: &'a str, selector: &Selector) -> Vec<Element<'a>> {
    let mut current = vec![Element {
        attrs: "",
        inner: scope,
    }];

    for step in &selector.steps {
        let mut next = Vec::new();
        for element in current {
            for found in find_in(element.inner, step) {
                // nested scopes can reach the same element twice
                let seen = next
                    .iter()
                    .any(|e: &Element<'a>| std::ptr::eq(e.inner, found.inner) && std::ptr::eq(e.attrs, found.attrs));
                if !seen {
                    next.push(found);
                }
            }
        }
        current = next;
    }

    current
}

fn find_in<'a>(scope: &'a str, step: &Step) -> Vec<Element<'a>> {
    let mut found = Vec::new();
    for caps in OPEN_TAG_RE.captures_iter(scope) {
        let (Some(whole), Some(tag), Some(attrs)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        if !step.matches(tag.as_str(), attrs.as_str()) {
            continue;
        }

        let tag_name = tag.as_str().to_ascii_lowercase();
        let self_closing = attrs.as_str().trim_end().ends_with('/');
        let inner = if self_closing || VOID_ELEMENTS.contains(&tag_name.as_str()) {
            ""
        } else {
            let body = &scope[whole.end()..];
            match closing_offset(body, &tag_name) {
                Some(end) => &body[..end],
                None => body,
            }
        };

        found.push(Element {
            attrs: attrs.as_str(),
            inner,
        });
    }
    found
}

/// Offset in `body` of the tag closing an element already opened, honoring nesting.
fn closing_offset(body: &str, tag: &str) -> Option<usize> {
    let mut depth = 1usize;
    for caps in TAG_BOUNDARY_RE.captures_iter(body) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(2)) else {
            continue;
        };
        if !name.as_str().eq_ignore_ascii_case(tag) {
            continue;
        }
        let is_close = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
        if is_close {
            depth -= 1;
            if depth == 0 {
                return Some(whole.start());
            }
        } else if !whole.as_str().ends_with("/>") {
            depth += 1;
        }
    }
    None
}

fn attribute(attrs: &str, name: &str) -> Option<String> {
    ATTR_RE.captures_iter(attrs).find_map(|caps| {
        let key = caps.get(1)?;
        if !key.as_str().eq_ignore_ascii_case(name) {
            return None;
        }
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|m| m.as_str())
            .unwrap_or("");
        Some(decode_entities(value))
    })
}

/// Drops comments, scripts, styles and templates: markup the browser never renders.
pub fn strip_non_rendered(page: &str) -> Cow<'_, str> {
    NON_RENDERED_RE.replace_all(page, " ")
}

pub fn text_content(fragment: &str) -> String {
    let without_scripts = strip_non_rendered(fragment);
    let without_tags = ANY_TAG_RE.replace_all(&without_scripts, " ");
    let decoded = decode_entities(&without_tags);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &regex::Captures| {
            let entity = &caps[1];
            let decoded = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match entity {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some(' '),
                    _ => None,
                }
            };
            decoded
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .to_string()
}
