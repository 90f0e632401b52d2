// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Location patterns.
//!
//! A pattern is a whitespace-separated list of alternatives. Each alternative is
//! a path where
//!
//! - `*` matches anything,
//! - `:name` captures one path segment as a string,
//! - `$name` captures one numeric path segment as a number,
//! - a leading `-` turns the alternative into an exclusion.
//!
//! Matching is anchored and ignores the scheme, the host, the fragment, and a
//! trailing slash. The query string is ignored unless the alternative itself
//! contains a `?`.
//!
//! ```
//! use overstory_layer::UrlPattern;
//!
//! let pattern = UrlPattern::new("/items/:id -/items/new").unwrap();
//! let captures = pattern.recognize("https://example.com/items/42/#top").unwrap();
//! assert_eq!(captures["id"], "42");
//! assert!(pattern.recognize("/items/new").is_none());
//! ```

use std::fmt;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::OverlayError;

#[derive(Clone, Debug)]
struct Capture {
    name: String,
    numeric: bool,
}

#[derive(Clone, Debug)]
struct Alternative {
    regex: Regex,
    captures: Vec<Capture>,
    query: bool,
}

impl Alternative {
    fn compile(source: &str, pattern: &str) -> Result<Self, OverlayError> {
        let fail = |reason: String| OverlayError::Pattern {
            pattern: pattern.into(),
            reason,
        };
        let path = trim_trailing_slash(source);
        let mut expr = String::from("^");
        let mut captures: Vec<Capture> = Vec::new();
        let mut chars = path.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '*' => expr.push_str(".*?"),
                ':' | '$' => {
                    let mut name = String::new();
                    while let Some(&n) = chars.peek()
                        && (n.is_ascii_alphanumeric() || n == '_')
                    {
                        name.push(n);
                        chars.next();
                    }
                    if name.is_empty() {
                        return Err(fail(format!("`{c}` must be followed by a capture name")));
                    }
                    if captures.iter().any(|other| other.name == name) {
                        return Err(fail(format!("capture `{name}` appears twice")));
                    }
                    let numeric = c == '$';
                    expr.push_str(if numeric { r"(\d+)" } else { r"([^/?#]+)" });
                    captures.push(Capture { name, numeric });
                }
                _ => expr.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
            }
        }
        expr.push('$');
        let regex = Regex::new(&expr).map_err(|err| fail(err.to_string()))?;
        Ok(Self {
            regex,
            captures,
            query: path.contains('?'),
        })
    }

    fn recognize(&self, location: &str) -> Option<Map<String, Value>> {
        let subject = normalize(location, self.query);
        let found = self.regex.captures(subject)?;
        let mut out = Map::new();
        for (capture, group) in self.captures.iter().zip(found.iter().skip(1)) {
            let text = group.map(|m| m.as_str()).unwrap_or_default();
            let value = if capture.numeric {
                text.parse::<u64>()
                    .map(Value::from)
                    .unwrap_or_else(|_| Value::String(text.into()))
            } else {
                Value::String(text.into())
            };
            out.insert(capture.name.clone(), value);
        }
        Some(out)
    }
}

/// Compiled location pattern.
#[derive(Clone, Debug)]
pub struct UrlPattern {
    source: String,
    includes: Vec<Alternative>,
    excludes: Vec<Alternative>,
}

impl UrlPattern {
    /// Compile `source`.
    ///
    /// Fails for an empty pattern, a pattern made only of exclusions, a missing or
    /// repeated capture name, or an alternative that does not compile.
    pub fn new(source: &str) -> Result<Self, OverlayError> {
        let mut includes = Vec::new();
        let mut excludes = Vec::new();
        for alternative in source.split_whitespace() {
            match alternative.strip_prefix('-') {
                Some(excluded) => excludes.push(Alternative::compile(excluded, source)?),
                None => includes.push(Alternative::compile(alternative, source)?),
            }
        }
        if includes.is_empty() {
            let reason = if excludes.is_empty() {
                "pattern is empty"
            } else {
                "pattern only excludes locations"
            };
            return Err(OverlayError::Pattern {
                pattern: source.into(),
                reason: reason.into(),
            });
        }
        Ok(Self {
            source: source.into(),
            includes,
            excludes,
        })
    }

    /// The pattern as written.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns true if `location` matches.
    pub fn matches(&self, location: &str) -> bool {
        self.recognize(location).is_some()
    }

    /// Named captures of the first matching alternative, or `None` if `location`
    /// does not match or is excluded.
    pub fn recognize(&self, location: &str) -> Option<Map<String, Value>> {
        if self.excludes.iter().any(|alt| alt.recognize(location).is_some()) {
            return None;
        }
        self.includes.iter().find_map(|alt| alt.recognize(location))
    }
}

impl fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn trim_trailing_slash(path: &str) -> &str {
    match path.strip_suffix('/') {
        Some(trimmed) if !trimmed.is_empty() => trimmed,
        _ => path,
    }
}

fn normalize(location: &str, keep_query: bool) -> &str {
    let mut path = location;
    if let Some((_, rest)) = path.split_once("://") {
        path = rest.find('/').map_or("/", |i| &rest[i..]);
    }
    if let Some((before, _)) = path.split_once('#') {
        path = before;
    }
    if !keep_query && let Some((before, _)) = path.split_once('?') {
        path = before;
    }
    trim_trailing_slash(path)
}
