//! Route template parsing.
//!
//! # Responsibilities
//! - Split a template into literal runs and placeholders
//! - Compile and anchor regex placeholders
//! - Reject malformed templates at registration time
//!
//! # Syntax
//! ```text
//! /literal            exact text
//! /{name}             any run of characters up to the next '/' (or the
//!                     literal that follows the placeholder)
//! /{name:expr}        regex match, never spans '/'
//! /{:expr}            anonymous regex match
//! /*                  remainder of the path, including '/'
//! /*/suffix           same as '/*'; the suffix is informational only
//! ```

use std::fmt;

use regex::Regex;

use crate::error::PatternError;

/// Name bound to the remainder matched by a wildcard.
pub const WILDCARD_KEY: &str = "*";

/// One typed unit of a route template.
#[derive(Clone)]
pub enum Segment {
    /// Literal text, possibly spanning several '/'-delimited parts.
    Static(String),
    /// `{name}`
    Param(String),
    /// `{name:expr}`; `expr` is the anchored source actually compiled.
    Regex { name: String, expr: String, regex: Regex },
    /// `*`
    Wildcard,
}

impl Segment {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Segment::Param(_) | Segment::Regex { .. })
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Static(text) => f.debug_tuple("Static").field(text).finish(),
            Segment::Param(name) => f.debug_tuple("Param").field(name).finish(),
            Segment::Regex { name, expr, .. } => {
                f.debug_tuple("Regex").field(name).field(expr).finish()
            }
            Segment::Wildcard => f.write_str("Wildcard"),
        }
    }
}

/// A parsed route template.
#[derive(Debug, Clone)]
pub struct Pattern {
    raw: String,
    segments: Vec<Segment>,
    suffix: Option<String>,
}

impl Pattern {
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        if !pattern.starts_with('/') {
            return Err(PatternError::MissingLeadingSlash(pattern.to_string()));
        }

        let mut segments: Vec<Segment> = Vec::new();
        let mut literal = String::new();
        let mut suffix = None;
        let mut chars = pattern.char_indices();

        while let Some((i, c)) = chars.next() {
            match c {
                '{' => {
                    check_separated(pattern, &literal, &segments)?;
                    flush(&mut literal, &mut segments);

                    let body_start = i + 1;
                    let rest = &pattern[body_start..];
                    let close = match rest.find(['{', '}']) {
                        Some(off) if rest[off..].starts_with('}') => off,
                        Some(off) if rest[..off].contains(':') => {
                            return Err(PatternError::RegexBraces(pattern.to_string()));
                        }
                        _ => return Err(PatternError::UnterminatedParam(pattern.to_string())),
                    };
                    segments.push(placeholder(pattern, &rest[..close])?);

                    // Skip the placeholder body and its closing brace.
                    let end = body_start + close;
                    for (j, _) in chars.by_ref() {
                        if j >= end {
                            break;
                        }
                    }
                }
                '}' => {
                    return Err(PatternError::UnbalancedBrace {
                        pattern: pattern.to_string(),
                        index: i,
                    });
                }
                '*' => {
                    check_separated(pattern, &literal, &segments)?;
                    flush(&mut literal, &mut segments);
                    segments.push(Segment::Wildcard);

                    let tail = &pattern[i + 1..];
                    if !tail.is_empty() {
                        if !tail.starts_with('/') || tail.contains(['{', '}', '*']) {
                            return Err(PatternError::WildcardNotLast(pattern.to_string()));
                        }
                        suffix = Some(tail.to_string());
                    }
                    break;
                }
                '/' => {
                    if literal.ends_with('/') {
                        return Err(PatternError::EmptySegment(pattern.to_string()));
                    }
                    literal.push(c);
                }
                _ => literal.push(c),
            }
        }
        flush(&mut literal, &mut segments);

        Ok(Self {
            raw: pattern.to_string(),
            segments,
            suffix,
        })
    }

    /// The template exactly as registered.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Literal after a `/*/` wildcard, kept for introspection only.
    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    /// Parameter names in binding order.
    pub fn param_keys(&self) -> Vec<String> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Static(_) => None,
                Segment::Param(name) | Segment::Regex { name, .. } => Some(name.clone()),
                Segment::Wildcard => Some(WILDCARD_KEY.to_string()),
            })
            .collect()
    }

    pub fn has_wildcard(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::Wildcard))
    }
}

/// Character that ends the placeholder at `index`.
pub(crate) fn tail_after(segments: &[Segment], index: usize) -> char {
    match segments.get(index + 1) {
        Some(Segment::Static(text)) => text.chars().next().unwrap_or('/'),
        _ => '/',
    }
}

fn flush(literal: &mut String, segments: &mut Vec<Segment>) {
    if !literal.is_empty() {
        segments.push(Segment::Static(std::mem::take(literal)));
    }
}

fn check_separated(pattern: &str, literal: &str, segments: &[Segment]) -> Result<(), PatternError> {
    let after_placeholder = segments.last().is_some_and(Segment::is_placeholder);
    if literal.is_empty() && after_placeholder {
        return Err(PatternError::AdjacentPlaceholders(pattern.to_string()));
    }
    Ok(())
}

fn placeholder(pattern: &str, body: &str) -> Result<Segment, PatternError> {
    let (name, expr) = match body.split_once(':') {
        Some((name, expr)) => (name, Some(expr)),
        None => (body, None),
    };

    match expr {
        Some(expr) if !expr.is_empty() => {
            let inner = expr.strip_prefix('^').unwrap_or(expr);
            let inner = inner.strip_suffix('$').unwrap_or(inner);
            let anchored = format!("^(?:{inner})$");
            let regex = Regex::new(&anchored).map_err(|source| PatternError::InvalidRegex {
                pattern: pattern.to_string(),
                expr: expr.to_string(),
                source,
            })?;
            Ok(Segment::Regex {
                name: name.to_string(),
                expr: anchored,
                regex,
            })
        }
        _ if name.is_empty() => Err(PatternError::EmptyParamName(pattern.to_string())),
        _ => Ok(Segment::Param(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(pattern: &str) -> Vec<String> {
        Pattern::parse(pattern)
            .unwrap()
            .segments()
            .iter()
            .map(|s| format!("{s:?}"))
            .collect()
    }

    #[test]
    fn test_static_pattern() {
        assert_eq!(kinds("/users/me"), vec![r#"Static("/users/me")"#]);
    }

    #[test]
    fn test_named_and_regex_params() {
        let pattern = Pattern::parse("/date/{yyyy:\\d\\d\\d\\d}/{mm}").unwrap();
        assert_eq!(pattern.segments().len(), 4);
        assert!(matches!(&pattern.segments()[1], Segment::Regex { name, .. } if name == "yyyy"));
        assert!(matches!(&pattern.segments()[3], Segment::Param(name) if name == "mm"));
        assert_eq!(pattern.param_keys(), vec!["yyyy", "mm"]);
    }

    #[test]
    fn test_regex_is_anchored() {
        let pattern = Pattern::parse("/{id:[0-9]+}").unwrap();
        let Segment::Regex { regex, expr, .. } = &pattern.segments()[1] else {
            panic!("expected regex segment");
        };
        assert_eq!(expr, "^(?:[0-9]+)$");
        assert!(regex.is_match("123"));
        assert!(!regex.is_match("12a"));

        let explicit = Pattern::parse("/{id:^[0-9]+$}").unwrap();
        let Segment::Regex { expr, .. } = &explicit.segments()[1] else {
            panic!("expected regex segment");
        };
        assert_eq!(expr, "^(?:[0-9]+)$");
    }

    #[test]
    fn test_anonymous_regex() {
        let pattern = Pattern::parse("/{:\\d+}").unwrap();
        assert_eq!(pattern.param_keys(), vec![""]);
    }

    #[test]
    fn test_empty_regex_is_plain_param() {
        let pattern = Pattern::parse("/{id:}").unwrap();
        assert!(matches!(&pattern.segments()[1], Segment::Param(name) if name == "id"));
    }

    #[test]
    fn test_embedded_placeholder() {
        let pattern = Pattern::parse("/files/file-{id}.json").unwrap();
        assert_eq!(
            kinds("/files/file-{id}.json"),
            vec![r#"Static("/files/file-")"#, r#"Param("id")"#, r#"Static(".json")"#]
        );
        assert_eq!(tail_after(pattern.segments(), 1), '.');
    }

    #[test]
    fn test_trailing_param_tail_is_slash() {
        let pattern = Pattern::parse("/users/{id}").unwrap();
        assert_eq!(tail_after(pattern.segments(), 1), '/');
    }

    #[test]
    fn test_wildcard() {
        let pattern = Pattern::parse("/static/*").unwrap();
        assert!(pattern.has_wildcard());
        assert_eq!(pattern.param_keys(), vec!["*"]);
        assert!(pattern.suffix().is_none());
    }

    #[test]
    fn test_wildcard_with_informational_suffix() {
        let pattern = Pattern::parse("/page/*/index").unwrap();
        assert!(pattern.has_wildcard());
        assert_eq!(pattern.suffix(), Some("/index"));
        assert_eq!(pattern.segments().len(), 2);
    }

    #[test]
    fn test_wildcard_not_last() {
        assert!(matches!(
            Pattern::parse("/a*b"),
            Err(PatternError::WildcardNotLast(_))
        ));
        assert!(matches!(
            Pattern::parse("/*/{id}"),
            Err(PatternError::WildcardNotLast(_))
        ));
    }

    #[test]
    fn test_missing_leading_slash() {
        assert!(matches!(
            Pattern::parse("users"),
            Err(PatternError::MissingLeadingSlash(_))
        ));
        assert!(matches!(
            Pattern::parse(""),
            Err(PatternError::MissingLeadingSlash(_))
        ));
    }

    #[test]
    fn test_unterminated_param() {
        assert!(matches!(
            Pattern::parse("/users/{id"),
            Err(PatternError::UnterminatedParam(_))
        ));
    }

    #[test]
    fn test_stray_closing_brace() {
        assert!(matches!(
            Pattern::parse("/users/id}"),
            Err(PatternError::UnbalancedBrace { index: 9, .. })
        ));
    }

    #[test]
    fn test_regex_with_braces_rejected() {
        assert!(matches!(
            Pattern::parse("/{year:\\d{4}}"),
            Err(PatternError::RegexBraces(_))
        ));
    }

    #[test]
    fn test_invalid_regex() {
        assert!(matches!(
            Pattern::parse("/{id:[0-9}"),
            Err(PatternError::InvalidRegex { .. })
        ));
    }

    #[test]
    fn test_empty_param_name() {
        assert!(matches!(
            Pattern::parse("/users/{}"),
            Err(PatternError::EmptyParamName(_))
        ));
    }

    #[test]
    fn test_doubled_slash_rejected() {
        assert!(matches!(
            Pattern::parse("/users//me"),
            Err(PatternError::EmptySegment(_))
        ));
        assert!(matches!(
            Pattern::parse("//"),
            Err(PatternError::EmptySegment(_))
        ));
    }

    #[test]
    fn test_adjacent_placeholders_rejected() {
        assert!(matches!(
            Pattern::parse("/{a}{b}"),
            Err(PatternError::AdjacentPlaceholders(_))
        ));
        assert!(matches!(
            Pattern::parse("/{a}*"),
            Err(PatternError::AdjacentPlaceholders(_))
        ));
    }

    #[test]
    fn test_root_and_trailing_slash() {
        assert_eq!(kinds("/"), vec![r#"Static("/")"#]);
        assert_eq!(kinds("/users/"), vec![r#"Static("/users/")"#]);
    }
}
