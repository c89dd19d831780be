//! Error types for router setup.
//!
//! # Design Decisions
//! - Every setup error is returned from the registration call that caused it
//! - Request-time misses (404/405) are not errors; they route to handlers
//! - Pattern syntax errors carry the offending pattern for the log line

use thiserror::Error;

/// A route template that failed to parse.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("routing pattern must begin with '/' in '{0}'")]
    MissingLeadingSlash(String),

    #[error("route param closing delimiter '}}' is missing in '{0}'")]
    UnterminatedParam(String),

    #[error("unexpected '}}' at byte {index} in '{pattern}'")]
    UnbalancedBrace { pattern: String, index: usize },

    #[error("route param has an empty name in '{0}'")]
    EmptyParamName(String),

    #[error("route param regex must not contain braces in '{0}'")]
    RegexBraces(String),

    #[error("invalid regex '{expr}' in '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        expr: String,
        #[source]
        source: regex::Error,
    },

    #[error("wildcard '*' must be the last segment in '{0}'")]
    WildcardNotLast(String),

    #[error("empty path segment ('//') in '{0}'")]
    EmptySegment(String),

    #[error("placeholders must be separated by literal text in '{0}'")]
    AdjacentPlaceholders(String),
}

/// Errors raised while configuring a router.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error("http method '{0}' is not registered")]
    UnknownMethod(String),

    #[error("http method '{0}' is already registered")]
    DuplicateMethod(String),

    #[error("invalid http method name '{0}'")]
    InvalidMethodName(String),

    #[error("method registry is full ({0} methods)")]
    MethodCapacity(usize),

    #[error("all interceptors must be registered before routes")]
    InterceptorsFrozen,

    #[error("attempting to mount onto an existing path '{0}'")]
    MountConflict(String),
}
