//! Engine error types.

use std::time::Duration;

use thiserror::Error;

/// A query template that cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unterminated string literal starting at byte {0}")]
    UnterminatedQuote(usize),

    #[error("optional section opened at byte {0} is never closed")]
    UnclosedSection(usize),

    #[error("unexpected ']]' at byte {0}")]
    UnexpectedSectionEnd(usize),

    #[error("nested optional section at byte {0}")]
    NestedSection(usize),
}

/// Rule loading and validation failures.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("duplicate rule id: {0}")]
    DuplicateId(String),

    #[error("duplicate active intent name: {0}")]
    DuplicateIntentName(String),

    #[error("invalid template: {0}")]
    Template(#[from] TemplateError),

    #[error("placeholder :{0} has no entity definition")]
    UnknownPlaceholder(String),

    #[error("placeholder :{0} is outside an optional section but its entity is neither required nor defaulted")]
    UnboundPlaceholder(String),

    #[error("template is not a single read-only statement")]
    NotReadOnly,

    #[error("template contains a LIMIT clause; row caps must be passed to the executor")]
    HiddenLimit,

    #[error("display fields do not map canonical field '{0}'")]
    MissingDisplayField(String),

    #[error("display field '{0}' is mapped twice")]
    DuplicateDisplayField(String),

    #[error("invalid pattern for entity '{entity}': {message}")]
    InvalidPattern { entity: String, message: String },

    #[error("rule source error: {0}")]
    Source(String),
}

/// Template binding failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("missing required entity: {0}")]
    MissingRequiredEntity(String),

    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Data-store execution failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("query failed: {0}")]
    Query(String),

    #[error("query timed out after {0:?}")]
    Timeout(Duration),

    #[error("unexpected row shape: {0}")]
    Decode(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Query(e.to_string())
    }
}

/// Conversational collaborator failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("chat request timed out")]
    Timeout,

    #[error("chat service unavailable: {0}")]
    Unavailable(String),

    #[error("chat service returned HTTP {0}")]
    Http(u16),

    #[error("invalid chat response: {0}")]
    InvalidResponse(String),
}

impl ChatError {
    /// Whether another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ChatError::Timeout | ChatError::Unavailable(_) => true,
            ChatError::Http(status) => *status == 429 || *status >= 500,
            ChatError::InvalidResponse(_) => false,
        }
    }
}

/// A matched rule that could not be answered.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Bind(#[from] BindError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("no parsed template for rule {0}")]
    MissingTemplate(String),
}

/// Convenience alias for data-store results.
pub type StoreResult<T> = Result<T, StoreError>;
