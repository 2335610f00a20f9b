use std::fmt;
use std::io;

pub(crate) type ScopeResult<T> = Result<T, Error>;

/// Errors that can occur when compiling grammars or tokenizing text
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred when reading a grammar definition file
    Io(io::Error),

    /// JSON parsing failed when loading a grammar definition.
    Json(serde_json::Error),

    /// A grammar definition cannot be compiled: missing id, name or rules, or a capture
    /// refers to a group the rule pattern doesn't have.
    #[allow(missing_docs)]
    InvalidGrammar { grammar: String, reason: String },

    /// A rule pattern, or the composite pattern built from all the rules, was rejected by
    /// the regex engine. `rule` is `None` for the composite pattern.
    #[allow(missing_docs)]
    MalformedRegex {
        grammar: String,
        rule: Option<usize>,
        message: String,
    },

    /// A grammar was not found in the repository, either when asked for directly or when
    /// a capture delegates to an embedded language we don't know about.
    LanguageNotFound(String),

    /// Embedded languages were nested deeper than the configured limit.
    #[allow(missing_docs)]
    NestingTooDeep { limit: usize },

    /// A single parse performed more regex matches than the configured limit.
    #[allow(missing_docs)]
    MatchLimitExceeded { limit: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Json(err) => write!(f, "JSON parsing error: {}", err),
            Error::InvalidGrammar { grammar, reason } => {
                write!(f, "invalid grammar '{}': {}", grammar, reason)
            }
            Error::MalformedRegex {
                grammar,
                rule: Some(rule),
                message,
            } => write!(
                f,
                "malformed regex in rule #{} of grammar '{}': {}",
                rule, grammar, message
            ),
            Error::MalformedRegex {
                grammar,
                rule: None,
                message,
            } => write!(
                f,
                "composite regex of grammar '{}' failed to compile: {}",
                grammar, message
            ),
            Error::LanguageNotFound(name) => write!(f, "language '{}' not found", name),
            Error::NestingTooDeep { limit } => {
                write!(f, "embedded languages nested deeper than {} levels", limit)
            }
            Error::MatchLimitExceeded { limit } => {
                write!(f, "parse exceeded the limit of {} matches", limit)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Json(err) => Some(err),
            Error::InvalidGrammar { .. }
            | Error::MalformedRegex { .. }
            | Error::LanguageNotFound(_)
            | Error::NestingTooDeep { .. }
            | Error::MatchLimitExceeded { .. } => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}
