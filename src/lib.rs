//! A rule-based syntax tokenizer.
//!
//! A grammar is an ordered list of regex rules whose capture groups are mapped to scope
//! names. The rules are merged into one regex, the source is split into chunks and every
//! matched chunk gets a tree of nested scopes. A capture can also hand its text over to
//! another grammar, for languages embedded in others like scripts in HTML.

mod cache;
mod error;
mod grammars;
mod registry;
mod scope;
mod tokenizer;

pub mod languages;
pub mod scope_names;

#[cfg(test)]
mod test_utils;

pub use cache::GrammarCache;
pub use error::Error;
pub use grammars::{
    AliasMatcher, Capture, CaptureTarget, CompiledGrammar, GrammarDefinition, Rule,
};
pub use registry::{DEFAULT_MAX_NESTING_DEPTH, ParseOptions, Registry, Repository};
pub use scope::{Scope, ScopeTreeBuilder, Token, Walk, build_scope_tree, flatten};
pub use tokenizer::{Chunk, Tokenizer};
