use std::path::Path;
use std::sync::Arc;

use crate::cache::GrammarCache;
use crate::error::{Error, ScopeResult};
use crate::grammars::{CompiledGrammar, GrammarDefinition, grammar_key};
use crate::languages;
use crate::scope::Scope;
use crate::tokenizer::{Chunk, Tokenizer};

/// Default limit of embedded languages inside each other
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 16;

/// Options for tokenizing, NOT for compiling grammars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    pub(crate) max_nesting_depth: usize,
    pub(crate) match_limit: Option<usize>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            match_limit: None,
        }
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many embedded languages can be nested in each other before failing with
    /// [`Error::NestingTooDeep`]. 0 disables embedded languages entirely.
    pub fn max_nesting_depth(mut self, value: usize) -> Self {
        self.max_nesting_depth = value;
        self
    }

    /// Maximum number of regex matches a single parse can perform, embedded languages
    /// included, before failing with [`Error::MatchLimitExceeded`].
    pub fn match_limit(mut self, value: Option<usize>) -> Self {
        self.match_limit = value;
        self
    }
}

/// Grammar definitions by id, safe to share between threads.
///
/// Registering the same id twice replaces the previous definition.
#[derive(Debug, Default)]
pub struct Repository {
    definitions: papaya::HashMap<String, Arc<GrammarDefinition>>,
}

impl Repository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, definition: GrammarDefinition) {
        #[cfg(feature = "debug")]
        log::debug!("[register] grammar '{}'", definition.id);
        self.definitions
            .pin()
            .insert(definition.key(), Arc::new(definition));
    }

    /// Finds a grammar by id, case-insensitively, or by alias.
    ///
    /// An id always has priority over an alias. If several grammars accept the same alias,
    /// the one with the smallest id is returned.
    pub fn find(&self, id_or_alias: &str) -> Option<Arc<GrammarDefinition>> {
        let definitions = self.definitions.pin();
        if let Some(definition) = definitions.get(&grammar_key(id_or_alias)) {
            return Some(definition.clone());
        }

        definitions
            .iter()
            .filter(|(_, definition)| definition.matches_alias(id_or_alias))
            .min_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, definition)| definition.clone())
    }

    pub fn contains(&self, id_or_alias: &str) -> bool {
        self.find(id_or_alias).is_some()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids of every registered grammar, sorted
    pub fn ids(&self) -> Vec<String> {
        let definitions = self.definitions.pin();
        let mut ids: Vec<String> = definitions
            .iter()
            .map(|(_, definition)| definition.id.clone())
            .collect();
        ids.sort();
        ids
    }
}

/// The main struct in rulescope.
///
/// Holds the grammar definitions, their compiled versions and the parse options. It is not
/// responsible for rendering the chunks it produces.
#[derive(Debug, Default)]
pub struct Registry {
    repository: Repository,
    cache: GrammarCache,
    options: ParseOptions,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every sample grammar from [`crate::languages`] registered
    pub fn with_builtin_grammars() -> Self {
        let registry = Self::new();
        for definition in languages::builtin() {
            registry.register(definition);
        }
        registry
    }

    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    pub fn cache(&self) -> &GrammarCache {
        &self.cache
    }

    /// Registers a grammar. Replacing a grammar that was already compiled does not
    /// recompile it.
    pub fn register(&self, definition: GrammarDefinition) {
        self.repository.register(definition);
    }

    /// Reads a JSON grammar definition and registers it.
    pub fn register_from_path(&self, path: impl AsRef<Path>) -> ScopeResult<()> {
        let definition = GrammarDefinition::load_from_file(path)?;
        self.register(definition);
        Ok(())
    }

    pub fn find(&self, id_or_alias: &str) -> Option<Arc<GrammarDefinition>> {
        self.repository.find(id_or_alias)
    }

    /// Checks whether the given lang is available in the registry with its id or aliases
    pub fn contains_grammar(&self, id_or_alias: &str) -> bool {
        self.repository.contains(id_or_alias)
    }

    /// Returns the compiled grammar, compiling it on first use
    pub fn compiled(&self, id_or_alias: &str) -> ScopeResult<Arc<CompiledGrammar>> {
        let definition = self
            .find(id_or_alias)
            .ok_or_else(|| Error::LanguageNotFound(id_or_alias.to_owned()))?;
        self.cache.get_or_compile(&definition)
    }

    /// Tokenizes `source` with the given grammar, calling `emit` for every chunk in order.
    pub fn parse<F>(&self, id_or_alias: &str, source: &str, emit: F) -> ScopeResult<()>
    where
        F: FnMut(&str, &[Scope]),
    {
        let grammar = self.compiled(id_or_alias)?;
        Tokenizer::new(&self.repository, &self.cache, self.options).parse(source, &grammar, emit)
    }

    /// Tokenizes `source` with the given grammar and returns the chunks.
    pub fn tokenize(&self, id_or_alias: &str, source: &str) -> ScopeResult<Vec<Chunk>> {
        let grammar = self.compiled(id_or_alias)?;
        Tokenizer::new(&self.repository, &self.cache, self.options).tokenize(source, &grammar)
    }
}
