use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::{Error, ScopeResult};

/// What a capture group turns into once matched.
///
/// # Examples
/// ```json
/// {
///   "1": "Html Tag Delimiter",
///   "2": { "language": "javascript" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Capture {
    /// The captured text gets a scope with that name
    Scope(String),
    /// The captured text is tokenized again with the grammar of that id or alias
    Language {
        /// Id or alias of the embedded grammar
        language: String,
    },
}

/// A single regex pattern and the scopes assigned to its capture groups.
///
/// Capture `0` is the whole match of the rule.
///
/// # Examples
/// ```json
/// {
///   "pattern": "\\b(function)\\s+(\\w+)",
///   "captures": {
///     "1": "Keyword",
///     "2": "Function Name"
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Rule {
    /// The regular expression, in Oniguruma's Ruby syntax
    pub pattern: String,
    /// Capture group ordinal -> what to do with the captured text
    #[serde(default)]
    pub captures: BTreeMap<usize, Capture>,
}

impl Rule {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            captures: BTreeMap::new(),
        }
    }

    /// Assigns a scope name to the given capture group
    pub fn capture(mut self, ordinal: usize, scope: impl Into<String>) -> Self {
        self.captures.insert(ordinal, Capture::Scope(scope.into()));
        self
    }

    /// Delegates the text of the given capture group to another grammar
    pub fn language(mut self, ordinal: usize, grammar: impl Into<String>) -> Self {
        self.captures.insert(
            ordinal,
            Capture::Language {
                language: grammar.into(),
            },
        );
        self
    }
}

/// How a grammar can be found other than by its id
#[derive(Clone, Deserialize)]
#[serde(from = "Vec<String>")]
pub enum AliasMatcher {
    /// Any of those names, compared case-insensitively
    Names(Vec<String>),
    /// Arbitrary predicate on the requested name
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl AliasMatcher {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            AliasMatcher::Names(names) => names.iter().any(|n| n.eq_ignore_ascii_case(name)),
            AliasMatcher::Predicate(predicate) => predicate(name),
        }
    }
}

impl Default for AliasMatcher {
    fn default() -> Self {
        AliasMatcher::Names(Vec::new())
    }
}

impl From<Vec<String>> for AliasMatcher {
    fn from(names: Vec<String>) -> Self {
        AliasMatcher::Names(names)
    }
}

impl fmt::Debug for AliasMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AliasMatcher::Names(names) => f.debug_tuple("Names").field(names).finish(),
            AliasMatcher::Predicate(_) => write!(f, "Predicate(..)"),
        }
    }
}

/// Normalized key used by the repository and the compilation cache
#[inline]
pub(crate) fn grammar_key(id: &str) -> String {
    id.to_lowercase()
}

/// A language: an id, a display name and the ordered rules used to tokenize it.
///
/// Rules are tried at each position in order, the first one matching wins.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GrammarDefinition {
    /// Unique identifier, eg `javascript`. Lookups are case-insensitive.
    pub id: String,
    /// Human readable name, eg `JavaScript`
    pub name: String,
    #[serde(default)]
    pub aliases: AliasMatcher,
    pub rules: Vec<Rule>,
}

impl GrammarDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            aliases: AliasMatcher::default(),
            rules: Vec::new(),
        }
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Adds an alias name. Replaces a predicate set with [`Self::alias_predicate`].
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        if let AliasMatcher::Names(names) = &mut self.aliases {
            names.push(alias.into());
        } else {
            self.aliases = AliasMatcher::Names(vec![alias.into()]);
        }
        self
    }

    /// Uses an arbitrary predicate to decide whether a name refers to this grammar.
    pub fn alias_predicate(
        mut self,
        predicate: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.aliases = AliasMatcher::Predicate(Arc::new(predicate));
        self
    }

    pub fn matches_alias(&self, name: &str) -> bool {
        self.aliases.matches(name)
    }

    pub(crate) fn key(&self) -> String {
        grammar_key(&self.id)
    }

    /// Checks the parts the compiler cannot work without
    pub(crate) fn validate(&self) -> ScopeResult<()> {
        let reason = if self.id.trim().is_empty() {
            "the grammar id is empty"
        } else if self.name.trim().is_empty() {
            "the grammar name is empty"
        } else if self.rules.is_empty() {
            "the grammar has no rules"
        } else {
            return Ok(());
        };

        Err(Error::InvalidGrammar {
            grammar: self.id.clone(),
            reason: reason.to_owned(),
        })
    }

    pub fn from_json_str(content: &str) -> ScopeResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> ScopeResult<Self> {
        let file = File::open(path.as_ref())?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
