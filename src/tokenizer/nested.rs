use crate::error::{Error, ScopeResult};
use crate::scope::Scope;
use crate::tokenizer::Tokenizer;

impl Tokenizer<'_> {
    /// Tokenizes a captured span with another grammar.
    ///
    /// The returned scopes are relative to the start of `text`: the caller still needs to
    /// move them by the position of the capture inside its match.
    pub(crate) fn resolve_nested(
        &mut self,
        text: &str,
        language: &str,
    ) -> ScopeResult<Vec<Scope>> {
        if self.depth >= self.options.max_nesting_depth {
            return Err(Error::NestingTooDeep {
                limit: self.options.max_nesting_depth,
            });
        }

        let definition = self
            .repository
            .find(language)
            .ok_or_else(|| Error::LanguageNotFound(language.to_owned()))?;
        let grammar = self.cache.get_or_compile(&definition)?;

        #[cfg(feature = "debug")]
        log::debug!(
            "[resolve_nested] depth {}: tokenizing {} bytes with '{}'",
            self.depth + 1,
            text.len(),
            grammar.id
        );

        let mut scopes = Vec::new();
        // Offset of the current chunk within `text`
        let mut offset = 0;
        self.depth += 1;
        let result = self.run(text, &grammar, &mut |chunk: &str, chunk_scopes: Vec<Scope>| {
            for mut scope in chunk_scopes {
                scope.shift(offset);
                scopes.push(scope);
            }
            offset += chunk.len();
        });
        self.depth -= 1;
        result?;

        Ok(scopes)
    }
}
