use std::ops::Range;

use onig::{Region, SearchOptions};
use serde::Serialize;

use crate::cache::GrammarCache;
use crate::error::{Error, ScopeResult};
use crate::grammars::{CaptureTarget, CompiledGrammar};
use crate::registry::{ParseOptions, Repository};
use crate::scope::{Scope, ScopeTreeBuilder, Token, flatten};

mod nested;

/// A contiguous piece of the source: plain text when `scopes` is empty, a match otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub text: String,
    /// Root scopes, with offsets relative to the start of `text`
    pub scopes: Vec<Scope>,
}

impl Chunk {
    pub fn is_plain(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Flat tokens covering the whole chunk, see [`flatten`]
    pub fn tokens(&self) -> Vec<Token> {
        flatten(&self.scopes, self.text.len())
    }
}

/// Runs a compiled grammar over some text.
///
/// A tokenizer is created per parse: it borrows the repository and cache to resolve
/// embedded languages and keeps track of the nesting depth and match count.
#[derive(Debug)]
pub struct Tokenizer<'r> {
    repository: &'r Repository,
    cache: &'r GrammarCache,
    options: ParseOptions,
    /// How many embedded languages we are currently inside
    depth: usize,
    /// Matches performed so far, across all nesting levels
    matches: usize,
}

impl<'r> Tokenizer<'r> {
    pub fn new(
        repository: &'r Repository,
        cache: &'r GrammarCache,
        options: ParseOptions,
    ) -> Self {
        Self {
            repository,
            cache,
            options,
            depth: 0,
            matches: 0,
        }
    }

    /// Splits `source` into chunks and calls `emit` for each of them, in order.
    ///
    /// The texts given to `emit` are contiguous and concatenate back to `source`. If the
    /// grammar never matches, `emit` is called once with the whole source and no scopes.
    /// Nothing is emitted for an empty source.
    pub fn parse<F>(
        &mut self,
        source: &str,
        grammar: &CompiledGrammar,
        mut emit: F,
    ) -> ScopeResult<()>
    where
        F: FnMut(&str, &[Scope]),
    {
        self.run(source, grammar, &mut |text: &str, scopes: Vec<Scope>| {
            emit(text, &scopes)
        })
    }

    /// Same as [`Self::parse`] but collects the chunks
    pub fn tokenize(
        &mut self,
        source: &str,
        grammar: &CompiledGrammar,
    ) -> ScopeResult<Vec<Chunk>> {
        let mut chunks = Vec::new();
        self.run(source, grammar, &mut |text: &str, scopes: Vec<Scope>| {
            chunks.push(Chunk {
                text: text.to_owned(),
                scopes,
            })
        })?;
        Ok(chunks)
    }

    fn run(
        &mut self,
        source: &str,
        grammar: &CompiledGrammar,
        emit: &mut dyn FnMut(&str, Vec<Scope>),
    ) -> ScopeResult<()> {
        // End of the last emitted chunk
        let mut cursor = 0;
        // Where the next search starts. Only differs from `cursor` after an empty match.
        let mut search_pos = 0;

        while search_pos <= source.len() {
            let mut region = Region::new();
            // The whole text is given so look-behinds can see what's before `search_pos`
            if grammar
                .regex()
                .search_with_options(
                    source,
                    search_pos,
                    source.len(),
                    SearchOptions::SEARCH_OPTION_NONE,
                    Some(&mut region),
                )
                .is_none()
            {
                break;
            }
            let Some((start, end)) = region.pos(0) else {
                break;
            };
            self.count_match()?;

            if start == end {
                // Empty match: nothing to emit, move on by one character
                #[cfg(feature = "debug")]
                log::trace!("[run] empty match at {start} in '{}'", grammar.id);
                match source[end..].chars().next() {
                    Some(c) => search_pos = end + c.len_utf8(),
                    None => break,
                }
                continue;
            }

            #[cfg(feature = "debug")]
            log::trace!(
                "[run] '{}' matched [{start}..{end}]: {:?}",
                grammar.id,
                &source[start..end]
            );

            if cursor < start {
                emit(&source[cursor..start], Vec::new());
            }
            let scopes = self.match_scopes(source, start..end, grammar, &region)?;
            emit(&source[start..end], scopes);
            cursor = end;
            search_pos = end;
        }

        if cursor < source.len() {
            emit(&source[cursor..], Vec::new());
        }

        Ok(())
    }

    fn count_match(&mut self) -> ScopeResult<()> {
        self.matches += 1;
        if let Some(limit) = self.options.match_limit
            && self.matches > limit
        {
            return Err(Error::MatchLimitExceeded { limit });
        }
        Ok(())
    }

    /// Builds the scope tree of one match, offsets relative to the start of `matched`.
    ///
    /// Captures inside look-arounds or before `\K` can lie partly outside the match: they
    /// are clipped to it, and dropped if nothing is left.
    fn match_scopes(
        &mut self,
        source: &str,
        matched: Range<usize>,
        grammar: &CompiledGrammar,
        region: &Region,
    ) -> ScopeResult<Vec<Scope>> {
        let mut builder = ScopeTreeBuilder::new();

        for (ordinal, target) in grammar.captures().iter().enumerate().skip(1) {
            let Some(target) = target else {
                continue;
            };
            let Some((cap_start, cap_end)) = region.pos(ordinal) else {
                continue;
            };
            let cap_start = cap_start.max(matched.start);
            let cap_end = cap_end.min(matched.end);
            // Nothing captured within the match
            if cap_start >= cap_end {
                continue;
            }
            let relative_start = cap_start - matched.start;

            match target {
                CaptureTarget::Scope(name) => {
                    builder.push(Scope::new(name.clone(), relative_start, cap_end - cap_start));
                }
                CaptureTarget::Language(language) => {
                    let nested = self.resolve_nested(&source[cap_start..cap_end], language)?;
                    for mut scope in nested {
                        scope.shift(relative_start);
                        builder.push(scope);
                    }
                }
            }
        }

        Ok(builder.build())
    }
}
