use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};

use crate::error::ScopeResult;
use crate::grammars::{CompiledGrammar, GrammarDefinition};

/// One entry per grammar id. `init` is only held while compiling that grammar.
#[derive(Debug, Default)]
struct Slot {
    compiled: OnceLock<Arc<CompiledGrammar>>,
    init: Mutex<()>,
}

/// Compiled grammars by id, each compiled at most once.
///
/// Entries are never evicted: grammars are static configuration and only a handful are in
/// use at any given time.
#[derive(Debug, Default)]
pub struct GrammarCache {
    slots: RwLock<HashMap<String, Arc<Slot>>>,
}

impl GrammarCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the compiled version of that grammar, compiling it if this is the first time
    /// its id is requested.
    ///
    /// A failed compilation is not cached: the error is returned and the next call will try
    /// again.
    pub fn get_or_compile(
        &self,
        definition: &GrammarDefinition,
    ) -> ScopeResult<Arc<CompiledGrammar>> {
        self.get_or_compile_with(definition, CompiledGrammar::compile)
    }

    pub(crate) fn get_or_compile_with<F>(
        &self,
        definition: &GrammarDefinition,
        compile: F,
    ) -> ScopeResult<Arc<CompiledGrammar>>
    where
        F: FnOnce(&GrammarDefinition) -> ScopeResult<CompiledGrammar>,
    {
        let slot = self.slot(&definition.key());

        if let Some(compiled) = slot.compiled.get() {
            return Ok(compiled.clone());
        }

        let _guard = slot.init.lock().unwrap_or_else(PoisonError::into_inner);
        // Another thread might have compiled it while we were waiting
        if let Some(compiled) = slot.compiled.get() {
            return Ok(compiled.clone());
        }

        #[cfg(feature = "debug")]
        log::debug!("[get_or_compile] compiling grammar '{}'", definition.id);
        let compiled = Arc::new(compile(definition)?);
        let _ = slot.compiled.set(compiled.clone());
        Ok(compiled)
    }

    fn slot(&self, key: &str) -> Arc<Slot> {
        {
            let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(slot) = slots.get(key) {
                return slot.clone();
            }
        }

        // The read lock is released at this point, re-check under the write lock
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        slots.entry(key.to_owned()).or_default().clone()
    }

    /// Returns the compiled grammar for that id if it has already been compiled
    pub fn get(&self, id: &str) -> Option<Arc<CompiledGrammar>> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots
            .get(&crate::grammars::grammar_key(id))
            .and_then(|slot| slot.compiled.get().cloned())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Number of successfully compiled grammars
    pub fn len(&self) -> usize {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots
            .values()
            .filter(|slot| slot.compiled.get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::Error;
    use crate::grammars::Rule;

    fn keyword_grammar(id: &str) -> GrammarDefinition {
        GrammarDefinition::new(id, id).rule(Rule::new(r"\bvar\b").capture(0, "Keyword"))
    }

    #[test]
    fn compiles_once_under_contention() {
        let cache = GrammarCache::new();
        let definition = keyword_grammar("js");
        let compilations = AtomicUsize::new(0);
        let barrier = Barrier::new(8);

        let results: Vec<Arc<CompiledGrammar>> = thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        cache
                            .get_or_compile_with(&definition, |d| {
                                compilations.fetch_add(1, Ordering::SeqCst);
                                thread::sleep(Duration::from_millis(20));
                                CompiledGrammar::compile(d)
                            })
                            .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(compilations.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|c| Arc::ptr_eq(c, &results[0])));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn compiles_once_per_id() {
        let cache = GrammarCache::new();
        let compilations = AtomicUsize::new(0);
        let counting = |d: &GrammarDefinition| {
            compilations.fetch_add(1, Ordering::SeqCst);
            CompiledGrammar::compile(d)
        };

        let a = cache.get_or_compile_with(&keyword_grammar("a"), counting).unwrap();
        let b = cache.get_or_compile_with(&keyword_grammar("b"), counting).unwrap();
        let a2 = cache.get_or_compile_with(&keyword_grammar("A"), counting).unwrap();

        assert_eq!(compilations.load(Ordering::SeqCst), 2);
        assert!(Arc::ptr_eq(&a, &a2));
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(cache.contains("a"));
        assert!(cache.contains("B"));
    }

    #[test]
    fn failed_compilation_is_not_cached() {
        let cache = GrammarCache::new();
        let broken = GrammarDefinition::new("js", "JavaScript").rule(Rule::new("(var"));
        assert!(matches!(
            cache.get_or_compile(&broken),
            Err(Error::MalformedRegex { .. })
        ));
        assert!(cache.is_empty());
        assert!(cache.get("js").is_none());

        // a fixed definition for the same id compiles fine afterwards
        let fixed = keyword_grammar("js");
        assert!(cache.get_or_compile(&fixed).is_ok());
        assert_eq!(cache.len(), 1);
    }
}
