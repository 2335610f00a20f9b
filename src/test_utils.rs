use std::fmt::Write;

use crate::Registry;
use crate::tokenizer::Chunk;

pub(crate) fn get_registry() -> Registry {
    Registry::with_builtin_grammars()
}

/// One line per chunk with its debug-quoted text, then one line per scope, indented by
/// depth.
pub(crate) fn dump_chunks(chunks: &[Chunk]) -> String {
    let mut out = String::new();
    for chunk in chunks {
        writeln!(out, "{:?}", chunk.text).unwrap();
        for root in &chunk.scopes {
            for (ancestors, scope) in root.walk() {
                let indent = "  ".repeat(ancestors.len() + 1);
                writeln!(out, "{indent}{} [{}..{}]", scope.name, scope.start, scope.end())
                    .unwrap();
            }
        }
    }
    out
}

/// Every scope of the chunk, depth-first, with the text it covers
pub(crate) fn scoped_texts(chunk: &Chunk) -> Vec<(&str, &str)> {
    chunk
        .scopes
        .iter()
        .flat_map(|root| root.walk())
        .map(|(_, scope)| (&chunk.text[scope.span()], scope.name()))
        .collect()
}
