mod compiled;
mod definition;
mod pattern;

pub use compiled::{CaptureTarget, CompiledGrammar};
pub(crate) use definition::grammar_key;
pub use definition::{AliasMatcher, Capture, GrammarDefinition, Rule};
