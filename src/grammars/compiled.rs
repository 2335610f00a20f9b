use std::fmt;
use std::sync::Arc;

use onig::{Regex, Syntax};

use crate::error::{Error, ScopeResult};
use crate::grammars::definition::{Capture, GrammarDefinition};
use crate::grammars::pattern::{
    composite_options, count_capture_groups, count_wrapped_groups, has_numbered_backreferences,
    wrap_rule_pattern,
};

/// What a group of the composite pattern maps to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureTarget {
    Scope(Arc<str>),
    /// Id or alias of the grammar the captured text is delegated to
    Language(String),
}

impl From<&Capture> for CaptureTarget {
    fn from(capture: &Capture) -> Self {
        match capture {
            Capture::Scope(name) => CaptureTarget::Scope(Arc::from(name.as_str())),
            Capture::Language { language } => CaptureTarget::Language(language.clone()),
        }
    }
}

/// A grammar merged into a single regex.
///
/// `captures[i]` describes group `i` of the composite regex. Group 0 is the whole match
/// and never has a target.
pub struct CompiledGrammar {
    pub id: String,
    pub name: String,
    pattern: String,
    regex: Regex,
    captures: Vec<Option<CaptureTarget>>,
}

impl CompiledGrammar {
    pub fn compile(definition: &GrammarDefinition) -> ScopeResult<Self> {
        definition.validate()?;

        let mut pattern = String::new();
        let mut captures = vec![None];

        for (index, rule) in definition.rules.iter().enumerate() {
            let group_count =
                count_capture_groups(&rule.pattern).map_err(|message| Error::MalformedRegex {
                    grammar: definition.id.clone(),
                    rule: Some(index),
                    message,
                })?;

            if has_numbered_backreferences(&rule.pattern) {
                return Err(Error::InvalidGrammar {
                    grammar: definition.id.clone(),
                    reason: format!("rule #{index} uses numbered back-references"),
                });
            }

            if let Some(&ordinal) = rule.captures.keys().next_back()
                && ordinal > group_count
            {
                return Err(Error::InvalidGrammar {
                    grammar: definition.id.clone(),
                    reason: format!(
                        "rule #{index} maps capture {ordinal} but only has {group_count} groups"
                    ),
                });
            }

            let malformed = |message: String| Error::MalformedRegex {
                grammar: definition.id.clone(),
                rule: Some(index),
                message,
            };
            let wrapped_count = count_wrapped_groups(&rule.pattern).map_err(malformed)?;
            if wrapped_count != group_count + 1 {
                return Err(malformed(format!(
                    "pattern leaks out of its group once wrapped ({wrapped_count} groups instead of {})",
                    group_count + 1
                )));
            }

            if index > 0 {
                pattern.push('|');
            }
            pattern.push_str(&wrap_rule_pattern(&rule.pattern));

            captures.extend((0..=group_count).map(|ordinal| {
                rule.captures.get(&ordinal).map(CaptureTarget::from)
            }));
        }

        let regex = Regex::with_options(&pattern, composite_options(), Syntax::default())
            .map_err(|e| Error::MalformedRegex {
                grammar: definition.id.clone(),
                rule: None,
                message: e.to_string(),
            })?;

        if regex.captures_len() + 1 != captures.len() {
            return Err(Error::MalformedRegex {
                grammar: definition.id.clone(),
                rule: None,
                message: format!(
                    "composite has {} groups but the rules declare {}",
                    regex.captures_len(),
                    captures.len() - 1
                ),
            });
        }

        #[cfg(feature = "debug")]
        log::debug!(
            "[compile] grammar '{}': {} rules, {} groups\n{pattern}",
            definition.id,
            definition.rules.len(),
            captures.len() - 1
        );

        Ok(Self {
            id: definition.id.clone(),
            name: definition.name.clone(),
            pattern,
            regex,
            captures,
        })
    }

    /// The composite pattern source
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub(crate) fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn captures(&self) -> &[Option<CaptureTarget>] {
        &self.captures
    }
}

impl fmt::Debug for CompiledGrammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledGrammar")
            .field("id", &self.id)
            .field("pattern", &self.pattern)
            .field("captures", &self.captures.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammars::Rule;

    fn scope(name: &str) -> Option<CaptureTarget> {
        Some(CaptureTarget::Scope(Arc::from(name)))
    }

    #[test]
    fn builds_composite_and_aligned_capture_table() {
        let definition = GrammarDefinition::new("test", "Test")
            .rule(Rule::new(r"\bvar\b").capture(0, "Keyword"))
            .rule(Rule::new("(a)(b)").capture(1, "X").capture(2, "Y"))
            .rule(Rule::new("(<s>)(.*?)(</s>)").language(2, "js"));
        let compiled = CompiledGrammar::compile(&definition).unwrap();

        assert_eq!(
            compiled.pattern(),
            r"(?-ix:(\bvar\b))|(?-ix:((a)(b)))|(?-ix:((<s>)(.*?)(</s>)))"
        );
        assert_eq!(
            compiled.captures(),
            &[
                None,
                // rule 0
                scope("Keyword"),
                // rule 1
                None,
                scope("X"),
                scope("Y"),
                // rule 2
                None,
                None,
                Some(CaptureTarget::Language("js".to_owned())),
                None,
            ]
        );
        assert_eq!(compiled.regex().captures_len() + 1, compiled.captures().len());
    }

    #[test]
    fn keeps_whitespace_in_rules_literal() {
        let definition = GrammarDefinition::new("test", "Test")
            .rule(Rule::new("a b # not a comment").capture(0, "Text"));
        let compiled = CompiledGrammar::compile(&definition).unwrap();
        let text = "a b # not a comment";
        assert_eq!(
            compiled
                .regex()
                .find(text)
                .map(|(start, end)| &text[start..end]),
            Some(text)
        );
    }

    #[test]
    fn rejects_empty_grammar() {
        let definition = GrammarDefinition::new("empty", "Empty");
        assert!(matches!(
            CompiledGrammar::compile(&definition),
            Err(Error::InvalidGrammar { .. })
        ));
    }

    #[test]
    fn reports_malformed_rule_with_its_index() {
        let definition = GrammarDefinition::new("broken", "Broken")
            .rule(Rule::new("ok"))
            .rule(Rule::new("(unclosed"));
        match CompiledGrammar::compile(&definition) {
            Err(Error::MalformedRegex { grammar, rule, .. }) => {
                assert_eq!(grammar, "broken");
                assert_eq!(rule, Some(1));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn rejects_capture_beyond_group_count() {
        let definition =
            GrammarDefinition::new("test", "Test").rule(Rule::new("(a)").capture(2, "X"));
        assert!(matches!(
            CompiledGrammar::compile(&definition),
            Err(Error::InvalidGrammar { .. })
        ));
    }

    #[test]
    fn rejects_numbered_backreferences() {
        let definition =
            GrammarDefinition::new("test", "Test").rule(Rule::new(r#"(["'])x\1"#).capture(0, "S"));
        assert!(matches!(
            CompiledGrammar::compile(&definition),
            Err(Error::InvalidGrammar { .. })
        ));
    }

    #[test]
    fn rejects_numbered_group_references() {
        for pattern in [r#"(["'])\w+\k<1>"#, r"(a)\k'1'", r"(a|\(\g<1>\))"] {
            let definition = GrammarDefinition::new("test", "Test")
                .rule(Rule::new(r"\d").capture(0, "Digit"))
                .rule(Rule::new(pattern).capture(0, "S"));
            assert!(
                matches!(
                    CompiledGrammar::compile(&definition),
                    Err(Error::InvalidGrammar { .. })
                ),
                "{pattern} was accepted"
            );
        }
    }

    #[test]
    fn comment_leaking_out_of_its_rule_is_reported_on_that_rule() {
        let definition = GrammarDefinition::new("test", "Test")
            .rule(Rule::new("ok"))
            .rule(Rule::new("(?x) a b # trailing comment"))
            .rule(Rule::new("c"));
        match CompiledGrammar::compile(&definition) {
            Err(Error::MalformedRegex { rule, .. }) => assert_eq!(rule, Some(1)),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
