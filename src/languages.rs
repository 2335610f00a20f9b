//! A few sample grammars, enough to exercise rules, captures and embedded languages.
//!
//! `html` delegates `<script>` bodies to `javascript`, `<style>` bodies to `css` and tag
//! attributes to `html-attributes`; `css` delegates declaration blocks to `css-declarations`.

use crate::grammars::{GrammarDefinition, Rule};
use crate::scope_names::*;

pub fn html() -> GrammarDefinition {
    GrammarDefinition::new("html", "HTML")
        .alias("htm")
        .alias("xhtml")
        .rule(Rule::new(r"<!--[\s\S]*?-->").capture(0, HTML_COMMENT))
        .rule(embedding_element("script", "javascript"))
        .rule(embedding_element("style", "css"))
        .rule(
            Rule::new(r"(</?)([a-zA-Z][\w:-]*)((?:\s[^<>]*?)?)(\s*/?>)")
                .capture(1, HTML_TAG_DELIMITER)
                .capture(2, HTML_ELEMENT_NAME)
                .language(3, "html-attributes")
                .capture(4, HTML_TAG_DELIMITER),
        )
        .rule(Rule::new(r"&(?:\w+|#\d+|#x[0-9a-fA-F]+);").capture(0, HTML_ENTITY))
}

/// `<name attrs>body</name>` where the body is another language
fn embedding_element(name: &str, language: &str) -> Rule {
    Rule::new(format!(
        r"(?i)(<)({name})((?:\s[^>]*)?)(>)([\s\S]*?)(</)({name})(\s*>)"
    ))
    .capture(1, HTML_TAG_DELIMITER)
    .capture(2, HTML_ELEMENT_NAME)
    .language(3, "html-attributes")
    .capture(4, HTML_TAG_DELIMITER)
    .language(5, language)
    .capture(6, HTML_TAG_DELIMITER)
    .capture(7, HTML_ELEMENT_NAME)
    .capture(8, HTML_TAG_DELIMITER)
}

pub fn html_attributes() -> GrammarDefinition {
    GrammarDefinition::new("html-attributes", "HTML attributes").rule(
        Rule::new(r#"([\w:-]+)(?:\s*(=)\s*("[^"]*"|'[^']*'|[^\s"'>]+))?"#)
            .capture(1, HTML_ATTRIBUTE_NAME)
            .capture(2, OPERATOR)
            .capture(3, HTML_ATTRIBUTE_VALUE),
    )
}

pub fn javascript() -> GrammarDefinition {
    GrammarDefinition::new("javascript", "JavaScript")
        .alias("js")
        .alias("jscript")
        .alias("ecmascript")
        .rule(Rule::new(r"/\*[\s\S]*?\*/").capture(0, COMMENT))
        .rule(Rule::new(r"//.*").capture(0, COMMENT))
        .rule(Rule::new(r#""(?:[^"\\\n]|\\.)*"|'(?:[^'\\\n]|\\.)*'"#).capture(0, STRING))
        .rule(
            Rule::new(
                r"\b(?:var|let|const|function|return|if|else|for|while|do|new|this|typeof|true|false|null|undefined)\b",
            )
            .capture(0, KEYWORD),
        )
        .rule(Rule::new(r"\b\d+(?:\.\d+)?\b").capture(0, NUMBER))
        .rule(Rule::new(r"[-+*/%=<>!&|]+").capture(0, OPERATOR))
}

pub fn css() -> GrammarDefinition {
    GrammarDefinition::new("css", "CSS")
        .rule(Rule::new(r"/\*[\s\S]*?\*/").capture(0, COMMENT))
        .rule(
            Rule::new(r"([^\s{}][^{}]*?)\s*(\{)([^}]*)(\})")
                .capture(1, CSS_SELECTOR)
                .language(3, "css-declarations"),
        )
}

pub fn css_declarations() -> GrammarDefinition {
    GrammarDefinition::new("css-declarations", "CSS declarations")
        .rule(Rule::new(r"/\*[\s\S]*?\*/").capture(0, COMMENT))
        .rule(
            Rule::new(r"([\w-]+)\s*(:)\s*([^;]+?)\s*(?:;|$)")
                .capture(1, CSS_PROPERTY_NAME)
                .capture(3, CSS_PROPERTY_VALUE),
        )
}

pub fn sql() -> GrammarDefinition {
    GrammarDefinition::new("sql", "SQL")
        // tsql, mysql, postgresql...
        .alias_predicate(|name| name.to_ascii_lowercase().ends_with("sql"))
        .rule(Rule::new(r"--.*").capture(0, COMMENT))
        .rule(Rule::new(r"/\*[\s\S]*?\*/").capture(0, COMMENT))
        .rule(Rule::new(r"'(?:[^']|'')*'").capture(0, STRING))
        .rule(
            Rule::new(r"(?i)\b(?:count|sum|avg|min|max|coalesce)\b(?=\s*\()")
                .capture(0, SQL_SYSTEM_FUNCTION),
        )
        .rule(
            Rule::new(
                r"(?i)\b(?:select|from|where|and|or|not|null|insert|into|values|update|set|delete|join|on|as|order|group|by|having|limit)\b",
            )
            .capture(0, KEYWORD),
        )
        .rule(Rule::new(r"\b\d+(?:\.\d+)?\b").capture(0, NUMBER))
}

/// Every sample grammar
pub fn builtin() -> Vec<GrammarDefinition> {
    vec![
        html(),
        html_attributes(),
        javascript(),
        css(),
        css_declarations(),
        sql(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{dump_chunks, get_registry, scoped_texts};

    #[test]
    fn builtin_grammars_compile() {
        let registry = get_registry();
        for definition in builtin() {
            assert!(
                registry.compiled(&definition.id).is_ok(),
                "{} failed to compile",
                definition.id
            );
        }
    }

    #[test]
    fn html_tags_attributes_and_entities() {
        let registry = get_registry();
        let chunks = registry.tokenize("html", r#"<a href="x">&amp;</a>"#).unwrap();
        insta::assert_snapshot!(dump_chunks(&chunks), @r#"
        "<a href=\"x\">"
          Html Tag Delimiter [0..1]
          Html Element Name [1..2]
          Html Attribute Name [3..7]
          Operator [7..8]
          Html Attribute Value [8..11]
          Html Tag Delimiter [11..12]
        "&amp;"
          Html Entity [0..5]
        "</a>"
          Html Tag Delimiter [0..2]
          Html Element Name [2..3]
          Html Tag Delimiter [3..4]
        "#);
    }

    #[test]
    fn html_style_goes_two_languages_deep() {
        let registry = get_registry();
        let chunks = registry
            .tokenize("html", "<style>p { color: red; }</style>")
            .unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(
            scoped_texts(&chunks[0]),
            vec![
                ("<", HTML_TAG_DELIMITER),
                ("style", HTML_ELEMENT_NAME),
                (">", HTML_TAG_DELIMITER),
                ("p", CSS_SELECTOR),
                ("color", CSS_PROPERTY_NAME),
                ("red", CSS_PROPERTY_VALUE),
                ("</", HTML_TAG_DELIMITER),
                ("style", HTML_ELEMENT_NAME),
                (">", HTML_TAG_DELIMITER),
            ]
        );
    }

    #[test]
    fn html_script_is_javascript() {
        let registry = get_registry();
        let chunks = registry
            .tokenize("html", r#"<SCRIPT defer>var s = "</p>";</SCRIPT>"#)
            .unwrap();
        assert_eq!(chunks.len(), 1);
        let texts = scoped_texts(&chunks[0]);
        assert!(texts.contains(&("defer", HTML_ATTRIBUTE_NAME)));
        assert!(texts.contains(&("var", KEYWORD)));
        assert!(texts.contains(&(r#""</p>""#, STRING)));
        assert_eq!(texts.last(), Some(&(">", HTML_TAG_DELIMITER)));
    }

    #[test]
    fn sql_keywords_ignore_case_and_aliases_use_predicate() {
        let registry = get_registry();
        let source = "SELECT COUNT(*) FROM t WHERE a = 'it''s' -- done";
        let chunks = registry.tokenize("PostgreSQL", source).unwrap();
        let matched: Vec<(&str, &str)> = chunks
            .iter()
            .filter(|c| !c.is_plain())
            .map(|c| (c.text.as_str(), c.scopes[0].name()))
            .collect();
        assert_eq!(
            matched,
            vec![
                ("SELECT", KEYWORD),
                ("COUNT", SQL_SYSTEM_FUNCTION),
                ("FROM", KEYWORD),
                ("WHERE", KEYWORD),
                ("'it''s'", STRING),
                ("-- done", COMMENT),
            ]
        );
        assert!(registry.find("nosql").is_some());
        assert!(registry.find("sqlite").is_none());
    }

    #[test]
    fn chunks_cover_a_whole_document() {
        let registry = get_registry();
        let source = r#"<!DOCTYPE html>
<html lang="en">
  <!-- header -->
  <head>
    <style>
      body { margin: 0; /* reset */ }
      .note, h1 { color: #333 }
    </style>
  </head>
  <body class=main>
    <p>Fish &amp; chips &#169; 2024</p>
    <script type="text/javascript">
      // greet
      function greet(name) { return "hi " + name; }
      var n = 3.5 * 2;
    </script>
  </body>
</html>
"#;
        let chunks = registry.tokenize("html", source).unwrap();
        let rebuilt: String = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(rebuilt, source);

        for chunk in &chunks {
            for root in &chunk.scopes {
                for (_, scope) in root.walk() {
                    assert!(scope.end() <= chunk.text.len());
                    for child in &scope.children {
                        assert!(scope.contains(child.start, child.length));
                    }
                }
            }
        }
    }
}
