//! Scope names used by the builtin grammars, and their style slots.
//!
//! Renderers usually want a small integer per scope (an index in a colour table, a CSS class
//! number...). [`StyleTable`] gives every known scope name a stable index.

use std::collections::HashMap;
use std::sync::LazyLock;

pub const COMMENT: &str = "Comment";
pub const KEYWORD: &str = "Keyword";
pub const STRING: &str = "String";
pub const NUMBER: &str = "Number";
pub const OPERATOR: &str = "Operator";
pub const HTML_COMMENT: &str = "Html Comment";
pub const HTML_TAG_DELIMITER: &str = "Html Tag Delimiter";
pub const HTML_ELEMENT_NAME: &str = "Html Element Name";
pub const HTML_ATTRIBUTE_NAME: &str = "Html Attribute Name";
pub const HTML_ATTRIBUTE_VALUE: &str = "Html Attribute Value";
pub const HTML_ENTITY: &str = "Html Entity";
pub const CSS_SELECTOR: &str = "Css Selector";
pub const CSS_PROPERTY_NAME: &str = "Css Property Name";
pub const CSS_PROPERTY_VALUE: &str = "Css Property Value";
pub const SQL_SYSTEM_FUNCTION: &str = "Sql System Function";

/// Every known scope name, the position is the style index
const STYLED_SCOPES: &[&str] = &[
    COMMENT,
    KEYWORD,
    STRING,
    NUMBER,
    OPERATOR,
    HTML_COMMENT,
    HTML_TAG_DELIMITER,
    HTML_ELEMENT_NAME,
    HTML_ATTRIBUTE_NAME,
    HTML_ATTRIBUTE_VALUE,
    HTML_ENTITY,
    CSS_SELECTOR,
    CSS_PROPERTY_NAME,
    CSS_PROPERTY_VALUE,
    SQL_SYSTEM_FUNCTION,
];

/// Scope name -> style index
#[derive(Debug, Clone)]
pub struct StyleTable {
    indices: HashMap<&'static str, usize>,
}

static STYLE_TABLE: LazyLock<StyleTable> = LazyLock::new(|| StyleTable {
    indices: STYLED_SCOPES
        .iter()
        .enumerate()
        .map(|(index, name)| (*name, index))
        .collect(),
});

impl StyleTable {
    /// The table of every scope name in this module, built on first use
    pub fn get() -> &'static StyleTable {
        &STYLE_TABLE
    }

    pub fn index(&self, scope: &str) -> Option<usize> {
        self.indices.get(scope).copied()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Scope names in style index order
    pub fn names(&self) -> &'static [&'static str] {
        STYLED_SCOPES
    }
}

/// Shortcut for `StyleTable::get().index(scope)`
pub fn style_index(scope: &str) -> Option<usize> {
    StyleTable::get().index(scope)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_scope_has_a_distinct_index() {
        let table = StyleTable::get();
        assert_eq!(table.len(), STYLED_SCOPES.len());
        for (expected, name) in table.names().iter().enumerate() {
            assert_eq!(table.index(name), Some(expected));
        }
    }

    #[test]
    fn unknown_scope_has_no_index() {
        assert_eq!(style_index(KEYWORD), Some(1));
        assert_eq!(style_index("keyword"), None);
        assert_eq!(style_index("Made Up"), None);
    }
}
