use onig::{RegexOptions, Syntax};

/// Options every pattern is compiled with. Numbered groups must stay capturing even when
/// a rule uses named groups, otherwise the capture table would shift.
pub(crate) const BASE_OPTIONS: RegexOptions = RegexOptions::REGEX_OPTION_CAPTURE_GROUP;

/// Options of the composite pattern: free-spacing on top of [`BASE_OPTIONS`]
pub(crate) fn composite_options() -> RegexOptions {
    BASE_OPTIONS | RegexOptions::REGEX_OPTION_EXTEND
}

/// Wraps a rule pattern so it can be put in the composite alternation.
///
/// The composite is compiled in free-spacing mode: the fragment switches free-spacing and
/// case-insensitivity off locally and is wrapped in one capturing group, which is the
/// group reporting the whole match of the rule.
/// Line anchors are already line-aware in the Ruby syntax.
pub(crate) fn wrap_rule_pattern(pattern: &str) -> String {
    format!("(?-ix:({pattern}))")
}

/// Compiles the pattern on its own and returns how many capturing groups it has.
/// Escaped parentheses, non-capturing and look-around groups are not counted.
pub(crate) fn count_capture_groups(pattern: &str) -> Result<usize, String> {
    onig::Regex::with_options(pattern, BASE_OPTIONS, Syntax::default())
        .map(|re| re.captures_len())
        .map_err(|e| e.to_string())
}

/// Compiles the wrapped rule the way the composite sees it and returns its group count.
///
/// A rule can leak out of its wrapper, eg a `#` comment after `(?x)` swallows the closing
/// parentheses. The count is then not the rule's own count plus one, or compiling fails.
pub(crate) fn count_wrapped_groups(pattern: &str) -> Result<usize, String> {
    onig::Regex::with_options(
        &wrap_rule_pattern(pattern),
        composite_options(),
        Syntax::default(),
    )
    .map(|re| re.captures_len())
    .map_err(|e| e.to_string())
}

/// Numbered back-references (`\1`, `\k<1>`, `\k'1'`) and numbered subexpression calls
/// (`\g<1>`, `\g'0'`) point to the wrong group once a rule is part of the composite pattern.
/// Named and relative (`\k<-1>`) references are fine.
pub(crate) fn has_numbered_backreferences(pattern: &str) -> bool {
    let bytes = pattern.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            match bytes.get(i + 1) {
                Some(b'1'..=b'9') => return true,
                Some(b'k' | b'g') => {
                    if let Some(b'<' | b'\'') = bytes.get(i + 2)
                        && bytes.get(i + 3).is_some_and(u8::is_ascii_digit)
                    {
                        return true;
                    }
                }
                _ => {}
            }
            // skip whatever is escaped, including another backslash
            i += 2;
        } else {
            i += 1;
        }
    }
    false
}
